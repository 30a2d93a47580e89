pub mod carts;
pub mod catalog;
pub mod checkout;
pub mod housekeeping;
pub mod payments;
pub mod shipping;

use crate::{entities::document_counter, errors::ServiceError};
use chrono::{DateTime, Datelike, Utc};
use sea_orm::{ActiveModelTrait, ConnectionTrait, EntityTrait, QuerySelect, Set};

/// Roman numeral for a date's month, used in document numbers such as
/// "12/PAYMENT/VIII/2026".
pub(crate) fn roman_month(date: DateTime<Utc>) -> &'static str {
    match date.month() {
        1 => "I",
        2 => "II",
        3 => "III",
        4 => "IV",
        5 => "V",
        6 => "VI",
        7 => "VII",
        8 => "VIII",
        9 => "IX",
        10 => "X",
        11 => "XI",
        _ => "XII",
    }
}

/// Formats a sequential document number: "<n>/<kind>/<roman-month>/<year>".
pub(crate) fn document_number(sequence: i64, kind: &str, date: DateTime<Utc>) -> String {
    format!("{}/{}/{}/{}", sequence, kind, roman_month(date), date.year())
}

/// Claims the next sequence for a document kind by incrementing its counter
/// row under an exclusive lock. Must run inside the caller's transaction so
/// the claimed number commits or rolls back with the document itself.
pub(crate) async fn next_document_sequence<C: ConnectionTrait>(
    conn: &C,
    kind: &str,
) -> Result<i64, ServiceError> {
    let counter = document_counter::Entity::find_by_id(kind)
        .lock_exclusive()
        .one(conn)
        .await?
        .ok_or_else(|| {
            ServiceError::InternalError(format!("document counter {} missing", kind))
        })?;

    let value = counter.value + 1;
    let mut counter: document_counter::ActiveModel = counter.into();
    counter.value = Set(value);
    counter.update(conn).await?;

    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn document_number_uses_roman_month() {
        let date = Utc.with_ymd_and_hms(2026, 8, 29, 10, 0, 0).unwrap();
        assert_eq!(document_number(12, "PAYMENT", date), "12/PAYMENT/VIII/2026");

        let date = Utc.with_ymd_and_hms(2025, 12, 1, 0, 0, 0).unwrap();
        assert_eq!(document_number(1, "ORDER", date), "1/ORDER/XII/2025");
    }
}
