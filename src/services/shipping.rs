use crate::{
    clients::rajaongkir::{City, Province, RajaOngkirClient, RateParams},
    config::ShippingConfig,
    errors::ServiceError,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;

/// A courier service offered at checkout.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ShippingOption {
    /// Stable identifier derived from courier and service code; the primary
    /// selection key
    pub id: String,
    /// Display label: "SERVICE (description)"
    pub service: String,
    pub fee: Decimal,
    pub etd: String,
}

/// Shipping quote assembly over the rate provider client.
#[derive(Clone)]
pub struct ShippingService {
    client: Arc<RajaOngkirClient>,
    origin_city_id: String,
    couriers: String,
}

impl ShippingService {
    pub fn new(client: Arc<RajaOngkirClient>, config: &ShippingConfig) -> Self {
        Self {
            client,
            origin_city_id: config.origin_city_id.clone(),
            couriers: config.couriers.clone(),
        }
    }

    #[instrument(skip(self))]
    pub async fn provinces(&self) -> Result<Vec<Province>, ServiceError> {
        self.client.provinces().await
    }

    #[instrument(skip(self))]
    pub async fn cities(&self, province_id: &str) -> Result<Vec<City>, ServiceError> {
        if province_id.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "province id must not be empty".to_string(),
            ));
        }
        self.client.cities(province_id).await
    }

    /// Quotes shipping options for a destination and total cart weight.
    #[instrument(skip(self))]
    pub async fn options(
        &self,
        destination_city_id: &str,
        total_weight: i64,
    ) -> Result<Vec<ShippingOption>, ServiceError> {
        if destination_city_id.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "destination city must not be empty".to_string(),
            ));
        }
        if total_weight <= 0 {
            return Err(ServiceError::ValidationError(
                "cart weight must be positive".to_string(),
            ));
        }

        let results = self
            .client
            .domestic_cost(&RateParams {
                origin: self.origin_city_id.clone(),
                destination: destination_city_id.to_string(),
                weight: total_weight,
                courier: self.couriers.clone(),
            })
            .await?;

        Ok(results
            .into_iter()
            .map(|r| ShippingOption {
                id: option_id(&r.code, &r.service),
                service: format!("{} ({})", r.service, r.description),
                fee: Decimal::from(r.cost),
                etd: r.etd,
            })
            .collect())
    }

    /// Resolves a checkout selection against a quoted option list.
    ///
    /// Matches the option id first; a legacy fallback accepts selection text
    /// that equals or contains an option's service label.
    pub fn select<'a>(
        options: &'a [ShippingOption],
        selection: &str,
    ) -> Result<&'a ShippingOption, ServiceError> {
        options
            .iter()
            .find(|o| o.id == selection)
            .or_else(|| {
                options
                    .iter()
                    .find(|o| selection == o.service || selection.contains(&o.service))
            })
            .ok_or_else(|| {
                ServiceError::ValidationError(format!("invalid shipping selection: {}", selection))
            })
    }
}

fn option_id(courier_code: &str, service: &str) -> String {
    format!(
        "{}-{}",
        courier_code.to_lowercase(),
        service.to_lowercase().replace(' ', "-")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn options() -> Vec<ShippingOption> {
        vec![
            ShippingOption {
                id: "jne-reg".to_string(),
                service: "REG (Layanan Reguler)".to_string(),
                fee: dec!(18000),
                etd: "2-3 day".to_string(),
            },
            ShippingOption {
                id: "jne-yes".to_string(),
                service: "YES (Yakin Esok Sampai)".to_string(),
                fee: dec!(30000),
                etd: "1 day".to_string(),
            },
        ]
    }

    #[test]
    fn selects_by_id_first() {
        let opts = options();
        let picked = ShippingService::select(&opts, "jne-yes").unwrap();
        assert_eq!(picked.fee, dec!(30000));
    }

    #[test]
    fn falls_back_to_label_containment() {
        let opts = options();
        let picked =
            ShippingService::select(&opts, "jne REG (Layanan Reguler) - Rp18.000").unwrap();
        assert_eq!(picked.id, "jne-reg");

        let picked = ShippingService::select(&opts, "YES (Yakin Esok Sampai)").unwrap();
        assert_eq!(picked.id, "jne-yes");
    }

    #[test]
    fn unknown_selection_is_rejected() {
        let opts = options();
        assert!(ShippingService::select(&opts, "sicepat-best").is_err());
    }

    #[test]
    fn option_id_is_stable_and_lowercase() {
        assert_eq!(option_id("JNE", "REG"), "jne-reg");
        assert_eq!(option_id("JNE", "CTC YES"), "jne-ctc-yes");
    }
}
