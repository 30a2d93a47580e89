use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(DocumentCounters::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DocumentCounters::Kind)
                            .string()
                            .primary_key()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DocumentCounters::Value)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .to_owned(),
            )
            .await?;

        // Seed one counter per document kind so the increment path never has
        // to race on a first insert.
        for kind in ["ORDER", "PAYMENT"] {
            manager
                .exec_stmt(
                    Query::insert()
                        .into_table(DocumentCounters::Table)
                        .columns([DocumentCounters::Kind, DocumentCounters::Value])
                        .values_panic([kind.into(), 0i64.into()])
                        .to_owned(),
                )
                .await?;
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(DocumentCounters::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum DocumentCounters {
    Table,
    Kind,
    Value,
}
