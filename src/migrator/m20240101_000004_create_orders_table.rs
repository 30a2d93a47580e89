use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Orders::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Orders::Id).uuid().primary_key().not_null())
                    .col(
                        ColumnDef::new(Orders::OrderNumber)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Orders::UserId).uuid().not_null())
                    .col(
                        ColumnDef::new(Orders::PaymentStatus)
                            .string()
                            .not_null()
                            .default("unpaid"),
                    )
                    .col(
                        ColumnDef::new(Orders::FulfillmentStatus)
                            .string()
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(Orders::OrderDate).timestamp().not_null())
                    .col(ColumnDef::new(Orders::PaymentDue).timestamp().not_null())
                    .col(
                        ColumnDef::new(Orders::BaseTotal)
                            .decimal_len(16, 4)
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(Orders::TaxAmount)
                            .decimal_len(16, 4)
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(Orders::TaxPercent)
                            .decimal_len(16, 4)
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(Orders::DiscountAmount)
                            .decimal_len(16, 4)
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(Orders::DiscountPercent)
                            .decimal_len(16, 4)
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(Orders::ShippingCost)
                            .decimal_len(16, 4)
                            .not_null()
                            .default(0.0),
                    )
                    .col(ColumnDef::new(Orders::ShippingCourier).string().not_null())
                    .col(ColumnDef::new(Orders::ShippingService).string().not_null())
                    .col(
                        ColumnDef::new(Orders::GrandTotal)
                            .decimal_len(16, 4)
                            .not_null()
                            .default(0.0),
                    )
                    .col(ColumnDef::new(Orders::PaymentToken).string().null())
                    .col(ColumnDef::new(Orders::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Orders::UpdatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(OrderItems::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(OrderItems::Id)
                            .uuid()
                            .primary_key()
                            .not_null(),
                    )
                    .col(ColumnDef::new(OrderItems::OrderId).uuid().not_null())
                    .col(ColumnDef::new(OrderItems::ProductId).uuid().not_null())
                    .col(ColumnDef::new(OrderItems::Sku).string().not_null())
                    .col(ColumnDef::new(OrderItems::Name).string().not_null())
                    .col(
                        ColumnDef::new(OrderItems::Weight)
                            .decimal_len(16, 4)
                            .not_null()
                            .default(0.0),
                    )
                    .col(ColumnDef::new(OrderItems::Quantity).integer().not_null())
                    .col(
                        ColumnDef::new(OrderItems::BasePrice)
                            .decimal_len(16, 4)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(OrderItems::BaseTotal)
                            .decimal_len(16, 4)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(OrderItems::TaxPercent)
                            .decimal_len(16, 4)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(OrderItems::TaxAmount)
                            .decimal_len(16, 4)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(OrderItems::DiscountPercent)
                            .decimal_len(16, 4)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(OrderItems::DiscountAmount)
                            .decimal_len(16, 4)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(OrderItems::SubTotal)
                            .decimal_len(16, 4)
                            .not_null(),
                    )
                    .col(ColumnDef::new(OrderItems::DesignPath).string().null())
                    .col(ColumnDef::new(OrderItems::CustomType).string().null())
                    .col(ColumnDef::new(OrderItems::CustomSize).string().null())
                    .col(ColumnDef::new(OrderItems::CreatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_order_items_order")
                            .from(OrderItems::Table, OrderItems::OrderId)
                            .to(Orders::Table, Orders::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(OrderCustomers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(OrderCustomers::Id)
                            .uuid()
                            .primary_key()
                            .not_null(),
                    )
                    .col(ColumnDef::new(OrderCustomers::OrderId).uuid().not_null())
                    .col(ColumnDef::new(OrderCustomers::UserId).uuid().not_null())
                    .col(ColumnDef::new(OrderCustomers::FirstName).string().not_null())
                    .col(ColumnDef::new(OrderCustomers::LastName).string().not_null())
                    .col(ColumnDef::new(OrderCustomers::Email).string().not_null())
                    .col(ColumnDef::new(OrderCustomers::Phone).string().not_null())
                    .col(ColumnDef::new(OrderCustomers::CityId).string().not_null())
                    .col(
                        ColumnDef::new(OrderCustomers::ProvinceId)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(OrderCustomers::Address).text().not_null())
                    .col(ColumnDef::new(OrderCustomers::PostCode).string().not_null())
                    .col(
                        ColumnDef::new(OrderCustomers::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_order_customers_order")
                            .from(OrderCustomers::Table, OrderCustomers::OrderId)
                            .to(Orders::Table, Orders::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_order_items_order_id")
                    .table(OrderItems::Table)
                    .col(OrderItems::OrderId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(OrderCustomers::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(OrderItems::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Orders::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Orders {
    Table,
    Id,
    OrderNumber,
    UserId,
    PaymentStatus,
    FulfillmentStatus,
    OrderDate,
    PaymentDue,
    BaseTotal,
    TaxAmount,
    TaxPercent,
    DiscountAmount,
    DiscountPercent,
    ShippingCost,
    ShippingCourier,
    ShippingService,
    GrandTotal,
    PaymentToken,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
pub enum OrderItems {
    Table,
    Id,
    OrderId,
    ProductId,
    Sku,
    Name,
    Weight,
    Quantity,
    BasePrice,
    BaseTotal,
    TaxPercent,
    TaxAmount,
    DiscountPercent,
    DiscountAmount,
    SubTotal,
    DesignPath,
    CustomType,
    CustomSize,
    CreatedAt,
}

#[derive(DeriveIden)]
pub enum OrderCustomers {
    Table,
    Id,
    OrderId,
    UserId,
    FirstName,
    LastName,
    Email,
    Phone,
    CityId,
    ProvinceId,
    Address,
    PostCode,
    CreatedAt,
}
