//! Create `orders` and `order_item` tables.
//! `(provider, provider_order_id)` is unique so webhook redelivery cannot duplicate orders.
use sea_orm_migration::{prelude::*, schema::*};

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
                    .col(uuid(Orders::Id).primary_key())
                    .col(uuid_null(Orders::UserId))
                    .col(string_len(Orders::CustomerEmail, 255).not_null())
                    .col(string_len(Orders::Provider, 32).not_null())
                    .col(string_len(Orders::ProviderOrderId, 128).not_null())
                    .col(string_len(Orders::Status, 16).not_null())
                    .col(big_integer(Orders::TotalCents).not_null())
                    .col(string_len(Orders::Currency, 3).not_null())
                    .col(timestamp_with_time_zone(Orders::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(Orders::UpdatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_orders_user")
                            .from(Orders::Table, Orders::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uniq_orders_provider_order")
                    .table(Orders::Table)
                    .col(Orders::Provider)
                    .col(Orders::ProviderOrderId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(OrderItem::Table)
                    .if_not_exists()
                    .col(uuid(OrderItem::Id).primary_key())
                    .col(uuid(OrderItem::OrderId).not_null())
                    .col(uuid(OrderItem::TemplateId).not_null())
                    .col(big_integer(OrderItem::PriceCents).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_order_item_order")
                            .from(OrderItem::Table, OrderItem::OrderId)
                            .to(Orders::Table, Orders::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_order_item_template")
                            .from(OrderItem::Table, OrderItem::TemplateId)
                            .to(Template::Table, Template::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(OrderItem::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Orders::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Orders {
    Table,
    Id,
    UserId,
    CustomerEmail,
    Provider,
    ProviderOrderId,
    Status,
    TotalCents,
    Currency,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum OrderItem { Table, Id, OrderId, TemplateId, PriceCents }

#[derive(DeriveIden)]
enum User { Table, Id }

#[derive(DeriveIden)]
enum Template { Table, Id }
