//! Create `license` table: one key per purchased order item.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(License::Table)
                    .if_not_exists()
                    .col(uuid(License::Id).primary_key())
                    .col(string_len(License::LicenseKey, 32).unique_key().not_null())
                    .col(uuid(License::OrderId).not_null())
                    .col(uuid(License::TemplateId).not_null())
                    .col(uuid_null(License::UserId))
                    .col(string_len(License::CustomerEmail, 255).not_null())
                    .col(string_len(License::Status, 16).not_null())
                    .col(timestamp_with_time_zone_null(License::ExpiresAt))
                    .col(timestamp_with_time_zone(License::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(License::UpdatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_license_order")
                            .from(License::Table, License::OrderId)
                            .to(Orders::Table, Orders::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_license_template")
                            .from(License::Table, License::TemplateId)
                            .to(Template::Table, Template::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_license_user")
                            .from(License::Table, License::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(License::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum License {
    Table,
    Id,
    LicenseKey,
    OrderId,
    TemplateId,
    UserId,
    CustomerEmail,
    Status,
    ExpiresAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Orders { Table, Id }

#[derive(DeriveIden)]
enum Template { Table, Id }

#[derive(DeriveIden)]
enum User { Table, Id }
