//! Create `template` table: sellable listings with provider product mappings.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Template::Table)
                    .if_not_exists()
                    .col(uuid(Template::Id).primary_key())
                    .col(string_len(Template::Title, 200).not_null())
                    .col(string_len(Template::Slug, 220).unique_key().not_null())
                    .col(text(Template::Description).not_null())
                    .col(big_integer(Template::PriceCents).not_null())
                    .col(string_len(Template::Currency, 3).not_null())
                    .col(string_len_null(Template::PreviewUrl, 512))
                    .col(string_len_null(Template::ThumbnailUrl, 512))
                    .col(uuid_null(Template::CategoryId))
                    .col(string_len_null(Template::LemonsqueezyVariantId, 128))
                    .col(string_len_null(Template::FastspringProductPath, 128))
                    .col(boolean(Template::Published).not_null())
                    .col(timestamp_with_time_zone(Template::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(Template::UpdatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_template_category")
                            .from(Template::Table, Template::CategoryId)
                            .to(Category::Table, Category::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Template::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Template {
    Table,
    Id,
    Title,
    Slug,
    Description,
    PriceCents,
    Currency,
    PreviewUrl,
    ThumbnailUrl,
    CategoryId,
    LemonsqueezyVariantId,
    FastspringProductPath,
    Published,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Category { Table, Id }
