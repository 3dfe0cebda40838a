//! Create `newsletter_subscriber` table; addresses are unique and never hard-deleted on unsubscribe.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(NewsletterSubscriber::Table)
                    .if_not_exists()
                    .col(uuid(NewsletterSubscriber::Id).primary_key())
                    .col(string_len(NewsletterSubscriber::Email, 255).unique_key().not_null())
                    .col(string_len(NewsletterSubscriber::Status, 16).not_null())
                    .col(timestamp_with_time_zone(NewsletterSubscriber::SubscribedAt).not_null())
                    .col(timestamp_with_time_zone_null(NewsletterSubscriber::UnsubscribedAt))
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(NewsletterSubscriber::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum NewsletterSubscriber { Table, Id, Email, Status, SubscribedAt, UnsubscribedAt }
