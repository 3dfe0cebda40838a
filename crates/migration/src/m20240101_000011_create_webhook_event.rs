//! Create `webhook_event` table: the idempotency ledger for payment webhooks.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(WebhookEvent::Table)
                    .if_not_exists()
                    .col(uuid(WebhookEvent::Id).primary_key())
                    .col(string_len(WebhookEvent::Provider, 32).not_null())
                    .col(string_len(WebhookEvent::EventId, 191).not_null())
                    .col(string_len(WebhookEvent::EventType, 64).not_null())
                    .col(text(WebhookEvent::Payload).not_null())
                    .col(timestamp_with_time_zone_null(WebhookEvent::ProcessedAt))
                    .col(timestamp_with_time_zone(WebhookEvent::CreatedAt).not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uniq_webhook_event_provider_event")
                    .table(WebhookEvent::Table)
                    .col(WebhookEvent::Provider)
                    .col(WebhookEvent::EventId)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(WebhookEvent::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum WebhookEvent { Table, Id, Provider, EventId, EventType, Payload, ProcessedAt, CreatedAt }
