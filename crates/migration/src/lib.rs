//! Migrator registering entity-specific migrations in dependency order.
//! Indexes are applied last.
pub use sea_orm_migration::prelude::*;

mod m20240101_000001_create_user;
mod m20240101_000002_create_user_credentials;
mod m20240101_000003_create_category;
mod m20240101_000004_create_post;
mod m20240101_000005_create_template;
mod m20240101_000006_create_review;
mod m20240101_000007_create_contact_message;
mod m20240101_000008_create_newsletter_subscriber;
mod m20240101_000009_create_orders;
mod m20240101_000010_create_license;
mod m20240101_000011_create_webhook_event;
mod m20240101_000099_add_indexes;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_user::Migration),
            Box::new(m20240101_000002_create_user_credentials::Migration),
            Box::new(m20240101_000003_create_category::Migration),
            Box::new(m20240101_000004_create_post::Migration),
            Box::new(m20240101_000005_create_template::Migration),
            Box::new(m20240101_000006_create_review::Migration),
            Box::new(m20240101_000007_create_contact_message::Migration),
            Box::new(m20240101_000008_create_newsletter_subscriber::Migration),
            Box::new(m20240101_000009_create_orders::Migration),
            Box::new(m20240101_000010_create_license::Migration),
            Box::new(m20240101_000011_create_webhook_event::Migration),
            // Indexes should always be applied last
            Box::new(m20240101_000099_add_indexes::Migration),
        ]
    }
}
