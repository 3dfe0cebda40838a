use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

const INDEXES: &[(&str, &str, &str)] = &[
    ("idx_post_category", "post", "category_id"),
    ("idx_post_published", "post", "published"),
    ("idx_template_category", "template", "category_id"),
    ("idx_template_published", "template", "published"),
    ("idx_review_template", "review", "template_id"),
    ("idx_orders_user", "orders", "user_id"),
    ("idx_orders_customer_email", "orders", "customer_email"),
    ("idx_order_item_order", "order_item", "order_id"),
    ("idx_license_order", "license", "order_id"),
    ("idx_license_user", "license", "user_id"),
];

/// Provider references must map to a single template when set.
const PARTIAL_UNIQUE: &[(&str, &str, &str)] = &[
    ("uq_template_lemonsqueezy_variant", "template", "lemonsqueezy_variant_id"),
    ("uq_template_fastspring_product", "template", "fastspring_product_path"),
];

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for (name, table, col) in INDEXES {
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name(*name)
                        .table(Alias::new(*table))
                        .col(Alias::new(*col))
                        .to_owned(),
                )
                .await?;
        }
        let conn = manager.get_connection();
        for (name, table, col) in PARTIAL_UNIQUE {
            conn.execute_unprepared(&format!(
                "CREATE UNIQUE INDEX IF NOT EXISTS {name} ON {table} ({col}) WHERE {col} IS NOT NULL"
            ))
            .await?;
        }
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let conn = manager.get_connection();
        for (name, _, _) in PARTIAL_UNIQUE {
            conn.execute_unprepared(&format!("DROP INDEX IF EXISTS {name}")).await?;
        }
        for (name, table, _) in INDEXES {
            manager
                .drop_index(Index::drop().name(*name).table(Alias::new(*table)).to_owned())
                .await?;
        }
        Ok(())
    }
}
