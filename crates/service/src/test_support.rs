#![cfg(test)]
use tokio::sync::OnceCell;
use sea_orm::DatabaseConnection;
use migration::MigratorTrait;
use configs::DatabaseConfig;
use models::db::connect_with_config;

// Ensure migrations run only once across the entire test process
static MIGRATED: OnceCell<bool> = OnceCell::const_new();

fn test_config() -> Option<DatabaseConfig> {
    if std::env::var("SKIP_DB_TESTS").is_ok() {
        return None;
    }
    let _ = dotenvy::dotenv();
    let mut cfg = DatabaseConfig::default();
    cfg.normalize_from_env();
    cfg.validate().ok()?;
    cfg.min_connections = 1;
    cfg.acquire_timeout_secs = 10;
    Some(cfg)
}

/// A migrated connection, or `None` when no test database is configured.
pub async fn get_db() -> Result<Option<DatabaseConnection>, anyhow::Error> {
    let Some(cfg) = test_config() else { return Ok(None) };

    // Run migrations exactly once, with a throwaway connection
    let migrated = *MIGRATED
        .get_or_init(|| async {
            match connect_with_config(&cfg).await {
                Ok(db) => migration::Migrator::up(&db, None).await.is_ok(),
                Err(_) => false,
            }
        })
        .await;
    if !migrated {
        anyhow::bail!("test database configured but migrations failed");
    }

    // Return a fresh connection for the current test's runtime
    Ok(Some(connect_with_config(&cfg).await?))
}
