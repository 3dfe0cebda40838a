use anyhow::anyhow;
use anyhow::Result;
use serde::Deserialize;
use tracing::warn;

/// Secret used when neither `config.toml` nor `JWT_SECRET` supplies one.
pub const DEV_JWT_SECRET: &str = "dev-secret-change-me";

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub payments: PaymentsConfig,
    #[serde(default)]
    pub licenses: LicenseConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub worker_threads: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".into(), port: 8080, worker_threads: Some(4) }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
    #[serde(default = "default_max_lifetime")]
    pub max_lifetime_secs: u64,
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,
    #[serde(default)]
    pub sqlx_logging: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout_secs: default_connect_timeout(),
            idle_timeout_secs: default_idle_timeout(),
            max_lifetime_secs: default_max_lifetime(),
            acquire_timeout_secs: default_acquire_timeout(),
            sqlx_logging: false,
        }
    }
}

fn default_max_connections() -> u32 { 10 }
fn default_min_connections() -> u32 { 2 }
fn default_connect_timeout() -> u64 { 30 }
fn default_idle_timeout() -> u64 { 600 }
fn default_max_lifetime() -> u64 { 3600 }
fn default_acquire_timeout() -> u64 { 30 }
fn default_token_ttl_hours() -> i64 { 12 }

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub jwt_secret: String,
    #[serde(default = "default_token_ttl_hours")]
    pub token_ttl_hours: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self { jwt_secret: String::new(), token_ttl_hours: default_token_ttl_hours() }
    }
}

/// Webhook signing secrets. A provider without a secret has its webhook disabled.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct PaymentsConfig {
    #[serde(default)]
    pub lemonsqueezy_webhook_secret: Option<String>,
    #[serde(default)]
    pub fastspring_webhook_secret: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct LicenseConfig {
    /// `None` issues perpetual licenses.
    #[serde(default)]
    pub validity_days: Option<i64>,
}

pub fn load_default() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    load_from_file(&path)
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    parse(&content)
}

pub fn parse(content: &str) -> Result<AppConfig> {
    let cfg: AppConfig = toml::from_str(content)?;
    Ok(cfg)
}

impl AppConfig {
    /// Load `config.toml` if present, otherwise start from defaults; then
    /// apply environment overrides and validate.
    pub fn load_and_validate() -> Result<Self> {
        let mut cfg = match load_default() {
            Ok(cfg) => cfg,
            Err(e) => {
                warn!(error = %e, "config file not loaded; using defaults and environment");
                AppConfig::default()
            }
        };
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    pub fn from_env() -> Result<Self> {
        let mut cfg = AppConfig::default();
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.server.normalize()?;
        self.database.normalize_from_env();
        self.database.validate()?;
        self.auth.normalize_from_env();
        self.auth.validate()?;
        self.payments.normalize_from_env();
        self.licenses.validate()?;
        Ok(())
    }
}

fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl ServerConfig {
    fn normalize(&mut self) -> Result<()> {
        if let Some(host) = env_non_empty("SERVER_HOST") {
            self.host = host;
        }
        if let Some(port) = env_non_empty("SERVER_PORT") {
            self.port = port.parse().map_err(|_| anyhow!("SERVER_PORT must be a number in 1..=65535"))?;
        }
        if self.host.trim().is_empty() {
            self.host = "127.0.0.1".to_string();
        }
        if self.port == 0 {
            return Err(anyhow!("server.port must be in 1..=65535"));
        }
        if let Some(w) = self.worker_threads {
            if w == 0 { self.worker_threads = Some(4); }
        } else {
            self.worker_threads = Some(4);
        }
        Ok(())
    }
}

impl DatabaseConfig {
    pub fn normalize_from_env(&mut self) {
        if self.url.trim().is_empty() {
            if let Some(url) = env_non_empty("DATABASE_URL") {
                self.url = url;
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(anyhow!("database.url is empty; set it in config.toml or DATABASE_URL"));
        }
        let lower = self.url.to_lowercase();
        if !(lower.starts_with("postgresql://") || lower.starts_with("postgres://")) {
            return Err(anyhow!("database.url must start with postgresql:// or postgres://"));
        }
        if self.min_connections == 0 {
            return Err(anyhow!("database.min_connections must be >= 1"));
        }
        if self.max_connections < self.min_connections {
            return Err(anyhow!("database.max_connections must be >= min_connections"));
        }
        if self.connect_timeout_secs == 0 || self.acquire_timeout_secs == 0 {
            return Err(anyhow!("database timeouts must be positive seconds"));
        }
        Ok(())
    }
}

impl AuthConfig {
    pub fn normalize_from_env(&mut self) {
        if let Some(secret) = env_non_empty("JWT_SECRET") {
            self.jwt_secret = secret;
        }
        if self.jwt_secret.trim().is_empty() {
            warn!("no JWT secret configured; falling back to the development secret");
            self.jwt_secret = DEV_JWT_SECRET.to_string();
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.token_ttl_hours <= 0 {
            return Err(anyhow!("auth.token_ttl_hours must be positive"));
        }
        Ok(())
    }
}

impl PaymentsConfig {
    pub fn normalize_from_env(&mut self) {
        if let Some(s) = env_non_empty("LEMONSQUEEZY_WEBHOOK_SECRET") {
            self.lemonsqueezy_webhook_secret = Some(s);
        }
        if let Some(s) = env_non_empty("FASTSPRING_WEBHOOK_SECRET") {
            self.fastspring_webhook_secret = Some(s);
        }
        // blank secrets in the file count as unset
        self.lemonsqueezy_webhook_secret = self.lemonsqueezy_webhook_secret.take().filter(|s| !s.trim().is_empty());
        self.fastspring_webhook_secret = self.fastspring_webhook_secret.take().filter(|s| !s.trim().is_empty());
    }
}

impl LicenseConfig {
    pub fn validate(&self) -> Result<()> {
        if matches!(self.validity_days, Some(d) if d <= 0) {
            return Err(anyhow!("licenses.validity_days must be positive when set"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_full_file() {
        let cfg = parse(
            r#"
            [server]
            host = "0.0.0.0"
            port = 9000

            [database]
            url = "postgres://u:p@localhost:5432/market"
            max_connections = 20

            [auth]
            jwt_secret = "s3cret"
            token_ttl_hours = 2

            [payments]
            lemonsqueezy_webhook_secret = "ls"

            [licenses]
            validity_days = 365
            "#,
        )
        .unwrap();
        assert_eq!(cfg.server.port, 9000);
        assert_eq!(cfg.database.max_connections, 20);
        assert_eq!(cfg.database.min_connections, 2);
        assert_eq!(cfg.auth.token_ttl_hours, 2);
        assert_eq!(cfg.payments.lemonsqueezy_webhook_secret.as_deref(), Some("ls"));
        assert!(cfg.payments.fastspring_webhook_secret.is_none());
        assert_eq!(cfg.licenses.validity_days, Some(365));
    }

    #[test]
    fn empty_file_uses_defaults() {
        let cfg = parse("").unwrap();
        assert_eq!(cfg.server.host, "127.0.0.1");
        assert_eq!(cfg.auth.token_ttl_hours, 12);
        assert!(cfg.licenses.validity_days.is_none());
    }

    #[test]
    fn database_validation_rejects_bad_urls() {
        let mut db = DatabaseConfig { url: "mysql://x".into(), ..Default::default() };
        assert!(db.validate().is_err());
        db.url = "postgres://localhost/db".into();
        assert!(db.validate().is_ok());
        db.min_connections = 5;
        db.max_connections = 1;
        assert!(db.validate().is_err());
    }

    #[test]
    fn license_validity_must_be_positive() {
        assert!(LicenseConfig { validity_days: Some(0) }.validate().is_err());
        assert!(LicenseConfig { validity_days: Some(30) }.validate().is_ok());
        assert!(LicenseConfig { validity_days: None }.validate().is_ok());
    }

    #[test]
    fn ttl_must_be_positive() {
        let auth = AuthConfig { jwt_secret: "x".into(), token_ttl_hours: 0 };
        assert!(auth.validate().is_err());
    }
}
