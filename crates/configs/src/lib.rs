use std::time::Duration;

use anyhow::anyhow;
use anyhow::Result;
use serde::Deserialize;

/// Secret used when nothing is configured. Only acceptable in development.
pub const DEV_JWT_SECRET: &str = "default-jwt-secret-for-development";
pub const DEVELOPMENT: &str = "development";

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_environment")]
    pub environment: String,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            environment: default_environment(),
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            auth: AuthSettings::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub worker_threads: Option<usize>,
    #[serde(default)]
    pub log_json: bool,
    /// Mark the auth cookie `Secure`; leave off for plain-http development.
    #[serde(default)]
    pub secure_cookies: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".into(), port: 8080, worker_threads: Some(4), log_json: false, secure_cookies: false }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Empty means "no database": the server falls back to the in-memory store.
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

#[derive(Debug, Clone, Deserialize)]
pub struct AuthSettings {
    #[serde(default)]
    pub jwt_secret: Option<String>,
    #[serde(default = "default_access_ttl")]
    pub access_token_ttl: String,
    #[serde(default = "default_refresh_ttl")]
    pub refresh_token_ttl: String,
    #[serde(default = "default_bcrypt_cost")]
    pub bcrypt_cost: u32,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            access_token_ttl: default_access_ttl(),
            refresh_token_ttl: default_refresh_ttl(),
            bcrypt_cost: default_bcrypt_cost(),
        }
    }
}

fn default_environment() -> String { DEVELOPMENT.to_string() }
fn default_max_connections() -> u32 { 10 }
fn default_min_connections() -> u32 { 2 }
fn default_connect_timeout() -> u64 { 30 }
fn default_idle_timeout() -> u64 { 600 }
fn default_max_lifetime() -> u64 { 3600 }
fn default_acquire_timeout() -> u64 { 30 }
fn default_access_ttl() -> String { "1h".to_string() }
fn default_refresh_ttl() -> String { "7d".to_string() }
fn default_bcrypt_cost() -> u32 { 10 }

pub fn load_default() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    load_from_file(&path)
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    let cfg: AppConfig = toml::from_str(&content)?;
    Ok(cfg)
}

impl AppConfig {
    /// Load `config.toml` (or defaults when it is absent), apply environment
    /// overrides and validate.
    pub fn load_and_validate() -> Result<Self> {
        let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
        let mut cfg = if std::path::Path::new(&path).exists() {
            load_from_file(&path)?
        } else {
            AppConfig::default()
        };
        cfg.apply_env(|key| std::env::var(key).ok());
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    /// Overlay environment variables on top of file values. `lookup` is the
    /// variable source so callers can substitute the process environment.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = lookup("APP_ENV") { self.environment = v; }
        if let Some(v) = lookup("SERVER_HOST") { self.server.host = v; }
        if let Some(p) = lookup("SERVER_PORT").and_then(|v| v.parse::<u16>().ok()) { self.server.port = p; }
        if let Some(w) = lookup("TOKIO_WORKER_THREADS").and_then(|v| v.parse::<usize>().ok()) {
            self.server.worker_threads = Some(w);
        }
        if let Some(v) = lookup("LOG_JSON") { self.server.log_json = matches!(v.as_str(), "1" | "true"); }
        if let Some(v) = lookup("DATABASE_URL") {
            if self.database.url.trim().is_empty() { self.database.url = v; }
        }
        if let Some(v) = lookup("JWT_SECRET") { self.auth.jwt_secret = Some(v); }
        if let Some(v) = lookup("JWT_ACCESS_TOKEN_EXPIRES_IN") { self.auth.access_token_ttl = v; }
        if let Some(v) = lookup("JWT_REFRESH_TOKEN_EXPIRES_IN") { self.auth.refresh_token_ttl = v; }
        if let Some(c) = lookup("BCRYPT_COST").and_then(|v| v.parse::<u32>().ok()) { self.auth.bcrypt_cost = c; }
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.server.normalize()?;
        self.database.validate()?;
        self.auth.normalize(&self.environment)?;
        Ok(())
    }

    pub fn is_development(&self) -> bool {
        self.environment.eq_ignore_ascii_case(DEVELOPMENT)
    }
}

impl ServerConfig {
    fn normalize(&mut self) -> Result<()> {
        if self.host.trim().is_empty() {
            self.host = "127.0.0.1".to_string();
        }
        if self.port == 0 {
            return Err(anyhow!("server.port must be within 1..=65535"));
        }
        match self.worker_threads {
            Some(0) | None => self.worker_threads = Some(4),
            Some(_) => {}
        }
        Ok(())
    }
}

impl DatabaseConfig {
    pub fn is_configured(&self) -> bool {
        !self.url.trim().is_empty()
    }

    pub fn validate(&self) -> Result<()> {
        if !self.is_configured() {
            return Ok(());
        }
        let lower = self.url.to_lowercase();
        if !(lower.starts_with("postgresql://") || lower.starts_with("postgres://") || lower.starts_with("sqlite:")) {
            return Err(anyhow!("database.url must start with postgres://, postgresql:// or sqlite:"));
        }
        if self.min_connections == 0 {
            return Err(anyhow!("database.min_connections must be >= 1"));
        }
        if self.max_connections < self.min_connections {
            return Err(anyhow!("database.max_connections must be >= min_connections"));
        }
        if self.connect_timeout_secs == 0 || self.acquire_timeout_secs == 0 {
            return Err(anyhow!("database timeouts must be positive whole seconds"));
        }
        Ok(())
    }
}

impl AuthSettings {
    fn normalize(&mut self, environment: &str) -> Result<()> {
        let development = environment.eq_ignore_ascii_case(DEVELOPMENT);
        let secret = self.jwt_secret.as_deref().map(str::trim).unwrap_or("");
        if secret.is_empty() || secret == DEV_JWT_SECRET {
            if !development {
                return Err(anyhow!(
                    "auth.jwt_secret (JWT_SECRET) must be set to a non-default value in the {environment} environment"
                ));
            }
            self.jwt_secret = Some(DEV_JWT_SECRET.to_string());
        }
        if !(4..=31).contains(&self.bcrypt_cost) {
            return Err(anyhow!("auth.bcrypt_cost must be within 4..=31"));
        }
        self.access_ttl()?;
        self.refresh_ttl()?;
        Ok(())
    }

    /// The signing secret after normalisation; the development default otherwise.
    pub fn secret(&self) -> &str {
        self.jwt_secret.as_deref().unwrap_or(DEV_JWT_SECRET)
    }

    pub fn access_ttl(&self) -> Result<Duration> {
        parse_duration(&self.access_token_ttl)
            .map_err(|e| anyhow!("auth.access_token_ttl: {e}"))
    }

    pub fn refresh_ttl(&self) -> Result<Duration> {
        parse_duration(&self.refresh_token_ttl)
            .map_err(|e| anyhow!("auth.refresh_token_ttl: {e}"))
    }
}

/// Parse lifetimes such as `30s`, `15m`, `1h`, `7d` or `2w`. A bare number is seconds.
pub fn parse_duration(raw: &str) -> Result<Duration> {
    let s = raw.trim();
    if s.is_empty() {
        return Err(anyhow!("empty duration"));
    }
    let split = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    let (digits, unit) = s.split_at(split);
    let value: u64 = digits
        .parse()
        .map_err(|_| anyhow!("invalid duration `{raw}`"))?;
    let multiplier = match unit.trim() {
        "" | "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        "d" => 24 * 60 * 60,
        "w" => 7 * 24 * 60 * 60,
        other => return Err(anyhow!("unknown duration unit `{other}` in `{raw}`")),
    };
    value
        .checked_mul(multiplier)
        .map(Duration::from_secs)
        .ok_or_else(|| anyhow!("duration `{raw}` overflows"))
}
