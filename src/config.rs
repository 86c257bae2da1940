use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;

/// Application configuration
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub jwt: JwtConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_busy_timeout")]
    pub busy_timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    #[serde(default = "default_jwt_secret")]
    pub secret: String,
    #[serde(default = "default_token_expire")]
    pub token_expire_minutes: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_blob_path")]
    pub blob_path: String,
    #[serde(default = "default_max_upload")]
    pub max_upload_bytes: u64,
    #[serde(default = "default_quota")]
    pub default_quota_bytes: i64,
    /// Seconds between orphan sweeps; 0 disables the background sweep.
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
}

// Default values
fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_db_path() -> String {
    "data/filevault.db".to_string()
}

fn default_max_connections() -> u32 {
    5
}

fn default_busy_timeout() -> u64 {
    5000
}

fn default_jwt_secret() -> String {
    String::new()
}

fn default_token_expire() -> u64 {
    24 * 60 // 24 hours
}

fn default_blob_path() -> String {
    "data/blobs".to_string()
}

fn default_max_upload() -> u64 {
    100 * 1024 * 1024 // 100 MiB
}

fn default_quota() -> i64 {
    10 * 1024 * 1024 * 1024 // 10 GiB
}

fn default_sweep_interval() -> u64 {
    300
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            max_connections: default_max_connections(),
            busy_timeout_ms: default_busy_timeout(),
        }
    }
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: default_jwt_secret(),
            token_expire_minutes: default_token_expire(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            blob_path: default_blob_path(),
            max_upload_bytes: default_max_upload(),
            default_quota_bytes: default_quota(),
            sweep_interval_secs: default_sweep_interval(),
        }
    }
}

impl Config {
    /// Load configuration from file and environment variables
    pub fn load() -> anyhow::Result<Self> {
        let mut config = Self::load_from_file()?;
        config.apply_env_overrides();
        config.validate()?;
        config.ensure_directories()?;
        config.ensure_jwt_secret()?;
        tracing::info!(
            "Storage config: blob_path={}, max_upload_bytes={}, default_quota_bytes={}",
            config.storage.blob_path,
            config.storage.max_upload_bytes,
            config.storage.default_quota_bytes
        );
        Ok(config)
    }

    /// Parse configuration from TOML text (defaults fill missing keys)
    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Ensure JWT secret is set and persisted
    fn ensure_jwt_secret(&mut self) -> anyhow::Result<()> {
        if !self.jwt.secret.is_empty() {
            return Ok(());
        }

        let secret_path = Path::new("data/.jwt_secret");
        if secret_path.exists() {
            let secret = fs::read_to_string(secret_path)?;
            self.jwt.secret = secret.trim().to_string();
            tracing::info!("Loaded persisted JWT secret from data/.jwt_secret");
        } else {
            let secret = format!("{}{}", uuid::Uuid::new_v4().simple(), uuid::Uuid::new_v4().simple());
            if let Some(parent) = secret_path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(secret_path, &secret)?;
            self.jwt.secret = secret;
            tracing::info!("Generated and persisted new JWT secret to data/.jwt_secret");
        }
        Ok(())
    }

    /// Load configuration from conf.ini or config.toml
    fn load_from_file() -> anyhow::Result<Self> {
        let config_paths = ["conf.ini", "config.toml", "data/conf.ini", "data/config.toml"];

        for path in config_paths {
            if Path::new(path).exists() {
                let content = fs::read_to_string(path)?;
                let config = Self::from_toml(&content)?;
                tracing::info!("Loaded configuration from {}", path);
                return Ok(config);
            }
        }

        tracing::info!("No configuration file found, using defaults");
        Ok(Config::default())
    }

    /// Apply environment variable overrides
    /// Format: FV_CONF_<SECTION>_<KEY>
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        // Server overrides
        if let Some(val) = lookup("FV_CONF_SERVER_HOST") {
            self.server.host = val;
        }
        if let Some(port) = lookup("FV_CONF_SERVER_PORT").and_then(|v| v.parse().ok()) {
            self.server.port = port;
        }

        // Database overrides
        if let Some(val) = lookup("FV_CONF_DATABASE_PATH") {
            self.database.path = val;
        }
        if let Some(n) = lookup("FV_CONF_DATABASE_MAX_CONNECTIONS").and_then(|v| v.parse().ok()) {
            self.database.max_connections = n;
        }
        if let Some(ms) = lookup("FV_CONF_DATABASE_BUSY_TIMEOUT_MS").and_then(|v| v.parse().ok()) {
            self.database.busy_timeout_ms = ms;
        }

        // JWT overrides
        if let Some(val) = lookup("FV_CONF_JWT_SECRET") {
            self.jwt.secret = val;
        }
        if let Some(minutes) = lookup("FV_CONF_JWT_TOKEN_EXPIRE").and_then(|v| v.parse().ok()) {
            self.jwt.token_expire_minutes = minutes;
        }

        // Storage overrides
        if let Some(val) = lookup("FV_CONF_STORAGE_BLOB_PATH") {
            self.storage.blob_path = val;
        }
        if let Some(n) = lookup("FV_CONF_STORAGE_MAX_UPLOAD_BYTES").and_then(|v| v.parse().ok()) {
            self.storage.max_upload_bytes = n;
        }
        if let Some(n) = lookup("FV_CONF_STORAGE_DEFAULT_QUOTA_BYTES").and_then(|v| v.parse().ok()) {
            self.storage.default_quota_bytes = n;
        }
        if let Some(n) = lookup("FV_CONF_STORAGE_SWEEP_INTERVAL_SECS").and_then(|v| v.parse().ok()) {
            self.storage.sweep_interval_secs = n;
        }
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.storage.max_upload_bytes == 0 {
            anyhow::bail!("storage.max_upload_bytes must be greater than zero");
        }
        if self.storage.default_quota_bytes < 0 {
            anyhow::bail!("storage.default_quota_bytes must not be negative");
        }
        if self.database.max_connections == 0 {
            anyhow::bail!("database.max_connections must be greater than zero");
        }
        Ok(())
    }

    /// Ensure required directories exist
    fn ensure_directories(&self) -> anyhow::Result<()> {
        if let Some(parent) = Path::new(&self.database.path).parent() {
            fs::create_dir_all(parent)?;
        }
        fs::create_dir_all(&self.storage.blob_path)?;
        Ok(())
    }
}
