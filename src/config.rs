use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::constants;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub server: ServerConfig,

    pub security: SecurityConfig,

    pub mail: MailConfig,

    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub database_path: String,

    pub log_level: String,

    /// Directory for uploaded recipe images, served under `/images`.
    pub uploads_path: String,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,

    pub max_db_connections: u32,

    pub min_db_connections: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database_path: "sqlite:data/cookbook.db".to_string(),
            log_level: "info".to_string(),
            uploads_path: "uploads".to_string(),
            worker_threads: 2,
            max_db_connections: 5,
            min_db_connections: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,

    /// Base URL used when building links for outgoing mail.
    pub public_url: String,

    /// Whether to set the Secure flag on session cookies.
    /// Set to false for local development without HTTPS.
    pub secure_cookies: bool,

    pub session_inactivity_minutes: i64,

    /// Keep sessions in the database instead of process memory.
    pub persistent_sessions: bool,

    pub cors_allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            public_url: "http://localhost:3000".to_string(),
            secure_cookies: true,
            session_inactivity_minutes: 60,
            persistent_sessions: true,
            cors_allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://127.0.0.1:3000".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Argon2 memory cost in KiB
    pub argon2_memory_cost_kib: u32,

    /// Argon2 time cost (iterations)
    pub argon2_time_cost: u32,

    pub argon2_parallelism: u32,

    pub password_reset: PasswordResetConfig,

    /// Proxy addresses allowed to supply `X-Forwarded-For`.
    ///
    /// When empty, forwarded headers are ignored for rate limiting and the
    /// socket peer address is used.
    pub trusted_proxy_ips: Vec<String>,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            argon2_memory_cost_kib: 8192,
            argon2_time_cost: 3,
            argon2_parallelism: 1,
            password_reset: PasswordResetConfig::default(),
            trusted_proxy_ips: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PasswordResetConfig {
    pub token_ttl_minutes: i64,

    /// Reset requests allowed per client address inside one window.
    pub max_requests: u32,

    pub window_seconds: u64,
}

impl Default for PasswordResetConfig {
    fn default() -> Self {
        Self {
            token_ttl_minutes: constants::reset::DEFAULT_TTL_MINUTES,
            max_requests: constants::reset::DEFAULT_MAX_REQUESTS,
            window_seconds: constants::reset::DEFAULT_WINDOW_SECONDS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MailTransportConfig {
    Smtp {
        host: String,
        port: u16,
        username: String,
        /// Falls back to `COOKBOOK_SMTP_PASSWORD` when empty.
        #[serde(default, skip_serializing)]
        password: String,
        use_tls: bool,
    },
    /// Writes each message as a file, for development.
    File { path: String },
    /// Only logs that a message would have been sent.
    Log,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MailConfig {
    pub transport: MailTransportConfig,

    pub from_email: String,

    pub from_name: String,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            transport: MailTransportConfig::Log,
            from_email: "noreply@localhost".to_string(),
            from_name: "Cookbook".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub metrics_enabled: bool,

    pub loki_enabled: bool,

    pub loki_url: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: true,
            loki_enabled: false,
            loki_url: "http://localhost:3100".to_string(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let paths = Self::config_paths();

        for path in &paths {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                return Self::load_from_path(path);
            }
        }

        info!("No config file found, using defaults");
        Ok(Self::default())
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let mut config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config.apply_env();
        Ok(config)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    fn apply_env(&mut self) {
        if let MailTransportConfig::Smtp { password, .. } = &mut self.mail.transport
            && password.is_empty()
            && let Ok(from_env) = std::env::var("COOKBOOK_SMTP_PASSWORD")
        {
            *password = from_env;
        }
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![];

        paths.push(PathBuf::from("config.toml"));

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("cookbook").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".cookbook").join("config.toml"));
        }

        paths
    }

    fn default_config_path() -> PathBuf {
        PathBuf::from("config.toml")
    }

    pub fn create_default_if_missing() -> Result<bool> {
        let path = Self::default_config_path();
        if path.exists() {
            Ok(false)
        } else {
            let config = Self::default();
            config.save_to_path(&path)?;
            info!("Created default config file: {}", path.display());
            Ok(true)
        }
    }

    pub fn validate(&self) -> Result<()> {
        let reset = &self.security.password_reset;
        if !(1..=constants::reset::MAX_TTL_MINUTES).contains(&reset.token_ttl_minutes) {
            anyhow::bail!(
                "password_reset.token_ttl_minutes must be between 1 and {}",
                constants::reset::MAX_TTL_MINUTES
            );
        }
        if reset.max_requests == 0 || reset.window_seconds == 0 {
            anyhow::bail!("password_reset rate limit needs max_requests and window_seconds > 0");
        }

        if self.server.session_inactivity_minutes <= 0 {
            anyhow::bail!("server.session_inactivity_minutes must be > 0");
        }

        url::Url::parse(&self.server.public_url)
            .with_context(|| format!("Invalid public_url: {}", self.server.public_url))?;

        if let MailTransportConfig::Smtp { host, .. } = &self.mail.transport
            && host.is_empty()
        {
            anyhow::bail!("SMTP host cannot be empty");
        }

        Ok(())
    }
}
