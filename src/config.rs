use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
    #[error("config validation: {0}")]
    Validation(String),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub monitoring: MonitoringConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,
    /// How often the daemon sweeps rows older than retention_days (real seconds).
    #[serde(default = "default_prune_interval_secs")]
    pub prune_interval_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MonitoringConfig {
    /// Sample tick interval; an explicit `start --interval` overrides it.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    #[serde(default = "default_ping_host")]
    pub ping_host: String,
    #[serde(default = "default_ping_port")]
    pub ping_port: u16,
    #[serde(default = "default_ping_timeout_secs")]
    pub ping_timeout_secs: u64,
    /// How often to log app stats (samples saved/pruned, digests) at INFO level.
    #[serde(default = "default_stats_log_interval_secs")]
    pub stats_log_interval_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotificationsConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_digest_interval_hours")]
    pub digest_interval_hours: u64,
    #[serde(default)]
    pub transport: Option<TransportConfig>,
}

/// One table per transport kind; `type` discriminates.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TransportConfig {
    Email(EmailTransportConfig),
    Webhook(WebhookTransportConfig),
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmailTransportConfig {
    #[serde(default = "default_smtp_host")]
    pub smtp_host: String,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    #[serde(default)]
    pub smtp_user: Option<String>,
    #[serde(default)]
    pub smtp_password: Option<String>,
    #[serde(default = "default_from_email")]
    pub from_email: String,
    pub to_email: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookTransportConfig {
    pub url: String,
    #[serde(default = "default_webhook_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_db_path() -> String {
    "data/syspulse.db".into()
}

fn default_retention_days() -> u32 {
    7
}

fn default_prune_interval_secs() -> u64 {
    3600
}

fn default_interval_secs() -> u64 {
    60
}

fn default_ping_host() -> String {
    "8.8.8.8".into()
}

fn default_ping_port() -> u16 {
    53
}

fn default_ping_timeout_secs() -> u64 {
    5
}

fn default_stats_log_interval_secs() -> u64 {
    300
}

fn default_digest_interval_hours() -> u64 {
    24
}

fn default_smtp_host() -> String {
    "localhost".into()
}

fn default_smtp_port() -> u16 {
    587
}

fn default_from_email() -> String {
    "syspulse@localhost".into()
}

fn default_webhook_timeout_secs() -> u64 {
    10
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            retention_days: default_retention_days(),
            prune_interval_secs: default_prune_interval_secs(),
        }
    }
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            ping_host: default_ping_host(),
            ping_port: default_ping_port(),
            ping_timeout_secs: default_ping_timeout_secs(),
            stats_log_interval_secs: default_stats_log_interval_secs(),
        }
    }
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            digest_interval_hours: default_digest_interval_hours(),
            transport: None,
        }
    }
}

impl AppConfig {
    /// Load from `path`. A missing file is not an error: the daemon runs
    /// with defaults, as a warning. Parse and validation failures are fatal.
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        if !std::path::Path::new(path).exists() {
            tracing::warn!(path, "config file not found, using defaults");
            return Ok(Self::default());
        }
        let s = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.into(),
            source,
        })?;
        Self::load_from_str(&s).map_err(|e| match e {
            ConfigError::Parse { source, .. } => ConfigError::Parse {
                path: path.into(),
                source,
            },
            other => other,
        })
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(s).map_err(|source| ConfigError::Parse {
            path: "<inline>".into(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        ensure(
            !self.database.path.is_empty(),
            "database.path must be non-empty",
        )?;
        ensure(
            self.database.retention_days > 0,
            "database.retention_days must be > 0",
        )?;
        ensure(
            self.database.prune_interval_secs > 0,
            "database.prune_interval_secs must be > 0",
        )?;
        ensure(
            self.monitoring.interval_secs > 0,
            "monitoring.interval_secs must be > 0",
        )?;
        ensure(
            !self.monitoring.ping_host.is_empty(),
            "monitoring.ping_host must be non-empty",
        )?;
        ensure(
            self.monitoring.ping_timeout_secs > 0,
            "monitoring.ping_timeout_secs must be > 0",
        )?;
        ensure(
            self.monitoring.stats_log_interval_secs > 0,
            "monitoring.stats_log_interval_secs must be > 0",
        )?;
        ensure(
            self.notifications.digest_interval_hours > 0,
            "notifications.digest_interval_hours must be > 0",
        )?;
        if self.notifications.enabled {
            match &self.notifications.transport {
                None => {
                    return Err(ConfigError::Validation(
                        "notifications.enabled requires a [notifications.transport] table".into(),
                    ));
                }
                Some(transport) => transport.validate()?,
            }
        }
        Ok(())
    }
}

impl TransportConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self {
            TransportConfig::Email(email) => {
                ensure(
                    !email.to_email.is_empty() && email.to_email.contains('@'),
                    "notifications.transport.to_email must be a mail address",
                )?;
                ensure(
                    !email.smtp_host.is_empty(),
                    "notifications.transport.smtp_host must be non-empty",
                )?;
            }
            TransportConfig::Webhook(webhook) => {
                ensure(
                    webhook.url.starts_with("http://") || webhook.url.starts_with("https://"),
                    "notifications.transport.url must be an http(s) URL",
                )?;
                ensure(
                    webhook.timeout_secs > 0,
                    "notifications.transport.timeout_secs must be > 0",
                )?;
            }
        }
        Ok(())
    }
}

fn ensure(cond: bool, msg: &str) -> Result<(), ConfigError> {
    if cond {
        Ok(())
    } else {
        Err(ConfigError::Validation(msg.into()))
    }
}
