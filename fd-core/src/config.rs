//! `config.toml`: backend, account, database, logging and automation settings.
//!
//! Configuration is persisted as TOML in the data directory. Every section
//! falls back to defaults so a partial file is always valid.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use serde::{Deserialize, Serialize};

use crate::constants;
use crate::error::{FdError, FdResult};
use crate::platform;

/// The whole `config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Hosted backend connection settings.
    #[serde(default)]
    pub backend: BackendConfig,

    /// Account the CLI acts on behalf of.
    #[serde(default)]
    pub account: AccountConfig,

    /// Local database settings.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Log level, directory and format.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Automation dispatch settings.
    #[serde(default)]
    pub automation: AutomationConfig,
}

/// Hosted backend (REST + auth + edge functions) configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Project URL, e.g. "https://abcd.supabase.co".
    #[serde(default)]
    pub url: String,

    /// Public API key sent as the `apikey` header.
    #[serde(default)]
    pub api_key: String,

    /// Session access token sent as a bearer token. Falls back to the API key.
    #[serde(default)]
    pub access_token: String,

    /// Request timeout in milliseconds.
    #[serde(default = "default_api_timeout")]
    pub api_timeout_ms: u64,

    /// Accept invalid TLS certificates (local development backends).
    #[serde(default)]
    pub accept_invalid_certs: bool,
}

/// Account scoping configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountConfig {
    /// Account (user) identifier every query is scoped to.
    #[serde(default)]
    pub user_id: String,

    /// Display currency code for amounts.
    #[serde(default = "default_currency")]
    pub currency: String,
}

/// Where records are read from and written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreMode {
    /// Local SQLite database.
    #[default]
    Local,
    /// Hosted backend over HTTP.
    Remote,
}

/// How automation actions are delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutorMode {
    /// Append to the local outbox table.
    #[default]
    Outbox,
    /// Invoke the backend edge function named by the action.
    Http,
}

/// Automation dispatch configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutomationConfig {
    /// Record store the dispatcher resolves entities from.
    #[serde(default)]
    pub store: StoreMode,

    /// Action delivery mechanism.
    #[serde(default)]
    pub executor: ExecutorMode,

    /// Maximum candidate rows offered for a target pick.
    #[serde(default = "default_candidate_limit")]
    pub candidate_limit: u32,
}

/// Local database configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file. If empty, uses the default location.
    #[serde(default)]
    pub path: String,

    /// Enable WAL (Write-Ahead Logging) mode.
    #[serde(default = "default_true")]
    pub wal_mode: bool,

    /// Pool size; at least one connection is always kept.
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,

    /// Run `PRAGMA integrity_check` when the database is opened.
    #[serde(default = "default_true")]
    pub integrity_check_on_startup: bool,
}

/// `[logging]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter level when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Directory for log files. If empty, uses the default location.
    #[serde(default)]
    pub directory: String,

    /// Write the log file as JSON lines.
    #[serde(default)]
    pub json_output: bool,
}


fn default_api_timeout() -> u64 {
    constants::DEFAULT_API_TIMEOUT_MS
}

fn default_true() -> bool {
    true
}

fn default_pool_size() -> u32 {
    4
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_currency() -> String {
    "EUR".to_string()
}

fn default_candidate_limit() -> u32 {
    constants::AUTOMATION_CANDIDATE_LIMIT
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            api_key: String::new(),
            access_token: String::new(),
            api_timeout_ms: default_api_timeout(),
            accept_invalid_certs: false,
        }
    }
}

impl Default for AccountConfig {
    fn default() -> Self {
        Self {
            user_id: String::new(),
            currency: default_currency(),
        }
    }
}

impl Default for AutomationConfig {
    fn default() -> Self {
        Self {
            store: StoreMode::Local,
            executor: ExecutorMode::Outbox,
            candidate_limit: default_candidate_limit(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: String::new(),
            wal_mode: true,
            pool_size: default_pool_size(),
            integrity_check_on_startup: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            directory: String::new(),
            json_output: false,
        }
    }
}

impl BackendConfig {
    /// Token used in the `Authorization` header.
    pub fn bearer_token(&self) -> &str {
        if self.access_token.is_empty() {
            &self.api_key
        } else {
            &self.access_token
        }
    }
}

impl AppConfig {
    /// `config.toml` in the home directory, or defaults when there is none.
    pub fn load_default() -> FdResult<Self> {
        let path = Self::default_config_path()?;
        if path.exists() {
            Self::load_from_file(&path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn load_from_file(path: &Path) -> FdResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Write as pretty TOML, creating parent directories.
    pub fn save_to_file(&self, path: &Path) -> FdResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = toml::to_string_pretty(self)
            .map_err(|e| FdError::Config(format!("failed to serialize config: {e}")))?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn default_config_path() -> FdResult<PathBuf> {
        platform::config_file()
    }

    /// `database.path`, or `freelancedesk.db` in the home directory.
    pub fn effective_db_path(&self) -> FdResult<PathBuf> {
        if self.database.path.is_empty() {
            platform::database_file()
        } else {
            Ok(PathBuf::from(&self.database.path))
        }
    }

    /// `logging.directory`, or `logs/` in the home directory.
    pub fn effective_log_dir(&self) -> FdResult<PathBuf> {
        if self.logging.directory.is_empty() {
            platform::log_dir()
        } else {
            Ok(PathBuf::from(&self.logging.directory))
        }
    }

    /// Whether the hosted backend connection is configured.
    pub fn is_backend_configured(&self) -> bool {
        !self.backend.url.is_empty() && !self.backend.api_key.is_empty()
    }

    /// The account id, or an error naming the missing setting.
    pub fn require_account(&self) -> FdResult<&str> {
        if self.account.user_id.trim().is_empty() {
            Err(FdError::MissingConfig("account.user_id".into()))
        } else {
            Ok(self.account.user_id.trim())
        }
    }

    /// Normalize a backend URL: add a scheme, strip quotes and trailing slashes.
    ///
    /// Hosts without a scheme get https, except localhost-style hosts.
    pub fn sanitize_backend_url(url: &str) -> String {
        let trimmed = url.trim().trim_matches('"').trim();
        if trimmed.is_empty() {
            return String::new();
        }

        let with_scheme = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            trimmed.to_string()
        } else if trimmed.starts_with("localhost") || trimmed.starts_with("127.0.0.1") {
            format!("http://{trimmed}")
        } else {
            format!("https://{trimmed}")
        };

        with_scheme.trim_end_matches('/').to_string()
    }
}

/// Shared, async-locked configuration.
#[derive(Clone)]
pub struct ConfigHandle {
    inner: Arc<RwLock<AppConfig>>,
}

impl ConfigHandle {
    pub fn new(config: AppConfig) -> Self {
        Self {
            inner: Arc::new(RwLock::new(config)),
        }
    }

    pub async fn read(&self) -> tokio::sync::RwLockReadGuard<'_, AppConfig> {
        self.inner.read().await
    }

    pub async fn write(&self) -> tokio::sync::RwLockWriteGuard<'_, AppConfig> {
        self.inner.write().await
    }

    /// Snapshot of the account id, or a missing-config error.
    pub async fn account_id(&self) -> FdResult<String> {
        let config = self.inner.read().await;
        config.require_account().map(str::to_string)
    }
}
