use anyhow::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure for the ledger portal client
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct LedgerPortalConfig {
    /// Portal API connection settings
    pub api: ApiConfig,
    /// Identity of the client whose documents are managed
    pub client: ClientConfig,
    /// Payment reminder settings
    pub reminders: ReminderConfig,
    /// Observability settings
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the portal API, e.g. https://portal.example.com/api
    pub base_url: String,
    /// Session cookie value (can be set via env var)
    pub session_cookie: Option<String>,
    /// Name of the session cookie
    pub cookie_name: String,
    /// Origin of the web app hosting the login route, if different from the API
    pub login_base_url: Option<String>,
    /// Route users are sent to when the session is rejected
    pub login_path: String,
    /// Per-request timeout
    pub timeout_seconds: u64,
    /// Rate limiting settings
    pub rate_limit: RateLimitConfig,
    /// Response cache settings
    pub cache: CacheConfig,
}

impl ApiConfig {
    pub fn login_base_url(&self) -> &str {
        self.login_base_url.as_deref().unwrap_or(&self.base_url)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000/api".to_string(),
            session_cookie: None, // Will be read from env var or .ledger-portal-rc
            cookie_name: "token".to_string(),
            login_base_url: None,
            login_path: "/login".to_string(),
            timeout_seconds: 30,
            rate_limit: RateLimitConfig::default(),
            cache: CacheConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Sustained requests per second
    pub requests_per_second: u32,
    /// Burst capacity
    pub burst_capacity: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_second: 5,
            burst_capacity: 20,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    pub max_entries: u64,
    pub ttl_seconds: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 256,
            ttl_seconds: 30,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Client identifier used to key local reminder preferences
    pub client_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ReminderConfig {
    /// Path to the reminder preference file
    pub state_file_path: String,
    /// Days at the start of the following month during which the reminder shows
    pub window_days: u32,
}

impl Default for ReminderConfig {
    fn default() -> Self {
        Self {
            state_file_path: ".ledger-portal/reminders.json".to_string(),
            window_days: 1,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level used when RUST_LOG is unset
    pub log_level: String,
    /// Emit JSON log lines instead of human-readable ones
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
            json_logs: true,
        }
    }
}

impl LedgerPortalConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Default values
    /// 2. Configuration files (ledger-portal.toml, .ledger-portal-rc)
    /// 3. Environment variables (prefixed with LEDGER_PORTAL_)
    pub fn load() -> Result<Self> {
        let mut builder = Config::builder();

        if Path::new("ledger-portal.toml").exists() {
            builder = builder.add_source(File::with_name("ledger-portal"));
        }

        if Path::new(".ledger-portal-rc").exists() {
            builder = builder.add_source(
                File::with_name(".ledger-portal-rc").format(config::FileFormat::Toml),
            );
        }

        // LEDGER_PORTAL_API__SESSION_COOKIE -> api.session_cookie
        builder = builder.add_source(
            Environment::with_prefix("LEDGER_PORTAL")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        let mut portal_config: LedgerPortalConfig = config.try_deserialize()?;

        // Special handling for the session cookie - check the short env var too
        if portal_config.api.session_cookie.is_none() {
            if let Ok(token) = std::env::var(SESSION_ENV_VAR) {
                portal_config.api.session_cookie = Some(token);
            }
        }

        Ok(portal_config)
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let toml_content = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_content)?;
        Ok(())
    }

    /// Load .env file if it exists
    pub fn load_env_file() -> Result<()> {
        if Path::new(".env").exists() {
            dotenvy::dotenv()?;
            tracing::info!("Loaded environment variables from .env file");
        }
        Ok(())
    }

    /// Client id for reminder keys, falling back to the session-less default.
    pub fn client_id(&self) -> &str {
        self.client.client_id.as_deref().unwrap_or("default")
    }
}

/// Short environment variable holding the session cookie value.
pub const SESSION_ENV_VAR: &str = "LEDGER_PORTAL_SESSION";

/// Global configuration instance
static CONFIG: std::sync::LazyLock<Result<LedgerPortalConfig, anyhow::Error>> =
    std::sync::LazyLock::new(|| {
        // Load .env file first
        let _ = LedgerPortalConfig::load_env_file();
        LedgerPortalConfig::load()
    });

/// Get the global configuration
pub fn config() -> Result<&'static LedgerPortalConfig> {
    CONFIG
        .as_ref()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))
}

/// Initialize configuration (called at startup)
pub fn init_config() -> Result<()> {
    let _config = config()?;
    tracing::info!("Configuration loaded successfully");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = LedgerPortalConfig::default();
        assert_eq!(cfg.api.cookie_name, "token");
        assert_eq!(cfg.api.login_path, "/login");
        assert_eq!(cfg.reminders.window_days, 1);
        assert_eq!(cfg.client_id(), "default");
        assert_eq!(cfg.api.login_base_url(), cfg.api.base_url);
    }

    #[test]
    fn test_save_and_reload_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger-portal.toml");

        let mut cfg = LedgerPortalConfig::default();
        cfg.api.base_url = "https://portal.example.com/api".to_string();
        cfg.client.client_id = Some("client-42".to_string());
        cfg.save_to_file(&path).unwrap();

        let loaded: LedgerPortalConfig = Config::builder()
            .add_source(File::from(path.as_path()))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        assert_eq!(loaded.api.base_url, "https://portal.example.com/api");
        assert_eq!(loaded.client_id(), "client-42");
        assert_eq!(loaded.api.timeout_seconds, 30);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let loaded: LedgerPortalConfig = Config::builder()
            .add_source(File::from_str(
                "[api]\nbase_url = \"https://x.test/api\"\n",
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        assert_eq!(loaded.api.base_url, "https://x.test/api");
        assert_eq!(loaded.api.cookie_name, "token");
        assert_eq!(loaded.reminders.state_file_path, ".ledger-portal/reminders.json");
    }

    #[test]
    fn test_auth_hint_names_a_variable_the_loader_reads() {
        let hint = crate::portal::PortalError::Unauthorized {
            login_url: "https://portal.example.com/login".to_string(),
        }
        .to_string();
        assert!(hint.contains(&format!("export {SESSION_ENV_VAR}=")));

        std::env::remove_var("LEDGER_PORTAL_API__SESSION_COOKIE");
        std::env::set_var(SESSION_ENV_VAR, "from-short-var");
        let loaded = LedgerPortalConfig::load().unwrap();
        std::env::remove_var(SESSION_ENV_VAR);

        assert_eq!(loaded.api.session_cookie.as_deref(), Some("from-short-var"));
    }
}
