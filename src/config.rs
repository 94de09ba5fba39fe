//! Configuration parsing and structures

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::auth::client_credentials::DEFAULT_LOGIN_URL;
use crate::env::substitute_env_vars;
use crate::graph::DEFAULT_GRAPH_URL;

// =============================================================================
// Raw Config (Deserialized from YAML)
// =============================================================================

/// Raw configuration as deserialized from YAML.
/// Converted to `Config` via `resolve()`, which expands `${VAR}` references.
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    pub connector: RawConnectorConfig,

    /// Root folder inside the document library
    #[serde(default = "default_prefix")]
    pub prefix: String,
}

/// Connector section as written in the file
#[derive(Clone, Deserialize)]
pub struct RawConnectorConfig {
    pub tenant_id: String,
    pub client_id: String,
    pub client_secret: String,

    /// Site name, as in `https://<host>/sites/<site>`
    pub site: String,

    pub graph_url: Option<String>,
    pub login_url: Option<String>,

    /// Per-request HTTP timeout (e.g. "30s")
    #[serde(default)]
    #[serde(with = "humantime_serde")]
    pub timeout: Option<Duration>,
}

impl fmt::Debug for RawConnectorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawConnectorConfig")
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("site", &self.site)
            .finish_non_exhaustive()
    }
}

fn default_prefix() -> String {
    "/".to_string()
}

// =============================================================================
// Resolved Config (Ready for use)
// =============================================================================

/// Top-level configuration (resolved from RawConfig)
#[derive(Debug, Clone)]
pub struct Config {
    pub logging: LoggingConfig,
    pub connector: ConnectorConfig,
    pub prefix: String,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Connector configuration (fully resolved)
#[derive(Clone)]
pub struct ConnectorConfig {
    pub tenant_id: String,
    pub client_id: String,
    pub client_secret: String,
    pub site: String,
    /// Graph API root, without trailing slash
    pub graph_url: String,
    /// Identity platform host
    pub login_url: String,
    pub timeout: Option<Duration>,
}

impl ConnectorConfig {
    pub fn new(tenant_id: &str, client_id: &str, client_secret: &str, site: &str) -> Self {
        Self {
            tenant_id: tenant_id.to_string(),
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            site: site.to_string(),
            ..Default::default()
        }
    }
}

impl Default for ConnectorConfig {
    fn default() -> Self {
        Self {
            tenant_id: String::new(),
            client_id: String::new(),
            client_secret: String::new(),
            site: String::new(),
            graph_url: DEFAULT_GRAPH_URL.to_string(),
            login_url: DEFAULT_LOGIN_URL.to_string(),
            timeout: None,
        }
    }
}

impl fmt::Debug for ConnectorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectorConfig")
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("site", &self.site)
            .field("graph_url", &self.graph_url)
            .field("login_url", &self.login_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

// =============================================================================
// Resolution Logic
// =============================================================================

impl RawConfig {
    /// Expand environment references and fill in endpoint defaults
    pub fn resolve(self) -> Result<Config, ConfigError> {
        let RawConfig {
            logging,
            connector,
            prefix,
        } = self;

        let connector = ConnectorConfig {
            tenant_id: substitute_env_vars(&connector.tenant_id)?,
            client_id: substitute_env_vars(&connector.client_id)?,
            client_secret: substitute_env_vars(&connector.client_secret)?,
            site: substitute_env_vars(&connector.site)?,
            graph_url: connector
                .graph_url
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_GRAPH_URL.to_string()),
            login_url: connector
                .login_url
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_LOGIN_URL.to_string()),
            timeout: connector.timeout,
        };

        Ok(Config {
            logging,
            connector,
            prefix: substitute_env_vars(&prefix)?,
        })
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file(path: &PathBuf) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadError(path.clone(), e.to_string()))?;

        Self::from_str(&content)
    }

    /// Parse configuration from a YAML string
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig =
            serde_yaml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        raw.resolve()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        let c = &self.connector;

        for (field, value) in [
            ("tenant_id", &c.tenant_id),
            ("client_id", &c.client_id),
            ("client_secret", &c.client_secret),
            ("site", &c.site),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::ValidationError(format!(
                    "connector.{} cannot be empty",
                    field
                )));
            }
        }

        for (field, value) in [("graph_url", &c.graph_url), ("login_url", &c.login_url)] {
            if !value.starts_with("https://") && !value.starts_with("http://") {
                return Err(ConfigError::ValidationError(format!(
                    "connector.{} must be an http(s) URL: {}",
                    field, value
                )));
            }
        }

        Ok(())
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {0}: {1}")]
    ReadError(PathBuf, String),

    #[error("Failed to parse config: {0}")]
    ParseError(String),

    #[error("Configuration validation error: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_minimal_config() {
        let yaml = r#"
connector:
  tenant_id: contoso-tenant
  client_id: app-id
  client_secret: app-secret
  site: Documents
"#;

        let config = Config::from_str(yaml).unwrap();
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.prefix, "/");
        assert_eq!(config.connector.site, "Documents");
        assert_eq!(config.connector.graph_url, DEFAULT_GRAPH_URL);
        assert_eq!(config.connector.login_url, DEFAULT_LOGIN_URL);
        assert_eq!(config.connector.timeout, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_full_config() {
        let yaml = r#"
logging:
  level: debug
connector:
  tenant_id: contoso-tenant
  client_id: app-id
  client_secret: app-secret
  site: Team Site
  graph_url: "http://localhost:8080/v1.0/"
  login_url: "http://localhost:8081"
  timeout: 30s
prefix: exports/
"#;

        let config = Config::from_str(yaml).unwrap();
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.prefix, "exports/");
        assert_eq!(config.connector.graph_url, "http://localhost:8080/v1.0");
        assert_eq!(config.connector.login_url, "http://localhost:8081");
        assert_eq!(config.connector.timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_env_substitution_in_credentials() {
        std::env::set_var("SP_CFG_TEST_SECRET", "from-env");
        let yaml = r#"
connector:
  tenant_id: t
  client_id: c
  client_secret: ${SP_CFG_TEST_SECRET}
  site: s
"#;

        let config = Config::from_str(yaml).unwrap();
        assert_eq!(config.connector.client_secret, "from-env");
        std::env::remove_var("SP_CFG_TEST_SECRET");
    }

    #[test]
    fn test_missing_env_var_error() {
        let yaml = r#"
connector:
  tenant_id: ${SP_CFG_MISSING_TENANT_1234}
  client_id: c
  client_secret: s
  site: s
"#;

        let err = Config::from_str(yaml).unwrap_err();
        assert!(err.to_string().contains("SP_CFG_MISSING_TENANT_1234"));
    }

    #[test]
    fn test_missing_connector_section() {
        let result = Config::from_str("prefix: /x\n");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_validate_empty_site() {
        let config = Config {
            logging: LoggingConfig::default(),
            connector: ConnectorConfig::new("t", "c", "s", "  "),
            prefix: "/".to_string(),
        };

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("connector.site"));
    }

    #[test]
    fn test_validate_bad_graph_url() {
        let mut connector = ConnectorConfig::new("t", "c", "s", "site");
        connector.graph_url = "graph.microsoft.com".to_string();
        let config = Config {
            logging: LoggingConfig::default(),
            connector,
            prefix: "/".to_string(),
        };

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_debug_redacts_secret() {
        let connector = ConnectorConfig::new("t", "c", "very-secret", "site");
        let rendered = format!("{:?}", connector);
        assert!(!rendered.contains("very-secret"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "connector:\n  tenant_id: t\n  client_id: c\n  client_secret: s\n  site: s\nprefix: /data"
        )
        .unwrap();

        let config = Config::from_file(&file.path().to_path_buf()).unwrap();
        assert_eq!(config.prefix, "/data");

        let missing = Config::from_file(&PathBuf::from("/nonexistent/sharepoint.yaml"));
        assert!(matches!(missing, Err(ConfigError::ReadError(_, _))));
    }
}
