//! Configuration management
//!
//! This module handles loading and parsing configuration for the Byline platform.
//! Configuration can be loaded from:
//! - config.yml file
//! - Environment variables (override file settings)
//!
//! Missing optional values are filled with sensible defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Upload configuration
    #[serde(default)]
    pub uploads: UploadConfig,
    /// Page-listing configuration
    #[serde(default)]
    pub pages: PagesConfig,
    /// Authentication configuration
    #[serde(default)]
    pub auth: AuthConfig,
    /// Outgoing mail configuration
    #[serde(default)]
    pub mail: MailConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            uploads: UploadConfig::default(),
            pages: PagesConfig::default(),
            auth: AuthConfig::default(),
            mail: MailConfig::default(),
        }
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
    /// Public base URL, used when building absolute links (password reset mail)
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            base_url: default_base_url(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_base_url() -> String {
    "http://127.0.0.1:8080".to_string()
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file
    #[serde(default = "default_database_path")]
    pub path: String,
    /// Maximum pool connections
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            max_connections: default_max_connections(),
        }
    }
}

fn default_database_path() -> String {
    "data/byline.db".to_string()
}

fn default_max_connections() -> u32 {
    10
}

/// Upload configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Directory where post images are stored
    #[serde(default = "default_media_dir")]
    pub media_dir: PathBuf,
    /// Maximum file size in bytes (default: 10MB)
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
    /// Allowed image MIME types
    #[serde(default = "default_allowed_types")]
    pub allowed_types: Vec<String>,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            media_dir: default_media_dir(),
            max_file_size: default_max_file_size(),
            allowed_types: default_allowed_types(),
        }
    }
}

fn default_media_dir() -> PathBuf {
    PathBuf::from("data/media")
}

fn default_max_file_size() -> u64 {
    10 * 1024 * 1024 // 10MB
}

fn default_allowed_types() -> Vec<String> {
    vec![
        "image/jpeg".to_string(),
        "image/png".to_string(),
        "image/gif".to_string(),
        "image/webp".to_string(),
    ]
}

impl UploadConfig {
    /// Check if a MIME type is allowed
    pub fn is_type_allowed(&self, mime_type: &str) -> bool {
        self.allowed_types.iter().any(|t| t == mime_type)
    }

    /// Get file extension for a MIME type
    pub fn get_extension(&self, mime_type: &str) -> &'static str {
        match mime_type {
            "image/jpeg" => "jpg",
            "image/png" => "png",
            "image/gif" => "gif",
            "image/webp" => "webp",
            _ => "bin",
        }
    }
}

/// Page-listing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PagesConfig {
    /// Number of posts (and comments) per listing page
    #[serde(default = "default_per_page")]
    pub per_page: i64,
}

impl Default for PagesConfig {
    fn default() -> Self {
        Self {
            per_page: default_per_page(),
        }
    }
}

fn default_per_page() -> i64 {
    10
}

/// Authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Session lifetime in days
    #[serde(default = "default_session_days")]
    pub session_days: i64,
    /// Password-reset token lifetime in hours
    #[serde(default = "default_reset_token_hours")]
    pub reset_token_hours: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_days: default_session_days(),
            reset_token_hours: default_reset_token_hours(),
        }
    }
}

fn default_session_days() -> i64 {
    30
}

fn default_reset_token_hours() -> i64 {
    24
}

/// Outgoing mail configuration
///
/// When `smtp_host` is unset the mailer logs messages instead of sending them,
/// which keeps local development working without an SMTP server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailConfig {
    /// SMTP relay host (optional)
    #[serde(default)]
    pub smtp_host: Option<String>,
    /// SMTP relay port
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    /// SMTP username (optional)
    #[serde(default)]
    pub smtp_username: Option<String>,
    /// SMTP password (optional)
    #[serde(default)]
    pub smtp_password: Option<String>,
    /// From address for outgoing mail
    #[serde(default = "default_mail_from")]
    pub from: String,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            smtp_host: None,
            smtp_port: default_smtp_port(),
            smtp_username: None,
            smtp_password: None,
            from: default_mail_from(),
        }
    }
}

fn default_smtp_port() -> u16 {
    587
}

fn default_mail_from() -> String {
    "Byline <no-reply@localhost>".to_string()
}

/// Error type for configuration parsing
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    FileRead {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{path}': {message}")]
    ParseError { path: String, message: String },
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

impl Config {
    /// Load configuration from file
    ///
    /// If the file doesn't exist, returns default configuration.
    /// If the file exists but is invalid YAML, returns an error with details.
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.display().to_string(),
            source: e,
        })?;

        // Handle empty file - return defaults
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config =
            serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseError {
                path: path.display().to_string(),
                message: format_yaml_error(&e),
            })?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file with environment variable overrides
    ///
    /// Environment variables follow the pattern:
    /// - BYLINE_SERVER_HOST
    /// - BYLINE_SERVER_PORT
    /// - BYLINE_SERVER_BASE_URL
    /// - BYLINE_DATABASE_PATH
    /// - BYLINE_DATABASE_MAX_CONNECTIONS
    /// - BYLINE_UPLOADS_MEDIA_DIR
    /// - BYLINE_UPLOADS_MAX_FILE_SIZE
    /// - BYLINE_PAGES_PER_PAGE
    /// - BYLINE_AUTH_SESSION_DAYS
    /// - BYLINE_AUTH_RESET_TOKEN_HOURS
    /// - BYLINE_MAIL_SMTP_HOST
    /// - BYLINE_MAIL_SMTP_PORT
    /// - BYLINE_MAIL_SMTP_USERNAME
    /// - BYLINE_MAIL_SMTP_PASSWORD
    /// - BYLINE_MAIL_FROM
    pub fn load_with_env(path: &std::path::Path) -> anyhow::Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Apply environment variable overrides to the configuration
    fn apply_env_overrides(&mut self) {
        // Server configuration
        if let Ok(host) = std::env::var("BYLINE_SERVER_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("BYLINE_SERVER_PORT") {
            if let Ok(port) = port.parse::<u16>() {
                self.server.port = port;
            }
        }
        if let Ok(base_url) = std::env::var("BYLINE_SERVER_BASE_URL") {
            self.server.base_url = base_url;
        }

        // Database configuration
        if let Ok(path) = std::env::var("BYLINE_DATABASE_PATH") {
            self.database.path = path;
        }
        if let Ok(max) = std::env::var("BYLINE_DATABASE_MAX_CONNECTIONS") {
            if let Ok(max) = max.parse::<u32>() {
                self.database.max_connections = max;
            }
        }

        // Upload configuration
        if let Ok(dir) = std::env::var("BYLINE_UPLOADS_MEDIA_DIR") {
            self.uploads.media_dir = PathBuf::from(dir);
        }
        if let Ok(size) = std::env::var("BYLINE_UPLOADS_MAX_FILE_SIZE") {
            if let Ok(size) = size.parse::<u64>() {
                self.uploads.max_file_size = size;
            }
        }

        // Pages configuration
        if let Ok(per_page) = std::env::var("BYLINE_PAGES_PER_PAGE") {
            if let Ok(per_page) = per_page.parse::<i64>() {
                self.pages.per_page = per_page;
            }
        }

        // Auth configuration
        if let Ok(days) = std::env::var("BYLINE_AUTH_SESSION_DAYS") {
            if let Ok(days) = days.parse::<i64>() {
                self.auth.session_days = days;
            }
        }
        if let Ok(hours) = std::env::var("BYLINE_AUTH_RESET_TOKEN_HOURS") {
            if let Ok(hours) = hours.parse::<i64>() {
                self.auth.reset_token_hours = hours;
            }
        }

        // Mail configuration
        if let Ok(host) = std::env::var("BYLINE_MAIL_SMTP_HOST") {
            self.mail.smtp_host = Some(host);
        }
        if let Ok(port) = std::env::var("BYLINE_MAIL_SMTP_PORT") {
            if let Ok(port) = port.parse::<u16>() {
                self.mail.smtp_port = port;
            }
        }
        if let Ok(username) = std::env::var("BYLINE_MAIL_SMTP_USERNAME") {
            self.mail.smtp_username = Some(username);
        }
        if let Ok(password) = std::env::var("BYLINE_MAIL_SMTP_PASSWORD") {
            self.mail.smtp_password = Some(password);
        }
        if let Ok(from) = std::env::var("BYLINE_MAIL_FROM") {
            self.mail.from = from;
        }
    }

    /// Reject values that would break listing or auth behavior outright
    fn validate(&self) -> Result<(), ConfigError> {
        if self.pages.per_page < 1 {
            return Err(ConfigError::ValidationError(
                "pages.per_page must be at least 1".to_string(),
            ));
        }
        if self.auth.session_days < 1 {
            return Err(ConfigError::ValidationError(
                "auth.session_days must be at least 1".to_string(),
            ));
        }
        if self.auth.reset_token_hours < 1 {
            return Err(ConfigError::ValidationError(
                "auth.reset_token_hours must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Format YAML parsing error with location and context
fn format_yaml_error(e: &serde_yaml::Error) -> String {
    if let Some(location) = e.location() {
        format!(
            "at line {}, column {}: {}",
            location.line(),
            location.column(),
            e
        )
    } else {
        e.to_string()
    }
}

// Shared mutex for all config tests that modify environment variables.
// Both `tests` and `property_tests` modules use this to prevent race conditions.
#[cfg(test)]
static CONFIG_ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn lock_env() -> std::sync::MutexGuard<'static, ()> {
        super::CONFIG_ENV_MUTEX
            .lock()
            .unwrap_or_else(|e| e.into_inner())
    }

    fn clear_env() {
        for key in [
            "BYLINE_SERVER_HOST",
            "BYLINE_SERVER_PORT",
            "BYLINE_SERVER_BASE_URL",
            "BYLINE_DATABASE_PATH",
            "BYLINE_DATABASE_MAX_CONNECTIONS",
            "BYLINE_UPLOADS_MEDIA_DIR",
            "BYLINE_UPLOADS_MAX_FILE_SIZE",
            "BYLINE_PAGES_PER_PAGE",
            "BYLINE_AUTH_SESSION_DAYS",
            "BYLINE_AUTH_RESET_TOKEN_HOURS",
            "BYLINE_MAIL_SMTP_HOST",
            "BYLINE_MAIL_SMTP_PORT",
            "BYLINE_MAIL_SMTP_USERNAME",
            "BYLINE_MAIL_SMTP_PASSWORD",
            "BYLINE_MAIL_FROM",
        ] {
            std::env::remove_var(key);
        }
    }

    #[test]
    fn test_load_missing_file_returns_defaults() {
        let path = std::path::Path::new("nonexistent_config.yml");
        let config = Config::load(path).unwrap();

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.database.path, "data/byline.db");
        assert_eq!(config.database.max_connections, 10);
        assert_eq!(config.uploads.media_dir, PathBuf::from("data/media"));
        assert_eq!(config.uploads.max_file_size, 10 * 1024 * 1024);
        assert_eq!(config.pages.per_page, 10);
        assert_eq!(config.auth.session_days, 30);
        assert_eq!(config.auth.reset_token_hours, 24);
        assert!(config.mail.smtp_host.is_none());
    }

    #[test]
    fn test_load_empty_file_returns_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "").unwrap();

        let config = Config::load(file.path()).unwrap();

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn test_load_partial_config_fills_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "server:\n  port: 3000\n").unwrap();

        let config = Config::load(file.path()).unwrap();

        // Specified value
        assert_eq!(config.server.port, 3000);
        // Default values
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.pages.per_page, 10);
    }

    #[test]
    fn test_load_full_config() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
server:
  host: "127.0.0.1"
  port: 9000
  base_url: "https://blog.example.org"
database:
  path: "var/blog.db"
  max_connections: 4
uploads:
  media_dir: "var/media"
  max_file_size: 2097152
  allowed_types: ["image/png"]
pages:
  per_page: 5
auth:
  session_days: 7
  reset_token_hours: 2
mail:
  smtp_host: "smtp.example.org"
  smtp_port: 465
  smtp_username: "mailer"
  smtp_password: "secret"
  from: "Blog <blog@example.org>"
"#
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.base_url, "https://blog.example.org");
        assert_eq!(config.database.path, "var/blog.db");
        assert_eq!(config.database.max_connections, 4);
        assert_eq!(config.uploads.media_dir, PathBuf::from("var/media"));
        assert_eq!(config.uploads.max_file_size, 2097152);
        assert_eq!(config.uploads.allowed_types, vec!["image/png".to_string()]);
        assert_eq!(config.pages.per_page, 5);
        assert_eq!(config.auth.session_days, 7);
        assert_eq!(config.auth.reset_token_hours, 2);
        assert_eq!(config.mail.smtp_host.as_deref(), Some("smtp.example.org"));
        assert_eq!(config.mail.smtp_port, 465);
        assert_eq!(config.mail.from, "Blog <blog@example.org>");
    }

    #[test]
    fn test_load_invalid_yaml_returns_error() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "server:\n  port: not_a_number\n").unwrap();

        let result = Config::load(file.path());

        assert!(result.is_err());
        let err_msg = result.unwrap_err().to_string();
        assert!(err_msg.contains("parse") || err_msg.contains("invalid"));
    }

    #[test]
    fn test_load_malformed_yaml_returns_error() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "server:\n  host: [invalid yaml").unwrap();

        let result = Config::load(file.path());

        assert!(result.is_err());
    }

    #[test]
    fn test_load_rejects_zero_per_page() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "pages:\n  per_page: 0\n").unwrap();

        let result = Config::load(file.path());

        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("per_page"));
    }

    #[test]
    fn test_env_override_server_config() {
        let _guard = lock_env();
        clear_env();

        let mut file = NamedTempFile::new().unwrap();
        write!(file, "server:\n  host: \"0.0.0.0\"\n  port: 8080\n").unwrap();

        std::env::set_var("BYLINE_SERVER_HOST", "192.168.1.1");
        std::env::set_var("BYLINE_SERVER_PORT", "4000");

        let config = Config::load_with_env(file.path()).unwrap();

        assert_eq!(config.server.host, "192.168.1.1");
        assert_eq!(config.server.port, 4000);

        clear_env();
    }

    #[test]
    fn test_env_override_database_and_uploads() {
        let _guard = lock_env();
        clear_env();

        let mut file = NamedTempFile::new().unwrap();
        write!(file, "").unwrap();

        std::env::set_var("BYLINE_DATABASE_PATH", "tmp/test.db");
        std::env::set_var("BYLINE_UPLOADS_MEDIA_DIR", "tmp/media");
        std::env::set_var("BYLINE_UPLOADS_MAX_FILE_SIZE", "1024");

        let config = Config::load_with_env(file.path()).unwrap();

        assert_eq!(config.database.path, "tmp/test.db");
        assert_eq!(config.uploads.media_dir, PathBuf::from("tmp/media"));
        assert_eq!(config.uploads.max_file_size, 1024);

        clear_env();
    }

    #[test]
    fn test_env_override_mail_config() {
        let _guard = lock_env();
        clear_env();

        let mut file = NamedTempFile::new().unwrap();
        write!(file, "").unwrap();

        std::env::set_var("BYLINE_MAIL_SMTP_HOST", "mail.example.org");
        std::env::set_var("BYLINE_MAIL_SMTP_PORT", "2525");
        std::env::set_var("BYLINE_MAIL_FROM", "Admin <admin@example.org>");

        let config = Config::load_with_env(file.path()).unwrap();

        assert_eq!(config.mail.smtp_host.as_deref(), Some("mail.example.org"));
        assert_eq!(config.mail.smtp_port, 2525);
        assert_eq!(config.mail.from, "Admin <admin@example.org>");

        clear_env();
    }

    #[test]
    fn test_env_override_invalid_port_ignored() {
        let _guard = lock_env();
        clear_env();

        let mut file = NamedTempFile::new().unwrap();
        write!(file, "server:\n  port: 8080\n").unwrap();

        std::env::set_var("BYLINE_SERVER_PORT", "not_a_number");

        let config = Config::load_with_env(file.path()).unwrap();

        // Should keep original value when env var is invalid
        assert_eq!(config.server.port, 8080);

        clear_env();
    }

    #[test]
    fn test_mime_type_helpers() {
        let uploads = UploadConfig::default();

        assert!(uploads.is_type_allowed("image/png"));
        assert!(uploads.is_type_allowed("image/gif"));
        assert!(!uploads.is_type_allowed("application/pdf"));
        assert!(!uploads.is_type_allowed("image/svg+xml"));

        assert_eq!(uploads.get_extension("image/jpeg"), "jpg");
        assert_eq!(uploads.get_extension("image/webp"), "webp");
        assert_eq!(uploads.get_extension("text/plain"), "bin");
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn lock_env() -> std::sync::MutexGuard<'static, ()> {
        super::CONFIG_ENV_MUTEX
            .lock()
            .unwrap_or_else(|e| e.into_inner())
    }

    /// Strategy for generating valid host strings
    fn valid_host_strategy() -> impl Strategy<Value = String> {
        prop_oneof![
            (0u8..=255, 0u8..=255, 0u8..=255, 0u8..=255)
                .prop_map(|(a, b, c, d)| format!("{}.{}.{}.{}", a, b, c, d)),
            Just("localhost".to_string()),
            "[a-z][a-z0-9]{0,10}".prop_map(|s| s),
        ]
    }

    /// Strategy for generating partial config YAML (missing some fields)
    fn partial_config_yaml_strategy() -> impl Strategy<Value = String> {
        prop_oneof![
            (valid_host_strategy(), 1u16..=65535).prop_map(|(host, port)| format!(
                "server:\n  host: \"{}\"\n  port: {}\n",
                host, port
            )),
            Just("database:\n  path: \"test.db\"\n".to_string()),
            (1i64..=100).prop_map(|n| format!("pages:\n  per_page: {}\n", n)),
            (1i64..=365).prop_map(|d| format!("auth:\n  session_days: {}\n", d)),
            Just("".to_string()),
            Just("   \n\n   ".to_string()),
        ]
    }

    /// Strategy for generating malformed YAML that must fail to parse
    fn malformed_yaml_strategy() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("server:\n  port: not_a_number".to_string()),
            Just("server:\n  port: [1, 2, 3]".to_string()),
            Just("server:\n  port: 99999999999999999999".to_string()),
            Just("pages:\n  per_page: \"ten\"".to_string()),
            Just("uploads:\n  max_file_size: -5".to_string()),
            Just("server: [invalid, list, for, server]".to_string()),
            Just("database: \"just_a_string\"".to_string()),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(20))]

        /// Serializing any valid config to YAML and parsing it back yields
        /// an equivalent config.
        #[test]
        fn config_roundtrip(
            host in valid_host_strategy(),
            port in 1u16..=65535,
            per_page in 1i64..=100,
            session_days in 1i64..=365,
        ) {
            let config = Config {
                server: ServerConfig { host: host.clone(), port, base_url: default_base_url() },
                pages: PagesConfig { per_page },
                auth: AuthConfig { session_days, reset_token_hours: 24 },
                ..Config::default()
            };

            let yaml = serde_yaml::to_string(&config).expect("Failed to serialize config");
            let mut file = NamedTempFile::new().expect("Failed to create temp file");
            write!(file, "{}", yaml).expect("Failed to write config");

            let parsed = Config::load(file.path()).expect("Failed to parse config");

            prop_assert_eq!(parsed.server.host, host);
            prop_assert_eq!(parsed.server.port, port);
            prop_assert_eq!(parsed.pages.per_page, per_page);
            prop_assert_eq!(parsed.auth.session_days, session_days);
        }

        /// Any partial config parses, with missing sections filled from defaults.
        #[test]
        fn config_default_filling(yaml in partial_config_yaml_strategy()) {
            let mut file = NamedTempFile::new().expect("Failed to create temp file");
            write!(file, "{}", yaml).expect("Failed to write config");

            let config = Config::load(file.path()).expect("Failed to parse config");

            prop_assert!(!config.server.host.is_empty());
            prop_assert!(config.server.port > 0);
            prop_assert!(config.pages.per_page >= 1);
            prop_assert!(!config.database.path.is_empty());

            if yaml.trim().is_empty() {
                prop_assert_eq!(config.server.host, "0.0.0.0");
                prop_assert_eq!(config.server.port, 8080);
                prop_assert_eq!(config.pages.per_page, 10);
            }
        }

        /// Any malformed config file produces a descriptive error.
        #[test]
        fn invalid_config_is_rejected(yaml in malformed_yaml_strategy()) {
            let mut file = NamedTempFile::new().expect("Failed to create temp file");
            write!(file, "{}", yaml).expect("Failed to write config");

            let result = Config::load(file.path());

            prop_assert!(result.is_err(), "Malformed YAML should produce an error");
            let err_msg = result.unwrap_err().to_string();
            prop_assert!(err_msg.len() > 10, "Error message should be descriptive: {}", err_msg);
        }

        /// Environment variables take precedence over file values.
        #[test]
        fn env_precedence_over_file(
            file_port in 1000u16..2000,
            env_port in 3000u16..4000,
        ) {
            let _guard = lock_env();
            std::env::remove_var("BYLINE_SERVER_PORT");

            let mut file = NamedTempFile::new().expect("Failed to create temp file");
            write!(file, "server:\n  port: {}\n", file_port).expect("Failed to write config");

            std::env::set_var("BYLINE_SERVER_PORT", env_port.to_string());

            let config = Config::load_with_env(file.path()).expect("Failed to load config");

            prop_assert_eq!(config.server.port, env_port);
            prop_assert_ne!(config.server.port, file_port);

            std::env::remove_var("BYLINE_SERVER_PORT");
        }
    }
}
