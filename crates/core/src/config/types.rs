use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub api: ApiConfig,
    pub hosts: HostsConfig,
    pub passwords: PasswordsConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub batch: BatchConfig,
}

/// Remote meeting API configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
    /// Bearer token sent with every request.
    pub token: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
    /// Page size used when listing users (default: 30)
    #[serde(default = "default_users_page_size")]
    pub users_page_size: u32,
}

fn default_base_url() -> String {
    "https://api.zoom.us/v2".to_string()
}

fn default_timeout() -> u32 {
    30
}

fn default_users_page_size() -> u32 {
    30
}

/// Host account configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HostsConfig {
    /// Owner email template, `{}` is replaced by the host slot
    /// (e.g. "my.zoom.email+{}@gmail.com").
    pub email_template: String,
}

impl HostsConfig {
    /// Owner email for the given host slot.
    pub fn email_for_slot(&self, slot: usize) -> String {
        self.email_template.replace("{}", &slot.to_string())
    }
}

/// Meeting password configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PasswordsConfig {
    /// Password shared by every meeting using the "shared" policy.
    pub shared: String,
    /// Salt mixed into derived passwords.
    #[serde(default)]
    pub salt: String,
    #[serde(default = "default_derived_length")]
    pub derived_length: usize,
}

fn default_derived_length() -> usize {
    10
}

/// Snapshot store configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,
    /// Directory for the file backend, database file for sqlite.
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            path: default_store_path(),
        }
    }
}

fn default_store_path() -> PathBuf {
    PathBuf::from("data/meetings")
}

/// Available snapshot store backends
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    #[default]
    File,
    Sqlite,
}

/// Batch run configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BatchConfig {
    #[serde(default)]
    pub pacing: PacingMethod,
    /// Minimum gap between calls for fixed interval pacing.
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    /// Bucket size and refill rate for token bucket pacing.
    #[serde(default = "default_requests_per_minute")]
    pub requests_per_minute: u32,
    #[serde(default = "default_continue_on_error")]
    pub continue_on_error: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            pacing: PacingMethod::default(),
            interval_ms: default_interval_ms(),
            requests_per_minute: default_requests_per_minute(),
            continue_on_error: default_continue_on_error(),
        }
    }
}

fn default_interval_ms() -> u64 {
    1000
}

fn default_requests_per_minute() -> u32 {
    60
}

fn default_continue_on_error() -> bool {
    true
}

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PacingMethod {
    None,
    #[default]
    FixedInterval,
    TokenBucket,
}

/// Sanitized config for display (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub api: SanitizedApiConfig,
    pub hosts: HostsConfig,
    pub passwords: SanitizedPasswordsConfig,
    pub store: StoreConfig,
    pub batch: BatchConfig,
}

/// Sanitized API config (token hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedApiConfig {
    pub base_url: String,
    pub token_configured: bool,
    pub timeout_secs: u32,
    pub users_page_size: u32,
}

/// Sanitized password config (password and salt hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedPasswordsConfig {
    pub shared_configured: bool,
    pub salt_configured: bool,
    pub derived_length: usize,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            api: SanitizedApiConfig {
                base_url: config.api.base_url.clone(),
                token_configured: !config.api.token.is_empty(),
                timeout_secs: config.api.timeout_secs,
                users_page_size: config.api.users_page_size,
            },
            hosts: config.hosts.clone(),
            passwords: SanitizedPasswordsConfig {
                shared_configured: !config.passwords.shared.is_empty(),
                salt_configured: !config.passwords.salt.is_empty(),
                derived_length: config.passwords.derived_length,
            },
            store: config.store.clone(),
            batch: config.batch.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
[api]
token = "jwt-token"

[hosts]
email_template = "host+{}@example.com"

[passwords]
shared = "secret"
"#;

    #[test]
    fn test_deserialize_minimal_config_uses_defaults() {
        let config: Config = toml::from_str(MINIMAL).unwrap();
        assert_eq!(config.api.base_url, "https://api.zoom.us/v2");
        assert_eq!(config.api.timeout_secs, 30);
        assert_eq!(config.api.users_page_size, 30);
        assert_eq!(config.passwords.salt, "");
        assert_eq!(config.passwords.derived_length, 10);
        assert_eq!(config.store.backend, StoreBackend::File);
        assert_eq!(config.store.path.to_str().unwrap(), "data/meetings");
        assert_eq!(config.batch.pacing, PacingMethod::FixedInterval);
        assert_eq!(config.batch.interval_ms, 1000);
        assert!(config.batch.continue_on_error);
    }

    #[test]
    fn test_deserialize_missing_api_fails() {
        let toml = r#"
[hosts]
email_template = "host+{}@example.com"

[passwords]
shared = "secret"
"#;
        let result: Result<Config, _> = toml::from_str(toml);
        assert!(result.is_err());
    }

    #[test]
    fn test_deserialize_sqlite_store_and_token_bucket() {
        let toml = format!(
            "{}\n[store]\nbackend = \"sqlite\"\npath = \"/data/meetings.db\"\n\n[batch]\npacing = \"token_bucket\"\nrequests_per_minute = 30\ncontinue_on_error = false\n",
            MINIMAL
        );
        let config: Config = toml::from_str(&toml).unwrap();
        assert_eq!(config.store.backend, StoreBackend::Sqlite);
        assert_eq!(config.store.path.to_str().unwrap(), "/data/meetings.db");
        assert_eq!(config.batch.pacing, PacingMethod::TokenBucket);
        assert_eq!(config.batch.requests_per_minute, 30);
        assert!(!config.batch.continue_on_error);
    }

    #[test]
    fn test_email_for_slot() {
        let hosts = HostsConfig {
            email_template: "my.zoom.email+{}@gmail.com".to_string(),
        };
        assert_eq!(hosts.email_for_slot(0), "my.zoom.email+0@gmail.com");
        assert_eq!(hosts.email_for_slot(12), "my.zoom.email+12@gmail.com");
    }

    #[test]
    fn test_sanitized_config_hides_secrets() {
        let config: Config = toml::from_str(MINIMAL).unwrap();
        let sanitized = SanitizedConfig::from(&config);
        assert!(sanitized.api.token_configured);
        assert!(sanitized.passwords.shared_configured);
        assert!(!sanitized.passwords.salt_configured);

        let json = serde_json::to_string(&sanitized).unwrap();
        assert!(!json.contains("jwt-token"));
        assert!(!json.contains("secret"));
    }
}
