use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Load configuration from file with environment variable overrides.
///
/// Environment keys use `MEETSYNC_` and `__` between sections,
/// e.g. `MEETSYNC_API__TOKEN`.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    let config: Config = Figment::new()
        .merge(Toml::file(path))
        .merge(Env::prefixed("MEETSYNC_").split("__"))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))?;

    Ok(config)
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_config_from_str_valid() {
        let toml = r#"
[api]
token = "abc"

[hosts]
email_template = "host+{}@example.com"

[passwords]
shared = "pw"

[batch]
interval_ms = 250
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.batch.interval_ms, 250);
        assert_eq!(config.api.token, "abc");
    }

    #[test]
    fn test_load_config_from_str_missing_hosts() {
        let toml = r#"
[api]
token = "abc"

[passwords]
shared = "pw"
"#;
        let err = load_config_from_str(toml).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_load_config_file_not_found() {
        let err = load_config(Path::new("/nonexistent/meetsync.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }

    #[test]
    fn test_load_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
[api]
token = "file-token"
base_url = "http://localhost:9000/v2"

[hosts]
email_template = "host+{{}}@example.com"

[passwords]
shared = "pw"
salt = "pepper"
"#
        )
        .unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.api.base_url, "http://localhost:9000/v2");
        assert_eq!(config.hosts.email_template, "host+{}@example.com");
        assert_eq!(config.passwords.salt, "pepper");
    }

    #[test]
    fn test_load_config_env_override() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "config.toml",
                r#"
[api]
token = "file-token"

[hosts]
email_template = "host+{}@example.com"

[passwords]
shared = "pw"

[batch]
interval_ms = 1000
"#,
            )?;
            jail.set_env("MEETSYNC_API__TOKEN", "from-env");
            jail.set_env("MEETSYNC_BATCH__INTERVAL_MS", "250");

            let config = load_config(Path::new("config.toml")).unwrap();
            assert_eq!(config.api.token, "from-env");
            assert_eq!(config.batch.interval_ms, 250);
            assert_eq!(config.passwords.shared, "pw");
            Ok(())
        });
    }
}
