use super::{
    types::{Config, PacingMethod},
    ConfigError,
};
use crate::reconciler::MAX_PASSWORD_LEN;

/// Largest page size the users endpoint accepts.
const MAX_USERS_PAGE_SIZE: u32 = 300;

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.api.token.is_empty() {
        return Err(ConfigError::ValidationError(
            "api.token cannot be empty".to_string(),
        ));
    }

    if config.api.users_page_size == 0 || config.api.users_page_size > MAX_USERS_PAGE_SIZE {
        return Err(ConfigError::ValidationError(format!(
            "api.users_page_size must be between 1 and {}",
            MAX_USERS_PAGE_SIZE
        )));
    }

    if config.api.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "api.timeout_secs cannot be 0".to_string(),
        ));
    }

    if !config.hosts.email_template.contains("{}") {
        return Err(ConfigError::ValidationError(
            "hosts.email_template must contain a {} placeholder".to_string(),
        ));
    }

    if config.passwords.shared.chars().count() > MAX_PASSWORD_LEN {
        return Err(ConfigError::ValidationError(format!(
            "passwords.shared must be at most {} characters",
            MAX_PASSWORD_LEN
        )));
    }

    if config.passwords.derived_length == 0 || config.passwords.derived_length > MAX_PASSWORD_LEN
    {
        return Err(ConfigError::ValidationError(format!(
            "passwords.derived_length must be between 1 and {}",
            MAX_PASSWORD_LEN
        )));
    }

    match config.batch.pacing {
        PacingMethod::FixedInterval if config.batch.interval_ms == 0 => {
            return Err(ConfigError::ValidationError(
                "batch.interval_ms cannot be 0 with fixed_interval pacing".to_string(),
            ));
        }
        PacingMethod::TokenBucket if config.batch.requests_per_minute == 0 => {
            return Err(ConfigError::ValidationError(
                "batch.requests_per_minute cannot be 0 with token_bucket pacing".to_string(),
            ));
        }
        _ => {}
    }

    Ok(())
}
