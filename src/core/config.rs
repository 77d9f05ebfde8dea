//! Tunables loading. Each game's config struct implements [`Validate`]; with
//! the `serde_json` feature a config can be read from the JSON blob the
//! extension stores alongside its assets.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[cfg(feature = "serde_json")]
    #[error("malformed config json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid config value `{field}`: {reason}")]
    Invalid { field: &'static str, reason: &'static str },
}

pub trait Validate {
    fn validate(&self) -> Result<(), ConfigError>;
}

/// Reject zero, negative and non-finite values.
pub fn require_positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid { field, reason: "must be a positive finite number" })
    }
}

/// Reject negative and non-finite values; zero is allowed.
pub fn require_non_negative(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid { field, reason: "must be a non-negative finite number" })
    }
}

/// Parse and validate. Missing fields fall back to their defaults.
#[cfg(feature = "serde_json")]
pub fn from_json<T>(json: &str) -> Result<T, ConfigError>
where
    T: serde::de::DeserializeOwned + Validate,
{
    let config: T = serde_json::from_str(json)?;
    config.validate()?;
    Ok(config)
}
