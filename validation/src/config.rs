//! Engine configuration module
//! Pagination bounds and validator behaviour, loaded from the environment

use std::env;

use thiserror::Error;
use tracing::info;

use crate::fields::{DEFAULT_LIMIT, MAX_LIMIT};
use crate::schema::ContractLimits;
use crate::validator::{ValidateOptions, Validator};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Page size bounds shared by every list contract
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationConfig {
    pub default_limit: u64,
    pub max_limit: u64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_LIMIT,
            max_limit: MAX_LIMIT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub pagination: PaginationConfig,
    /// Upper bound on keys accepted in a query string
    pub max_query_keys: usize,
    pub abort_early: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            pagination: PaginationConfig::default(),
            max_query_keys: 32,
            abort_early: false,
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let default_limit = parse_var(
            &lookup,
            "VALIDATION_DEFAULT_LIMIT",
            defaults.pagination.default_limit,
        )?;
        let max_limit = parse_var(&lookup, "VALIDATION_MAX_LIMIT", defaults.pagination.max_limit)?;
        let max_query_keys = parse_var(&lookup, "VALIDATION_MAX_QUERY_KEYS", defaults.max_query_keys)?;
        let abort_early = parse_var(&lookup, "VALIDATION_ABORT_EARLY", defaults.abort_early)?;

        if max_limit < 1 {
            return Err(ConfigError::InvalidConfig(
                "VALIDATION_MAX_LIMIT must be at least 1".to_string(),
            ));
        }
        if default_limit < 1 || default_limit > max_limit {
            return Err(ConfigError::InvalidConfig(format!(
                "VALIDATION_DEFAULT_LIMIT must be between 1 and {}",
                max_limit
            )));
        }
        if max_query_keys < 1 {
            return Err(ConfigError::InvalidConfig(
                "VALIDATION_MAX_QUERY_KEYS must be at least 1".to_string(),
            ));
        }

        info!(
            "Validation configuration loaded: default_limit={}, max_limit={}, max_query_keys={}, abort_early={}",
            default_limit, max_limit, max_query_keys, abort_early
        );

        Ok(EngineConfig {
            pagination: PaginationConfig {
                default_limit,
                max_limit,
            },
            max_query_keys,
            abort_early,
        })
    }

    /// Validator running with the configured options against the system clock
    pub fn validator(&self) -> Validator {
        Validator::new(ValidateOptions {
            abort_early: self.abort_early,
            now: None,
        })
    }

    /// Aggregate limits for list query contracts
    pub fn query_limits(&self) -> ContractLimits {
        ContractLimits {
            max_keys: Some(self.max_query_keys),
            ..Default::default()
        }
    }
}

fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse::<T>().map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            reason: format!("{} ({})", raw, e),
        }),
    }
}
