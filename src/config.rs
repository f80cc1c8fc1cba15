//! Runtime configuration read from `CERVICARE_*` environment variables.
//!
//! Every setting has a default; a malformed value is logged and replaced by
//! the default rather than aborting startup.

use std::path::PathBuf;

use crate::adapters::logistic::{verifying_key_from_b64, IntegrityPolicy};
use crate::ports::ModelError;

pub const MODEL_PATH_ENV: &str = "CERVICARE_MODEL_PATH";
pub const MODEL_CONFIDENCE_ENV: &str = "CERVICARE_MODEL_CONFIDENCE";
pub const RULES_CONFIDENCE_ENV: &str = "CERVICARE_RULES_CONFIDENCE";
pub const REQUIRE_SIGNED_MODEL_ENV: &str = "CERVICARE_REQUIRE_SIGNED_MODEL";
pub const MODEL_PUBKEY_FILE_ENV: &str = "CERVICARE_MODEL_PUBKEY_B64_FILE";
pub const DB_PATH_ENV: &str = "CERVICARE_DB_PATH";
pub const LOG_MODE_ENV: &str = "CERVICARE_LOG_MODE";
pub const LOG_FILE_ENV: &str = "CERVICARE_LOG_FILE";

/// Confidence reported for model-backed scores.
pub const DEFAULT_MODEL_CONFIDENCE: f64 = 0.9;

/// Confidence reported for rule-based scores.
pub const DEFAULT_RULES_CONFIDENCE: f64 = 0.7;

const DEFAULT_LOG_FILE: &str = "cervicare.log";

/// Settings consumed by `RiskPredictor`.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictorConfig {
    /// Model artifact file or directory; rules only when `None`
    pub model_path: Option<PathBuf>,
    pub model_confidence: f64,
    pub rules_confidence: f64,
    pub require_signed_model: bool,
    /// File holding the base64 Ed25519 verifying key
    pub model_pubkey_b64_file: Option<PathBuf>,
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self {
            model_path: None,
            model_confidence: DEFAULT_MODEL_CONFIDENCE,
            rules_confidence: DEFAULT_RULES_CONFIDENCE,
            require_signed_model: false,
            model_pubkey_b64_file: None,
        }
    }
}

impl PredictorConfig {
    /// Configuration loading the artifact at `path`.
    #[must_use]
    pub fn with_model(path: impl Into<PathBuf>) -> Self {
        Self {
            model_path: Some(path.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            model_path: non_empty(lookup(MODEL_PATH_ENV)).map(PathBuf::from),
            model_confidence: parse_confidence(
                MODEL_CONFIDENCE_ENV,
                lookup(MODEL_CONFIDENCE_ENV),
                defaults.model_confidence,
            ),
            rules_confidence: parse_confidence(
                RULES_CONFIDENCE_ENV,
                lookup(RULES_CONFIDENCE_ENV),
                defaults.rules_confidence,
            ),
            require_signed_model: parse_bool(lookup(REQUIRE_SIGNED_MODEL_ENV)),
            model_pubkey_b64_file: non_empty(lookup(MODEL_PUBKEY_FILE_ENV)).map(PathBuf::from),
        }
    }

    /// Build the integrity policy for artifact loading.
    ///
    /// # Errors
    /// Returns `ModelError::Integrity` if the configured key file cannot be
    /// read or does not hold a valid Ed25519 key.
    pub fn integrity_policy(&self) -> Result<IntegrityPolicy, ModelError> {
        let verifying_key = match &self.model_pubkey_b64_file {
            Some(path) => {
                let b64 = std::fs::read_to_string(path).map_err(|e| {
                    ModelError::Integrity(format!(
                        "Failed to read verifying key {}: {e}",
                        path.display()
                    ))
                })?;
                Some(verifying_key_from_b64(&b64)?)
            }
            None => None,
        };

        Ok(IntegrityPolicy {
            verifying_key,
            require_signature: self.require_signed_model,
        })
    }
}

/// Where log output goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    Stderr,
    File(PathBuf),
}

/// Process-level settings for the command-line host.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub predictor: PredictorConfig,
    /// SQLite database file; in-memory when `None`
    pub db_path: Option<PathBuf>,
    pub log_target: LogTarget,
}

impl AppConfig {
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let log_target = match lookup(LOG_MODE_ENV).as_deref() {
            Some("file") => LogTarget::File(
                non_empty(lookup(LOG_FILE_ENV))
                    .map_or_else(|| PathBuf::from(DEFAULT_LOG_FILE), PathBuf::from),
            ),
            _ => LogTarget::Stderr,
        };

        Self {
            predictor: PredictorConfig::from_lookup(&lookup),
            db_path: non_empty(lookup(DB_PATH_ENV)).map(PathBuf::from),
            log_target,
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_bool(value: Option<String>) -> bool {
    value
        .map(|v| matches!(v.trim(), "1" | "true" | "TRUE" | "yes" | "YES"))
        .unwrap_or(false)
}

fn parse_confidence(name: &str, value: Option<String>, default: f64) -> f64 {
    let Some(raw) = non_empty(value) else {
        return default;
    };
    match raw.parse::<f64>() {
        Ok(v) if (0.0..=1.0).contains(&v) => v,
        _ => {
            tracing::warn!("Ignoring {name}={raw:?}: expected a number in [0, 1]");
            default
        }
    }
}
