//! Logistic adapter: Implementation of RiskModel for exported logistic regressions.
//!
//! The training pipeline exports a JSON artifact (`risk_model.json`) holding
//! the coefficients, intercept and optional standardisation parameters for
//! the 18 encoded features.
//!
//! # Integrity
//!
//! An artifact directory may carry a signed manifest:
//! - `manifest.json` lists the SHA-256 of every bound file
//! - `model.sig` is an Ed25519 signature over the manifest bytes
//!
//! When a verifying key is configured the manifest is checked before the
//! artifact is parsed. With `require_signature` set, an unsigned artifact is
//! refused.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use base64::Engine;
use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::domain::{FeatureVector, FEATURE_COUNT, FEATURE_NAMES};
use crate::ports::{ModelError, RiskModel};

/// Artifact file name looked up when the configured path is a directory.
pub const MODEL_FILE_NAME: &str = "risk_model.json";

/// Signed manifest file name.
pub const MANIFEST_FILE_NAME: &str = "manifest.json";

/// Detached signature file name.
pub const SIGNATURE_FILE_NAME: &str = "model.sig";

/// Model parameters exported by the training pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportedLogisticModel {
    #[serde(default)]
    pub version: Option<String>,
    pub feature_names: Vec<String>,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    /// Per-feature mean subtracted before weighting
    #[serde(default)]
    pub scaler_mean: Option<Vec<f64>>,
    /// Per-feature scale divided after centering
    #[serde(default)]
    pub scaler_scale: Option<Vec<f64>>,
}

/// Manifest binding artifact files to their SHA-256 digests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelManifest {
    pub version: u32,
    #[serde(default)]
    pub created_at: Option<i64>,
    pub files: BTreeMap<String, String>,
}

/// How strictly to check artifact integrity at load time.
#[derive(Debug, Clone, Default)]
pub struct IntegrityPolicy {
    /// Ed25519 key the manifest must be signed with
    pub verifying_key: Option<VerifyingKey>,
    /// Refuse artifacts without a valid signed manifest
    pub require_signature: bool,
}

/// Logistic regression over the encoded feature vector.
#[derive(Debug, Clone)]
pub struct LogisticModel {
    coefficients: [f64; FEATURE_COUNT],
    intercept: f64,
    mean: [f64; FEATURE_COUNT],
    scale: [f64; FEATURE_COUNT],
    version: String,
    source: PathBuf,
}

impl LogisticModel {
    /// Load and validate an artifact from a file or a directory containing
    /// `risk_model.json`.
    ///
    /// # Errors
    /// Returns `ModelError::NotFound` if no artifact exists at `path`,
    /// `ModelError::Integrity` if the signed manifest does not check out and
    /// `ModelError::InvalidArtifact` if the parameters are malformed.
    pub fn load(path: &Path, policy: &IntegrityPolicy) -> Result<Self, ModelError> {
        let model_path = if path.is_dir() {
            path.join(MODEL_FILE_NAME)
        } else {
            path.to_path_buf()
        };

        if !model_path.is_file() {
            return Err(ModelError::NotFound(model_path.display().to_string()));
        }

        let base_dir = model_path.parent().unwrap_or(Path::new("."));
        verify_manifest(base_dir, &model_path, policy)?;

        let content = fs::read_to_string(&model_path)?;
        let exported: ExportedLogisticModel = serde_json::from_str(&content)
            .map_err(|e| ModelError::InvalidArtifact(e.to_string()))?;

        let model = Self::from_exported(exported, model_path)?;

        tracing::info!(
            "Loaded risk model {} from {:?}",
            model.version,
            model.source
        );
        Ok(model)
    }

    /// Build a model from already-parsed parameters.
    ///
    /// # Errors
    /// Returns `ModelError::InvalidArtifact` if the feature layout does not
    /// match the encoder or any parameter is not finite.
    pub fn from_exported(
        exported: ExportedLogisticModel,
        source: PathBuf,
    ) -> Result<Self, ModelError> {
        if exported.feature_names.len() != FEATURE_COUNT
            || exported
                .feature_names
                .iter()
                .zip(FEATURE_NAMES.iter())
                .any(|(got, want)| got != want)
        {
            return Err(ModelError::InvalidArtifact(format!(
                "feature_names must list the {FEATURE_COUNT} encoder features in order"
            )));
        }

        let coefficients = to_array("coefficients", &exported.coefficients)?;
        let mean = match &exported.scaler_mean {
            Some(v) => to_array("scaler_mean", v)?,
            None => [0.0; FEATURE_COUNT],
        };
        let scale = match &exported.scaler_scale {
            Some(v) => to_array("scaler_scale", v)?,
            None => [1.0; FEATURE_COUNT],
        };

        if !exported.intercept.is_finite() {
            return Err(ModelError::InvalidArtifact("intercept is not finite".into()));
        }
        if let Some(i) = scale.iter().position(|s| *s == 0.0) {
            return Err(ModelError::InvalidArtifact(format!(
                "scaler_scale for {} is zero",
                FEATURE_NAMES[i]
            )));
        }

        Ok(Self {
            coefficients,
            intercept: exported.intercept,
            mean,
            scale,
            version: exported.version.unwrap_or_else(|| "unversioned".to_string()),
            source,
        })
    }

    /// Linear predictor (log-odds) for an encoded input.
    fn log_odds(&self, features: &[f64]) -> f64 {
        features
            .iter()
            .zip(self.coefficients.iter())
            .zip(self.mean.iter().zip(self.scale.iter()))
            .fold(self.intercept, |acc, ((x, w), (m, s))| acc + w * (x - m) / s)
    }
}

fn to_array(name: &str, values: &[f64]) -> Result<[f64; FEATURE_COUNT], ModelError> {
    if values.len() != FEATURE_COUNT {
        return Err(ModelError::InvalidArtifact(format!(
            "{name} has {} values, expected {FEATURE_COUNT}",
            values.len()
        )));
    }
    if values.iter().any(|v| !v.is_finite()) {
        return Err(ModelError::InvalidArtifact(format!(
            "{name} contains non-finite values"
        )));
    }
    let mut out = [0.0; FEATURE_COUNT];
    out.copy_from_slice(values);
    Ok(out)
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

impl RiskModel for LogisticModel {
    fn predict_proba(&self, features: &FeatureVector) -> Result<f64, ModelError> {
        let values = features.as_slice();
        if values.len() != FEATURE_COUNT {
            return Err(ModelError::Inference(format!(
                "Feature count mismatch: got {}, expected {FEATURE_COUNT}",
                values.len()
            )));
        }

        let probability = sigmoid(self.log_odds(values));
        if !probability.is_finite() {
            return Err(ModelError::Inference(
                "model produced a non-finite probability".into(),
            ));
        }
        Ok(probability)
    }

    fn describe(&self) -> String {
        format!("logistic/{}", self.version)
    }
}

/// Decode a base64 Ed25519 verifying key.
///
/// # Errors
/// Returns `ModelError::Integrity` if the key is malformed.
pub fn verifying_key_from_b64(b64: &str) -> Result<VerifyingKey, ModelError> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(b64.trim())
        .map_err(|_| ModelError::Integrity("Invalid public key base64".into()))?;
    let key: [u8; 32] = bytes
        .as_slice()
        .try_into()
        .map_err(|_| ModelError::Integrity("Invalid public key length (expected 32 bytes)".into()))?;
    VerifyingKey::from_bytes(&key).map_err(|_| ModelError::Integrity("Invalid verifying key".into()))
}

/// Hex SHA-256 digest.
pub fn sha256_hex(bytes: &[u8]) -> String {
    Sha256::digest(bytes).iter().map(|b| format!("{b:02x}")).collect()
}

fn verify_manifest(
    base_dir: &Path,
    model_path: &Path,
    policy: &IntegrityPolicy,
) -> Result<(), ModelError> {
    let sig_path = base_dir.join(SIGNATURE_FILE_NAME);
    let manifest_path = base_dir.join(MANIFEST_FILE_NAME);
    let signed = sig_path.is_file() && manifest_path.is_file();

    let key = match (&policy.verifying_key, signed) {
        (Some(key), true) => key,
        (_, false) if policy.require_signature => {
            return Err(ModelError::Integrity(format!(
                "signed manifest required but not found in {:?}",
                base_dir
            )));
        }
        (None, _) if policy.require_signature => {
            return Err(ModelError::Integrity(
                "signed manifest required but no verifying key configured".into(),
            ));
        }
        (None, true) => {
            tracing::warn!("Model manifest present but no verifying key configured; skipping signature check");
            return Ok(());
        }
        (_, false) => {
            tracing::warn!("Loading UNSIGNED risk model from {:?}", model_path);
            return Ok(());
        }
    };

    let sig_bytes = fs::read(&sig_path)?;
    let sig_array: [u8; 64] = sig_bytes
        .as_slice()
        .try_into()
        .map_err(|_| ModelError::Integrity("Invalid signature length (expected 64 bytes)".into()))?;
    let signature = Signature::from_bytes(&sig_array);

    let manifest_bytes = fs::read(&manifest_path)?;
    key.verify(&manifest_bytes, &signature)
        .map_err(|_| ModelError::Integrity("Invalid model signature".into()))?;

    let manifest: ModelManifest = serde_json::from_slice(&manifest_bytes)
        .map_err(|e| ModelError::Integrity(format!("Invalid manifest format: {e}")))?;
    if manifest.version != 1 {
        return Err(ModelError::Integrity(format!(
            "Unsupported manifest version: {}",
            manifest.version
        )));
    }

    let model_name = model_path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    if !manifest.files.contains_key(model_name) {
        return Err(ModelError::Integrity(format!(
            "manifest does not bind {model_name}"
        )));
    }

    for (rel, expected_hex) in &manifest.files {
        let path = base_dir.join(rel);
        let bytes = fs::read(&path).map_err(|e| {
            ModelError::Integrity(format!("Manifest references unreadable file {:?}: {e}", path))
        })?;
        if !constant_time_eq_str(&sha256_hex(&bytes), expected_hex) {
            return Err(ModelError::Integrity(format!("File hash mismatch for {rel}")));
        }
    }

    tracing::info!("Model signature and hashes verified");
    Ok(())
}

// Constant-time compare for hex digests.
fn constant_time_eq_str(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff: u8 = 0;
    for (x, y) in a.as_bytes().iter().zip(b.as_bytes().iter()) {
        diff |= x ^ y;
    }
    diff == 0
}
