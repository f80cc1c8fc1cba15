//! Signs a risk model artifact directory.
//!
//! Writes `manifest.json` (SHA-256 of every bound file) and `model.sig`
//! (Ed25519 over the manifest bytes) next to `risk_model.json`, so the
//! predictor can verify the artifact when `CERVICARE_REQUIRE_SIGNED_MODEL`
//! is set.
//!
//! # Usage
//!
//! ```bash
//! CERVICARE_MODEL_SIGNING_KEY_B64_FILE=/run/secrets/seed.b64 \
//!     cargo run --bin sign_model -- <model_dir> [extra_file ...]
//! ```
//!
//! The key file holds a base64 32-byte Ed25519 seed. The matching verifying
//! key is printed in the format `CERVICARE_MODEL_PUBKEY_B64_FILE` expects.

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use base64::engine::general_purpose;
use base64::Engine;
use ed25519_dalek::{Signer, SigningKey};

use cervicare::adapters::logistic::{
    sha256_hex, ModelManifest, MANIFEST_FILE_NAME, MODEL_FILE_NAME, SIGNATURE_FILE_NAME,
};

const KEY_FILE_ENV: &str = "CERVICARE_MODEL_SIGNING_KEY_B64_FILE";

fn read_signing_key() -> Result<SigningKey> {
    let path = env::var(KEY_FILE_ENV)
        .with_context(|| format!("{KEY_FILE_ENV} must point to a base64 Ed25519 seed"))?;
    let content = fs::read_to_string(path.trim())
        .with_context(|| format!("Failed to read signing key file {path}"))?;

    let raw = general_purpose::STANDARD
        .decode(content.trim())
        .context("Invalid base64 in signing key")?;
    let seed: [u8; 32] = raw.as_slice().try_into().map_err(|_| {
        anyhow::anyhow!(
            "Signing key seed must be 32 bytes after base64 decode (got {})",
            raw.len()
        )
    })?;
    Ok(SigningKey::from_bytes(&seed))
}

fn parse_args() -> Result<(PathBuf, Vec<String>)> {
    let mut args = env::args().skip(1);
    let Some(first) = args.next() else {
        bail!("Usage: sign_model <model_dir> [extra_file ...]");
    };
    if first == "-h" || first == "--help" {
        bail!("Usage: sign_model <model_dir> [extra_file ...]");
    }

    let mut model_dir = PathBuf::from(first);
    if model_dir.is_file() {
        model_dir = model_dir
            .parent()
            .context("Model path has no parent directory")?
            .to_path_buf();
    }
    Ok((model_dir, args.collect()))
}

fn main() -> Result<()> {
    let (model_dir, extra_files) = parse_args()?;
    let signing_key = read_signing_key()?;

    let mut files = BTreeMap::new();
    for rel in std::iter::once(MODEL_FILE_NAME.to_string()).chain(extra_files) {
        let path = model_dir.join(&rel);
        let bytes = fs::read(&path).with_context(|| format!("Failed to read {path:?}"))?;
        files.insert(rel, sha256_hex(&bytes));
    }

    let manifest = ModelManifest {
        version: 1,
        created_at: Some(chrono::Utc::now().timestamp()),
        files,
    };
    let manifest_bytes =
        serde_json::to_vec_pretty(&manifest).context("Failed to serialize manifest")?;

    let manifest_path = model_dir.join(MANIFEST_FILE_NAME);
    fs::write(&manifest_path, &manifest_bytes)
        .with_context(|| format!("Failed to write {manifest_path:?}"))?;

    let signature = signing_key.sign(&manifest_bytes);
    let sig_path = model_dir.join(SIGNATURE_FILE_NAME);
    fs::write(&sig_path, signature.to_bytes())
        .with_context(|| format!("Failed to write {sig_path:?}"))?;

    println!("Signed manifest: {manifest_path:?}");
    println!("Wrote signature: {sig_path:?}");
    println!(
        "Verifying key (base64): {}",
        general_purpose::STANDARD.encode(signing_key.verifying_key().as_bytes())
    );

    Ok(())
}
