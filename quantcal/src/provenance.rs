//! Reproducibility metadata attached to every engine result.
//!
//! The request hash is the SHA-256 of the canonical JSON form of the
//! request: compact, object keys sorted. Identical inputs and seed give an
//! identical hash; `received_at` and `request_id` are fresh per call.

use chrono::{DateTime, Utc};
use qc_core::errors::{Error, Result};
use serde::Serialize;
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Engine name reported in [`RuntimeInfo`].
pub const ENGINE_NAME: &str = "quantcal";

/// Crate version baked in at build time.
pub const PACKAGE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build environment of the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuntimeInfo {
    /// Engine name.
    pub engine: String,
    /// Engine version.
    pub engine_version: String,
    /// Target operating system.
    pub os: String,
    /// Target architecture.
    pub arch: String,
}

impl RuntimeInfo {
    /// Runtime info of the current build.
    pub fn current() -> Self {
        Self {
            engine: ENGINE_NAME.to_string(),
            engine_version: PACKAGE_VERSION.to_string(),
            os: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
        }
    }
}

/// Provenance of one engine call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Provenance {
    /// Version of the engine that produced the result.
    pub package_version: String,
    /// When the request was received.
    pub received_at: DateTime<Utc>,
    /// Unique id of this call.
    pub request_id: Uuid,
    /// Hex SHA-256 of the canonical request.
    pub request_hash: String,
    /// Seed actually used, for stochastic operations.
    pub seed_effective: Option<u64>,
    /// Build environment.
    pub runtime: RuntimeInfo,
    /// Source revision, from the `GIT_SHA` environment variable.
    pub git_sha: Option<String>,
}

impl Provenance {
    /// Capture provenance for `request`.
    ///
    /// # Errors
    /// `InvalidInput` if the request cannot be serialised.
    pub fn capture<R: Serialize + ?Sized>(request: &R, seed_effective: Option<u64>) -> Result<Self> {
        Ok(Self {
            package_version: PACKAGE_VERSION.to_string(),
            received_at: Utc::now(),
            request_id: Uuid::new_v4(),
            request_hash: request_hash(request)?,
            seed_effective,
            runtime: RuntimeInfo::current(),
            git_sha: std::env::var("GIT_SHA").ok().filter(|s| !s.is_empty()),
        })
    }
}

/// A result with its provenance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Enveloped<T> {
    /// Engine output.
    pub result: T,
    /// Reproducibility metadata.
    pub provenance: Provenance,
}

impl<T> Enveloped<T> {
    /// Drop the provenance.
    pub fn into_result(self) -> T {
        self.result
    }
}

/// Compact JSON with sorted object keys.
pub fn canonical_json<R: Serialize + ?Sized>(request: &R) -> Result<String> {
    // serde_json::Map is a BTreeMap, so a round trip through Value sorts keys
    let value = serde_json::to_value(request)
        .map_err(|e| Error::invalid_input("request", "<unserialisable>", e.to_string()))?;
    serde_json::to_string(&value).map_err(|e| Error::invalid_input("request", "<unserialisable>", e.to_string()))
}

/// Hex SHA-256 of [`canonical_json`].
pub fn request_hash<R: Serialize + ?Sized>(request: &R) -> Result<String> {
    let digest = Sha256::digest(canonical_json(request)?.as_bytes());
    Ok(digest.iter().map(|b| format!("{b:02x}")).collect())
}
