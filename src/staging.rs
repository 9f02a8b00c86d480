//! Configuration staging
//!
//! The engine only reads its settings from a file, so `init` writes the payload
//! to a uniquely named artifact that lives until `cleanup` (or until it is
//! replaced by the next `init`).

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempPath;
use tracing::debug;

/// Name prefix of staged artifacts
pub const STAGED_PREFIX: &str = "xmrig_config_";

/// Name suffix of staged artifacts
pub const STAGED_SUFFIX: &str = ".json";

/// A configuration payload persisted for the worker
///
/// The artifact is deleted when this value is dropped or [`StagedConfig::remove`]d.
#[derive(Debug)]
pub struct StagedConfig {
    path: TempPath,
    len: usize,
    staged_at: DateTime<Utc>,
}

impl StagedConfig {
    /// Validate `payload` and write it to a fresh file in `dir`
    pub fn stage(payload: &str, dir: &Path) -> Result<Self> {
        validate_payload(payload)?;

        let mut file = tempfile::Builder::new()
            .prefix(STAGED_PREFIX)
            .suffix(STAGED_SUFFIX)
            .tempfile_in(dir)
            .map_err(|e| {
                Error::staging_failed(format!("{}: {}", dir.display(), e))
            })?;

        let target = file.path().to_path_buf();
        persist(file.as_file_mut(), payload, &target)?;
        file.as_file()
            .sync_all()
            .map_err(|e| Error::write_failed(format!("{}: {}", target.display(), e)))?;

        let path = file.into_temp_path();
        debug!("Staged {} bytes of configuration at {}", payload.len(), path.display());

        Ok(Self {
            path,
            len: payload.len(),
            staged_at: Utc::now(),
        })
    }

    /// Location of the artifact
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Owned copy of the artifact location
    pub fn path_buf(&self) -> PathBuf {
        self.path.to_path_buf()
    }

    /// Payload size in bytes
    pub fn payload_len(&self) -> usize {
        self.len
    }

    /// When the artifact was written
    pub fn staged_at(&self) -> DateTime<Utc> {
        self.staged_at
    }

    /// Delete the artifact now, reporting failures
    pub fn remove(self) -> Result<()> {
        let shown = self.path.display().to_string();
        self.path.close()?;
        debug!("Removed staged configuration {}", shown);
        Ok(())
    }
}

/// Write and flush `payload` to durable storage
fn persist<W: Write>(writer: &mut W, payload: &str, target: &Path) -> Result<()> {
    writer
        .write_all(payload.as_bytes())
        .and_then(|_| writer.flush())
        .map_err(|e| Error::write_failed(format!("{}: {}", target.display(), e)))
}

/// Reject payloads the engine could never load
pub fn validate_payload(payload: &str) -> Result<()> {
    if payload.trim().is_empty() {
        return Err(Error::invalid_config("configuration payload is empty"));
    }

    serde_json::from_str::<serde_json::Value>(payload)
        .map_err(|e| Error::invalid_config(format!("configuration is not valid JSON: {}", e)))?;

    Ok(())
}
