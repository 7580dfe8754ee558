//! Metadata shared by every artifact and the JSON writer.

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use hp_core::{Error, Result};
use serde::Serialize;

/// Producer stamp carried by every artifact.
#[derive(Debug, Clone, Serialize)]
pub struct ArtifactMeta {
    /// Always `hepplot`.
    pub tool: String,
    /// Crate version.
    pub tool_version: String,
    /// Creation time.
    pub created_unix_ms: u128,
}

impl ArtifactMeta {
    /// Stamp for the current time.
    pub fn now() -> Result<Self> {
        Ok(Self {
            tool: "hepplot".to_string(),
            tool_version: hp_core::VERSION.to_string(),
            created_unix_ms: now_unix_ms()?,
        })
    }
}

fn now_unix_ms() -> Result<u128> {
    let d = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| Error::Validation(format!("system time error: {}", e)))?;
    Ok(d.as_millis())
}

/// Write an artifact as pretty JSON.
pub fn write_artifact<T: Serialize>(path: &Path, artifact: &T) -> Result<()> {
    let bytes = serde_json::to_vec_pretty(artifact)?;
    std::fs::write(path, bytes)?;
    tracing::info!(path = %path.display(), "artifact written");
    Ok(())
}
