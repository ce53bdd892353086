use std::time::{SystemTime, UNIX_EPOCH};

use pd_core::Result;
use serde::Serialize;

/// Tool name recorded in every artifact.
pub const TOOL: &str = "plrdecomp";

/// Provenance block shared by all artifacts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactMeta {
    /// Producing tool.
    pub tool: String,
    /// Tool version.
    pub tool_version: String,
    /// Creation time; 0 in deterministic mode.
    pub created_unix_ms: u128,
}

impl ArtifactMeta {
    /// Stamp with the current time, or 0 when `deterministic`.
    pub fn new(deterministic: bool) -> Result<Self> {
        let created_unix_ms = if deterministic { 0 } else { now_unix_ms()? };
        Ok(Self { tool: TOOL.to_string(), tool_version: pd_core::VERSION.to_string(), created_unix_ms })
    }
}

fn now_unix_ms() -> Result<u128> {
    let d = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| pd_core::Error::Computation(format!("system time error: {}", e)))?;
    Ok(d.as_millis())
}
