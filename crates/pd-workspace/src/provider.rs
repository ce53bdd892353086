//! File-backed model provider.

use std::path::Path;

use pd_core::{Error, ModelProvider, ResourceKind, Result};

use crate::schema::WorkspaceFile;
use crate::workspace::JsonWorkspace;

/// Read and parse a workspace file.
pub fn read_workspace_file(path: &Path) -> Result<WorkspaceFile> {
    if !path.exists() {
        return Err(Error::missing(ResourceKind::File, path.display().to_string(), "the filesystem"));
    }
    let bytes = std::fs::read(path)?;
    let file: WorkspaceFile = serde_json::from_slice(&bytes)?;
    Ok(file)
}

/// Opens workspaces from JSON files; the channel source is the file path.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonModelProvider;

impl JsonModelProvider {
    /// Create a provider.
    pub fn new() -> Self {
        Self
    }
}

impl ModelProvider for JsonModelProvider {
    type Workspace = JsonWorkspace;

    fn open(&self, source: &str, workspace: &str) -> Result<JsonWorkspace> {
        let file = read_workspace_file(Path::new(source))?;
        let spec = file
            .workspaces
            .iter()
            .find(|w| w.name == workspace)
            .ok_or_else(|| Error::missing(ResourceKind::Workspace, workspace, source))?;
        log::info!("opened workspace '{workspace}' from {source}");
        JsonWorkspace::from_spec(spec)
    }
}
