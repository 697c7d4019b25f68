use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use growsync_api::models::PersistedSession;

use crate::errors::ClientError;

/// Remembers which environments were open, by `{ id, name }` only.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn load(&self) -> Result<Vec<PersistedSession>, ClientError> {
        match tokio::fs::read(&self.path).await {
            Ok(content) => Ok(serde_json::from_slice(&content)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn save(&self, sessions: &[PersistedSession]) -> Result<(), ClientError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_vec_pretty(sessions)?;
        tokio::fs::write(&self.path, content).await?;

        tracing::debug!("saved {} sessions to {}", sessions.len(), self.path.display());

        Ok(())
    }
}
