//! File-backed signal channel
//!
//! Each kind has one well-known path (`signal.json`, `signal_close.json`) in
//! the channel directory. Writers serialize to a temp file and rename it into
//! place. Readers claim the artifact by renaming it to a unique claim path,
//! so at most one reader ever sees it, then read and delete the claim.

use super::{ArtifactKind, ChannelError, SignalArtifact, SignalChannel};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use uuid::Uuid;

/// Signal channel over a shared directory
pub struct FileChannel {
    dir: PathBuf,
    max_age: chrono::Duration,
}

impl FileChannel {
    /// Create a channel in `dir`, creating the directory if needed
    pub async fn new(dir: impl Into<PathBuf>, max_age: chrono::Duration) -> Result<Self, ChannelError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).await?;
        Ok(Self { dir, max_age })
    }

    /// Channel directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Well-known path of a kind's pending artifact
    pub fn path_for(&self, kind: ArtifactKind) -> PathBuf {
        self.dir.join(format!("{}.json", kind.file_stem()))
    }

    async fn claim(&self, kind: ArtifactKind) -> Result<Option<PathBuf>, ChannelError> {
        let claim = self
            .dir
            .join(format!(".{}.{}.claim", kind.file_stem(), Uuid::new_v4()));
        match fs::rename(self.path_for(kind), &claim).await {
            Ok(()) => Ok(Some(claim)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl SignalChannel for FileChannel {
    async fn publish(&self, artifact: SignalArtifact) -> Result<(), ChannelError> {
        let path = self.path_for(artifact.kind());
        let tmp_path = self
            .dir
            .join(format!(".{}.{}.tmp", artifact.kind().file_stem(), artifact.id));

        let json = serde_json::to_vec(&artifact)?;
        fs::write(&tmp_path, &json).await?;
        fs::rename(&tmp_path, &path).await?;

        tracing::debug!(id = %artifact.id, path = %path.display(), "Artifact published");
        Ok(())
    }

    async fn take(
        &self,
        kind: ArtifactKind,
        now: DateTime<Utc>,
    ) -> Result<Option<SignalArtifact>, ChannelError> {
        let Some(claim) = self.claim(kind).await? else {
            return Ok(None);
        };
        let bytes = fs::read(&claim).await;
        fs::remove_file(&claim).await?;
        let artifact: SignalArtifact = serde_json::from_slice(&bytes?)?;

        if artifact.is_stale(now, self.max_age) {
            tracing::warn!(
                id = %artifact.id,
                created_at = %artifact.created_at,
                "Discarding stale artifact"
            );
            return Ok(None);
        }
        Ok(Some(artifact))
    }

    async fn discard(&self, kind: ArtifactKind) -> Result<(), ChannelError> {
        match fs::remove_file(self.path_for(kind)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
