//! Signal artifact channels
//!
//! A channel holds at most one pending artifact per kind. Publishing replaces
//! the pending artifact; taking removes it so that exactly one reader sees it.

use super::{ArtifactKind, SignalArtifact};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::Mutex;

/// Signal channel errors
#[derive(Debug, Error)]
pub enum ChannelError {
    /// Filesystem failure
    #[error("Channel I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Artifact could not be encoded or decoded
    #[error("Malformed artifact: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Write-once, read-once artifact exchange
#[async_trait]
pub trait SignalChannel: Send + Sync {
    /// Publish an artifact, replacing any pending one of the same kind
    async fn publish(&self, artifact: SignalArtifact) -> Result<(), ChannelError>;
    /// Claim the pending artifact of a kind; stale artifacts are dropped
    async fn take(
        &self,
        kind: ArtifactKind,
        now: DateTime<Utc>,
    ) -> Result<Option<SignalArtifact>, ChannelError>;
    /// Drop any pending artifact of a kind without reading it
    async fn discard(&self, kind: ArtifactKind) -> Result<(), ChannelError>;
}

/// In-process channel
pub struct MemoryChannel {
    pending: Mutex<HashMap<ArtifactKind, SignalArtifact>>,
    max_age: chrono::Duration,
}

impl MemoryChannel {
    /// Create an empty channel
    pub fn new(max_age: chrono::Duration) -> Self {
        Self {
            pending: Mutex::new(HashMap::new()),
            max_age,
        }
    }

    /// Whether an artifact of a kind is pending
    pub async fn has_pending(&self, kind: ArtifactKind) -> bool {
        self.pending.lock().await.contains_key(&kind)
    }
}

#[async_trait]
impl SignalChannel for MemoryChannel {
    async fn publish(&self, artifact: SignalArtifact) -> Result<(), ChannelError> {
        tracing::debug!(id = %artifact.id, action = ?artifact.action, "Publishing artifact");
        self.pending.lock().await.insert(artifact.kind(), artifact);
        Ok(())
    }

    async fn take(
        &self,
        kind: ArtifactKind,
        now: DateTime<Utc>,
    ) -> Result<Option<SignalArtifact>, ChannelError> {
        let Some(artifact) = self.pending.lock().await.remove(&kind) else {
            return Ok(None);
        };
        if artifact.is_stale(now, self.max_age) {
            tracing::warn!(id = %artifact.id, created_at = %artifact.created_at, "Discarding stale artifact");
            return Ok(None);
        }
        Ok(Some(artifact))
    }

    async fn discard(&self, kind: ArtifactKind) -> Result<(), ChannelError> {
        self.pending.lock().await.remove(&kind);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::Side;

    fn channel() -> MemoryChannel {
        MemoryChannel::new(chrono::Duration::seconds(10))
    }

    #[tokio::test]
    async fn test_take_is_read_once() {
        let channel = channel();
        let artifact = SignalArtifact::open(Side::Buy, 10, 50, "test");
        channel.publish(artifact.clone()).await.unwrap();

        let now = Utc::now();
        assert_eq!(
            channel.take(ArtifactKind::Open, now).await.unwrap(),
            Some(artifact)
        );
        assert_eq!(channel.take(ArtifactKind::Open, now).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_kinds_are_independent() {
        let channel = channel();
        channel
            .publish(SignalArtifact::close(10, "test"))
            .await
            .unwrap();
        assert!(channel
            .take(ArtifactKind::Open, Utc::now())
            .await
            .unwrap()
            .is_none());
        assert!(channel.has_pending(ArtifactKind::Close).await);
    }

    #[tokio::test]
    async fn test_publish_replaces_pending() {
        let channel = channel();
        channel
            .publish(SignalArtifact::open(Side::Buy, 1, 50, "first"))
            .await
            .unwrap();
        channel
            .publish(SignalArtifact::open(Side::Sell, 2, 50, "second"))
            .await
            .unwrap();
        let taken = channel
            .take(ArtifactKind::Open, Utc::now())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(taken.provenance, "second");
    }

    #[tokio::test]
    async fn test_stale_artifact_is_dropped() {
        let channel = channel();
        let artifact = SignalArtifact::open(Side::Buy, 1, 50, "old");
        let later = artifact.created_at + chrono::Duration::seconds(60);
        channel.publish(artifact).await.unwrap();

        assert!(channel.take(ArtifactKind::Open, later).await.unwrap().is_none());
        assert!(!channel.has_pending(ArtifactKind::Open).await);
    }

    #[tokio::test]
    async fn test_discard() {
        let channel = channel();
        channel
            .publish(SignalArtifact::close(1, "test"))
            .await
            .unwrap();
        channel.discard(ArtifactKind::Close).await.unwrap();
        assert!(!channel.has_pending(ArtifactKind::Close).await);
        // discarding nothing is fine
        channel.discard(ArtifactKind::Open).await.unwrap();
    }
}
