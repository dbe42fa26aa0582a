//! Recorded tick replay
//!
//! Tick files are headerless CSV rows of `time,ask,bid`; any further columns
//! (feature summaries written by the recorder) are ignored.

use super::{Tick, TickSource};
use anyhow::Context;
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Read every tick from a recorded CSV file
pub fn read_ticks(path: impl AsRef<Path>) -> anyhow::Result<Vec<Tick>> {
    let path = path.as_ref();
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Failed to open tick file {}", path.display()))?;

    let mut ticks = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("{}:{}", path.display(), line + 1))?;
        let tick = parse_record(&record)
            .with_context(|| format!("Malformed tick at {}:{}", path.display(), line + 1))?;
        ticks.push(tick);
    }
    Ok(ticks)
}

fn parse_record(record: &csv::StringRecord) -> anyhow::Result<Tick> {
    let field = |i: usize| {
        record
            .get(i)
            .map(str::trim)
            .ok_or_else(|| anyhow::anyhow!("missing column {}", i))
    };
    Ok(Tick {
        time: field(0)?.parse()?,
        ask: field(1)?.parse()?,
        bid: field(2)?.parse()?,
    })
}

/// Replays recorded ticks in file order
pub struct ReplayFeed {
    ticks: Arc<Vec<Tick>>,
}

impl ReplayFeed {
    /// Create a replay feed over in-memory ticks
    pub fn from_ticks(ticks: Vec<Tick>) -> Self {
        Self {
            ticks: Arc::new(ticks),
        }
    }

    /// Create a replay feed from a recorded tick file
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        Ok(Self::from_ticks(read_ticks(path)?))
    }

    /// Number of ticks that will be replayed
    pub fn len(&self) -> usize {
        self.ticks.len()
    }

    /// Whether the replay is empty
    pub fn is_empty(&self) -> bool {
        self.ticks.is_empty()
    }
}

#[async_trait]
impl TickSource for ReplayFeed {
    async fn subscribe(&self) -> anyhow::Result<mpsc::Receiver<Tick>> {
        let (tx, rx) = mpsc::channel(1024);
        let ticks = self.ticks.clone();

        tracing::info!(ticks = ticks.len(), "Starting tick replay");

        tokio::spawn(async move {
            for tick in ticks.iter() {
                if tx.send(*tick).await.is_err() {
                    tracing::debug!("Tick receiver dropped, stopping replay");
                    break;
                }
            }
        });

        Ok(rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_read_ticks_ignores_extra_columns() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "1000,150123,150120").unwrap();
        writeln!(file, "1250,150125,150121,60000:1:ff,60000:0.0:0.0:0.0:0.0").unwrap();
        file.flush().unwrap();

        let ticks = read_ticks(file.path()).unwrap();
        assert_eq!(ticks.len(), 2);
        assert_eq!(ticks[1], Tick::new(1250, 150_125, 150_121));
    }

    #[test]
    fn test_read_ticks_rejects_garbage() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "1000,abc,150120").unwrap();
        file.flush().unwrap();

        assert!(read_ticks(file.path()).is_err());
    }

    #[test]
    fn test_read_ticks_missing_file() {
        assert!(read_ticks("/nonexistent/ticks.csv").is_err());
    }

    #[tokio::test]
    async fn test_replay_delivers_in_order() {
        let feed = ReplayFeed::from_ticks(vec![
            Tick::new(0, 100_000, 99_990),
            Tick::new(10, 100_001, 99_991),
            Tick::new(20, 100_002, 99_992),
        ]);
        assert_eq!(feed.len(), 3);

        let mut rx = feed.subscribe().await.unwrap();
        let mut times = vec![];
        while let Some(tick) = rx.recv().await {
            times.push(tick.time);
        }
        assert_eq!(times, vec![0, 10, 20]);
    }
}
