//! Tick and order recorders

use super::{OrderRecord, TickRecord};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

/// Sink for tick and order records
pub trait Recorder: Send {
    /// Record one tick's features
    fn record_tick(&mut self, record: &TickRecord) -> csv::Result<()>;

    /// Record an order lifecycle event
    fn record_order(&mut self, record: &OrderRecord) -> csv::Result<()>;

    /// Flush buffered rows
    fn flush(&mut self) -> csv::Result<()>;

    /// Counts of rows written so far
    fn stats(&self) -> RecorderStats;
}

/// Recording statistics
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RecorderStats {
    pub ticks_written: u64,
    pub orders_written: u64,
}

type Sink = csv::Writer<Box<dyn Write + Send>>;

/// Writes records as CSV
///
/// Tick rows are headerless so the file can be replayed; order rows carry
/// a header.
pub struct CsvRecorder {
    ticks: Option<Sink>,
    orders: Option<Sink>,
    stats: RecorderStats,
}

impl CsvRecorder {
    /// Record to arbitrary writers; `None` drops that record kind
    pub fn new(ticks: Option<Box<dyn Write + Send>>, orders: Option<Box<dyn Write + Send>>) -> Self {
        Self {
            ticks: ticks.map(|w| csv::WriterBuilder::new().has_headers(false).from_writer(w)),
            orders: orders.map(csv::Writer::from_writer),
            stats: RecorderStats::default(),
        }
    }

    /// Record to `ticks.csv` and `orders.csv` under `dir`
    pub fn create(dir: impl AsRef<Path>, record_ticks: bool) -> csv::Result<Self> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        let ticks: Option<Box<dyn Write + Send>> = if record_ticks {
            Some(Box::new(File::create(dir.join("ticks.csv"))?))
        } else {
            None
        };
        let orders: Box<dyn Write + Send> = Box::new(File::create(dir.join("orders.csv"))?);
        tracing::info!(dir = %dir.display(), record_ticks, "Recording to CSV");
        Ok(Self::new(ticks, Some(orders)))
    }
}

impl Recorder for CsvRecorder {
    fn record_tick(&mut self, record: &TickRecord) -> csv::Result<()> {
        if let Some(writer) = &mut self.ticks {
            writer.serialize(record)?;
            self.stats.ticks_written += 1;
        }
        Ok(())
    }

    fn record_order(&mut self, record: &OrderRecord) -> csv::Result<()> {
        if let Some(writer) = &mut self.orders {
            writer.serialize(record)?;
            self.stats.orders_written += 1;
        }
        Ok(())
    }

    fn flush(&mut self) -> csv::Result<()> {
        for writer in [&mut self.ticks, &mut self.orders].into_iter().flatten() {
            writer.flush()?;
        }
        Ok(())
    }

    fn stats(&self) -> RecorderStats {
        self.stats
    }
}

#[derive(Debug, Default)]
struct Captured {
    ticks: Vec<TickRecord>,
    orders: Vec<OrderRecord>,
}

/// Keeps records in memory; clones share the same storage
#[derive(Debug, Clone, Default)]
pub struct MemoryRecorder {
    inner: Arc<Mutex<Captured>>,
}

impl MemoryRecorder {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Captured> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Tick records captured so far
    pub fn ticks(&self) -> Vec<TickRecord> {
        self.lock().ticks.clone()
    }

    /// Order records captured so far
    pub fn orders(&self) -> Vec<OrderRecord> {
        self.lock().orders.clone()
    }
}

impl Recorder for MemoryRecorder {
    fn record_tick(&mut self, record: &TickRecord) -> csv::Result<()> {
        self.lock().ticks.push(record.clone());
        Ok(())
    }

    fn record_order(&mut self, record: &OrderRecord) -> csv::Result<()> {
        self.lock().orders.push(record.clone());
        Ok(())
    }

    fn flush(&mut self) -> csv::Result<()> {
        Ok(())
    }

    fn stats(&self) -> RecorderStats {
        let captured = self.lock();
        RecorderStats {
            ticks_written: captured.ticks.len() as u64,
            orders_written: captured.orders.len() as u64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::OrderEvent;
    use crate::feed::{read_ticks, Tick};
    use crate::signal::Side;
    use rust_decimal_macros::dec;
    use tempfile::tempdir;

    fn tick_record() -> TickRecord {
        TickRecord {
            time: 1000,
            ask: 1010,
            bid: 1000,
            bitmap: "2000:25:41".into(),
            fit: "2000:100.0:0.05:0.0:1.0".into(),
            movement: 0.0,
        }
    }

    fn order_record() -> OrderRecord {
        OrderRecord {
            time: 1000,
            event: OrderEvent::Open,
            side: Side::Buy,
            width_ms: 2000,
            price: 1010,
            lots: dec!(1.5),
            pnl_points: dec!(0),
            detail: "knn".into(),
        }
    }

    #[test]
    fn test_csv_recorder_writes_rows() {
        let dir = tempdir().unwrap();
        let mut recorder = CsvRecorder::create(dir.path(), true).unwrap();
        recorder.record_tick(&tick_record()).unwrap();
        recorder.record_order(&order_record()).unwrap();
        recorder.flush().unwrap();
        assert_eq!(
            recorder.stats(),
            RecorderStats {
                ticks_written: 1,
                orders_written: 1
            }
        );

        let ticks = std::fs::read_to_string(dir.path().join("ticks.csv")).unwrap();
        let mut lines = ticks.lines();
        assert_eq!(
            lines.next(),
            Some("1000,1010,1000,0.0,2000:25:41,2000:100.0:0.05:0.0:1.0")
        );
        assert_eq!(lines.next(), None);

        let orders = std::fs::read_to_string(dir.path().join("orders.csv")).unwrap();
        let mut lines = orders.lines();
        assert_eq!(
            lines.next(),
            Some("time,event,side,width_ms,price,lots,pnl_points,detail")
        );
        assert_eq!(lines.next(), Some("1000,open,buy,2000,1010,1.5,0,knn"));
    }

    #[test]
    fn test_recorded_ticks_replay() {
        let dir = tempdir().unwrap();
        let mut recorder = CsvRecorder::create(dir.path(), true).unwrap();
        for (time, ask) in [(0, 1010), (100, 1012)] {
            recorder
                .record_tick(&TickRecord {
                    time,
                    ask,
                    bid: ask - 10,
                    ..tick_record()
                })
                .unwrap();
        }
        recorder.flush().unwrap();

        let ticks = read_ticks(dir.path().join("ticks.csv")).unwrap();
        assert_eq!(ticks, vec![Tick::new(0, 1010, 1000), Tick::new(100, 1012, 1002)]);
    }

    #[test]
    fn test_csv_recorder_without_ticks() {
        let dir = tempdir().unwrap();
        let mut recorder = CsvRecorder::create(dir.path(), false).unwrap();
        recorder.record_tick(&tick_record()).unwrap();
        recorder.flush().unwrap();
        assert_eq!(recorder.stats().ticks_written, 0);
        assert!(!dir.path().join("ticks.csv").exists());
    }

    #[test]
    fn test_memory_recorder_clones_share_storage() {
        let recorder = MemoryRecorder::new();
        let mut writer = recorder.clone();
        writer.record_order(&order_record()).unwrap();
        assert_eq!(recorder.orders().len(), 1);
        assert_eq!(recorder.stats().orders_written, 1);
    }
}
