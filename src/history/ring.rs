//! Fixed-capacity circular tick history

use crate::feed::{Price, TimeMs};

/// One retained (time, price) observation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Sample {
    /// Sample time in milliseconds
    pub time: TimeMs,
    /// Fixed-point price
    pub price: Price,
}

/// Circular store of the most recent samples
///
/// Samples are addressed by a logical index that grows with every append.
/// The physical slot is `logical % capacity`; once more than `capacity`
/// samples have been appended the oldest ones are overwritten without notice.
#[derive(Debug, Clone)]
pub struct RingBuffer {
    samples: Vec<Sample>,
    write_index: u64,
}

impl RingBuffer {
    /// Create a ring buffer holding at most `capacity` samples
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: vec![Sample::default(); capacity.max(1)],
            write_index: 0,
        }
    }

    /// Maximum number of retained samples
    pub fn capacity(&self) -> usize {
        self.samples.len()
    }

    /// Total number of samples ever appended
    pub fn appended(&self) -> u64 {
        self.write_index
    }

    /// Whether nothing has been appended yet
    pub fn is_empty(&self) -> bool {
        self.write_index == 0
    }

    /// Append a sample, returning its logical index
    pub fn append(&mut self, time: TimeMs, price: Price) -> u64 {
        let index = self.write_index;
        let slot = self.slot(index);
        self.samples[slot] = Sample { time, price };
        self.write_index += 1;
        index
    }

    /// Physical slot for a logical index
    pub fn slot(&self, logical: u64) -> usize {
        (logical % self.samples.len() as u64) as usize
    }

    /// Logical index of the oldest retained sample
    pub fn oldest(&self) -> u64 {
        self.write_index
            .saturating_sub(self.samples.len() as u64)
    }

    /// Logical index of the newest sample
    pub fn latest(&self) -> Option<u64> {
        self.write_index.checked_sub(1)
    }

    /// Whether any sample has ever been overwritten
    pub fn has_wrapped(&self) -> bool {
        self.oldest() > 0
    }

    /// Whether a logical index is still retained
    pub fn contains(&self, logical: u64) -> bool {
        logical < self.write_index && logical >= self.oldest()
    }

    /// Sample at a logical index, if still retained
    pub fn get(&self, logical: u64) -> Option<Sample> {
        if !self.contains(logical) {
            return None;
        }
        Some(self.samples[self.slot(logical)])
    }

    /// Iterate retained samples backwards starting at `from`
    pub fn iter_back(&self, from: u64) -> impl Iterator<Item = (u64, Sample)> + '_ {
        let start = if self.contains(from) {
            Some(from)
        } else {
            None
        };
        let oldest = self.oldest();
        start
            .into_iter()
            .flat_map(move |from| (oldest..=from).rev())
            .map(move |i| (i, self.samples[self.slot(i)]))
    }

    /// Find the newest index strictly earlier than `time(from) - delta_ms`
    ///
    /// Scans backwards over retained samples only. Returns `None` when the
    /// cutoff would be negative, `from` is not retained, or the retained
    /// history does not reach back past the cutoff.
    pub fn find_index_before(&self, from: u64, delta_ms: TimeMs) -> Option<u64> {
        let cutoff = self.get(from)?.time.checked_sub(delta_ms)?;
        self.iter_back(from)
            .find(|(_, sample)| sample.time < cutoff)
            .map(|(i, _)| i)
    }
}
