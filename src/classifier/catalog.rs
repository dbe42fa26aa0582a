//! Static fingerprint catalog

use super::{FeatureStrategy, PassReason, TradeIntent, Verdict};
use crate::feature::{BitmapFingerprint, WindowFeatures};
use crate::signal::Side;
use serde::{Deserialize, Serialize};

/// A known fingerprint and the side it calls for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub side: Side,
    pub min_width: u64,
    pub max_width: u64,
    pub min_factor: u32,
    pub max_factor: u32,
    /// Fingerprint hex; normalized to lowercase on load
    pub pattern: String,
    #[serde(default)]
    pub label: String,
}

impl CatalogEntry {
    /// Whether a fingerprint falls inside this entry
    pub fn matches(&self, fingerprint: &BitmapFingerprint, hex: &str) -> bool {
        (self.min_width..=self.max_width).contains(&fingerprint.width_ms)
            && (self.min_factor..=self.max_factor).contains(&fingerprint.price_factor)
            && self.pattern == hex
    }
}

/// Ordered list of catalog entries; the first match wins
#[derive(Debug, Clone, Default)]
pub struct PatternCatalog {
    entries: Vec<CatalogEntry>,
}

impl PatternCatalog {
    /// Build a catalog, lowercasing every pattern
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        let entries = entries
            .into_iter()
            .map(|mut entry| {
                entry.pattern = entry.pattern.trim().to_ascii_lowercase();
                entry
            })
            .collect();
        Self { entries }
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the catalog is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// First entry matching a fingerprint
    pub fn lookup(&self, fingerprint: &BitmapFingerprint) -> Option<&CatalogEntry> {
        if fingerprint.is_sentinel() {
            return None;
        }
        let hex = fingerprint.hex();
        self.entries.iter().find(|entry| entry.matches(fingerprint, &hex))
    }
}

impl FeatureStrategy for PatternCatalog {
    fn name(&self) -> &'static str {
        "catalog"
    }

    fn evaluate(&self, features: &WindowFeatures) -> Verdict {
        let fingerprint = match &features.bitmap {
            Ok(fp) => fp,
            Err(e) => return Verdict::Pass(PassReason::NoFeature(e.clone())),
        };
        match self.lookup(fingerprint) {
            Some(entry) => Verdict::Act(TradeIntent {
                side: entry.side,
                width_ms: fingerprint.width_ms,
                provenance: format!("catalog:{}:{}", entry.label, fingerprint),
            }),
            None => Verdict::Pass(PassReason::NoMatch),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::{FeatureError, WindowSpec};

    fn entry(side: Side, pattern: &str, label: &str) -> CatalogEntry {
        CatalogEntry {
            side,
            min_width: 1000,
            max_width: 3000,
            min_factor: 10,
            max_factor: 30,
            pattern: pattern.to_string(),
            label: label.to_string(),
        }
    }

    fn fingerprint(width_ms: u64, price_factor: u32, bytes: Vec<u8>) -> BitmapFingerprint {
        BitmapFingerprint {
            width_ms,
            price_factor,
            bytes,
        }
    }

    fn features(bitmap: Result<BitmapFingerprint, FeatureError>) -> WindowFeatures {
        WindowFeatures {
            spec: WindowSpec::new(2000, 2, 4),
            complete: true,
            samples: 2,
            ms_per_tick: Some(2000.0),
            bitmap,
            fit: Err(FeatureError::NoSamples),
        }
    }

    #[test]
    fn test_match_is_case_insensitive() {
        let catalog = PatternCatalog::new(vec![entry(Side::Buy, "4A", "rise")]);
        let fp = fingerprint(2000, 25, vec![0x4a]);
        assert_eq!(catalog.lookup(&fp).unwrap().label, "rise");
    }

    #[test]
    fn test_ranges_are_inclusive() {
        let catalog = PatternCatalog::new(vec![entry(Side::Buy, "41", "rise")]);
        assert!(catalog.lookup(&fingerprint(1000, 10, vec![0x41])).is_some());
        assert!(catalog.lookup(&fingerprint(3000, 30, vec![0x41])).is_some());
        assert!(catalog.lookup(&fingerprint(3001, 25, vec![0x41])).is_none());
        assert!(catalog.lookup(&fingerprint(2000, 9, vec![0x41])).is_none());
    }

    #[test]
    fn test_first_match_wins() {
        let catalog = PatternCatalog::new(vec![
            entry(Side::Sell, "41", "first"),
            entry(Side::Buy, "41", "second"),
        ]);
        let verdict = catalog.evaluate(&features(Ok(fingerprint(2000, 25, vec![0x41]))));
        match verdict {
            Verdict::Act(intent) => {
                assert_eq!(intent.side, Side::Sell);
                assert_eq!(intent.provenance, "catalog:first:2000:25:41");
            }
            other => panic!("expected act, got {:?}", other),
        }
    }

    #[test]
    fn test_sentinel_never_matches() {
        let catalog = PatternCatalog::new(vec![CatalogEntry {
            min_factor: 0,
            ..entry(Side::Buy, "ff", "all")
        }]);
        let sentinel = BitmapFingerprint::sentinel(&WindowSpec::new(2000, 2, 4));
        assert!(catalog.lookup(&sentinel).is_none());
    }

    #[test]
    fn test_missing_bitmap_passes() {
        let catalog = PatternCatalog::new(vec![entry(Side::Buy, "41", "rise")]);
        assert_eq!(
            catalog.evaluate(&features(Err(FeatureError::InsufficientHistory { width_ms: 2000 }))),
            Verdict::Pass(PassReason::NoFeature(FeatureError::InsufficientHistory {
                width_ms: 2000
            }))
        );
        assert_eq!(
            catalog.evaluate(&features(Ok(fingerprint(2000, 25, vec![0x42])))),
            Verdict::Pass(PassReason::NoMatch)
        );
    }
}
