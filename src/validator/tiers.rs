//! Versioned CPU/GPU tier ladders.
//!
//! Tiers are data: a deployment can ship a newer table as JSON without
//! touching the bottleneck logic.
//!
//! ```json
//! {
//!   "version": "2025.1",
//!   "cpu": { "default_tier": 1, "rungs": [{ "tier": 4, "markers": ["i9", "Ryzen 9"] }] },
//!   "gpu": { "default_tier": 1, "rungs": [{ "tier": 4, "markers": ["5090"] }] }
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MIN_TIER: u8 = 1;
pub const MAX_TIER: u8 = 4;

#[derive(Debug, Error)]
pub enum TierTableError {
    #[error("failed to read tier table {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid tier table JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("tier {0} is outside 1..=4")]
    OutOfRange(u8),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierRung {
    pub tier: u8,
    pub markers: Vec<String>,
}

/// Ordered rungs, checked top to bottom. First rung with a matching marker wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierLadder {
    pub default_tier: u8,
    pub rungs: Vec<TierRung>,
}

impl TierLadder {
    /// Case-sensitive substring match on the part name.
    pub fn classify(&self, name: &str) -> u8 {
        self.rungs
            .iter()
            .find(|rung| rung.markers.iter().any(|m| name.contains(m.as_str())))
            .map_or(self.default_tier, |rung| rung.tier)
    }

    fn check_range(&self) -> Result<(), TierTableError> {
        let in_range = |t: u8| (MIN_TIER..=MAX_TIER).contains(&t);
        if !in_range(self.default_tier) {
            return Err(TierTableError::OutOfRange(self.default_tier));
        }
        match self.rungs.iter().find(|r| !in_range(r.tier)) {
            Some(rung) => Err(TierTableError::OutOfRange(rung.tier)),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierTable {
    pub version: String,
    pub cpu: TierLadder,
    pub gpu: TierLadder,
}

fn rung(tier: u8, markers: &[&str]) -> TierRung {
    TierRung {
        tier,
        markers: markers.iter().map(|m| m.to_string()).collect(),
    }
}

impl Default for TierTable {
    fn default() -> Self {
        Self {
            version: "builtin-1".to_string(),
            cpu: TierLadder {
                default_tier: MIN_TIER,
                rungs: vec![
                    rung(4, &["i9", "Ryzen 9"]),
                    rung(3, &["i7", "Ryzen 7"]),
                    rung(2, &["i5", "Ryzen 5"]),
                ],
            },
            gpu: TierLadder {
                default_tier: MIN_TIER,
                rungs: vec![
                    rung(4, &["4090", "4080"]),
                    rung(3, &["4070"]),
                    rung(2, &["4060", "3060"]),
                ],
            },
        }
    }
}

impl TierTable {
    pub fn from_json(raw: &str) -> Result<Self, TierTableError> {
        let table: TierTable = serde_json::from_str(raw)?;
        table.cpu.check_range()?;
        table.gpu.check_range()?;
        Ok(table)
    }

    pub fn from_path(path: &Path) -> Result<Self, TierTableError> {
        let raw = std::fs::read_to_string(path).map_err(|source| TierTableError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&raw)
    }

    pub fn cpu_tier(&self, name: &str) -> u8 {
        self.cpu.classify(name)
    }

    pub fn gpu_tier(&self, name: &str) -> u8 {
        self.gpu.classify(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_cpu_ladder() {
        let t = TierTable::default();
        assert_eq!(t.cpu_tier("Intel Core i9-14900K"), 4);
        assert_eq!(t.cpu_tier("AMD Ryzen 7 7800X3D"), 3);
        assert_eq!(t.cpu_tier("i5-13600K"), 2);
        assert_eq!(t.cpu_tier("i3-12100"), 1);
        assert_eq!(t.cpu_tier("Pentium Gold"), 1);
    }

    #[test]
    fn builtin_gpu_ladder() {
        let t = TierTable::default();
        assert_eq!(t.gpu_tier("RTX 4080 Super"), 4);
        assert_eq!(t.gpu_tier("RTX 4070 Ti"), 3);
        assert_eq!(t.gpu_tier("RTX 3060 12GB"), 2);
        assert_eq!(t.gpu_tier("GTX 1650"), 1);
    }

    #[test]
    fn matching_is_case_sensitive() {
        assert_eq!(TierTable::default().cpu_tier("I9-13900K"), 1);
    }

    #[test]
    fn loads_newer_generation_from_json() {
        let raw = r#"{
            "version": "2025.1",
            "cpu": {"default_tier": 1, "rungs": [{"tier": 4, "markers": ["Ultra 9"]}]},
            "gpu": {"default_tier": 2, "rungs": [{"tier": 4, "markers": ["5090"]}]}
        }"#;
        let t = TierTable::from_json(raw).unwrap();

        assert_eq!(t.version, "2025.1");
        assert_eq!(t.cpu_tier("Core Ultra 9 285K"), 4);
        assert_eq!(t.gpu_tier("RTX 5090"), 4);
        assert_eq!(t.gpu_tier("RTX 4090"), 2);
    }

    #[test]
    fn rejects_out_of_range_tier() {
        let raw = r#"{
            "version": "bad",
            "cpu": {"default_tier": 1, "rungs": [{"tier": 7, "markers": ["i9"]}]},
            "gpu": {"default_tier": 1, "rungs": []}
        }"#;
        assert!(matches!(TierTable::from_json(raw), Err(TierTableError::OutOfRange(7))));
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(matches!(TierTable::from_json("{"), Err(TierTableError::Parse(_))));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = TierTable::from_path(Path::new("/nonexistent/tiers.json")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/tiers.json"));
    }
}
