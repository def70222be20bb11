//! Defect rate table
//!
//! Per-category defect rates shown on the heatmap. Rates drift by a small
//! random amount every logical tick.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::round1;

/// Defect categories tracked by the vision system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefectKind {
    Pinhole,
    GlazeFlow,
    Banding,
    BlackCore,
    Ghosting,
    EdgeBreak,
    Crack,
    PatternShift,
}

impl DefectKind {
    pub fn label(&self) -> &'static str {
        match self {
            DefectKind::Pinhole => "Pinhole",
            DefectKind::GlazeFlow => "Glaze Flow",
            DefectKind::Banding => "Banding",
            DefectKind::BlackCore => "Black Core",
            DefectKind::Ghosting => "Ghosting",
            DefectKind::EdgeBreak => "Edge Break",
            DefectKind::Crack => "Crack",
            DefectKind::PatternShift => "Pattern Shift",
        }
    }
}

/// Heatmap color band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Low,
    Medium,
    High,
}

/// Rate at or above which a defect is high severity (%)
pub const SEVERITY_HIGH: f64 = 2.0;
/// Rate at or above which a defect is medium severity (%)
pub const SEVERITY_MEDIUM: f64 = 1.0;

impl Severity {
    pub fn from_rate(rate: f64) -> Self {
        if rate >= SEVERITY_HIGH {
            Severity::High
        } else if rate >= SEVERITY_MEDIUM {
            Severity::Medium
        } else {
            Severity::Low
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DefectRate {
    pub kind: DefectKind,
    /// Percent of output
    pub rate: f64,
}

impl DefectRate {
    pub fn severity(&self) -> Severity {
        Severity::from_rate(self.rate)
    }
}

/// Starting rates (%)
const INITIAL_RATES: [(DefectKind, f64); 8] = [
    (DefectKind::Pinhole, 0.8),
    (DefectKind::GlazeFlow, 1.2),
    (DefectKind::Banding, 0.5),
    (DefectKind::BlackCore, 0.4),
    (DefectKind::Ghosting, 0.2),
    (DefectKind::EdgeBreak, 2.1),
    (DefectKind::Crack, 0.1),
    (DefectKind::PatternShift, 0.3),
];

/// Current rate per defect category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefectTable {
    rates: Vec<DefectRate>,
}

impl Default for DefectTable {
    fn default() -> Self {
        Self {
            rates: INITIAL_RATES
                .iter()
                .map(|&(kind, rate)| DefectRate { kind, rate })
                .collect(),
        }
    }
}

impl DefectTable {
    pub fn rates(&self) -> &[DefectRate] {
        &self.rates
    }

    /// Nudge every rate by up to +/- `range / 2`, rounded to 0.1, never negative
    pub fn jitter<R: Rng>(&mut self, rng: &mut R, range: f64) {
        for d in &mut self.rates {
            let offset = (rng.random::<f64>() - 0.5) * range;
            d.rate = round1(d.rate + offset).max(0.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_severity_bands() {
        assert_eq!(Severity::from_rate(2.1), Severity::High);
        assert_eq!(Severity::from_rate(2.0), Severity::High);
        assert_eq!(Severity::from_rate(1.2), Severity::Medium);
        assert_eq!(Severity::from_rate(0.9), Severity::Low);
    }

    #[test]
    fn test_jitter_bounded_and_non_negative() {
        let mut table = DefectTable::default();
        let mut rng = Pcg32::seed_from_u64(7);
        let before = table.clone();

        table.jitter(&mut rng, 0.2);
        for (old, new) in before.rates().iter().zip(table.rates()) {
            // Half-range plus rounding slack
            assert!((new.rate - old.rate).abs() <= 0.1 + 0.05 + 1e-9);
        }

        for _ in 0..1000 {
            table.jitter(&mut rng, 0.2);
        }
        assert!(table.rates().iter().all(|d| d.rate >= 0.0));
    }

    #[test]
    fn test_jitter_deterministic_per_seed() {
        let mut a = DefectTable::default();
        let mut b = DefectTable::default();
        let mut rng_a = Pcg32::seed_from_u64(42);
        let mut rng_b = Pcg32::seed_from_u64(42);
        for _ in 0..20 {
            a.jitter(&mut rng_a, 0.2);
            b.jitter(&mut rng_b, 0.2);
        }
        assert_eq!(a, b);
    }
}
