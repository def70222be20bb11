//! KPI trend tracking
//!
//! Keeps a short rolling history keyed by S_clk and compares the current
//! values against the oldest entry still inside the window.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::consts::{KPI_TREND_MIN_TICKS, KPI_TREND_WINDOW};

/// Tracked KPIs
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KpiId {
    Oee,
    Ftq,
    Scrap,
    Energy,
    Gas,
    Co2,
}

impl KpiId {
    pub const ALL: [KpiId; 6] = [
        KpiId::Oee,
        KpiId::Ftq,
        KpiId::Scrap,
        KpiId::Energy,
        KpiId::Gas,
        KpiId::Co2,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            KpiId::Oee => "oee",
            KpiId::Ftq => "ftq",
            KpiId::Scrap => "scrap",
            KpiId::Energy => "energy",
            KpiId::Gas => "gas",
            KpiId::Co2 => "co2",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            KpiId::Oee | KpiId::Ftq | KpiId::Scrap => "%",
            KpiId::Energy => "kWh",
            KpiId::Gas => "m³",
            KpiId::Co2 => "kg",
        }
    }

    /// Scrap and consumption KPIs improve when they fall
    pub fn lower_is_better(&self) -> bool {
        matches!(self, KpiId::Scrap | KpiId::Energy | KpiId::Gas | KpiId::Co2)
    }
}

/// One value per KPI
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct KpiValues {
    pub oee: f64,
    pub ftq: f64,
    pub scrap: f64,
    pub energy: f64,
    pub gas: f64,
    pub co2: f64,
}

impl KpiValues {
    pub fn get(&self, id: KpiId) -> f64 {
        match id {
            KpiId::Oee => self.oee,
            KpiId::Ftq => self.ftq,
            KpiId::Scrap => self.scrap,
            KpiId::Energy => self.energy,
            KpiId::Gas => self.gas,
            KpiId::Co2 => self.co2,
        }
    }
}

/// Change of one KPI over the trend window
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Trend {
    /// current - previous
    pub change: f64,
    /// Whether the change is good news for this KPI
    pub favorable: bool,
}

impl Trend {
    pub fn new(id: KpiId, current: f64, previous: f64) -> Self {
        let change = current - previous;
        let rising = change >= 0.0;
        Self {
            change,
            favorable: rising != id.lower_is_better(),
        }
    }

    pub fn rising(&self) -> bool {
        self.change >= 0.0
    }

    /// Display form, e.g. "↑ 2.1%"
    pub fn label(&self) -> String {
        let arrow = if self.rising() { '↑' } else { '↓' };
        format!("{} {:.1}%", arrow, self.change.abs())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct HistoryRecord {
    tick: u64,
    values: KpiValues,
}

/// Rolling KPI history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendHistory {
    records: VecDeque<HistoryRecord>,
    window: u64,
    min_ticks: u64,
}

impl Default for TrendHistory {
    fn default() -> Self {
        Self::new(KPI_TREND_WINDOW, KPI_TREND_MIN_TICKS)
    }
}

impl TrendHistory {
    pub fn new(window: u64, min_ticks: u64) -> Self {
        Self {
            records: VecDeque::new(),
            window,
            min_ticks,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Append the current values and evict stale entries. Returns trends
    /// once the oldest retained entry is old enough to compare against.
    pub fn record(&mut self, tick: u64, values: KpiValues) -> Option<[Trend; 6]> {
        self.records.push_back(HistoryRecord { tick, values });
        while self
            .records
            .front()
            .is_some_and(|r| tick.saturating_sub(r.tick) > self.window)
        {
            self.records.pop_front();
        }

        let oldest = self.records.front()?;
        if tick.saturating_sub(oldest.tick) < self.min_ticks {
            return None;
        }

        Some(KpiId::ALL.map(|id| Trend::new(id, values.get(id), oldest.values.get(id))))
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(x: f64) -> KpiValues {
        KpiValues {
            oee: x,
            ftq: x,
            scrap: x,
            energy: x,
            gas: x,
            co2: x,
        }
    }

    #[test]
    fn test_direction_inverted_for_lower_is_better() {
        let up = Trend::new(KpiId::Oee, 90.0, 85.0);
        assert!(up.rising() && up.favorable);

        let scrap_up = Trend::new(KpiId::Scrap, 4.0, 3.0);
        assert!(scrap_up.rising() && !scrap_up.favorable);

        let energy_down = Trend::new(KpiId::Energy, 80.0, 91.7);
        assert!(!energy_down.rising() && energy_down.favorable);
    }

    #[test]
    fn test_no_trend_before_min_ticks() {
        let mut h = TrendHistory::default();
        for tick in 1..=5 {
            assert!(h.record(tick, values(tick as f64)).is_none());
        }
        // Oldest (tick 1) is now 5 ticks old
        let trends = h.record(6, values(6.0)).unwrap();
        assert!((trends[0].change - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_window_evicts_old_entries() {
        let mut h = TrendHistory::new(30, 5);
        for tick in 1..=100 {
            h.record(tick, values(tick as f64));
            assert!(h.len() <= 31);
        }
        // Oldest retained is tick 71
        let trends = h.record(101, values(101.0)).unwrap();
        assert!((trends[1].change - 30.0).abs() < 1e-12);
    }

    #[test]
    fn test_label() {
        assert_eq!(Trend::new(KpiId::Ftq, 92.7, 94.0).label(), "↓ 1.3%");
        assert_eq!(Trend::new(KpiId::Ftq, 94.0, 94.0).label(), "↑ 0.0%");
    }
}
