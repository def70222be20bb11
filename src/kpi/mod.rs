//! KPI and energy calculators
//!
//! Everything here is a pure function of the line's counters, speed and
//! live occupancy. The simulation recomputes it once per logical tick.

pub mod defects;
pub mod energy;
pub mod quality;
pub mod trend;

use serde::{Deserialize, Serialize};

pub use defects::{DefectKind, DefectRate, DefectTable, Severity};
pub use energy::{ConsumptionParams, EnergyProfile, EnergyReading};
pub use trend::{KpiId, KpiValues, Trend, TrendHistory};

use crate::consts::STATION_COUNT;
use crate::sim::SpeedRange;

/// Tunable inputs of the KPI model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KpiConfig {
    pub energy: EnergyProfile,
    /// Simulated uptime fraction
    pub availability_factor: f64,
    /// Speed at which performance reaches 100%
    pub design_speed: f64,
}

impl Default for KpiConfig {
    fn default() -> Self {
        Self {
            energy: EnergyProfile::default(),
            availability_factor: 0.96,
            design_speed: 2.0,
        }
    }
}

/// Line state sampled for one KPI update
#[derive(Debug, Clone, Copy)]
pub struct KpiInputs {
    pub speed: f64,
    pub running: bool,
    /// Station i currently working a tile
    pub active: [bool; STATION_COUNT],
    pub shipment_count: u64,
    pub waste_count: u64,
}

/// Compute every KPI from the current line state
pub fn compute(config: &KpiConfig, range: &SpeedRange, inputs: &KpiInputs) -> KpiValues {
    let energy = config
        .energy
        .reading(inputs.speed, range, &inputs.active, inputs.running);
    let ftq = quality::ftq(inputs.shipment_count, inputs.waste_count);
    let scrap = quality::scrap(inputs.shipment_count, inputs.waste_count);
    let oee = quality::oee(inputs.speed, config.design_speed, config.availability_factor, ftq);

    KpiValues {
        oee,
        ftq,
        scrap,
        energy: energy.total_kwh,
        gas: energy.total_gas,
        co2: energy.total_co2,
    }
}

/// Published KPI values, their trends and the rolling history behind them
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KpiBoard {
    pub values: KpiValues,
    /// Indexed like [`KpiId::ALL`]; `None` until enough history exists
    pub trends: [Option<Trend>; 6],
    history: TrendHistory,
}

impl KpiBoard {
    /// Board for an idle, empty line
    pub fn new(config: &KpiConfig, range: &SpeedRange) -> Self {
        let idle = KpiInputs {
            speed: range.base,
            running: false,
            active: [false; STATION_COUNT],
            shipment_count: 0,
            waste_count: 0,
        };
        let mut values = compute(config, range, &idle);
        // Nothing produced yet
        values.oee = 0.0;

        Self {
            values,
            trends: [None; 6],
            history: TrendHistory::default(),
        }
    }

    /// Publish a new set of values for logical tick `tick`
    pub fn update(&mut self, tick: u64, values: KpiValues) {
        self.values = values;
        if let Some(trends) = self.history.record(tick, values) {
            self.trends = trends.map(Some);
        }
    }

    pub fn trend(&self, id: KpiId) -> Option<Trend> {
        KpiId::ALL
            .iter()
            .position(|k| *k == id)
            .and_then(|i| self.trends[i])
    }
}
