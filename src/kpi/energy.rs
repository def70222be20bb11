//! Energy and emissions model
//!
//! Each station draws a base amount, bent by a piecewise-linear response to
//! conveyor speed and scaled down by an idle factor when no tile is present.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::consts::STATION_COUNT;
use crate::sim::SpeedRange;
use crate::stations::StationId;

/// Consumption curve for one station and one utility
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConsumptionParams {
    /// Draw at nominal speed while occupied
    pub base: f64,
    /// Relative change at (and below) minimum speed
    pub min_effect: f64,
    /// Relative change at (and above) maximum speed
    pub max_effect: f64,
    /// Fraction of draw kept while idle
    pub idle_factor: f64,
}

impl ConsumptionParams {
    pub const fn new(base: f64, min_effect: f64, max_effect: f64, idle_factor: f64) -> Self {
        Self {
            base,
            min_effect,
            max_effect,
            idle_factor,
        }
    }

    /// Speed response multiplier (1.0 at nominal speed)
    pub fn speed_multiplier(&self, speed: f64, range: &SpeedRange) -> f64 {
        if speed <= range.min {
            1.0 + self.min_effect
        } else if speed >= range.max {
            1.0 + self.max_effect
        } else if speed < range.base {
            let t = (speed - range.min) / (range.base - range.min);
            1.0 + self.min_effect * (1.0 - t)
        } else {
            let t = (speed - range.base) / (range.max - range.base);
            1.0 + self.max_effect * t
        }
    }

    /// Current draw for this station
    pub fn consumption(&self, speed: f64, range: &SpeedRange, occupied: bool, running: bool) -> f64 {
        if !running {
            return self.base * self.idle_factor;
        }

        let with_speed = self.base * self.speed_multiplier(speed, range);
        if occupied {
            with_speed
        } else {
            with_speed * self.idle_factor
        }
    }
}

/// Per-station consumption curves and emission factors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnergyProfile {
    /// Electricity (kWh)
    pub kwh: BTreeMap<StationId, ConsumptionParams>,
    /// Natural gas (m³)
    pub gas: BTreeMap<StationId, ConsumptionParams>,
    /// kg CO₂ per kWh
    pub co2_per_kwh: f64,
    /// kg CO₂ per m³ gas
    pub co2_per_gas: f64,
}

impl Default for EnergyProfile {
    fn default() -> Self {
        use StationId::*;
        let p = ConsumptionParams::new;

        Self {
            kwh: BTreeMap::from([
                (Press, p(10.0, -0.2, 0.3, 0.15)),
                (Drying, p(20.0, 0.0, 0.0, 0.15)),
                (Glaze, p(8.0, -0.1, 0.15, 0.15)),
                (Print, p(20.0, -0.3, 0.3, 0.15)),
                (Kiln, p(100.0, 0.0, 0.0, 0.8)),
                (Sorting, p(10.0, -0.5, 0.5, 0.15)),
                (Packaging, p(10.0, -0.5, 0.5, 0.15)),
            ]),
            gas: BTreeMap::from([
                (Drying, p(30.0, 0.0, 0.0, 0.15)),
                (Kiln, p(100.0, 0.0, 0.0, 0.8)),
            ]),
            co2_per_kwh: 0.4,
            co2_per_gas: 1.9,
        }
    }
}

/// Instantaneous totals across the line
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EnergyReading {
    pub total_kwh: f64,
    pub total_gas: f64,
    pub total_co2: f64,
}

impl EnergyProfile {
    /// Sum consumption over all stations. `active[i]` is whether station i
    /// is currently working a tile.
    pub fn reading(
        &self,
        speed: f64,
        range: &SpeedRange,
        active: &[bool; STATION_COUNT],
        running: bool,
    ) -> EnergyReading {
        let total = |table: &BTreeMap<StationId, ConsumptionParams>| -> f64 {
            table
                .iter()
                .map(|(id, params)| params.consumption(speed, range, active[id.index()], running))
                .sum()
        };

        let total_kwh = total(&self.kwh);
        let total_gas = total(&self.gas);
        let total_co2 = total_kwh * self.co2_per_kwh + total_gas * self.co2_per_gas;

        EnergyReading {
            total_kwh,
            total_gas,
            total_co2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_speed_curve_piecewise() {
        let range = SpeedRange::default();
        let p = ConsumptionParams::new(10.0, -0.2, 0.3, 0.15);

        assert!(close(p.speed_multiplier(0.1, &range), 0.8));
        assert!(close(p.speed_multiplier(0.3, &range), 0.8));
        assert!(close(p.speed_multiplier(1.0, &range), 1.0));
        assert!(close(p.speed_multiplier(1.5, &range), 1.15));
        assert!(close(p.speed_multiplier(2.0, &range), 1.3));
        assert!(close(p.speed_multiplier(3.0, &range), 1.3));
        // Halfway between min and base
        assert!(close(p.speed_multiplier(0.65, &range), 0.9));
    }

    #[test]
    fn test_idle_and_stopped_draw() {
        let range = SpeedRange::default();
        let p = ConsumptionParams::new(10.0, -0.2, 0.3, 0.15);

        assert!(close(p.consumption(2.0, &range, true, true), 13.0));
        assert!(close(p.consumption(2.0, &range, false, true), 13.0 * 0.15));
        // Stopped ignores speed entirely
        assert!(close(p.consumption(2.0, &range, true, false), 1.5));
    }

    #[test]
    fn test_stopped_line_totals() {
        let profile = EnergyProfile::default();
        let r = profile.reading(1.0, &SpeedRange::default(), &[false; STATION_COUNT], false);
        assert!(close(r.total_kwh, 91.7));
        assert!(close(r.total_gas, 84.5));
        assert!(close(r.total_co2, 91.7 * 0.4 + 84.5 * 1.9));
    }

    #[test]
    fn test_fully_loaded_line_at_nominal_speed() {
        let profile = EnergyProfile::default();
        let r = profile.reading(1.0, &SpeedRange::default(), &[true; STATION_COUNT], true);
        assert!(close(r.total_kwh, 178.0));
        assert!(close(r.total_gas, 130.0));
    }

    #[test]
    fn test_profile_json_keys() {
        let json = serde_json::to_string(&EnergyProfile::default()).unwrap();
        assert!(json.contains("\"kiln\""));
        let back: EnergyProfile = serde_json::from_str(&json).unwrap();
        assert_eq!(back, EnergyProfile::default());
    }
}
