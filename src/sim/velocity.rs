//! Velocity model
//!
//! Single source of truth for conveyor motion speed. The render consumer
//! (slats, tiles) and any "effective speed" display call into here.

use super::error::ConfigError;
use crate::consts::STATION_SPACING;

/// Progress units per second at 1.0x speed
pub fn base_velocity(logical_period_ms: f64, ticks_per_station: u32) -> Result<f64, ConfigError> {
    if logical_period_ms <= 0.0 || !logical_period_ms.is_finite() {
        return Err(ConfigError::NonPositivePeriod(logical_period_ms));
    }
    if ticks_per_station == 0 {
        return Err(ConfigError::ZeroTicksPerStation);
    }

    let seconds_per_station = (logical_period_ms * ticks_per_station as f64) / 1000.0;
    Ok(STATION_SPACING / seconds_per_station)
}

/// Base velocity scaled by the speed multiplier
pub fn effective_velocity(
    logical_period_ms: f64,
    ticks_per_station: u32,
    speed_multiplier: f64,
) -> Result<f64, ConfigError> {
    Ok(base_velocity(logical_period_ms, ticks_per_station)? * speed_multiplier)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_velocity() {
        // 500ms * 4 ticks = 2s per station, 0.0625 / 2 = 0.03125
        let v = base_velocity(500.0, 4).unwrap();
        assert!((v - 0.03125).abs() < 1e-12);
    }

    #[test]
    fn test_one_station_per_production_tick() {
        // A tile covers exactly one station spacing per P_clk period
        for (period, ticks) in [(100.0, 1), (500.0, 4), (2000.0, 20), (750.0, 3)] {
            let v = base_velocity(period, ticks).unwrap();
            let p_clk_secs = period * ticks as f64 / 1000.0;
            assert!((v * p_clk_secs - STATION_SPACING).abs() < 1e-12);
        }
    }

    #[test]
    fn test_effective_scales_linearly() {
        let base = base_velocity(500.0, 4).unwrap();
        let fast = effective_velocity(500.0, 4, 2.0).unwrap();
        assert!((fast - base * 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_rejects_non_positive_inputs() {
        assert_eq!(base_velocity(0.0, 4), Err(ConfigError::NonPositivePeriod(0.0)));
        assert_eq!(base_velocity(-5.0, 4), Err(ConfigError::NonPositivePeriod(-5.0)));
        assert!(base_velocity(f64::NAN, 4).is_err());
        assert!(base_velocity(f64::INFINITY, 4).is_err());
        assert_eq!(base_velocity(500.0, 0), Err(ConfigError::ZeroTicksPerStation));
    }
}
