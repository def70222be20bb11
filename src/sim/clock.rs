//! System timer
//!
//! Converts wall-clock frame deltas into fixed-period logical ticks (S_clk)
//! and derives the production clock (P_clk) by frequency division.
//!
//! The accumulator is drained completely every frame: a slow frame or a
//! high speed multiplier produces several ticks in one pass, never fewer.

use serde::{Deserialize, Serialize};

use super::error::ConfigError;
use super::velocity;

/// Absorbs float rounding from summing many frame deltas, so a run that
/// lands exactly on a tick boundary still fires that tick.
const TICK_EPSILON_MS: f64 = 1e-6;

/// Allowed speed multiplier range and the nominal speed in between
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpeedRange {
    pub min: f64,
    pub base: f64,
    pub max: f64,
}

impl Default for SpeedRange {
    fn default() -> Self {
        Self {
            min: 0.3,
            base: 1.0,
            max: 2.0,
        }
    }
}

impl SpeedRange {
    /// Bounds are ordered and positive
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min > 0.0 && self.min < self.base && self.base < self.max && self.max.is_finite() {
            Ok(())
        } else {
            Err(ConfigError::InvalidSpeedRange {
                min: self.min,
                base: self.base,
                max: self.max,
            })
        }
    }

    pub fn check(&self, speed: f64) -> Result<(), ConfigError> {
        if speed.is_finite() && speed >= self.min && speed <= self.max {
            Ok(())
        } else {
            Err(ConfigError::SpeedOutOfRange {
                speed,
                min: self.min,
                max: self.max,
            })
        }
    }
}

/// One logical tick consumed from the accumulator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockTick {
    /// S_clk count after this tick
    pub logical: u64,
    /// P_clk count after this tick, if the production clock fired
    pub production: Option<u64>,
}

/// Logical clock state (S_clk / P_clk)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationClock {
    logical_period_ms: f64,
    ticks_per_station: u32,
    speed_multiplier: f64,
    speed_range: SpeedRange,
    accumulated_ms: f64,
    logical_tick_count: u64,
    production_tick_count: u64,
}

impl SimulationClock {
    /// Create a clock at tick 0 with an empty accumulator
    pub fn new(
        logical_period_ms: f64,
        ticks_per_station: u32,
        speed_multiplier: f64,
        speed_range: SpeedRange,
    ) -> Result<Self, ConfigError> {
        // Validates period and ticks together
        velocity::base_velocity(logical_period_ms, ticks_per_station)?;
        speed_range.validate()?;
        speed_range.check(speed_multiplier)?;

        Ok(Self {
            logical_period_ms,
            ticks_per_station,
            speed_multiplier,
            speed_range,
            accumulated_ms: 0.0,
            logical_tick_count: 0,
            production_tick_count: 0,
        })
    }

    pub fn logical_period_ms(&self) -> f64 {
        self.logical_period_ms
    }

    pub fn ticks_per_station(&self) -> u32 {
        self.ticks_per_station
    }

    pub fn speed_multiplier(&self) -> f64 {
        self.speed_multiplier
    }

    pub fn speed_range(&self) -> SpeedRange {
        self.speed_range
    }

    pub fn accumulated_ms(&self) -> f64 {
        self.accumulated_ms
    }

    pub fn logical_tick_count(&self) -> u64 {
        self.logical_tick_count
    }

    pub fn production_tick_count(&self) -> u64 {
        self.production_tick_count
    }

    /// Progress units per second, speed multiplier applied
    pub fn effective_velocity(&self) -> f64 {
        // Parameters are validated on every write, so this cannot fail
        velocity::effective_velocity(
            self.logical_period_ms,
            self.ticks_per_station,
            self.speed_multiplier,
        )
        .unwrap_or(0.0)
    }

    pub fn set_logical_period_ms(&mut self, period_ms: f64) -> Result<(), ConfigError> {
        velocity::base_velocity(period_ms, self.ticks_per_station)?;
        self.logical_period_ms = period_ms;
        Ok(())
    }

    pub fn set_ticks_per_station(&mut self, ticks: u32) -> Result<(), ConfigError> {
        velocity::base_velocity(self.logical_period_ms, ticks)?;
        self.ticks_per_station = ticks;
        Ok(())
    }

    pub fn set_speed_multiplier(&mut self, speed: f64) -> Result<(), ConfigError> {
        self.speed_range.check(speed)?;
        self.speed_multiplier = speed;
        Ok(())
    }

    /// Add a running frame's wall-clock time, scaled by the speed multiplier
    pub fn accumulate(&mut self, delta_seconds: f64) {
        // NaN and negative deltas contribute nothing
        let delta_seconds = delta_seconds.max(0.0);
        self.accumulated_ms += delta_seconds * 1000.0 * self.speed_multiplier;
    }

    /// Consume one logical period from the accumulator, if available.
    ///
    /// Call in a loop until it returns `None` to drain the frame.
    pub fn next_tick(&mut self) -> Option<ClockTick> {
        if self.accumulated_ms + TICK_EPSILON_MS < self.logical_period_ms {
            return None;
        }

        self.accumulated_ms = (self.accumulated_ms - self.logical_period_ms).max(0.0);
        self.logical_tick_count += 1;

        let production = if self.logical_tick_count % self.ticks_per_station as u64 == 0 {
            self.production_tick_count += 1;
            Some(self.production_tick_count)
        } else {
            None
        };

        Some(ClockTick {
            logical: self.logical_tick_count,
            production,
        })
    }

    /// Discard partial progress toward the next tick (paused/stopped/jammed)
    pub fn idle(&mut self) {
        self.accumulated_ms = 0.0;
    }

    /// Back to tick 0, keeping the configured parameters
    pub fn reset(&mut self) {
        self.accumulated_ms = 0.0;
        self.logical_tick_count = 0;
        self.production_tick_count = 0;
    }
}
