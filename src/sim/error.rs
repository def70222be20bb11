//! Configuration errors raised at the setter boundary

/// A rejected parameter change. The simulation is left untouched.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// Logical period must be a positive, finite number of milliseconds.
    #[error("logical period must be positive, got {0} ms")]
    NonPositivePeriod(f64),

    /// A segment needs at least one logical tick.
    #[error("ticks per station must be at least 1")]
    ZeroTicksPerStation,

    /// Speed multiplier outside the configured range.
    #[error("speed multiplier {speed} outside allowed range [{min}, {max}]")]
    SpeedOutOfRange {
        /// Requested multiplier
        speed: f64,
        /// Lower bound (inclusive)
        min: f64,
        /// Upper bound (inclusive)
        max: f64,
    },

    /// Speed range bounds must satisfy 0 < min < base < max.
    #[error("speed range must satisfy 0 < min < base < max, got {min}/{base}/{max}")]
    InvalidSpeedRange {
        min: f64,
        base: f64,
        max: f64,
    },

    /// Probabilities live in [0, 1].
    #[error("probability must be within [0, 1], got {0}")]
    InvalidProbability(f64),

    /// Periodic intervals must be positive.
    #[error("interval must be positive, got {0} s")]
    NonPositiveInterval(f64),
}
