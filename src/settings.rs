//! Simulation settings
//!
//! Everything tunable about the line: clock, speed limits, defect odds,
//! telemetry cadence and the KPI/energy model. Stored as JSON.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::kpi::KpiConfig;
use crate::sim::{ConfigError, SpeedRange};

/// Failure to load or save settings
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("failed to access settings file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse settings: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid settings: {0}")]
    Invalid(#[from] ConfigError),
}

/// Line configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Clock ===
    /// Wall-clock ms per logical tick at 1.0x
    pub logical_period_ms: f64,
    /// Logical ticks per station segment (P_clk divider)
    pub ticks_per_station: u32,
    /// Initial speed multiplier (restored on reset)
    pub speed_multiplier: f64,
    /// Allowed speed multiplier range
    pub speed_range: SpeedRange,

    // === Production ===
    /// Chance a pressed tile is defective
    pub defect_probability: f64,
    /// RNG seed for defect sampling
    pub seed: u64,

    // === Telemetry ===
    /// Seconds between telemetry pushes
    pub telemetry_interval_secs: f64,

    // === KPI model ===
    pub kpi: KpiConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            logical_period_ms: DEFAULT_LOGICAL_PERIOD_MS,
            ticks_per_station: DEFAULT_TICKS_PER_STATION,
            speed_multiplier: DEFAULT_SPEED_MULTIPLIER,
            speed_range: SpeedRange::default(),

            defect_probability: DEFECT_PROBABILITY,
            seed: 0x5EED,

            telemetry_interval_secs: TELEMETRY_INTERVAL_SECS,

            kpi: KpiConfig::default(),
        }
    }
}

impl Settings {
    /// Check every field; the first problem found is returned
    pub fn validate(&self) -> Result<(), ConfigError> {
        crate::sim::base_velocity(self.logical_period_ms, self.ticks_per_station)?;
        self.speed_range.validate()?;
        self.speed_range.check(self.speed_multiplier)?;

        if !(0.0..=1.0).contains(&self.defect_probability) {
            return Err(ConfigError::InvalidProbability(self.defect_probability));
        }
        if self.telemetry_interval_secs <= 0.0 || !self.telemetry_interval_secs.is_finite() {
            return Err(ConfigError::NonPositiveInterval(self.telemetry_interval_secs));
        }
        Ok(())
    }

    /// Parse and validate settings from JSON. Missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let settings = Self::from_json(&json)?;
        log::info!("Loaded settings from {}", path.as_ref().display());
        Ok(settings)
    }

    /// Write settings as pretty JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SettingsError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), json)?;
        log::info!("Settings saved to {}", path.as_ref().display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_valid() {
        assert!(Settings::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let s = Settings::from_json(r#"{ "logical_period_ms": 250, "seed": 9 }"#).unwrap();
        assert_eq!(s.logical_period_ms, 250.0);
        assert_eq!(s.seed, 9);
        assert_eq!(s.ticks_per_station, DEFAULT_TICKS_PER_STATION);
        assert_eq!(s.kpi, KpiConfig::default());
    }

    #[test]
    fn test_rejects_invalid_values() {
        assert!(matches!(
            Settings::from_json(r#"{ "ticks_per_station": 0 }"#),
            Err(SettingsError::Invalid(ConfigError::ZeroTicksPerStation))
        ));
        assert!(matches!(
            Settings::from_json(r#"{ "speed_multiplier": 3.5 }"#),
            Err(SettingsError::Invalid(ConfigError::SpeedOutOfRange { .. }))
        ));
        assert!(matches!(
            Settings::from_json(r#"{ "defect_probability": 1.5 }"#),
            Err(SettingsError::Invalid(ConfigError::InvalidProbability(_)))
        ));
        assert!(matches!(
            Settings::from_json(r#"{ "telemetry_interval_secs": 0 }"#),
            Err(SettingsError::Invalid(ConfigError::NonPositiveInterval(_)))
        ));
        assert!(matches!(
            Settings::from_json("not json"),
            Err(SettingsError::Parse(_))
        ));
    }

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir().join(format!("factory-twin-settings-{}.json", std::process::id()));
        let mut settings = Settings::default();
        settings.ticks_per_station = 7;
        settings.save(&path).unwrap();

        let loaded = Settings::load(&path).unwrap();
        assert_eq!(loaded, settings);
        let _ = std::fs::remove_file(&path);
    }
}
