//! Factory Twin - A tile production line digital twin
//!
//! Core modules:
//! - `sim`: Deterministic simulation (clock, tile lifecycle, occupancy)
//! - `kpi`: Pure energy/quality calculators and trend tracking
//! - `renderer`: Headless render consumer (conveyor path, poses, highlights)
//! - `telemetry`: Best-effort periodic metric export
//! - `platform`: Frame timing, logger setup, browser binding
//! - `settings`: Data-driven configuration

pub mod kpi;
pub mod platform;
pub mod renderer;
pub mod settings;
pub mod sim;
pub mod stations;
pub mod telemetry;

pub use settings::Settings;
pub use sim::{ConveyorStatus, FactoryState, Snapshot};

/// Line layout and timing constants
pub mod consts {
    /// Number of stations on the line (press .. packaging)
    pub const STATION_COUNT: usize = 7;
    /// Progress units between adjacent stations
    pub const STATION_SPACING: f64 = 0.0625;

    /// Default logical clock period (ms per S_clk tick at 1.0x)
    pub const DEFAULT_LOGICAL_PERIOD_MS: f64 = 500.0;
    /// Default S_clk ticks per station segment
    pub const DEFAULT_TICKS_PER_STATION: u32 = 4;
    /// Default speed multiplier
    pub const DEFAULT_SPEED_MULTIPLIER: f64 = 1.0;
    /// Chance a freshly pressed tile is defective
    pub const DEFECT_PROBABILITY: f64 = 0.05;

    /// Station light activation (resampled every frame)
    pub const LIGHT_TOLERANCE: f64 = 0.018;
    /// Matrix snapshot (wider to catch the tile between tick samples)
    pub const SNAPSHOT_TOLERANCE: f64 = 0.032;

    /// Tile spawn point (press station)
    pub const SPAWN_T: f64 = STATION_SPACING;
    /// Just past sorting
    pub const SORT_THRESHOLD: f64 = 6.0 * STATION_SPACING + 0.01;
    /// Just past packaging
    pub const COLLECT_THRESHOLD: f64 = 7.0 * STATION_SPACING + 0.0325;
    /// Belt travel stops here; unclassified tiles are removed
    pub const END_OF_LINE_T: f64 = 0.5;

    /// Occupancy matrix history depth
    pub const MATRIX_ROWS: usize = 9;
    /// Occupancy matrix width (one slot per station)
    pub const MATRIX_COLS: usize = STATION_COUNT;

    /// Sort throw speed (multiplier on effective velocity)
    pub const SORT_ANIMATION_SPEED: f64 = 10.0;
    /// Collect drop speed (multiplier on effective velocity)
    pub const COLLECT_ANIMATION_SPEED: f64 = 12.0;
    /// Spawn grow-in rate (scale units per second)
    pub const TILE_SCALE_SPEED: f64 = 2.0;

    /// KPI trend history window (ticks)
    pub const KPI_TREND_WINDOW: u64 = 30;
    /// Minimum history age before trends are published (ticks)
    pub const KPI_TREND_MIN_TICKS: u64 = 5;
    /// +/- range for defect rate jitter
    pub const DEFECT_RANDOMIZATION: f64 = 0.2;

    /// Telemetry push cadence (wall-clock seconds)
    pub const TELEMETRY_INTERVAL_SECS: f64 = 5.0;
    /// Entity id used for factory-wide KPIs
    pub const TELEMETRY_FACTORY_ID: &str = "factory";
}

/// Canonical progress value of station `index` (0 = press)
#[inline]
pub fn station_stage(index: usize) -> f64 {
    (index as f64 + 1.0) * consts::STATION_SPACING
}

/// Round to one decimal place (display precision for KPIs and defect rates)
#[inline]
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
