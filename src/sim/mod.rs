//! Deterministic simulation module
//!
//! The factory's source of truth. This module must stay deterministic:
//! - Logical ticks only fire from accumulated, speed-scaled time
//! - Seeded RNG only
//! - Stable iteration order (tiles sorted by id)
//! - No rendering or platform dependencies

pub mod clock;
pub mod error;
pub mod occupancy;
pub mod state;
pub mod tile;
pub mod velocity;

pub use clock::{ClockTick, SimulationClock, SpeedRange};
pub use error::ConfigError;
pub use occupancy::{OccupancyMatrix, OccupancyRow, TileLabel, live_occupancy, tile_at_station};
pub use state::{ConveyorStatus, FactoryState, FrameReport, KpiView, Snapshot, TileView};
pub use tile::{ClassifyOutcome, ClassifyThresholds, LifecycleState, Tile, TileTracker, Transition};
pub use velocity::{base_velocity, effective_velocity};
