//! Factory simulation state
//!
//! `FactoryState` is the single owner of the clock, tiles, occupancy matrix,
//! counters and KPI board. Consumers read it (or a [`Snapshot`]) and change
//! it only through the intent methods.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::clock::{ClockTick, SimulationClock};
use super::error::ConfigError;
use super::occupancy::{OccupancyMatrix, OccupancyRow, live_occupancy};
use super::tile::{LifecycleState, TileTracker};
use crate::consts::*;
use crate::kpi::{self, DefectRate, DefectTable, KpiBoard, KpiConfig, KpiId, KpiInputs, Trend};
use crate::settings::Settings;

/// Conveyor drive status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConveyorStatus {
    Running,
    #[default]
    Stopped,
    /// Blocked line: no motion, no ticks
    Jammed,
}

impl ConveyorStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConveyorStatus::Running => "running",
            ConveyorStatus::Stopped => "stopped",
            ConveyorStatus::Jammed => "jammed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "running" => Some(ConveyorStatus::Running),
            "stopped" => Some(ConveyorStatus::Stopped),
            "jammed" => Some(ConveyorStatus::Jammed),
            _ => None,
        }
    }
}

/// What happened during one rendered frame
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameReport {
    /// Logical ticks fired this frame
    pub ticks: u32,
    /// Ids of tiles pressed this frame
    pub spawned: Vec<u64>,
    /// Tiles whose exit animation finished this frame
    pub removed: usize,
}

/// The whole simulated line
#[derive(Debug, Clone)]
pub struct FactoryState {
    clock: SimulationClock,
    status: ConveyorStatus,
    data_flowing: bool,
    tiles: TileTracker,
    matrix: OccupancyMatrix,
    waste_count: u64,
    shipment_count: u64,
    dropped_count: u64,
    /// Station lights, resampled every running frame
    highlights: [bool; STATION_COUNT],
    kpi_config: KpiConfig,
    kpis: KpiBoard,
    defects: DefectTable,
    defect_probability: f64,
    initial_speed: f64,
    seed: u64,
    rng: Pcg32,
    /// Bumped on every reset so consumers can drop cached visuals
    reset_version: u64,
}

impl FactoryState {
    /// Build a stopped, empty line from validated settings
    pub fn new(settings: &Settings) -> Result<Self, ConfigError> {
        settings.validate()?;

        let clock = SimulationClock::new(
            settings.logical_period_ms,
            settings.ticks_per_station,
            settings.speed_multiplier,
            settings.speed_range,
        )?;
        let kpis = KpiBoard::new(&settings.kpi, &settings.speed_range);

        Ok(Self {
            clock,
            status: ConveyorStatus::Stopped,
            data_flowing: false,
            tiles: TileTracker::new(),
            matrix: OccupancyMatrix::default(),
            waste_count: 0,
            shipment_count: 0,
            dropped_count: 0,
            highlights: [false; STATION_COUNT],
            kpi_config: settings.kpi.clone(),
            kpis,
            defects: DefectTable::default(),
            defect_probability: settings.defect_probability,
            initial_speed: settings.speed_multiplier,
            seed: settings.seed,
            rng: Pcg32::seed_from_u64(settings.seed),
            reset_version: 0,
        })
    }

    // === Intents ===

    /// Enable data flow and run the conveyor
    pub fn start(&mut self) {
        log::info!("Simulation started");
        self.data_flowing = true;
        self.status = ConveyorStatus::Running;
    }

    /// Disable data flow and clear the line: accumulator, tiles, counters
    /// and matrix. Speed, periods and KPI history are kept. Use
    /// `set_status(Stopped)` to pause with tiles in place.
    pub fn stop(&mut self) {
        log::info!("Simulation stopped");
        self.data_flowing = false;
        self.status = ConveyorStatus::Stopped;
        self.clear_line();
    }

    /// Start/stop toggle used by the play button
    pub fn toggle(&mut self) {
        if self.data_flowing {
            self.stop();
        } else {
            self.start();
        }
    }

    pub fn set_status(&mut self, status: ConveyorStatus) {
        if status != self.status {
            log::info!("Conveyor {} -> {}", self.status.as_str(), status.as_str());
        }
        self.status = status;
        self.data_flowing = status == ConveyorStatus::Running;
        if !self.is_running() {
            self.clock.idle();
        }
    }

    pub fn set_speed_multiplier(&mut self, speed: f64) -> Result<(), ConfigError> {
        self.clock.set_speed_multiplier(speed)
    }

    pub fn set_logical_period_ms(&mut self, period_ms: f64) -> Result<(), ConfigError> {
        self.clock.set_logical_period_ms(period_ms)
    }

    pub fn set_ticks_per_station(&mut self, ticks: u32) -> Result<(), ConfigError> {
        self.clock.set_ticks_per_station(ticks)
    }

    /// Clear tiles, counters, matrix and KPIs in one step and stop the line.
    /// This is the only place all subsystems are reset together.
    pub fn reset(&mut self) {
        log::info!("Factory reset");
        self.clear_line();
        // initial_speed was validated at construction
        let _ = self.clock.set_speed_multiplier(self.initial_speed);
        self.status = ConveyorStatus::Stopped;
        self.data_flowing = false;
        self.kpis = KpiBoard::new(&self.kpi_config, &self.clock.speed_range());
        self.defects = DefectTable::default();
        self.rng = Pcg32::seed_from_u64(self.seed);
    }

    /// Shared by stop and reset; tile ids restart, so the version bumps
    fn clear_line(&mut self) {
        self.clock.reset();
        self.tiles.clear();
        self.matrix.clear();
        self.waste_count = 0;
        self.shipment_count = 0;
        self.dropped_count = 0;
        self.highlights = [false; STATION_COUNT];
        self.reset_version += 1;
    }

    // === Frame loop ===

    /// Advance one rendered frame of `dt` wall-clock seconds.
    ///
    /// Order matters: tiles move first, then station lights are sampled,
    /// then the clock drains, so every logical tick sees this frame's
    /// positions.
    pub fn frame(&mut self, dt: f64) -> FrameReport {
        let mut report = FrameReport::default();

        if !self.is_running() {
            self.clock.idle();
            return report;
        }

        let dt = dt.max(0.0);
        let velocity = self.clock.effective_velocity();
        report.removed = self.tiles.advance(velocity, dt);

        self.highlights = live_occupancy(self.tiles.transit_positions(), LIGHT_TOLERANCE);

        self.clock.accumulate(dt);
        while let Some(tick) = self.clock.next_tick() {
            report.ticks += 1;
            if let Some(id) = self.logical_tick(tick) {
                report.spawned.push(id);
            }
        }

        report
    }

    /// One S_clk tick: classify, maybe press a tile, refresh KPIs.
    /// Returns the id of the tile pressed on this tick, if any.
    fn logical_tick(&mut self, tick: ClockTick) -> Option<u64> {
        let outcome = self.tiles.classify();
        self.waste_count += outcome.sorted;
        self.shipment_count += outcome.collected;
        self.dropped_count += outcome.dropped;

        if let Some(id) = tick.production {
            self.matrix
                .record(id, self.tiles.transit_positions(), SNAPSHOT_TOLERANCE);
            let is_defected = self.rng.random::<f64>() < self.defect_probability;
            self.tiles.spawn(id, is_defected);
            log::debug!(
                "P_clk {} (S_clk {}): pressed tile{}",
                id,
                tick.logical,
                if is_defected { " (defective)" } else { "" }
            );
        }

        let mut active = live_occupancy(self.tiles.transit_positions(), SNAPSHOT_TOLERANCE);
        // The press works whenever the line runs
        active[0] = self.is_running();
        let inputs = KpiInputs {
            speed: self.clock.speed_multiplier(),
            running: self.is_running(),
            active,
            shipment_count: self.shipment_count,
            waste_count: self.waste_count,
        };
        let values = kpi::compute(&self.kpi_config, &self.clock.speed_range(), &inputs);
        self.kpis.update(tick.logical, values);
        self.defects.jitter(&mut self.rng, DEFECT_RANDOMIZATION);

        tick.production
    }

    // === Read access ===

    pub fn is_running(&self) -> bool {
        self.data_flowing && self.status == ConveyorStatus::Running
    }

    pub fn status(&self) -> ConveyorStatus {
        self.status
    }

    pub fn data_flowing(&self) -> bool {
        self.data_flowing
    }

    pub fn clock(&self) -> &SimulationClock {
        &self.clock
    }

    pub fn tiles(&self) -> &TileTracker {
        &self.tiles
    }

    pub fn matrix(&self) -> &OccupancyMatrix {
        &self.matrix
    }

    pub fn highlights(&self) -> [bool; STATION_COUNT] {
        self.highlights
    }

    pub fn kpis(&self) -> &KpiBoard {
        &self.kpis
    }

    pub fn defects(&self) -> &DefectTable {
        &self.defects
    }

    pub fn waste_count(&self) -> u64 {
        self.waste_count
    }

    pub fn shipment_count(&self) -> u64 {
        self.shipment_count
    }

    pub fn dropped_count(&self) -> u64 {
        self.dropped_count
    }

    pub fn reset_version(&self) -> u64 {
        self.reset_version
    }

    /// Owned, serializable view for UI panels
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            status: self.status,
            data_flowing: self.data_flowing,
            logical_tick_count: self.clock.logical_tick_count(),
            production_tick_count: self.clock.production_tick_count(),
            speed_multiplier: self.clock.speed_multiplier(),
            effective_velocity: self.clock.effective_velocity(),
            waste_count: self.waste_count,
            shipment_count: self.shipment_count,
            tiles: self
                .tiles
                .tiles()
                .iter()
                .map(|t| TileView {
                    id: t.id,
                    progress: t.progress,
                    is_defected: t.is_defected,
                    state: t.state,
                    sort_progress: t.sort_progress,
                    collect_progress: t.collect_progress,
                })
                .collect(),
            occupancy: self.matrix.rows().to_vec(),
            highlights: self.highlights,
            kpis: KpiId::ALL
                .iter()
                .map(|&id| KpiView {
                    id,
                    value: crate::round1(self.kpis.values.get(id)),
                    unit: id.unit(),
                    trend: self.kpis.trend(id),
                })
                .collect(),
            defects: self.defects.rates().to_vec(),
            reset_version: self.reset_version,
        }
    }
}

/// Tile as seen by consumers
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TileView {
    pub id: u64,
    pub progress: f64,
    pub is_defected: bool,
    pub state: LifecycleState,
    pub sort_progress: f64,
    pub collect_progress: f64,
}

/// KPI as displayed (one decimal)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KpiView {
    pub id: KpiId,
    pub value: f64,
    pub unit: &'static str,
    pub trend: Option<Trend>,
}

/// Read-only copy of everything the UI shows
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub status: ConveyorStatus,
    pub data_flowing: bool,
    pub logical_tick_count: u64,
    pub production_tick_count: u64,
    pub speed_multiplier: f64,
    pub effective_velocity: f64,
    pub waste_count: u64,
    pub shipment_count: u64,
    pub tiles: Vec<TileView>,
    /// Most recent row first
    pub occupancy: Vec<OccupancyRow>,
    pub highlights: [bool; STATION_COUNT],
    pub kpis: Vec<KpiView>,
    pub defects: Vec<DefectRate>,
    pub reset_version: u64,
}
