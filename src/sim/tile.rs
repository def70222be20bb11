//! Tile lifecycle
//!
//! Spatial motion is continuous (advanced every frame), while classification
//! into waste/shipment is quantized to logical ticks.

use serde::{Deserialize, Serialize};

use crate::consts::*;

/// Where a tile is in its life
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LifecycleState {
    /// Riding the conveyor
    Transit,
    /// Defective, thrown to the waste bin
    Sorted,
    /// Good, dropped into the shipment box
    Collected,
}

/// Outcome of classifying one tile on a logical tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    None,
    Sorted,
    Collected,
    /// Passed end of line unclassified
    Dropped,
}

/// Belt positions at which tiles leave the line
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassifyThresholds {
    /// Defective tiles are sorted to waste here
    pub sort: f64,
    /// Good tiles are collected for shipment here
    pub collect: f64,
}

impl Default for ClassifyThresholds {
    fn default() -> Self {
        Self {
            sort: SORT_THRESHOLD,
            collect: COLLECT_THRESHOLD,
        }
    }
}

/// One unit of product
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tile {
    /// P_clk value at creation
    pub id: u64,
    /// Continuous position along the loop
    pub progress: f64,
    pub is_defected: bool,
    pub state: LifecycleState,
    pub sort_progress: f64,
    pub collect_progress: f64,
    /// Progress at which the tile left the belt (animation origin)
    pub origin: f64,
    /// Spawn grow-in (cosmetic)
    pub scale: f64,
}

impl Tile {
    pub fn new(id: u64, is_defected: bool) -> Self {
        Self {
            id,
            progress: SPAWN_T,
            is_defected,
            state: LifecycleState::Transit,
            sort_progress: 0.0,
            collect_progress: 0.0,
            origin: SPAWN_T,
            scale: 0.0,
        }
    }

    /// Per-frame motion. Returns true once the exit animation completes.
    /// Belt travel stops at the end of line until the next tick classifies
    /// the tile.
    pub fn advance(&mut self, velocity: f64, dt: f64) -> bool {
        match self.state {
            LifecycleState::Transit => {
                self.progress = (self.progress + velocity * dt).min(END_OF_LINE_T);
                self.scale = (self.scale + dt * TILE_SCALE_SPEED).min(1.0);
                false
            }
            LifecycleState::Sorted => {
                self.sort_progress =
                    (self.sort_progress + dt * velocity * SORT_ANIMATION_SPEED).min(1.0);
                self.sort_progress >= 1.0
            }
            LifecycleState::Collected => {
                self.collect_progress =
                    (self.collect_progress + dt * velocity * COLLECT_ANIMATION_SPEED).min(1.0);
                self.collect_progress >= 1.0
            }
        }
    }

    /// Per-tick threshold check at the standard sorter and collector
    pub fn classify(&mut self) -> Transition {
        self.classify_with(&ClassifyThresholds::default())
    }

    /// Per-tick threshold check. A tile that reaches the end of line without
    /// passing either threshold is reported as `Dropped`; with the standard
    /// thresholds both sit before the end, so that only happens for a
    /// misordered line.
    pub fn classify_with(&mut self, thresholds: &ClassifyThresholds) -> Transition {
        if self.state != LifecycleState::Transit {
            return Transition::None;
        }

        if self.is_defected && self.progress >= thresholds.sort {
            self.state = LifecycleState::Sorted;
            self.origin = self.progress;
            return Transition::Sorted;
        }

        if !self.is_defected && self.progress >= thresholds.collect {
            self.state = LifecycleState::Collected;
            // Drop from the belt end, not past it
            self.origin = self.progress.min(0.49);
            return Transition::Collected;
        }

        if self.progress >= END_OF_LINE_T {
            return Transition::Dropped;
        }

        Transition::None
    }

    pub fn in_transit(&self) -> bool {
        self.state == LifecycleState::Transit
    }
}

/// Counts produced by one classification pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClassifyOutcome {
    pub sorted: u64,
    pub collected: u64,
    pub dropped: u64,
}

/// Exclusive owner of all live tiles (sorted by id)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TileTracker {
    tiles: Vec<Tile>,
    #[serde(default)]
    thresholds: ClassifyThresholds,
}

impl TileTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_thresholds(thresholds: ClassifyThresholds) -> Self {
        Self {
            tiles: Vec::new(),
            thresholds,
        }
    }

    pub fn thresholds(&self) -> ClassifyThresholds {
        self.thresholds
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn get(&self, id: u64) -> Option<&Tile> {
        self.tiles
            .binary_search_by_key(&id, |t| t.id)
            .ok()
            .map(|i| &self.tiles[i])
    }

    /// Add a tile at the spawn point. Ids arrive in increasing order.
    pub fn spawn(&mut self, id: u64, is_defected: bool) {
        debug_assert!(self.tiles.last().is_none_or(|t| t.id < id));
        self.tiles.push(Tile::new(id, is_defected));
    }

    /// Advance every tile for one frame, removing finished exit animations.
    /// Returns the number of tiles removed.
    pub fn advance(&mut self, velocity: f64, dt: f64) -> usize {
        let before = self.tiles.len();
        self.tiles.retain_mut(|t| !t.advance(velocity, dt));
        before - self.tiles.len()
    }

    /// Apply threshold transitions to every live tile
    pub fn classify(&mut self) -> ClassifyOutcome {
        let mut outcome = ClassifyOutcome::default();
        let thresholds = self.thresholds;
        self.tiles.retain_mut(|tile| match tile.classify_with(&thresholds) {
            Transition::None => true,
            Transition::Sorted => {
                outcome.sorted += 1;
                true
            }
            Transition::Collected => {
                outcome.collected += 1;
                true
            }
            Transition::Dropped => {
                log::warn!("Tile #{} reached end of line unclassified", tile.id);
                outcome.dropped += 1;
                false
            }
        });
        outcome
    }

    /// (id, progress) of tiles still on the belt
    pub fn transit_positions(&self) -> impl Iterator<Item = (u64, f64)> + Clone + '_ {
        self.tiles
            .iter()
            .filter(|t| t.in_transit())
            .map(|t| (t.id, t.progress))
    }

    pub fn clear(&mut self) {
        self.tiles.clear();
    }
}
