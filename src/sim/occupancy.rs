//! Station occupancy
//!
//! Two samplers over the same continuous tile positions:
//! - live sampling (every frame / every tick) answers "is a tile at station i now"
//! - the snapshot matrix records, once per production tick, which tile sat at
//!   each station, newest row first

use serde::{Deserialize, Serialize};

use crate::consts::{MATRIX_COLS, MATRIX_ROWS, STATION_COUNT};
use crate::station_stage;

/// Tile id recorded in a matrix slot
pub type TileLabel = u64;

/// One matrix row: one optional tile per station
pub type OccupancyRow = [Option<TileLabel>; MATRIX_COLS];

/// First tile within `tolerance` of station `index`
pub fn tile_at_station<I>(positions: I, index: usize, tolerance: f64) -> Option<TileLabel>
where
    I: IntoIterator<Item = (u64, f64)>,
{
    let stage = station_stage(index);
    positions
        .into_iter()
        .find(|(_, t)| (t - stage).abs() < tolerance)
        .map(|(id, _)| id)
}

/// Per-station "tile present" flags
pub fn live_occupancy<I>(positions: I, tolerance: f64) -> [bool; STATION_COUNT]
where
    I: IntoIterator<Item = (u64, f64)>,
    I::IntoIter: Clone,
{
    let positions = positions.into_iter();
    std::array::from_fn(|i| {
        let stage = station_stage(i);
        positions.clone().any(|(_, t)| (t - stage).abs() < tolerance)
    })
}

/// Bounded history of station occupancy, most recent row first
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OccupancyMatrix {
    rows: Vec<OccupancyRow>,
    capacity: usize,
}

impl Default for OccupancyMatrix {
    fn default() -> Self {
        Self::new(MATRIX_ROWS)
    }
}

impl OccupancyMatrix {
    /// All-empty matrix with `capacity` rows
    pub fn new(capacity: usize) -> Self {
        Self {
            rows: vec![[None; MATRIX_COLS]; capacity],
            capacity,
        }
    }

    pub fn rows(&self) -> &[OccupancyRow] {
        &self.rows
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Record a production tick. Slot 0 is the tile pressed this tick;
    /// the rest are sampled from tiles still on the belt.
    pub fn record<I>(&mut self, spawned: TileLabel, positions: I, tolerance: f64)
    where
        I: IntoIterator<Item = (u64, f64)>,
        I::IntoIter: Clone,
    {
        let positions = positions.into_iter();
        let row: OccupancyRow = std::array::from_fn(|i| {
            if i == 0 {
                Some(spawned)
            } else {
                tile_at_station(positions.clone(), i, tolerance)
            }
        });
        self.push(row);
    }

    /// Prepend a row, evicting the oldest beyond capacity
    pub fn push(&mut self, row: OccupancyRow) {
        self.rows.insert(0, row);
        self.rows.truncate(self.capacity);
    }

    pub fn is_empty(&self) -> bool {
        self.rows.iter().all(|row| row.iter().all(Option::is_none))
    }

    /// Back to all-empty
    pub fn clear(&mut self) {
        self.rows = vec![[None; MATRIX_COLS]; self.capacity];
    }
}
