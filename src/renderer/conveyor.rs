//! Conveyor render consumer
//!
//! Turns the simulation's continuous tile state into world-space poses once
//! per animation frame. Read-only with respect to the simulation; the only
//! state kept here is the belt slat scroll.

use glam::DVec3;
use serde::Serialize;

use super::path::ConveyorPath;
use crate::consts::STATION_COUNT;
use crate::sim::{FactoryState, LifecycleState, Tile};

/// Belt slats drawn around the loop
pub const SLAT_COUNT: usize = 100;

/// Tile hover height above the belt surface
pub const TILE_Y_OFFSET: f64 = 0.07;

// === Exit animation targets ===
pub const WASTE_BIN_TARGET: DVec3 = DVec3::new(10.0, -0.2, -2.5);
pub const SHIPMENT_BOX_TARGET: DVec3 = DVec3::new(16.0, 0.5, 0.0);

pub const SORT_ARC_HEIGHT: f64 = 1.5;
pub const COLLECT_ARC_HEIGHT: f64 = 0.8;

pub const SORT_FADE_THRESHOLD: f64 = 0.8;
pub const SORT_FADE_RATE: f64 = 5.0;
pub const COLLECT_FADE_THRESHOLD: f64 = 0.7;
pub const COLLECT_FADE_RATE: f64 = 3.33;

/// Position and orientation of one belt slat
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SlatPose {
    pub position: DVec3,
    pub direction: DVec3,
}

/// Where to draw a tile this frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TilePose {
    pub id: u64,
    pub position: DVec3,
    /// Direction of travel while on the belt, zero in flight
    pub direction: DVec3,
    pub scale: f64,
    pub is_defected: bool,
    pub state: LifecycleState,
}

/// Everything a renderer needs for one frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderFrame {
    pub slats: Vec<SlatPose>,
    pub tiles: Vec<TilePose>,
    pub highlights: [bool; STATION_COUNT],
}

/// Belt geometry plus slat scroll state
#[derive(Debug, Clone)]
pub struct ConveyorView {
    path: ConveyorPath,
    slat_offsets: Vec<f64>,
}

impl Default for ConveyorView {
    fn default() -> Self {
        Self::new(ConveyorPath::default(), SLAT_COUNT)
    }
}

impl ConveyorView {
    /// Slats start evenly spaced around the loop
    pub fn new(path: ConveyorPath, slat_count: usize) -> Self {
        let slat_offsets = (0..slat_count)
            .map(|i| i as f64 / slat_count as f64)
            .collect();
        Self { path, slat_offsets }
    }

    pub fn path(&self) -> &ConveyorPath {
        &self.path
    }

    pub fn slat_offsets(&self) -> &[f64] {
        &self.slat_offsets
    }

    /// Scroll the belt at the tiles' speed. A halted belt does not move.
    pub fn advance_slats(&mut self, dt: f64, velocity: f64, running: bool) {
        if !running {
            return;
        }
        let step = dt.max(0.0) * velocity;
        for offset in &mut self.slat_offsets {
            *offset = (*offset + step).rem_euclid(1.0);
        }
    }

    pub fn slat_poses(&self) -> Vec<SlatPose> {
        self.slat_offsets
            .iter()
            .map(|&u| SlatPose {
                position: self.path.point_at(u),
                direction: self.path.tangent_at(u),
            })
            .collect()
    }

    /// World pose for a tile in any lifecycle state
    pub fn tile_pose(&self, tile: &Tile) -> TilePose {
        let (position, direction, scale) = match tile.state {
            LifecycleState::Transit => {
                let position = self.path.point_at(tile.progress) + DVec3::Y * TILE_Y_OFFSET;
                (position, self.path.tangent_at(tile.progress), tile.scale)
            }
            LifecycleState::Sorted => (
                self.throw(tile.origin, WASTE_BIN_TARGET, tile.sort_progress, SORT_ARC_HEIGHT),
                DVec3::ZERO,
                fade(tile.sort_progress, SORT_FADE_THRESHOLD, SORT_FADE_RATE),
            ),
            LifecycleState::Collected => (
                self.throw(
                    tile.origin,
                    SHIPMENT_BOX_TARGET,
                    tile.collect_progress,
                    COLLECT_ARC_HEIGHT,
                ),
                DVec3::ZERO,
                fade(tile.collect_progress, COLLECT_FADE_THRESHOLD, COLLECT_FADE_RATE),
            ),
        };

        TilePose {
            id: tile.id,
            position,
            direction,
            scale,
            is_defected: tile.is_defected,
            state: tile.state,
        }
    }

    /// Advance the belt and pose every live tile
    pub fn frame(&mut self, dt: f64, state: &FactoryState) -> RenderFrame {
        self.advance_slats(dt, state.clock().effective_velocity(), state.is_running());

        RenderFrame {
            slats: self.slat_poses(),
            tiles: state
                .tiles()
                .tiles()
                .iter()
                .map(|t| self.tile_pose(t))
                .collect(),
            highlights: state.highlights(),
        }
    }

    /// Straight line from the belt to `target`, lifted by a sine arc
    fn throw(&self, origin: f64, target: DVec3, progress: f64, arc_height: f64) -> DVec3 {
        let start = self.path.point_at(origin);
        let mut position = start.lerp(target, progress);
        position.y += (progress * std::f64::consts::PI).sin() * arc_height;
        position
    }
}

/// Full size until `threshold`, then shrinking to nothing
fn fade(progress: f64, threshold: f64, rate: f64) -> f64 {
    if progress > threshold {
        (1.0 - (progress - threshold) * rate).max(0.0)
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::*;
    use crate::settings::Settings;
    use crate::station_stage;

    fn tile(state: LifecycleState, progress: f64) -> Tile {
        let mut tile = Tile::new(1, state == LifecycleState::Sorted);
        tile.state = state;
        tile.progress = progress;
        tile.origin = progress;
        tile
    }

    #[test]
    fn test_slats_evenly_spaced() {
        let view = ConveyorView::default();
        assert_eq!(view.slat_offsets().len(), SLAT_COUNT);
        assert_eq!(view.slat_offsets()[50], 0.5);
    }

    #[test]
    fn test_slats_scroll_only_while_running() {
        let mut view = ConveyorView::default();
        view.advance_slats(1.0, 0.25, false);
        assert_eq!(view.slat_offsets()[0], 0.0);

        view.advance_slats(1.0, 0.25, true);
        assert!((view.slat_offsets()[0] - 0.25).abs() < 1e-12);
        // Wraps around the loop
        assert!((view.slat_offsets()[90] - 0.15).abs() < 1e-12);
    }

    #[test]
    fn test_transit_tile_rides_above_belt() {
        let view = ConveyorView::default();
        let mut t = tile(LifecycleState::Transit, station_stage(2));
        t.scale = 0.4;
        let pose = view.tile_pose(&t);

        let on_belt = view.path().point_at(station_stage(2));
        assert!((pose.position - on_belt - DVec3::Y * TILE_Y_OFFSET).length() < 1e-12);
        assert!(pose.direction.x > 0.99);
        assert_eq!(pose.scale, 0.4);
    }

    #[test]
    fn test_sorted_tile_thrown_into_waste_bin() {
        let view = ConveyorView::default();
        let mut t = tile(LifecycleState::Sorted, SORT_THRESHOLD);

        let start = view.tile_pose(&t);
        assert!((start.position - view.path().point_at(SORT_THRESHOLD)).length() < 1e-12);
        assert_eq!(start.scale, 1.0);

        t.sort_progress = 0.5;
        let mid = view.tile_pose(&t);
        let chord = view.path().point_at(SORT_THRESHOLD).lerp(WASTE_BIN_TARGET, 0.5);
        assert!((mid.position.y - chord.y - SORT_ARC_HEIGHT).abs() < 1e-12);
        assert_eq!(mid.direction, DVec3::ZERO);

        t.sort_progress = 0.9;
        assert!((view.tile_pose(&t).scale - 0.5).abs() < 1e-12);

        t.sort_progress = 1.0;
        let end = view.tile_pose(&t);
        assert!((end.position - WASTE_BIN_TARGET).length() < 1e-9);
        assert!(end.scale.abs() < 1e-9);
    }

    #[test]
    fn test_collected_tile_fades_into_box() {
        let view = ConveyorView::default();
        let mut t = tile(LifecycleState::Collected, 0.49);
        t.collect_progress = 0.7;
        assert_eq!(view.tile_pose(&t).scale, 1.0);

        t.collect_progress = 1.0;
        let end = view.tile_pose(&t);
        assert!((end.position - SHIPMENT_BOX_TARGET).length() < 1e-9);
        assert!(end.scale >= 0.0 && end.scale < 0.02);
    }

    #[test]
    fn test_frame_reflects_factory() {
        let mut state = FactoryState::new(&Settings::default()).unwrap();
        let mut view = ConveyorView::default();

        let stopped = view.frame(0.5, &state);
        assert!(stopped.tiles.is_empty());
        assert_eq!(view.slat_offsets()[0], 0.0);

        state.start();
        // First tile pressed after one station period (2s at defaults)
        for _ in 0..129 {
            state.frame(1.0 / 64.0);
        }
        let running = view.frame(1.0 / 64.0, &state);
        assert_eq!(running.tiles.len(), 1);
        assert_eq!(running.slats.len(), SLAT_COUNT);
        assert!(view.slat_offsets()[0] > 0.0);
        assert_eq!(running.highlights, state.highlights());
    }
}
