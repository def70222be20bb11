//! Headless render consumer
//!
//! Samples the simulation once per animation frame and produces world-space
//! poses for the belt and tiles. Drawing is left to the host.

pub mod conveyor;
pub mod path;

pub use conveyor::{ConveyorView, RenderFrame, SlatPose, TilePose};
pub use path::ConveyorPath;
