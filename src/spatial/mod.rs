//! Collision query surface consumed by navigation
//!
//! The follower needs exactly two questions answered about the static
//! world: "is this line of sight blocked?" and "is there ground under me?".
//! [`SpatialQuery`] is that boundary; [`SpatialScene`] answers it with
//! rapier3d.

mod scene;

pub use scene::SpatialScene;

use glam::Vec3;

/// Ray queries against static world geometry.
pub trait SpatialQuery {
    /// True if static geometry blocks the segment from `from` to `to`.
    fn ray_blocked(&self, from: Vec3, to: Vec3) -> bool;

    /// True if standing geometry lies within `depth` below `position`.
    fn grounded(&self, position: Vec3, depth: f32) -> bool;
}
