//! Agent navigation for tick-driven 3D simulations
//!
//! This crate provides:
//! - Walkable-geometry collection for navigation mesh baking
//! - Navigation mesh registration and per-agent selection
//! - Path following with stuck detection and replanning
//! - Cover point search for threatened agents

pub mod agent;
pub mod events;
pub mod geometry;
pub mod nav;
pub mod spatial;

// Re-exports for convenience
pub use glam;
pub use hecs;
pub use rapier3d;

/// Prelude module for common imports
pub mod prelude {
    pub use crate::agent::{
        Aim, AgentProfile, CoverPoint, CoverSize, JumpIntent, MoveCommand, MoveMode, NavAgent,
        NavContext, PathFollower, Pose, TRIGGER_JUMP, clear_cover, find_cover, navigation_tick,
    };
    pub use crate::events::{NavEvent, NavEventQueue};
    pub use crate::geometry::{
        BoxSource, CollectorError, GeometryCollector, GeometrySource, GroundPlaneSource,
    };
    pub use crate::nav::{
        Aabb, GridPlanner, LinkTypes, MeshId, NavGrid, NavMeshDesc, NavMeshRegistry, NavPath,
        NavSize, PathBinding, PathPlanner, PlanRequest, link_flags,
    };
    pub use crate::spatial::{SpatialQuery, SpatialScene};
    pub use glam::{Mat4, Quat, Vec2, Vec3, Vec4};
}
