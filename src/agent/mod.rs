//! Navigation agents
//!
//! An agent is a composition, not a class hierarchy: an entity carries a
//! [`Pose`] (where it is and which way it faces), a [`NavAgent`] (what it
//! can traverse), and a [`PathFollower`] (where it is going). Each
//! simulation tick, [`navigation_tick`] turns that state into one
//! [`MoveCommand`] per agent for the movement layer to integrate.

mod cover;
mod follower;
mod profile;

pub use cover::{CoverPoint, CoverSize, clear_cover, find_cover};
pub use follower::{Aim, JumpIntent, MoveMode, PathFollower};
pub use profile::{AgentProfile, ProfileError};

use glam::Vec3;
use hecs::Entity;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::events::NavEventQueue;
use crate::nav::{Aabb, LinkTypes, NavMeshRegistry, NavSize, PathPlanner};
use crate::spatial::SpatialQuery;

/// Number of discrete trigger channels on a move command.
pub const MAX_TRIGGERS: usize = 6;

/// Trigger channel that fires a jump.
pub const TRIGGER_JUMP: usize = 2;

/// Position and facing of an agent's movement actor.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Pose {
    /// Feet position in world space.
    pub position: Vec3,
    /// Heading around the world Z axis, radians.
    pub yaw: f32,
    /// Head pitch relative to level, radians.
    pub head_pitch: f32,
    /// Eye height above the feet.
    pub eye_height: f32,
}

impl Pose {
    #[must_use]
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            yaw: 0.0,
            head_pitch: 0.0,
            eye_height: 1.8,
        }
    }

    /// Where rays from this agent start.
    #[must_use]
    pub fn eye_position(&self) -> Vec3 {
        self.position + Vec3::Z * self.eye_height
    }
}

/// Traversal capabilities of an agent: which link types it may use, which
/// size class of mesh it needs, and whether it is currently mounted.
/// Read-only for the duration of any single planning request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavAgent {
    pub link_types: LinkTypes,
    pub size: NavSize,
    /// Mounted agents navigate vehicle-rated meshes.
    pub mounted: bool,
    /// Half extents of the agent's world bounds, for mesh containment.
    pub half_extents: Vec3,
}

impl NavAgent {
    /// World bounds of this agent standing at `position`.
    #[must_use]
    pub fn bounds_at(&self, position: Vec3) -> Aabb {
        Aabb::from_center_half_extents(position + Vec3::Z * self.half_extents.z, self.half_extents)
    }
}

impl Default for NavAgent {
    fn default() -> Self {
        Self {
            link_types: LinkTypes::default(),
            size: NavSize::Regular,
            mounted: false,
            half_extents: Vec3::new(0.4, 0.4, 0.9),
        }
    }
}

/// One tick's worth of movement intent, in agent-local space. The
/// simulation layer integrates it; navigation never writes positions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoveCommand {
    /// Sideways axis, -1 to 1 before speed scaling.
    pub x: f32,
    /// Forward axis, -1 to 1 before speed scaling.
    pub y: f32,
    /// Yaw delta to apply this tick, radians in (-pi, pi].
    pub yaw: f32,
    /// Head pitch delta to apply this tick.
    pub pitch: f32,
    /// Discrete action triggers; [`TRIGGER_JUMP`] requests a jump.
    pub triggers: [bool; MAX_TRIGGERS],
}

impl MoveCommand {
    /// The do-nothing command.
    pub const NULL: Self = Self {
        x: 0.0,
        y: 0.0,
        yaw: 0.0,
        pitch: 0.0,
        triggers: [false; MAX_TRIGGERS],
    };

    #[must_use]
    pub fn jump(&self) -> bool {
        self.triggers[TRIGGER_JUMP]
    }
}

impl Default for MoveCommand {
    fn default() -> Self {
        Self::NULL
    }
}

/// Shared services a follower consults during its tick.
pub struct NavContext<'a> {
    pub registry: &'a NavMeshRegistry,
    pub planner: &'a dyn PathPlanner,
    pub spatial: &'a dyn SpatialQuery,
    pub events: &'a mut NavEventQueue,
}

/// Advance every navigation agent by one tick, in spawn order, and return
/// the movement commands they produced.
///
/// Strictly sequential: each follower is mutated by exactly one caller, so
/// per-agent state never races and cover claims stay single-writer.
pub fn navigation_tick(
    world: &mut hecs::World,
    ctx: &mut NavContext<'_>,
) -> Vec<(Entity, MoveCommand)> {
    // Resolve aimed-at entity positions up front, before the exclusive
    // borrow of the followers.
    let mut aim_targets: FxHashMap<Entity, Vec3> = FxHashMap::default();
    for (_, follower) in world.query::<&PathFollower>().iter() {
        if let Aim::Entity { target, .. } = follower.aim() {
            if !aim_targets.contains_key(&target) {
                if let Ok(pose) = world.get::<&Pose>(target) {
                    aim_targets.insert(target, pose.position);
                }
            }
        }
    }

    let mut commands = Vec::new();
    for (entity, (pose, agent, follower)) in
        world.query_mut::<(&Pose, &NavAgent, &mut PathFollower)>()
    {
        let target = match follower.aim() {
            Aim::Entity { target, .. } => aim_targets.get(&target).copied(),
            _ => None,
        };
        commands.push((entity, follower.tick(entity, pose, agent, target, ctx)));
    }

    // Cover abandoned during the tick (e.g. a new path request) is released
    // once the follower borrow is gone.
    let mut released: Vec<Entity> = Vec::new();
    for (_, follower) in world.query_mut::<&mut PathFollower>() {
        released.extend(follower.take_abandoned_cover());
    }
    for point in released {
        if let Ok(mut cover) = world.get::<&mut CoverPoint>(point) {
            cover.occupied = false;
        }
    }

    commands
}
