//! Per-tick path following
//!
//! The follower owns an agent's movement intent: where it is headed, which
//! node of its path it is on, whether it looks stuck, and what it should be
//! aiming at. Every tick it reduces that state to a single [`MoveCommand`];
//! it never moves the agent itself.

use glam::{Vec2, Vec3};
use hecs::Entity;

use crate::events::NavEvent;
use crate::nav::{MeshId, NavPath, PathBinding, PlanRequest, link_flags};

use super::{MoveCommand, NavAgent, NavContext, Pose, TRIGGER_JUMP};

/// Distance from the destination at which slowdown starts.
const SLOWDOWN_RANGE: f32 = 5.0;

/// Length of the downward probe that decides ledge-jump eligibility.
const LEDGE_PROBE_DEPTH: f32 = 0.4;

/// Planar deltas below this are treated as already aligned.
const PLANAR_EPSILON: f32 = 1e-4;

/// Movement state of the follower.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MoveMode {
    /// Not trying to go anywhere.
    #[default]
    Stop,
    /// Heading for the current destination.
    Move,
    /// Commanded to move but not actually getting anywhere.
    Stuck,
}

/// A queued jump decision taken from path segment flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JumpIntent {
    #[default]
    None,
    /// Jump on the next tick.
    Now,
    /// Jump as soon as the ground drops away underneath.
    AtLedge,
}

/// What the agent points its head (and weapons) at.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Aim {
    /// Look along the direction of travel.
    #[default]
    None,
    /// Look at a fixed point.
    Location(Vec3),
    /// Track an entity, offset from its position.
    Entity { target: Entity, offset: Vec3 },
}

/// Destination tracking, waypoint advancement, stuck detection, and aiming
/// for one agent. Attach alongside [`Pose`] and [`NavAgent`].
#[derive(Debug)]
pub struct PathFollower {
    mode: MoveMode,
    move_destination: Vec3,
    move_slowdown: bool,
    move_speed: f32,
    move_tolerance: f32,
    stuck_tolerance: f32,
    stuck_test_delay: u32,
    stuck_countdown: u32,
    last_position: Vec3,
    aim: Aim,
    target_in_sight: bool,
    jump: JumpIntent,
    path: Option<PathBinding>,
    path_index: usize,
    mesh: Option<MeshId>,
    cover: Option<Entity>,
    abandoned_cover: Vec<Entity>,
}

impl PathFollower {
    /// A follower for an agent spawning with the given pose. The eye
    /// position seeds displacement tracking so the first stuck check is
    /// not measured against garbage.
    #[must_use]
    pub fn new(pose: &Pose) -> Self {
        Self {
            mode: MoveMode::Stop,
            move_destination: Vec3::ZERO,
            move_slowdown: true,
            move_speed: 1.0,
            move_tolerance: 0.25,
            stuck_tolerance: 0.01,
            stuck_test_delay: 30,
            stuck_countdown: 0,
            last_position: pose.eye_position(),
            aim: Aim::None,
            target_in_sight: false,
            jump: JumpIntent::None,
            path: None,
            path_index: 0,
            mesh: None,
            cover: None,
            abandoned_cover: Vec::new(),
        }
    }

    #[must_use]
    pub fn mode(&self) -> MoveMode {
        self.mode
    }

    #[must_use]
    pub fn move_destination(&self) -> Vec3 {
        self.move_destination
    }

    #[must_use]
    pub fn aim(&self) -> Aim {
        self.aim
    }

    #[must_use]
    pub fn jump_intent(&self) -> JumpIntent {
        self.jump
    }

    #[must_use]
    pub fn mesh(&self) -> Option<MeshId> {
        self.mesh
    }

    #[must_use]
    pub fn path(&self) -> Option<&NavPath> {
        self.path.as_ref().map(PathBinding::path)
    }

    #[must_use]
    pub fn path_index(&self) -> usize {
        self.path_index
    }

    /// Goal of the current path, if any.
    #[must_use]
    pub fn path_destination(&self) -> Option<Vec3> {
        self.path().map(|p| p.to)
    }

    #[must_use]
    pub fn cover(&self) -> Option<Entity> {
        self.cover
    }

    /// Movement speed as a fraction of the actor's base rate, clamped to
    /// [0, 1].
    pub fn set_move_speed(&mut self, speed: f32) {
        self.move_speed = speed.clamp(0.0, 1.0);
    }

    /// Arrival tolerance; values below 0.1 invite orbiting and are clamped.
    pub fn set_move_tolerance(&mut self, tolerance: f32) {
        self.move_tolerance = tolerance.max(0.1);
    }

    /// Per-tick displacement below this counts as stuck.
    pub fn set_stuck_tolerance(&mut self, tolerance: f32) {
        self.stuck_tolerance = tolerance;
    }

    /// Grace ticks after a destination change before stuck checks begin.
    pub fn set_stuck_test_delay(&mut self, ticks: u32) {
        self.stuck_test_delay = ticks;
    }

    pub fn stop_move(&mut self) {
        self.mode = MoveMode::Stop;
    }

    /// Head directly for `destination`. Also how a `Stuck` agent is put
    /// back to work: the mode flips to `Move` and the stuck grace period
    /// re-arms. The grace period re-arms on every destination change,
    /// including per-waypoint advancement.
    pub fn set_move_destination(&mut self, destination: Vec3, slowdown: bool) {
        self.move_destination = destination;
        self.mode = MoveMode::Move;
        self.move_slowdown = slowdown;
        self.stuck_countdown = self.stuck_test_delay;
    }

    /// Track an entity, aiming `offset` above/ahead of its position.
    pub fn set_aim_entity(&mut self, target: Entity, offset: Vec3) {
        self.aim = Aim::Entity { target, offset };
        self.target_in_sight = false;
    }

    /// Aim at a fixed point.
    pub fn set_aim_location(&mut self, location: Vec3) {
        self.aim = Aim::Location(location);
        self.target_in_sight = false;
    }

    /// Go back to looking where we are going.
    pub fn clear_aim(&mut self) {
        self.aim = Aim::None;
        self.target_in_sight = false;
    }

    /// Compute this tick's movement command.
    ///
    /// `target` is the resolved position of the aimed-at entity, when the
    /// aim is [`Aim::Entity`]; the ECS driver resolves it so the follower
    /// never touches the world directly.
    pub fn tick(
        &mut self,
        agent: Entity,
        pose: &Pose,
        nav: &NavAgent,
        target: Option<Vec3>,
        ctx: &mut NavContext<'_>,
    ) -> MoveCommand {
        let mut mv = MoveCommand::NULL;
        let location = pose.eye_position();

        self.update_mesh(agent, pose, nav, ctx);

        // Jump intents queued by waypoint advancement fire on the tick
        // after they were set, once any ledge condition holds.
        match self.jump {
            JumpIntent::Now => {
                mv.triggers[TRIGGER_JUMP] = true;
                self.jump = JumpIntent::None;
            }
            JumpIntent::AtLedge => {
                if !ctx.spatial.grounded(pose.position, LEDGE_PROBE_DEPTH) {
                    mv.triggers[TRIGGER_JUMP] = true;
                    self.jump = JumpIntent::None;
                }
            }
            JumpIntent::None => {}
        }

        // Orient towards the aim point, aimed entity, or our destination.
        let aiming = !matches!(self.aim, Aim::None);
        if aiming || self.mode != MoveMode::Stop {
            let aim_point = match self.aim {
                Aim::Location(p) => p,
                Aim::Entity { offset, .. } => match target {
                    Some(p) => p + offset,
                    None => self.move_destination,
                },
                Aim::None => self.move_destination,
            };

            let dx = aim_point.x - location.x;
            let dy = aim_point.y - location.y;
            if dx.abs() > PLANAR_EPSILON || dy.abs() > PLANAR_EPSILON {
                // Shortest way around the circle.
                let desired_yaw = dx.atan2(dy);
                mv.yaw = wrap_angle(desired_yaw - pose.yaw);

                if aiming {
                    let vertical = aim_point.z - location.z;
                    let horizontal = (dx * dx + dy * dy).sqrt();
                    let pitch = horizontal.atan2(vertical) - std::f32::consts::FRAC_PI_2;
                    if pitch.abs() > 0.01 {
                        mv.pitch = pitch - pose.head_pitch;
                    }
                } else {
                    // Level out while just looking at the next waypoint.
                    mv.pitch = -pose.head_pitch;
                }
            }
        } else {
            mv.pitch = -pose.head_pitch;
        }

        // Move towards the destination.
        if self.mode != MoveMode::Stop {
            let dx = self.move_destination.x - location.x;
            let dy = self.move_destination.y - location.y;

            if dx.abs() < self.move_tolerance && dy.abs() < self.move_tolerance {
                self.mode = MoveMode::Stop;
                self.on_reach_destination(agent, ctx);
            } else {
                // Direction in world space: the dominant axis saturates,
                // the other is scaled by the slope.
                if dx.abs() < PLANAR_EPSILON {
                    mv.y = if location.y > self.move_destination.y {
                        -1.0
                    } else {
                        1.0
                    };
                } else if dy.abs() < PLANAR_EPSILON {
                    mv.x = if location.x > self.move_destination.x {
                        -1.0
                    } else {
                        1.0
                    };
                } else if dx.abs() > dy.abs() {
                    let value = (dy / dx).abs();
                    mv.y = if location.y > self.move_destination.y {
                        -value
                    } else {
                        value
                    };
                    mv.x = if location.x > self.move_destination.x {
                        -1.0
                    } else {
                        1.0
                    };
                } else {
                    let value = (dx / dy).abs();
                    mv.x = if location.x > self.move_destination.x {
                        -value
                    } else {
                        value
                    };
                    mv.y = if location.y > self.move_destination.y {
                        -1.0
                    } else {
                        1.0
                    };
                }

                // Rotate the move into agent-local space, accounting for
                // the turn being made this tick.
                let local = Vec2::from_angle(pose.yaw + mv.yaw).rotate(Vec2::new(mv.x, mv.y));
                mv.x = local.x;
                mv.y = local.y;

                // Slow down near the goal to stop on the spot.
                let mut speed = self.move_speed;
                if self.move_slowdown {
                    let dist = (dx * dx + dy * dy).sqrt();
                    if dist < SLOWDOWN_RANGE {
                        speed *= dist / SLOWDOWN_RANGE;
                    }
                }
                mv.x *= speed;
                mv.y *= speed;

                if self.stuck_countdown > 0 {
                    self.stuck_countdown -= 1;
                } else {
                    let displacement = (location - self.last_position).length();
                    if displacement < self.stuck_tolerance {
                        if self.mode != MoveMode::Stuck {
                            self.mode = MoveMode::Stuck;
                            self.on_stuck(agent, pose, ctx);
                        }
                    } else {
                        self.mode = MoveMode::Move;
                    }
                }
            }
        }

        // Edge-triggered line-of-sight notifications for the aimed entity.
        if let Aim::Entity { target: aimed, .. } = self.aim {
            if let Some(center) = target {
                let blocked = ctx.spatial.ray_blocked(location, center);
                if blocked && self.target_in_sight {
                    ctx.events.push(NavEvent::TargetLeftSight {
                        agent,
                        target: aimed,
                    });
                    self.target_in_sight = false;
                } else if !blocked && !self.target_in_sight {
                    ctx.events.push(NavEvent::TargetEnteredSight {
                        agent,
                        target: aimed,
                    });
                    self.target_in_sight = true;
                }
            }
        }

        self.last_position = location;
        mv
    }

    /// Within tolerance of the current destination: either step down the
    /// path or genuinely arrive.
    fn on_reach_destination(&mut self, agent: Entity, ctx: &mut NavContext<'_>) {
        let Some(binding) = &self.path else {
            ctx.events.push(NavEvent::ReachedDestination { agent });
            return;
        };
        let path = binding.path();
        if self.path_index == path.last_index() {
            if path.looping {
                self.advance_to_node(0);
            } else {
                self.clear_path();
                ctx.events.push(NavEvent::ReachedDestination { agent });
            }
        } else {
            let next = self.path_index as isize + 1;
            self.advance_to_node(next);
        }
    }

    /// Displacement dropped below tolerance: replan an owned path, or tell
    /// the world we are wedged.
    fn on_stuck(&mut self, agent: Entity, pose: &Pose, ctx: &mut NavContext<'_>) {
        log::debug!("agent {agent:?} stuck at {:?}", pose.position);
        if self.path.as_ref().is_some_and(PathBinding::is_owned) {
            self.repath(agent, pose, ctx);
        } else {
            ctx.events.push(NavEvent::MoveStuck { agent });
        }
    }

    /// Drop the current path. Owned paths are destroyed; shared paths are
    /// merely let go. The agent stops moving.
    pub fn clear_path(&mut self) {
        self.path = None;
        self.path_index = 0;
        self.stop_move();
    }

    /// Make node `node` the current destination. `-1` is shorthand for the
    /// last node. The flags of the segment leading into the node decide
    /// whether a jump is queued.
    pub fn advance_to_node(&mut self, node: isize) {
        let Some(binding) = &self.path else {
            return;
        };
        let path = binding.path();
        if path.is_empty() {
            return;
        }
        let node = if node < 0 {
            path.last_index()
        } else {
            (node as usize).min(path.last_index())
        };
        let destination = path.node(node);
        let flags = if node > 0 { path.segment_flags(node - 1) } else { 0 };

        // No slowdown between intermediate nodes.
        self.set_move_destination(destination, false);

        if node > 0 {
            if flags & link_flags::LEDGE != 0 {
                self.jump = JumpIntent::AtLedge;
            } else if flags & link_flags::JUMP != 0 {
                self.jump = JumpIntent::Now;
            } else {
                self.jump = JumpIntent::None;
            }
        }

        self.path_index = node;
    }

    /// Plan a path to `goal` and start following it. On failure the agent
    /// is not left silently idle: a `PathFailed` event is emitted and the
    /// previous path keeps whatever state it had.
    pub fn set_path_destination(
        &mut self,
        agent: Entity,
        goal: Vec3,
        pose: &Pose,
        nav: &NavAgent,
        ctx: &mut NavContext<'_>,
    ) -> bool {
        if self.mesh.is_none() {
            self.mesh = ctx
                .registry
                .select(&nav.bounds_at(pose.position), nav.size, nav.mounted);
        }
        let Some(mesh) = self.mesh else {
            log::debug!("agent {agent:?}: no navmesh supports it here");
            ctx.events.push(NavEvent::PathFailed { agent });
            return false;
        };

        let request = PlanRequest {
            mesh,
            from: pose.position,
            to: goal,
            link_types: nav.link_types,
        };
        match ctx.planner.plan(ctx.registry, &request) {
            Some(path) if !path.is_empty() => {
                self.abandon_cover();
                self.path = Some(PathBinding::Owned(path));
                self.path_index = 0;
                // Skip node 0; we are standing on it.
                self.advance_to_node(1);
                true
            }
            _ => {
                ctx.events.push(NavEvent::PathFailed { agent });
                false
            }
        }
    }

    /// Follow a route owned by someone else (a patrol loop, a mission
    /// path). The follower will walk it but never replan or destroy it.
    pub fn follow_path(&mut self, path: std::sync::Arc<NavPath>) {
        if path.is_empty() {
            log::warn!("refusing to follow an empty path");
            return;
        }
        self.abandon_cover();
        self.path = Some(PathBinding::Shared(path));
        self.path_index = 0;
        // Start from node 0; we may be nowhere near it.
        self.advance_to_node(0);
    }

    /// Replan an owned path from the current position to its original
    /// goal. Does nothing for shared paths or when there is no path.
    pub fn repath(&mut self, agent: Entity, pose: &Pose, ctx: &mut NavContext<'_>) {
        let Some(PathBinding::Owned(old)) = &self.path else {
            return;
        };
        let request = PlanRequest {
            mesh: old.mesh,
            from: pose.position,
            to: old.to,
            link_types: old.link_types,
        };
        match ctx.planner.plan(ctx.registry, &request) {
            Some(path) if !path.is_empty() => {
                self.path = Some(PathBinding::Owned(path));
                self.path_index = 0;
                self.advance_to_node(1);
            }
            _ => {
                ctx.events.push(NavEvent::PathFailed { agent });
            }
        }
    }

    /// Keep the selected mesh while it still contains the agent; rescan on
    /// violation, and replan toward the same goal if the mesh changed
    /// under an active path.
    fn update_mesh(&mut self, agent: Entity, pose: &Pose, nav: &NavAgent, ctx: &mut NavContext<'_>) {
        let bounds = nav.bounds_at(pose.position);
        let old = self.mesh;
        self.mesh = ctx
            .registry
            .update(self.mesh, &bounds, nav.size, nav.mounted);
        if self.mesh != old {
            log::debug!("agent {agent:?} switched navmesh to {:?}", self.mesh);
            if let Some(goal) = self.path_destination() {
                self.set_path_destination(agent, goal, pose, nav, ctx);
            }
        }
    }

    pub(crate) fn set_cover(&mut self, point: Entity) {
        self.cover = Some(point);
    }

    /// Give up the current cover claim; the release is applied by whoever
    /// holds world access.
    pub(crate) fn abandon_cover(&mut self) {
        if let Some(point) = self.cover.take() {
            self.abandoned_cover.push(point);
        }
    }

    pub(crate) fn take_abandoned_cover(&mut self) -> Vec<Entity> {
        std::mem::take(&mut self.abandoned_cover)
    }
}

/// Normalize an angle into (-pi, pi].
fn wrap_angle(mut angle: f32) -> f32 {
    use std::f32::consts::{PI, TAU};
    while angle <= -PI {
        angle += TAU;
    }
    while angle > PI {
        angle -= TAU;
    }
    angle
}
