//! Cover points and the one-shot cover search
//!
//! Cover points are plain entities carrying a [`Pose`] and a [`CoverPoint`]
//! component. Occupancy is a mutually exclusive claim: the searching agent
//! flips the flag on, and only an explicit release (a new search or
//! [`clear_cover`]) flips it back off. The follower remembers the claimed
//! entity but never owns it.

use glam::Vec3;
use hecs::Entity;

use super::{NavAgent, NavContext, PathFollower, Pose};

/// How much of a body a cover point hides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoverSize {
    /// Hides a prone character.
    Prone,
    /// Hides a crouching character.
    Crouch,
    /// Hides a standing character.
    Stand,
}

impl CoverSize {
    /// Number of size ranks.
    pub const COUNT: usize = 3;

    fn rank(self) -> f32 {
        match self {
            CoverSize::Prone => 0.0,
            CoverSize::Crouch => 1.0,
            CoverSize::Stand => 2.0,
        }
    }
}

/// A place to hide. The protective direction is `normal`; quality scales
/// the whole score so designers can mark good and bad spots.
#[derive(Debug, Clone)]
pub struct CoverPoint {
    /// Direction the cover protects against, unit length.
    pub normal: Vec3,
    /// Body size this point conceals.
    pub size: CoverSize,
    /// Designer-tuned quality factor in [0, 1].
    pub quality: f32,
    /// Claimed by some agent right now.
    pub occupied: bool,
}

impl CoverPoint {
    #[must_use]
    pub fn new(normal: Vec3, size: CoverSize) -> Self {
        Self {
            normal: normal.normalize_or_zero(),
            size,
            quality: 1.0,
            occupied: false,
        }
    }
}

/// Find the best unoccupied cover from a threat at `threat` within
/// `radius`, claim it, and path the agent to it. Returns true if cover was
/// found and claimed. A non-positive radius is a no-op.
///
/// Candidates are scored by how squarely their normal faces the threat,
/// discounted by distance from the seeker, boosted by size rank, and
/// scaled by quality; ties keep the first candidate enumerated.
pub fn find_cover(
    world: &mut hecs::World,
    agent: Entity,
    threat: Vec3,
    radius: f32,
    ctx: &mut NavContext<'_>,
) -> bool {
    if radius <= 0.0 {
        return false;
    }

    let (seeker, nav) = {
        let Ok(pose) = world.get::<&Pose>(agent) else {
            return false;
        };
        let Ok(nav) = world.get::<&NavAgent>(agent) else {
            return false;
        };
        (pose.position, nav.clone())
    };
    let search = crate::nav::Aabb::from_center_half_extents(seeker, Vec3::splat(radius));

    let mut best: Option<(Entity, Vec3, f32)> = None;
    for (entity, (pose, point)) in world.query::<(&Pose, &CoverPoint)>().iter() {
        if point.occupied || !search.contains_point(pose.position) {
            continue;
        }
        let toward_threat = (threat - pose.position).normalize_or_zero();
        // Angle to the threat first, then proximity, then size.
        let mut score = point.normal.dot(toward_threat);
        score -= (pose.position - seeker).length() / radius;
        score += (point.size.rank() + 1.0) / CoverSize::COUNT as f32;
        score *= point.quality;
        if best.is_none_or(|(_, _, b)| score > b) {
            best = Some((entity, pose.position, score));
        }
    }

    let Some((chosen, position, score)) = best else {
        return false;
    };
    log::debug!("agent {agent:?} taking cover at {position:?} (score {score:.2})");

    let released = {
        let Ok(pose) = world.get::<&Pose>(agent) else {
            return false;
        };
        let Ok(mut follower) = world.get::<&mut PathFollower>(agent) else {
            return false;
        };
        follower.set_path_destination(agent, position, &pose, &nav, ctx);
        follower.abandon_cover();
        follower.set_cover(chosen);
        follower.take_abandoned_cover()
    };
    for point in released {
        if let Ok(mut cover) = world.get::<&mut CoverPoint>(point) {
            cover.occupied = false;
        }
    }
    if let Ok(mut cover) = world.get::<&mut CoverPoint>(chosen) {
        cover.occupied = true;
    }
    true
}

/// Release the agent's cover claim, if it holds one.
pub fn clear_cover(world: &mut hecs::World, agent: Entity) {
    let released = {
        let Ok(mut follower) = world.get::<&mut PathFollower>(agent) else {
            return;
        };
        follower.abandon_cover();
        follower.take_abandoned_cover()
    };
    for point in released {
        if let Ok(mut cover) = world.get::<&mut CoverPoint>(point) {
            cover.occupied = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{NavEvent, NavEventQueue};
    use crate::nav::{
        Aabb, LinkTypes, NavMeshDesc, NavMeshRegistry, NavPath, PathPlanner, PlanRequest,
    };
    use crate::spatial::SpatialQuery;
    use smallvec::smallvec;

    struct StraightPlanner;

    impl PathPlanner for StraightPlanner {
        fn plan(&self, _registry: &NavMeshRegistry, request: &PlanRequest) -> Option<NavPath> {
            Some(NavPath {
                nodes: smallvec![request.from, request.to],
                flags: smallvec![crate::nav::link_flags::WALK],
                looping: false,
                from: request.from,
                to: request.to,
                link_types: request.link_types,
                mesh: request.mesh,
            })
        }
    }

    struct OpenAir;

    impl SpatialQuery for OpenAir {
        fn ray_blocked(&self, _from: Vec3, _to: Vec3) -> bool {
            false
        }

        fn grounded(&self, _position: Vec3, _depth: f32) -> bool {
            true
        }
    }

    struct Fixture {
        world: hecs::World,
        registry: NavMeshRegistry,
        events: NavEventQueue,
        agent: Entity,
    }

    impl Fixture {
        fn new() -> Self {
            let mut world = hecs::World::new();
            let mut registry = NavMeshRegistry::new();
            registry.register(NavMeshDesc::new(
                "arena",
                Aabb::new(Vec3::new(-50.0, -50.0, -1.0), Vec3::new(50.0, 50.0, 5.0)),
            ));
            let pose = Pose::new(Vec3::ZERO);
            let agent = world.spawn((
                pose,
                NavAgent {
                    link_types: LinkTypes::default(),
                    ..NavAgent::default()
                },
                PathFollower::new(&pose),
            ));
            Self {
                world,
                registry,
                events: NavEventQueue::new(),
                agent,
            }
        }

        fn spawn_cover(&mut self, position: Vec3, normal: Vec3, size: CoverSize) -> Entity {
            self.world
                .spawn((Pose::new(position), CoverPoint::new(normal, size)))
        }

        fn find(&mut self, threat: Vec3, radius: f32) -> bool {
            let planner = StraightPlanner;
            let spatial = OpenAir;
            let mut ctx = NavContext {
                registry: &self.registry,
                planner: &planner,
                spatial: &spatial,
                events: &mut self.events,
            };
            find_cover(&mut self.world, self.agent, threat, radius, &mut ctx)
        }

        fn occupied(&self, point: Entity) -> bool {
            self.world.get::<&CoverPoint>(point).unwrap().occupied
        }
    }

    #[test]
    fn test_prefers_normal_facing_threat() {
        let mut fx = Fixture::new();
        let threat = Vec3::new(20.0, 0.0, 0.0);
        // Equal distance and size; only the normals differ.
        let facing = fx.spawn_cover(Vec3::new(0.0, 5.0, 0.0), Vec3::X, CoverSize::Stand);
        let averted = fx.spawn_cover(Vec3::new(0.0, -5.0, 0.0), Vec3::NEG_X, CoverSize::Stand);

        assert!(fx.find(threat, 15.0));
        assert!(fx.occupied(facing));
        assert!(!fx.occupied(averted));

        // The follower pathed toward the chosen point.
        let follower = fx.world.get::<&PathFollower>(fx.agent).unwrap();
        assert_eq!(follower.cover(), Some(facing));
        assert_eq!(
            follower.path_destination(),
            Some(Vec3::new(0.0, 5.0, 0.0))
        );
    }

    #[test]
    fn test_skips_occupied_and_out_of_range() {
        let mut fx = Fixture::new();
        let threat = Vec3::new(20.0, 0.0, 0.0);
        let taken = fx.spawn_cover(Vec3::new(0.0, 2.0, 0.0), Vec3::X, CoverSize::Stand);
        fx.world.get::<&mut CoverPoint>(taken).unwrap().occupied = true;
        let distant = fx.spawn_cover(Vec3::new(0.0, 40.0, 0.0), Vec3::X, CoverSize::Stand);
        let usable = fx.spawn_cover(Vec3::new(0.0, -3.0, 0.0), Vec3::X, CoverSize::Crouch);

        assert!(fx.find(threat, 10.0));
        assert!(fx.occupied(usable));
        assert!(!fx.occupied(distant));
    }

    #[test]
    fn test_zero_radius_is_noop() {
        let mut fx = Fixture::new();
        fx.spawn_cover(Vec3::new(0.0, 2.0, 0.0), Vec3::X, CoverSize::Stand);
        assert!(!fx.find(Vec3::new(20.0, 0.0, 0.0), 0.0));
        assert!(!fx.find(Vec3::new(20.0, 0.0, 0.0), -5.0));
    }

    #[test]
    fn test_no_candidates_reports_failure() {
        let mut fx = Fixture::new();
        assert!(!fx.find(Vec3::new(20.0, 0.0, 0.0), 10.0));
    }

    #[test]
    fn test_new_search_releases_previous_claim() {
        let mut fx = Fixture::new();
        let threat = Vec3::new(20.0, 0.0, 0.0);
        let first = fx.spawn_cover(Vec3::new(0.0, 2.0, 0.0), Vec3::X, CoverSize::Stand);

        assert!(fx.find(threat, 10.0));
        assert!(fx.occupied(first));

        // A better point appears; the old claim is let go.
        let second = fx.spawn_cover(Vec3::new(1.0, 0.0, 0.0), Vec3::X, CoverSize::Stand);
        assert!(fx.find(threat, 10.0));
        assert!(fx.occupied(second));
        assert!(!fx.occupied(first));
    }

    #[test]
    fn test_clear_cover_releases_claim() {
        let mut fx = Fixture::new();
        let point = fx.spawn_cover(Vec3::new(0.0, 2.0, 0.0), Vec3::X, CoverSize::Stand);
        assert!(fx.find(Vec3::new(20.0, 0.0, 0.0), 10.0));
        assert!(fx.occupied(point));

        clear_cover(&mut fx.world, fx.agent);
        assert!(!fx.occupied(point));
        assert_eq!(
            fx.world
                .get::<&PathFollower>(fx.agent)
                .unwrap()
                .cover(),
            None
        );
    }

    #[test]
    fn test_quality_scales_score() {
        let mut fx = Fixture::new();
        let threat = Vec3::new(20.0, 0.0, 0.0);
        let shoddy = fx.spawn_cover(Vec3::new(0.0, 2.0, 0.0), Vec3::X, CoverSize::Stand);
        fx.world.get::<&mut CoverPoint>(shoddy).unwrap().quality = 0.1;
        let solid = fx.spawn_cover(Vec3::new(0.0, -2.0, 0.0), Vec3::X, CoverSize::Stand);

        assert!(fx.find(threat, 10.0));
        assert!(fx.occupied(solid));
        assert!(!fx.occupied(shoddy));
    }

    #[test]
    fn test_search_emits_no_spurious_events() {
        let mut fx = Fixture::new();
        fx.spawn_cover(Vec3::new(0.0, 2.0, 0.0), Vec3::X, CoverSize::Stand);
        assert!(fx.find(Vec3::new(20.0, 0.0, 0.0), 10.0));

        fx.events.swap();
        let events: Vec<NavEvent> = fx.events.drain().collect();
        assert!(events.is_empty(), "unexpected events: {events:?}");
    }
}
