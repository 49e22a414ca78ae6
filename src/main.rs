//! Example simulation demonstrating the navigation stack end to end

use wayfinder::hecs::{self, Entity};
use wayfinder::prelude::*;

/// Fixed simulation step.
const TICK: f32 = 1.0 / 32.0;

/// World units per second at full throttle.
const BASE_SPEED: f32 = 4.0;

struct Demo {
    world: hecs::World,
    registry: NavMeshRegistry,
    planner: GridPlanner,
    scene: SpatialScene,
    events: NavEventQueue,
}

impl Demo {
    fn new() -> Self {
        log::info!("Setting up demo arena");

        // Collect the walkable geometry a baking pass would consume.
        let region = Aabb::new(Vec3::new(-20.0, -20.0, -1.0), Vec3::new(20.0, 20.0, 6.0));
        let mut collector = GeometryCollector::new();
        if let Err(e) = GroundPlaneSource::new(0.0).build(&region, &mut collector) {
            log::error!("ground plane collection failed: {e}");
        }
        let platform = BoxSource::new(Aabb::new(
            Vec3::new(10.0, 10.0, 0.0),
            Vec3::new(16.0, 16.0, 2.0),
        ));
        if let Err(e) = platform.build(&region, &mut collector) {
            log::error!("platform collection failed: {e}");
        }
        log::info!(
            "collected {} vertices / {} triangles for baking",
            collector.vert_count(),
            collector.tri_count()
        );

        // The same geometry backs line-of-sight and ground probes.
        let mut scene = SpatialScene::new();
        scene.add_baked_geometry(&collector);
        let wall = Aabb::new(Vec3::new(-1.0, -8.0, 0.0), Vec3::new(1.0, 8.0, 3.0));
        scene.add_obstacle(&wall);

        // Two meshes: the whole arena, and a tighter courtyard that small
        // characters prefer while they are inside it.
        let mut registry = NavMeshRegistry::new();
        let mut arena = NavMeshDesc::new("arena", region);
        arena.small = true;
        arena.large = true;
        registry.register(arena);
        let mut courtyard = NavMeshDesc::new(
            "courtyard",
            Aabb::new(Vec3::new(-20.0, -20.0, -1.0), Vec3::new(0.0, 0.0, 6.0)),
        );
        courtyard.small = true;
        registry.register(courtyard);

        // Planner grid with the wall carved out.
        let mut grid = NavGrid::new(40, 40, 1.0);
        grid.origin = Vec2::new(-20.0, -20.0);
        for y in 12..28 {
            grid.set_walkable(19, y, false);
            grid.set_walkable(20, y, false);
        }
        let planner = GridPlanner::new(grid);

        Self {
            world: hecs::World::new(),
            registry,
            planner,
            scene,
            events: NavEventQueue::new(),
        }
    }

    fn spawn_agent(&mut self, name: &str, position: Vec3, profile: &AgentProfile) -> Entity {
        let pose = Pose::new(position);
        let mut nav = NavAgent::default();
        let mut follower = PathFollower::new(&pose);
        profile.apply(&mut nav, &mut follower);
        let agent = self.world.spawn((pose, nav, follower));
        log::info!("spawned '{name}' ({agent:?}) at {position:?}");
        agent
    }

    fn order_move(&mut self, agent: Entity, goal: Vec3) {
        let mut ctx = NavContext {
            registry: &self.registry,
            planner: &self.planner,
            spatial: &self.scene,
            events: &mut self.events,
        };
        let Ok(pose) = self.world.get::<&Pose>(agent) else {
            return;
        };
        let Ok(nav) = self.world.get::<&NavAgent>(agent) else {
            return;
        };
        let Ok(mut follower) = self.world.get::<&mut PathFollower>(agent) else {
            return;
        };
        if follower.set_path_destination(agent, goal, &pose, &nav, &mut ctx) {
            log::info!("{agent:?} heading for {goal:?}");
        } else {
            log::warn!("{agent:?} could not plan to {goal:?}");
        }
    }

    fn step(&mut self) -> bool {
        let mut ctx = NavContext {
            registry: &self.registry,
            planner: &self.planner,
            spatial: &self.scene,
            events: &mut self.events,
        };
        let commands = navigation_tick(&mut self.world, &mut ctx);

        let mut moving = false;
        for (entity, mv) in &commands {
            if let Ok(mut pose) = self.world.get::<&mut Pose>(*entity) {
                pose.yaw += mv.yaw;
                pose.head_pitch += mv.pitch;
                // Local command back into world space, then integrate.
                let world_dir = Vec2::from_angle(-pose.yaw).rotate(Vec2::new(mv.x, mv.y));
                pose.position += Vec3::new(world_dir.x, world_dir.y, 0.0) * BASE_SPEED * TICK;
                moving |= world_dir.length_squared() > 1e-6;
                if mv.jump() {
                    log::info!("{entity:?} jumps");
                }
            }
        }

        self.events.swap();
        for event in self.events.drain() {
            log::info!("event: {event:?}");
        }

        moving
    }
}

fn main() {
    env_logger::init();

    let mut demo = Demo::new();

    let scout = AgentProfile {
        name: String::from("scout"),
        size: NavSize::Small,
        allow_jump: true,
        allow_ledge: true,
        ..AgentProfile::default()
    };
    let walker = AgentProfile::default();

    let a = demo.spawn_agent("scout", Vec3::new(-15.0, -15.0, 0.0), &scout);
    let b = demo.spawn_agent("walker", Vec3::new(-10.0, 5.0, 0.0), &walker);

    demo.order_move(a, Vec3::new(15.0, 15.0, 0.0));
    demo.order_move(b, Vec3::new(12.0, -12.0, 0.0));

    // The walker spots trouble and hunts for cover from it.
    let threat = Vec3::new(18.0, 0.0, 0.0);
    for offset in [
        Vec3::new(-6.0, 2.0, 0.0),
        Vec3::new(-4.0, -3.0, 0.0),
        Vec3::new(-8.0, 6.0, 0.0),
    ] {
        demo.world.spawn((
            Pose::new(Vec3::new(-10.0, 5.0, 0.0) + offset),
            CoverPoint::new(Vec3::X, CoverSize::Crouch),
        ));
    }
    {
        let mut ctx = NavContext {
            registry: &demo.registry,
            planner: &demo.planner,
            spatial: &demo.scene,
            events: &mut demo.events,
        };
        if find_cover(&mut demo.world, b, threat, 12.0, &mut ctx) {
            log::info!("{b:?} found cover from {threat:?}");
        }
    }

    let mut ticks = 0;
    loop {
        ticks += 1;
        let moving = demo.step();
        if !moving || ticks >= 2000 {
            break;
        }
    }
    log::info!("simulation settled after {ticks} ticks");
}
