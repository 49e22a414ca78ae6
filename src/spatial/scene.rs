//! rapier3d-backed static collision scene

use glam::Vec3;
use rapier3d::prelude::*;

use crate::geometry::GeometryCollector;
use crate::nav::{Aabb, coords};

use super::SpatialQuery;

/// Static world geometry queryable by navigation: ground, obstacles, and
/// baked walkable surfaces. Everything is fixed; there is no stepping.
pub struct SpatialScene {
    bodies: RigidBodySet,
    colliders: ColliderSet,
    query_pipeline: QueryPipeline,
}

impl SpatialScene {
    #[must_use]
    pub fn new() -> Self {
        Self {
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            query_pipeline: QueryPipeline::new(),
        }
    }

    /// A thin slab of ground at `height`, extending `half_extent` in X/Y.
    pub fn add_ground_plane(&mut self, height: f32, half_extent: f32) {
        let collider = ColliderBuilder::cuboid(half_extent, half_extent, 0.1)
            .translation(vector![0.0, 0.0, height - 0.1])
            .build();
        self.insert_static(collider);
    }

    /// A box obstacle occupying `bounds`.
    pub fn add_obstacle(&mut self, bounds: &Aabb) {
        let half = bounds.extents() * 0.5;
        let center = bounds.center();
        let collider = ColliderBuilder::cuboid(half.x, half.y, half.z)
            .translation(vector![center.x, center.y, center.z])
            .build();
        self.insert_static(collider);
    }

    /// Install collected walkable geometry as a static triangle mesh.
    /// Collector data is in the navigation frame; it is converted back to
    /// simulation space here. Returns false if the mesh was degenerate.
    pub fn add_baked_geometry(&mut self, collector: &GeometryCollector) -> bool {
        if collector.is_empty() {
            return false;
        }
        let vertices: Vec<Point<f32>> = collector
            .verts()
            .chunks_exact(3)
            .map(|v| {
                let p = coords::to_sim_space(Vec3::new(v[0], v[1], v[2]));
                point![p.x, p.y, p.z]
            })
            .collect();
        let indices: Vec<[u32; 3]> = collector
            .tris()
            .chunks_exact(3)
            .map(|t| [t[0] as u32, t[1] as u32, t[2] as u32])
            .collect();
        match ColliderBuilder::trimesh(vertices, indices) {
            Ok(builder) => {
                self.insert_static(builder.build());
                true
            }
            Err(e) => {
                log::warn!("baked geometry rejected as collision mesh: {e}");
                false
            }
        }
    }

    fn insert_static(&mut self, collider: Collider) {
        let body = self.bodies.insert(RigidBodyBuilder::fixed().build());
        self.colliders
            .insert_with_parent(collider, body, &mut self.bodies);
        self.query_pipeline.update(&self.colliders);
    }

    fn cast(&self, origin: Vec3, dir: Vec3, max_len: f32) -> bool {
        let ray = Ray::new(point![origin.x, origin.y, origin.z], vector![
            dir.x, dir.y, dir.z
        ]);
        self.query_pipeline
            .cast_ray(
                &self.bodies,
                &self.colliders,
                &ray,
                max_len,
                true,
                QueryFilter::default(),
            )
            .is_some()
    }
}

impl Default for SpatialScene {
    fn default() -> Self {
        Self::new()
    }
}

impl SpatialQuery for SpatialScene {
    fn ray_blocked(&self, from: Vec3, to: Vec3) -> bool {
        let delta = to - from;
        let len = delta.length();
        if len < 1e-6 {
            return false;
        }
        self.cast(from, delta / len, len)
    }

    fn grounded(&self, position: Vec3, depth: f32) -> bool {
        self.cast(position, Vec3::NEG_Z, depth)
    }
}
