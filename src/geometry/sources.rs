//! Geometry sources that feed walkable surfaces into a collector

use glam::Vec3;

use crate::nav::Aabb;

use super::{CollectorError, GeometryCollector, Plane};

/// Anything that can contribute walkable geometry to a baking pass.
///
/// Sources clip themselves to the queried region; a region that misses the
/// source entirely contributes nothing. Quads and larger polygons are
/// pre-triangulated here, since the collector only accepts triangles.
pub trait GeometrySource {
    fn build(&self, region: &Aabb, out: &mut GeometryCollector) -> Result<(), CollectorError>;
}

/// An infinite horizontal plane at a fixed height. Emits the part of itself
/// covered by the queried region as a single quad (two triangles).
#[derive(Debug, Clone, Copy)]
pub struct GroundPlaneSource {
    /// Height of the walkable surface.
    pub height: f32,
}

impl GroundPlaneSource {
    #[must_use]
    pub fn new(height: f32) -> Self {
        Self { height }
    }
}

impl GeometrySource for GroundPlaneSource {
    fn build(&self, region: &Aabb, out: &mut GeometryCollector) -> Result<(), CollectorError> {
        if region.min.z > self.height || region.max.z < self.height {
            return Ok(());
        }
        emit_quad(
            out,
            [
                Vec3::new(region.min.x, region.max.y, self.height),
                Vec3::new(region.max.x, region.max.y, self.height),
                Vec3::new(region.max.x, region.min.y, self.height),
                Vec3::new(region.min.x, region.min.y, self.height),
            ],
        )?;
        out.add_plane(Plane::new(Vec3::Z, -self.height))?;
        Ok(())
    }
}

/// An axis-aligned box whose top face is walkable (a platform or roof).
#[derive(Debug, Clone, Copy)]
pub struct BoxSource {
    pub bounds: Aabb,
}

impl BoxSource {
    #[must_use]
    pub fn new(bounds: Aabb) -> Self {
        Self { bounds }
    }
}

impl GeometrySource for BoxSource {
    fn build(&self, region: &Aabb, out: &mut GeometryCollector) -> Result<(), CollectorError> {
        let Some(overlap) = self.bounds.intersection(region) else {
            return Ok(());
        };
        let top = self.bounds.max.z;
        if region.max.z < top {
            return Ok(());
        }
        emit_quad(
            out,
            [
                Vec3::new(overlap.min.x, overlap.max.y, top),
                Vec3::new(overlap.max.x, overlap.max.y, top),
                Vec3::new(overlap.max.x, overlap.min.y, top),
                Vec3::new(overlap.min.x, overlap.min.y, top),
            ],
        )
    }
}

/// Two triangles covering the quad `corners[0..4]`, wound consistently.
fn emit_quad(out: &mut GeometryCollector, corners: [Vec3; 4]) -> Result<(), CollectorError> {
    let v0 = out.add_point(corners[0])?;
    out.add_point(corners[1])?;
    out.add_point(corners[2])?;
    out.add_point(corners[3])?;

    out.begin(None, 0)?;
    out.vertex(v0);
    out.vertex(v0 + 1);
    out.vertex(v0 + 2);
    out.end();

    out.begin(None, 1)?;
    out.vertex(v0 + 2);
    out.vertex(v0 + 3);
    out.vertex(v0);
    out.end();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region() -> Aabb {
        Aabb::new(Vec3::new(-4.0, -4.0, -1.0), Vec3::new(4.0, 4.0, 5.0))
    }

    #[test]
    fn test_ground_plane_emits_clipped_quad() {
        let mut c = GeometryCollector::new();
        GroundPlaneSource::new(0.0).build(&region(), &mut c).unwrap();

        assert_eq!(c.vert_count(), 4);
        assert_eq!(c.tri_count(), 2);
        assert_eq!(c.planes().len(), 1);
        // All emitted heights sit on the plane (nav-frame Y is sim-frame Z).
        for v in c.verts().chunks(3) {
            assert!((v[1] - 0.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_ground_plane_outside_region_is_empty() {
        let mut c = GeometryCollector::new();
        GroundPlaneSource::new(50.0)
            .build(&region(), &mut c)
            .unwrap();
        assert!(c.is_empty());
        assert_eq!(c.vert_count(), 0);
    }

    #[test]
    fn test_box_source_clips_to_region() {
        let mut c = GeometryCollector::new();
        let platform = BoxSource::new(Aabb::new(
            Vec3::new(2.0, 2.0, 0.0),
            Vec3::new(10.0, 10.0, 1.0),
        ));
        platform.build(&region(), &mut c).unwrap();

        assert_eq!(c.tri_count(), 2);
        // Clipped to the region's max corner: no x beyond 4 in nav frame.
        for v in c.verts().chunks(3) {
            assert!(v[0] <= 4.0 + 1e-6);
        }
    }

    #[test]
    fn test_box_source_disjoint_is_empty() {
        let mut c = GeometryCollector::new();
        let far = BoxSource::new(Aabb::new(Vec3::splat(100.0), Vec3::splat(101.0)));
        far.build(&region(), &mut c).unwrap();
        assert!(c.is_empty());
    }
}
