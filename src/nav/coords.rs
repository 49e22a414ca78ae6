//! Conversions between the simulation frame and the navigation frame
//!
//! The simulation is right-handed Z-up; the navigation library that consumes
//! collected geometry is right-handed Y-up. Both directions are a pure axis
//! permutation (swap Y and Z, negate one axis), so the mapping is exact and
//! `to_sim_space(to_nav_space(p)) == p` for all finite points.

use glam::Vec3;

use super::Aabb;

/// Simulation space (Z-up) to navigation space (Y-up).
#[inline]
#[must_use]
pub fn to_nav_space(p: Vec3) -> Vec3 {
    Vec3::new(p.x, p.z, -p.y)
}

/// Navigation space (Y-up) to simulation space (Z-up). Exact inverse of
/// [`to_nav_space`].
#[inline]
#[must_use]
pub fn to_sim_space(p: Vec3) -> Vec3 {
    Vec3::new(p.x, -p.z, p.y)
}

/// Convert a bounding box to navigation space.
///
/// The negated axis swaps the roles of the two extrema, so the result is
/// re-sorted per component rather than permuted blindly.
#[must_use]
pub fn aabb_to_nav_space(b: &Aabb) -> Aabb {
    let lo = to_nav_space(b.min);
    let hi = to_nav_space(b.max);
    Aabb {
        min: lo.min(hi),
        max: lo.max(hi),
    }
}

/// Convert a bounding box back to simulation space.
#[must_use]
pub fn aabb_to_sim_space(b: &Aabb) -> Aabb {
    let lo = to_sim_space(b.min);
    let hi = to_sim_space(b.max);
    Aabb {
        min: lo.min(hi),
        max: lo.max(hi),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_round_trip() {
        let points = [
            Vec3::ZERO,
            Vec3::new(1.0, 2.0, 3.0),
            Vec3::new(-4.5, 0.25, -1000.0),
            Vec3::new(f32::MIN_POSITIVE, -0.0, 1e30),
        ];
        for p in points {
            let there_and_back = to_sim_space(to_nav_space(p));
            assert!((there_and_back - p).length() < 1e-6, "failed for {p:?}");
            let other_way = to_nav_space(to_sim_space(p));
            assert!((other_way - p).length() < 1e-6, "failed for {p:?}");
        }
    }

    #[test]
    fn test_known_mapping() {
        // Up in the simulation (Z) becomes up in navigation space (Y).
        assert_eq!(to_nav_space(Vec3::Z), Vec3::Y);
        // Forward in the simulation (Y) maps onto negative nav Z.
        assert_eq!(to_nav_space(Vec3::Y), Vec3::NEG_Z);
        assert_eq!(to_nav_space(Vec3::X), Vec3::X);
    }

    #[test]
    fn test_aabb_round_trip_and_ordering() {
        let b = Aabb::new(Vec3::new(-1.0, 2.0, -3.0), Vec3::new(4.0, 5.0, 6.0));
        let nav = aabb_to_nav_space(&b);
        // Extrema must stay ordered after the negated axis flips them.
        assert!(nav.min.cmple(nav.max).all());

        let back = aabb_to_sim_space(&nav);
        assert!((back.min - b.min).length() < 1e-6);
        assert!((back.max - b.max).length() < 1e-6);
    }
}
