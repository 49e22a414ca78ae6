//! Navigation mesh selection, path plans, and shared navigation types
//!
//! Everything here is simulation-space unless noted otherwise; conversions
//! to the navigation library's frame live in [`coords`].

mod mesh;
mod path;
mod planner;

pub mod coords;

pub use mesh::{MeshId, NavMeshDesc, NavMeshRegistry};
pub use path::{NavPath, PathBinding, PathPlanner, PlanRequest};
pub use planner::{GridPlanner, NavGrid};

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Traversal requirement bits attached to path segments.
///
/// A segment's flags describe what an agent must be able to do to cross it;
/// an agent's [`LinkTypes`] describe what it is allowed to do.
pub mod link_flags {
    /// Walking on dry land.
    pub const WALK: u16 = 1 << 0;
    /// Moving through water.
    pub const SWIM: u16 = 1 << 1;
    /// An immediate jump at the start of the segment.
    pub const JUMP: u16 = 1 << 2;
    /// A jump off a ledge partway through the segment.
    pub const LEDGE: u16 = 1 << 3;
    /// A drop from a height.
    pub const DROP: u16 = 1 << 4;
    /// A climbable surface.
    pub const CLIMB: u16 = 1 << 5;
    /// A teleporter link.
    pub const TELEPORT: u16 = 1 << 6;
    /// Every traversal type.
    pub const ALL: u16 = 0xffff;
}

/// Per-agent traversal permissions, read by the planner when filtering
/// which links a path may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkTypes {
    pub walk: bool,
    pub jump: bool,
    pub drop: bool,
    pub swim: bool,
    pub ledge: bool,
    pub climb: bool,
    pub teleport: bool,
}

impl LinkTypes {
    /// Decode permissions from a [`link_flags`] bitmask.
    #[must_use]
    pub fn from_flags(flags: u16) -> Self {
        Self {
            walk: flags & link_flags::WALK != 0,
            jump: flags & link_flags::JUMP != 0,
            drop: flags & link_flags::DROP != 0,
            swim: flags & link_flags::SWIM != 0,
            ledge: flags & link_flags::LEDGE != 0,
            climb: flags & link_flags::CLIMB != 0,
            teleport: flags & link_flags::TELEPORT != 0,
        }
    }

    /// Encode permissions as a [`link_flags`] bitmask.
    #[must_use]
    pub fn flags(&self) -> u16 {
        let mut flags = 0;
        if self.walk {
            flags |= link_flags::WALK;
        }
        if self.jump {
            flags |= link_flags::JUMP;
        }
        if self.drop {
            flags |= link_flags::DROP;
        }
        if self.swim {
            flags |= link_flags::SWIM;
        }
        if self.ledge {
            flags |= link_flags::LEDGE;
        }
        if self.climb {
            flags |= link_flags::CLIMB;
        }
        if self.teleport {
            flags |= link_flags::TELEPORT;
        }
        flags
    }

    /// True if this agent may cross a segment requiring `flags`.
    #[must_use]
    pub fn permits(&self, flags: u16) -> bool {
        flags & !self.flags() == 0
    }
}

impl Default for LinkTypes {
    /// Ground-dwelling default: walking only.
    fn default() -> Self {
        Self::from_flags(link_flags::WALK)
    }
}

/// Size class of an agent, matched against the classes a mesh was baked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NavSize {
    Small,
    #[default]
    Regular,
    Large,
}

/// Axis-aligned bounding box in world space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    #[must_use]
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self {
            min: min.min(max),
            max: min.max(max),
        }
    }

    #[must_use]
    pub fn from_center_half_extents(center: Vec3, half_extents: Vec3) -> Self {
        Self {
            min: center - half_extents,
            max: center + half_extents,
        }
    }

    #[must_use]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    #[must_use]
    pub fn extents(&self) -> Vec3 {
        self.max - self.min
    }

    #[must_use]
    pub fn volume(&self) -> f32 {
        let e = self.extents();
        e.x * e.y * e.z
    }

    /// True if `other` lies entirely inside this box.
    #[must_use]
    pub fn contains(&self, other: &Aabb) -> bool {
        self.min.cmple(other.min).all() && self.max.cmpge(other.max).all()
    }

    #[must_use]
    pub fn contains_point(&self, p: Vec3) -> bool {
        self.min.cmple(p).all() && self.max.cmpge(p).all()
    }

    /// Overlapping region of two boxes, or `None` if they are disjoint.
    #[must_use]
    pub fn intersection(&self, other: &Aabb) -> Option<Aabb> {
        let min = self.min.max(other.min);
        let max = self.max.min(other.max);
        if min.cmplt(max).all() {
            Some(Aabb { min, max })
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_types_round_trip() {
        let flags = link_flags::WALK | link_flags::LEDGE | link_flags::TELEPORT;
        let types = LinkTypes::from_flags(flags);
        assert!(types.walk);
        assert!(types.ledge);
        assert!(types.teleport);
        assert!(!types.swim);
        assert_eq!(types.flags(), flags);
    }

    #[test]
    fn test_link_types_permits() {
        let walker = LinkTypes::default();
        assert!(walker.permits(link_flags::WALK));
        assert!(!walker.permits(link_flags::WALK | link_flags::JUMP));

        let anything = LinkTypes::from_flags(link_flags::ALL);
        assert!(anything.permits(link_flags::LEDGE | link_flags::SWIM));
    }

    #[test]
    fn test_aabb_contains() {
        let outer = Aabb::new(Vec3::ZERO, Vec3::splat(10.0));
        let inner = Aabb::new(Vec3::splat(2.0), Vec3::splat(4.0));
        assert!(outer.contains(&inner));
        assert!(!inner.contains(&outer));

        let poking_out = Aabb::new(Vec3::splat(8.0), Vec3::splat(12.0));
        assert!(!outer.contains(&poking_out));
    }

    #[test]
    fn test_aabb_volume_and_intersection() {
        let a = Aabb::new(Vec3::ZERO, Vec3::new(2.0, 3.0, 4.0));
        assert!((a.volume() - 24.0).abs() < f32::EPSILON);

        let b = Aabb::new(Vec3::splat(1.0), Vec3::splat(5.0));
        let overlap = a.intersection(&b).unwrap();
        assert_eq!(overlap.min, Vec3::splat(1.0));
        assert_eq!(overlap.max, Vec3::new(2.0, 3.0, 4.0));

        let far = Aabb::new(Vec3::splat(20.0), Vec3::splat(21.0));
        assert!(a.intersection(&far).is_none());
    }

    #[test]
    fn test_aabb_new_sorts_corners() {
        let b = Aabb::new(Vec3::new(5.0, -1.0, 3.0), Vec3::new(1.0, 2.0, -3.0));
        assert_eq!(b.min, Vec3::new(1.0, -1.0, -3.0));
        assert_eq!(b.max, Vec3::new(5.0, 2.0, 3.0));
    }
}
