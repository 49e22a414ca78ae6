//! Planned routes and the planner boundary
//!
//! The path planning algorithm itself is a black box behind [`PathPlanner`]:
//! given a mesh, a start, and a goal it either returns an ordered list of
//! waypoints or fails. The follower only ever consumes the result.

use std::sync::Arc;

use glam::Vec3;
use smallvec::SmallVec;

use super::{LinkTypes, MeshId, NavMeshRegistry};

/// An ordered sequence of world-space waypoints with per-segment traversal
/// flags. Immutable once planned; replanning produces a fresh path.
#[derive(Debug, Clone)]
pub struct NavPath {
    /// Waypoints in order, including the start node.
    pub nodes: SmallVec<[Vec3; 8]>,
    /// Traversal flags for the segment between node `i` and node `i + 1`;
    /// always one shorter than `nodes`.
    pub flags: SmallVec<[u16; 8]>,
    /// Wrap back to node 0 after the last node instead of ending.
    pub looping: bool,
    /// Position the plan started from.
    pub from: Vec3,
    /// Goal the plan was asked for.
    pub to: Vec3,
    /// Permissions the plan was filtered with.
    pub link_types: LinkTypes,
    /// Mesh the plan was computed against.
    pub mesh: MeshId,
}

impl NavPath {
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Index of the final node. Empty paths answer 0.
    #[must_use]
    pub fn last_index(&self) -> usize {
        self.nodes.len().saturating_sub(1)
    }

    #[must_use]
    pub fn node(&self, index: usize) -> Vec3 {
        self.nodes[index]
    }

    /// Flags of the segment ending at node `index + 1`. Out-of-range
    /// segments answer 0 (no requirements).
    #[must_use]
    pub fn segment_flags(&self, index: usize) -> u16 {
        self.flags.get(index).copied().unwrap_or(0)
    }
}

/// A planning request: connect `from` to `to` on `mesh`, using only links
/// permitted by `link_types`.
#[derive(Debug, Clone, Copy)]
pub struct PlanRequest {
    pub mesh: MeshId,
    pub from: Vec3,
    pub to: Vec3,
    pub link_types: LinkTypes,
}

/// The external path planning oracle.
///
/// Invoked synchronously from within a tick, and only on destination
/// changes, stuck recovery, or an explicit repath. `None` means the
/// endpoints cannot be connected.
pub trait PathPlanner {
    fn plan(&self, registry: &NavMeshRegistry, request: &PlanRequest) -> Option<NavPath>;
}

/// How a follower holds its current path.
///
/// Owned paths were planned for this agent: they are replanned in place and
/// destroyed when superseded. Shared paths belong to someone else (a
/// mission route used by many agents); the follower walks them but never
/// mutates or destroys them.
#[derive(Debug, Clone)]
pub enum PathBinding {
    Owned(NavPath),
    Shared(Arc<NavPath>),
}

impl PathBinding {
    #[must_use]
    pub fn path(&self) -> &NavPath {
        match self {
            PathBinding::Owned(path) => path,
            PathBinding::Shared(path) => path,
        }
    }

    #[must_use]
    pub fn is_owned(&self) -> bool {
        matches!(self, PathBinding::Owned(_))
    }
}

#[cfg(test)]
mod tests {
    use smallvec::smallvec;

    use super::*;
    use crate::nav::link_flags;

    fn sample_path() -> NavPath {
        NavPath {
            nodes: smallvec![
                Vec3::ZERO,
                Vec3::new(5.0, 0.0, 0.0),
                Vec3::new(5.0, 5.0, 0.0),
            ],
            flags: smallvec![link_flags::WALK, link_flags::WALK | link_flags::JUMP],
            looping: false,
            from: Vec3::ZERO,
            to: Vec3::new(5.0, 5.0, 0.0),
            link_types: LinkTypes::default(),
            mesh: {
                let mut registry = NavMeshRegistry::new();
                registry.register(crate::nav::NavMeshDesc::new(
                    "test",
                    crate::nav::Aabb::from_center_half_extents(Vec3::ZERO, Vec3::splat(10.0)),
                ))
            },
        }
    }

    #[test]
    fn test_path_accessors() {
        let path = sample_path();
        assert_eq!(path.len(), 3);
        assert_eq!(path.last_index(), 2);
        assert_eq!(path.node(1), Vec3::new(5.0, 0.0, 0.0));
        assert_eq!(path.segment_flags(0), link_flags::WALK);
        assert_ne!(path.segment_flags(1) & link_flags::JUMP, 0);
        // Past the end: no requirements rather than a panic.
        assert_eq!(path.segment_flags(7), 0);
    }

    #[test]
    fn test_binding_ownership() {
        let owned = PathBinding::Owned(sample_path());
        assert!(owned.is_owned());

        let shared = PathBinding::Shared(Arc::new(sample_path()));
        assert!(!shared.is_owned());
        assert_eq!(shared.path().len(), 3);
    }
}
