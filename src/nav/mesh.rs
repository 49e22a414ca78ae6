//! Navigation mesh registry and per-agent mesh selection
//!
//! Meshes are registered with world-space bounds and the set of agent
//! classes they were baked for. Selection picks the smallest mesh that
//! fully contains an agent; an agent keeps its mesh until its bounds leave
//! it, so the full scan only re-runs on containment violations.

use super::{Aabb, NavSize};

/// Identifier of a registered navigation mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeshId(u32);

/// A registered navigation mesh: its world bounds and the agent classes it
/// supports. The baked mesh data itself is owned by the planner.
#[derive(Debug, Clone)]
pub struct NavMeshDesc {
    /// Name for logging and tooling.
    pub name: String,
    /// World-space bounds the mesh was baked over.
    pub bounds: Aabb,
    /// Baked with vehicle dimensions; required by mounted agents.
    pub vehicles: bool,
    /// Supports small characters.
    pub small: bool,
    /// Supports regular characters.
    pub regular: bool,
    /// Supports large characters.
    pub large: bool,
}

impl NavMeshDesc {
    /// A mesh for regular characters only.
    #[must_use]
    pub fn new(name: impl Into<String>, bounds: Aabb) -> Self {
        Self {
            name: name.into(),
            bounds,
            vehicles: false,
            small: false,
            regular: true,
            large: false,
        }
    }

    /// True if an agent of the given class may use this mesh.
    #[must_use]
    pub fn supports(&self, size: NavSize, mounted: bool) -> bool {
        if mounted {
            return self.vehicles;
        }
        match size {
            NavSize::Small => self.small,
            NavSize::Regular => self.regular,
            NavSize::Large => self.large,
        }
    }
}

/// Process-wide set of navigation meshes with an explicit
/// register/unregister lifecycle.
///
/// Selection borrows the registry shared, so under the single tick thread a
/// scan always sees a consistent snapshot; registration happens between
/// ticks.
#[derive(Debug, Default)]
pub struct NavMeshRegistry {
    next_id: u32,
    meshes: Vec<(MeshId, NavMeshDesc)>,
}

impl NavMeshRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a mesh, returning its id. Meshes are scanned in
    /// registration order.
    pub fn register(&mut self, desc: NavMeshDesc) -> MeshId {
        let id = MeshId(self.next_id);
        self.next_id += 1;
        log::info!("registered navmesh '{}' as {:?}", desc.name, id);
        self.meshes.push((id, desc));
        id
    }

    /// Remove a mesh. Returns false if the id was already gone. Agents
    /// holding the id re-select on their next tick.
    pub fn unregister(&mut self, id: MeshId) -> bool {
        let before = self.meshes.len();
        self.meshes.retain(|(mid, _)| *mid != id);
        before != self.meshes.len()
    }

    #[must_use]
    pub fn get(&self, id: MeshId) -> Option<&NavMeshDesc> {
        self.meshes
            .iter()
            .find(|(mid, _)| *mid == id)
            .map(|(_, desc)| desc)
    }

    pub fn iter(&self) -> impl Iterator<Item = (MeshId, &NavMeshDesc)> {
        self.meshes.iter().map(|(id, desc)| (*id, desc))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }

    /// Full scan: the smallest mesh that entirely contains `agent_bounds`
    /// and supports the agent's class. Ties on volume keep the mesh
    /// registered first, so results are deterministic.
    #[must_use]
    pub fn select(&self, agent_bounds: &Aabb, size: NavSize, mounted: bool) -> Option<MeshId> {
        let mut best: Option<(MeshId, f32)> = None;
        for (id, desc) in self.iter() {
            if !desc.bounds.contains(agent_bounds) || !desc.supports(size, mounted) {
                continue;
            }
            let volume = desc.bounds.volume();
            if best.is_none_or(|(_, best_volume)| volume < best_volume) {
                best = Some((id, volume));
            }
        }
        best.map(|(id, _)| id)
    }

    /// Incremental selection: keep `current` while it still contains the
    /// agent, rescanning only when containment is violated or the mesh was
    /// unregistered.
    #[must_use]
    pub fn update(
        &self,
        current: Option<MeshId>,
        agent_bounds: &Aabb,
        size: NavSize,
        mounted: bool,
    ) -> Option<MeshId> {
        if let Some(id) = current {
            if let Some(desc) = self.get(id) {
                if desc.bounds.contains(agent_bounds) {
                    return current;
                }
            }
        }
        self.select(agent_bounds, size, mounted)
    }
}
