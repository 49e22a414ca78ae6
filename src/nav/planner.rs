//! A*-on-grid reference planner
//!
//! Stands in for a full navigation-mesh planner behind the [`PathPlanner`]
//! boundary: walkable cells on the ground plane, 4-connected A*, collinear
//! waypoint merging. Good enough to drive agents in the demo and in tests.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use glam::{Vec2, Vec3};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use super::{NavMeshRegistry, NavPath, PathPlanner, PlanRequest, link_flags};

/// Walkable-cell grid over the ground plane (simulation X/Y).
#[derive(Debug, Clone)]
pub struct NavGrid {
    /// Width in cells
    pub width: usize,
    /// Height in cells
    pub height: usize,
    /// Cell size in world units
    pub cell_size: f32,
    /// World origin of cell (0, 0)
    pub origin: Vec2,
    /// Ground height assigned to produced waypoints
    pub floor: f32,
    cells: Vec<bool>,
}

impl NavGrid {
    /// All cells walkable.
    #[must_use]
    pub fn new(width: usize, height: usize, cell_size: f32) -> Self {
        Self {
            width,
            height,
            cell_size,
            origin: Vec2::ZERO,
            floor: 0.0,
            cells: vec![true; width * height],
        }
    }

    pub fn set_walkable(&mut self, x: usize, y: usize, walkable: bool) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = walkable;
        }
    }

    #[must_use]
    pub fn is_walkable(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height && self.cells[y * self.width + x]
    }

    fn world_to_cell(&self, p: Vec3) -> (i32, i32) {
        let local = Vec2::new(p.x, p.y) - self.origin;
        (
            (local.x / self.cell_size).floor() as i32,
            (local.y / self.cell_size).floor() as i32,
        )
    }

    fn cell_to_world(&self, x: usize, y: usize) -> Vec3 {
        let center = self.origin
            + Vec2::new(
                (x as f32 + 0.5) * self.cell_size,
                (y as f32 + 0.5) * self.cell_size,
            );
        Vec3::new(center.x, center.y, self.floor)
    }

    fn neighbors(&self, x: usize, y: usize) -> SmallVec<[(usize, usize); 4]> {
        let mut result = SmallVec::new();
        if x > 0 && self.is_walkable(x - 1, y) {
            result.push((x - 1, y));
        }
        if x + 1 < self.width && self.is_walkable(x + 1, y) {
            result.push((x + 1, y));
        }
        if y > 0 && self.is_walkable(x, y - 1) {
            result.push((x, y - 1));
        }
        if y + 1 < self.height && self.is_walkable(x, y + 1) {
            result.push((x, y + 1));
        }
        result
    }
}

/// Open-set entry, ordered for a min-heap on f-cost.
#[derive(Debug, Clone, Copy)]
struct OpenNode {
    x: usize,
    y: usize,
    f_cost: f32,
}

impl PartialEq for OpenNode {
    fn eq(&self, other: &Self) -> bool {
        self.x == other.x && self.y == other.y
    }
}

impl Eq for OpenNode {}

impl Ord for OpenNode {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .f_cost
            .partial_cmp(&self.f_cost)
            .unwrap_or(Ordering::Equal)
    }
}

impl PartialOrd for OpenNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Planner that runs A* over a [`NavGrid`].
#[derive(Debug, Clone)]
pub struct GridPlanner {
    grid: NavGrid,
}

impl GridPlanner {
    #[must_use]
    pub fn new(grid: NavGrid) -> Self {
        Self { grid }
    }

    #[must_use]
    pub fn grid(&self) -> &NavGrid {
        &self.grid
    }

    pub fn grid_mut(&mut self) -> &mut NavGrid {
        &mut self.grid
    }

    fn search(&self, start: (usize, usize), goal: (usize, usize)) -> Option<Vec<(usize, usize)>> {
        let mut open = BinaryHeap::new();
        let mut came_from: FxHashMap<(usize, usize), (usize, usize)> = FxHashMap::default();
        let mut g_score: FxHashMap<(usize, usize), f32> = FxHashMap::default();

        let heuristic = |x: usize, y: usize| -> f32 {
            (x as f32 - goal.0 as f32).abs() + (y as f32 - goal.1 as f32).abs()
        };

        g_score.insert(start, 0.0);
        open.push(OpenNode {
            x: start.0,
            y: start.1,
            f_cost: heuristic(start.0, start.1),
        });

        while let Some(current) = open.pop() {
            if (current.x, current.y) == goal {
                let mut cells = vec![goal];
                let mut cursor = goal;
                while let Some(&prev) = came_from.get(&cursor) {
                    cells.push(prev);
                    cursor = prev;
                }
                cells.reverse();
                return Some(cells);
            }

            let current_g = g_score
                .get(&(current.x, current.y))
                .copied()
                .unwrap_or(f32::MAX);
            for (nx, ny) in self.grid.neighbors(current.x, current.y) {
                let tentative = current_g + 1.0;
                if tentative < g_score.get(&(nx, ny)).copied().unwrap_or(f32::MAX) {
                    came_from.insert((nx, ny), (current.x, current.y));
                    g_score.insert((nx, ny), tentative);
                    open.push(OpenNode {
                        x: nx,
                        y: ny,
                        f_cost: tentative + heuristic(nx, ny),
                    });
                }
            }
        }

        None
    }
}

/// Drop interior cells of straight runs so followers get one waypoint per
/// turn instead of one per cell.
fn merge_collinear(cells: &[(usize, usize)]) -> Vec<(usize, usize)> {
    let mut merged: Vec<(usize, usize)> = Vec::with_capacity(cells.len());
    for (i, &cell) in cells.iter().enumerate() {
        if i == 0 || i + 1 == cells.len() {
            merged.push(cell);
            continue;
        }
        let prev = cells[i - 1];
        let next = cells[i + 1];
        let into = (
            cell.0 as i64 - prev.0 as i64,
            cell.1 as i64 - prev.1 as i64,
        );
        let out = (
            next.0 as i64 - cell.0 as i64,
            next.1 as i64 - cell.1 as i64,
        );
        if into != out {
            merged.push(cell);
        }
    }
    merged
}

impl PathPlanner for GridPlanner {
    fn plan(&self, _registry: &NavMeshRegistry, request: &PlanRequest) -> Option<NavPath> {
        // Everything this planner produces is ground movement.
        if !request.link_types.walk {
            log::debug!("grid planner refused request: walking not permitted");
            return None;
        }

        let start = self.grid.world_to_cell(request.from);
        let goal = self.grid.world_to_cell(request.to);
        if start.0 < 0 || start.1 < 0 || goal.0 < 0 || goal.1 < 0 {
            return None;
        }
        let start = (start.0 as usize, start.1 as usize);
        let goal = (goal.0 as usize, goal.1 as usize);
        if !self.grid.is_walkable(start.0, start.1) || !self.grid.is_walkable(goal.0, goal.1) {
            return None;
        }

        let cells = self.search(start, goal)?;
        let cells = merge_collinear(&cells);

        let nodes: SmallVec<[Vec3; 8]> = cells
            .iter()
            .map(|&(x, y)| self.grid.cell_to_world(x, y))
            .collect();
        let segments = nodes.len().saturating_sub(1);
        Some(NavPath {
            nodes,
            flags: std::iter::repeat_n(link_flags::WALK, segments).collect(),
            looping: false,
            from: request.from,
            to: request.to,
            link_types: request.link_types,
            mesh: request.mesh,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nav::{Aabb, LinkTypes, NavMeshDesc};

    fn setup() -> (NavMeshRegistry, crate::nav::MeshId) {
        let mut registry = NavMeshRegistry::new();
        let id = registry.register(NavMeshDesc::new(
            "grid",
            Aabb::new(Vec3::ZERO, Vec3::new(10.0, 10.0, 2.0)),
        ));
        (registry, id)
    }

    fn request(mesh: crate::nav::MeshId, from: Vec3, to: Vec3) -> PlanRequest {
        PlanRequest {
            mesh,
            from,
            to,
            link_types: LinkTypes::default(),
        }
    }

    #[test]
    fn test_plan_routes_around_wall() {
        let mut grid = NavGrid::new(10, 10, 1.0);
        for y in 2..8 {
            grid.set_walkable(5, y, false);
        }
        let planner = GridPlanner::new(grid);
        let (registry, mesh) = setup();

        let path = planner
            .plan(
                &registry,
                &request(mesh, Vec3::new(2.5, 5.5, 0.0), Vec3::new(8.5, 5.5, 0.0)),
            )
            .unwrap();

        // Must detour: more than just start and goal survive merging.
        assert!(path.len() > 2);
        assert_eq!(path.flags.len(), path.len() - 1);
        assert!(path.flags.iter().all(|&f| f == link_flags::WALK));
    }

    #[test]
    fn test_plan_straight_line_merges_to_endpoints() {
        let grid = NavGrid::new(10, 10, 1.0);
        let planner = GridPlanner::new(grid);
        let (registry, mesh) = setup();

        let path = planner
            .plan(
                &registry,
                &request(mesh, Vec3::new(0.5, 0.5, 0.0), Vec3::new(7.5, 0.5, 0.0)),
            )
            .unwrap();

        // A straight corridor collapses to its two ends.
        assert_eq!(path.len(), 2);
    }

    #[test]
    fn test_plan_fails_when_goal_sealed() {
        let mut grid = NavGrid::new(5, 5, 1.0);
        grid.set_walkable(3, 2, false);
        grid.set_walkable(3, 4, false);
        grid.set_walkable(2, 3, false);
        grid.set_walkable(4, 3, false);
        let planner = GridPlanner::new(grid);
        let (registry, mesh) = setup();

        let path = planner.plan(
            &registry,
            &request(mesh, Vec3::new(0.5, 0.5, 0.0), Vec3::new(3.5, 3.5, 0.0)),
        );
        assert!(path.is_none());
    }

    #[test]
    fn test_plan_honours_link_permissions() {
        let planner = GridPlanner::new(NavGrid::new(4, 4, 1.0));
        let (registry, mesh) = setup();

        let mut req = request(mesh, Vec3::new(0.5, 0.5, 0.0), Vec3::new(2.5, 0.5, 0.0));
        req.link_types = LinkTypes::from_flags(0);
        assert!(planner.plan(&registry, &req).is_none());
    }

    #[test]
    fn test_plan_out_of_bounds_fails() {
        let planner = GridPlanner::new(NavGrid::new(4, 4, 1.0));
        let (registry, mesh) = setup();

        let path = planner.plan(
            &registry,
            &request(mesh, Vec3::new(-3.0, 0.5, 0.0), Vec3::new(2.5, 0.5, 0.0)),
        );
        assert!(path.is_none());
    }
}
