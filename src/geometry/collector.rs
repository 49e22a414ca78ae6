//! Growable vertex/triangle buffers with a begin/vertex/end build protocol

use std::collections::TryReserveError;
use std::fmt;

use glam::{Mat4, Vec3};

use crate::nav::coords;

/// Buffers start at 16 elements and double from there.
const INITIAL_CAPACITY: usize = 16;

/// Errors from feeding a collector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectorError {
    /// Growing a buffer failed. Previously collected data is untouched and
    /// remains valid.
    AllocationFailed,
}

impl fmt::Display for CollectorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AllocationFailed => write!(f, "geometry buffer allocation failed"),
        }
    }
}

impl std::error::Error for CollectorError {}

impl From<TryReserveError> for CollectorError {
    fn from(_: TryReserveError) -> Self {
        Self::AllocationFailed
    }
}

/// A supporting plane in normal/distance form. Auxiliary data alongside the
/// triangle soup; some baking consumers ignore it entirely.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    pub normal: Vec3,
    pub d: f32,
}

impl Plane {
    #[must_use]
    pub fn new(normal: Vec3, d: f32) -> Self {
        Self { normal, d }
    }
}

/// Collects points and triangles from geometry sources into flat arrays
/// shaped for navigation mesh baking.
///
/// Vertices are transformed into the collector's local space and permuted
/// into the navigation frame as they are inserted, so readers never pay a
/// conversion. Triangles are built one at a time: `begin`, exactly three
/// `vertex` calls, `end`. The three indices land in reverse submission
/// order, flipping the winding the way the baking consumer expects.
///
/// Buffer capacity doubles on demand; growth never invalidates previously
/// returned indices, and a failed growth leaves all existing data intact.
#[derive(Debug, Default)]
pub struct GeometryCollector {
    verts: Vec<f32>,
    vert_cap: usize,
    tris: Vec<i32>,
    tri_cap: usize,
    planes: Vec<Plane>,
    transform: Mat4,
    current: [i32; 3],
    slot: usize,
    active: bool,
}

impl GeometryCollector {
    #[must_use]
    pub fn new() -> Self {
        Self {
            transform: Mat4::IDENTITY,
            ..Default::default()
        }
    }

    /// Collector that transforms every incoming point by `transform` before
    /// the frame permutation.
    #[must_use]
    pub fn with_transform(transform: Mat4) -> Self {
        Self {
            transform,
            ..Default::default()
        }
    }

    pub fn set_transform(&mut self, transform: Mat4) {
        self.transform = transform;
    }

    /// Append a point, growing the vertex buffer if needed. Returns the
    /// index the point was assigned; the index stays valid for the lifetime
    /// of the collected data.
    pub fn add_point(&mut self, p: Vec3) -> Result<u32, CollectorError> {
        if self.vert_count() as usize == self.vert_cap {
            let cap = grown(self.vert_cap);
            self.verts.try_reserve_exact(cap * 3 - self.verts.len())?;
            self.vert_cap = cap;
        }
        let index = self.vert_count();
        let v = coords::to_nav_space(self.transform.transform_point3(p));
        self.verts.extend_from_slice(&[v.x, v.y, v.z]);
        Ok(index)
    }

    /// Append a supporting plane, transformed like the points it supports.
    pub fn add_plane(&mut self, plane: Plane) -> Result<u32, CollectorError> {
        if self.planes.len() == self.planes.capacity() {
            self.planes.try_reserve(1)?;
        }
        let normal = self
            .transform
            .transform_vector3(plane.normal)
            .normalize_or_zero();
        let point_on = self.transform.transform_point3(plane.normal * -plane.d);
        let normal = coords::to_nav_space(normal);
        let point_on = coords::to_nav_space(point_on);
        let index = self.planes.len() as u32;
        self.planes.push(Plane::new(normal, -normal.dot(point_on)));
        Ok(index)
    }

    /// Start a new triangle primitive. Grows the triangle buffer up front so
    /// the matching [`end`](Self::end) cannot fail.
    pub fn begin(&mut self, _material: Option<&str>, _surface_key: u32) -> Result<(), CollectorError> {
        if self.tri_count() as usize == self.tri_cap {
            let cap = grown(self.tri_cap);
            self.tris.try_reserve_exact(cap * 3 - self.tris.len())?;
            self.tri_cap = cap;
        }
        self.current = [0; 3];
        self.slot = 0;
        self.active = true;
        Ok(())
    }

    /// Assign a vertex index to the triangle being built. The first
    /// submitted vertex fills the last slot, so stored order is the reverse
    /// of submission order. Calls past the third are dropped.
    pub fn vertex(&mut self, index: u32) {
        if !self.active {
            log::warn!("vertex({index}) outside begin/end, ignoring");
            return;
        }
        if self.slot == 3 {
            log::warn!("vertex({index}) beyond third slot of a triangle, ignoring");
            return;
        }
        self.current[2 - self.slot] = index as i32;
        self.slot += 1;
    }

    /// Commit the triangle being built. Incomplete primitives and indices
    /// past the current vertex count are dropped rather than stored.
    pub fn end(&mut self) {
        if !self.active {
            log::warn!("end() without begin(), ignoring");
            return;
        }
        self.active = false;
        if self.slot < 3 {
            log::warn!("triangle with {} vertices dropped", self.slot);
            return;
        }
        let limit = self.vert_count() as i32;
        if self.current.iter().any(|&i| i < 0 || i >= limit) {
            log::warn!("triangle references out-of-range vertex, dropped");
            return;
        }
        // begin() pre-grew the buffer; this push cannot reallocate.
        self.tris.extend_from_slice(&self.current);
    }

    /// Release both buffers and reset all counts.
    pub fn clear(&mut self) {
        self.verts = Vec::new();
        self.vert_cap = 0;
        self.tris = Vec::new();
        self.tri_cap = 0;
        self.planes = Vec::new();
        self.slot = 0;
        self.active = false;
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tri_count() == 0
    }

    #[must_use]
    pub fn vert_count(&self) -> u32 {
        (self.verts.len() / 3) as u32
    }

    /// Flat vertex array, stride 3, navigation frame.
    #[must_use]
    pub fn verts(&self) -> &[f32] {
        &self.verts
    }

    #[must_use]
    pub fn tri_count(&self) -> u32 {
        (self.tris.len() / 3) as u32
    }

    /// Flat triangle index array, stride 3.
    #[must_use]
    pub fn tris(&self) -> &[i32] {
        &self.tris
    }

    #[must_use]
    pub fn planes(&self) -> &[Plane] {
        &self.planes
    }

    /// Current vertex capacity in elements (not floats).
    #[must_use]
    pub fn vert_capacity(&self) -> usize {
        self.vert_cap
    }

    /// Current triangle capacity in elements (not indices).
    #[must_use]
    pub fn tri_capacity(&self) -> usize {
        self.tri_cap
    }
}

fn grown(cap: usize) -> usize {
    if cap == 0 { INITIAL_CAPACITY } else { cap * 2 }
}
