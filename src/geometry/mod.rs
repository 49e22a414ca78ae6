//! Walkable-geometry collection for navigation mesh baking
//!
//! Geometry sources triangulate themselves into a [`GeometryCollector`],
//! which hands the baking pipeline flat vertex and index arrays in the
//! navigation library's coordinate frame.

mod collector;
mod sources;

pub use collector::{CollectorError, GeometryCollector, Plane};
pub use sources::{BoxSource, GeometrySource, GroundPlaneSource};
