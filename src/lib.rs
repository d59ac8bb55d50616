//! Geometric data model and cell topology kernel.
//!
//! Point sets, packed cell arrays, polygonal topology (cells and links), hash and spatial
//! locators, structured extent classification, and the implicit functions and intersection
//! routines that cutting and clipping filters are built from.
use rustc_hash::FxHashMap as HashMap;

#[cfg(test)]
extern crate quickcheck;
#[cfg(test)]
#[macro_use(quickcheck)]
extern crate quickcheck_macros;

mod bounds;
mod cell;
pub mod cell_array;
mod cylinder;
mod edge_locator;
mod error;
mod implicit;
mod implicit_box;
pub mod octree;
mod plane;
mod point;
mod point_set;
mod poly_data;
mod quad;
pub mod sphere;
pub mod structured;

pub use bounds::*;
pub use cell::*;
pub use cell_array::{extract_cell_sizes, CellArray, CellData, CellIds, IdWidth};
pub use cylinder::*;
pub use edge_locator::*;
pub use error::*;
pub use implicit::*;
pub use implicit_box::*;
pub use octree::{IncrementalOctreePointLocator, OctreeConfig};
pub use plane::*;
pub use point::*;
pub use point_set::*;
pub use poly_data::*;
pub use quad::*;
pub use sphere::Sphere;
pub use structured::{DataDescription, Extent, StructuredTopology};

/// Test if an object contains another, boundary inclusive.
pub trait Envelops<O> {
    fn envelops(&self, object: O) -> bool;
}

/// The state of a line intersection query.
#[derive(Copy, Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum IntersectionState {
    NoIntersection,
    YesIntersection,
    /// The line lies in the surface, there is no single intersection point.
    OnLine,
}

/// Result of intersecting a finite segment `p1 -> p2` with a surface.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LineIntersection {
    pub state: IntersectionState,
    /// Parametric position along the segment, `x = p1 + t * (p2 - p1)`.
    pub t: f64,
    /// The intersection point.
    pub x: Point3,
    /// Parametric coordinates of `x` within the intersected cell.
    pub pcoords: Point3,
}

impl LineIntersection {
    pub(crate) fn none() -> Self {
        Self {
            state: IntersectionState::NoIntersection,
            t: 0.0,
            x: Point3::zero(),
            pcoords: Point3::zero(),
        }
    }

    /// Returns `true` if the state is [`IntersectionState::YesIntersection`].
    pub fn is_hit(&self) -> bool {
        self.state == IntersectionState::YesIntersection
    }
}

#[cfg(test)]
fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[cfg(test)]
fn approx_pt(a: Point3, b: Point3) -> bool {
    a.sub(b).mag() < 1e-9
}
