//! Structured (i, j, k lattice) extents and their topological classification.
use crate::*;

/// `[min_i, max_i, min_j, max_j, min_k, max_k]`, inclusive on both ends.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Extent(pub [i32; 6]);

/// The dimensionality of a structured extent.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum DataDescription {
    /// Same extent as before, nothing to recompute.
    Unchanged,
    SinglePoint,
    XLine,
    YLine,
    ZLine,
    XyPlane,
    YzPlane,
    XzPlane,
    XyzGrid,
    Empty,
}

impl DataDescription {
    /// Topological dimension, `None` for `Empty` and `Unchanged`.
    pub fn data_dimension(self) -> Option<usize> {
        use DataDescription::*;
        match self {
            SinglePoint => Some(0),
            XLine | YLine | ZLine => Some(1),
            XyPlane | YzPlane | XzPlane => Some(2),
            XyzGrid => Some(3),
            Empty | Unchanged => None,
        }
    }
}

impl Default for Extent {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl TryFrom<&[i32]> for Extent {
    type Error = Error;

    fn try_from(v: &[i32]) -> Result<Self> {
        <[i32; 6]>::try_from(v)
            .map(Extent)
            .map_err(|_| Error::MalformedExtent(v.len()))
    }
}

impl Extent {
    /// The canonical empty extent `[0, -1, 0, -1, 0, -1]`.
    pub const EMPTY: Self = Self([0, -1, 0, -1, 0, -1]);

    pub fn new(min_i: i32, max_i: i32, min_j: i32, max_j: i32, min_k: i32, max_k: i32) -> Self {
        Self([min_i, max_i, min_j, max_j, min_k, max_k])
    }

    fn axis(&self, a: usize) -> (i32, i32) {
        (self.0[2 * a], self.0[2 * a + 1])
    }

    /// Any axis with `min > max`.
    pub fn is_empty(&self) -> bool {
        (0..3).any(|a| {
            let (lo, hi) = self.axis(a);
            lo > hi
        })
    }

    /// Point counts along each axis, all zero when empty.
    pub fn dimensions(&self) -> [usize; 3] {
        if self.is_empty() {
            return [0; 3];
        }
        [0, 1, 2].map(|a| {
            let (lo, hi) = self.axis(a);
            (hi as i64 - lo as i64 + 1) as usize
        })
    }

    pub fn number_of_points(&self) -> usize {
        self.dimensions().iter().product()
    }

    /// Cells along collapsed axes count once, so a single point has one (vertex) cell.
    pub fn number_of_cells(&self) -> usize {
        if self.is_empty() {
            return 0;
        }
        self.dimensions()
            .iter()
            .map(|&d| if d > 1 { d - 1 } else { 1 })
            .product()
    }

    /// The id of the point at lattice location `ijk`, `None` outside the extent.
    pub fn point_id(&self, ijk: [i32; 3]) -> Option<usize> {
        let [dx, dy, _] = self.dimensions();
        let rel = self.relative(ijk, [0; 3])?;
        Some(rel[0] + rel[1] * dx + rel[2] * dx * dy)
    }

    /// The id of the cell whose lowest corner is `ijk`, `None` outside the cell range.
    pub fn cell_id(&self, ijk: [i32; 3]) -> Option<usize> {
        let cdims = self.dimensions().map(|d| d.saturating_sub(1).max(1));
        // the top layer of points has no cell above it, except on collapsed axes
        let top = self.dimensions().map(|d| usize::from(d > 1));
        let rel = self.relative(ijk, top)?;
        Some(rel[0] + rel[1] * cdims[0] + rel[2] * cdims[0] * cdims[1])
    }

    /// The lattice location of point `id`.
    pub fn point_ijk(&self, id: usize) -> Option<[i32; 3]> {
        if id >= self.number_of_points() {
            return None;
        }
        let [dx, dy, _] = self.dimensions();
        let rel = [id % dx, (id / dx) % dy, id / (dx * dy)];
        Some([0, 1, 2].map(|a| self.axis(a).0 + rel[a] as i32))
    }

    /// `ijk` relative to the minimum corner, requiring it to sit `shrink` short of the max.
    fn relative(&self, ijk: [i32; 3], shrink: [usize; 3]) -> Option<[usize; 3]> {
        if self.is_empty() {
            return None;
        }
        let mut rel = [0; 3];
        for a in 0..3 {
            let (lo, hi) = self.axis(a);
            let hi = hi as i64 - shrink[a] as i64;
            let v = ijk[a] as i64;
            if v < lo as i64 || v > hi {
                return None;
            }
            rel[a] = (v - lo as i64) as usize;
        }
        Some(rel)
    }
}

/// Classify `extent` against the `previous` one.
///
/// Identical extents are [`DataDescription::Unchanged`]. Otherwise an extent with
/// `min > max` on any axis is [`DataDescription::Empty`], else the description follows from
/// which axes vary (`min < max`).
pub fn set_extent(extent: &Extent, previous: &Extent) -> DataDescription {
    use DataDescription::*;

    if extent == previous {
        return Unchanged;
    }

    if extent.is_empty() {
        return Empty;
    }

    let varies = [0, 1, 2].map(|a| {
        let (lo, hi) = extent.axis(a);
        lo < hi
    });

    match varies {
        [true, true, true] => XyzGrid,
        [false, true, true] => YzPlane,
        [true, false, true] => XzPlane,
        [true, true, false] => XyPlane,
        [true, false, false] => XLine,
        [false, true, false] => YLine,
        [false, false, true] => ZLine,
        [false, false, false] => SinglePoint,
    }
}

/// Remembers the current extent of a structured dataset and its description.
#[derive(Copy, Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct StructuredTopology {
    extent: Extent,
    description: DataDescription,
}

impl Default for StructuredTopology {
    fn default() -> Self {
        Self {
            extent: Extent::EMPTY,
            description: DataDescription::Empty,
        }
    }
}

impl StructuredTopology {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `extent`, returning its classification against the stored one.
    pub fn set_extent(&mut self, extent: Extent) -> DataDescription {
        let d = set_extent(&extent, &self.extent);
        if d != DataDescription::Unchanged {
            log::trace!("structured extent {:?} is {:?}", extent.0, d);
            self.extent = extent;
            self.description = d;
        }
        d
    }

    pub fn extent(&self) -> Extent {
        self.extent
    }

    /// The description of the stored extent, never `Unchanged`.
    pub fn data_description(&self) -> DataDescription {
        self.description
    }
}
