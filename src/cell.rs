use crate::*;

/// The kind of a polygonal cell.
#[derive(
    Copy, Clone, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
pub enum CellType {
    /// A cell with no points.
    #[default]
    Empty,
    Vertex,
    PolyVertex,
    Line,
    PolyLine,
    Triangle,
    TriangleStrip,
    Polygon,
    Quad,
}

impl CellType {
    /// Topological dimension of the cell.
    pub fn dimension(self) -> usize {
        use CellType::*;
        match self {
            Empty | Vertex | PolyVertex => 0,
            Line | PolyLine => 1,
            Triangle | TriangleStrip | Polygon | Quad => 2,
        }
    }

    /// The edges of a cell of this type over `ids`, as pairs of point ids.
    ///
    /// Polygons close back to the first point, lines and strips do not.
    pub fn edges(self, ids: &[usize]) -> Vec<[usize; 2]> {
        use CellType::*;
        let n = ids.len();
        match self {
            Empty | Vertex | PolyVertex => Vec::new(),
            Line | PolyLine => ids.windows(2).map(|w| [w[0], w[1]]).collect(),
            Triangle | Quad | Polygon if n >= 2 => {
                (0..n).map(|i| [ids[i], ids[(i + 1) % n]]).collect()
            }
            Triangle | Quad | Polygon => Vec::new(),
            TriangleStrip => {
                let mut v = Vec::with_capacity((2 * n).saturating_sub(3));
                if n >= 2 {
                    v.push([ids[0], ids[1]]);
                }
                for i in 2..n {
                    v.push([ids[i - 2], ids[i]]);
                    v.push([ids[i - 1], ids[i]]);
                }
                v
            }
        }
    }
}

/// A cell materialised from a [`PolyData`]: its type, point ids and coordinates.
///
/// Intended to be reused across [`PolyData::get_cell`] calls, which overwrite the buffers in
/// place.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Cell {
    pub cell_type: CellType,
    pub point_ids: Vec<usize>,
    pub points: Vec<Point3>,
}

impl Cell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn number_of_points(&self) -> usize {
        self.point_ids.len()
    }

    pub fn edges(&self) -> Vec<[usize; 2]> {
        self.cell_type.edges(&self.point_ids)
    }

    /// Reset to an empty cell, keeping the allocations.
    pub fn clear(&mut self) {
        self.cell_type = CellType::Empty;
        self.point_ids.clear();
        self.points.clear();
    }
}

impl Aabb for Cell {
    fn aabb(&self) -> Bounds {
        self.points.iter().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edges_by_type() {
        assert!(CellType::Vertex.edges(&[4]).is_empty());
        assert_eq!(CellType::Line.edges(&[4, 7]), vec![[4, 7]]);
        assert_eq!(CellType::PolyLine.edges(&[1, 2, 3]), vec![[1, 2], [2, 3]]);
        assert_eq!(
            CellType::Triangle.edges(&[0, 1, 2]),
            vec![[0, 1], [1, 2], [2, 0]]
        );
        assert_eq!(CellType::Quad.edges(&[0, 1, 2, 3]).len(), 4);
        assert_eq!(
            CellType::TriangleStrip.edges(&[0, 1, 2, 3]),
            vec![[0, 1], [0, 2], [1, 2], [1, 3], [2, 3]]
        );
        assert!(CellType::Polygon.edges(&[]).is_empty());
    }

    #[test]
    fn dimensions() {
        assert_eq!(CellType::PolyVertex.dimension(), 0);
        assert_eq!(CellType::PolyLine.dimension(), 1);
        assert_eq!(CellType::TriangleStrip.dimension(), 2);
    }
}
