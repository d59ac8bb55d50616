use crate::*;
use rayon::prelude::*;

/// A dynamic array of 3D coordinates, stored flat as `[x0, y0, z0, x1, ...]`.
///
/// A point id is a stable index into the buffer: growing the set may move the storage but
/// never changes which coordinate an existing id names.
#[derive(Debug, PartialEq, Clone, Default, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct PointSet {
    coords: Vec<f64>,
}

impl PointSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(points: usize) -> Self {
        Self {
            coords: Vec::with_capacity(points * 3),
        }
    }

    /// Take ownership of a flat coordinate buffer.
    pub fn from_flat(coords: Vec<f64>) -> Result<Self> {
        if coords.len() % 3 != 0 {
            return Err(Error::MalformedCoordinates(coords.len()));
        }
        Ok(Self { coords })
    }

    pub fn number_of_points(&self) -> usize {
        self.coords.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    /// Resize to exactly `n` points. Existing points up to `min(old, n)` are kept, new points
    /// are at the origin.
    pub fn set_number_of_points(&mut self, n: usize) {
        self.coords.resize(n * 3, 0.0);
    }

    /// Overwrite point `id`.
    ///
    /// `id` must be less than [`Self::number_of_points`].
    pub fn set_point(&mut self, id: usize, p: Point3) {
        debug_assert!(
            id < self.number_of_points(),
            "point id {} out of range for {} points",
            id,
            self.number_of_points()
        );
        self.coords[id * 3..id * 3 + 3].copy_from_slice(&p);
    }

    /// `id` must be less than [`Self::number_of_points`].
    pub fn point(&self, id: usize) -> Point3 {
        debug_assert!(
            id < self.number_of_points(),
            "point id {} out of range for {} points",
            id,
            self.number_of_points()
        );
        flat_point(&self.coords, id)
    }

    /// Checked variant of [`Self::point`].
    pub fn get_point(&self, id: usize) -> Result<Point3> {
        if id < self.number_of_points() {
            Ok(flat_point(&self.coords, id))
        } else {
            Err(Error::PointIdOutOfRange {
                id,
                len: self.number_of_points(),
            })
        }
    }

    /// Append a point, returning its id.
    pub fn insert_next_point(&mut self, p: Point3) -> usize {
        let id = self.number_of_points();
        self.coords.extend_from_slice(&p);
        id
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = Point3> + '_ {
        self.coords.chunks_exact(3).map(|c| [c[0], c[1], c[2]])
    }

    pub fn as_flat(&self) -> &[f64] {
        &self.coords
    }

    pub fn into_flat(self) -> Vec<f64> {
        self.coords
    }

    /// The bounds of all points, [`Bounds::INVALID`] if there are none.
    pub fn get_bounds(&self) -> Bounds {
        self.iter().collect()
    }

    /// The id of the point closest to `p`, `None` if the set is empty.
    ///
    /// Ties resolve to the lowest id.
    pub fn find_point(&self, p: Point3) -> Option<usize> {
        self.coords
            .par_chunks_exact(3)
            .enumerate()
            .map(|(i, c)| (dist2(p, [c[0], c[1], c[2]]), i))
            .min_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)))
            .map(|(_, i)| i)
    }
}

impl TryFrom<Vec<f64>> for PointSet {
    type Error = Error;

    fn try_from(coords: Vec<f64>) -> Result<Self> {
        Self::from_flat(coords)
    }
}

impl From<PointSet> for Vec<f64> {
    fn from(ps: PointSet) -> Self {
        ps.coords
    }
}

impl Aabb for PointSet {
    fn aabb(&self) -> Bounds {
        self.get_bounds()
    }
}

impl FromIterator<Point3> for PointSet {
    fn from_iter<T>(iter: T) -> Self
    where
        T: IntoIterator<Item = Point3>,
    {
        let coords = iter.into_iter().flatten().collect();
        Self { coords }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialising_checks_coordinate_count() {
        let ps: PointSet = [[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]].into_iter().collect();
        let json = serde_json::to_string(&ps).unwrap();
        assert_eq!(json, "[1.0,2.0,3.0,4.0,5.0,6.0]");
        assert_eq!(serde_json::from_str::<PointSet>(&json).unwrap(), ps);

        let e = serde_json::from_str::<PointSet>("[1.0,2.0,3.0,4.0]").unwrap_err();
        assert!(e.to_string().contains("not a multiple of 3"), "{}", e);
    }

    #[test]
    fn resizing_keeps_points() {
        let mut ps = PointSet::new();
        ps.set_number_of_points(2);
        ps.set_point(0, [1.0, 2.0, 3.0]);
        ps.set_point(1, [4.0, 5.0, 6.0]);

        ps.set_number_of_points(3);
        assert_eq!(ps.point(0), [1.0, 2.0, 3.0]);
        assert_eq!(ps.point(1), [4.0, 5.0, 6.0]);
        assert_eq!(ps.point(2), [0.0; 3]);

        ps.set_number_of_points(1);
        assert_eq!(ps.number_of_points(), 1);
        assert_eq!(ps.point(0), [1.0, 2.0, 3.0]);
        assert!(ps.get_point(1).is_err());
    }

    #[test]
    fn bounds_of_points() {
        let ps = PointSet::new();
        assert_eq!(ps.get_bounds(), Bounds::INVALID);

        let ps: PointSet = [[0.0, 1.0, 2.0], [-1.0, 5.0, 0.0]].into_iter().collect();
        assert_eq!(
            ps.get_bounds().to_array(),
            [-1.0, 0.0, 1.0, 5.0, 0.0, 2.0]
        );
    }

    #[test]
    fn finding_points() {
        assert_eq!(PointSet::new().find_point([0.0; 3]), None);

        let mut ps = PointSet::new();
        ps.insert_next_point([0.0; 3]);
        ps.insert_next_point([1.0; 3]);
        ps.insert_next_point([1.0; 3]);
        assert_eq!(ps.find_point([0.9; 3]), Some(1));
        assert_eq!(ps.find_point([-5.0; 3]), Some(0));
    }

    #[test]
    fn flat_buffers() {
        assert_eq!(
            PointSet::from_flat(vec![0.0; 4]),
            Err(Error::MalformedCoordinates(4))
        );
        let ps = PointSet::from_flat(vec![1.0, 2.0, 3.0]).unwrap();
        assert_eq!(ps.iter().collect::<Vec<_>>(), vec![[1.0, 2.0, 3.0]]);
    }
}
