use crate::*;

/// An axis aligned bounding box.
///
/// The array layout used throughout the toolkit is `[xmin, xmax, ymin, ymax, zmin, zmax]`, see
/// [`Bounds::to_array`]. An empty set of points yields [`Bounds::INVALID`].
#[derive(Copy, Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Bounds {
    pub min: Point3,
    pub max: Point3,
}

impl Default for Bounds {
    fn default() -> Self {
        Self::INVALID
    }
}

impl Bounds {
    /// Sentinel bounds: `min = +inf`, `max = -inf`. Adding any point makes it valid.
    pub const INVALID: Self = Self {
        min: [f64::INFINITY; 3],
        max: [f64::NEG_INFINITY; 3],
    };

    pub fn new(min: Point3, max: Point3) -> Self {
        Self { min, max }
    }

    /// Build from the `[xmin, xmax, ymin, ymax, zmin, zmax]` layout.
    pub fn from_array(b: [f64; 6]) -> Self {
        Self {
            min: [b[0], b[2], b[4]],
            max: [b[1], b[3], b[5]],
        }
    }

    /// Return the `[xmin, xmax, ymin, ymax, zmin, zmax]` layout.
    pub fn to_array(&self) -> [f64; 6] {
        let Self { min, max } = self;
        [min[0], max[0], min[1], max[1], min[2], max[2]]
    }

    /// Valid bounds have `min <= max` on every axis.
    pub fn is_valid(&self) -> bool {
        (0..3).all(|i| self.min[i] <= self.max[i])
    }

    pub fn center(&self) -> Point3 {
        self.min.add(self.max).scale(0.5)
    }

    /// The side lengths.
    pub fn lengths(&self) -> Point3 {
        self.max.sub(self.min)
    }

    pub fn diagonal_length(&self) -> f64 {
        self.lengths().mag()
    }

    /// Grow to include `p`.
    pub fn add_point(&mut self, p: Point3) {
        self.min = self.min.min_all(p);
        self.max = self.max.max_all(p);
    }

    pub fn union(self, other: Self) -> Self {
        Self {
            min: self.min.min_all(other.min),
            max: self.max.max_all(other.max),
        }
    }

    pub fn intersects(&self, other: &Self) -> bool {
        (0..3).all(|i| self.min[i] <= other.max[i] && self.max[i] >= other.min[i])
    }

    pub fn intersection(&self, other: &Self) -> Option<Self> {
        self.intersects(other).then(|| Self {
            min: self.min.max_all(other.min),
            max: self.max.min_all(other.max),
        })
    }

    /// Expand the bounds by a value on every side.
    ///
    /// A negative value can be used to _shrink_ the bounds; shrinking past the centre yields
    /// degenerate bounds at the centre. Non-finite values are ignored.
    pub fn expand(self, by: f64) -> Self {
        if !by.is_finite() {
            return self;
        }

        let min = self.min.sub(Point3::all(by));
        let max = self.max.add(Point3::all(by));
        let c = self.center();

        Self {
            min: min.min_all(c),
            max: max.max_all(c),
        }
    }

    /// Return a cube sharing this centre whose side is the longest side of `self`.
    pub fn to_cube(&self) -> Self {
        let half = self.lengths().into_iter().fold(0.0, f64::max) * 0.5;
        let c = self.center();
        Self {
            min: c.sub(Point3::all(half)),
            max: c.add(Point3::all(half)),
        }
    }

    /// The closest point within the bounds to `p`.
    pub fn clamp(&self, p: Point3) -> Point3 {
        [0, 1, 2].map(|i| p[i].clamp(self.min[i], self.max[i]))
    }

    /// Squared distance from `p` to the bounds, zero when `p` is inside.
    pub fn dist2_to_point(&self, p: Point3) -> f64 {
        dist2(p, self.clamp(p))
    }

    /// One of the 8 sub-boxes split through the centre.
    ///
    /// Bit 0 of `octant` selects the upper x half, bit 1 upper y, bit 2 upper z.
    pub fn octant(&self, octant: usize) -> Self {
        let c = self.center();
        let mut b = *self;
        for axis in 0..3 {
            if octant & (1 << axis) == 0 {
                b.max[axis] = c[axis];
            } else {
                b.min[axis] = c[axis];
            }
        }
        b
    }
}

impl FromIterator<Point3> for Bounds {
    fn from_iter<T>(iter: T) -> Self
    where
        T: IntoIterator<Item = Point3>,
    {
        iter.into_iter().fold(Self::INVALID, |mut b, p| {
            b.add_point(p);
            b
        })
    }
}

/// Build the union of an iterator of [`Bounds`].
/// If the iterator is empty, [`Bounds::INVALID`] is returned.
impl FromIterator<Bounds> for Bounds {
    fn from_iter<T>(iter: T) -> Self
    where
        T: IntoIterator<Item = Self>,
    {
        iter.into_iter().fold(Self::INVALID, Bounds::union)
    }
}

impl Envelops<Point3> for Bounds {
    fn envelops(&self, p: Point3) -> bool {
        (0..3).all(|i| p[i] >= self.min[i] && p[i] <= self.max[i])
    }
}

/// Objects which have an axis aligned bounding box.
pub trait Aabb {
    fn aabb(&self) -> Bounds;
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck::TestResult;

    type P3 = (f64, f64, f64);

    fn to_b(a: P3, b: P3) -> Option<Bounds> {
        let a = [a.0, a.1, a.2];
        let b = [b.0, b.1, b.2];

        a.iter()
            .chain(&b)
            .all(|x| x.is_finite() && x.abs() < 1e100)
            .then(|| Bounds::from_iter([a, b]))
    }

    #[quickcheck]
    fn intersects_commutative(a: (P3, P3), b: (P3, P3)) -> TestResult {
        let (Some(a), Some(b)) = (to_b(a.0, a.1), to_b(b.0, b.1)) else {
            return TestResult::discard();
        };

        TestResult::from_bool(a.intersects(&b) == b.intersects(&a))
    }

    #[quickcheck]
    fn union_envelops_both(a: (P3, P3), b: (P3, P3)) -> TestResult {
        let (Some(a), Some(b)) = (to_b(a.0, a.1), to_b(b.0, b.1)) else {
            return TestResult::discard();
        };
        let u = a.union(b);

        TestResult::from_bool([a.min, a.max, b.min, b.max].into_iter().all(|p| u.envelops(p)))
    }

    #[test]
    fn invalid_bounds_from_nothing() {
        let b: Bounds = std::iter::empty::<Point3>().collect();
        assert_eq!(b, Bounds::INVALID);
        assert!(!b.is_valid());
        assert_eq!(
            b.to_array(),
            [
                f64::INFINITY,
                f64::NEG_INFINITY,
                f64::INFINITY,
                f64::NEG_INFINITY,
                f64::INFINITY,
                f64::NEG_INFINITY
            ]
        );
    }

    #[test]
    fn array_layout_round_trip() {
        let a = [-1.0, 1.0, -2.0, 2.0, -3.0, 3.0];
        let b = Bounds::from_array(a);
        assert_eq!(b.min, [-1.0, -2.0, -3.0]);
        assert_eq!(b.max, [1.0, 2.0, 3.0]);
        assert_eq!(b.to_array(), a);
    }

    #[test]
    fn octants_partition() {
        let b = Bounds::new([0.0; 3], [2.0; 3]);
        assert_eq!(b.octant(0), Bounds::new([0.0; 3], [1.0; 3]));
        assert_eq!(b.octant(7), Bounds::new([1.0; 3], [2.0; 3]));
        assert_eq!(
            b.octant(0b101),
            Bounds::new([1.0, 0.0, 1.0], [2.0, 1.0, 2.0])
        );
    }

    #[test]
    fn distance_to_point() {
        let b = Bounds::new([0.0; 3], [1.0; 3]);
        assert_eq!(b.dist2_to_point([0.5; 3]), 0.0);
        assert_eq!(b.dist2_to_point([2.0, 0.5, 0.5]), 1.0);
        assert_eq!(b.dist2_to_point([2.0, 2.0, 0.5]), 2.0);
    }

    #[test]
    fn cube_and_expand() {
        let b = Bounds::new([0.0; 3], [4.0, 2.0, 1.0]);
        let c = b.to_cube();
        assert_eq!(c.lengths(), [4.0; 3]);
        assert_eq!(c.center(), b.center());

        let e = Bounds::new([0.0; 3], [1.0; 3]).expand(0.5);
        assert_eq!(e, Bounds::new([-0.5; 3], [1.5; 3]));

        let e = Bounds::new([0.0; 3], [1.0; 3]).expand(-0.8);
        assert_eq!(e, Bounds::new([0.5; 3], [0.5; 3]));
    }
}
