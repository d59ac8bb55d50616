use std::ops;

/// 3D Point (X,Y,Z).
pub type Point3 = [f64; 3];

pub trait Point: Copy + Sized + IntoIterator<Item = f64> {
    /// Set all the values to this value.
    fn all(v: f64) -> Self;

    /// Set all values to zero.
    fn zero() -> Self {
        Self::all(0.)
    }

    /// Scale point by multiplying all dimensions by `scalar`.
    fn scale(self, scalar: f64) -> Self;

    /// Perform a transformation on each pair of dimensions.
    fn xfm<F: Fn(f64, f64) -> f64>(self, b: Self, f: F) -> Self;

    fn add(self, rhs: Self) -> Self {
        self.xfm(rhs, ops::Add::add)
    }

    fn sub(self, rhs: Self) -> Self {
        self.xfm(rhs, ops::Sub::sub)
    }

    /// Squared magnitude of the vector.
    fn mag2(self) -> f64 {
        self.into_iter().map(|a| a * a).sum()
    }

    /// Calculate the magnitude of the vector.
    fn mag(self) -> f64 {
        self.mag2().sqrt()
    }

    /// Normalise the vector by the magnitude.
    ///
    /// A zero-length vector is returned unchanged.
    fn unit(self) -> Self {
        let m = self.mag();
        if m == 0.0 {
            self
        } else {
            self.scale(m.recip())
        }
    }

    /// Return the minimum of each dimension.
    fn min_all(self, b: Self) -> Self {
        self.xfm(b, f64::min)
    }

    /// Return the maximum of each dimension.
    fn max_all(self, b: Self) -> Self {
        self.xfm(b, f64::max)
    }
}

impl Point for Point3 {
    fn all(v: f64) -> Self {
        [v; 3]
    }
    fn scale(self, scalar: f64) -> Self {
        self.map(|f| f * scalar)
    }
    fn xfm<F: Fn(f64, f64) -> f64>(self, b: Self, f: F) -> Self {
        [f(self[0], b[0]), f(self[1], b[1]), f(self[2], b[2])]
    }
}

pub fn dot_prod(a: Point3, b: Point3) -> f64 {
    a.into_iter().zip(b).map(|(a, b)| a * b).sum()
}

#[allow(clippy::many_single_char_names)]
pub fn xprod(a: Point3, b: Point3) -> Point3 {
    let [ax, ay, az] = a;
    let [bx, by, bz] = b;
    let x = ay * bz - az * by;
    let y = az * bx - ax * bz;
    let z = ax * by - ay * bx;
    [x, y, z]
}

/// Squared distance between two points.
#[inline]
pub fn dist2(a: Point3, b: Point3) -> f64 {
    a.sub(b).mag2()
}

/// Read the `id`th point out of a flat `[x, y, z, ...]` buffer.
#[inline]
pub(crate) fn flat_point(buf: &[f64], id: usize) -> Point3 {
    let i = id * 3;
    [buf[i], buf[i + 1], buf[i + 2]]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_adding() {
        let p = [0.0, 1.0, 5.0].add([3.0, 1.0, 5.0]);
        assert_eq!(p, [3.0, 2.0, 10.0]);

        let p = [0.0, 1.0, 5.0].sub([3.0, 1.0, 5.0]);
        assert_eq!(p, [-3.0, 0.0, 0.0]);
    }

    #[test]
    fn point_scaling() {
        let p = [-2.0, 0.5, 3.0].scale(-0.5);
        assert_eq!(p, [1.0, -0.25, -1.5]);
    }

    #[test]
    fn xproduct_test() {
        let v = xprod([1.0, 0.0, 0.0], [0.0, 1.0, 0.0]);
        assert_eq!(v, [0.0, 0.0, 1.0]);

        let v = xprod([1.0, 1.0, 0.0], [-1.0, 1.0, 0.0]);
        assert_eq!(v, [0.0, -0.0, 2.0]);
    }

    #[test]
    fn mag_testing() {
        let m = [2.0, 3.0, 6.0].mag() - 7.0;
        assert!(m.abs() < 1e-11);

        let m = [-2.0, -3.0, -6.0].mag() - 7.0;
        assert!(m.abs() < 1e-11);

        assert_eq!(dist2([1.0, 1.0, 1.0], [1.0, 3.0, 1.0]), 4.0);
    }

    #[test]
    fn unit_vector() {
        let u = [0.0, 0.0, 2.0].unit();
        assert_eq!(u, [0.0, 0.0, 1.0]);

        assert_eq!(Point3::zero().unit(), [0.0; 3]);
    }

    #[test]
    fn reading_flat_buffers() {
        let buf = [0.0, 1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(flat_point(&buf, 1), [3.0, 4.0, 5.0]);
    }
}
