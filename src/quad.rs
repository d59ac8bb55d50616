use crate::*;

const MAX_NEWTON_ITERS: usize = 20;
const NEWTON_CONVERGENCE: f64 = 1e-12;

/// A bilinear quadrilateral cell, points ordered around the boundary.
///
/// Parametric coordinates `(r, s)` run `0..1` with point 0 at `(0, 0)`, point 1 at `(1, 0)`,
/// point 2 at `(1, 1)` and point 3 at `(0, 1)`.
#[derive(Copy, Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Quad {
    points: [Point3; 4],
}

/// Where a point sits relative to a [`Quad`].
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct QuadPosition {
    pub pcoords: Point3,
    pub weights: [f64; 4],
    /// `pcoords` lie within the cell (boundary inclusive).
    pub inside: bool,
    /// The closest point on the cell. For outside points this is the location of the clamped
    /// parametric coordinates.
    pub closest_point: Point3,
    pub dist2: f64,
}

impl Quad {
    pub fn new(points: [Point3; 4]) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[Point3; 4] {
        &self.points
    }

    /// Unit normal by Newell's method, zero for a degenerate quad.
    pub fn normal(&self) -> Point3 {
        let mut n = Point3::zero();
        for i in 0..4 {
            let a = self.points[i];
            let b = self.points[(i + 1) % 4];
            n[0] += (a[1] - b[1]) * (a[2] + b[2]);
            n[1] += (a[2] - b[2]) * (a[0] + b[0]);
            n[2] += (a[0] - b[0]) * (a[1] + b[1]);
        }
        n.unit()
    }

    pub fn interpolation_functions(pcoords: Point3) -> [f64; 4] {
        let [r, s, _] = pcoords;
        let (rm, sm) = (1.0 - r, 1.0 - s);
        [rm * sm, r * sm, r * s, rm * s]
    }

    /// Derivatives of the interpolation functions, the 4 `r` derivatives followed by the 4 `s`
    /// derivatives.
    pub fn interpolation_derivs(pcoords: Point3) -> [f64; 8] {
        let [r, s, _] = pcoords;
        let (rm, sm) = (1.0 - r, 1.0 - s);
        [-sm, sm, s, -s, -rm, -r, r, rm]
    }

    /// The world location of `pcoords`, with the interpolation weights.
    pub fn evaluate_location(&self, pcoords: Point3) -> (Point3, [f64; 4]) {
        let w = Self::interpolation_functions(pcoords);
        let x = self
            .points
            .iter()
            .zip(w)
            .fold(Point3::zero(), |x, (p, w)| x.add(p.scale(w)));
        (x, w)
    }

    /// Invert the bilinear map for `x`.
    ///
    /// `x` is projected onto the quad's plane and solved in 2D by Newton iteration. Returns
    /// `None` if the quad is degenerate or the iteration does not converge.
    pub fn evaluate_position(&self, x: Point3) -> Option<QuadPosition> {
        let n = self.normal();
        if n == Point3::zero() {
            return None;
        }

        let plane = Plane::new(self.points[0], n);
        let projected = plane.project_point(x);

        // drop the dominant normal axis
        let k = (0..3)
            .max_by(|&a, &b| n[a].abs().total_cmp(&n[b].abs()))
            .unwrap_or(2);
        let (i, j) = ((k + 1) % 3, (k + 2) % 3);

        let mut pc = [0.5, 0.5, 0.0];
        let mut converged = false;
        for _ in 0..MAX_NEWTON_ITERS {
            let (loc, _) = self.evaluate_location(pc);
            let d = Self::interpolation_derivs(pc);
            let (mut xr, mut xs, mut yr, mut ys) = (0.0, 0.0, 0.0, 0.0);
            for (m, p) in self.points.iter().enumerate() {
                xr += d[m] * p[i];
                xs += d[m + 4] * p[i];
                yr += d[m] * p[j];
                ys += d[m + 4] * p[j];
            }
            let det = xr * ys - xs * yr;
            if det == 0.0 {
                return None;
            }

            let fx = loc[i] - projected[i];
            let fy = loc[j] - projected[j];
            let dr = (ys * fx - xs * fy) / det;
            let ds = (xr * fy - yr * fx) / det;
            pc[0] -= dr;
            pc[1] -= ds;

            if dr.abs() < NEWTON_CONVERGENCE && ds.abs() < NEWTON_CONVERGENCE {
                converged = true;
                break;
            }
        }

        if !converged {
            log::trace!("quad inverse map did not converge for {:?}", x);
            return None;
        }

        let inside = pc[..2].iter().all(|v| (0.0..=1.0).contains(v));
        let (weights, closest_point) = if inside {
            (Self::interpolation_functions(pc), projected)
        } else {
            let clamped = [pc[0].clamp(0.0, 1.0), pc[1].clamp(0.0, 1.0), 0.0];
            let (p, w) = self.evaluate_location(clamped);
            (w, p)
        };

        Some(QuadPosition {
            pcoords: pc,
            weights,
            inside,
            closest_point,
            dist2: dist2(x, closest_point),
        })
    }

    /// Intersect the finite segment `p1 -> p2` with the quad.
    ///
    /// `tol` is a parametric tolerance on `r, s`. Segments parallel to or lying in the quad's
    /// plane, and intersections with `t` outside `[0, 1]`, are
    /// [`IntersectionState::NoIntersection`]. Segments through an edge or vertex intersect.
    ///
    /// # Example
    /// ```rust
    /// # use cellgeom::*;
    /// let q = Quad::new([[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]]);
    /// let x = q.intersect_with_line([0.5, 0.25, 1.0], [0.5, 0.25, -1.0], 1e-9);
    /// assert!(x.is_hit());
    /// assert_eq!(x.t, 0.5);
    /// assert_eq!(x.pcoords, [0.5, 0.25, 0.0]);
    /// ```
    pub fn intersect_with_line(&self, p1: Point3, p2: Point3, tol: f64) -> LineIntersection {
        let n = self.normal();
        if n == Point3::zero() {
            return LineIntersection::none();
        }

        let hit = Plane::new(self.points[0], n).intersect_with_line(p1, p2);
        if !hit.is_hit() {
            return LineIntersection::none();
        }

        let Some(pos) = self.evaluate_position(hit.x) else {
            return LineIntersection::none();
        };

        let within = pos.pcoords[..2]
            .iter()
            .all(|&v| v >= -tol && v <= 1.0 + tol);
        if !within {
            return LineIntersection::none();
        }

        LineIntersection {
            state: IntersectionState::YesIntersection,
            t: hit.t,
            x: hit.x,
            pcoords: pos.pcoords,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_quad() -> Quad {
        Quad::new([
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [1.0, 1.0, 0.0],
            [0.0, 1.0, 0.0],
        ])
    }

    #[test]
    fn segment_outside_quad() {
        let x = unit_quad().intersect_with_line([0.0, 2.0, 0.0], [0.0, 2.0, 1.0], 1e-12);
        assert_eq!(x.state, IntersectionState::NoIntersection);
    }

    #[test]
    fn segment_through_vertex() {
        let x = unit_quad().intersect_with_line([0.0, 0.0, 0.0], [0.0, 0.0, 1.0], 1e-12);
        assert_eq!(x.state, IntersectionState::YesIntersection);
        assert_eq!(x.t, 0.0);
        assert_eq!(x.pcoords, [0.0, 0.0, 0.0]);
        assert_eq!(x.x, [0.0, 0.0, 0.0]);
    }

    #[test]
    fn segment_through_edge() {
        let x = unit_quad().intersect_with_line([1.0, 0.5, -1.0], [1.0, 0.5, 1.0], 1e-12);
        assert!(x.is_hit());
        assert_eq!(x.t, 0.5);
        assert!(approx_pt(x.pcoords, [1.0, 0.5, 0.0]));
    }

    #[test]
    fn coplanar_and_short_segments() {
        let q = unit_quad();
        // along an edge
        let x = q.intersect_with_line([0.0, 0.0, 0.0], [1.0, 0.0, 0.0], 1e-12);
        assert_eq!(x.state, IntersectionState::NoIntersection);

        // would hit if the segment were longer
        let x = q.intersect_with_line([0.5, 0.5, 2.0], [0.5, 0.5, 1.0], 1e-12);
        assert_eq!(x.state, IntersectionState::NoIntersection);
    }

    #[test]
    fn tolerance_widens_quad() {
        let q = unit_quad();
        let x = q.intersect_with_line([1.05, 0.5, 1.0], [1.05, 0.5, -1.0], 1e-12);
        assert!(!x.is_hit());
        let x = q.intersect_with_line([1.05, 0.5, 1.0], [1.05, 0.5, -1.0], 0.1);
        assert!(x.is_hit());
    }

    #[test]
    fn position_of_skewed_quad() {
        let q = Quad::new([
            [0.0, 0.0, 1.0],
            [2.0, 0.0, 1.0],
            [3.0, 2.0, 1.0],
            [0.0, 1.0, 1.0],
        ]);
        let (x, _) = q.evaluate_location([0.3, 0.6, 0.0]);
        let pos = q.evaluate_position(x.add([0.0, 0.0, 0.5])).unwrap();
        assert!(pos.inside);
        assert!(approx_pt(pos.pcoords, [0.3, 0.6, 0.0]));
        assert!(approx_pt(pos.closest_point, x));
        assert!(approx(pos.dist2, 0.25));
        assert!(approx(pos.weights.iter().sum::<f64>(), 1.0));
    }

    #[test]
    fn interpolation() {
        assert_eq!(
            Quad::interpolation_functions([0.0, 0.0, 0.0]),
            [1.0, 0.0, 0.0, 0.0]
        );
        assert_eq!(
            Quad::interpolation_functions([0.5, 0.5, 0.0]),
            [0.25, 0.25, 0.25, 0.25]
        );
        assert_eq!(unit_quad().normal(), [0.0, 0.0, 1.0]);
    }
}
