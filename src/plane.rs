use crate::*;

/// An infinite plane through `origin` with a unit `normal`.
///
/// As an implicit function the plane evaluates to the signed distance `n · (x - origin)`.
#[derive(Copy, Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Plane {
    origin: Point3,
    normal: Point3,
}

impl Default for Plane {
    fn default() -> Self {
        Self::new(Point3::zero(), [0.0, 0.0, 1.0])
    }
}

impl Plane {
    /// The normal is normalised, a zero normal is kept as is and evaluates to zero everywhere.
    pub fn new(origin: Point3, normal: Point3) -> Self {
        Self {
            origin,
            normal: normal.unit(),
        }
    }

    pub fn origin(&self) -> Point3 {
        self.origin
    }

    pub fn normal(&self) -> Point3 {
        self.normal
    }

    /// Translate the plane along its normal by `distance`.
    pub fn push(&mut self, distance: f64) {
        self.origin = self.origin.add(self.normal.scale(distance));
    }

    /// Unsigned distance from `x` to the plane.
    pub fn distance_to_plane(&self, x: Point3) -> f64 {
        self.evaluate_function(x).abs()
    }

    /// Returns the **point on the plane** that is the shortest distance from `x`.
    pub fn project_point(&self, x: Point3) -> Point3 {
        x.sub(self.normal.scale(self.evaluate_function(x)))
    }

    /// Intersect the finite segment `p1 -> p2` with the plane.
    ///
    /// A segment parallel to the plane does not intersect, unless it lies in the plane in which
    /// case the state is [`IntersectionState::OnLine`]. Intersections with `t` outside `[0, 1]`
    /// report [`IntersectionState::NoIntersection`] but still carry `t` and `x` of the infinite
    /// line.
    pub fn intersect_with_line(&self, p1: Point3, p2: Point3) -> LineIntersection {
        let d = p2.sub(p1);
        let num = -self.evaluate_function(p1);
        let den = dot_prod(self.normal, d);

        if den.abs() <= f64::EPSILON * d.mag().max(1.0) {
            let state = if num.abs() <= f64::EPSILON * p1.mag().max(1.0) {
                IntersectionState::OnLine
            } else {
                IntersectionState::NoIntersection
            };
            return LineIntersection {
                state,
                ..LineIntersection::none()
            };
        }

        let t = num / den;
        let x = p1.add(d.scale(t));
        let state = if (0.0..=1.0).contains(&t) {
            IntersectionState::YesIntersection
        } else {
            IntersectionState::NoIntersection
        };

        LineIntersection {
            state,
            t,
            x,
            pcoords: Point3::zero(),
        }
    }
}

impl ImplicitFunction for Plane {
    fn evaluate_function(&self, x: Point3) -> f64 {
        dot_prod(self.normal, x.sub(self.origin))
    }

    fn evaluate_gradient(&self, _: Point3) -> Point3 {
        self.normal
    }
}
