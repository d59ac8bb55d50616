use crate::*;

/// An infinite cylinder about the line through `center` along `axis`.
#[derive(Copy, Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Cylinder {
    center: Point3,
    axis: Point3,
    radius: f64,
}

impl Default for Cylinder {
    fn default() -> Self {
        Self::new(Point3::zero(), [0.0, 1.0, 0.0], 0.5)
    }
}

impl Cylinder {
    /// The axis is normalised.
    pub fn new(center: Point3, axis: Point3, radius: f64) -> Self {
        Self {
            center,
            axis: axis.unit(),
            radius,
        }
    }

    pub fn center(&self) -> Point3 {
        self.center
    }

    pub fn axis(&self) -> Point3 {
        self.axis
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// The component of `x - center` perpendicular to the axis.
    fn radial(&self, x: Point3) -> Point3 {
        let v = x.sub(self.center);
        v.sub(self.axis.scale(dot_prod(v, self.axis)))
    }
}

impl ImplicitFunction for Cylinder {
    /// Squared radial distance minus `r²`.
    fn evaluate_function(&self, x: Point3) -> f64 {
        self.radial(x).mag2() - self.radius * self.radius
    }

    fn evaluate_gradient(&self, x: Point3) -> Point3 {
        self.radial(x).scale(2.0)
    }
}
