use crate::*;

/// A scalar field over 3D space whose zero set is a surface.
///
/// Evaluates to zero exactly on the surface, negative inside and positive outside. Cutting and
/// clipping filters use the value as a scalar field.
pub trait ImplicitFunction {
    fn evaluate_function(&self, x: Point3) -> f64;

    fn evaluate_gradient(&self, x: Point3) -> Point3;

    /// Evaluate a flat `[x, y, z, ...]` buffer of points, writing one value per point.
    fn evaluate_flat(&self, points: &[f64], out: &mut Vec<f64>) {
        out.clear();
        out.extend(
            points
                .chunks_exact(3)
                .map(|p| self.evaluate_function([p[0], p[1], p[2]])),
        );
    }
}

/// The closed set of implicit primitives, dispatched statically.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Primitive {
    Box(ImplicitBox),
    Sphere(Sphere),
    Plane(Plane),
    Cylinder(Cylinder),
}

impl ImplicitFunction for Primitive {
    fn evaluate_function(&self, x: Point3) -> f64 {
        match self {
            Primitive::Box(f) => f.evaluate_function(x),
            Primitive::Sphere(f) => f.evaluate_function(x),
            Primitive::Plane(f) => f.evaluate_function(x),
            Primitive::Cylinder(f) => f.evaluate_function(x),
        }
    }

    fn evaluate_gradient(&self, x: Point3) -> Point3 {
        match self {
            Primitive::Box(f) => f.evaluate_gradient(x),
            Primitive::Sphere(f) => f.evaluate_gradient(x),
            Primitive::Plane(f) => f.evaluate_gradient(x),
            Primitive::Cylinder(f) => f.evaluate_gradient(x),
        }
    }
}

impl From<ImplicitBox> for Primitive {
    fn from(f: ImplicitBox) -> Self {
        Primitive::Box(f)
    }
}

impl From<Sphere> for Primitive {
    fn from(f: Sphere) -> Self {
        Primitive::Sphere(f)
    }
}

impl From<Plane> for Primitive {
    fn from(f: Plane) -> Self {
        Primitive::Plane(f)
    }
}

impl From<Cylinder> for Primitive {
    fn from(f: Cylinder) -> Self {
        Primitive::Cylinder(f)
    }
}
