//! Sphere implicit function and bounding sphere computation.
//!
//! Bounding spheres are returned as `[cx, cy, cz, radius]`.
use crate::*;

/// Relative slack used when testing containment, absorbing rounding in the circumsphere
/// computations.
const CONTAINS_EPS: f64 = 1e-10;

#[derive(Copy, Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Sphere {
    pub center: Point3,
    pub radius: f64,
}

impl Default for Sphere {
    fn default() -> Self {
        Self::new(Point3::zero(), 0.5)
    }
}

impl Sphere {
    pub fn new(center: Point3, radius: f64) -> Self {
        Self { center, radius }
    }
}

impl ImplicitFunction for Sphere {
    /// `|x - c|² - r²`
    fn evaluate_function(&self, x: Point3) -> f64 {
        dist2(x, self.center) - self.radius * self.radius
    }

    fn evaluate_gradient(&self, x: Point3) -> Point3 {
        x.sub(self.center).scale(2.0)
    }
}

/// Compute the minimal enclosing sphere of the first `num_points` points of a flat
/// `[x, y, z, ...]` buffer.
///
/// The sphere is exact (move-to-front Welzl). `hints` name two point ids visited first, which
/// usually shortens the search; the result does not depend on them. Zero points yield a zero
/// sphere.
///
/// # Example
/// ```rust
/// # use cellgeom::sphere::*;
/// let pts = [0.0, 0.0, 0.0, 2.0, 0.0, 0.0, 1.0, 1.0, 0.0, 100.0, 100.0, 100.0];
/// let s = compute_bounding_sphere(&pts, 3, None).unwrap();
/// assert!((s[0] - 1.0).abs() < 1e-9 && (s[3] - 1.0).abs() < 1e-9);
/// ```
pub fn compute_bounding_sphere(
    points: &[f64],
    num_points: usize,
    hints: Option<[usize; 2]>,
) -> Result<[f64; 4]> {
    check_len(points, 3, num_points)?;
    check_hints(hints, num_points)?;

    if num_points == 0 {
        return Ok([0.0; 4]);
    }

    let order = visit_order(num_points, hints);
    let mut pts = order
        .into_iter()
        .map(|i| flat_point(points, i))
        .collect::<Vec<_>>();
    let mut support = Vec::with_capacity(4);
    let ball = mtf_ball(&mut pts, num_points, &mut support);

    let [x, y, z] = ball.center;
    Ok([x, y, z, ball.r2.max(0.0).sqrt()])
}

/// Compute a sphere enclosing the first `num_spheres` spheres of a flat
/// `[cx, cy, cz, r, ...]` buffer.
///
/// The minimal sphere about the centres is grown, in index order, to take in each sphere that
/// pokes out of it. Each growth step is the smallest sphere containing the current sphere and
/// the offending one, so the result encloses every input. `hints` only seed the centre search.
pub fn compute_bounding_sphere_from_spheres(
    spheres: &[f64],
    num_spheres: usize,
    hints: Option<[usize; 2]>,
) -> Result<[f64; 4]> {
    check_len(spheres, 4, num_spheres)?;
    check_hints(hints, num_spheres)?;

    let sphere = |i: usize| {
        let s = &spheres[i * 4..i * 4 + 4];
        ([s[0], s[1], s[2]], s[3])
    };

    match num_spheres {
        0 => return Ok([0.0; 4]),
        1 => {
            let ([x, y, z], r) = sphere(0);
            return Ok([x, y, z, r]);
        }
        _ => (),
    }

    let mut pts = visit_order(num_spheres, hints)
        .into_iter()
        .map(|i| sphere(i).0)
        .collect::<Vec<_>>();
    let mut support = Vec::with_capacity(4);
    let ball = mtf_ball(&mut pts, num_spheres, &mut support);

    let mut center = ball.center;
    let mut radius = ball.r2.max(0.0).sqrt();

    for i in 0..num_spheres {
        let (c, r) = sphere(i);
        let d = dist2(c, center).sqrt();
        if d + r <= radius * (1.0 + CONTAINS_EPS) {
            continue;
        }

        if d + radius <= r {
            // input sphere swallows the current one
            center = c;
            radius = r;
        } else {
            let grown = (radius + d + r) * 0.5;
            center = center.add(c.sub(center).scale((grown - radius) / d));
            radius = grown;
        }
    }

    let [x, y, z] = center;
    Ok([x, y, z, radius])
}

fn check_len(buf: &[f64], stride: usize, n: usize) -> Result<()> {
    let len = buf.len() / stride;
    if n > len {
        Err(Error::PointIdOutOfRange { id: n - 1, len })
    } else {
        Ok(())
    }
}

fn check_hints(hints: Option<[usize; 2]>, n: usize) -> Result<()> {
    match hints.and_then(|h| h.into_iter().find(|&i| i >= n)) {
        Some(id) => Err(Error::PointIdOutOfRange { id, len: n }),
        None => Ok(()),
    }
}

/// Index order with the hinted ids moved to the front.
fn visit_order(n: usize, hints: Option<[usize; 2]>) -> Vec<usize> {
    let mut order = (0..n).collect::<Vec<_>>();
    if let Some([a, b]) = hints {
        order.swap(0, a);
        if let Some(pos) = order.iter().position(|&x| x == b) {
            if pos > 0 {
                order.swap(1, pos);
            }
        }
    }
    order
}

#[derive(Copy, Clone, Debug)]
struct Ball {
    center: Point3,
    /// Squared radius, negative for the empty ball.
    r2: f64,
}

impl Ball {
    const EMPTY: Self = Self {
        center: [0.0; 3],
        r2: -1.0,
    };

    fn contains(&self, p: Point3) -> bool {
        self.r2 >= 0.0 && dist2(p, self.center) <= self.r2 + CONTAINS_EPS * self.r2.max(1.0)
    }

    fn from_support(s: &[Point3]) -> Self {
        match s {
            [] => Self::EMPTY,
            [p] => Self {
                center: *p,
                r2: 0.0,
            },
            [a, b] => Self::diametral(*a, *b),
            [a, b, c] => Self::circum3(*a, *b, *c),
            [a, b, c, d] => Self::circum4(*a, *b, *c, *d),
            _ => unreachable!("support never exceeds 4 points"),
        }
    }

    fn diametral(a: Point3, b: Point3) -> Self {
        Self {
            center: a.add(b).scale(0.5),
            r2: dist2(a, b) * 0.25,
        }
    }

    /// The circle through three points, or the widest diametral ball if they are collinear.
    fn circum3(p0: Point3, p1: Point3, p2: Point3) -> Self {
        let a = p1.sub(p0);
        let b = p2.sub(p0);
        let axb = xprod(a, b);
        let den = 2.0 * axb.mag2();

        if den <= f64::EPSILON * a.mag2() * b.mag2() {
            return [
                Self::diametral(p0, p1),
                Self::diametral(p0, p2),
                Self::diametral(p1, p2),
            ]
            .into_iter()
            .fold(Self::EMPTY, |x, y| if y.r2 > x.r2 { y } else { x });
        }

        let n = b.scale(a.mag2()).sub(a.scale(b.mag2()));
        let off = xprod(n, axb).scale(den.recip());
        Self {
            center: p0.add(off),
            r2: off.mag2(),
        }
    }

    /// The sphere through four points, falling back to the smallest enclosing circle-ball of
    /// three of them when the points are coplanar.
    fn circum4(p0: Point3, p1: Point3, p2: Point3, p3: Point3) -> Self {
        let [a, b, c] = [p1, p2, p3].map(|p| p.sub(p0));
        let det = dot_prod(a, xprod(b, c));
        let scale = a.mag() * b.mag() * c.mag();

        if det.abs() <= 1e-12 * scale {
            let pts = [p0, p1, p2, p3];
            let tris = [[0, 1, 2], [0, 1, 3], [0, 2, 3], [1, 2, 3]];
            let balls = tris.map(|[i, j, k]| Self::circum3(pts[i], pts[j], pts[k]));
            return balls
                .iter()
                .filter(|ball| ball.contains_all(&pts))
                .min_by(|x, y| x.r2.total_cmp(&y.r2))
                .or_else(|| balls.iter().max_by(|x, y| x.r2.total_cmp(&y.r2)))
                .copied()
                .unwrap_or(Self::EMPTY);
        }

        // 2 (pi - p0) . c = |pi - p0|², solved by Cramer's rule
        let [ra, rb, rc] = [a, b, c].map(|v| v.mag2());
        let off = xprod(b, c)
            .scale(ra)
            .add(xprod(c, a).scale(rb))
            .add(xprod(a, b).scale(rc))
            .scale((2.0 * det).recip());

        Self {
            center: p0.add(off),
            r2: off.mag2(),
        }
    }

    fn contains_all(&self, pts: &[Point3]) -> bool {
        pts.iter().all(|&p| self.contains(p))
    }
}

/// Move-to-front minimal ball of `pts[..end]` with `support` on the boundary.
///
/// Recursion depth is bounded by the support size (at most 4).
fn mtf_ball(pts: &mut [Point3], end: usize, support: &mut Vec<Point3>) -> Ball {
    let mut ball = Ball::from_support(support);
    if support.len() == 4 {
        return ball;
    }

    for i in 0..end {
        if ball.contains(pts[i]) {
            continue;
        }

        support.push(pts[i]);
        ball = mtf_ball(pts, i, support);
        support.pop();
        pts[..=i].rotate_right(1);
    }

    ball
}
