use crate::*;

/// An axis aligned box as an implicit function, plus the ray and segment box tests.
#[derive(Copy, Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ImplicitBox {
    bounds: Bounds,
}

/// A segment clipped by a box. See [`ImplicitBox::intersect_with_line`].
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LineClip {
    /// Parameter where the segment enters the box.
    pub t0: f64,
    /// Parameter where the segment leaves the box.
    pub t1: f64,
    pub x0: Point3,
    pub x1: Point3,
    /// The face crossed on entry, `None` if `p1` is inside.
    ///
    /// Faces are numbered `xmin, xmax, ymin, ymax, zmin, zmax` as `0..6`.
    pub plane0: Option<usize>,
    /// The face crossed on exit, `None` if `p2` is inside.
    pub plane1: Option<usize>,
}

#[derive(Copy, Clone, PartialEq)]
enum Quadrant {
    Left,
    Right,
    Middle,
}

impl ImplicitBox {
    pub fn new(bounds: Bounds) -> Self {
        Self { bounds }
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn set_bounds(&mut self, bounds: Bounds) {
        self.bounds = bounds;
    }

    /// Grow the box to include `bounds`.
    pub fn add_bounds(&mut self, bounds: Bounds) {
        self.bounds = self.bounds.union(bounds);
    }

    /// Intersect the ray `origin + t * dir`, `t in [0, 1]`, with the box.
    ///
    /// Returns the first hit coordinate and its parameter `t`. An origin inside the box is a hit
    /// at `t = 0`. Zero components of `dir` are parallel to that axis and only hit if the
    /// origin lies within that slab.
    ///
    /// # Example
    /// ```rust
    /// # use cellgeom::*;
    /// let b = Bounds::from_array([-50.0, 50.0, -50.0, 50.0, -50.0, 50.0]);
    /// let hit = ImplicitBox::intersect_box(&b, [100.0, 0.0, 0.0], [-100.0, 0.0, 0.0]);
    /// assert_eq!(hit, Some(([50.0, 0.0, 0.0], 0.5)));
    /// ```
    pub fn intersect_box(bounds: &Bounds, origin: Point3, dir: Point3) -> Option<(Point3, f64)> {
        let mut inside = true;
        let mut quadrant = [Quadrant::Middle; 3];
        let mut candidate = [0.0; 3];

        for i in 0..3 {
            if origin[i] < bounds.min[i] {
                quadrant[i] = Quadrant::Left;
                candidate[i] = bounds.min[i];
                inside = false;
            } else if origin[i] > bounds.max[i] {
                quadrant[i] = Quadrant::Right;
                candidate[i] = bounds.max[i];
                inside = false;
            }
        }

        if inside {
            return Some((origin, 0.0));
        }

        // parametric distance to each candidate plane, parallel axes never qualify
        let max_t = [0, 1, 2].map(|i| {
            if quadrant[i] != Quadrant::Middle && dir[i] != 0.0 {
                (candidate[i] - origin[i]) / dir[i]
            } else {
                -1.0
            }
        });

        let mut which = 0;
        for i in 1..3 {
            if max_t[which] < max_t[i] {
                which = i;
            }
        }

        let t = max_t[which];
        if !(0.0..=1.0).contains(&t) {
            return None;
        }

        let mut coord = [0.0; 3];
        for i in 0..3 {
            if i == which {
                coord[i] = candidate[i];
            } else {
                coord[i] = origin[i] + t * dir[i];
                if coord[i] < bounds.min[i] || coord[i] > bounds.max[i] {
                    return None;
                }
            }
        }

        Some((coord, t))
    }

    /// Clip the finite segment `p1 -> p2` against the box.
    ///
    /// Returns `None` if no part of the segment lies within the box.
    pub fn intersect_with_line(bounds: &Bounds, p1: Point3, p2: Point3) -> Option<LineClip> {
        let d = p2.sub(p1);
        let (mut t0, mut t1) = (0.0_f64, 1.0_f64);
        let (mut plane0, mut plane1) = (None, None);

        for axis in 0..3 {
            let (lo, hi) = (bounds.min[axis], bounds.max[axis]);
            if d[axis] == 0.0 {
                if p1[axis] < lo || p1[axis] > hi {
                    return None;
                }
                continue;
            }

            let ta = (lo - p1[axis]) / d[axis];
            let tb = (hi - p1[axis]) / d[axis];
            let (tn, pn, tf, pf) = if ta <= tb {
                (ta, 2 * axis, tb, 2 * axis + 1)
            } else {
                (tb, 2 * axis + 1, ta, 2 * axis)
            };

            if tn > t0 {
                t0 = tn;
                plane0 = Some(pn);
            }
            if tf < t1 {
                t1 = tf;
                plane1 = Some(pf);
            }
            if t0 > t1 {
                return None;
            }
        }

        Some(LineClip {
            t0,
            t1,
            x0: p1.add(d.scale(t0)),
            x1: p1.add(d.scale(t1)),
            plane0,
            plane1,
        })
    }
}

impl ImplicitFunction for ImplicitBox {
    /// Signed distance: the negated distance to the nearest face inside, the Euclidean distance
    /// to the box outside.
    fn evaluate_function(&self, x: Point3) -> f64 {
        let Bounds { min, max } = self.bounds;
        let mut inside = true;
        let mut min_distance = f64::NEG_INFINITY;
        let mut distance = 0.0;

        for i in 0..3 {
            let diff = max[i] - min[i];
            if diff != 0.0 {
                let t = (x[i] - min[i]) / diff;
                if t < 0.0 {
                    inside = false;
                    distance += (min[i] - x[i]).powi(2);
                } else if t > 1.0 {
                    inside = false;
                    distance += (x[i] - max[i]).powi(2);
                } else {
                    let d = if t <= 0.5 {
                        min[i] - x[i]
                    } else {
                        x[i] - max[i]
                    };
                    min_distance = min_distance.max(d);
                }
            } else {
                // flat axis, anything off the slab is outside
                let d = (x[i] - min[i]).abs();
                if d > 0.0 {
                    inside = false;
                    distance += d * d;
                }
            }
        }

        if inside {
            // a box flat on every axis only contains its single point
            if min_distance == f64::NEG_INFINITY {
                0.0
            } else {
                min_distance
            }
        } else {
            distance.sqrt()
        }
    }

    /// Inside, the unit normal of the nearest face. Outside, the unit direction from the
    /// closest box point to `x`.
    fn evaluate_gradient(&self, x: Point3) -> Point3 {
        let b = self.bounds;
        if b.envelops(x) {
            let mut best = f64::INFINITY;
            let mut grad = Point3::zero();
            for i in 0..3 {
                let to_min = x[i] - b.min[i];
                let to_max = b.max[i] - x[i];
                if to_min < best {
                    best = to_min;
                    grad = Point3::zero();
                    grad[i] = -1.0;
                }
                if to_max < best {
                    best = to_max;
                    grad = Point3::zero();
                    grad[i] = 1.0;
                }
            }
            grad
        } else {
            x.sub(b.clamp(x)).unit()
        }
    }
}
