//! Capsule geometry and the distance and ray queries built on it.
//!
//! Every collision shape in the reference engine is a capsule: a segment
//! swept by a sphere. A sphere is a capsule with a degenerate segment.

use nalgebra::Vector3;

/// Iterations of the bracketing searches. Each halves (bisection) or
/// shrinks by a third (ternary search) the interval.
const SEARCH_ITERATIONS: usize = 64;

/// Segment `a`-`b` swept by a sphere of `radius`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Capsule {
    pub a: Vector3<f64>,
    pub b: Vector3<f64>,
    pub radius: f64,
}

impl Capsule {
    pub const fn new(a: Vector3<f64>, b: Vector3<f64>, radius: f64) -> Self {
        Self { a, b, radius }
    }

    pub const fn sphere(center: Vector3<f64>, radius: f64) -> Self {
        Self {
            a: center,
            b: center,
            radius,
        }
    }

    /// Signed distance from `p` to the surface; negative inside.
    pub fn distance_to_point(&self, p: &Vector3<f64>) -> f64 {
        point_segment_distance(p, &self.a, &self.b) - self.radius
    }

    /// Signed surface-to-surface distance; negative when overlapping.
    pub fn distance_to(&self, other: &Self) -> f64 {
        segment_segment_distance(&self.a, &self.b, &other.a, &other.b)
            - self.radius
            - other.radius
    }

    /// Signed distance to the half-space `z <= 0`.
    pub fn height_above_ground(&self) -> f64 {
        self.a.z.min(self.b.z) - self.radius
    }

    /// Fraction along `from -> to` of the first surface hit, or `None`.
    /// A ray starting inside the capsule hits at `0.0`.
    pub fn ray_fraction(&self, from: &Vector3<f64>, to: &Vector3<f64>) -> Option<f64> {
        let f = |t: f64| self.distance_to_point(&from.lerp(to, t));
        if f(0.0) <= 0.0 {
            return Some(0.0);
        }
        // Distance to a convex set is convex along a line, so the closest
        // approach brackets the first crossing.
        let t_min = minimize_convex(f);
        if f(t_min) > 0.0 {
            return None;
        }
        let (mut lo, mut hi) = (0.0, t_min);
        for _ in 0..SEARCH_ITERATIONS {
            let mid = 0.5 * (lo + hi);
            if f(mid) > 0.0 {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        Some(hi)
    }
}

/// Fraction along `from -> to` where the ray crosses `z = 0` going down.
pub fn ground_ray_fraction(from: &Vector3<f64>, to: &Vector3<f64>) -> Option<f64> {
    if from.z <= 0.0 {
        return Some(0.0);
    }
    (to.z <= 0.0).then(|| from.z / (from.z - to.z))
}

/// Euclidean distance from `p` to the segment `a`-`b`.
pub fn point_segment_distance(p: &Vector3<f64>, a: &Vector3<f64>, b: &Vector3<f64>) -> f64 {
    let ab = b - a;
    let len_sq = ab.norm_squared();
    let t = if len_sq > 0.0 {
        ((p - a).dot(&ab) / len_sq).clamp(0.0, 1.0)
    } else {
        0.0
    };
    (p - (a + ab * t)).norm()
}

/// Euclidean distance between segments `a0`-`a1` and `b0`-`b1`.
pub fn segment_segment_distance(
    a0: &Vector3<f64>,
    a1: &Vector3<f64>,
    b0: &Vector3<f64>,
    b1: &Vector3<f64>,
) -> f64 {
    let f = |s: f64| point_segment_distance(&a0.lerp(a1, s), b0, b1);
    f(minimize_convex(f))
}

/// Minimizer over `[0, 1]` of a convex function, by ternary search.
fn minimize_convex(f: impl Fn(f64) -> f64) -> f64 {
    let (mut lo, mut hi) = (0.0_f64, 1.0_f64);
    for _ in 0..SEARCH_ITERATIONS {
        let m1 = lo + (hi - lo) / 3.0;
        let m2 = hi - (hi - lo) / 3.0;
        if f(m1) <= f(m2) {
            hi = m2;
        } else {
            lo = m1;
        }
    }
    0.5 * (lo + hi)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
