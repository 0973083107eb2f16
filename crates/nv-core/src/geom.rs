//! Geometry primitives shared by the spatial index, the solver and the
//! planner.
//!
//! Positions are `glam::Vec3` with **Y up**.  Local avoidance and grid
//! planning both work on the XZ ground plane; [`ground`] and [`lift`] convert
//! between the two representations.

use glam::{Vec2, Vec3};

/// Project a 3-D vector onto the XZ ground plane.
#[inline]
pub fn ground(v: Vec3) -> Vec2 {
    Vec2::new(v.x, v.z)
}

/// Geometry lying entirely below `base + FLOOR_CLEARANCE` is walked over
/// rather than avoided or planned around.
pub const FLOOR_CLEARANCE: f32 = 0.05;

/// Lift a ground-plane vector back to 3-D with the given `y`.
#[inline]
pub fn lift(v: Vec2, y: f32) -> Vec3 {
    Vec3::new(v.x, y, v.y)
}

// ── Aabb ──────────────────────────────────────────────────────────────────────

/// Axis-aligned bounding box.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    #[inline]
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min: min.min(max), max: min.max(max) }
    }

    /// Bounding cube of a sphere.
    #[inline]
    pub fn from_sphere(center: Vec3, radius: f32) -> Self {
        let r = Vec3::splat(radius.max(0.0));
        Self { min: center - r, max: center + r }
    }

    /// Smallest box containing every point.  Returns `None` for an empty
    /// iterator.
    pub fn from_points<I: IntoIterator<Item = Vec3>>(points: I) -> Option<Self> {
        let mut it = points.into_iter();
        let first = it.next()?;
        let (min, max) = it.fold((first, first), |(lo, hi), p| (lo.min(p), hi.max(p)));
        Some(Self { min, max })
    }

    /// Grow the box by `margin` on every side.
    #[inline]
    pub fn expanded(self, margin: f32) -> Self {
        let m = Vec3::splat(margin);
        Self { min: self.min - m, max: self.max + m }
    }

    #[inline]
    pub fn union(self, other: Aabb) -> Self {
        Self { min: self.min.min(other.min), max: self.max.max(other.max) }
    }

    /// Closed-interval overlap test (touching boxes intersect).
    #[inline]
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.cmple(other.max).all() && other.min.cmple(self.max).all()
    }

    #[inline]
    pub fn contains_point(&self, p: Vec3) -> bool {
        self.min.cmple(p).all() && p.cmple(self.max).all()
    }

    /// Squared distance from `p` to the box (0 inside).
    #[inline]
    pub fn distance_sq_to_point(&self, p: Vec3) -> f32 {
        let clamped = p.clamp(self.min, self.max);
        (p - clamped).length_squared()
    }

    /// `true` if the sphere `(center, radius)` touches the box.
    #[inline]
    pub fn intersects_sphere(&self, center: Vec3, radius: f32) -> bool {
        self.distance_sq_to_point(center) <= radius * radius
    }

    /// `true` if the box's Y extent overlaps `[lo, hi]`.
    #[inline]
    pub fn overlaps_vertical(&self, lo: f32, hi: f32) -> bool {
        self.max.y >= lo && self.min.y <= hi
    }
}

// ── Triangle ──────────────────────────────────────────────────────────────────

/// One piece of static world geometry.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Triangle {
    pub a: Vec3,
    pub b: Vec3,
    pub c: Vec3,
}

impl Triangle {
    #[inline]
    pub fn new(a: Vec3, b: Vec3, c: Vec3) -> Self {
        Self { a, b, c }
    }

    #[inline]
    pub fn aabb(&self) -> Aabb {
        Aabb {
            min: self.a.min(self.b).min(self.c),
            max: self.a.max(self.b).max(self.c),
        }
    }

    /// Closest point on the triangle (including its interior) to `p`.
    ///
    /// Voronoi-region walk: vertex regions, then edge regions, then the face.
    /// Degenerate triangles fall through to one of the edge/vertex cases.
    pub fn closest_point(&self, p: Vec3) -> Vec3 {
        let (a, b, c) = (self.a, self.b, self.c);
        let ab = b - a;
        let ac = c - a;

        let ap = p - a;
        let d1 = ab.dot(ap);
        let d2 = ac.dot(ap);
        if d1 <= 0.0 && d2 <= 0.0 {
            return a;
        }

        let bp = p - b;
        let d3 = ab.dot(bp);
        let d4 = ac.dot(bp);
        if d3 >= 0.0 && d4 <= d3 {
            return b;
        }

        let vc = d1 * d4 - d3 * d2;
        if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
            let v = d1 / (d1 - d3);
            return a + ab * v;
        }

        let cp = p - c;
        let d5 = ab.dot(cp);
        let d6 = ac.dot(cp);
        if d6 >= 0.0 && d5 <= d6 {
            return c;
        }

        let vb = d5 * d2 - d1 * d6;
        if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
            let w = d2 / (d2 - d6);
            return a + ac * w;
        }

        let va = d3 * d6 - d5 * d4;
        if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
            let w = (d4 - d3) / ((d4 - d3) + (d5 - d6));
            return b + (c - b) * w;
        }

        let denom = va + vb + vc;
        if denom.abs() <= f32::EPSILON {
            // Collinear vertices that slipped past the region tests.
            return a;
        }
        let inv = 1.0 / denom;
        a + ab * (vb * inv) + ac * (vc * inv)
    }

    /// Squared distance from `p` to the triangle.
    #[inline]
    pub fn distance_sq(&self, p: Vec3) -> f32 {
        (self.closest_point(p) - p).length_squared()
    }
}
