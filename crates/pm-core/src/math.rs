//! Small geometric helpers shared across the workspace.
//!
//! Direction math here never divides by a length below `EPS`: degenerate
//! vectors fall back to a caller-supplied default axis instead.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Lengths below this are treated as zero.
pub const EPS: f32 = 1e-6;

/// Normalize `v`, substituting `fallback` when the length is near zero.
pub fn safe_normalize(v: Vec3, fallback: Vec3) -> Vec3 {
    let len = v.length();
    if len < EPS { fallback } else { v / len }
}

/// Build a right-handed orthonormal frame from two (possibly degenerate,
/// possibly non-orthogonal) edge vectors.
///
/// Returns `(x, y, z)` where `x` follows `eu`, `z` is the frame normal,
/// and `y` is `z × x` re-projected so the triple is orthonormal.
pub fn orthonormal_frame(eu: Vec3, ev: Vec3) -> (Vec3, Vec3, Vec3) {
    let x = safe_normalize(eu, Vec3::X);
    let n = safe_normalize(x.cross(ev), Vec3::Y);
    let y = n.cross(x);
    (x, y, n)
}

/// Axis-aligned bounding box, used for placement hints and reframing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self {
            min: min.min(max),
            max: min.max(max),
        }
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Grow to contain `p`.
    pub fn extend(&mut self, p: Vec3) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    /// Sample a point inside the box from three unit parameters.
    pub fn lerp(&self, t: Vec3) -> Vec3 {
        self.min + self.size() * t
    }
}

impl Default for Aabb {
    fn default() -> Self {
        Self {
            min: Vec3::splat(-1.0),
            max: Vec3::splat(1.0),
        }
    }
}

/// n-th point of the R3 low-discrepancy sequence, as unit parameters.
///
/// Used for default patch placement when the host supplies only a
/// bounding region: successive patches scatter evenly without a PRNG.
pub fn scatter_unit(n: u64) -> Vec3 {
    // Fractional powers of the plastic constant (generalized golden ratio).
    const A: [f64; 3] = [0.819_172_513_396, 0.671_043_606_703, 0.549_700_477_901];
    let n = n as f64 + 1.0;
    Vec3::new(
        (n * A[0]).fract() as f32,
        (n * A[1]).fract() as f32,
        (n * A[2]).fract() as f32,
    )
}
