//! Camera state and ray math.
//!
//! The engine performs its own ray queries against a geometric pick table,
//! so the only camera inputs it needs are position/target/fov/viewport.
//! Pointer motion is lifted from 2D to 3D by intersecting the pointer ray
//! with the camera-facing plane through a drag anchor.

use glam::Vec3;
use pm_core::EngineConfig;
use pm_core::math::{EPS, safe_normalize};

// ─── Ray ─────────────────────────────────────────────────────────────────

/// A world-space ray with normalized direction.
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    pub origin: Vec3,
    pub dir: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, dir: Vec3) -> Self {
        Self {
            origin,
            dir: safe_normalize(dir, Vec3::NEG_Z),
        }
    }

    pub fn point_at(&self, t: f32) -> Vec3 {
        self.origin + self.dir * t
    }

    /// Ray parameter of the point on the ray closest to `p` (clamped ≥ 0).
    pub fn closest_t(&self, p: Vec3) -> f32 {
        (p - self.origin).dot(self.dir).max(0.0)
    }

    /// Distance from the ray to a point.
    pub fn distance_to_point(&self, p: Vec3) -> f32 {
        (p - self.point_at(self.closest_t(p))).length()
    }

    /// Closest distance between the ray and the segment `a..b`, plus the
    /// ray parameter of the closest approach.
    pub fn distance_to_segment(&self, a: Vec3, b: Vec3) -> (f32, f32) {
        let u = self.dir;
        let v = b - a;
        let w0 = self.origin - a;

        let aa = u.dot(u);
        let bb = u.dot(v);
        let cc = v.dot(v);
        let dd = u.dot(w0);
        let ee = v.dot(w0);

        if cc < EPS {
            // Degenerate segment.
            let t = self.closest_t(a);
            return ((a - self.point_at(t)).length(), t);
        }

        let denom = aa * cc - bb * bb;
        let mut s = if denom < EPS {
            0.0
        } else {
            ((aa * ee - bb * dd) / denom).clamp(0.0, 1.0)
        };
        let t = ((s * bb - dd) / aa).max(0.0);
        s = ((t * bb + ee) / cc).clamp(0.0, 1.0);

        let dist = (self.point_at(t) - (a + v * s)).length();
        (dist, t)
    }

    /// Intersect with the plane through `point` with normal `normal`.
    pub fn intersect_plane(&self, point: Vec3, normal: Vec3) -> Option<Vec3> {
        let denom = self.dir.dot(normal);
        if denom.abs() < EPS {
            return None;
        }
        let t = (point - self.origin).dot(normal) / denom;
        if t < 0.0 {
            return None;
        }
        Some(self.point_at(t))
    }

    /// Intersect with the parallelogram spanned by `eu`, `ev` at `corner`.
    /// Returns the ray parameter of the hit.
    pub fn intersect_parallelogram(&self, corner: Vec3, eu: Vec3, ev: Vec3) -> Option<f32> {
        let n = eu.cross(ev);
        if n.length_squared() < EPS * EPS {
            return None;
        }
        let denom = self.dir.dot(n);
        if denom.abs() < EPS {
            return None;
        }
        let t = (corner - self.origin).dot(n) / denom;
        if t < 0.0 {
            return None;
        }

        // Solve hit − corner = s·eu + r·ev via the Gram system.
        let d = self.point_at(t) - corner;
        let a11 = eu.dot(eu);
        let a12 = eu.dot(ev);
        let a22 = ev.dot(ev);
        let det = a11 * a22 - a12 * a12;
        if det.abs() < EPS {
            return None;
        }
        let b1 = d.dot(eu);
        let b2 = d.dot(ev);
        let s = (b1 * a22 - b2 * a12) / det;
        let r = (b2 * a11 - b1 * a12) / det;
        if (0.0..=1.0).contains(&s) && (0.0..=1.0).contains(&r) {
            Some(t)
        } else {
            None
        }
    }
}

// ─── Camera ──────────────────────────────────────────────────────────────

/// Host-supplied camera parameters, refreshed per event/frame.
#[derive(Debug, Clone, Copy)]
pub struct CameraState {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    /// Vertical field of view, radians.
    pub fov_y: f32,
    pub viewport_w: f32,
    pub viewport_h: f32,
}

impl CameraState {
    pub fn view_dir(&self) -> Vec3 {
        safe_normalize(self.target - self.position, Vec3::NEG_Z)
    }

    /// Right/up/forward camera frame.
    pub fn frame(&self) -> (Vec3, Vec3, Vec3) {
        let forward = self.view_dir();
        let right = safe_normalize(forward.cross(self.up), Vec3::X);
        let up = right.cross(forward);
        (right, up, forward)
    }

    /// World units covered by one screen pixel at `focus` depth.
    pub fn world_per_pixel(&self, focus: Vec3) -> f32 {
        let dist = (focus - self.position).length().max(EPS);
        2.0 * dist * (self.fov_y * 0.5).tan() / self.viewport_h.max(1.0)
    }

    /// World-space scale giving a handle a constant apparent pixel size.
    pub fn handle_scale(&self, focus: Vec3, apparent_pixels: f32) -> f32 {
        self.world_per_pixel(focus) * apparent_pixels
    }

    /// Ray through viewport pixel (px, py), origin at top-left.
    pub fn ray_through(&self, px: f32, py: f32) -> Ray {
        let (right, up, forward) = self.frame();
        let half_h = (self.fov_y * 0.5).tan();
        let aspect = self.viewport_w.max(1.0) / self.viewport_h.max(1.0);

        let ndc_x = (px / self.viewport_w.max(1.0)) * 2.0 - 1.0;
        let ndc_y = 1.0 - (py / self.viewport_h.max(1.0)) * 2.0;

        let dir = forward + right * (ndc_x * half_h * aspect) + up * (ndc_y * half_h);
        Ray::new(self.position, dir)
    }

    /// Lift a pointer position to 3D on the camera-facing plane through
    /// `anchor`. Returns `None` for grazing rays.
    pub fn lift_to_plane(&self, px: f32, py: f32, anchor: Vec3) -> Option<Vec3> {
        self.ray_through(px, py).intersect_plane(anchor, self.view_dir())
    }
}

/// Camera auto-reframing heuristic. `bounds_ratio` is current-to-framed
/// bounds size, `distance_ratio` is camera distance over the ideal
/// framing distance. The thresholds are empirical and configurable.
pub fn should_reframe(cfg: &EngineConfig, bounds_ratio: f32, distance_ratio: f32) -> bool {
    bounds_ratio > cfg.reframe_bounds_ratio || distance_ratio > cfg.reframe_distance_ratio
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn test_camera() -> CameraState {
        CameraState {
            position: Vec3::new(0.0, 0.0, 10.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
            fov_y: 45f32.to_radians(),
            viewport_w: 800.0,
            viewport_h: 600.0,
        }
    }

    #[test]
    fn center_ray_points_at_target() {
        let cam = test_camera();
        let ray = cam.ray_through(400.0, 300.0);
        assert!((ray.dir - Vec3::NEG_Z).length() < 1e-5);
    }

    #[test]
    fn ray_point_distance() {
        let ray = Ray::new(Vec3::ZERO, Vec3::X);
        assert!((ray.distance_to_point(Vec3::new(5.0, 3.0, 0.0)) - 3.0).abs() < 1e-5);
        // Behind the origin: clamped to the origin.
        assert!((ray.distance_to_point(Vec3::new(-4.0, 0.0, 0.0)) - 4.0).abs() < 1e-5);
    }

    #[test]
    fn ray_segment_distance() {
        let ray = Ray::new(Vec3::ZERO, Vec3::X);
        let (d, t) = ray.distance_to_segment(Vec3::new(5.0, 1.0, -1.0), Vec3::new(5.0, 1.0, 1.0));
        assert!((d - 1.0).abs() < 1e-4, "d = {d}");
        assert!((t - 5.0).abs() < 1e-3);

        // Parallel segment.
        let (d, _) = ray.distance_to_segment(Vec3::new(0.0, 2.0, 0.0), Vec3::new(9.0, 2.0, 0.0));
        assert!((d - 2.0).abs() < 1e-4);
    }

    #[test]
    fn parallelogram_hit_and_miss() {
        let ray = Ray::new(Vec3::new(0.5, 5.0, 0.5), Vec3::NEG_Y);
        let t = ray.intersect_parallelogram(Vec3::ZERO, Vec3::X, Vec3::Z);
        assert!(t.is_some());
        assert!((t.unwrap() - 5.0).abs() < 1e-4);

        let miss = Ray::new(Vec3::new(1.5, 5.0, 0.5), Vec3::NEG_Y);
        assert_eq!(miss.intersect_parallelogram(Vec3::ZERO, Vec3::X, Vec3::Z), None);
    }

    #[test]
    fn world_per_pixel_scales_with_distance() {
        let cam = test_camera();
        let near = cam.world_per_pixel(Vec3::new(0.0, 0.0, 5.0));
        let far = cam.world_per_pixel(Vec3::new(0.0, 0.0, -10.0));
        assert!((far / near - 4.0).abs() < 1e-4, "20 units vs 5 units");
    }

    #[test]
    fn lift_to_plane_recovers_anchor_depth() {
        let cam = test_camera();
        let anchor = Vec3::new(1.0, 1.0, 0.0);
        let p = cam.lift_to_plane(400.0, 300.0, anchor).unwrap();
        // Center ray hits the plane z = 0 at the origin.
        assert!(p.length() < 1e-4);
    }

    #[test]
    fn reframe_thresholds() {
        let cfg = EngineConfig::default();
        assert!(!should_reframe(&cfg, 1.5, 2.0));
        assert!(should_reframe(&cfg, 2.5, 1.0));
        assert!(should_reframe(&cfg, 1.0, 7.0));
    }
}
