//! Picking service: ray → interactive target resolution.
//!
//! Pick targets live in an id-indexed lookup table of geometric proxies,
//! kept separate from whatever the rendering backend draws. Resolution
//! uses strict priority — point handles first, then edge segments, then
//! surfaces — with screen-space tolerances derived from the camera so
//! thin edges stay pickable at any zoom level.

use crate::camera::{CameraState, Ray};
use glam::Vec3;
use log::trace;
use pm_core::model::{Patch, PatchId, PatchRole};
use pm_core::EngineConfig;
use smallvec::SmallVec;
use std::collections::HashMap;

// ─── Targets ─────────────────────────────────────────────────────────────

/// What a resolved pick refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickTarget {
    Point { patch: PatchId, role: PatchRole },
    Edge { patch: PatchId, role: PatchRole },
    Surface { patch: PatchId },
}

impl PickTarget {
    pub fn patch(&self) -> PatchId {
        match self {
            Self::Point { patch, .. } | Self::Edge { patch, .. } | Self::Surface { patch } => {
                *patch
            }
        }
    }

    /// The role within the patch, if the target names one.
    pub fn role(&self) -> Option<PatchRole> {
        match self {
            Self::Point { role, .. } | Self::Edge { role, .. } => Some(*role),
            Self::Surface { .. } => None,
        }
    }
}

/// Geometric proxy a target is tested against.
#[derive(Debug, Clone, Copy)]
enum PickShape {
    Point(Vec3),
    Segment(Vec3, Vec3),
    Quad { corner: Vec3, eu: Vec3, ev: Vec3 },
}

#[derive(Debug, Clone, Copy)]
struct PickEntry {
    target: PickTarget,
    shape: PickShape,
}

// ─── Pick set ────────────────────────────────────────────────────────────

/// Id-indexed table of pick entries, rebuilt whenever patch geometry
/// changes. Also owns the post-drag pick suppression window.
#[derive(Debug, Default)]
pub struct PickSet {
    entries: HashMap<u32, PickEntry>,
    by_patch: HashMap<PatchId, SmallVec<[u32; 6]>>,
    next_handle: u32,
    suppressed_until_ms: f64,
}

impl PickSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.by_patch.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Rebuild the table from current patch geometry: three point handles,
    /// the two basis edges, and the quad surface per patch.
    pub fn rebuild<'a>(&mut self, patches: impl Iterator<Item = &'a Patch>) {
        self.clear();
        for p in patches {
            let id = p.id;
            let m = p.world_main();
            let u = p.world_u();
            let v = p.world_v();

            self.insert(PickEntry {
                target: PickTarget::Point { patch: id, role: PatchRole::Main },
                shape: PickShape::Point(m),
            });
            self.insert(PickEntry {
                target: PickTarget::Point { patch: id, role: PatchRole::U },
                shape: PickShape::Point(u),
            });
            self.insert(PickEntry {
                target: PickTarget::Point { patch: id, role: PatchRole::V },
                shape: PickShape::Point(v),
            });
            self.insert(PickEntry {
                target: PickTarget::Edge { patch: id, role: PatchRole::EdgeU },
                shape: PickShape::Segment(m, u),
            });
            self.insert(PickEntry {
                target: PickTarget::Edge { patch: id, role: PatchRole::EdgeV },
                shape: PickShape::Segment(m, v),
            });
            self.insert(PickEntry {
                target: PickTarget::Surface { patch: id },
                shape: PickShape::Quad { corner: m, eu: u - m, ev: v - m },
            });
        }
    }

    fn insert(&mut self, entry: PickEntry) {
        let handle = self.next_handle;
        self.next_handle += 1;
        self.by_patch
            .entry(entry.target.patch())
            .or_default()
            .push(handle);
        self.entries.insert(handle, entry);
    }

    /// Handle ids registered for a patch (e.g. for host-side highlight).
    pub fn handles_of(&self, patch: PatchId) -> &[u32] {
        self.by_patch.get(&patch).map(|v| v.as_slice()).unwrap_or(&[])
    }

    // ── Suppression ──

    /// Open the post-drag suppression window: picks are ignored until
    /// `now_ms + suppress_ms` so the terminating pointer-up is not
    /// misread as a new empty-space click.
    pub fn note_drag_end(&mut self, now_ms: f64, suppress_ms: f64) {
        self.suppressed_until_ms = now_ms + suppress_ms;
    }

    pub fn is_suppressed(&self, now_ms: f64) -> bool {
        now_ms < self.suppressed_until_ms
    }

    // ── Resolution ──

    /// Resolve the topmost interactive target under `ray`.
    ///
    /// Priority is strict: any point hit beats any edge hit beats any
    /// surface hit; within a tier the hit closest along the ray wins.
    /// An empty table, or a call inside the suppression window, resolves
    /// to `None`.
    pub fn pick(
        &self,
        ray: &Ray,
        camera: &CameraState,
        cfg: &EngineConfig,
        now_ms: f64,
    ) -> Option<PickTarget> {
        if self.is_suppressed(now_ms) {
            trace!("pick suppressed");
            return None;
        }

        let wpp = camera.world_per_pixel(camera.target);
        let point_tol = wpp * cfg.point_pick_pixels;
        let edge_tol = wpp * cfg.edge_pick_pixels;

        let mut best_point: Option<(f32, PickTarget)> = None;
        let mut best_edge: Option<(f32, PickTarget)> = None;
        let mut best_surface: Option<(f32, PickTarget)> = None;

        for entry in self.entries.values() {
            match entry.shape {
                PickShape::Point(p) => {
                    if ray.distance_to_point(p) <= point_tol {
                        let t = ray.closest_t(p);
                        if best_point.is_none_or(|(bt, _)| t < bt) {
                            best_point = Some((t, entry.target));
                        }
                    }
                }
                PickShape::Segment(a, b) => {
                    let (d, t) = ray.distance_to_segment(a, b);
                    if d <= edge_tol && best_edge.is_none_or(|(bt, _)| t < bt) {
                        best_edge = Some((t, entry.target));
                    }
                }
                PickShape::Quad { corner, eu, ev } => {
                    if let Some(t) = ray.intersect_parallelogram(corner, eu, ev)
                        && best_surface.is_none_or(|(bt, _)| t < bt)
                    {
                        best_surface = Some((t, entry.target));
                    }
                }
            }
        }

        let resolved = best_point.or(best_edge).or(best_surface).map(|(_, t)| t);
        trace!("pick → {resolved:?}");
        resolved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn camera_at(dist: f32) -> CameraState {
        CameraState {
            position: Vec3::new(0.0, dist, 0.0),
            target: Vec3::ZERO,
            up: Vec3::Z,
            fov_y: 45f32.to_radians(),
            viewport_w: 800.0,
            viewport_h: 600.0,
        }
    }

    fn one_patch_set() -> (PickSet, Patch) {
        let patch = Patch::new(PatchId(0), Vec3::ZERO, 1.0);
        let mut set = PickSet::new();
        set.rebuild(std::iter::once(&patch));
        (set, patch)
    }

    #[test]
    fn empty_set_returns_none() {
        let set = PickSet::new();
        let cam = camera_at(10.0);
        let ray = Ray::new(cam.position, -cam.position);
        assert_eq!(set.pick(&ray, &cam, &EngineConfig::default(), 0.0), None);
    }

    #[test]
    fn point_beats_edge_and_surface() {
        let (set, patch) = one_patch_set();
        let cam = camera_at(10.0);
        let cfg = EngineConfig::default();

        // Straight down at `main`, which also lies on both edges and the
        // quad corner: must resolve to the point.
        let ray = Ray::new(
            patch.world_main() + Vec3::Y * 10.0,
            Vec3::NEG_Y,
        );
        let hit = set.pick(&ray, &cam, &cfg, 0.0).unwrap();
        assert_eq!(
            hit,
            PickTarget::Point { patch: PatchId(0), role: PatchRole::Main }
        );
    }

    #[test]
    fn edge_beats_surface() {
        let (set, patch) = one_patch_set();
        let cam = camera_at(10.0);
        let cfg = EngineConfig::default();

        // Over the middle of the main→u edge, away from all point handles.
        let mid = (patch.world_main() + patch.world_u()) * 0.5;
        let ray = Ray::new(mid + Vec3::Y * 10.0, Vec3::NEG_Y);
        let hit = set.pick(&ray, &cam, &cfg, 0.0).unwrap();
        assert_eq!(
            hit,
            PickTarget::Edge { patch: PatchId(0), role: PatchRole::EdgeU }
        );
    }

    #[test]
    fn surface_hit_in_quad_interior() {
        let (set, patch) = one_patch_set();
        let cam = camera_at(10.0);
        let cfg = EngineConfig::default();

        // Quad center is far from points and the two picked edges.
        let q = patch.quad();
        let center = (q[0] + q[2]) * 0.5;
        let ray = Ray::new(center + Vec3::Y * 10.0, Vec3::NEG_Y);
        let hit = set.pick(&ray, &cam, &cfg, 0.0).unwrap();
        assert_eq!(hit, PickTarget::Surface { patch: PatchId(0) });
    }

    #[test]
    fn edge_tolerance_tracks_zoom() {
        let (set, patch) = one_patch_set();
        let cfg = EngineConfig::default();
        let mid = (patch.world_main() + patch.world_u()) * 0.5;

        // A ray passing 4 px (at near-camera scale) beside the edge hits
        // at both zoom levels, because the tolerance is screen-space.
        for dist in [5.0_f32, 30.0] {
            let cam = camera_at(dist);
            let wpp = cam.world_per_pixel(cam.target);
            let offset = Vec3::Z * (wpp * 4.0);
            let ray = Ray::new(mid + offset + Vec3::Y * dist, Vec3::NEG_Y);
            let hit = set.pick(&ray, &cam, &cfg, 0.0);
            assert!(
                matches!(hit, Some(PickTarget::Edge { .. })),
                "dist {dist}: {hit:?}"
            );
        }
    }

    #[test]
    fn suppression_window_blocks_picks() {
        let (mut set, patch) = one_patch_set();
        let cam = camera_at(10.0);
        let cfg = EngineConfig::default();
        let ray = Ray::new(patch.world_main() + Vec3::Y * 10.0, Vec3::NEG_Y);

        set.note_drag_end(1000.0, cfg.pick_suppress_ms);
        assert_eq!(set.pick(&ray, &cam, &cfg, 1100.0), None, "inside window");
        assert!(set.pick(&ray, &cam, &cfg, 1200.0).is_some(), "after window");
    }

    #[test]
    fn handles_registered_per_patch() {
        let (set, _) = one_patch_set();
        assert_eq!(set.handles_of(PatchId(0)).len(), 6);
        assert!(set.handles_of(PatchId(99)).is_empty());
    }
}
