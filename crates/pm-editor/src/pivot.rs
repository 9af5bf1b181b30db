//! Pivot computation.
//!
//! A drag's pivot and basis are computed exactly once, from the drag-start
//! snapshot, and held fixed for the whole gesture. This is the key
//! correctness invariant of the transform engine: per-frame math runs
//! from the start snapshot around a fixed pivot, so a drag applied over N
//! frames lands exactly where the same total delta applied in one frame
//! would.

use glam::Vec3;
use pm_core::model::{Patch, PatchBasis, PatchRole};

/// Fixed reference for a rotate/scale/slide gesture.
#[derive(Debug, Clone, Copy)]
pub struct Pivot {
    pub position: Vec3,
    /// Orthonormalized frame directions captured at drag start.
    pub basis: PatchBasis,
}

/// Compute the pivot for a drag beginning on `target` (None = surface /
/// whole-frame drag).
///
/// Rules:
/// - point handle → that point's current world position;
/// - edge on a non-locked patch → midpoint of that edge;
/// - edge on a locked patch, or no specific handle → the patch frame
///   origin.
///
/// Pure over the drag-start snapshot; must not be re-invoked mid-drag.
pub fn compute_pivot(patch: &Patch, target: Option<PatchRole>, locked_main: bool) -> Pivot {
    let basis = patch.basis();
    let position = match target {
        Some(role) if role.is_point() => {
            // world_point is Some for all point roles.
            patch.world_point(role).unwrap_or(patch.origin)
        }
        Some(role) if role.is_edge() && !locked_main => {
            patch.edge_midpoint(role).unwrap_or(patch.origin)
        }
        _ => patch.origin,
    };
    Pivot { position, basis }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pm_core::model::PatchId;
    use pretty_assertions::assert_eq;

    fn patch() -> Patch {
        Patch::new(PatchId(0), Vec3::ZERO, 2.0)
    }

    #[test]
    fn point_target_pivots_on_point() {
        let p = patch();
        let pivot = compute_pivot(&p, Some(PatchRole::U), false);
        assert_eq!(pivot.position, p.world_u());

        let pivot = compute_pivot(&p, Some(PatchRole::Main), true);
        assert_eq!(pivot.position, p.world_main());
    }

    #[test]
    fn edge_target_pivots_on_midpoint_when_unlocked() {
        let p = patch();
        let pivot = compute_pivot(&p, Some(PatchRole::EdgeU), false);
        let mid = (p.world_main() + p.world_u()) * 0.5;
        assert!((pivot.position - mid).length() < 1e-6);
    }

    #[test]
    fn edge_target_pivots_on_origin_when_locked() {
        let p = patch();
        let pivot = compute_pivot(&p, Some(PatchRole::EdgeU), true);
        assert_eq!(pivot.position, p.origin);
    }

    #[test]
    fn no_handle_pivots_on_origin() {
        let p = patch();
        let pivot = compute_pivot(&p, None, false);
        assert_eq!(pivot.position, p.origin);
        // Origin sits at the u/v midpoint.
        let mid = (p.world_u() + p.world_v()) * 0.5;
        assert!((pivot.position - mid).length() < 1e-6);
    }

    #[test]
    fn basis_is_unit_length() {
        let b = compute_pivot(&patch(), None, false).basis;
        assert!((b.eu.length() - 1.0).abs() < 1e-6);
        assert!((b.ev.length() - 1.0).abs() < 1e-6);
        assert!((b.normal.length() - 1.0).abs() < 1e-6);
    }
}
