//! Transform controller: the drag state machine and mode math.
//!
//! One explicit state struct owns everything a gesture needs: the
//! drag-start patch snapshot, the fixed pivot, resolved axis directions
//! and the start pointer. Every pointer-move recomputes the live
//! geometry **from the start snapshot** with the gesture's total delta.
//! Nothing is applied incrementally; a drag chopped into N moves lands
//! exactly where one move with the same total delta would.

use crate::pivot::{Pivot, compute_pivot};
use glam::{Quat, Vec3};
use log::{debug, trace};
use pm_core::model::{Patch, PatchBasis, PatchId, PatchRole};
use pm_core::registry::PatchSet;
use pm_core::EngineConfig;
use pm_scene::CameraState;

// ─── Modes ───────────────────────────────────────────────────────────────

/// How pointer motion is interpreted while dragging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransformMode {
    #[default]
    Translate,
    Rotate,
    Scale,
    /// Single-axis movement along the patch's own current basis
    /// directions, independent of camera orientation.
    Slide,
}

/// Whether an engaged axis handle means the patch basis direction or the
/// matching world axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransformSpace {
    #[default]
    Local,
    World,
}

/// Axis handles a host can engage for rotate/scale/slide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    U,
    V,
    Normal,
}

impl Axis {
    pub fn world_dir(self) -> Vec3 {
        match self {
            Self::U => Vec3::X,
            Self::V => Vec3::Z,
            Self::Normal => Vec3::Y,
        }
    }

    pub fn basis_dir(self, basis: &PatchBasis) -> Vec3 {
        match self {
            Self::U => basis.eu,
            Self::V => basis.ev,
            Self::Normal => basis.normal,
        }
    }
}

// ─── Drag state ──────────────────────────────────────────────────────────

/// Which parts of the patch a gesture moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Affected {
    /// All three points (or the rigid frame, for translate/slide).
    Whole,
    /// A single point.
    One(PatchRole),
    /// Both endpoints of an edge; the opposite point stays fixed.
    Two(PatchRole, PatchRole),
}

/// Everything captured at pointer-down, fixed for the whole gesture.
#[derive(Debug, Clone)]
struct DragContext {
    mode: TransformMode,
    patch: PatchId,
    affected: Affected,
    pivot: Pivot,
    /// Full drag-start snapshot; all math runs from this.
    start: Patch,
    start_pointer: (f32, f32),
    /// Start pointer lifted onto the camera-facing plane through the pivot.
    start_lift: Vec3,
    /// Rotation axis resolved at drag start (engaged handle or view dir).
    rotate_axis: Vec3,
    /// Engaged scale axis direction; `None` = uniform scale.
    scale_axis: Option<Vec3>,
    /// Basis direction the slide handle tracks.
    slide_dir: Vec3,
}

#[derive(Debug, Clone, Default)]
enum DragState {
    #[default]
    Idle,
    Dragging(Box<DragContext>),
}

/// Pointer-driven transform state machine.
#[derive(Debug, Default)]
pub struct TransformController {
    pub mode: TransformMode,
    pub space: TransformSpace,
    pub active_axis: Option<Axis>,
    state: DragState,
}

impl TransformController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging(_))
    }

    /// Patch currently being dragged, if any.
    pub fn dragging_patch(&self) -> Option<PatchId> {
        match &self.state {
            DragState::Dragging(ctx) => Some(ctx.patch),
            DragState::Idle => None,
        }
    }

    /// Enter `Dragging` from a pointer-down on a handle (or the surface:
    /// `role = None`). The pivot, snapshot, and axis directions are
    /// resolved here, once. Returns false if a drag is already running or
    /// the pointer ray grazes the pivot plane.
    pub fn begin_drag(
        &mut self,
        patch: &Patch,
        role: Option<PatchRole>,
        locked_main: bool,
        pointer: (f32, f32),
        camera: &CameraState,
    ) -> bool {
        if self.is_dragging() {
            return false;
        }

        let pivot = compute_pivot(patch, role, locked_main);
        let Some(start_lift) = camera.lift_to_plane(pointer.0, pointer.1, pivot.position) else {
            return false;
        };

        let handle_dir = self.active_axis.map(|axis| match self.space {
            TransformSpace::Local => axis.basis_dir(&pivot.basis),
            TransformSpace::World => axis.world_dir(),
        });
        // Slide handles always follow the patch's own basis edges.
        let slide_dir = match self.active_axis {
            Some(Axis::V) => pivot.basis.ev,
            _ => pivot.basis.eu,
        };

        let ctx = DragContext {
            mode: self.mode,
            patch: patch.id,
            affected: affected_points(self.mode, role, locked_main),
            pivot,
            start: patch.clone(),
            start_pointer: pointer,
            start_lift,
            rotate_axis: handle_dir.unwrap_or_else(|| camera.view_dir()),
            scale_axis: handle_dir,
            slide_dir,
        };
        debug!(
            "begin {:?} drag on {} ({role:?}), pivot {}",
            self.mode, patch.id, pivot.position
        );
        self.state = DragState::Dragging(Box::new(ctx));
        true
    }

    /// Apply the gesture's current total delta to the live patch.
    /// Returns true when geometry changed (the caller emits a
    /// non-committing notification). A vanished patch ends the drag
    /// without committing.
    pub fn update_drag(
        &mut self,
        set: &mut PatchSet,
        pointer: (f32, f32),
        camera: &CameraState,
        cfg: &EngineConfig,
    ) -> bool {
        let ctx = match &self.state {
            DragState::Dragging(ctx) => ctx.as_ref().clone(),
            DragState::Idle => return false,
        };
        let Some(live) = set.get_mut(ctx.patch) else {
            debug!("{} vanished mid-drag, aborting", ctx.patch);
            self.state = DragState::Idle;
            return false;
        };

        // All math runs from the start snapshot.
        live.origin = ctx.start.origin;
        live.main = ctx.start.main;
        live.u = ctx.start.u;
        live.v = ctx.start.v;

        let dx = pointer.0 - ctx.start_pointer.0;
        let dy = pointer.1 - ctx.start_pointer.1;

        match ctx.mode {
            TransformMode::Translate => {
                let Some(lift) = camera.lift_to_plane(pointer.0, pointer.1, ctx.pivot.position)
                else {
                    return false;
                };
                apply_offset(live, &ctx, lift - ctx.start_lift);
            }
            TransformMode::Slide => {
                let Some(lift) = camera.lift_to_plane(pointer.0, pointer.1, ctx.pivot.position)
                else {
                    return false;
                };
                // Scalar projection: displacement perpendicular to the
                // tracked direction is discarded.
                let along = (lift - ctx.start_lift).dot(ctx.slide_dir);
                apply_offset(live, &ctx, ctx.slide_dir * along);
            }
            TransformMode::Rotate => {
                let angle = (dx - cfg.rotate_vertical_weight * dy) * cfg.rotate_gain;
                let rot = Quat::from_axis_angle(ctx.rotate_axis, angle);
                for_each_affected(&ctx, |role| {
                    let orig = ctx.start.world_point(role).unwrap_or_default();
                    let new = ctx.pivot.position + rot * (orig - ctx.pivot.position);
                    live.set_world_point(role, new);
                });
            }
            TransformMode::Scale => {
                let factor = match ctx.scale_axis {
                    None => uniform_scale_factor(dy, cfg),
                    Some(_) => directional_scale_factor(dy, cfg),
                };
                for_each_affected(&ctx, |role| {
                    let orig = ctx.start.world_point(role).unwrap_or_default();
                    let offset = orig - ctx.pivot.position;
                    let scaled = match ctx.scale_axis {
                        None => offset * factor,
                        Some(axis) => {
                            // Only the component along the axis scales.
                            let par = axis * offset.dot(axis);
                            (offset - par) + par * factor
                        }
                    };
                    live.set_world_point(role, ctx.pivot.position + scaled);
                });
            }
        }

        trace!("{} {:?} dx={dx} dy={dy}", ctx.patch, ctx.mode);
        true
    }

    /// Leave `Dragging` on pointer-up. Returns the gesture's patch and
    /// mode so the caller can recenter, rebuild picks, and commit.
    pub fn end_drag(&mut self) -> Option<(PatchId, TransformMode)> {
        match std::mem::take(&mut self.state) {
            DragState::Dragging(ctx) => {
                debug!("end {:?} drag on {}", ctx.mode, ctx.patch);
                Some((ctx.patch, ctx.mode))
            }
            DragState::Idle => None,
        }
    }
}

// ─── Mode math ───────────────────────────────────────────────────────────

/// Target-set rules shared by all modes.
fn affected_points(mode: TransformMode, role: Option<PatchRole>, locked_main: bool) -> Affected {
    match role {
        None => Affected::Whole,
        Some(r) if r.is_edge() => {
            if locked_main {
                Affected::Whole
            } else {
                // edge_far_point is Some for every edge role.
                Affected::Two(PatchRole::Main, r.edge_far_point().unwrap_or(PatchRole::U))
            }
        }
        Some(r) => match mode {
            // Dragging a point rotates/scales the whole frame around it.
            TransformMode::Rotate | TransformMode::Scale => Affected::Whole,
            TransformMode::Translate | TransformMode::Slide => {
                if r == PatchRole::Main && locked_main {
                    Affected::Whole
                } else {
                    Affected::One(r)
                }
            }
        },
    }
}

fn for_each_affected(ctx: &DragContext, mut f: impl FnMut(PatchRole)) {
    match ctx.affected {
        Affected::Whole => {
            f(PatchRole::Main);
            f(PatchRole::U);
            f(PatchRole::V);
        }
        Affected::One(a) => f(a),
        Affected::Two(a, b) => {
            f(a);
            f(b);
        }
    }
}

/// Apply a world-space offset for translate/slide, honoring the target
/// set. Whole-frame moves shift the origin so relative coordinates stay
/// untouched.
fn apply_offset(live: &mut Patch, ctx: &DragContext, delta: Vec3) {
    match ctx.affected {
        Affected::Whole => live.origin = ctx.start.origin + delta,
        _ => for_each_affected(ctx, |role| {
            let orig = ctx.start.world_point(role).unwrap_or_default();
            live.set_world_point(role, orig + delta);
        }),
    }
}

/// `clamp(exp(−dy·α), min, max)` — exponential response to vertical drag.
fn uniform_scale_factor(dy: f32, cfg: &EngineConfig) -> f32 {
    (-dy * cfg.scale_gain)
        .exp()
        .clamp(cfg.scale_min, cfg.scale_max)
}

/// Directional scale remaps the raw log-factor through a soft knee so
/// motion near factor 1.0 is desensitized on both the shrink and expand
/// sides, then clamps to the same bounds.
fn directional_scale_factor(dy: f32, cfg: &EngineConfig) -> f32 {
    let t = -dy * cfg.scale_gain;
    let shaped = t * t.abs() / (t.abs() + cfg.directional_scale_knee);
    shaped.exp().clamp(cfg.scale_min, cfg.scale_max)
}
