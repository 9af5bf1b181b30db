//! Selection tracking.
//!
//! At most one patch is selected at a time; the role records which point
//! or edge was the most recent interaction target within that patch.
//! Selection survives single clicks on empty space (a sloppy drag release
//! must not deselect) and clears only on an explicit empty-space double
//! click.

use log::debug;
use pm_core::model::{PatchId, PatchRole};
use pm_core::EngineConfig;
use pm_scene::PickTarget;

/// The current selection: a patch and the role last interacted with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Selection {
    pub patch: Option<PatchId>,
    pub role: Option<PatchRole>,
}

/// Tracks selection state and empty-space double-click detection.
#[derive(Debug, Default)]
pub struct SelectionManager {
    selection: Selection,
    /// Last empty-space pointer-down: (x, y, time_ms).
    last_empty_down: Option<(f32, f32, f64)>,
}

impl SelectionManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn selected_patch(&self) -> Option<PatchId> {
        self.selection.patch
    }

    /// Apply a resolved pick on pointer-down.
    ///
    /// If the target belongs to the already-selected patch only the role
    /// updates — no deselect/reselect flicker. Otherwise the patch is
    /// selected with the picked role.
    pub fn on_pick(&mut self, target: &PickTarget) {
        let patch = target.patch();
        let role = target.role();
        if self.selection.patch != Some(patch) {
            debug!("select {patch} ({role:?})");
        }
        self.selection = Selection {
            patch: Some(patch),
            role,
        };
        self.last_empty_down = None;
    }

    /// Record an empty-space pointer-down. Returns `true` when it
    /// completed a double click and selection was cleared; a single click
    /// leaves selection untouched.
    pub fn on_empty_down(&mut self, x: f32, y: f32, time_ms: f64, cfg: &EngineConfig) -> bool {
        if let Some((px, py, pt)) = self.last_empty_down {
            let within_time = time_ms - pt <= cfg.double_click_ms;
            let travel = ((x - px).powi(2) + (y - py).powi(2)).sqrt();
            if within_time && travel <= cfg.double_click_slop_px {
                debug!("double click on empty space, clearing selection");
                self.clear();
                return true;
            }
        }
        self.last_empty_down = Some((x, y, time_ms));
        false
    }

    pub fn clear(&mut self) {
        self.selection = Selection::default();
        self.last_empty_down = None;
    }

    /// Drop the selection if it references `id` (e.g. after a delete or a
    /// snapshot replace that removed the patch).
    pub fn clear_if_patch(&mut self, id: PatchId) {
        if self.selection.patch == Some(id) {
            self.clear();
        }
    }
}
