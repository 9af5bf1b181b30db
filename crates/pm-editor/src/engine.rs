//! The engine facade.
//!
//! `PatchEngine` owns the registry, selection, transform controller, pick
//! table, and history, and exposes the command surface the host UI
//! drives. The host feeds it normalized input events plus the current
//! camera, and registers a change callback via `configure`; the engine
//! emits non-committing notifications on every drag frame and exactly one
//! committing notification per gesture end or direct edit.

use crate::drag::{Axis, TransformController, TransformMode, TransformSpace};
use crate::history::HistoryStack;
use crate::input::InputEvent;
use crate::selection::{Selection, SelectionManager};
use crate::shortcuts::{ShortcutAction, ShortcutMap};
use glam::Vec3;
use log::{debug, info};
use pm_core::dto::{PatchDto, parse_patches};
use pm_core::math::{Aabb, EPS};
use pm_core::model::{Color, PatchId, PatchRole};
use pm_core::registry::PatchSet;
use pm_core::EngineConfig;
use pm_scene::{CameraState, PickSet, should_reframe};

// ─── Notifications ───────────────────────────────────────────────────────

/// Metadata accompanying a change notification. `commit` marks a
/// history-worthy event; false means a live-preview update.
#[derive(Debug, Clone, Default)]
pub struct ChangeMeta {
    pub commit: bool,
    pub reason: Option<String>,
}

type ChangeCallback = Box<dyn FnMut(&[PatchDto], &ChangeMeta)>;

/// Per-frame display parameters computed by `frame_tick`.
#[derive(Debug, Clone, Copy)]
pub struct FrameInfo {
    /// World-space handle scale giving a constant apparent pixel size.
    pub handle_scale: f32,
    /// Current `main→u` and `main→v` directions of the selected patch,
    /// for the host to orient the slide handles.
    pub slide_axes: Option<(Vec3, Vec3)>,
    /// Whether the host should reframe its camera (empirical heuristic).
    pub reframe: bool,
}

// ─── Engine ──────────────────────────────────────────────────────────────

pub struct PatchEngine {
    config: EngineConfig,
    registry: PatchSet,
    selection: SelectionManager,
    controller: TransformController,
    picks: PickSet,
    history: HistoryStack,
    /// Re-read on every notification; replaced wholesale by `configure`.
    on_patches_change: Option<ChangeCallback>,
    placement_region: Aabb,
    /// Bounds extent at the last host reframe, for the reframe heuristic.
    framed_extent: Option<f32>,
}

impl PatchEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            history: HistoryStack::new(config.history_depth),
            config,
            registry: PatchSet::new(),
            selection: SelectionManager::new(),
            controller: TransformController::new(),
            picks: PickSet::new(),
            on_patches_change: None,
            placement_region: Aabb::default(),
            framed_extent: None,
        }
    }

    /// Register the host change callback. The engine re-reads this cell
    /// per event, so reconfiguring mid-session never leaves a stale
    /// capture behind.
    pub fn configure(&mut self, on_patches_change: impl FnMut(&[PatchDto], &ChangeMeta) + 'static) {
        self.on_patches_change = Some(Box::new(on_patches_change));
    }

    // ── Queries ──

    pub fn get_patches(&self) -> Vec<PatchDto> {
        self.registry.to_dtos()
    }

    pub fn selection(&self) -> Selection {
        self.selection.selection()
    }

    /// While true, the host should disable camera navigation and route
    /// all pointer moves here.
    pub fn is_dragging(&self) -> bool {
        self.controller.is_dragging()
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn transform_mode(&self) -> TransformMode {
        self.controller.mode
    }

    pub fn transform_space(&self) -> TransformSpace {
        self.controller.space
    }

    pub fn is_main_locked(&self, id: PatchId) -> bool {
        self.registry.is_locked_main(id)
    }

    // ── Patch lifecycle commands ──

    /// Create a patch at `center`, or scattered inside the placement
    /// region when no center is given. Declined (None) while a drag is in
    /// progress.
    pub fn add_patch(&mut self, center: Option<Vec3>) -> Option<PatchId> {
        if self.controller.is_dragging() {
            return None;
        }
        let extent = self.config.default_extent;
        let id = match center {
            Some(c) => self.registry.create(c, extent),
            None => self.registry.create_placed(self.placement_region, extent),
        };
        self.rebuild_picks();
        self.commit_and_notify("add patch");
        Some(id)
    }

    /// Delete the selected patch, clearing the selection that referenced
    /// it. No-op without a selection or while dragging.
    pub fn delete_selected_patch(&mut self) -> bool {
        if self.controller.is_dragging() {
            return false;
        }
        let Some(id) = self.selection.selected_patch() else {
            return false;
        };
        if !self.registry.delete(id) {
            return false;
        }
        self.selection.clear_if_patch(id);
        self.rebuild_picks();
        self.commit_and_notify("delete patch");
        true
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Atomic full replace from external DTOs (load). Declined while a
    /// drag is in progress.
    pub fn set_patches(&mut self, dtos: &[PatchDto]) -> Result<(), String> {
        if self.controller.is_dragging() {
            return Err("cannot replace patches during a drag".into());
        }
        self.registry.replace_all(dtos);
        self.drop_stale_selection();
        self.rebuild_picks();
        self.commit_and_notify("load patches");
        Ok(())
    }

    /// `set_patches` from a JSON string — the structural-validation
    /// boundary for untyped host data.
    pub fn set_patches_json(&mut self, json: &str) -> Result<(), String> {
        let dtos = parse_patches(json)?;
        self.set_patches(&dtos)
    }

    pub fn rename_patch(&mut self, id: PatchId, name: &str) -> bool {
        if !self.registry.rename(id, name) {
            return false;
        }
        self.commit_and_notify("rename patch");
        true
    }

    pub fn update_patch_color(&mut self, id: PatchId, hex: &str) -> Result<(), String> {
        let color = Color::from_hex(hex).ok_or_else(|| format!("invalid color {hex:?}"))?;
        if !self.registry.recolor(id, color) {
            return Err(format!("unknown patch {id}"));
        }
        self.commit_and_notify("recolor patch");
        Ok(())
    }

    /// Direct coordinate edit of one point (from a host panel). The local
    /// origin recenters afterwards, as for any non-drag edit. Declined
    /// for edge roles and while dragging.
    pub fn update_point_world(&mut self, id: PatchId, role: PatchRole, pos: Vec3) -> bool {
        if self.controller.is_dragging() || !role.is_point() {
            return false;
        }
        let Some(patch) = self.registry.get_mut(id) else {
            return false;
        };
        patch.set_world_point(role, pos);
        patch.recenter();
        self.rebuild_picks();
        self.commit_and_notify("edit point");
        true
    }

    pub fn set_main_locked(&mut self, id: PatchId, locked: bool) -> bool {
        self.registry.set_locked_main(id, locked)
    }

    /// The region used for default placement when `add_patch` gets no
    /// center (host hint, e.g. the trajectory bounds).
    pub fn set_placement_region(&mut self, region: Aabb) {
        self.placement_region = region;
    }

    // ── Transform configuration ──

    pub fn set_transform_mode(&mut self, mode: TransformMode) {
        debug!("transform mode → {mode:?}");
        self.controller.mode = mode;
    }

    pub fn set_transform_space(&mut self, space: TransformSpace) {
        self.controller.space = space;
    }

    pub fn set_active_axis(&mut self, axis: Option<Axis>) {
        self.controller.active_axis = axis;
    }

    // ── History ──

    /// Force a history push of the current state.
    pub fn commit(&mut self, reason: Option<&str>) {
        self.history.commit(self.registry.to_dtos());
        self.notify(true, reason);
    }

    pub fn undo(&mut self) -> bool {
        let Some(snapshot) = self.history.undo() else {
            return false;
        };
        info!("undo → {} patches", snapshot.len());
        self.apply_history_snapshot(&snapshot, "undo");
        true
    }

    pub fn redo(&mut self) -> bool {
        let Some(snapshot) = self.history.redo() else {
            return false;
        };
        info!("redo → {} patches", snapshot.len());
        self.apply_history_snapshot(&snapshot, "redo");
        true
    }

    fn apply_history_snapshot(&mut self, snapshot: &[PatchDto], reason: &str) {
        // Guard: the notification below must not trigger a new commit.
        self.history.begin_apply();
        self.registry.replace_all(snapshot);
        self.drop_stale_selection();
        self.rebuild_picks();
        self.notify(true, Some(reason));
        self.history.end_apply();
    }

    // ── Input dispatch ──

    /// Feed one normalized input event. The host supplies the current
    /// camera alongside; while a drag is running all pointer moves go to
    /// the transform controller and picking is not consulted.
    pub fn handle_event(&mut self, event: &InputEvent, camera: &CameraState) {
        match event {
            InputEvent::PointerDown { x, y, time_ms, .. } => {
                if self.controller.is_dragging() {
                    return;
                }
                let ray = camera.ray_through(*x, *y);
                match self.picks.pick(&ray, camera, &self.config, *time_ms) {
                    Some(target) => {
                        self.selection.on_pick(&target);
                        let id = target.patch();
                        let locked = self.registry.is_locked_main(id);
                        if let Some(patch) = self.registry.get(id).cloned() {
                            self.controller.begin_drag(
                                &patch,
                                target.role(),
                                locked,
                                (*x, *y),
                                camera,
                            );
                        }
                    }
                    None => {
                        self.selection.on_empty_down(*x, *y, *time_ms, &self.config);
                    }
                }
            }
            InputEvent::PointerMove { x, y, .. } => {
                if self.controller.is_dragging()
                    && self
                        .controller
                        .update_drag(&mut self.registry, (*x, *y), camera, &self.config)
                {
                    self.notify(false, None);
                }
            }
            InputEvent::PointerUp { time_ms, .. } => {
                if let Some((id, mode)) = self.controller.end_drag() {
                    if let Some(patch) = self.registry.get_mut(id) {
                        patch.recenter();
                    }
                    self.picks
                        .note_drag_end(*time_ms, self.config.pick_suppress_ms);
                    self.rebuild_picks();
                    let reason = match mode {
                        TransformMode::Translate => "translate",
                        TransformMode::Rotate => "rotate",
                        TransformMode::Scale => "scale",
                        TransformMode::Slide => "slide",
                    };
                    self.commit_and_notify(reason);
                }
            }
            InputEvent::KeyDown { key, modifiers } => {
                if let Some(action) = ShortcutMap::resolve(key, *modifiers) {
                    self.apply_shortcut(action);
                }
            }
        }
    }

    fn apply_shortcut(&mut self, action: ShortcutAction) {
        match action {
            ShortcutAction::ModeTranslate => self.set_transform_mode(TransformMode::Translate),
            ShortcutAction::ModeRotate => self.set_transform_mode(TransformMode::Rotate),
            ShortcutAction::ModeScale => self.set_transform_mode(TransformMode::Scale),
            ShortcutAction::ModeSlide => self.set_transform_mode(TransformMode::Slide),
            ShortcutAction::ToggleSpace => {
                self.controller.space = match self.controller.space {
                    TransformSpace::Local => TransformSpace::World,
                    TransformSpace::World => TransformSpace::Local,
                };
            }
            ShortcutAction::ToggleLockMain => {
                if let Some(id) = self.selection.selected_patch() {
                    let locked = self.registry.is_locked_main(id);
                    self.registry.set_locked_main(id, !locked);
                }
            }
            ShortcutAction::Undo => {
                self.undo();
            }
            ShortcutAction::Redo => {
                self.redo();
            }
            ShortcutAction::Delete => {
                self.delete_selected_patch();
            }
            ShortcutAction::AddPatch => {
                self.add_patch(None);
            }
            ShortcutAction::Deselect => self.clear_selection(),
        }
    }

    // ── Per-frame display pass ──

    /// Per-frame read-only pass: refreshes slide-handle directions for
    /// the selected patch and derives display parameters. Never mutates
    /// patch points.
    pub fn frame_tick(&mut self, camera: &CameraState) -> FrameInfo {
        let focus = self
            .selection
            .selected_patch()
            .and_then(|id| self.registry.get(id))
            .map(|p| p.origin)
            .or_else(|| self.registry.bounds().map(|b| b.center()))
            .unwrap_or(camera.target);

        let slide_axes = self
            .selection
            .selected_patch()
            .and_then(|id| self.registry.get(id))
            .map(|p| {
                let b = p.basis();
                (b.eu, b.ev)
            });

        let reframe = match self.registry.bounds() {
            Some(bounds) => {
                let extent = bounds.size().max_element().max(EPS);
                let framed = *self.framed_extent.get_or_insert(extent);
                let ideal = (extent * 0.5) / (camera.fov_y * 0.5).tan().max(EPS);
                let dist = (camera.position - bounds.center()).length();
                should_reframe(&self.config, extent / framed.max(EPS), dist / ideal.max(EPS))
            }
            None => false,
        };

        FrameInfo {
            handle_scale: camera.handle_scale(focus, self.config.handle_apparent_pixels),
            slide_axes,
            reframe,
        }
    }

    /// Host acknowledgment that it reframed the camera; resets the
    /// bounds-growth baseline of the reframe heuristic.
    pub fn note_reframed(&mut self) {
        self.framed_extent = self
            .registry
            .bounds()
            .map(|b| b.size().max_element().max(EPS));
    }

    // ── Internals ──

    fn rebuild_picks(&mut self) {
        self.picks.rebuild(self.registry.iter());
    }

    fn drop_stale_selection(&mut self) {
        if let Some(id) = self.selection.selected_patch()
            && self.registry.get(id).is_none()
        {
            self.selection.clear();
        }
    }

    fn commit_and_notify(&mut self, reason: &str) {
        self.history.commit(self.registry.to_dtos());
        self.notify(true, Some(reason));
    }

    fn notify(&mut self, commit: bool, reason: Option<&str>) {
        if let Some(cb) = self.on_patches_change.as_mut() {
            let dtos = self.registry.to_dtos();
            let meta = ChangeMeta {
                commit,
                reason: reason.map(str::to_string),
            };
            cb(&dtos, &meta);
        }
    }
}

impl Default for PatchEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn add_patch_commits_and_notifies() {
        let mut engine = PatchEngine::default();
        let log: Rc<RefCell<Vec<(usize, bool)>>> = Rc::default();
        let sink = log.clone();
        engine.configure(move |patches, meta| {
            sink.borrow_mut().push((patches.len(), meta.commit));
        });

        let id = engine.add_patch(Some(Vec3::ZERO)).unwrap();
        assert_eq!(id, PatchId(0));
        assert_eq!(log.borrow().as_slice(), &[(1, true)]);
        assert!(engine.can_undo());
    }

    #[test]
    fn default_placement_uses_region() {
        let mut engine = PatchEngine::default();
        engine.set_placement_region(Aabb::new(
            Vec3::new(5.0, 5.0, 5.0),
            Vec3::new(6.0, 6.0, 6.0),
        ));
        engine.add_patch(None).unwrap();
        let dto = &engine.get_patches()[0];
        assert!(dto.main[0] >= 4.0, "scattered inside the hinted region");
    }

    #[test]
    fn set_patches_is_atomic_replace() {
        let mut engine = PatchEngine::default();
        engine.add_patch(Some(Vec3::ZERO));
        engine.add_patch(Some(Vec3::ONE));

        engine
            .set_patches_json(r#"[{"id": 9, "main": [0,0,0], "u": [1,0,0], "v": [0,0,1]}]"#)
            .unwrap();
        let patches = engine.get_patches();
        assert_eq!(patches.len(), 1);
        assert_eq!(patches[0].id, 9);

        assert!(engine.set_patches_json("not json").is_err());
    }

    #[test]
    fn update_point_world_rejects_edge_roles() {
        let mut engine = PatchEngine::default();
        let id = engine.add_patch(Some(Vec3::ZERO)).unwrap();
        assert!(!engine.update_point_world(id, PatchRole::EdgeU, Vec3::ONE));
        assert!(engine.update_point_world(id, PatchRole::U, Vec3::new(3.0, 0.0, 0.0)));
        let dto = &engine.get_patches()[0];
        assert_eq!(dto.u, [3.0, 0.0, 0.0]);
    }

    #[test]
    fn undo_notification_does_not_recommit() {
        let mut engine = PatchEngine::default();
        engine.add_patch(Some(Vec3::ZERO));
        engine.add_patch(Some(Vec3::ONE));

        assert!(engine.undo());
        assert_eq!(engine.get_patches().len(), 1);
        // The undo's own notification must not have pushed a new entry:
        // a single redo step is available and restores both patches.
        assert!(engine.redo());
        assert_eq!(engine.get_patches().len(), 2);
        assert!(!engine.can_redo());
    }

    #[test]
    fn invalid_color_is_rejected() {
        let mut engine = PatchEngine::default();
        let id = engine.add_patch(Some(Vec3::ZERO)).unwrap();
        assert!(engine.update_patch_color(id, "#GGGGGG").is_err());
        assert!(engine.update_patch_color(id, "#3366FF").is_ok());
        assert_eq!(
            engine.get_patches()[0].color.as_deref(),
            Some("#3366FF")
        );
    }
}
