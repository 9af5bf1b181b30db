//! Patch registry: the owning collection of patch entities.
//!
//! `replace_all` is the only way external snapshots (undo/redo, load)
//! enter the registry. It is an atomic full replace, never a merge, and
//! bumps the id counter past the highest loaded id so ids are never
//! reused.

use crate::dto::PatchDto;
use crate::math::{Aabb, scatter_unit};
use crate::model::{Color, Patch, PatchId};
use glam::Vec3;
use log::{debug, info};
use std::collections::HashSet;

/// Owns the set of patches and the id counter.
///
/// The locked-main flags live beside the patches rather than on them: the
/// wire DTO carries no lock state, so flags survive snapshot replaces
/// (undo/redo, load) for ids that still exist.
#[derive(Debug, Default)]
pub struct PatchSet {
    patches: Vec<Patch>,
    locked_main: HashSet<PatchId>,
    next_id: u64,
}

impl PatchSet {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Creation / removal ──

    /// Create a patch centered at `center` with default basis offsets
    /// scaled by `extent`. Returns the new id.
    pub fn create(&mut self, center: Vec3, extent: f32) -> PatchId {
        let id = PatchId(self.next_id);
        self.next_id += 1;
        info!("create {id} at {center}");
        self.patches.push(Patch::new(id, center, extent));
        id
    }

    /// Create a patch at a deterministic scatter position inside `region`.
    /// Used when the host passes only a bounding-region placement hint.
    pub fn create_placed(&mut self, region: Aabb, extent: f32) -> PatchId {
        let center = region.lerp(scatter_unit(self.next_id));
        self.create(center, extent)
    }

    /// Remove a patch. Returns false if the id is unknown.
    pub fn delete(&mut self, id: PatchId) -> bool {
        let before = self.patches.len();
        self.patches.retain(|p| p.id != id);
        let removed = self.patches.len() != before;
        if removed {
            self.locked_main.remove(&id);
            info!("delete {id}");
        }
        removed
    }

    // ── Field edits ──

    pub fn rename(&mut self, id: PatchId, name: impl Into<String>) -> bool {
        match self.get_mut(id) {
            Some(p) => {
                p.name = name.into();
                true
            }
            None => false,
        }
    }

    pub fn recolor(&mut self, id: PatchId, color: Color) -> bool {
        match self.get_mut(id) {
            Some(p) => {
                p.color = color;
                true
            }
            None => false,
        }
    }

    /// Toggle rigid-body main translation for a patch: when locked,
    /// translating `main` propagates the same delta to `u` and `v`.
    pub fn set_locked_main(&mut self, id: PatchId, locked: bool) -> bool {
        if self.get(id).is_none() {
            return false;
        }
        if locked {
            self.locked_main.insert(id);
        } else {
            self.locked_main.remove(&id);
        }
        true
    }

    pub fn is_locked_main(&self, id: PatchId) -> bool {
        self.locked_main.contains(&id)
    }

    // ── Lookup ──

    pub fn get(&self, id: PatchId) -> Option<&Patch> {
        self.patches.iter().find(|p| p.id == id)
    }

    pub fn get_mut(&mut self, id: PatchId) -> Option<&mut Patch> {
        self.patches.iter_mut().find(|p| p.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Patch> {
        self.patches.iter()
    }

    pub fn len(&self) -> usize {
        self.patches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patches.is_empty()
    }

    /// World-space bounding box over all patch quads, if any patch exists.
    pub fn bounds(&self) -> Option<Aabb> {
        let mut verts = self.patches.iter().flat_map(|p| p.quad());
        let first = verts.next()?;
        let mut aabb = Aabb::new(first, first);
        for v in verts {
            aabb.extend(v);
        }
        Some(aabb)
    }

    // ── Snapshots ──

    /// Deep-copy the current state as wire DTOs.
    pub fn to_dtos(&self) -> Vec<PatchDto> {
        self.patches.iter().map(PatchDto::from).collect()
    }

    /// Atomic full replace from a snapshot. The id counter moves to
    /// `max(current, max(loaded ids) + 1)`; locked-main flags persist for
    /// ids that survive the replace.
    pub fn replace_all(&mut self, dtos: &[PatchDto]) {
        debug!("replace_all with {} patches", dtos.len());
        self.patches = dtos.iter().map(Patch::from_dto).collect();
        self.locked_main.retain(|id| dtos.iter().any(|d| d.id == id.0));
        let max_loaded = dtos.iter().map(|d| d.id).max();
        if let Some(max_id) = max_loaded {
            self.next_id = self.next_id.max(max_id + 1);
        }
    }
}
