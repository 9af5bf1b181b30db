//! Wire shape for patches.
//!
//! The DTO is the only persistence format in scope: world-space float
//! triples plus optional name and `#rrggbb` color. Snapshots stored by the
//! history stack are arrays of these, deep-copied so live registry state
//! never aliases a stored snapshot.

use crate::model::{Color, Patch, PatchId};
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// World-space patch transfer object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatchDto {
    pub id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// `#rrggbb`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    pub main: [f32; 3],
    pub u: [f32; 3],
    pub v: [f32; 3],
}

impl PatchDto {
    pub fn main_vec(&self) -> Vec3 {
        Vec3::from(self.main)
    }

    pub fn u_vec(&self) -> Vec3 {
        Vec3::from(self.u)
    }

    pub fn v_vec(&self) -> Vec3 {
        Vec3::from(self.v)
    }
}

impl From<&Patch> for PatchDto {
    fn from(p: &Patch) -> Self {
        Self {
            id: p.id.0,
            name: Some(p.name.clone()),
            color: Some(p.color.to_hex()),
            main: p.world_main().to_array(),
            u: p.world_u().to_array(),
            v: p.world_v().to_array(),
        }
    }
}

impl Patch {
    /// Rebuild a patch from its wire shape. The local origin is recentered
    /// to the u/v midpoint, matching post-edit invariants.
    pub fn from_dto(dto: &PatchDto) -> Self {
        let id = PatchId(dto.id);
        let mut patch = Self {
            id,
            name: dto.name.clone().unwrap_or_else(|| format!("Patch {}", id.0)),
            color: dto
                .color
                .as_deref()
                .and_then(Color::from_hex)
                .unwrap_or_else(|| Color::palette(id)),
            origin: Vec3::ZERO,
            main: dto.main_vec(),
            u: dto.u_vec(),
            v: dto.v_vec(),
        };
        patch.recenter();
        patch
    }
}

/// Parse a JSON array of patch DTOs.
///
/// This is the structural-validation boundary for external snapshots:
/// each entry must carry `id` and three 3-tuples. Beyond shape, any
/// floats are accepted — degenerate geometry is guarded at computation
/// time, not here.
pub fn parse_patches(json: &str) -> Result<Vec<PatchDto>, String> {
    serde_json::from_str(json).map_err(|e| format!("invalid patch data: {e}"))
}
