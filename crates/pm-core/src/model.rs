//! Core patch data model.
//!
//! A patch is a local coordinate frame made of three points — `main` plus
//! two basis points `u` and `v` — marking a region of interest on a
//! phase-space plot. The three points are stored relative to a derived
//! frame `origin`; the quad the frame spans is recomputed on demand from
//! the parallelogram law.

use crate::math::{orthonormal_frame, safe_normalize};
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::fmt;

// ─── Ids ─────────────────────────────────────────────────────────────────

/// Numeric patch identifier. Assigned from a monotonically increasing
/// counter owned by the registry; never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PatchId(pub u64);

impl fmt::Display for PatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "patch#{}", self.0)
    }
}

// ─── Roles ───────────────────────────────────────────────────────────────

/// Which part of a patch an interaction targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PatchRole {
    Main,
    U,
    V,
    /// The edge from `main` to `u`.
    EdgeU,
    /// The edge from `main` to `v`.
    EdgeV,
}

impl PatchRole {
    pub fn is_point(self) -> bool {
        matches!(self, Self::Main | Self::U | Self::V)
    }

    pub fn is_edge(self) -> bool {
        matches!(self, Self::EdgeU | Self::EdgeV)
    }

    /// For an edge role, the endpoint opposite `main` on that edge.
    pub fn edge_far_point(self) -> Option<PatchRole> {
        match self {
            Self::EdgeU => Some(Self::U),
            Self::EdgeV => Some(Self::V),
            _ => None,
        }
    }

    /// For an edge role, the basis point not on that edge.
    pub fn edge_opposite_point(self) -> Option<PatchRole> {
        match self {
            Self::EdgeU => Some(Self::V),
            Self::EdgeV => Some(Self::U),
            _ => None,
        }
    }
}

// ─── Color ───────────────────────────────────────────────────────────────

/// RGB color, 3 × f32 in [0.0, 1.0].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

fn hex_val(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

impl Color {
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Parse a hex color string: `#RGB` or `#RRGGBB`, leading `#` optional.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        let bytes = hex.as_bytes();

        match bytes.len() {
            3 => {
                let r = hex_val(bytes[0])?;
                let g = hex_val(bytes[1])?;
                let b = hex_val(bytes[2])?;
                Some(Self::rgb(
                    (r * 17) as f32 / 255.0,
                    (g * 17) as f32 / 255.0,
                    (b * 17) as f32 / 255.0,
                ))
            }
            6 => {
                let r = hex_val(bytes[0])? << 4 | hex_val(bytes[1])?;
                let g = hex_val(bytes[2])? << 4 | hex_val(bytes[3])?;
                let b = hex_val(bytes[4])? << 4 | hex_val(bytes[5])?;
                Some(Self::rgb(
                    r as f32 / 255.0,
                    g as f32 / 255.0,
                    b as f32 / 255.0,
                ))
            }
            _ => None,
        }
    }

    /// Emit as `#RRGGBB`.
    pub fn to_hex(&self) -> String {
        const HEX_CHARS: &[u8; 16] = b"0123456789ABCDEF";
        let r = (self.r.clamp(0.0, 1.0) * 255.0).round() as u8;
        let g = (self.g.clamp(0.0, 1.0) * 255.0).round() as u8;
        let b = (self.b.clamp(0.0, 1.0) * 255.0).round() as u8;
        let buf = [
            b'#',
            HEX_CHARS[(r >> 4) as usize],
            HEX_CHARS[(r & 0xF) as usize],
            HEX_CHARS[(g >> 4) as usize],
            HEX_CHARS[(g & 0xF) as usize],
            HEX_CHARS[(b >> 4) as usize],
            HEX_CHARS[(b & 0xF) as usize],
        ];
        // SAFETY: buffer only contains valid ASCII hex characters and '#'
        unsafe { String::from_utf8_unchecked(buf.to_vec()) }
    }

    /// Default palette entry for a freshly created patch.
    pub fn palette(id: PatchId) -> Self {
        const PALETTE: [Color; 6] = [
            Color::rgb(0.90, 0.36, 0.29), // coral
            Color::rgb(0.28, 0.62, 0.88), // sky
            Color::rgb(0.38, 0.78, 0.45), // green
            Color::rgb(0.93, 0.74, 0.26), // amber
            Color::rgb(0.65, 0.46, 0.89), // violet
            Color::rgb(0.30, 0.79, 0.77), // teal
        ];
        PALETTE[(id.0 % PALETTE.len() as u64) as usize]
    }
}

// ─── Patch ───────────────────────────────────────────────────────────────

/// Orthonormalized frame directions derived from a patch's current points.
#[derive(Debug, Clone, Copy)]
pub struct PatchBasis {
    /// Unit direction `main → u`.
    pub eu: Vec3,
    /// Unit direction `main → v`.
    pub ev: Vec3,
    /// Unit frame normal.
    pub normal: Vec3,
}

/// A movable three-point frame plus derived quad.
///
/// `main`, `u`, `v` are stored relative to `origin` (the local frame each
/// point is expressed in). World positions are `origin + point`. After any
/// non-drag edit `recenter()` moves `origin` to the midpoint of world `u`
/// and `v`; during an active drag the controller suspends recentering so
/// the frame being dragged does not feed back into itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patch {
    pub id: PatchId,
    pub name: String,
    pub color: Color,
    /// The local frame the three points are expressed relative to.
    pub origin: Vec3,
    pub main: Vec3,
    pub u: Vec3,
    pub v: Vec3,
}

impl Patch {
    /// Create a patch centered at `center` with the default basis offsets
    /// `+X` and `+Z` scaled by `extent`.
    pub fn new(id: PatchId, center: Vec3, extent: f32) -> Self {
        let mut patch = Self {
            id,
            name: format!("Patch {}", id.0),
            color: Color::palette(id),
            origin: Vec3::ZERO,
            main: center,
            u: center + Vec3::X * extent,
            v: center + Vec3::Z * extent,
        };
        patch.recenter();
        patch
    }

    // ── World-space accessors ──

    pub fn world_main(&self) -> Vec3 {
        self.origin + self.main
    }

    pub fn world_u(&self) -> Vec3 {
        self.origin + self.u
    }

    pub fn world_v(&self) -> Vec3 {
        self.origin + self.v
    }

    /// World position of a point role. `None` for edge roles.
    pub fn world_point(&self, role: PatchRole) -> Option<Vec3> {
        match role {
            PatchRole::Main => Some(self.world_main()),
            PatchRole::U => Some(self.world_u()),
            PatchRole::V => Some(self.world_v()),
            _ => None,
        }
    }

    /// Midpoint of an edge role. `None` for point roles.
    pub fn edge_midpoint(&self, role: PatchRole) -> Option<Vec3> {
        let far = self.world_point(role.edge_far_point()?)?;
        Some((self.world_main() + far) * 0.5)
    }

    pub fn set_world_point(&mut self, role: PatchRole, world: Vec3) {
        let rel = world - self.origin;
        match role {
            PatchRole::Main => self.main = rel,
            PatchRole::U => self.u = rel,
            PatchRole::V => self.v = rel,
            _ => {}
        }
    }

    /// Quad vertices in world space: `main, u, u + v − main, v`
    /// (parallelogram law).
    pub fn quad(&self) -> [Vec3; 4] {
        let m = self.world_main();
        let u = self.world_u();
        let v = self.world_v();
        [m, u, u + v - m, v]
    }

    /// Rigidly shift the whole frame.
    pub fn translate(&mut self, delta: Vec3) {
        self.origin += delta;
    }

    /// Re-center `origin` to the midpoint of world `u` and `v` and
    /// re-express the three points relative to it. World positions are
    /// unchanged. Must not be called while the patch is being dragged.
    pub fn recenter(&mut self) {
        let m = self.world_main();
        let u = self.world_u();
        let v = self.world_v();
        self.origin = (u + v) * 0.5;
        self.main = m - self.origin;
        self.u = u - self.origin;
        self.v = v - self.origin;
    }

    /// Orthonormalized frame directions from the current points.
    pub fn basis(&self) -> PatchBasis {
        let raw_eu = self.world_u() - self.world_main();
        let raw_ev = self.world_v() - self.world_main();
        let (eu, _y, normal) = orthonormal_frame(raw_eu, raw_ev);
        // `ev` keeps the actual v direction (not the orthogonalized one) so
        // slide mode follows the edge the user sees.
        let ev = safe_normalize(raw_ev, Vec3::Z);
        PatchBasis { eu, ev, normal }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn color_hex_roundtrip() {
        let c = Color::from_hex("#6C5CE7").unwrap();
        assert_eq!(c.to_hex(), "#6C5CE7");
        assert!(Color::from_hex("#XYZ").is_none());
        assert!(Color::from_hex("#12345").is_none());
    }

    #[test]
    fn quad_follows_parallelogram_law() {
        let p = Patch::new(PatchId(0), Vec3::ZERO, 1.0);
        let q = p.quad();
        assert_eq!(q[0], Vec3::new(0.0, 0.0, 0.0));
        assert_eq!(q[1], Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(q[2], Vec3::new(1.0, 0.0, 1.0));
        assert_eq!(q[3], Vec3::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn quad_holds_after_point_edit() {
        let mut p = Patch::new(PatchId(1), Vec3::new(2.0, -1.0, 3.0), 2.0);
        p.set_world_point(PatchRole::U, Vec3::new(5.0, 1.0, 0.5));
        p.recenter();
        let q = p.quad();
        let expect = p.world_u() + p.world_v() - p.world_main();
        assert!((q[2] - expect).length() < 1e-6);
    }

    #[test]
    fn recenter_preserves_world_positions() {
        let mut p = Patch::new(PatchId(2), Vec3::new(1.0, 2.0, 3.0), 1.5);
        p.set_world_point(PatchRole::Main, Vec3::new(-4.0, 0.0, 9.0));
        let before = (p.world_main(), p.world_u(), p.world_v());
        p.recenter();
        let after = (p.world_main(), p.world_u(), p.world_v());
        assert!((before.0 - after.0).length() < 1e-5);
        assert!((before.1 - after.1).length() < 1e-5);
        assert!((before.2 - after.2).length() < 1e-5);
        // Origin sits at the u/v midpoint, not at main.
        assert!((p.origin - (after.1 + after.2) * 0.5).length() < 1e-5);
    }

    #[test]
    fn edge_roles_resolve_endpoints() {
        assert_eq!(PatchRole::EdgeU.edge_far_point(), Some(PatchRole::U));
        assert_eq!(PatchRole::EdgeU.edge_opposite_point(), Some(PatchRole::V));
        assert_eq!(PatchRole::EdgeV.edge_far_point(), Some(PatchRole::V));
        assert_eq!(PatchRole::EdgeV.edge_opposite_point(), Some(PatchRole::U));
        assert_eq!(PatchRole::Main.edge_far_point(), None);
    }

    #[test]
    fn basis_guards_degenerate_edges() {
        let mut p = Patch::new(PatchId(3), Vec3::ZERO, 1.0);
        // Collapse u onto main: eu falls back to +X.
        p.set_world_point(PatchRole::U, p.world_main());
        let b = p.basis();
        assert!((b.eu.length() - 1.0).abs() < 1e-6);
        assert!((b.normal.length() - 1.0).abs() < 1e-6);
    }
}
