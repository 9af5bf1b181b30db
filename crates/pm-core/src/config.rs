//! Engine tunables.
//!
//! Every empirical constant the interaction design depends on lives here
//! as a named field with its observed default, so hosts can adjust
//! sensitivities without touching engine code. The reframe thresholds are
//! deliberately plain numbers — see DESIGN.md.

/// Interaction and display tunables consumed across the workspace.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Point-handle pick radius, in screen pixels.
    pub point_pick_pixels: f32,
    /// Edge pick tolerance, in screen pixels. Converted to world units
    /// via `world_per_pixel` so edges stay pickable at any zoom.
    pub edge_pick_pixels: f32,
    /// Picking is suppressed for this long after a drag ends, so the
    /// terminating pointer-up is not misread as a new click.
    pub pick_suppress_ms: f64,
    /// Two pointer-downs within this window (and within
    /// `double_click_slop_px`) count as a double click.
    pub double_click_ms: f64,
    pub double_click_slop_px: f32,

    /// Rotate gain, radians per pixel of pointer travel.
    pub rotate_gain: f32,
    /// Weight of vertical pointer travel in the rotate angle
    /// (`angle = (dx − w·dy) · gain`).
    pub rotate_vertical_weight: f32,

    /// Uniform scale exponent per pixel of vertical drag. The default is
    /// `ln(scale_max) / 280`: about 280 px of drag reaches the extreme.
    pub scale_gain: f32,
    /// Soft-knee width (in log-factor units) desensitizing directional
    /// scale near factor 1.0.
    pub directional_scale_knee: f32,
    pub scale_min: f32,
    pub scale_max: f32,

    /// Undo history depth (snapshot ring size).
    pub history_depth: usize,
    /// Basis offset length for freshly created patches.
    pub default_extent: f32,
    /// Target apparent size of point handles, in pixels; `frame_tick`
    /// derives a world-space handle scale from this every frame.
    pub handle_apparent_pixels: f32,

    /// Host camera auto-reframing: reframe when the bounds-size ratio
    /// exceeds this…
    pub reframe_bounds_ratio: f32,
    /// …or when camera distance exceeds this multiple of the ideal
    /// framing distance.
    pub reframe_distance_ratio: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let scale_max: f32 = 20.0;
        Self {
            point_pick_pixels: 10.0,
            edge_pick_pixels: 8.0,
            pick_suppress_ms: 180.0,
            double_click_ms: 350.0,
            double_click_slop_px: 5.0,

            rotate_gain: 0.01,
            rotate_vertical_weight: 0.2,

            scale_gain: scale_max.ln() / 280.0,
            directional_scale_knee: 0.35,
            scale_min: 0.1,
            scale_max,

            history_depth: 100,
            default_extent: 1.0,
            handle_apparent_pixels: 12.0,

            reframe_bounds_ratio: 2.0,
            reframe_distance_ratio: 6.0,
        }
    }
}
