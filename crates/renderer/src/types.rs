use crate::frame::StrandSettings;
use crate::runtime::RenderPolicy;

/// Immutable configuration passed to the renderer at start-up.
///
/// `RendererConfig` mirrors CLI flags and the scene file: how large the window
/// is, how the strands look, and whether frames animate or get exported.
#[derive(Debug, Clone, PartialEq)]
pub struct RendererConfig {
    /// Window or export size in logical units.
    pub surface_size: (u32, u32),
    pub title: String,
    /// High-level render behaviour requested by the caller.
    pub policy: RenderPolicy,
    pub settings: StrandSettings,
}

impl Default for RendererConfig {
    /// An 800x600 animated window with the stock strand settings.
    fn default() -> Self {
        Self {
            surface_size: (800, 600),
            title: String::from("Glowstrands"),
            policy: RenderPolicy::default(),
            settings: StrandSettings::default(),
        }
    }
}
