//! Renderer crate for Glowstrands.
//!
//! A strand is an animated rosette curve stroked many times with shrinking
//! widths so it glows. Each frame draws every strand twice on the CPU, once
//! with colour samples and once with opacity samples encoded as grey, then
//! composites the pair on the GPU with alpha taken from the grey layer:
//!
//! ```text
//!   CLI / glowstrands
//!          │ RendererConfig
//!          ▼
//!   Renderer::run ──▶ winit event loop ──▶ FrameDriver::tick
//!          │                                   │ per strand
//!          │                                   ├─▶ CurveLayerRenderer (colour, mask)
//!          │                                   └─▶ CompositeTarget::composite
//!          └─▶ export_still (SoftwareTarget, PNG)
//! ```
//!
//! `RendererContext` owns the lookup tables and raster surfaces built at
//! start-up; `CompositeTarget` has a wgpu implementation for windows and a CPU
//! one for stills and tests.

pub mod color;
mod compile;
pub mod compositor;
pub mod curve;
mod error;
pub mod export;
pub mod frame;
mod gpu;
pub mod gradient;
pub mod raster;
pub mod runtime;
mod types;
mod window;

use anyhow::{Context, Result};

pub use color::{ColorParseError, Rgb};
pub use compositor::{CompositeTarget, SoftwareTarget, Viewport, QUAD_DEPTH};
pub use curve::{CurveLayerRenderer, CurveParams, PointTerms};
pub use error::{RenderError, RenderResult};
pub use export::{export_still, render_still};
pub use frame::{FrameDriver, RendererContext, StrandInstance, StrandSettings};
pub use gradient::{build_table, GradientStop, LookupTable};
pub use raster::RasterBuffer;
pub use runtime::{
    time_source_for_policy, BoxedTimeSource, FixedTimeSource, FrameScheduler, RenderPolicy,
    SystemTimeSource, TimeSample, TimeSource,
};
pub use types::RendererConfig;

/// Entry point that owns the configuration for one run.
pub struct Renderer {
    config: RendererConfig,
}

impl Renderer {
    /// Builds a renderer for the supplied configuration.
    pub fn new(config: RendererConfig) -> Self {
        Self { config }
    }

    /// Opens the animation window, or writes a single PNG for
    /// [`RenderPolicy::Export`].
    ///
    /// Returns when the window is closed. Any failed frame ends the run with
    /// an error.
    pub fn run(&mut self) -> Result<()> {
        match &self.config.policy {
            RenderPolicy::Export { time, path } => {
                let time = time.unwrap_or(0.0);
                export_still(self.config.surface_size, &self.config.settings, time, path)
                    .with_context(|| format!("failed to export still to {}", path.display()))?;
                Ok(())
            }
            RenderPolicy::Animate { .. } | RenderPolicy::Still { .. } => {
                window::run_window(&self.config)
            }
        }
    }
}
