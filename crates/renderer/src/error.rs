use std::fmt;

/// Failures surfaced by the rendering core.
///
/// Every variant is fatal for the run: the frame loop stops on the first error
/// instead of skipping frames.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// The 2D rasterizer could not allocate a drawing surface of this size.
    #[error("2D drawing surface unavailable for {width}x{height}")]
    SurfaceUnavailable { width: u32, height: u32 },
    /// The GPU device, surface, or pipeline could not be initialised.
    #[error("GPU capability unavailable: {0}")]
    GpuCapabilityUnavailable(String),
    #[error("gradient requires at least one colour stop")]
    EmptyGradient,
    /// The curve produced non-finite coordinates for this phase.
    #[error("curve geometry is not finite at phase {phase}")]
    CurveGeometry { phase: f64 },
    /// The swapchain refused to hand out a frame.
    #[error("surface error: {0}")]
    Surface(#[from] wgpu::SurfaceError),
    #[error("failed to export still frame: {0}")]
    Export(String),
}

impl RenderError {
    pub(crate) fn surface_unavailable(width: u32, height: u32) -> Self {
        Self::SurfaceUnavailable { width, height }
    }

    pub(crate) fn gpu(message: impl fmt::Display) -> Self {
        Self::GpuCapabilityUnavailable(message.to_string())
    }

    /// Returns the swapchain error if this failure came from frame acquisition.
    pub fn as_surface_error(&self) -> Option<&wgpu::SurfaceError> {
        match self {
            Self::Surface(err) => Some(err),
            _ => None,
        }
    }
}

/// Result alias used throughout the renderer core.
pub type RenderResult<T> = Result<T, RenderError>;
