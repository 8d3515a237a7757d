//! Per-frame strand loop.
//!
//! [`RendererContext`] owns everything built at start-up: both lookup tables,
//! the two reusable raster surfaces and one [`StrandInstance`] per strand.
//! [`FrameDriver::tick`] renders and composites every strand in index order.

use crate::color::Rgb;
use crate::compositor::{CompositeTarget, Viewport};
use crate::curve::{CurveLayerRenderer, CurveParams};
use crate::error::RenderResult;
use crate::gradient::{self, GradientStop, LookupTable};
use crate::raster::RasterBuffer;
use crate::runtime::BoxedTimeSource;

/// Static description of the strand effect.
#[derive(Debug, Clone, PartialEq)]
pub struct StrandSettings {
    pub strand_count: usize,
    /// Number of lookup entries, which is also the widest stroke radius.
    pub table_length: usize,
    pub stops: Vec<GradientStop>,
    pub curve: CurveParams,
    /// Upper bound applied to the display's device pixel ratio.
    pub pixel_ratio_cap: f32,
}

impl Default for StrandSettings {
    fn default() -> Self {
        Self {
            strand_count: 3,
            table_length: 25,
            stops: vec![
                GradientStop::new(0.0, Rgb::new(255, 0, 0), 0.0),
                GradientStop::new(0.25, Rgb::new(255, 165, 0), 0.5),
                GradientStop::new(0.5, Rgb::new(255, 255, 255), 1.0),
            ],
            curve: CurveParams::default(),
            pixel_ratio_cap: 2.0,
        }
    }
}

impl StrandSettings {
    /// Raster scale for a display reporting `device_ratio` pixels per unit.
    pub fn pixel_ratio(&self, device_ratio: f64) -> f32 {
        let device = device_ratio as f32;
        let device = if device.is_finite() && device > 0.0 {
            device
        } else {
            1.0
        };
        if self.pixel_ratio_cap.is_finite() && self.pixel_ratio_cap > 0.0 {
            device.min(self.pixel_ratio_cap)
        } else {
            device
        }
    }
}

/// One phase-shifted copy of the animation and its compositing resources.
pub struct StrandInstance<L> {
    pub layer: L,
    pub phase_offset: f64,
}

/// State shared by every frame.
pub struct RendererContext<L> {
    color_table: LookupTable,
    mask_table: LookupTable,
    color_surface: RasterBuffer,
    mask_surface: RasterBuffer,
    curve: CurveLayerRenderer,
    strands: Vec<StrandInstance<L>>,
    strand_count: usize,
    viewport: Viewport,
}

impl<L> RendererContext<L> {
    /// Builds both tables and allocates surfaces and layers for the target's
    /// current viewport.
    pub fn new<T>(settings: &StrandSettings, target: &mut T) -> RenderResult<Self>
    where
        T: CompositeTarget<Layer = L>,
    {
        let color_table = gradient::build_table(
            settings.table_length,
            &settings.stops,
            gradient::literal_color,
        )?;
        let mask_table = gradient::build_table(
            settings.table_length,
            &settings.stops,
            gradient::opacity_luminance,
        )?;

        let viewport = target.viewport();
        let (color_surface, mask_surface) = allocate_surfaces(viewport)?;
        let strands = allocate_strands(settings.strand_count, &color_surface, target)?;
        tracing::debug!(
            strands = settings.strand_count,
            width = viewport.width,
            height = viewport.height,
            scale = viewport.scale,
            "renderer context ready"
        );

        Ok(Self {
            color_table,
            mask_table,
            color_surface,
            mask_surface,
            curve: CurveLayerRenderer::new(settings.curve),
            strands,
            strand_count: settings.strand_count,
            viewport,
        })
    }

    /// Recreates surfaces and layers when `viewport` differs from the one they
    /// were built for. Returns whether anything was rebuilt.
    pub fn resize<T>(&mut self, viewport: Viewport, target: &mut T) -> RenderResult<bool>
    where
        T: CompositeTarget<Layer = L>,
    {
        if viewport == self.viewport {
            return Ok(false);
        }
        let (color_surface, mask_surface) = allocate_surfaces(viewport)?;
        self.strands = allocate_strands(self.strand_count, &color_surface, target)?;
        self.color_surface = color_surface;
        self.mask_surface = mask_surface;
        self.viewport = viewport;
        tracing::debug!(
            width = viewport.width,
            height = viewport.height,
            scale = viewport.scale,
            "resized strand surfaces"
        );
        Ok(true)
    }

    pub fn color_table(&self) -> &LookupTable {
        &self.color_table
    }

    pub fn mask_table(&self) -> &LookupTable {
        &self.mask_table
    }

    pub fn strands(&self) -> &[StrandInstance<L>] {
        &self.strands
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }
}

fn allocate_surfaces(viewport: Viewport) -> RenderResult<(RasterBuffer, RasterBuffer)> {
    let color = RasterBuffer::new(viewport.width, viewport.height, viewport.scale)?;
    let mask = RasterBuffer::new(viewport.width, viewport.height, viewport.scale)?;
    Ok((color, mask))
}

fn allocate_strands<T: CompositeTarget>(
    count: usize,
    surface: &RasterBuffer,
    target: &mut T,
) -> RenderResult<Vec<StrandInstance<T::Layer>>> {
    let (width, height) = surface.pixel_size();
    (0..count)
        .map(|index| {
            Ok(StrandInstance {
                layer: target.create_layer(index, width, height)?,
                phase_offset: index as f64,
            })
        })
        .collect()
}

/// Drives one frame per call from a clock.
pub struct FrameDriver {
    clock: BoxedTimeSource,
}

impl FrameDriver {
    pub fn new(clock: BoxedTimeSource) -> Self {
        Self { clock }
    }

    /// Clears the target to black, then for each strand in index order renders
    /// both surfaces at `now + index`, composites them and clears depth.
    pub fn tick<T>(
        &mut self,
        context: &mut RendererContext<T::Layer>,
        target: &mut T,
    ) -> RenderResult<()>
    where
        T: CompositeTarget,
    {
        let viewport = target.viewport();
        context.resize(viewport, target)?;
        let center_y = viewport.center_y();

        target.begin_frame()?;
        for strand in &context.strands {
            let phase = self.clock.sample().seconds + strand.phase_offset;
            context
                .curve
                .render(&mut context.color_surface, &context.color_table, phase, center_y)?;
            context
                .curve
                .render(&mut context.mask_surface, &context.mask_table, phase, center_y)?;
            target.composite(&strand.layer, &context.color_surface, &context.mask_surface)?;
            target.clear_depth()?;
        }
        target.end_frame()
    }
}
