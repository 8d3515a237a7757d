//! Radial gradient lookup tables.
//!
//! A table is built by rasterizing a two-point conical gradient (focal point at
//! the origin, end circle centred at `(0, length)` with radius `length`) into a
//! one pixel wide column and reading it back. Entry `r` is the colour a stroke
//! of radius `r` is painted with.

use tiny_skia::{Color, Paint, Point, RadialGradient, Rect, SpreadMode, Transform};

use crate::color::Rgb;
use crate::error::{RenderError, RenderResult};
use crate::raster::RasterBuffer;

/// One colour stop of the source gradient.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradientStop {
    /// Normalised offset along the gradient, `[0, 1]`.
    pub position: f32,
    pub color: Rgb,
    /// Opacity in `[0, 1]`, encoded as luminance in the mask table.
    pub opacity: f32,
}

impl GradientStop {
    pub fn new(position: f32, color: Rgb, opacity: f32) -> Self {
        Self {
            position,
            color,
            opacity,
        }
    }
}

/// Straight RGBA samples indexed by integer stroke radius.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupTable {
    samples: Vec<[u8; 4]>,
}

impl LookupTable {
    pub fn from_samples(samples: Vec<[u8; 4]>) -> Self {
        Self { samples }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[[u8; 4]] {
        &self.samples
    }

    /// Sample at `radius`; indices past the end clamp to the last entry.
    pub fn get(&self, radius: usize) -> [u8; 4] {
        let last = self.samples.len().saturating_sub(1);
        self.samples
            .get(radius.min(last))
            .copied()
            .unwrap_or([0, 0, 0, 0])
    }

    /// Colour channels at `radius`, dropping the sample's alpha.
    pub fn rgb(&self, radius: usize) -> Rgb {
        let [r, g, b, _] = self.get(radius);
        Rgb::new(r, g, b)
    }
}

/// The stop's own colour, fully opaque.
pub fn literal_color(stop: &GradientStop) -> Color {
    Color::from_rgba8(stop.color.r, stop.color.g, stop.color.b, 255)
}

/// `hsl(0deg, 0%, opacity * 100%)`: the stop's opacity as a grey level.
pub fn opacity_luminance(stop: &GradientStop) -> Color {
    let grey = Rgb::from_hsl(0.0, 0.0, stop.opacity);
    Color::from_rgba8(grey.r, grey.g, grey.b, 255)
}

/// Builds a `length` entry table from `stops`, colouring each stop with
/// `color_fn`.
pub fn build_table<F>(length: usize, stops: &[GradientStop], color_fn: F) -> RenderResult<LookupTable>
where
    F: Fn(&GradientStop) -> Color,
{
    if stops.is_empty() {
        return Err(RenderError::EmptyGradient);
    }
    let height = u32::try_from(length)
        .ok()
        .filter(|&height| height > 0)
        .ok_or_else(|| RenderError::surface_unavailable(1, length.min(u32::MAX as usize) as u32))?;

    let mut column = RasterBuffer::new(1.0, height as f32, 1.0)?;
    let extent = height as f32;
    let skia_stops = stops
        .iter()
        .map(|stop| tiny_skia::GradientStop::new(stop.position, color_fn(stop)))
        .collect();
    let shader = RadialGradient::new(
        Point::from_xy(0.0, 0.0),
        Point::from_xy(0.0, extent),
        extent,
        skia_stops,
        SpreadMode::Pad,
        Transform::identity(),
    )
    .ok_or(RenderError::EmptyGradient)?;

    let mut paint = Paint::default();
    paint.shader = shader;
    paint.anti_alias = false;
    let rect = Rect::from_xywh(0.0, 0.0, 1.0, extent)
        .ok_or_else(|| RenderError::surface_unavailable(1, height))?;
    column
        .pixmap_mut()
        .fill_rect(rect, &paint, Transform::identity(), None);

    let samples = (0..height)
        .map(|y| column.pixel(0, y).unwrap_or([0, 0, 0, 0]))
        .collect::<Vec<_>>();
    tracing::debug!(length, stops = stops.len(), "built gradient lookup table");
    Ok(LookupTable::from_samples(samples))
}

/// Gradient parameter `t` evaluated at the pixel centre of table entry `index`.
pub fn sample_position(index: usize, length: usize) -> f32 {
    let x = 0.5_f32;
    let y = index as f32 + 0.5;
    let h = length.max(1) as f32;
    (x * x + y * y) / (2.0 * y * h)
}

/// Table entry whose sample lies closest to gradient parameter `position`.
pub fn stop_radius(position: f32, length: usize) -> usize {
    let last = length.saturating_sub(1);
    let reach = position * length.max(1) as f32;
    let discriminant = reach * reach - 0.25;
    if discriminant <= 0.0 || !discriminant.is_finite() {
        return 0;
    }
    let centre = reach + discriminant.sqrt();
    ((centre - 0.5).round().max(0.0) as usize).min(last)
}
