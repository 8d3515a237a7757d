use tiny_skia::{Color, Pixmap, Transform};

use crate::color::Rgb;
use crate::error::{RenderError, RenderResult};

/// Off-screen pixel surface with a device-pixel-ratio scale.
///
/// Drawing code works in logical units; [`RasterBuffer::transform`] maps them
/// onto the backing pixmap. Pixels are stored premultiplied (tiny-skia's
/// native layout) and read back straight.
pub struct RasterBuffer {
    pixmap: Pixmap,
    scale: f32,
}

impl RasterBuffer {
    /// Allocates a transparent surface covering `logical_width x logical_height`
    /// logical units at `scale` pixels per unit.
    pub fn new(logical_width: f32, logical_height: f32, scale: f32) -> RenderResult<Self> {
        let scale = if scale.is_finite() && scale > 0.0 {
            scale
        } else {
            1.0
        };
        let width = pixel_extent(logical_width, scale);
        let height = pixel_extent(logical_height, scale);
        let pixmap =
            Pixmap::new(width, height).ok_or_else(|| RenderError::surface_unavailable(width, height))?;
        Ok(Self { pixmap, scale })
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn pixel_size(&self) -> (u32, u32) {
        (self.pixmap.width(), self.pixmap.height())
    }

    pub fn logical_width(&self) -> f32 {
        self.pixmap.width() as f32 / self.scale
    }

    pub fn logical_height(&self) -> f32 {
        self.pixmap.height() as f32 / self.scale
    }

    /// Logical-to-pixel transform applied to every draw.
    pub fn transform(&self) -> Transform {
        Transform::from_scale(self.scale, self.scale)
    }

    pub fn clear(&mut self) {
        self.pixmap.fill(Color::TRANSPARENT);
    }

    pub fn fill(&mut self, color: Rgb, alpha: u8) {
        self.pixmap
            .fill(Color::from_rgba8(color.r, color.g, color.b, alpha));
    }

    /// Straight RGBA of the pixel at `(x, y)` in pixel coordinates.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        self.pixmap.pixel(x, y).map(|pixel| {
            let color = pixel.demultiply();
            [color.red(), color.green(), color.blue(), color.alpha()]
        })
    }

    /// Row-major straight RGBA bytes, the layout textures are uploaded in.
    pub fn to_straight_rgba(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(self.pixmap.data().len());
        for pixel in self.pixmap.pixels() {
            let color = pixel.demultiply();
            data.extend_from_slice(&[color.red(), color.green(), color.blue(), color.alpha()]);
        }
        data
    }

    pub fn pixmap_mut(&mut self) -> &mut Pixmap {
        &mut self.pixmap
    }
}

fn pixel_extent(logical: f32, scale: f32) -> u32 {
    let extent = (logical * scale).round();
    if extent.is_finite() && extent >= 1.0 {
        extent as u32
    } else {
        1
    }
}
