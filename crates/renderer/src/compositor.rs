//! Layer compositing: colour from one raster layer, alpha from another.
//!
//! [`CompositeTarget`] is the seam between the frame driver and whatever
//! accumulates the final image. The GPU path lives in `gpu`; [`SoftwareTarget`]
//! applies the same blend and depth state on the CPU for stills and tests.

use crate::error::{RenderError, RenderResult};
use crate::raster::RasterBuffer;

/// Depth of the full-screen quad, in `[0, 1]` window depth.
pub const QUAD_DEPTH: f32 = 0.5;

/// Current drawable area in logical units plus the raster scale factor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
    pub scale: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32, scale: f32) -> Self {
        Self {
            width,
            height,
            scale,
        }
    }

    pub fn center_y(&self) -> f32 {
        self.height / 2.0
    }
}

/// Destination that strand layers are blended into.
///
/// A frame is `begin_frame`, then per strand `composite` followed by
/// `clear_depth`, then `end_frame`.
pub trait CompositeTarget {
    /// Per-strand resources (texture handles on the GPU).
    type Layer;

    fn viewport(&self) -> Viewport;

    /// Allocates the layer resources for strand `index`, sized in pixels.
    fn create_layer(&mut self, index: usize, width: u32, height: u32) -> RenderResult<Self::Layer>;

    /// Clears the visible colour buffer to opaque black.
    fn begin_frame(&mut self) -> RenderResult<()>;

    /// Uploads both layers into `layer` and draws one full-screen quad taking
    /// RGB from `color` and alpha from the red channel of `mask`.
    fn composite(
        &mut self,
        layer: &Self::Layer,
        color: &RasterBuffer,
        mask: &RasterBuffer,
    ) -> RenderResult<()>;

    /// Clears only the depth buffer.
    fn clear_depth(&mut self) -> RenderResult<()>;

    fn end_frame(&mut self) -> RenderResult<()>;
}

/// Source-over: `src * src_alpha + dst * (1 - src_alpha)` on every channel,
/// alpha included.
pub fn over(src_rgb: [f32; 3], src_alpha: f32, dst: [f32; 4]) -> [f32; 4] {
    let keep = 1.0 - src_alpha;
    [
        src_rgb[0] * src_alpha + dst[0] * keep,
        src_rgb[1] * src_alpha + dst[1] * keep,
        src_rgb[2] * src_alpha + dst[2] * keep,
        src_alpha * src_alpha + dst[3] * keep,
    ]
}

/// CPU compositing target with a colour and a depth buffer.
pub struct SoftwareTarget {
    viewport: Viewport,
    width: u32,
    height: u32,
    color: Vec<[f32; 4]>,
    depth: Vec<f32>,
    frames: u64,
}

impl SoftwareTarget {
    pub fn new(viewport: Viewport) -> Self {
        let mut target = Self {
            viewport,
            width: 0,
            height: 0,
            color: Vec::new(),
            depth: Vec::new(),
            frames: 0,
        };
        target.set_viewport(viewport);
        target
    }

    /// Reallocates both buffers for a new viewport, as a window resize would.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.width = pixel_extent(viewport.width * viewport.scale);
        self.height = pixel_extent(viewport.height * viewport.scale);
        let len = self.width as usize * self.height as usize;
        self.color = vec![[0.0, 0.0, 0.0, 1.0]; len];
        self.depth = vec![1.0; len];
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let index = y as usize * self.width as usize + x as usize;
        self.color.get(index).map(|&texel| to_rgba8(texel))
    }

    /// Row-major RGBA8 copy of the colour buffer.
    pub fn to_rgba8(&self) -> Vec<u8> {
        self.color
            .iter()
            .flat_map(|&texel| to_rgba8(texel))
            .collect()
    }
}

impl CompositeTarget for SoftwareTarget {
    type Layer = usize;

    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn create_layer(&mut self, index: usize, width: u32, height: u32) -> RenderResult<usize> {
        if width == 0 || height == 0 {
            return Err(RenderError::surface_unavailable(width, height));
        }
        Ok(index)
    }

    fn begin_frame(&mut self) -> RenderResult<()> {
        self.color.fill([0.0, 0.0, 0.0, 1.0]);
        Ok(())
    }

    fn composite(
        &mut self,
        _layer: &usize,
        color: &RasterBuffer,
        mask: &RasterBuffer,
    ) -> RenderResult<()> {
        let color_texels = Texels::new(color);
        let mask_texels = Texels::new(mask);
        for y in 0..self.height {
            for x in 0..self.width {
                let index = y as usize * self.width as usize + x as usize;
                if QUAD_DEPTH >= self.depth[index] {
                    continue;
                }
                self.depth[index] = QUAD_DEPTH;

                let rgb = color_texels.sample(x, y, self.width, self.height);
                let alpha = mask_texels.sample(x, y, self.width, self.height)[0];
                self.color[index] = over([rgb[0], rgb[1], rgb[2]], alpha, self.color[index]);
            }
        }
        Ok(())
    }

    fn clear_depth(&mut self) -> RenderResult<()> {
        self.depth.fill(1.0);
        Ok(())
    }

    fn end_frame(&mut self) -> RenderResult<()> {
        self.frames += 1;
        Ok(())
    }
}

/// Nearest-neighbour view over a layer's straight RGBA bytes.
struct Texels {
    data: Vec<u8>,
    width: u32,
    height: u32,
}

impl Texels {
    fn new(buffer: &RasterBuffer) -> Self {
        let (width, height) = buffer.pixel_size();
        Self {
            data: buffer.to_straight_rgba(),
            width,
            height,
        }
    }

    /// Nearest texel for target pixel `(x, y)`, columns mirrored like the quad shader.
    fn sample(&self, x: u32, y: u32, target_width: u32, target_height: u32) -> [f32; 4] {
        let column = (u64::from(x) * u64::from(self.width) / u64::from(target_width.max(1))) as usize;
        let tx = (self.width as usize).saturating_sub(column + 1);
        let ty = (u64::from(y) * u64::from(self.height) / u64::from(target_height.max(1))) as usize;
        let offset = (ty * self.width as usize + tx) * 4;
        match self.data.get(offset..offset + 4) {
            Some(&[r, g, b, a]) => [
                f32::from(r) / 255.0,
                f32::from(g) / 255.0,
                f32::from(b) / 255.0,
                f32::from(a) / 255.0,
            ],
            _ => [0.0; 4],
        }
    }
}

fn to_rgba8(texel: [f32; 4]) -> [u8; 4] {
    texel.map(|channel| (channel.clamp(0.0, 1.0) * 255.0).round() as u8)
}

fn pixel_extent(value: f32) -> u32 {
    let extent = value.round();
    if extent.is_finite() && extent >= 1.0 {
        extent as u32
    } else {
        1
    }
}
