use crate::error::{RenderError, RenderResult};
use crate::raster::RasterBuffer;

use super::pipeline::CompositePipeline;

const LAYER_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;
const BYTES_PER_PIXEL: u32 = 4;

struct LayerTexture {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    width: u32,
    height: u32,
}

impl LayerTexture {
    fn new(device: &wgpu::Device, label: &str, width: u32, height: u32) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: LAYER_FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            texture,
            view,
            width,
            height,
        }
    }

    /// Full replace of the texture contents with `buffer`'s straight RGBA.
    fn upload(&self, queue: &wgpu::Queue, buffer: &RasterBuffer) -> RenderResult<()> {
        let (width, height) = buffer.pixel_size();
        check_upload_size((self.width, self.height), (width, height))?;
        let data = buffer.to_straight_rgba();
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &data,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(width * BYTES_PER_PIXEL),
                rows_per_image: Some(height),
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
        Ok(())
    }
}

fn check_upload_size(texture: (u32, u32), buffer: (u32, u32)) -> RenderResult<()> {
    if texture == buffer {
        Ok(())
    } else {
        Err(RenderError::gpu(format!(
            "layer upload of {}x{} does not match its {}x{} texture",
            buffer.0, buffer.1, texture.0, texture.1
        )))
    }
}

/// Colour and mask textures owned by one strand, plus their bind group.
pub(crate) struct StrandTextures {
    color: LayerTexture,
    mask: LayerTexture,
    pub bind_group: wgpu::BindGroup,
}

impl StrandTextures {
    pub fn new(
        device: &wgpu::Device,
        pipeline: &CompositePipeline,
        index: usize,
        width: u32,
        height: u32,
    ) -> Self {
        let color = LayerTexture::new(device, &format!("strand {index} colour"), width, height);
        let mask = LayerTexture::new(device, &format!("strand {index} mask"), width, height);
        let bind_group = pipeline.bind_layers(
            device,
            &format!("strand {index} layers"),
            &color.view,
            &mask.view,
        );
        Self {
            color,
            mask,
            bind_group,
        }
    }

    pub fn upload(
        &self,
        queue: &wgpu::Queue,
        color: &RasterBuffer,
        mask: &RasterBuffer,
    ) -> RenderResult<()> {
        self.color.upload(queue, color)?;
        self.mask.upload(queue, mask)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matching_upload_size_is_accepted() {
        assert!(check_upload_size((64, 32), (64, 32)).is_ok());
    }

    #[test]
    fn mismatched_upload_is_an_error() {
        let err = check_upload_size((64, 32), (128, 64)).unwrap_err();
        assert!(matches!(err, RenderError::GpuCapabilityUnavailable(_)));
        assert!(err.to_string().contains("128x64"));
    }
}
