use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use winit::dpi::PhysicalSize;

use crate::compile::QUAD_VERTEX_COUNT;
use crate::compositor::{CompositeTarget, Viewport};
use crate::error::{RenderError, RenderResult};
use crate::raster::RasterBuffer;

use super::context::GpuContext;
use super::layers::StrandTextures;
use super::pipeline::CompositePipeline;

/// Swapchain frame being recorded between `begin_frame` and `end_frame`.
struct ActiveFrame {
    surface_texture: wgpu::SurfaceTexture,
    view: wgpu::TextureView,
    encoder: wgpu::CommandEncoder,
    clear_color: bool,
    clear_depth: bool,
}

/// Window-backed compositing target.
///
/// Every pass of a frame is recorded into one encoder and submitted in
/// `end_frame`. Colour and depth clears are folded into the load ops of the
/// next pass that touches the attachment.
pub(crate) struct GpuTarget {
    context: GpuContext,
    pipeline: CompositePipeline,
    viewport: Viewport,
    frame: Option<ActiveFrame>,
}

impl GpuTarget {
    pub fn new<W>(window: &W, size: PhysicalSize<u32>, viewport: Viewport) -> RenderResult<Self>
    where
        W: HasDisplayHandle + HasWindowHandle,
    {
        let context = GpuContext::new(window, size)?;
        let pipeline = CompositePipeline::new(&context.device, context.surface_format)?;
        Ok(Self {
            context,
            pipeline,
            viewport,
            frame: None,
        })
    }

    pub fn resize(&mut self, size: PhysicalSize<u32>, viewport: Viewport) {
        self.context.resize(size);
        self.viewport = viewport;
    }

    /// Reconfigures the swapchain after it reported `Lost` or `Outdated`.
    pub fn recover_surface(&mut self) {
        self.frame = None;
        self.context.reconfigure();
    }

    pub fn size(&self) -> PhysicalSize<u32> {
        self.context.size
    }

    fn active_frame(&mut self) -> RenderResult<&mut ActiveFrame> {
        self.frame
            .as_mut()
            .ok_or_else(|| RenderError::gpu("no frame in progress"))
    }
}

impl CompositeTarget for GpuTarget {
    type Layer = StrandTextures;

    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn create_layer(&mut self, index: usize, width: u32, height: u32) -> RenderResult<StrandTextures> {
        if width == 0 || height == 0 {
            return Err(RenderError::surface_unavailable(width, height));
        }
        Ok(StrandTextures::new(
            &self.context.device,
            &self.pipeline,
            index,
            width,
            height,
        ))
    }

    fn begin_frame(&mut self) -> RenderResult<()> {
        let surface_texture = self.context.surface.get_current_texture()?;
        let view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let encoder = self
            .context
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("strand frame encoder"),
            });
        self.frame = Some(ActiveFrame {
            surface_texture,
            view,
            encoder,
            clear_color: true,
            clear_depth: true,
        });
        Ok(())
    }

    fn composite(
        &mut self,
        layer: &StrandTextures,
        color: &RasterBuffer,
        mask: &RasterBuffer,
    ) -> RenderResult<()> {
        layer.upload(&self.context.queue, color, mask)?;

        let depth_view = &self.context.depth_view;
        let pipeline = &self.pipeline.pipeline;
        let frame = self
            .frame
            .as_mut()
            .ok_or_else(|| RenderError::gpu("composite issued outside a frame"))?;

        let color_load = if frame.clear_color {
            wgpu::LoadOp::Clear(wgpu::Color::BLACK)
        } else {
            wgpu::LoadOp::Load
        };
        let depth_load = if frame.clear_depth {
            wgpu::LoadOp::Clear(1.0)
        } else {
            wgpu::LoadOp::Load
        };

        {
            let mut pass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("strand composite pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &frame.view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: color_load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: depth_load,
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            pass.set_pipeline(pipeline);
            pass.set_bind_group(0, &layer.bind_group, &[]);
            pass.draw(0..QUAD_VERTEX_COUNT, 0..1);
        }

        frame.clear_color = false;
        frame.clear_depth = false;
        Ok(())
    }

    fn clear_depth(&mut self) -> RenderResult<()> {
        self.active_frame()?.clear_depth = true;
        Ok(())
    }

    fn end_frame(&mut self) -> RenderResult<()> {
        let Some(mut frame) = self.frame.take() else {
            return Err(RenderError::gpu("end_frame issued outside a frame"));
        };

        if frame.clear_color {
            // No strand drew this frame; the black clear still has to land.
            let _pass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("background clear pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &frame.view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });
        }

        self.context
            .queue
            .submit(std::iter::once(frame.encoder.finish()));
        frame.surface_texture.present();
        Ok(())
    }
}
