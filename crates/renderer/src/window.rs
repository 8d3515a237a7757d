use std::sync::Arc;
use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use winit::dpi::{LogicalSize, PhysicalSize};
use winit::event::{Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::window::{Window, WindowBuilder};

use crate::compositor::{CompositeTarget, Viewport};
use crate::error::{RenderError, RenderResult};
use crate::frame::{FrameDriver, RendererContext, StrandSettings};
use crate::gpu::GpuTarget;
use crate::runtime::{time_source_for_policy, FrameScheduler};
use crate::RendererConfig;

/// Logical drawable area for a window of `size` physical pixels.
pub(crate) fn viewport_for(
    size: PhysicalSize<u32>,
    scale_factor: f64,
    settings: &StrandSettings,
) -> Viewport {
    let device_ratio = if scale_factor.is_finite() && scale_factor > 0.0 {
        scale_factor
    } else {
        1.0
    };
    Viewport::new(
        (f64::from(size.width) / device_ratio) as f32,
        (f64::from(size.height) / device_ratio) as f32,
        settings.pixel_ratio(device_ratio),
    )
}

/// Everything the event loop touches between frames.
///
/// `target` is declared before `window` so the surface drops first.
struct WindowState {
    target: GpuTarget,
    context: RendererContext<<GpuTarget as CompositeTarget>::Layer>,
    driver: FrameDriver,
    settings: StrandSettings,
    window: Arc<Window>,
}

impl WindowState {
    fn new(window: Arc<Window>, config: &RendererConfig) -> RenderResult<Self> {
        let size = window.inner_size();
        let viewport = viewport_for(size, window.scale_factor(), &config.settings);
        let mut target = GpuTarget::new(window.as_ref(), size, viewport)?;
        let context = RendererContext::new(&config.settings, &mut target)?;
        Ok(Self {
            target,
            context,
            driver: FrameDriver::new(time_source_for_policy(&config.policy)),
            settings: config.settings.clone(),
            window,
        })
    }

    fn window(&self) -> &Window {
        self.window.as_ref()
    }

    fn resize(&mut self, size: PhysicalSize<u32>, scale_factor: f64) {
        if size.width == 0 || size.height == 0 {
            return;
        }
        let viewport = viewport_for(size, scale_factor, &self.settings);
        tracing::debug!(
            width = size.width,
            height = size.height,
            scale_factor,
            "window resized"
        );
        self.target.resize(size, viewport);
    }

    fn render_frame(&mut self) -> RenderResult<()> {
        self.driver.tick(&mut self.context, &mut self.target)
    }
}

/// Opens a window and animates the strands until it is closed or a frame fails.
pub(crate) fn run_window(config: &RendererConfig) -> Result<()> {
    let event_loop = EventLoop::new().map_err(|err| anyhow!("failed to create event loop: {err}"))?;

    let (width, height) = config.surface_size;
    let window = WindowBuilder::new()
        .with_title(config.title.as_str())
        .with_inner_size(LogicalSize::new(width, height))
        .build(&event_loop)
        .map_err(|err| anyhow!("failed to create window: {err}"))?;
    let window = Arc::new(window);

    let mut state =
        WindowState::new(window, config).context("failed to initialise window renderer")?;
    let mut scheduler = FrameScheduler::new(&config.policy);
    tracing::info!(
        width,
        height,
        strands = config.settings.strand_count,
        "strand animation started"
    );
    state.window().request_redraw();

    let mut failure: Option<RenderError> = None;
    let failure_slot = &mut failure;
    event_loop
        .run(move |event, elwt| match event {
            Event::WindowEvent { window_id, event } if window_id == state.window().id() => {
                match event {
                    WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                        elwt.exit();
                    }
                    WindowEvent::Resized(new_size) => {
                        let scale_factor = state.window().scale_factor();
                        state.resize(new_size, scale_factor);
                        scheduler.reset();
                        state.window().request_redraw();
                    }
                    WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                        let size = state.target.size();
                        state.resize(size, scale_factor);
                        scheduler.reset();
                    }
                    WindowEvent::RedrawRequested => match state.render_frame() {
                        Ok(()) => scheduler.mark_rendered(),
                        Err(err) => {
                            let recoverable = matches!(
                                err.as_surface_error(),
                                Some(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated)
                            );
                            if recoverable {
                                tracing::warn!(error = %err, "surface lost; reconfiguring");
                                state.target.recover_surface();
                                state.window().request_redraw();
                            } else {
                                tracing::error!(error = %err, "frame failed; stopping animation");
                                *failure_slot = Some(err);
                                elwt.exit();
                            }
                        }
                    },
                    _ => {}
                }
            }
            Event::AboutToWait => {
                let now = Instant::now();
                if scheduler.ready_for_frame(now) {
                    tracing::trace!("scheduler: issuing redraw now");
                    state.window().request_redraw();
                    elwt.set_control_flow(ControlFlow::Wait);
                } else if let Some(deadline) = scheduler.next_deadline() {
                    let ms = deadline.saturating_duration_since(now).as_millis();
                    tracing::trace!(deadline_ms = ms, "scheduler: waiting until next frame");
                    elwt.set_control_flow(ControlFlow::WaitUntil(deadline));
                } else {
                    tracing::trace!("scheduler: idle (no redraw requested)");
                    elwt.set_control_flow(ControlFlow::Wait);
                }
            }
            _ => {}
        })
        .map_err(|err| anyhow!("window event loop error: {err}"))?;

    match failure {
        Some(err) => Err(err).context("strand animation aborted"),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn viewport_is_logical_with_capped_scale() {
        let settings = StrandSettings::default();
        let viewport = viewport_for(PhysicalSize::new(1800, 1200), 3.0, &settings);
        assert!((viewport.width - 600.0).abs() < 1e-3);
        assert!((viewport.height - 400.0).abs() < 1e-3);
        assert!((viewport.scale - 2.0).abs() < f32::EPSILON);
        assert!((viewport.center_y() - 200.0).abs() < 1e-3);
    }

    #[test]
    fn invalid_scale_factor_is_treated_as_one() {
        let settings = StrandSettings::default();
        let viewport = viewport_for(PhysicalSize::new(640, 480), 0.0, &settings);
        assert_eq!(viewport, Viewport::new(640.0, 480.0, 1.0));
    }
}
