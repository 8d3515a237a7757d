//! wgpu backend for strand compositing.
//!
//! - `context` owns the instance/device/surface wiring plus the depth buffer
//!   and rebuilds swapchain state when the window resizes.
//! - `pipeline` compiles the GLSL quad shaders into the one blend pipeline.
//! - `layers` holds each strand's colour and mask textures.
//! - `target` implements [`CompositeTarget`](crate::compositor::CompositeTarget)
//!   on top of the above and is what `window` drives every frame.

mod context;
mod layers;
mod pipeline;
mod target;

pub(crate) use target::GpuTarget;
