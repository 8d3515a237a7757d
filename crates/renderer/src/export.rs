use std::path::{Path, PathBuf};

use crate::compositor::{SoftwareTarget, Viewport};
use crate::error::{RenderError, RenderResult};
use crate::frame::{FrameDriver, RendererContext, StrandSettings};
use crate::runtime::FixedTimeSource;

/// Renders one frame at `time` seconds off-screen and writes it to `path` as PNG.
pub fn export_still(
    surface_size: (u32, u32),
    settings: &StrandSettings,
    time: f64,
    path: &Path,
) -> RenderResult<PathBuf> {
    let image = render_still(surface_size, settings, time)?;
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|err| {
            RenderError::Export(format!("failed to create {}: {err}", parent.display()))
        })?;
    }
    image.save_with_format(path, image::ImageFormat::Png).map_err(|err| {
        RenderError::Export(format!("failed to write {}: {err}", path.display()))
    })?;
    tracing::info!(
        path = %path.display(),
        width = image.width(),
        height = image.height(),
        time,
        "still frame exported"
    );
    Ok(path.to_path_buf())
}

/// Renders one frame at `time` seconds into an RGBA image.
pub fn render_still(
    surface_size: (u32, u32),
    settings: &StrandSettings,
    time: f64,
) -> RenderResult<image::RgbaImage> {
    let (width, height) = surface_size;
    let viewport = Viewport::new(width as f32, height as f32, settings.pixel_ratio(1.0));
    let mut target = SoftwareTarget::new(viewport);
    let mut context = RendererContext::new(settings, &mut target)?;
    FrameDriver::new(Box::new(FixedTimeSource::new(time))).tick(&mut context, &mut target)?;

    let (pixel_width, pixel_height) = target.size();
    let mut image = image::RgbaImage::from_raw(pixel_width, pixel_height, target.to_rgba8())
        .ok_or_else(|| {
            RenderError::Export(format!(
                "frame buffer does not match {pixel_width}x{pixel_height}"
            ))
        })?;
    // Presented frames land on an opaque surface.
    for pixel in image.pixels_mut() {
        pixel[3] = u8::MAX;
    }
    Ok(image)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn export_writes_png_of_requested_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("still.png");
        let settings = StrandSettings::default();

        let written = export_still((160, 120), &settings, 1.5, &path).unwrap();
        assert_eq!(written, path);

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
        let decoded = image::load_from_memory(&bytes).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (160, 120));
        assert_eq!(decoded, render_still((160, 120), &settings, 1.5).unwrap());
    }

    #[test]
    fn stills_are_deterministic_per_time() {
        let settings = StrandSettings::default();
        let first = render_still((96, 64), &settings, 4.0).unwrap();
        let second = render_still((96, 64), &settings, 4.0).unwrap();
        let later = render_still((96, 64), &settings, 4.5).unwrap();
        assert_eq!(first, second);
        assert_ne!(first, later);
    }

    #[test]
    fn centre_of_the_frame_is_lit() {
        let image = render_still((200, 200), &StrandSettings::default(), 0.0).unwrap();
        let centre = image.get_pixel(100, 100);
        assert!(centre[0] > 0, "centre pixel {centre:?}");
    }
}
