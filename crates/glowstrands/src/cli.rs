use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "glowstrands",
    author,
    version,
    about = "Animated glowing strands composited with wgpu"
)]
pub struct Cli {
    /// Scene description (TOML). Built-in defaults are used when omitted.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Window or export size in logical units (e.g. `1280x720`).
    #[arg(long, value_name = "WIDTHxHEIGHT", value_parser = parse_size)]
    pub size: Option<(u32, u32)>,

    /// Number of phase-shifted strands to draw.
    #[arg(long, value_name = "COUNT")]
    pub strands: Option<usize>,

    /// Frame-rate cap for the window (0 = every display refresh).
    #[arg(long, value_name = "FPS")]
    pub fps: Option<f32>,

    /// Render a single still frame in the window instead of animating.
    #[arg(long)]
    pub still: bool,

    /// Animation time in seconds used for `--still` and `--still-export`.
    #[arg(long, value_name = "SECONDS", value_parser = parse_still_time)]
    pub still_time: Option<f64>,

    /// Render one frame off-screen to the provided PNG path, then exit.
    #[arg(long, value_name = "PATH", value_parser = parse_export_path)]
    pub still_export: Option<PathBuf>,
}

pub fn parse() -> Cli {
    Cli::parse()
}

pub fn parse_size(value: &str) -> Result<(u32, u32), String> {
    let (width, height) = value
        .trim()
        .split_once(['x', 'X', '×'])
        .ok_or_else(|| "expected WxH format, e.g. 1920x1080".to_string())?;
    let width: u32 = width
        .trim()
        .parse()
        .map_err(|_| "invalid width in size".to_string())?;
    let height: u32 = height
        .trim()
        .parse()
        .map_err(|_| "invalid height in size".to_string())?;
    if width == 0 || height == 0 {
        return Err("surface dimensions must be greater than zero".into());
    }
    Ok((width, height))
}

pub fn parse_still_time(value: &str) -> Result<f64, String> {
    let seconds: f64 = value
        .trim()
        .parse()
        .map_err(|_| format!("invalid still time '{value}'; expected seconds"))?;
    if !seconds.is_finite() || seconds < 0.0 {
        return Err("still time must be a non-negative number of seconds".into());
    }
    Duration::try_from_secs_f64(seconds)
        .map_err(|_| format!("still time '{value}' is too large"))?;
    Ok(seconds)
}

pub fn parse_export_path(value: &str) -> Result<PathBuf, String> {
    let path = Path::new(value);
    match path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .as_deref()
    {
        Some("png") => Ok(path.to_path_buf()),
        None => Err("export path has no extension; expected .png".to_string()),
        Some(other) => Err(format!(
            "unsupported export format '.{other}'; expected .png"
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_size_variants() {
        assert_eq!(parse_size("1280x720").unwrap(), (1280, 720));
        assert_eq!(parse_size(" 640 X 480 ").unwrap(), (640, 480));
        assert!(parse_size("0x480").is_err());
        assert!(parse_size("1280").is_err());
        assert!(parse_size("widex720").is_err());
    }

    #[test]
    fn still_time_must_be_non_negative() {
        assert_eq!(parse_still_time("2.5").unwrap(), 2.5);
        assert!(parse_still_time("-1").is_err());
        assert!(parse_still_time("soon").is_err());
        assert!(parse_still_time("1e300").is_err());
        assert!(Cli::try_parse_from(["glowstrands", "--still-time", "1e300"]).is_err());
    }

    #[test]
    fn export_path_must_be_png() {
        assert!(parse_export_path("out/frame.PNG").is_ok());
        assert!(parse_export_path("frame.exr").is_err());
        assert!(parse_export_path("frame").is_err());
    }

    #[test]
    fn cli_accepts_all_flags() {
        let cli = Cli::try_parse_from([
            "glowstrands",
            "--config",
            "scene.toml",
            "--size",
            "320x240",
            "--strands",
            "2",
            "--fps",
            "30",
            "--still-time",
            "1.5",
            "--still-export",
            "frame.png",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("scene.toml")));
        assert_eq!(cli.size, Some((320, 240)));
        assert_eq!(cli.strands, Some(2));
        assert_eq!(cli.fps, Some(30.0));
        assert!(!cli.still);
        assert_eq!(cli.still_time, Some(1.5));
        assert_eq!(cli.still_export, Some(PathBuf::from("frame.png")));
    }
}
