use std::time::Duration;

use anyhow::{Context, Result};
use renderer::{RenderPolicy, Renderer, RendererConfig};
use sceneconfig::SceneConfig;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::scene::{load_scene, strand_settings};

pub fn run(cli: Cli) -> Result<()> {
    let config = renderer_config(&cli)?;
    tracing::info!(
        width = config.surface_size.0,
        height = config.surface_size.1,
        strands = config.settings.strand_count,
        policy = ?config.policy,
        "starting glowstrands"
    );
    let mut renderer = Renderer::new(config);
    renderer.run()
}

pub fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Merges CLI flags over the scene file and resolves the render policy.
pub fn renderer_config(cli: &Cli) -> Result<RendererConfig> {
    let mut scene = load_scene(cli.config.as_deref())?;
    apply_overrides(&mut scene, cli)?;
    scene
        .validate()
        .context("command-line overrides produce an invalid scene")?;

    let settings = strand_settings(&scene)?;
    let still_time = cli.still_time.or_else(|| scene.still_time_seconds());
    let target_fps = scene.render.fps.filter(|fps| *fps > 0.0);

    let policy = if let Some(path) = cli.still_export.clone() {
        RenderPolicy::Export {
            time: still_time,
            path,
        }
    } else if cli.still {
        RenderPolicy::Still { time: still_time }
    } else {
        RenderPolicy::Animate { target_fps }
    };

    Ok(RendererConfig {
        surface_size: (scene.window.width, scene.window.height),
        title: scene.window.title.clone(),
        policy,
        settings,
    })
}

fn apply_overrides(scene: &mut SceneConfig, cli: &Cli) -> Result<()> {
    if let Some((width, height)) = cli.size {
        scene.window.width = width;
        scene.window.height = height;
    }
    if let Some(count) = cli.strands {
        scene.strands.count = count;
    }
    if let Some(fps) = cli.fps {
        scene.render.fps = Some(fps);
    }
    if let Some(seconds) = cli.still_time {
        let still_time = Duration::try_from_secs_f64(seconds)
            .with_context(|| format!("still time {seconds} is out of range"))?;
        scene.render.still_time = Some(still_time);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::path::PathBuf;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("glowstrands").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn defaults_animate_uncapped() {
        let config = renderer_config(&parse(&[])).unwrap();
        assert_eq!(config.surface_size, (800, 600));
        assert_eq!(config.policy, RenderPolicy::Animate { target_fps: None });
        assert_eq!(config.settings.strand_count, 3);
    }

    #[test]
    fn flags_override_scene_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scene.toml");
        std::fs::write(
            &path,
            "[window]\nwidth = 1024\nheight = 768\n\n[render]\nfps = 24\nstill_time = 3\n",
        )
        .unwrap();
        let path_arg = path.to_string_lossy().into_owned();

        let config = renderer_config(&parse(&["--config", &path_arg, "--strands", "5"])).unwrap();
        assert_eq!(config.surface_size, (1024, 768));
        assert_eq!(config.settings.strand_count, 5);
        assert_eq!(
            config.policy,
            RenderPolicy::Animate {
                target_fps: Some(24.0)
            }
        );

        let config =
            renderer_config(&parse(&["--config", &path_arg, "--still", "--size", "64x32"]))
                .unwrap();
        assert_eq!(config.surface_size, (64, 32));
        assert_eq!(config.policy, RenderPolicy::Still { time: Some(3.0) });
    }

    #[test]
    fn zero_fps_means_uncapped() {
        let config = renderer_config(&parse(&["--fps", "0"])).unwrap();
        assert_eq!(config.policy, RenderPolicy::Animate { target_fps: None });
    }

    #[test]
    fn export_flag_selects_export_policy() {
        let config =
            renderer_config(&parse(&["--still-export", "out.png", "--still-time", "2"])).unwrap();
        assert_eq!(
            config.policy,
            RenderPolicy::Export {
                time: Some(2.0),
                path: PathBuf::from("out.png"),
            }
        );
    }

    #[test]
    fn oversized_still_time_is_an_error() {
        let mut cli = parse(&["--still-export", "out.png"]);
        cli.still_time = Some(1e300);
        let err = renderer_config(&cli).unwrap_err();
        assert!(format!("{err:#}").contains("out of range"));
    }

    #[test]
    fn zero_strands_are_rejected() {
        let err = renderer_config(&parse(&["--strands", "0"])).unwrap_err();
        assert!(format!("{err:#}").contains("strands.count"));
    }
}
