use std::path::Path;

use anyhow::{Context, Result};
use renderer::{CurveParams, GradientStop, PointTerms, Rgb, StrandSettings};
use sceneconfig::{CurveConfig, PointTermsConfig, SceneConfig};

/// Reads and validates the scene file, or returns the built-in scene.
pub fn load_scene(path: Option<&Path>) -> Result<SceneConfig> {
    let Some(path) = path else {
        tracing::debug!("no scene file given; using built-in defaults");
        return Ok(SceneConfig::default());
    };
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read scene file {}", path.display()))?;
    let scene = SceneConfig::from_toml_str(&contents)
        .with_context(|| format!("failed to load scene file {}", path.display()))?;
    tracing::debug!(path = %path.display(), "loaded scene file");
    Ok(scene)
}

/// Converts a validated scene into renderer settings.
pub fn strand_settings(scene: &SceneConfig) -> Result<StrandSettings> {
    let stops = scene
        .stops
        .iter()
        .enumerate()
        .map(|(index, stop)| {
            let color = Rgb::parse(&stop.color)
                .with_context(|| format!("stop {index} has an invalid colour"))?;
            Ok(GradientStop::new(stop.position, color, stop.opacity))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(StrandSettings {
        strand_count: scene.strands.count,
        table_length: scene.strands.table_length,
        stops,
        curve: curve_params(&scene.curve),
        pixel_ratio_cap: scene.render.pixel_ratio_cap,
    })
}

fn curve_params(config: &CurveConfig) -> CurveParams {
    let defaults = CurveParams::default();
    CurveParams {
        segments: config.segments.unwrap_or(defaults.segments),
        ctrl1: config.ctrl1.map_or(defaults.ctrl1, point_terms),
        ctrl2: config.ctrl2.map_or(defaults.ctrl2, point_terms),
        end: config.end.map_or(defaults.end, point_terms),
    }
}

fn point_terms(config: PointTermsConfig) -> PointTerms {
    PointTerms {
        angle_per_segment: config.angle_per_segment,
        angle_per_phase: config.angle_per_phase,
        radius_base: config.radius_base,
        radius_per_segment: config.radius_per_segment,
        radius_per_phase: config.radius_per_phase,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_scene_maps_to_default_settings() {
        let settings = strand_settings(&SceneConfig::default()).unwrap();
        assert_eq!(settings, StrandSettings::default());
    }

    #[test]
    fn curve_overrides_replace_only_named_parts() {
        let scene = SceneConfig::from_toml_str(
            r#"
[curve]
segments = 3

[curve.ctrl2]
radius_base = 50.0
"#,
        )
        .unwrap();
        let settings = strand_settings(&scene).unwrap();
        let defaults = CurveParams::default();
        assert_eq!(settings.curve.segments, 3);
        assert_eq!(settings.curve.ctrl1, defaults.ctrl1);
        assert_eq!(settings.curve.ctrl2.radius_base, 50.0);
        assert_eq!(settings.curve.ctrl2.angle_per_phase, 0.0);
        assert_eq!(settings.curve.end, defaults.end);
    }

    #[test]
    fn invalid_stop_colour_is_reported() {
        let scene = SceneConfig::from_toml_str(
            r#"
[[stops]]
position = 0.0
color = "not-a-colour"
"#,
        )
        .unwrap();
        let err = strand_settings(&scene).unwrap_err();
        assert!(format!("{err:#}").contains("not-a-colour"));
    }

    #[test]
    fn missing_scene_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_scene(Some(&dir.path().join("absent.toml"))).unwrap_err();
        assert!(err.to_string().contains("failed to read scene file"));
    }

    #[test]
    fn scene_file_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scene.toml");
        std::fs::write(&path, "[strands]\ncount = 6\n").unwrap();
        let scene = load_scene(Some(&path)).unwrap();
        assert_eq!(scene.strands.count, 6);
    }
}
