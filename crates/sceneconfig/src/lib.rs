//! Scene description loaded from TOML.
//!
//! Every section is optional; a missing file or an empty document yields the
//! stock three-strand red-to-white effect.

use std::fmt;
use std::time::Duration;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SceneConfig {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub window: WindowConfig,
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub strands: StrandConfig,
    #[serde(default = "default_stops")]
    pub stops: Vec<StopConfig>,
    #[serde(default)]
    pub curve: CurveConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct WindowConfig {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default = "default_title")]
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RenderConfig {
    #[serde(default)]
    pub fps: Option<f32>,
    #[serde(default = "default_pixel_ratio_cap")]
    pub pixel_ratio_cap: f32,
    /// Animation time used for stills and exports.
    #[serde(
        default,
        deserialize_with = "deserialize_duration_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub still_time: Option<Duration>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct StrandConfig {
    #[serde(default = "default_strand_count")]
    pub count: usize,
    #[serde(default = "default_table_length")]
    pub table_length: usize,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct StopConfig {
    pub position: f32,
    /// Any CSS-style colour the renderer understands (`"orange"`, `"#ff8800"`).
    pub color: String,
    #[serde(default = "default_opacity")]
    pub opacity: f32,
}

/// Overrides for the curve family. Omitted parts keep the stock rosette.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct CurveConfig {
    #[serde(default)]
    pub segments: Option<usize>,
    #[serde(default)]
    pub ctrl1: Option<PointTermsConfig>,
    #[serde(default)]
    pub ctrl2: Option<PointTermsConfig>,
    #[serde(default)]
    pub end: Option<PointTermsConfig>,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct PointTermsConfig {
    #[serde(default)]
    pub angle_per_segment: f64,
    #[serde(default)]
    pub angle_per_phase: f64,
    #[serde(default)]
    pub radius_base: f64,
    #[serde(default)]
    pub radius_per_segment: f64,
    #[serde(default)]
    pub radius_per_phase: f64,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            window: WindowConfig::default(),
            render: RenderConfig::default(),
            strands: StrandConfig::default(),
            stops: default_stops(),
            curve: CurveConfig::default(),
        }
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            title: default_title(),
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            fps: None,
            pixel_ratio_cap: default_pixel_ratio_cap(),
            still_time: None,
        }
    }
}

impl Default for StrandConfig {
    fn default() -> Self {
        Self {
            count: default_strand_count(),
            table_length: default_table_length(),
        }
    }
}

impl StopConfig {
    pub fn new(position: f32, color: impl Into<String>, opacity: f32) -> Self {
        Self {
            position,
            color: color.into(),
            opacity,
        }
    }
}

fn default_version() -> u32 {
    1
}

fn default_width() -> u32 {
    800
}

fn default_height() -> u32 {
    600
}

fn default_title() -> String {
    "Glowstrands".to_string()
}

fn default_pixel_ratio_cap() -> f32 {
    2.0
}

fn default_strand_count() -> usize {
    3
}

fn default_table_length() -> usize {
    25
}

fn default_opacity() -> f32 {
    1.0
}

fn default_stops() -> Vec<StopConfig> {
    vec![
        StopConfig::new(0.0, "red", 0.0),
        StopConfig::new(0.25, "orange", 0.5),
        StopConfig::new(0.5, "white", 1.0),
    ]
}

fn deserialize_duration_opt<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    struct Visitor;
    impl<'de> de::Visitor<'de> for Visitor {
        type Value = Option<Duration>;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            formatter.write_str("a duration as number of seconds or human-readable string")
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            humantime::parse_duration(v)
                .map(Some)
                .map_err(|err| E::custom(format!("invalid duration '{v}': {err}")))
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if v < 0 {
                return Err(E::custom("duration must be non-negative"));
            }
            Ok(Some(Duration::from_secs(v as u64)))
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(Duration::from_secs(v)))
        }

        fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if !v.is_finite() || v.is_sign_negative() {
                return Err(E::custom("duration must be non-negative"));
            }
            Duration::try_from_secs_f64(v)
                .map(Some)
                .map_err(|err| E::custom(format!("invalid duration {v}: {err}")))
        }
    }

    deserializer.deserialize_any(Visitor)
}

impl SceneConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let raw: SceneConfig = toml::from_str(input)?;
        raw.validate()?;
        Ok(raw)
    }

    pub fn still_time_seconds(&self) -> Option<f64> {
        self.render.still_time.map(|time| time.as_secs_f64())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version != 1 {
            return Err(ConfigError::Invalid(format!(
                "unsupported config version {}; expected 1",
                self.version
            )));
        }

        if self.window.width == 0 || self.window.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "window size {}x{} must be non-zero",
                self.window.width, self.window.height
            )));
        }

        if self.strands.count == 0 {
            return Err(ConfigError::Invalid(
                "strands.count must be at least 1".into(),
            ));
        }

        if self.strands.table_length == 0 {
            return Err(ConfigError::Invalid(
                "strands.table_length must be at least 1".into(),
            ));
        }

        if let Some(fps) = self.render.fps {
            if !fps.is_finite() || fps < 0.0 {
                return Err(ConfigError::Invalid("render.fps must be >= 0".into()));
            }
        }

        if !self.render.pixel_ratio_cap.is_finite() || self.render.pixel_ratio_cap <= 0.0 {
            return Err(ConfigError::Invalid(
                "render.pixel_ratio_cap must be greater than zero".into(),
            ));
        }

        if self.stops.is_empty() {
            return Err(ConfigError::Invalid(
                "config must define at least one gradient stop".into(),
            ));
        }

        for (index, stop) in self.stops.iter().enumerate() {
            if !(0.0..=1.0).contains(&stop.position) {
                return Err(ConfigError::Invalid(format!(
                    "stop {index} position {} must be within [0, 1]",
                    stop.position
                )));
            }
            if !(0.0..=1.0).contains(&stop.opacity) {
                return Err(ConfigError::Invalid(format!(
                    "stop {index} opacity {} must be within [0, 1]",
                    stop.opacity
                )));
            }
            if stop.color.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "stop {index} has an empty colour"
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r##"
version = 1

[window]
width = 1280
height = 720
title = "Embers"

[render]
fps = 30
pixel_ratio_cap = 1.5
still_time = "2s 500ms"

[strands]
count = 5
table_length = 40

[[stops]]
position = 0.0
color = "#200000"
opacity = 0.0

[[stops]]
position = 0.6
color = "hsl(30deg, 100%, 50%)"

[curve]
segments = 7

[curve.end]
angle_per_segment = 12.0
radius_base = 250.0
"##;

    #[test]
    fn parses_sample_config() {
        let config = SceneConfig::from_toml_str(SAMPLE).expect("parse config");
        assert_eq!(config.window.width, 1280);
        assert_eq!(config.window.title, "Embers");
        assert_eq!(config.render.fps, Some(30.0));
        assert_eq!(config.still_time_seconds(), Some(2.5));
        assert_eq!(config.strands.count, 5);
        assert_eq!(config.stops.len(), 2);
        assert_eq!(config.stops[1].opacity, 1.0);
        assert_eq!(config.curve.segments, Some(7));
        let end = config.curve.end.expect("end terms");
        assert_eq!(end.radius_base, 250.0);
        assert_eq!(end.radius_per_segment, 0.0);
        assert!(config.curve.ctrl1.is_none());
    }

    #[test]
    fn empty_document_yields_defaults() {
        let config = SceneConfig::from_toml_str("").unwrap();
        assert_eq!(config, SceneConfig::default());
        assert_eq!(config.strands.count, 3);
        assert_eq!(config.strands.table_length, 25);
        assert_eq!(config.render.pixel_ratio_cap, 2.0);
        let colours: Vec<&str> = config.stops.iter().map(|s| s.color.as_str()).collect();
        assert_eq!(colours, ["red", "orange", "white"]);
    }

    #[test]
    fn numeric_still_time_is_seconds() {
        let config = SceneConfig::from_toml_str("[render]\nstill_time = 1.25\n").unwrap();
        assert_eq!(config.render.still_time, Some(Duration::from_millis(1250)));
    }

    #[test]
    fn oversized_still_time_is_a_parse_error() {
        let err = SceneConfig::from_toml_str("[render]\nstill_time = 1e30\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn rejects_unknown_version() {
        let err = SceneConfig::from_toml_str("version = 2").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_zero_strands_and_zero_table() {
        let err = SceneConfig::from_toml_str("[strands]\ncount = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
        let err = SceneConfig::from_toml_str("[strands]\ntable_length = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_out_of_range_stops() {
        let position = r#"
[[stops]]
position = 1.5
color = "red"
"#;
        let err = SceneConfig::from_toml_str(position).unwrap_err();
        assert!(err.to_string().contains("position"));

        let opacity = r#"
[[stops]]
position = 0.5
color = "red"
opacity = -0.1
"#;
        let err = SceneConfig::from_toml_str(opacity).unwrap_err();
        assert!(err.to_string().contains("opacity"));
    }

    #[test]
    fn rejects_empty_stop_list() {
        let err = SceneConfig::from_toml_str("stops = []").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let err = SceneConfig::from_toml_str("[strands\ncount = 3").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
