//! Common configuration types shared across OpenKart crates

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid config syntax: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    #[error("Invalid config value: {0}")]
    InvalidValue(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Difficulty presets cycled by the player (F4)
pub const DIFFICULTY_CYCLE: [f32; 3] = [0.8, 1.0, 1.2];

/// Next difficulty in the preset cycle. Values outside the cycle restart
/// from the middle preset.
pub fn next_difficulty(current: f32) -> f32 {
    match DIFFICULTY_CYCLE.iter().position(|d| (d - current).abs() < 1e-6) {
        Some(idx) => DIFFICULTY_CYCLE[(idx + 1) % DIFFICULTY_CYCLE.len()],
        None => DIFFICULTY_CYCLE[DIFFICULTY_CYCLE.len() / 2],
    }
}

/// Which circuit a race is played on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackSource {
    /// The fixed five-segment demo circuit
    Demo,
    /// A seeded procedural loop
    Generated,
}

impl TrackSource {
    pub fn display_name(&self) -> &str {
        match self {
            TrackSource::Demo => "Demo circuit",
            TrackSource::Generated => "Generated circuit",
        }
    }
}

/// Handling parameters of a kart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VehicleTuning {
    pub max_speed: f32,
    pub accel: f32,
    pub brake: f32,
    pub drag: f32,
    pub side_friction: f32,
    pub steer_power: f32,
    pub drift_boost: f32,
    /// Lateral push per unit curvature at full speed
    pub curve_push: f32,
}

impl Default for VehicleTuning {
    fn default() -> Self {
        Self {
            max_speed: 220.0,
            accel: 120.0,
            brake: 160.0,
            drag: 40.0,
            side_friction: 8.0,
            steer_power: 2.0,
            drift_boost: 40.0,
            curve_push: 62.5,
        }
    }
}

/// Race rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RaceSettings {
    pub track: TrackSource,
    /// Seed for decorations and procedural layouts
    pub seed: u64,
    pub laps: u32,
    pub difficulty: f32,
    pub items: bool,
}

impl Default for RaceSettings {
    fn default() -> Self {
        Self {
            track: TrackSource::Demo,
            seed: 8,
            laps: 2,
            difficulty: 1.0,
            items: true,
        }
    }
}

/// Window and frame pacing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplaySettings {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    /// Integer window scale applied to the framebuffer
    pub scale: u32,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            width: 320,
            height: 240,
            fps: 60,
            scale: 3,
        }
    }
}

/// Application-wide configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub race: RaceSettings,
    pub tuning: VehicleTuning,
    pub display: DisplaySettings,
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            race: RaceSettings::default(),
            tuning: VehicleTuning::default(),
            display: DisplaySettings::default(),
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Parse and validate a TOML document. Missing tables and keys fall
    /// back to their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from disk. A missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::info!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        let t = &self.tuning;
        if !(t.max_speed.is_finite() && t.max_speed > 0.0) {
            return Err(ConfigError::InvalidValue(format!(
                "tuning.max_speed must be positive, got {}",
                t.max_speed
            )));
        }
        let non_negative = [
            ("accel", t.accel),
            ("brake", t.brake),
            ("drag", t.drag),
            ("side_friction", t.side_friction),
            ("steer_power", t.steer_power),
            ("drift_boost", t.drift_boost),
            ("curve_push", t.curve_push),
        ];
        for (name, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::InvalidValue(format!(
                    "tuning.{} must be non-negative, got {}",
                    name, value
                )));
            }
        }
        if self.race.laps == 0 {
            return Err(ConfigError::InvalidValue("race.laps must be at least 1".into()));
        }
        if !(self.race.difficulty.is_finite() && self.race.difficulty > 0.0) {
            return Err(ConfigError::InvalidValue(format!(
                "race.difficulty must be positive, got {}",
                self.race.difficulty
            )));
        }
        let d = &self.display;
        if d.width == 0 || d.height == 0 || d.scale == 0 {
            return Err(ConfigError::InvalidValue(format!(
                "display size must be non-zero, got {}x{} scale {}",
                d.width, d.height, d.scale
            )));
        }
        if d.fps == 0 {
            return Err(ConfigError::InvalidValue("display.fps must be at least 1".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(AppConfig::default().validate().is_ok());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = AppConfig::from_toml_str(
            r#"
            [race]
            laps = 3
            track = "generated"

            [tuning]
            max_speed = 180.0
            "#,
        )
        .unwrap();
        assert_eq!(config.race.laps, 3);
        assert_eq!(config.race.track, TrackSource::Generated);
        assert_eq!(config.tuning.max_speed, 180.0);
        assert_eq!(config.tuning.accel, VehicleTuning::default().accel);
        assert_eq!(config.display, DisplaySettings::default());
    }

    #[test]
    fn toml_round_trip() {
        let mut config = AppConfig::default();
        config.race.seed = 42;
        config.race.items = false;
        let text = config.to_toml_string().unwrap();
        let parsed = AppConfig::from_toml_str(&text).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn rejects_invalid_values() {
        let err = AppConfig::from_toml_str("[race]\nlaps = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(_)), "got {:?}", err);

        let err = AppConfig::from_toml_str("[tuning]\nmax_speed = -1.0\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(_)), "got {:?}", err);

        let err = AppConfig::from_toml_str("[display]\nwidth = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(_)), "got {:?}", err);
    }

    #[test]
    fn rejects_bad_syntax() {
        let err = AppConfig::from_toml_str("[race\nlaps = 2").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)), "got {:?}", err);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let config = AppConfig::load("/definitely/not/here/openkart.toml").unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn difficulty_cycles() {
        assert_eq!(next_difficulty(0.8), 1.0);
        assert_eq!(next_difficulty(1.0), 1.2);
        assert_eq!(next_difficulty(1.2), 0.8);
        assert_eq!(next_difficulty(3.0), 1.0, "unknown values restart from the middle");
        assert_eq!(next_difficulty(0.5), 1.0);
    }

    #[test]
    fn track_source_names() {
        assert_eq!(TrackSource::Demo.display_name(), "Demo circuit");
    }
}
