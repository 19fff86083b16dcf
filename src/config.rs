/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to sensible defaults if the file is missing or incomplete.
///
/// ```toml
/// [physics]
/// move_speed = 5
/// jump_speed = 15.0
/// fall_speed = 0.7
/// wall_jump_speed = 13.0
/// body_width = 40
/// body_height = 40
/// color = "blue"          # or [0, 128, 255]
///
/// [timing]
/// tick_rate_ms = 16
///
/// [gamepad]
/// jump = ["A", "X"]
///
/// [general]
/// levels_file = "levels.toml"
/// ```

use serde::Deserialize;
use std::path::PathBuf;
use tracing::warn;

use crate::domain::body::{BodyBuilder, KinematicBody, Rgb};
use crate::domain::error::ValidationError;

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub physics: PhysicsConfig,
    pub timing: TimingConfig,
    pub gamepad: GamepadConfig,
    /// Resolved level file, if one is configured.
    pub levels_file: Option<PathBuf>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PhysicsConfig {
    pub move_speed: i32,
    pub jump_speed: f64,
    pub fall_speed: f64,
    pub wall_jump_speed: f64,
    pub body_width: i32,
    pub body_height: i32,
    pub color: ColorSetting,
}

#[derive(Clone, Debug)]
pub struct TimingConfig {
    pub tick_rate_ms: u64,
}

#[derive(Clone, Debug)]
pub struct GamepadConfig {
    pub jump: Vec<String>,
    pub confirm: Vec<String>,
    pub cancel: Vec<String>,
}

/// A color given either by name or as `[r, g, b]`.
#[derive(Deserialize, Clone, Debug, PartialEq)]
#[serde(untagged)]
pub enum ColorSetting {
    Name(String),
    Rgb([u8; 3]),
}

impl PhysicsConfig {
    pub fn build_body(&self) -> Result<KinematicBody, ValidationError> {
        let builder = BodyBuilder::new()
            .size(self.body_width, self.body_height)
            .move_speed(self.move_speed)
            .jump_speed(self.jump_speed)
            .fall_speed(self.fall_speed)
            .wall_jump_speed(self.wall_jump_speed);
        match &self.color {
            ColorSetting::Rgb([r, g, b]) => builder.color(Rgb(*r, *g, *b)).build(),
            ColorSetting::Name(name) => {
                let mut body = builder.build()?;
                body.set_color_name(name)?;
                Ok(body)
            }
        }
    }
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    physics: TomlPhysics,
    #[serde(default)]
    timing: TomlTiming,
    #[serde(default)]
    gamepad: TomlGamepad,
    #[serde(default)]
    general: TomlGeneral,
}

#[derive(Deserialize, Debug)]
struct TomlPhysics {
    #[serde(default = "default_move_speed")]
    move_speed: i32,
    #[serde(default = "default_jump_speed")]
    jump_speed: f64,
    #[serde(default = "default_fall_speed")]
    fall_speed: f64,
    #[serde(default = "default_wall_jump_speed")]
    wall_jump_speed: f64,
    #[serde(default = "default_body_size")]
    body_width: i32,
    #[serde(default = "default_body_size")]
    body_height: i32,
    #[serde(default = "default_color")]
    color: ColorSetting,
}

#[derive(Deserialize, Debug)]
struct TomlTiming {
    #[serde(default = "default_tick_rate")]
    tick_rate_ms: u64,
}

#[derive(Deserialize, Debug)]
struct TomlGamepad {
    #[serde(default = "default_jump")]
    jump: Vec<String>,
    #[serde(default = "default_confirm")]
    confirm: Vec<String>,
    #[serde(default = "default_cancel")]
    cancel: Vec<String>,
}

#[derive(Deserialize, Debug, Default)]
struct TomlGeneral {
    #[serde(default)]
    levels_file: String,
}

// ── Defaults ──

fn default_move_speed() -> i32 { 5 }
fn default_jump_speed() -> f64 { 15.0 }
fn default_fall_speed() -> f64 { 0.7 }
fn default_wall_jump_speed() -> f64 { 13.0 }
fn default_body_size() -> i32 { 40 }
fn default_color() -> ColorSetting { ColorSetting::Rgb([0, 128, 255]) }
fn default_tick_rate() -> u64 { 16 }   // ~60 Hz

fn default_jump() -> Vec<String> { vec!["A".into(), "X".into()] }
fn default_confirm() -> Vec<String> { vec!["A".into(), "Start".into()] }
fn default_cancel() -> Vec<String> { vec!["B".into(), "Select".into()] }

impl Default for TomlPhysics {
    fn default() -> Self {
        TomlPhysics {
            move_speed: default_move_speed(),
            jump_speed: default_jump_speed(),
            fall_speed: default_fall_speed(),
            wall_jump_speed: default_wall_jump_speed(),
            body_width: default_body_size(),
            body_height: default_body_size(),
            color: default_color(),
        }
    }
}

impl Default for TomlTiming {
    fn default() -> Self {
        TomlTiming { tick_rate_ms: default_tick_rate() }
    }
}

impl Default for TomlGamepad {
    fn default() -> Self {
        TomlGamepad {
            jump: default_jump(),
            confirm: default_confirm(),
            cancel: default_cancel(),
        }
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        let search_dirs = candidate_dirs();
        let toml_cfg = load_toml(&search_dirs);
        GameConfig::from_toml(toml_cfg, &search_dirs)
    }

    /// Parse config text directly. Relative level files resolve against
    /// the usual search directories.
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        let toml_cfg = toml::from_str::<TomlConfig>(text)?;
        Ok(GameConfig::from_toml(toml_cfg, &candidate_dirs()))
    }

    fn from_toml(toml_cfg: TomlConfig, search_dirs: &[PathBuf]) -> Self {
        let tick_rate_ms = if toml_cfg.timing.tick_rate_ms == 0 {
            warn!("timing.tick_rate_ms must be at least 1, using {}", default_tick_rate());
            default_tick_rate()
        } else {
            toml_cfg.timing.tick_rate_ms
        };

        GameConfig {
            physics: PhysicsConfig {
                move_speed: toml_cfg.physics.move_speed,
                jump_speed: toml_cfg.physics.jump_speed,
                fall_speed: toml_cfg.physics.fall_speed,
                wall_jump_speed: toml_cfg.physics.wall_jump_speed,
                body_width: toml_cfg.physics.body_width,
                body_height: toml_cfg.physics.body_height,
                color: toml_cfg.physics.color,
            },
            timing: TimingConfig { tick_rate_ms },
            gamepad: GamepadConfig {
                jump: toml_cfg.gamepad.jump,
                confirm: toml_cfg.gamepad.confirm,
                cancel: toml_cfg.gamepad.cancel,
            },
            levels_file: resolve_levels_file(&toml_cfg.general.levels_file, search_dirs),
        }
    }
}

/// Empty means "built-in levels". A relative path is looked up in the
/// search directories; if it is nowhere to be found it is kept as given so
/// the catalog loader can report it.
fn resolve_levels_file(setting: &str, search_dirs: &[PathBuf]) -> Option<PathBuf> {
    let setting = setting.trim();
    if setting.is_empty() {
        return None;
    }
    let path = PathBuf::from(setting);
    if path.is_absolute() {
        return Some(path);
    }
    search_dirs
        .iter()
        .map(|d| d.join(&path))
        .find(|p| p.is_file())
        .or(Some(path))
}

/// Candidate directories to search: exe dir + CWD (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    // 1. Directory of the running executable
    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    // 2. Current working directory
    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Search for config.toml in candidate directories.
fn load_toml(search_dirs: &[PathBuf]) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if !path.exists() {
            continue;
        }
        match std::fs::read_to_string(&path) {
            Ok(text) => match toml::from_str::<TomlConfig>(&text) {
                Ok(cfg) => return cfg,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "config parse error, using defaults");
                    eprintln!("Warning: config.toml parse error: {e}");
                    eprintln!("Using default settings.");
                    return TomlConfig::default();
                }
            },
            Err(e) => {
                warn!(path = %path.display(), error = %e, "could not read config");
            }
        }
    }
    TomlConfig::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let cfg = GameConfig::from_toml_str("").unwrap();
        assert_eq!(cfg.physics.move_speed, 5);
        assert_eq!(cfg.physics.jump_speed, 15.0);
        assert_eq!(cfg.physics.fall_speed, 0.7);
        assert_eq!(cfg.physics.wall_jump_speed, 13.0);
        assert_eq!((cfg.physics.body_width, cfg.physics.body_height), (40, 40));
        assert_eq!(cfg.timing.tick_rate_ms, 16);
        assert!(cfg.levels_file.is_none());

        let body = cfg.physics.build_body().unwrap();
        assert_eq!(body.color(), Rgb(0, 128, 255));
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let cfg = GameConfig::from_toml_str(
            "[physics]\njump_speed = 18.5\ncolor = \"red\"\n\n[timing]\ntick_rate_ms = 20\n",
        )
        .unwrap();
        assert_eq!(cfg.physics.jump_speed, 18.5);
        assert_eq!(cfg.physics.move_speed, 5);
        assert_eq!(cfg.timing.tick_rate_ms, 20);
        assert_eq!(cfg.physics.build_body().unwrap().color(), Rgb(255, 0, 0));
        assert_eq!(cfg.gamepad.jump, vec!["A".to_string(), "X".to_string()]);
    }

    #[test]
    fn color_as_triple() {
        let cfg = GameConfig::from_toml_str("[physics]\ncolor = [10, 20, 30]\n").unwrap();
        assert_eq!(cfg.physics.color, ColorSetting::Rgb([10, 20, 30]));
        assert_eq!(cfg.physics.build_body().unwrap().color(), Rgb(10, 20, 30));
    }

    #[test]
    fn invalid_physics_surface_at_build() {
        let cfg = GameConfig::from_toml_str("[physics]\nfall_speed = -1.0\n").unwrap();
        assert!(cfg.physics.build_body().is_err());

        let cfg = GameConfig::from_toml_str("[physics]\ncolor = \"plaid\"\n").unwrap();
        assert_eq!(
            cfg.physics.build_body().unwrap_err(),
            ValidationError::UnknownColor("plaid".into())
        );
    }

    #[test]
    fn oversized_speeds_are_rejected_at_build() {
        let cfg = GameConfig::from_toml_str("[physics]\nmove_speed = 2147483647\n").unwrap();
        assert!(matches!(
            cfg.physics.build_body(),
            Err(ValidationError::SpeedTooLarge { name: "move_speed", .. })
        ));

        let cfg = GameConfig::from_toml_str("[physics]\nfall_speed = 1e12\n").unwrap();
        assert!(cfg.physics.build_body().is_err());
    }

    #[test]
    fn zero_tick_rate_is_replaced() {
        let cfg = GameConfig::from_toml_str("[timing]\ntick_rate_ms = 0\n").unwrap();
        assert_eq!(cfg.timing.tick_rate_ms, 16);
    }

    #[test]
    fn malformed_file_is_an_error() {
        assert!(GameConfig::from_toml_str("[physics\nmove_speed = 3").is_err());
        assert!(GameConfig::from_toml_str("[physics]\nmove_speed = \"fast\"").is_err());
    }

    #[test]
    fn levels_file_resolution() {
        assert_eq!(resolve_levels_file("  ", &[]), None);
        assert_eq!(
            resolve_levels_file("/opt/wallhop/levels.toml", &[]),
            Some(PathBuf::from("/opt/wallhop/levels.toml"))
        );
        assert_eq!(
            resolve_levels_file("missing-levels.toml", &[PathBuf::from("/nonexistent")]),
            Some(PathBuf::from("missing-levels.toml"))
        );
    }
}
