/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to sensible defaults if the file is missing or incomplete.

use serde::Deserialize;
use std::path::PathBuf;

use crate::domain::physics::Tuning;

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub tick_rate_ms: u64,
    pub tuning: Tuning,
    pub stages_dir: PathBuf,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    general: TomlGeneral,
    #[serde(default)]
    speed: TomlSpeed,
    #[serde(default)]
    physics: TomlPhysics,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default = "default_stages_dir")]
    stages_dir: String,
}

#[derive(Deserialize, Debug)]
struct TomlSpeed {
    #[serde(default = "default_tick_rate")]
    tick_rate_ms: u64,
}

#[derive(Deserialize, Debug)]
struct TomlPhysics {
    #[serde(default = "default_gravity")]
    gravity: f32,
    #[serde(default = "default_jump_power")]
    jump_power: f32,
    #[serde(default = "default_max_fall_speed")]
    max_fall_speed: f32,
    #[serde(default = "default_move_speed")]
    move_speed: f32,
    #[serde(default = "default_platform_speed")]
    platform_speed: f32,
    #[serde(default = "default_lift_speed")]
    lift_speed: f32,
}

// ── Defaults ──

fn default_stages_dir() -> String { "stages".into() }
fn default_tick_rate() -> u64 { 50 }

fn default_gravity() -> f32 { 25.0 }
fn default_jump_power() -> f32 { 11.0 }
fn default_max_fall_speed() -> f32 { 16.0 }
fn default_move_speed() -> f32 { 5.0 }
fn default_platform_speed() -> f32 { 2.0 }
fn default_lift_speed() -> f32 { 3.0 }

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral { stages_dir: default_stages_dir() }
    }
}

impl Default for TomlSpeed {
    fn default() -> Self {
        TomlSpeed { tick_rate_ms: default_tick_rate() }
    }
}

impl Default for TomlPhysics {
    fn default() -> Self {
        TomlPhysics {
            gravity: default_gravity(),
            jump_power: default_jump_power(),
            max_fall_speed: default_max_fall_speed(),
            move_speed: default_move_speed(),
            platform_speed: default_platform_speed(),
            lift_speed: default_lift_speed(),
        }
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory,
    /// (3) XDG data home, (4) /usr/share/embertide.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        let search_dirs = candidate_dirs();
        let toml_cfg = load_toml(&search_dirs);

        let stages_dir_str = &toml_cfg.general.stages_dir;
        let stages_dir = if PathBuf::from(stages_dir_str).is_absolute() {
            PathBuf::from(stages_dir_str)
        } else {
            search_dirs
                .iter()
                .map(|d| d.join(stages_dir_str))
                .find(|p| p.is_dir())
                .unwrap_or_else(|| PathBuf::from(stages_dir_str))
        };

        GameConfig {
            tick_rate_ms: toml_cfg.speed.tick_rate_ms,
            tuning: Tuning {
                gravity: toml_cfg.physics.gravity,
                jump_power: toml_cfg.physics.jump_power,
                max_fall_speed: toml_cfg.physics.max_fall_speed,
                move_speed: toml_cfg.physics.move_speed,
                platform_speed: toml_cfg.physics.platform_speed,
                lift_speed: toml_cfg.physics.lift_speed,
            },
            stages_dir,
        }
    }
}

/// Candidate directories to search: exe dir + CWD + system paths (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    if let Ok(exe) = std::env::current_exe() {
        // Resolve symlinks so a linked binary still finds its data.
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share/embertide");
        if xdg.is_dir() && !dirs.iter().any(|d| d == &xdg) {
            dirs.push(xdg);
        }
    }

    let sys = PathBuf::from("/usr/share/embertide");
    if sys.is_dir() && !dirs.iter().any(|d| d == &sys) {
        dirs.push(sys);
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
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(text) => match toml::from_str::<TomlConfig>(&text) {
                    Ok(cfg) => return cfg,
                    Err(e) => {
                        eprintln!("Warning: config.toml parse error: {e}");
                        eprintln!("Using default settings.");
                        return TomlConfig::default();
                    }
                },
                Err(e) => {
                    eprintln!("Warning: could not read {}: {e}", path.display());
                }
            }
        }
    }
    TomlConfig::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_yields_defaults() {
        let cfg: TomlConfig = toml::from_str("").expect("empty config should parse");
        assert_eq!(cfg.speed.tick_rate_ms, 50);
        assert_eq!(cfg.physics.gravity, 25.0);
        assert_eq!(cfg.general.stages_dir, "stages");
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let cfg: TomlConfig = toml::from_str("[physics]\njump_power = 13.5\n")
            .expect("partial config should parse");
        assert_eq!(cfg.physics.jump_power, 13.5);
        assert_eq!(cfg.physics.gravity, 25.0);
        assert_eq!(cfg.speed.tick_rate_ms, 50);
    }

    #[test]
    fn full_config_overrides_everything() {
        let text = concat!(
            "[general]\nstages_dir = \"maps\"\n",
            "[speed]\ntick_rate_ms = 33\n",
            "[physics]\ngravity = 30.0\nmove_speed = 8.0\n",
        );
        let cfg: TomlConfig = toml::from_str(text).expect("config should parse");
        assert_eq!(cfg.general.stages_dir, "maps");
        assert_eq!(cfg.speed.tick_rate_ms, 33);
        assert_eq!(cfg.physics.gravity, 30.0);
        assert_eq!(cfg.physics.move_speed, 8.0);
    }
}
