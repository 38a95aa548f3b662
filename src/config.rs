//! Scene configuration parsing from scene.toml files

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::game::constants::{animation, camera, controller, level, physics, player};

/// Simulation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Downward gravity magnitude
    pub gravity: f32,
    /// Fixed sub-steps per simulation advance
    pub sub_steps: u32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: physics::DEFAULT_GRAVITY,
            sub_steps: physics::SUB_STEPS,
        }
    }
}

/// Character controller tunables
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerTuning {
    pub normal_move_force: f32,
    pub sprint_move_force: f32,
    pub normal_max_speed: f32,
    pub sprint_max_speed: f32,
    pub jump_force: f32,
    pub jump_height_threshold: f32,
    pub damping: f32,
    pub rotation_speed: f32,
    pub player_y_offset: f32,
}

impl Default for ControllerTuning {
    fn default() -> Self {
        Self {
            normal_move_force: controller::NORMAL_MOVE_FORCE,
            sprint_move_force: controller::SPRINT_MOVE_FORCE,
            normal_max_speed: controller::NORMAL_MAX_SPEED,
            sprint_max_speed: controller::SPRINT_MAX_SPEED,
            jump_force: controller::JUMP_FORCE,
            jump_height_threshold: controller::JUMP_HEIGHT_THRESHOLD,
            damping: controller::DAMPING,
            rotation_speed: controller::ROTATION_SPEED,
            player_y_offset: controller::PLAYER_Y_OFFSET,
        }
    }
}

/// Clip name for each locomotion state
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClipNames {
    pub idle: String,
    pub walk: String,
    pub run: String,
    pub run_back: String,
    pub jump: String,
}

impl Default for ClipNames {
    fn default() -> Self {
        Self {
            idle: animation::IDLE_CLIP.to_string(),
            walk: animation::WALK_CLIP.to_string(),
            run: animation::RUN_CLIP.to_string(),
            run_back: animation::RUN_BACK_CLIP.to_string(),
            jump: animation::JUMP_CLIP.to_string(),
        }
    }
}

/// Animation blending settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    /// Crossfade duration in seconds
    pub fade_time: f32,
    pub clips: ClipNames,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            fade_time: animation::FADE_TIME,
            clips: ClipNames::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub offset: [f32; 3],
    pub initial_position: [f32; 3],
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            offset: camera::FOLLOW_OFFSET,
            initial_position: camera::INITIAL_POSITION,
            fov_degrees: camera::FOV_DEGREES,
            near: camera::NEAR,
            far: camera::FAR,
        }
    }
}

/// Player model and collider
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// glTF/GLB character model (relative to the config directory)
    pub model: String,
    pub visual_spawn: [f32; 3],
    pub body_spawn: [f32; 3],
    pub scale: f32,
    pub mass: f32,
    pub collider_radius: f32,
    pub collider_height: f32,
    /// Adds a debug node that mirrors the raw collider transform
    pub show_player_collider: bool,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            model: player::MODEL_PATH.to_string(),
            visual_spawn: player::VISUAL_SPAWN,
            body_spawn: player::BODY_SPAWN,
            scale: player::MODEL_SCALE,
            mass: physics::DYNAMIC_MASS,
            collider_radius: player::COLLIDER_RADIUS,
            collider_height: player::COLLIDER_HEIGHT,
            show_player_collider: false,
        }
    }
}

/// Room layout
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelConfig {
    pub room_count: u32,
    pub room_size: f32,
    pub wall_height: f32,
    pub wall_thickness: f32,
    pub door_width: f32,
    pub door_height: f32,
    /// Spawn the dynamic reference box at the origin
    pub reference_box: bool,
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self {
            room_count: level::ROOM_COUNT,
            room_size: level::ROOM_SIZE,
            wall_height: level::WALL_HEIGHT,
            wall_thickness: level::WALL_THICKNESS,
            door_width: level::DOOR_WIDTH,
            door_height: level::DOOR_HEIGHT,
            reference_box: true,
        }
    }
}

/// One segment of the scripted key timeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptSegment {
    /// Keys held for the whole segment (e.g. "w", "shift", " ")
    #[serde(default)]
    pub keys: Vec<String>,
    /// Number of ticks the keys stay held
    pub ticks: u32,
}

/// Scene configuration from scene.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub physics: PhysicsConfig,
    pub controller: ControllerTuning,
    pub animation: AnimationConfig,
    pub camera: CameraConfig,
    pub player: PlayerConfig,
    pub level: LevelConfig,
    pub script: Vec<ScriptSegment>,
}

impl SceneConfig {
    /// Load scene configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(path.to_path_buf(), e))?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError(path.to_path_buf(), e))
    }

    /// Load scene configuration from a directory
    /// Looks for scene.toml in the given directory
    pub fn from_dir(dir: &Path) -> Result<Self, ConfigError> {
        Self::from_file(&dir.join("scene.toml"))
    }
}

/// Errors that can occur when loading scene configuration
#[derive(Debug)]
pub enum ConfigError {
    IoError(std::path::PathBuf, std::io::Error),
    ParseError(std::path::PathBuf, toml::de::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(path, e) => {
                write!(f, "Failed to read {}: {}", path.display(), e)
            }
            ConfigError::ParseError(path, e) => {
                write!(f, "Failed to parse {}: {}", path.display(), e)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::IoError(_, e) => Some(e),
            ConfigError::ParseError(_, e) => Some(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty_config() {
        let config: SceneConfig = toml::from_str("").unwrap();
        assert_eq!(config.physics.sub_steps, 10);
        assert_eq!(config.physics.gravity, 20.0);
        assert_eq!(config.controller.sprint_move_force, 200.0);
        assert_eq!(config.controller.player_y_offset, 3.9);
        assert_eq!(config.animation.clips.run_back, "CharacterArmature|Run_Back");
        assert_eq!(config.camera.offset, [7.0, 30.0, 25.0]);
        assert!(config.script.is_empty());
    }

    #[test]
    fn test_parse_partial_sections() {
        let toml = r#"
            [controller]
            damping = 0.5

            [animation.clips]
            jump = "CharacterArmature|Jump"

            [player]
            show_player_collider = true
        "#;
        let config: SceneConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.controller.damping, 0.5);
        assert_eq!(config.controller.normal_max_speed, 5.0);
        assert_eq!(config.animation.clips.jump, "CharacterArmature|Jump");
        assert_eq!(config.animation.clips.idle, "CharacterArmature|Idle");
        assert!(config.player.show_player_collider);
        assert_eq!(config.player.collider_height, 8.0);
    }

    #[test]
    fn test_parse_script_timeline() {
        let toml = r#"
            [[script]]
            keys = ["w", "shift"]
            ticks = 120

            [[script]]
            ticks = 30
        "#;
        let config: SceneConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.script.len(), 2);
        assert_eq!(config.script[0].keys, vec!["w", "shift"]);
        assert_eq!(config.script[0].ticks, 120);
        assert!(config.script[1].keys.is_empty());
    }

    #[test]
    fn test_missing_file_reports_path() {
        let err = SceneConfig::from_dir(Path::new("/nonexistent/scene-dir")).unwrap_err();
        assert!(matches!(err, ConfigError::IoError(..)));
        assert!(err.to_string().contains("scene.toml"));
    }
}
