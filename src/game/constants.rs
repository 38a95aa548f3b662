//! Scene, physics and controller constants.
//! These are the defaults behind every `scene.toml` field.

/// Physics constants
pub mod physics {
    /// Default gravity in units/s²
    pub const DEFAULT_GRAVITY: f32 = 20.0;

    /// Fixed number of sub-steps per simulation advance
    pub const SUB_STEPS: u32 = 10;

    /// Mass of dynamic props and the player body
    pub const DYNAMIC_MASS: f32 = 1.0;
}

/// Character controller tunables
pub mod controller {
    pub const NORMAL_MOVE_FORCE: f32 = 100.0;
    pub const SPRINT_MOVE_FORCE: f32 = 200.0;
    pub const NORMAL_MAX_SPEED: f32 = 5.0;
    pub const SPRINT_MAX_SPEED: f32 = 10.0;
    pub const JUMP_FORCE: f32 = 100.0;

    /// Visual height below which a jump is allowed (grounded proxy)
    pub const JUMP_HEIGHT_THRESHOLD: f32 = 1.0;

    /// Horizontal velocity multiplier applied per tick with no forward/backward intent
    pub const DAMPING: f32 = 0.9;

    /// Yaw change per tick in radians
    pub const ROTATION_SPEED: f32 = 0.05;

    /// Model pivot sits this far below the collider center
    pub const PLAYER_Y_OFFSET: f32 = 3.9;
}

/// Player model and collider
pub mod player {
    pub const MODEL_PATH: &str = "assets/models/Adventurer.glb";
    pub const VISUAL_SPAWN: [f32; 3] = [15.0, 0.0, 5.0];
    pub const BODY_SPAWN: [f32; 3] = [15.0, 3.0, 5.0];
    pub const MODEL_SCALE: f32 = 5.0;
    pub const COLLIDER_RADIUS: f32 = 1.0;
    pub const COLLIDER_HEIGHT: f32 = 8.0;
}

/// Animation clip names and blending
pub mod animation {
    /// Crossfade duration in seconds
    pub const FADE_TIME: f32 = 0.2;

    pub const IDLE_CLIP: &str = "CharacterArmature|Idle";
    pub const WALK_CLIP: &str = "CharacterArmature|Walk";
    pub const RUN_CLIP: &str = "CharacterArmature|Run";
    pub const RUN_BACK_CLIP: &str = "CharacterArmature|Run_Back";
    pub const JUMP_CLIP: &str = "Jump";

    /// Length used for clips that carry no keyframes
    pub const FALLBACK_CLIP_LENGTH: f32 = 1.0;
}

/// Camera framing
pub mod camera {
    pub const FOLLOW_OFFSET: [f32; 3] = [7.0, 30.0, 25.0];
    pub const INITIAL_POSITION: [f32; 3] = [5.0, 15.0, 30.0];
    pub const FOV_DEGREES: f32 = 75.0;
    pub const NEAR: f32 = 0.1;
    pub const FAR: f32 = 1000.0;
}

/// Room layout
pub mod level {
    pub const ROOM_COUNT: u32 = 3;
    pub const ROOM_SIZE: f32 = 50.0;
    pub const WALL_HEIGHT: f32 = 20.0;
    pub const WALL_THICKNESS: f32 = 1.0;
    pub const DOOR_WIDTH: f32 = 10.0;
    pub const DOOR_HEIGHT: f32 = 15.0;
    pub const FLOOR_THICKNESS: f32 = 1.0;

    pub const FLOOR_COLOR: u32 = 0xcccccc;
    pub const WALL_COLOR: u32 = 0x000000;
    /// Camera-side wall of each room is see-through
    pub const FRONT_WALL_OPACITY: f32 = 0.5;
    pub const REFERENCE_BOX_COLOR: u32 = 0x00ff22;
}
