pub mod animation;
pub mod assets;
pub mod camera;
pub mod constants;
pub mod controller;
pub mod input;
pub mod level;
pub mod physics;
pub mod registry;
pub mod scene;
mod tick_pipeline;

use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;

use crate::config::SceneConfig;
use animation::{AnimationMixer, AnimationStateMachine, LocomotionState};
use assets::{AssetError, CharacterAsset, PendingCharacter};
use camera::Camera;
use controller::{CharacterController, ControllerReport, PlayerRig};
use input::{KeyboardState, MovementIntent};
use level::LevelLayout;
use physics::PhysicsWorld;
use registry::BodyRegistry;
use scene::{NodeShape, SceneGraph, VisualNode};

/// Presentation sink for a finished frame.
pub trait Presenter {
    fn present(&mut self, camera: &Camera, scene: &SceneGraph);
}

/// Measures wall-clock time between frames.
pub struct FrameClock {
    last: Instant,
}

impl FrameClock {
    pub fn new() -> Self {
        Self { last: Instant::now() }
    }

    /// Seconds since the previous call (or since construction).
    pub fn delta(&mut self) -> f32 {
        let now = Instant::now();
        let dt = now.duration_since(self.last).as_secs_f32();
        self.last = now;
        dt
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

/// Where the player is in its one-time activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PlayerStatus {
    /// No load has been requested
    Absent,
    Loading,
    Ready,
    /// Load failed; the player never activates this run
    Failed,
}

/// Serializable view of the scene after a tick.
#[derive(Debug, Clone, Serialize)]
pub struct FrameSnapshot {
    pub tick: u64,
    pub player_status: PlayerStatus,
    pub player_position: Option<[f32; 3]>,
    pub player_yaw: Option<f32>,
    pub player_velocity: Option<[f32; 3]>,
    pub locomotion: Option<LocomotionState>,
    pub active_clip: Option<String>,
    pub camera: Camera,
    pub last_report: Option<ControllerReport>,
}

/// The scene: simulation, visuals, player and camera, advanced one tick at a time.
pub struct Game {
    pub config: SceneConfig,
    pub physics: PhysicsWorld,
    pub scene: SceneGraph,
    pub registry: BodyRegistry,
    pub layout: LevelLayout,
    pub controller: CharacterController,
    pub camera: Camera,
    pub player: Option<PlayerRig>,
    pub animator: Option<AnimationStateMachine>,
    pub status: PlayerStatus,
    pub tick: u64,
    pub last_report: Option<ControllerReport>,
    pending: Option<PendingCharacter>,
}

impl Game {
    /// Builds the physics world and the room layout. The player is added
    /// later, once its asset is available.
    pub fn new(config: SceneConfig) -> Self {
        let mut physics = PhysicsWorld::with_settings(config.physics.gravity, config.physics.sub_steps);
        let mut scene = SceneGraph::new();
        let mut registry = BodyRegistry::new();
        let layout = level::build_rooms(&config.level, &mut physics, &mut scene, &mut registry);

        Self {
            controller: CharacterController::new(config.controller),
            camera: Camera::new(&config.camera),
            config,
            physics,
            scene,
            registry,
            layout,
            player: None,
            animator: None,
            status: PlayerStatus::Absent,
            tick: 0,
            last_report: None,
            pending: None,
        }
    }

    /// Starts loading the character model in the background.
    pub fn begin_character_load(&mut self, path: PathBuf) {
        log::info!("[Assets] loading character {}", path.display());
        self.pending = Some(assets::spawn_character_load(path));
        self.status = PlayerStatus::Loading;
    }

    /// Uses an already-pending load (e.g. one started elsewhere).
    pub fn set_pending_character(&mut self, pending: PendingCharacter) {
        self.pending = Some(pending);
        self.status = PlayerStatus::Loading;
    }

    pub fn is_player_ready(&self) -> bool {
        self.player.is_some() && self.animator.is_some()
    }

    /// Checks the pending load once; spawns the player on success.
    fn poll_character_load(&mut self) {
        let Some(pending) = &self.pending else {
            return;
        };
        let Some(result) = pending.poll() else {
            return;
        };
        self.pending = None;
        self.finish_character_load(result);
    }

    /// Blocks until a pending load reports, then applies the result.
    pub fn wait_for_character(&mut self) {
        if let Some(pending) = self.pending.take() {
            let result = pending.wait();
            self.finish_character_load(result);
        }
    }

    fn finish_character_load(&mut self, result: Result<CharacterAsset, AssetError>) {
        match result {
            Ok(asset) => {
                log::info!(
                    "[Assets] character ready: {} joints, clips {:?}",
                    asset.joint_names.len(),
                    asset.clip_names()
                );
                self.spawn_player(&asset);
            }
            Err(e) => {
                log::error!("[Assets] {}", e);
                self.status = PlayerStatus::Failed;
            }
        }
    }

    /// Creates the player visual, body and animator from a loaded asset.
    /// Does nothing if the player already exists.
    pub fn spawn_player(&mut self, asset: &CharacterAsset) {
        if self.player.is_some() {
            return;
        }
        let pc = &self.config.player;

        let node = self.scene.add(
            VisualNode::new(
                "player",
                NodeShape::Model {
                    path: asset.path.display().to_string(),
                },
                pc.visual_spawn,
            )
            .with_scale(pc.scale),
        );
        let body = self
            .physics
            .add_player_body(pc.body_spawn, pc.collider_radius, pc.collider_height, pc.mass);

        if pc.show_player_collider {
            let wireframe = self.scene.add(VisualNode::new(
                "player_collider",
                NodeShape::Cylinder {
                    radius: pc.collider_radius,
                    height: pc.collider_height,
                    color: 0x00ff00,
                },
                pc.body_spawn,
            ));
            self.registry.register(body, wireframe);
        }

        self.player = Some(PlayerRig { body, node, yaw: 0.0 });
        self.animator = Some(AnimationStateMachine::new(
            AnimationMixer::from_asset(asset),
            &self.config.animation,
        ));
        self.status = PlayerStatus::Ready;
    }

    /// Runs one frame: samples input, measures elapsed time, ticks and
    /// presents.
    pub fn frame(&mut self, keyboard: &KeyboardState, clock: &mut FrameClock, presenter: &mut dyn Presenter) {
        let dt = clock.delta();
        self.tick(dt, keyboard.sample());
        presenter.present(&self.camera, &self.scene);
    }

    /// Advances the scene by `dt` seconds with this tick's intent.
    pub fn tick(&mut self, dt: f32, intent: MovementIntent) {
        self.poll_character_load();
        tick_pipeline::run_tick_phases(self, dt, &intent);
    }

    pub fn player_position(&self) -> Option<[f32; 3]> {
        let rig = self.player.as_ref()?;
        self.scene.get(rig.node).map(|n| n.position)
    }

    pub fn snapshot(&self) -> FrameSnapshot {
        let rig = self.player.as_ref();
        FrameSnapshot {
            tick: self.tick,
            player_status: self.status,
            player_position: self.player_position(),
            player_yaw: rig.map(|r| r.yaw),
            player_velocity: rig.and_then(|r| self.physics.get_velocity(r.body)),
            locomotion: self.animator.as_ref().and_then(|a| a.current_state()),
            active_clip: self
                .animator
                .as_ref()
                .and_then(|a| a.active_clip())
                .map(str::to_string),
            camera: self.camera.clone(),
            last_report: self.last_report,
        }
    }
}
