//! Force-driven character controller for the player body.
//!
//! The player is yaw-kinematic and force-dynamic: left/right input turns the
//! visual directly, forward/backward input pushes the body with a continuous
//! force, and the body's rotation is overwritten from the visual yaw each
//! tick. Planning is a pure function of the intent and the current body
//! state; [`CharacterController::update`] applies the plan.

use nalgebra::UnitQuaternion;
use rapier3d::prelude::RigidBodyHandle;
use serde::Serialize;

use super::input::MovementIntent;
use super::physics::{BodyKind, PhysicsWorld};
use super::scene::{NodeId, SceneGraph};
use crate::config::ControllerTuning;

/// Forward axis contribution, evaluated top to bottom; first match wins.
/// Backward sits above forward so holding both moves backward.
const AXIS_PRIORITY: [(fn(&MovementIntent) -> bool, f32); 2] = [
    (holds_backward, -1.0),
    (holds_forward, 1.0),
];

fn holds_backward(intent: &MovementIntent) -> bool {
    intent.backward
}

fn holds_forward(intent: &MovementIntent) -> bool {
    intent.forward
}

/// Signed movement along the facing direction for this intent.
pub fn forward_axis(intent: &MovementIntent) -> f32 {
    AXIS_PRIORITY
        .iter()
        .find(|(held, _)| held(intent))
        .map(|(_, axis)| *axis)
        .unwrap_or(0.0)
}

/// Facing direction in world space for a yaw angle (0 faces +Z).
pub fn facing(yaw: f32) -> [f32; 3] {
    [yaw.sin(), 0.0, yaw.cos()]
}

pub fn yaw_rotation(yaw: f32) -> UnitQuaternion<f32> {
    UnitQuaternion::from_euler_angles(0.0, yaw, 0.0)
}

/// Per-tick movement plan for the player.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionPlan {
    pub yaw: f32,
    /// Total continuous force to add this tick (movement + jump)
    pub force: [f32; 3],
    pub jumped: bool,
    /// Replacement linear velocity, if the clamp or damping changed it
    pub velocity: Option<[f32; 3]>,
    pub clamped: bool,
    pub damped: bool,
}

/// Rescales horizontal velocity down to `max_speed`, leaving vertical
/// velocity alone. Returns `None` when no rescale is needed.
pub fn clamp_horizontal_speed(velocity: [f32; 3], max_speed: f32) -> Option<[f32; 3]> {
    let speed = (velocity[0] * velocity[0] + velocity[2] * velocity[2]).sqrt();
    if speed <= max_speed || speed <= f32::EPSILON {
        return None;
    }
    let scale = max_speed / speed;
    Some([velocity[0] * scale, velocity[1], velocity[2] * scale])
}

/// Build the movement plan for one tick.
pub fn plan_motion(
    intent: &MovementIntent,
    yaw: f32,
    velocity: [f32; 3],
    visual_height: f32,
    tuning: &ControllerTuning,
) -> MotionPlan {
    let (move_force, max_speed) = if intent.sprint {
        (tuning.sprint_move_force, tuning.sprint_max_speed)
    } else {
        (tuning.normal_move_force, tuning.normal_max_speed)
    };

    let mut yaw = yaw;
    if intent.left {
        yaw += tuning.rotation_speed;
    }
    if intent.right {
        yaw -= tuning.rotation_speed;
    }

    let axis = forward_axis(intent);
    let dir = facing(yaw);
    let mut force = [
        dir[0] * axis * move_force,
        0.0,
        dir[2] * axis * move_force,
    ];

    let jumped = intent.jump && visual_height < tuning.jump_height_threshold;
    if jumped {
        force[1] += tuning.jump_force;
    }

    let mut current = velocity;
    let clamped = match clamp_horizontal_speed(current, max_speed) {
        Some(v) => {
            current = v;
            true
        }
        None => false,
    };

    let damped = !intent.is_translating();
    if damped {
        current[0] *= tuning.damping;
        current[2] *= tuning.damping;
    }

    MotionPlan {
        yaw,
        force,
        jumped,
        velocity: (clamped || damped).then_some(current),
        clamped,
        damped,
    }
}

/// The player's body, visual node and current yaw.
#[derive(Debug, Clone, Copy)]
pub struct PlayerRig {
    pub body: RigidBodyHandle,
    pub node: NodeId,
    pub yaw: f32,
}

/// What the controller did during one update.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ControllerReport {
    pub applied_force: [f32; 3],
    pub jumped: bool,
    pub clamped: bool,
    pub damped: bool,
    pub yaw: f32,
    pub velocity: [f32; 3],
}

#[derive(Debug, Clone)]
pub struct CharacterController {
    pub tuning: ControllerTuning,
}

impl CharacterController {
    pub fn new(tuning: ControllerTuning) -> Self {
        Self { tuning }
    }

    /// Applies one tick of input to the player. Must run after the
    /// simulation step so it reads post-step body state.
    ///
    /// Returns `None` if the body or node is gone, or if the body is not a
    /// `YawKinematicPositionDynamic` player body.
    pub fn update(
        &self,
        intent: &MovementIntent,
        physics: &mut PhysicsWorld,
        scene: &mut SceneGraph,
        rig: &mut PlayerRig,
    ) -> Option<ControllerReport> {
        let kind = physics.body_kind(rig.body)?;
        if kind != BodyKind::YawKinematicPositionDynamic {
            log::warn!("[Controller] refusing to drive {:?} body {:?}", kind, rig.body);
            return None;
        }
        let velocity = physics.get_velocity(rig.body)?;
        let visual_height = scene.get(rig.node)?.position[1];

        let plan = plan_motion(intent, rig.yaw, velocity, visual_height, &self.tuning);

        rig.yaw = plan.yaw;
        let rotation = yaw_rotation(plan.yaw);
        if let Some(node) = scene.get_mut(rig.node) {
            node.rotation = rotation;
        }

        if plan.force != [0.0; 3] {
            physics.apply_force(rig.body, plan.force);
        }
        if let Some(v) = plan.velocity {
            physics.set_velocity(rig.body, v);
        }
        physics.set_rotation(rig.body, rotation);

        let [x, y, z] = physics.get_position(rig.body)?;
        if let Some(node) = scene.get_mut(rig.node) {
            node.position = [x, y - self.tuning.player_y_offset, z];
        }

        Some(ControllerReport {
            applied_force: plan.force,
            jumped: plan.jumped,
            clamped: plan.clamped,
            damped: plan.damped,
            yaw: plan.yaw,
            velocity: plan.velocity.unwrap_or(velocity),
        })
    }
}
