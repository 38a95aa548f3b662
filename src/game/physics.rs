use nalgebra::UnitQuaternion;
use rapier3d::prelude::*;
use std::collections::HashMap;

use super::constants::physics as consts;

/// How a dynamic body's transform is owned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    /// Anchored level geometry; never moves.
    Static,
    /// Fully simulated; its transform is copied verbatim to its visual.
    FullyDynamic,
    /// The player: position is force-driven, rotations are locked and yaw
    /// is written kinematically by the character controller.
    YawKinematicPositionDynamic,
}

/// Collider shape for a body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BodyShape {
    Cuboid { half_extents: [f32; 3] },
    Cylinder { radius: f32, height: f32 },
}

fn build_collider(shape: BodyShape, mass: Option<f32>) -> Collider {
    let shared_shape = match shape {
        BodyShape::Cuboid { half_extents: [hx, hy, hz] } => SharedShape::cuboid(hx, hy, hz),
        BodyShape::Cylinder { radius, height } => SharedShape::cylinder(height / 2.0, radius),
    };
    let builder = ColliderBuilder::new(shared_shape);
    match mass {
        Some(m) => builder.mass(m).build(),
        None => builder.build(),
    }
}

/// Wrapper around the Rapier3D pipeline used by the scene.
pub struct PhysicsWorld {
    pub gravity: Vector<Real>,
    pub sub_steps: u32,
    pub rigid_body_set: RigidBodySet,
    pub collider_set: ColliderSet,
    pub integration_parameters: IntegrationParameters,
    pub physics_pipeline: PhysicsPipeline,
    pub island_manager: IslandManager,
    pub broad_phase: DefaultBroadPhase,
    pub narrow_phase: NarrowPhase,
    pub impulse_joint_set: ImpulseJointSet,
    pub multibody_joint_set: MultibodyJointSet,
    pub ccd_solver: CCDSolver,
    pub query_pipeline: QueryPipeline,

    /// Ownership policy of every body created through this wrapper
    pub body_kinds: HashMap<RigidBodyHandle, BodyKind>,
}

impl PhysicsWorld {
    /// Creates a new physics world with default gravity and sub-step count
    pub fn new() -> Self {
        Self::with_settings(consts::DEFAULT_GRAVITY, consts::SUB_STEPS)
    }

    pub fn with_settings(gravity: f32, sub_steps: u32) -> Self {
        Self {
            gravity: vector![0.0, -gravity, 0.0],
            sub_steps: sub_steps.max(1),
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            integration_parameters: IntegrationParameters::default(),
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            body_kinds: HashMap::new(),
        }
    }

    /// Advances the simulation by `dt` in `sub_steps` equal steps.
    ///
    /// The sub-step count does not grow with `dt`: a long frame is integrated
    /// with proportionally longer sub-steps.
    pub fn step(&mut self, dt: f32) {
        if dt <= 0.0 {
            return;
        }
        self.integration_parameters.dt = dt / self.sub_steps as f32;
        for _ in 0..self.sub_steps {
            self.physics_pipeline.step(
                &self.gravity,
                &self.integration_parameters,
                &mut self.island_manager,
                &mut self.broad_phase,
                &mut self.narrow_phase,
                &mut self.rigid_body_set,
                &mut self.collider_set,
                &mut self.impulse_joint_set,
                &mut self.multibody_joint_set,
                &mut self.ccd_solver,
                Some(&mut self.query_pipeline),
                &(),
                &(),
            );
        }
    }

    /// Clears the user forces accumulated on every body.
    pub fn clear_forces(&mut self) {
        for (_, body) in self.rigid_body_set.iter_mut() {
            body.reset_forces(false);
        }
    }

    /// Adds fixed level geometry.
    pub fn add_static_box(&mut self, center: [f32; 3], half_extents: [f32; 3]) -> RigidBodyHandle {
        let body = RigidBodyBuilder::fixed()
            .translation(vector![center[0], center[1], center[2]])
            .build();
        self.insert(body, BodyShape::Cuboid { half_extents }, None, BodyKind::Static)
    }

    /// Adds a dynamic prop. Sleeping is disabled so its visual stays live.
    pub fn add_dynamic_box(
        &mut self,
        center: [f32; 3],
        rotation: UnitQuaternion<f32>,
        half_extents: [f32; 3],
        mass: f32,
    ) -> RigidBodyHandle {
        let body = RigidBodyBuilder::dynamic()
            .translation(vector![center[0], center[1], center[2]])
            .rotation(rotation.scaled_axis())
            .can_sleep(false)
            .build();
        self.insert(body, BodyShape::Cuboid { half_extents }, Some(mass), BodyKind::FullyDynamic)
    }

    /// Adds the player's upright cylinder body with rotations locked.
    pub fn add_player_body(
        &mut self,
        position: [f32; 3],
        radius: f32,
        height: f32,
        mass: f32,
    ) -> RigidBodyHandle {
        let body = RigidBodyBuilder::dynamic()
            .translation(vector![position[0], position[1], position[2]])
            .lock_rotations()
            .can_sleep(false)
            .build();
        self.insert(
            body,
            BodyShape::Cylinder { radius, height },
            Some(mass),
            BodyKind::YawKinematicPositionDynamic,
        )
    }

    fn insert(
        &mut self,
        body: RigidBody,
        shape: BodyShape,
        mass: Option<f32>,
        kind: BodyKind,
    ) -> RigidBodyHandle {
        let handle = self.rigid_body_set.insert(body);
        let collider = build_collider(shape, mass);
        self.collider_set
            .insert_with_parent(collider, handle, &mut self.rigid_body_set);
        self.body_kinds.insert(handle, kind);
        handle
    }

    /// Removes a body and its colliders
    pub fn remove_body(&mut self, handle: RigidBodyHandle) -> bool {
        self.body_kinds.remove(&handle);
        self.rigid_body_set
            .remove(
                handle,
                &mut self.island_manager,
                &mut self.collider_set,
                &mut self.impulse_joint_set,
                &mut self.multibody_joint_set,
                true,
            )
            .is_some()
    }

    pub fn body_kind(&self, handle: RigidBodyHandle) -> Option<BodyKind> {
        self.body_kinds.get(&handle).copied()
    }

    /// Adds a continuous force for the next step
    pub fn apply_force(&mut self, handle: RigidBodyHandle, force: [f32; 3]) {
        if let Some(body) = self.rigid_body_set.get_mut(handle) {
            body.add_force(vector![force[0], force[1], force[2]], true);
        }
    }

    /// Sets the velocity of a dynamic body
    pub fn set_velocity(&mut self, handle: RigidBodyHandle, velocity: [f32; 3]) {
        if let Some(body) = self.rigid_body_set.get_mut(handle) {
            if body.is_dynamic() {
                body.set_linvel(vector![velocity[0], velocity[1], velocity[2]], true);
            }
        }
    }

    /// Overwrites a body's rotation without touching its translation
    pub fn set_rotation(&mut self, handle: RigidBodyHandle, rotation: UnitQuaternion<f32>) {
        if let Some(body) = self.rigid_body_set.get_mut(handle) {
            body.set_rotation(rotation, true);
        }
    }

    /// Gets the position of a rigid body
    pub fn get_position(&self, handle: RigidBodyHandle) -> Option<[f32; 3]> {
        self.rigid_body_set.get(handle).map(|body| {
            let pos = body.translation();
            [pos.x, pos.y, pos.z]
        })
    }

    /// Gets the rotation of a rigid body
    pub fn get_rotation(&self, handle: RigidBodyHandle) -> Option<UnitQuaternion<f32>> {
        self.rigid_body_set.get(handle).map(|body| *body.rotation())
    }

    /// Gets position and rotation together
    pub fn get_transform(&self, handle: RigidBodyHandle) -> Option<([f32; 3], UnitQuaternion<f32>)> {
        self.rigid_body_set.get(handle).map(|body| {
            let pos = body.translation();
            ([pos.x, pos.y, pos.z], *body.rotation())
        })
    }

    /// Gets the velocity of a rigid body
    pub fn get_velocity(&self, handle: RigidBodyHandle) -> Option<[f32; 3]> {
        self.rigid_body_set.get(handle).map(|body| {
            let vel = body.linvel();
            [vel.x, vel.y, vel.z]
        })
    }

    pub fn body_count(&self) -> usize {
        self.rigid_body_set.len()
    }
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_physics_world_creation() {
        let world = PhysicsWorld::new();
        assert_eq!(world.gravity.y, -consts::DEFAULT_GRAVITY);
        assert_eq!(world.sub_steps, consts::SUB_STEPS);
    }

    #[test]
    fn test_zero_sub_steps_is_clamped() {
        let world = PhysicsWorld::with_settings(9.8, 0);
        assert_eq!(world.sub_steps, 1);
    }

    #[test]
    fn test_static_box_does_not_move() {
        let mut world = PhysicsWorld::new();
        let handle = world.add_static_box([0.0, -0.5, 0.0], [25.0, 0.5, 25.0]);

        for _ in 0..10 {
            world.step(1.0 / 60.0);
        }

        assert_eq!(world.get_position(handle).unwrap(), [0.0, -0.5, 0.0]);
        assert_eq!(world.body_kind(handle), Some(BodyKind::Static));
    }

    #[test]
    fn test_dynamic_box_falls() {
        let mut world = PhysicsWorld::new();
        let handle = world.add_dynamic_box([0.0, 10.0, 0.0], UnitQuaternion::identity(), [1.0; 3], 1.0);

        let initial = world.get_position(handle).unwrap();
        for _ in 0..10 {
            world.step(1.0 / 60.0);
        }
        let after = world.get_position(handle).unwrap();

        assert!(after[1] < initial[1]);
        assert_eq!(world.body_kind(handle), Some(BodyKind::FullyDynamic));
    }

    #[test]
    fn test_non_positive_dt_does_not_step() {
        let mut world = PhysicsWorld::new();
        let handle = world.add_dynamic_box([0.0, 10.0, 0.0], UnitQuaternion::identity(), [1.0; 3], 1.0);

        world.step(0.0);
        world.step(-1.0);

        assert_eq!(world.get_position(handle).unwrap(), [0.0, 10.0, 0.0]);
        assert_eq!(world.get_velocity(handle).unwrap(), [0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_long_frame_uses_fixed_sub_step_count() {
        let mut world = PhysicsWorld::with_settings(20.0, 10);
        let handle = world.add_dynamic_box([0.0, 100.0, 0.0], UnitQuaternion::identity(), [1.0; 3], 1.0);

        world.step(1.0);

        assert_eq!(world.integration_parameters.dt, 1.0 / 10.0);
        // Ten steps of h = 0.1 under g = 20 reach exactly -20 m/s.
        let v = world.get_velocity(handle).unwrap();
        assert!((v[1] + 20.0).abs() < 1e-3, "vy = {}", v[1]);
        // Semi-implicit Euler over ten 0.1 s steps drops 11 m; the exact
        // free-fall drop is 10 m. Finer internal solver steps land between.
        let drop = 100.0 - world.get_position(handle).unwrap()[1];
        assert!(drop > 10.0 - 1e-3 && drop < 11.0 + 1e-3, "drop = {}", drop);

        world.step(0.25);
        assert_eq!(world.integration_parameters.dt, 0.25 / 10.0);
    }

    #[test]
    fn test_force_is_consumed_after_clear() {
        let mut world = PhysicsWorld::with_settings(0.0, 10);
        let handle = world.add_player_body([0.0, 0.0, 0.0], 1.0, 8.0, 1.0);

        world.apply_force(handle, [0.0, 0.0, 60.0]);
        world.step(1.0 / 60.0);
        world.clear_forces();
        let v1 = world.get_velocity(handle).unwrap();
        assert!((v1[2] - 1.0).abs() < 0.05, "expected ~1.0, got {}", v1[2]);

        world.step(1.0 / 60.0);
        let v2 = world.get_velocity(handle).unwrap();
        assert!((v2[2] - v1[2]).abs() < 1e-4);
    }

    #[test]
    fn test_player_body_keeps_rotation_written_to_it() {
        let mut world = PhysicsWorld::new();
        let handle = world.add_player_body([0.0, 5.0, 0.0], 1.0, 8.0, 1.0);
        assert_eq!(world.body_kind(handle), Some(BodyKind::YawKinematicPositionDynamic));

        let yaw = UnitQuaternion::from_euler_angles(0.0, 0.7, 0.0);
        world.set_rotation(handle, yaw);
        world.step(1.0 / 60.0);

        let rot = world.get_rotation(handle).unwrap();
        assert!(rot.angle_to(&yaw) < 1e-4);
    }

    #[test]
    fn test_remove_body() {
        let mut world = PhysicsWorld::new();
        let handle = world.add_dynamic_box([0.0; 3], UnitQuaternion::identity(), [1.0; 3], 1.0);
        assert!(world.remove_body(handle));
        assert!(world.get_position(handle).is_none());
        assert!(world.body_kind(handle).is_none());
        assert!(!world.remove_body(handle));
    }
}
