//! Character controller against a live Rapier world (no level geometry).

use roomwalk::config::ControllerTuning;
use roomwalk::game::controller::{yaw_rotation, CharacterController, PlayerRig};
use roomwalk::game::input::MovementIntent;
use roomwalk::game::physics::{BodyKind, PhysicsWorld};
use roomwalk::game::scene::{NodeShape, SceneGraph, VisualNode};

const DT: f32 = 1.0 / 60.0;

struct Rig {
    physics: PhysicsWorld,
    scene: SceneGraph,
    player: PlayerRig,
    controller: CharacterController,
}

fn setup(gravity: f32, body_position: [f32; 3]) -> Rig {
    let mut physics = PhysicsWorld::with_settings(gravity, 10);
    let mut scene = SceneGraph::new();
    let node = scene.add(VisualNode::new(
        "player",
        NodeShape::Model { path: "player.glb".into() },
        [0.0; 3],
    ));
    let body = physics.add_player_body(body_position, 1.0, 8.0, 1.0);
    Rig {
        physics,
        scene,
        player: PlayerRig { body, node, yaw: 0.0 },
        controller: CharacterController::new(ControllerTuning::default()),
    }
}

impl Rig {
    fn update(&mut self, intent: MovementIntent) -> roomwalk::game::controller::ControllerReport {
        self.controller
            .update(&intent, &mut self.physics, &mut self.scene, &mut self.player)
            .expect("player body and node exist")
    }

    fn step(&mut self) {
        self.physics.step(DT);
        self.physics.clear_forces();
    }

    fn velocity(&self) -> [f32; 3] {
        self.physics.get_velocity(self.player.body).unwrap()
    }
}

fn horizontal(v: [f32; 3]) -> f32 {
    (v[0] * v[0] + v[2] * v[2]).sqrt()
}

#[test]
fn test_sprint_forward_from_rest() {
    let mut rig = setup(0.0, [0.0, 0.0, 0.0]);
    let intent = MovementIntent { forward: true, sprint: true, ..Default::default() };

    let report = rig.update(intent);
    assert!(report.applied_force[0].abs() < 1e-4);
    assert_eq!(report.applied_force[1], 0.0);
    assert!((report.applied_force[2] - 200.0).abs() < 1e-4);
    assert!(!report.clamped);
    assert!(!report.damped);

    // The force acts over the next step: a = F/m for one frame.
    rig.step();
    let v = rig.velocity();
    assert!((v[2] - 200.0 * DT).abs() < 0.05, "vz = {}", v[2]);

    // Past the sprint cap the clamp brings |v| back to exactly 10.
    rig.physics.set_velocity(rig.player.body, [0.0, 0.0, 30.0]);
    let report = rig.update(intent);
    assert!(report.clamped);
    let v = rig.velocity();
    assert!((horizontal(v) - 10.0).abs() < 1e-4);
    assert!((v[2] - 10.0).abs() < 1e-4);
}

#[test]
fn test_turn_left_rotates_visual_and_body() {
    let mut rig = setup(0.0, [0.0, 0.0, 0.0]);
    let report = rig.update(MovementIntent { left: true, ..Default::default() });

    assert!((report.yaw - 0.05).abs() < 1e-6);
    assert!((rig.player.yaw - 0.05).abs() < 1e-6);

    let expected = yaw_rotation(0.05);
    let body_rot = rig.physics.get_rotation(rig.player.body).unwrap();
    let node_rot = rig.scene.get(rig.player.node).unwrap().rotation;
    assert!(body_rot.angle_to(&expected) < 1e-5);
    assert!(node_rot.angle_to(&expected) < 1e-5);
}

#[test]
fn test_damping_decays_horizontal_speed() {
    let mut rig = setup(0.0, [0.0, 0.0, 0.0]);
    rig.physics.set_velocity(rig.player.body, [4.0, 0.0, 3.0]);

    let mut previous = horizontal(rig.velocity());
    let mut ticks = 0;
    while previous > 1e-3 {
        let report = rig.update(MovementIntent::idle());
        assert!(report.damped);
        rig.step();
        let speed = horizontal(rig.velocity());
        assert!(speed < previous, "tick {}: {} !< {}", ticks, speed, previous);
        assert!((speed - previous * 0.9).abs() < 1e-3);
        previous = speed;
        ticks += 1;
        assert!(ticks < 200, "speed never settled");
    }
}

#[test]
fn test_clamp_leaves_vertical_velocity() {
    let mut rig = setup(0.0, [0.0, 0.0, 0.0]);
    rig.physics.set_velocity(rig.player.body, [8.0, -3.0, 8.0]);

    let report = rig.update(MovementIntent { forward: true, ..Default::default() });

    assert!(report.clamped);
    let v = rig.velocity();
    assert!((horizontal(v) - 5.0).abs() < 1e-4);
    assert_eq!(v[1], -3.0);
    assert!((v[0] - v[2]).abs() < 1e-5);
}

#[test]
fn test_jump_only_below_height_threshold() {
    // Visual starts at y = 0, below the threshold.
    let mut low = setup(0.0, [0.0, 3.0, 0.0]);
    let report = low.update(MovementIntent { jump: true, ..Default::default() });
    assert!(report.jumped);
    assert_eq!(report.applied_force[1], 100.0);
    low.step();
    assert!((low.velocity()[1] - 100.0 * DT).abs() < 0.05);

    // A body high above the floor: once the visual has been written back
    // the jump is refused.
    let mut high = setup(0.0, [0.0, 20.0, 0.0]);
    high.update(MovementIntent::idle());
    let report = high.update(MovementIntent { jump: true, ..Default::default() });
    assert!(!report.jumped);
    assert_eq!(report.applied_force[1], 0.0);

    // No jump intent, low visual: no jump.
    let mut idle = setup(0.0, [0.0, 3.0, 0.0]);
    assert!(!idle.update(MovementIntent::idle()).jumped);
}

#[test]
fn test_visual_position_is_offset_below_body() {
    let mut rig = setup(0.0, [1.0, 10.0, 2.0]);
    rig.update(MovementIntent::idle());

    let pos = rig.scene.get(rig.player.node).unwrap().position;
    assert_eq!(pos[0], 1.0);
    assert!((pos[1] - 6.1).abs() < 1e-5);
    assert_eq!(pos[2], 2.0);
}

#[test]
fn test_missing_body_is_a_no_op() {
    let mut rig = setup(0.0, [0.0; 3]);
    rig.physics.remove_body(rig.player.body);
    let result = rig.controller.update(
        &MovementIntent { forward: true, ..Default::default() },
        &mut rig.physics,
        &mut rig.scene,
        &mut rig.player,
    );
    assert!(result.is_none());
}

#[test]
fn test_only_player_bodies_are_driven() {
    let mut rig = setup(0.0, [0.0; 3]);
    let prop = rig.physics.add_dynamic_box(
        [50.0, 2.0, 0.0],
        nalgebra::UnitQuaternion::identity(),
        [1.0; 3],
        1.0,
    );
    assert_eq!(rig.physics.body_kind(prop), Some(BodyKind::FullyDynamic));
    rig.player.body = prop;

    let result = rig.controller.update(
        &MovementIntent { forward: true, left: true, ..Default::default() },
        &mut rig.physics,
        &mut rig.scene,
        &mut rig.player,
    );

    assert!(result.is_none());
    assert_eq!(rig.player.yaw, 0.0);
    rig.step();
    assert_eq!(rig.velocity(), [0.0; 3]);
    assert_eq!(rig.scene.get(rig.player.node).unwrap().position, [0.0; 3]);
}
