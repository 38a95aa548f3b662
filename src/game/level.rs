//! Static room layout: a row of square rooms joined by doorways.

use rapier3d::prelude::RigidBodyHandle;

use super::constants::{level as consts, physics as physics_consts};
use super::physics::PhysicsWorld;
use super::registry::{BodyRegistry, SyncHandle};
use super::scene::{NodeShape, SceneGraph, VisualNode};
use crate::config::LevelConfig;

#[derive(Debug, Default)]
pub struct LevelLayout {
    pub static_bodies: Vec<RigidBodyHandle>,
    pub reference_box: Option<SyncHandle>,
}

/// Adds a fixed box to both the scene and the simulation.
fn add_static_box(
    name: String,
    center: [f32; 3],
    size: [f32; 3],
    color: u32,
    physics: &mut PhysicsWorld,
    scene: &mut SceneGraph,
) -> RigidBodyHandle {
    add_static_box_with_opacity(name, center, size, color, 1.0, physics, scene)
}

fn add_static_box_with_opacity(
    name: String,
    center: [f32; 3],
    size: [f32; 3],
    color: u32,
    opacity: f32,
    physics: &mut PhysicsWorld,
    scene: &mut SceneGraph,
) -> RigidBodyHandle {
    let shape = NodeShape::Box { size, color, opacity };
    scene.add(VisualNode::new(name, shape, center));
    physics.add_static_box(center, [size[0] / 2.0, size[1] / 2.0, size[2] / 2.0])
}

/// Adds a dynamic box whose node is driven by its body. The body starts at
/// the node's transform.
pub fn spawn_dynamic_box(
    name: &str,
    position: [f32; 3],
    size: [f32; 3],
    color: u32,
    physics: &mut PhysicsWorld,
    scene: &mut SceneGraph,
    registry: &mut BodyRegistry,
) -> Option<SyncHandle> {
    let shape = NodeShape::Box { size, color, opacity: 1.0 };
    let node_id = scene.add(VisualNode::new(name, shape, position));
    let node = scene.get(node_id)?;
    let body = physics.add_dynamic_box(
        node.position,
        node.rotation,
        [size[0] / 2.0, size[1] / 2.0, size[2] / 2.0],
        physics_consts::DYNAMIC_MASS,
    );
    registry.register(body, node_id)
}

/// Side wall at `x`. Interior walls get a doorway centered on z = 0.
fn add_side_wall(
    x: f32,
    is_end_wall: bool,
    config: &LevelConfig,
    physics: &mut PhysicsWorld,
    scene: &mut SceneGraph,
    out: &mut Vec<RigidBodyHandle>,
) {
    let t = config.wall_thickness;
    let length = config.room_size;
    let height = config.wall_height;
    let color = consts::WALL_COLOR;

    if is_end_wall {
        out.push(add_static_box(
            format!("wall_x{}", x),
            [x, height / 2.0, 0.0],
            [t, height, length],
            color,
            physics,
            scene,
        ));
        return;
    }

    let door_h = config.door_height.min(height);
    let door_w = config.door_width.min(length);
    let top_h = height - door_h;
    let side_w = (length - door_w) / 2.0;
    let side_z = door_w / 2.0 + side_w / 2.0;

    if top_h > 0.0 {
        out.push(add_static_box(
            format!("lintel_x{}", x),
            [x, door_h + top_h / 2.0, 0.0],
            [t, top_h, length],
            color,
            physics,
            scene,
        ));
    }
    if side_w > 0.0 {
        for (suffix, z) in [("n", -side_z), ("s", side_z)] {
            out.push(add_static_box(
                format!("jamb_{}_x{}", suffix, x),
                [x, door_h / 2.0, z],
                [t, door_h, side_w],
                color,
                physics,
                scene,
            ));
        }
    }
}

/// Builds the floors and walls of every room, plus the reference box.
pub fn build_rooms(
    config: &LevelConfig,
    physics: &mut PhysicsWorld,
    scene: &mut SceneGraph,
    registry: &mut BodyRegistry,
) -> LevelLayout {
    let mut layout = LevelLayout::default();
    let size = config.room_size;
    let height = config.wall_height;
    let t = config.wall_thickness;
    let floor_t = consts::FLOOR_THICKNESS;

    for i in 0..config.room_count {
        let cx = i as f32 * size;
        layout.static_bodies.push(add_static_box(
            format!("floor_{}", i),
            [cx, -floor_t / 2.0, 0.0],
            [size, floor_t, size],
            consts::FLOOR_COLOR,
            physics,
            scene,
        ));
        let walls = [
            ("back", -size / 2.0, 1.0),
            ("front", size / 2.0, consts::FRONT_WALL_OPACITY),
        ];
        for (suffix, z, opacity) in walls {
            layout.static_bodies.push(add_static_box_with_opacity(
                format!("wall_{}_{}", suffix, i),
                [cx, height / 2.0, z],
                [size, height, t],
                consts::WALL_COLOR,
                opacity,
                physics,
                scene,
            ));
        }
    }

    // Neighbouring rooms share the wall between them.
    for i in 0..=config.room_count {
        if config.room_count == 0 {
            break;
        }
        let x = i as f32 * size - size / 2.0;
        let is_end_wall = i == 0 || i == config.room_count;
        add_side_wall(x, is_end_wall, config, physics, scene, &mut layout.static_bodies);
    }

    if config.reference_box {
        layout.reference_box = spawn_dynamic_box(
            "reference_box",
            [0.0, 1.0, 0.0],
            [2.0, 2.0, 2.0],
            consts::REFERENCE_BOX_COLOR,
            physics,
            scene,
            registry,
        );
    }

    log::info!(
        "[Level] built {} rooms: {} static bodies, {} dynamic",
        config.room_count,
        layout.static_bodies.len(),
        registry.len()
    );
    layout
}
