//! Scene graph: the visual side of every entity.
//!
//! Nodes are stored in an arena and addressed by [`NodeId`]. The scene graph
//! never reads physics; transforms are written into it by the body registry
//! and the character controller, and presenters read them back out.

use nalgebra::UnitQuaternion;
use serde::Serialize;

/// Index of a node in the [`SceneGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// What a presenter should draw for a node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum NodeShape {
    /// Solid box; `opacity` below 1.0 lets the camera see through it
    Box { size: [f32; 3], color: u32, opacity: f32 },
    /// Wireframe cylinder (collider debug view)
    Cylinder { radius: f32, height: f32, color: u32 },
    /// Imported character model
    Model { path: String },
}

/// A renderable transform.
#[derive(Debug, Clone)]
pub struct VisualNode {
    pub name: String,
    pub shape: NodeShape,
    pub position: [f32; 3],
    pub rotation: UnitQuaternion<f32>,
    pub scale: f32,
}

impl VisualNode {
    pub fn new(name: impl Into<String>, shape: NodeShape, position: [f32; 3]) -> Self {
        Self {
            name: name.into(),
            shape,
            position,
            rotation: UnitQuaternion::identity(),
            scale: 1.0,
        }
    }

    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }
}

#[derive(Debug, Default)]
pub struct SceneGraph {
    nodes: Vec<VisualNode>,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, node: VisualNode) -> NodeId {
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    pub fn get(&self, id: NodeId) -> Option<&VisualNode> {
        self.nodes.get(id.0)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut VisualNode> {
        self.nodes.get_mut(id.0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &VisualNode)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i), n))
    }

    /// Finds the first node with the given name.
    pub fn find(&self, name: &str) -> Option<NodeId> {
        self.nodes.iter().position(|n| n.name == name).map(NodeId)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_lookup() {
        let mut scene = SceneGraph::new();
        let a = scene.add(VisualNode::new("floor", NodeShape::Box { size: [1.0; 3], color: 0, opacity: 1.0 }, [0.0; 3]));
        let b = scene.add(
            VisualNode::new("player", NodeShape::Model { path: "p.glb".into() }, [1.0, 2.0, 3.0])
                .with_scale(5.0),
        );

        assert_ne!(a, b);
        assert_eq!(scene.len(), 2);
        assert_eq!(scene.find("player"), Some(b));
        assert_eq!(scene.get(b).unwrap().scale, 5.0);
        assert_eq!(scene.get(b).unwrap().position, [1.0, 2.0, 3.0]);
        assert!(scene.find("missing").is_none());
    }
}
