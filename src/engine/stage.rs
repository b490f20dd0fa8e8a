//! Stage — the mutable scene graph the engine animates.
//!
//! Every visual element (widget parts, the character, particles) is a node
//! with a numeric transform and a glyph sprite. Components own their own
//! `NodeId`s and hand them to the tween engine; nothing here is global.
//! Lookups return `Option` so that a stale handle degrades to a skipped
//! animation step, never a panic.

use std::collections::HashMap;

use crate::types::Style;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u32);

// ---------------------------------------------------------------------------
// Numeric properties
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub const ONE: Vec3 = Vec3 {
        x: 1.0,
        y: 1.0,
        z: 1.0,
    };
}

/// The animatable channels of a node: a three-axis position, rotation, and
/// scale plus a scalar opacity. Tweens address nodes through these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Prop {
    PosX,
    PosY,
    PosZ,
    RotX,
    RotY,
    RotZ,
    ScaleX,
    ScaleY,
    ScaleZ,
    Opacity,
}

/// Tween targets for a uniform scale on all three axes.
pub fn scale_uniform(v: f64) -> [(Prop, f64); 3] {
    [(Prop::ScaleX, v), (Prop::ScaleY, v), (Prop::ScaleZ, v)]
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Vec3,
    pub scale: Vec3,
    pub opacity: f64,
}

impl Default for Transform {
    fn default() -> Self {
        Transform {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
            opacity: 1.0,
        }
    }
}

impl Transform {
    pub fn get(&self, prop: Prop) -> f64 {
        match prop {
            Prop::PosX => self.position.x,
            Prop::PosY => self.position.y,
            Prop::PosZ => self.position.z,
            Prop::RotX => self.rotation.x,
            Prop::RotY => self.rotation.y,
            Prop::RotZ => self.rotation.z,
            Prop::ScaleX => self.scale.x,
            Prop::ScaleY => self.scale.y,
            Prop::ScaleZ => self.scale.z,
            Prop::Opacity => self.opacity,
        }
    }

    pub fn set(&mut self, prop: Prop, value: f64) {
        match prop {
            Prop::PosX => self.position.x = value,
            Prop::PosY => self.position.y = value,
            Prop::PosZ => self.position.z = value,
            Prop::RotX => self.rotation.x = value,
            Prop::RotY => self.rotation.y = value,
            Prop::RotZ => self.rotation.z = value,
            Prop::ScaleX => self.scale.x = value,
            Prop::ScaleY => self.scale.y = value,
            Prop::ScaleZ => self.scale.z = value,
            Prop::Opacity => self.opacity = value,
        }
    }
}

// ---------------------------------------------------------------------------
// Sprites and nodes
// ---------------------------------------------------------------------------

/// A node's visual: lines of glyphs stamped at the node's position.
/// Spaces are transparent.
#[derive(Debug, Clone, Default)]
pub struct Sprite {
    pub lines: Vec<String>,
    pub style: Style,
}

impl Sprite {
    pub fn empty() -> Self {
        Sprite::default()
    }

    pub fn glyph(ch: char, style: Style) -> Self {
        Sprite {
            lines: vec![ch.to_string()],
            style,
        }
    }

    pub fn text(line: &str, style: Style) -> Self {
        Sprite {
            lines: vec![line.to_string()],
            style,
        }
    }

    pub fn art(lines: &[&str], style: Style) -> Self {
        Sprite {
            lines: lines.iter().map(|l| l.to_string()).collect(),
            style,
        }
    }

    pub fn width(&self) -> usize {
        self.lines.iter().map(|l| l.chars().count()).max().unwrap_or(0)
    }
}

#[derive(Debug, Clone)]
pub struct Node {
    pub parent: Option<NodeId>,
    pub transform: Transform,
    pub sprite: Sprite,
    pub z: i32,
    pub visible: bool,
}

impl Node {
    pub fn new(sprite: Sprite) -> Self {
        Node {
            parent: None,
            transform: Transform::default(),
            sprite,
            z: 0,
            visible: true,
        }
    }

    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.transform.position.x = x;
        self.transform.position.y = y;
        self
    }

    pub fn z(mut self, z: i32) -> Self {
        self.z = z;
        self
    }

    pub fn child_of(mut self, parent: NodeId) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    pub fn faded(mut self) -> Self {
        self.transform.opacity = 0.0;
        self.transform.scale = Vec3 {
            x: 0.5,
            y: 0.5,
            z: 0.5,
        };
        self
    }
}

// ---------------------------------------------------------------------------
// Stage
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct Stage {
    nodes: HashMap<NodeId, Node>,
    next_id: u32,
}

impl Stage {
    pub fn new() -> Self {
        Stage::default()
    }

    pub fn spawn(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(id, node);
        id
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    /// Remove a node and everything parented to it.
    pub fn remove(&mut self, id: NodeId) {
        self.nodes.remove(&id);
        self.remove_children_of(id);
    }

    pub fn remove_children_of(&mut self, parent: NodeId) {
        let children: Vec<NodeId> = self
            .nodes
            .iter()
            .filter(|(_, n)| n.parent == Some(parent))
            .map(|(id, _)| *id)
            .collect();
        for child in children {
            self.remove(child);
        }
    }

    pub fn child_count(&self, parent: NodeId) -> usize {
        self.nodes
            .values()
            .filter(|n| n.parent == Some(parent))
            .count()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter().map(|(id, n)| (*id, n))
    }

    /// Position of a node in stage space, with parent offsets applied.
    /// The depth cap guards against accidental parent cycles.
    pub fn world_position(&self, id: NodeId) -> Option<(f64, f64)> {
        let mut node = self.get(id)?;
        let mut x = node.transform.position.x;
        let mut y = node.transform.position.y;
        for _ in 0..8 {
            match node.parent.and_then(|p| self.get(p)) {
                Some(parent) => {
                    x += parent.transform.position.x;
                    y += parent.transform.position.y;
                    node = parent;
                }
                None => break,
            }
        }
        Some((x, y))
    }

    /// Opacity of a node with ancestor opacities multiplied in, so fading
    /// a scene root fades everything mounted under it.
    pub fn world_opacity(&self, id: NodeId) -> f64 {
        let Some(mut node) = self.get(id) else {
            return 0.0;
        };
        let mut opacity = node.transform.opacity;
        for _ in 0..8 {
            match node.parent.and_then(|p| self.get(p)) {
                Some(parent) => {
                    opacity *= parent.transform.opacity;
                    node = parent;
                }
                None => break,
            }
        }
        opacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spawn_and_lookup() {
        let mut stage = Stage::new();
        let id = stage.spawn(Node::new(Sprite::glyph('x', Style::default())).at(3.0, 4.0));
        assert_eq!(stage.world_position(id), Some((3.0, 4.0)));
        stage.remove(id);
        assert!(stage.get(id).is_none());
        assert_eq!(stage.world_position(id), None);
    }

    #[test]
    fn children_follow_parent_and_are_removed_with_it() {
        let mut stage = Stage::new();
        let root = stage.spawn(Node::new(Sprite::empty()).at(10.0, 5.0));
        let child = stage.spawn(Node::new(Sprite::empty()).at(2.0, 1.0).child_of(root));
        assert_eq!(stage.world_position(child), Some((12.0, 6.0)));
        assert_eq!(stage.child_count(root), 1);

        stage.remove(root);
        assert!(stage.get(child).is_none());
        assert!(stage.is_empty());
    }

    #[test]
    fn world_opacity_multiplies_down_the_chain() {
        let mut stage = Stage::new();
        let root = stage.spawn(Node::new(Sprite::empty()));
        stage.get_mut(root).unwrap().transform.opacity = 0.5;
        let child = stage.spawn(Node::new(Sprite::empty()).child_of(root));
        assert!((stage.world_opacity(child) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn transform_roundtrips_every_prop() {
        let mut t = Transform::default();
        let props = [
            Prop::PosX,
            Prop::PosY,
            Prop::PosZ,
            Prop::RotX,
            Prop::RotY,
            Prop::RotZ,
            Prop::ScaleX,
            Prop::ScaleY,
            Prop::ScaleZ,
            Prop::Opacity,
        ];
        for (i, prop) in props.iter().enumerate() {
            t.set(*prop, i as f64 + 0.25);
            assert_eq!(t.get(*prop), i as f64 + 0.25);
        }
    }
}
