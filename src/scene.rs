use std::sync::Arc;

use glam::{EulerRot, Mat4, Quat, Vec3, Vec4};
use serde::{Deserialize, Serialize};
use slotmap::{new_key_type, SlotMap};

use crate::catalog::Rgb;
use crate::mesh::MeshId;
use crate::texture::IconTexture;

new_key_type! {
    /// Stable handle to a node in the [`SceneGraph`].
    pub struct NodeKey;
}

/// Local transform of a node. Rotation is XYZ Euler angles in radians.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    #[serde(default)]
    pub translation: Vec3,
    #[serde(default)]
    pub rotation: Vec3,
    #[serde(default = "default_scale")]
    pub scale: Vec3,
}

impl Transform {
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Self::default()
        }
    }

    pub fn matrix(&self) -> Mat4 {
        let rotation = Quat::from_euler(
            EulerRot::XYZ,
            self.rotation.x,
            self.rotation.y,
            self.rotation.z,
        );
        Mat4::from_scale_rotation_translation(self.scale, rotation, self.translation)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: default_scale(),
        }
    }
}

fn default_scale() -> Vec3 {
    Vec3::ONE
}

/// Surface appearance of a mesh node.
#[derive(Debug, Clone)]
pub struct Material {
    /// Linear RGB plus opacity.
    pub color: Vec4,
    pub texture: Option<Arc<IconTexture>>,
    /// Unlit materials ignore the scene lights.
    pub lit: bool,
}

impl Material {
    pub fn standard(color: Rgb) -> Self {
        Self {
            color: color.to_linear().extend(1.0),
            texture: None,
            lit: true,
        }
    }

    pub fn basic(color: Rgb) -> Self {
        Self {
            lit: false,
            ..Self::standard(color)
        }
    }

    pub fn textured(texture: Arc<IconTexture>) -> Self {
        Self {
            color: Vec4::ONE,
            texture: Some(texture),
            lit: true,
        }
    }

    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.color.w = opacity;
        self
    }

    pub fn is_transparent(&self) -> bool {
        self.color.w < 1.0
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::standard(Rgb::WHITE)
    }
}

/// Node of the render tree. Group nodes carry no mesh.
#[derive(Debug, Clone, Default)]
pub struct SceneNode {
    pub name: String,
    pub parent: Option<NodeKey>,
    pub transform: Transform,
    pub mesh: Option<MeshId>,
    pub material: Material,
}

impl SceneNode {
    pub fn group(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    pub fn mesh(name: &str, mesh: MeshId, material: Material) -> Self {
        Self {
            name: name.to_string(),
            mesh: Some(mesh),
            material,
            ..Self::default()
        }
    }

    pub fn at(mut self, translation: Vec3) -> Self {
        self.transform.translation = translation;
        self
    }
}

/// Flattened node ready to draw.
#[derive(Debug, Clone)]
pub struct DrawItem<'a> {
    pub key: NodeKey,
    pub world: Mat4,
    pub mesh: MeshId,
    pub material: &'a Material,
}

/// Render tree holding the mascot parts and live decorative objects.
#[derive(Debug, Default)]
pub struct SceneGraph {
    nodes: SlotMap<NodeKey, SceneNode>,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, node: SceneNode) -> NodeKey {
        self.nodes.insert(node)
    }

    pub fn insert_child(&mut self, parent: NodeKey, mut node: SceneNode) -> NodeKey {
        node.parent = Some(parent);
        self.nodes.insert(node)
    }

    /// Detaches a node and every node below it.
    pub fn remove(&mut self, key: NodeKey) -> Option<SceneNode> {
        let children: Vec<NodeKey> = self
            .nodes
            .iter()
            .filter(|(_, node)| node.parent == Some(key))
            .map(|(child, _)| child)
            .collect();
        for child in children {
            self.remove(child);
        }
        self.nodes.remove(key)
    }

    pub fn contains(&self, key: NodeKey) -> bool {
        self.nodes.contains_key(key)
    }

    pub fn get(&self, key: NodeKey) -> Option<&SceneNode> {
        self.nodes.get(key)
    }

    pub fn get_mut(&mut self, key: NodeKey) -> Option<&mut SceneNode> {
        self.nodes.get_mut(key)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn children(&self, key: NodeKey) -> impl Iterator<Item = (NodeKey, &SceneNode)> + '_ {
        self.nodes
            .iter()
            .filter(move |(_, node)| node.parent == Some(key))
    }

    pub fn world_matrix(&self, key: NodeKey) -> Mat4 {
        let mut matrix = Mat4::IDENTITY;
        let mut current = self.nodes.get(key);
        while let Some(node) = current {
            matrix = node.transform.matrix() * matrix;
            current = node.parent.and_then(|parent| self.nodes.get(parent));
        }
        matrix
    }

    /// Mesh nodes with their world matrices, opaque first so blended
    /// surfaces composite over everything behind them.
    pub fn draw_list(&self) -> Vec<DrawItem<'_>> {
        let mut items: Vec<DrawItem<'_>> = self
            .nodes
            .iter()
            .filter_map(|(key, node)| {
                node.mesh.map(|mesh| DrawItem {
                    key,
                    world: self.world_matrix(key),
                    mesh,
                    material: &node.material,
                })
            })
            .collect();
        items.sort_by_key(|item| item.material.is_transparent());
        items
    }
}

#[cfg(test)]
mod tests {
    use std::f32::consts::FRAC_PI_2;

    use approx::assert_relative_eq;

    use super::*;
    use crate::mesh::{Mesh, MeshLibrary};

    fn cube_id() -> MeshId {
        MeshLibrary::new().add(Mesh::cuboid(Vec3::ONE))
    }

    #[test]
    fn world_matrix_chains_parents() {
        let mut graph = SceneGraph::new();
        let group = graph.insert(SceneNode::group("bus").at(Vec3::new(0.0, 1.0, 0.0)));
        let part = graph.insert_child(group, SceneNode::mesh("body", cube_id(), Material::default()).at(Vec3::X));
        let world = graph.world_matrix(part);
        let origin = world.transform_point3(Vec3::ZERO);
        assert_relative_eq!(origin.x, 1.0);
        assert_relative_eq!(origin.y, 1.0);
    }

    #[test]
    fn rotation_is_applied_in_radians() {
        let transform = Transform {
            rotation: Vec3::new(0.0, 0.0, FRAC_PI_2),
            ..Transform::default()
        };
        let rotated = transform.matrix().transform_vector3(Vec3::X);
        assert_relative_eq!(rotated.y, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn removing_group_detaches_children() {
        let mut graph = SceneGraph::new();
        let group = graph.insert(SceneNode::group("bus"));
        let part = graph.insert_child(group, SceneNode::mesh("roof", cube_id(), Material::default()));
        let other = graph.insert(SceneNode::mesh("icon", cube_id(), Material::default()));
        assert!(graph.remove(group).is_some());
        assert!(!graph.contains(part));
        assert!(graph.contains(other));
        assert!(graph.remove(group).is_none());
    }

    #[test]
    fn draw_list_orders_transparent_last() {
        let mut graph = SceneGraph::new();
        let glass = Material::standard(Rgb::from_u32(0x87ceeb)).with_opacity(0.7);
        graph.insert(SceneNode::mesh("windows", cube_id(), glass));
        graph.insert(SceneNode::group("empty"));
        graph.insert(SceneNode::mesh("body", cube_id(), Material::default()));
        let items = graph.draw_list();
        assert_eq!(items.len(), 2);
        assert!(!items[0].material.is_transparent());
        assert!(items[1].material.is_transparent());
    }
}
