use std::f32::consts::FRAC_PI_2;

use glam::Vec3;

use crate::catalog::Rgb;
use crate::mesh::{Mesh, MeshLibrary};
use crate::scene::{Material, NodeKey, SceneGraph, SceneNode};

const BODY: Rgb = Rgb::from_u32(0xf5a623);
const STRIPE: Rgb = Rgb::from_u32(0x000000);
const ROOF: Rgb = Rgb::from_u32(0xffffff);
const GLASS: Rgb = Rgb::from_u32(0x87ceeb);
const TIRE: Rgb = Rgb::from_u32(0x333333);
const RIM: Rgb = Rgb::from_u32(0xcccccc);

const WHEEL_POSITIONS: [Vec3; 4] = [
    Vec3::new(-1.0, 0.35, 0.6),
    Vec3::new(1.0, 0.35, 0.6),
    Vec3::new(-1.0, 0.35, -0.6),
    Vec3::new(1.0, 0.35, -0.6),
];

/// Offset and roll applied to the mascot group for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MascotPose {
    pub bob: f32,
    pub roll: f32,
}

impl MascotPose {
    /// Suspension bob and engine rock at elapsed time `t`.
    pub fn at(t: f64) -> Self {
        Self {
            bob: ((t * 2.0).sin() * 0.02) as f32,
            roll: ((t * 1.5).sin() * 0.01) as f32,
        }
    }
}

/// The danfo bus: one group node with body, stripe, roof, windows and wheels.
#[derive(Debug, Clone, Copy)]
pub struct Mascot {
    group: NodeKey,
    parts: usize,
}

impl Mascot {
    pub fn build(graph: &mut SceneGraph, meshes: &mut MeshLibrary) -> Self {
        let group = graph.insert(SceneNode::group("danfo-bus"));
        let mut parts = Vec::new();

        let body = meshes.add(Mesh::cuboid(Vec3::new(3.0, 1.4, 1.2)));
        parts.push(SceneNode::mesh("body", body, Material::standard(BODY)).at(Vec3::Y * 0.9));

        let stripe = meshes.add(Mesh::cuboid(Vec3::new(3.02, 0.2, 1.22)));
        parts.push(SceneNode::mesh("stripe", stripe, Material::basic(STRIPE)).at(Vec3::Y * 0.9));

        let roof = meshes.add(Mesh::cuboid(Vec3::new(2.9, 0.1, 1.1)));
        parts.push(SceneNode::mesh("roof", roof, Material::standard(ROOF)).at(Vec3::Y * 1.65));

        let windows = meshes.add(Mesh::cuboid(Vec3::new(2.8, 0.5, 1.25)));
        let glass = Material::standard(GLASS).with_opacity(0.7);
        parts.push(SceneNode::mesh("windows", windows, glass).at(Vec3::Y * 1.2));

        let wheel = meshes.add(Mesh::cylinder(0.35, 0.2, 32).rotated_x(FRAC_PI_2));
        let rim = meshes.add(Mesh::cylinder(0.2, 0.22, 16).rotated_x(FRAC_PI_2));
        for (index, position) in WHEEL_POSITIONS.into_iter().enumerate() {
            parts.push(
                SceneNode::mesh(&format!("wheel-{index}"), wheel, Material::standard(TIRE))
                    .at(position),
            );
            parts.push(
                SceneNode::mesh(&format!("rim-{index}"), rim, Material::standard(RIM)).at(position),
            );
        }

        let count = parts.len();
        for part in parts {
            graph.insert_child(group, part);
        }
        Self {
            group,
            parts: count,
        }
    }

    pub fn node(&self) -> NodeKey {
        self.group
    }

    pub fn part_count(&self) -> usize {
        self.parts
    }

    /// Current translation of the group node.
    pub fn position(&self, graph: &SceneGraph) -> Vec3 {
        graph
            .get(self.group)
            .map(|node| node.transform.translation)
            .unwrap_or(Vec3::ZERO)
    }

    /// Pose currently applied to the group node.
    pub fn pose(&self, graph: &SceneGraph) -> MascotPose {
        graph
            .get(self.group)
            .map(|node| MascotPose {
                bob: node.transform.translation.y,
                roll: node.transform.rotation.z,
            })
            .unwrap_or(MascotPose { bob: 0.0, roll: 0.0 })
    }

    pub fn apply(&self, graph: &mut SceneGraph, pose: MascotPose) {
        if let Some(node) = graph.get_mut(self.group) {
            node.transform.translation.y = pose.bob;
            node.transform.rotation.z = pose.roll;
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn pose_is_pure_function_of_time() {
        assert_eq!(MascotPose::at(1.25), MascotPose::at(1.25));
        let rest = MascotPose::at(0.0);
        assert_eq!(rest.bob, 0.0);
        assert_eq!(rest.roll, 0.0);
        let pose = MascotPose::at(0.5);
        assert_relative_eq!(pose.bob, (1.0f64.sin() * 0.02) as f32);
        assert_relative_eq!(pose.roll, (0.75f64.sin() * 0.01) as f32);
    }

    #[test]
    fn pose_stays_within_amplitude() {
        for step in 0..1000 {
            let pose = MascotPose::at(step as f64 * 0.05);
            assert!(pose.bob.abs() <= 0.02);
            assert!(pose.roll.abs() <= 0.01);
        }
    }

    #[test]
    fn build_creates_all_parts_under_one_group() {
        let mut graph = SceneGraph::new();
        let mut meshes = MeshLibrary::new();
        let mascot = Mascot::build(&mut graph, &mut meshes);
        assert_eq!(mascot.part_count(), 12);
        assert_eq!(graph.children(mascot.node()).count(), 12);
        assert_eq!(graph.len(), 13);
        assert_eq!(meshes.len(), 6);
        let windows = graph
            .children(mascot.node())
            .find(|(_, node)| node.name == "windows")
            .map(|(_, node)| node.material.clone())
            .unwrap();
        assert!(windows.is_transparent());
    }

    #[test]
    fn apply_moves_group_only() {
        let mut graph = SceneGraph::new();
        let mut meshes = MeshLibrary::new();
        let mascot = Mascot::build(&mut graph, &mut meshes);
        let pose = MascotPose { bob: 0.015, roll: -0.005 };
        mascot.apply(&mut graph, pose);
        assert_eq!(mascot.position(&graph), Vec3::new(0.0, 0.015, 0.0));
        let group = graph.get(mascot.node()).unwrap();
        assert_eq!(group.transform.rotation.z, -0.005);
        assert_eq!(mascot.pose(&graph), pose);
    }
}
