use std::f32::consts::TAU;

use glam::{Mat3, Vec2, Vec3};
use serde::{Deserialize, Serialize};

/// Floats per interleaved vertex: `position.xyz`, `normal.xyz`, `uv.xy`.
pub const VERTEX_STRIDE: usize = 8;

/// GPU ready mesh data with interleaved vertices.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Mesh {
    pub vertices: Vec<f32>,
    pub indices: Vec<u32>,
}

impl Mesh {
    /// Axis-aligned box centred on the origin, one quad per face so every face
    /// samples the whole texture.
    pub fn cuboid(size: Vec3) -> Self {
        let h = size * 0.5;
        let mut mesh = Self::default();
        let faces = [
            (Vec3::X * h.x, Vec3::NEG_Z * h.z, Vec3::Y * h.y),
            (Vec3::NEG_X * h.x, Vec3::Z * h.z, Vec3::Y * h.y),
            (Vec3::Y * h.y, Vec3::X * h.x, Vec3::NEG_Z * h.z),
            (Vec3::NEG_Y * h.y, Vec3::X * h.x, Vec3::Z * h.z),
            (Vec3::Z * h.z, Vec3::X * h.x, Vec3::Y * h.y),
            (Vec3::NEG_Z * h.z, Vec3::NEG_X * h.x, Vec3::Y * h.y),
        ];
        for (center, u, v) in faces {
            mesh.push_quad(center, u, v);
        }
        mesh
    }

    /// Capped cylinder along the Y axis.
    pub fn cylinder(radius: f32, depth: f32, segments: u32) -> Self {
        let segments = segments.max(3);
        let half = depth * 0.5;
        let mut mesh = Self::default();

        for i in 0..=segments {
            let u = i as f32 / segments as f32;
            let (sin, cos) = (u * TAU).sin_cos();
            let normal = Vec3::new(sin, 0.0, cos);
            let rim = normal * radius;
            mesh.push_vertex(rim + Vec3::Y * half, normal, Vec2::new(u, 0.0));
            mesh.push_vertex(rim - Vec3::Y * half, normal, Vec2::new(u, 1.0));
        }
        for i in 0..segments {
            let top = i * 2;
            let (bottom, next_top, next_bottom) = (top + 1, top + 2, top + 3);
            mesh.indices
                .extend_from_slice(&[top, bottom, next_bottom, top, next_bottom, next_top]);
        }

        for (y, normal) in [(half, Vec3::Y), (-half, Vec3::NEG_Y)] {
            let center = mesh.vertex_count();
            mesh.push_vertex(Vec3::Y * y, normal, Vec2::splat(0.5));
            for i in 0..=segments {
                let (sin, cos) = (i as f32 / segments as f32 * TAU).sin_cos();
                let uv = Vec2::new(sin * 0.5 + 0.5, cos * 0.5 + 0.5);
                mesh.push_vertex(Vec3::new(sin * radius, y, cos * radius), normal, uv);
            }
            for i in 0..segments {
                let a = center + 1 + i;
                let b = a + 1;
                if normal.y > 0.0 {
                    mesh.indices.extend_from_slice(&[center, a, b]);
                } else {
                    mesh.indices.extend_from_slice(&[center, b, a]);
                }
            }
        }
        mesh
    }

    /// Rotates positions and normals about the X axis.
    pub fn rotated_x(mut self, angle: f32) -> Self {
        let rotation = Mat3::from_rotation_x(angle);
        for vertex in self.vertices.chunks_exact_mut(VERTEX_STRIDE) {
            let position = rotation * Vec3::from_slice(&vertex[0..3]);
            let normal = rotation * Vec3::from_slice(&vertex[3..6]);
            vertex[0..3].copy_from_slice(&position.to_array());
            vertex[3..6].copy_from_slice(&normal.to_array());
        }
        self
    }

    pub fn vertex_count(&self) -> u32 {
        (self.vertices.len() / VERTEX_STRIDE) as u32
    }

    pub fn positions(&self) -> impl Iterator<Item = Vec3> + '_ {
        self.vertices
            .chunks_exact(VERTEX_STRIDE)
            .map(|v| Vec3::from_slice(&v[0..3]))
    }

    pub fn normals(&self) -> impl Iterator<Item = Vec3> + '_ {
        self.vertices
            .chunks_exact(VERTEX_STRIDE)
            .map(|v| Vec3::from_slice(&v[3..6]))
    }

    fn push_vertex(&mut self, position: Vec3, normal: Vec3, uv: Vec2) {
        self.vertices.extend_from_slice(&position.to_array());
        self.vertices.extend_from_slice(&normal.to_array());
        self.vertices.extend_from_slice(&uv.to_array());
    }

    // `u x v` must point along the outward normal.
    fn push_quad(&mut self, center: Vec3, u: Vec3, v: Vec3) {
        let normal = u.cross(v).normalize_or_zero();
        let base = self.vertex_count();
        self.push_vertex(center - u - v, normal, Vec2::new(0.0, 1.0));
        self.push_vertex(center + u - v, normal, Vec2::new(1.0, 1.0));
        self.push_vertex(center + u + v, normal, Vec2::new(1.0, 0.0));
        self.push_vertex(center - u + v, normal, Vec2::new(0.0, 0.0));
        self.indices
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }
}

/// Handle to a mesh registered in a [`MeshLibrary`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MeshId(u32);

impl MeshId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Append-only store of generated meshes shared by scene nodes.
#[derive(Debug, Clone, Default)]
pub struct MeshLibrary {
    meshes: Vec<Mesh>,
}

impl MeshLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, mesh: Mesh) -> MeshId {
        self.meshes.push(mesh);
        MeshId(self.meshes.len() as u32 - 1)
    }

    pub fn get(&self, id: MeshId) -> Option<&Mesh> {
        self.meshes.get(id.index())
    }

    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::f32::consts::FRAC_PI_2;

    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn cuboid_has_outward_normals_and_extents() {
        let mesh = Mesh::cuboid(Vec3::new(3.0, 1.4, 1.2));
        assert_eq!(mesh.vertex_count(), 24);
        assert_eq!(mesh.indices.len(), 36);
        for (position, normal) in mesh.positions().zip(mesh.normals()) {
            assert!(position.dot(normal) > 0.0);
            assert_relative_eq!(position.x.abs(), 1.5);
            assert_relative_eq!(position.y.abs(), 0.7);
            assert_relative_eq!(position.z.abs(), 0.6);
        }
    }

    #[test]
    fn cuboid_triangles_wind_counter_clockwise() {
        let mesh = Mesh::cuboid(Vec3::ONE);
        let positions: Vec<Vec3> = mesh.positions().collect();
        let normals: Vec<Vec3> = mesh.normals().collect();
        for triangle in mesh.indices.chunks_exact(3) {
            let [a, b, c] = [0, 1, 2].map(|i| triangle[i] as usize);
            let face = (positions[b] - positions[a]).cross(positions[c] - positions[a]);
            assert!(face.dot(normals[a]) > 0.0);
        }
    }

    #[test]
    fn cylinder_vertices_lie_on_radius() {
        let mesh = Mesh::cylinder(0.35, 0.2, 32);
        for (position, normal) in mesh.positions().zip(mesh.normals()) {
            assert!(position.y.abs() <= 0.1 + 1e-6);
            if normal.y == 0.0 {
                assert_relative_eq!(Vec2::new(position.x, position.z).length(), 0.35, epsilon = 1e-5);
            }
        }
        let max_index = *mesh.indices.iter().max().unwrap();
        assert!(max_index < mesh.vertex_count());
    }

    #[test]
    fn rotation_turns_cylinder_axis_onto_z() {
        let mesh = Mesh::cylinder(0.2, 0.22, 16).rotated_x(FRAC_PI_2);
        for position in mesh.positions() {
            assert!(position.z.abs() <= 0.11 + 1e-5);
        }
    }

    #[test]
    fn library_hands_out_sequential_ids() {
        let mut library = MeshLibrary::new();
        let cube = library.add(Mesh::cuboid(Vec3::ONE));
        let wheel = library.add(Mesh::cylinder(1.0, 1.0, 8));
        assert_ne!(cube, wheel);
        assert_eq!(library.get(wheel).unwrap().vertex_count(), 18 + 2 * 10);
        assert_eq!(library.len(), 2);
    }
}
