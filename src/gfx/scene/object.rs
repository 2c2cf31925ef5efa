use cgmath::{Deg, InnerSpace, Matrix, Matrix3, Matrix4, SquareMatrix, Vector3};

use super::vertex::Vertex3D;

/// Stable identity of a scene object, shared with its GPU resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub u64);

/// Position, Euler rotation in degrees (applied X, then Y, then Z in the
/// matrix product) and per-axis scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vector3<f32>,
    pub rotation: Vector3<f32>,
    pub scale: Vector3<f32>,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vector3::new(0.0, 0.0, 0.0),
            rotation: Vector3::new(0.0, 0.0, 0.0),
            scale: Vector3::new(1.0, 1.0, 1.0),
        }
    }
}

impl Transform {
    /// `T * Rx * Ry * Rz * S`
    pub fn model_matrix(&self) -> Matrix4<f32> {
        Matrix4::from_translation(self.position)
            * Matrix4::from_angle_x(Deg(self.rotation.x))
            * Matrix4::from_angle_y(Deg(self.rotation.y))
            * Matrix4::from_angle_z(Deg(self.rotation.z))
            * Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z)
    }

    /// Inverse transpose of the model matrix's linear part.
    ///
    /// Falls back to the linear part itself when it is singular (a zero
    /// scale axis).
    pub fn normal_matrix(&self) -> Matrix3<f32> {
        let m = self.model_matrix();
        let linear = Matrix3::from_cols(m.x.truncate(), m.y.truncate(), m.z.truncate());
        linear
            .invert()
            .map(|inverse| inverse.transpose())
            .unwrap_or(linear)
    }

    pub fn reset_position(&mut self) {
        self.position = Transform::default().position;
    }

    pub fn reset_rotation(&mut self) {
        self.rotation = Transform::default().rotation;
    }

    pub fn reset_scale(&mut self) {
        self.scale = Transform::default().scale;
    }
}

/// CPU copy of a triangle mesh.
///
/// This is the data picking and export work from; the GPU buffers are
/// built from it but never read back.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshData {
    pub name: String,
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub indices: Vec<u32>,
}

impl MeshData {
    /// Builds a mesh from flat `xyz` arrays as produced by OBJ loaders.
    ///
    /// Normals are generated from the faces when `normals` does not have one
    /// entry per position. A trailing partial triangle in `indices` is
    /// dropped, as are triangles referencing missing vertices.
    pub fn new(name: impl Into<String>, positions: &[f32], normals: &[f32], indices: &[u32]) -> Self {
        let positions: Vec<[f32; 3]> = positions
            .chunks_exact(3)
            .map(|p| [p[0], p[1], p[2]])
            .collect();

        let vertex_count = positions.len() as u32;
        let indices: Vec<u32> = indices
            .chunks_exact(3)
            .filter(|tri| tri.iter().all(|&i| i < vertex_count))
            .flatten()
            .copied()
            .collect();

        let normals = if !normals.is_empty() && normals.len() == positions.len() * 3 {
            normals.chunks_exact(3).map(|n| [n[0], n[1], n[2]]).collect()
        } else {
            Self::calculate_face_normals(&positions, &indices)
        };

        Self {
            name: name.into(),
            positions,
            normals,
            indices,
        }
    }

    /// Averages the normals of the faces around each vertex.
    pub fn calculate_face_normals(positions: &[[f32; 3]], indices: &[u32]) -> Vec<[f32; 3]> {
        let mut sums = vec![Vector3::new(0.0f32, 0.0, 0.0); positions.len()];

        for triangle in indices.chunks_exact(3) {
            let [i0, i1, i2] = [
                triangle[0] as usize,
                triangle[1] as usize,
                triangle[2] as usize,
            ];
            let v0 = Vector3::from(positions[i0]);
            let v1 = Vector3::from(positions[i1]);
            let v2 = Vector3::from(positions[i2]);
            let face_normal = (v1 - v0).cross(v2 - v0);

            for index in [i0, i1, i2] {
                sums[index] += face_normal;
            }
        }

        sums.into_iter()
            .map(|sum| {
                if sum.magnitude2() > 0.0 {
                    sum.normalize().into()
                } else {
                    [0.0, 1.0, 0.0]
                }
            })
            .collect()
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Iterates the triangles as vertex positions in mesh-local space.
    pub fn triangles(&self) -> impl Iterator<Item = [Vector3<f32>; 3]> + '_ {
        self.indices.chunks_exact(3).map(move |tri| {
            [
                Vector3::from(self.positions[tri[0] as usize]),
                Vector3::from(self.positions[tri[1] as usize]),
                Vector3::from(self.positions[tri[2] as usize]),
            ]
        })
    }

    /// Local-space bounding box, `None` for a mesh without vertices.
    pub fn local_bounds(&self) -> Option<(Vector3<f32>, Vector3<f32>)> {
        let first = Vector3::from(*self.positions.first()?);
        let bounds = self
            .positions
            .iter()
            .skip(1)
            .fold((first, first), |(min, max), p| {
                (
                    Vector3::new(min.x.min(p[0]), min.y.min(p[1]), min.z.min(p[2])),
                    Vector3::new(max.x.max(p[0]), max.y.max(p[1]), max.z.max(p[2])),
                )
            });
        Some(bounds)
    }

    /// Interleaved vertices for upload.
    pub fn vertices(&self) -> Vec<Vertex3D> {
        self.positions
            .iter()
            .zip(&self.normals)
            .map(|(position, normal)| Vertex3D {
                position: *position,
                normal: *normal,
            })
            .collect()
    }
}

/// An entry of the scene: identity, display name, transform and mesh.
#[derive(Debug, Clone)]
pub struct SceneObject {
    pub id: ObjectId,
    pub name: String,
    pub transform: Transform,
    pub mesh: MeshData,
}

impl SceneObject {
    pub fn model_matrix(&self) -> Matrix4<f32> {
        self.transform.model_matrix()
    }
}
