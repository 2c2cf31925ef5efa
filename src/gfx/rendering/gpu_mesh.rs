//! GPU copies of scene meshes and their per-object transform uniforms.

use std::collections::{HashMap, HashSet};

use cgmath::Matrix4;
use wgpu::util::DeviceExt;

use crate::gfx::scene::{MeshData, ObjectId, Scene, Transform};

/// Model and normal matrices for one object, bound at group 1.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ObjectUniform {
    pub model: [[f32; 4]; 4],
    /// Inverse-transpose of the model's linear part, widened to a mat4.
    pub normal: [[f32; 4]; 4],
}

impl ObjectUniform {
    pub fn from_transform(transform: &Transform) -> Self {
        Self {
            model: transform.model_matrix().into(),
            normal: Matrix4::from(transform.normal_matrix()).into(),
        }
    }
}

pub struct GpuObject {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

impl GpuObject {
    pub fn upload(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        mesh: &MeshData,
        transform: &Transform,
    ) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Vertex Buffer", mesh.name)),
            contents: bytemuck::cast_slice(&mesh.vertices()),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Index Buffer", mesh.name)),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Transform Buffer", mesh.name)),
            contents: bytemuck::bytes_of(&ObjectUniform::from_transform(transform)),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&format!("{} Transform Bind Group", mesh.name)),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        Self {
            vertex_buffer,
            index_buffer,
            index_count: mesh.indices.len() as u32,
            uniform_buffer,
            bind_group,
        }
    }

    pub fn update_transform(&self, queue: &wgpu::Queue, transform: &Transform) {
        queue.write_buffer(
            &self.uniform_buffer,
            0,
            bytemuck::bytes_of(&ObjectUniform::from_transform(transform)),
        );
    }
}

/// GPU objects keyed by scene object id.
#[derive(Default)]
pub struct GpuMeshStore {
    objects: HashMap<ObjectId, GpuObject>,
}

impl GpuMeshStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uploads new objects, refreshes transforms and frees removed ones.
    pub fn sync(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layout: &wgpu::BindGroupLayout,
        scene: &Scene,
    ) {
        for object in &scene.objects {
            match self.objects.get(&object.id) {
                Some(gpu) => gpu.update_transform(queue, &object.transform),
                None => {
                    log::debug!(
                        "Uploading '{}' ({} triangles)",
                        object.name,
                        object.mesh.triangle_count()
                    );
                    let gpu = GpuObject::upload(device, layout, &object.mesh, &object.transform);
                    self.objects.insert(object.id, gpu);
                }
            }
        }

        let live: HashSet<ObjectId> = scene.objects.iter().map(|o| o.id).collect();
        self.objects.retain(|id, _| live.contains(id));
    }

    pub fn get(&self, id: ObjectId) -> Option<&GpuObject> {
        self.objects.get(&id)
    }
}

pub trait DrawObject<'a> {
    /// Binds the object's transform at group 1 and draws its indexed mesh.
    fn draw_object(&mut self, object: &'a GpuObject);
}

impl<'a, 'b> DrawObject<'b> for wgpu::RenderPass<'a>
where
    'b: 'a,
{
    fn draw_object(&mut self, object: &'b GpuObject) {
        if object.index_count == 0 {
            return;
        }
        self.set_bind_group(1, &object.bind_group, &[]);
        self.set_vertex_buffer(0, object.vertex_buffer.slice(..));
        self.set_index_buffer(object.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        self.draw_indexed(0..object.index_count, 0, 0..1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::Vector3;

    #[test]
    fn test_identity_transform_uniform() {
        let uniform = ObjectUniform::from_transform(&Transform::default());
        let identity: [[f32; 4]; 4] = cgmath::Matrix4::from_scale(1.0).into();
        assert_eq!(uniform.model, identity);
        assert_eq!(uniform.normal, identity);
    }

    #[test]
    fn test_translation_stays_out_of_normal_matrix() {
        let transform = Transform {
            position: Vector3::new(3.0, -2.0, 7.0),
            ..Default::default()
        };
        let uniform = ObjectUniform::from_transform(&transform);
        assert_eq!(uniform.model[3], [3.0, -2.0, 7.0, 1.0]);
        assert_eq!(uniform.normal[3], [0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_uniform_size() {
        assert_eq!(std::mem::size_of::<ObjectUniform>(), 128);
    }
}
