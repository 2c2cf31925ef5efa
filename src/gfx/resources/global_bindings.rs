//! Per-frame uniforms shared by every pipeline: camera and lighting.

use wgpu::util::DeviceExt;

use crate::config::LightingConfig;
use crate::gfx::camera::CameraUniform;

/// Layout must match `Globals` in the WGSL shaders. Colours and positions are
/// padded to `vec4` for uniform alignment.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GlobalUniformContent {
    pub view_position: [f32; 4],
    pub view_proj: [[f32; 4]; 4],
    pub light_position: [f32; 4],
    pub light_color: [f32; 4],
    pub object_color: [f32; 4],
    pub outline_color: [f32; 4],
}

impl GlobalUniformContent {
    pub fn new(camera: &CameraUniform, lighting: &LightingConfig) -> Self {
        let pad = |v: [f32; 3], w: f32| [v[0], v[1], v[2], w];
        Self {
            view_position: camera.view_position,
            view_proj: camera.view_proj,
            light_position: pad(lighting.light_position, 1.0),
            light_color: pad(lighting.light_color, 1.0),
            object_color: pad(lighting.object_color, 1.0),
            outline_color: pad(lighting.outline_color, 1.0),
        }
    }
}

/// Uniform buffer, its layout and the bind group at slot 0.
pub struct GlobalBindings {
    buffer: wgpu::Buffer,
    layout: wgpu::BindGroupLayout,
    bind_group: wgpu::BindGroup,
}

impl GlobalBindings {
    pub fn new(device: &wgpu::Device) -> Self {
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Global Uniform Buffer"),
            contents: bytemuck::bytes_of(&GlobalUniformContent::new(
                &CameraUniform::default(),
                &LightingConfig::default(),
            )),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Global Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Global Bind Group"),
            layout: &layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
        });

        Self {
            buffer,
            layout,
            bind_group,
        }
    }

    pub fn update(&self, queue: &wgpu::Queue, content: &GlobalUniformContent) {
        queue.write_buffer(&self.buffer, 0, bytemuck::bytes_of(content));
    }

    pub fn layout(&self) -> &wgpu::BindGroupLayout {
        &self.layout
    }

    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }
}
