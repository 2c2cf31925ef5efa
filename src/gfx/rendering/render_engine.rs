//! wgpu rendering engine for the viewer
//!
//! Owns the surface, device and pipelines. A frame is a single pass over
//! the ground grid and the scene's meshes, followed by the selection
//! outline and an optional UI overlay.

use std::sync::Arc;
use thiserror::Error;
use wgpu::{Device, TextureFormat};

use crate::config::{LightingConfig, ViewerConfig};
use crate::gfx::{
    camera::CameraUniform,
    grid::GroundGrid,
    resources::{GlobalBindings, GlobalUniformContent, TextureResource},
    scene::Scene,
};

use super::gpu_mesh::{DrawObject, GpuMeshStore};
use super::pipeline_manager::{PipelineConfig, PipelineManager, VertexLayout};

pub const PHONG_PIPELINE: &str = "Phong";
pub const OUTLINE_PIPELINE: &str = "Outline";
pub const GRID_PIPELINE: &str = "Grid";

/// Stencil value written under the selected object
const SELECTED_STENCIL: u32 = 1;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to create surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),
    #[error("no suitable graphics adapter: {0}")]
    Adapter(#[from] wgpu::RequestAdapterError),
    #[error("failed to open graphics device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),
    #[error("failed to build pipeline: {0}")]
    Pipeline(String),
    #[error("failed to acquire surface texture: {0}")]
    SurfaceTexture(#[from] wgpu::SurfaceError),
}

struct GridBuffer {
    buffer: wgpu::Buffer,
    vertex_count: u32,
}

pub struct RenderEngine {
    surface: wgpu::Surface<'static>,
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    config: wgpu::SurfaceConfiguration,
    depth_texture: TextureResource,
    format: TextureFormat,
    pub pipeline_manager: PipelineManager,
    global_bindings: GlobalBindings,
    transform_bind_group_layout: wgpu::BindGroupLayout,
    meshes: GpuMeshStore,
    grid: Option<GridBuffer>,
    lighting: LightingConfig,
    clear_color: wgpu::Color,
}

impl RenderEngine {
    /// Creates a render engine drawing into `window`.
    ///
    /// # Errors
    /// Fails when no surface, adapter or device can be obtained, or a
    /// pipeline references a missing shader.
    pub async fn new(
        window: impl Into<wgpu::SurfaceTarget<'static>>,
        width: u32,
        height: u32,
        viewer_config: &ViewerConfig,
    ) -> Result<RenderEngine, RenderError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await?;
        log::info!("Using adapter: {:?}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("WGPU Device"),
                required_features: wgpu::Features::default(),
                required_limits: wgpu::Limits {
                    max_texture_dimension_2d: 4096,
                    ..wgpu::Limits::downlevel_defaults()
                },
                memory_hints: wgpu::MemoryHints::default(),
                trace: wgpu::Trace::Off,
            })
            .await?;

        let surface_capabilities = surface.get_capabilities(&adapter);
        let format = surface_capabilities
            .formats
            .iter()
            .copied()
            .find(|f| !f.is_srgb())
            .or_else(|| surface_capabilities.formats.first().copied())
            .ok_or_else(|| RenderError::Pipeline("surface reports no formats".to_string()))?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: width.max(1),
            height: height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: surface_capabilities
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let depth_texture =
            TextureResource::create_depth_texture(&device, &config, "depth_texture");

        let global_bindings = GlobalBindings::new(&device);

        let transform_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Transform Bind Group Layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            });

        let device_handle: Arc<Device> = device.into();
        let queue_handle: Arc<wgpu::Queue> = queue.into();
        let mut pipeline_manager = PipelineManager::new(device_handle.clone());

        pipeline_manager.load_shader("phong", include_str!("phong.wgsl"));
        pipeline_manager.load_shader("outline", include_str!("outline.wgsl"));
        pipeline_manager.load_shader("grid", include_str!("grid.wgsl"));

        let object_layouts = vec![
            global_bindings.layout().clone(),
            transform_bind_group_layout.clone(),
        ];

        // Every fragment that passes depth stamps the stencil reference
        pipeline_manager.register_pipeline(
            PHONG_PIPELINE,
            PipelineConfig::default()
                .with_label("PHONG")
                .with_shader("phong")
                .with_color_format(format)
                .with_bind_group_layouts(object_layouts.clone())
                .with_depth(TextureResource::DEPTH_FORMAT, true, wgpu::CompareFunction::Less)
                .with_stencil(
                    wgpu::StencilFaceState {
                        compare: wgpu::CompareFunction::Always,
                        fail_op: wgpu::StencilOperation::Keep,
                        depth_fail_op: wgpu::StencilOperation::Keep,
                        pass_op: wgpu::StencilOperation::Replace,
                    },
                    0xFF,
                    0xFF,
                ),
        );

        // Enlarged silhouette drawn only where the selection left no stamp
        pipeline_manager.register_pipeline(
            OUTLINE_PIPELINE,
            PipelineConfig::default()
                .with_label("OUTLINE")
                .with_shader("outline")
                .with_color_format(format)
                .with_bind_group_layouts(object_layouts)
                .with_cull_mode(None)
                .with_depth(TextureResource::DEPTH_FORMAT, false, wgpu::CompareFunction::Always)
                .with_stencil(
                    wgpu::StencilFaceState {
                        compare: wgpu::CompareFunction::NotEqual,
                        fail_op: wgpu::StencilOperation::Keep,
                        depth_fail_op: wgpu::StencilOperation::Keep,
                        pass_op: wgpu::StencilOperation::Keep,
                    },
                    0xFF,
                    0x00,
                ),
        );

        pipeline_manager.register_pipeline(
            GRID_PIPELINE,
            PipelineConfig::default()
                .with_label("GRID")
                .with_shader("grid")
                .with_color_format(format)
                .with_vertex_layout(VertexLayout::Grid)
                .with_primitive_topology(wgpu::PrimitiveTopology::LineList)
                .with_cull_mode(None)
                .with_bind_group_layouts(vec![global_bindings.layout().clone()])
                .with_depth(TextureResource::DEPTH_FORMAT, true, wgpu::CompareFunction::Less),
        );

        pipeline_manager.create_all_pipelines()?;
        log::debug!("{:?}", pipeline_manager.get_stats());

        let [r, g, b] = viewer_config.window.clear_color;

        Ok(RenderEngine {
            surface,
            device: device_handle,
            queue: queue_handle,
            config,
            depth_texture,
            format,
            pipeline_manager,
            global_bindings,
            transform_bind_group_layout,
            meshes: GpuMeshStore::new(),
            grid: None,
            lighting: viewer_config.lighting.clone(),
            clear_color: wgpu::Color { r, g, b, a: 1.0 },
        })
    }

    /// Writes this frame's camera and lighting uniforms.
    pub fn update(&mut self, camera_uniform: CameraUniform) {
        let content = GlobalUniformContent::new(&camera_uniform, &self.lighting);
        self.global_bindings.update(&self.queue, &content);
    }

    /// Brings GPU meshes in line with the scene's object list.
    pub fn sync_scene(&mut self, scene: &Scene) {
        self.meshes.sync(
            &self.device,
            &self.queue,
            &self.transform_bind_group_layout,
            scene,
        );
    }

    /// Replaces the grid's vertex buffer.
    pub fn update_grid(&mut self, grid: &GroundGrid) {
        use wgpu::util::DeviceExt;

        let buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Grid Vertex Buffer"),
                contents: bytemuck::cast_slice(&grid.vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });
        self.grid = Some(GridBuffer {
            buffer,
            vertex_count: grid.vertex_count(),
        });
    }

    /// Renders one frame.
    ///
    /// Pass order is grid, meshes, selection outline, then `ui_callback` with
    /// the encoder and surface view so the overlay lands on top.
    ///
    /// A lost or outdated surface is reconfigured and the frame skipped.
    pub fn render_frame<F>(&mut self, scene: &Scene, ui_callback: Option<F>) -> Result<(), RenderError>
    where
        F: FnOnce(&wgpu::Device, &wgpu::Queue, &mut wgpu::CommandEncoder, &wgpu::TextureView),
    {
        let surface_texture = match self.surface.get_current_texture() {
            Ok(texture) => texture,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::warn!("Surface lost or outdated, reconfiguring");
                self.surface.configure(&self.device, &self.config);
                return Ok(());
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::warn!("Timed out waiting for surface texture");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        let surface_texture_view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Main Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &surface_texture_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(0),
                        store: wgpu::StoreOp::Store,
                    }),
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            render_pass.set_bind_group(0, self.global_bindings.bind_group(), &[]);

            if let (Some(grid), Some(pipeline)) =
                (&self.grid, self.pipeline_manager.get_pipeline(GRID_PIPELINE))
            {
                render_pass.set_pipeline(pipeline);
                render_pass.set_vertex_buffer(0, grid.buffer.slice(..));
                render_pass.draw(0..grid.vertex_count, 0..1);
            }

            let selected = scene.selected_index();

            // The selected object goes last so nothing overwrites its stamp
            if let Some(pipeline) = self.pipeline_manager.get_pipeline(PHONG_PIPELINE) {
                render_pass.set_pipeline(pipeline);
                render_pass.set_stencil_reference(0);
                for (index, object) in scene.objects.iter().enumerate() {
                    if Some(index) == selected {
                        continue;
                    }
                    if let Some(gpu) = self.meshes.get(object.id) {
                        render_pass.draw_object(gpu);
                    }
                }
                if let Some(gpu) = selected
                    .and_then(|index| scene.get_object(index))
                    .and_then(|object| self.meshes.get(object.id))
                {
                    render_pass.set_stencil_reference(SELECTED_STENCIL);
                    render_pass.draw_object(gpu);
                }
            }

            let outlined = selected
                .and_then(|index| scene.get_object(index))
                .and_then(|object| self.meshes.get(object.id));
            if let (Some(gpu), Some(pipeline)) =
                (outlined, self.pipeline_manager.get_pipeline(OUTLINE_PIPELINE))
            {
                render_pass.set_pipeline(pipeline);
                render_pass.set_stencil_reference(SELECTED_STENCIL);
                render_pass.draw_object(gpu);
            }
        }

        if let Some(ui_callback) = ui_callback {
            ui_callback(
                &self.device,
                &self.queue,
                &mut encoder,
                &surface_texture_view,
            );
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        surface_texture.present();
        Ok(())
    }

    /// Reconfigures the surface and depth target. Zero sizes are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.config.width = width;
            self.config.height = height;
            self.surface.configure(&self.device, &self.config);
            self.depth_texture =
                TextureResource::create_depth_texture(&self.device, &self.config, "depth_texture");
        }
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn surface_format(&self) -> TextureFormat {
        self.format
    }

    pub fn get_surface_size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }
}
