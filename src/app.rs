use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use winit::{
    application::ApplicationHandler,
    dpi::{LogicalSize, PhysicalSize},
    error::EventLoopError,
    event::{ElementState, Event, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowAttributes, WindowId},
};

use crate::config::ViewerConfig;
use crate::gfx::{
    camera::{CameraController, CameraManager, FlyCamera, MovementBounds},
    grid::GroundGrid,
    picking::{screen_to_ray, ObjectPicker, PickResult, Ray},
    rendering::{RenderEngine, RenderError},
    scene::{
        export_object, import::DIALOG_EXTENSIONS, import_mesh_file, ExportError, ImportError,
        Scene,
    },
};
use crate::ui::{
    panel::{object_list_panel, object_properties_panel},
    ObjectListState, PanelAction, StatusInfo, UiManager,
};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("event loop failed: {0}")]
    EventLoop(#[from] EventLoopError),
    #[error(transparent)]
    Render(#[from] RenderError),
}

/// Where import and export dialogs get their paths from.
pub trait PathPrompt {
    fn open_mesh(&mut self) -> Option<PathBuf>;
    fn save_obj(&mut self, suggested_name: &str) -> Option<PathBuf>;
}

/// Native dialogs through `rfd`.
pub struct DialogPrompt;

impl PathPrompt for DialogPrompt {
    fn open_mesh(&mut self) -> Option<PathBuf> {
        rfd::FileDialog::new()
            .set_title("Import mesh")
            .add_filter("Mesh", DIALOG_EXTENSIONS)
            .pick_file()
    }

    fn save_obj(&mut self, suggested_name: &str) -> Option<PathBuf> {
        rfd::FileDialog::new()
            .set_title("Export selected object")
            .add_filter("OBJ", &["obj"])
            .set_file_name(format!("{}.obj", suggested_name))
            .save_file()
    }
}

/// Everything the editor mutates between frames. Holds no GPU resources.
pub struct EditorState {
    pub camera_manager: CameraManager,
    pub scene: Scene,
    pub picker: ObjectPicker,
    pub config: ViewerConfig,
    pub grid: GroundGrid,
    pub object_list: ObjectListState,
}

impl EditorState {
    pub fn new(config: ViewerConfig) -> Self {
        let aspect = config.window.width as f32 / config.window.height.max(1) as f32;
        let camera = FlyCamera::new(&config.camera, aspect);
        let controller = CameraController::new(
            config.controls,
            MovementBounds::from_config(&config.bounds),
        );
        let grid = GroundGrid::new(&config.grid, camera.position);

        Self {
            camera_manager: CameraManager::new(camera, controller),
            scene: Scene::new(),
            picker: ObjectPicker::new(config.picking.aabb_prepass),
            config,
            grid,
            object_list: ObjectListState::default(),
        }
    }

    /// Imports every mesh in `path` as a new object. On failure the scene is
    /// left untouched and the error is shown in the object list.
    pub fn import_path(&mut self, path: &Path) -> Result<usize, ImportError> {
        match import_mesh_file(path) {
            Ok(meshes) => {
                let count = meshes.len();
                for mesh in meshes {
                    self.scene.add_object(mesh);
                }
                self.object_list.message =
                    Some(format!("Imported {} object(s) from {}", count, path.display()));
                Ok(count)
            }
            Err(e) => {
                log::warn!("{}", e);
                self.object_list.message = Some(format!("Import failed: {}", e));
                Err(e)
            }
        }
    }

    pub fn export_selected(&mut self, path: &Path) -> Result<(), ExportError> {
        let result = self
            .scene
            .selected_object()
            .ok_or(ExportError::NothingSelected)
            .and_then(|object| export_object(object, path));

        self.object_list.message = Some(match &result {
            Ok(()) => format!("Exported to {}", path.display()),
            Err(e) => {
                log::warn!("{}", e);
                format!("Export failed: {}", e)
            }
        });
        result
    }

    /// Turns the camera toward the object's position.
    pub fn focus(&mut self, index: usize) {
        if let Some(object) = self.scene.get_object(index) {
            log::info!("Focusing '{}'", object.name);
            let position = object.transform.position;
            self.camera_manager.camera.look_at_point(position);
        }
    }

    /// Casts a ray through the cursor and updates the selection.
    pub fn pick_at_cursor(&mut self, viewport: (u32, u32)) -> Option<PickResult> {
        let (width, height) = viewport;
        if width == 0 || height == 0 {
            return None;
        }
        let cursor = self.camera_manager.controller.cursor();
        let camera = &self.camera_manager.camera;
        let direction = screen_to_ray(
            (cursor.x as f32, cursor.y as f32),
            (width as f32, height as f32),
            &camera.projection_matrix(),
            &camera.view_matrix(),
        );
        let ray = Ray::new(camera.position, direction);
        self.picker.pick_and_select(&ray, &mut self.scene)
    }

    /// Carries out a panel request. Errors are already logged and shown.
    pub fn apply_action(&mut self, action: PanelAction, prompt: &mut impl PathPrompt) {
        match action {
            PanelAction::Import => {
                if let Some(path) = prompt.open_mesh() {
                    let _ = self.import_path(&path);
                }
            }
            PanelAction::Export => {
                let Some(name) = self.scene.selected_object().map(|o| o.name.clone()) else {
                    return;
                };
                if let Some(path) = prompt.save_obj(&name) {
                    let _ = self.export_selected(&path);
                }
            }
            PanelAction::Remove(index) => {
                if let Some(object) = self.scene.remove_object(index) {
                    log::info!("Removed '{}'", object.name);
                }
            }
            PanelAction::Focus(index) => {
                self.scene.select(Some(index));
                self.focus(index);
            }
            PanelAction::Select(index) => self.scene.select(Some(index)),
        }
    }

    /// Advances the camera one frame. Returns `true` if the grid was rebuilt.
    pub fn update(&mut self) -> bool {
        self.camera_manager.update();
        self.grid
            .update(&self.config.grid, self.camera_manager.camera.position)
    }

    pub fn status(&self) -> StatusInfo {
        StatusInfo {
            bounds_enabled: self.camera_manager.controller.bounds.enabled,
            camera_position: self.camera_manager.camera.position,
        }
    }
}

struct AppState {
    window: Option<Arc<Window>>,
    render_engine: Option<RenderEngine>,
    ui_manager: Option<UiManager>,
    editor: EditorState,
    error: Option<RenderError>,
}

impl AppState {
    fn redraw(&mut self, window: &Arc<Window>) -> Result<(), RenderError> {
        let (Some(render_engine), Some(ui_manager)) =
            (self.render_engine.as_mut(), self.ui_manager.as_mut())
        else {
            return Ok(());
        };

        let mut actions = Vec::new();
        let status = self.editor.status();
        {
            let editor = &mut self.editor;
            ui_manager.update_logic(window, |ui| {
                object_list_panel(ui, &editor.scene, &mut editor.object_list, &status, &mut actions);
                object_properties_panel(ui, &mut editor.scene, &mut actions);
            });
        }
        for action in actions {
            self.editor.apply_action(action, &mut DialogPrompt);
        }

        if self.editor.update() {
            render_engine.update_grid(&self.editor.grid);
        }
        render_engine.update(self.editor.camera_manager.camera.uniform);
        render_engine.sync_scene(&self.editor.scene);

        render_engine.render_frame(
            &self.editor.scene,
            Some(|device: &wgpu::Device,
                  queue: &wgpu::Queue,
                  encoder: &mut wgpu::CommandEncoder,
                  view: &wgpu::TextureView| {
                ui_manager.render_display_only(device, queue, encoder, view);
            }),
        )
    }
}

impl ApplicationHandler for AppState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window_config = &self.editor.config.window;
        let attributes = WindowAttributes::default()
            .with_title(window_config.title.clone())
            .with_inner_size(LogicalSize::new(window_config.width, window_config.height));

        let window = match event_loop.create_window(attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("Failed to create window: {}", e);
                event_loop.exit();
                return;
            }
        };
        self.window = Some(window.clone());

        let (width, height) = window.inner_size().into();
        self.editor
            .camera_manager
            .camera
            .resize_projection(width, height);

        let window_clone = window.clone();
        let config = self.editor.config.clone();
        let renderer = match pollster::block_on(async move {
            RenderEngine::new(window_clone, width, height, &config).await
        }) {
            Ok(renderer) => renderer,
            Err(e) => {
                log::error!("{}", e);
                self.error = Some(e);
                event_loop.exit();
                return;
            }
        };

        let ui_manager = UiManager::new(
            renderer.device(),
            renderer.queue(),
            renderer.surface_format(),
            &window,
        );

        let mut renderer = renderer;
        renderer.update_grid(&self.editor.grid);

        self.ui_manager = Some(ui_manager);
        self.render_engine = Some(renderer);
        log::info!("Window ready ({}x{})", width, height);
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        let Some(window) = self.window.clone() else {
            return;
        };

        let (wants_mouse, wants_keyboard) = match self.ui_manager.as_mut() {
            Some(ui_manager) => {
                let ui_event: Event<()> = Event::WindowEvent {
                    window_id,
                    event: event.clone(),
                };
                ui_manager.handle_input(&window, &ui_event);
                (ui_manager.wants_mouse(), ui_manager.wants_keyboard())
            }
            None => (false, false),
        };

        let camera_manager = &mut self.editor.camera_manager;

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::KeyboardInput { event: key_event, .. } => {
                if is_exit_key(key_event.physical_key, key_event.state, wants_keyboard) {
                    event_loop.exit();
                    return;
                }
                if key_event.state == ElementState::Released || !wants_keyboard {
                    camera_manager.process_keyboard_event(&key_event);
                }
            }
            WindowEvent::MouseInput { state, button, .. } => {
                if state == ElementState::Released || !wants_mouse {
                    let wants_pick = camera_manager.process_mouse_button(button, state);
                    if wants_pick {
                        let viewport = self
                            .render_engine
                            .as_ref()
                            .map_or((0, 0), |r| r.get_surface_size());
                        self.editor.pick_at_cursor(viewport);
                    }
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                camera_manager.controller.process_cursor_moved(position);
                if wants_mouse {
                    camera_manager.controller.sync_cursor();
                }
            }
            WindowEvent::MouseWheel { delta, .. } => {
                if !wants_mouse {
                    camera_manager.process_scroll(&delta);
                }
            }
            WindowEvent::Focused(false) => camera_manager.controller.release_all_keys(),
            WindowEvent::Resized(PhysicalSize { width, height }) => {
                camera_manager.camera.resize_projection(width, height);
                if let Some(render_engine) = self.render_engine.as_mut() {
                    render_engine.resize(width, height);
                }
            }
            WindowEvent::RedrawRequested => {
                if let Err(e) = self.redraw(&window) {
                    log::error!("{}", e);
                    self.error = Some(e);
                    event_loop.exit();
                }
            }
            _ => (),
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(ref window) = self.window {
            window.request_redraw();
        }
    }
}

/// Opens the viewer window and runs until it is closed.
///
/// `startup_files` are imported before the first frame; a file that fails to
/// import is logged and skipped.
/// Escape quits unless a UI text field holds the keyboard.
fn is_exit_key(key: PhysicalKey, state: ElementState, wants_keyboard: bool) -> bool {
    state == ElementState::Pressed
        && key == PhysicalKey::Code(KeyCode::Escape)
        && !wants_keyboard
}

pub fn run(config: ViewerConfig, startup_files: &[PathBuf]) -> Result<(), AppError> {
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut editor = EditorState::new(config);
    for path in startup_files {
        let _ = editor.import_path(path);
    }

    let mut state = AppState {
        window: None,
        render_engine: None,
        ui_manager: None,
        editor,
        error: None,
    };
    event_loop.run_app(&mut state)?;

    match state.error.take() {
        Some(e) => Err(e.into()),
        None => Ok(()),
    }
}
