//! meshpick
//!
//! Interactive 3D mesh viewer built on wgpu and winit: fly/orbit camera,
//! ray picking against CPU-side meshes, OBJ import/export and an imgui
//! editing overlay.

pub mod app;
pub mod config;
pub mod gfx;
pub mod ui;

pub use app::{run, AppError, EditorState};
pub use config::ViewerConfig;
