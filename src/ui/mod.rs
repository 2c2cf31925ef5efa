//! # User Interface Module
//!
//! Dear ImGui overlay drawn on top of the viewport.
//!
//! - [`UiManager`] - ImGui context, winit input forwarding and the wgpu renderer
//! - [`panel`] - object list and properties panels
//!
//! While a panel has the pointer or keyboard, [`UiManager::wants_mouse`] and
//! [`UiManager::wants_keyboard`] report it so camera input and picking can
//! stand down.

pub mod manager;
pub mod panel;

pub use manager::UiManager;
pub use panel::{ObjectListState, PanelAction, StatusInfo};
