//! GPU resources shared across pipelines
//!
//! - [`global_bindings`]: camera and lighting uniforms bound at group 0
//! - [`texture_resource`]: depth/stencil target

pub mod global_bindings;
pub mod texture_resource;

pub use global_bindings::{GlobalBindings, GlobalUniformContent};
pub use texture_resource::TextureResource;
