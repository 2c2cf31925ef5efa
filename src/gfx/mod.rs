//! # Graphics Module
//!
//! Everything between the window and the scene data:
//!
//! - **Camera** ([`camera`]) - fly camera and the staged input controller
//! - **Picking** ([`picking`]) - screen rays and ray/mesh intersection
//! - **Grid** ([`grid`]) - ground grid with distance-based cell size
//! - **Rendering** ([`rendering`]) - Phong shading, grid lines and selection outline
//! - **Resources** ([`resources`]) - shared uniforms and the depth/stencil target
//! - **Scene** ([`scene`]) - objects, selection and OBJ import/export
//!
//! Only [`rendering`] and [`resources`] talk to the GPU; the rest is plain
//! CPU state and can be tested without a device.

pub mod camera;
pub mod grid;
pub mod picking;
pub mod rendering;
pub mod resources;
pub mod scene;

pub use camera::FlyCamera;
pub use rendering::RenderEngine;
