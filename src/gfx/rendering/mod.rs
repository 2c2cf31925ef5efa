//! Frame rendering
//!
//! Pipelines, GPU mesh storage and the engine that records each frame.

pub mod gpu_mesh;
pub mod pipeline_manager;
pub mod render_engine;

pub use gpu_mesh::{DrawObject, GpuMeshStore, GpuObject, ObjectUniform};
pub use pipeline_manager::{PipelineConfig, PipelineManager, PipelineStats, VertexLayout};
pub use render_engine::{RenderEngine, RenderError};
