//! # Scene
//!
//! CPU-side scene state: the object list, each object's transform and mesh
//! data, the current selection, and OBJ import/export.
//!
//! GPU copies of the meshes live in [`crate::gfx::rendering::GpuMeshStore`],
//! keyed by the same [`ObjectId`]. Nothing in this module touches the GPU.

pub mod export;
pub mod import;
pub mod object;
pub mod scene;
pub mod vertex;

// Re-export main types
pub use export::{export_object, ExportError};
pub use import::{import_mesh_file, ImportError};
pub use object::{MeshData, ObjectId, SceneObject, Transform};
pub use scene::{Scene, SceneStatistics, Selection};
pub use vertex::{GridVertex, Vertex3D};
