pub mod camera_controller;
pub mod camera_utils;
pub mod fly_camera;

// Re-export main types
pub use camera_controller::{CameraController, CameraStage, MovementBounds, CAMERA_PIPELINE};
pub use camera_utils::{Camera, CameraManager, CameraUniform};
pub use fly_camera::FlyCamera;
