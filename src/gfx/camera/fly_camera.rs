use super::camera_utils::{convert_matrix4_to_array, Camera, CameraUniform};
use crate::config::CameraConfig;
use cgmath::*;

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: cgmath::Matrix4<f32> = cgmath::Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.5,
    0.0, 0.0, 0.0, 1.0,
);

/// Pitch is kept strictly inside the poles.
pub const PITCH_LIMIT: f32 = 89.0;

/// Free-flying camera described by a position and a unit view direction.
///
/// `front` and `up` are unit length and orthogonal after every public
/// mutation. `target` always equals `position + front`.
#[derive(Debug, Clone, Copy)]
pub struct FlyCamera {
    pub position: Vector3<f32>,
    pub target: Vector3<f32>,
    pub up: Vector3<f32>,
    pub front: Vector3<f32>,
    /// Degrees, measured from +X towards +Z
    pub yaw: f32,
    /// Degrees, positive looks up
    pub pitch: f32,
    pub aspect: f32,
    pub fovy: Deg<f32>,
    pub znear: f32,
    pub zfar: f32,
    pub uniform: CameraUniform,
}

impl Camera for FlyCamera {
    fn build_view_projection_matrix(&self) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * self.projection_matrix() * self.view_matrix()
    }
}

impl FlyCamera {
    pub fn new(config: &CameraConfig, aspect: f32) -> Self {
        let position = Vector3::from(config.position);
        let target = Vector3::from(config.target);

        let mut camera = Self {
            position,
            target,
            up: Vector3::from(config.up),
            front: -Vector3::unit_z(),
            yaw: -90.0,
            pitch: 0.0,
            aspect,
            fovy: Deg(config.fov_y),
            znear: config.znear,
            zfar: config.zfar,
            uniform: CameraUniform::default(),
        };

        camera.reorthogonalize_up();
        camera.sync_target();
        camera.look_at_point(target);
        camera
    }

    /// Right-handed view matrix looking along `front`.
    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(
            Point3::from_vec(self.position),
            Point3::from_vec(self.position + self.front),
            self.up,
        )
    }

    /// OpenGL-convention perspective projection (clip z in [-1, 1]).
    pub fn projection_matrix(&self) -> Matrix4<f32> {
        perspective(self.fovy, self.aspect, self.znear, self.zfar)
    }

    /// Unit vector pointing to the right of the view direction.
    pub fn right(&self) -> Vector3<f32> {
        self.front.cross(self.up).normalize()
    }

    /// Turns the camera by mouse deltas in pixels.
    ///
    /// The view direction is rebuilt from yaw and pitch, so any roll the
    /// `up` vector carries is preserved only as far as it stays orthogonal.
    pub fn orbit(&mut self, dx: f32, dy: f32, sensitivity: f32) {
        self.yaw += dx * sensitivity;
        self.pitch = (self.pitch - dy * sensitivity).clamp(-PITCH_LIMIT, PITCH_LIMIT);
        self.front = front_from_angles(self.yaw, self.pitch);
        self.reorthogonalize_up();
        self.sync_target();
    }

    /// Slides position and target together in the view plane.
    pub fn pan(&mut self, dx: f32, dy: f32, speed: f32) {
        let right = self.right();
        let corrected_up = right.cross(self.front).normalize();
        let offset = (-right * dx + corrected_up * dy) * speed;

        self.position += offset;
        self.target += offset;
        self.front = (self.target - self.position).normalize();
    }

    /// Rotates `up` about the view direction.
    pub fn roll(&mut self, degrees: f32) {
        let rotation = Matrix3::from_axis_angle(self.front, Deg(degrees));
        self.up = rotation * self.up;
        self.reorthogonalize_up();
    }

    /// Moves position by an offset expressed in camera axes
    /// (x = right, y = up, z = front).
    pub fn translate_local(&mut self, local: Vector3<f32>) {
        let right = self.right();
        self.position += right * local.x + self.up * local.y + self.front * local.z;
    }

    /// Dolly along the current view direction, keeping the orientation.
    pub fn zoom(&mut self, amount: f32) {
        let direction = (self.target - self.position).normalize();
        self.position += direction * amount;
        self.target += direction * amount;
    }

    /// Turns the camera in place to face `point`.
    ///
    /// Points straight above or below are reached only up to the pitch
    /// limit. A point at the camera position leaves the pose unchanged.
    pub fn look_at_point(&mut self, point: Vector3<f32>) {
        let direction = point - self.position;
        if direction.magnitude2() <= f32::EPSILON {
            return;
        }
        let direction = direction.normalize();
        self.yaw = direction.z.atan2(direction.x).to_degrees();
        self.pitch = direction
            .y
            .clamp(-1.0, 1.0)
            .asin()
            .to_degrees()
            .clamp(-PITCH_LIMIT, PITCH_LIMIT);
        self.front = front_from_angles(self.yaw, self.pitch);
        self.reorthogonalize_up();
        self.sync_target();
    }

    /// Makes `up` unit length and orthogonal to `front`.
    pub fn reorthogonalize_up(&mut self) {
        let mut right = self.front.cross(self.up);
        if right.magnitude2() < 1e-10 {
            // `up` collapsed onto the view axis, borrow the world axis least
            // aligned with it
            let helper = least_aligned_axis(self.front);
            right = self.front.cross(helper);
        }
        let right = right.normalize();
        self.up = right.cross(self.front).normalize();
    }

    pub fn sync_target(&mut self) {
        self.target = self.position + self.front;
    }

    pub fn resize_projection(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    pub fn update_view_proj(&mut self) {
        self.uniform.view_position = [self.position.x, self.position.y, self.position.z, 1.0];
        self.uniform.view_proj = convert_matrix4_to_array(self.build_view_projection_matrix());
    }
}

/// Unit view direction for the given yaw and pitch in degrees.
pub fn front_from_angles(yaw: f32, pitch: f32) -> Vector3<f32> {
    let (yaw, pitch) = (Deg(yaw), Deg(pitch));
    Vector3::new(
        Angle::cos(yaw) * Angle::cos(pitch),
        Angle::sin(pitch),
        Angle::sin(yaw) * Angle::cos(pitch),
    )
    .normalize()
}

fn least_aligned_axis(v: Vector3<f32>) -> Vector3<f32> {
    let (ax, ay, az) = (v.x.abs(), v.y.abs(), v.z.abs());
    if ax <= ay && ax <= az {
        Vector3::unit_x()
    } else if ay <= az {
        Vector3::unit_y()
    } else {
        Vector3::unit_z()
    }
}
