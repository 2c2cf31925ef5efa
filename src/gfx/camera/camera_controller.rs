use std::collections::HashSet;

use cgmath::Vector3;
use winit::{
    dpi::PhysicalPosition,
    event::{ElementState, KeyEvent, MouseButton, MouseScrollDelta},
    keyboard::{KeyCode, PhysicalKey},
};

use super::fly_camera::FlyCamera;
use crate::config::{BoundsConfig, ControlsConfig};

/// Pixels of a touchpad scroll counted as one wheel line
const PIXELS_PER_LINE: f32 = 20.0;

/// One step of the per-frame camera update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraStage {
    Orbit,
    Pan,
    Roll,
    Translate,
    Clamp,
}

/// Order in which [`CameraController::update`] applies the stages.
pub const CAMERA_PIPELINE: [CameraStage; 5] = [
    CameraStage::Orbit,
    CameraStage::Pan,
    CameraStage::Roll,
    CameraStage::Translate,
    CameraStage::Clamp,
];

/// Box that confines the camera position while enabled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MovementBounds {
    pub enabled: bool,
    pub min: Vector3<f32>,
    pub max: Vector3<f32>,
}

impl MovementBounds {
    pub fn from_config(config: &BoundsConfig) -> Self {
        Self {
            enabled: config.enabled,
            min: Vector3::from(config.min),
            max: Vector3::from(config.max),
        }
    }

    pub fn toggle(&mut self) -> bool {
        self.enabled = !self.enabled;
        self.enabled
    }

    /// Component-wise clamp, a no-op while disabled.
    pub fn clamp(&self, point: Vector3<f32>) -> Vector3<f32> {
        if !self.enabled {
            return point;
        }
        Vector3::new(
            point.x.clamp(self.min.x, self.max.x),
            point.y.clamp(self.min.y, self.max.y),
            point.z.clamp(self.min.z, self.max.z),
        )
    }
}

/// Translates mouse and keyboard input into camera motion.
///
/// Orbiting, panning and rolling are independent flags that may be active
/// together. All of them consume the same cursor delta, computed once per
/// [`update`](Self::update).
pub struct CameraController {
    pub controls: ControlsConfig,
    pub bounds: MovementBounds,
    held_keys: HashSet<KeyCode>,
    is_orbiting: bool,
    is_panning: bool,
    is_rolling: bool,
    cursor: PhysicalPosition<f64>,
    last_cursor: PhysicalPosition<f64>,
}

impl CameraController {
    pub fn new(controls: ControlsConfig, bounds: MovementBounds) -> Self {
        Self {
            controls,
            bounds,
            held_keys: HashSet::new(),
            is_orbiting: false,
            is_panning: false,
            is_rolling: false,
            cursor: PhysicalPosition::new(0.0, 0.0),
            last_cursor: PhysicalPosition::new(0.0, 0.0),
        }
    }

    pub fn process_keyboard_event(&mut self, event: &KeyEvent) {
        let PhysicalKey::Code(code) = event.physical_key else {
            return;
        };
        match event.state {
            ElementState::Pressed => self.press_key(code),
            ElementState::Released => self.release_key(code),
        }
    }

    /// Records a key press. Repeats of a held key are ignored, so `C`
    /// toggles the movement bounds once per physical press.
    pub fn press_key(&mut self, code: KeyCode) {
        let newly_pressed = self.held_keys.insert(code);
        if newly_pressed && code == KeyCode::KeyC {
            let enabled = self.bounds.toggle();
            log::info!(
                "Movement constraints {}",
                if enabled { "enabled" } else { "disabled" }
            );
        }
    }

    pub fn release_key(&mut self, code: KeyCode) {
        self.held_keys.remove(&code);
    }

    pub fn is_key_held(&self, code: KeyCode) -> bool {
        self.held_keys.contains(&code)
    }

    /// Drops every held key, e.g. when the window loses focus.
    pub fn release_all_keys(&mut self) {
        self.held_keys.clear();
    }

    /// Handles a mouse button and returns `true` when the press is a plain
    /// left click that should run a pick.
    ///
    /// Mode entry is checked in priority order: `R` + left rolls, `1` + left
    /// pans, `1` + right orbits. Entering a mode resets the last cursor so the
    /// first delta of the drag is zero.
    pub fn process_mouse_button(&mut self, button: MouseButton, state: ElementState) -> bool {
        match state {
            ElementState::Pressed => {
                let roll_held = self.is_key_held(KeyCode::KeyR);
                let pan_held = self.is_key_held(KeyCode::Digit1);

                if roll_held && button == MouseButton::Left {
                    self.is_rolling = true;
                    self.last_cursor = self.cursor;
                } else if pan_held && button == MouseButton::Left {
                    self.is_panning = true;
                    self.last_cursor = self.cursor;
                } else if pan_held && button == MouseButton::Right {
                    self.is_orbiting = true;
                    self.last_cursor = self.cursor;
                }

                button == MouseButton::Left && !roll_held && !pan_held
            }
            ElementState::Released => {
                match button {
                    MouseButton::Left => {
                        self.is_rolling = false;
                        self.is_panning = false;
                    }
                    MouseButton::Right => self.is_orbiting = false,
                    _ => (),
                }
                false
            }
        }
    }

    pub fn process_cursor_moved(&mut self, position: PhysicalPosition<f64>) {
        self.cursor = position;
    }

    pub fn cursor(&self) -> PhysicalPosition<f64> {
        self.cursor
    }

    /// Forgets any cursor motion since the last update.
    pub fn sync_cursor(&mut self) {
        self.last_cursor = self.cursor;
    }

    /// Dolly zoom, applied immediately rather than in the frame pipeline.
    pub fn process_scroll(&mut self, delta: &MouseScrollDelta, camera: &mut FlyCamera) {
        let lines = match delta {
            MouseScrollDelta::LineDelta(_, y) => *y,
            MouseScrollDelta::PixelDelta(PhysicalPosition { y, .. }) => {
                *y as f32 / PIXELS_PER_LINE
            }
        };
        camera.zoom(lines * self.controls.zoom_speed);
    }

    pub fn is_orbiting(&self) -> bool {
        self.is_orbiting
    }

    pub fn is_panning(&self) -> bool {
        self.is_panning
    }

    pub fn is_rolling(&self) -> bool {
        self.is_rolling
    }

    /// Runs [`CAMERA_PIPELINE`] once with the cursor delta accumulated since
    /// the previous call.
    pub fn update(&mut self, camera: &mut FlyCamera) {
        let dx = (self.cursor.x - self.last_cursor.x) as f32;
        let dy = (self.cursor.y - self.last_cursor.y) as f32;
        self.last_cursor = self.cursor;

        for stage in CAMERA_PIPELINE {
            self.apply_stage(stage, camera, dx, dy);
        }
        camera.sync_target();
    }

    fn apply_stage(&self, stage: CameraStage, camera: &mut FlyCamera, dx: f32, dy: f32) {
        match stage {
            CameraStage::Orbit if self.is_orbiting => {
                camera.orbit(dx, dy, self.controls.orbit_sensitivity);
            }
            CameraStage::Pan if self.is_panning => {
                camera.pan(dx, dy, self.controls.pan_speed);
            }
            CameraStage::Roll if self.is_rolling => {
                camera.roll(dx * self.controls.roll_speed);
            }
            CameraStage::Translate => {
                let step = self.movement_direction() * self.current_speed();
                camera.translate_local(step);
            }
            CameraStage::Clamp => {
                camera.position = self.bounds.clamp(camera.position);
            }
            _ => (),
        }
    }

    fn current_speed(&self) -> f32 {
        if self.is_key_held(KeyCode::ShiftLeft) || self.is_key_held(KeyCode::ShiftRight) {
            self.controls.fast_speed
        } else {
            self.controls.normal_speed
        }
    }

    /// Sum of the held movement keys in camera axes. Each key counts on its
    /// own, so two keys for the same direction move twice as far.
    fn movement_direction(&self) -> Vector3<f32> {
        const BINDINGS: [(KeyCode, [f32; 3]); 9] = [
            (KeyCode::KeyW, [0.0, 0.0, 1.0]),
            (KeyCode::KeyS, [0.0, 0.0, -1.0]),
            (KeyCode::KeyA, [-1.0, 0.0, 0.0]),
            (KeyCode::KeyD, [1.0, 0.0, 0.0]),
            (KeyCode::Space, [0.0, 1.0, 0.0]),
            (KeyCode::KeyE, [0.0, 1.0, 0.0]),
            (KeyCode::ControlLeft, [0.0, -1.0, 0.0]),
            (KeyCode::ControlRight, [0.0, -1.0, 0.0]),
            (KeyCode::KeyQ, [0.0, -1.0, 0.0]),
        ];

        BINDINGS
            .iter()
            .filter(|(code, _)| self.is_key_held(*code))
            .fold(Vector3::new(0.0, 0.0, 0.0), |acc, (_, dir)| {
                acc + Vector3::from(*dir)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CameraConfig;
    use cgmath::InnerSpace;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn setup() -> (CameraController, FlyCamera) {
        let controller = CameraController::new(
            ControlsConfig::default(),
            MovementBounds::from_config(&BoundsConfig::default()),
        );
        let camera = FlyCamera::new(&CameraConfig::default(), 1.0);
        (controller, camera)
    }

    fn move_cursor(controller: &mut CameraController, x: f64, y: f64) {
        controller.process_cursor_moved(PhysicalPosition::new(x, y));
    }

    #[test]
    fn test_pipeline_order() {
        assert_eq!(
            CAMERA_PIPELINE,
            [
                CameraStage::Orbit,
                CameraStage::Pan,
                CameraStage::Roll,
                CameraStage::Translate,
                CameraStage::Clamp,
            ]
        );
    }

    #[test]
    fn test_plain_left_press_requests_pick() {
        let (mut controller, _) = setup();
        assert!(controller.process_mouse_button(MouseButton::Left, ElementState::Pressed));
        assert!(!controller.is_rolling() && !controller.is_panning() && !controller.is_orbiting());
        assert!(!controller.process_mouse_button(MouseButton::Right, ElementState::Pressed));
        assert!(!controller.is_orbiting());
    }

    #[test]
    fn test_mode_entry_priority() {
        let (mut controller, _) = setup();
        controller.press_key(KeyCode::KeyR);
        controller.press_key(KeyCode::Digit1);

        // R wins over 1 for the left button
        assert!(!controller.process_mouse_button(MouseButton::Left, ElementState::Pressed));
        assert!(controller.is_rolling());
        assert!(!controller.is_panning());

        controller.process_mouse_button(MouseButton::Left, ElementState::Released);
        controller.release_key(KeyCode::KeyR);
        controller.process_mouse_button(MouseButton::Left, ElementState::Pressed);
        assert!(controller.is_panning());
        assert!(!controller.is_rolling());

        controller.process_mouse_button(MouseButton::Right, ElementState::Pressed);
        assert!(controller.is_orbiting());
        assert!(controller.is_panning());
    }

    #[test]
    fn test_releases_end_matching_modes() {
        let (mut controller, _) = setup();
        controller.press_key(KeyCode::Digit1);
        controller.process_mouse_button(MouseButton::Left, ElementState::Pressed);
        controller.process_mouse_button(MouseButton::Right, ElementState::Pressed);

        controller.process_mouse_button(MouseButton::Right, ElementState::Released);
        assert!(!controller.is_orbiting());
        assert!(controller.is_panning());

        // Modifier release alone does not end a drag
        controller.release_key(KeyCode::Digit1);
        assert!(controller.is_panning());
        controller.process_mouse_button(MouseButton::Left, ElementState::Released);
        assert!(!controller.is_panning());
    }

    #[test]
    fn test_first_drag_delta_is_zero() {
        let (mut controller, mut camera) = setup();
        move_cursor(&mut controller, 400.0, 300.0);
        controller.sync_cursor();
        move_cursor(&mut controller, 900.0, 300.0);

        controller.press_key(KeyCode::Digit1);
        controller.process_mouse_button(MouseButton::Right, ElementState::Pressed);
        let yaw = camera.yaw;
        controller.update(&mut camera);
        assert_eq!(camera.yaw, yaw);

        move_cursor(&mut controller, 910.0, 300.0);
        controller.update(&mut camera);
        assert!((camera.yaw - (yaw + 2.0)).abs() < 1e-4);
    }

    #[test]
    fn test_constraint_toggle_ignores_repeats() {
        let (mut controller, _) = setup();
        assert!(!controller.bounds.enabled);
        controller.press_key(KeyCode::KeyC);
        controller.press_key(KeyCode::KeyC);
        controller.press_key(KeyCode::KeyC);
        assert!(controller.bounds.enabled);
        controller.release_key(KeyCode::KeyC);
        controller.press_key(KeyCode::KeyC);
        assert!(!controller.bounds.enabled);
    }

    #[test]
    fn test_clamp_stage_confines_position() {
        let (mut controller, mut camera) = setup();
        controller.press_key(KeyCode::KeyC);
        camera.position = Vector3::new(80.0, -70.0, 10.0);
        controller.update(&mut camera);
        assert_eq!(camera.position, Vector3::new(50.0, -50.0, 10.0));
        assert!((camera.target - (camera.position + camera.front)).magnitude() < 1e-5);
    }

    #[test]
    fn test_keys_add_independently() {
        let (mut controller, mut camera) = setup();
        controller.press_key(KeyCode::Space);
        controller.press_key(KeyCode::KeyE);
        controller.update(&mut camera);
        assert!((camera.position.y - 0.2).abs() < 1e-5);

        controller.press_key(KeyCode::KeyQ);
        controller.press_key(KeyCode::ShiftLeft);
        controller.update(&mut camera);
        // Two up, one down, fast
        assert!((camera.position.y - 0.7).abs() < 1e-5);
    }

    #[test]
    fn test_forward_and_strafe() {
        let (mut controller, mut camera) = setup();
        controller.press_key(KeyCode::KeyW);
        controller.press_key(KeyCode::KeyD);
        controller.update(&mut camera);
        assert!((camera.position - Vector3::new(0.1, 0.0, 4.9)).magnitude() < 1e-5);
    }

    #[test]
    fn test_scroll_zooms_towards_target() {
        let (mut controller, mut camera) = setup();
        controller.process_scroll(&MouseScrollDelta::LineDelta(0.0, 2.0), &mut camera);
        assert!((camera.position - Vector3::new(0.0, 0.0, 4.0)).magnitude() < 1e-5);

        controller.process_scroll(
            &MouseScrollDelta::PixelDelta(PhysicalPosition::new(0.0, -40.0)),
            &mut camera,
        );
        assert!((camera.position - Vector3::new(0.0, 0.0, 5.0)).magnitude() < 1e-5);
    }

    #[test]
    fn test_pitch_stays_clamped_under_large_motion() {
        let (mut controller, mut camera) = setup();
        controller.press_key(KeyCode::Digit1);
        controller.process_mouse_button(MouseButton::Right, ElementState::Pressed);

        move_cursor(&mut controller, 0.0, -1.0e9);
        controller.update(&mut camera);
        assert!(camera.pitch <= 89.0);
        move_cursor(&mut controller, 0.0, 1.0e9);
        controller.update(&mut camera);
        assert!(camera.pitch >= -89.0);
    }

    #[test]
    fn test_basis_stays_orthonormal_under_random_input() {
        let (mut controller, mut camera) = setup();
        let mut rng = StdRng::seed_from_u64(42);
        let keys = [
            KeyCode::KeyW,
            KeyCode::KeyA,
            KeyCode::KeyS,
            KeyCode::KeyD,
            KeyCode::Space,
            KeyCode::KeyQ,
            KeyCode::ShiftLeft,
            KeyCode::KeyC,
        ];
        let (mut x, mut y) = (0.0f64, 0.0f64);

        for _ in 0..2000 {
            match rng.random_range(0..6) {
                0 => {
                    let modifier = if rng.random_bool(0.5) {
                        KeyCode::KeyR
                    } else {
                        KeyCode::Digit1
                    };
                    controller.press_key(modifier);
                    let button = if rng.random_bool(0.5) {
                        MouseButton::Left
                    } else {
                        MouseButton::Right
                    };
                    controller.process_mouse_button(button, ElementState::Pressed);
                    controller.release_key(modifier);
                }
                1 => {
                    let button = if rng.random_bool(0.5) {
                        MouseButton::Left
                    } else {
                        MouseButton::Right
                    };
                    controller.process_mouse_button(button, ElementState::Released);
                }
                2 => {
                    let key = keys[rng.random_range(0..keys.len())];
                    if controller.is_key_held(key) {
                        controller.release_key(key);
                    } else {
                        controller.press_key(key);
                    }
                }
                3 => {
                    let lines = rng.random_range(-3.0..3.0f32);
                    controller.process_scroll(&MouseScrollDelta::LineDelta(0.0, lines), &mut camera);
                }
                _ => {
                    x += rng.random_range(-200.0..200.0);
                    y += rng.random_range(-200.0..200.0);
                    move_cursor(&mut controller, x, y);
                }
            }
            controller.update(&mut camera);

            assert!((camera.front.magnitude() - 1.0).abs() < 1e-3);
            assert!((camera.up.magnitude() - 1.0).abs() < 1e-3);
            assert!(camera.front.dot(camera.up).abs() < 1e-3);
            assert!(camera.pitch >= -89.0 && camera.pitch <= 89.0);
        }
    }

    #[test]
    fn test_bounds_clamp_disabled_is_identity() {
        let bounds = MovementBounds::from_config(&BoundsConfig::default());
        let p = Vector3::new(100.0, 0.0, -100.0);
        assert_eq!(bounds.clamp(p), p);
    }
}
