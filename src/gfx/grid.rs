//! Ground grid in the XZ plane with a distance-driven cell size.

use cgmath::{InnerSpace, Vector3};

use crate::config::GridConfig;
use crate::gfx::scene::GridVertex;

/// Cell size for a camera `distance` from the origin:
/// `base * distance / reference`, clamped to `[base, max]`.
pub fn grid_scale(distance: f32, base_scale: f32, max_scale: f32, reference_distance: f32) -> f32 {
    (base_scale * distance / reference_distance).clamp(base_scale, max_scale)
}

/// Line list of `2 * half_lines + 1` lines along each axis, `scale` apart.
///
/// The two lines through the origin use `main_color`.
pub fn build_grid_lines(
    scale: f32,
    half_lines: u32,
    main_color: [f32; 3],
    secondary_color: [f32; 3],
) -> Vec<GridVertex> {
    let n = i64::from(half_lines);
    let extent = n as f32 * scale;
    let mut vertices = Vec::with_capacity((2 * half_lines as usize + 1) * 4);

    for i in -n..=n {
        let offset = i as f32 * scale;
        let color = if i == 0 { main_color } else { secondary_color };

        // Parallel to X
        vertices.push(GridVertex {
            position: [-extent, 0.0, offset],
            color,
        });
        vertices.push(GridVertex {
            position: [extent, 0.0, offset],
            color,
        });
        // Parallel to Z
        vertices.push(GridVertex {
            position: [offset, 0.0, -extent],
            color,
        });
        vertices.push(GridVertex {
            position: [offset, 0.0, extent],
            color,
        });
    }

    vertices
}

/// CPU side of the ground grid and the scale it was built with.
#[derive(Debug, Clone)]
pub struct GroundGrid {
    pub scale: f32,
    pub vertices: Vec<GridVertex>,
}

impl GroundGrid {
    pub fn new(config: &GridConfig, camera_position: Vector3<f32>) -> Self {
        let scale = Self::scale_for(config, camera_position);
        Self {
            scale,
            vertices: Self::lines(config, scale),
        }
    }

    /// Rebuilds the lines when adaptive sizing is on and the scale moved.
    /// Returns `true` if the vertices changed.
    pub fn update(&mut self, config: &GridConfig, camera_position: Vector3<f32>) -> bool {
        if !config.adaptive {
            return false;
        }
        let scale = Self::scale_for(config, camera_position);
        if (scale - self.scale).abs() <= f32::EPSILON * self.scale.max(1.0) {
            return false;
        }
        log::debug!("Grid scale {} -> {}", self.scale, scale);
        self.scale = scale;
        self.vertices = Self::lines(config, scale);
        true
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertices.len() as u32
    }

    fn scale_for(config: &GridConfig, camera_position: Vector3<f32>) -> f32 {
        grid_scale(
            camera_position.magnitude(),
            config.base_scale,
            config.max_scale,
            config.reference_distance,
        )
    }

    fn lines(config: &GridConfig, scale: f32) -> Vec<GridVertex> {
        build_grid_lines(
            scale,
            config.half_lines,
            config.main_line_color,
            config.secondary_line_color,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_clamps_to_base_and_max() {
        assert_eq!(grid_scale(0.0, 1.0, 10.0, 10.0), 1.0);
        assert_eq!(grid_scale(5.0, 1.0, 10.0, 10.0), 1.0);
        assert_eq!(grid_scale(35.0, 1.0, 10.0, 10.0), 3.5);
        assert_eq!(grid_scale(1000.0, 1.0, 10.0, 10.0), 10.0);
    }

    #[test]
    fn test_scale_is_monotonic_in_distance() {
        let mut previous = 0.0;
        for step in 0..500 {
            let scale = grid_scale(step as f32 * 0.5, 1.0, 10.0, 10.0);
            assert!(scale >= previous);
            previous = scale;
        }
    }

    #[test]
    fn test_line_count() {
        let vertices = build_grid_lines(1.0, 100, [0.0; 3], [0.5; 3]);
        // 201 lines per axis, two vertices each
        assert_eq!(vertices.len(), 201 * 2 * 2);
        assert!(vertices.iter().all(|v| v.position[1] == 0.0));
    }

    #[test]
    fn test_axis_lines_use_main_color() {
        let main = [1.0, 0.0, 0.0];
        let vertices = build_grid_lines(2.0, 3, main, [0.5; 3]);
        let main_count = vertices.iter().filter(|v| v.color == main).count();
        assert_eq!(main_count, 4);
        assert!(vertices
            .iter()
            .filter(|v| v.color == main)
            .all(|v| v.position[0] == 0.0 || v.position[2] == 0.0));
        assert!(vertices.iter().any(|v| v.position[0] == 6.0));
    }

    #[test]
    fn test_zero_half_lines_keeps_axis_lines() {
        let vertices = build_grid_lines(1.0, 0, [1.0; 3], [0.5; 3]);
        assert_eq!(vertices.len(), 4);
        assert!(vertices.iter().all(|v| v.position == [0.0, 0.0, 0.0]));
    }

    #[test]
    fn test_largest_allowed_grid_builds() {
        let half_lines = crate::config::MAX_GRID_HALF_LINES;
        let vertices = build_grid_lines(1.0, half_lines, [0.0; 3], [0.5; 3]);
        assert_eq!(vertices.len(), (2 * half_lines as usize + 1) * 4);
        assert!(vertices.iter().any(|v| v.position[0] == half_lines as f32));
    }

    #[test]
    fn test_static_grid_never_rebuilds() {
        let config = GridConfig::default();
        let mut grid = GroundGrid::new(&config, Vector3::new(0.0, 0.0, 5.0));
        assert_eq!(grid.scale, 1.0);
        assert!(!grid.update(&config, Vector3::new(0.0, 0.0, 80.0)));
        assert_eq!(grid.scale, 1.0);
    }

    #[test]
    fn test_adaptive_grid_rebuilds_on_scale_change() {
        let config = GridConfig {
            adaptive: true,
            half_lines: 4,
            ..Default::default()
        };
        let mut grid = GroundGrid::new(&config, Vector3::new(0.0, 0.0, 5.0));
        assert!(!grid.update(&config, Vector3::new(0.0, 0.0, 8.0)));
        assert!(grid.update(&config, Vector3::new(0.0, 0.0, 40.0)));
        assert_eq!(grid.scale, 4.0);
        assert_eq!(grid.vertex_count(), 9 * 4);
    }
}
