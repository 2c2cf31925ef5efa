//! # Object Picking System
//!
//! Mouse ray-casting against the scene's CPU mesh data.
//!
//! ## How it works
//!
//! 1. **Mouse to Ray**: the cursor is unprojected through the inverse
//!    projection and view matrices into a world-space direction
//! 2. **Bounding box pre-pass**: objects the ray cannot reach are skipped
//! 3. **Triangle scan**: every triangle, moved to world space, is tested and
//!    the nearest hit over all objects wins
//!
//! ## Usage
//!
//! ```no_run
//! use meshpick::gfx::picking::{screen_to_ray, ObjectPicker, Ray};
//! # fn demo(camera: &meshpick::gfx::camera::FlyCamera, scene: &mut meshpick::gfx::scene::Scene) {
//! let direction = screen_to_ray(
//!     (400.0, 300.0),
//!     (800.0, 600.0),
//!     &camera.projection_matrix(),
//!     &camera.view_matrix(),
//! );
//! let picker = ObjectPicker::new(true);
//! picker.pick_and_select(&Ray::new(camera.position, direction), scene);
//! # }
//! ```

pub mod intersection;

use cgmath::{InnerSpace, Matrix4, SquareMatrix, Vector3, Vector4};

use crate::gfx::scene::{Scene, SceneObject};
use intersection::{intersect_ray_aabb, intersect_ray_triangle, transform_point};

/// A 3D ray for intersection testing
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    /// Ray origin point in world space
    pub origin: Vector3<f32>,
    /// Ray direction (normalized)
    pub direction: Vector3<f32>,
}

impl Ray {
    pub fn new(origin: Vector3<f32>, direction: Vector3<f32>) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
        }
    }

    /// Get a point along the ray at distance t
    pub fn point_at(&self, t: f32) -> Vector3<f32> {
        self.origin + self.direction * t
    }
}

/// Result of an object picking operation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickResult {
    /// Index of the picked object in the scene
    pub object_index: usize,
    /// Distance from the ray origin to the intersection point
    pub distance: f32,
    /// World space intersection point
    pub intersection_point: Vector3<f32>,
}

/// Unit world-space direction through a cursor position.
///
/// `cursor` and `viewport` are in the same pixel units, origin top-left.
/// `projection` must be the OpenGL-convention matrix (near plane at clip
/// z = -1). Both matrices must be invertible; a singular matrix trips a
/// debug assertion and otherwise gives an undefined direction.
pub fn screen_to_ray(
    cursor: (f32, f32),
    viewport: (f32, f32),
    projection: &Matrix4<f32>,
    view: &Matrix4<f32>,
) -> Vector3<f32> {
    let (mouse_x, mouse_y) = cursor;
    let (width, height) = viewport;

    let ndc_x = (2.0 * mouse_x) / width - 1.0;
    let ndc_y = 1.0 - (2.0 * mouse_y) / height;
    let clip = Vector4::new(ndc_x, ndc_y, -1.0, 1.0);

    let inverse_projection = projection.invert();
    debug_assert!(inverse_projection.is_some(), "singular projection matrix");
    let eye = inverse_projection.unwrap_or_else(Matrix4::identity) * clip;
    let eye = Vector4::new(eye.x, eye.y, -1.0, 0.0);

    let inverse_view = view.invert();
    debug_assert!(inverse_view.is_some(), "singular view matrix");
    let world = inverse_view.unwrap_or_else(Matrix4::identity) * eye;

    world.truncate().normalize()
}

/// Nearest-hit resolver over the scene objects.
#[derive(Debug, Clone, Copy)]
pub struct ObjectPicker {
    /// Skip objects whose bounding box the ray cannot reach
    pub aabb_prepass: bool,
}

impl Default for ObjectPicker {
    fn default() -> Self {
        Self::new(true)
    }
}

impl ObjectPicker {
    pub fn new(aabb_prepass: bool) -> Self {
        Self { aabb_prepass }
    }

    /// Finds the nearest object hit by `ray`.
    ///
    /// On equal distances the object earlier in the list wins.
    pub fn pick(&self, ray: &Ray, scene: &Scene) -> Option<PickResult> {
        let mut closest: Option<PickResult> = None;

        for (index, object) in scene.objects.iter().enumerate() {
            if self.aabb_prepass && !Self::may_hit(ray, object) {
                continue;
            }

            let Some(distance) = Self::nearest_triangle_hit(ray, object) else {
                continue;
            };

            if closest.map_or(true, |best| distance < best.distance) {
                closest = Some(PickResult {
                    object_index: index,
                    distance,
                    intersection_point: ray.point_at(distance),
                });
            }
        }

        closest
    }

    /// Picks and stores the outcome in the scene's selection; a miss clears
    /// it.
    pub fn pick_and_select(&self, ray: &Ray, scene: &mut Scene) -> Option<PickResult> {
        let result = self.pick(ray, scene);
        match result {
            Some(hit) => {
                scene.select(Some(hit.object_index));
                log::info!(
                    "Selected '{}' at distance {:.3}",
                    scene.objects[hit.object_index].name,
                    hit.distance
                );
                log::debug!("Pick hit point {:?}", hit.intersection_point);
            }
            None => {
                scene.select(None);
                log::debug!("Pick missed, selection cleared");
            }
        }
        result
    }

    /// Bounding box rejection test. Only answers `false` when the ray
    /// provably misses the object's local box.
    fn may_hit(ray: &Ray, object: &SceneObject) -> bool {
        let Some((min, max)) = object.mesh.local_bounds() else {
            return false;
        };
        let model = object.model_matrix();
        let Some(inverse) = model.invert() else {
            return true;
        };

        let local_origin = transform_point(&inverse, ray.origin);
        let inside =
            (0..3).all(|axis| local_origin[axis] >= min[axis] && local_origin[axis] <= max[axis]);
        inside || intersect_ray_aabb(ray.origin, ray.direction, min, max, &model).is_some()
    }

    fn nearest_triangle_hit(ray: &Ray, object: &SceneObject) -> Option<f32> {
        let model = object.model_matrix();
        object
            .mesh
            .triangles()
            .filter_map(|[v0, v1, v2]| {
                intersect_ray_triangle(
                    ray.origin,
                    ray.direction,
                    transform_point(&model, v0),
                    transform_point(&model, v1),
                    transform_point(&model, v2),
                )
            })
            .fold(None, |best: Option<f32>, t| match best {
                Some(b) if b <= t => Some(b),
                _ => Some(t),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CameraConfig;
    use crate::gfx::camera::FlyCamera;
    use crate::gfx::scene::{MeshData, Transform};
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn triangle_at_z(name: &str, z: f32) -> MeshData {
        MeshData::new(
            name,
            &[-1.0, -1.0, z, 1.0, -1.0, z, 0.0, 1.0, z],
            &[],
            &[0, 1, 2],
        )
    }

    fn toward_negative_z() -> Ray {
        Ray::new(Vector3::new(0.0, 0.0, 5.0), Vector3::new(0.0, 0.0, -1.0))
    }

    #[test]
    fn test_center_pixel_ray_is_camera_forward() {
        let camera = FlyCamera::new(&CameraConfig::default(), 800.0 / 600.0);
        let direction = screen_to_ray(
            (400.0, 300.0),
            (800.0, 600.0),
            &camera.projection_matrix(),
            &camera.view_matrix(),
        );
        assert!((direction - camera.front).magnitude() < 1e-5);
    }

    #[test]
    fn test_center_ray_follows_rotated_camera() {
        let mut camera = FlyCamera::new(&CameraConfig::default(), 1.0);
        camera.orbit(137.0, -42.0, 0.2);
        camera.roll(30.0);
        let direction = screen_to_ray(
            (256.0, 256.0),
            (512.0, 512.0),
            &camera.projection_matrix(),
            &camera.view_matrix(),
        );
        assert!((direction - camera.front).magnitude() < 1e-4);
    }

    #[test]
    fn test_corner_rays_match_field_of_view() {
        let camera = FlyCamera::new(&CameraConfig::default(), 1.0);
        let top = screen_to_ray(
            (50.0, 0.0),
            (100.0, 100.0),
            &camera.projection_matrix(),
            &camera.view_matrix(),
        );
        // Top edge of a 45 degree vertical fov is 22.5 degrees above forward
        let angle = top.dot(camera.front).acos().to_degrees();
        assert!((angle - 22.5).abs() < 1e-3);
        assert!(top.y > 0.0);

        let right = screen_to_ray(
            (100.0, 50.0),
            (100.0, 100.0),
            &camera.projection_matrix(),
            &camera.view_matrix(),
        );
        assert!(right.x > 0.0);
    }

    #[test]
    fn test_nearest_object_wins_regardless_of_order() {
        for order in [[-1.0, -3.0], [-3.0, -1.0]] {
            let mut scene = Scene::new();
            scene.add_object(triangle_at_z("first", order[0]));
            scene.add_object(triangle_at_z("second", order[1]));

            let hit = ObjectPicker::default().pick(&toward_negative_z(), &scene).unwrap();
            let expected = if order[0] == -1.0 { 0 } else { 1 };
            assert_eq!(hit.object_index, expected);
            assert!((hit.distance - 6.0).abs() < 1e-5);
            assert!((hit.intersection_point - Vector3::new(0.0, 0.0, -1.0)).magnitude() < 1e-5);
        }
    }

    #[test]
    fn test_only_object_in_path_is_picked() {
        let mut scene = Scene::new();
        scene.add_object(triangle_at_z("a", 0.0));
        let b = scene.add_object(triangle_at_z("b", 0.0));
        scene.objects[1].transform.position = Vector3::new(10.0, 0.0, 0.0);

        let hit = ObjectPicker::default().pick(&toward_negative_z(), &scene).unwrap();
        assert_eq!(hit.object_index, 0);
        assert_ne!(scene.objects[hit.object_index].id, b);
    }

    #[test]
    fn test_equal_distance_goes_to_earlier_object() {
        let mut scene = Scene::new();
        scene.add_object(triangle_at_z("a", 0.0));
        scene.add_object(triangle_at_z("b", 0.0));
        let hit = ObjectPicker::default().pick(&toward_negative_z(), &scene).unwrap();
        assert_eq!(hit.object_index, 0);
    }

    #[test]
    fn test_miss_clears_selection() {
        let mut scene = Scene::new();
        scene.add_object(triangle_at_z("a", 0.0));
        let picker = ObjectPicker::default();

        assert!(picker.pick_and_select(&toward_negative_z(), &mut scene).is_some());
        assert_eq!(scene.selected_index(), Some(0));

        let away = Ray::new(Vector3::new(0.0, 0.0, 5.0), Vector3::new(0.0, 0.0, 1.0));
        assert!(picker.pick_and_select(&away, &mut scene).is_none());
        assert_eq!(scene.selected_index(), None);
    }

    #[test]
    fn test_transform_is_applied_to_triangles() {
        let mut scene = Scene::new();
        scene.add_object(triangle_at_z("a", 0.0));
        scene.objects[0].transform = Transform {
            position: Vector3::new(5.0, 0.0, 0.0),
            rotation: Vector3::new(0.0, 90.0, 0.0),
            scale: Vector3::new(2.0, 2.0, 2.0),
        };

        // The triangle now stands in the plane x = 5, facing +X
        let ray = Ray::new(Vector3::new(10.0, 0.0, 0.0), Vector3::new(-1.0, 0.0, 0.0));
        let hit = ObjectPicker::default().pick(&ray, &scene).unwrap();
        assert!((hit.distance - 5.0).abs() < 1e-4);
        assert!(ObjectPicker::default().pick(&toward_negative_z(), &scene).is_none());
    }

    #[test]
    fn test_prepass_keeps_objects_around_the_origin() {
        // The ray starts inside the mesh bounds
        let mut scene = Scene::new();
        scene.add_object(MeshData::new(
            "wall",
            &[-1.0, -1.0, -2.0, 1.0, -1.0, -2.0, 0.0, 1.0, -2.0, 0.0, 0.0, 2.0],
            &[],
            &[0, 1, 2, 0, 1, 3],
        ));
        let ray = Ray::new(Vector3::new(0.0, 0.0, 0.0), Vector3::new(0.0, 0.0, -1.0));
        let hit = ObjectPicker::new(true).pick(&ray, &scene);
        assert!(hit.is_some());
    }

    #[test]
    fn test_prepass_does_not_change_results() {
        let mut rng = StdRng::seed_from_u64(99);
        let mut scene = Scene::new();
        for i in 0..12 {
            let z = rng.random_range(-10.0..2.0);
            scene.add_object(triangle_at_z(&format!("t{i}"), z));
            let object = scene.objects.last_mut().unwrap();
            object.transform.position =
                Vector3::new(rng.random_range(-3.0..3.0), rng.random_range(-3.0..3.0), 0.0);
            object.transform.rotation = Vector3::new(
                rng.random_range(-60.0..60.0),
                rng.random_range(-60.0..60.0),
                rng.random_range(0.0..360.0),
            );
        }

        for _ in 0..200 {
            let origin = Vector3::new(
                rng.random_range(-4.0..4.0),
                rng.random_range(-4.0..4.0),
                rng.random_range(3.0..8.0),
            );
            let target = Vector3::new(
                rng.random_range(-4.0..4.0),
                rng.random_range(-4.0..4.0),
                rng.random_range(-10.0..0.0),
            );
            let ray = Ray::new(origin, target - origin);
            let with = ObjectPicker::new(true).pick(&ray, &scene);
            let without = ObjectPicker::new(false).pick(&ray, &scene);
            assert_eq!(with.map(|h| h.object_index), without.map(|h| h.object_index));
        }
    }

    #[test]
    fn test_empty_scene_picks_nothing() {
        let scene = Scene::new();
        assert!(ObjectPicker::default().pick(&toward_negative_z(), &scene).is_none());
    }
}
