//! Ray intersection tests
//!
//! Pure geometric functions used by the picker. Both tests return the
//! parametric distance `t` along the ray on a hit, `None` otherwise.

use cgmath::{InnerSpace, Matrix4, SquareMatrix, Vector3, Vector4};

/// Tolerance for the ray/triangle determinant and minimum hit distance
pub const TRIANGLE_EPSILON: f32 = 1e-8;

/// Barycentric result of a ray/triangle hit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriangleHit {
    /// Distance along the ray
    pub t: f32,
    /// Weight of the second vertex
    pub u: f32,
    /// Weight of the third vertex
    pub v: f32,
}

/// Slab test of a world-space ray against a box given in object-local space.
///
/// The ray is moved into the box's space with the inverse of `model`; the
/// origin as a point, the direction as a vector that is then re-normalized.
/// The returned entry distance is therefore measured in local units.
///
/// Returns `None` when any axis interval is empty or the entry distance is
/// negative. That includes boxes entirely behind the origin and origins
/// inside the box.
///
/// A zero direction component divides to ±infinity, which the interval
/// comparisons accept (origin between the slabs) or reject (outside) on
/// their own. An origin lying exactly on a slab plane of such an axis gives
/// `0 / 0 = NaN` and an unspecified result; callers that need that case
/// must nudge the ray themselves.
pub fn intersect_ray_aabb(
    origin: Vector3<f32>,
    direction: Vector3<f32>,
    box_min: Vector3<f32>,
    box_max: Vector3<f32>,
    model: &Matrix4<f32>,
) -> Option<f32> {
    let inverse = model.invert()?;
    let local_origin = (inverse * origin.extend(1.0)).truncate();
    let local_direction = (inverse * direction.extend(0.0)).truncate().normalize();

    slab_entry(local_origin, local_direction, box_min, box_max)
}

/// Slab test with the ray already in the box's space.
pub(crate) fn slab_entry(
    origin: Vector3<f32>,
    direction: Vector3<f32>,
    box_min: Vector3<f32>,
    box_max: Vector3<f32>,
) -> Option<f32> {
    let mut t_enter = f32::NEG_INFINITY;
    let mut t_exit = f32::INFINITY;

    for axis in 0..3 {
        let mut t0 = (box_min[axis] - origin[axis]) / direction[axis];
        let mut t1 = (box_max[axis] - origin[axis]) / direction[axis];
        if t0 > t1 {
            std::mem::swap(&mut t0, &mut t1);
        }

        if t_enter > t1 || t0 > t_exit {
            return None;
        }
        if t0 > t_enter {
            t_enter = t0;
        }
        if t1 < t_exit {
            t_exit = t1;
        }
    }

    if t_enter >= 0.0 {
        Some(t_enter)
    } else {
        None
    }
}

/// Möller–Trumbore ray/triangle test returning the hit distance.
pub fn intersect_ray_triangle(
    origin: Vector3<f32>,
    direction: Vector3<f32>,
    v0: Vector3<f32>,
    v1: Vector3<f32>,
    v2: Vector3<f32>,
) -> Option<f32> {
    intersect_ray_triangle_barycentric(origin, direction, v0, v1, v2).map(|hit| hit.t)
}

/// Möller–Trumbore ray/triangle test returning distance and barycentrics.
///
/// Rays parallel to the triangle plane (`|det| < ε`) never hit, and hits
/// closer than `ε` to the origin are rejected.
pub fn intersect_ray_triangle_barycentric(
    origin: Vector3<f32>,
    direction: Vector3<f32>,
    v0: Vector3<f32>,
    v1: Vector3<f32>,
    v2: Vector3<f32>,
) -> Option<TriangleHit> {
    let edge1 = v1 - v0;
    let edge2 = v2 - v0;
    let h = direction.cross(edge2);
    let det = edge1.dot(h);

    if det.abs() < TRIANGLE_EPSILON {
        return None;
    }

    let f = 1.0 / det;
    let s = origin - v0;
    let u = f * s.dot(h);
    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let q = s.cross(edge1);
    let v = f * direction.dot(q);
    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = f * edge2.dot(q);
    if t > TRIANGLE_EPSILON {
        Some(TriangleHit { t, u, v })
    } else {
        None
    }
}

/// Transforms a point by a 4x4 matrix, dropping `w`.
pub(crate) fn transform_point(matrix: &Matrix4<f32>, point: Vector3<f32>) -> Vector3<f32> {
    let p: Vector4<f32> = matrix * point.extend(1.0);
    p.truncate()
}
