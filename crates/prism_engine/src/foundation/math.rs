//! Math utilities and types
//!
//! Provides the fundamental math types for 3D graphics plus the closed-form
//! matrix constructors the transform pipeline is built on. Every constructor
//! fills the matrix entries directly from its formula rather than composing
//! intermediate matrices, so the numeric results are reproducible across
//! backends.

pub use nalgebra::{Matrix3, Matrix4, Unit, Vector2, Vector3, Vector4};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 3x3 matrix type
pub type Mat3 = Matrix3<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// Math constants
pub mod constants {
    /// Pi constant
    pub const PI: f32 = std::f32::consts::PI;

    /// Degrees to radians conversion factor
    pub const DEG_TO_RAD: f32 = PI / 180.0;

    /// Radians to degrees conversion factor
    pub const RAD_TO_DEG: f32 = 180.0 / PI;
}

/// Math utility functions
pub mod utils {
    use super::constants;

    /// Convert degrees to radians
    pub fn deg_to_rad(degrees: f32) -> f32 {
        degrees * constants::DEG_TO_RAD
    }

    /// Convert radians to degrees
    pub fn rad_to_deg(radians: f32) -> f32 {
        radians * constants::RAD_TO_DEG
    }
}

/// Create a translation matrix
pub fn translation(offset: Vec3) -> Mat4 {
    Mat4::new(
        1.0, 0.0, 0.0, offset.x,
        0.0, 1.0, 0.0, offset.y,
        0.0, 0.0, 1.0, offset.z,
        0.0, 0.0, 0.0, 1.0,
    )
}

/// Create a nonuniform scaling matrix
pub fn scaling(factors: Vec3) -> Mat4 {
    Mat4::new(
        factors.x, 0.0, 0.0, 0.0,
        0.0, factors.y, 0.0, 0.0,
        0.0, 0.0, factors.z, 0.0,
        0.0, 0.0, 0.0, 1.0,
    )
}

/// Create a rotation matrix about an arbitrary axis using the Rodrigues
/// formula
///
/// The matrix is assembled from the cos(theta), 1 - cos(theta) and
/// sin(theta) terms directly. The axis is normalized internally; a zero
/// axis yields the identity rotation.
///
/// # Arguments
/// * `axis` - Rotation axis in world space (need not be normalized)
/// * `degrees` - Rotation angle in degrees, right-handed about the axis
pub fn rotation_about_axis_degrees(axis: Vec3, degrees: f32) -> Mat4 {
    let length = axis.magnitude();
    if length <= f32::EPSILON {
        return Mat4::identity();
    }
    let axis = axis / length;
    let (x, y, z) = (axis.x, axis.y, axis.z);

    let radians = utils::deg_to_rad(degrees);
    let c = radians.cos();
    let s = radians.sin();
    let t = 1.0 - c;

    Mat4::new(
        t * x * x + c,      t * x * y - s * z,  t * x * z + s * y,  0.0,
        t * x * y + s * z,  t * y * y + c,      t * y * z - s * x,  0.0,
        t * x * z - s * y,  t * y * z + s * x,  t * z * z + c,      0.0,
        0.0,                0.0,                0.0,                1.0,
    )
}

/// Fixed axis realignment converting Z-up world axes to Y-up camera axes
///
/// Composed as a +90 degree Z rotation followed by a -90 degree X rotation.
/// The result maps engine world axes onto view axes:
/// - world +X (forward) -> view -Z
/// - world +Y (left)    -> view -X
/// - world +Z (up)      -> view +Y
///
/// Every view matrix ends with this realignment; leaving it out rotates the
/// whole scene about the wrong axis.
pub fn axis_realignment() -> Mat4 {
    rotation_about_axis_degrees(Vec3::x(), -90.0) * rotation_about_axis_degrees(Vec3::z(), 90.0)
}

/// Create an orthographic projection matrix from its closed-form expression
///
/// The scale and translation terms are written out directly; the mapping
/// ranges match the source system this layer reproduces, not the usual GL
/// convention. Near/far are not validated in release builds.
pub fn orthographic_projection(
    left: f32,
    right: f32,
    bottom: f32,
    top: f32,
    near: f32,
    far: f32,
) -> Mat4 {
    debug_assert!((right - left).abs() > f32::EPSILON, "degenerate ortho width");
    debug_assert!((top - bottom).abs() > f32::EPSILON, "degenerate ortho height");
    debug_assert!((far - near).abs() > f32::EPSILON, "degenerate ortho depth");

    let width = right - left;
    let height = top - bottom;
    let depth = far - near;

    Mat4::new(
        4.0 / width, 0.0, 0.0, -2.0 * (right + left) / width,
        0.0, 4.0 / height, 0.0, -2.0 * (top + bottom) / height,
        0.0, 0.0, -2.0 / depth, -2.0 * near / depth,
        0.0, 0.0, 0.0, 1.0,
    )
}

/// Create a perspective projection matrix from its closed-form expression
///
/// `horizontal_fov_degrees` is the full horizontal field of view. The aspect
/// ratio multiplies the vertical scale term, not the horizontal one; the
/// downstream backends rely on that placement when consuming the matrix.
pub fn perspective_projection(
    horizontal_fov_degrees: f32,
    aspect: f32,
    near: f32,
    far: f32,
) -> Mat4 {
    debug_assert!((far - near).abs() > f32::EPSILON, "degenerate depth range");
    debug_assert!(horizontal_fov_degrees > 0.0, "non-positive field of view");

    let inv_tan = 1.0 / (utils::deg_to_rad(horizontal_fov_degrees) * 0.5).tan();
    let depth = far - near;

    Mat4::new(
        inv_tan, 0.0, 0.0, 0.0,
        0.0, inv_tan * aspect, 0.0, 0.0,
        0.0, 0.0, -(far + near) / depth, -2.0 * far * near / depth,
        0.0, 0.0, -1.0, 0.0,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_rotation_about_axis_matches_basis_rotations() {
        // 90 degrees about Z maps +X onto +Y
        let rot = rotation_about_axis_degrees(Vec3::z(), 90.0);
        let rotated = rot.transform_vector(&Vec3::x());
        assert_relative_eq!(rotated.x, 0.0, epsilon = 1e-6);
        assert_relative_eq!(rotated.y, 1.0, epsilon = 1e-6);
        assert_relative_eq!(rotated.z, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_rotation_about_zero_axis_is_identity() {
        let rot = rotation_about_axis_degrees(Vec3::zeros(), 45.0);
        assert_eq!(rot, Mat4::identity());
    }

    #[test]
    fn test_axis_realignment_maps_world_axes_to_view_axes() {
        let realign = axis_realignment();

        let forward = realign.transform_vector(&Vec3::x());
        assert_relative_eq!(forward.x, 0.0, epsilon = 1e-6);
        assert_relative_eq!(forward.y, 0.0, epsilon = 1e-6);
        assert_relative_eq!(forward.z, -1.0, epsilon = 1e-6);

        let up = realign.transform_vector(&Vec3::z());
        assert_relative_eq!(up.x, 0.0, epsilon = 1e-6);
        assert_relative_eq!(up.y, 1.0, epsilon = 1e-6);
        assert_relative_eq!(up.z, 0.0, epsilon = 1e-6);

        let left = realign.transform_vector(&Vec3::y());
        assert_relative_eq!(left.x, -1.0, epsilon = 1e-6);
        assert_relative_eq!(left.y, 0.0, epsilon = 1e-6);
        assert_relative_eq!(left.z, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_orthographic_unit_cube_scale_terms() {
        let ortho = orthographic_projection(-1.0, 1.0, -1.0, 1.0, 0.0, 1.0);
        assert_relative_eq!(ortho[(0, 0)], 2.0);
        assert_relative_eq!(ortho[(1, 1)], 2.0);
        assert_relative_eq!(ortho[(2, 2)], -2.0);
        assert_relative_eq!(ortho[(0, 3)], 0.0);
        assert_relative_eq!(ortho[(1, 3)], 0.0);
        assert_relative_eq!(ortho[(2, 3)], 0.0);
        assert_relative_eq!(ortho[(3, 3)], 1.0);
    }

    #[test]
    fn test_perspective_aspect_scales_vertical_term() {
        let proj = perspective_projection(90.0, 2.0, 0.1, 100.0);
        // tan(45 deg) == 1, so the horizontal scale is 1 and the vertical
        // scale carries the aspect ratio
        assert_relative_eq!(proj[(0, 0)], 1.0, epsilon = 1e-6);
        assert_relative_eq!(proj[(1, 1)], 2.0, epsilon = 1e-6);
        assert_relative_eq!(proj[(3, 2)], -1.0);
        assert_relative_eq!(proj[(3, 3)], 0.0);
    }
}
