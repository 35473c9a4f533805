//! Camera state for view matrix generation
//!
//! A camera is plain data: a world-space position and an orientation given
//! as per-axis rotation angles in degrees. The transform pipeline turns it
//! into a view matrix, including the fixed axis realignment between the
//! Z-up world convention and the Y-up viewing convention.

use crate::foundation::math::Vec3;

/// Viewpoint in the Z-up world
///
/// Orientation angles rotate about the camera's local axes: X is roll,
/// Y is pitch, Z is yaw. All angles are in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    /// World-space position
    pub position: Vec3,
    /// Per-axis rotation angles in degrees (x = roll, y = pitch, z = yaw)
    pub orientation_degrees: Vec3,
}

impl Camera {
    /// Camera at the world origin with no rotation
    pub fn new() -> Self {
        Self {
            position: Vec3::zeros(),
            orientation_degrees: Vec3::zeros(),
        }
    }

    /// Builder method to set the position
    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    /// Builder method to set the orientation angles in degrees
    pub fn with_orientation_degrees(mut self, orientation: Vec3) -> Self {
        self.orientation_degrees = orientation;
        self
    }

    /// Move the camera by a world-space offset
    pub fn translate(&mut self, offset: Vec3) {
        self.position += offset;
    }

    /// Add to the orientation angles, in degrees
    pub fn rotate_degrees(&mut self, delta: Vec3) {
        self.orientation_degrees += delta;
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camera_starts_at_origin() {
        let camera = Camera::new();
        assert_eq!(camera.position, Vec3::zeros());
        assert_eq!(camera.orientation_degrees, Vec3::zeros());
    }

    #[test]
    fn test_translate_accumulates() {
        let mut camera = Camera::new().with_position(Vec3::new(1.0, 0.0, 0.0));
        camera.translate(Vec3::new(0.0, 2.0, 3.0));
        assert_eq!(camera.position, Vec3::new(1.0, 2.0, 3.0));
    }
}
