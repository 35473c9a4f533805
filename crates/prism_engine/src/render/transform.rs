//! Transform pipeline: model matrix stack, view, and projection
//!
//! The model matrix is managed as a stack of world transforms so nested
//! scene traversal can push, mutate, and pop without recomputing parent
//! transforms. The stack always holds at least its base entry; attempting
//! to pop that base is a fatal programming error.
//!
//! World-space operations left-multiply the top entry, so each call is
//! applied after everything already accumulated there.

use crate::foundation::math::{self, Mat4, Vec3};
use crate::render::backend::UniformValue;
use crate::render::camera::Camera;
use crate::render::error::fatal;

/// Stack of model matrices for hierarchical scene traversal
#[derive(Debug, Clone)]
pub struct MatrixStack {
    entries: Vec<Mat4>,
}

impl MatrixStack {
    /// Stack holding a single identity entry
    pub fn new() -> Self {
        Self {
            entries: vec![Mat4::identity()],
        }
    }

    /// Current top of the stack
    pub fn top(&self) -> &Mat4 {
        // The base entry is never removed
        self.entries.last().unwrap_or_else(|| unreachable!())
    }

    /// Duplicate the top entry
    pub fn push(&mut self) {
        let top = *self.top();
        self.entries.push(top);
    }

    /// Discard the top entry, restoring the previous one
    ///
    /// Popping the base entry is fatal: it means a traversal popped more
    /// than it pushed.
    pub fn pop(&mut self) {
        if self.entries.len() == 1 {
            fatal(
                "Matrix stack underflow",
                "attempted to pop the base entry of the model matrix stack",
            );
        }
        self.entries.pop();
    }

    /// Replace the top entry with the identity matrix
    pub fn load_identity(&mut self) {
        *self.top_mut() = Mat4::identity();
    }

    /// Replace the top entry with the given matrix
    pub fn load(&mut self, matrix: Mat4) {
        *self.top_mut() = matrix;
    }

    /// Apply a world-space translation to the top entry
    pub fn translate(&mut self, offset: Vec3) {
        self.apply(math::translation(offset));
    }

    /// Apply a world-space rotation about an arbitrary axis to the top entry
    pub fn rotate_degrees(&mut self, axis: Vec3, degrees: f32) {
        self.apply(math::rotation_about_axis_degrees(axis, degrees));
    }

    /// Apply a world-space scale to the top entry
    pub fn scale(&mut self, factors: Vec3) {
        self.apply(math::scaling(factors));
    }

    /// Left-multiply a matrix onto the top entry
    pub fn apply(&mut self, matrix: Mat4) {
        let top = self.top_mut();
        *top = matrix * *top;
    }

    /// Number of entries currently on the stack (always at least 1)
    pub fn depth(&self) -> usize {
        self.entries.len()
    }

    fn top_mut(&mut self) -> &mut Mat4 {
        self.entries.last_mut().unwrap_or_else(|| unreachable!())
    }
}

impl Default for MatrixStack {
    fn default() -> Self {
        Self::new()
    }
}

/// Active projection, tagged by kind
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Projection {
    /// Orthographic projection with explicit volume bounds
    Orthographic {
        left: f32,
        right: f32,
        bottom: f32,
        top: f32,
        near: f32,
        far: f32,
    },
    /// Perspective projection from a horizontal field of view
    Perspective {
        horizontal_fov_degrees: f32,
        aspect: f32,
        near: f32,
        far: f32,
    },
}

/// Complete transform state handed to materials at draw time
///
/// Owns the model matrix stack plus the view and projection matrices. The
/// three matrices flow into every applied material as the standard
/// `u_modelMatrix`, `u_viewMatrix` and `u_projectionMatrix` uniforms.
#[derive(Debug, Clone)]
pub struct TransformPipeline {
    model: MatrixStack,
    view: Mat4,
    projection: Mat4,
    projection_kind: Option<Projection>,
}

impl TransformPipeline {
    /// Pipeline with identity view and projection
    pub fn new() -> Self {
        Self {
            model: MatrixStack::new(),
            view: Mat4::identity(),
            projection: Mat4::identity(),
            projection_kind: None,
        }
    }

    /// Model matrix stack
    pub fn model(&self) -> &MatrixStack {
        &self.model
    }

    /// Mutable model matrix stack
    pub fn model_mut(&mut self) -> &mut MatrixStack {
        &mut self.model
    }

    /// Current view matrix
    pub fn view(&self) -> &Mat4 {
        &self.view
    }

    /// Current projection matrix
    pub fn projection(&self) -> &Mat4 {
        &self.projection
    }

    /// Kind of the active projection, if one has been set
    pub fn projection_kind(&self) -> Option<Projection> {
        self.projection_kind
    }

    /// Set the view matrix directly
    pub fn set_view(&mut self, view: Mat4) {
        self.view = view;
    }

    /// Derive the view matrix from a camera
    ///
    /// Composes the inverse camera transform (negated rotations applied
    /// about X, then Y, then Z onto the negated translation) and finishes
    /// with the fixed Z-up to Y-up axis realignment.
    pub fn set_view_from_camera(&mut self, camera: &Camera) {
        let angles = camera.orientation_degrees;
        let inverse_rotation = math::rotation_about_axis_degrees(Vec3::x(), -angles.x)
            * math::rotation_about_axis_degrees(Vec3::y(), -angles.y)
            * math::rotation_about_axis_degrees(Vec3::z(), -angles.z);
        self.view =
            math::axis_realignment() * inverse_rotation * math::translation(-camera.position);
    }

    /// Set an orthographic projection
    pub fn set_orthographic(
        &mut self,
        left: f32,
        right: f32,
        bottom: f32,
        top: f32,
        near: f32,
        far: f32,
    ) {
        self.projection = math::orthographic_projection(left, right, bottom, top, near, far);
        self.projection_kind = Some(Projection::Orthographic {
            left,
            right,
            bottom,
            top,
            near,
            far,
        });
    }

    /// Set a perspective projection from a horizontal field of view
    pub fn set_perspective(
        &mut self,
        horizontal_fov_degrees: f32,
        aspect: f32,
        near: f32,
        far: f32,
    ) {
        self.projection =
            math::perspective_projection(horizontal_fov_degrees, aspect, near, far);
        self.projection_kind = Some(Projection::Perspective {
            horizontal_fov_degrees,
            aspect,
            near,
            far,
        });
    }

    /// Model matrix as a uniform value
    pub fn model_uniform(&self) -> UniformValue {
        UniformValue::from_mat4(self.model.top())
    }

    /// View matrix as a uniform value
    pub fn view_uniform(&self) -> UniformValue {
        UniformValue::from_mat4(&self.view)
    }

    /// Projection matrix as a uniform value
    pub fn projection_uniform(&self) -> UniformValue {
        UniformValue::from_mat4(&self.projection)
    }
}

impl Default for TransformPipeline {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_stack_starts_with_identity_base() {
        let stack = MatrixStack::new();
        assert_eq!(stack.depth(), 1);
        assert_eq!(*stack.top(), Mat4::identity());
    }

    #[test]
    fn test_push_duplicates_and_pop_restores() {
        let mut stack = MatrixStack::new();
        stack.translate(Vec3::new(1.0, 2.0, 3.0));
        let translated = *stack.top();

        stack.push();
        assert_eq!(stack.depth(), 2);
        assert_eq!(*stack.top(), translated);

        stack.scale(Vec3::new(2.0, 2.0, 2.0));
        assert_ne!(*stack.top(), translated);

        stack.pop();
        assert_eq!(stack.depth(), 1);
        assert_eq!(*stack.top(), translated);
    }

    #[test]
    #[should_panic(expected = "Matrix stack underflow")]
    fn test_popping_base_entry_is_fatal() {
        let mut stack = MatrixStack::new();
        stack.pop();
    }

    #[test]
    fn test_operations_left_multiply_onto_top() {
        // Scale then translate: the translation must not be scaled
        let mut stack = MatrixStack::new();
        stack.scale(Vec3::new(2.0, 2.0, 2.0));
        stack.translate(Vec3::new(1.0, 0.0, 0.0));

        let transformed = stack.top().transform_point(&nalgebra::Point3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(transformed.x, 3.0, epsilon = 1e-6);
    }

    #[test]
    fn test_identity_camera_view_is_pure_realignment() {
        let mut pipeline = TransformPipeline::new();
        pipeline.set_view_from_camera(&Camera::new());
        let expected = math::axis_realignment();
        for row in 0..4 {
            for col in 0..4 {
                assert_relative_eq!(
                    pipeline.view()[(row, col)],
                    expected[(row, col)],
                    epsilon = 1e-6
                );
            }
        }
    }

    #[test]
    fn test_camera_translation_is_inverted_in_view() {
        let camera = Camera::new().with_position(Vec3::new(2.0, 0.0, 0.0));
        let mut pipeline = TransformPipeline::new();
        pipeline.set_view_from_camera(&camera);

        // A point at the camera position lands at the view-space origin
        let at_camera = pipeline
            .view()
            .transform_point(&nalgebra::Point3::new(2.0, 0.0, 0.0));
        assert_relative_eq!(at_camera.x, 0.0, epsilon = 1e-6);
        assert_relative_eq!(at_camera.y, 0.0, epsilon = 1e-6);
        assert_relative_eq!(at_camera.z, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_projection_kind_is_tagged() {
        let mut pipeline = TransformPipeline::new();
        assert_eq!(pipeline.projection_kind(), None);

        pipeline.set_perspective(90.0, 1.5, 0.1, 100.0);
        assert!(matches!(
            pipeline.projection_kind(),
            Some(Projection::Perspective { .. })
        ));

        pipeline.set_orthographic(-1.0, 1.0, -1.0, 1.0, 0.0, 1.0);
        assert!(matches!(
            pipeline.projection_kind(),
            Some(Projection::Orthographic { .. })
        ));
    }
}
