//! Materials and material application
//!
//! A material bundles a shader pipeline with the state needed to draw with
//! it: texture bindings, static uniform values, and an optional line width.
//! Applying a material binds all of that on the backend and feeds in the
//! current transform matrices; removing it resets the texture units and line
//! width but deliberately leaves the pipeline bound, so consecutive draws
//! with materials sharing a pipeline skip the rebind.
//!
//! Uniform names that do not resolve in the pipeline are skipped silently
//! with a trace breadcrumb, so one shader ignoring a standard uniform does
//! not break material application.

use std::collections::HashMap;

use crate::foundation::math::Mat4;
use crate::render::backend::{PipelineKey, RenderBackend, TextureKey, UniformValue};
use crate::render::error::{fatal, RenderResult};
use crate::render::lighting::LightRegistry;
use crate::render::transform::TransformPipeline;

/// Maximum number of skeleton joints a shader pipeline receives
pub const MAX_JOINTS: usize = 64;

/// One texture bound to a sampler uniform through a texture unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureBinding {
    /// Texture unit the texture is bound to
    pub unit: u32,
    /// Name of the sampler uniform receiving the unit index
    pub sampler_uniform: String,
    /// Texture to bind
    pub texture: TextureKey,
}

/// Drawing state bundled around one shader pipeline
#[derive(Debug, Clone, Default)]
pub struct Material {
    /// Material name, unique within a registry
    pub name: String,
    /// Compiled pipeline this material draws with
    pub pipeline: Option<PipelineKey>,
    /// Textures bound when the material is applied
    pub texture_bindings: Vec<TextureBinding>,
    /// Static uniform values uploaded on every application
    pub uniform_values: Vec<(String, UniformValue)>,
    /// Line width for line primitives, when not the default
    pub line_width: Option<f32>,
}

impl Material {
    /// Material with the given name and no pipeline
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Builder method to set the pipeline
    pub fn with_pipeline(mut self, pipeline: PipelineKey) -> Self {
        self.pipeline = Some(pipeline);
        self
    }

    /// Builder method to add a texture binding
    pub fn with_texture(
        mut self,
        unit: u32,
        sampler_uniform: impl Into<String>,
        texture: TextureKey,
    ) -> Self {
        self.texture_bindings.push(TextureBinding {
            unit,
            sampler_uniform: sampler_uniform.into(),
            texture,
        });
        self
    }

    /// Builder method to add a static uniform value
    pub fn with_uniform(mut self, name: impl Into<String>, value: UniformValue) -> Self {
        self.uniform_values.push((name.into(), value));
        self
    }

    /// Builder method to set the line width
    pub fn with_line_width(mut self, width: f32) -> Self {
        self.line_width = Some(width);
        self
    }
}

/// Named collection of materials
#[derive(Default)]
pub struct MaterialRegistry {
    materials: HashMap<String, Material>,
}

impl MaterialRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a material, replacing any existing one with the same name
    pub fn insert(&mut self, material: Material) {
        self.materials.insert(material.name.clone(), material);
    }

    /// Fetch the material with the given name, creating an empty one if it
    /// does not exist yet
    pub fn create_or_get(&mut self, name: &str) -> &mut Material {
        self.materials
            .entry(name.to_string())
            .or_insert_with(|| Material::new(name))
    }

    /// Look up a material by name
    pub fn get(&self, name: &str) -> Option<&Material> {
        self.materials.get(name)
    }

    /// Number of registered materials
    pub fn len(&self) -> usize {
        self.materials.len()
    }

    /// True when no materials are registered
    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }
}

/// Bind a material and upload the current transform matrices
///
/// Binds the material's pipeline, writes `u_modelMatrix`, `u_viewMatrix`
/// and `u_projectionMatrix`, uploads the material's static uniforms, binds
/// its textures to their units (setting each sampler uniform to the unit
/// index), and sets the line width when one is configured.
///
/// A material with no pipeline is a construction bug, not a runtime
/// condition, and is fatal.
pub fn apply(
    backend: &mut dyn RenderBackend,
    transforms: &TransformPipeline,
    material: &Material,
) -> RenderResult<()> {
    let Some(pipeline) = material.pipeline else {
        fatal(
            "Material has no pipeline",
            &format!("material {:?} was applied before a pipeline was assigned", material.name),
        );
    };

    backend.bind_pipeline(Some(pipeline))?;

    set_uniform_by_name(backend, pipeline, "u_modelMatrix", &transforms.model_uniform())?;
    set_uniform_by_name(backend, pipeline, "u_viewMatrix", &transforms.view_uniform())?;
    set_uniform_by_name(
        backend,
        pipeline,
        "u_projectionMatrix",
        &transforms.projection_uniform(),
    )?;

    for (name, value) in &material.uniform_values {
        set_uniform_by_name(backend, pipeline, name, value)?;
    }

    for binding in &material.texture_bindings {
        backend.bind_texture(binding.unit, Some(binding.texture))?;
        set_uniform_by_name(
            backend,
            pipeline,
            &binding.sampler_uniform,
            &UniformValue::Int(binding.unit as i32),
        )?;
    }

    if let Some(width) = material.line_width {
        backend.set_line_width(width);
    }
    Ok(())
}

/// Undo a material's unit-level state, keeping its pipeline bound
///
/// Unbinds the material's texture units and restores the default line
/// width. The pipeline stays bound so a following material sharing it can
/// skip the rebind.
pub fn remove(backend: &mut dyn RenderBackend, material: &Material) -> RenderResult<()> {
    for binding in &material.texture_bindings {
        backend.bind_texture(binding.unit, None)?;
    }
    if material.line_width.is_some() {
        backend.set_line_width(1.0);
    }
    Ok(())
}

/// Upload the registered lights to a material's pipeline and clear the
/// registry
///
/// The shader always receives the full light capacity: registered lights
/// fill the leading slots and inert defaults pad the rest. The registry is
/// cleared afterwards so lights never leak into the next frame.
pub fn update_lights(
    backend: &mut dyn RenderBackend,
    material: &Material,
    lights: &mut LightRegistry,
) -> RenderResult<()> {
    let Some(pipeline) = material.pipeline else {
        fatal(
            "Material has no pipeline",
            &format!("lights were uploaded to material {:?} before a pipeline was assigned", material.name),
        );
    };

    for (index, light) in lights.padded().iter().enumerate() {
        let prefix = format!("u_lights[{index}]");
        set_uniform_by_name(
            backend,
            pipeline,
            &format!("{prefix}.position"),
            &UniformValue::Vec3(light.position.into()),
        )?;
        set_uniform_by_name(
            backend,
            pipeline,
            &format!("{prefix}.direction"),
            &UniformValue::Vec3(light.direction.into()),
        )?;
        set_uniform_by_name(
            backend,
            pipeline,
            &format!("{prefix}.color"),
            &UniformValue::Vec3(light.color.into()),
        )?;
        set_uniform_by_name(
            backend,
            pipeline,
            &format!("{prefix}.brightness"),
            &UniformValue::Float(light.brightness),
        )?;
        set_uniform_by_name(
            backend,
            pipeline,
            &format!("{prefix}.attenuation"),
            &UniformValue::Float(light.attenuation),
        )?;
        set_uniform_by_name(
            backend,
            pipeline,
            &format!("{prefix}.innerAperture"),
            &UniformValue::Float(light.inner_aperture_degrees),
        )?;
        set_uniform_by_name(
            backend,
            pipeline,
            &format!("{prefix}.outerAperture"),
            &UniformValue::Float(light.outer_aperture_degrees),
        )?;
        set_uniform_by_name(
            backend,
            pipeline,
            &format!("{prefix}.ambientFraction"),
            &UniformValue::Float(light.ambient_fraction),
        )?;
        set_uniform_by_name(
            backend,
            pipeline,
            &format!("{prefix}.isPositional"),
            &UniformValue::Int(i32::from(light.is_positional)),
        )?;
    }

    lights.clear();
    Ok(())
}

/// One skeleton joint's animation pose
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointPose {
    /// Joint transform in object space, parents already composed in
    pub global_transform: Mat4,
    /// Inverse of the joint's bind-pose transform
    pub inverse_bind: Mat4,
}

/// Upload skeleton joint matrices to a material's pipeline
///
/// Each slot receives `object_root * global_transform * inverse_bind`.
/// Poses beyond [`MAX_JOINTS`] are dropped with a warning; unused slots are
/// padded with identity so unskinned vertices pass through untouched.
pub fn update_skeleton(
    backend: &mut dyn RenderBackend,
    material: &Material,
    object_root: &Mat4,
    poses: &[JointPose],
) -> RenderResult<()> {
    let Some(pipeline) = material.pipeline else {
        fatal(
            "Material has no pipeline",
            &format!("a skeleton was uploaded to material {:?} before a pipeline was assigned", material.name),
        );
    };

    if poses.len() > MAX_JOINTS {
        log::warn!(
            "Skeleton has {} joints; only the first {MAX_JOINTS} are uploaded",
            poses.len()
        );
    }

    for index in 0..MAX_JOINTS {
        let matrix = match poses.get(index) {
            Some(pose) => object_root * pose.global_transform * pose.inverse_bind,
            None => Mat4::identity(),
        };
        set_uniform_by_name(
            backend,
            pipeline,
            &format!("u_jointMatrices[{index}]"),
            &UniformValue::from_mat4(&matrix),
        )?;
    }
    Ok(())
}

fn set_uniform_by_name(
    backend: &mut dyn RenderBackend,
    pipeline: PipelineKey,
    name: &str,
    value: &UniformValue,
) -> RenderResult<()> {
    match backend.get_uniform_variable(pipeline, name) {
        Some(variable) => backend.set_uniform(pipeline, variable, value),
        None => {
            log::trace!("Uniform {name} not found in pipeline; skipping");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec3;
    use crate::render::backend::{PipelineSources, ShaderLanguage};
    use crate::render::backends::NullBackend;
    use crate::render::lighting::{Light, MAX_LIGHTS};

    fn compiled_pipeline(backend: &mut NullBackend) -> PipelineKey {
        backend
            .compile_pipeline(&PipelineSources {
                vertex_source: String::new(),
                fragment_source: String::new(),
                language: ShaderLanguage::Glsl,
            })
            .unwrap()
    }

    #[test]
    fn test_apply_binds_pipeline_textures_and_matrices() {
        let mut backend = NullBackend::new();
        let pipeline = compiled_pipeline(&mut backend);
        let texture = backend.create_texture().unwrap();
        let material = Material::new("hull")
            .with_pipeline(pipeline)
            .with_texture(0, "u_diffuse", texture)
            .with_line_width(2.5);
        let transforms = TransformPipeline::new();

        apply(&mut backend, &transforms, &material).unwrap();

        assert_eq!(backend.bound_pipeline(), Some(pipeline));
        assert_eq!(backend.bound_texture(0), Some(texture));
        assert_eq!(backend.line_width(), 2.5);
        assert_eq!(
            backend.uniform_value(pipeline, "u_diffuse"),
            Some(UniformValue::Int(0))
        );
        assert!(matches!(
            backend.uniform_value(pipeline, "u_modelMatrix"),
            Some(UniformValue::Mat4(_))
        ));
        assert!(matches!(
            backend.uniform_value(pipeline, "u_viewMatrix"),
            Some(UniformValue::Mat4(_))
        ));
        assert!(matches!(
            backend.uniform_value(pipeline, "u_projectionMatrix"),
            Some(UniformValue::Mat4(_))
        ));
    }

    #[test]
    fn test_remove_resets_textures_and_line_width_but_keeps_pipeline() {
        let mut backend = NullBackend::new();
        let pipeline = compiled_pipeline(&mut backend);
        let texture = backend.create_texture().unwrap();
        let material = Material::new("hull")
            .with_pipeline(pipeline)
            .with_texture(1, "u_diffuse", texture)
            .with_line_width(3.0);
        let transforms = TransformPipeline::new();

        apply(&mut backend, &transforms, &material).unwrap();
        remove(&mut backend, &material).unwrap();

        assert_eq!(backend.bound_texture(1), None);
        assert_eq!(backend.line_width(), 1.0);
        // The pipeline binding survives removal
        assert_eq!(backend.bound_pipeline(), Some(pipeline));
    }

    #[test]
    #[should_panic(expected = "Material has no pipeline")]
    fn test_apply_without_pipeline_is_fatal() {
        let mut backend = NullBackend::new();
        let material = Material::new("broken");
        let transforms = TransformPipeline::new();
        let _ = apply(&mut backend, &transforms, &material);
    }

    #[test]
    fn test_lights_are_padded_to_capacity_and_registry_cleared() {
        let mut backend = NullBackend::new();
        let pipeline = compiled_pipeline(&mut backend);
        let material = Material::new("lit").with_pipeline(pipeline);

        let mut lights = LightRegistry::new();
        lights.add(Light::point(Vec3::new(1.0, 2.0, 3.0), Vec3::new(1.0, 1.0, 1.0), 4.0));
        lights.add(Light::directional(Vec3::new(0.0, 0.0, -1.0), Vec3::new(1.0, 0.0, 0.0), 1.0));

        update_lights(&mut backend, &material, &mut lights).unwrap();

        assert_eq!(
            backend.uniform_value(pipeline, "u_lights[0].brightness"),
            Some(UniformValue::Float(4.0))
        );
        assert_eq!(
            backend.uniform_value(pipeline, "u_lights[1].brightness"),
            Some(UniformValue::Float(1.0))
        );
        // Slots past the registered lights carry the inert default
        for index in 2..MAX_LIGHTS {
            assert_eq!(
                backend.uniform_value(pipeline, &format!("u_lights[{index}].brightness")),
                Some(UniformValue::Float(0.0))
            );
        }
        assert!(lights.is_empty());
    }

    #[test]
    fn test_skeleton_pads_unused_joints_with_identity() {
        let mut backend = NullBackend::new();
        let pipeline = compiled_pipeline(&mut backend);
        let material = Material::new("skinned").with_pipeline(pipeline);

        let pose = JointPose {
            global_transform: crate::foundation::math::translation(Vec3::new(1.0, 0.0, 0.0)),
            inverse_bind: Mat4::identity(),
        };
        update_skeleton(&mut backend, &material, &Mat4::identity(), &[pose]).unwrap();

        let expected = UniformValue::from_mat4(&pose.global_transform);
        assert_eq!(
            backend.uniform_value(pipeline, "u_jointMatrices[0]"),
            Some(expected)
        );
        assert_eq!(
            backend.uniform_value(pipeline, "u_jointMatrices[1]"),
            Some(UniformValue::from_mat4(&Mat4::identity()))
        );
        assert_eq!(
            backend.uniform_value(
                pipeline,
                &format!("u_jointMatrices[{}]", MAX_JOINTS - 1)
            ),
            Some(UniformValue::from_mat4(&Mat4::identity()))
        );
    }
}
