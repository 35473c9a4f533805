//! No-op backend for unsupported targets and headless testing
//!
//! Accepts every call, performs no native work, and records enough state
//! (bindings, counters, uniform writes) for higher layers and tests to
//! observe what the renderer asked for. Every uniform and attribute name
//! resolves, so shader-facing code paths run end to end without a GPU.

use std::any::Any;
use std::collections::{HashMap, HashSet};

use slotmap::SlotMap;

use crate::render::backend::{
    BlendFactor, BufferKey, BufferTarget, BufferUsage, Capability, ClearMask, FilterMode,
    FramebufferAttachment, FramebufferKey, FramebufferTarget, IndexType, PipelineKey,
    PipelineSources, PrimitiveTopology, RenderBackend, ShaderLanguage, ShaderVariable,
    TextureFormat, TextureKey, UniformValue, VariableKind, VertexAttribute, VertexSource,
    WrapMode,
};
use crate::render::error::{FramebufferStatus, RenderError, RenderResult};

#[derive(Default)]
struct PipelineData {
    uniform_names: HashMap<String, u32>,
    uniform_values: Vec<Option<UniformValue>>,
    attribute_names: HashMap<String, u32>,
}

/// Backend that records state without touching any graphics API
#[derive(Default)]
pub struct NullBackend {
    buffers: SlotMap<BufferKey, ()>,
    textures: SlotMap<TextureKey, ()>,
    framebuffers: SlotMap<FramebufferKey, ()>,
    pipelines: SlotMap<PipelineKey, PipelineData>,
    buffers_created: usize,
    textures_created: usize,
    framebuffers_created: usize,
    pipelines_compiled: usize,
    draw_calls: usize,
    enabled: HashSet<Capability>,
    bound_pipeline: Option<PipelineKey>,
    bound_textures: HashMap<u32, TextureKey>,
    uploaded_pixels: HashMap<TextureKey, Vec<u8>>,
    line_width: f32,
    clear_color: [f32; 4],
    clear_depth: f32,
    clear_stencil: i32,
}

impl NullBackend {
    pub fn new() -> Self {
        Self {
            line_width: 1.0,
            clear_depth: 1.0,
            ..Self::default()
        }
    }

    /// Pipeline currently bound, if any
    pub fn bound_pipeline(&self) -> Option<PipelineKey> {
        self.bound_pipeline
    }

    /// Texture bound to the given unit, if any
    pub fn bound_texture(&self, unit: u32) -> Option<TextureKey> {
        self.bound_textures.get(&unit).copied()
    }

    /// Current line width
    pub fn line_width(&self) -> f32 {
        self.line_width
    }

    /// Whether the capability has been enabled
    pub fn is_enabled(&self, capability: Capability) -> bool {
        self.enabled.contains(&capability)
    }

    /// Total textures created so far
    pub fn textures_created(&self) -> usize {
        self.textures_created
    }

    /// Total shader pipelines compiled so far
    pub fn pipelines_compiled(&self) -> usize {
        self.pipelines_compiled
    }

    /// Total buffers created so far
    pub fn buffers_created(&self) -> usize {
        self.buffers_created
    }

    /// Total framebuffers created so far
    pub fn framebuffers_created(&self) -> usize {
        self.framebuffers_created
    }

    /// Total draw calls issued so far
    pub fn draw_calls(&self) -> usize {
        self.draw_calls
    }

    /// Live (created and not yet deleted) texture count
    pub fn live_textures(&self) -> usize {
        self.textures.len()
    }

    /// Live shader pipeline count
    pub fn live_pipelines(&self) -> usize {
        self.pipelines.len()
    }

    /// Pixel bytes last uploaded into the given texture
    pub fn uploaded_pixels(&self, texture: TextureKey) -> Option<&[u8]> {
        self.uploaded_pixels.get(&texture).map(Vec::as_slice)
    }

    /// Last value written to a named uniform of the given pipeline
    pub fn uniform_value(&self, pipeline: PipelineKey, name: &str) -> Option<UniformValue> {
        let data = self.pipelines.get(pipeline)?;
        let index = *data.uniform_names.get(name)?;
        data.uniform_values.get(index as usize)?.clone()
    }
}

impl RenderBackend for NullBackend {
    fn backend_name(&self) -> &'static str {
        "Null"
    }

    fn supports_language(&self, _language: ShaderLanguage) -> bool {
        true
    }

    fn enable(&mut self, capability: Capability) {
        self.enabled.insert(capability);
    }

    fn disable(&mut self, capability: Capability) {
        self.enabled.remove(&capability);
    }

    fn set_clear_color(&mut self, red: f32, green: f32, blue: f32, alpha: f32) {
        self.clear_color = [red, green, blue, alpha];
    }

    fn set_clear_depth(&mut self, depth: f32) {
        self.clear_depth = depth;
    }

    fn set_clear_stencil(&mut self, value: i32) {
        self.clear_stencil = value;
    }

    fn clear(&mut self, _mask: ClearMask) {}

    fn set_viewport(&mut self, _x: i32, _y: i32, _width: i32, _height: i32) {}

    fn set_blend_function(&mut self, _source: BlendFactor, _destination: BlendFactor) {}

    fn set_line_width(&mut self, width: f32) {
        self.line_width = width;
    }

    fn create_buffer(&mut self) -> RenderResult<BufferKey> {
        self.buffers_created += 1;
        Ok(self.buffers.insert(()))
    }

    fn bind_buffer(&mut self, _target: BufferTarget, buffer: Option<BufferKey>) -> RenderResult<()> {
        if let Some(key) = buffer {
            if !self.buffers.contains_key(key) {
                return Err(RenderError::UnknownHandle { kind: "buffer" });
            }
        }
        Ok(())
    }

    fn buffer_data(
        &mut self,
        _target: BufferTarget,
        _data: &[u8],
        _usage: BufferUsage,
    ) -> RenderResult<()> {
        Ok(())
    }

    fn delete_buffer(&mut self, buffer: BufferKey) {
        self.buffers.remove(buffer);
    }

    fn create_texture(&mut self) -> RenderResult<TextureKey> {
        self.textures_created += 1;
        Ok(self.textures.insert(()))
    }

    fn bind_texture(&mut self, unit: u32, texture: Option<TextureKey>) -> RenderResult<()> {
        match texture {
            Some(key) => {
                if !self.textures.contains_key(key) {
                    return Err(RenderError::UnknownHandle { kind: "texture" });
                }
                self.bound_textures.insert(unit, key);
            }
            None => {
                self.bound_textures.remove(&unit);
            }
        }
        Ok(())
    }

    fn upload_texture_2d(
        &mut self,
        texture: TextureKey,
        _width: u32,
        _height: u32,
        _format: TextureFormat,
        pixels: &[u8],
    ) -> RenderResult<()> {
        if !self.textures.contains_key(texture) {
            return Err(RenderError::UnknownHandle { kind: "texture" });
        }
        self.uploaded_pixels.insert(texture, pixels.to_vec());
        Ok(())
    }

    fn set_texture_filtering(
        &mut self,
        texture: TextureKey,
        _minify: FilterMode,
        _magnify: FilterMode,
    ) -> RenderResult<()> {
        if !self.textures.contains_key(texture) {
            return Err(RenderError::UnknownHandle { kind: "texture" });
        }
        Ok(())
    }

    fn set_texture_wrap(
        &mut self,
        texture: TextureKey,
        _horizontal: WrapMode,
        _vertical: WrapMode,
    ) -> RenderResult<()> {
        if !self.textures.contains_key(texture) {
            return Err(RenderError::UnknownHandle { kind: "texture" });
        }
        Ok(())
    }

    fn generate_mipmaps(&mut self, texture: TextureKey) -> RenderResult<()> {
        if !self.textures.contains_key(texture) {
            return Err(RenderError::UnknownHandle { kind: "texture" });
        }
        Ok(())
    }

    fn delete_texture(&mut self, texture: TextureKey) {
        self.textures.remove(texture);
        self.bound_textures.retain(|_, bound| *bound != texture);
        self.uploaded_pixels.remove(&texture);
    }

    fn create_framebuffer(&mut self) -> RenderResult<FramebufferKey> {
        self.framebuffers_created += 1;
        Ok(self.framebuffers.insert(()))
    }

    fn bind_framebuffer(
        &mut self,
        _target: FramebufferTarget,
        framebuffer: Option<FramebufferKey>,
    ) -> RenderResult<()> {
        if let Some(key) = framebuffer {
            if !self.framebuffers.contains_key(key) {
                return Err(RenderError::UnknownHandle { kind: "framebuffer" });
            }
        }
        Ok(())
    }

    fn attach_framebuffer_texture(
        &mut self,
        framebuffer: FramebufferKey,
        _attachment: FramebufferAttachment,
        texture: Option<TextureKey>,
    ) -> RenderResult<()> {
        if !self.framebuffers.contains_key(framebuffer) {
            return Err(RenderError::UnknownHandle { kind: "framebuffer" });
        }
        if let Some(key) = texture {
            if !self.textures.contains_key(key) {
                return Err(RenderError::UnknownHandle { kind: "texture" });
            }
        }
        Ok(())
    }

    fn framebuffer_status(&mut self, framebuffer: FramebufferKey) -> RenderResult<FramebufferStatus> {
        if !self.framebuffers.contains_key(framebuffer) {
            return Err(RenderError::UnknownHandle { kind: "framebuffer" });
        }
        Ok(FramebufferStatus::Complete)
    }

    fn delete_framebuffer(&mut self, framebuffer: FramebufferKey) {
        self.framebuffers.remove(framebuffer);
    }

    fn compile_pipeline(&mut self, _sources: &PipelineSources) -> RenderResult<PipelineKey> {
        self.pipelines_compiled += 1;
        Ok(self.pipelines.insert(PipelineData::default()))
    }

    fn bind_pipeline(&mut self, pipeline: Option<PipelineKey>) -> RenderResult<()> {
        if let Some(key) = pipeline {
            if !self.pipelines.contains_key(key) {
                return Err(RenderError::UnknownHandle { kind: "pipeline" });
            }
        }
        self.bound_pipeline = pipeline;
        Ok(())
    }

    fn get_uniform_variable(&mut self, pipeline: PipelineKey, name: &str) -> Option<ShaderVariable> {
        let data = self.pipelines.get_mut(pipeline)?;
        let next = data.uniform_names.len() as u32;
        let index = *data.uniform_names.entry(name.to_string()).or_insert(next);
        if data.uniform_values.len() <= index as usize {
            data.uniform_values.resize(index as usize + 1, None);
        }
        Some(ShaderVariable {
            index,
            kind: VariableKind::Uniform,
        })
    }

    fn get_attribute_variable(
        &mut self,
        pipeline: PipelineKey,
        name: &str,
    ) -> Option<ShaderVariable> {
        let data = self.pipelines.get_mut(pipeline)?;
        let next = data.attribute_names.len() as u32;
        let index = *data.attribute_names.entry(name.to_string()).or_insert(next);
        Some(ShaderVariable {
            index,
            kind: VariableKind::Attribute,
        })
    }

    fn set_uniform(
        &mut self,
        pipeline: PipelineKey,
        variable: ShaderVariable,
        value: &UniformValue,
    ) -> RenderResult<()> {
        if variable.kind != VariableKind::Uniform {
            return Err(RenderError::BackendError(
                "attribute variable passed to set_uniform".to_string(),
            ));
        }
        let data = self
            .pipelines
            .get_mut(pipeline)
            .ok_or(RenderError::UnknownHandle { kind: "pipeline" })?;
        let slot = data
            .uniform_values
            .get_mut(variable.index as usize)
            .ok_or(RenderError::UnknownHandle { kind: "uniform" })?;
        *slot = Some(value.clone());
        Ok(())
    }

    fn delete_pipeline(&mut self, pipeline: PipelineKey) {
        self.pipelines.remove(pipeline);
        if self.bound_pipeline == Some(pipeline) {
            self.bound_pipeline = None;
        }
    }

    fn bind_vertex_attributes(
        &mut self,
        _attributes: &[VertexAttribute],
        source: VertexSource<'_>,
    ) -> RenderResult<()> {
        if let VertexSource::GpuBuffer(key) = source {
            if !self.buffers.contains_key(key) {
                return Err(RenderError::UnknownHandle { kind: "buffer" });
            }
        }
        Ok(())
    }

    fn draw_arrays(
        &mut self,
        _topology: PrimitiveTopology,
        _first: i32,
        _count: i32,
    ) -> RenderResult<()> {
        self.draw_calls += 1;
        Ok(())
    }

    fn draw_indexed(
        &mut self,
        _topology: PrimitiveTopology,
        _count: i32,
        _index_type: IndexType,
        _byte_offset: i32,
    ) -> RenderResult<()> {
        self.draw_calls += 1;
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_texture_bindings() {
        let mut backend = NullBackend::new();
        let texture = backend.create_texture().unwrap();
        backend.bind_texture(2, Some(texture)).unwrap();
        assert_eq!(backend.bound_texture(2), Some(texture));
        assert_eq!(backend.bound_texture(0), None);

        backend.bind_texture(2, None).unwrap();
        assert_eq!(backend.bound_texture(2), None);
    }

    #[test]
    fn test_counts_created_resources() {
        let mut backend = NullBackend::new();
        backend.create_texture().unwrap();
        backend.create_texture().unwrap();
        let buffer = backend.create_buffer().unwrap();
        backend.delete_buffer(buffer);
        assert_eq!(backend.textures_created(), 2);
        assert_eq!(backend.buffers_created(), 1);
        assert_eq!(backend.live_textures(), 2);
    }

    #[test]
    fn test_uniform_writes_are_observable() {
        let mut backend = NullBackend::new();
        let sources = PipelineSources {
            vertex_source: String::new(),
            fragment_source: String::new(),
            language: ShaderLanguage::Glsl,
        };
        let pipeline = backend.compile_pipeline(&sources).unwrap();
        let variable = backend.get_uniform_variable(pipeline, "u_brightness").unwrap();
        backend
            .set_uniform(pipeline, variable, &UniformValue::Float(0.5))
            .unwrap();
        assert_eq!(
            backend.uniform_value(pipeline, "u_brightness"),
            Some(UniformValue::Float(0.5))
        );
    }

    #[test]
    fn test_rejects_stale_handles() {
        let mut backend = NullBackend::new();
        let texture = backend.create_texture().unwrap();
        backend.delete_texture(texture);
        assert!(backend.bind_texture(0, Some(texture)).is_err());
    }
}
