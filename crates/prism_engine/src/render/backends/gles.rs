//! Embedded OpenGL ES backend
//!
//! Implements the backend contract over an OpenGL ES 2.0 context via `glow`,
//! targeting embedded displays behind EGL. ES differences from the desktop
//! path:
//!
//! - shaders compile from the ESSL dialect only
//! - clear depth is set through the single-precision entry point
//! - texture internal formats must equal the upload format (no sized formats)
//! - no vertex array objects; attribute pointers bind per submission
//! - program point size is always on and the capability toggle is a no-op

use std::any::Any;
use std::collections::HashMap;

use glow::HasContext;
use slotmap::SlotMap;

use crate::render::backend::{
    BlendFactor, BufferKey, BufferTarget, BufferUsage, Capability, ClearMask, FilterMode,
    FramebufferAttachment, FramebufferKey, FramebufferTarget, IndexType, PipelineKey,
    PipelineSources, PrimitiveTopology, RenderBackend, ShaderLanguage, ShaderVariable,
    TextureFormat, TextureKey, UniformValue, VariableKind, VertexAttribute, VertexSource,
    WrapMode,
};
use crate::render::backends::{convert, GlLoader};
use crate::render::error::{FramebufferStatus, RenderError, RenderResult};

struct PipelineData {
    program: glow::NativeProgram,
    uniform_locations: Vec<glow::NativeUniformLocation>,
    uniform_names: HashMap<String, Option<u32>>,
    attribute_locations: Vec<u32>,
    attribute_names: HashMap<String, Option<u32>>,
}

/// OpenGL ES rendering backend for embedded targets
pub struct GlesBackend {
    gl: glow::Context,
    buffers: SlotMap<BufferKey, glow::NativeBuffer>,
    textures: SlotMap<TextureKey, glow::NativeTexture>,
    framebuffers: SlotMap<FramebufferKey, glow::NativeFramebuffer>,
    pipelines: SlotMap<PipelineKey, PipelineData>,
    bound_pipeline: Option<PipelineKey>,
    scratch_buffer: glow::NativeBuffer,
}

impl GlesBackend {
    /// Create the backend over an already current OpenGL ES context
    pub fn new(loader: GlLoader<'_>) -> RenderResult<Self> {
        let gl = unsafe { glow::Context::from_loader_function(|symbol| loader(symbol)) };
        let scratch_buffer = unsafe {
            gl.create_buffer()
                .map_err(RenderError::InitializationFailed)?
        };

        log::info!("OpenGL ES backend ready");
        Ok(Self {
            gl,
            buffers: SlotMap::with_key(),
            textures: SlotMap::with_key(),
            framebuffers: SlotMap::with_key(),
            pipelines: SlotMap::with_key(),
            bound_pipeline: None,
            scratch_buffer,
        })
    }

    fn compile_stage(&self, stage: u32, source: &str) -> RenderResult<glow::NativeShader> {
        unsafe {
            let shader = self
                .gl
                .create_shader(stage)
                .map_err(RenderError::ResourceCreationFailed)?;
            self.gl.shader_source(shader, source);
            self.gl.compile_shader(shader);
            if !self.gl.get_shader_compile_status(shader) {
                let info_log = self.gl.get_shader_info_log(shader);
                self.gl.delete_shader(shader);
                return Err(RenderError::ShaderCompilationFailed(info_log));
            }
            Ok(shader)
        }
    }

    fn buffer(&self, key: BufferKey) -> RenderResult<glow::NativeBuffer> {
        self.buffers
            .get(key)
            .copied()
            .ok_or(RenderError::UnknownHandle { kind: "buffer" })
    }

    fn texture(&self, key: TextureKey) -> RenderResult<glow::NativeTexture> {
        self.textures
            .get(key)
            .copied()
            .ok_or(RenderError::UnknownHandle { kind: "texture" })
    }

    fn framebuffer(&self, key: FramebufferKey) -> RenderResult<glow::NativeFramebuffer> {
        self.framebuffers
            .get(key)
            .copied()
            .ok_or(RenderError::UnknownHandle { kind: "framebuffer" })
    }
}

impl RenderBackend for GlesBackend {
    fn backend_name(&self) -> &'static str {
        "OpenGL ES"
    }

    fn supports_language(&self, language: ShaderLanguage) -> bool {
        language == ShaderLanguage::Essl
    }

    fn enable(&mut self, capability: Capability) {
        // Point size always comes from the shader in ES
        if capability == Capability::ProgramPointSize {
            return;
        }
        unsafe { self.gl.enable(convert::capability(capability)) };
    }

    fn disable(&mut self, capability: Capability) {
        if capability == Capability::ProgramPointSize {
            return;
        }
        unsafe { self.gl.disable(convert::capability(capability)) };
    }

    fn set_clear_color(&mut self, red: f32, green: f32, blue: f32, alpha: f32) {
        unsafe { self.gl.clear_color(red, green, blue, alpha) };
    }

    fn set_clear_depth(&mut self, depth: f32) {
        unsafe { self.gl.clear_depth_f32(depth) };
    }

    fn set_clear_stencil(&mut self, value: i32) {
        unsafe { self.gl.clear_stencil(value) };
    }

    fn clear(&mut self, mask: ClearMask) {
        unsafe { self.gl.clear(convert::clear_mask(mask)) };
    }

    fn set_viewport(&mut self, x: i32, y: i32, width: i32, height: i32) {
        unsafe { self.gl.viewport(x, y, width, height) };
    }

    fn set_blend_function(&mut self, source: BlendFactor, destination: BlendFactor) {
        unsafe {
            self.gl
                .blend_func(convert::blend_factor(source), convert::blend_factor(destination));
        }
    }

    fn set_line_width(&mut self, width: f32) {
        unsafe { self.gl.line_width(width) };
    }

    fn create_buffer(&mut self) -> RenderResult<BufferKey> {
        let buffer = unsafe {
            self.gl
                .create_buffer()
                .map_err(RenderError::ResourceCreationFailed)?
        };
        Ok(self.buffers.insert(buffer))
    }

    fn bind_buffer(&mut self, target: BufferTarget, buffer: Option<BufferKey>) -> RenderResult<()> {
        let native = buffer.map(|key| self.buffer(key)).transpose()?;
        unsafe { self.gl.bind_buffer(convert::buffer_target(target), native) };
        Ok(())
    }

    fn buffer_data(
        &mut self,
        target: BufferTarget,
        data: &[u8],
        usage: BufferUsage,
    ) -> RenderResult<()> {
        unsafe {
            self.gl.buffer_data_u8_slice(
                convert::buffer_target(target),
                data,
                convert::buffer_usage(usage),
            );
        }
        Ok(())
    }

    fn delete_buffer(&mut self, buffer: BufferKey) {
        if let Some(native) = self.buffers.remove(buffer) {
            unsafe { self.gl.delete_buffer(native) };
        }
    }

    fn create_texture(&mut self) -> RenderResult<TextureKey> {
        let texture = unsafe {
            self.gl
                .create_texture()
                .map_err(RenderError::ResourceCreationFailed)?
        };
        Ok(self.textures.insert(texture))
    }

    fn bind_texture(&mut self, unit: u32, texture: Option<TextureKey>) -> RenderResult<()> {
        let native = texture.map(|key| self.texture(key)).transpose()?;
        unsafe {
            self.gl.active_texture(glow::TEXTURE0 + unit);
            self.gl.bind_texture(glow::TEXTURE_2D, native);
        }
        Ok(())
    }

    fn upload_texture_2d(
        &mut self,
        texture: TextureKey,
        width: u32,
        height: u32,
        format: TextureFormat,
        pixels: &[u8],
    ) -> RenderResult<()> {
        let native = self.texture(texture)?;
        // ES requires internal format and upload format to match
        let format = match format {
            TextureFormat::Rgb => glow::RGB,
            TextureFormat::Rgba => glow::RGBA,
        };
        unsafe {
            self.gl.bind_texture(glow::TEXTURE_2D, Some(native));
            self.gl.pixel_store_i32(glow::UNPACK_ALIGNMENT, 1);
            self.gl.tex_image_2d(
                glow::TEXTURE_2D,
                0,
                format as i32,
                width as i32,
                height as i32,
                0,
                format,
                glow::UNSIGNED_BYTE,
                Some(pixels),
            );
        }
        Ok(())
    }

    fn set_texture_filtering(
        &mut self,
        texture: TextureKey,
        minify: FilterMode,
        magnify: FilterMode,
    ) -> RenderResult<()> {
        let native = self.texture(texture)?;
        unsafe {
            self.gl.bind_texture(glow::TEXTURE_2D, Some(native));
            self.gl.tex_parameter_i32(
                glow::TEXTURE_2D,
                glow::TEXTURE_MIN_FILTER,
                convert::filter_mode(minify),
            );
            self.gl.tex_parameter_i32(
                glow::TEXTURE_2D,
                glow::TEXTURE_MAG_FILTER,
                convert::filter_mode(magnify),
            );
        }
        Ok(())
    }

    fn set_texture_wrap(
        &mut self,
        texture: TextureKey,
        horizontal: WrapMode,
        vertical: WrapMode,
    ) -> RenderResult<()> {
        let native = self.texture(texture)?;
        unsafe {
            self.gl.bind_texture(glow::TEXTURE_2D, Some(native));
            self.gl.tex_parameter_i32(
                glow::TEXTURE_2D,
                glow::TEXTURE_WRAP_S,
                convert::wrap_mode(horizontal),
            );
            self.gl.tex_parameter_i32(
                glow::TEXTURE_2D,
                glow::TEXTURE_WRAP_T,
                convert::wrap_mode(vertical),
            );
        }
        Ok(())
    }

    fn generate_mipmaps(&mut self, texture: TextureKey) -> RenderResult<()> {
        let native = self.texture(texture)?;
        unsafe {
            self.gl.bind_texture(glow::TEXTURE_2D, Some(native));
            self.gl.generate_mipmap(glow::TEXTURE_2D);
        }
        Ok(())
    }

    fn delete_texture(&mut self, texture: TextureKey) {
        if let Some(native) = self.textures.remove(texture) {
            unsafe { self.gl.delete_texture(native) };
        }
    }

    fn create_framebuffer(&mut self) -> RenderResult<FramebufferKey> {
        let framebuffer = unsafe {
            self.gl
                .create_framebuffer()
                .map_err(RenderError::ResourceCreationFailed)?
        };
        Ok(self.framebuffers.insert(framebuffer))
    }

    fn bind_framebuffer(
        &mut self,
        target: FramebufferTarget,
        framebuffer: Option<FramebufferKey>,
    ) -> RenderResult<()> {
        let native = framebuffer.map(|key| self.framebuffer(key)).transpose()?;
        // ES 2.0 exposes a single framebuffer binding point
        let _ = target;
        unsafe { self.gl.bind_framebuffer(glow::FRAMEBUFFER, native) };
        Ok(())
    }

    fn attach_framebuffer_texture(
        &mut self,
        framebuffer: FramebufferKey,
        attachment: FramebufferAttachment,
        texture: Option<TextureKey>,
    ) -> RenderResult<()> {
        let native_framebuffer = self.framebuffer(framebuffer)?;
        let native_texture = texture.map(|key| self.texture(key)).transpose()?;
        let point = convert::attachment_point(attachment).ok_or_else(|| {
            RenderError::BackendError(format!("invalid attachment slot: {attachment:?}"))
        })?;
        unsafe {
            self.gl
                .bind_framebuffer(glow::FRAMEBUFFER, Some(native_framebuffer));
            self.gl.framebuffer_texture_2d(
                glow::FRAMEBUFFER,
                point,
                glow::TEXTURE_2D,
                native_texture,
                0,
            );
        }
        Ok(())
    }

    fn framebuffer_status(&mut self, framebuffer: FramebufferKey) -> RenderResult<FramebufferStatus> {
        let native = self.framebuffer(framebuffer)?;
        let code = unsafe {
            self.gl.bind_framebuffer(glow::FRAMEBUFFER, Some(native));
            self.gl.check_framebuffer_status(glow::FRAMEBUFFER)
        };
        Ok(convert::framebuffer_status(code))
    }

    fn delete_framebuffer(&mut self, framebuffer: FramebufferKey) {
        if let Some(native) = self.framebuffers.remove(framebuffer) {
            unsafe { self.gl.delete_framebuffer(native) };
        }
    }

    fn compile_pipeline(&mut self, sources: &PipelineSources) -> RenderResult<PipelineKey> {
        if !self.supports_language(sources.language) {
            return Err(RenderError::NoCompatibleShaderLanguage {
                backend: self.backend_name(),
            });
        }

        let vertex = self.compile_stage(glow::VERTEX_SHADER, &sources.vertex_source)?;
        let fragment = match self.compile_stage(glow::FRAGMENT_SHADER, &sources.fragment_source) {
            Ok(shader) => shader,
            Err(error) => {
                unsafe { self.gl.delete_shader(vertex) };
                return Err(error);
            }
        };

        let program = unsafe {
            let program = self
                .gl
                .create_program()
                .map_err(RenderError::ResourceCreationFailed)?;
            self.gl.attach_shader(program, vertex);
            self.gl.attach_shader(program, fragment);
            self.gl.link_program(program);

            self.gl.detach_shader(program, vertex);
            self.gl.detach_shader(program, fragment);
            self.gl.delete_shader(vertex);
            self.gl.delete_shader(fragment);

            if !self.gl.get_program_link_status(program) {
                let info_log = self.gl.get_program_info_log(program);
                self.gl.delete_program(program);
                return Err(RenderError::PipelineLinkFailed(info_log));
            }
            program
        };

        log::debug!("Linked shader pipeline");
        Ok(self.pipelines.insert(PipelineData {
            program,
            uniform_locations: Vec::new(),
            uniform_names: HashMap::new(),
            attribute_locations: Vec::new(),
            attribute_names: HashMap::new(),
        }))
    }

    fn bind_pipeline(&mut self, pipeline: Option<PipelineKey>) -> RenderResult<()> {
        let program = match pipeline {
            Some(key) => Some(
                self.pipelines
                    .get(key)
                    .ok_or(RenderError::UnknownHandle { kind: "pipeline" })?
                    .program,
            ),
            None => None,
        };
        unsafe { self.gl.use_program(program) };
        self.bound_pipeline = pipeline;
        Ok(())
    }

    fn get_uniform_variable(&mut self, pipeline: PipelineKey, name: &str) -> Option<ShaderVariable> {
        let data = self.pipelines.get_mut(pipeline)?;
        if let Some(cached) = data.uniform_names.get(name) {
            return cached.map(|index| ShaderVariable {
                index,
                kind: VariableKind::Uniform,
            });
        }

        let location = unsafe { self.gl.get_uniform_location(data.program, name) };
        let index = location.map(|location| {
            let index = data.uniform_locations.len() as u32;
            data.uniform_locations.push(location);
            index
        });
        data.uniform_names.insert(name.to_string(), index);
        index.map(|index| ShaderVariable {
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
        if let Some(cached) = data.attribute_names.get(name) {
            return cached.map(|index| ShaderVariable {
                index,
                kind: VariableKind::Attribute,
            });
        }

        let location = unsafe { self.gl.get_attrib_location(data.program, name) };
        let index = location.map(|location| {
            let index = data.attribute_locations.len() as u32;
            data.attribute_locations.push(location);
            index
        });
        data.attribute_names.insert(name.to_string(), index);
        index.map(|index| ShaderVariable {
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
            .get(pipeline)
            .ok_or(RenderError::UnknownHandle { kind: "pipeline" })?;
        let location = data
            .uniform_locations
            .get(variable.index as usize)
            .ok_or(RenderError::UnknownHandle { kind: "uniform" })?;

        unsafe {
            match value {
                UniformValue::Int(v) => self.gl.uniform_1_i32(Some(location), *v),
                UniformValue::Float(v) => self.gl.uniform_1_f32(Some(location), *v),
                UniformValue::Vec2(v) => self.gl.uniform_2_f32(Some(location), v[0], v[1]),
                UniformValue::Vec3(v) => self.gl.uniform_3_f32(Some(location), v[0], v[1], v[2]),
                UniformValue::Vec4(v) => {
                    self.gl.uniform_4_f32(Some(location), v[0], v[1], v[2], v[3]);
                }
                UniformValue::Mat4(v) => {
                    self.gl.uniform_matrix_4_f32_slice(Some(location), false, v);
                }
            }
        }
        Ok(())
    }

    fn delete_pipeline(&mut self, pipeline: PipelineKey) {
        if let Some(data) = self.pipelines.remove(pipeline) {
            unsafe { self.gl.delete_program(data.program) };
        }
        if self.bound_pipeline == Some(pipeline) {
            self.bound_pipeline = None;
        }
    }

    fn bind_vertex_attributes(
        &mut self,
        attributes: &[VertexAttribute],
        source: VertexSource<'_>,
    ) -> RenderResult<()> {
        let Some(pipeline) = self.bound_pipeline else {
            return Err(RenderError::BackendError(
                "vertex submission with no pipeline bound".to_string(),
            ));
        };

        match source {
            VertexSource::ClientBytes(bytes) => unsafe {
                self.gl
                    .bind_buffer(glow::ARRAY_BUFFER, Some(self.scratch_buffer));
                self.gl
                    .buffer_data_u8_slice(glow::ARRAY_BUFFER, bytes, glow::STREAM_DRAW);
            },
            VertexSource::GpuBuffer(key) => {
                let native = self.buffer(key)?;
                unsafe { self.gl.bind_buffer(glow::ARRAY_BUFFER, Some(native)) };
            }
        }

        for attribute in attributes {
            let Some(variable) = self.get_attribute_variable(pipeline, &attribute.name) else {
                log::trace!("Attribute {} not found in pipeline", attribute.name);
                continue;
            };
            let data = self
                .pipelines
                .get(pipeline)
                .ok_or(RenderError::UnknownHandle { kind: "pipeline" })?;
            let location = data.attribute_locations[variable.index as usize];
            unsafe {
                self.gl.enable_vertex_attrib_array(location);
                self.gl.vertex_attrib_pointer_f32(
                    location,
                    attribute.components,
                    convert::scalar_type(attribute.scalar),
                    attribute.normalized,
                    attribute.stride,
                    attribute.offset,
                );
            }
        }
        Ok(())
    }

    fn draw_arrays(
        &mut self,
        topology: PrimitiveTopology,
        first: i32,
        count: i32,
    ) -> RenderResult<()> {
        unsafe { self.gl.draw_arrays(convert::topology(topology), first, count) };
        Ok(())
    }

    fn draw_indexed(
        &mut self,
        topology: PrimitiveTopology,
        count: i32,
        index_type: IndexType,
        byte_offset: i32,
    ) -> RenderResult<()> {
        unsafe {
            self.gl.draw_elements(
                convert::topology(topology),
                count,
                convert::index_type(index_type),
                byte_offset,
            );
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for GlesBackend {
    fn drop(&mut self) {
        unsafe {
            for (_, buffer) in self.buffers.drain() {
                self.gl.delete_buffer(buffer);
            }
            for (_, texture) in self.textures.drain() {
                self.gl.delete_texture(texture);
            }
            for (_, framebuffer) in self.framebuffers.drain() {
                self.gl.delete_framebuffer(framebuffer);
            }
            for (_, pipeline) in self.pipelines.drain() {
                self.gl.delete_program(pipeline.program);
            }
            self.gl.delete_buffer(self.scratch_buffer);
        }
        log::info!("OpenGL ES backend destroyed");
    }
}
