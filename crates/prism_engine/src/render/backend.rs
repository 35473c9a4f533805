//! Backend abstraction for the rendering system
//!
//! This module defines the contract every graphics backend must implement so
//! the high-level renderer can drive mutually incompatible native APIs
//! through one operation set. Exactly one backend instance exists per
//! process; it is selected at startup and never swapped afterwards.
//!
//! Resources are addressed through opaque slotmap keys. The keys are plain
//! values with no lifetime obligations for the caller; each backend maps
//! them to its own native objects internally. Shader variable lookups
//! likewise return a lightweight [`ShaderVariable`] value indexing into the
//! pipeline's own location table, so there is nothing for call sites to
//! release.

use std::any::Any;

use crate::render::error::{FramebufferStatus, RenderResult};
use crate::foundation::math::Mat4;

slotmap::new_key_type! {
    /// Opaque handle to a backend GPU buffer object
    pub struct BufferKey;
    /// Opaque handle to a backend texture object
    pub struct TextureKey;
    /// Opaque handle to a compiled, linked shader pipeline
    pub struct PipelineKey;
    /// Opaque handle to a backend framebuffer object
    pub struct FramebufferKey;
}

bitflags::bitflags! {
    /// Which buffers a clear operation affects
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ClearMask: u32 {
        /// Color buffer
        const COLOR = 1 << 0;
        /// Depth buffer
        const DEPTH = 1 << 1;
        /// Stencil buffer
        const STENCIL = 1 << 2;
    }
}

/// Togglable fixed-function driver features
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Alpha blending
    Blend,
    /// Depth testing
    DepthTest,
    /// Back/front face culling
    CullFace,
    /// Scissor rectangle clipping
    ScissorTest,
    /// Stencil testing
    StencilTest,
    /// Polygon depth offset for fill primitives
    PolygonOffsetFill,
    /// Shader-programmable point size (desktop only; embedded targets treat
    /// point size as always shader-driven)
    ProgramPointSize,
}

/// Blend equation factors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlendFactor {
    /// Factor of zero
    Zero,
    /// Factor of one
    One,
    /// Source color
    SrcColor,
    /// One minus source color
    OneMinusSrcColor,
    /// Destination color
    DstColor,
    /// One minus destination color
    OneMinusDstColor,
    /// Source alpha
    SrcAlpha,
    /// One minus source alpha
    OneMinusSrcAlpha,
    /// Destination alpha
    DstAlpha,
    /// One minus destination alpha
    OneMinusDstAlpha,
}

/// Buffer object binding points
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferTarget {
    /// Vertex attribute data
    Array,
    /// Index data
    ElementArray,
}

/// Expected update frequency of a buffer's contents
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferUsage {
    /// Uploaded once, drawn many times
    Static,
    /// Re-uploaded occasionally
    Dynamic,
    /// Re-uploaded every frame
    Stream,
}

/// Pixel layout of uploaded texture data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureFormat {
    /// Three channels, 8 bits each
    Rgb,
    /// Four channels, 8 bits each
    Rgba,
}

impl TextureFormat {
    /// Upload format for an image with the given channel count
    pub fn from_channels(channels: u8) -> Self {
        if channels == 3 {
            Self::Rgb
        } else {
            Self::Rgba
        }
    }

    /// Bytes per pixel in this format
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Rgb => 3,
            Self::Rgba => 4,
        }
    }
}

/// Texture sampling filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterMode {
    /// Nearest neighbor filtering
    Nearest,
    /// Linear filtering
    Linear,
    /// Linear filtering between mipmap levels
    LinearMipmapLinear,
}

/// Texture coordinate wrapping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WrapMode {
    /// Repeat the texture
    Repeat,
    /// Mirror the texture on each repeat
    MirroredRepeat,
    /// Clamp to the edge texel
    ClampToEdge,
}

/// Framebuffer binding modes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramebufferTarget {
    /// Bind for read operations only
    Read,
    /// Bind for draw operations only
    Write,
    /// Bind for both read and draw
    Both,
}

/// Attachment slots of a framebuffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramebufferAttachment {
    /// Color attachment slot, 0 through [`MAX_COLOR_ATTACHMENTS`] - 1
    Color(u32),
    /// Depth attachment
    Depth,
    /// Stencil attachment
    Stencil,
}

/// Number of color attachment slots a framebuffer carries
pub const MAX_COLOR_ATTACHMENTS: usize = 4;

/// Primitive assembly mode for vertex submission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveTopology {
    /// Individual points
    Points,
    /// Individual line segments
    Lines,
    /// Connected line strip
    LineStrip,
    /// Closed line loop
    LineLoop,
    /// Individual triangles
    Triangles,
    /// Connected triangle strip
    TriangleStrip,
    /// Triangle fan around the first vertex
    TriangleFan,
}

/// Scalar type of a vertex attribute component
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarType {
    /// Signed 8-bit integer
    I8,
    /// Unsigned 8-bit integer
    U8,
    /// Signed 16-bit integer
    I16,
    /// Unsigned 16-bit integer
    U16,
    /// Signed 32-bit integer
    I32,
    /// Unsigned 32-bit integer
    U32,
    /// 32-bit float
    F32,
}

/// Index element type for indexed draws
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexType {
    /// 8-bit indices
    U8,
    /// 16-bit indices
    U16,
    /// 32-bit indices
    U32,
}

/// Shader source dialects a backend may accept
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderLanguage {
    /// Desktop GLSL
    Glsl,
    /// OpenGL ES shading language
    Essl,
}

/// Source text for one shader pipeline
#[derive(Debug, Clone)]
pub struct PipelineSources {
    /// Vertex stage source text
    pub vertex_source: String,
    /// Fragment stage source text
    pub fragment_source: String,
    /// Dialect the sources are written in
    pub language: ShaderLanguage,
}

/// Typed value written into a shader uniform slot
#[derive(Debug, Clone, PartialEq)]
pub enum UniformValue {
    /// Single integer (also used for sampler units)
    Int(i32),
    /// Single float
    Float(f32),
    /// Two-component float vector
    Vec2([f32; 2]),
    /// Three-component float vector
    Vec3([f32; 3]),
    /// Four-component float vector
    Vec4([f32; 4]),
    /// 4x4 float matrix, column-major
    Mat4([f32; 16]),
}

impl UniformValue {
    /// Build a matrix uniform from a math matrix (column-major copy)
    pub fn from_mat4(matrix: &Mat4) -> Self {
        let mut values = [0.0f32; 16];
        values.copy_from_slice(matrix.as_slice());
        Self::Mat4(values)
    }
}

/// Which table of a pipeline a [`ShaderVariable`] indexes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableKind {
    /// Uniform slot
    Uniform,
    /// Vertex attribute slot
    Attribute,
}

/// A named slot inside a shader pipeline
///
/// A plain value indexing into the owning pipeline's location table. It is
/// only meaningful for the pipeline it was resolved from, and there is
/// nothing to release: the pipeline owns the underlying native location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShaderVariable {
    pub(crate) index: u32,
    pub(crate) kind: VariableKind,
}

impl ShaderVariable {
    /// Index into the pipeline's location table
    pub fn index(self) -> u32 {
        self.index
    }

    /// Whether this names a uniform or an attribute slot
    pub fn kind(self) -> VariableKind {
        self.kind
    }
}

/// Description of one vertex attribute in a [`VertexSource`]
///
/// The same descriptor shape serves both submission paths: over client-side
/// bytes the offset addresses into the byte slice, over a GPU buffer it is a
/// byte offset into the buffer object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexAttribute {
    /// Shader-visible attribute name
    pub name: String,
    /// Number of components (1-4)
    pub components: i32,
    /// Scalar type of each component
    pub scalar: ScalarType,
    /// Whether integer components are normalized to [0, 1] / [-1, 1]
    pub normalized: bool,
    /// Distance in bytes between consecutive vertices
    pub stride: i32,
    /// Byte offset of this attribute within a vertex
    pub offset: i32,
}

/// Where vertex bytes for a submission come from
#[derive(Debug, Clone, Copy)]
pub enum VertexSource<'a> {
    /// Client-side memory, uploaded transiently by the backend
    ClientBytes(&'a [u8]),
    /// A previously uploaded GPU buffer
    GpuBuffer(BufferKey),
}

/// Main rendering backend trait
///
/// One concrete implementation exists per native graphics API. Every
/// operation mutates backend/GPU state; none are pure. Operations hold no
/// cross-call state beyond what the native API itself tracks.
pub trait RenderBackend {
    /// Name of the backend for logs and diagnostics
    fn backend_name(&self) -> &'static str;

    /// Whether this backend accepts shader sources in `language`
    fn supports_language(&self, language: ShaderLanguage) -> bool;

    /// Enable a driver feature
    fn enable(&mut self, capability: Capability);

    /// Disable a driver feature
    fn disable(&mut self, capability: Capability);

    /// Set the color applied by [`RenderBackend::clear`]
    fn set_clear_color(&mut self, red: f32, green: f32, blue: f32, alpha: f32);

    /// Set the depth value applied by [`RenderBackend::clear`]
    fn set_clear_depth(&mut self, depth: f32);

    /// Set the stencil value applied by [`RenderBackend::clear`]
    fn set_clear_stencil(&mut self, value: i32);

    /// Clear the selected buffers of the bound framebuffer
    fn clear(&mut self, mask: ClearMask);

    /// Set the viewport rectangle in pixels
    fn set_viewport(&mut self, x: i32, y: i32, width: i32, height: i32);

    /// Set the blend equation factors
    fn set_blend_function(&mut self, source: BlendFactor, destination: BlendFactor);

    /// Set the rasterized line width
    fn set_line_width(&mut self, width: f32);

    /// Create an empty GPU buffer object
    fn create_buffer(&mut self) -> RenderResult<BufferKey>;

    /// Bind a buffer to a target, or unbind with `None`
    fn bind_buffer(&mut self, target: BufferTarget, buffer: Option<BufferKey>) -> RenderResult<()>;

    /// Upload bytes into the buffer bound at `target`
    fn buffer_data(
        &mut self,
        target: BufferTarget,
        data: &[u8],
        usage: BufferUsage,
    ) -> RenderResult<()>;

    /// Destroy a buffer object
    fn delete_buffer(&mut self, buffer: BufferKey);

    /// Create an empty texture object
    fn create_texture(&mut self) -> RenderResult<TextureKey>;

    /// Activate a texture unit and bind a texture to it (`None` unbinds)
    fn bind_texture(&mut self, unit: u32, texture: Option<TextureKey>) -> RenderResult<()>;

    /// Upload a full 2D image into a texture
    fn upload_texture_2d(
        &mut self,
        texture: TextureKey,
        width: u32,
        height: u32,
        format: TextureFormat,
        pixels: &[u8],
    ) -> RenderResult<()>;

    /// Set minification/magnification filtering for a texture
    fn set_texture_filtering(
        &mut self,
        texture: TextureKey,
        minify: FilterMode,
        magnify: FilterMode,
    ) -> RenderResult<()>;

    /// Set horizontal/vertical wrap modes for a texture
    fn set_texture_wrap(
        &mut self,
        texture: TextureKey,
        horizontal: WrapMode,
        vertical: WrapMode,
    ) -> RenderResult<()>;

    /// Generate the mipmap chain for a texture from its base level
    fn generate_mipmaps(&mut self, texture: TextureKey) -> RenderResult<()>;

    /// Destroy a texture object
    fn delete_texture(&mut self, texture: TextureKey);

    /// Create an empty framebuffer object
    fn create_framebuffer(&mut self) -> RenderResult<FramebufferKey>;

    /// Bind a framebuffer for read/write/both, or restore the default
    /// framebuffer with `None`
    fn bind_framebuffer(
        &mut self,
        target: FramebufferTarget,
        framebuffer: Option<FramebufferKey>,
    ) -> RenderResult<()>;

    /// Attach a texture to a framebuffer slot (`None` detaches)
    fn attach_framebuffer_texture(
        &mut self,
        framebuffer: FramebufferKey,
        attachment: FramebufferAttachment,
        texture: Option<TextureKey>,
    ) -> RenderResult<()>;

    /// Query the completeness state of a framebuffer
    fn framebuffer_status(&mut self, framebuffer: FramebufferKey) -> RenderResult<FramebufferStatus>;

    /// Destroy a framebuffer object (attached textures are not destroyed)
    fn delete_framebuffer(&mut self, framebuffer: FramebufferKey);

    /// Compile and link a shader pipeline from source text
    ///
    /// Compile and link failures are reported through
    /// [`crate::render::RenderError::ShaderCompilationFailed`] and
    /// [`crate::render::RenderError::PipelineLinkFailed`] on every backend.
    fn compile_pipeline(&mut self, sources: &PipelineSources) -> RenderResult<PipelineKey>;

    /// Make a pipeline the active program, or unbind with `None`
    fn bind_pipeline(&mut self, pipeline: Option<PipelineKey>) -> RenderResult<()>;

    /// Resolve a uniform slot by name
    ///
    /// Returns `None` when the name does not exist in the pipeline; callers
    /// treat that as a silent skip, not an error.
    fn get_uniform_variable(&mut self, pipeline: PipelineKey, name: &str) -> Option<ShaderVariable>;

    /// Resolve a vertex attribute slot by name
    fn get_attribute_variable(
        &mut self,
        pipeline: PipelineKey,
        name: &str,
    ) -> Option<ShaderVariable>;

    /// Write a typed value into a uniform slot
    ///
    /// The pipeline must be the currently bound one.
    fn set_uniform(
        &mut self,
        pipeline: PipelineKey,
        variable: ShaderVariable,
        value: &UniformValue,
    ) -> RenderResult<()>;

    /// Destroy a pipeline and its location tables
    fn delete_pipeline(&mut self, pipeline: PipelineKey);

    /// Configure the vertex attribute pointers for the next draw
    ///
    /// Attribute locations are resolved by name against the currently bound
    /// pipeline. Both submission paths share the same descriptor shape.
    fn bind_vertex_attributes(
        &mut self,
        attributes: &[VertexAttribute],
        source: VertexSource<'_>,
    ) -> RenderResult<()>;

    /// Draw a range of the bound vertex attributes
    fn draw_arrays(
        &mut self,
        topology: PrimitiveTopology,
        first: i32,
        count: i32,
    ) -> RenderResult<()>;

    /// Draw using the index buffer bound at [`BufferTarget::ElementArray`]
    fn draw_indexed(
        &mut self,
        topology: PrimitiveTopology,
        count: i32,
        index_type: IndexType,
        byte_offset: i32,
    ) -> RenderResult<()>;

    /// Downcast to the concrete backend type
    ///
    /// Used by tests and by advanced callers that need backend-specific
    /// state; ordinary rendering code never goes through this.
    fn as_any(&self) -> &dyn Any;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec3;

    #[test]
    fn test_texture_format_from_channels() {
        assert_eq!(TextureFormat::from_channels(3), TextureFormat::Rgb);
        assert_eq!(TextureFormat::from_channels(4), TextureFormat::Rgba);
        assert_eq!(TextureFormat::Rgb.bytes_per_pixel(), 3);
        assert_eq!(TextureFormat::Rgba.bytes_per_pixel(), 4);
    }

    #[test]
    fn test_uniform_value_from_mat4_is_column_major() {
        let matrix = crate::foundation::math::translation(Vec3::new(1.0, 2.0, 3.0));
        let UniformValue::Mat4(values) = UniformValue::from_mat4(&matrix) else {
            panic!("expected matrix uniform");
        };
        // Translation lives in the last column for column-major storage
        assert_eq!(values[12], 1.0);
        assert_eq!(values[13], 2.0);
        assert_eq!(values[14], 3.0);
        assert_eq!(values[15], 1.0);
    }

    #[test]
    fn test_clear_mask_composition() {
        let mask = ClearMask::COLOR | ClearMask::DEPTH;
        assert!(mask.contains(ClearMask::COLOR));
        assert!(!mask.contains(ClearMask::STENCIL));
    }
}
