//! # Rendering System
//!
//! Cross-platform rendering core built around one backend contract. A
//! single [`Renderer`] owns the active backend (desktop OpenGL, embedded
//! OpenGL ES, or the no-op null backend) together with the shader pipeline
//! and texture caches, the material and light registries, and the transform
//! pipeline that feeds every draw.
//!
//! The typical frame:
//!
//! 1. set the view from a [`Camera`] and a projection on the
//!    [`TransformPipeline`]
//! 2. push/pop the model matrix stack while traversing the scene
//! 3. apply a [`Material`], upload lights, submit vertex data, remove the
//!    material
//! 4. clear and repeat

pub mod backend;
pub mod backends;
pub mod camera;
pub mod error;
pub mod framebuffer;
pub mod lighting;
pub mod material;
pub mod renderer;
pub mod shader;
pub mod texture;
pub mod transform;
pub mod vertex;

pub use backend::{
    BlendFactor, BufferKey, BufferTarget, BufferUsage, Capability, ClearMask, FilterMode,
    FramebufferAttachment, FramebufferKey, FramebufferTarget, IndexType, PipelineKey,
    PipelineSources, PrimitiveTopology, RenderBackend, ScalarType, ShaderLanguage, ShaderVariable,
    TextureFormat, TextureKey, UniformValue, VertexAttribute, VertexSource, MAX_COLOR_ATTACHMENTS,
};
pub use camera::Camera;
pub use error::{FramebufferStatus, RenderError, RenderResult};
pub use framebuffer::Framebuffer;
pub use lighting::{Light, LightRegistry, MAX_LIGHTS};
pub use material::{JointPose, Material, MaterialRegistry, TextureBinding, MAX_JOINTS};
pub use renderer::Renderer;
pub use shader::PipelineCache;
pub use texture::{Texture, TextureCache, TextureSettings};
pub use transform::{MatrixStack, Projection, TransformPipeline};
pub use vertex::VertexData;
