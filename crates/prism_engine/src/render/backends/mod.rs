//! Graphics backend implementations
//!
//! One concrete backend exists per native graphics API: desktop OpenGL,
//! embedded OpenGL ES, and a no-op backend for unsupported targets. The
//! renderer constructs exactly one of them at startup through
//! [`create_backend`] and never swaps it afterwards.

pub mod gl;
pub mod gles;
pub mod null;

use std::ffi::c_void;

use crate::core::config::BackendKind;
use crate::render::backend::RenderBackend;
use crate::render::error::{RenderError, RenderResult};

pub use gl::GlBackend;
pub use gles::GlesBackend;
pub use null::NullBackend;

/// Proc-address loader supplied by the windowing layer
///
/// Context and window creation are outside this layer; the hardware
/// backends only need a way to resolve GL entry points from the already
/// current context.
pub type GlLoader<'a> = &'a mut dyn FnMut(&str) -> *const c_void;

/// Construct the backend selected by configuration
///
/// Hardware backends require a proc-address loader; requesting one without
/// a loader is an initialization failure. The null backend never needs one.
pub fn create_backend(
    kind: BackendKind,
    loader: Option<GlLoader<'_>>,
) -> RenderResult<Box<dyn RenderBackend>> {
    log::info!("Creating {} backend", kind.name());
    match kind {
        BackendKind::Null => Ok(Box::new(NullBackend::new())),
        BackendKind::OpenGl => {
            let loader = loader.ok_or_else(|| {
                RenderError::InitializationFailed(
                    "OpenGL backend requires a proc-address loader".to_string(),
                )
            })?;
            Ok(Box::new(GlBackend::new(loader)?))
        }
        BackendKind::OpenGlEs => {
            let loader = loader.ok_or_else(|| {
                RenderError::InitializationFailed(
                    "OpenGL ES backend requires a proc-address loader".to_string(),
                )
            })?;
            Ok(Box::new(GlesBackend::new(loader)?))
        }
    }
}

/// Enum-to-GL-constant conversions shared by the GL-family backends
pub(crate) mod convert {
    use crate::render::backend::{
        BlendFactor, BufferTarget, BufferUsage, Capability, ClearMask, FilterMode, IndexType,
        PrimitiveTopology, ScalarType, WrapMode,
    };
    use crate::render::error::FramebufferStatus;

    pub fn capability(capability: Capability) -> u32 {
        match capability {
            Capability::Blend => glow::BLEND,
            Capability::DepthTest => glow::DEPTH_TEST,
            Capability::CullFace => glow::CULL_FACE,
            Capability::ScissorTest => glow::SCISSOR_TEST,
            Capability::StencilTest => glow::STENCIL_TEST,
            Capability::PolygonOffsetFill => glow::POLYGON_OFFSET_FILL,
            Capability::ProgramPointSize => glow::PROGRAM_POINT_SIZE,
        }
    }

    pub fn blend_factor(factor: BlendFactor) -> u32 {
        match factor {
            BlendFactor::Zero => glow::ZERO,
            BlendFactor::One => glow::ONE,
            BlendFactor::SrcColor => glow::SRC_COLOR,
            BlendFactor::OneMinusSrcColor => glow::ONE_MINUS_SRC_COLOR,
            BlendFactor::DstColor => glow::DST_COLOR,
            BlendFactor::OneMinusDstColor => glow::ONE_MINUS_DST_COLOR,
            BlendFactor::SrcAlpha => glow::SRC_ALPHA,
            BlendFactor::OneMinusSrcAlpha => glow::ONE_MINUS_SRC_ALPHA,
            BlendFactor::DstAlpha => glow::DST_ALPHA,
            BlendFactor::OneMinusDstAlpha => glow::ONE_MINUS_DST_ALPHA,
        }
    }

    pub fn buffer_target(target: BufferTarget) -> u32 {
        match target {
            BufferTarget::Array => glow::ARRAY_BUFFER,
            BufferTarget::ElementArray => glow::ELEMENT_ARRAY_BUFFER,
        }
    }

    pub fn buffer_usage(usage: BufferUsage) -> u32 {
        match usage {
            BufferUsage::Static => glow::STATIC_DRAW,
            BufferUsage::Dynamic => glow::DYNAMIC_DRAW,
            BufferUsage::Stream => glow::STREAM_DRAW,
        }
    }

    pub fn filter_mode(filter: FilterMode) -> i32 {
        let value = match filter {
            FilterMode::Nearest => glow::NEAREST,
            FilterMode::Linear => glow::LINEAR,
            FilterMode::LinearMipmapLinear => glow::LINEAR_MIPMAP_LINEAR,
        };
        value as i32
    }

    pub fn wrap_mode(wrap: WrapMode) -> i32 {
        let value = match wrap {
            WrapMode::Repeat => glow::REPEAT,
            WrapMode::MirroredRepeat => glow::MIRRORED_REPEAT,
            WrapMode::ClampToEdge => glow::CLAMP_TO_EDGE,
        };
        value as i32
    }

    pub fn topology(topology: PrimitiveTopology) -> u32 {
        match topology {
            PrimitiveTopology::Points => glow::POINTS,
            PrimitiveTopology::Lines => glow::LINES,
            PrimitiveTopology::LineStrip => glow::LINE_STRIP,
            PrimitiveTopology::LineLoop => glow::LINE_LOOP,
            PrimitiveTopology::Triangles => glow::TRIANGLES,
            PrimitiveTopology::TriangleStrip => glow::TRIANGLE_STRIP,
            PrimitiveTopology::TriangleFan => glow::TRIANGLE_FAN,
        }
    }

    pub fn scalar_type(scalar: ScalarType) -> u32 {
        match scalar {
            ScalarType::I8 => glow::BYTE,
            ScalarType::U8 => glow::UNSIGNED_BYTE,
            ScalarType::I16 => glow::SHORT,
            ScalarType::U16 => glow::UNSIGNED_SHORT,
            ScalarType::I32 => glow::INT,
            ScalarType::U32 => glow::UNSIGNED_INT,
            ScalarType::F32 => glow::FLOAT,
        }
    }

    pub fn index_type(index: IndexType) -> u32 {
        match index {
            IndexType::U8 => glow::UNSIGNED_BYTE,
            IndexType::U16 => glow::UNSIGNED_SHORT,
            IndexType::U32 => glow::UNSIGNED_INT,
        }
    }

    pub fn clear_mask(mask: ClearMask) -> u32 {
        let mut bits = 0;
        if mask.contains(ClearMask::COLOR) {
            bits |= glow::COLOR_BUFFER_BIT;
        }
        if mask.contains(ClearMask::DEPTH) {
            bits |= glow::DEPTH_BUFFER_BIT;
        }
        if mask.contains(ClearMask::STENCIL) {
            bits |= glow::STENCIL_BUFFER_BIT;
        }
        bits
    }

    pub fn attachment_point(
        attachment: crate::render::backend::FramebufferAttachment,
    ) -> Option<u32> {
        use crate::render::backend::{FramebufferAttachment, MAX_COLOR_ATTACHMENTS};
        match attachment {
            FramebufferAttachment::Color(slot) => {
                if (slot as usize) < MAX_COLOR_ATTACHMENTS {
                    Some(glow::COLOR_ATTACHMENT0 + slot)
                } else {
                    None
                }
            }
            FramebufferAttachment::Depth => Some(glow::DEPTH_ATTACHMENT),
            FramebufferAttachment::Stencil => Some(glow::STENCIL_ATTACHMENT),
        }
    }

    pub fn framebuffer_status(code: u32) -> FramebufferStatus {
        match code {
            glow::FRAMEBUFFER_COMPLETE => FramebufferStatus::Complete,
            glow::FRAMEBUFFER_INCOMPLETE_ATTACHMENT => FramebufferStatus::IncompleteAttachment,
            glow::FRAMEBUFFER_INCOMPLETE_MISSING_ATTACHMENT => {
                FramebufferStatus::MissingAttachment
            }
            glow::FRAMEBUFFER_INCOMPLETE_DIMENSIONS => FramebufferStatus::IncompleteDimensions,
            glow::FRAMEBUFFER_INCOMPLETE_DRAW_BUFFER => FramebufferStatus::IncompleteDrawBuffer,
            glow::FRAMEBUFFER_INCOMPLETE_READ_BUFFER => FramebufferStatus::IncompleteReadBuffer,
            glow::FRAMEBUFFER_INCOMPLETE_MULTISAMPLE => FramebufferStatus::IncompleteMultisample,
            glow::FRAMEBUFFER_UNSUPPORTED => FramebufferStatus::Unsupported,
            other => FramebufferStatus::Unknown(other),
        }
    }
}
