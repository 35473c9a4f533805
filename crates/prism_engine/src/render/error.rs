//! Error types and failure policy for the rendering system
//!
//! Three failure classes exist, mirroring how the engine reacts to each:
//!
//! - **Fatal**: double backend startup, popping the matrix stack base entry,
//!   applying a material without a pipeline. These call [`fatal`], which
//!   surfaces a titled message plus detail and halts.
//! - **Recoverable**: shutting down a never-started renderer, missing asset
//!   files, incomplete framebuffers. Reported as [`RenderError`] values (or
//!   a warning plus a safe default resource) and execution continues.
//! - **Silent**: unresolved uniform names degrade silently; debug builds
//!   leave a trace-level breadcrumb.

use thiserror::Error;

use crate::assets::AssetError;

/// Result type for rendering operations
pub type RenderResult<T> = Result<T, RenderError>;

/// Errors surfaced by the rendering system
#[derive(Debug, Error)]
pub enum RenderError {
    /// Renderer initialization failed during setup
    ///
    /// Occurs when the selected backend cannot be constructed, typically
    /// because no GL function loader was supplied for a hardware backend.
    #[error("Renderer initialization failed: {0}")]
    InitializationFailed(String),

    /// An operation was issued against a renderer that was never started
    /// (or was already shut down)
    #[error("Render system was not started")]
    NotStarted,

    /// Resource creation or management failed
    ///
    /// GPU resources (buffers, textures, framebuffers) could not be created
    /// or managed, typically due to driver or memory constraints.
    #[error("Resource creation failed: {0}")]
    ResourceCreationFailed(String),

    /// A shader stage failed to compile
    ///
    /// Carries the driver's info log. Every backend reports compilation
    /// failures through this one channel.
    #[error("Shader compilation failed: {0}")]
    ShaderCompilationFailed(String),

    /// Compiled shader stages failed to link into a pipeline
    #[error("Shader pipeline link failed: {0}")]
    PipelineLinkFailed(String),

    /// No shader dialect shared between the cache request and the backend
    #[error("Backend {backend} supports no requested shader language")]
    NoCompatibleShaderLanguage {
        /// Name of the active backend
        backend: &'static str,
    },

    /// A handle referenced a resource the backend does not own
    #[error("Unknown {kind} handle passed to backend")]
    UnknownHandle {
        /// Resource kind the handle was expected to name
        kind: &'static str,
    },

    /// A framebuffer was bound or queried while incomplete
    ///
    /// Each specific incompleteness cause is reported distinctly.
    #[error("Framebuffer incomplete: {0}")]
    IncompleteFramebuffer(FramebufferStatus),

    /// Backend-specific error occurred
    ///
    /// Wraps native driver errors in a generic form for consistent handling
    /// across backends.
    #[error("Backend error: {0}")]
    BackendError(String),

    /// An asset read or decode failed
    #[error(transparent)]
    Asset(#[from] AssetError),
}

/// Completeness state of a framebuffer as reported by the driver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramebufferStatus {
    /// The framebuffer is complete and can be rendered to
    Complete,
    /// An attachment is attachment-incomplete
    IncompleteAttachment,
    /// No image is attached at all
    MissingAttachment,
    /// Attached images have mismatched dimensions (GL ES)
    IncompleteDimensions,
    /// The draw buffer references a missing attachment
    IncompleteDrawBuffer,
    /// The read buffer references a missing attachment
    IncompleteReadBuffer,
    /// Attachment sample counts do not match
    IncompleteMultisample,
    /// The attachment combination is unsupported by the driver
    Unsupported,
    /// A status code this layer does not recognize
    Unknown(u32),
}

impl std::fmt::Display for FramebufferStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Self::Complete => "complete",
            Self::IncompleteAttachment => "incomplete attachment",
            Self::MissingAttachment => "missing attachment",
            Self::IncompleteDimensions => "attachment dimensions mismatch",
            Self::IncompleteDrawBuffer => "incomplete draw buffer",
            Self::IncompleteReadBuffer => "incomplete read buffer",
            Self::IncompleteMultisample => "attachment sample counts mismatch",
            Self::Unsupported => "unsupported attachment combination",
            Self::Unknown(code) => return write!(f, "unknown status 0x{code:x}"),
        };
        f.write_str(text)
    }
}

/// Halt the process with a titled message and detail string
///
/// Fatal conditions terminate immediately at the point of detection; there
/// is no unwinding-based recovery path for them.
pub fn fatal(title: &str, detail: &str) -> ! {
    log::error!("{title}: {detail}");
    panic!("{title}: {detail}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_framebuffer_status_display_is_distinct() {
        let causes = [
            FramebufferStatus::IncompleteAttachment,
            FramebufferStatus::MissingAttachment,
            FramebufferStatus::IncompleteDimensions,
            FramebufferStatus::IncompleteDrawBuffer,
            FramebufferStatus::IncompleteReadBuffer,
            FramebufferStatus::IncompleteMultisample,
            FramebufferStatus::Unsupported,
        ];
        let mut seen = std::collections::HashSet::new();
        for cause in causes {
            assert!(seen.insert(cause.to_string()), "duplicate text for {cause:?}");
        }
    }

    #[test]
    #[should_panic(expected = "Matrix stack underflow")]
    fn test_fatal_panics_with_title_and_detail() {
        fatal("Matrix stack underflow", "attempted to pop the base entry");
    }
}
