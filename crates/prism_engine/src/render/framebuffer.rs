//! Offscreen framebuffer bookkeeping
//!
//! Wraps a backend framebuffer handle together with its attachment table so
//! callers can attach textures by slot and ask whether the result is
//! complete before rendering into it. Incompleteness is recoverable; each
//! distinct cause surfaces through [`FramebufferStatus`].

use crate::render::backend::{
    FramebufferAttachment, FramebufferKey, RenderBackend, TextureKey, MAX_COLOR_ATTACHMENTS,
};
use crate::render::error::{FramebufferStatus, RenderError, RenderResult};

/// An offscreen render target and its attachments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Framebuffer {
    key: FramebufferKey,
    color: [Option<TextureKey>; MAX_COLOR_ATTACHMENTS],
    depth: Option<TextureKey>,
    stencil: Option<TextureKey>,
}

impl Framebuffer {
    /// Create an empty framebuffer on the backend
    pub fn new(backend: &mut dyn RenderBackend) -> RenderResult<Self> {
        Ok(Self {
            key: backend.create_framebuffer()?,
            color: [None; MAX_COLOR_ATTACHMENTS],
            depth: None,
            stencil: None,
        })
    }

    /// Backend handle
    pub fn key(&self) -> FramebufferKey {
        self.key
    }

    /// Texture attached at the given slot, if any
    pub fn attachment(&self, attachment: FramebufferAttachment) -> Option<TextureKey> {
        match attachment {
            FramebufferAttachment::Color(slot) => {
                self.color.get(slot as usize).copied().flatten()
            }
            FramebufferAttachment::Depth => self.depth,
            FramebufferAttachment::Stencil => self.stencil,
        }
    }

    /// Attach a texture to a slot, or detach with `None`
    ///
    /// Color slots beyond [`MAX_COLOR_ATTACHMENTS`] are rejected.
    pub fn attach(
        &mut self,
        backend: &mut dyn RenderBackend,
        attachment: FramebufferAttachment,
        texture: Option<TextureKey>,
    ) -> RenderResult<()> {
        match attachment {
            FramebufferAttachment::Color(slot) => {
                let slot = slot as usize;
                if slot >= MAX_COLOR_ATTACHMENTS {
                    return Err(RenderError::BackendError(format!(
                        "color attachment slot {slot} exceeds capacity {MAX_COLOR_ATTACHMENTS}"
                    )));
                }
                backend.attach_framebuffer_texture(self.key, attachment, texture)?;
                self.color[slot] = texture;
            }
            FramebufferAttachment::Depth => {
                backend.attach_framebuffer_texture(self.key, attachment, texture)?;
                self.depth = texture;
            }
            FramebufferAttachment::Stencil => {
                backend.attach_framebuffer_texture(self.key, attachment, texture)?;
                self.stencil = texture;
            }
        }
        Ok(())
    }

    /// Query the driver-reported completeness state
    pub fn status(&self, backend: &mut dyn RenderBackend) -> RenderResult<FramebufferStatus> {
        backend.framebuffer_status(self.key)
    }

    /// Error unless the framebuffer is complete
    ///
    /// Each incompleteness cause maps to its own status value so callers can
    /// log the specific problem.
    pub fn require_complete(&self, backend: &mut dyn RenderBackend) -> RenderResult<()> {
        match self.status(backend)? {
            FramebufferStatus::Complete => Ok(()),
            status => {
                log::warn!("Framebuffer incomplete: {status}");
                Err(RenderError::IncompleteFramebuffer(status))
            }
        }
    }

    /// Delete the backend framebuffer
    ///
    /// Attached textures are not deleted; their owners release them.
    pub fn destroy(self, backend: &mut dyn RenderBackend) {
        backend.delete_framebuffer(self.key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::backends::NullBackend;

    #[test]
    fn test_attach_and_detach_tracks_slots() {
        let mut backend = NullBackend::new();
        let texture = backend.create_texture().unwrap();
        let mut framebuffer = Framebuffer::new(&mut backend).unwrap();

        framebuffer
            .attach(&mut backend, FramebufferAttachment::Color(0), Some(texture))
            .unwrap();
        assert_eq!(
            framebuffer.attachment(FramebufferAttachment::Color(0)),
            Some(texture)
        );

        framebuffer
            .attach(&mut backend, FramebufferAttachment::Color(0), None)
            .unwrap();
        assert_eq!(framebuffer.attachment(FramebufferAttachment::Color(0)), None);
    }

    #[test]
    fn test_color_slot_out_of_range_is_rejected() {
        let mut backend = NullBackend::new();
        let texture = backend.create_texture().unwrap();
        let mut framebuffer = Framebuffer::new(&mut backend).unwrap();

        let result = framebuffer.attach(
            &mut backend,
            FramebufferAttachment::Color(MAX_COLOR_ATTACHMENTS as u32),
            Some(texture),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_complete_framebuffer_passes_the_check() {
        let mut backend = NullBackend::new();
        let framebuffer = Framebuffer::new(&mut backend).unwrap();
        assert!(framebuffer.require_complete(&mut backend).is_ok());
    }
}
