//! # Render Configuration
//!
//! Configuration for the rendering system: which backend to construct at
//! startup, the initial viewport dimensions, and where the asset provider
//! resolves logical paths.
//!
//! Configuration is plain data with serde support so applications can load
//! it from TOML alongside their own settings.

use serde::{Deserialize, Serialize};

/// Which concrete graphics backend the renderer constructs at startup
///
/// The choice is final for the lifetime of the process; there is no backend
/// switching after construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Desktop OpenGL backend (GLSL shader dialect)
    OpenGl,
    /// Embedded / mobile OpenGL ES backend (ESSL shader dialect)
    OpenGlEs,
    /// No-op backend for unsupported targets and headless runs
    Null,
}

impl BackendKind {
    /// Human-readable backend name for logs
    pub fn name(self) -> &'static str {
        match self {
            Self::OpenGl => "OpenGL",
            Self::OpenGlEs => "OpenGL ES",
            Self::Null => "Null",
        }
    }
}

/// Configuration for the rendering system
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Backend selected at startup
    pub backend: BackendKind,
    /// Initial viewport width in pixels
    pub window_width: u32,
    /// Initial viewport height in pixels
    pub window_height: u32,
    /// Root directory the asset provider resolves logical paths against
    pub asset_root: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Null,
            window_width: 1280,
            window_height: 720,
            asset_root: "assets".to_string(),
        }
    }
}

impl RenderConfig {
    /// Parse a configuration from a TOML string
    pub fn from_toml_str(source: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(source)
    }

    /// Aspect ratio of the configured viewport (width / height)
    pub fn aspect_ratio(&self) -> f32 {
        self.window_width as f32 / self.window_height.max(1) as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_uses_null_backend() {
        let config = RenderConfig::default();
        assert_eq!(config.backend, BackendKind::Null);
        assert_eq!(config.window_width, 1280);
    }

    #[test]
    fn test_config_from_toml() {
        let config = RenderConfig::from_toml_str(
            r#"
            backend = "open_gl_es"
            window_width = 800
            window_height = 600
            asset_root = "data"
            "#,
        )
        .expect("valid config");

        assert_eq!(config.backend, BackendKind::OpenGlEs);
        assert_eq!(config.window_width, 800);
        assert_eq!(config.asset_root, "data");
    }

    #[test]
    fn test_partial_toml_falls_back_to_defaults() {
        let config = RenderConfig::from_toml_str("backend = \"open_gl\"").expect("valid config");
        assert_eq!(config.backend, BackendKind::OpenGl);
        assert_eq!(config.window_height, 720);
    }
}
