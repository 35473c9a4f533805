//! # Prism Engine
//!
//! A cross-platform rendering core with swappable graphics backends.
//!
//! ## Features
//!
//! - **One Backend Contract**: Desktop OpenGL, embedded OpenGL ES, and a
//!   no-op backend behind a single trait, selected once at startup
//! - **Transform Pipeline**: Model matrix stack, camera-derived view, and
//!   closed-form orthographic/perspective projections
//! - **Materials**: Shader pipelines bundled with textures, uniforms, and
//!   lights, applied and removed as a unit
//! - **Resource Caches**: Shader pipelines and textures loaded at most once
//!   per source path
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use prism_engine::assets::FileAssetSource;
//! use prism_engine::core::config::RenderConfig;
//! use prism_engine::render::{Camera, ClearMask, Renderer};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     prism_engine::foundation::logging::init();
//!
//!     let config = RenderConfig::default();
//!     let assets = Box::new(FileAssetSource::new(&config.asset_root));
//!     let mut renderer = Renderer::startup(&config, assets, None)?;
//!
//!     renderer.create_material("basic", "shaders/basic.vert", "shaders/basic.frag")?;
//!     renderer.transforms_mut().set_view_from_camera(&Camera::new());
//!     renderer.transforms_mut().set_perspective(90.0, config.aspect_ratio(), 0.1, 100.0);
//!
//!     renderer.clear(ClearMask::COLOR | ClearMask::DEPTH)?;
//!     renderer.apply_material("basic")?;
//!     // submit vertex data, remove the material, present
//!
//!     renderer.shutdown()?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod assets;
pub mod core;
pub mod foundation;
pub mod render;

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        assets::{AssetSource, FileAssetSource},
        core::config::{BackendKind, RenderConfig},
        foundation::math::{Mat4, Vec2, Vec3, Vec4},
        render::{
            Camera, ClearMask, Light, Material, Renderer, TextureSettings, TransformPipeline,
            VertexData,
        },
    };
}
