//! Renderer lifecycle and frame-level operations
//!
//! [`Renderer`] is the owning context for everything the rendering system
//! holds: the backend, the asset source, the resource caches, the material
//! and light registries, and the transform pipeline. Exactly one backend
//! may exist per process; starting a second renderer while one is live is
//! a fatal programming error, detected at startup.
//!
//! Shutdown ordering matters: the caches delete their GPU resources through
//! the backend first, and only then is the backend itself destroyed.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::assets::AssetSource;
use crate::core::config::RenderConfig;
use crate::foundation::math::Mat4;
use crate::render::backend::{
    BlendFactor, Capability, ClearMask, FramebufferTarget, PipelineKey, RenderBackend,
};
use crate::render::backends::{create_backend, GlLoader};
use crate::render::error::{fatal, RenderError, RenderResult};
use crate::render::framebuffer::Framebuffer;
use crate::render::lighting::{Light, LightRegistry};
use crate::render::material::{self, JointPose, Material, MaterialRegistry};
use crate::render::shader::PipelineCache;
use crate::render::texture::{Texture, TextureCache, TextureSettings};
use crate::render::transform::TransformPipeline;
use crate::render::vertex::VertexData;

/// Whether a backend is currently live in this process
static BACKEND_LIVE: AtomicBool = AtomicBool::new(false);

/// Owning context for the rendering system
pub struct Renderer {
    backend: Option<Box<dyn RenderBackend>>,
    assets: Box<dyn AssetSource>,
    pipelines: PipelineCache,
    textures: TextureCache,
    materials: MaterialRegistry,
    lights: LightRegistry,
    transforms: TransformPipeline,
}

impl Renderer {
    /// Start the rendering system
    ///
    /// Creates the configured backend and sets the initial viewport from the
    /// configured window size. Starting a second renderer while one is live
    /// is fatal.
    ///
    /// # Arguments
    /// * `config` - Backend selection and window dimensions
    /// * `assets` - Source shaders and textures are loaded from
    /// * `loader` - GL proc-address loader, required by hardware backends
    pub fn startup(
        config: &RenderConfig,
        assets: Box<dyn AssetSource>,
        loader: Option<GlLoader<'_>>,
    ) -> RenderResult<Self> {
        if BACKEND_LIVE.swap(true, Ordering::SeqCst) {
            fatal(
                "Render system already started",
                "a second renderer was started while one is live in this process",
            );
        }

        let mut backend = match create_backend(config.backend, loader) {
            Ok(backend) => backend,
            Err(error) => {
                BACKEND_LIVE.store(false, Ordering::SeqCst);
                return Err(error);
            }
        };
        backend.set_viewport(0, 0, config.window_width as i32, config.window_height as i32);
        backend.set_clear_color(0.0, 0.0, 0.0, 1.0);
        backend.set_clear_depth(1.0);

        log::info!(
            "Render system started with {} backend at {}x{}",
            backend.backend_name(),
            config.window_width,
            config.window_height
        );
        Ok(Self {
            backend: Some(backend),
            assets,
            pipelines: PipelineCache::new(),
            textures: TextureCache::new(),
            materials: MaterialRegistry::new(),
            lights: LightRegistry::new(),
            transforms: TransformPipeline::new(),
        })
    }

    /// Stop the rendering system and release every GPU resource
    ///
    /// Caches tear down through the backend before the backend itself is
    /// destroyed. Shutting down a renderer that was never started (or was
    /// already shut down) is a recoverable error.
    pub fn shutdown(&mut self) -> RenderResult<()> {
        let Some(mut backend) = self.backend.take() else {
            return Err(RenderError::NotStarted);
        };

        self.pipelines.teardown(backend.as_mut());
        self.textures.teardown(backend.as_mut());
        drop(backend);

        BACKEND_LIVE.store(false, Ordering::SeqCst);
        log::info!("Render system shut down");
        Ok(())
    }

    /// Direct access to the backend
    pub fn backend_mut(&mut self) -> RenderResult<&mut (dyn RenderBackend + 'static)> {
        self.backend.as_deref_mut().ok_or(RenderError::NotStarted)
    }

    /// Transform pipeline for the current frame
    pub fn transforms(&self) -> &TransformPipeline {
        &self.transforms
    }

    /// Mutable transform pipeline
    pub fn transforms_mut(&mut self) -> &mut TransformPipeline {
        &mut self.transforms
    }

    /// Material registry
    pub fn materials(&self) -> &MaterialRegistry {
        &self.materials
    }

    /// Mutable material registry
    pub fn materials_mut(&mut self) -> &mut MaterialRegistry {
        &mut self.materials
    }

    /// Register a light for this frame
    pub fn add_light(&mut self, light: Light) {
        self.lights.add(light);
    }

    /// Lights registered so far this frame
    pub fn lights(&self) -> &LightRegistry {
        &self.lights
    }

    /// Compile (or fetch the cached) shader pipeline for a source path pair
    pub fn load_pipeline(
        &mut self,
        vertex_path: &str,
        fragment_path: &str,
    ) -> RenderResult<PipelineKey> {
        let backend = self.backend.as_deref_mut().ok_or(RenderError::NotStarted)?;
        self.pipelines
            .get_or_compile(backend, self.assets.as_ref(), vertex_path, fragment_path)
    }

    /// Load (or fetch the cached) texture for a file path
    pub fn load_texture(&mut self, path: &str, settings: TextureSettings) -> RenderResult<Texture> {
        let backend = self.backend.as_deref_mut().ok_or(RenderError::NotStarted)?;
        self.textures
            .get_or_load(backend, self.assets.as_ref(), path, settings)
    }

    /// Apply a registered material with the current transforms
    pub fn apply_material(&mut self, name: &str) -> RenderResult<()> {
        let backend = self.backend.as_deref_mut().ok_or(RenderError::NotStarted)?;
        let material = self
            .materials
            .get(name)
            .ok_or(RenderError::UnknownHandle { kind: "material" })?;
        material::apply(backend, &self.transforms, material)
    }

    /// Reset the unit-level state of a registered material
    pub fn remove_material(&mut self, name: &str) -> RenderResult<()> {
        let backend = self.backend.as_deref_mut().ok_or(RenderError::NotStarted)?;
        let material = self
            .materials
            .get(name)
            .ok_or(RenderError::UnknownHandle { kind: "material" })?;
        material::remove(backend, material)
    }

    /// Upload this frame's lights to a registered material and clear them
    pub fn update_lights_on_material(&mut self, name: &str) -> RenderResult<()> {
        let backend = self.backend.as_deref_mut().ok_or(RenderError::NotStarted)?;
        let material = self
            .materials
            .get(name)
            .ok_or(RenderError::UnknownHandle { kind: "material" })?;
        material::update_lights(backend, material, &mut self.lights)
    }

    /// Upload skeleton joint matrices to a registered material
    pub fn update_skeleton_on_material(
        &mut self,
        name: &str,
        object_root: &Mat4,
        poses: &[JointPose],
    ) -> RenderResult<()> {
        let backend = self.backend.as_deref_mut().ok_or(RenderError::NotStarted)?;
        let material = self
            .materials
            .get(name)
            .ok_or(RenderError::UnknownHandle { kind: "material" })?;
        material::update_skeleton(backend, material, object_root, poses)
    }

    /// Submit vertex data and draw it with the bound pipeline
    pub fn draw(&mut self, data: &VertexData) -> RenderResult<()> {
        let backend = self.backend.as_deref_mut().ok_or(RenderError::NotStarted)?;
        backend.bind_vertex_attributes(data.layout(), data.source())?;
        backend.draw_arrays(data.topology(), 0, data.vertex_count())
    }

    /// Promote vertex data to a GPU buffer
    pub fn upload_vertices(&mut self, data: &mut VertexData) -> RenderResult<()> {
        let backend = self.backend.as_deref_mut().ok_or(RenderError::NotStarted)?;
        data.upload(backend)
    }

    /// Release vertex data's GPU buffer
    pub fn release_vertices(&mut self, data: &mut VertexData) -> RenderResult<()> {
        let backend = self.backend.as_deref_mut().ok_or(RenderError::NotStarted)?;
        data.release(backend);
        Ok(())
    }

    /// Create an offscreen framebuffer
    pub fn create_framebuffer(&mut self) -> RenderResult<Framebuffer> {
        let backend = self.backend.as_deref_mut().ok_or(RenderError::NotStarted)?;
        Framebuffer::new(backend)
    }

    /// Bind a framebuffer for rendering, or `None` for the default target
    ///
    /// Binding an incomplete framebuffer fails with its specific
    /// incompleteness cause.
    pub fn bind_framebuffer(
        &mut self,
        target: FramebufferTarget,
        framebuffer: Option<&Framebuffer>,
    ) -> RenderResult<()> {
        let backend = self.backend.as_deref_mut().ok_or(RenderError::NotStarted)?;
        match framebuffer {
            Some(framebuffer) => {
                framebuffer.require_complete(backend)?;
                backend.bind_framebuffer(target, Some(framebuffer.key()))
            }
            None => backend.bind_framebuffer(target, None),
        }
    }

    /// Destroy an offscreen framebuffer
    pub fn destroy_framebuffer(&mut self, framebuffer: Framebuffer) -> RenderResult<()> {
        let backend = self.backend.as_deref_mut().ok_or(RenderError::NotStarted)?;
        framebuffer.destroy(backend);
        Ok(())
    }

    /// Set the clear color
    pub fn set_clear_color(&mut self, red: f32, green: f32, blue: f32, alpha: f32) -> RenderResult<()> {
        self.backend_mut()?.set_clear_color(red, green, blue, alpha);
        Ok(())
    }

    /// Clear the bound render target
    pub fn clear(&mut self, mask: ClearMask) -> RenderResult<()> {
        self.backend_mut()?.clear(mask);
        Ok(())
    }

    /// Set the viewport rectangle
    pub fn set_viewport(&mut self, x: i32, y: i32, width: i32, height: i32) -> RenderResult<()> {
        self.backend_mut()?.set_viewport(x, y, width, height);
        Ok(())
    }

    /// Enable a fixed-function capability
    pub fn enable(&mut self, capability: Capability) -> RenderResult<()> {
        self.backend_mut()?.enable(capability);
        Ok(())
    }

    /// Disable a fixed-function capability
    pub fn disable(&mut self, capability: Capability) -> RenderResult<()> {
        self.backend_mut()?.disable(capability);
        Ok(())
    }

    /// Set the blend equation factors
    pub fn set_blend_function(
        &mut self,
        source: BlendFactor,
        destination: BlendFactor,
    ) -> RenderResult<()> {
        self.backend_mut()?.set_blend_function(source, destination);
        Ok(())
    }

    /// Build a material in the registry, compiling its pipeline through the
    /// cache
    pub fn create_material(
        &mut self,
        name: &str,
        vertex_path: &str,
        fragment_path: &str,
    ) -> RenderResult<()> {
        let pipeline = self.load_pipeline(vertex_path, fragment_path)?;
        let material = Material::new(name).with_pipeline(pipeline);
        self.materials.insert(material);
        Ok(())
    }
}

impl Drop for Renderer {
    fn drop(&mut self) {
        // Best-effort cleanup for renderers not shut down explicitly
        if self.backend.is_some() {
            let _ = self.shutdown();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::MemoryAssetSource;
    use crate::core::config::BackendKind;
    use crate::render::backends::NullBackend;
    use std::sync::Mutex;

    // Startup tests share the process-wide backend flag and must not
    // overlap
    static STARTUP_LOCK: Mutex<()> = Mutex::new(());

    fn lock() -> std::sync::MutexGuard<'static, ()> {
        STARTUP_LOCK
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn null_config() -> RenderConfig {
        RenderConfig {
            backend: BackendKind::Null,
            ..RenderConfig::default()
        }
    }

    fn test_assets() -> Box<MemoryAssetSource> {
        let mut assets = MemoryAssetSource::new();
        assets.insert("shaders/basic.vert", b"void main() {}".to_vec());
        assets.insert("shaders/basic.frag", b"void main() {}".to_vec());
        Box::new(assets)
    }

    #[test]
    fn test_startup_then_shutdown_releases_the_process_slot() {
        let _guard = lock();
        let mut renderer = Renderer::startup(&null_config(), test_assets(), None).unwrap();
        renderer.shutdown().unwrap();

        // After shutdown a fresh renderer can start again
        let mut second = Renderer::startup(&null_config(), test_assets(), None).unwrap();
        second.shutdown().unwrap();
    }

    #[test]
    fn test_second_shutdown_is_recoverable() {
        let _guard = lock();
        let mut renderer = Renderer::startup(&null_config(), test_assets(), None).unwrap();
        renderer.shutdown().unwrap();
        assert!(matches!(renderer.shutdown(), Err(RenderError::NotStarted)));
    }

    #[test]
    #[should_panic(expected = "Render system already started")]
    fn test_double_startup_is_fatal() {
        let _guard = lock();
        let _first = Renderer::startup(&null_config(), test_assets(), None).unwrap();
        let _second = Renderer::startup(&null_config(), test_assets(), None);
    }

    #[test]
    fn test_operations_after_shutdown_report_not_started() {
        let _guard = lock();
        let mut renderer = Renderer::startup(&null_config(), test_assets(), None).unwrap();
        renderer.shutdown().unwrap();
        assert!(matches!(
            renderer.clear(ClearMask::COLOR),
            Err(RenderError::NotStarted)
        ));
        assert!(matches!(
            renderer.load_texture("a.png", TextureSettings::default()),
            Err(RenderError::NotStarted)
        ));
    }

    #[test]
    fn test_shutdown_tears_caches_down_before_the_backend() {
        let _guard = lock();
        let mut renderer = Renderer::startup(&null_config(), test_assets(), None).unwrap();
        renderer
            .load_pipeline("shaders/basic.vert", "shaders/basic.frag")
            .unwrap();
        renderer
            .load_texture("missing.png", TextureSettings::default())
            .unwrap();

        {
            let backend = renderer.backend_mut().unwrap();
            let null = backend.as_any().downcast_ref::<NullBackend>().unwrap();
            assert_eq!(null.live_pipelines(), 1);
            assert_eq!(null.live_textures(), 1);
        }
        renderer.shutdown().unwrap();
    }

    #[test]
    fn test_material_flow_through_the_renderer() {
        let _guard = lock();
        let mut renderer = Renderer::startup(&null_config(), test_assets(), None).unwrap();
        renderer
            .create_material("hull", "shaders/basic.vert", "shaders/basic.frag")
            .unwrap();

        renderer.apply_material("hull").unwrap();
        {
            let backend = renderer.backend_mut().unwrap();
            let null = backend.as_any().downcast_ref::<NullBackend>().unwrap();
            assert!(null.bound_pipeline().is_some());
        }

        renderer.remove_material("hull").unwrap();
        assert!(matches!(
            renderer.apply_material("unknown"),
            Err(RenderError::UnknownHandle { kind: "material" })
        ));
        renderer.shutdown().unwrap();
    }
}
