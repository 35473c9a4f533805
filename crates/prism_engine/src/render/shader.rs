//! Shader pipeline cache
//!
//! Compiled shader pipelines are cached by their source file path pair, so
//! materials sharing the same vertex and fragment sources share one compiled
//! pipeline. The cache owns every pipeline it hands out and deletes them all
//! during teardown, before the backend itself is destroyed.

use std::collections::HashMap;

use crate::assets::AssetSource;
use crate::render::backend::{PipelineKey, PipelineSources, RenderBackend, ShaderLanguage};
use crate::render::error::{RenderError, RenderResult};

/// Cache of compiled shader pipelines keyed by source path pair
#[derive(Default)]
pub struct PipelineCache {
    pipelines: HashMap<(String, String), PipelineKey>,
}

impl PipelineCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch the pipeline for a vertex/fragment source pair, compiling it on
    /// first request
    ///
    /// Repeated requests for the same path pair return the same key without
    /// touching the asset source or the backend again. The shader dialect is
    /// chosen from what the backend reports it accepts.
    ///
    /// # Arguments
    /// * `backend` - Backend to compile with
    /// * `assets` - Source the shader text is read from
    /// * `vertex_path` - Path of the vertex stage source
    /// * `fragment_path` - Path of the fragment stage source
    pub fn get_or_compile(
        &mut self,
        backend: &mut dyn RenderBackend,
        assets: &dyn AssetSource,
        vertex_path: &str,
        fragment_path: &str,
    ) -> RenderResult<PipelineKey> {
        let key = (vertex_path.to_string(), fragment_path.to_string());
        if let Some(&pipeline) = self.pipelines.get(&key) {
            return Ok(pipeline);
        }

        let language = select_language(backend)?;
        let vertex_source = read_source(assets, vertex_path)?;
        let fragment_source = read_source(assets, fragment_path)?;

        log::info!("Compiling shader pipeline {vertex_path} + {fragment_path}");
        let pipeline = backend.compile_pipeline(&PipelineSources {
            vertex_source,
            fragment_source,
            language,
        })?;

        self.pipelines.insert(key, pipeline);
        Ok(pipeline)
    }

    /// Number of cached pipelines
    pub fn len(&self) -> usize {
        self.pipelines.len()
    }

    /// True when nothing has been compiled yet
    pub fn is_empty(&self) -> bool {
        self.pipelines.is_empty()
    }

    /// Delete every cached pipeline through the backend
    ///
    /// Must run while the backend is still alive; the renderer calls this
    /// ahead of backend destruction during shutdown.
    pub fn teardown(&mut self, backend: &mut dyn RenderBackend) {
        log::debug!("Tearing down {} cached shader pipelines", self.pipelines.len());
        for (_, pipeline) in self.pipelines.drain() {
            backend.delete_pipeline(pipeline);
        }
    }
}

fn select_language(backend: &dyn RenderBackend) -> RenderResult<ShaderLanguage> {
    [ShaderLanguage::Glsl, ShaderLanguage::Essl]
        .into_iter()
        .find(|&language| backend.supports_language(language))
        .ok_or(RenderError::NoCompatibleShaderLanguage {
            backend: backend.backend_name(),
        })
}

fn read_source(assets: &dyn AssetSource, path: &str) -> RenderResult<String> {
    let bytes = assets.read(path)?;
    String::from_utf8(bytes).map_err(|_| {
        RenderError::ShaderCompilationFailed(format!("shader source {path} is not valid UTF-8"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::MemoryAssetSource;
    use crate::render::backends::NullBackend;

    fn shader_assets() -> MemoryAssetSource {
        let mut assets = MemoryAssetSource::new();
        assets.insert("shaders/basic.vert", b"void main() {}".to_vec());
        assets.insert("shaders/basic.frag", b"void main() {}".to_vec());
        assets.insert("shaders/lit.frag", b"void main() {}".to_vec());
        assets
    }

    #[test]
    fn test_same_path_pair_compiles_once() {
        let mut backend = NullBackend::new();
        let assets = shader_assets();
        let mut cache = PipelineCache::new();

        let first = cache
            .get_or_compile(&mut backend, &assets, "shaders/basic.vert", "shaders/basic.frag")
            .unwrap();
        let second = cache
            .get_or_compile(&mut backend, &assets, "shaders/basic.vert", "shaders/basic.frag")
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(backend.pipelines_compiled(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_distinct_pairs_get_distinct_pipelines() {
        let mut backend = NullBackend::new();
        let assets = shader_assets();
        let mut cache = PipelineCache::new();

        let basic = cache
            .get_or_compile(&mut backend, &assets, "shaders/basic.vert", "shaders/basic.frag")
            .unwrap();
        let lit = cache
            .get_or_compile(&mut backend, &assets, "shaders/basic.vert", "shaders/lit.frag")
            .unwrap();

        assert_ne!(basic, lit);
        assert_eq!(backend.pipelines_compiled(), 2);
    }

    #[test]
    fn test_missing_source_is_recoverable() {
        let mut backend = NullBackend::new();
        let assets = shader_assets();
        let mut cache = PipelineCache::new();

        let result =
            cache.get_or_compile(&mut backend, &assets, "shaders/missing.vert", "shaders/basic.frag");
        assert!(result.is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_teardown_deletes_all_pipelines() {
        let mut backend = NullBackend::new();
        let assets = shader_assets();
        let mut cache = PipelineCache::new();
        cache
            .get_or_compile(&mut backend, &assets, "shaders/basic.vert", "shaders/basic.frag")
            .unwrap();

        cache.teardown(&mut backend);
        assert!(cache.is_empty());
        assert_eq!(backend.live_pipelines(), 0);
    }
}
