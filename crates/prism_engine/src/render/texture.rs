//! Textures and the file-keyed texture cache
//!
//! Each texture file is uploaded to the GPU at most once; the cache hands
//! out the existing handle for repeated requests of the same path. Missing
//! or undecodable files are recoverable: the cache logs a warning and
//! substitutes a shared solid-white fallback texture so rendering continues
//! with visibly wrong but valid output.

use std::collections::HashMap;

use crate::assets::image_loader::ImageData;
use crate::assets::AssetSource;
use crate::render::backend::{FilterMode, RenderBackend, TextureFormat, TextureKey, WrapMode};
use crate::render::error::RenderResult;

/// Sampling configuration applied to a texture at load time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureSettings {
    /// Minification filter
    pub minify: FilterMode,
    /// Magnification filter
    pub magnify: FilterMode,
    /// Horizontal coordinate wrapping
    pub wrap_horizontal: WrapMode,
    /// Vertical coordinate wrapping
    pub wrap_vertical: WrapMode,
    /// Whether to generate a mipmap chain after upload
    pub generate_mipmaps: bool,
    /// Whether to reverse the row order before upload
    ///
    /// Image files store rows top to bottom while the renderer's texture
    /// origin is bottom-left, so this defaults to on. Turn it off for data
    /// authored in the renderer's orientation.
    pub flip: bool,
}

impl Default for TextureSettings {
    fn default() -> Self {
        Self {
            minify: FilterMode::LinearMipmapLinear,
            magnify: FilterMode::Linear,
            wrap_horizontal: WrapMode::Repeat,
            wrap_vertical: WrapMode::Repeat,
            generate_mipmaps: true,
            flip: true,
        }
    }
}

/// A texture resident on the GPU
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Texture {
    /// Backend handle
    pub key: TextureKey,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Upload format derived from the source channel count
    pub format: TextureFormat,
    /// True when this is the fallback substituted for a failed load
    pub is_fallback: bool,
}

/// Cache of GPU textures keyed by asset file path
#[derive(Default)]
pub struct TextureCache {
    textures: HashMap<String, Texture>,
    fallback: Option<Texture>,
}

impl TextureCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch the texture for a file path, loading and uploading it on first
    /// request
    ///
    /// When [`TextureSettings::flip`] is set, image rows are flipped
    /// vertically before upload to reconcile the file top-left origin with
    /// the renderer's bottom-left texture origin. Failed loads return the
    /// shared fallback texture instead of an error.
    pub fn get_or_load(
        &mut self,
        backend: &mut dyn RenderBackend,
        assets: &dyn AssetSource,
        path: &str,
        settings: TextureSettings,
    ) -> RenderResult<Texture> {
        if let Some(&texture) = self.textures.get(path) {
            return Ok(texture);
        }

        let texture = match self.load(backend, assets, path, settings) {
            Ok(texture) => texture,
            Err(error) => {
                log::warn!("Failed to load texture {path}: {error}; using fallback");
                self.fallback(backend)?
            }
        };

        self.textures.insert(path.to_string(), texture);
        Ok(texture)
    }

    fn load(
        &mut self,
        backend: &mut dyn RenderBackend,
        assets: &dyn AssetSource,
        path: &str,
        settings: TextureSettings,
    ) -> RenderResult<Texture> {
        let bytes = assets.read(path)?;
        let mut image = ImageData::from_bytes(&bytes)?;
        if settings.flip {
            image.flip_vertical();
        }

        log::info!(
            "Loading texture {path} ({}x{}, {} channels)",
            image.width,
            image.height,
            image.channels
        );
        upload(backend, &image, settings, false)
    }

    /// Shared 1x1 solid-white texture used when a load fails
    pub fn fallback(&mut self, backend: &mut dyn RenderBackend) -> RenderResult<Texture> {
        if let Some(texture) = self.fallback {
            return Ok(texture);
        }
        let image = ImageData::solid_color(1, 1, [255, 255, 255, 255]);
        let texture = upload(backend, &image, TextureSettings::default(), true)?;
        self.fallback = Some(texture);
        Ok(texture)
    }

    /// Number of cached path entries (the fallback is not counted)
    pub fn len(&self) -> usize {
        self.textures.len()
    }

    /// True when no paths have been loaded
    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }

    /// Delete every cached texture through the backend
    ///
    /// Must run while the backend is still alive; the renderer calls this
    /// ahead of backend destruction during shutdown.
    pub fn teardown(&mut self, backend: &mut dyn RenderBackend) {
        log::debug!("Tearing down {} cached textures", self.textures.len());
        for (_, texture) in self.textures.drain() {
            if !texture.is_fallback {
                backend.delete_texture(texture.key);
            }
        }
        if let Some(fallback) = self.fallback.take() {
            backend.delete_texture(fallback.key);
        }
    }
}

fn upload(
    backend: &mut dyn RenderBackend,
    image: &ImageData,
    settings: TextureSettings,
    is_fallback: bool,
) -> RenderResult<Texture> {
    let format = TextureFormat::from_channels(image.channels);
    let key = backend.create_texture()?;
    backend.upload_texture_2d(key, image.width, image.height, format, &image.data)?;
    backend.set_texture_filtering(key, settings.minify, settings.magnify)?;
    backend.set_texture_wrap(key, settings.wrap_horizontal, settings.wrap_vertical)?;
    if settings.generate_mipmaps {
        backend.generate_mipmaps(key)?;
    }
    Ok(Texture {
        key,
        width: image.width,
        height: image.height,
        format,
        is_fallback,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::MemoryAssetSource;
    use crate::render::backends::NullBackend;

    fn encode_png(width: u32, height: u32) -> Vec<u8> {
        let image = image::RgbaImage::from_pixel(width, height, image::Rgba([10, 20, 30, 255]));
        let mut bytes = std::io::Cursor::new(Vec::new());
        image
            .write_to(&mut bytes, image::ImageFormat::Png)
            .unwrap();
        bytes.into_inner()
    }

    #[test]
    fn test_same_path_uploads_once() {
        let mut backend = NullBackend::new();
        let mut assets = MemoryAssetSource::new();
        assets.insert("textures/hull.png", encode_png(2, 2));
        let mut cache = TextureCache::new();

        let first = cache
            .get_or_load(&mut backend, &assets, "textures/hull.png", TextureSettings::default())
            .unwrap();
        let second = cache
            .get_or_load(&mut backend, &assets, "textures/hull.png", TextureSettings::default())
            .unwrap();

        assert_eq!(first.key, second.key);
        assert_eq!(backend.textures_created(), 1);
        assert_eq!(assets.read_count(), 1);
    }

    // 2x2 RGBA PNG with distinct rows, [A, B] top to bottom
    fn encode_two_row_png() -> (Vec<u8>, Vec<u8>, Vec<u8>) {
        let row_a = vec![1u8, 1, 1, 255, 2, 2, 2, 255];
        let row_b = vec![3u8, 3, 3, 255, 4, 4, 4, 255];
        let pixels: Vec<u8> = row_a.iter().chain(row_b.iter()).copied().collect();
        let image = image::RgbaImage::from_raw(2, 2, pixels).unwrap();
        let mut bytes = std::io::Cursor::new(Vec::new());
        image
            .write_to(&mut bytes, image::ImageFormat::Png)
            .unwrap();
        (bytes.into_inner(), row_a, row_b)
    }

    #[test]
    fn test_flip_reverses_uploaded_row_order() {
        let mut backend = NullBackend::new();
        let (png, row_a, row_b) = encode_two_row_png();
        let mut assets = MemoryAssetSource::new();
        assets.insert("textures/rows.png", png);
        let mut cache = TextureCache::new();

        let texture = cache
            .get_or_load(&mut backend, &assets, "textures/rows.png", TextureSettings::default())
            .unwrap();

        let uploaded = backend.uploaded_pixels(texture.key).unwrap();
        assert_eq!(&uploaded[..8], &row_b[..]);
        assert_eq!(&uploaded[8..], &row_a[..]);
    }

    #[test]
    fn test_flip_disabled_uploads_file_row_order() {
        let mut backend = NullBackend::new();
        let (png, row_a, row_b) = encode_two_row_png();
        let mut assets = MemoryAssetSource::new();
        assets.insert("textures/rows.png", png);
        let mut cache = TextureCache::new();

        let settings = TextureSettings {
            flip: false,
            ..TextureSettings::default()
        };
        let texture = cache
            .get_or_load(&mut backend, &assets, "textures/rows.png", settings)
            .unwrap();

        let uploaded = backend.uploaded_pixels(texture.key).unwrap();
        assert_eq!(&uploaded[..8], &row_a[..]);
        assert_eq!(&uploaded[8..], &row_b[..]);
    }

    #[test]
    fn test_missing_file_yields_fallback() {
        let mut backend = NullBackend::new();
        let assets = MemoryAssetSource::new();
        let mut cache = TextureCache::new();

        let texture = cache
            .get_or_load(&mut backend, &assets, "textures/missing.png", TextureSettings::default())
            .unwrap();

        assert!(texture.is_fallback);
        assert_eq!(texture.width, 1);
        assert_eq!(texture.height, 1);
    }

    #[test]
    fn test_undecodable_bytes_yield_fallback() {
        let mut backend = NullBackend::new();
        let mut assets = MemoryAssetSource::new();
        assets.insert("textures/bad.png", vec![0, 1, 2, 3]);
        let mut cache = TextureCache::new();

        let texture = cache
            .get_or_load(&mut backend, &assets, "textures/bad.png", TextureSettings::default())
            .unwrap();
        assert!(texture.is_fallback);
    }

    #[test]
    fn test_failed_loads_share_one_fallback() {
        let mut backend = NullBackend::new();
        let assets = MemoryAssetSource::new();
        let mut cache = TextureCache::new();

        let a = cache
            .get_or_load(&mut backend, &assets, "a.png", TextureSettings::default())
            .unwrap();
        let b = cache
            .get_or_load(&mut backend, &assets, "b.png", TextureSettings::default())
            .unwrap();

        assert_eq!(a.key, b.key);
        assert_eq!(backend.textures_created(), 1);
    }

    #[test]
    fn test_teardown_deletes_all_textures() {
        let mut backend = NullBackend::new();
        let mut assets = MemoryAssetSource::new();
        assets.insert("textures/hull.png", encode_png(2, 2));
        let mut cache = TextureCache::new();
        cache
            .get_or_load(&mut backend, &assets, "textures/hull.png", TextureSettings::default())
            .unwrap();
        cache
            .get_or_load(&mut backend, &assets, "textures/missing.png", TextureSettings::default())
            .unwrap();

        cache.teardown(&mut backend);
        assert!(cache.is_empty());
        assert_eq!(backend.live_textures(), 0);
    }
}
