//! Image loading utilities for texture data
//!
//! Decodes image file bytes into raw pixel data ready for GPU upload. The
//! channel count of the source image is preserved where possible (3-channel
//! images stay RGB, everything else is expanded to RGBA) so the texture
//! cache can pick the matching upload format.

use crate::assets::AssetError;

/// Decoded image data ready for GPU upload
///
/// Rows are stored top-to-bottom as decoded from the file. Renderers with a
/// bottom-left texture origin call [`ImageData::flip_vertical`] to reverse
/// the row order in place before upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageData {
    /// Raw pixel data, tightly packed rows
    pub data: Vec<u8>,
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    /// Number of color channels (3 for RGB, 4 for RGBA)
    pub channels: u8,
}

impl ImageData {
    /// Decode an image from file bytes
    ///
    /// Source images with exactly three channels are kept as RGB; all other
    /// layouts (grayscale, paletted, 16-bit, alpha) are converted to RGBA8.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, AssetError> {
        let img = image::load_from_memory(bytes)
            .map_err(|e| AssetError::DecodeFailed(format!("image decode failed: {e}")))?;

        let decoded = match img.color() {
            image::ColorType::Rgb8 => {
                let rgb = img.to_rgb8();
                let (width, height) = rgb.dimensions();
                Self {
                    data: rgb.into_raw(),
                    width,
                    height,
                    channels: 3,
                }
            }
            _ => {
                let rgba = img.to_rgba8();
                let (width, height) = rgba.dimensions();
                Self {
                    data: rgba.into_raw(),
                    width,
                    height,
                    channels: 4,
                }
            }
        };

        log::debug!(
            "Decoded image {}x{} with {} channels",
            decoded.width,
            decoded.height,
            decoded.channels
        );
        Ok(decoded)
    }

    /// Build raw image data from already-decoded pixels
    ///
    /// `data` must hold exactly `width * height * channels` bytes.
    pub fn from_raw(data: Vec<u8>, width: u32, height: u32, channels: u8) -> Self {
        debug_assert_eq!(data.len(), (width * height * u32::from(channels)) as usize);
        Self {
            data,
            width,
            height,
            channels,
        }
    }

    /// Create a solid color image (useful for fallbacks and tests)
    pub fn solid_color(width: u32, height: u32, color: [u8; 4]) -> Self {
        let pixel_count = (width * height) as usize;
        let mut data = Vec::with_capacity(pixel_count * 4);
        for _ in 0..pixel_count {
            data.extend_from_slice(&color);
        }
        Self {
            data,
            width,
            height,
            channels: 4,
        }
    }

    /// Reverse the row order in place
    ///
    /// Reconciles the image file top-left origin with a bottom-left texture
    /// origin. Calling it twice restores the original order.
    pub fn flip_vertical(&mut self) {
        flip_rows_in_place(&mut self.data, self.width, self.height, self.channels);
    }

    /// Size of the pixel data in bytes
    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }
}

/// Reverse the row order of tightly packed pixel data in place
pub fn flip_rows_in_place(data: &mut [u8], width: u32, height: u32, channels: u8) {
    let row_len = (width * u32::from(channels)) as usize;
    debug_assert_eq!(data.len(), row_len * height as usize);

    let mut top = 0usize;
    let mut bottom = height as usize;
    while bottom - top > 1 {
        bottom -= 1;
        let (upper, lower) = data.split_at_mut(bottom * row_len);
        upper[top * row_len..(top + 1) * row_len].swap_with_slice(&mut lower[..row_len]);
        top += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solid_color_image() {
        let img = ImageData::solid_color(4, 4, [255, 0, 0, 255]);
        assert_eq!(img.width, 4);
        assert_eq!(img.height, 4);
        assert_eq!(img.channels, 4);
        assert_eq!(img.size_bytes(), 64);
        assert_eq!(&img.data[0..4], &[255, 0, 0, 255]);
    }

    #[test]
    fn test_flip_reverses_row_order() {
        // 2x2 RGBA image, rows [A, B] top to bottom
        let row_a = [1u8, 1, 1, 1, 2, 2, 2, 2];
        let row_b = [3u8, 3, 3, 3, 4, 4, 4, 4];
        let mut img = ImageData::from_raw(
            row_a.iter().chain(row_b.iter()).copied().collect(),
            2,
            2,
            4,
        );

        img.flip_vertical();
        assert_eq!(&img.data[..8], &row_b);
        assert_eq!(&img.data[8..], &row_a);

        // Flipping again restores the original order
        img.flip_vertical();
        assert_eq!(&img.data[..8], &row_a);
        assert_eq!(&img.data[8..], &row_b);
    }

    #[test]
    fn test_flip_odd_height_keeps_middle_row() {
        // 1x3 RGB image, rows [A, B, C]
        let mut img = ImageData::from_raw(vec![1, 1, 1, 2, 2, 2, 3, 3, 3], 1, 3, 3);
        img.flip_vertical();
        assert_eq!(img.data, vec![3, 3, 3, 2, 2, 2, 1, 1, 1]);
    }
}
