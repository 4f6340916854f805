//! Color image sources accepted by `Renderer::set_image`.
//!
//! Each variant has exactly one conversion into the RGBA8 raster the backends
//! upload; the caller picks the variant, nothing is sniffed at runtime.

use image::RgbaImage;

/// Borrowed color input.
#[derive(Debug, Clone, Copy)]
pub enum TextureSource<'a> {
    /// A decoded RGBA8 raster.
    Raster(&'a RgbaImage),
    /// Tightly packed row-major bytes, `channels` per pixel (3 = RGB, 4 = RGBA).
    PackedBytes {
        width: u32,
        height: u32,
        channels: u8,
        bytes: &'a [u8],
    },
}

impl TextureSource<'_> {
    /// Convert to an owned RGBA8 raster. `None` for empty, short or malformed input.
    pub fn to_rgba8(&self) -> Option<RgbaImage> {
        match *self {
            TextureSource::Raster(image) => raster_to_rgba8(image),
            TextureSource::PackedBytes {
                width,
                height,
                channels,
                bytes,
            } => packed_to_rgba8(width, height, channels, bytes),
        }
    }
}

fn raster_to_rgba8(image: &RgbaImage) -> Option<RgbaImage> {
    if image.width() == 0 || image.height() == 0 {
        return None;
    }
    Some(image.clone())
}

fn packed_to_rgba8(width: u32, height: u32, channels: u8, bytes: &[u8]) -> Option<RgbaImage> {
    if width == 0 || height == 0 {
        return None;
    }
    let pixels = width as usize * height as usize;
    let expected = pixels * channels as usize;
    if bytes.len() != expected {
        log::warn!(
            "PackedBytes length {} does not match {}x{}x{} = {}",
            bytes.len(),
            width,
            height,
            channels,
            expected
        );
        return None;
    }
    let data = match channels {
        4 => bytes.to_vec(),
        3 => bytes
            .chunks_exact(3)
            .flat_map(|rgb| [rgb[0], rgb[1], rgb[2], 255])
            .collect(),
        other => {
            log::warn!("PackedBytes with {other} channels is not supported");
            return None;
        }
    };
    RgbaImage::from_raw(width, height, data)
}
