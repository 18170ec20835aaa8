//! Texture decoding and de-duplication.
//!
//! Texture failures never abort a model load. They are logged and the slot
//! gets [`TextureId::NULL`], which the renderer treats as "no texture".

use std::path::Path;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use image::DynamicImage;
use rustc_hash::FxHashMap;

use umbra_core::{Result, TextureSource, UmbraError};

use crate::gpu::GpuBackend;

/// Backend handle of an uploaded texture. `0` means "no texture".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct TextureId(pub u32);

impl TextureId {
    pub const NULL: Self = Self(0);

    #[inline]
    #[must_use]
    pub fn is_null(self) -> bool {
        self.0 == 0
    }
}

/// Channel layout of decoded pixels, one byte per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    R8,
    Rg8,
    Rgb8,
    Rgba8,
}

impl PixelFormat {
    #[must_use]
    pub fn channels(self) -> usize {
        match self {
            PixelFormat::R8 => 1,
            PixelFormat::Rg8 => 2,
            PixelFormat::Rgb8 => 3,
            PixelFormat::Rgba8 => 4,
        }
    }
}

/// CPU-side image ready for upload.
#[derive(Debug, Clone)]
pub struct DecodedTexture {
    pub label: String,
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    pub pixels: Vec<u8>,
}

/// Decodes a `data:[<mime>][;base64],<payload>` URI.
pub(crate) fn decode_data_uri(uri: &str) -> Option<Vec<u8>> {
    let rest = uri.strip_prefix("data:")?;
    let (header, payload) = rest.split_once(',')?;
    if header.ends_with(";base64") {
        BASE64.decode(payload).ok()
    } else {
        Some(payload.as_bytes().to_vec())
    }
}

/// Reads and decodes one texture.
///
/// File paths are resolved against `directory`. 8-bit gray, gray-alpha, RGB
/// and RGBA images are kept as they are; 16-bit variants are reduced to 8
/// bits. Floating-point images are rejected.
pub fn decode_texture(source: &TextureSource, directory: &Path) -> Result<DecodedTexture> {
    let label = source.cache_key();

    let image = match source {
        TextureSource::Embedded { bytes, .. } => image::load_from_memory(bytes)
            .map_err(|e| UmbraError::ImageDecodeError(format!("{label}: {e}")))?,
        TextureSource::File(path) => {
            let as_str = path.to_string_lossy();
            if as_str.starts_with("data:") {
                let bytes = decode_data_uri(&as_str).ok_or_else(|| UmbraError::TextureLoad {
                    path: "<data uri>".to_string(),
                    reason: "malformed data URI".to_string(),
                })?;
                image::load_from_memory(&bytes)
                    .map_err(|e| UmbraError::ImageDecodeError(format!("<data uri>: {e}")))?
            } else {
                let full = directory.join(path);
                let bytes = std::fs::read(&full).map_err(|e| UmbraError::TextureLoad {
                    path: full.display().to_string(),
                    reason: e.to_string(),
                })?;
                image::load_from_memory(&bytes).map_err(|e| UmbraError::TextureLoad {
                    path: full.display().to_string(),
                    reason: e.to_string(),
                })?
            }
        }
    };

    let (width, height) = (image.width(), image.height());
    let (format, pixels) = match image {
        DynamicImage::ImageLuma8(img) => (PixelFormat::R8, img.into_raw()),
        DynamicImage::ImageLumaA8(img) => (PixelFormat::Rg8, img.into_raw()),
        DynamicImage::ImageRgb8(img) => (PixelFormat::Rgb8, img.into_raw()),
        DynamicImage::ImageRgba8(img) => (PixelFormat::Rgba8, img.into_raw()),
        img @ DynamicImage::ImageLuma16(_) => (PixelFormat::R8, img.into_luma8().into_raw()),
        img @ DynamicImage::ImageLumaA16(_) => (PixelFormat::Rg8, img.into_luma_alpha8().into_raw()),
        img @ DynamicImage::ImageRgb16(_) => (PixelFormat::Rgb8, img.into_rgb8().into_raw()),
        img @ DynamicImage::ImageRgba16(_) => (PixelFormat::Rgba8, img.into_rgba8().into_raw()),
        other => {
            return Err(UmbraError::UnsupportedTextureLayout {
                path: label,
                layout: format!("{:?}", other.color()),
            });
        }
    };

    Ok(DecodedTexture {
        label,
        width,
        height,
        format,
        pixels,
    })
}

/// Uploads each distinct texture source once.
///
/// Failures are cached too, so a missing file is reported once per model
/// rather than once per material.
#[derive(Debug, Default)]
pub struct TextureCache {
    loaded: FxHashMap<String, TextureId>,
    failures: usize,
}

impl TextureCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_load(
        &mut self,
        source: &TextureSource,
        directory: &Path,
        backend: &mut dyn GpuBackend,
    ) -> TextureId {
        let key = source.cache_key();
        if let Some(&id) = self.loaded.get(&key) {
            return id;
        }

        let id = match decode_texture(source, directory) {
            Ok(decoded) => backend.create_texture(&decoded),
            Err(err) => {
                log::warn!("Texture '{key}' unavailable, using none: {err}");
                self.failures += 1;
                TextureId::NULL
            }
        };
        self.loaded.insert(key, id);
        id
    }

    /// Distinct non-null textures, in no particular order.
    pub fn textures(&self) -> impl Iterator<Item = TextureId> + '_ {
        self.loaded.values().copied().filter(|id| !id.is_null())
    }

    #[must_use]
    pub fn failures(&self) -> usize {
        self.failures
    }
}
