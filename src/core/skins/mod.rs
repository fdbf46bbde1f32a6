// ─── Skin Images ───
// Face crop and helm composite derived from a full skin texture.

use std::path::Path;

use async_trait::async_trait;
use image::{imageops, DynamicImage, GenericImageView, ImageFormat, RgbaImage};

use crate::core::error::ExtractionError;

/// Side length of the face and helm images, in skin pixels.
pub const FACE_SIZE: u32 = 8;
const FACE_ORIGIN: (u32, u32) = (8, 8);
const HELM_ORIGIN: (u32, u32) = (40, 8);
const MIN_SKIN_WIDTH: u32 = 64;
const MIN_SKIN_HEIGHT: u32 = 32;

/// Image collaborator used by the texture fetcher.
///
/// `extract_helm` is only called after `extract_face` has written
/// `face_path` successfully.
#[async_trait]
pub trait SkinExtractor: Send + Sync {
    async fn extract_face(&self, skin: &[u8], face_path: &Path) -> Result<(), ExtractionError>;

    async fn extract_helm(
        &self,
        face_path: &Path,
        skin: &[u8],
        helm_path: &Path,
    ) -> Result<(), ExtractionError>;
}

/// Default extractor backed by the `image` crate. Decoding and encoding run
/// on the blocking pool.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImageSkinExtractor;

#[async_trait]
impl SkinExtractor for ImageSkinExtractor {
    async fn extract_face(&self, skin: &[u8], face_path: &Path) -> Result<(), ExtractionError> {
        let skin = skin.to_vec();
        let face_path = face_path.to_path_buf();
        run_blocking(move || {
            let skin = decode_skin(&skin)?;
            write_png(&crop_face(&skin), &face_path)
        })
        .await
    }

    async fn extract_helm(
        &self,
        face_path: &Path,
        skin: &[u8],
        helm_path: &Path,
    ) -> Result<(), ExtractionError> {
        let face_bytes = tokio::fs::read(face_path)
            .await
            .map_err(|source| ExtractionError::Io {
                path: face_path.to_path_buf(),
                source,
            })?;
        let skin = skin.to_vec();
        let helm_path = helm_path.to_path_buf();
        run_blocking(move || {
            let face = image::load_from_memory_with_format(&face_bytes, ImageFormat::Png)
                .map_err(ExtractionError::Decode)?
                .to_rgba8();
            let skin = decode_skin(&skin)?;
            write_png(&compose_helm(face, &skin), &helm_path)
        })
        .await
    }
}

async fn run_blocking<F>(work: F) -> Result<(), ExtractionError>
where
    F: FnOnce() -> Result<(), ExtractionError> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| ExtractionError::Task(e.to_string()))?
}

/// Decode a skin PNG and reject anything smaller than the legacy 64x32 layout.
pub fn decode_skin(bytes: &[u8]) -> Result<DynamicImage, ExtractionError> {
    let skin = image::load_from_memory(bytes).map_err(ExtractionError::Decode)?;
    let (width, height) = skin.dimensions();
    if width < MIN_SKIN_WIDTH || height < MIN_SKIN_HEIGHT {
        return Err(ExtractionError::InvalidDimensions { width, height });
    }
    Ok(skin)
}

pub fn crop_face(skin: &DynamicImage) -> RgbaImage {
    skin.crop_imm(FACE_ORIGIN.0, FACE_ORIGIN.1, FACE_SIZE, FACE_SIZE)
        .to_rgba8()
}

/// Overlay the hat layer onto the face. Skins without a hat usually fill
/// the layer with one flat colour (or leave it transparent); in that case
/// the face is returned unchanged.
pub fn compose_helm(mut face: RgbaImage, skin: &DynamicImage) -> RgbaImage {
    let overlay = skin
        .crop_imm(HELM_ORIGIN.0, HELM_ORIGIN.1, FACE_SIZE, FACE_SIZE)
        .to_rgba8();
    if has_visible_helm(&overlay) {
        imageops::overlay(&mut face, &overlay, 0, 0);
    }
    face
}

fn has_visible_helm(overlay: &RgbaImage) -> bool {
    let mut pixels = overlay.pixels();
    let Some(first) = pixels.next() else {
        return false;
    };
    let uniform = pixels.all(|p| p == first);
    let transparent = overlay.pixels().all(|p| p[3] == 0);
    !(uniform || transparent)
}

fn write_png(img: &RgbaImage, path: &Path) -> Result<(), ExtractionError> {
    // Explicit format: staged paths do not end in `.png`.
    img.save_with_format(path, ImageFormat::Png)
        .map_err(|source| match source {
            image::ImageError::IoError(source) => ExtractionError::Io {
                path: path.to_path_buf(),
                source,
            },
            source => ExtractionError::Encode {
                path: path.to_path_buf(),
                source,
            },
        })
}
