//! Image insertion.

use crate::element::{Element, ImageFormat};
use crate::files::FileBlob;
use crate::state::ToolResult;
use kurbo::{Point, Rect, Size};
use std::io::Cursor;
use thiserror::Error;

/// Image errors.
#[derive(Debug, Error)]
pub enum ImageError {
    #[error("Unsupported image format")]
    Unsupported,
    #[error("Image has no pixels")]
    Empty,
    #[error("Image decode error: {0}")]
    Decode(#[from] ::image::ImageError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Reads the pixel size of encoded image bytes.
pub trait ImageDecoder {
    fn natural_size(&self, bytes: &[u8], mime_type: &str) -> Result<(u32, u32), ImageError>;
}

/// Decoder backed by the `image` crate. Only the header is read.
#[derive(Debug, Clone, Copy, Default)]
pub struct RasterDecoder;

impl ImageDecoder for RasterDecoder {
    fn natural_size(&self, bytes: &[u8], mime_type: &str) -> Result<(u32, u32), ImageError> {
        let format = match ImageFormat::from_mime_type(mime_type) {
            Some(ImageFormat::Png) => ::image::ImageFormat::Png,
            Some(ImageFormat::Jpeg) => ::image::ImageFormat::Jpeg,
            Some(ImageFormat::WebP) => ::image::ImageFormat::WebP,
            _ => return Err(ImageError::Unsupported),
        };
        let reader = ::image::ImageReader::with_format(Cursor::new(bytes), format);
        Ok(reader.into_dimensions()?)
    }
}

/// Scale `(width, height)` down to fit a `max_size` square, keeping the
/// aspect ratio. Smaller images keep their natural size.
pub fn fit_size(width: u32, height: u32, max_size: f64) -> Size {
    let (w, h) = (width as f64, height as f64);
    let scale = (max_size / w).min(max_size / h).min(1.0);
    Size::new(w * scale, h * scale)
}

/// Attach `bytes` as a file and add an image element centered on `center`.
///
/// The format is sniffed from the bytes, falling back to `mime_type`.
pub fn insert_image(
    bytes: &[u8],
    mime_type: Option<&str>,
    center: Point,
    decoder: &dyn ImageDecoder,
    max_size: f64,
) -> Result<ToolResult, ImageError> {
    let format = ImageFormat::from_magic_bytes(bytes)
        .or_else(|| mime_type.and_then(ImageFormat::from_mime_type))
        .ok_or(ImageError::Unsupported)?;
    let (width, height) = decoder.natural_size(bytes, format.mime_type())?;
    if width == 0 || height == 0 {
        return Err(ImageError::Empty);
    }

    let blob = FileBlob::new(format.mime_type(), bytes.to_vec());
    let file_id = blob.id();
    let size = fit_size(width, height, max_size);
    let element = Element::image(file_id.clone(), Rect::from_center_size(center, size));
    let id = element.id();
    log::info!("inserting {:?} image {}x{} as {}", format, width, height, file_id);

    Ok(ToolResult::Compound(vec![
        ToolResult::AddFile(file_id, blob),
        ToolResult::AddElement(element),
        ToolResult::SetSelection(vec![id]),
    ]))
}
