//! The embedded-image trailer: a run of `(index, file_size, data)` records
//! following the entity list, present only when `version >= 700`. See
//! `spec.md` §4.6.

use crate::error::ParseError;
use crate::model::{EmbeddedImage, ImageFormat};
use crate::reader::Reader;

/// File format version at which JW-CAD started appending embedded bitmaps
/// after the entity list.
pub const MIN_EMBEDDED_IMAGE_VERSION: u32 = 700;

pub fn decode_embedded_images(
    reader: &mut Reader<'_>,
    version: u32,
) -> Result<Vec<EmbeddedImage>, ParseError> {
    let mut images = Vec::new();
    if version < MIN_EMBEDDED_IMAGE_VERSION {
        return Ok(images);
    }

    while reader.remaining() >= 8 {
        let index = reader.read_i32()?;
        let size_offset = reader.offset();
        let file_size = reader.read_i32()?;
        if file_size < 0 || file_size as usize > reader.remaining() {
            return Err(ParseError::InvalidImageTrailer {
                offset: size_offset,
            });
        }
        let data = reader.read_bytes(file_size as usize)?;
        let format = ImageFormat::detect(&data);
        images.push(EmbeddedImage {
            index,
            file_size,
            data,
            format,
        });
    }

    Ok(images)
}
