//! Fixed-layout file header: signature, version, memo, paper size,
//! write-layer-group, print/dimension settings, and version-gated
//! reserved padding. See `spec.md` §4.3.

use crate::error::ParseError;
use crate::model::{MetadataSettings, PrintSettings, SunpouSettings};
use crate::reader::Reader;

pub const JWW_SIGNATURE: &[u8; 8] = b"JwwData.";

/// Paper size codes documented by `spec.md` §3: 0-4 map to A0-A4, 8 to 2A,
/// 9 to 3A.
const VALID_PAPER_SIZES: &[u32] = &[0, 1, 2, 3, 4, 8, 9];

#[derive(Debug)]
pub struct HeaderFields {
    pub version: u32,
    pub memo: String,
    pub paper_size: u32,
    pub write_layer_group: u32,
    pub print_settings: PrintSettings,
    pub sunpou_settings: SunpouSettings,
    pub metadata_settings: MetadataSettings,
}

pub fn is_jww_signature(data: &[u8]) -> bool {
    data.len() >= JWW_SIGNATURE.len() && &data[..JWW_SIGNATURE.len()] == JWW_SIGNATURE
}

/// Number of reserved padding bytes following the dimension settings
/// record, before the layer table. Not directly observable without a
/// sample corpus (`spec.md` §9 Open Questions); the scheme adopted here —
/// `0` below 351, `16` from 351 up to but not including 420, `32` from
/// 420 on — is recorded as a resolved Open Question in `DESIGN.md`.
fn reserved_padding_len(version: u32) -> usize {
    if version < 351 {
        0
    } else if version < 420 {
        16
    } else {
        32
    }
}

pub fn decode_header(reader: &mut Reader<'_>) -> Result<HeaderFields, ParseError> {
    // Reading the signature bytes fails with `UnexpectedEnd` on inputs
    // shorter than the signature itself (spec.md §8: empty input ->
    // UnexpectedEnd at offset 0); a mismatched-but-present signature is a
    // distinct `InvalidHeader` failure.
    let signature = reader.read_bytes(JWW_SIGNATURE.len())?;
    if signature != JWW_SIGNATURE {
        return Err(ParseError::InvalidHeader {
            offset: 0,
            reason: "missing \"JwwData.\" signature",
        });
    }

    let version = reader.read_u32()?;
    let memo = reader.read_sjis_u8len()?;

    let paper_size_offset = reader.offset();
    let paper_size = reader.read_u32()?;
    if !VALID_PAPER_SIZES.contains(&paper_size) {
        return Err(ParseError::InvalidHeader {
            offset: paper_size_offset,
            reason: "paper_size outside documented range",
        });
    }

    let write_layer_group_offset = reader.offset();
    let write_layer_group = reader.read_u32()?;
    if write_layer_group > 15 {
        return Err(ParseError::InvalidHeader {
            offset: write_layer_group_offset,
            reason: "write_layer_group outside 0..=15",
        });
    }

    let print_settings = PrintSettings {
        origin_x: reader.read_f64()?,
        origin_y: reader.read_f64()?,
        scale: reader.read_f64()?,
        rotation_setting: reader.read_u32()?,
    };

    let sunpou_settings = SunpouSettings {
        sunpou1: reader.read_f64()?,
        sunpou2: reader.read_f64()?,
        sunpou3: reader.read_f64()?,
        sunpou4: reader.read_f64()?,
        sunpou5: reader.read_f64()?,
        dummy: reader.read_u32()?,
        max_line_width: reader.read_f64()?,
    };

    reader.skip(reserved_padding_len(version))?;

    Ok(HeaderFields {
        version,
        memo,
        paper_size,
        write_layer_group,
        print_settings,
        sunpou_settings,
        metadata_settings: MetadataSettings::default(),
    })
}
