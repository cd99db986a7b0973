//! Top-level orchestration: header, layer table, entity list, image
//! trailer, and block linking, assembled into a [`Document`]. See
//! `spec.md` §4.1 and §6 for the public `parse`/`to_json_string` boundary.

use crate::block;
use crate::entity;
use crate::error::ParseError;
use crate::header;
use crate::image;
use crate::layer;
use crate::model::Document;
use crate::reader::Reader;

/// Decodes a complete `.jww` byte buffer into a [`Document`].
///
/// Decoding is all-or-nothing: any structural failure aborts with a
/// [`ParseError`] and no partial document is returned. Text content is
/// never a source of failure — malformed Shift-JIS is replaced with
/// `U+FFFD`, never rejected.
pub fn parse(bytes: &[u8]) -> Result<Document, ParseError> {
    let mut reader = Reader::new(bytes);

    let header = header::decode_header(&mut reader)?;
    let layer_groups = layer::decode_layer_groups(&mut reader)?;

    let mut metadata_settings = header.metadata_settings;
    let decoded = entity::decode_entities(&mut reader, header.version, &mut metadata_settings)?;
    let mut block_defs = decoded.block_defs;

    let embedded_images = image::decode_embedded_images(&mut reader, header.version)?;

    block::link_blocks(&decoded.entities, &mut block_defs)?;

    Ok(Document {
        version: header.version,
        memo: header.memo,
        paper_size: header.paper_size,
        write_layer_group: header.write_layer_group,
        layer_groups,
        entities: decoded.entities,
        block_defs,
        embedded_images,
        print_settings: header.print_settings,
        sunpou_settings: header.sunpou_settings,
        metadata_settings,
    })
}

/// Serializes a [`Document`] to JSON. Infallible: every type in the
/// document model derives `Serialize` from plain data, so this can only
/// fail on allocation failure, which `serde_json` turns into a panic
/// rather than a `Result` the caller could meaningfully act on — matched
/// here by `expect`, not by inventing an error variant with no failure
/// mode to report.
pub fn to_json_string(document: &Document) -> String {
    serde_json::to_string(document).expect("Document serialization is infallible")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::JWW_SIGNATURE;
    use crate::model::Entity;

    fn tag(name: &str) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&(name.len() as u16).to_le_bytes());
        out.extend_from_slice(name.as_bytes());
        out
    }

    fn minimal_header(version: u32) -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(JWW_SIGNATURE);
        data.extend_from_slice(&version.to_le_bytes());
        data.push(0); // empty memo
        data.extend_from_slice(&0u32.to_le_bytes()); // paper_size
        data.extend_from_slice(&0u32.to_le_bytes()); // write_layer_group
        for _ in 0..3 {
            data.extend_from_slice(&0.0f64.to_le_bytes());
        }
        data.extend_from_slice(&0u32.to_le_bytes()); // rotation_setting
        for _ in 0..5 {
            data.extend_from_slice(&0.0f64.to_le_bytes());
        }
        data.extend_from_slice(&0u32.to_le_bytes()); // dummy
        data.extend_from_slice(&0.0f64.to_le_bytes()); // max_line_width
        let padding_len = if version < 351 {
            0
        } else if version < 420 {
            16
        } else {
            32
        };
        data.extend_from_slice(&vec![0u8; padding_len]);
        data
    }

    fn empty_layer_table() -> Vec<u8> {
        let mut data = Vec::new();
        for _ in 0..16 {
            data.extend_from_slice(&2u32.to_le_bytes()); // state
            data.extend_from_slice(&0u32.to_le_bytes()); // write_layer
            data.extend_from_slice(&100.0f64.to_le_bytes()); // scale
            data.extend_from_slice(&0u32.to_le_bytes()); // protect
            for _ in 0..16 {
                data.extend_from_slice(&2u32.to_le_bytes()); // layer state
                data.extend_from_slice(&0u32.to_le_bytes()); // layer protect
                data.push(0); // empty layer name
            }
            data.push(0); // empty group name
        }
        data
    }

    fn end_marker() -> Vec<u8> {
        0u16.to_le_bytes().to_vec()
    }

    fn base_bytes() -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&0u32.to_le_bytes());
        out.push(1);
        out.extend_from_slice(&1u16.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out
    }

    #[test]
    fn parses_minimal_document_with_no_entities() {
        let mut data = minimal_header(600);
        data.extend(empty_layer_table());
        data.extend(end_marker());

        let document = parse(&data).unwrap();
        assert_eq!(document.version, 600);
        assert!(document.entities.is_empty());
        assert!(document.block_defs.is_empty());
        assert!(document.embedded_images.is_empty());
        assert_eq!(document.layer_groups.len(), 16);
    }

    #[test]
    fn parses_document_with_a_line_and_an_image_trailer() {
        let mut data = minimal_header(700);
        data.extend(empty_layer_table());
        data.extend(tag("CDataSen"));
        data.extend(base_bytes());
        for _ in 0..4 {
            data.extend_from_slice(&0.0f64.to_le_bytes());
        }
        data.extend(end_marker());
        data.extend_from_slice(&0i32.to_le_bytes()); // image index
        data.extend_from_slice(&3i32.to_le_bytes()); // image size
        data.extend_from_slice(&[0xFF, 0xD8, 0xFF]);

        let document = parse(&data).unwrap();
        assert_eq!(document.entities.len(), 1);
        assert!(matches!(document.entities[0], Entity::Line(_)));
        assert_eq!(document.embedded_images.len(), 1);
    }

    #[test]
    fn dangling_block_reference_fails_the_whole_parse() {
        let mut data = minimal_header(600);
        data.extend(empty_layer_table());
        data.extend(tag("CDataBlock"));
        data.extend(base_bytes());
        for _ in 0..5 {
            data.extend_from_slice(&0.0f64.to_le_bytes());
        }
        data.extend_from_slice(&42u32.to_le_bytes()); // def_number
        data.extend(end_marker());

        let err = parse(&data).unwrap_err();
        assert_eq!(err, ParseError::MissingBlockDefinition(42));
    }

    #[test]
    fn empty_input_is_unexpected_end() {
        let err = parse(&[]).unwrap_err();
        assert_eq!(err, ParseError::UnexpectedEnd { offset: 0 });
    }

    #[test]
    fn to_json_string_round_trips_through_serde_json() {
        let mut data = minimal_header(600);
        data.extend(empty_layer_table());
        data.extend(end_marker());
        let document = parse(&data).unwrap();

        let json = to_json_string(&document);
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["version"], 600);
        assert_eq!(value["entities"].as_array().unwrap().len(), 0);
    }

    #[test]
    fn wrong_signature_is_rejected_before_any_other_field() {
        let mut data = b"NotAJwwFile".to_vec();
        data.extend(empty_layer_table());
        let err = parse(&data).unwrap_err();
        assert!(matches!(err, ParseError::InvalidHeader { .. }));
    }
}
