//! The 16 layer groups, each holding a scale, state, and 16 named layers.
//! See `spec.md` §4.4 — field order within a group is fixed by the file
//! format and reproduced here exactly: `state`, `write_layer`, `scale`,
//! `protect`, then 16 `Layer` records, then the group name.

use crate::error::ParseError;
use crate::model::{Layer, LayerGroup};
use crate::reader::Reader;

pub const LAYER_GROUP_COUNT: usize = 16;
pub const LAYERS_PER_GROUP: usize = 16;

pub fn decode_layer_groups(reader: &mut Reader<'_>) -> Result<Vec<LayerGroup>, ParseError> {
    let mut groups = Vec::with_capacity(LAYER_GROUP_COUNT);
    for _ in 0..LAYER_GROUP_COUNT {
        groups.push(decode_layer_group(reader)?);
    }
    Ok(groups)
}

fn decode_layer_group(reader: &mut Reader<'_>) -> Result<LayerGroup, ParseError> {
    let state = reader.read_u32()?;
    let write_layer = reader.read_u32()?;
    let scale = reader.read_f64()?;
    let protect = reader.read_u32()?;

    let mut layers = Vec::with_capacity(LAYERS_PER_GROUP);
    for _ in 0..LAYERS_PER_GROUP {
        layers.push(decode_layer(reader)?);
    }

    let name = reader.read_sjis_u8len()?;

    Ok(LayerGroup {
        state,
        write_layer,
        scale,
        protect,
        name,
        layers,
    })
}

fn decode_layer(reader: &mut Reader<'_>) -> Result<Layer, ParseError> {
    let state = reader.read_u32()?;
    let protect = reader.read_u32()?;
    let name = reader.read_sjis_u8len()?;
    Ok(Layer {
        state,
        protect,
        name,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode_layer(data: &mut Vec<u8>, state: u32, protect: u32, name: &str) {
        data.extend_from_slice(&state.to_le_bytes());
        data.extend_from_slice(&protect.to_le_bytes());
        data.push(name.len() as u8);
        data.extend_from_slice(name.as_bytes());
    }

    fn encode_group(data: &mut Vec<u8>, group_name: &str) {
        data.extend_from_slice(&2u32.to_le_bytes()); // state
        data.extend_from_slice(&0u32.to_le_bytes()); // write_layer
        data.extend_from_slice(&100.0f64.to_le_bytes()); // scale
        data.extend_from_slice(&0u32.to_le_bytes()); // protect
        for l in 0..LAYERS_PER_GROUP {
            encode_layer(data, 2, 0, &format!("L{l}"));
        }
        data.push(group_name.len() as u8);
        data.extend_from_slice(group_name.as_bytes());
    }

    #[test]
    fn decodes_exactly_sixteen_groups_of_sixteen_layers() {
        let mut data = Vec::new();
        for g in 0..LAYER_GROUP_COUNT {
            encode_group(&mut data, &format!("G{g}"));
        }
        let mut reader = Reader::new(&data);
        let groups = decode_layer_groups(&mut reader).unwrap();
        assert_eq!(groups.len(), 16);
        for (g, group) in groups.iter().enumerate() {
            assert_eq!(group.layers.len(), 16);
            assert_eq!(group.name, format!("G{g}"));
            assert_eq!(group.scale, 100.0);
            for (l, layer) in group.layers.iter().enumerate() {
                assert_eq!(layer.name, format!("L{l}"));
            }
        }
        assert_eq!(reader.offset(), data.len());
    }

    #[test]
    fn truncated_layer_table_is_unexpected_end() {
        let mut data = Vec::new();
        encode_group(&mut data, "only one group");
        let mut reader = Reader::new(&data);
        assert!(decode_layer_groups(&mut reader).is_err());
    }
}
