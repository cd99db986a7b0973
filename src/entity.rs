//! The main entity dispatch loop: reads a tagged class-name record, then a
//! fixed-size payload whose layout depends on the class and file version,
//! and emits a typed [`Entity`]. Also populates the block-definition table
//! and the CDataMoji metadata/image side channel. See `spec.md` §4.5.

use crate::error::ParseError;
use crate::model::{
    Arc, ArcSolid, Block, BlockDef, Entity, EntityBase, Image, Line, MetadataSettings, Point,
    Solid, Text,
};
use crate::reader::Reader;
use crate::text::{self, MojiContent};
use std::f64::consts::PI;

/// Absolute tolerance for full-circle detection (`spec.md` §9). Computed
/// in double precision, so the comparison must not use exact equality.
const FULL_CIRCLE_EPSILON: f64 = 1e-9;

#[derive(Debug)]
pub struct DecodedEntities {
    pub entities: Vec<Entity>,
    pub block_defs: Vec<BlockDef>,
}

struct OpenBlockDef {
    base: EntityBase,
    number: u32,
    name: String,
    entities: Vec<Entity>,
}

pub fn decode_entities(
    reader: &mut Reader<'_>,
    version: u32,
    metadata: &mut MetadataSettings,
) -> Result<DecodedEntities, ParseError> {
    let mut entities = Vec::new();
    let mut block_defs = Vec::new();
    let mut open_block: Option<OpenBlockDef> = None;

    loop {
        if reader.remaining() < 2 {
            break; // spec.md §4.5 termination case (c): end of input.
        }

        let tag_offset = reader.offset();
        let tag = reader.read_ascii_u16len()?;

        if tag.is_empty() {
            break; // spec.md §4.5 termination case (a): canonical end marker.
        }

        match tag.as_str() {
            "CDataBlockDef" => {
                if open_block.is_some() {
                    // Block definitions do not nest (spec.md §9); a second
                    // open while one is active is a structurally unexpected
                    // tag sequence the format does not define.
                    return Err(ParseError::UnknownEntityTag {
                        tag,
                        offset: tag_offset,
                    });
                }
                let base = parse_entity_base(reader, version)?;
                let number = reader.read_u32()?;
                let name = reader.read_sjis_u8len()?;
                open_block = Some(OpenBlockDef {
                    base,
                    number,
                    name,
                    entities: Vec::new(),
                });
            }
            "CDataBlockEnd" => {
                let block = open_block.take().ok_or_else(|| ParseError::UnknownEntityTag {
                    tag: tag.clone(),
                    offset: tag_offset,
                })?;
                block_defs.push(BlockDef {
                    base: block.base,
                    number: block.number,
                    is_referenced: false,
                    name: block.name,
                    entities: block.entities,
                });
            }
            _ => {
                let decoded = decode_entity_payload(reader, version, &tag, tag_offset, metadata)?;
                if let Some(entity) = decoded {
                    match &mut open_block {
                        Some(block) => block.entities.push(entity),
                        None => entities.push(entity),
                    }
                }
            }
        }
    }

    Ok(DecodedEntities {
        entities,
        block_defs,
    })
}

fn decode_entity_payload(
    reader: &mut Reader<'_>,
    version: u32,
    tag: &str,
    tag_offset: usize,
    metadata: &mut MetadataSettings,
) -> Result<Option<Entity>, ParseError> {
    match tag {
        "CDataSen" => Ok(Some(Entity::Line(parse_line(reader, version)?))),
        "CDataEnko" => Ok(Some(Entity::Arc(parse_arc(reader, version)?))),
        "CDataTen" => Ok(Some(Entity::Point(parse_point(reader, version)?))),
        "CDataMoji" => parse_moji(reader, version, metadata),
        "CDataSolid" => parse_solid_or_arc_solid(reader, version),
        "CDataBlock" => Ok(Some(Entity::Block(parse_block(reader, version)?))),
        _ => Err(ParseError::UnknownEntityTag {
            tag: tag.to_string(),
            offset: tag_offset,
        }),
    }
}

fn parse_entity_base(reader: &mut Reader<'_>, version: u32) -> Result<EntityBase, ParseError> {
    let group = reader.read_u32()?;
    let pen_style = reader.read_u8()?;
    let pen_color = reader.read_u16()?;
    let pen_width = if version >= 351 { reader.read_u16()? } else { 0 };
    let layer = reader.read_u16()?;
    let layer_group = reader.read_u16()?;
    let flag = reader.read_u16()?;

    Ok(EntityBase {
        group,
        pen_style,
        pen_color,
        pen_width,
        layer,
        layer_group,
        flag,
    })
}

fn parse_line(reader: &mut Reader<'_>, version: u32) -> Result<Line, ParseError> {
    let base = parse_entity_base(reader, version)?;
    Ok(Line {
        base,
        start_x: reader.read_f64()?,
        start_y: reader.read_f64()?,
        end_x: reader.read_f64()?,
        end_y: reader.read_f64()?,
    })
}

fn parse_arc(reader: &mut Reader<'_>, version: u32) -> Result<Arc, ParseError> {
    let base = parse_entity_base(reader, version)?;
    let center_x = reader.read_f64()?;
    let center_y = reader.read_f64()?;
    let radius = reader.read_f64()?;
    let start_angle = reader.read_f64()?;
    let arc_angle = reader.read_f64()?;
    let tilt_angle = reader.read_f64()?;
    let flatness = reader.read_f64()?;
    let is_full_circle = (arc_angle - 2.0 * PI).abs() < FULL_CIRCLE_EPSILON;

    Ok(Arc {
        base,
        center_x,
        center_y,
        radius,
        start_angle,
        arc_angle,
        tilt_angle,
        flatness,
        is_full_circle,
    })
}

fn parse_point(reader: &mut Reader<'_>, version: u32) -> Result<Point, ParseError> {
    let base = parse_entity_base(reader, version)?;
    Ok(Point {
        base,
        x: reader.read_f64()?,
        y: reader.read_f64()?,
        is_temporary: reader.read_u8()? != 0,
        code: reader.read_u32()?,
        angle: reader.read_f64()?,
        scale: reader.read_f64()?,
    })
}

fn parse_text_fields(reader: &mut Reader<'_>, version: u32) -> Result<Text, ParseError> {
    let base = parse_entity_base(reader, version)?;
    Ok(Text {
        base,
        start_x: reader.read_f64()?,
        start_y: reader.read_f64()?,
        end_x: reader.read_f64()?,
        end_y: reader.read_f64()?,
        text_type: reader.read_u32()?,
        size_x: reader.read_f64()?,
        size_y: reader.read_f64()?,
        spacing: reader.read_f64()?,
        angle: reader.read_f64()?,
        font_name: reader.read_sjis_u16len()?,
        content: reader.read_sjis_u16len()?,
    })
}

/// Decodes a `CDataMoji` record and classifies its content, per
/// `spec.md` §4.5 "Text post-processing": a `^@BM` prefix yields an
/// `Image` entity, a recognized `^@<key>=<value>` prefix updates
/// `metadata_settings` and emits nothing, and anything else is a plain
/// `Text` entity.
fn parse_moji(
    reader: &mut Reader<'_>,
    version: u32,
    metadata: &mut MetadataSettings,
) -> Result<Option<Entity>, ParseError> {
    let record = parse_text_fields(reader, version)?;

    match text::classify_moji_content(&record.content) {
        MojiContent::Bitmap { params } => {
            let bitmap = text::parse_bitmap_ref(params);
            Ok(Some(Entity::Image(Image {
                base: record.base,
                image_path: bitmap.path,
                x: bitmap.x,
                y: bitmap.y,
                width: bitmap.width,
                height: bitmap.height,
                rotation: bitmap.rotation,
            })))
        }
        MojiContent::Metadata { key, value } => {
            metadata.set(key, value);
            Ok(None)
        }
        MojiContent::PlainText => Ok(Some(Entity::Text(record))),
    }
}

/// `pen_style < 101` is a four-corner `Solid`; `pen_style >= 101` is an
/// `ArcSolid` (spec.md §4.5, §8 boundary: 100 is Solid, 101 is ArcSolid).
fn parse_solid_or_arc_solid(
    reader: &mut Reader<'_>,
    version: u32,
) -> Result<Option<Entity>, ParseError> {
    let base = parse_entity_base(reader, version)?;
    if base.pen_style < 101 {
        let point1_x = reader.read_f64()?;
        let point1_y = reader.read_f64()?;
        let point2_x = reader.read_f64()?;
        let point2_y = reader.read_f64()?;
        let point3_x = reader.read_f64()?;
        let point3_y = reader.read_f64()?;
        let point4_x = reader.read_f64()?;
        let point4_y = reader.read_f64()?;
        let color = if base.pen_color == 10 {
            reader.read_u32()?
        } else {
            0
        };
        Ok(Some(Entity::Solid(Solid {
            base,
            point1_x,
            point1_y,
            point2_x,
            point2_y,
            point3_x,
            point3_y,
            point4_x,
            point4_y,
            color,
        })))
    } else {
        let center_x = reader.read_f64()?;
        let center_y = reader.read_f64()?;
        let radius = reader.read_f64()?;
        let start_angle = reader.read_f64()?;
        let arc_angle = reader.read_f64()?;
        let tilt_angle = reader.read_f64()?;
        let flatness = reader.read_f64()?;
        let solid_param = reader.read_f64()?;
        let color = if base.pen_color == 10 {
            reader.read_u32()?
        } else {
            0
        };
        Ok(Some(Entity::ArcSolid(ArcSolid {
            base,
            center_x,
            center_y,
            radius,
            start_angle,
            arc_angle,
            tilt_angle,
            flatness,
            solid_param,
            color,
        })))
    }
}

fn parse_block(reader: &mut Reader<'_>, version: u32) -> Result<Block, ParseError> {
    let base = parse_entity_base(reader, version)?;
    Ok(Block {
        base,
        ref_x: reader.read_f64()?,
        ref_y: reader.read_f64()?,
        scale_x: reader.read_f64()?,
        scale_y: reader.read_f64()?,
        rotation: reader.read_f64()?,
        def_number: reader.read_u32()?,
    })
}
