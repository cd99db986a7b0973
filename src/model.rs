//! The decoded document model. Every type here is plain data: the
//! `Document` returned by [`crate::parse`] owns everything it references
//! and is never mutated after assembly.

use serde::Serialize;

/// Attribute block shared by every drawing entity, read immediately after
/// an entity's class tag.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EntityBase {
    pub group: u32,
    pub pen_style: u8,
    pub pen_color: u16,
    /// Only meaningful when the document's `version >= 351`; `0` otherwise,
    /// since older files never wrote this field.
    pub pen_width: u16,
    pub layer: u16,
    pub layer_group: u16,
    pub flag: u16,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Line {
    pub base: EntityBase,
    pub start_x: f64,
    pub start_y: f64,
    pub end_x: f64,
    pub end_y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Arc {
    pub base: EntityBase,
    pub center_x: f64,
    pub center_y: f64,
    pub radius: f64,
    pub start_angle: f64,
    pub arc_angle: f64,
    pub tilt_angle: f64,
    pub flatness: f64,
    pub is_full_circle: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Point {
    pub base: EntityBase,
    pub x: f64,
    pub y: f64,
    pub is_temporary: bool,
    pub code: u32,
    pub angle: f64,
    pub scale: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Text {
    pub base: EntityBase,
    pub start_x: f64,
    pub start_y: f64,
    pub end_x: f64,
    pub end_y: f64,
    pub text_type: u32,
    pub size_x: f64,
    pub size_y: f64,
    pub spacing: f64,
    pub angle: f64,
    pub font_name: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Solid {
    pub base: EntityBase,
    pub point1_x: f64,
    pub point1_y: f64,
    pub point2_x: f64,
    pub point2_y: f64,
    pub point3_x: f64,
    pub point3_y: f64,
    pub point4_x: f64,
    pub point4_y: f64,
    /// Present only when `base.pen_color == 10`; defaults to `0` otherwise.
    pub color: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArcSolid {
    pub base: EntityBase,
    pub center_x: f64,
    pub center_y: f64,
    pub radius: f64,
    pub start_angle: f64,
    pub arc_angle: f64,
    pub tilt_angle: f64,
    pub flatness: f64,
    pub solid_param: f64,
    /// Present only when `base.pen_color == 10`; defaults to `0` otherwise.
    pub color: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Block {
    pub base: EntityBase,
    pub ref_x: f64,
    pub ref_y: f64,
    pub scale_x: f64,
    pub scale_y: f64,
    pub rotation: f64,
    pub def_number: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Image {
    pub base: EntityBase,
    pub image_path: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub rotation: f64,
}

/// A drawing entity. The set of variants is closed and fixed by the file
/// format; represented as a sum type rather than open polymorphism.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value")]
pub enum Entity {
    Line(Line),
    Arc(Arc),
    Point(Point),
    Text(Text),
    Solid(Solid),
    ArcSolid(ArcSolid),
    Block(Block),
    Image(Image),
}

impl Entity {
    pub fn base(&self) -> &EntityBase {
        match self {
            Self::Line(v) => &v.base,
            Self::Arc(v) => &v.base,
            Self::Point(v) => &v.base,
            Self::Text(v) => &v.base,
            Self::Solid(v) => &v.base,
            Self::ArcSolid(v) => &v.base,
            Self::Block(v) => &v.base,
            Self::Image(v) => &v.base,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlockDef {
    pub base: EntityBase,
    pub number: u32,
    /// Filled in by the block linker: `true` iff at least one `Block`
    /// entity in the document refers to this definition's `number`.
    pub is_referenced: bool,
    pub name: String,
    pub entities: Vec<Entity>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ImageFormat {
    Unknown,
    Jpeg,
    Png,
    Bmp,
    Gif,
}

impl ImageFormat {
    /// Detects format from magic bytes only; never validates deeper
    /// structure (`spec.md` §4.5).
    pub fn detect(data: &[u8]) -> Self {
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Self::Jpeg
        } else if data.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
            Self::Png
        } else if data.starts_with(&[0x42, 0x4D]) {
            Self::Bmp
        } else if data.starts_with(&[0x47, 0x49, 0x46, 0x38]) {
            Self::Gif
        } else {
            Self::Unknown
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmbeddedImage {
    pub index: i32,
    pub file_size: i32,
    pub data: Vec<u8>,
    pub format: ImageFormat,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Layer {
    /// 0 hidden, 1 view-only, 2 editable, 3 write-mode.
    pub state: u32,
    pub protect: u32,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LayerGroup {
    pub state: u32,
    pub write_layer: u32,
    /// Scale denominator, e.g. `100.0` for 1:100.
    pub scale: f64,
    pub protect: u32,
    pub name: String,
    pub layers: Vec<Layer>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PrintSettings {
    pub origin_x: f64,
    pub origin_y: f64,
    pub scale: f64,
    pub rotation_setting: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SunpouSettings {
    pub sunpou1: f64,
    pub sunpou2: f64,
    pub sunpou3: f64,
    pub sunpou4: f64,
    pub sunpou5: f64,
    pub dummy: u32,
    pub max_line_width: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MetadataSettings {
    pub printer_paper_size: String,
    pub draw_bmp_touka: String,
    pub view_direct2d: String,
    pub printer_bmp_zentai: String,
    pub printer_orientation: String,
    pub printer_d2d_bmp: String,
}

impl MetadataSettings {
    /// Assigns `value` to the field named by `key`, which must be one of
    /// [`crate::text::METADATA_KEYS`] — callers only reach this after that
    /// check. Unknown keys are silently ignored.
    pub fn set(&mut self, key: &str, value: &str) {
        match key {
            "printer_paper_size" => self.printer_paper_size = value.to_string(),
            "draw_bmp_touka" => self.draw_bmp_touka = value.to_string(),
            "view_direct2d" => self.view_direct2d = value.to_string(),
            "printer_bmp_zentai" => self.printer_bmp_zentai = value.to_string(),
            "printer_orientation" => self.printer_orientation = value.to_string(),
            "printer_d2d_bmp" => self.printer_d2d_bmp = value.to_string(),
            _ => {}
        }
    }
}

/// The root of the decoded document. Owns all entities, layer groups,
/// block definitions, and image blobs; assembled once and thereafter
/// immutable.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    pub version: u32,
    pub memo: String,
    pub paper_size: u32,
    pub write_layer_group: u32,
    pub layer_groups: Vec<LayerGroup>,
    pub entities: Vec<Entity>,
    pub block_defs: Vec<BlockDef>,
    pub embedded_images: Vec<EmbeddedImage>,
    pub print_settings: PrintSettings,
    pub sunpou_settings: SunpouSettings,
    pub metadata_settings: MetadataSettings,
}
