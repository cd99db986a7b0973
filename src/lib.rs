//! Binary decoder and document model for JW-CAD `.jww` drawing files.
//!
//! The public surface is deliberately narrow: [`parse`] turns a byte
//! buffer into a [`Document`], and [`to_json_string`] turns a `Document`
//! back into JSON. Everything else — the reader primitives, the header,
//! layer, entity, image, and block-linking stages — is internal
//! machinery composed by [`parse`].

mod block;
mod document;
mod entity;
mod error;
mod header;
mod image;
mod layer;
mod model;
mod reader;
mod text;

pub use document::{parse, to_json_string};
pub use error::ParseError;
pub use model::{
    Arc, ArcSolid, Block, BlockDef, Document, EmbeddedImage, Entity, EntityBase, Image,
    ImageFormat, Layer, LayerGroup, Line, MetadataSettings, Point, PrintSettings, Solid,
    SunpouSettings, Text,
};
