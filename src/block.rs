//! Block-definition linking: marks each [`BlockDef`] referenced by at
//! least one [`Block`] insertion and rejects insertions that resolve to
//! no known definition. See `spec.md` §4.7.

use std::collections::{HashMap, HashSet};

use crate::error::ParseError;
use crate::model::{BlockDef, Entity};

/// Walks every entity list in the document (top-level and nested inside
/// block definitions — a block may insert another block) and marks
/// `is_referenced` on each definition with at least one insertion.
/// Returns `MissingBlockDefinition` for the first insertion whose
/// `def_number` has no matching definition.
pub fn link_blocks(
    entities: &[Entity],
    block_defs: &mut [BlockDef],
) -> Result<(), ParseError> {
    let number_index: HashMap<u32, usize> = block_defs
        .iter()
        .enumerate()
        .map(|(i, def)| (def.number, i))
        .collect();

    let mut referenced = HashSet::new();
    collect_references(entities, &number_index, &mut referenced)?;
    for def in block_defs.iter() {
        collect_references(&def.entities, &number_index, &mut referenced)?;
    }

    for (number, &index) in &number_index {
        if referenced.contains(number) {
            block_defs[index].is_referenced = true;
        }
    }

    Ok(())
}

fn collect_references(
    entities: &[Entity],
    number_index: &HashMap<u32, usize>,
    referenced: &mut HashSet<u32>,
) -> Result<(), ParseError> {
    for entity in entities {
        if let Entity::Block(block) = entity {
            if !number_index.contains_key(&block.def_number) {
                return Err(ParseError::MissingBlockDefinition(block.def_number));
            }
            referenced.insert(block.def_number);
        }
    }
    Ok(())
}
