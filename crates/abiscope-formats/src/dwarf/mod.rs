//! DWARF debug information parsing.
//!
//! The reader streams `.debug_info` DIEs in document order and exposes
//! them through [`DwarfData`]:
//!
//! - `die_at(offset)` resolves a global `.debug_info` offset to its DIE
//! - `type_at(offset, graph)` materialises the type graph rooted at a DIE
//! - [`DwarfIndex::build`] derives the name-indexed subprogram, variable,
//!   and call-site tables the signature builder joins against

mod abbrev;
mod die;
mod index;
mod info;
mod leb128;
mod tags;
mod typegraph;

pub use abbrev::{Abbreviation, AbbreviationTable, AttributeSpec};
pub use die::{Attribute, AttributeValue, Die, DieParser, StringResolver};
pub use index::{Component, DwarfIndex, FunctionEntry, VariableEntry};
pub use info::{CompilationUnitHeader, DwarfSections};
pub use leb128::{decode_sleb128, decode_uleb128};
pub use tags::{DwAt, DwAte, DwForm, DwTag};

use crate::ParseError;
use std::collections::HashMap;

/// Parsed debug information: every DIE in document order plus an offset
/// index spanning all compilation units.
#[derive(Debug)]
pub struct DwarfData {
    dies: Vec<Die>,
    by_offset: HashMap<u64, usize>,
}

/// Parse the DWARF sections of a binary.
pub fn parse(sections: DwarfSections<'_>) -> Result<DwarfData, ParseError> {
    let dies = info::parse_units(sections)?;
    let by_offset = dies
        .iter()
        .enumerate()
        .map(|(index, die)| (die.offset, index))
        .collect();
    Ok(DwarfData { dies, by_offset })
}

impl DwarfData {
    /// All DIEs in document order.
    pub fn dies(&self) -> &[Die] {
        &self.dies
    }

    /// The DIE at a given document-order index.
    pub fn die(&self, index: usize) -> &Die {
        &self.dies[index]
    }

    /// Resolves a global `.debug_info` offset to a DIE.
    pub fn die_at(&self, offset: u64) -> Option<&Die> {
        self.by_offset.get(&offset).map(|&index| &self.dies[index])
    }

    /// Resolves a global offset to a document-order index.
    pub fn index_of(&self, offset: u64) -> Option<usize> {
        self.by_offset.get(&offset).copied()
    }

    /// Iterates the direct children of the DIE at `index`.
    pub fn children(&self, index: usize) -> impl Iterator<Item = &Die> {
        let parent_depth = self.dies[index].depth;
        self.dies[index + 1..]
            .iter()
            .take_while(move |die| die.depth > parent_depth)
            .filter(move |die| die.depth == parent_depth + 1)
    }
}
