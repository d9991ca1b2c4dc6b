//! DWARF Debug Information Entry (DIE) parsing.
//!
//! DIEs are parsed into a flat, document-ordered list rather than a tree:
//! the corpus pipeline associates formal parameters with the preceding
//! subprogram exactly the way the byte stream orders them, and a flat list
//! keeps that association trivial. Nesting is preserved through `depth`.

use super::abbrev::{AbbreviationTable, AttributeSpec};
use super::leb128::{decode_sleb128, decode_uleb128};
use super::tags::{DwAt, DwAte, DwForm, DwTag};
use crate::ParseError;

/// An attribute value.
#[derive(Debug, Clone)]
pub enum AttributeValue {
    /// An address value.
    Address(u64),
    /// A block of bytes.
    Block(Vec<u8>),
    /// Unsigned constant.
    Unsigned(u64),
    /// Signed constant.
    Signed(i64),
    /// A resolved string value.
    String(String),
    /// An offset into .debug_str that could not be resolved.
    StringOffset(u64),
    /// An unresolved index into .debug_str_offsets.
    StringIndex(u64),
    /// A flag (boolean).
    Flag(bool),
    /// A reference to another DIE (offset from start of compilation unit).
    Reference(u64),
    /// A reference to another DIE (offset from start of .debug_info).
    RefAddr(u64),
    /// An offset into another section.
    SecOffset(u64),
    /// An expression location.
    ExprLoc(Vec<u8>),
    /// An index into .debug_addr.
    AddressIndex(u64),
    /// A 16-byte value.
    Data16([u8; 16]),
    /// An 8-byte type signature.
    RefSig8(u64),
}

/// A single attribute of a DIE.
#[derive(Debug, Clone)]
pub struct Attribute {
    /// The attribute name.
    pub name: DwAt,
    /// The attribute value.
    pub value: AttributeValue,
}

/// A Debug Information Entry in document order.
#[derive(Debug, Clone)]
pub struct Die {
    /// Offset of this DIE from the start of .debug_info.
    pub offset: u64,
    /// Offset of the owning compilation unit in .debug_info.
    pub cu_offset: u64,
    /// Nesting depth within the compilation unit (root is 0).
    pub depth: u32,
    /// The tag indicating what this DIE represents.
    pub tag: DwTag,
    /// The attributes of this DIE.
    pub attributes: Vec<Attribute>,
}

impl Die {
    /// Get an attribute by name.
    pub fn attr(&self, name: DwAt) -> Option<&AttributeValue> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| &a.value)
    }

    /// Get the name attribute as a string.
    pub fn name(&self) -> Option<&str> {
        match self.attr(DwAt::Name)? {
            AttributeValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get the linkage name (DWARF 4 or the MIPS spelling).
    pub fn linkage_name(&self) -> Option<&str> {
        let value = self
            .attr(DwAt::LinkageName)
            .or_else(|| self.attr(DwAt::MipsLinkageName))?;
        match value {
            AttributeValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get the byte size, if present.
    pub fn byte_size(&self) -> Option<i64> {
        match self.attr(DwAt::ByteSize)? {
            AttributeValue::Unsigned(v) => Some(*v as i64),
            AttributeValue::Signed(v) => Some(*v),
            _ => None,
        }
    }

    /// Get the base-type encoding.
    pub fn encoding(&self) -> Option<DwAte> {
        match self.attr(DwAt::Encoding)? {
            AttributeValue::Unsigned(v) => Some(DwAte::from(*v as u16)),
            AttributeValue::Signed(v) => Some(DwAte::from(*v as u16)),
            _ => None,
        }
    }

    /// Get an integer constant attribute as i64.
    pub fn constant(&self, name: DwAt) -> Option<i64> {
        match self.attr(name)? {
            AttributeValue::Unsigned(v) => Some(*v as i64),
            AttributeValue::Signed(v) => Some(*v),
            _ => None,
        }
    }

    /// Get the type reference as a global .debug_info offset.
    ///
    /// CU-relative references are rebased against the owning unit.
    pub fn type_ref(&self) -> Option<u64> {
        self.reference(DwAt::Type)
    }

    /// Get any reference-valued attribute as a global offset.
    pub fn reference(&self, name: DwAt) -> Option<u64> {
        match self.attr(name)? {
            AttributeValue::Reference(offset) => Some(self.cu_offset + offset),
            AttributeValue::RefAddr(offset) => Some(*offset),
            // Some producers emit call origins as plain constants.
            AttributeValue::Unsigned(offset) => Some(self.cu_offset + offset),
            _ => None,
        }
    }

    /// Check if this DIE represents a formal parameter.
    pub fn is_parameter(&self) -> bool {
        matches!(self.tag, DwTag::FormalParameter)
    }
}

/// Resolves indirect string forms against the string sections.
#[derive(Debug, Default)]
pub struct StringResolver<'a> {
    /// .debug_str bytes.
    pub debug_str: Option<&'a [u8]>,
    /// .debug_line_str bytes.
    pub debug_line_str: Option<&'a [u8]>,
    /// .debug_str_offsets bytes.
    pub debug_str_offsets: Option<&'a [u8]>,
    /// Current DW_AT_str_offsets_base; the DWARF 5 default skips the
    /// 8-byte table header.
    pub str_offsets_base: u64,
    /// Whether the owning unit uses 64-bit DWARF offsets.
    pub is_64bit: bool,
}

impl<'a> StringResolver<'a> {
    pub fn new(
        debug_str: Option<&'a [u8]>,
        debug_line_str: Option<&'a [u8]>,
        debug_str_offsets: Option<&'a [u8]>,
        is_64bit: bool,
    ) -> Self {
        Self {
            debug_str,
            debug_line_str,
            debug_str_offsets,
            str_offsets_base: 8,
            is_64bit,
        }
    }

    fn null_terminated(data: &[u8], offset: u64) -> Option<String> {
        let start = offset as usize;
        if start >= data.len() {
            return None;
        }
        let end = data[start..].iter().position(|&b| b == 0)? + start;
        Some(String::from_utf8_lossy(&data[start..end]).into_owned())
    }

    /// Resolves an offset into .debug_str.
    pub fn strp(&self, offset: u64) -> Option<String> {
        Self::null_terminated(self.debug_str?, offset)
    }

    /// Resolves an offset into .debug_line_str.
    pub fn line_strp(&self, offset: u64) -> Option<String> {
        Self::null_terminated(self.debug_line_str?, offset)
    }

    /// Resolves a .debug_str_offsets index relative to the current base.
    pub fn strx(&self, index: u64) -> Option<String> {
        let table = self.debug_str_offsets?;
        let entry_size: u64 = if self.is_64bit { 8 } else { 4 };
        let at = (self.str_offsets_base + index * entry_size) as usize;
        let offset = if self.is_64bit {
            let bytes = table.get(at..at + 8)?;
            u64::from_le_bytes(bytes.try_into().ok()?)
        } else {
            let bytes = table.get(at..at + 4)?;
            u32::from_le_bytes(bytes.try_into().ok()?) as u64
        };
        self.strp(offset)
    }

    /// Rewrites string-typed attribute values in place to resolved strings.
    pub fn resolve(&self, die: &mut Die) {
        for attribute in &mut die.attributes {
            let resolved = match &attribute.value {
                AttributeValue::StringOffset(offset) => resolve_string_offset(self, *offset),
                AttributeValue::StringIndex(index) => self.strx(*index),
                _ => None,
            };
            if let Some(s) = resolved {
                attribute.value = AttributeValue::String(s);
            }
        }
    }
}

/// Streaming parser for the DIEs of one compilation unit.
pub struct DieParser<'a> {
    /// The raw .debug_info data.
    data: &'a [u8],
    /// The abbreviation table for this compilation unit.
    abbrev_table: &'a AbbreviationTable,
    /// Address size for this compilation unit.
    address_size: u8,
    /// Whether this is 64-bit DWARF.
    is_64bit: bool,
    /// Current offset in .debug_info.
    offset: usize,
    /// Base offset of the compilation unit.
    cu_offset: usize,
    /// End of the compilation unit.
    cu_end: usize,
    /// Current nesting depth.
    depth: u32,
}

impl<'a> DieParser<'a> {
    /// Create a new DIE parser positioned at the first DIE of a unit.
    pub fn new(
        data: &'a [u8],
        abbrev_table: &'a AbbreviationTable,
        address_size: u8,
        is_64bit: bool,
        cu_offset: usize,
        die_offset: usize,
        cu_end: usize,
    ) -> Self {
        Self {
            data,
            abbrev_table,
            address_size,
            is_64bit,
            offset: die_offset,
            cu_offset,
            cu_end: cu_end.min(data.len()),
            depth: 0,
        }
    }

    /// Parse the next DIE in document order.
    ///
    /// Null entries adjust the nesting depth and are not returned. `None`
    /// means the unit is exhausted.
    pub fn next_die(&mut self) -> Result<Option<Die>, ParseError> {
        loop {
            if self.offset >= self.cu_end {
                return Ok(None);
            }

            let die_offset = self.offset as u64;
            let (abbrev_code, len) = decode_uleb128(&self.data[self.offset..])?;
            self.offset += len;

            // Code 0 means end of a sibling chain.
            if abbrev_code == 0 {
                self.depth = self.depth.saturating_sub(1);
                continue;
            }

            let abbrev = self
                .abbrev_table
                .get(abbrev_code)
                .ok_or(ParseError::InvalidValue("unknown abbreviation code"))?;

            let mut attributes = Vec::with_capacity(abbrev.attributes.len());
            for attr_spec in &abbrev.attributes {
                let value = self.parse_attribute_value(attr_spec)?;
                attributes.push(Attribute {
                    name: attr_spec.name,
                    value,
                });
            }

            let die = Die {
                offset: die_offset,
                cu_offset: self.cu_offset as u64,
                depth: self.depth,
                tag: abbrev.tag,
                attributes,
            };

            if abbrev.has_children {
                self.depth += 1;
            }

            return Ok(Some(die));
        }
    }

    /// Parse an attribute value based on its form.
    fn parse_attribute_value(
        &mut self,
        spec: &AttributeSpec,
    ) -> Result<AttributeValue, ParseError> {
        match spec.form {
            DwForm::Addr => {
                let value = self.read_address()?;
                Ok(AttributeValue::Address(value))
            }
            DwForm::Block1 => {
                let len = self.read_u8()? as usize;
                Ok(AttributeValue::Block(self.read_bytes(len)?))
            }
            DwForm::Block2 => {
                let len = self.read_u16()? as usize;
                Ok(AttributeValue::Block(self.read_bytes(len)?))
            }
            DwForm::Block4 => {
                let len = self.read_u32()? as usize;
                Ok(AttributeValue::Block(self.read_bytes(len)?))
            }
            DwForm::Block => {
                let (len, consumed) = decode_uleb128(&self.data[self.offset..])?;
                self.offset += consumed;
                Ok(AttributeValue::Block(self.read_bytes(len as usize)?))
            }
            DwForm::Data1 => Ok(AttributeValue::Unsigned(self.read_u8()? as u64)),
            DwForm::Data2 => Ok(AttributeValue::Unsigned(self.read_u16()? as u64)),
            DwForm::Data4 => Ok(AttributeValue::Unsigned(self.read_u32()? as u64)),
            DwForm::Data8 => Ok(AttributeValue::Unsigned(self.read_u64()?)),
            DwForm::Data16 => {
                let bytes = self.read_bytes(16)?;
                let mut data = [0u8; 16];
                data.copy_from_slice(&bytes);
                Ok(AttributeValue::Data16(data))
            }
            DwForm::String => Ok(AttributeValue::String(self.read_string()?)),
            DwForm::Strp => Ok(AttributeValue::StringOffset(self.read_offset()?)),
            DwForm::LineStrp => {
                // Marked with a distinct value later by the resolver; the
                // offset space differs from .debug_str.
                let offset = self.read_offset()?;
                Ok(AttributeValue::StringOffset(offset | LINE_STR_BIT))
            }
            DwForm::StrpSup => Ok(AttributeValue::StringOffset(self.read_offset()?)),
            DwForm::Udata => {
                let (value, consumed) = decode_uleb128(&self.data[self.offset..])?;
                self.offset += consumed;
                Ok(AttributeValue::Unsigned(value))
            }
            DwForm::Sdata => {
                let (value, consumed) = decode_sleb128(&self.data[self.offset..])?;
                self.offset += consumed;
                Ok(AttributeValue::Signed(value))
            }
            DwForm::Flag => Ok(AttributeValue::Flag(self.read_u8()? != 0)),
            DwForm::FlagPresent => Ok(AttributeValue::Flag(true)),
            DwForm::Ref1 => Ok(AttributeValue::Reference(self.read_u8()? as u64)),
            DwForm::Ref2 => Ok(AttributeValue::Reference(self.read_u16()? as u64)),
            DwForm::Ref4 => Ok(AttributeValue::Reference(self.read_u32()? as u64)),
            DwForm::Ref8 => Ok(AttributeValue::Reference(self.read_u64()?)),
            DwForm::RefUdata => {
                let (offset, consumed) = decode_uleb128(&self.data[self.offset..])?;
                self.offset += consumed;
                Ok(AttributeValue::Reference(offset))
            }
            DwForm::RefAddr => Ok(AttributeValue::RefAddr(self.read_offset()?)),
            DwForm::RefSig8 => Ok(AttributeValue::RefSig8(self.read_u64()?)),
            DwForm::RefSup4 => Ok(AttributeValue::Reference(self.read_u32()? as u64)),
            DwForm::RefSup8 => Ok(AttributeValue::Reference(self.read_u64()?)),
            DwForm::SecOffset => Ok(AttributeValue::SecOffset(self.read_offset()?)),
            DwForm::Exprloc => {
                let (len, consumed) = decode_uleb128(&self.data[self.offset..])?;
                self.offset += consumed;
                Ok(AttributeValue::ExprLoc(self.read_bytes(len as usize)?))
            }
            DwForm::Strx | DwForm::Strx1 | DwForm::Strx2 | DwForm::Strx3 | DwForm::Strx4 => {
                let index = self.read_indexed(spec.form)?;
                Ok(AttributeValue::StringIndex(index))
            }
            DwForm::Addrx | DwForm::Addrx1 | DwForm::Addrx2 | DwForm::Addrx3 | DwForm::Addrx4 => {
                let index = self.read_indexed(spec.form)?;
                Ok(AttributeValue::AddressIndex(index))
            }
            DwForm::ImplicitConst => {
                let value = spec
                    .implicit_const
                    .ok_or(ParseError::InvalidValue("missing implicit constant value"))?;
                Ok(AttributeValue::Signed(value))
            }
            DwForm::Indirect => {
                let (form_value, consumed) = decode_uleb128(&self.data[self.offset..])?;
                self.offset += consumed;
                let actual_spec = AttributeSpec {
                    name: spec.name,
                    form: DwForm::from(form_value as u8),
                    implicit_const: None,
                };
                self.parse_attribute_value(&actual_spec)
            }
            DwForm::Loclistx | DwForm::Rnglistx => {
                let (index, consumed) = decode_uleb128(&self.data[self.offset..])?;
                self.offset += consumed;
                Ok(AttributeValue::SecOffset(index))
            }
            DwForm::Unknown(_) => Err(ParseError::InvalidValue("unknown DWARF form")),
        }
    }

    /// Reads one of the strx/addrx index encodings.
    fn read_indexed(&mut self, form: DwForm) -> Result<u64, ParseError> {
        Ok(match form {
            DwForm::Strx1 | DwForm::Addrx1 => self.read_u8()? as u64,
            DwForm::Strx2 | DwForm::Addrx2 => self.read_u16()? as u64,
            DwForm::Strx3 | DwForm::Addrx3 => {
                let b0 = self.read_u8()? as u64;
                let b1 = self.read_u8()? as u64;
                let b2 = self.read_u8()? as u64;
                b0 | (b1 << 8) | (b2 << 16)
            }
            DwForm::Strx4 | DwForm::Addrx4 => self.read_u32()? as u64,
            _ => {
                let (value, consumed) = decode_uleb128(&self.data[self.offset..])?;
                self.offset += consumed;
                value
            }
        })
    }

    fn read_u8(&mut self) -> Result<u8, ParseError> {
        if self.offset >= self.data.len() {
            return Err(ParseError::TruncatedData {
                expected: self.offset + 1,
                actual: self.data.len(),
                context: "u8",
            });
        }
        let value = self.data[self.offset];
        self.offset += 1;
        Ok(value)
    }

    fn read_u16(&mut self) -> Result<u16, ParseError> {
        if self.offset + 2 > self.data.len() {
            return Err(ParseError::TruncatedData {
                expected: self.offset + 2,
                actual: self.data.len(),
                context: "u16",
            });
        }
        let value = u16::from_le_bytes([self.data[self.offset], self.data[self.offset + 1]]);
        self.offset += 2;
        Ok(value)
    }

    fn read_u32(&mut self) -> Result<u32, ParseError> {
        if self.offset + 4 > self.data.len() {
            return Err(ParseError::TruncatedData {
                expected: self.offset + 4,
                actual: self.data.len(),
                context: "u32",
            });
        }
        let value = u32::from_le_bytes([
            self.data[self.offset],
            self.data[self.offset + 1],
            self.data[self.offset + 2],
            self.data[self.offset + 3],
        ]);
        self.offset += 4;
        Ok(value)
    }

    fn read_u64(&mut self) -> Result<u64, ParseError> {
        if self.offset + 8 > self.data.len() {
            return Err(ParseError::TruncatedData {
                expected: self.offset + 8,
                actual: self.data.len(),
                context: "u64",
            });
        }
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&self.data[self.offset..self.offset + 8]);
        self.offset += 8;
        Ok(u64::from_le_bytes(bytes))
    }

    fn read_address(&mut self) -> Result<u64, ParseError> {
        match self.address_size {
            4 => Ok(self.read_u32()? as u64),
            8 => self.read_u64(),
            _ => Err(ParseError::InvalidValue("unsupported address size")),
        }
    }

    fn read_offset(&mut self) -> Result<u64, ParseError> {
        if self.is_64bit {
            self.read_u64()
        } else {
            Ok(self.read_u32()? as u64)
        }
    }

    fn read_bytes(&mut self, len: usize) -> Result<Vec<u8>, ParseError> {
        if self.offset + len > self.data.len() {
            return Err(ParseError::TruncatedData {
                expected: self.offset + len,
                actual: self.data.len(),
                context: "byte block",
            });
        }
        let bytes = self.data[self.offset..self.offset + len].to_vec();
        self.offset += len;
        Ok(bytes)
    }

    fn read_string(&mut self) -> Result<String, ParseError> {
        let start = self.offset;
        while self.offset < self.data.len() && self.data[self.offset] != 0 {
            self.offset += 1;
        }
        if self.offset >= self.data.len() {
            return Err(ParseError::TruncatedData {
                expected: self.offset + 1,
                actual: self.data.len(),
                context: "null-terminated string",
            });
        }
        let s = String::from_utf8_lossy(&self.data[start..self.offset]).into_owned();
        self.offset += 1; // skip terminator
        Ok(s)
    }
}

/// High bit marks a .debug_line_str offset so the resolver can pick the
/// right section. DWARF offsets never reach this range in practice.
pub(crate) const LINE_STR_BIT: u64 = 1 << 63;

/// Applies a resolver to an offset-valued string, honouring the section
/// marker bit.
pub(crate) fn resolve_string_offset(resolver: &StringResolver, offset: u64) -> Option<String> {
    if offset & LINE_STR_BIT != 0 {
        resolver.line_strp(offset & !LINE_STR_BIT)
    } else {
        resolver.strp(offset)
    }
}
