//! DWARF compilation unit parsing (.debug_info).
//!
//! Parses unit headers (DWARF 2 through 5, 32- and 64-bit initial lengths)
//! and streams every unit's DIEs into one flat, document-ordered list.

use super::abbrev::AbbreviationTable;
use super::die::{AttributeValue, Die, DieParser, StringResolver};
use super::tags::DwAt;
use crate::ParseError;

/// A DWARF compilation unit header.
#[derive(Debug, Clone)]
pub struct CompilationUnitHeader {
    /// Unit length (excluding the length field itself).
    pub unit_length: u64,
    /// DWARF version.
    pub version: u16,
    /// Unit type (DWARF 5; 0x01 = DW_UT_compile for older versions).
    pub unit_type: u8,
    /// Address size in bytes.
    pub address_size: u8,
    /// Offset into .debug_abbrev section.
    pub debug_abbrev_offset: u64,
    /// Whether this is 64-bit DWARF.
    pub is_64bit: bool,
    /// Offset of this unit in .debug_info.
    pub offset: u64,
    /// Offset of the first DIE in .debug_info.
    pub first_die_offset: u64,
    /// End offset of this unit in .debug_info.
    pub end_offset: u64,
}

impl CompilationUnitHeader {
    /// Parse a unit header at the given .debug_info offset.
    pub fn parse(debug_info: &[u8], offset: usize) -> Result<Self, ParseError> {
        let data = &debug_info[offset..];
        if data.len() < 4 {
            return Err(ParseError::TruncatedData {
                expected: 4,
                actual: data.len(),
                context: "compilation unit header",
            });
        }

        let first_word = u32::from_le_bytes([data[0], data[1], data[2], data[3]]);
        let (unit_length, is_64bit, length_size) = if first_word == 0xffff_ffff {
            if data.len() < 12 {
                return Err(ParseError::TruncatedData {
                    expected: 12,
                    actual: data.len(),
                    context: "64-bit compilation unit header",
                });
            }
            let mut bytes = [0u8; 8];
            bytes.copy_from_slice(&data[4..12]);
            (u64::from_le_bytes(bytes), true, 12usize)
        } else {
            (first_word as u64, false, 4usize)
        };

        let mut local = length_size;
        let need = |local: usize, n: usize, len: usize| -> Result<(), ParseError> {
            if local + n > len {
                Err(ParseError::TruncatedData {
                    expected: local + n,
                    actual: len,
                    context: "compilation unit header",
                })
            } else {
                Ok(())
            }
        };

        need(local, 2, data.len())?;
        let version = u16::from_le_bytes([data[local], data[local + 1]]);
        local += 2;

        if !(2..=5).contains(&version) {
            return Err(ParseError::UnsupportedVersion {
                format: "DWARF",
                version: version as u32,
            });
        }

        let read_offset = |local: &mut usize| -> Result<u64, ParseError> {
            if is_64bit {
                need(*local, 8, data.len())?;
                let mut bytes = [0u8; 8];
                bytes.copy_from_slice(&data[*local..*local + 8]);
                *local += 8;
                Ok(u64::from_le_bytes(bytes))
            } else {
                need(*local, 4, data.len())?;
                let value = u32::from_le_bytes([
                    data[*local],
                    data[*local + 1],
                    data[*local + 2],
                    data[*local + 3],
                ]) as u64;
                *local += 4;
                Ok(value)
            }
        };

        // DWARF 5 moves unit_type and address_size before the abbrev offset.
        let (unit_type, address_size, debug_abbrev_offset) = if version >= 5 {
            need(local, 2, data.len())?;
            let unit_type = data[local];
            let address_size = data[local + 1];
            local += 2;
            let abbrev_offset = read_offset(&mut local)?;
            (unit_type, address_size, abbrev_offset)
        } else {
            let abbrev_offset = read_offset(&mut local)?;
            need(local, 1, data.len())?;
            let address_size = data[local];
            local += 1;
            (0x01, address_size, abbrev_offset)
        };

        let end = offset as u64 + length_size as u64 + unit_length;
        Ok(Self {
            unit_length,
            version,
            unit_type,
            address_size,
            debug_abbrev_offset,
            is_64bit,
            offset: offset as u64,
            first_die_offset: (offset + local) as u64,
            end_offset: end,
        })
    }
}

/// Sections handed to the debug-info parser.
#[derive(Debug, Clone, Copy)]
pub struct DwarfSections<'a> {
    pub debug_info: &'a [u8],
    pub debug_abbrev: &'a [u8],
    pub debug_str: Option<&'a [u8]>,
    pub debug_line_str: Option<&'a [u8]>,
    pub debug_str_offsets: Option<&'a [u8]>,
}

/// Parses every compilation unit into a flat, document-ordered DIE list.
pub fn parse_units(sections: DwarfSections<'_>) -> Result<Vec<Die>, ParseError> {
    let mut dies = Vec::new();
    let mut offset = 0usize;

    while offset + 4 <= sections.debug_info.len() {
        let header = CompilationUnitHeader::parse(sections.debug_info, offset)?;
        if header.end_offset as usize <= offset {
            return Err(ParseError::invalid_structure(
                "compilation unit",
                offset as u64,
                "unit length does not advance",
            ));
        }

        if header.debug_abbrev_offset as usize >= sections.debug_abbrev.len() {
            return Err(ParseError::invalid_structure(
                "compilation unit",
                header.offset,
                "abbreviation offset out of range",
            ));
        }
        let (abbrev_table, _) =
            AbbreviationTable::parse(&sections.debug_abbrev[header.debug_abbrev_offset as usize..])?;

        let mut resolver = StringResolver::new(
            sections.debug_str,
            sections.debug_line_str,
            sections.debug_str_offsets,
            header.is_64bit,
        );

        let mut parser = DieParser::new(
            sections.debug_info,
            &abbrev_table,
            header.address_size,
            header.is_64bit,
            header.offset as usize,
            header.first_die_offset as usize,
            header.end_offset as usize,
        );

        // The unit root carries DW_AT_str_offsets_base; pick it up before
        // resolving the root's own strings so strx attributes use the
        // right table window.
        if let Some(mut root) = parser.next_die()? {
            if let Some(AttributeValue::SecOffset(base)) = root.attr(DwAt::StrOffsetsBase) {
                resolver.str_offsets_base = *base;
            }
            resolver.resolve(&mut root);
            dies.push(root);
        }

        while let Some(mut die) = parser.next_die()? {
            resolver.resolve(&mut die);
            dies.push(die);
        }

        offset = header.end_offset as usize;
    }

    Ok(dies)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_dwarf4_unit_header() {
        let mut data = Vec::new();
        data.extend_from_slice(&11u32.to_le_bytes()); // unit_length
        data.extend_from_slice(&4u16.to_le_bytes()); // version
        data.extend_from_slice(&0u32.to_le_bytes()); // abbrev offset
        data.push(8); // address size

        let header = CompilationUnitHeader::parse(&data, 0).unwrap();
        assert_eq!(header.version, 4);
        assert_eq!(header.address_size, 8);
        assert!(!header.is_64bit);
        assert_eq!(header.first_die_offset, 11);
        assert_eq!(header.end_offset, 15);
    }

    #[test]
    fn parses_dwarf5_unit_header() {
        let mut data = Vec::new();
        data.extend_from_slice(&12u32.to_le_bytes()); // unit_length
        data.extend_from_slice(&5u16.to_le_bytes()); // version
        data.push(0x01); // DW_UT_compile
        data.push(8); // address size
        data.extend_from_slice(&0u32.to_le_bytes()); // abbrev offset

        let header = CompilationUnitHeader::parse(&data, 0).unwrap();
        assert_eq!(header.version, 5);
        assert_eq!(header.unit_type, 0x01);
        assert_eq!(header.address_size, 8);
        assert_eq!(header.first_die_offset, 12);
    }

    #[test]
    fn rejects_unknown_version() {
        let mut data = Vec::new();
        data.extend_from_slice(&7u32.to_le_bytes());
        data.extend_from_slice(&9u16.to_le_bytes());
        data.extend_from_slice(&[0u8; 8]);
        assert!(matches!(
            CompilationUnitHeader::parse(&data, 0),
            Err(ParseError::UnsupportedVersion { .. })
        ));
    }
}
