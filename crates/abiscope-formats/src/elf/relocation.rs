//! ELF relocation parsing.
//!
//! Relocation entries are decoded from `.rela.*` / `.rel.*` sections and
//! later attached to the symbol they reference, sorted by address.

use super::header::{self, ElfClass};
use crate::ParseError;
use abiscope_core::Endianness;

/// A decoded relocation before symbol attachment.
#[derive(Debug, Clone)]
pub struct RawRelocation {
    /// r_offset: address (or section offset) the relocation applies to.
    pub offset: u64,
    /// Index of the referenced symbol in the linked symbol table.
    pub symbol_index: u32,
    /// Machine-specific relocation type.
    pub reloc_type: u32,
    /// Raw r_info word.
    pub info: u64,
    /// Explicit addend (0 for REL entries).
    pub addend: i64,
    /// Index of the section the relocation applies to (sh_info).
    pub section_index: usize,
}

impl RawRelocation {
    /// Parse a run of RELA entries.
    pub fn parse_rela(
        data: &[u8],
        section_index: usize,
        class: ElfClass,
        endianness: Endianness,
    ) -> Result<Vec<Self>, ParseError> {
        Self::parse_entries(data, section_index, class, endianness, true)
    }

    /// Parse a run of REL entries (implicit addend).
    pub fn parse_rel(
        data: &[u8],
        section_index: usize,
        class: ElfClass,
        endianness: Endianness,
    ) -> Result<Vec<Self>, ParseError> {
        Self::parse_entries(data, section_index, class, endianness, false)
    }

    fn parse_entries(
        data: &[u8],
        section_index: usize,
        class: ElfClass,
        endianness: Endianness,
        has_addend: bool,
    ) -> Result<Vec<Self>, ParseError> {
        let entry_size = match (class, has_addend) {
            (ElfClass::Elf32, false) => 8,
            (ElfClass::Elf32, true) => 12,
            (ElfClass::Elf64, false) => 16,
            (ElfClass::Elf64, true) => 24,
        };

        let read_u32 = |offset: usize| -> u32 {
            let bytes = [
                data[offset],
                data[offset + 1],
                data[offset + 2],
                data[offset + 3],
            ];
            match endianness {
                Endianness::Little => u32::from_le_bytes(bytes),
                Endianness::Big => u32::from_be_bytes(bytes),
            }
        };
        let read_u64 = |offset: usize| -> u64 {
            let mut bytes = [0u8; 8];
            bytes.copy_from_slice(&data[offset..offset + 8]);
            match endianness {
                Endianness::Little => u64::from_le_bytes(bytes),
                Endianness::Big => u64::from_be_bytes(bytes),
            }
        };

        let mut relocations = Vec::with_capacity(data.len() / entry_size);
        let mut offset = 0;
        while offset + entry_size <= data.len() {
            let reloc = match class {
                ElfClass::Elf32 => {
                    let r_offset = read_u32(offset) as u64;
                    let r_info = read_u32(offset + 4) as u64;
                    let addend = if has_addend {
                        read_u32(offset + 8) as i32 as i64
                    } else {
                        0
                    };
                    Self {
                        offset: r_offset,
                        symbol_index: (r_info >> 8) as u32,
                        reloc_type: (r_info & 0xff) as u32,
                        info: r_info,
                        addend,
                        section_index,
                    }
                }
                ElfClass::Elf64 => {
                    let r_offset = read_u64(offset);
                    let r_info = read_u64(offset + 8);
                    let addend = if has_addend {
                        read_u64(offset + 16) as i64
                    } else {
                        0
                    };
                    Self {
                        offset: r_offset,
                        symbol_index: (r_info >> 32) as u32,
                        reloc_type: (r_info & 0xffff_ffff) as u32,
                        info: r_info,
                        addend,
                        section_index,
                    }
                }
            };
            relocations.push(reloc);
            offset += entry_size;
        }

        Ok(relocations)
    }

    /// Number of bytes the relocation patches (x86-64 widths; 8 otherwise).
    pub fn size(&self, machine: u16) -> u64 {
        if machine != header::EM_X86_64 {
            return 8;
        }
        match self.reloc_type {
            // PC32, GOT32, PLT32, 32, 32S, GOTPCREL
            2..=4 | 9..=11 | 26 => 4,
            12 | 13 => 2,
            14 | 15 => 1,
            _ => 8,
        }
    }
}

/// Renders a relocation type name for the given machine.
pub fn reloc_type_name(reloc_type: u32, machine: u16) -> String {
    match machine {
        header::EM_X86_64 => {
            let name = match reloc_type {
                0 => "NONE",
                1 => "64",
                2 => "PC32",
                3 => "GOT32",
                4 => "PLT32",
                5 => "COPY",
                6 => "GLOB_DAT",
                7 => "JUMP_SLOT",
                8 => "RELATIVE",
                9 => "GOTPCREL",
                10 => "32",
                11 => "32S",
                12 => "16",
                13 => "PC16",
                14 => "8",
                15 => "PC8",
                16 => "DTPMOD64",
                17 => "DTPOFF64",
                18 => "TPOFF64",
                19 => "TLSGD",
                20 => "TLSLD",
                21 => "DTPOFF32",
                22 => "GOTTPOFF",
                23 => "TPOFF32",
                24 => "PC64",
                25 => "GOTOFF64",
                26 => "GOTPC32",
                37 => "IRELATIVE",
                _ => return format!("R_X86_64_{}", reloc_type),
            };
            format!("R_X86_64_{}", name)
        }
        header::EM_386 => format!("R_386_{}", reloc_type),
        header::EM_ARM => format!("R_ARM_{}", reloc_type),
        header::EM_AARCH64 => format!("R_AARCH64_{}", reloc_type),
        header::EM_PPC64 => format!("R_PPC64_{}", reloc_type),
        header::EM_S390 => format!("R_390_{}", reloc_type),
        _ => "R_UNKNOWN".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_elf64_rela_entries() {
        let mut data = Vec::new();
        data.extend_from_slice(&0x3000u64.to_le_bytes()); // r_offset
        let r_info = (5u64 << 32) | 6; // symbol 5, GLOB_DAT
        data.extend_from_slice(&r_info.to_le_bytes());
        data.extend_from_slice(&(-8i64).to_le_bytes()); // addend

        let relocs =
            RawRelocation::parse_rela(&data, 3, ElfClass::Elf64, Endianness::Little).unwrap();
        assert_eq!(relocs.len(), 1);
        assert_eq!(relocs[0].offset, 0x3000);
        assert_eq!(relocs[0].symbol_index, 5);
        assert_eq!(relocs[0].reloc_type, 6);
        assert_eq!(relocs[0].addend, -8);
        assert_eq!(relocs[0].section_index, 3);
    }

    #[test]
    fn names_common_x86_64_types() {
        assert_eq!(reloc_type_name(7, header::EM_X86_64), "R_X86_64_JUMP_SLOT");
        assert_eq!(reloc_type_name(99, header::EM_X86_64), "R_X86_64_99");
        assert_eq!(reloc_type_name(1, 0xffff), "R_UNKNOWN");
    }

    #[test]
    fn width_follows_type() {
        let reloc = RawRelocation {
            offset: 0,
            symbol_index: 0,
            reloc_type: 2, // PC32
            info: 0,
            addend: 0,
            section_index: 0,
        };
        assert_eq!(reloc.size(header::EM_X86_64), 4);
    }
}
