//! ELF (Executable and Linkable Format) parser.
//!
//! This module provides a complete ELF parser built from scratch,
//! supporting both 32-bit and 64-bit formats, both byte orders, and the
//! GNU symbol-version extension.

mod header;
mod relocation;
mod section;
mod segment;
mod symbol;
mod version;

pub use header::{ElfClass, ElfHeader, ElfType};
pub use relocation::{reloc_type_name, RawRelocation};
pub use section::SectionHeader;
pub use segment::ProgramHeader;
pub use symbol::SymbolEntry;
pub use version::VersionTable;

use crate::dwarf::{self, DwarfData};
use crate::{Container, ParseError, SectionView};
use abiscope_core::{Architecture, Bitness, Endianness, Relocation, Symbol};

/// A parsed ELF binary.
#[derive(Debug)]
pub struct Elf<'a> {
    /// Raw bytes of the file.
    data: &'a [u8],
    /// Parsed ELF header.
    pub header: ElfHeader,
    /// Section headers with resolved names.
    pub sections: Vec<SectionHeader>,
    /// Program headers (segments).
    pub segments: Vec<ProgramHeader>,
}

impl<'a> Elf<'a> {
    /// Parse an ELF file from raw bytes.
    pub fn parse(data: &'a [u8]) -> Result<Self, ParseError> {
        let header = ElfHeader::parse(data)?;
        let mut sections = Self::parse_section_headers(data, &header)?;
        let segments = Self::parse_program_headers(data, &header)?;

        // Resolve section names through the section-name string table.
        let names = sections
            .get(header.e_shstrndx as usize)
            .and_then(|shstrtab| shstrtab.data(data))
            .map(StringTable::new)
            .unwrap_or_else(StringTable::empty);
        for section in &mut sections {
            if let Some(name) = names.get(section.sh_name as usize) {
                section.set_name(name.to_string());
            }
        }

        Ok(Self {
            data,
            header,
            sections,
            segments,
        })
    }

    fn parse_section_headers(
        data: &[u8],
        header: &ElfHeader,
    ) -> Result<Vec<SectionHeader>, ParseError> {
        let mut sections = Vec::with_capacity(header.e_shnum as usize);
        let mut offset = header.e_shoff as usize;

        for _ in 0..header.e_shnum {
            if offset + header.e_shentsize as usize > data.len() {
                return Err(ParseError::too_short(
                    offset + header.e_shentsize as usize,
                    data.len(),
                ));
            }
            let section = SectionHeader::parse(&data[offset..], header.class, header.endianness)?;
            sections.push(section);
            offset += header.e_shentsize as usize;
        }

        Ok(sections)
    }

    fn parse_program_headers(
        data: &[u8],
        header: &ElfHeader,
    ) -> Result<Vec<ProgramHeader>, ParseError> {
        let mut segments = Vec::with_capacity(header.e_phnum as usize);
        let mut offset = header.e_phoff as usize;

        for _ in 0..header.e_phnum {
            if offset + header.e_phentsize as usize > data.len() {
                return Err(ParseError::too_short(
                    offset + header.e_phentsize as usize,
                    data.len(),
                ));
            }
            let segment = ProgramHeader::parse(&data[offset..], header.class, header.endianness)?;
            segments.push(segment);
            offset += header.e_phentsize as usize;
        }

        Ok(segments)
    }

    /// Returns the section with the given name.
    pub fn section_by_name(&self, name: &str) -> Option<&SectionHeader> {
        self.sections.iter().find(|s| s.name() == name)
    }

    /// Returns the file-backed data of a named section.
    pub fn section_data(&self, name: &str) -> Option<&'a [u8]> {
        self.section_by_name(name).and_then(|s| s.data(self.data))
    }

    /// nm-style code letter for a symbol: derived from the containing
    /// section's flags, lowercased for local binding.
    fn symbol_code(&self, entry: &SymbolEntry) -> char {
        let mut code = match entry.st_shndx {
            symbol::SHN_UNDEF => 'U',
            symbol::SHN_COMMON => 'B',
            symbol::SHN_ABS => '?',
            index => match self.sections.get(index as usize) {
                Some(section) => {
                    let flags = section.sh_flags
                        & (section::SHF_WRITE | section::SHF_ALLOC | section::SHF_EXECINSTR);
                    if flags == (section::SHF_ALLOC | section::SHF_EXECINSTR) {
                        'T'
                    } else if flags == section::SHF_ALLOC {
                        'R'
                    } else if flags == (section::SHF_ALLOC | section::SHF_WRITE) {
                        'D'
                    } else {
                        '?'
                    }
                }
                None => '?',
            },
        };
        if entry.is_local() {
            code = code.to_ascii_lowercase();
        }
        code
    }

    /// Parses one symbol table section plus its string table.
    ///
    /// The leading null entry is skipped. Relocations from every `.rel[a]`
    /// section linked against the same symbol table are attached to the
    /// symbols they reference and sorted by address; the returned list is
    /// sorted by ascending symbol address.
    fn parse_symbol_table(&self, table_type: u32) -> Result<Vec<Symbol>, ParseError> {
        let mut symbols = Vec::new();

        for (table_index, table) in self.sections.iter().enumerate() {
            if table.sh_type != table_type {
                continue;
            }
            let Some(entries_data) = table.data(self.data) else {
                continue;
            };
            let strtab = self
                .sections
                .get(table.sh_link as usize)
                .and_then(|s| s.data(self.data))
                .map(StringTable::new)
                .unwrap_or_else(StringTable::empty);

            let versions = if table.sh_type == section::SHT_DYNSYM {
                self.version_table(&strtab)
            } else {
                None
            };

            let entry_size = SymbolEntry::entry_size(self.header.class);
            let count = entries_data.len() / entry_size;
            let mut parsed = Vec::with_capacity(count.saturating_sub(1));

            for index in 1..count {
                let entry = SymbolEntry::parse(
                    &entries_data[index * entry_size..],
                    self.header.class,
                    self.header.endianness,
                )?;
                let name = strtab.get(entry.st_name as usize).unwrap_or("").to_string();
                let (library, version) = match &versions {
                    Some(table) => table.lookup(index),
                    None => (String::new(), String::new()),
                };

                parsed.push(Symbol {
                    name,
                    address: entry.st_value,
                    size: entry.st_size as i64,
                    code: self.symbol_code(&entry),
                    kind: entry.kind(),
                    binding: entry.binding(),
                    version,
                    library,
                    machine: self.header.machine,
                    relocations: Vec::new(),
                });
            }

            self.attach_relocations(table_index, &mut parsed)?;
            symbols.extend(parsed);
        }

        symbols.sort_by_key(|s| s.address);
        Ok(symbols)
    }

    /// Builds the GNU version table when both version sections exist.
    fn version_table(&self, strtab: &StringTable) -> Option<VersionTable> {
        let versym = self
            .sections
            .iter()
            .find(|s| s.sh_type == section::SHT_GNU_VERSYM)?
            .data(self.data)?;
        let verneed_section = self
            .sections
            .iter()
            .find(|s| s.sh_type == section::SHT_GNU_VERNEED)?;
        let verneed = verneed_section.data(self.data)?;
        Some(VersionTable::parse(
            versym,
            verneed,
            verneed_section.sh_info as usize,
            strtab.data,
            self.header.endianness,
        ))
    }

    /// Attaches relocations from sections linked to the symbol table at
    /// `table_index`. `symbols` is indexed by symbol-table position minus
    /// the null entry.
    fn attach_relocations(
        &self,
        table_index: usize,
        symbols: &mut [Symbol],
    ) -> Result<(), ParseError> {
        for section in &self.sections {
            let is_rela = section.sh_type == section::SHT_RELA;
            let is_rel = section.sh_type == section::SHT_REL;
            if !is_rela && !is_rel {
                continue;
            }
            if section.sh_link as usize != table_index {
                continue;
            }
            let Some(data) = section.data(self.data) else {
                continue;
            };

            let raw = if is_rela {
                RawRelocation::parse_rela(
                    data,
                    section.sh_info as usize,
                    self.header.class,
                    self.header.endianness,
                )?
            } else {
                RawRelocation::parse_rel(
                    data,
                    section.sh_info as usize,
                    self.header.class,
                    self.header.endianness,
                )?
            };

            for reloc in raw {
                if reloc.symbol_index == 0 {
                    continue;
                }
                // Skip the null entry when mapping table index to our list.
                let Some(target) = symbols.get_mut(reloc.symbol_index as usize - 1) else {
                    continue;
                };
                target.relocations.push(Relocation {
                    address: reloc.offset,
                    size: reloc.size(self.header.machine),
                    symbol_name: target.name.clone(),
                    offset: reloc.offset,
                    symbol_value: target.address,
                    info: reloc.info,
                    reloc_type: reloc_type_name(reloc.reloc_type, self.header.machine),
                    section_index: reloc.section_index,
                    addend: reloc.addend,
                });
            }
        }

        for symbol in symbols.iter_mut() {
            symbol.relocations.sort_by_key(|r| r.address);
        }
        Ok(())
    }
}

impl Container for Elf<'_> {
    fn arch(&self) -> Architecture {
        self.header.architecture()
    }

    fn endianness(&self) -> Endianness {
        self.header.endianness
    }

    fn bitness(&self) -> Bitness {
        match self.header.class {
            ElfClass::Elf32 => Bitness::Bits32,
            ElfClass::Elf64 => Bitness::Bits64,
        }
    }

    fn dynamic_symbols(&self) -> Result<Vec<Symbol>, ParseError> {
        self.parse_symbol_table(section::SHT_DYNSYM)
    }

    fn symbols(&self) -> Result<Vec<Symbol>, ParseError> {
        self.parse_symbol_table(section::SHT_SYMTAB)
    }

    fn text(&self) -> Result<(u64, &[u8]), ParseError> {
        let section = self.section_by_name(".text").ok_or(ParseError::NoText)?;
        let data = section.data(self.data).ok_or(ParseError::NoText)?;
        Ok((section.sh_addr, data))
    }

    fn pcln(&self) -> (u64, &[u8], &[u8]) {
        let text_start = self
            .section_by_name(".text")
            .map(|s| s.sh_addr)
            .unwrap_or(0);
        let symtab = self.section_data(".gosymtab").unwrap_or(&[]);
        let pclntab = self.section_data(".gopclntab").unwrap_or(&[]);
        (text_start, symtab, pclntab)
    }

    fn load_address(&self) -> Result<u64, ParseError> {
        self.segments
            .iter()
            .find(|p| p.is_executable_load())
            .map(|p| p.p_vaddr)
            .ok_or(ParseError::UnknownLoadAddress)
    }

    fn dwarf(&self) -> Result<DwarfData, ParseError> {
        let debug_info = self
            .section_data(".debug_info")
            .ok_or(ParseError::MissingDwarf("no .debug_info section"))?;
        let debug_abbrev = self
            .section_data(".debug_abbrev")
            .ok_or(ParseError::MissingDwarf("no .debug_abbrev section"))?;
        let debug_str = self.section_data(".debug_str");
        let debug_line_str = self.section_data(".debug_line_str");
        let debug_str_offsets = self.section_data(".debug_str_offsets");

        dwarf::parse(dwarf::DwarfSections {
            debug_info,
            debug_abbrev,
            debug_str,
            debug_line_str,
            debug_str_offsets,
        })
    }
}

/// A simple string table for null-terminated strings.
#[derive(Debug)]
pub(crate) struct StringTable<'a> {
    data: &'a [u8],
}

impl<'a> StringTable<'a> {
    pub(crate) fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    pub(crate) fn empty() -> Self {
        Self { data: &[] }
    }

    pub(crate) fn get(&self, offset: usize) -> Option<&'a str> {
        if offset >= self.data.len() {
            return None;
        }
        let remaining = &self.data[offset..];
        let end = remaining.iter().position(|&b| b == 0)?;
        std::str::from_utf8(&remaining[..end]).ok()
    }
}
