//! Traits for binary container abstraction.

use crate::dwarf::DwarfData;
use crate::ParseError;
use abiscope_core::{Architecture, Bitness, Endianness, Symbol};

/// A parsed binary container.
///
/// This trait abstracts over container formats (only ELF is implemented;
/// Mach-O and PE would register additional openers) to provide a uniform
/// interface for the corpus builder.
pub trait Container {
    /// Returns the target architecture.
    fn arch(&self) -> Architecture;

    /// Returns the byte order.
    fn endianness(&self) -> Endianness;

    /// Returns whether this is a 32-bit or 64-bit binary.
    fn bitness(&self) -> Bitness;

    /// Returns the dynamic symbol table, sorted by ascending address.
    fn dynamic_symbols(&self) -> Result<Vec<Symbol>, ParseError>;

    /// Returns all symbols, sorted by ascending address.
    fn symbols(&self) -> Result<Vec<Symbol>, ParseError>;

    /// Returns the text section start address and bytes.
    fn text(&self) -> Result<(u64, &[u8]), ParseError>;

    /// Returns the Go line-table triple: text start, `.gosymtab` bytes,
    /// and `.gopclntab` bytes (empty when the sections are absent).
    fn pcln(&self) -> (u64, &[u8], &[u8]);

    /// Returns the expected load address of the file.
    fn load_address(&self) -> Result<u64, ParseError>;

    /// Parses the DWARF debug information carried by the file.
    fn dwarf(&self) -> Result<DwarfData, ParseError>;
}

/// A section in a binary.
pub trait SectionView {
    /// Section name.
    fn name(&self) -> &str;

    /// Virtual address where this section is loaded.
    fn virtual_address(&self) -> u64;

    /// Size in bytes.
    fn size(&self) -> u64;

    /// Returns true if this section contains executable code.
    fn is_executable(&self) -> bool;

    /// Returns true if this section is writable.
    fn is_writable(&self) -> bool;

    /// Returns true if this section is loaded into memory.
    fn is_allocated(&self) -> bool;
}
