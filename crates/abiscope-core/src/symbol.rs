//! Symbol and relocation types.

/// A symbol from the binary's dynamic or full symbol table.
#[derive(Debug, Clone)]
pub struct Symbol {
    /// Symbol name (may be empty for some symbols).
    pub name: String,
    /// Virtual address of the symbol.
    pub address: u64,
    /// Size of the symbol in bytes (0 if unknown).
    pub size: i64,
    /// nm-style code letter (T for text, D for data, U for undefined, ...).
    /// Lowercase for local binding.
    pub code: char,
    /// Symbol type.
    pub kind: SymbolKind,
    /// Symbol binding (local, global, weak).
    pub binding: SymbolBinding,
    /// Symbol version from the version tables, if any.
    pub version: String,
    /// Library the versioned symbol is imported from, if any.
    pub library: String,
    /// Raw machine code of the containing file (ELF e_machine).
    pub machine: u16,
    /// Relocations that apply to this symbol, in increasing address order.
    pub relocations: Vec<Relocation>,
}

impl Symbol {
    /// Returns true if this symbol is a function.
    pub fn is_function(&self) -> bool {
        matches!(self.kind, SymbolKind::Func)
    }

    /// Returns true if this symbol is a data object.
    pub fn is_object(&self) -> bool {
        matches!(self.kind, SymbolKind::Object)
    }

    /// Returns true if this symbol has global binding.
    pub fn is_global(&self) -> bool {
        matches!(self.binding, SymbolBinding::Global)
    }

    /// Import/export direction: undefined symbols are imports, everything
    /// else is provided by this binary.
    pub fn direction(&self) -> &'static str {
        if self.code == 'U' {
            "import"
        } else {
            "export"
        }
    }
}

/// Symbol type, mirroring the ELF `STT_*` constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    /// No type (unspecified).
    NoType,
    /// Data object (variable, array, etc.).
    Object,
    /// Function or other executable code.
    Func,
    /// File name symbol.
    File,
    /// Processor-specific low bound.
    LoProc,
    /// Processor-specific high bound.
    HiProc,
    /// Other/unknown type.
    Other(u8),
}

impl SymbolKind {
    /// The `STT_*` name used in descriptors and diagnostics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoType => "STT_NOTYPE",
            Self::Object => "STT_OBJECT",
            Self::Func => "STT_FUNC",
            Self::File => "STT_FILE",
            Self::LoProc => "STT_LOPROC",
            Self::HiProc => "STT_HIPROC",
            Self::Other(_) => "UNKNOWN",
        }
    }
}

/// Symbol binding, mirroring the ELF `STB_*` constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolBinding {
    /// Local symbol (not visible outside the object file).
    Local,
    /// Global symbol (visible to all object files).
    Global,
    /// Weak symbol (like global but can be overridden).
    Weak,
    /// Processor-specific low bound.
    LoProc,
    /// Processor-specific high bound.
    HiProc,
    /// Other/unknown binding.
    Other(u8),
}

impl SymbolBinding {
    /// The `STB_*` name used in descriptors and diagnostics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Local => "STB_LOCAL",
            Self::Global => "STB_GLOBAL",
            Self::Weak => "STB_WEAK",
            Self::LoProc => "STB_LOPROC",
            Self::HiProc => "STB_HIPROC",
            Self::Other(_) => "UNKNOWN",
        }
    }
}

/// A relocation entry owned by the symbol it applies to.
#[derive(Debug, Clone)]
pub struct Relocation {
    /// Address of the first byte the relocation applies to.
    pub address: u64,
    /// Number of bytes affected.
    pub size: u64,
    /// Name of the symbol the relocation refers to.
    pub symbol_name: String,
    /// Offset within the relocated section.
    pub offset: u64,
    /// Value of the referenced symbol.
    pub symbol_value: u64,
    /// Raw r_info word.
    pub info: u64,
    /// Machine-specific relocation type name (e.g. R_X86_64_GLOB_DAT).
    pub reloc_type: String,
    /// Index of the section the relocation applies to.
    pub section_index: usize,
    /// Explicit addend for RELA entries.
    pub addend: i64,
}

impl Relocation {
    /// Renders the relocation the way a disassembly listing annotates it.
    ///
    /// `insn_offset` is the offset of the referencing instruction from the
    /// start of the symbol that owns this relocation.
    pub fn print(&self, insn_offset: u64) -> String {
        format!(
            "{}+{:#x}: {} {}",
            self.symbol_name,
            insn_offset,
            self.reloc_type,
            self.symbol_value.wrapping_add(self.addend as u64)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn symbol(code: char) -> Symbol {
        Symbol {
            name: "sym".into(),
            address: 0x1000,
            size: 8,
            code,
            kind: SymbolKind::Func,
            binding: SymbolBinding::Global,
            version: String::new(),
            library: String::new(),
            machine: 62,
            relocations: Vec::new(),
        }
    }

    #[test]
    fn direction_follows_code_letter() {
        assert_eq!(symbol('U').direction(), "import");
        assert_eq!(symbol('T').direction(), "export");
        // Lowercase (local) text symbols are still exports.
        assert_eq!(symbol('t').direction(), "export");
    }

    #[test]
    fn kind_and_binding_names() {
        assert_eq!(SymbolKind::Func.as_str(), "STT_FUNC");
        assert_eq!(SymbolKind::Other(9).as_str(), "UNKNOWN");
        assert_eq!(SymbolBinding::Weak.as_str(), "STB_WEAK");
    }
}
