//! DWARF tag, attribute, form, and encoding constants.
//!
//! Only the entries the reader dispatches on get their own variant; the
//! rest round-trip through `Unknown` so unrecognised DIEs are skippable
//! rather than fatal.

/// DIE tags (DW_TAG_*).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DwTag {
    ArrayType,
    ClassType,
    EnumerationType,
    FormalParameter,
    LexicalBlock,
    Member,
    PointerType,
    ReferenceType,
    CompileUnit,
    StructureType,
    SubroutineType,
    Typedef,
    UnionType,
    UnspecifiedParameters,
    InlinedSubroutine,
    SubrangeType,
    BaseType,
    ConstType,
    Enumerator,
    PackedType,
    Subprogram,
    Variable,
    VolatileType,
    RestrictType,
    Namespace,
    UnspecifiedType,
    /// DWARF 5 call site (also accepts the GNU and legacy encodings).
    CallSite,
    /// DWARF 5 call site parameter (also GNU and legacy encodings).
    CallSiteParameter,
    Unknown(u16),
}

impl From<u16> for DwTag {
    fn from(value: u16) -> Self {
        match value {
            0x01 => Self::ArrayType,
            0x02 => Self::ClassType,
            0x04 => Self::EnumerationType,
            0x05 => Self::FormalParameter,
            0x0b => Self::LexicalBlock,
            0x0d => Self::Member,
            0x0f => Self::PointerType,
            0x10 => Self::ReferenceType,
            0x11 => Self::CompileUnit,
            0x13 => Self::StructureType,
            0x15 => Self::SubroutineType,
            0x16 => Self::Typedef,
            0x17 => Self::UnionType,
            0x18 => Self::UnspecifiedParameters,
            0x1d => Self::InlinedSubroutine,
            0x21 => Self::SubrangeType,
            0x24 => Self::BaseType,
            0x26 => Self::ConstType,
            0x28 => Self::Enumerator,
            0x2d => Self::PackedType,
            0x2e => Self::Subprogram,
            0x34 => Self::Variable,
            0x35 => Self::VolatileType,
            0x37 => Self::RestrictType,
            0x39 => Self::Namespace,
            0x3b => Self::UnspecifiedType,
            0x48 | 0x44 | 0x4109 => Self::CallSite,
            0x49 | 0x45 | 0x410a => Self::CallSiteParameter,
            other => Self::Unknown(other),
        }
    }
}

/// Attribute names (DW_AT_*).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DwAt {
    Location,
    Name,
    ByteSize,
    StmtList,
    LowPc,
    HighPc,
    Language,
    CompDir,
    ConstValue,
    Producer,
    Prototyped,
    ByteStride,
    UpperBound,
    AbstractOrigin,
    Count,
    DataMemberLocation,
    DeclFile,
    DeclLine,
    Declaration,
    Encoding,
    External,
    FrameBase,
    Specification,
    Type,
    CallAllCalls,
    CallReturnPc,
    CallOrigin,
    CallTailCall,
    CallTarget,
    LinkageName,
    StrOffsetsBase,
    AddrBase,
    RnglistsBase,
    LoclistsBase,
    /// DW_AT_MIPS_linkage_name, the pre-DWARF4 spelling.
    MipsLinkageName,
    Unknown(u16),
}

impl From<u16> for DwAt {
    fn from(value: u16) -> Self {
        match value {
            0x02 => Self::Location,
            0x03 => Self::Name,
            0x0b => Self::ByteSize,
            0x10 => Self::StmtList,
            0x11 => Self::LowPc,
            0x12 => Self::HighPc,
            0x13 => Self::Language,
            0x1b => Self::CompDir,
            0x1c => Self::ConstValue,
            0x25 => Self::Producer,
            0x27 => Self::Prototyped,
            0x2f => Self::UpperBound,
            0x31 => Self::AbstractOrigin,
            0x37 => Self::Count,
            0x38 => Self::DataMemberLocation,
            0x3a => Self::DeclFile,
            0x3b => Self::DeclLine,
            0x3c => Self::Declaration,
            0x3e => Self::Encoding,
            0x3f => Self::External,
            0x40 => Self::FrameBase,
            0x47 => Self::Specification,
            0x49 => Self::Type,
            0x51 => Self::ByteStride,
            0x6e => Self::LinkageName,
            0x7a => Self::CallAllCalls,
            0x7d => Self::CallReturnPc,
            0x7f => Self::CallOrigin,
            0x82 => Self::CallTailCall,
            0x83 => Self::CallTarget,
            0x72 => Self::StrOffsetsBase,
            0x73 => Self::AddrBase,
            0x74 => Self::RnglistsBase,
            0x8c => Self::LoclistsBase,
            0x2007 => Self::MipsLinkageName,
            other => Self::Unknown(other),
        }
    }
}

/// Attribute forms (DW_FORM_*).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DwForm {
    Addr,
    Block2,
    Block4,
    Data2,
    Data4,
    Data8,
    String,
    Block,
    Block1,
    Data1,
    Flag,
    Sdata,
    Strp,
    Udata,
    RefAddr,
    Ref1,
    Ref2,
    Ref4,
    Ref8,
    RefUdata,
    Indirect,
    SecOffset,
    Exprloc,
    FlagPresent,
    Strx,
    Addrx,
    RefSup4,
    StrpSup,
    Data16,
    LineStrp,
    RefSig8,
    ImplicitConst,
    Loclistx,
    Rnglistx,
    RefSup8,
    Strx1,
    Strx2,
    Strx3,
    Strx4,
    Addrx1,
    Addrx2,
    Addrx3,
    Addrx4,
    Unknown(u8),
}

impl From<u8> for DwForm {
    fn from(value: u8) -> Self {
        match value {
            0x01 => Self::Addr,
            0x03 => Self::Block2,
            0x04 => Self::Block4,
            0x05 => Self::Data2,
            0x06 => Self::Data4,
            0x07 => Self::Data8,
            0x08 => Self::String,
            0x09 => Self::Block,
            0x0a => Self::Block1,
            0x0b => Self::Data1,
            0x0c => Self::Flag,
            0x0d => Self::Sdata,
            0x0e => Self::Strp,
            0x0f => Self::Udata,
            0x10 => Self::RefAddr,
            0x11 => Self::Ref1,
            0x12 => Self::Ref2,
            0x13 => Self::Ref4,
            0x14 => Self::Ref8,
            0x15 => Self::RefUdata,
            0x16 => Self::Indirect,
            0x17 => Self::SecOffset,
            0x18 => Self::Exprloc,
            0x19 => Self::FlagPresent,
            0x1a => Self::Strx,
            0x1b => Self::Addrx,
            0x1c => Self::RefSup4,
            0x1d => Self::StrpSup,
            0x1e => Self::Data16,
            0x1f => Self::LineStrp,
            0x20 => Self::RefSig8,
            0x21 => Self::ImplicitConst,
            0x22 => Self::Loclistx,
            0x23 => Self::Rnglistx,
            0x24 => Self::RefSup8,
            0x25 => Self::Strx1,
            0x26 => Self::Strx2,
            0x27 => Self::Strx3,
            0x28 => Self::Strx4,
            0x29 => Self::Addrx1,
            0x2a => Self::Addrx2,
            0x2b => Self::Addrx3,
            0x2c => Self::Addrx4,
            other => Self::Unknown(other),
        }
    }
}

/// Base type encodings (DW_ATE_*).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DwAte {
    Address,
    Boolean,
    ComplexFloat,
    Float,
    Signed,
    SignedChar,
    Unsigned,
    UnsignedChar,
    ImaginaryFloat,
    DecimalFloat,
    Utf,
    Unknown(u16),
}

impl From<u16> for DwAte {
    fn from(value: u16) -> Self {
        match value {
            0x01 => Self::Address,
            0x02 => Self::Boolean,
            0x03 => Self::ComplexFloat,
            0x04 => Self::Float,
            0x05 => Self::Signed,
            0x06 => Self::SignedChar,
            0x07 => Self::Unsigned,
            0x08 => Self::UnsignedChar,
            0x09 => Self::ImaginaryFloat,
            0x0f => Self::DecimalFloat,
            0x10 => Self::Utf,
            other => Self::Unknown(other),
        }
    }
}
