//! Architecture identification and properties.

/// Supported CPU architectures.
///
/// The naming follows the short arch strings reported by the container
/// reader; only `Amd64` has a signature builder behind it, the rest are
/// recognised for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Architecture {
    /// x86-64 / AMD64
    Amd64,
    /// 32-bit x86
    I386,
    /// ARM 32-bit
    Arm,
    /// ARM 64-bit (AArch64)
    Arm64,
    /// PowerPC 64-bit big-endian
    Ppc64,
    /// PowerPC 64-bit little-endian
    Ppc64le,
    /// IBM z/Architecture
    S390x,
    /// Unknown architecture
    Unknown(u16),
}

impl Architecture {
    /// Returns the pointer size in bytes for this architecture.
    pub fn pointer_size(&self) -> usize {
        match self {
            Self::Amd64 | Self::Arm64 | Self::Ppc64 | Self::Ppc64le | Self::S390x => 8,
            Self::I386 | Self::Arm => 4,
            Self::Unknown(_) => 8,
        }
    }

    /// Returns the short name of this architecture ("" when unknown).
    pub fn name(&self) -> &'static str {
        match self {
            Self::Amd64 => "amd64",
            Self::I386 => "386",
            Self::Arm => "arm",
            Self::Arm64 => "arm64",
            Self::Ppc64 => "ppc64",
            Self::Ppc64le => "ppc64le",
            Self::S390x => "s390x",
            Self::Unknown(_) => "",
        }
    }
}

/// Binary bitness (32-bit or 64-bit).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bitness {
    Bits32,
    Bits64,
}

/// Byte order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endianness {
    Little,
    Big,
}
