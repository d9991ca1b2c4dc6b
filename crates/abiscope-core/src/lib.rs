//! # abiscope-core
//!
//! Core abstractions for the abiscope ABI extractor. This crate defines
//! container-agnostic types for symbols, relocations, architectures, and
//! the language-neutral type model used by the classifier.

pub mod arch;
pub mod symbol;
pub mod types;

pub use arch::{Architecture, Bitness, Endianness};
pub use symbol::{Relocation, Symbol, SymbolBinding, SymbolKind};
pub use types::{Field, Qualifier, RecordKind, Type, TypeGraph, TypeId, TypeKind};
