//! # abiscope-abi
//!
//! The x86-64 System V side of abiscope: type classification per the AMD64
//! ABI, the per-function register/stack allocator, and the signature
//! builder that turns DWARF entries into located parameter descriptors.
//!
//! Other architectures are recognised by the container reader but have no
//! signature builder; the corpus for them is empty.

pub mod allocators;
pub mod classify;
pub mod descriptor;
pub mod parse;

pub use allocators::{FramebaseAllocator, RegisterAllocator};
pub use classify::{classify, merge, post_merge, Classification, RegisterClass};
pub use descriptor::{
    ArrayParameter, BasicParameter, EnumParameter, FunctionDescription, Parameter,
    PointerParameter, QualifiedParameter, StructureParameter, VariableDescription,
};
pub use parse::SignatureBuilder;

use thiserror::Error;

/// Errors raised by classification and allocation.
#[derive(Error, Debug)]
pub enum AbiError {
    /// A NO_CLASS classification reached the allocator outside the
    /// empty-aggregate case: a classifier bug.
    #[error("cannot allocate a NO_CLASS register for class {0}")]
    Unallocatable(String),

    /// The classification pair matched no allocation rule.
    #[error("unknown classification ({0}, {1})")]
    UnknownClassification(RegisterClass, RegisterClass),
}
