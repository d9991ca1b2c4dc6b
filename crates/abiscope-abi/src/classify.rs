//! AMD64 System V register classification.
//!
//! Register classes and the merge/post-merge algorithm follow §3.2.3 of
//! the System V AMD64 ABI: every eightbyte of an argument is assigned a
//! class, aggregates merge their fields' classes, and a cleanup pass
//! resolves the awkward combinations.

use abiscope_core::{TypeGraph, TypeId, TypeKind};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::warn;

/// A register class for AMD64 (System V ABI, page 16).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterClass {
    /// Integer types that fit into one of the general purpose registers.
    Integer,
    /// Types that fit into an SSE register.
    Sse,
    /// Types passed and returned in the most significant half of an SSE
    /// register.
    SseUp,
    /// Types returned via the x87 FPU.
    X87,
    X87Up,
    /// Complex types returned via the x87 FPU.
    ComplexX87,
    /// Initialiser in the algorithms; padding and empty structs/unions.
    NoClass,
    /// Types passed and returned in memory via the stack.
    Memory,
}

impl fmt::Display for RegisterClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Integer => "INTEGER",
            Self::Sse => "SSE",
            Self::SseUp => "SSEUP",
            Self::X87 => "X87",
            Self::X87Up => "X87UP",
            Self::ComplexX87 => "COMPLEX_X87",
            Self::NoClass => "NO_CLASS",
            Self::Memory => "MEMORY",
        };
        f.write_str(name)
    }
}

/// The (lo, hi) class pair for one argument, plus the class name and the
/// pointer indirection count carried through for the descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub lo: RegisterClass,
    pub hi: RegisterClass,
    pub name: String,
    pub indirections: i64,
}

impl Classification {
    fn new(lo: RegisterClass, hi: RegisterClass, name: &str) -> Self {
        Self {
            lo,
            hi,
            name: name.to_string(),
            indirections: 0,
        }
    }
}

/// Pointers always take a general purpose register, whatever the depth.
pub fn classify_pointer(indirections: i64) -> Classification {
    Classification {
        lo: RegisterClass::Integer,
        hi: RegisterClass::NoClass,
        name: "Pointer".to_string(),
        indirections,
    }
}

/// Classifies the type behind a handle.
///
/// `indirections` greater than zero short-circuits to the pointer rule:
/// the caller already unwrapped that many pointer hops.
pub fn classify(graph: &TypeGraph, ty: Option<TypeId>, indirections: i64) -> Classification {
    if indirections > 0 {
        return classify_pointer(indirections);
    }
    let Some(id) = ty else {
        return unknown(graph, ty);
    };

    let resolved = graph.get(id);
    match &resolved.kind {
        TypeKind::Pointer { .. } => classify_pointer(indirections),
        TypeKind::Int
        | TypeKind::Uint
        | TypeKind::Char
        | TypeKind::Uchar
        | TypeKind::Bool
        | TypeKind::Address
        | TypeKind::Basic => classify_integral(resolved.size),
        TypeKind::Float => classify_float(resolved.size),
        TypeKind::Complex => classify_complex(resolved.size),
        TypeKind::Enum { .. } => {
            Classification::new(RegisterClass::Integer, RegisterClass::Integer, "Enum")
        }
        TypeKind::Array { element, .. } => classify_array(graph, resolved.size, *element),
        TypeKind::Record { kind, fields } => {
            classify_record(graph, kind.as_str(), resolved.size, fields.iter().map(|f| f.ty))
        }
        TypeKind::Typedef { target } | TypeKind::Qualified { target, .. } => {
            classify(graph, *target, indirections)
        }
        TypeKind::Function => {
            Classification::new(RegisterClass::NoClass, RegisterClass::NoClass, "Function")
        }
        TypeKind::Unspecified | TypeKind::Undefined => unknown(graph, ty),
    }
}

fn unknown(_graph: &TypeGraph, _ty: Option<TypeId>) -> Classification {
    static WARNED: AtomicBool = AtomicBool::new(false);
    if !WARNED.swap(true, Ordering::Relaxed) {
        warn!("unknown type variant during classification; emitting NO_CLASS");
    }
    Classification::new(RegisterClass::NoClass, RegisterClass::NoClass, "Unknown")
}

/// Integral scalars: one eightbyte is INTEGER, a 128-bit integer is
/// passed in memory, and larger integer vectors take SSE registers.
fn classify_integral(size: i64) -> Classification {
    if size > 16 {
        return Classification::new(RegisterClass::Sse, RegisterClass::SseUp, "IntegerVec");
    }
    if size > 8 {
        return Classification::new(RegisterClass::Memory, RegisterClass::NoClass, "Integer");
    }
    Classification::new(RegisterClass::Integer, RegisterClass::NoClass, "Integer")
}

/// Floating point scalars: 32- and 64-bit floats are SSE, the 80-bit x87
/// long double (stored as 10 or 16 bytes) is X87, larger vectors are SSE.
fn classify_float(size: i64) -> Classification {
    if size <= 8 {
        return Classification::new(RegisterClass::Sse, RegisterClass::SseUp, "Float");
    }
    if size == 10 || size == 16 {
        return Classification::new(RegisterClass::X87, RegisterClass::X87Up, "Float");
    }
    Classification::new(RegisterClass::Sse, RegisterClass::SseUp, "FloatVec")
}

/// Complex floats: complex long double goes through the x87 unit, the
/// rest are passed in memory.
fn classify_complex(size: i64) -> Classification {
    if size == 32 {
        return Classification::new(
            RegisterClass::ComplexX87,
            RegisterClass::NoClass,
            "CplxFloat",
        );
    }
    Classification::new(RegisterClass::Memory, RegisterClass::NoClass, "CplxFloat")
}

/// Arrays larger than four eightbytes go to memory; otherwise an array
/// classifies as its element type.
fn classify_array(graph: &TypeGraph, size: i64, element: Option<TypeId>) -> Classification {
    if size > 64 {
        return Classification::new(RegisterClass::Memory, RegisterClass::NoClass, "Array");
    }
    classify(graph, element, 0)
}

/// Aggregate classification: merge every field's classes, then clean up.
fn classify_record(
    graph: &TypeGraph,
    kind: &str,
    size: i64,
    fields: impl Iterator<Item = Option<TypeId>>,
) -> Classification {
    if size > 64 {
        return Classification::new(RegisterClass::Memory, RegisterClass::NoClass, kind);
    }

    let mut lo = RegisterClass::NoClass;
    let mut hi = RegisterClass::NoClass;
    for field in fields {
        let field_class = classify(graph, field, 0);
        lo = merge(lo, field_class.lo);
        hi = merge(hi, field_class.hi);
    }

    post_merge(&mut lo, &mut hi, size);
    Classification::new(lo, hi, kind)
}

/// Merges two eightbyte classes (AMD64 ABI, page 21, bottom).
pub fn merge(original: RegisterClass, new: RegisterClass) -> RegisterClass {
    use RegisterClass::*;

    // (a) If both classes are equal, this is the resulting class.
    if original == new {
        return original;
    }
    // (b) If one of the classes is NO_CLASS, the result is the other.
    if original == NoClass {
        return new;
    }
    if new == NoClass {
        return original;
    }
    // (c) If one of the classes is MEMORY, the result is MEMORY.
    if original == Memory || new == Memory {
        return Memory;
    }
    // (d) If one of the classes is INTEGER, the result is INTEGER.
    if original == Integer || new == Integer {
        return Integer;
    }
    // (e) If one of the classes is X87, X87UP, or COMPLEX_X87, MEMORY is
    // used as class.
    if matches!(original, X87 | X87Up | ComplexX87) || matches!(new, X87 | X87Up | ComplexX87) {
        return Memory;
    }
    // (f) Otherwise class SSE is used.
    Sse
}

/// Post-merge cleanup (AMD64 ABI, page 22, point 5).
pub fn post_merge(lo: &mut RegisterClass, hi: &mut RegisterClass, size: i64) {
    use RegisterClass::*;

    // (a) If one of the classes is MEMORY, the whole argument is passed
    // in memory.
    if *lo == Memory || *hi == Memory {
        *lo = Memory;
        *hi = Memory;
    }
    // (b) If X87UP is not preceded by X87, the whole argument is passed
    // in memory.
    if *hi == X87Up && *lo != X87 {
        *lo = Memory;
        *hi = Memory;
    }
    // (c) If the size of the aggregate exceeds two eightbytes and the
    // first eightbyte isn't SSE or any other eightbyte isn't SSEUP, the
    // whole argument is passed in memory.
    if size > 128 && (*lo != Sse || *hi != SseUp) {
        *lo = Memory;
        *hi = Memory;
    }
    // (d) If SSEUP is not preceded by SSE or SSEUP, it is converted to
    // SSE.
    if *hi == SseUp && (*lo != Sse && *lo != SseUp) {
        *hi = Sse;
    }
}
