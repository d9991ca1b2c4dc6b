//! Language-neutral type model.
//!
//! Types reconstructed from debug info form a graph that may contain cycles
//! (a struct whose field points back at itself). The graph therefore lives
//! in an arena keyed by [`TypeId`] handles rather than in owned recursive
//! values; traversals stay cycle-safe as long as they track visited handles.

use std::collections::HashMap;

/// Handle to a type stored in a [`TypeGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeId(u32);

impl TypeId {
    /// Index into the arena.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A materialised type.
#[derive(Debug, Clone, PartialEq)]
pub struct Type {
    /// Source-level name; empty for anonymous types.
    pub name: String,
    /// Size in bytes as reported by the debug info (-1 when unknown).
    pub size: i64,
    /// The variant payload.
    pub kind: TypeKind,
}

impl Type {
    /// Stable class tag used in JSON output and as the dispatch key for
    /// classification and descriptor building.
    pub fn class_tag(&self) -> &'static str {
        match &self.kind {
            TypeKind::Basic => "Basic",
            TypeKind::Int => "Int",
            TypeKind::Uint => "Uint",
            TypeKind::Char => "Char",
            TypeKind::Uchar => "Uchar",
            TypeKind::Bool => "Bool",
            TypeKind::Float => "Float",
            TypeKind::Complex => "Complex",
            TypeKind::Address => "Address",
            TypeKind::Unspecified => "Unspecified",
            TypeKind::Pointer { .. } => "Pointer",
            TypeKind::Array { .. } => "Array",
            TypeKind::Record { kind, .. } => kind.as_str(),
            TypeKind::Enum { .. } => "Enum",
            TypeKind::Typedef { .. } => "Typedef",
            TypeKind::Qualified { .. } => "Qualified",
            TypeKind::Function => "Function",
            TypeKind::Undefined => "Undefined",
        }
    }
}

/// The closed sum of type variants.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeKind {
    /// Base type with an encoding the reader did not refine further.
    Basic,
    /// Signed integer.
    Int,
    /// Unsigned integer.
    Uint,
    /// Signed character.
    Char,
    /// Unsigned character.
    Uchar,
    /// Boolean.
    Bool,
    /// Floating point (including x87 long double).
    Float,
    /// Complex floating point.
    Complex,
    /// Machine address base type.
    Address,
    /// DWARF unspecified type (e.g. C `void` behind a pointer).
    Unspecified,
    /// Pointer to a target type; `None` when the target was unresolvable.
    Pointer { target: Option<TypeId> },
    /// Fixed-size array. `count` is -1 for incomplete arrays.
    Array {
        element: Option<TypeId>,
        count: i64,
        stride: i64,
    },
    /// Struct, union, or class with ordered fields.
    Record { kind: RecordKind, fields: Vec<Field> },
    /// Enumeration with its constant table in declaration order.
    Enum { constants: Vec<(String, i64)> },
    /// Type alias.
    Typedef { target: Option<TypeId> },
    /// Qualified wrapper (const/volatile/restrict/packed).
    Qualified {
        qualifier: Qualifier,
        target: Option<TypeId>,
    },
    /// Subroutine type.
    Function,
    /// Placeholder for unresolvable or in-construction types.
    Undefined,
}

/// Record discriminant for struct-like aggregates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Struct,
    Union,
    Class,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Struct => "Struct",
            Self::Union => "Union",
            Self::Class => "Class",
        }
    }
}

/// Type qualifier kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Qualifier {
    Const,
    Volatile,
    Restrict,
    Packed,
}

/// A named field of a record.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    /// Field name; empty for anonymous members.
    pub name: String,
    /// Field type handle, when resolvable.
    pub ty: Option<TypeId>,
}

/// Arena of materialised types.
///
/// Cyclic references are representable because a slot can be reserved (as
/// [`TypeKind::Undefined`]) before the type that fills it is fully built,
/// so a self-referential struct finds its own handle already memoised.
#[derive(Debug, Default)]
pub struct TypeGraph {
    types: Vec<Type>,
    by_offset: HashMap<u64, TypeId>,
}

impl TypeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a type that has no debug-info offset of its own.
    pub fn add(&mut self, ty: Type) -> TypeId {
        let id = TypeId(self.types.len() as u32);
        self.types.push(ty);
        id
    }

    /// Reserves a slot for the type at `offset` and memoises the handle.
    ///
    /// Returns the handle; the caller fills the slot with [`Self::replace`]
    /// once construction finishes. A second reservation for the same offset
    /// returns the existing handle, which is what breaks cycles.
    pub fn reserve(&mut self, offset: u64) -> TypeId {
        if let Some(&id) = self.by_offset.get(&offset) {
            return id;
        }
        let id = self.add(Type {
            name: String::new(),
            size: -1,
            kind: TypeKind::Undefined,
        });
        self.by_offset.insert(offset, id);
        id
    }

    /// Replaces the contents of a reserved slot.
    pub fn replace(&mut self, id: TypeId, ty: Type) {
        self.types[id.index()] = ty;
    }

    /// Returns the handle memoised for a debug-info offset, if any.
    pub fn lookup_offset(&self, offset: u64) -> Option<TypeId> {
        self.by_offset.get(&offset).copied()
    }

    /// Borrows the type behind a handle.
    pub fn get(&self, id: TypeId) -> &Type {
        &self.types[id.index()]
    }

    /// Class tag for an optional handle; an absent type is "Undefined".
    pub fn class_tag(&self, id: Option<TypeId>) -> &'static str {
        match id {
            Some(id) => self.get(id).class_tag(),
            None => "Undefined",
        }
    }

    /// Number of types in the arena.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Returns true when no type has been materialised yet.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserve_is_idempotent_per_offset() {
        let mut graph = TypeGraph::new();
        let a = graph.reserve(0x40);
        let b = graph.reserve(0x40);
        assert_eq!(a, b);
        assert_eq!(graph.len(), 1);
    }

    #[test]
    fn cyclic_record_is_representable() {
        let mut graph = TypeGraph::new();
        // struct node { struct node *next; }
        let node = graph.reserve(0x10);
        let next_ptr = graph.add(Type {
            name: String::new(),
            size: 8,
            kind: TypeKind::Pointer { target: Some(node) },
        });
        graph.replace(
            node,
            Type {
                name: "node".into(),
                size: 8,
                kind: TypeKind::Record {
                    kind: RecordKind::Struct,
                    fields: vec![Field {
                        name: "next".into(),
                        ty: Some(next_ptr),
                    }],
                },
            },
        );

        let ty = graph.get(node);
        assert_eq!(ty.class_tag(), "Struct");
        match &ty.kind {
            TypeKind::Record { fields, .. } => {
                let inner = graph.get(fields[0].ty.unwrap());
                assert_eq!(inner.class_tag(), "Pointer");
            }
            _ => panic!("expected record"),
        }
    }

    #[test]
    fn class_tags_are_stable() {
        let mut graph = TypeGraph::new();
        let id = graph.add(Type {
            name: "unsigned int".into(),
            size: 4,
            kind: TypeKind::Uint,
        });
        assert_eq!(graph.class_tag(Some(id)), "Uint");
        assert_eq!(graph.class_tag(None), "Undefined");
    }
}
