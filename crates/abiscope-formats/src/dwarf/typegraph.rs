//! Lazy type materialisation from DIEs into the core type graph.
//!
//! Types are built on demand: each DIE offset is materialised at most once
//! per [`TypeGraph`], and the arena slot is reserved before any recursion
//! so self-referential types (linked lists, trees) terminate.

use super::die::Die;
use super::tags::{DwAt, DwAte, DwTag};
use super::DwarfData;
use abiscope_core::{Field, Qualifier, RecordKind, Type, TypeGraph, TypeId, TypeKind};
use tracing::debug;

impl DwarfData {
    /// Materialises the type rooted at a global `.debug_info` offset.
    ///
    /// Returns `None` when the offset does not name a DIE. Unknown type
    /// tags materialise as `Undefined` rather than failing: one bad type
    /// must not sink the rest of the corpus.
    pub fn type_at(&self, offset: u64, graph: &mut TypeGraph) -> Option<TypeId> {
        if let Some(id) = graph.lookup_offset(offset) {
            return Some(id);
        }
        let index = self.index_of(offset)?;
        let id = graph.reserve(offset);
        let ty = self.build_type(index, graph);
        graph.replace(id, ty);
        Some(id)
    }

    fn type_of(&self, die: &Die, graph: &mut TypeGraph) -> Option<TypeId> {
        self.type_at(die.type_ref()?, graph)
    }

    fn build_type(&self, index: usize, graph: &mut TypeGraph) -> Type {
        let die = self.die(index);
        let name = die.name().unwrap_or("").to_string();
        let byte_size = die.byte_size();

        match die.tag {
            DwTag::BaseType => Type {
                name,
                size: byte_size.unwrap_or(-1),
                kind: base_kind(die.encoding()),
            },
            DwTag::PointerType | DwTag::ReferenceType => {
                let target = self.type_of(die, graph);
                Type {
                    name,
                    size: byte_size.unwrap_or(8),
                    kind: TypeKind::Pointer { target },
                }
            }
            DwTag::ArrayType => {
                let element = self.type_of(die, graph);
                let element_size = element.map(|id| graph.get(id).size).unwrap_or(-1);
                let (count, stride) = self.subrange(index, element_size);
                let size = byte_size.unwrap_or(if count >= 0 && element_size >= 0 {
                    count * element_size
                } else {
                    -1
                });
                Type {
                    name,
                    size,
                    kind: TypeKind::Array {
                        element,
                        count,
                        stride,
                    },
                }
            }
            DwTag::StructureType | DwTag::UnionType | DwTag::ClassType => {
                let kind = match die.tag {
                    DwTag::UnionType => RecordKind::Union,
                    DwTag::ClassType => RecordKind::Class,
                    _ => RecordKind::Struct,
                };
                let member_refs: Vec<(String, Option<u64>)> = self
                    .children(index)
                    .filter(|child| child.tag == DwTag::Member)
                    .map(|child| (child.name().unwrap_or("").to_string(), child.type_ref()))
                    .collect();
                let fields = member_refs
                    .into_iter()
                    .map(|(field_name, type_ref)| Field {
                        name: field_name,
                        ty: type_ref.and_then(|offset| self.type_at(offset, graph)),
                    })
                    .collect();
                Type {
                    name,
                    // Aggregate size is the DWARF-reported size, padding
                    // included, never the sum of the fields.
                    size: byte_size.unwrap_or(-1),
                    kind: TypeKind::Record { kind, fields },
                }
            }
            DwTag::EnumerationType => {
                let constants = self
                    .children(index)
                    .filter(|child| child.tag == DwTag::Enumerator)
                    .map(|child| {
                        (
                            child.name().unwrap_or("").to_string(),
                            child.constant(DwAt::ConstValue).unwrap_or(0),
                        )
                    })
                    .collect();
                Type {
                    name,
                    size: byte_size.unwrap_or(4),
                    kind: TypeKind::Enum { constants },
                }
            }
            DwTag::Typedef => {
                let target = self.type_of(die, graph);
                let size = target.map(|id| graph.get(id).size).unwrap_or(-1);
                Type {
                    name,
                    size,
                    kind: TypeKind::Typedef { target },
                }
            }
            DwTag::ConstType | DwTag::VolatileType | DwTag::RestrictType | DwTag::PackedType => {
                let qualifier = match die.tag {
                    DwTag::VolatileType => Qualifier::Volatile,
                    DwTag::RestrictType => Qualifier::Restrict,
                    DwTag::PackedType => Qualifier::Packed,
                    _ => Qualifier::Const,
                };
                let target = self.type_of(die, graph);
                let size = target.map(|id| graph.get(id).size).unwrap_or(-1);
                Type {
                    name,
                    size,
                    kind: TypeKind::Qualified { qualifier, target },
                }
            }
            DwTag::SubroutineType => Type {
                name,
                size: -1,
                kind: TypeKind::Function,
            },
            DwTag::UnspecifiedType => Type {
                name,
                size: 0,
                kind: TypeKind::Unspecified,
            },
            other => {
                debug!(tag = ?other, offset = die.offset, "unhandled type tag");
                Type {
                    name,
                    size: byte_size.unwrap_or(-1),
                    kind: TypeKind::Undefined,
                }
            }
        }
    }

    /// Reads the first subrange child of an array DIE: (count, stride).
    fn subrange(&self, index: usize, element_size: i64) -> (i64, i64) {
        for child in self.children(index) {
            if child.tag != DwTag::SubrangeType {
                continue;
            }
            let count = child
                .constant(DwAt::Count)
                .or_else(|| child.constant(DwAt::UpperBound).map(|upper| upper + 1))
                .unwrap_or(-1);
            let stride = child.constant(DwAt::ByteStride).unwrap_or(element_size);
            return (count, stride);
        }
        (-1, element_size)
    }
}

fn base_kind(encoding: Option<DwAte>) -> TypeKind {
    match encoding {
        Some(DwAte::Address) => TypeKind::Address,
        Some(DwAte::Boolean) => TypeKind::Bool,
        Some(DwAte::ComplexFloat) => TypeKind::Complex,
        Some(DwAte::Float) | Some(DwAte::ImaginaryFloat) | Some(DwAte::DecimalFloat) => {
            TypeKind::Float
        }
        Some(DwAte::Signed) => TypeKind::Int,
        Some(DwAte::SignedChar) => TypeKind::Char,
        Some(DwAte::Unsigned) | Some(DwAte::Utf) => TypeKind::Uint,
        Some(DwAte::UnsignedChar) => TypeKind::Uchar,
        Some(DwAte::Unknown(_)) | None => TypeKind::Basic,
    }
}
