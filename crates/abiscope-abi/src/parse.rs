//! Signature building: DWARF entries to located parameter descriptors.
//!
//! For each component of a function (formal parameters in DIE order, then
//! the `"return"` pseudo-component) the builder constructs the descriptor
//! tree, classifies the component, and asks a per-function allocator for
//! its location. The `seen` map cuts recursion through self-referential
//! types; it lives for exactly one function build.

use crate::allocators::RegisterAllocator;
use crate::classify::classify;
use crate::descriptor::{
    ArrayParameter, BasicParameter, EnumParameter, FunctionDescription, Parameter,
    PointerParameter, QualifiedParameter, StructureParameter, VariableDescription,
};
use crate::AbiError;
use abiscope_core::{Symbol, TypeGraph, TypeId, TypeKind};
use abiscope_formats::dwarf::{Component, DwarfData, DwarfIndex, FunctionEntry, VariableEntry};
use std::collections::HashSet;

/// Builds located descriptors for one binary.
pub struct SignatureBuilder<'a> {
    data: &'a DwarfData,
    index: &'a DwarfIndex,
    graph: &'a mut TypeGraph,
}

impl<'a> SignatureBuilder<'a> {
    pub fn new(data: &'a DwarfData, index: &'a DwarfIndex, graph: &'a mut TypeGraph) -> Self {
        Self { data, index, graph }
    }

    /// Builds a function descriptor for a dynamic symbol.
    ///
    /// `is_call_site` flips the per-component direction rules: a call-site
    /// function receives its arguments from this binary and returns into
    /// it.
    pub fn function(
        &mut self,
        symbol: &Symbol,
        entry: &FunctionEntry,
        is_call_site: bool,
    ) -> Result<FunctionDescription, AbiError> {
        let components = entry.components(self.data, self.graph);
        let parameters = self.parameters_for(&components, is_call_site)?;

        Ok(FunctionDescription {
            name: symbol.name.clone(),
            type_name: "Function".to_string(),
            direction: symbol.direction().to_string(),
            parameters,
        })
    }

    /// Builds, classifies, and locates the given components with a fresh
    /// allocator. Components that do not produce a descriptor (undefined
    /// or function-typed) consume no allocator state.
    pub fn parameters_for(
        &mut self,
        components: &[Component],
        is_call_site: bool,
    ) -> Result<Vec<Parameter>, AbiError> {
        let mut allocator = RegisterAllocator::new();
        let mut seen = HashSet::new();
        let mut parameters = Vec::new();

        for component in components {
            let Some(mut parameter) =
                self.build_parameter(&component.name, component.ty, 0, &mut seen)
            else {
                continue;
            };

            let class = classify(self.graph, component.ty, 0);
            let location =
                allocator.register_for(class.lo, class.hi, component.size, &class.name)?;
            parameter.set_location(location);
            parameter.set_direction(direction_for(&component.name, is_call_site).to_string());
            parameters.push(parameter);
        }

        Ok(parameters)
    }

    /// Builds a variable descriptor; `None` when the record would be
    /// empty (no name or unresolvable type).
    pub fn variable(
        &mut self,
        symbol: &Symbol,
        entry: &VariableEntry,
    ) -> Option<VariableDescription> {
        let component = entry.component(self.data, self.graph)?;
        if component.name.is_empty() {
            return None;
        }
        Some(VariableDescription {
            name: component.name,
            type_name: component.type_name,
            size: component.size,
            direction: symbol.direction().to_string(),
        })
    }

    /// Recursively builds one descriptor. Dispatches on the type's class
    /// tag; undefined and bare-function components yield `None`.
    fn build_parameter(
        &mut self,
        name: &str,
        ty: Option<TypeId>,
        indirections: i64,
        seen: &mut HashSet<String>,
    ) -> Option<Parameter> {
        match self.graph.class_tag(ty) {
            "Pointer" => self.pointer_parameter(name, ty?, indirections, seen),
            "Qualified" => self.qualified_parameter(name, ty?, indirections, seen),
            "Typedef" => self.typedef_parameter(name, ty?, indirections, seen),
            "Struct" | "Union" | "Class" => self.structure_parameter(name, ty?, indirections, seen),
            "Array" => self.array_parameter(name, ty?, indirections, seen),
            "Enum" => self.enum_parameter(name, ty?),
            "Basic" | "Int" | "Uint" | "Char" | "Uchar" | "Bool" | "Float" | "Complex"
            | "Address" | "Unspecified" => self.basic_parameter(name, ty?),
            // "", "Undefined", "Function", anything unknown.
            _ => None,
        }
    }

    fn basic_parameter(&mut self, name: &str, ty: TypeId) -> Option<Parameter> {
        let resolved = self.graph.get(ty);
        Some(Parameter::Basic(BasicParameter {
            name: name.to_string(),
            type_name: resolved.name.clone(),
            class: resolved.class_tag().to_string(),
            size: resolved.size,
            ..Default::default()
        }))
    }

    fn pointer_parameter(
        &mut self,
        name: &str,
        ty: TypeId,
        indirections: i64,
        seen: &mut HashSet<String>,
    ) -> Option<Parameter> {
        let (target, pointer_name, size) = {
            let resolved = self.graph.get(ty);
            let TypeKind::Pointer { target } = resolved.kind else {
                return None;
            };
            (target, resolved.name.clone(), resolved.size)
        };

        let mut indirections = indirections;
        let mut underlying = None;
        if let Some(target_id) = target {
            let target_name = self.graph.get(target_id).name.clone();
            // Only descend into types we haven't seen; a repeat name is a
            // cycle and the underlying type stays unreported.
            if !seen.contains(&target_name) {
                indirections += 1;
                seen.insert(target_name);
                underlying = self.build_parameter("", Some(target_id), indirections, seen);
            }
        }

        Some(Parameter::Pointer(PointerParameter {
            name: name.to_string(),
            type_name: pointer_name,
            class: "Pointer".to_string(),
            size,
            location: String::new(),
            direction: String::new(),
            underlying_type: underlying.map(Box::new),
            indirections,
        }))
    }

    fn array_parameter(
        &mut self,
        name: &str,
        ty: TypeId,
        indirections: i64,
        seen: &mut HashSet<String>,
    ) -> Option<Parameter> {
        let (element, count, array_name, array_size) = {
            let resolved = self.graph.get(ty);
            let TypeKind::Array { element, count, .. } = resolved.kind else {
                return None;
            };
            (element, count, resolved.name.clone(), resolved.size)
        };

        let mut indirections = indirections;
        let mut items = None;
        let mut element_name = String::new();
        if let Some(element_id) = element {
            let target_name = self.graph.get(element_id).name.clone();
            element_name = target_name.clone();
            if !seen.contains(&target_name) {
                indirections += 1;
                seen.insert(target_name);
                items = self.build_parameter("", Some(element_id), indirections, seen);
            }
        }

        let size = match &items {
            Some(item) if count >= 0 => count * item.size(),
            _ => array_size,
        };

        Some(Parameter::Array(ArrayParameter {
            name: if name.is_empty() {
                array_name
            } else {
                name.to_string()
            },
            type_name: element_name,
            class: "Array".to_string(),
            size,
            location: String::new(),
            direction: String::new(),
            count,
            items_type: items.map(Box::new),
        }))
    }

    fn structure_parameter(
        &mut self,
        name: &str,
        ty: TypeId,
        indirections: i64,
        seen: &mut HashSet<String>,
    ) -> Option<Parameter> {
        let (kind, type_name, size, fields) = {
            let resolved = self.graph.get(ty);
            let TypeKind::Record { kind, ref fields } = resolved.kind else {
                return None;
            };
            let fields: Vec<(String, Option<TypeId>)> = fields
                .iter()
                .map(|f| (f.name.clone(), f.ty))
                .collect();
            (kind, resolved.name.clone(), resolved.size, fields)
        };

        let mut built = Vec::with_capacity(fields.len());
        for (field_name, field_ty) in fields {
            if let Some(field) = self.build_parameter(&field_name, field_ty, indirections, seen) {
                built.push(field);
            }
        }

        Some(Parameter::Structure(StructureParameter {
            name: name.to_string(),
            type_name,
            class: kind.as_str().to_string(),
            size,
            location: String::new(),
            direction: String::new(),
            fields: built,
        }))
    }

    fn enum_parameter(&mut self, name: &str, ty: TypeId) -> Option<Parameter> {
        let resolved = self.graph.get(ty);
        let TypeKind::Enum { ref constants } = resolved.kind else {
            return None;
        };
        Some(Parameter::Enum(EnumParameter {
            name: name.to_string(),
            type_name: resolved.name.clone(),
            class: "Enum".to_string(),
            size: resolved.size,
            location: String::new(),
            direction: String::new(),
            count: constants.len() as i64,
            constants: constants.iter().cloned().collect(),
        }))
    }

    fn qualified_parameter(
        &mut self,
        name: &str,
        ty: TypeId,
        indirections: i64,
        seen: &mut HashSet<String>,
    ) -> Option<Parameter> {
        let target = {
            let resolved = self.graph.get(ty);
            let TypeKind::Qualified { target, .. } = resolved.kind else {
                return None;
            };
            target
        };

        // A qualified pointer is still a pointer.
        if self.graph.class_tag(target) == "Pointer" {
            return self.pointer_parameter(name, target?, indirections, seen);
        }

        let (type_name, size) = match target {
            Some(inner) => {
                let resolved = self.graph.get(inner);
                (resolved.name.clone(), resolved.size)
            }
            None => (String::new(), 0),
        };

        Some(Parameter::Qualified(QualifiedParameter {
            name: name.to_string(),
            type_name,
            class: "Qualified".to_string(),
            size,
            location: String::new(),
            direction: String::new(),
        }))
    }

    fn typedef_parameter(
        &mut self,
        name: &str,
        ty: TypeId,
        indirections: i64,
        seen: &mut HashSet<String>,
    ) -> Option<Parameter> {
        let (alias, target) = {
            let resolved = self.graph.get(ty);
            let TypeKind::Typedef { target } = resolved.kind else {
                return None;
            };
            (resolved.name.clone(), target)
        };

        // A record of the same name makes the typedef transparent.
        if let Some(record) = self.index.struct_type(&alias, self.data, self.graph) {
            if matches!(self.graph.get(record).kind, TypeKind::Record { .. }) {
                return self.structure_parameter(name, record, indirections, seen);
            }
        }

        let (underlying_name, size) = match target {
            Some(inner) => {
                let resolved = self.graph.get(inner);
                (resolved.name.clone(), self.graph.get(ty).size)
            }
            None => (String::new(), -1),
        };

        Some(Parameter::Basic(BasicParameter {
            name: if name.is_empty() {
                alias
            } else {
                name.to_string()
            },
            type_name: underlying_name,
            class: "Typedef".to_string(),
            size,
            ..Default::default()
        }))
    }
}

/// Per-component direction: exports flow out of the binary, imports into
/// it. Call sites see the opposite of definitions.
fn direction_for(name: &str, is_call_site: bool) -> &'static str {
    match (is_call_site, name == "return") {
        (false, true) => "export",
        (true, true) => "import",
        (true, false) => "export",
        (false, false) => "import",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use abiscope_core::{Field, Qualifier, RecordKind, Type};
    use abiscope_formats::dwarf::{self, DwarfSections};

    struct Fixture {
        data: DwarfData,
        index: DwarfIndex,
        graph: TypeGraph,
    }

    impl Fixture {
        fn new() -> Self {
            let data = dwarf::parse(DwarfSections {
                debug_info: &[],
                debug_abbrev: &[],
                debug_str: None,
                debug_line_str: None,
                debug_str_offsets: None,
            })
            .unwrap();
            let index = DwarfIndex::build(&data);
            Self {
                data,
                index,
                graph: TypeGraph::new(),
            }
        }
    }

    fn int64(graph: &mut TypeGraph) -> TypeId {
        graph.add(Type {
            name: "long int".into(),
            size: 8,
            kind: TypeKind::Int,
        })
    }

    fn double(graph: &mut TypeGraph) -> TypeId {
        graph.add(Type {
            name: "double".into(),
            size: 8,
            kind: TypeKind::Float,
        })
    }

    fn component(name: &str, graph: &TypeGraph, ty: TypeId) -> Component {
        let resolved = graph.get(ty);
        Component {
            name: name.to_string(),
            type_name: resolved.name.clone(),
            class: resolved.class_tag(),
            size: resolved.size,
            ty: Some(ty),
        }
    }

    #[test]
    fn seven_integer_arguments_spill() {
        let mut fixture = Fixture::new();
        let long = int64(&mut fixture.graph);
        let components: Vec<Component> = ["a", "b", "c", "d", "e", "f", "g"]
            .iter()
            .map(|n| component(n, &fixture.graph, long))
            .collect();

        let mut builder =
            SignatureBuilder::new(&fixture.data, &fixture.index, &mut fixture.graph);
        let params = builder.parameters_for(&components, false).unwrap();

        let locations: Vec<&str> = params.iter().map(|p| p.location()).collect();
        assert_eq!(
            locations,
            vec!["%rdi", "%rsi", "%rdx", "%rcx", "%r8", "%r9", "framebase+8"]
        );
        assert!(params.iter().all(|p| {
            let Parameter::Basic(b) = p else { return false };
            b.direction == "import"
        }));
    }

    #[test]
    fn doubles_take_sse_registers() {
        let mut fixture = Fixture::new();
        let d = double(&mut fixture.graph);
        let components = vec![
            component("x", &fixture.graph, d),
            component("y", &fixture.graph, d),
            component("return", &fixture.graph, d),
        ];

        let mut builder =
            SignatureBuilder::new(&fixture.data, &fixture.index, &mut fixture.graph);
        let params = builder.parameters_for(&components, false).unwrap();

        assert_eq!(params[0].location(), "%xmm0");
        assert_eq!(params[1].location(), "%xmm1");
        // The return pseudo-parameter runs through the same pool.
        assert_eq!(params[2].location(), "%xmm2");
        assert_eq!(params[2].name(), "return");
        let Parameter::Basic(ret) = &params[2] else {
            panic!("expected basic")
        };
        assert_eq!(ret.direction, "export");
    }

    #[test]
    fn mixed_struct_takes_primary_integer_register() {
        // struct S { int a; double b; }: merged INTEGER/SSE, primary %rdi.
        let mut fixture = Fixture::new();
        let int4 = fixture.graph.add(Type {
            name: "int".into(),
            size: 4,
            kind: TypeKind::Int,
        });
        let dbl = double(&mut fixture.graph);
        let s = fixture.graph.add(Type {
            name: "S".into(),
            size: 16,
            kind: TypeKind::Record {
                kind: RecordKind::Struct,
                fields: vec![
                    Field {
                        name: "a".into(),
                        ty: Some(int4),
                    },
                    Field {
                        name: "b".into(),
                        ty: Some(dbl),
                    },
                ],
            },
        });
        let components = vec![component("s", &fixture.graph, s)];

        let mut builder =
            SignatureBuilder::new(&fixture.data, &fixture.index, &mut fixture.graph);
        let params = builder.parameters_for(&components, false).unwrap();

        let Parameter::Structure(structure) = &params[0] else {
            panic!("expected structure")
        };
        assert_eq!(structure.location, "%rdi");
        assert_eq!(structure.size, 16);
        assert_eq!(structure.fields.len(), 2);
        // Fields carry no location of their own.
        assert_eq!(structure.fields[0].location(), "");
    }

    #[test]
    fn char_pointer_reports_underlying_type() {
        let mut fixture = Fixture::new();
        let ch = fixture.graph.add(Type {
            name: "char".into(),
            size: 1,
            kind: TypeKind::Char,
        });
        let ptr = fixture.graph.add(Type {
            name: String::new(),
            size: 8,
            kind: TypeKind::Pointer { target: Some(ch) },
        });
        let components = vec![component("p", &fixture.graph, ptr)];

        let mut builder =
            SignatureBuilder::new(&fixture.data, &fixture.index, &mut fixture.graph);
        let params = builder.parameters_for(&components, false).unwrap();

        let Parameter::Pointer(pointer) = &params[0] else {
            panic!("expected pointer")
        };
        assert_eq!(pointer.location, "%rdi");
        assert_eq!(pointer.indirections, 1);
        let underlying = pointer.underlying_type.as_ref().unwrap();
        assert_eq!(underlying.class(), "Char");
        assert_eq!(underlying.size(), 1);
    }

    #[test]
    fn oversized_struct_spills_whole() {
        let mut fixture = Fixture::new();
        let long = int64(&mut fixture.graph);
        let fields = (0..9)
            .map(|i| Field {
                name: format!("f{i}"),
                ty: Some(long),
            })
            .collect();
        let big = fixture.graph.add(Type {
            name: "Big".into(),
            size: 72,
            kind: TypeKind::Record {
                kind: RecordKind::Struct,
                fields,
            },
        });
        let components = vec![
            component("x", &fixture.graph, big),
            component("y", &fixture.graph, long),
        ];

        let mut builder =
            SignatureBuilder::new(&fixture.data, &fixture.index, &mut fixture.graph);
        let params = builder.parameters_for(&components, false).unwrap();

        assert_eq!(params[0].location(), "framebase+8");
        // Cursor advanced past the 72-byte aggregate; the next integer
        // still takes a register.
        assert_eq!(params[1].location(), "%rdi");
    }

    #[test]
    fn self_referential_struct_terminates() {
        // struct node { long v; struct node *next; }
        let mut fixture = Fixture::new();
        let long = int64(&mut fixture.graph);
        let node = fixture.graph.reserve(0x100);
        let next_ptr = fixture.graph.add(Type {
            name: String::new(),
            size: 8,
            kind: TypeKind::Pointer { target: Some(node) },
        });
        fixture.graph.replace(
            node,
            Type {
                name: "node".into(),
                size: 16,
                kind: TypeKind::Record {
                    kind: RecordKind::Struct,
                    fields: vec![
                        Field {
                            name: "v".into(),
                            ty: Some(long),
                        },
                        Field {
                            name: "next".into(),
                            ty: Some(next_ptr),
                        },
                    ],
                },
            },
        );
        let ptr = fixture.graph.add(Type {
            name: String::new(),
            size: 8,
            kind: TypeKind::Pointer { target: Some(node) },
        });
        let components = vec![component("n", &fixture.graph, ptr)];

        let mut builder =
            SignatureBuilder::new(&fixture.data, &fixture.index, &mut fixture.graph);
        let params = builder.parameters_for(&components, false).unwrap();

        let Parameter::Pointer(outer) = &params[0] else {
            panic!("expected pointer")
        };
        assert_eq!(outer.indirections, 1);
        let Parameter::Structure(structure) = outer.underlying_type.as_deref().unwrap() else {
            panic!("expected struct underlying")
        };
        let Parameter::Pointer(inner) = &structure.fields[1] else {
            panic!("expected pointer field")
        };
        // Recursion was cut: node was already seen.
        assert!(inner.underlying_type.is_none());
        assert_eq!(inner.indirections, 1);
    }

    #[test]
    fn qualified_pointer_is_still_a_pointer() {
        let mut fixture = Fixture::new();
        let ch = fixture.graph.add(Type {
            name: "char".into(),
            size: 1,
            kind: TypeKind::Char,
        });
        let ptr = fixture.graph.add(Type {
            name: String::new(),
            size: 8,
            kind: TypeKind::Pointer { target: Some(ch) },
        });
        let qualified = fixture.graph.add(Type {
            name: String::new(),
            size: 8,
            kind: TypeKind::Qualified {
                qualifier: Qualifier::Const,
                target: Some(ptr),
            },
        });
        let components = vec![component("p", &fixture.graph, qualified)];

        let mut builder =
            SignatureBuilder::new(&fixture.data, &fixture.index, &mut fixture.graph);
        let params = builder.parameters_for(&components, false).unwrap();
        assert!(matches!(params[0], Parameter::Pointer(_)));
        assert_eq!(params[0].location(), "%rdi");
    }

    #[test]
    fn qualified_scalar_collapses() {
        let mut fixture = Fixture::new();
        let int4 = fixture.graph.add(Type {
            name: "int".into(),
            size: 4,
            kind: TypeKind::Int,
        });
        let qualified = fixture.graph.add(Type {
            name: String::new(),
            size: 4,
            kind: TypeKind::Qualified {
                qualifier: Qualifier::Volatile,
                target: Some(int4),
            },
        });
        let components = vec![component("v", &fixture.graph, qualified)];

        let mut builder =
            SignatureBuilder::new(&fixture.data, &fixture.index, &mut fixture.graph);
        let params = builder.parameters_for(&components, false).unwrap();
        let Parameter::Qualified(q) = &params[0] else {
            panic!("expected qualified")
        };
        assert_eq!(q.type_name, "int");
        assert_eq!(q.size, 4);
        assert_eq!(q.location, "%rdi");
    }

    #[test]
    fn enum_parameter_records_constants() {
        let mut fixture = Fixture::new();
        let color = fixture.graph.add(Type {
            name: "color".into(),
            size: 4,
            kind: TypeKind::Enum {
                constants: vec![("RED".into(), 0), ("GREEN".into(), 1), ("BLUE".into(), 2)],
            },
        });
        let components = vec![component("c", &fixture.graph, color)];

        let mut builder =
            SignatureBuilder::new(&fixture.data, &fixture.index, &mut fixture.graph);
        let params = builder.parameters_for(&components, false).unwrap();
        let Parameter::Enum(e) = &params[0] else {
            panic!("expected enum")
        };
        assert_eq!(e.count, 3);
        assert_eq!(e.constants.get("GREEN"), Some(&1));
        assert_eq!(e.location, "%rdi");
    }

    #[test]
    fn call_site_directions_flip() {
        let mut fixture = Fixture::new();
        let long = int64(&mut fixture.graph);
        let components = vec![
            component("a", &fixture.graph, long),
            component("return", &fixture.graph, long),
        ];

        let mut builder =
            SignatureBuilder::new(&fixture.data, &fixture.index, &mut fixture.graph);
        let params = builder.parameters_for(&components, true).unwrap();

        let Parameter::Basic(a) = &params[0] else { panic!() };
        let Parameter::Basic(ret) = &params[1] else { panic!() };
        assert_eq!(a.direction, "export");
        assert_eq!(ret.direction, "import");
    }

    #[test]
    fn empty_struct_locates_to_none() {
        let mut fixture = Fixture::new();
        let empty = fixture.graph.add(Type {
            name: "Empty".into(),
            size: 0,
            kind: TypeKind::Record {
                kind: RecordKind::Struct,
                fields: vec![],
            },
        });
        let components = vec![component("e", &fixture.graph, empty)];

        let mut builder =
            SignatureBuilder::new(&fixture.data, &fixture.index, &mut fixture.graph);
        let params = builder.parameters_for(&components, false).unwrap();
        assert_eq!(params[0].location(), "none");
    }
}
