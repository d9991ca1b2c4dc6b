//! Name-indexed tables over the DIE stream.
//!
//! One pass over the document-ordered DIEs builds three tables keyed by
//! name (subprograms, variables, resolved call sites) plus the struct
//! cache that typedef resolution consults. Formal parameters attach to the
//! most recent pending subprogram, the way the stream orders them.

use super::die::Die;
use super::tags::{DwAt, DwTag};
use super::DwarfData;
use abiscope_core::{TypeGraph, TypeId};
use indexmap::IndexMap;
use std::collections::HashMap;
use tracing::debug;

/// One typed component of a signature: a formal parameter, the return
/// pseudo-component, or a variable's own record.
#[derive(Debug, Clone)]
pub struct Component {
    /// Component name; `"return"` for the return pseudo-component.
    pub name: String,
    /// Name of the component's type (may be empty).
    pub type_name: String,
    /// Stable class tag of the component's type.
    pub class: &'static str,
    /// Size in bytes (-1 when unknown).
    pub size: i64,
    /// Materialised type handle.
    pub ty: Option<TypeId>,
}

/// A subprogram with its formal parameters in DIE order.
#[derive(Debug, Clone)]
pub struct FunctionEntry {
    /// Document-order index of the subprogram DIE.
    pub die: usize,
    /// Document-order indices of the formal parameter DIEs.
    pub params: Vec<usize>,
}

impl FunctionEntry {
    /// Builds the typed component list: parameters in DIE order, then the
    /// `"return"` pseudo-component when the subprogram has a type.
    ///
    /// Parameters without a name or with an unresolvable type are skipped
    /// individually; the rest of the signature still builds.
    pub fn components(&self, data: &DwarfData, graph: &mut TypeGraph) -> Vec<Component> {
        let mut components = Vec::with_capacity(self.params.len() + 1);

        for &param in &self.params {
            let die = data.die(param);
            let Some(name) = die.name() else {
                debug!(offset = die.offset, "skipping unnamed formal parameter");
                continue;
            };
            let name = name.to_string();
            match component_type(die, data, graph) {
                Some((type_name, class, size, ty)) => components.push(Component {
                    name,
                    type_name,
                    class,
                    size,
                    ty: Some(ty),
                }),
                None => {
                    debug!(param = %name, "cannot resolve parameter type, skipping");
                }
            }
        }

        let fn_die = data.die(self.die);
        if let Some((type_name, class, size, ty)) = component_type(fn_die, data, graph) {
            components.push(Component {
                name: "return".to_string(),
                type_name,
                class,
                size,
                ty: Some(ty),
            });
        }

        components
    }
}

/// A global variable DIE.
#[derive(Debug, Clone)]
pub struct VariableEntry {
    /// Document-order index of the variable DIE.
    pub die: usize,
}

impl VariableEntry {
    /// Builds the variable's single component, if its type resolves.
    pub fn component(&self, data: &DwarfData, graph: &mut TypeGraph) -> Option<Component> {
        let die = data.die(self.die);
        let name = die.name()?.to_string();
        let (type_name, class, size, ty) = component_type(die, data, graph)?;
        Some(Component {
            name,
            type_name,
            class,
            size,
            ty: Some(ty),
        })
    }
}

fn component_type(
    die: &Die,
    data: &DwarfData,
    graph: &mut TypeGraph,
) -> Option<(String, &'static str, i64, TypeId)> {
    let offset = die.type_ref()?;
    let ty = data.type_at(offset, graph)?;
    let resolved = graph.get(ty);
    Some((resolved.name.clone(), resolved.class_tag(), resolved.size, ty))
}

/// The name-indexed view of one binary's debug info.
#[derive(Debug, Default)]
pub struct DwarfIndex {
    /// Subprograms by linkage-or-plain name.
    pub functions: IndexMap<String, FunctionEntry>,
    /// Variables by name.
    pub variables: IndexMap<String, VariableEntry>,
    /// Subprograms reachable from resolved call sites, by name.
    pub calls: IndexMap<String, FunctionEntry>,
    /// Named record types by name (the typedef struct cache).
    struct_offsets: HashMap<String, u64>,
    /// Call sites whose origin could not be resolved (tail calls).
    pub unresolved_call_sites: usize,
}

impl DwarfIndex {
    /// Builds the index in one document-order pass.
    pub fn build(data: &DwarfData) -> Self {
        let mut index = Self::default();

        let mut pending_fn: Option<(usize, Vec<usize>)> = None;
        let mut pending_call: Option<(usize, Vec<usize>)> = None;
        let mut call_sites: Vec<(usize, Vec<usize>)> = Vec::new();

        for (position, die) in data.dies().iter().enumerate() {
            match die.tag {
                DwTag::Subprogram | DwTag::ClassType => {
                    if let Some((fn_die, params)) = pending_fn.take() {
                        index.flush_function(data, fn_die, params);
                    }
                    pending_fn = Some((position, Vec::new()));
                    if die.tag == DwTag::ClassType {
                        index.cache_record(die);
                    }
                }
                DwTag::FormalParameter => {
                    // Parameters with no enclosing subprogram are dropped.
                    if let Some((_, params)) = pending_fn.as_mut() {
                        params.push(position);
                    }
                }
                DwTag::Variable => {
                    if let Some(name) = die.name() {
                        index
                            .variables
                            .insert(name.to_string(), VariableEntry { die: position });
                    }
                }
                DwTag::CallSite => {
                    if let Some(site) = pending_call.take() {
                        call_sites.push(site);
                    }
                    pending_call = Some((position, Vec::new()));
                }
                DwTag::CallSiteParameter => {
                    if let Some((_, params)) = pending_call.as_mut() {
                        params.push(position);
                    }
                }
                DwTag::StructureType | DwTag::UnionType => {
                    index.cache_record(die);
                }
                _ => {}
            }
        }

        if let Some((fn_die, params)) = pending_fn.take() {
            index.flush_function(data, fn_die, params);
        }
        if let Some(site) = pending_call.take() {
            call_sites.push(site);
        }

        index.resolve_call_sites(data, call_sites);
        index
    }

    fn flush_function(&mut self, data: &DwarfData, fn_die: usize, params: Vec<usize>) {
        let name = subprogram_name(data.die(fn_die));
        self.functions.insert(
            name,
            FunctionEntry {
                die: fn_die,
                params,
            },
        );
    }

    fn cache_record(&mut self, die: &Die) {
        if let Some(name) = die.name() {
            self.struct_offsets
                .entry(name.to_string())
                .or_insert(die.offset);
        }
    }

    /// Resolves buffered call sites through DW_AT_call_origin (fallback
    /// DW_AT_location). Sites with no resolvable origin are tail calls
    /// and are dropped.
    fn resolve_call_sites(&mut self, data: &DwarfData, call_sites: Vec<(usize, Vec<usize>)>) {
        for (site, _params) in call_sites {
            let die = data.die(site);
            let origin = die
                .reference(DwAt::CallOrigin)
                .or_else(|| die.reference(DwAt::Location));
            let Some(origin) = origin else {
                self.unresolved_call_sites += 1;
                debug!(offset = die.offset, "call site without resolvable origin");
                continue;
            };
            let Some(target) = data.die_at(origin) else {
                self.unresolved_call_sites += 1;
                continue;
            };
            if !matches!(target.tag, DwTag::Subprogram | DwTag::ClassType) {
                self.unresolved_call_sites += 1;
                continue;
            }
            let name = subprogram_name(target);
            if let Some(entry) = self.functions.get(&name) {
                let entry = entry.clone();
                self.calls.insert(name, entry);
            } else {
                self.unresolved_call_sites += 1;
            }
        }
    }

    /// Typedef resolution support: materialises the named record type.
    pub fn struct_type(
        &self,
        name: &str,
        data: &DwarfData,
        graph: &mut TypeGraph,
    ) -> Option<TypeId> {
        let &offset = self.struct_offsets.get(name)?;
        data.type_at(offset, graph)
    }
}

/// Linkage name, then plain name, then "anonymous".
fn subprogram_name(die: &Die) -> String {
    die.linkage_name()
        .or_else(|| die.name())
        .unwrap_or("anonymous")
        .to_string()
}
