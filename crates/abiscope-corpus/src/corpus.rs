//! Corpus building and JSON emission.

use crate::CorpusError;
use abiscope_abi::{FunctionDescription, SignatureBuilder, VariableDescription};
use abiscope_core::{Architecture, SymbolKind, TypeGraph};
use abiscope_formats::dwarf::DwarfIndex;
use abiscope_formats::{Container, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// One located entry: a function or a variable. The JSON representation
/// is externally tagged, `{"function": …}` or `{"variable": …}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Location {
    Function(FunctionDescription),
    Variable(VariableDescription),
}

/// A corpus holds a library name and its located functions and variables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Corpus {
    pub library: String,
    #[serde(default)]
    pub locations: Vec<Location>,
}

impl Corpus {
    /// Extracts the corpus from a binary on disk.
    ///
    /// Unsupported architectures are reported on stderr and produce a
    /// corpus with no locations; a missing or corrupt DWARF section on a
    /// supported architecture is fatal.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CorpusError> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let entry = file.entry()?;

        let mut corpus = Corpus {
            library: path.display().to_string(),
            locations: Vec::new(),
        };

        // Only the x86-64 System V rules are implemented; everything else
        // is recognised but produces no locations.
        if entry.arch() != Architecture::Amd64 {
            let name = entry.arch().name();
            eprintln!("Unsupported architecture {name}");
            return Ok(corpus);
        }

        let dwarf = entry.dwarf()?;
        let index = DwarfIndex::build(&dwarf);
        let mut graph = TypeGraph::new();
        let mut builder = SignatureBuilder::new(&dwarf, &index, &mut graph);

        // Dynamic symbols arrive sorted by address, which keeps the
        // emitted location order stable across runs.
        for symbol in entry.dynamic_symbols()? {
            match symbol.kind {
                SymbolKind::Func => {
                    // Call-site knowledge wins over the plain subprogram
                    // table: it flips the parameter directions.
                    let (fn_entry, is_call_site) = match index.calls.get(&symbol.name) {
                        Some(fn_entry) => (fn_entry, true),
                        None => match index.functions.get(&symbol.name) {
                            Some(fn_entry) => (fn_entry, false),
                            None => {
                                debug!(symbol = %symbol.name, "no DWARF entry for function");
                                continue;
                            }
                        },
                    };
                    let function = builder.function(&symbol, fn_entry, is_call_site)?;
                    corpus.locations.push(Location::Function(function));
                }
                SymbolKind::Object if symbol.is_global() => {
                    let Some(var_entry) = index.variables.get(&symbol.name) else {
                        debug!(symbol = %symbol.name, "no DWARF entry for variable");
                        continue;
                    };
                    if let Some(variable) = builder.variable(&symbol, var_entry) {
                        corpus.locations.push(Location::Variable(variable));
                    }
                }
                _ => {}
            }
        }

        Ok(corpus)
    }

    /// Serialises the corpus to JSON.
    pub fn to_json(&self, pretty: bool) -> Result<String, CorpusError> {
        let json = if pretty {
            serde_json::to_string_pretty(self)?
        } else {
            serde_json::to_string(self)?
        };
        Ok(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use abiscope_abi::{BasicParameter, Parameter};

    fn sample() -> Corpus {
        Corpus {
            library: "libdemo.so".into(),
            locations: vec![
                Location::Function(FunctionDescription {
                    name: "compute".into(),
                    type_name: "Function".into(),
                    direction: "export".into(),
                    parameters: vec![Parameter::Basic(BasicParameter {
                        name: "a".into(),
                        type_name: "int".into(),
                        class: "Int".into(),
                        size: 4,
                        location: "%rdi".into(),
                        direction: "import".into(),
                    })],
                }),
                Location::Variable(VariableDescription {
                    name: "counter".into(),
                    type_name: "long int".into(),
                    size: 8,
                    direction: "export".into(),
                }),
            ],
        }
    }

    #[test]
    fn locations_are_externally_tagged() {
        let corpus = sample();
        let json = corpus.to_json(false).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["library"], "libdemo.so");
        assert!(value["locations"][0].get("function").is_some());
        assert!(value["locations"][1].get("variable").is_some());
        assert_eq!(value["locations"][0]["function"]["type"], "Function");
        assert_eq!(
            value["locations"][0]["function"]["parameters"][0]["location"],
            "%rdi"
        );
    }

    #[test]
    fn json_round_trips() {
        let corpus = sample();
        for pretty in [false, true] {
            let json = corpus.to_json(pretty).unwrap();
            let back: Corpus = serde_json::from_str(&json).unwrap();
            assert_eq!(corpus, back);
        }
    }
}
