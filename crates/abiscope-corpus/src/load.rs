//! Reloading a previously emitted corpus.
//!
//! The loaded form keeps functions and variables in separate lists; the
//! round-trip back to a [`Corpus`] restores the interleaved, tagged
//! location list.

use crate::{Corpus, CorpusError, Location};
use abiscope_abi::{FunctionDescription, VariableDescription};
use std::path::Path;

/// A corpus split into its function and variable descriptors.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedCorpus {
    pub library: String,
    pub functions: Vec<FunctionDescription>,
    pub variables: Vec<VariableDescription>,
}

impl LoadedCorpus {
    /// Reassembles the tagged location list, functions first.
    pub fn to_corpus(&self) -> Corpus {
        let mut locations = Vec::with_capacity(self.functions.len() + self.variables.len());
        for function in &self.functions {
            locations.push(Location::Function(function.clone()));
        }
        for variable in &self.variables {
            locations.push(Location::Variable(variable.clone()));
        }
        Corpus {
            library: self.library.clone(),
            locations,
        }
    }
}

/// Loads a corpus JSON document from disk.
///
/// Malformed JSON, a missing required field, or a malformed decimal size
/// string are all fatal.
pub fn load(path: impl AsRef<Path>) -> Result<LoadedCorpus, CorpusError> {
    let text = std::fs::read_to_string(path)?;
    let corpus: Corpus = serde_json::from_str(&text)?;

    let mut functions = Vec::new();
    let mut variables = Vec::new();
    for location in corpus.locations {
        match location {
            Location::Function(function) => functions.push(function),
            Location::Variable(variable) => variables.push(variable),
        }
    }

    Ok(LoadedCorpus {
        library: corpus.library,
        functions,
        variables,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"{
        "library": "libdemo.so",
        "locations": [
            {"function": {"name": "f", "type": "Function", "direction": "export",
                          "parameters": [
                              {"name": "p", "type": "", "class": "Pointer", "size": "8",
                               "location": "%rdi", "direction": "import",
                               "underlying_type": null, "indirections": 1}
                          ]}},
            {"variable": {"name": "v", "type": "int", "size": "4", "direction": "export"}}
        ]
    }"#;

    fn write_temp(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn splits_functions_and_variables() {
        let file = write_temp(SAMPLE);
        let loaded = load(file.path()).unwrap();
        assert_eq!(loaded.library, "libdemo.so");
        assert_eq!(loaded.functions.len(), 1);
        assert_eq!(loaded.variables.len(), 1);
        // Decimal string sizes were coerced.
        assert_eq!(loaded.variables[0].size, 4);
        assert_eq!(loaded.functions[0].parameters[0].size(), 8);
    }

    #[test]
    fn reload_of_emitted_corpus_is_identity() {
        let file = write_temp(SAMPLE);
        let loaded = load(file.path()).unwrap();
        let corpus = loaded.to_corpus();

        let emitted = corpus.to_json(true).unwrap();
        let file2 = write_temp(&emitted);
        let reloaded = load(file2.path()).unwrap();
        assert_eq!(loaded, reloaded);
        assert_eq!(corpus, reloaded.to_corpus());
    }

    #[test]
    fn malformed_size_is_fatal() {
        let file = write_temp(
            r#"{"library": "x", "locations": [
                {"variable": {"name": "v", "type": "int", "size": "fourteen",
                              "direction": "export"}}]}"#,
        );
        assert!(matches!(load(file.path()), Err(CorpusError::Json(_))));
    }

    #[test]
    fn missing_required_field_is_fatal() {
        let file = write_temp(r#"{"locations": []}"#);
        assert!(load(file.path()).is_err());
    }
}
