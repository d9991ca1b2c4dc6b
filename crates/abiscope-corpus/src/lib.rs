//! # abiscope-corpus
//!
//! The corpus is the per-binary JSON document: every exported function
//! and global variable with typed, located parameters. This crate joins
//! the container's dynamic symbols with the DWARF index, drives the
//! signature builder, and owns the JSON emit/reload pair.

mod corpus;
mod load;

pub use corpus::{Corpus, Location};
pub use load::{load, LoadedCorpus};

use thiserror::Error;

/// Errors raised while building, emitting, or reloading a corpus.
#[derive(Error, Debug)]
pub enum CorpusError {
    /// Container or debug-info parsing failed.
    #[error(transparent)]
    Parse(#[from] abiscope_formats::ParseError),

    /// Classification or allocation failed (a classifier bug).
    #[error(transparent)]
    Abi(#[from] abiscope_abi::AbiError),

    /// JSON (de)serialization failed.
    #[error("corpus JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error reading a corpus file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
