// src/deps/mod.rs

//! Header dependency discovery.
//!
//! - [`parse`] understands the make rules printed by `cc -M`/`-MM`.
//! - [`extractor`] runs the toolchain for each source, concurrently, and
//!   turns its output into an [`Extraction`].

pub mod extractor;
pub mod parse;

pub use extractor::{Extraction, extract, extract_all};
pub use parse::{MakeRule, parse_make_rule};
