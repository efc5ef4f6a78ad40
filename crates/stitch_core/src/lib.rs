//! Stitch Core - Flat composition and validation of USD ASCII scenes.
//!
//! This crate provides:
//!
//! - **Scene model**: `SceneDocument`, `Prim`, `PrimPath`, `Value`
//! - **USDA support**: parsing, writing, loading and saving `.usda` text
//! - **Composition**: a flat, first-writer-wins merge of two documents
//! - **Validation**: a report of what a merge lost relative to its sources
//! - **Generation**: seeded random test scenes
//!
//! # Example
//!
//! ```ignore
//! use stitch_core::{compose, load_usda, save_usda, validate};
//!
//! let a = load_usda("a.usda")?;
//! let b = load_usda("b.usda")?;
//! let merged = compose(&a, &b);
//! save_usda("merged.usda", &merged)?;
//!
//! let report = validate(&a, &b, &merged);
//! println!("{}", report);
//! ```

pub mod compose;
pub mod document;
pub mod generate;
pub mod path;
pub mod usd;
pub mod validate;
pub mod value;

#[cfg(test)]
mod fixtures;

// Re-export commonly used types
pub use compose::compose;
pub use document::{DocumentError, Prim, SceneBuilder, SceneDocument, Specifier, VariantSet};
pub use generate::{generate_scene, RandomSceneConfig};
pub use path::PrimPath;
pub use usd::{load_usda, parse_usda, save_usda, write_usda, LoadError, ParseError};
pub use validate::{validate, ValidationReport};
pub use value::{Attribute, Value};
