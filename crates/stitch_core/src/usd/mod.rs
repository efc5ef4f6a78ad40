//! USDA (ASCII) scene I/O.
//!
//! Reads and writes the text form of a [`SceneDocument`](crate::SceneDocument).
//! The grammar covered is the subset needed for flat composition: prim
//! hierarchy, prim and layer metadata, typed attributes (including time
//! samples and connections), relationships and variant sets.
//!
//! ## Not Supported
//!
//! - Binary `.usdc` format
//! - Variant bodies (their opinions are skipped with a warning)
//! - Resolving composition arcs (references and payloads are kept as opaque metadata)
//!
//! # Example
//!
//! ```ignore
//! use stitch_core::usd::{load_usda, save_usda};
//!
//! let scene = load_usda("scene.usda")?;
//! println!("Loaded {} prims", scene.len());
//! save_usda("copy.usda", &scene)?;
//! ```

mod lexer;
mod loader;
mod parser;
mod writer;

pub use lexer::{tokenize, Token};
pub use loader::*;
pub use parser::*;
pub use writer::*;
