//! File-level loading and saving of USDA layers.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::document::SceneDocument;
use crate::usd::parser::{parse_usda, ParseError};
use crate::usd::writer::write_usda;

/// Errors that can occur while reading or writing a layer on disk.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),
}

/// Result type for loading operations.
pub type LoadResult<T> = Result<T, LoadError>;

/// Load a USDA file.
///
/// # Example
///
/// ```ignore
/// use stitch_core::usd::load_usda;
///
/// let scene = load_usda("scene.usda")?;
/// ```
pub fn load_usda<P: AsRef<Path>>(path: P) -> LoadResult<SceneDocument> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)?;
    let document = parse_usda(&content)?;
    log::info!("Loaded {} prims from {}", document.len(), path.display());
    Ok(document)
}

/// Write a document to a USDA file, creating parent directories as needed.
pub fn save_usda<P: AsRef<Path>>(path: P, document: &SceneDocument) -> LoadResult<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, write_usda(document))?;
    log::info!("Saved {} prims to {}", document.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_then_load() {
        let usda = r#"#usda 1.0
def Xform "World" {
    def Cube "Cube" {
        double size = 2.0
    }
}
"#;
        let doc = parse_usda(usda).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("scene.usda");

        save_usda(&path, &doc).unwrap();
        let loaded = load_usda(&path).unwrap();
        assert_eq!(loaded, doc);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_usda(dir.path().join("nope.usda")).unwrap_err();
        assert!(matches!(err, LoadError::Io(_)));
    }

    #[test]
    fn test_load_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.usda");
        fs::write(&path, "not a usda file").unwrap();

        let err = load_usda(&path).unwrap_err();
        assert!(matches!(err, LoadError::Parse(ParseError::MissingHeader)));
    }
}
