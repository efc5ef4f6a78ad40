//! Absolute prim paths.
//!
//! A [`PrimPath`] addresses a prim inside a [`SceneDocument`](crate::SceneDocument),
//! e.g. `/World/Cube`. The pseudo-root is `/`.

use std::fmt;

use crate::document::DocumentError;

/// An absolute, `/`-delimited prim path.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PrimPath(String);

impl PrimPath {
    /// The pseudo-root path `/`.
    pub fn root() -> Self {
        Self("/".to_string())
    }

    /// Parse an absolute path string.
    pub fn parse(path: &str) -> Result<Self, DocumentError> {
        if path == "/" {
            return Ok(Self::root());
        }

        let rest = path
            .strip_prefix('/')
            .ok_or_else(|| DocumentError::InvalidPath(path.to_string()))?;

        if rest.split('/').all(is_valid_name) {
            Ok(Self(path.to_string()))
        } else {
            Err(DocumentError::InvalidPath(path.to_string()))
        }
    }

    /// Whether this is the pseudo-root.
    pub fn is_root(&self) -> bool {
        self.0 == "/"
    }

    /// The parent path, or `None` for the pseudo-root.
    pub fn parent(&self) -> Option<PrimPath> {
        if self.is_root() {
            return None;
        }
        match self.0.rfind('/') {
            Some(0) => Some(Self::root()),
            Some(idx) => Some(Self(self.0[..idx].to_string())),
            None => None,
        }
    }

    /// Last path component (empty for the pseudo-root).
    pub fn name(&self) -> &str {
        match self.0.rfind('/') {
            Some(idx) => &self.0[idx + 1..],
            None => &self.0,
        }
    }

    /// Append a child component.
    pub fn child(&self, name: &str) -> Result<PrimPath, DocumentError> {
        if !is_valid_name(name) {
            return Err(DocumentError::InvalidPath(format!("{}/{}", self.0.trim_end_matches('/'), name)));
        }
        if self.is_root() {
            Ok(Self(format!("/{}", name)))
        } else {
            Ok(Self(format!("{}/{}", self.0, name)))
        }
    }

    /// Path components from the root down.
    pub fn components(&self) -> impl Iterator<Item = &str> {
        self.0.split('/').filter(|c| !c.is_empty())
    }

    /// Number of components (0 for the pseudo-root).
    pub fn depth(&self) -> usize {
        self.components().count()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PrimPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for PrimPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Prim names are identifiers: `[A-Za-z_][A-Za-z0-9_]*`.
pub fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
