//! Scene document types.
//!
//! A [`SceneDocument`] is an immutable forest of [`Prim`]s hanging off the
//! pseudo-root `/`, plus the layer-level metadata of that pseudo-root.
//! Documents are produced by the USDA parser, the composer and the random
//! scene generator; all of them go through [`SceneBuilder`].

use std::collections::{HashMap, HashSet};
use std::fmt;

use indexmap::{IndexMap, IndexSet};
use thiserror::Error;

use crate::path::PrimPath;
use crate::value::{Attribute, Value};

/// Errors raised when a document would violate its structural invariants.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DocumentError {
    #[error("Invalid prim path: {0:?}")]
    InvalidPath(String),

    #[error("Duplicate prim path: {0}")]
    DuplicatePath(String),

    #[error("Prim {path} is not a child of {parent}")]
    PathMismatch { path: String, parent: String },
}

/// How a prim was introduced in its layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Specifier {
    #[default]
    Def,
    Over,
    Class,
}

impl Specifier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Specifier::Def => "def",
            Specifier::Over => "over",
            Specifier::Class => "class",
        }
    }
}

impl fmt::Display for Specifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named group of mutually exclusive variants.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct VariantSet {
    /// Variant names in authored order
    pub variants: IndexSet<String>,

    /// Currently selected variant, if any
    pub selection: Option<String>,
}

/// A node in the scene hierarchy.
#[derive(Clone, Debug, PartialEq)]
pub struct Prim {
    /// Absolute path (primary key within a document)
    pub path: PrimPath,

    pub specifier: Specifier,

    /// Schema type, e.g. "Mesh" or "Sphere"
    pub type_name: Option<String>,

    /// Prim metadata (`kind`, `comment`, custom keys, ...)
    pub metadata: IndexMap<String, Value>,

    /// Authored attributes keyed by property name
    pub attributes: IndexMap<String, Attribute>,

    /// Relationship name -> target paths
    pub relationships: IndexMap<String, IndexSet<String>>,

    /// Variant set name -> variants and selection
    pub variant_sets: IndexMap<String, VariantSet>,

    /// Child prims in authored order
    pub children: Vec<Prim>,
}

impl Prim {
    /// An empty, typeless `def` prim.
    pub fn new(path: PrimPath) -> Self {
        Self {
            path,
            specifier: Specifier::Def,
            type_name: None,
            metadata: IndexMap::new(),
            attributes: IndexMap::new(),
            relationships: IndexMap::new(),
            variant_sets: IndexMap::new(),
            children: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        self.path.name()
    }

    /// Merge another prim's own content into this one.
    ///
    /// Existing type name, metadata and attributes win; relationship targets
    /// and variant names are unioned. Children are not touched.
    fn absorb(&mut self, other: &Prim) {
        if self.type_name.is_none() {
            self.type_name = other.type_name.clone();
        }

        for (key, value) in &other.metadata {
            self.metadata.entry(key.clone()).or_insert_with(|| value.clone());
        }

        for (name, attr) in &other.attributes {
            self.attributes.entry(name.clone()).or_insert_with(|| attr.clone());
        }

        for (name, targets) in &other.relationships {
            self.relationships
                .entry(name.clone())
                .or_default()
                .extend(targets.iter().cloned());
        }

        for (name, vset) in &other.variant_sets {
            let merged = self.variant_sets.entry(name.clone()).or_default();
            merged.variants.extend(vset.variants.iter().cloned());
            if merged.selection.is_none() {
                merged.selection = vset.selection.clone();
            }
        }
    }
}

/// An immutable scene document.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct SceneDocument {
    metadata: IndexMap<String, Value>,
    roots: Vec<Prim>,
}

impl SceneDocument {
    /// Build a document from a prim forest, checking that paths are unique
    /// and consistent with the hierarchy.
    pub fn from_roots(metadata: IndexMap<String, Value>, roots: Vec<Prim>) -> Result<Self, DocumentError> {
        let mut seen = HashSet::new();
        let root = PrimPath::root();
        for prim in &roots {
            check_subtree(prim, &root, &mut seen)?;
        }
        Ok(Self { metadata, roots })
    }

    /// Layer metadata (metadata of the pseudo-root).
    pub fn metadata(&self) -> &IndexMap<String, Value> {
        &self.metadata
    }

    pub fn roots(&self) -> &[Prim] {
        &self.roots
    }

    /// Look up a prim by path.
    pub fn get(&self, path: &PrimPath) -> Option<&Prim> {
        let mut components = path.components();
        let first = components.next()?;
        let mut current = self.roots.iter().find(|p| p.name() == first)?;
        for name in components {
            current = current.children.iter().find(|p| p.name() == name)?;
        }
        Some(current)
    }

    pub fn contains(&self, path: &PrimPath) -> bool {
        self.get(path).is_some()
    }

    /// Depth-first, pre-order traversal over every prim.
    pub fn iter(&self) -> PrimIter<'_> {
        PrimIter {
            stack: self.roots.iter().rev().collect(),
        }
    }

    /// All prim paths in traversal order.
    pub fn paths(&self) -> impl Iterator<Item = &PrimPath> {
        self.iter().map(|p| &p.path)
    }

    /// Total number of prims.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }
}

fn check_subtree(prim: &Prim, parent: &PrimPath, seen: &mut HashSet<PrimPath>) -> Result<(), DocumentError> {
    if prim.path.parent().as_ref() != Some(parent) {
        return Err(DocumentError::PathMismatch {
            path: prim.path.to_string(),
            parent: parent.to_string(),
        });
    }
    if !seen.insert(prim.path.clone()) {
        return Err(DocumentError::DuplicatePath(prim.path.to_string()));
    }
    for child in &prim.children {
        check_subtree(child, &prim.path, seen)?;
    }
    Ok(())
}

/// Pre-order iterator over a document's prims.
pub struct PrimIter<'a> {
    stack: Vec<&'a Prim>,
}

impl<'a> Iterator for PrimIter<'a> {
    type Item = &'a Prim;

    fn next(&mut self) -> Option<Self::Item> {
        let prim = self.stack.pop()?;
        self.stack.extend(prim.children.iter().rev());
        Some(prim)
    }
}

/// Incremental, merge-oriented construction of a [`SceneDocument`].
///
/// Every write keeps what is already there: scalar fields (type name,
/// metadata, attributes, variant selection) are first-writer-wins, while
/// relationship targets and variant names are unioned. Prims are created on
/// demand together with any missing ancestors, and registered as children of
/// their parent in insertion order.
#[derive(Debug, Default)]
pub struct SceneBuilder {
    metadata: IndexMap<String, Value>,
    prims: HashMap<PrimPath, Prim>,
    children: HashMap<PrimPath, Vec<PrimPath>>,
    roots: Vec<PrimPath>,
}

impl SceneBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a layer metadata entry unless it is already set.
    pub fn set_layer_metadata(&mut self, key: impl Into<String>, value: Value) -> &mut Self {
        self.metadata.entry(key.into()).or_insert(value);
        self
    }

    /// Create a prim (and its missing ancestors). The specifier applies only
    /// to a newly created prim; the type name only if none is set yet.
    pub fn define_prim(&mut self, path: &PrimPath, specifier: Specifier, type_name: Option<&str>) -> &mut Self {
        let created = !self.prims.contains_key(path);
        if let Some(prim) = self.target(path) {
            if created {
                prim.specifier = specifier;
            }
            if prim.type_name.is_none() {
                prim.type_name = type_name.map(str::to_string);
            }
        }
        self
    }

    pub fn set_metadata(&mut self, path: &PrimPath, key: impl Into<String>, value: Value) -> &mut Self {
        if let Some(prim) = self.target(path) {
            prim.metadata.entry(key.into()).or_insert(value);
        }
        self
    }

    pub fn set_attribute(&mut self, path: &PrimPath, name: impl Into<String>, attr: Attribute) -> &mut Self {
        if let Some(prim) = self.target(path) {
            prim.attributes.entry(name.into()).or_insert(attr);
        }
        self
    }

    /// Add targets to a relationship, creating it (possibly empty) if needed.
    pub fn add_relationship_targets<I, S>(&mut self, path: &PrimPath, name: impl Into<String>, targets: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if let Some(prim) = self.target(path) {
            prim.relationships
                .entry(name.into())
                .or_default()
                .extend(targets.into_iter().map(Into::into));
        }
        self
    }

    /// Add variants to a variant set and select one if nothing is selected yet.
    pub fn add_variants<I, S>(
        &mut self,
        path: &PrimPath,
        set_name: impl Into<String>,
        variants: I,
        selection: Option<&str>,
    ) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if let Some(prim) = self.target(path) {
            let vset = prim.variant_sets.entry(set_name.into()).or_default();
            vset.variants.extend(variants.into_iter().map(Into::into));
            if vset.selection.is_none() {
                vset.selection = selection.map(str::to_string);
            }
        }
        self
    }

    /// Merge a prim's own content (not its children) at the same path.
    pub fn merge_prim(&mut self, source: &Prim) -> &mut Self {
        let created = !self.prims.contains_key(&source.path);
        if let Some(prim) = self.target(&source.path) {
            if created {
                prim.specifier = source.specifier;
            }
            prim.absorb(source);
        }
        self
    }

    /// Finish building. The builder's structure always satisfies the
    /// document invariants, so this cannot fail.
    pub fn build(mut self) -> SceneDocument {
        let root_paths = std::mem::take(&mut self.roots);
        let roots = root_paths
            .iter()
            .filter_map(|path| self.assemble(path))
            .collect();

        SceneDocument {
            metadata: self.metadata,
            roots,
        }
    }

    fn assemble(&mut self, path: &PrimPath) -> Option<Prim> {
        let mut prim = self.prims.remove(path)?;
        let child_paths = self.children.remove(path).unwrap_or_default();
        prim.children = child_paths
            .iter()
            .filter_map(|child| self.assemble(child))
            .collect();
        Some(prim)
    }

    /// The prim at `path`, created on demand. The pseudo-root is not a prim.
    fn target(&mut self, path: &PrimPath) -> Option<&mut Prim> {
        if path.is_root() {
            log::warn!("Ignoring prim edit on the pseudo-root; use layer metadata instead");
            return None;
        }
        if !self.prims.contains_key(path) {
            self.register(path);
        }
        Some(
            self.prims
                .entry(path.clone())
                .or_insert_with(|| Prim::new(path.clone())),
        )
    }

    fn register(&mut self, path: &PrimPath) {
        match path.parent() {
            Some(parent) if !parent.is_root() => {
                if !self.prims.contains_key(&parent) {
                    log::debug!("Synthesizing ancestor prim {}", parent);
                }
                self.target(&parent);
                self.children.entry(parent).or_default().push(path.clone());
            }
            _ => self.roots.push(path.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(s: &str) -> PrimPath {
        PrimPath::parse(s).unwrap()
    }

    #[test]
    fn test_builder_synthesizes_ancestors() {
        let mut builder = SceneBuilder::new();
        builder.define_prim(&path("/World/Cube"), Specifier::Def, Some("Cube"));
        builder.define_prim(&path("/World/Sphere"), Specifier::Def, Some("Sphere"));
        let doc = builder.build();

        assert_eq!(doc.roots().len(), 1);
        let world = doc.get(&path("/World")).unwrap();
        assert_eq!(world.type_name, None);
        assert!(world.metadata.is_empty());
        let names: Vec<_> = world.children.iter().map(|c| c.name()).collect();
        assert_eq!(names, vec!["Cube", "Sphere"]);
    }

    #[test]
    fn test_builder_first_writer_wins() {
        let cube = path("/Cube");
        let mut builder = SceneBuilder::new();
        builder
            .define_prim(&cube, Specifier::Def, Some("Cube"))
            .define_prim(&cube, Specifier::Over, Some("Sphere"))
            .set_metadata(&cube, "color", "red".into())
            .set_metadata(&cube, "color", "blue".into())
            .add_relationship_targets(&cube, "looksAt", ["/A"])
            .add_relationship_targets(&cube, "looksAt", ["/B", "/A"])
            .add_variants(&cube, "look", ["Metal"], None)
            .add_variants(&cube, "look", ["Glass"], Some("Glass"))
            .add_variants(&cube, "look", ["Metal"], Some("Metal"));
        let doc = builder.build();

        let prim = doc.get(&cube).unwrap();
        assert_eq!(prim.specifier, Specifier::Def);
        assert_eq!(prim.type_name.as_deref(), Some("Cube"));
        assert_eq!(prim.metadata["color"], Value::from("red"));
        assert_eq!(prim.relationships["looksAt"].len(), 2);
        let look = &prim.variant_sets["look"];
        assert_eq!(look.variants.len(), 2);
        assert_eq!(look.selection.as_deref(), Some("Glass"));
    }

    #[test]
    fn test_pseudo_root_is_not_a_prim() {
        let mut builder = SceneBuilder::new();
        builder.set_metadata(&PrimPath::root(), "kind", "group".into());
        assert!(builder.build().is_empty());
    }

    #[test]
    fn test_iter_is_preorder() {
        let mut builder = SceneBuilder::new();
        for p in ["/A/B/C", "/A/D", "/E"] {
            builder.define_prim(&path(p), Specifier::Def, None);
        }
        let doc = builder.build();
        let paths: Vec<_> = doc.paths().map(|p| p.as_str()).collect();
        assert_eq!(paths, vec!["/A", "/A/B", "/A/B/C", "/A/D", "/E"]);
        assert_eq!(doc.len(), 5);
    }

    #[test]
    fn test_from_roots_rejects_duplicates() {
        let a = Prim::new(path("/A"));
        let err = SceneDocument::from_roots(IndexMap::new(), vec![a.clone(), a]).unwrap_err();
        assert_eq!(err, DocumentError::DuplicatePath("/A".to_string()));
    }

    #[test]
    fn test_from_roots_rejects_misplaced_child() {
        let mut parent = Prim::new(path("/A"));
        parent.children.push(Prim::new(path("/B/C")));
        let err = SceneDocument::from_roots(IndexMap::new(), vec![parent]).unwrap_err();
        assert!(matches!(err, DocumentError::PathMismatch { .. }));
    }
}
