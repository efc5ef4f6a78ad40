//! Validation of a composed document against its two sources.
//!
//! The validator checks that everything authored in either source survived
//! the flat merge, using the same precedence as [`compose`](crate::compose):
//! where both sources author a metadata key, attribute, type name or variant
//! selection, the first source's value is the expected one.

use std::collections::HashMap;
use std::fmt;

use indexmap::{IndexMap, IndexSet};
use serde::Serialize;

use crate::document::{Prim, SceneDocument};
use crate::path::PrimPath;

/// Discrepancies between two sources and their merge.
///
/// Each list holds human-readable entries. An empty report means the merge
/// preserved all semantic content.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    /// Paths present in a source but absent from the merge
    pub missing_prims: Vec<String>,

    /// `path:key` (metadata, type name) or `path.attr` (attributes)
    pub metadata_differences: Vec<String>,

    /// Missing relationships or relationship targets
    pub relationship_issues: Vec<String>,

    /// Missing variant sets, variants or mismatched selections
    pub variant_issues: Vec<String>,
}

impl ValidationReport {
    /// Whether all four checks came back clean.
    pub fn passed(&self) -> bool {
        self.issue_count() == 0
    }

    pub fn issue_count(&self) -> usize {
        self.missing_prims.len()
            + self.metadata_differences.len()
            + self.relationship_issues.len()
            + self.variant_issues.len()
    }

    /// The four categories with their headings, in report order.
    pub fn categories(&self) -> [(&'static str, &[String]); 4] {
        [
            ("Missing prims", self.missing_prims.as_slice()),
            ("Metadata differences", self.metadata_differences.as_slice()),
            ("Relationship issues", self.relationship_issues.as_slice()),
            ("Variant issues", self.variant_issues.as_slice()),
        ]
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.passed() {
            return write!(f, "Validation PASSED: composed USD contains all expected data.");
        }

        write!(f, "Validation FAILED:")?;
        for (heading, issues) in self.categories() {
            if issues.is_empty() {
                continue;
            }
            write!(f, "\n{}:", heading)?;
            for issue in issues {
                write!(f, "\n  - {}", issue)?;
            }
        }
        Ok(())
    }
}

/// Deduplicating accumulator for one report category.
#[derive(Default)]
struct Issues(IndexSet<String>);

impl Issues {
    fn push(&mut self, issue: String) {
        self.0.insert(issue);
    }

    fn into_vec(self) -> Vec<String> {
        self.0.into_iter().collect()
    }
}

/// Compare a merged document against the two documents it was built from.
pub fn validate(scene_a: &SceneDocument, scene_b: &SceneDocument, merged: &SceneDocument) -> ValidationReport {
    let index_a = index(scene_a);
    let index_b = index(scene_b);
    let index_merged = index(merged);

    let mut missing = Issues::default();
    let mut metadata = Issues::default();
    let mut relationships = Issues::default();
    let mut variants = Issues::default();

    check_entries(
        "/:",
        Some(scene_a.metadata()),
        Some(scene_b.metadata()),
        merged.metadata(),
        &mut metadata,
    );

    // Source paths in document order: A's walk, then paths only B has
    let mut paths: IndexSet<&PrimPath> = scene_a.paths().collect();
    paths.extend(scene_b.paths());

    for path in paths {
        let prim_a = index_a.get(path).copied();
        let prim_b = index_b.get(path).copied();

        let Some(prim_m) = index_merged.get(path).copied() else {
            missing.push(path.to_string());
            continue;
        };

        check_type_name(prim_a, prim_b, prim_m, &mut metadata);
        check_entries(
            &format!("{}:", path),
            prim_a.map(|p| &p.metadata),
            prim_b.map(|p| &p.metadata),
            &prim_m.metadata,
            &mut metadata,
        );
        check_entries(
            &format!("{}.", path),
            prim_a.map(|p| &p.attributes),
            prim_b.map(|p| &p.attributes),
            &prim_m.attributes,
            &mut metadata,
        );
        check_relationships(prim_a, prim_b, prim_m, &mut relationships);
        check_variant_sets(prim_a, prim_b, prim_m, &mut variants);
    }

    let report = ValidationReport {
        missing_prims: missing.into_vec(),
        metadata_differences: metadata.into_vec(),
        relationship_issues: relationships.into_vec(),
        variant_issues: variants.into_vec(),
    };

    if report.passed() {
        log::info!("Validation passed");
    } else {
        log::info!("Validation found {} issues", report.issue_count());
    }
    report
}

fn index(document: &SceneDocument) -> HashMap<&PrimPath, &Prim> {
    document.iter().map(|prim| (&prim.path, prim)).collect()
}

/// The value authored first: A's if present, otherwise B's.
fn expected<'a, T>(a: Option<&'a T>, b: Option<&'a T>) -> Option<&'a T> {
    a.or(b)
}

fn check_type_name(a: Option<&Prim>, b: Option<&Prim>, merged: &Prim, issues: &mut Issues) {
    let want = expected(
        a.and_then(|p| p.type_name.as_ref()),
        b.and_then(|p| p.type_name.as_ref()),
    );
    if want.is_some() && merged.type_name.as_ref() != want {
        issues.push(format!("{}:typeName", merged.path));
    }
}

/// Every key authored in either source must be present in `merged` with the
/// first-writer value. Entries are reported as `{prefix}{key}`.
fn check_entries<V: PartialEq>(
    prefix: &str,
    a: Option<&IndexMap<String, V>>,
    b: Option<&IndexMap<String, V>>,
    merged: &IndexMap<String, V>,
    issues: &mut Issues,
) {
    let keys: IndexSet<&String> = a.into_iter().chain(b).flat_map(|m| m.keys()).collect();
    for key in keys {
        let want = expected(a.and_then(|m| m.get(key)), b.and_then(|m| m.get(key)));
        if merged.get(key) != want {
            issues.push(format!("{}{}", prefix, key));
        }
    }
}

fn check_relationships(a: Option<&Prim>, b: Option<&Prim>, merged: &Prim, issues: &mut Issues) {
    for source in a.into_iter().chain(b) {
        for (name, targets) in &source.relationships {
            let Some(merged_targets) = merged.relationships.get(name) else {
                issues.push(format!("{} missing relationship {}", merged.path, name));
                continue;
            };
            for target in targets {
                if !merged_targets.contains(target) {
                    issues.push(format!("{} has no relationship to {}", merged.path, target));
                }
            }
        }
    }
}

fn check_variant_sets(a: Option<&Prim>, b: Option<&Prim>, merged: &Prim, issues: &mut Issues) {
    let set_names: IndexSet<&String> = a
        .into_iter()
        .chain(b)
        .flat_map(|p| p.variant_sets.keys())
        .collect();

    for name in set_names {
        let set_a = a.and_then(|p| p.variant_sets.get(name));
        let set_b = b.and_then(|p| p.variant_sets.get(name));

        let Some(merged_set) = merged.variant_sets.get(name) else {
            issues.push(format!("{} has no variant set {}", merged.path, name));
            continue;
        };

        let missing: Vec<&str> = set_a
            .into_iter()
            .chain(set_b)
            .flat_map(|s| s.variants.iter())
            .filter(|v| !merged_set.variants.contains(*v))
            .map(String::as_str)
            .collect::<IndexSet<_>>()
            .into_iter()
            .collect();
        if !missing.is_empty() {
            issues.push(format!(
                "{} variant set {} missing variants {{{}}}",
                merged.path,
                name,
                missing.join(", ")
            ));
        }

        let want = expected(
            set_a.and_then(|s| s.selection.as_ref()),
            set_b.and_then(|s| s.selection.as_ref()),
        );
        if let Some(want) = want {
            if merged_set.selection.as_ref() != Some(want) {
                issues.push(format!(
                    "{} variant set {} selects {}, expected {}",
                    merged.path,
                    name,
                    merged_set.selection.as_deref().unwrap_or("nothing"),
                    want
                ));
            }
        }
    }
}
