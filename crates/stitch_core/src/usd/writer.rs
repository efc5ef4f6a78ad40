//! USDA (ASCII) writer.
//!
//! Serializes a [`SceneDocument`] back to text accepted by
//! [`parse_usda`](super::parse_usda).

use std::fmt::Write as _;

use indexmap::IndexMap;

use crate::document::{Prim, SceneDocument};
use crate::path::is_valid_name;
use crate::value::{Attribute, Value};

const INDENT: &str = "    ";

/// Serialize a document to USDA text.
pub fn write_usda(document: &SceneDocument) -> String {
    let mut out = String::from("#usda 1.0\n");

    if !document.metadata().is_empty() {
        out.push_str("(\n");
        write_metadata_entries(&mut out, document.metadata(), 1);
        out.push_str(")\n");
    }

    for prim in document.roots() {
        out.push('\n');
        write_prim(&mut out, prim, 0);
    }

    out
}

fn indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push_str(INDENT);
    }
}

fn write_metadata_entries(out: &mut String, metadata: &IndexMap<String, Value>, depth: usize) {
    for (key, value) in metadata {
        indent(out, depth);
        let _ = write!(out, "{} = ", key);
        write_value(out, value, depth);
        out.push('\n');
    }
}

fn write_prim(out: &mut String, prim: &Prim, depth: usize) {
    indent(out, depth);
    out.push_str(prim.specifier.as_str());
    if let Some(type_name) = &prim.type_name {
        let _ = write!(out, " {}", type_name);
    }
    let _ = write!(out, " {}", quote(prim.name()));

    if !prim.metadata.is_empty() || !prim.variant_sets.is_empty() {
        out.push_str(" (\n");
        write_metadata_entries(out, &prim.metadata, depth + 1);

        let selections: Vec<_> = prim
            .variant_sets
            .iter()
            .filter_map(|(name, vset)| vset.selection.as_ref().map(|sel| (name, sel)))
            .collect();
        if !selections.is_empty() {
            indent(out, depth + 1);
            out.push_str("variants = {\n");
            for (name, selection) in selections {
                indent(out, depth + 2);
                let _ = writeln!(out, "string {} = {}", dictionary_key(name), quote(selection));
            }
            indent(out, depth + 1);
            out.push_str("}\n");
        }

        if !prim.variant_sets.is_empty() {
            let names: Vec<_> = prim.variant_sets.keys().map(|n| quote(n)).collect();
            indent(out, depth + 1);
            let _ = writeln!(out, "prepend variantSets = [{}]", names.join(", "));
        }

        indent(out, depth);
        out.push(')');
    }
    out.push('\n');

    indent(out, depth);
    out.push_str("{\n");

    for (name, attr) in &prim.attributes {
        write_attribute(out, name, attr, depth + 1);
    }

    for (name, targets) in &prim.relationships {
        indent(out, depth + 1);
        let _ = write!(out, "rel {}", name);
        match targets.len() {
            0 => {}
            1 => {
                let _ = write!(out, " = <{}>", targets[0]);
            }
            _ => {
                let list: Vec<_> = targets.iter().map(|t| format!("<{}>", t)).collect();
                let _ = write!(out, " = [{}]", list.join(", "));
            }
        }
        out.push('\n');
    }

    for (name, vset) in &prim.variant_sets {
        if vset.variants.is_empty() {
            continue;
        }
        out.push('\n');
        indent(out, depth + 1);
        let _ = writeln!(out, "variantSet {} = {{", quote(name));
        for variant in &vset.variants {
            indent(out, depth + 2);
            let _ = writeln!(out, "{} {{", quote(variant));
            indent(out, depth + 2);
            out.push_str("}\n");
        }
        indent(out, depth + 1);
        out.push_str("}\n");
    }

    for (i, child) in prim.children.iter().enumerate() {
        if i > 0 || !prim.attributes.is_empty() || !prim.relationships.is_empty() {
            out.push('\n');
        }
        write_prim(out, child, depth + 1);
    }

    indent(out, depth);
    out.push_str("}\n");
}

fn write_attribute(out: &mut String, name: &str, attr: &Attribute, depth: usize) {
    let mut qualifiers = String::new();
    if attr.custom {
        qualifiers.push_str("custom ");
    }
    if attr.uniform {
        qualifiers.push_str("uniform ");
    }

    let declaration_only = attr.time_samples.is_empty() && attr.connections.is_empty();
    if attr.default.is_some() || !attr.metadata.is_empty() || declaration_only {
        indent(out, depth);
        let _ = write!(out, "{}{} {}", qualifiers, attr.type_name, name);
        if let Some(value) = &attr.default {
            out.push_str(" = ");
            write_value(out, value, depth);
        }
        if !attr.metadata.is_empty() {
            out.push_str(" (\n");
            write_metadata_entries(out, &attr.metadata, depth + 1);
            indent(out, depth);
            out.push(')');
        }
        out.push('\n');
    }

    if !attr.time_samples.is_empty() {
        indent(out, depth);
        let _ = writeln!(out, "{}{} {}.timeSamples = {{", qualifiers, attr.type_name, name);
        for (time, value) in &attr.time_samples {
            indent(out, depth + 1);
            let _ = write!(out, "{:?}: ", time);
            write_value(out, value, depth + 1);
            out.push_str(",\n");
        }
        indent(out, depth);
        out.push_str("}\n");
    }

    if !attr.connections.is_empty() {
        indent(out, depth);
        let _ = write!(out, "{}{} {}.connect = ", qualifiers, attr.type_name, name);
        if attr.connections.len() == 1 {
            let _ = writeln!(out, "<{}>", attr.connections[0]);
        } else {
            let list: Vec<_> = attr.connections.iter().map(|t| format!("<{}>", t)).collect();
            let _ = writeln!(out, "[{}]", list.join(", "));
        }
    }
}

/// Write a value; `depth` is the indentation of the line it appears on.
fn write_value(out: &mut String, value: &Value, depth: usize) {
    match value {
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Int(i) => {
            let _ = write!(out, "{}", i);
        }
        // Debug formatting always keeps a '.' or exponent, so floats stay floats
        Value::Float(f) => {
            let _ = write!(out, "{:?}", f);
        }
        Value::String(s) => out.push_str(&quote(s)),
        Value::Token(t) => out.push_str(t),
        Value::Path(p) => {
            let _ = write!(out, "<{}>", p);
        }
        Value::Asset(a) => {
            let _ = write!(out, "@{}@", a);
        }
        Value::Reference { asset, prim } => {
            let _ = write!(out, "@{}@", asset);
            if let Some(prim) = prim {
                let _ = write!(out, "<{}>", prim);
            }
        }
        Value::Tuple(items) => {
            out.push('(');
            write_items(out, items, depth);
            out.push(')');
        }
        Value::Array(items) => {
            out.push('[');
            write_items(out, items, depth);
            out.push(']');
        }
        Value::Dictionary(entries) => {
            out.push_str("{\n");
            for (key, entry) in entries {
                indent(out, depth + 1);
                let _ = write!(out, "{} {} = ", entry.type_hint(), dictionary_key(key));
                write_value(out, entry, depth + 1);
                out.push('\n');
            }
            indent(out, depth);
            out.push('}');
        }
    }
}

fn write_items(out: &mut String, items: &[Value], depth: usize) {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        write_value(out, item, depth);
    }
}

fn dictionary_key(key: &str) -> String {
    if is_valid_name(key) {
        key.to_string()
    } else {
        quote(key)
    }
}

/// Quote and escape a string literal.
fn quote(s: &str) -> String {
    let mut quoted = String::with_capacity(s.len() + 2);
    quoted.push('"');
    for c in s.chars() {
        match c {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            '\t' => quoted.push_str("\\t"),
            '\r' => quoted.push_str("\\r"),
            other => quoted.push(other),
        }
    }
    quoted.push('"');
    quoted
}
