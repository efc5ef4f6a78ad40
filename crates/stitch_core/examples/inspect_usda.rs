//! Example: Load and inspect a USDA file.
//!
//! Run with: cargo run --example inspect_usda -- scene.usda

use std::env;

use stitch_core::usd::load_usda;
use stitch_core::Prim;

fn print_prim(prim: &Prim, depth: usize) {
    let indent = "  ".repeat(depth + 1);
    println!(
        "{}{} {} [{}]",
        indent,
        prim.specifier,
        prim.path,
        prim.type_name.as_deref().unwrap_or("-")
    );
    if !prim.attributes.is_empty() {
        let names: Vec<_> = prim.attributes.keys().map(String::as_str).collect();
        println!("{}    attributes: {}", indent, names.join(", "));
    }
    for (name, targets) in &prim.relationships {
        let targets: Vec<_> = targets.iter().map(String::as_str).collect();
        println!("{}    rel {} -> [{}]", indent, name, targets.join(", "));
    }
    for (name, vset) in &prim.variant_sets {
        let variants: Vec<_> = vset.variants.iter().map(String::as_str).collect();
        println!(
            "{}    variantSet {} = {{{}}} selected {}",
            indent,
            name,
            variants.join(", "),
            vset.selection.as_deref().unwrap_or("nothing")
        );
    }
    for child in &prim.children {
        print_prim(child, depth + 1);
    }
}

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        println!("Usage: inspect_usda <path-to-usda-file>");
        println!("\nExamples:");
        println!("  cargo run --example inspect_usda -- scene_a.usda");
        println!("  cargo run --example inspect_usda -- merged.usda");
        return;
    }

    let path = &args[1];
    println!("Loading USDA file: {}", path);

    match load_usda(path) {
        Ok(document) => {
            println!("\n=== {} prims ===", document.len());

            println!("\n--- Layer Metadata ---");
            for (key, value) in document.metadata() {
                println!("  {} = {:?}", key, value);
            }

            println!("\n--- Hierarchy ---");
            for root in document.roots() {
                print_prim(root, 0);
            }
        }
        Err(e) => {
            eprintln!("Error loading USDA file: {}", e);
        }
    }
}
