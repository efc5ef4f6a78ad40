//! Flat structural composition of two scene documents.
//!
//! This is not USD layer composition: there is no opinion strength and no
//! arc resolution. Prims are unioned by path. Where both inputs author the
//! same metadata key or attribute, the first document wins; relationship
//! targets and variant names are always unioned.

use crate::document::{SceneBuilder, SceneDocument};

/// Merge two documents into a new one. Neither input is modified.
pub fn compose(scene_a: &SceneDocument, scene_b: &SceneDocument) -> SceneDocument {
    let mut builder = SceneBuilder::new();

    for (label, scene) in [("A", scene_a), ("B", scene_b)] {
        merge_into(&mut builder, scene);
        log::debug!("Merged scene {} ({} prims)", label, scene.len());
    }

    let composed = builder.build();
    log::info!(
        "Composed {} + {} prims into {} prims",
        scene_a.len(),
        scene_b.len(),
        composed.len()
    );
    composed
}

/// Walk a document in pre-order and merge every prim into the builder.
fn merge_into(builder: &mut SceneBuilder, scene: &SceneDocument) {
    for (key, value) in scene.metadata() {
        builder.set_layer_metadata(key.clone(), value.clone());
    }
    for prim in scene.iter() {
        builder.merge_prim(prim);
    }
}
