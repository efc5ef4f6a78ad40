//! Random test scene generation.
//!
//! Produces small but feature-complete documents for exercising the composer
//! and validator: layer and prim metadata, attributes, time samples,
//! connections, relationships and a variant set.

use glam::DVec3;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::Deserialize;
use uuid::{Builder, Uuid};

use crate::document::{DocumentError, SceneBuilder, SceneDocument, Specifier};
use crate::path::PrimPath;
use crate::value::{Attribute, Value};

/// Variant names of the generated mesh's `materialVariant` set, with the
/// diffuse colour of the matching material.
const MATERIAL_VARIANTS: [(&str, [f64; 3]); 3] = [
    ("Metal", [0.7, 0.7, 0.7]),
    ("Plastic", [0.1, 0.5, 0.1]),
    ("Glass", [0.1, 0.1, 0.5]),
];

const CAMERA_START: DVec3 = DVec3::new(-10.0, 5.0, 20.0);
const CAMERA_END: DVec3 = DVec3::new(10.0, 5.0, 20.0);

/// Settings for [`generate_scene`].
///
/// Every field has a default, so a partial JSON config is valid:
///
/// ```json
/// { "seed": 7, "max_cubes": 5 }
/// ```
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct RandomSceneConfig {
    /// Fixed RNG seed; `None` draws one from the OS
    pub seed: Option<u64>,

    pub min_cubes: usize,
    pub max_cubes: usize,

    /// First and last time code. The camera is sampled on every frame from
    /// frame 0 (or `start_frame`, if negative) through `end_frame`.
    pub start_frame: i64,
    pub end_frame: i64,
}

impl Default for RandomSceneConfig {
    fn default() -> Self {
        Self {
            seed: None,
            min_cubes: 4,
            max_cubes: 8,
            start_frame: 1,
            end_frame: 48,
        }
    }
}

impl RandomSceneConfig {
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..Default::default()
        }
    }
}

/// Generate a random scene.
///
/// With a fixed seed the output is fully deterministic, including the
/// unique suffix appended to prim names.
pub fn generate_scene(config: &RandomSceneConfig) -> Result<SceneDocument, DocumentError> {
    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let (min_cubes, max_cubes) = ordered(config.min_cubes, config.max_cubes);
    let (start_frame, end_frame) = ordered(config.start_frame, config.end_frame);
    if (min_cubes, start_frame) != (config.min_cubes, config.start_frame) {
        log::warn!("Swapped reversed ranges in random scene config");
    }

    // Short unique suffix so no two generated scenes collide
    let uid = match config.seed {
        Some(_) => Builder::from_random_bytes(rng.gen()).into_uuid(),
        None => Uuid::new_v4(),
    };
    let suffix = uid.simple().to_string()[..6].to_string();
    log::debug!("Generating random scene with suffix {}", suffix);

    let mut builder = SceneBuilder::new();
    let world = PrimPath::root().child("World")?;

    builder
        .set_layer_metadata("defaultPrim", "World".into())
        .set_layer_metadata("metersPerUnit", Value::Float(0.01))
        .set_layer_metadata("startTimeCode", Value::Float(start_frame as f64))
        .set_layer_metadata("endTimeCode", Value::Float(end_frame as f64))
        .define_prim(&world, Specifier::Def, Some("Xform"))
        .set_metadata(
            &world,
            "comment",
            "A randomized demo scene with cubes, variants, and animation.".into(),
        );

    // Cubes
    let cube_count = rng.gen_range(min_cubes..=max_cubes);
    for i in 0..cube_count {
        let cube = world.child(&format!("Cube_{}_{}", suffix, i))?;
        let translate = DVec3::new(
            rng.gen_range(-5.0..5.0),
            rng.gen_range(0.0..3.0),
            rng.gen_range(-5.0..5.0),
        );
        let color: [f64; 3] = [rng.gen(), rng.gen(), rng.gen()];

        builder
            .define_prim(&cube, Specifier::Def, Some("Cube"))
            .set_attribute(&cube, "size", Attribute::new("double", Value::Float(rng.gen_range(0.5..2.0))))
            .set_attribute(&cube, "xformOp:translate", Attribute::new("double3", vec3(translate)))
            .set_attribute(&cube, "xformOpOrder", translate_op_order())
            .set_attribute(
                &cube,
                "primvars:displayColor",
                Attribute::new("color3f[]", Value::Array(vec![Value::float_tuple(&color)])),
            );
    }

    // Mesh with a material variant set, bound to the selected material
    let mesh = world.child(&format!("Mesh_{}", suffix))?;
    let variant_names: Vec<&str> = MATERIAL_VARIANTS.iter().map(|(name, _)| *name).collect();
    let selected = variant_names.choose(&mut rng).copied().unwrap_or("Metal");

    builder
        .define_prim(&mesh, Specifier::Def, Some("Mesh"))
        .set_attribute(&mesh, "points", Attribute::declared("point3f[]"))
        .add_variants(&mesh, "materialVariant", variant_names.iter().copied(), Some(selected));

    for (variant, diffuse) in MATERIAL_VARIANTS {
        let material = world.child(&format!("Material_{}_{}", variant, suffix))?;
        let shader = material.child(&format!("{}Shader", variant))?;

        builder
            .define_prim(&material, Specifier::Def, Some("Material"))
            .set_attribute(
                &material,
                "outputs:surface",
                Attribute {
                    type_name: "token".to_string(),
                    connections: vec![format!("{}.outputs:surface", shader)],
                    ..Default::default()
                },
            )
            .define_prim(&shader, Specifier::Def, Some("Shader"))
            .set_attribute(&shader, "info:id", Attribute::new("token", "UsdPreviewSurface".into()).uniform())
            .set_attribute(&shader, "inputs:diffuseColor", Attribute::new("color3f", Value::float_tuple(&diffuse)))
            .set_attribute(&shader, "outputs:surface", Attribute::declared("token"));

        if variant == selected {
            builder.add_relationship_targets(&mesh, "material:binding", [material.to_string()]);
        }
    }

    // Camera panning along X
    let camera = world.child(&format!("Camera_{}", suffix))?;
    let first_frame = start_frame.min(0);
    let span = (end_frame - first_frame) as f64;
    let time_samples = (first_frame..=end_frame)
        .map(|frame| {
            let t = if span > 0.0 { (frame - first_frame) as f64 / span } else { 0.0 };
            (frame as f64, vec3(CAMERA_START.lerp(CAMERA_END, t)))
        })
        .collect();

    builder
        .define_prim(&camera, Specifier::Def, Some("Camera"))
        .set_attribute(
            &camera,
            "focalLength",
            Attribute::new("float", Value::Float(rng.gen_range(30.0..70.0))),
        )
        .set_attribute(
            &camera,
            "xformOp:translate",
            Attribute {
                type_name: "double3".to_string(),
                time_samples,
                ..Default::default()
            },
        )
        .set_attribute(&camera, "xformOpOrder", translate_op_order());

    let document = builder.build();
    log::info!(
        "Generated random scene: {} cubes, material {} selected, {} prims total",
        cube_count,
        selected,
        document.len()
    );
    Ok(document)
}

fn ordered<T: PartialOrd>(a: T, b: T) -> (T, T) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

fn vec3(v: DVec3) -> Value {
    Value::float_tuple(&v.to_array())
}

fn translate_op_order() -> Attribute {
    Attribute::new("token[]", Value::Array(vec!["xformOp:translate".into()])).uniform()
}
