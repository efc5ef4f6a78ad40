//! Shared USDA fixtures for unit tests.

/// Scene with a red cube looking at a sphere and a two-variant mesh.
pub const SCENE_A: &str = r#"#usda 1.0
(
    defaultPrim = "World"
    metersPerUnit = 0.01
)

def Xform "World" {
    def Cube "Cube" (
        color = "red"
        kind = "component"
    )
    {
        double size = 1.0
        rel looksAt = </World/Sphere>
    }

    def Mesh "Mesh" (
        variants = {
            string materialVariant = "Metal"
        }
        prepend variantSets = "materialVariant"
    )
    {
        variantSet "materialVariant" = {
            "Metal" {
            }
            "Plastic" {
            }
        }
    }
}
"#;

/// Overlaps [`SCENE_A`]: conflicting metadata and attributes on `/World/Cube`,
/// extra relationship targets, and more variants on `/World/Mesh`.
pub const SCENE_B: &str = r#"#usda 1.0
(
    defaultPrim = "Other"
    upAxis = "Y"
)

def Xform "World" {
    def Sphere "Cube" (
        color = "blue"
        doc = "from B"
    )
    {
        double size = 3.0
        double radius = 0.5
        rel looksAt = [</World/Cone>, </World/Sphere>]
        rel proxyPrim = </World/Proxy>
    }

    def Mesh "Mesh" (
        variants = {
            string materialVariant = "Glass"
            string lod = "high"
        }
        prepend variantSets = ["materialVariant", "lod"]
    )
    {
        variantSet "materialVariant" = {
            "Glass" {
            }
            "Metal" {
            }
        }
        variantSet "lod" = {
            "high" {
            }
        }
    }
}

def Scope "Extra" {
}
"#;
