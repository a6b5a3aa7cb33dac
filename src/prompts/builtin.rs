//! Templates used when the record store has no active row for a name.

pub const COMPOSITION_FLAT_LAY: &str = "composition_flat_lay";
pub const COMPOSITION_STANDING: &str = "composition_standing";
pub const COMPOSITION_ANGLED: &str = "composition_angled";
pub const OUTPUT_QUALITY: &str = "output_quality";
pub const BACKGROUND_REPRODUCTION: &str = "background_reproduction";
pub const VERIFICATION: &str = "verification";

const PROMPTS: &[(&str, &str)] = &[
    (
        COMPOSITION_FLAT_LAY,
        "COMPOSITION: Top-down flat lay photograph. Camera positioned directly above, looking \
         straight down. Product lies flat on a horizontal surface. Center the product, filling \
         50-60% of frame. Background extends as continuous horizontal plane around all edges. \
         Soft contact shadow directly beneath product.",
    ),
    (
        COMPOSITION_STANDING,
        "COMPOSITION: Standing product photograph. Camera at eye level or slightly elevated. \
         Product stands upright on surface with depth perspective - background visible beneath \
         and behind, receding naturally. Center product, filling 50-60% of frame height. \
         Natural contact shadow at base.",
    ),
    (
        COMPOSITION_ANGLED,
        "COMPOSITION: Photograph at natural angle matching reference. Center product, filling \
         50-60% of frame. Background surface visible around product with appropriate \
         perspective. Soft contact shadow grounding product on surface.",
    ),
    (
        OUTPUT_QUALITY,
        "OUTPUT: Authentic studio photograph. Natural depth of field, real material textures, \
         unified lighting across product and background. Shot on full-frame camera with 90mm \
         lens at f/8.",
    ),
    (
        BACKGROUND_REPRODUCTION,
        "Reproduce this image exactly as a clean studio photography surface.\n\n\
         IMAGE 1 shows a background/surface material. Create an exact copy preserving:\n\
         - All colors, textures, patterns exactly\n\
         - ALL text, writing, numbers, logos - exact content, placement, size, style\n\
         - ALL graphics, drawings, marks exactly\n\n\
         Fill entire frame, evenly lit. Accuracy is critical.",
    ),
    (
        VERIFICATION,
        "Compare these images. Image 1 is the original product, Image 2 is the generated \
         studio photograph.\n\n\
         Verify:\n\
         1. PRODUCT: Same product with complete fidelity (shape, color, materials, details)?\n\
         2. ORIENTATION: Product presented as {orientation}?\n\
         3. COMPOSITION: Product centered, filling 50-60% of frame, grounded by a contact shadow?\n\
         4. LIGHTING: Product and background share one light direction, shadow softness and \
         color temperature?{text_check}\n\n\
         JSON only: {\"pass\": bool, {text_field}\"issues\": [\"short description of each problem\"]}",
    ),
];

pub const SOFTBOX: &str = "softbox";

const LIGHTING: &[(&str, &str, &str, &str)] = &[(
    SOFTBOX,
    "Soft Box",
    "Classic commercial lighting",
    "LIGHTING: Soft box. Large diffused source at 45° left and above, subtle fill from right. \
     Shadows soft gradients at 30-40% gray with smooth falloff. Highlights broad and wrapped. \
     Exposure balanced and neutral. Background evenly lit matching product. Color temperature \
     neutral daylight (5500K).",
)];

const BACKGROUNDS: &[(&str, &str, &str)] = &[
    (
        "white",
        "White",
        "Professional seamless studio surface: pure white duvetyn fabric with soft, velvety \
         matte surface. Zero shine or reflections. Taut and smooth. Extends seamlessly with no \
         visible edges.",
    ),
    (
        "gray",
        "Gray",
        "Professional seamless studio surface: neutral medium gray duvetyn fabric. True neutral \
         with no warm or cool cast. Soft matte surface. Extends seamlessly.",
    ),
    (
        "black",
        "Black",
        "Professional seamless studio surface: near-black duvetyn fabric. Deep rich black with \
         subtle texture. Matte surface. Extends seamlessly.",
    ),
];

pub fn prompt(name: &str) -> Option<&'static str> {
    PROMPTS
        .iter()
        .find(|(key, _)| *key == name)
        .map(|(_, text)| *text)
}

/// Unknown scheme ids get the softbox text.
pub fn lighting(scheme_id: &str) -> &'static str {
    LIGHTING
        .iter()
        .find(|(id, ..)| *id == scheme_id)
        .or_else(|| LIGHTING.iter().find(|(id, ..)| *id == SOFTBOX))
        .map(|(.., text)| *text)
        .unwrap_or_default()
}

pub fn lighting_schemes() -> Vec<serde_json::Value> {
    LIGHTING
        .iter()
        .map(|(id, name, description, _)| {
            serde_json::json!({"id": id, "name": name, "description": description})
        })
        .collect()
}

pub fn backgrounds() -> Vec<serde_json::Value> {
    BACKGROUNDS
        .iter()
        .enumerate()
        .map(|(index, (id, name, description))| {
            serde_json::json!({
                "id": id,
                "name": name,
                "description": description,
                "is_default": index == 0,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_prompts_resolve() {
        for name in [
            COMPOSITION_FLAT_LAY,
            COMPOSITION_STANDING,
            COMPOSITION_ANGLED,
            OUTPUT_QUALITY,
            BACKGROUND_REPRODUCTION,
            VERIFICATION,
        ] {
            assert!(prompt(name).is_some_and(|text| !text.is_empty()), "{name}");
        }
        assert_eq!(prompt("nope"), None);
    }

    #[test]
    fn test_unknown_lighting_falls_back_to_softbox() {
        assert_eq!(lighting("rembrandt"), lighting(SOFTBOX));
        assert!(lighting(SOFTBOX).starts_with("LIGHTING: Soft box."));
    }

    #[test]
    fn test_first_background_is_default() {
        let rows = backgrounds();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0]["id"], "white");
        assert_eq!(rows[0]["is_default"], true);
        assert_eq!(rows[1]["is_default"], false);
    }
}
