use super::{PromptCatalog, builtin};
use crate::request::{GenerationRequest, Orientation};

/// Which optional references precede the product image in a Stage 2 call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReferenceLayout {
    pub has_master: bool,
    pub has_background: bool,
}

/// Composition template name for a raw orientation value.
pub fn composition_template_name(orientation: &str) -> &'static str {
    Orientation::parse(orientation).composition_template()
}

/// Numbered image roles in the order the reference images are attached:
/// style master, background, product, details.
pub fn role_legend<'a>(
    layout: ReferenceLayout,
    detail_labels: impl IntoIterator<Item = &'a str>,
) -> String {
    let mut roles = vec!["REFERENCE IMAGES:".to_string()];
    let mut index = 1;

    if layout.has_master {
        roles.push(format!(
            "Image {} = STYLE REFERENCE. Match this photographic style.",
            index
        ));
        index += 1;
    }

    if layout.has_background {
        roles.push(format!(
            "Image {} = BACKGROUND. Keep exactly as shown including all markings.",
            index
        ));
        index += 1;
    }

    roles.push(format!(
        "Image {} = PRODUCT. Reproduce exactly with complete fidelity.",
        index
    ));
    index += 1;

    for label in detail_labels {
        roles.push(format!("Image {} = DETAIL: {}", index, label));
        index += 1;
    }

    roles.join(" ")
}

/// Background clause when the scene is described in text only.
fn text_background_clause(request: &GenerationRequest) -> Option<String> {
    if request.background_description.trim().is_empty() {
        return None;
    }
    let mut clause = format!("BACKGROUND: {}", request.background_description);
    if !request.product_dimensions.is_empty() {
        clause.push_str(&format!(
            " Product is ~{} - scale appropriately.",
            request.product_dimensions
        ));
    }
    if !request.material_scale.is_empty() {
        clause.push_str(&format!(" Material scale: {}.", request.material_scale));
    }
    Some(clause)
}

/// Scale clause when a background image is attached.
fn scale_clause(request: &GenerationRequest) -> Option<String> {
    if request.product_dimensions.is_empty() {
        return None;
    }
    let mut clause = format!("SCALE: Product is ~{}.", request.product_dimensions);
    if !request.material_scale.is_empty() {
        clause.push_str(&format!(" Background: {}.", request.material_scale));
    }
    Some(clause)
}

fn lighting_clause(request: &GenerationRequest, has_background: bool) -> Option<String> {
    if request.lighting.text.is_empty() {
        return None;
    }
    let mut clause = request.lighting.text.clone();
    if has_background {
        clause.push_str(
            " Apply to both product and background - unified shadows and color temperature.",
        );
    }
    Some(clause)
}

/// Instruction block trailing the Stage 2 reference images.
pub async fn build_instruction(
    catalog: &PromptCatalog,
    request: &GenerationRequest,
    layout: ReferenceLayout,
) -> String {
    let mut sections = vec![role_legend(layout, request.detail_labels())];

    if layout.has_master && !request.master_style.trim().is_empty() {
        sections.push(format!("MATCH STYLE: {}", request.master_style));
    }

    sections.push(catalog.get(request.orientation.composition_template()).await);

    let background = if layout.has_background {
        scale_clause(request)
    } else {
        text_background_clause(request)
    };
    sections.extend(background);
    sections.extend(lighting_clause(request, layout.has_background));

    if let Some(text) = request.visible_text() {
        sections.push(format!("PRESERVE TEXT: {}", text));
    }

    let mut output = catalog.get(builtin::OUTPUT_QUALITY).await;
    output.push_str(" Square 1:1 aspect ratio.");
    sections.push(output);

    sections.retain(|section| !section.trim().is_empty());
    sections.join("\n\n")
}

/// The base instruction with the judge's issues appended. Repairs always
/// start from the base so directives never accumulate.
pub fn repair_instruction(base: &str, issues: &[String]) -> String {
    format!("{}\n\nFIX THESE ISSUES: {}", base, issues.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::{DetailImage, ImageInput};
    use pretty_assertions::assert_eq;

    fn request() -> GenerationRequest {
        let mut request = GenerationRequest::new(ImageInput::new(vec![1], "image/jpeg"));
        request.lighting.text = "LIGHTING: test".to_string();
        request
    }

    #[test]
    fn test_legend_orders_roles() {
        let legend = role_legend(
            ReferenceLayout {
                has_master: true,
                has_background: true,
            },
            ["stitching", "logo"],
        );
        assert_eq!(
            legend,
            "REFERENCE IMAGES: \
             Image 1 = STYLE REFERENCE. Match this photographic style. \
             Image 2 = BACKGROUND. Keep exactly as shown including all markings. \
             Image 3 = PRODUCT. Reproduce exactly with complete fidelity. \
             Image 4 = DETAIL: stitching \
             Image 5 = DETAIL: logo"
        );
    }

    #[test]
    fn test_legend_product_first_without_extras() {
        let legend = role_legend(ReferenceLayout::default(), []);
        assert!(legend.ends_with("Image 1 = PRODUCT. Reproduce exactly with complete fidelity."));
    }

    #[tokio::test]
    async fn test_text_background_instruction() {
        let catalog = PromptCatalog::new(None, 8);
        let mut request = request();
        request.orientation = Orientation::FlatLay;
        request.background_description = "Oak tabletop".to_string();
        request.product_dimensions = "10 x 5 x 2 cm".to_string();
        request.material_scale = "planks 10cm wide".to_string();
        request.visible_text = "ACME".to_string();

        let text = build_instruction(&catalog, &request, ReferenceLayout::default()).await;

        assert!(text.contains("Top-down flat lay photograph"));
        assert!(text.contains(
            "BACKGROUND: Oak tabletop Product is ~10 x 5 x 2 cm - scale appropriately. \
             Material scale: planks 10cm wide."
        ));
        assert!(text.contains("LIGHTING: test\n\n"));
        assert!(!text.contains("unified shadows"));
        assert!(text.contains("PRESERVE TEXT: ACME"));
        assert!(text.ends_with("Square 1:1 aspect ratio."));
    }

    #[tokio::test]
    async fn test_background_image_instruction() {
        let catalog = PromptCatalog::new(None, 8);
        let mut request = request();
        request.background_description = "ignored when an image is attached".to_string();
        request.product_dimensions = "30cm tall".to_string();
        request.master_style = "moody, warm".to_string();
        request.details.push(DetailImage {
            image: ImageInput::new(vec![2], "image/jpeg"),
            label: "clasp".to_string(),
        });

        let layout = ReferenceLayout {
            has_master: true,
            has_background: true,
        };
        let text = build_instruction(&catalog, &request, layout).await;

        assert!(text.contains("Image 4 = DETAIL: clasp"));
        assert!(text.contains("MATCH STYLE: moody, warm"));
        assert!(text.contains("SCALE: Product is ~30cm tall."));
        assert!(!text.contains("BACKGROUND: ignored"));
        assert!(text.contains(
            "LIGHTING: test Apply to both product and background - unified shadows and color temperature."
        ));
    }

    #[test]
    fn test_repair_does_not_accumulate() {
        let base = "BASE";
        let first = repair_instruction(base, &["a".to_string(), "b".to_string()]);
        let second = repair_instruction(base, &["c".to_string()]);
        assert_eq!(first, "BASE\n\nFIX THESE ISSUES: a, b");
        assert_eq!(second, "BASE\n\nFIX THESE ISSUES: c");
    }
}
