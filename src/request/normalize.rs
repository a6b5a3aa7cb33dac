use super::form::{RawForm, UploadedFile};
use super::types::*;
use crate::{Error, Result, prompts::PromptCatalog};
use std::sync::Arc;
use tracing::{debug, info};

/// Turns raw multipart input into a [`GenerationRequest`].
pub struct RequestNormalizer {
    catalog: Arc<PromptCatalog>,
}

impl RequestNormalizer {
    pub fn new(catalog: Arc<PromptCatalog>) -> Self {
        Self { catalog }
    }

    /// Fails only when the product image is absent or empty.
    pub async fn normalize(&self, form: &RawForm) -> Result<GenerationRequest> {
        let product = form
            .file("image")
            .map(|file| image_input(file, DEFAULT_IMAGE_MIME))
            .ok_or(Error::MissingProductImage)?;

        let mut request = GenerationRequest::new(product);

        request.background = form
            .file("backgroundImage")
            .map(|file| image_input(file, DEFAULT_IMAGE_MIME));
        request.cached_background = form
            .file("cachedBackground")
            .map(|file| image_input(file, DEFAULT_RENDER_MIME));
        request.master = form
            .file("masterImage")
            .map(|file| image_input(file, DEFAULT_IMAGE_MIME));

        for index in 1..=MAX_DETAIL_IMAGES {
            let Some(file) = form.file(&format!("detail{}", index)) else {
                continue;
            };
            let label = form
                .field(&format!("detail{}Label", index))
                .map(str::to_string)
                .unwrap_or_else(|| format!("Detail {}", index));
            request.details.push(DetailImage {
                image: image_input(file, DEFAULT_IMAGE_MIME),
                label,
            });
        }

        request.quality = Quality::parse_or(form.field("quality"), Quality::OneK);
        request.orientation = Orientation::parse(form.field("orientation").unwrap_or_default());
        request.background_description = owned(form.field("backgroundDescription"));
        request.material_scale = owned(form.field("materialScale"));
        request.product_dimensions = owned(form.field("productDimensions"));
        request.visible_text = owned(form.field("visibleText"));
        request.master_style = owned(form.field("masterStyle"));
        request.has_branding = form
            .field("hasBranding")
            .is_some_and(|value| value.trim().eq_ignore_ascii_case("true"));

        let scheme_id = form
            .field("lightingSchemeId")
            .unwrap_or(DEFAULT_LIGHTING_SCHEME)
            .trim()
            .to_string();
        let literal = form.field("lightingPrompt").or_else(|| form.field("prompt"));
        let text = match literal {
            Some(text) => text.to_string(),
            None => self.catalog.lighting_scheme(&scheme_id).await.text,
        };
        request.lighting = Lighting { scheme_id, text };

        info!(
            "Normalized request: orientation={}, lighting_scheme={}, quality={}",
            request.orientation, request.lighting.scheme_id, request.quality
        );
        debug!(
            "Request inputs: background={}, cached_background={}, master={}, details={}, lighting_length={}",
            request.background.is_some(),
            request.cached_background.is_some(),
            request.master.is_some(),
            request.details.len(),
            request.lighting.text.len()
        );

        Ok(request)
    }
}

fn image_input(file: &UploadedFile, default_mime: &str) -> ImageInput {
    let mime_type = file
        .content_type
        .as_deref()
        .filter(|value| !value.is_empty())
        .unwrap_or(default_mime);
    ImageInput::new(file.data.clone(), mime_type)
}

fn owned(value: Option<&str>) -> String {
    value.map(str::to_string).unwrap_or_default()
}
