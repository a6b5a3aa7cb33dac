use super::fsm::{PipelineEvent, PipelineStateMachine};
use crate::{
    Error, Result,
    analytics::{AnalyticsSink, GenerationLog},
    cache::{CacheStore, background_fingerprint, short_key},
    config::PipelineConfig,
    gemini::{ContentRequest, GenerativeModel, Part},
    prompts::{PromptCatalog, ReferenceLayout, build_instruction, builtin, repair_instruction},
    request::{GenerationRequest, ImageInput, Quality},
    verify::VerificationGate,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineLimits {
    /// Calls per generation stage before the stage gives up.
    pub max_generation_attempts: u32,
    /// Regenerations allowed after a failed verification.
    pub max_verification_retries: u32,
}

impl Default for PipelineLimits {
    fn default() -> Self {
        Self::from(&PipelineConfig::default())
    }
}

impl From<&PipelineConfig> for PipelineLimits {
    fn from(config: &PipelineConfig) -> Self {
        Self {
            max_generation_attempts: config.max_generation_attempts.max(1),
            max_verification_retries: config.max_verification_retries,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BackgroundMode {
    Image,
    Text,
}

impl BackgroundMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Text => "text",
        }
    }
}

#[derive(Debug, Clone)]
pub struct GenerationResult {
    pub image: Vec<u8>,
    pub passed: bool,
    /// Empty when the last attempt passed verification.
    pub issues: Vec<String>,
    pub attempts: u32,
    pub elapsed: Duration,
    pub background_mode: BackgroundMode,
    /// The background came from the client or the cache rather than a fresh render.
    pub used_cached_background: bool,
}

impl GenerationResult {
    pub fn message(&self) -> &'static str {
        if self.issues.is_empty() {
            "Success"
        } else {
            "Generated with potential issues"
        }
    }
}

#[derive(Debug, Clone)]
pub struct BackgroundArtifact {
    pub background_id: String,
    pub image: Vec<u8>,
    pub cached: bool,
}

struct EffectiveBackground {
    image: Option<ImageInput>,
    reused: bool,
}

/// Runs the staged generation pipeline for one request: optional
/// background reproduction, composite synthesis, then judge-and-repair.
pub struct GenerationOrchestrator {
    model: Arc<dyn GenerativeModel>,
    catalog: Arc<PromptCatalog>,
    cache: CacheStore,
    gate: VerificationGate,
    analytics: AnalyticsSink,
    limits: PipelineLimits,
}

impl GenerationOrchestrator {
    /// The model also serves as judge until [`with_judge`](Self::with_judge) says otherwise.
    pub fn new(
        model: Arc<dyn GenerativeModel>,
        catalog: Arc<PromptCatalog>,
        cache: CacheStore,
    ) -> Self {
        let gate = VerificationGate::new(model.clone(), catalog.clone());
        Self {
            model,
            catalog,
            cache,
            gate,
            analytics: AnalyticsSink::disabled(),
            limits: PipelineLimits::default(),
        }
    }

    pub fn with_judge(mut self, judge: Arc<dyn GenerativeModel>) -> Self {
        self.gate = VerificationGate::new(judge, self.catalog.clone());
        self
    }

    pub fn with_analytics(mut self, analytics: AnalyticsSink) -> Self {
        self.analytics = analytics;
        self
    }

    pub fn with_limits(mut self, limits: PipelineLimits) -> Self {
        self.limits = limits;
        self
    }

    pub async fn run(&self, request: &GenerationRequest) -> Result<GenerationResult> {
        let start = Instant::now();
        let mut fsm = PipelineStateMachine::new(self.limits.max_verification_retries);

        if request.product.data.is_empty() {
            fsm.transition(PipelineEvent::InputRejected)?;
            return Err(Error::MissingProductImage);
        }
        fsm.transition(PipelineEvent::InputAccepted)?;

        let background = self.resolve_background(request).await;
        fsm.transition(PipelineEvent::BackgroundResolved)?;

        let layout = ReferenceLayout {
            has_master: request.master.is_some(),
            has_background: background.image.is_some(),
        };
        let references = reference_parts(request, background.image.as_ref());
        let base_instruction = build_instruction(&self.catalog, request, layout).await;
        let mut instruction = base_instruction.clone();

        let (image, issues) = loop {
            info!("[GEN] Stage 2: composite attempt {}", fsm.attempts());

            let mut parts = references.clone();
            parts.push(Part::text(instruction.clone()));
            let generated = match self.generate_image(parts, request.quality, "Stage 2").await {
                Ok(generated) => generated,
                Err(e) => {
                    fsm.transition(PipelineEvent::GenerationExhausted)?;
                    return Err(e);
                }
            };
            fsm.transition(PipelineEvent::ImageGenerated)?;

            let verdict = self
                .gate
                .verify(
                    &request.product,
                    &generated,
                    request.orientation,
                    request.visible_text(),
                )
                .await;

            if verdict.passed {
                fsm.transition(PipelineEvent::VerificationPassed)?;
                break (generated.data, Vec::new());
            }

            if fsm.can_repair() {
                warn!("[VERIFY] Failed, retrying: {:?}", verdict.issues);
                instruction = repair_instruction(&base_instruction, &verdict.issues);
                fsm.transition(PipelineEvent::RepairRequested)?;
            } else {
                warn!(
                    "[VERIFY] Still failing after {} attempts, returning with warnings",
                    fsm.attempts()
                );
                fsm.transition(PipelineEvent::RepairsExhausted)?;
                break (generated.data, verdict.issues);
            }
        };

        let result = GenerationResult {
            image,
            passed: issues.is_empty(),
            issues,
            attempts: fsm.attempts(),
            elapsed: start.elapsed(),
            background_mode: if layout.has_background {
                BackgroundMode::Image
            } else {
                BackgroundMode::Text
            },
            used_cached_background: background.reused,
        };

        info!(
            "Generation finished: passed={}, attempts={}, background={}, elapsed={:?}",
            result.passed,
            result.attempts,
            result.background_mode.as_str(),
            result.elapsed
        );

        self.analytics.record(GenerationLog {
            orientation: request.orientation.as_str().to_string(),
            lighting_scheme: request.lighting.scheme_id.clone(),
            background_type: result.background_mode.as_str().to_string(),
            quality: request.quality.as_str().to_string(),
            has_master: layout.has_master,
            has_cached_bg: result.used_cached_background,
            verification_passed: result.passed,
            verification_attempts: result.attempts,
            generation_time_ms: result.elapsed.as_millis() as u64,
        });

        Ok(result)
    }

    /// Renders (or fetches from cache) a reproduced background ahead of time.
    pub async fn pregenerate_background(
        &self,
        image: &ImageInput,
        quality: Quality,
    ) -> Result<BackgroundArtifact> {
        if image.data.is_empty() {
            return Err(Error::invalid_request("No background image provided"));
        }

        let background_id = background_fingerprint(&image.data);
        if let Some(cached) = self.cache.get_binary(&background_id).await {
            info!("[CACHE] Background hit: {}", short_key(&background_id));
            return Ok(BackgroundArtifact {
                background_id,
                image: cached,
                cached: true,
            });
        }

        let rendered = self.render_background(image, quality).await?;
        self.cache
            .set_binary(&background_id, &rendered.data, self.cache.ttl())
            .await;
        info!("[CACHE] Background stored: {}", short_key(&background_id));

        Ok(BackgroundArtifact {
            background_id,
            image: rendered.data,
            cached: false,
        })
    }

    /// Stage 1. A client-supplied render wins, then the cache, then a fresh
    /// reproduction. A failed reproduction leaves the text description as the
    /// only background.
    async fn resolve_background(&self, request: &GenerationRequest) -> EffectiveBackground {
        if let Some(supplied) = &request.cached_background {
            return EffectiveBackground {
                image: Some(supplied.clone()),
                reused: true,
            };
        }

        let Some(reference) = request
            .background
            .as_ref()
            .filter(|_| request.wants_background_reproduction())
        else {
            return EffectiveBackground {
                image: None,
                reused: false,
            };
        };

        let key = background_fingerprint(&reference.data);
        if let Some(cached) = self.cache.get_binary(&key).await {
            info!("[CACHE] Background hit: {}", short_key(&key));
            return EffectiveBackground {
                image: Some(ImageInput::sniffed(cached)),
                reused: true,
            };
        }

        info!("[GEN] Stage 1: Background generation");
        match self.render_background(reference, request.quality).await {
            Ok(rendered) => {
                self.cache.set_binary(&key, &rendered.data, self.cache.ttl()).await;
                info!("[CACHE] Background stored: {}", short_key(&key));
                EffectiveBackground {
                    image: Some(rendered),
                    reused: false,
                }
            }
            Err(e) => {
                warn!("[GEN] Stage 1 failed, using text background: {}", e);
                EffectiveBackground {
                    image: None,
                    reused: false,
                }
            }
        }
    }

    async fn render_background(&self, reference: &ImageInput, quality: Quality) -> Result<ImageInput> {
        let instruction = self.catalog.get(builtin::BACKGROUND_REPRODUCTION).await;
        let parts = vec![
            Part::image(reference.mime_type.clone(), reference.data.clone()),
            Part::text(instruction),
        ];
        self.generate_image(parts, quality, "Stage 1").await
    }

    /// One generation stage: up to `max_generation_attempts` calls, each
    /// retried on a transport error or a reply without an image. The image
    /// keeps the mime type the model reported.
    async fn generate_image(
        &self,
        parts: Vec<Part>,
        quality: Quality,
        stage: &str,
    ) -> Result<ImageInput> {
        let max_attempts = self.limits.max_generation_attempts;
        let mut last_error = String::new();

        for attempt in 1..=max_attempts {
            let request = ContentRequest::image(parts.clone(), quality.as_str());
            match self.model.generate_content(request).await {
                Ok(response) => match response.into_first_image() {
                    Some(image) => return Ok(ImageInput::new(image.data, image.mime_type)),
                    None => last_error = "No image in response".to_string(),
                },
                Err(e) => last_error = e.to_string(),
            }
            warn!("[GEN] {} attempt {} failed: {}", stage, attempt, last_error);
        }

        Err(Error::GenerationExhausted {
            attempts: max_attempts,
            last_error,
        })
    }
}

/// Reference images in legend order: master, background, product, details.
fn reference_parts(request: &GenerationRequest, background: Option<&ImageInput>) -> Vec<Part> {
    let mut parts = Vec::new();

    if let Some(master) = &request.master {
        parts.push(Part::image(master.mime_type.clone(), master.data.clone()));
    }
    if let Some(background) = background {
        parts.push(Part::image(background.mime_type.clone(), background.data.clone()));
    }
    parts.push(Part::image(
        request.product.mime_type.clone(),
        request.product.data.clone(),
    ));
    for detail in &request.details {
        parts.push(Part::image(
            detail.image.mime_type.clone(),
            detail.image.data.clone(),
        ));
    }

    parts
}
