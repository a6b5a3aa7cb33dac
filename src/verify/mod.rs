use crate::{
    Error, Result,
    gemini::{ContentRequest, GenerativeModel, Part},
    prompts::{PromptCatalog, builtin},
    request::{ImageInput, Orientation},
};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Issue recorded when the judge rejects an image without saying why.
pub const UNSPECIFIED_ISSUE: &str = "Verification failed without specific issues";

#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    pub passed: bool,
    pub issues: Vec<String>,
}

impl Verdict {
    pub fn pass() -> Self {
        Self {
            passed: true,
            issues: Vec::new(),
        }
    }

    pub fn fail(issues: Vec<String>) -> Self {
        let issues = if issues.is_empty() {
            vec![UNSPECIFIED_ISSUE.to_string()]
        } else {
            issues
        };
        Self {
            passed: false,
            issues,
        }
    }
}

#[derive(Debug, Deserialize)]
struct JudgeReply {
    pass: bool,
    /// Judges do not always send a list of strings; any shape is accepted.
    #[serde(default)]
    issues: Value,
}

impl JudgeReply {
    fn issue_list(self) -> Vec<String> {
        let describe = |value: Value| match value {
            Value::String(text) => text,
            other => other.to_string(),
        };
        match self.issues {
            Value::Null => Vec::new(),
            Value::Array(items) => items
                .into_iter()
                .filter(|item| !item.is_null())
                .map(describe)
                .collect(),
            other => vec![describe(other)],
        }
    }
}

/// Judges a generated image against the original product photo with a
/// second model call. Any failure to obtain or parse a verdict counts as a
/// pass.
pub struct VerificationGate {
    model: Arc<dyn GenerativeModel>,
    catalog: Arc<PromptCatalog>,
}

impl VerificationGate {
    pub fn new(model: Arc<dyn GenerativeModel>, catalog: Arc<PromptCatalog>) -> Self {
        Self { model, catalog }
    }

    pub async fn verify(
        &self,
        original: &ImageInput,
        generated: &ImageInput,
        orientation: Orientation,
        visible_text: Option<&str>,
    ) -> Verdict {
        match self.judge(original, generated, orientation, visible_text).await {
            Ok(verdict) => {
                info!(
                    "Verification {} with {} issues",
                    if verdict.passed { "passed" } else { "failed" },
                    verdict.issues.len()
                );
                verdict
            }
            Err(e) => {
                warn!("Verification unavailable, accepting image: {}", e);
                Verdict::pass()
            }
        }
    }

    pub async fn instruction(&self, orientation: Orientation, visible_text: Option<&str>) -> String {
        let template = self.catalog.get(builtin::VERIFICATION).await;
        render_instruction(&template, orientation, visible_text)
    }

    async fn judge(
        &self,
        original: &ImageInput,
        generated: &ImageInput,
        orientation: Orientation,
        visible_text: Option<&str>,
    ) -> Result<Verdict> {
        let instruction = self.instruction(orientation, visible_text).await;
        let request = ContentRequest::json(vec![
            Part::image(original.mime_type.clone(), original.data.clone()),
            Part::image(generated.mime_type.clone(), generated.data.clone()),
            Part::text(instruction),
        ]);

        let response = self.model.generate_content(request).await?;
        let raw = response.text();
        debug!("Judge replied: {}", raw);
        parse_verdict(&raw)
    }
}

/// Fills the verification template. Both `{orientation}` and
/// `ORIENTATION_PLACEHOLDER` are accepted; the text checks appear only when
/// there is text to preserve.
pub fn render_instruction(
    template: &str,
    orientation: Orientation,
    visible_text: Option<&str>,
) -> String {
    let template = if template.trim().is_empty() {
        "Compare these images. Image 1 is original product, Image 2 is generated.\n\
         Verify: product fidelity, orientation (ORIENTATION_PLACEHOLDER), composition, lighting unity.\n\
         JSON with pass (boolean) and issues (array of strings)."
    } else {
        template
    };

    let (text_check, text_field) = match visible_text {
        Some(text) => (
            format!("\n5. TEXT: Visible markings \"{}\" preserved correctly?", text),
            "\"text_ok\": bool, ".to_string(),
        ),
        None => (String::new(), String::new()),
    };

    template
        .replace("{orientation}", orientation.as_str())
        .replace("ORIENTATION_PLACEHOLDER", orientation.as_str())
        .replace("{text_check}", &text_check)
        .replace("{text_field}", &text_field)
}

/// Strips Markdown code fences some models wrap JSON in.
pub fn clean_json_text(text: &str) -> &str {
    let mut text = text.trim();
    if text.is_empty() {
        return "{}";
    }
    if let Some(rest) = text.strip_prefix("```json") {
        text = rest;
    }
    if let Some(rest) = text.strip_prefix("```") {
        text = rest;
    }
    if let Some(rest) = text.strip_suffix("```") {
        text = rest;
    }
    text.trim()
}

pub fn parse_verdict(raw: &str) -> Result<Verdict> {
    let reply: JudgeReply = serde_json::from_str(clean_json_text(raw))
        .map_err(|e| Error::generation(format!("Unparsable verdict: {}", e)))?;

    if reply.pass {
        Ok(Verdict::pass())
    } else {
        Ok(Verdict::fail(reply.issue_list()))
    }
}
