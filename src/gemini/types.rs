use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};

/// Which configured model a request is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelKind {
    /// Image-producing model used by both generation stages.
    Image,
    /// Text model used for judging generated images.
    Analysis,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InlineImage {
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl InlineImage {
    pub fn new(mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Part {
    Text(String),
    Image(InlineImage),
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    pub fn image(mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self::Image(InlineImage::new(mime_type, data))
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Image(_) => None,
        }
    }

    pub fn as_image(&self) -> Option<&InlineImage> {
        match self {
            Self::Image(image) => Some(image),
            Self::Text(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResponseFormat {
    /// Text and image modalities; `size` is the requested output size ("1K"/"2K").
    Image { size: Option<String> },
    Json,
}

#[derive(Debug, Clone)]
pub struct ContentRequest {
    pub kind: ModelKind,
    pub parts: Vec<Part>,
    pub format: ResponseFormat,
}

impl ContentRequest {
    pub fn image(parts: Vec<Part>, size: impl Into<String>) -> Self {
        Self {
            kind: ModelKind::Image,
            parts,
            format: ResponseFormat::Image {
                size: Some(size.into()),
            },
        }
    }

    pub fn json(parts: Vec<Part>) -> Self {
        Self {
            kind: ModelKind::Analysis,
            parts,
            format: ResponseFormat::Json,
        }
    }

    pub fn image_count(&self) -> usize {
        self.parts.iter().filter(|part| part.as_image().is_some()).count()
    }

    /// The trailing instruction block, if the last part is text.
    pub fn instruction(&self) -> Option<&str> {
        self.parts.last().and_then(Part::as_text)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ContentResponse {
    pub parts: Vec<Part>,
}

impl ContentResponse {
    pub fn first_image(&self) -> Option<&InlineImage> {
        self.parts.iter().find_map(Part::as_image)
    }

    pub fn into_first_image(self) -> Option<InlineImage> {
        self.parts.into_iter().find_map(|part| match part {
            Part::Image(image) => Some(image),
            Part::Text(_) => None,
        })
    }

    pub fn text(&self) -> String {
        self.parts
            .iter()
            .filter_map(Part::as_text)
            .collect::<Vec<_>>()
            .join("")
    }
}

// Wire format for `models/{model}:generateContent`.

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateContentBody {
    pub contents: Vec<WireContent>,
    pub generation_config: WireGenerationConfig,
}

#[derive(Debug, Serialize, Deserialize, Default)]
pub(crate) struct WireContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<WirePart>,
}

#[derive(Debug, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WirePart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline_data: Option<WireBlob>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireBlob {
    pub mime_type: String,
    pub data: String,
}

#[derive(Debug, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireGenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_modalities: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_config: Option<WireImageConfig>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireImageConfig {
    pub image_size: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GenerateContentReply {
    #[serde(default)]
    pub candidates: Vec<WireCandidate>,
    #[serde(default)]
    pub error: Option<WireError>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireCandidate {
    #[serde(default)]
    pub content: Option<WireContent>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireError {
    #[serde(default)]
    pub message: Option<String>,
}

impl From<&Part> for WirePart {
    fn from(part: &Part) -> Self {
        match part {
            Part::Text(text) => WirePart {
                text: Some(text.clone()),
                inline_data: None,
            },
            Part::Image(image) => WirePart {
                text: None,
                inline_data: Some(WireBlob {
                    mime_type: image.mime_type.clone(),
                    data: STANDARD.encode(&image.data),
                }),
            },
        }
    }
}

impl GenerateContentBody {
    pub fn from_request(request: &ContentRequest) -> Self {
        let generation_config = match &request.format {
            ResponseFormat::Image { size } => WireGenerationConfig {
                response_modalities: Some(vec!["TEXT".to_string(), "IMAGE".to_string()]),
                response_mime_type: None,
                image_config: size.clone().map(|image_size| WireImageConfig { image_size }),
            },
            ResponseFormat::Json => WireGenerationConfig {
                response_mime_type: Some("application/json".to_string()),
                ..Default::default()
            },
        };

        Self {
            contents: vec![WireContent {
                role: Some("user".to_string()),
                parts: request.parts.iter().map(WirePart::from).collect(),
            }],
            generation_config,
        }
    }
}

impl WirePart {
    /// Parts with undecodable image data are dropped rather than failing the reply.
    pub fn into_part(self) -> Option<Part> {
        if let Some(blob) = self.inline_data {
            return STANDARD
                .decode(blob.data.as_bytes())
                .ok()
                .map(|data| Part::image(blob.mime_type, data));
        }
        self.text.map(Part::Text)
    }
}
