use crate::prompts::builtin;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_IMAGE_MIME: &str = "image/jpeg";
pub const DEFAULT_RENDER_MIME: &str = "image/png";
pub const DEFAULT_LIGHTING_SCHEME: &str = "softbox";
pub const MAX_DETAIL_IMAGES: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct ImageInput {
    pub data: Vec<u8>,
    pub mime_type: String,
}

impl ImageInput {
    pub fn new(data: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            data,
            mime_type: mime_type.into(),
        }
    }

    /// Labels bytes that arrive without a type (cache entries) by their
    /// signature. Unknown signatures are assumed to be renders.
    pub fn sniffed(data: Vec<u8>) -> Self {
        let mime_type = if data.starts_with(b"\x89PNG") {
            "image/png"
        } else if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            "image/jpeg"
        } else if data.len() >= 12 && data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
            "image/webp"
        } else {
            DEFAULT_RENDER_MIME
        };
        Self::new(data, mime_type)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DetailImage {
    pub image: ImageInput,
    pub label: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Quality {
    #[default]
    #[serde(rename = "1K")]
    OneK,
    #[serde(rename = "2K")]
    TwoK,
}

impl Quality {
    /// Anything other than `1K`/`2K` becomes `default`.
    pub fn parse_or(raw: Option<&str>, default: Quality) -> Self {
        match raw.map(str::trim) {
            Some("1K") => Self::OneK,
            Some("2K") => Self::TwoK,
            _ => default,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OneK => "1K",
            Self::TwoK => "2K",
        }
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    FlatLay,
    Standing,
    #[default]
    Angled,
}

impl Orientation {
    /// Total: unrecognised values (and absence) map to `Angled`.
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "flat_lay" => Self::FlatLay,
            "standing" => Self::Standing,
            _ => Self::Angled,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FlatLay => "flat_lay",
            Self::Standing => "standing",
            Self::Angled => "angled",
        }
    }

    /// Name of the composition template for this orientation.
    pub fn composition_template(&self) -> &'static str {
        match self {
            Self::FlatLay => builtin::COMPOSITION_FLAT_LAY,
            Self::Standing => builtin::COMPOSITION_STANDING,
            Self::Angled => builtin::COMPOSITION_ANGLED,
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Lighting {
    /// Scheme id as requested; recorded in analytics even when literal text was supplied.
    pub scheme_id: String,
    pub text: String,
}

/// Canonical generation input. Built once by the normalizer and only read
/// afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub product: ImageInput,
    pub background: Option<ImageInput>,
    /// Pre-rendered background supplied by the client.
    pub cached_background: Option<ImageInput>,
    pub master: Option<ImageInput>,
    pub details: Vec<DetailImage>,
    pub quality: Quality,
    pub orientation: Orientation,
    pub lighting: Lighting,
    pub background_description: String,
    pub material_scale: String,
    pub product_dimensions: String,
    pub visible_text: String,
    pub master_style: String,
    pub has_branding: bool,
}

impl GenerationRequest {
    pub fn new(product: ImageInput) -> Self {
        Self {
            product,
            background: None,
            cached_background: None,
            master: None,
            details: Vec::new(),
            quality: Quality::default(),
            orientation: Orientation::default(),
            lighting: Lighting {
                scheme_id: DEFAULT_LIGHTING_SCHEME.to_string(),
                text: String::new(),
            },
            background_description: String::new(),
            material_scale: String::new(),
            product_dimensions: String::new(),
            visible_text: String::new(),
            master_style: String::new(),
            has_branding: false,
        }
    }

    /// Background reproduction is requested by uploading a reference image
    /// together with the branding flag.
    pub fn wants_background_reproduction(&self) -> bool {
        self.background.is_some() && self.has_branding
    }

    pub fn visible_text(&self) -> Option<&str> {
        Some(self.visible_text.as_str()).filter(|text| !text.trim().is_empty())
    }

    pub fn detail_labels(&self) -> impl Iterator<Item = &str> {
        self.details.iter().map(|detail| detail.label.as_str())
    }
}
