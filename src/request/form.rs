use crate::Result;
use axum::extract::Multipart;
use std::collections::HashMap;
use tracing::debug;

/// Multipart field names carried as files; everything else is text.
pub const FILE_FIELDS: &[&str] = &[
    "image",
    "backgroundImage",
    "cachedBackground",
    "masterImage",
    "detail1",
    "detail2",
    "detail3",
];

#[derive(Debug, Clone, PartialEq)]
pub struct UploadedFile {
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

/// Raw multipart input before normalization.
#[derive(Debug, Clone, Default)]
pub struct RawForm {
    fields: HashMap<String, String>,
    files: HashMap<String, UploadedFile>,
}

impl RawForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn with_file(
        mut self,
        name: impl Into<String>,
        content_type: Option<&str>,
        data: Vec<u8>,
    ) -> Self {
        self.files.insert(
            name.into(),
            UploadedFile {
                content_type: content_type.map(str::to_string),
                data,
            },
        );
        self
    }

    /// Text value, with blank strings treated as absent.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(String::as_str)
            .filter(|value| !value.trim().is_empty())
    }

    /// Uploaded file, with empty uploads treated as absent.
    pub fn file(&self, name: &str) -> Option<&UploadedFile> {
        self.files.get(name).filter(|file| !file.data.is_empty())
    }

    pub async fn from_multipart(mut multipart: Multipart) -> Result<Self> {
        let mut form = Self::new();

        while let Some(field) = multipart.next_field().await? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };

            if FILE_FIELDS.contains(&name.as_str()) {
                let content_type = field.content_type().map(str::to_string);
                let data = field.bytes().await?.to_vec();
                debug!("Received file field {} ({} bytes)", name, data.len());
                form.files.insert(name, UploadedFile { content_type, data });
            } else {
                let value = field.text().await?;
                form.fields.insert(name, value);
            }
        }

        Ok(form)
    }
}
