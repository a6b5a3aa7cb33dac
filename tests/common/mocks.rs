#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use studio_lights::{
    Error, Result,
    cache::CacheBackend,
    gemini::{ContentRequest, ContentResponse, GenerativeModel, ModelKind, Part},
    records::RecordStore,
};

pub const RENDERED_PNG: &[u8] = b"\x89PNG\r\n\x1a\nrendered";
pub const JUDGE_PASS: &str = "{\"pass\": true, \"issues\": []}";

/// One scripted model reply.
#[derive(Debug, Clone)]
pub enum Reply {
    Image(Vec<u8>),
    /// An image the model labels with its own mime type.
    ImageAs(&'static str, Vec<u8>),
    Text(String),
    Fail(String),
}

impl Reply {
    fn into_response(self) -> Result<ContentResponse> {
        match self {
            Reply::Image(data) => Ok(ContentResponse {
                parts: vec![Part::text("Here you go"), Part::image("image/png", data)],
            }),
            Reply::ImageAs(mime_type, data) => Ok(ContentResponse {
                parts: vec![Part::image(mime_type, data)],
            }),
            Reply::Text(text) => Ok(ContentResponse {
                parts: vec![Part::text(text)],
            }),
            Reply::Fail(message) => Err(Error::generation(message)),
        }
    }
}

/// Model double that routes by [`ModelKind`]. Queued replies are consumed
/// first; once a queue is empty the standing reply repeats.
#[derive(Debug)]
pub struct MockGenerativeModel {
    image_queue: Mutex<VecDeque<Reply>>,
    image_reply: Reply,
    judge_queue: Mutex<VecDeque<Reply>>,
    judge_reply: Reply,
    pub requests: Arc<Mutex<Vec<ContentRequest>>>,
}

impl MockGenerativeModel {
    pub fn new() -> Self {
        Self {
            image_queue: Mutex::new(VecDeque::new()),
            image_reply: Reply::Image(RENDERED_PNG.to_vec()),
            judge_queue: Mutex::new(VecDeque::new()),
            judge_reply: Reply::Text(JUDGE_PASS.to_string()),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_image_reply(mut self, reply: Reply) -> Self {
        self.image_reply = reply;
        self
    }

    pub fn with_judge_reply(mut self, reply: Reply) -> Self {
        self.judge_reply = reply;
        self
    }

    pub fn queue_image(self, reply: Reply) -> Self {
        self.image_queue.lock().unwrap().push_back(reply);
        self
    }

    pub fn queue_judge(self, reply: Reply) -> Self {
        self.judge_queue.lock().unwrap().push_back(reply);
        self
    }

    pub fn get_requests(&self) -> Vec<ContentRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn image_requests(&self) -> Vec<ContentRequest> {
        self.requests_of(ModelKind::Image)
    }

    pub fn judge_requests(&self) -> Vec<ContentRequest> {
        self.requests_of(ModelKind::Analysis)
    }

    pub fn image_calls(&self) -> usize {
        self.image_requests().len()
    }

    pub fn judge_calls(&self) -> usize {
        self.judge_requests().len()
    }

    fn requests_of(&self, kind: ModelKind) -> Vec<ContentRequest> {
        self.get_requests()
            .into_iter()
            .filter(|request| request.kind == kind)
            .collect()
    }
}

impl Default for MockGenerativeModel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GenerativeModel for MockGenerativeModel {
    async fn generate_content(&self, request: ContentRequest) -> Result<ContentResponse> {
        let kind = request.kind;
        self.requests.lock().unwrap().push(request);

        let reply = match kind {
            ModelKind::Image => self
                .image_queue
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| self.image_reply.clone()),
            ModelKind::Analysis => self
                .judge_queue
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| self.judge_reply.clone()),
        };
        reply.into_response()
    }
}

/// Table store double keyed by table name. Filters are applied as string
/// equality against the row's fields.
#[derive(Debug, Default)]
pub struct MockRecordStore {
    pub tables: Mutex<HashMap<String, Vec<Value>>>,
    pub inserts: Arc<Mutex<Vec<(String, Value)>>>,
    pub selects: Arc<Mutex<Vec<String>>>,
    pub error: Option<String>,
}

impl MockRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(self, table: &str, rows: Vec<Value>) -> Self {
        self.tables
            .lock()
            .unwrap()
            .entry(table.to_string())
            .or_default()
            .extend(rows);
        self
    }

    pub fn with_error(mut self, error: &str) -> Self {
        self.error = Some(error.to_string());
        self
    }

    pub fn select_count(&self) -> usize {
        self.selects.lock().unwrap().len()
    }

    pub fn get_inserts(&self) -> Vec<(String, Value)> {
        self.inserts.lock().unwrap().clone()
    }
}

fn field_matches(row: &Value, column: &str, expected: &str) -> bool {
    match row.get(column) {
        Some(Value::String(actual)) => actual == expected,
        Some(Value::Bool(actual)) => actual.to_string() == expected,
        Some(other) => other.to_string() == expected,
        None => false,
    }
}

#[async_trait]
impl RecordStore for MockRecordStore {
    async fn select(
        &self,
        table: &str,
        _columns: &str,
        filters: &[(&str, &str)],
    ) -> Result<Vec<Value>> {
        self.selects.lock().unwrap().push(table.to_string());
        if let Some(ref error) = self.error {
            return Err(Error::records(error.clone()));
        }

        let tables = self.tables.lock().unwrap();
        Ok(tables
            .get(table)
            .map(|rows| {
                rows.iter()
                    .filter(|row| {
                        filters
                            .iter()
                            .all(|(column, value)| field_matches(row, column, value))
                    })
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn insert(&self, table: &str, row: Value) -> Result<()> {
        if let Some(ref error) = self.error {
            return Err(Error::records(error.clone()));
        }
        self.inserts.lock().unwrap().push((table.to_string(), row));
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        match self.error {
            Some(ref error) => Err(Error::records(error.clone())),
            None => Ok(()),
        }
    }
}

/// Cache backend whose every call fails.
#[derive(Debug, Default)]
pub struct FailingCacheBackend;

#[async_trait]
impl CacheBackend for FailingCacheBackend {
    async fn get(&self, _key: &str) -> Result<Option<String>> {
        Err(Error::cache("connection refused"))
    }

    async fn set(&self, _key: &str, _value: &str, _ttl: Duration) -> Result<()> {
        Err(Error::cache("connection refused"))
    }

    async fn delete(&self, _key: &str) -> Result<()> {
        Err(Error::cache("connection refused"))
    }

    async fn exists(&self, _key: &str) -> Result<bool> {
        Err(Error::cache("connection refused"))
    }

    async fn ping(&self) -> Result<()> {
        Err(Error::cache("connection refused"))
    }
}
