//! Shared test utilities for the pagesmith test suite.
//!
//! Provides a scripted [`MockBackend`] that stands in for the generative
//! service, plus fixture builders for content records and images.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let backend = MockBackend::new();
//! backend.push_text(&content_json());
//! backend.push_image("image/png", &[1, 2, 3]);
//! backend.push_failure(429);
//!
//! // ... run the pipeline ...
//!
//! assert_eq!(backend.calls().len(), 3);
//! ```

use crate::backend::{
    BackendError, GenerateRequest, GenerateResponse, GenerativeBackend, Part,
};
use crate::types::{ContentSection, GeneratedData, Image};
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::collections::VecDeque;
use std::sync::Mutex;
use tokio::time::Instant;

// =========================================================================
// Mock backend
// =========================================================================

/// One call observed by the mock.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub model: String,
    pub prompt: String,
    /// Virtual-clock instant of the call (`tokio::time`, so paused-clock
    /// tests see the configured delays exactly).
    pub at: Instant,
}

/// Backend that replays queued responses in order and records every call.
///
/// Uses Mutex (not RefCell) so it is Sync, as the trait requires. Calls past
/// the end of the queue fail with HTTP 503.
#[derive(Default)]
pub struct MockBackend {
    responses: Mutex<VecDeque<Result<GenerateResponse, BackendError>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_response(&self, response: GenerateResponse) {
        self.responses.lock().unwrap().push_back(Ok(response));
    }

    /// Queue a text-only response.
    pub fn push_text(&self, text: &str) {
        self.push_response(GenerateResponse::from_parts(vec![Part::text(text)]));
    }

    /// Queue a response carrying one inline image.
    pub fn push_image(&self, mime_type: &str, data: &[u8]) {
        self.push_response(GenerateResponse::from_parts(vec![Part::inline(
            mime_type,
            STANDARD.encode(data),
        )]));
    }

    /// Queue an HTTP failure.
    pub fn push_failure(&self, status: u16) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Err(BackendError::Status {
                status,
                body: "scripted failure".to_string(),
            }));
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerativeBackend for MockBackend {
    async fn generate(
        &self,
        model: &str,
        request: &GenerateRequest,
    ) -> Result<GenerateResponse, BackendError> {
        self.calls.lock().unwrap().push(RecordedCall {
            model: model.to_string(),
            prompt: request.prompt_text(),
            at: Instant::now(),
        });
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(BackendError::Status {
                status: 503,
                body: "no scripted response left".to_string(),
            }))
    }
}

// =========================================================================
// Fixtures
// =========================================================================

/// A complete, schema-conforming content record.
pub fn sample_data() -> GeneratedData {
    GeneratedData {
        title: "人工智能的未来".to_string(),
        introduction: "人工智能正在改变我们的生活方式。".to_string(),
        sections: vec![
            section("发展历程", "从规则系统到深度学习。"),
            section("核心技术", "大模型、多模态与推理。"),
            section("行业应用", "医疗、教育与制造业。"),
        ],
        conclusion: "未来可期。".to_string(),
        image_prompts: vec![
            "a robot reading a book".to_string(),
            "a neural network glowing in the dark".to_string(),
            "a factory floor with robotic arms".to_string(),
        ],
    }
}

/// `sample_data()` serialized the way the content model returns it.
pub fn content_json() -> String {
    serde_json::to_string(&sample_data()).unwrap()
}

pub fn section(heading: &str, content: &str) -> ContentSection {
    ContentSection {
        heading: heading.to_string(),
        content: content.to_string(),
    }
}

/// `n` distinct fake PNG images (payload bytes differ per image).
pub fn sample_images(n: usize) -> Vec<Image> {
    (0..n)
        .map(|i| Image::new("image/png", vec![0x89, b'P', b'N', b'G', i as u8]))
        .collect()
}
