//! The generative AI service, seen from the pipeline.
//!
//! The content and illustration adapters only ever need one capability:
//! send a `generateContent` request to a named model and get the candidate
//! parts back. [`GenerativeBackend`] is that capability. The production
//! implementation is [`GeminiBackend`], which speaks the Gemini REST API over
//! `reqwest`; tests drive the adapters and the orchestrator with a recording
//! mock instead.
//!
//! The module is split into:
//! - **Wire**: request/response shapes of the `generateContent` call
//! - **Gemini**: the HTTP client

mod gemini;
pub mod wire;

pub use gemini::GeminiBackend;
pub use wire::{GenerateRequest, GenerateResponse, InlineData, Part};

use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("API key not set: export {0}")]
    MissingApiKey(String),
}

/// A generative model endpoint.
///
/// Implementations make exactly one outbound request per call and never
/// retry; retry policy (there is none beyond the fixed image delay) belongs
/// to the orchestrator.
#[async_trait]
pub trait GenerativeBackend: Send + Sync {
    async fn generate(
        &self,
        model: &str,
        request: &GenerateRequest,
    ) -> Result<GenerateResponse, BackendError>;
}
