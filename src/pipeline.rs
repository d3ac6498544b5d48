//! Generation orchestrator.
//!
//! Drives one run from a topic to a content record plus images:
//!
//! ```text
//! idle ──submit──▶ generating-content ──ok──▶ generating-images ──all attempted──▶ done
//!                         │
//!                         └──failure──▶ error
//! ```
//!
//! All state lives in a [`Run`] record; the transition methods on it are the
//! only way the state changes, and [`generate`] is the only driver. There are
//! no globals and nothing runs concurrently: one content request, then the
//! image prompts strictly in order, at most one request in flight, with a
//! fixed pause before every image request after the first.
//!
//! An image that fails is skipped. Only the content request can put the run
//! into `error`.
//!
//! ## Progress
//!
//! Observers get [`RunEvent`]s over an optional `std::sync::mpsc` channel as
//! each step starts and finishes, so partial results (the article before any
//! image exists, images one by one) can be shown while the run continues.

use crate::backend::GenerativeBackend;
use crate::config::GeneratorConfig;
use crate::content::{self, GenerationError};
use crate::illustrate::{self, Illustration};
use crate::types::{GeneratedData, Image};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::mpsc::Sender;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

/// Number of sections and image prompts the content schema asks for.
pub const EXPECTED_ITEMS: usize = 3;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("topic must not be blank")]
    BlankTopic,
    #[error("a run is already in progress")]
    RunInProgress,
    #[error(transparent)]
    Generation(#[from] GenerationError),
}

/// Where a run is in its lifecycle.
///
/// `generating-images` is skipped when there is no image to attempt
/// (no prompts, or `images.count = 0`): content success then moves the run
/// from `generating-content` straight to `done`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "kebab-case")]
pub enum RunState {
    Idle,
    GeneratingContent,
    GeneratingImages { attempted: usize, total: usize },
    Done,
    Error { message: String },
}

/// The current run: inputs, state and whatever results exist so far.
///
/// Replaced wholesale by the next [`Run::submit`]. Serializable so a finished
/// run can be saved and packaged again later without regenerating.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Run {
    pub topic: String,
    pub redirect_url: String,
    pub state: RunState,
    pub data: Option<GeneratedData>,
    /// Images in prompt order, failed prompts leave no gap.
    pub images: Vec<Image>,
}

impl Default for Run {
    fn default() -> Self {
        Self {
            topic: String::new(),
            redirect_url: String::new(),
            state: RunState::Idle,
            data: None,
            images: Vec::new(),
        }
    }
}

impl Run {
    pub fn is_busy(&self) -> bool {
        matches!(
            self.state,
            RunState::GeneratingContent | RunState::GeneratingImages { .. }
        )
    }

    pub fn is_done(&self) -> bool {
        self.state == RunState::Done
    }

    /// `idle | done | error → generating-content`. Clears prior results.
    pub fn submit(&mut self, topic: &str, redirect_url: &str) -> Result<(), PipelineError> {
        if self.is_busy() {
            return Err(PipelineError::RunInProgress);
        }
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(PipelineError::BlankTopic);
        }
        *self = Run {
            topic: topic.to_string(),
            redirect_url: redirect_url.trim().to_string(),
            state: RunState::GeneratingContent,
            data: None,
            images: Vec::new(),
        };
        Ok(())
    }

    /// `generating-content → generating-images`, or straight to `done` when
    /// there is nothing to illustrate. The record is readable from here on.
    pub fn content_ready(&mut self, data: GeneratedData, total_images: usize) {
        self.data = Some(data);
        self.state = if total_images == 0 {
            RunState::Done
        } else {
            RunState::GeneratingImages {
                attempted: 0,
                total: total_images,
            }
        };
    }

    /// `generating-content → error`.
    pub fn content_failed(&mut self, message: impl Into<String>) {
        self.state = RunState::Error {
            message: message.into(),
        };
    }

    /// Record one image attempt; the last one moves the run to `done`.
    pub fn image_attempted(&mut self, outcome: Illustration) {
        if let Some(image) = outcome.into_image() {
            self.images.push(image);
        }
        if let RunState::GeneratingImages { attempted, total } = self.state {
            let attempted = attempted + 1;
            self.state = if attempted >= total {
                RunState::Done
            } else {
                RunState::GeneratingImages { attempted, total }
            };
        }
    }

    /// Load a run saved with [`Run::save`].
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
    }
}

/// Models and pacing for one run.
#[derive(Debug, Clone)]
pub struct GenerationSettings {
    pub content_model: String,
    pub image_model: String,
    /// Upper bound on image prompts used.
    pub max_images: usize,
    /// Pause before every image request after the first.
    pub image_delay: Duration,
}

impl GenerationSettings {
    pub fn from_config(config: &GeneratorConfig) -> Self {
        Self {
            content_model: config.api.content_model.clone(),
            image_model: config.api.image_model.clone(),
            max_images: config.images.count,
            image_delay: config.images.delay(),
        }
    }
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self::from_config(&GeneratorConfig::default())
    }
}

/// Progress notifications for observers.
#[derive(Debug, Clone, PartialEq)]
pub enum RunEvent {
    ContentStarted {
        topic: String,
    },
    ContentReady {
        title: String,
        sections: usize,
        prompts: usize,
    },
    Waiting {
        delay: Duration,
    },
    ImageStarted {
        index: usize,
        total: usize,
        prompt: String,
    },
    ImageFinished {
        index: usize,
        total: usize,
        obtained: bool,
    },
    Finished {
        images: usize,
    },
    Failed {
        message: String,
    },
}

fn emit(events: &Option<Sender<RunEvent>>, event: RunEvent) {
    if let Some(tx) = events {
        // A gone receiver only means nobody is watching.
        let _ = tx.send(event);
    }
}

/// Execute a run end to end.
///
/// Returns `Err` only when the run could not start or content generation
/// failed; in the latter case `run.state` is `error` with the same message.
/// Image failures never surface here, only as fewer entries in `run.images`.
pub async fn generate(
    backend: &impl GenerativeBackend,
    settings: &GenerationSettings,
    run: &mut Run,
    topic: &str,
    redirect_url: &str,
    events: Option<Sender<RunEvent>>,
) -> Result<(), PipelineError> {
    run.submit(topic, redirect_url)?;
    emit(
        &events,
        RunEvent::ContentStarted {
            topic: run.topic.clone(),
        },
    );

    let data =
        match content::generate_content(backend, &settings.content_model, &run.topic).await {
            Ok(data) => data,
            Err(e) => {
                let message = e.to_string();
                run.content_failed(message.clone());
                emit(&events, RunEvent::Failed { message });
                return Err(e.into());
            }
        };

    if data.sections.len() != EXPECTED_ITEMS || data.image_prompts.len() != EXPECTED_ITEMS {
        warn!(
            sections = data.sections.len(),
            prompts = data.image_prompts.len(),
            "content does not match the requested cardinality; using it as returned"
        );
    }

    let prompts: Vec<String> = data
        .image_prompts
        .iter()
        .take(settings.max_images)
        .cloned()
        .collect();
    let total = prompts.len();

    emit(
        &events,
        RunEvent::ContentReady {
            title: data.title.clone(),
            sections: data.sections.len(),
            prompts: data.image_prompts.len(),
        },
    );
    run.content_ready(data, total);

    for (i, prompt) in prompts.iter().enumerate() {
        if i > 0 {
            emit(
                &events,
                RunEvent::Waiting {
                    delay: settings.image_delay,
                },
            );
            tokio::time::sleep(settings.image_delay).await;
        }

        let index = i + 1;
        emit(
            &events,
            RunEvent::ImageStarted {
                index,
                total,
                prompt: prompt.clone(),
            },
        );
        let outcome = illustrate::illustrate(backend, &settings.image_model, prompt).await;
        let obtained = outcome.is_obtained();
        run.image_attempted(outcome);
        emit(
            &events,
            RunEvent::ImageFinished {
                index,
                total,
                obtained,
            },
        );
    }

    info!(
        images = run.images.len(),
        attempted = total,
        "generation run finished"
    );
    emit(
        &events,
        RunEvent::Finished {
            images: run.images.len(),
        },
    );
    Ok(())
}
