use std::sync::{Arc, Mutex};

use serde::Serialize;
use time::OffsetDateTime;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use super::{
    encoder::{self, AnalysisEncoding, AnalysisFields},
    error::AnalysisError,
    normalizer::{self, AnalysisResult},
    webhook::AnalysisWebhook,
};
use crate::images::upload::UploadedImage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisState {
    Idle,
    Encoding,
    Submitting,
    Normalizing,
    Completed,
    FailedWithFallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Checkpoint {
    pub state: AnalysisState,
    pub percent: u8,
}

/// Receives UI progress; carries no correctness contract.
pub trait ProgressSink: Send + Sync {
    fn report(&self, state: AnalysisState, percent: u8);
}

/// Records checkpoints, clamping percentages so they never go backwards.
#[derive(Debug, Default)]
pub struct ProgressLog {
    entries: Mutex<Vec<Checkpoint>>,
}

impl ProgressLog {
    pub fn checkpoints(&self) -> Vec<Checkpoint> {
        self.entries.lock().map(|e| e.clone()).unwrap_or_default()
    }

    pub fn current_state(&self) -> AnalysisState {
        self.entries
            .lock()
            .ok()
            .and_then(|e| e.last().map(|c| c.state))
            .unwrap_or(AnalysisState::Idle)
    }
}

impl ProgressSink for ProgressLog {
    fn report(&self, state: AnalysisState, percent: u8) {
        if let Ok(mut entries) = self.entries.lock() {
            let floor = entries.last().map(|c| c.percent).unwrap_or(0);
            let percent = percent.clamp(floor, 100);
            tracing::debug!(?state, percent, "analysis progress");
            entries.push(Checkpoint { state, percent });
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum Refusal {
    #[error("Please select an image first.")]
    MissingImage,
    #[error("Sign-in is required before analysing an image.")]
    MissingUser,
}

#[derive(Debug)]
pub enum AnalysisOutcome {
    Completed(AnalysisResult),
    /// The attempt failed. `fallback` is a placeholder the caller may show.
    Failed {
        error: AnalysisError,
        fallback: AnalysisResult,
    },
}

impl AnalysisOutcome {
    pub fn state(&self) -> AnalysisState {
        match self {
            AnalysisOutcome::Completed(_) => AnalysisState::Completed,
            AnalysisOutcome::Failed { .. } => AnalysisState::FailedWithFallback,
        }
    }
}

/// Runs encode -> submit -> normalize for one selected image.
#[derive(Clone)]
pub struct AnalysisOrchestrator {
    webhook: Arc<dyn AnalysisWebhook>,
    endpoint: Option<String>,
}

impl AnalysisOrchestrator {
    pub fn new(webhook: Arc<dyn AnalysisWebhook>, endpoint: Option<String>) -> Self {
        Self { webhook, endpoint }
    }

    /// Refuses without a selected image or user; otherwise never fails hard.
    #[instrument(skip(self, image, progress))]
    pub async fn analyze(
        &self,
        image: Option<&UploadedImage>,
        user_id: Option<Uuid>,
        encoding: AnalysisEncoding,
        progress: &dyn ProgressSink,
    ) -> Result<AnalysisOutcome, Refusal> {
        let user_id = user_id.ok_or(Refusal::MissingUser)?;
        let image = image.ok_or(Refusal::MissingImage)?;

        let outcome = match self.run(image, user_id, encoding, progress).await {
            Ok(result) => {
                info!(%user_id, food = %result.food_name, calories = result.calories, "analysis completed");
                progress.report(AnalysisState::Completed, 100);
                AnalysisOutcome::Completed(result)
            }
            Err(error) => {
                warn!(%user_id, kind = error.kind(), error = %error, "analysis failed, using placeholder");
                progress.report(AnalysisState::FailedWithFallback, 100);
                let fallback = AnalysisResult::placeholder(&mut rand::thread_rng());
                AnalysisOutcome::Failed { error, fallback }
            }
        };
        Ok(outcome)
    }

    async fn run(
        &self,
        image: &UploadedImage,
        user_id: Uuid,
        encoding: AnalysisEncoding,
        progress: &dyn ProgressSink,
    ) -> Result<AnalysisResult, AnalysisError> {
        progress.report(AnalysisState::Encoding, 0);
        let Some(endpoint) = self.endpoint.as_deref() else {
            error!("analysis webhook URL is not configured");
            return Err(AnalysisError::Configuration);
        };

        let fields = AnalysisFields::for_image(image, Some(user_id), OffsetDateTime::now_utc());
        let body = encoder::encode(encoding, image, &fields)?;
        progress.report(AnalysisState::Encoding, 30);

        progress.report(AnalysisState::Submitting, 60);
        let raw = self.webhook.submit(Some(endpoint), body).await?;

        progress.report(AnalysisState::Normalizing, 80);
        normalizer::normalize(&raw)
    }
}
