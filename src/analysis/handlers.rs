use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use tracing::{info, instrument, warn};

use super::{
    dto::{AnalyzeQuery, AnalyzeResponse, ErrorBody},
    orchestrator::{AnalysisOutcome, ProgressLog, Refusal},
};
use crate::{auth::extractors::AuthUser, state::AppState};

pub fn analysis_routes() -> Router<AppState> {
    Router::new().route("/analysis", post(analyze_image))
}

/// POST /analysis?encoding=multipart|json
/// Analyses the caller's currently selected image.
#[instrument(skip(state, user))]
pub async fn analyze_image(
    State(state): State<AppState>,
    user: Option<AuthUser>,
    Query(q): Query<AnalyzeQuery>,
) -> Result<(StatusCode, Json<AnalyzeResponse>), (StatusCode, String)> {
    let user_id = user.map(|AuthUser(u)| u.id);
    let guard = match user_id {
        Some(id) => Some(
            state
                .uploads
                .begin_analysis(id)
                .map_err(|e| (StatusCode::CONFLICT, e.to_string()))?,
        ),
        None => None,
    };
    let image = guard.as_ref().and_then(|g| g.image());

    let encoding = q.encoding.unwrap_or(state.config.analysis.default_encoding);
    let progress = ProgressLog::default();
    let outcome = state
        .analysis
        .analyze(image, user_id, encoding, &progress)
        .await
        .map_err(|refusal| {
            warn!(reason = %refusal, "analysis refused");
            let status = match refusal {
                Refusal::MissingUser => StatusCode::UNAUTHORIZED,
                Refusal::MissingImage => StatusCode::BAD_REQUEST,
            };
            (status, refusal.to_string())
        })?;

    let state_label = progress.current_state();
    let checkpoints = progress.checkpoints();
    let (status, result, error) = match outcome {
        AnalysisOutcome::Completed(result) => (StatusCode::OK, Some(result), None),
        AnalysisOutcome::Failed { error, fallback } => {
            let body = ErrorBody::from(&error);
            if state.config.analysis.fallback_placeholder {
                (StatusCode::OK, Some(fallback), Some(body))
            } else {
                (StatusCode::BAD_GATEWAY, None, Some(body))
            }
        }
    };

    // A failed attempt without placeholder still replaces the previous result.
    if let Some(guard) = guard.as_ref() {
        guard.record(result.clone());
    }
    info!(state = ?state_label, %encoding, %status, "analysis request finished");

    Ok((
        status,
        Json(AnalyzeResponse {
            state: state_label,
            encoding,
            result,
            error,
            progress: checkpoints,
        }),
    ))
}
