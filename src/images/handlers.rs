use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{
    dto::{SelectionResponse, UploadResponse},
    upload::UploadedImage,
};
use crate::{auth::extractors::AuthUser, state::AppState};

pub fn upload_routes(body_limit: usize) -> Router<AppState> {
    Router::new()
        .route(
            "/uploads",
            post(select_image).get(get_selection).delete(remove_image),
        )
        .layer(DefaultBodyLimit::max(body_limit))
}

pub fn preview_routes() -> Router<AppState> {
    Router::new().route("/previews/:id", get(get_preview))
}

/// POST /uploads (multipart)
/// Field `image`: the file. Replaces any previous selection.
#[instrument(skip(state, user, mp))]
pub async fn select_image(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    mut mp: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>), (StatusCode, String)> {
    let mut image = None;
    while let Some(field) = mp
        .next_field()
        .await
        .map_err(|e| (e.status(), format!("invalid multipart body: {}", e.body_text())))?
    {
        if field.name() != Some("image") {
            continue;
        }
        let content_type = field
            .content_type()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "application/octet-stream".into());
        let file_name = field.file_name().map(|s| s.to_string());
        let data = field
            .bytes()
            .await
            .map_err(|e| (e.status(), format!("failed to read image: {}", e.body_text())))?;

        image = Some(
            UploadedImage::new(data, &content_type, file_name.as_deref()).map_err(|e| {
                warn!(user_id = %user.id, error = %e, "image rejected");
                (StatusCode::UNSUPPORTED_MEDIA_TYPE, e.to_string())
            })?,
        );
        break;
    }

    let image = image.ok_or((StatusCode::BAD_REQUEST, "image is required".to_string()))?;
    let summary = image.summary();
    let preview_url = state.uploads.select(user.id, image);
    info!(user_id = %user.id, file = %summary.file_name, size = summary.size, "image selected");

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            image: summary,
            preview_url,
        }),
    ))
}

#[instrument(skip(state, user))]
pub async fn get_selection(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Json<SelectionResponse> {
    let view = state.uploads.view(user.id);
    Json(SelectionResponse {
        image: view.image.as_ref().map(UploadedImage::summary),
        preview_url: view.preview_url,
        last_result: view.last_result,
    })
}

#[instrument(skip(state, user))]
pub async fn remove_image(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> StatusCode {
    if state.uploads.remove(user.id) {
        info!(user_id = %user.id, "image removed");
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

/// Preview bytes; 404 once the owning selection has been replaced or removed.
#[instrument(skip(state))]
pub async fn get_preview(State(state): State<AppState>, Path(id): Path<Uuid>) -> Response {
    match state.uploads.previews().get(id) {
        Some(entry) => (
            [
                (header::CONTENT_TYPE, entry.content_type),
                (header::CACHE_CONTROL, "no-store".to_string()),
            ],
            entry.body,
        )
            .into_response(),
        None => (StatusCode::NOT_FOUND, "Preview not found").into_response(),
    }
}
