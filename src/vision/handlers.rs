use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::header,
    response::IntoResponse,
    routing::post,
    Router,
};
use bytes::Bytes;
use tracing::{error, instrument, warn};

use crate::{
    error::{ApiError, ApiResult},
    state::AppState,
    vision::annotate,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/process_image/", post(process_image))
        .layer(DefaultBodyLimit::max(20 * 1024 * 1024)) // 20MB
}

/// Run detection over an uploaded image and return it annotated.
///
/// Every internal fault collapses to the same generic 500; the cause is
/// logged but never sent to the client.
#[instrument(skip(state, multipart))]
pub async fn process_image(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<impl IntoResponse> {
    let mut upload: Option<Bytes> = None;
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        warn!(error = %e, "malformed multipart body");
        ApiError::Processing
    })? {
        if field.name() == Some("file") {
            upload = Some(field.bytes().await.map_err(|e| {
                warn!(error = %e, "failed to read upload");
                ApiError::Processing
            })?);
            break;
        }
    }
    let Some(image_bytes) = upload else {
        warn!("multipart body has no 'file' field");
        return Err(ApiError::Processing);
    };

    let faces = state.vision.detect(image_bytes.clone()).await.map_err(|e| {
        error!(error = %e, "face detection failed");
        ApiError::Processing
    })?;
    if faces.is_empty() {
        warn!("no face detected in upload");
        return Err(ApiError::Processing);
    }

    let rendered = annotate::render_jpeg(&image_bytes, &faces).map_err(|e| {
        error!(error = %e, "annotation failed");
        ApiError::Processing
    })?;

    Ok(([(header::CONTENT_TYPE, "image/jpeg")], rendered))
}
