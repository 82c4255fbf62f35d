use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};

use crate::error::RecorderError;
use crate::form::PlateauForm;
use crate::recorder::SUCCESS_MESSAGE;

use super::AppState;

/**
 * POST /plateau - Record how long a plateau lasted
 *
 * Expected Input (application/x-www-form-urlencoded or multipart/form-data):
 *   plateau_number=5&duration_seconds=12.5
 *
 * Both fields are optional; missing or non-numeric values are stored as zero.
 * Bodies that are not multipart are parsed as urlencoded whatever their
 * Content-Type, so an unrelated body records zeros.
 *
 * Output (text/plain):
 *   200 "Record inserted successfully"
 *   500 "Error: <database error>"
 *   503 "Connection failed: <database error>"
 */
pub async fn post(State(state): State<AppState>, form: PlateauForm) -> Result<&'static str, RecorderError> {
    state.recorder.record(form).await?;
    Ok(SUCCESS_MESSAGE)
}

/// POST /plateau.php - Same as `POST /plateau`, but failures are answered
/// with 200 and the text body, which is what existing dashboard clients expect
pub async fn post_legacy(State(state): State<AppState>, form: PlateauForm) -> Response {
    match state.recorder.record(form).await {
        Ok(_) => SUCCESS_MESSAGE.into_response(),
        Err(e) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            e.to_string(),
        )
            .into_response(),
    }
}
