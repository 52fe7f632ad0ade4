use crate::{error::ApiError, state::AppState};
use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};

/// Pull the visitor's text out of a request body. Anything other than a JSON object with a
/// string `message` is rejected before the model is called.
fn extract_message(body: &[u8]) -> Result<String, ApiError> {
    let payload: Value = serde_json::from_slice(body).map_err(|_| ApiError::MissingMessage)?;
    payload
        .get("message")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or(ApiError::MissingMessage)
}

async fn get_response(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let message = extract_message(&body)?;
    tracing::info!("Received message: {}", message);

    let response = state.agent.run(&message).await?;
    tracing::info!("Sending response: {}", response);

    Ok(Json(json!({ "response": response })))
}

async fn preflight() -> StatusCode {
    StatusCode::NO_CONTENT
}

// Configure routes for this module
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/get_response", post(get_response).options(preflight))
        .with_state(state)
}
