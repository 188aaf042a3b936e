use super::{ApiError, ApiResult};
use crate::config::AppState;
use axum::{extract::State, Json};
use nexussync_core::{ConversionResult, TerminalOutput};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Convert natural-language input into a terminal command
pub async fn convert(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ConvertRequest>,
) -> ApiResult<Json<ConvertResponse>> {
    let text = req
        .text
        .filter(|text| !text.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("Input is required".to_string()))?;

    let conversion = state.resolver.resolve(&text).await;
    tracing::info!(
        "Converted input to '{}' via {}",
        conversion.command,
        conversion.method
    );

    Ok(Json(ConvertResponse {
        success: true,
        conversion,
    }))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ConvertRequest {
    #[serde(default, alias = "input")]
    pub text: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ConvertResponse {
    pub success: bool,
    #[serde(flatten)]
    pub conversion: ConversionResult,
}

/// Run a terminal command
pub async fn execute(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ExecuteRequest>,
) -> ApiResult<Json<TerminalOutput>> {
    let command = req
        .command
        .filter(|command| !command.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("Command is required".to_string()))?;

    Ok(Json(state.terminal.run(&command).await))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ExecuteRequest {
    #[serde(default)]
    pub command: Option<String>,
}
