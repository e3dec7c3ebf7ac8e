use serde::{Deserialize, Serialize};

use crate::protocol::STATUS_FAILURE;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Validation,
    NotFound,
    Conflict,
    #[default]
    Internal,
}

fn failure_status() -> String {
    STATUS_FAILURE.to_string()
}

/// Failure envelope returned by every endpoint: `{"status":"erro","mensagem":...}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    #[serde(default = "failure_status")]
    pub status: String,
    #[serde(rename = "codigo", default)]
    pub code: ErrorCode,
    #[serde(rename = "mensagem")]
    pub message: String,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            status: failure_status(),
            code,
            message: message.into(),
        }
    }
}
