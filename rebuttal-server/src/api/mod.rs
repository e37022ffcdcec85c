// Copyright 2025 Rebuttal (https://github.com/rebuttal)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! HTTP API surface.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

use rebuttal_core::DebateError;

use crate::service::MessageService;

pub mod health;
pub mod messages;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<MessageService>,
    pub request_timeout: Duration,
}

/// Transport wrapper for domain errors.
#[derive(Debug)]
pub struct ApiError(pub DebateError);

impl From<DebateError> for ApiError {
    fn from(err: DebateError) -> Self {
        ApiError(err)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match &self.0 {
            DebateError::InvalidStartMessage(_) | DebateError::InvalidContinuationMessage(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            DebateError::ConversationNotFound(_) | DebateError::ConversationExpired(_) => {
                StatusCode::NOT_FOUND
            }
            DebateError::LlmTimeout(_) => StatusCode::SERVICE_UNAVAILABLE,
            DebateError::LlmServiceError(_) => StatusCode::BAD_GATEWAY,
            DebateError::NliFailure(_) => StatusCode::SERVICE_UNAVAILABLE,
            DebateError::StateMissing(_)
            | DebateError::StateExists(_)
            | DebateError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = json!({
            "detail": self.0.to_string(),
            "code": self.0.code(),
        });
        (status, Json(body)).into_response()
    }
}
