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

//! The single continuation endpoint.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::debug;

use rebuttal_core::DebateError;

use crate::api::{ApiError, AppState};

#[derive(Debug, Deserialize)]
pub struct MessageIn {
    pub conversation_id: Option<i64>,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct MessageOut {
    pub role: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ConversationOut {
    pub conversation_id: i64,
    pub message: Vec<MessageOut>,
}

/// POST /messages — start (201) or continue (200) a debate.
pub async fn post_messages(
    State(state): State<AppState>,
    Json(body): Json<MessageIn>,
) -> Result<impl IntoResponse, ApiError> {
    debug!(conversation = ?body.conversation_id, "inbound message");

    let outcome = tokio::time::timeout(
        state.request_timeout,
        state.service.handle(body.conversation_id, &body.message),
    )
    .await
    .map_err(|_| DebateError::LlmTimeout("response generation timed out".into()))??;

    let status = if outcome.started {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    let response = ConversationOut {
        conversation_id: outcome.conversation_id,
        message: outcome
            .messages
            .into_iter()
            .map(|m| MessageOut {
                role: m.role.as_str().to_string(),
                message: m.text,
            })
            .collect(),
    };
    Ok((status, Json(response)))
}
