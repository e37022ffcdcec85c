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

//! HTTP client for a hosted multilingual NLI classifier.
//!
//! Speaks the text-classification wire shape used by Hugging Face inference
//! servers: the request carries `{"inputs": {"text": premise, "text_pair":
//! hypothesis}}` and the response is a list of `{label, score}` entries
//! (possibly nested one level). Label vocabulary is normalized on parse and
//! the surviving probabilities are renormalized to sum to 1.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::{normalize_label, NliError, NliProvider, NliScores};
use rebuttal_core::text::truncate_chars;

/// Characters budgeted per input token. The token cap is enforced
/// server-side; this keeps request bodies bounded without a tokenizer.
const CHARS_PER_TOKEN: usize = 6;

#[derive(Debug, Deserialize)]
struct LabelScore {
    label: String,
    score: f64,
}

/// Remote NLI provider over a text-classification endpoint.
pub struct RemoteNliProvider {
    endpoint: String,
    api_token: Option<String>,
    max_length: usize,
    client: reqwest::Client,
}

impl RemoteNliProvider {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_token: None,
            max_length: 512,
            client: reqwest::Client::new(),
        }
    }

    pub fn with_api_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }

    /// Token cap applied to each input before the call (default 512).
    pub fn with_max_length(mut self, max_length: usize) -> Self {
        self.max_length = max_length;
        self
    }

    fn truncate(&self, text: &str) -> String {
        truncate_chars(text, self.max_length * CHARS_PER_TOKEN)
    }

    fn parse_scores(&self, body: &serde_json::Value) -> Result<NliScores, NliError> {
        // Responses come as [{label, score}…] or [[{label, score}…]].
        let entries = match body.as_array() {
            Some(outer) if outer.first().map(|v| v.is_array()).unwrap_or(false) => {
                outer[0].as_array().cloned().unwrap_or_default()
            }
            Some(outer) => outer.clone(),
            None => {
                return Err(NliError::MalformedResponse(format!(
                    "expected a list of label scores, got: {}",
                    body
                )))
            }
        };

        let mut scores = NliScores::default();
        let mut seen = 0usize;
        for entry in entries {
            let parsed: LabelScore = serde_json::from_value(entry)?;
            let Some(label) = normalize_label(&parsed.label) else {
                debug!(label = %parsed.label, "dropping unrecognized classifier label");
                continue;
            };
            match label {
                "entailment" => scores.entailment = parsed.score,
                "neutral" => scores.neutral = parsed.score,
                "contradiction" => scores.contradiction = parsed.score,
                _ => unreachable!("normalize_label only yields canonical labels"),
            }
            seen += 1;
        }

        if seen == 0 {
            return Err(NliError::MalformedResponse(
                "no recognizable NLI labels in classifier response".into(),
            ));
        }

        let sum = scores.entailment + scores.neutral + scores.contradiction;
        if sum > 0.0 {
            scores.entailment /= sum;
            scores.neutral /= sum;
            scores.contradiction /= sum;
        }
        Ok(scores)
    }
}

#[async_trait]
impl NliProvider for RemoteNliProvider {
    async fn score(&self, premise: &str, hypothesis: &str) -> Result<NliScores, NliError> {
        let request = json!({
            "inputs": {
                "text": self.truncate(premise),
                "text_pair": self.truncate(hypothesis),
            }
        });

        let mut builder = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .json(&request);
        if let Some(token) = &self.api_token {
            builder = builder.header("Authorization", format!("Bearer {}", token));
        }

        let response = builder.send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(NliError::Inference(format!(
                "classifier returned {}: {}",
                status, error_text
            )));
        }

        let body: serde_json::Value = response.json().await?;
        self.parse_scores(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> RemoteNliProvider {
        RemoteNliProvider::new("http://localhost:9999/classify")
    }

    #[test]
    fn parses_flat_label_list() {
        let body = json!([
            {"label": "ENTAILMENT", "score": 0.1},
            {"label": "neutral", "score": 0.2},
            {"label": "contradiction", "score": 0.7}
        ]);
        let scores = provider().parse_scores(&body).unwrap();
        assert!((scores.contradiction - 0.7).abs() < 1e-9);
        assert!((scores.entailment - 0.1).abs() < 1e-9);
    }

    #[test]
    fn parses_nested_list_and_aliases() {
        let body = json!([[
            {"label": "entailed", "score": 0.25},
            {"label": "neutral", "score": 0.25},
            {"label": "contradictory", "score": 0.5}
        ]]);
        let scores = provider().parse_scores(&body).unwrap();
        assert!((scores.contradiction - 0.5).abs() < 1e-9);
        assert!((scores.entailment - 0.25).abs() < 1e-9);
    }

    #[test]
    fn renormalizes_after_dropping_unknown_labels() {
        let body = json!([
            {"label": "entailment", "score": 0.2},
            {"label": "contradiction", "score": 0.2},
            {"label": "label_7", "score": 0.6}
        ]);
        let scores = provider().parse_scores(&body).unwrap();
        assert!((scores.entailment - 0.5).abs() < 1e-9);
        assert!((scores.contradiction - 0.5).abs() < 1e-9);
    }

    #[test]
    fn rejects_non_list_bodies() {
        let body = json!({"error": "model loading"});
        assert!(matches!(
            provider().parse_scores(&body),
            Err(NliError::MalformedResponse(_))
        ));
    }

    #[test]
    fn rejects_lists_without_known_labels() {
        let body = json!([{"label": "positive", "score": 1.0}]);
        assert!(provider().parse_scores(&body).is_err());
    }

    #[test]
    fn truncation_bounds_request_inputs() {
        let p = provider().with_max_length(2);
        let long = "a".repeat(100);
        let truncated = p.truncate(&long);
        assert!(truncated.chars().count() <= 2 * CHARS_PER_TOKEN + 1);
    }
}
