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

//! Server configuration: TOML file > environment > defaults.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;

use rebuttal_core::ConcessionPolicyConfig;
use rebuttal_nli::ScoringConfig;

/// Rebuttal server configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub server: HttpServerConfig,
    #[serde(default)]
    pub debate: DebateConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub nli: NliConfig,
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub policy: ConcessionPolicyConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HttpServerConfig {
    /// HTTP API listen address (e.g., "127.0.0.1:47210")
    #[serde(default = "default_http_addr")]
    pub listen_addr: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Enable CORS
    #[serde(default = "default_enable_cors")]
    pub enable_cors: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DebateConfig {
    /// Window multiplier for returned messages (window = 2 × limit)
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    /// Conversation TTL in minutes
    #[serde(default = "default_expires_minutes")]
    pub expires_minutes: i64,

    /// Points lane: assistant replies required before any verdict
    #[serde(default = "default_min_assistant_turns")]
    pub min_assistant_turns_before_verdict: u32,

    /// Points lane: cumulative PARTIAL/FULL judgements required
    #[serde(default = "default_required_positive_judgements")]
    pub required_positive_judgements: u32,

    /// Language new conversations start in ("auto" locks on first reply)
    #[serde(default = "default_lang")]
    pub default_lang: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LlmConfig {
    /// Primary provider: openai | anthropic | dummy
    #[serde(default)]
    pub provider: String,

    /// Model override; provider default when empty
    #[serde(default)]
    pub model: String,

    /// Prompt variant: easy | medium
    #[serde(default)]
    pub difficulty: String,

    pub openai_api_key: Option<String>,
    pub anthropic_api_key: Option<String>,

    /// Optional second arm for the sequential fallback composite
    pub fallback_provider: Option<String>,
    pub fallback_model: Option<String>,

    /// Per-arm timeout in seconds
    #[serde(default = "default_per_provider_timeout")]
    pub per_provider_timeout_secs: f64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NliConfig {
    /// Text-classification endpoint of the hosted NLI model
    #[serde(default = "default_nli_endpoint")]
    pub endpoint: String,

    pub api_token: Option<String>,

    /// Token cap applied to each input before inference
    #[serde(default = "default_nli_max_length")]
    pub max_length: usize,
}

fn default_http_addr() -> String {
    "127.0.0.1:47210".to_string()
}

fn default_request_timeout() -> u64 {
    25
}

fn default_enable_cors() -> bool {
    true
}

fn default_history_limit() -> usize {
    5
}

fn default_expires_minutes() -> i64 {
    60
}

fn default_min_assistant_turns() -> u32 {
    2
}

fn default_required_positive_judgements() -> u32 {
    3
}

fn default_lang() -> String {
    "auto".to_string()
}

fn default_per_provider_timeout() -> f64 {
    15.0
}

fn default_nli_endpoint() -> String {
    "http://127.0.0.1:8090/classify".to_string()
}

fn default_nli_max_length() -> usize {
    512
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_http_addr(),
            request_timeout_secs: default_request_timeout(),
            enable_cors: default_enable_cors(),
        }
    }
}

impl Default for DebateConfig {
    fn default() -> Self {
        Self {
            history_limit: default_history_limit(),
            expires_minutes: default_expires_minutes(),
            min_assistant_turns_before_verdict: default_min_assistant_turns(),
            required_positive_judgements: default_required_positive_judgements(),
            default_lang: default_lang(),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: String::new(),
            model: String::new(),
            difficulty: String::new(),
            openai_api_key: None,
            anthropic_api_key: None,
            fallback_provider: None,
            fallback_model: None,
            per_provider_timeout_secs: default_per_provider_timeout(),
        }
    }
}

impl Default for NliConfig {
    fn default() -> Self {
        Self {
            endpoint: default_nli_endpoint(),
            api_token: None,
            max_length: default_nli_max_length(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Overlay recognized environment variables onto `self`.
    ///
    /// Supported variables:
    /// - REBUTTAL_HTTP_ADDR: HTTP listen address
    /// - REQUEST_TIMEOUT_S: per-request timeout in seconds
    /// - HISTORY_LIMIT: message window multiplier
    /// - EXPIRES_MINUTES: conversation TTL
    /// - MIN_ASSISTANT_TURNS_BEFORE_VERDICT, REQUIRED_POSITIVE_JUDGEMENTS:
    ///   verdict policy
    /// - LLM_PROVIDER, LLM_MODEL, DIFFICULTY: provider and prompt variant
    /// - LLM_PER_PROVIDER_TIMEOUT_S: fallback per-arm timeout
    /// - OPENAI_API_KEY, ANTHROPIC_API_KEY: provider credentials
    /// - NLI_ENDPOINT, NLI_API_TOKEN: classifier endpoint
    pub fn merge_env(mut self) -> Self {
        if let Ok(addr) = std::env::var("REBUTTAL_HTTP_ADDR") {
            self.server.listen_addr = addr;
        }
        if let Ok(v) = std::env::var("REQUEST_TIMEOUT_S") {
            if let Ok(v) = v.parse() {
                self.server.request_timeout_secs = v;
            }
        }
        if let Ok(v) = std::env::var("HISTORY_LIMIT") {
            if let Ok(v) = v.parse() {
                self.debate.history_limit = v;
            }
        }
        if let Ok(v) = std::env::var("EXPIRES_MINUTES") {
            if let Ok(v) = v.parse() {
                self.debate.expires_minutes = v;
            }
        }
        if let Ok(v) = std::env::var("MIN_ASSISTANT_TURNS_BEFORE_VERDICT") {
            if let Ok(v) = v.parse() {
                self.debate.min_assistant_turns_before_verdict = v;
            }
        }
        if let Ok(v) = std::env::var("REQUIRED_POSITIVE_JUDGEMENTS") {
            if let Ok(v) = v.parse() {
                self.debate.required_positive_judgements = v;
            }
        }
        if let Ok(v) = std::env::var("LLM_PROVIDER") {
            self.llm.provider = v;
        }
        if let Ok(v) = std::env::var("LLM_MODEL") {
            self.llm.model = v;
        }
        if let Ok(v) = std::env::var("DIFFICULTY") {
            self.llm.difficulty = v;
        }
        if let Ok(v) = std::env::var("LLM_PER_PROVIDER_TIMEOUT_S") {
            if let Ok(v) = v.parse() {
                self.llm.per_provider_timeout_secs = v;
            }
        }
        if let Ok(v) = std::env::var("OPENAI_API_KEY") {
            self.llm.openai_api_key = Some(v);
        }
        if let Ok(v) = std::env::var("ANTHROPIC_API_KEY") {
            self.llm.anthropic_api_key = Some(v);
        }
        if let Ok(v) = std::env::var("NLI_ENDPOINT") {
            self.nli.endpoint = v;
        }
        if let Ok(v) = std::env::var("NLI_API_TOKEN") {
            self.nli.api_token = Some(v);
        }
        self
    }

    /// Load with priority: file > env > defaults.
    pub fn load(config_file: Option<std::path::PathBuf>) -> Result<Self> {
        let config = if let Some(path) = config_file {
            if path.exists() {
                tracing::info!("loading configuration from {:?}", path);
                Self::from_file(&path)?
            } else {
                tracing::warn!("config file {:?} not found, using defaults", path);
                Self::default()
            }
        } else {
            Self::default()
        };
        Ok(config.merge_env())
    }

    /// Parse the listen address
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        Ok(self.server.listen_addr.parse()?)
    }

    /// Validate configuration before serving
    pub fn validate(&self) -> Result<()> {
        self.socket_addr()?;

        match self.llm.provider.trim().to_ascii_lowercase().as_str() {
            "openai" if self.llm.openai_api_key.is_none() => {
                anyhow::bail!("OPENAI_API_KEY is required for provider=openai");
            }
            "anthropic" if self.llm.anthropic_api_key.is_none() => {
                anyhow::bail!("ANTHROPIC_API_KEY is required for provider=anthropic");
            }
            _ => {}
        }

        if self.debate.history_limit == 0 {
            anyhow::bail!("history_limit must be at least 1");
        }
        if self.debate.expires_minutes <= 0 {
            anyhow::bail!("expires_minutes must be positive");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = ServerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.server.listen_addr, "127.0.0.1:47210");
        assert_eq!(config.debate.history_limit, 5);
        assert_eq!(config.debate.required_positive_judgements, 3);
        assert_eq!(config.debate.min_assistant_turns_before_verdict, 2);
        assert_eq!(config.nli.max_length, 512);
    }

    #[test]
    fn toml_overrides_subset() {
        let toml_src = r#"
            [server]
            listen_addr = "0.0.0.0:9000"

            [debate]
            required_positive_judgements = 5

            [policy]
            full_contra_min = 0.95
        "#;
        let config: ServerConfig = toml::from_str(toml_src).unwrap();
        assert_eq!(config.server.listen_addr, "0.0.0.0:9000");
        assert_eq!(config.debate.required_positive_judgements, 5);
        assert_eq!(config.debate.history_limit, 5);
        assert_eq!(config.policy.full_contra_min, 0.95);
        assert_eq!(config.policy.soft_contra_min, 0.60);
    }

    #[test]
    fn provider_without_key_fails_validation() {
        let mut config = ServerConfig::default();
        config.llm.provider = "openai".to_string();
        assert!(config.validate().is_err());
        config.llm.openai_api_key = Some("sk-test".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn env_overlay_applies() {
        std::env::set_var("REBUTTAL_HTTP_ADDR", "0.0.0.0:8123");
        std::env::set_var("REQUIRED_POSITIVE_JUDGEMENTS", "4");
        let config = ServerConfig::default().merge_env();
        assert_eq!(config.server.listen_addr, "0.0.0.0:8123");
        assert_eq!(config.debate.required_positive_judgements, 4);
        std::env::remove_var("REBUTTAL_HTTP_ADDR");
        std::env::remove_var("REQUIRED_POSITIVE_JUDGEMENTS");
    }
}
