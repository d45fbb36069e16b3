//! Pipeline configuration
//!
//! Controls the retention windows applied when a turn completes.
//!
//! ## Example
//!
//! ```rust,ignore
//! use siumai_conversation::config::PipelineConfig;
//!
//! let config = PipelineConfig::builder()
//!     .strip_media_after_turns(2)
//!     .text_max_tokens(10_000)
//!     .build()?;
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{ConversationError, Result};
use crate::policy::{DEFAULT_CHARS_PER_TOKEN, KeepForTurns, RetentionPolicy, TruncateOptions};

pub const ENV_STRIP_MEDIA_AFTER_TURNS: &str = "SIUMAI_CONVERSATION_STRIP_MEDIA_AFTER_TURNS";
pub const ENV_TEXT_MAX_TOKENS: &str = "SIUMAI_CONVERSATION_TEXT_MAX_TOKENS";
pub const ENV_STRIP_HEARTBEATS_AFTER_TURNS: &str =
    "SIUMAI_CONVERSATION_STRIP_HEARTBEATS_AFTER_TURNS";
pub const ENV_CHARS_PER_TOKEN: &str = "SIUMAI_CONVERSATION_CHARS_PER_TOKEN";

fn default_heartbeat_turns() -> KeepForTurns {
    KeepForTurns::Turns(1)
}

fn default_chars_per_token() -> usize {
    DEFAULT_CHARS_PER_TOKEN
}

/// Retention settings for [`TurnPipeline`](crate::pipeline::TurnPipeline)
///
/// Deserialization validates the settings, like [`PipelineConfigBuilder::build`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "PipelineConfigFields")]
pub struct PipelineConfig {
    /// Turns media (binary or inline base64) stays in history
    pub strip_media_after_turns: KeepForTurns,

    /// Token budget per text field; `None` or zero disables truncation
    pub text_max_tokens: Option<u64>,

    /// Turns heartbeat messages stay in history
    pub strip_heartbeats_after_turns: KeepForTurns,

    /// Characters per token for the truncation budget
    pub chars_per_token: usize,
}

/// Unvalidated wire form of [`PipelineConfig`].
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PipelineConfigFields {
    #[serde(default, alias = "stripImagesAfterTurns")]
    strip_media_after_turns: KeepForTurns,
    #[serde(default, alias = "stripTextMaxTokens")]
    text_max_tokens: Option<u64>,
    #[serde(default = "default_heartbeat_turns", alias = "stripHeartbeatsAfterTurns")]
    strip_heartbeats_after_turns: KeepForTurns,
    #[serde(default = "default_chars_per_token")]
    chars_per_token: usize,
}

impl TryFrom<PipelineConfigFields> for PipelineConfig {
    type Error = ConversationError;

    fn try_from(fields: PipelineConfigFields) -> Result<Self> {
        let config = Self {
            strip_media_after_turns: fields.strip_media_after_turns,
            text_max_tokens: fields.text_max_tokens.filter(|t| *t > 0),
            strip_heartbeats_after_turns: fields.strip_heartbeats_after_turns,
            chars_per_token: fields.chars_per_token,
        };
        config.validate()?;
        Ok(config)
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            strip_media_after_turns: KeepForTurns::Forever,
            text_max_tokens: None,
            strip_heartbeats_after_turns: default_heartbeat_turns(),
            chars_per_token: DEFAULT_CHARS_PER_TOKEN,
        }
    }
}

impl PipelineConfig {
    /// Create a new builder
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }

    /// Read the configuration from `SIUMAI_CONVERSATION_*` environment variables
    ///
    /// Supported environment variables:
    /// - `SIUMAI_CONVERSATION_STRIP_MEDIA_AFTER_TURNS`: turn count or `forever`
    /// - `SIUMAI_CONVERSATION_TEXT_MAX_TOKENS`: token budget (0 disables)
    /// - `SIUMAI_CONVERSATION_STRIP_HEARTBEATS_AFTER_TURNS`: turn count or `forever`
    /// - `SIUMAI_CONVERSATION_CHARS_PER_TOKEN`: characters per token
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut builder = Self::builder();

        if let Some(turns) = lookup(ENV_STRIP_MEDIA_AFTER_TURNS) {
            builder = builder.strip_media_after_turns(turns.parse::<KeepForTurns>()?);
        }
        if let Some(tokens) = lookup(ENV_TEXT_MAX_TOKENS) {
            builder = builder.text_max_tokens(tokens.trim().parse::<u64>()?);
        }
        if let Some(turns) = lookup(ENV_STRIP_HEARTBEATS_AFTER_TURNS) {
            builder = builder.strip_heartbeats_after_turns(turns.parse::<KeepForTurns>()?);
        }
        if let Some(ratio) = lookup(ENV_CHARS_PER_TOKEN) {
            builder = builder.chars_per_token(ratio.trim().parse::<usize>()?);
        }

        builder.build()
    }

    pub fn validate(&self) -> Result<()> {
        if self.chars_per_token == 0 {
            return Err(ConversationError::InvalidConfig(
                "chars_per_token must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Media policy evaluated at `turn`.
    pub fn media_policy(&self, turn: u64) -> RetentionPolicy {
        RetentionPolicy::new(self.strip_media_after_turns).at_turn(turn)
    }

    /// Heartbeat policy evaluated at `turn`.
    pub fn heartbeat_policy(&self, turn: u64) -> RetentionPolicy {
        RetentionPolicy::new(self.strip_heartbeats_after_turns).at_turn(turn)
    }

    pub fn truncate_options(&self) -> TruncateOptions {
        TruncateOptions::new(self.text_max_tokens).with_chars_per_token(self.chars_per_token)
    }
}

/// Builder for PipelineConfig
#[derive(Debug, Clone, Default)]
pub struct PipelineConfigBuilder {
    strip_media_after_turns: Option<KeepForTurns>,
    text_max_tokens: Option<u64>,
    strip_heartbeats_after_turns: Option<KeepForTurns>,
    chars_per_token: Option<usize>,
}

impl PipelineConfigBuilder {
    /// Keep media for this many turns (or `KeepForTurns::Forever`)
    pub fn strip_media_after_turns(mut self, turns: impl Into<KeepForTurns>) -> Self {
        self.strip_media_after_turns = Some(turns.into());
        self
    }

    /// Truncate text fields above this many tokens (0 disables)
    pub fn text_max_tokens(mut self, tokens: u64) -> Self {
        self.text_max_tokens = Some(tokens);
        self
    }

    /// Keep heartbeats for this many turns
    pub fn strip_heartbeats_after_turns(mut self, turns: impl Into<KeepForTurns>) -> Self {
        self.strip_heartbeats_after_turns = Some(turns.into());
        self
    }

    pub fn chars_per_token(mut self, chars: usize) -> Self {
        self.chars_per_token = Some(chars);
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> Result<PipelineConfig> {
        let defaults = PipelineConfig::default();
        let config = PipelineConfig {
            strip_media_after_turns: self
                .strip_media_after_turns
                .unwrap_or(defaults.strip_media_after_turns),
            text_max_tokens: self.text_max_tokens.filter(|t| *t > 0),
            strip_heartbeats_after_turns: self
                .strip_heartbeats_after_turns
                .unwrap_or(defaults.strip_heartbeats_after_turns),
            chars_per_token: self.chars_per_token.unwrap_or(defaults.chars_per_token),
        };
        config.validate()?;
        Ok(config)
    }
}
