//! Turn orchestrator.
//!
//! One turn of a conversation:
//!
//! ```text
//! prior conversation --append prompt--> working conversation --request (caller)-->
//! response --append + repair--> turn N+1 --strip media--> --truncate text-->
//! --strip heartbeats--> conversation to persist
//! ```
//!
//! Nothing is kept between turns; the caller persists the returned
//! [`Conversation`] and hands it back for the next one.

use crate::config::PipelineConfig;
use crate::conversation::Conversation;
use crate::error::Result;
use crate::heartbeat::strip_heartbeats_with;
use crate::truncate::truncate_with;
use crate::value::Value;

/// Conversation with the prompt appended, plus the history to send.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedTurn {
    pub conversation: Conversation,
    /// Decoded history for the request; tool blocks are flattened to text
    /// when the request carries no tool definitions.
    pub request: Value,
}

#[derive(Debug, Clone, Default)]
pub struct TurnPipeline {
    config: PipelineConfig,
}

impl TurnPipeline {
    /// Pipeline over a validated `config`.
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Append the prompt and build the request history.
    pub fn prepare_turn(
        &self,
        conversation: Conversation,
        prompt: &Value,
        tools_configured: bool,
    ) -> PreparedTurn {
        let mut conversation = conversation;
        conversation.append(prompt);

        let mut request = conversation.request_history();
        if !tools_configured {
            request = conversation.spec().tools_to_text(&request);
        }
        PreparedTurn {
            conversation,
            request,
        }
    }

    /// Append the response, advance the turn and apply the retention passes.
    pub fn complete_turn(&self, conversation: Conversation, response: &Value) -> Conversation {
        let mut conversation = conversation;
        conversation.append(response);
        self.finalize(conversation.next_turn())
    }

    /// [`prepare_turn`](Self::prepare_turn) and
    /// [`complete_turn`](Self::complete_turn) for a response already at hand.
    pub fn run_turn(
        &self,
        conversation: Conversation,
        prompt: &Value,
        response: &Value,
        tools_configured: bool,
    ) -> Conversation {
        let prepared = self.prepare_turn(conversation, prompt, tools_configured);
        self.complete_turn(prepared.conversation, response)
    }

    /// Strip media, truncate text and strip heartbeats at the conversation's turn.
    pub fn finalize(&self, conversation: Conversation) -> Conversation {
        let turn = conversation.turn_number();
        let dialect = conversation.dialect();
        let spec = conversation.spec();
        let rules = spec.content_rules();

        let media_policy = self.config.media_policy(turn);
        let heartbeat_policy = self.config.heartbeat_policy(turn);
        let truncate_options = self.config.truncate_options();

        tracing::debug!(
            %dialect,
            turn,
            keep_media = %media_policy.keep_for_turns,
            keep_heartbeats = %heartbeat_policy.keep_for_turns,
            text_max_tokens = ?truncate_options.text_max_tokens,
            "Completed conversation turn"
        );

        conversation.map_history(|history| {
            let history = spec.strip_media(history, &media_policy);
            let history = truncate_with(&history, &truncate_options, rules);
            strip_heartbeats_with(&history, &heartbeat_policy, rules)
        })
    }
}
