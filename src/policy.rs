//! Retention and truncation policies.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConversationError;
use crate::meta::get_meta;
use crate::value::Value;

/// Characters per token used to turn a token budget into a character budget.
pub const DEFAULT_CHARS_PER_TOKEN: usize = 4;

/// How many turns content is kept before it is stripped.
///
/// Serialized as a number, or as `"forever"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeepForTurns {
    /// Never strip
    #[default]
    Forever,
    /// Strip once the current turn reaches this value
    #[serde(untagged)]
    Turns(u64),
}

impl KeepForTurns {
    /// Content is protected while `current_turn < keep_for_turns`.
    pub fn retains(self, current_turn: u64) -> bool {
        match self {
            Self::Forever => true,
            Self::Turns(n) => current_turn < n,
        }
    }
}

impl From<u64> for KeepForTurns {
    fn from(n: u64) -> Self {
        Self::Turns(n)
    }
}

impl fmt::Display for KeepForTurns {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Forever => f.write_str("forever"),
            Self::Turns(n) => write!(f, "{n}"),
        }
    }
}

impl FromStr for KeepForTurns {
    type Err = ConversationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.to_ascii_lowercase().as_str() {
            "forever" | "infinity" | "inf" | "never" => Ok(Self::Forever),
            _ => s.parse::<u64>().map(Self::Turns).map_err(|_| {
                ConversationError::InvalidConfig(format!(
                    "Invalid turn count: {s}. Expected a non-negative integer or 'forever'"
                ))
            }),
        }
    }
}

/// Turn-gated retention policy for stripping passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetentionPolicy {
    pub keep_for_turns: KeepForTurns,
    /// Overrides the turn read from the tree's metadata
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_turn: Option<u64>,
}

impl RetentionPolicy {
    pub fn new(keep_for_turns: impl Into<KeepForTurns>) -> Self {
        Self {
            keep_for_turns: keep_for_turns.into(),
            current_turn: None,
        }
    }

    /// Strip immediately.
    pub fn forced() -> Self {
        Self::new(0)
    }

    /// Never strip.
    pub fn never() -> Self {
        Self::new(KeepForTurns::Forever)
    }

    pub fn after_turns(n: u64) -> Self {
        Self::new(n)
    }

    /// Heartbeats stay visible for one turn.
    pub fn heartbeat_default() -> Self {
        Self::new(1)
    }

    pub fn at_turn(mut self, current_turn: u64) -> Self {
        self.current_turn = Some(current_turn);
        self
    }

    /// The explicit turn, or the one stored in the tree's root metadata.
    pub fn resolve_turn(&self, tree: &Value) -> u64 {
        self.current_turn
            .unwrap_or_else(|| get_meta(tree).turn_number)
    }

    pub fn should_strip(&self, tree: &Value) -> bool {
        !self.keep_for_turns.retains(self.resolve_turn(tree))
    }
}

/// Token budget for text truncation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TruncateOptions {
    /// `None` or zero disables truncation
    pub text_max_tokens: Option<u64>,
    pub chars_per_token: usize,
}

impl Default for TruncateOptions {
    fn default() -> Self {
        Self {
            text_max_tokens: None,
            chars_per_token: DEFAULT_CHARS_PER_TOKEN,
        }
    }
}

impl TruncateOptions {
    pub fn new(text_max_tokens: Option<u64>) -> Self {
        Self {
            text_max_tokens,
            ..Self::default()
        }
    }

    pub fn with_chars_per_token(mut self, chars_per_token: usize) -> Self {
        self.chars_per_token = chars_per_token;
        self
    }

    /// Character budget, or `None` when truncation is disabled.
    pub fn char_budget(&self) -> Option<usize> {
        let tokens = self.text_max_tokens.filter(|t| *t > 0)?;
        if self.chars_per_token == 0 {
            return None;
        }
        let tokens = usize::try_from(tokens).unwrap_or(usize::MAX);
        Some(tokens.saturating_mul(self.chars_per_token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meta::{TurnContext, set_meta};
    use serde_json::json;

    #[test]
    fn boundary_is_inclusive_on_strip_side() {
        let policy = RetentionPolicy::after_turns(3);
        assert!(policy.at_turn(3).should_strip(&Value::Null));
        assert!(!policy.at_turn(2).should_strip(&Value::Null));
        assert!(RetentionPolicy::forced().at_turn(0).should_strip(&Value::Null));
        assert!(!RetentionPolicy::never().at_turn(u64::MAX).should_strip(&Value::Null));
    }

    #[test]
    fn current_turn_defaults_to_tree_metadata() {
        let tree = set_meta(&Value::from(json!({ "messages": [] })), TurnContext::new(2));
        assert!(RetentionPolicy::after_turns(2).should_strip(&tree));
        assert!(!RetentionPolicy::after_turns(3).should_strip(&tree));
        assert!(!RetentionPolicy::after_turns(2).at_turn(1).should_strip(&tree));
    }

    #[test]
    fn keep_for_turns_serde_accepts_number_and_forever() {
        assert_eq!(
            serde_json::from_value::<KeepForTurns>(json!(2)).unwrap(),
            KeepForTurns::Turns(2)
        );
        assert_eq!(
            serde_json::from_value::<KeepForTurns>(json!("forever")).unwrap(),
            KeepForTurns::Forever
        );
        assert_eq!(serde_json::to_value(KeepForTurns::Turns(5)).unwrap(), json!(5));
        assert_eq!(serde_json::to_value(KeepForTurns::Forever).unwrap(), json!("forever"));
    }

    #[test]
    fn keep_for_turns_parses_from_str() {
        assert_eq!("3".parse::<KeepForTurns>().unwrap(), KeepForTurns::Turns(3));
        assert_eq!("Infinity".parse::<KeepForTurns>().unwrap(), KeepForTurns::Forever);
        assert!(matches!(
            "-1".parse::<KeepForTurns>(),
            Err(ConversationError::InvalidConfig(_))
        ));
    }

    #[test]
    fn char_budget_uses_ratio() {
        assert_eq!(TruncateOptions::new(Some(10_000)).char_budget(), Some(40_000));
        assert_eq!(TruncateOptions::new(Some(0)).char_budget(), None);
        assert_eq!(TruncateOptions::new(None).char_budget(), None);
        assert_eq!(
            TruncateOptions::new(Some(10)).with_chars_per_token(3).char_budget(),
            Some(30)
        );
        assert_eq!(
            TruncateOptions::new(Some(10)).with_chars_per_token(0).char_budget(),
            None
        );
    }
}
