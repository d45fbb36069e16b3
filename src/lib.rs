//! siumai-conversation
//!
//! Conversation history normalization for siumai providers.
//!
//! Multi-turn conversations are persisted between requests by the caller.
//! This crate keeps those histories safe to store and cheap to resend:
//!
//! - byte buffers are boxed as `{"_base64": ...}` so a JSON encoder never
//!   sees them (`codec`)
//! - media blocks are replaced by placeholders once their retention window
//!   expires (`strip`), long text fields are truncated (`truncate`) and
//!   orchestration heartbeats are dropped after their round (`heartbeat`)
//! - each provider dialect merges new turns and repairs the structural
//!   problems its API rejects (`standards`)
//! - [`TurnPipeline`](pipeline::TurnPipeline) runs the whole lifecycle of
//!   one turn over a [`Conversation`](conversation::Conversation)
//!
//! Every transform is a pure function of its input tree. Unrecognized shapes
//! pass through untouched.
#![deny(unsafe_code)]

pub mod classify;
pub mod codec;
pub mod config;
pub mod conversation;
pub mod error;
pub mod heartbeat;
pub mod meta;
pub mod pipeline;
pub mod policy;
pub mod standards;
pub mod strip;
pub mod telemetry;
pub mod truncate;
pub mod value;

mod walk;

pub use config::PipelineConfig;
pub use conversation::Conversation;
pub use error::{ConversationError, Result};
pub use pipeline::{PreparedTurn, TurnPipeline};
pub use standards::{ConversationSpec, Dialect};
pub use value::Value;

/// Common imports
pub mod prelude {
    pub use crate::classify::{ContentRules, MediaKind};
    pub use crate::codec::{deserialize_binary, serialize_binary};
    pub use crate::config::PipelineConfig;
    pub use crate::conversation::Conversation;
    pub use crate::error::{ConversationError, Result};
    pub use crate::heartbeat::strip_heartbeats;
    pub use crate::meta::{TurnContext, get_meta, increment_turn, set_meta};
    pub use crate::pipeline::{PreparedTurn, TurnPipeline};
    pub use crate::policy::{KeepForTurns, RetentionPolicy, TruncateOptions};
    pub use crate::standards::{ConversationSpec, Dialect};
    pub use crate::strip::{strip_base64_images, strip_binary};
    pub use crate::truncate::truncate_text;
    pub use crate::value::Value;
}
