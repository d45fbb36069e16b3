//! Error handling types for siumai-conversation.
//!
//! The tree-walking core never fails; errors only surface at the storage
//! boundary, when parsing configuration, or when installing a subscriber.

mod conversions;
pub mod types;

pub use types::*;
