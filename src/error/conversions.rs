//! Type Conversions for ConversationError

use super::types::ConversationError;

impl From<serde_json::Error> for ConversationError {
    fn from(err: serde_json::Error) -> Self {
        Self::JsonError(err.to_string())
    }
}

impl From<std::num::ParseIntError> for ConversationError {
    fn from(err: std::num::ParseIntError) -> Self {
        Self::InvalidConfig(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let err: ConversationError = json_err.into();
        assert!(matches!(err, ConversationError::JsonError(_)));
    }

    #[test]
    fn test_from_parse_int_error() {
        let parse_err = "abc".parse::<u64>().unwrap_err();
        let err: ConversationError = parse_err.into();
        assert!(matches!(err, ConversationError::InvalidConfig(_)));
        assert!(err.to_string().starts_with("Invalid configuration"));
    }
}
