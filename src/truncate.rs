//! Truncation engine.
//!
//! Shortens oversized text fields to a character budget derived from a
//! token budget, keeping the tree's structure intact.

use crate::classify::{AnyDialectContent, ContentRules};
use crate::policy::TruncateOptions;
use crate::value::Value;
use crate::walk::rewrite_text_fields;

/// Appended once to every truncated text.
pub const TRUNCATION_MARKER: &str = "\n\n[Content truncated - exceeded token limit]";

/// Truncate text fields of any dialect.
pub fn truncate_text(tree: &Value, options: &TruncateOptions) -> Value {
    truncate_with(tree, options, &AnyDialectContent)
}

/// Truncate the text fields recognized by `rules`.
pub fn truncate_with(tree: &Value, options: &TruncateOptions, rules: &dyn ContentRules) -> Value {
    let Some(budget) = options.char_budget() else {
        return tree.clone();
    };
    rewrite_text_fields(tree, rules, &|text| truncate_str(text, budget))
}

/// Truncated copy of `text`, or `None` when it fits the budget.
///
/// Text that already ends with the marker is measured without it, so the
/// marker is never truncated or appended twice.
pub fn truncate_str(text: &str, budget: usize) -> Option<String> {
    let body = text.strip_suffix(TRUNCATION_MARKER).unwrap_or(text);
    if body.len() <= budget || body.chars().count() <= budget {
        return None;
    }
    let cut = body
        .char_indices()
        .nth(budget)
        .map(|(i, _)| i)
        .unwrap_or(body.len());
    Some(format!("{}{}", &body[..cut], TRUNCATION_MARKER))
}
