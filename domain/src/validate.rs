//! Lightweight input validation helpers for callers of a `TodoStore`.
//!
//! Stores act on whatever title they are given; trimming and length checks
//! happen here, before a store is invoked.

use crate::StoreError;

/// Longest accepted title, in characters.
pub const MAX_TITLE_CHARS: usize = 100;

/// What a title belongs to; only affects error messages.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TitleKind {
    List,
    Todo,
}

impl TitleKind {
    fn as_str(&self) -> &'static str {
        match self {
            TitleKind::List => "list",
            TitleKind::Todo => "todo",
        }
    }

    fn capitalized(&self) -> &'static str {
        match self {
            TitleKind::List => "List",
            TitleKind::Todo => "Todo",
        }
    }
}

/// Trim a raw title and check it is between 1 and 100 characters.
pub fn validate_title(kind: TitleKind, raw: &str) -> Result<String, StoreError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(StoreError::InvalidTitle(format!(
            "The {} title is required.",
            kind.as_str()
        )));
    }
    if trimmed.chars().count() > MAX_TITLE_CHARS {
        return Err(StoreError::InvalidTitle(format!(
            "{} title must be between 1 and {} characters.",
            kind.capitalized(),
            MAX_TITLE_CHARS
        )));
    }
    Ok(trimmed.to_string())
}
