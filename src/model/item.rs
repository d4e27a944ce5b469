//! Todo item types.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Maximum description length, in characters.
pub const MAX_DESCRIPTION_LEN: usize = 128;

/// Store-assigned item identifier. Monotonic, never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ItemId(pub i64);

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A validated item description: non-empty, at most 128 characters.
///
/// Two descriptions name the same item when their [`dedup_key`]s match,
/// i.e. under case-insensitive comparison.
///
/// [`dedup_key`]: Description::dedup_key
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Description(String);

impl Description {
    pub fn parse(text: impl Into<String>) -> Result<Self> {
        let text = text.into();
        if text.is_empty() {
            return Err(Error::InvalidDescription("empty".to_string()));
        }
        let len = text.chars().count();
        if len > MAX_DESCRIPTION_LEN {
            return Err(Error::InvalidDescription(format!(
                "{len} characters exceeds the limit of {MAX_DESCRIPTION_LEN}"
            )));
        }
        Ok(Self(text))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Normalized form used for duplicate detection.
    pub fn dedup_key(&self) -> String {
        self.0.to_lowercase()
    }
}

impl TryFrom<String> for Description {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(value)
    }
}

impl From<Description> for String {
    fn from(value: Description) -> Self {
        value.0
    }
}

impl std::fmt::Display for Description {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A todo item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Assigned by the store on commit; `None` while pending.
    pub id: Option<ItemId>,
    pub description: Description,
    pub is_completed: bool,
}

impl Item {
    /// A new, not yet completed item.
    pub fn new(description: Description) -> Self {
        Self {
            id: None,
            description,
            is_completed: false,
        }
    }
}
