//! Item records and the partial-update merge rule.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of an item.
///
/// Issued by the storage adapter, strictly increasing per store lifetime and
/// never reused after deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(i64);

impl ItemId {
    /// Create an identifier from a raw value.
    #[must_use]
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    /// Get the raw value.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }

    /// Parse a path segment.
    ///
    /// Only a plain decimal integer is accepted. Anything else returns `None`,
    /// which callers treat as an id that matches no stored item.
    #[must_use]
    pub fn parse_path(segment: &str) -> Option<Self> {
        let digits = segment.strip_prefix('-').unwrap_or(segment);
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        segment.parse().ok().map(Self)
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A stored item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Item identifier.
    pub id: ItemId,
    /// Item name, never empty.
    pub name: String,
    /// Optional description. Absent stays absent, it is never coerced to "".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Validated input for creating an item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewItem {
    /// Item name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
}

impl NewItem {
    /// Attach an identifier, producing the stored record.
    #[must_use]
    pub fn into_item(self, id: ItemId) -> Item {
        Item {
            id,
            name: self.name,
            description: self.description,
        }
    }
}

/// Partial update of an item.
///
/// Each present field overwrites the stored value; absent fields are kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemPatch {
    /// Replacement name.
    pub name: Option<String>,
    /// Replacement description.
    pub description: Option<String>,
}

impl ItemPatch {
    /// Whether the patch changes nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none()
    }

    /// Apply the patch in place.
    pub fn apply_to(&self, item: &mut Item) {
        if let Some(name) = &self.name {
            item.name.clone_from(name);
        }
        if let Some(description) = &self.description {
            item.description = Some(description.clone());
        }
    }
}
