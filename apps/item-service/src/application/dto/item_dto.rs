//! Item DTOs.

use serde::{Deserialize, Serialize};

use crate::domain::ItemPatch;

/// Input for creating an item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateItemDto {
    /// Item name (required, non-empty).
    #[serde(default)]
    pub name: Option<String>,
    /// Optional description.
    #[serde(default)]
    pub description: Option<String>,
}

/// Input for updating an item. Absent fields keep their stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateItemDto {
    /// Replacement name.
    #[serde(default)]
    pub name: Option<String>,
    /// Replacement description.
    #[serde(default)]
    pub description: Option<String>,
}

impl From<UpdateItemDto> for ItemPatch {
    fn from(dto: UpdateItemDto) -> Self {
        Self {
            name: dto.name,
            description: dto.description,
        }
    }
}
