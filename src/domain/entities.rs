//! Domain entities mirrored from persistent storage, and the payloads rendered from them.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::error::DomainError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuRecord {
    pub id: Uuid,
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmenuRecord {
    pub id: Uuid,
    pub menu_id: Uuid,
    pub title: String,
    pub description: String,
}

/// Stored dish. `price` is kept verbatim as a decimal string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DishRecord {
    pub id: Uuid,
    pub submenu_id: Uuid,
    pub title: String,
    pub description: String,
    pub price: String,
}

/// Rendered menu, including the counts embedded from its descendants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuView {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub submenus_count: i64,
    pub dishes_count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmenuView {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub dishes_count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DishView {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub price: String,
}

impl From<DishRecord> for DishView {
    fn from(record: DishRecord) -> Self {
        Self {
            id: record.id,
            title: record.title,
            description: record.description,
            price: record.price,
        }
    }
}

/// Editable fields shared by menus and submenus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionContent {
    pub title: String,
    pub description: String,
}

impl SectionContent {
    pub fn new(title: &str, description: &str) -> Result<Self, DomainError> {
        Ok(Self {
            title: required_title(title)?,
            description: description.trim().to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DishContent {
    pub title: String,
    pub description: String,
    pub price: String,
}

impl DishContent {
    pub fn new(title: &str, description: &str, price: &str) -> Result<Self, DomainError> {
        let price = price.trim();
        if price.is_empty() {
            return Err(DomainError::validation("price", "must not be empty"));
        }
        Ok(Self {
            title: required_title(title)?,
            description: description.trim().to_string(),
            price: price.to_string(),
        })
    }
}

fn required_title(title: &str) -> Result<String, DomainError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(DomainError::validation("title", "must not be empty"));
    }
    Ok(title.to_string())
}
