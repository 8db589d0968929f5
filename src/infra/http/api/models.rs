use serde::{Deserialize, Deserializer, Serialize};

use crate::domain::types::EntityKind;

/// Body of create and full-replacement update for menus and submenus.
#[derive(Debug, Deserialize, Serialize)]
pub struct SectionRequest {
    pub title: String,
    pub description: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct DishRequest {
    pub title: String,
    pub description: String,
    #[serde(deserialize_with = "price_text")]
    pub price: String,
}

#[derive(Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct DeleteResponse {
    pub status: bool,
    pub message: String,
}

impl DeleteResponse {
    pub fn deleted(kind: EntityKind) -> Self {
        Self {
            status: true,
            message: kind.deleted_message().to_string(),
        }
    }
}

/// Prices are kept as text; a bare JSON number is accepted and stringified.
fn price_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Price {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Price::deserialize(deserializer)? {
        Price::Text(text) => text,
        Price::Number(number) => number.to_string(),
    })
}
