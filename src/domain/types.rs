//! Shared domain enumerations.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The three levels of the catalog hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Menu,
    Submenu,
    Dish,
}

impl EntityKind {
    pub const ALL: [EntityKind; 3] = [EntityKind::Menu, EntityKind::Submenu, EntityKind::Dish];

    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Menu => "menu",
            EntityKind::Submenu => "submenu",
            EntityKind::Dish => "dish",
        }
    }

    /// Client-facing message for a failed lookup of this kind.
    pub fn not_found_detail(self) -> &'static str {
        match self {
            EntityKind::Menu => "menu not found",
            EntityKind::Submenu => "submenu not found",
            EntityKind::Dish => "dish not found",
        }
    }

    /// Client-facing message after a successful delete of this kind.
    pub fn deleted_message(self) -> &'static str {
        match self {
            EntityKind::Menu => "The menu has been deleted",
            EntityKind::Submenu => "The submenu has been deleted",
            EntityKind::Dish => "The dish has been deleted",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
