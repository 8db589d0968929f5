//! API handlers organized by resource type.

mod dishes;
mod menus;
mod submenus;

pub use dishes::*;
pub use menus::*;
pub use submenus::*;
