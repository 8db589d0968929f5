//! Postgres storage for menus, submenus and dishes.

mod read;
mod types;
mod write;
