//! Tavola: a restaurant menu service.
//!
//! Menus own submenus, submenus own dishes. The catalog is served over HTTP
//! through a lineage-keyed cache and periodically reconciled against a
//! spreadsheet export that also carries read-time dish discounts.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
