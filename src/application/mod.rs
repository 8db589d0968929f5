//! Application services: catalog use cases, the discount overlay and the
//! spreadsheet sync.

pub mod catalog;
pub mod discount;
pub mod error;
pub mod jobs;
pub mod repos;
pub mod sync;
