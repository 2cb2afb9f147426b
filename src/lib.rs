//! fanlink - static music link pages from a song catalog.
//!
//! Resolution (normalize, identity, numbering, paths) is pure; the remaining
//! modules load the catalog, write pages and prepare cover images.

pub mod catalog;
pub mod config;
pub mod covers;
pub mod error;
pub mod generate;
pub mod identity;
pub mod models;
pub mod normalize;
pub mod numbering;
pub mod paths;
pub mod progress;
pub mod resolve;
pub mod safety;
pub mod template;
