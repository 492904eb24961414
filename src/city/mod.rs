//! City name resolution.
//!
//! Normalizes free-text queries and matches them against an immutable
//! catalog: exact name, then substring, then sequence similarity.

pub mod catalog;
pub mod normalize;
pub mod resolver;
pub mod similarity;
pub mod types;

pub use catalog::{parse_document, Catalog, CatalogSource};
pub use normalize::normalize;
pub use resolver::resolve;
pub use types::{CatalogError, City, CityMatch, Resolution, SuggestionReason};
