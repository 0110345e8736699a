//! Semantic book recommendations: embed tagged book descriptions once, then
//! answer free-text queries filtered by category and re-ranked by tone.

pub mod catalog;
pub mod config;
pub mod constants;
pub mod context;
pub mod db;
pub mod embedder;
pub mod error;
pub mod index;
pub mod presentation;
pub mod protocol;
pub mod recommender;
pub mod shell;
pub mod tagged;

pub use catalog::{Catalog, CatalogEntry, Emotion};
pub use context::AppContext;
pub use error::{Error, Result};
pub use recommender::{CategoryFilter, QueryFilters, Recommender, Tone};
