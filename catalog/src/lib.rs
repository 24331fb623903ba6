//! Versioned, locale-scoped rule catalog.
//!
//! A rule document (JSON or TOML) is parsed once into an immutable
//! [`Catalog`]. Loading never fails outright: a broken document yields an
//! empty catalog plus the error that caused it, so a session can keep running
//! with "nothing known yet" while the caller logs the problem.

mod cache;
mod document;
mod integrity;
mod load;
mod model;

use std::path::PathBuf;

use thiserror::Error;

pub use cache::{CatalogCache, CatalogSource, bundled_document};
pub use document::DocumentFormat;
pub use integrity::{DanglingReference, IntegrityReport, MIN_DIRECTIVES, MIN_RUBRICS};
pub use load::{LoadedCatalog, fingerprint, load};
pub use model::{
    Band, BandRef, Catalog, CatalogMetadata, Directive, EMPTY_CATALOG_VERSION, Rubric, Signal,
    SignalCondition,
};

/// Why a rule document could not be turned into a catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("rule document is empty")]
    Empty,
    #[error("invalid JSON rule document: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid TOML rule document: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("failed to read rule document {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
}
