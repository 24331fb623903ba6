//! Per-locale catalog cache.
//!
//! One catalog per locale, loaded on first use and shared read-only through
//! `Arc`. Loading a locale again returns the cached instance; only
//! [`CatalogCache::reload`] and [`CatalogCache::reload_from`] replace it, and
//! only for that locale.

use std::borrow::Cow;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use didactic_types::Locale;
use tracing::info;

use crate::load::{LoadedCatalog, load};
use crate::{Catalog, CatalogError};

const RULES_NL: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/assets/rules.nl.json"));
const RULES_EN: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/assets/rules.en.json"));

/// The rule document shipped with the crate for `locale`.
#[must_use]
pub fn bundled_document(locale: Locale) -> &'static str {
    match locale {
        Locale::Nl => RULES_NL,
        Locale::En => RULES_EN,
    }
}

/// Where a locale's rule document comes from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CatalogSource {
    /// The document compiled into the crate.
    #[default]
    Bundled,
    /// A JSON or TOML file on disk, read at load time.
    File(PathBuf),
    /// A document held in memory.
    Inline(String),
}

impl CatalogSource {
    fn read(&self, locale: Locale) -> Result<Cow<'_, str>, CatalogError> {
        match self {
            CatalogSource::Bundled => Ok(Cow::Borrowed(bundled_document(locale))),
            CatalogSource::File(path) => std::fs::read_to_string(path)
                .map(Cow::Owned)
                .map_err(|source| CatalogError::Read {
                    path: path.clone(),
                    source,
                }),
            CatalogSource::Inline(raw) => Ok(Cow::Borrowed(raw.as_str())),
        }
    }
}

#[derive(Debug)]
struct Entry {
    catalog: Arc<Catalog>,
    error: Option<CatalogError>,
    warnings: Vec<String>,
}

impl From<LoadedCatalog> for Entry {
    fn from(loaded: LoadedCatalog) -> Self {
        Self {
            catalog: Arc::new(loaded.catalog),
            error: loaded.error,
            warnings: loaded.warnings,
        }
    }
}

/// Catalogs keyed by locale.
#[derive(Debug, Default)]
pub struct CatalogCache {
    sources: HashMap<Locale, CatalogSource>,
    entries: HashMap<Locale, Entry>,
}

impl CatalogCache {
    /// A cache that serves the bundled documents for every locale.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `locale` from `source` instead of the bundled document.
    ///
    /// Takes effect on the next load of that locale.
    #[must_use]
    pub fn with_source(mut self, locale: Locale, source: CatalogSource) -> Self {
        self.set_source(locale, source);
        self
    }

    pub fn set_source(&mut self, locale: Locale, source: CatalogSource) {
        self.sources.insert(locale, source);
    }

    #[must_use]
    pub fn source(&self, locale: Locale) -> &CatalogSource {
        static BUNDLED: CatalogSource = CatalogSource::Bundled;
        self.sources.get(&locale).unwrap_or(&BUNDLED)
    }

    /// The catalog for `locale`, loading it from its source on first use.
    pub fn get(&mut self, locale: Locale) -> Arc<Catalog> {
        if let Some(entry) = self.entries.get(&locale) {
            return Arc::clone(&entry.catalog);
        }
        self.reload(locale)
    }

    /// Load `raw` as the catalog for `locale` unless one is already cached,
    /// in which case the cached catalog is returned and `raw` is ignored.
    pub fn load(&mut self, locale: Locale, raw: &str) -> Arc<Catalog> {
        if let Some(entry) = self.entries.get(&locale) {
            return Arc::clone(&entry.catalog);
        }
        self.reload_from(locale, raw)
    }

    /// Discard the cached catalog for `locale` and load it again from its
    /// source.
    pub fn reload(&mut self, locale: Locale) -> Arc<Catalog> {
        let loaded = match self.source(locale).read(locale) {
            Ok(raw) => load(&raw, locale),
            Err(err) => LoadedCatalog::failed(locale, err),
        };
        self.store(locale, loaded)
    }

    /// Discard the cached catalog for `locale` and replace it with `raw`.
    pub fn reload_from(&mut self, locale: Locale, raw: &str) -> Arc<Catalog> {
        let loaded = load(raw, locale);
        self.store(locale, loaded)
    }

    fn store(&mut self, locale: Locale, loaded: LoadedCatalog) -> Arc<Catalog> {
        let entry = Entry::from(loaded);
        let catalog = Arc::clone(&entry.catalog);
        if self.entries.insert(locale, entry).is_some() {
            info!(locale = %locale, version = catalog.version(), "replaced cached rule catalog");
        }
        catalog
    }

    /// The cached catalog for `locale`, without loading.
    #[must_use]
    pub fn cached(&self, locale: Locale) -> Option<Arc<Catalog>> {
        self.entries
            .get(&locale)
            .map(|entry| Arc::clone(&entry.catalog))
    }

    /// Error from the most recent load of `locale`, if it failed.
    #[must_use]
    pub fn last_error(&self, locale: Locale) -> Option<&CatalogError> {
        self.entries.get(&locale)?.error.as_ref()
    }

    /// Entries dropped during the most recent load of `locale`.
    #[must_use]
    pub fn warnings(&self, locale: Locale) -> &[String] {
        self.entries
            .get(&locale)
            .map(|entry| entry.warnings.as_slice())
            .unwrap_or_default()
    }
}
