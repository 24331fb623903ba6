//! Turning a raw rule document into a [`Catalog`].

use std::collections::HashSet;

use didactic_types::{BandId, Dimension, DirectiveId, Locale, Severity};
use sha2::{Digest, Sha256};
use tracing::{error, info, warn};

use crate::CatalogError;
use crate::document::{RawBand, RawDiagnostic, RawDocument, RawRubric, parse_document};
use crate::model::{
    Band, Catalog, CatalogMetadata, Directive, EMPTY_CATALOG_VERSION, Rubric, Signal,
    SignalCondition,
};

/// Result of [`load`]. Always carries a usable catalog.
#[derive(Debug)]
pub struct LoadedCatalog {
    pub catalog: Catalog,
    /// Set when the document could not be parsed; `catalog` is then empty.
    pub error: Option<CatalogError>,
    /// Entries dropped while building the catalog.
    pub warnings: Vec<String>,
}

impl LoadedCatalog {
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    pub(crate) fn failed(locale: Locale, error: CatalogError) -> Self {
        error!(locale = %locale, error = %error, "rule catalog failed to load; using empty catalog");
        Self {
            catalog: Catalog::empty(locale),
            error: Some(error),
            warnings: Vec::new(),
        }
    }
}

/// Hex SHA-256 of a raw document.
#[must_use]
pub fn fingerprint(raw: &str) -> String {
    format!("{:x}", Sha256::digest(raw.as_bytes()))
}

/// Parse `raw` into the catalog for `locale`. Never panics and never fails:
/// malformed input produces an empty catalog plus the error.
#[must_use]
pub fn load(raw: &str, locale: Locale) -> LoadedCatalog {
    match parse_document(raw) {
        Ok(document) => build(document, raw, locale),
        Err(err) => LoadedCatalog::failed(locale, err),
    }
}

fn build(document: RawDocument, raw: &str, locale: Locale) -> LoadedCatalog {
    let mut warnings = Warnings::new(locale);

    let directives = collect_directives(&document, &mut warnings);
    let rubrics = collect_rubrics(document.rubrics, &mut warnings);
    let signals = collect_signals(&document.didactic_diagnostics.0, &mut warnings);

    let processing_order = document
        .metadata
        .cycle
        .map(|cycle| processing_order(&cycle.order, &mut warnings))
        .unwrap_or_default();

    let version = document
        .version
        .or(document.metadata.version)
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| EMPTY_CATALOG_VERSION.to_string());

    let metadata = CatalogMetadata {
        version,
        system: document.metadata.system,
        processing_order,
        declared_integrity_hash: document.metadata.integrity_hash_sha256,
        fingerprint: Some(fingerprint(raw)),
    };

    let catalog = Catalog::from_parts(locale, metadata, directives, rubrics, signals);
    info!(
        locale = %locale,
        version = catalog.version(),
        rubrics = catalog.rubrics().len(),
        bands = catalog.band_count(),
        directives = catalog.directives().len(),
        signals = catalog.signals().len(),
        "rule catalog loaded"
    );

    LoadedCatalog {
        catalog,
        error: None,
        warnings: warnings.into_inner(),
    }
}

struct Warnings {
    locale: Locale,
    items: Vec<String>,
}

impl Warnings {
    fn new(locale: Locale) -> Self {
        Self {
            locale,
            items: Vec::new(),
        }
    }

    fn push(&mut self, message: String) {
        warn!(locale = %self.locale, "{message}");
        self.items.push(message);
    }

    fn into_inner(self) -> Vec<String> {
        self.items
    }
}

fn collect_directives(document: &RawDocument, warnings: &mut Warnings) -> Vec<Directive> {
    let mut seen = HashSet::new();
    let mut directives = Vec::with_capacity(document.command_library.commands.0.len());
    for (id, instruction) in &document.command_library.commands.0 {
        let id = id.trim();
        if id.is_empty() {
            warnings.push("dropped directive with blank id".to_string());
            continue;
        }
        if !seen.insert(id.to_string()) {
            warnings.push(format!("dropped duplicate directive {id}"));
            continue;
        }
        directives.push(Directive {
            id: DirectiveId::new(id),
            instruction: instruction.clone(),
        });
    }
    directives
}

fn collect_rubrics(raw: Vec<RawRubric>, warnings: &mut Warnings) -> Vec<Rubric> {
    let mut seen: HashSet<String> = HashSet::new();
    raw.into_iter()
        .map(|rubric| {
            let id = rubric.rubric_id.unwrap_or_default().trim().to_string();
            let dimension = Dimension::from_rubric_id(&id);
            if dimension.is_none() {
                warnings.push(format!("rubric {id:?} does not name a known dimension"));
            }
            let bands = rubric
                .bands
                .into_iter()
                .filter_map(|band| convert_band(band, &id, &mut seen, warnings))
                .collect();
            Rubric {
                name: rubric.name.unwrap_or_else(|| id.clone()),
                id,
                dimension,
                bands,
            }
        })
        .collect()
}

fn convert_band(
    raw: RawBand,
    rubric_id: &str,
    seen: &mut HashSet<String>,
    warnings: &mut Warnings,
) -> Option<Band> {
    let Some(id) = raw
        .band_id
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
    else {
        warnings.push(format!("dropped band without id in rubric {rubric_id}"));
        return None;
    };
    if !seen.insert(id.clone()) {
        warnings.push(format!("dropped duplicate band {id} in rubric {rubric_id}"));
        return None;
    }
    Some(Band {
        label: raw.label.unwrap_or_else(|| id.clone()),
        id: BandId::new(id),
        description: raw.description.unwrap_or_default(),
        learner_observations: raw.learner_obs.unwrap_or_default(),
        ai_observations: raw.ai_obs.unwrap_or_default(),
        fix: raw.fix.filter(|f| !f.trim().is_empty()),
        directive: raw.fix_ref.as_deref().and_then(DirectiveId::parse_active),
        principle: raw.didactic_principle.filter(|p| !p.trim().is_empty()),
        flag: raw.flag.filter(|f| !f.trim().is_empty()),
    })
}

fn collect_signals(
    diagnostics: &[(String, RawDiagnostic)],
    warnings: &mut Warnings,
) -> Vec<Signal> {
    let mut signals = Vec::new();
    for (name, diagnostic) in diagnostics {
        for (idx, raw) in diagnostic.signals.iter().enumerate() {
            let Some(severity) = raw.severity.as_deref().and_then(Severity::parse) else {
                warnings.push(format!(
                    "dropped signal {name}[{idx}]: missing or unknown severity {:?}",
                    raw.severity
                ));
                continue;
            };

            let mut conditions = Vec::with_capacity(raw.condition.0.len());
            let mut unresolved = Vec::new();
            for (key, bands) in &raw.condition.0 {
                match Dimension::from_rubric_id(key) {
                    Some(dimension) => conditions.push(SignalCondition {
                        dimension,
                        allowed: bands.iter().map(|b| BandId::new(b.trim())).collect(),
                    }),
                    None => unresolved.push(key.as_str()),
                }
            }
            if conditions.is_empty() || !unresolved.is_empty() {
                warnings.push(format!(
                    "dropped signal {name}[{idx}]: empty or unresolvable condition (unknown keys: {unresolved:?})"
                ));
                continue;
            }

            let recommended = raw
                .recommended_interventions
                .as_ref()
                .unwrap_or(&diagnostic.recommended_interventions)
                .iter()
                .filter_map(|id| DirectiveId::parse_active(id))
                .collect();

            signals.push(Signal {
                diagnostic: name.clone(),
                conditions,
                severity,
                message: raw
                    .message
                    .clone()
                    .or_else(|| diagnostic.description.clone())
                    .unwrap_or_default(),
                recommended,
            });
        }
    }
    signals
}

fn processing_order(order: &[String], warnings: &mut Warnings) -> Vec<Dimension> {
    let mut dims: Vec<Dimension> = Vec::with_capacity(order.len());
    for key in order {
        match Dimension::from_rubric_id(key) {
            Some(dim) if !dims.contains(&dim) => dims.push(dim),
            Some(_) => {}
            None => warnings.push(format!("ignored unknown entry {key:?} in processing order")),
        }
    }
    dims
}
