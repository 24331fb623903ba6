//! Validated, immutable catalog records.

use std::collections::{BTreeMap, HashMap};

use didactic_types::{BandId, Dimension, DirectiveId, Locale, Severity};
use serde::Serialize;

/// Version reported by a catalog that failed to load.
pub const EMPTY_CATALOG_VERSION: &str = "0.0.0";

/// A catalog-defined corrective instruction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Directive {
    pub id: DirectiveId,
    pub instruction: String,
}

/// One classification value within a dimension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Band {
    pub id: BandId,
    pub label: String,
    pub description: String,
    /// Literal learner-side observations that justify this band.
    pub learner_observations: Vec<String>,
    /// Literal AI-side observations that justify this band.
    pub ai_observations: Vec<String>,
    /// Band-specific wording of the corrective action.
    pub fix: Option<String>,
    /// Directive recommended for this band.
    pub directive: Option<DirectiveId>,
    pub principle: Option<String>,
    pub flag: Option<String>,
}

impl Band {
    #[must_use]
    pub fn dimension(&self) -> Option<Dimension> {
        self.id.dimension()
    }
}

/// A rubric: the ordered bands of one dimension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rubric {
    pub id: String,
    pub name: String,
    /// `None` when the rubric id does not name a known dimension.
    pub dimension: Option<Dimension>,
    pub bands: Vec<Band>,
}

/// Band subset required for one dimension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignalCondition {
    pub dimension: Dimension,
    pub allowed: Vec<BandId>,
}

impl SignalCondition {
    #[must_use]
    pub fn is_satisfied_by(&self, current: Option<&BandId>) -> bool {
        current.is_some_and(|band| self.allowed.contains(band))
    }
}

/// A catalog-declared risk pattern over current bands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Signal {
    /// Name of the diagnostic this signal belongs to.
    pub diagnostic: String,
    pub conditions: Vec<SignalCondition>,
    pub severity: Severity,
    pub message: String,
    pub recommended: Vec<DirectiveId>,
}

impl Signal {
    /// Every named dimension's current band must be in its allowed subset.
    #[must_use]
    pub fn matches(&self, current_bands: &BTreeMap<Dimension, BandId>) -> bool {
        self.conditions
            .iter()
            .all(|condition| condition.is_satisfied_by(current_bands.get(&condition.dimension)))
    }
}

/// Catalog metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogMetadata {
    pub version: String,
    pub system: Option<String>,
    /// Declared processing order of dimensions.
    pub processing_order: Vec<Dimension>,
    /// Hash the document claims for itself, if any.
    pub declared_integrity_hash: Option<String>,
    /// SHA-256 of the raw document text.
    pub fingerprint: Option<String>,
}

impl Default for CatalogMetadata {
    fn default() -> Self {
        Self {
            version: EMPTY_CATALOG_VERSION.to_string(),
            system: None,
            processing_order: Vec::new(),
            declared_integrity_hash: None,
            fingerprint: None,
        }
    }
}

/// A band together with the rubric that declares it.
#[derive(Debug, Clone, Copy)]
pub struct BandRef<'a> {
    pub rubric: &'a Rubric,
    pub band: &'a Band,
}

/// The immutable, locale-scoped rule catalog.
///
/// Built once by [`load`](crate::load); there are no mutating methods.
#[derive(Debug, Clone)]
pub struct Catalog {
    locale: Locale,
    metadata: CatalogMetadata,
    directives: Vec<Directive>,
    directive_index: HashMap<DirectiveId, usize>,
    rubrics: Vec<Rubric>,
    band_index: HashMap<BandId, (usize, usize)>,
    signals: Vec<Signal>,
}

impl Catalog {
    /// A catalog that knows nothing. Used in place of one that failed to load.
    #[must_use]
    pub fn empty(locale: Locale) -> Self {
        Self {
            locale,
            metadata: CatalogMetadata::default(),
            directives: Vec::new(),
            directive_index: HashMap::new(),
            rubrics: Vec::new(),
            band_index: HashMap::new(),
            signals: Vec::new(),
        }
    }

    pub(crate) fn from_parts(
        locale: Locale,
        metadata: CatalogMetadata,
        directives: Vec<Directive>,
        rubrics: Vec<Rubric>,
        signals: Vec<Signal>,
    ) -> Self {
        let directive_index = directives
            .iter()
            .enumerate()
            .map(|(idx, directive)| (directive.id.clone(), idx))
            .collect();
        let band_index = rubrics
            .iter()
            .enumerate()
            .flat_map(|(r, rubric)| {
                rubric
                    .bands
                    .iter()
                    .enumerate()
                    .map(move |(b, band)| (band.id.clone(), (r, b)))
            })
            .collect();
        Self {
            locale,
            metadata,
            directives,
            directive_index,
            rubrics,
            band_index,
            signals,
        }
    }

    #[must_use]
    pub fn locale(&self) -> Locale {
        self.locale
    }

    #[must_use]
    pub fn metadata(&self) -> &CatalogMetadata {
        &self.metadata
    }

    #[must_use]
    pub fn version(&self) -> &str {
        &self.metadata.version
    }

    /// True when no directives and no bands are known.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.directives.is_empty() && self.band_index.is_empty()
    }

    #[must_use]
    pub fn directives(&self) -> &[Directive] {
        &self.directives
    }

    #[must_use]
    pub fn rubrics(&self) -> &[Rubric] {
        &self.rubrics
    }

    /// Signals in declaration order, most severe first by authoring convention.
    #[must_use]
    pub fn signals(&self) -> &[Signal] {
        &self.signals
    }

    /// All bands, flattened in rubric order.
    pub fn bands(&self) -> impl Iterator<Item = &Band> {
        self.rubrics.iter().flat_map(|rubric| rubric.bands.iter())
    }

    #[must_use]
    pub fn band_count(&self) -> usize {
        self.band_index.len()
    }

    #[must_use]
    pub fn contains_band(&self, id: &BandId) -> bool {
        self.band_index.contains_key(id)
    }

    #[must_use]
    pub fn contains_directive(&self, id: &DirectiveId) -> bool {
        self.directive_index.contains_key(id)
    }

    #[must_use]
    pub fn band(&self, id: &BandId) -> Option<BandRef<'_>> {
        let &(r, b) = self.band_index.get(id)?;
        let rubric = &self.rubrics[r];
        Some(BandRef {
            rubric,
            band: &rubric.bands[b],
        })
    }

    #[must_use]
    pub fn directive(&self, id: &DirectiveId) -> Option<&Directive> {
        self.directive_index.get(id).map(|&idx| &self.directives[idx])
    }

    #[must_use]
    pub fn rubric_for(&self, dimension: Dimension) -> Option<&Rubric> {
        self.rubrics
            .iter()
            .find(|rubric| rubric.dimension == Some(dimension))
    }

    /// Case-insensitive substring search over directive ids and instructions.
    ///
    /// A blank term returns every directive.
    #[must_use]
    pub fn search_directives(&self, term: &str) -> Vec<&Directive> {
        let needle = term.trim().to_lowercase();
        self.directives
            .iter()
            .filter(|directive| {
                needle.is_empty()
                    || directive.id.as_str().to_lowercase().contains(&needle)
                    || directive.instruction.to_lowercase().contains(&needle)
            })
            .collect()
    }

    /// Catalog details for each currently active band, in dimension order.
    ///
    /// Bands the catalog does not know are skipped.
    #[must_use]
    pub fn describe_active<'a>(
        &'a self,
        current_bands: &BTreeMap<Dimension, BandId>,
    ) -> Vec<BandRef<'a>> {
        current_bands
            .values()
            .filter_map(|id| self.band(id))
            .collect()
    }
}
