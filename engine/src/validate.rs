//! Advisory check of a turn's identifiers against the catalog.
//!
//! Validation never blocks folding. A service naming a band from another
//! catalog version is expected; the gap is reported and folding continues.

use didactic_catalog::Catalog;
use didactic_types::{BandId, DirectiveId, TurnAnalysis};
use serde::{Deserialize, Serialize};

/// Identifiers the catalog does not know, in the order they were seen.
///
/// Duplicates are kept.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub unknown_bands: Vec<BandId>,
    pub unknown_directives: Vec<DirectiveId>,
}

impl ValidationReport {
    #[must_use]
    pub fn ok(&self) -> bool {
        self.unknown_bands.is_empty() && self.unknown_directives.is_empty()
    }
}

/// Compare every band id and the active directive against `catalog`.
///
/// Bands are checked in fold order (task density, co-regulation, process
/// phase, secondary); blank ids are skipped.
#[must_use]
pub fn validate(analysis: &TurnAnalysis, catalog: &Catalog) -> ValidationReport {
    let unknown_bands = analysis
        .band_ids()
        .filter(|id| !id.is_blank() && !catalog.contains_band(id))
        .cloned()
        .collect();
    let unknown_directives = analysis
        .active_fix
        .directive()
        .into_iter()
        .filter(|id| !catalog.contains_directive(id))
        .cloned()
        .collect();
    ValidationReport {
        unknown_bands,
        unknown_directives,
    }
}
