//! Structural self-check of a loaded catalog.

use std::fmt;

use didactic_types::{BandId, DirectiveId};
use serde::Serialize;

use crate::Catalog;

/// A catalog needs at least this many rubrics to be usable.
pub const MIN_RUBRICS: usize = 1;
/// A catalog needs at least this many directives to be usable.
pub const MIN_DIRECTIVES: usize = 5;

/// A reference to a directive the catalog does not define.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "from", rename_all = "snake_case")]
pub enum DanglingReference {
    /// A band's `fix_ref`.
    Band {
        band: BandId,
        directive: DirectiveId,
    },
    /// A signal's recommended intervention.
    Signal {
        diagnostic: String,
        directive: DirectiveId,
    },
}

impl fmt::Display for DanglingReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DanglingReference::Band { band, directive } => {
                write!(f, "band {band} refers to unknown directive {directive}")
            }
            DanglingReference::Signal {
                diagnostic,
                directive,
            } => write!(f, "{diagnostic} recommends unknown directive {directive}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IntegrityReport {
    pub version: String,
    pub rubrics: usize,
    pub bands: usize,
    pub directives: usize,
    pub signals: usize,
    /// Rubric ids that do not name a known dimension.
    pub unresolved_rubrics: Vec<String>,
    pub dangling: Vec<DanglingReference>,
}

impl IntegrityReport {
    #[must_use]
    pub fn is_sound(&self) -> bool {
        self.rubrics >= MIN_RUBRICS
            && self.directives >= MIN_DIRECTIVES
            && self.unresolved_rubrics.is_empty()
            && self.dangling.is_empty()
    }
}

impl Catalog {
    #[must_use]
    pub fn integrity(&self) -> IntegrityReport {
        let mut dangling = Vec::new();
        for band in self.bands() {
            if let Some(directive) = &band.directive
                && !self.contains_directive(directive)
            {
                dangling.push(DanglingReference::Band {
                    band: band.id.clone(),
                    directive: directive.clone(),
                });
            }
        }
        for signal in self.signals() {
            for directive in &signal.recommended {
                if !self.contains_directive(directive) {
                    dangling.push(DanglingReference::Signal {
                        diagnostic: signal.diagnostic.clone(),
                        directive: directive.clone(),
                    });
                }
            }
        }

        IntegrityReport {
            version: self.version().to_string(),
            rubrics: self.rubrics().len(),
            bands: self.band_count(),
            directives: self.directives().len(),
            signals: self.signals().len(),
            unresolved_rubrics: self
                .rubrics()
                .iter()
                .filter(|rubric| rubric.dimension.is_none())
                .map(|rubric| rubric.id.clone())
                .collect(),
            dangling,
        }
    }
}
