//! Risk diagnostics over the current band map.

use didactic_catalog::Catalog;
use didactic_types::{DirectiveId, Severity};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::SessionState;

/// The signal that fired for a state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalMatch {
    /// Name of the catalog diagnostic the signal belongs to.
    pub diagnostic: String,
    /// Position of the signal in the catalog's signal list.
    pub signal_index: usize,
    pub severity: Severity,
    pub message: String,
    pub recommended: Vec<DirectiveId>,
}

/// Exactly one diagnostic per evaluation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Diagnostic {
    #[default]
    Nominal,
    Flagged(SignalMatch),
}

impl Diagnostic {
    #[must_use]
    pub fn is_nominal(&self) -> bool {
        matches!(self, Diagnostic::Nominal)
    }

    #[must_use]
    pub fn severity(&self) -> Option<Severity> {
        match self {
            Diagnostic::Nominal => None,
            Diagnostic::Flagged(hit) => Some(hit.severity),
        }
    }

    #[must_use]
    pub fn signal(&self) -> Option<&SignalMatch> {
        match self {
            Diagnostic::Nominal => None,
            Diagnostic::Flagged(hit) => Some(hit),
        }
    }
}

/// Return the first catalog signal whose conditions all hold for `state`.
///
/// Signals are tried in catalog order and evaluation stops at the first hit,
/// so a catalog must list its most severe signals first.
#[must_use]
pub fn evaluate(state: &SessionState, catalog: &Catalog) -> Diagnostic {
    let bands = state.current_bands();
    let Some((signal_index, signal)) = catalog
        .signals()
        .iter()
        .enumerate()
        .find(|(_, signal)| signal.matches(bands))
    else {
        return Diagnostic::Nominal;
    };

    debug!(
        diagnostic = %signal.diagnostic,
        severity = signal.severity.as_str(),
        turn = state.turn_counter(),
        "risk signal matched"
    );
    Diagnostic::Flagged(SignalMatch {
        diagnostic: signal.diagnostic.clone(),
        signal_index,
        severity: signal.severity,
        message: signal.message.clone(),
        recommended: signal.recommended.clone(),
    })
}
