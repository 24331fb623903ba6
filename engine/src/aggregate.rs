//! Session state and the per-turn fold.
//!
//! [`fold`] is a pure function from the previous state plus one turn to the
//! next state. Nothing is mutated in place; the previous value stays valid,
//! which is what lets a caller drop a stale reply without any undo logic.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use didactic_types::{BandId, Dimension, DimensionClass, DirectiveId, TurnAnalysis, TurnMetrics};
use serde::{Deserialize, Serialize};

/// Snapshot appended to history for every accepted turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// 1-based turn number.
    pub turn: u64,
    /// Full band map after this turn.
    pub bands: BTreeMap<Dimension, BandId>,
    /// First task-density band, else first co-regulation band. Display only.
    pub primary_band: Option<BandId>,
    pub content_bands: Vec<BandId>,
    pub skill_bands: Vec<BandId>,
    pub timestamp: DateTime<Utc>,
}

/// Accumulated record of one conversation.
///
/// Owned by exactly one session. Every turn produces a new value via
/// [`fold`]; there are no mutating methods.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    turn_counter: u64,
    current_bands: BTreeMap<Dimension, BandId>,
    current_phase: Option<BandId>,
    active_fix: Option<DirectiveId>,
    cognitive_mode: Option<String>,
    epistemic_status: Option<String>,
    history: Vec<HistoryEntry>,
    metrics: Option<TurnMetrics>,
}

impl SessionState {
    /// Turn 0: no bands, no history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn turn_counter(&self) -> u64 {
        self.turn_counter
    }

    /// Most recently seen band per dimension.
    #[must_use]
    pub fn current_bands(&self) -> &BTreeMap<Dimension, BandId> {
        &self.current_bands
    }

    #[must_use]
    pub fn band(&self, dimension: Dimension) -> Option<&BandId> {
        self.current_bands.get(&dimension)
    }

    #[must_use]
    pub fn current_phase(&self) -> Option<&BandId> {
        self.current_phase.as_ref()
    }

    #[must_use]
    pub fn active_fix(&self) -> Option<&DirectiveId> {
        self.active_fix.as_ref()
    }

    #[must_use]
    pub fn cognitive_mode(&self) -> Option<&str> {
        self.cognitive_mode.as_deref()
    }

    #[must_use]
    pub fn epistemic_status(&self) -> Option<&str> {
        self.epistemic_status.as_deref()
    }

    #[must_use]
    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    #[must_use]
    pub fn last_entry(&self) -> Option<&HistoryEntry> {
        self.history.last()
    }

    /// Telemetry of the most recent turn that reported any.
    #[must_use]
    pub fn metrics(&self) -> Option<&TurnMetrics> {
        self.metrics.as_ref()
    }

    /// Messages exchanged so far: one learner and one service message per
    /// accepted turn.
    #[must_use]
    pub fn message_count(&self) -> usize {
        (self.turn_counter as usize).saturating_mul(2)
    }
}

/// Fold one turn into `prev`, stamped with the current time.
#[must_use]
pub fn fold(prev: &SessionState, analysis: &TurnAnalysis, metrics: Option<&TurnMetrics>) -> SessionState {
    fold_at(prev, analysis, metrics, Utc::now())
}

/// Deterministic form of [`fold`].
///
/// Band ids are applied in the order task density, co-regulation, process
/// phase, secondary; a later write to the same dimension wins. Ids that do not
/// resolve to a dimension are skipped. The last non-blank process-phase id
/// becomes the current phase and is written to the process band; without one
/// the previous phase carries forward. A process band in the secondary list
/// still overrides it for this turn.
#[must_use]
pub fn fold_at(
    prev: &SessionState,
    analysis: &TurnAnalysis,
    metrics: Option<&TurnMetrics>,
    timestamp: DateTime<Utc>,
) -> SessionState {
    let mut bands = prev.current_bands.clone();
    apply_bands(
        &mut bands,
        analysis
            .task_densities
            .iter()
            .chain(&analysis.coregulation_bands),
    );

    let current_phase = analysis
        .process_phases
        .iter()
        .rev()
        .find(|id| !id.is_blank())
        .cloned()
        .or_else(|| prev.current_phase.clone());
    if let Some(phase) = &current_phase {
        bands.insert(Dimension::Process, phase.clone());
    }

    apply_bands(&mut bands, &analysis.secondary_dimensions);

    let primary_band = analysis
        .task_densities
        .first()
        .filter(|id| !id.is_blank())
        .or_else(|| analysis.coregulation_bands.first().filter(|id| !id.is_blank()))
        .cloned();

    let (content_bands, skill_bands) = classify(&bands);
    let turn = prev.turn_counter + 1;

    let mut history = Vec::with_capacity(prev.history.len() + 1);
    history.extend_from_slice(&prev.history);
    history.push(HistoryEntry {
        turn,
        bands: bands.clone(),
        primary_band,
        content_bands,
        skill_bands,
        timestamp,
    });

    SessionState {
        turn_counter: turn,
        current_bands: bands,
        current_phase,
        active_fix: analysis.active_fix.apply(prev.active_fix.as_ref()),
        cognitive_mode: analysis
            .cognitive_mode
            .clone()
            .or_else(|| prev.cognitive_mode.clone()),
        epistemic_status: analysis
            .epistemic_status
            .clone()
            .or_else(|| prev.epistemic_status.clone()),
        history,
        metrics: metrics.cloned().or_else(|| prev.metrics.clone()),
    }
}

fn apply_bands<'a>(
    bands: &mut BTreeMap<Dimension, BandId>,
    ids: impl IntoIterator<Item = &'a BandId>,
) {
    for id in ids {
        if let Some(dimension) = id.dimension() {
            bands.insert(dimension, id.clone());
        }
    }
}

/// Split active bands into content and skill lists, in dimension order.
#[must_use]
pub fn classify(bands: &BTreeMap<Dimension, BandId>) -> (Vec<BandId>, Vec<BandId>) {
    let mut content = Vec::new();
    let mut skill = Vec::new();
    for (dimension, band) in bands {
        match dimension.class() {
            DimensionClass::Content => content.push(band.clone()),
            DimensionClass::Skill => skill.push(band.clone()),
        }
    }
    (content, skill)
}
