//! The caller-owned session context.
//!
//! A [`Session`] bundles one conversation's state with the catalog it is
//! validated against and the routing policy for outbound requests. Turns are
//! strictly sequential: [`Session::begin_turn`] issues a ticket, and only the
//! reply for the newest ticket, issued against the current turn, is folded.

use std::sync::Arc;

use chrono::Utc;
use didactic_catalog::{BandRef, Catalog, CatalogCache};
use didactic_types::{Locale, TurnAnalysis, TurnMetrics};
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::export::{SNAPSHOT_SCHEMA_VERSION, SessionSnapshot};
use crate::routing::{RequestPlan, RoutingPolicy};
use crate::{Diagnostic, SessionState, ValidationReport, evaluate, fold, validate};

/// Why a reply was not folded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TurnError {
    /// The ticket was superseded, abandoned, or issued before a later turn
    /// was accepted.
    #[error("stale reply for request {sequence} (issued at turn {base_turn}, session is at turn {current_turn})")]
    StaleReply {
        sequence: u64,
        base_turn: u64,
        current_turn: u64,
    },
    #[error("no turn is pending")]
    NoPendingTurn,
}

/// Proof that a turn was started. Hand it back with the reply.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnTicket {
    sequence: u64,
    base_turn: u64,
    plan: RequestPlan,
}

impl TurnTicket {
    /// Monotonic per session; a newer ticket always has a larger sequence.
    #[must_use]
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Turn counter at the moment the ticket was issued.
    #[must_use]
    pub fn base_turn(&self) -> u64 {
        self.base_turn
    }

    #[must_use]
    pub fn plan(&self) -> &RequestPlan {
        &self.plan
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Pending {
    sequence: u64,
    base_turn: u64,
}

/// What a folded turn produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnOutcome {
    pub turn: u64,
    pub validation: ValidationReport,
    pub diagnostic: Diagnostic,
}

#[derive(Debug)]
pub struct Session {
    id: Uuid,
    locale: Locale,
    catalog: Arc<Catalog>,
    policy: RoutingPolicy,
    state: SessionState,
    diagnostic: Diagnostic,
    validation: ValidationReport,
    pending: Option<Pending>,
    next_sequence: u64,
}

impl Session {
    #[must_use]
    pub fn new(catalog: Arc<Catalog>, policy: RoutingPolicy) -> Self {
        let session = Self {
            id: Uuid::new_v4(),
            locale: catalog.locale(),
            catalog,
            policy,
            state: SessionState::new(),
            diagnostic: Diagnostic::Nominal,
            validation: ValidationReport::default(),
            pending: None,
            next_sequence: 1,
        };
        info!(
            session = %session.id,
            locale = %session.locale,
            catalog_version = session.catalog.version(),
            "session started"
        );
        session
    }

    /// Start a session for `locale` using the cached catalog.
    pub fn from_cache(cache: &mut CatalogCache, locale: Locale, policy: RoutingPolicy) -> Self {
        Self::new(cache.get(locale), policy)
    }

    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    #[must_use]
    pub fn locale(&self) -> Locale {
        self.locale
    }

    #[must_use]
    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    #[must_use]
    pub fn policy(&self) -> &RoutingPolicy {
        &self.policy
    }

    #[must_use]
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Diagnostic for the current state.
    #[must_use]
    pub fn diagnostic(&self) -> &Diagnostic {
        &self.diagnostic
    }

    /// Validation result of the most recent turn.
    #[must_use]
    pub fn validation(&self) -> &ValidationReport {
        &self.validation
    }

    #[must_use]
    pub fn has_pending_turn(&self) -> bool {
        self.pending.is_some()
    }

    /// Messages exchanged so far, as seen by routing.
    #[must_use]
    pub fn conversation_depth(&self) -> usize {
        self.state.message_count()
    }

    /// Route `input` and mark a turn as in flight. Supersedes any pending turn.
    pub fn begin_turn(&mut self, input: &str) -> TurnTicket {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        let base_turn = self.state.turn_counter();

        if let Some(previous) = self.pending.replace(Pending {
            sequence,
            base_turn,
        }) {
            warn!(
                session = %self.id,
                superseded = previous.sequence,
                sequence,
                "new turn started while a reply was still pending"
            );
        }

        TurnTicket {
            sequence,
            base_turn,
            plan: self.policy.plan(input, self.conversation_depth()),
        }
    }

    /// Fold the reply for `ticket`. State is untouched on error.
    pub fn complete_turn(
        &mut self,
        ticket: &TurnTicket,
        analysis: &TurnAnalysis,
        metrics: Option<&TurnMetrics>,
    ) -> Result<TurnOutcome, TurnError> {
        let Some(pending) = self.pending else {
            warn!(session = %self.id, sequence = ticket.sequence, "reply arrived with no pending turn");
            return Err(TurnError::NoPendingTurn);
        };
        let current_turn = self.state.turn_counter();
        if pending.sequence != ticket.sequence || ticket.base_turn != current_turn {
            warn!(
                session = %self.id,
                sequence = ticket.sequence,
                pending = pending.sequence,
                current_turn,
                "discarding stale reply"
            );
            return Err(TurnError::StaleReply {
                sequence: ticket.sequence,
                base_turn: ticket.base_turn,
                current_turn,
            });
        }

        self.pending = None;
        Ok(self.apply(analysis, metrics))
    }

    /// Drop the pending turn without touching state. Returns whether `ticket`
    /// was the pending one.
    pub fn abandon_turn(&mut self, ticket: &TurnTicket) -> bool {
        match self.pending {
            Some(pending) if pending.sequence == ticket.sequence => {
                self.pending = None;
                info!(session = %self.id, sequence = ticket.sequence, "turn abandoned");
                true
            }
            _ => false,
        }
    }

    /// Validate, fold, and re-evaluate in one step, bypassing ticket checks.
    pub fn apply(&mut self, analysis: &TurnAnalysis, metrics: Option<&TurnMetrics>) -> TurnOutcome {
        let validation = validate(analysis, &self.catalog);
        if !validation.ok() {
            warn!(
                session = %self.id,
                turn = self.state.turn_counter() + 1,
                unknown_bands = ?validation.unknown_bands,
                unknown_directives = ?validation.unknown_directives,
                "turn references identifiers outside the catalog"
            );
        }
        if analysis.is_fallback() {
            warn!(
                session = %self.id,
                provenance = ?analysis.provenance,
                "folding fallback analysis"
            );
        }

        let next = fold(&self.state, analysis, metrics);
        let diagnostic = evaluate(&next, &self.catalog);
        self.state = next;
        self.diagnostic = diagnostic;
        self.validation = validation;

        TurnOutcome {
            turn: self.state.turn_counter(),
            validation: self.validation.clone(),
            diagnostic: self.diagnostic.clone(),
        }
    }

    /// Back to turn 0 under a fresh session id. The catalog is kept.
    pub fn reset(&mut self) {
        let previous = self.id;
        self.id = Uuid::new_v4();
        self.state = SessionState::new();
        self.diagnostic = Diagnostic::Nominal;
        self.validation = ValidationReport::default();
        self.pending = None;
        info!(previous = %previous, session = %self.id, "session reset");
    }

    /// Switch to `locale`'s catalog and reset. History does not carry across
    /// catalogs. Returns `false` when already on `locale`.
    pub fn switch_locale(&mut self, cache: &mut CatalogCache, locale: Locale) -> bool {
        if locale == self.locale {
            return false;
        }
        let from = self.locale;
        self.catalog = cache.get(locale);
        self.locale = locale;
        self.reset();
        info!(
            from = %from,
            to = %locale,
            catalog_version = self.catalog.version(),
            "switched locale"
        );
        true
    }

    /// Catalog details for every currently active band.
    #[must_use]
    pub fn describe_active(&self) -> Vec<BandRef<'_>> {
        self.catalog.describe_active(self.state.current_bands())
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            schema_version: SNAPSHOT_SCHEMA_VERSION,
            session_id: self.id,
            locale: self.locale,
            catalog_version: self.catalog.version().to_string(),
            catalog_fingerprint: self.catalog.metadata().fingerprint.clone(),
            exported_at: Utc::now(),
            state: self.state.clone(),
            diagnostic: self.diagnostic.clone(),
            validation: self.validation.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use didactic_types::{BandId, Dimension, Severity, Tier};

    use super::*;

    fn session(locale: Locale) -> (CatalogCache, Session) {
        let mut cache = CatalogCache::new();
        let session = Session::from_cache(&mut cache, locale, RoutingPolicy::default());
        (cache, session)
    }

    fn risky() -> TurnAnalysis {
        TurnAnalysis {
            task_densities: vec!["TD5".into()],
            coregulation_bands: vec!["C1".into()],
            ..TurnAnalysis::default()
        }
    }

    #[test]
    fn ticket_round_trip_folds_once() {
        let (_cache, mut session) = session(Locale::Nl);
        let ticket = session.begin_turn("hi");
        assert_eq!(ticket.plan().tier, Tier::Fast);
        assert!(session.has_pending_turn());

        let outcome = session.complete_turn(&ticket, &risky(), None).unwrap();
        assert_eq!(outcome.turn, 1);
        assert_eq!(outcome.diagnostic.severity(), Some(Severity::Critical));
        assert!(!session.has_pending_turn());

        let again = session.complete_turn(&ticket, &risky(), None);
        assert_eq!(again, Err(TurnError::NoPendingTurn));
        assert_eq!(session.state().turn_counter(), 1);
    }

    #[test]
    fn superseded_ticket_is_stale() {
        let (_cache, mut session) = session(Locale::Nl);
        let old = session.begin_turn("first");
        let new = session.begin_turn("second");
        assert!(new.sequence() > old.sequence());

        let err = session.complete_turn(&old, &risky(), None).unwrap_err();
        assert!(matches!(err, TurnError::StaleReply { .. }));
        assert_eq!(session.state().turn_counter(), 0);

        session.complete_turn(&new, &risky(), None).unwrap();
        assert_eq!(session.state().turn_counter(), 1);
    }

    #[test]
    fn ticket_from_before_direct_apply_is_stale() {
        let (_cache, mut session) = session(Locale::En);
        let ticket = session.begin_turn("hi");
        session.apply(&risky(), None);
        let err = session.complete_turn(&ticket, &TurnAnalysis::default(), None).unwrap_err();
        assert_eq!(
            err,
            TurnError::StaleReply {
                sequence: ticket.sequence(),
                base_turn: 0,
                current_turn: 1,
            }
        );
        assert_eq!(session.state().turn_counter(), 1);
    }

    #[test]
    fn abandoned_turn_leaves_state() {
        let (_cache, mut session) = session(Locale::En);
        let ticket = session.begin_turn("hi");
        assert!(session.abandon_turn(&ticket));
        assert!(!session.abandon_turn(&ticket));
        assert_eq!(session.state(), &SessionState::new());
        assert_eq!(
            session.complete_turn(&ticket, &risky(), None),
            Err(TurnError::NoPendingTurn)
        );
    }

    #[test]
    fn depth_grows_two_messages_per_turn() {
        let (_cache, mut session) = session(Locale::En);
        for _ in 0..3 {
            session.apply(&TurnAnalysis::default(), None);
        }
        assert_eq!(session.conversation_depth(), 6);
        assert_eq!(session.begin_turn("hi").plan().tier, Tier::Fast);
        session.apply(&TurnAnalysis::default(), None);
        assert_eq!(session.begin_turn("hi").plan().tier, Tier::Deep);
    }

    #[test]
    fn apply_records_validation_gaps() {
        let (_cache, mut session) = session(Locale::En);
        let analysis = TurnAnalysis {
            secondary_dimensions: vec!["S3".into()],
            ..TurnAnalysis::default()
        };
        // The English catalog has no social-interaction rubric.
        let outcome = session.apply(&analysis, None);
        assert_eq!(outcome.validation.unknown_bands, vec![BandId::new("S3")]);
        assert_eq!(
            session.state().band(Dimension::SocialInteraction),
            Some(&BandId::new("S3"))
        );
    }

    #[test]
    fn reset_clears_state_and_renews_id() {
        let (_cache, mut session) = session(Locale::Nl);
        let id = session.id();
        session.apply(&risky(), None);
        session.begin_turn("hi");
        session.reset();
        assert_ne!(session.id(), id);
        assert_eq!(session.state(), &SessionState::new());
        assert!(session.diagnostic().is_nominal());
        assert!(!session.has_pending_turn());
        assert_eq!(session.locale(), Locale::Nl);
    }

    #[test]
    fn switch_locale_resets_and_swaps_catalog() {
        let (mut cache, mut session) = session(Locale::Nl);
        let nl = Arc::clone(session.catalog());
        session.apply(&risky(), None);

        assert!(session.switch_locale(&mut cache, Locale::En));
        assert_eq!(session.locale(), Locale::En);
        assert_eq!(session.catalog().locale(), Locale::En);
        assert_eq!(session.state().turn_counter(), 0);
        assert!(Arc::ptr_eq(&cache.cached(Locale::Nl).unwrap(), &nl));
        assert!(!session.switch_locale(&mut cache, Locale::En));
    }

    #[test]
    fn snapshot_reflects_session() {
        let (_cache, mut session) = session(Locale::En);
        session.apply(&risky(), None);
        let snapshot = session.snapshot();
        assert_eq!(snapshot.session_id, session.id());
        assert_eq!(snapshot.locale, Locale::En);
        assert_eq!(snapshot.catalog_version, session.catalog().version());
        assert!(snapshot.catalog_fingerprint.is_some());
        assert_eq!(&snapshot.state, session.state());
        assert_eq!(&snapshot.diagnostic, session.diagnostic());
    }

    #[test]
    fn describe_active_uses_catalog() {
        let (_cache, mut session) = session(Locale::En);
        session.apply(&risky(), None);
        let described = session.describe_active();
        let ids: Vec<&str> = described.iter().map(|r| r.band.id.as_str()).collect();
        assert_eq!(ids, vec!["TD5", "C1"]);
    }
}
