//! End-to-end session walkthroughs over the bundled catalogs.

use std::sync::Arc;

use didactic_engine::{
    BandId, Catalog, CatalogCache, Diagnostic, Dimension, Locale, RouteReason, RoutingPolicy,
    Session, Severity, Tier, TurnAnalysis, TurnError, parse_reply,
};

fn analysis(json: &str) -> TurnAnalysis {
    serde_json::from_str(json).expect("analysis fixture")
}

#[test]
fn empty_catalog_still_folds_unknown_bands() {
    let mut session = Session::new(Arc::new(Catalog::empty(Locale::En)), RoutingPolicy::default());

    let outcome = session.apply(&analysis(r#"{"task_densities": ["TD5"]}"#), None);

    assert_eq!(outcome.turn, 1);
    assert_eq!(outcome.validation.unknown_bands, vec![BandId::new("TD5")]);
    assert!(outcome.diagnostic.is_nominal());
    assert_eq!(
        session.state().band(Dimension::TaskDensity),
        Some(&BandId::new("TD5"))
    );
}

#[test]
fn ai_dominant_turn_raises_critical_signal() {
    let mut cache = CatalogCache::new();
    let mut session = Session::from_cache(&mut cache, Locale::Nl, RoutingPolicy::default());

    let reply = parse_reply(
        r#"{"conversational_response": "Hier is het volledige antwoord.",
            "analysis": {"task_densities": ["TD5"], "coregulation_bands": ["C1"], "active_fix": "/checkin"}}"#,
    );
    let outcome = session.apply(&reply.analysis, None);

    assert!(outcome.validation.ok(), "{:?}", outcome.validation);
    let Diagnostic::Flagged(hit) = &outcome.diagnostic else {
        panic!("expected a flagged diagnostic, got {:?}", outcome.diagnostic);
    };
    assert_eq!(hit.diagnostic, "PSEUDO_COMPLEXITY_RISK");
    assert_eq!(hit.severity, Severity::Critical);
    assert_eq!(hit.signal_index, 0);
    assert!(hit.recommended.iter().any(|d| d.as_str() == "/devil"));
    assert_eq!(session.diagnostic(), &outcome.diagnostic);
}

#[test]
fn milder_turn_matches_the_high_signal() {
    let mut cache = CatalogCache::new();
    let mut session = Session::from_cache(&mut cache, Locale::Nl, RoutingPolicy::default());

    let outcome = session.apply(
        &analysis(r#"{"task_densities": ["TD4"], "coregulation_bands": ["C3"]}"#),
        None,
    );
    assert_eq!(outcome.diagnostic.severity(), Some(Severity::High));

    let outcome = session.apply(&analysis(r#"{"coregulation_bands": ["C4"]}"#), None);
    assert!(outcome.diagnostic.is_nominal());
}

#[test]
fn directives_and_short_input_route_to_different_tiers() {
    let policy = RoutingPolicy::default();

    let deep = policy.plan("/devil", 0);
    assert_eq!(deep.tier, Tier::Deep);
    assert_eq!(deep.reason, RouteReason::Directive);
    assert_eq!(deep.thinking_budget, Some(4000));

    let fast = policy.plan("hi", 0);
    assert_eq!(fast.tier, Tier::Fast);
    assert_eq!(fast.reason, RouteReason::Default);
    assert_eq!(fast.thinking_budget, None);
}

#[test]
fn session_depth_pushes_routing_to_deep() {
    let mut cache = CatalogCache::new();
    let mut session = Session::from_cache(&mut cache, Locale::En, RoutingPolicy::default());

    for _ in 0..4 {
        let ticket = session.begin_turn("ok");
        assert_eq!(ticket.plan().tier, Tier::Fast);
        session
            .complete_turn(&ticket, &TurnAnalysis::default(), None)
            .expect("fresh ticket");
    }

    let ticket = session.begin_turn("ok");
    assert_eq!(ticket.plan().tier, Tier::Deep);
    assert_eq!(ticket.plan().reason, RouteReason::DeepConversation);
}

#[test]
fn phase_carries_forward_across_turns() {
    let mut cache = CatalogCache::new();
    let mut session = Session::from_cache(&mut cache, Locale::Nl, RoutingPolicy::default());

    session.apply(&analysis(r#"{"process_phases": ["P1", "P2"]}"#), None);
    session.apply(&analysis(r#"{"task_densities": ["TD2"]}"#), None);

    let state = session.state();
    assert_eq!(state.turn_counter(), 2);
    assert_eq!(state.current_phase(), Some(&BandId::new("P2")));
    assert_eq!(state.band(Dimension::Process), Some(&BandId::new("P2")));
    assert_eq!(state.band(Dimension::TaskDensity), Some(&BandId::new("TD2")));
}

#[test]
fn locale_switch_keeps_other_catalog_cached() {
    let mut cache = CatalogCache::new();
    let mut session = Session::from_cache(&mut cache, Locale::Nl, RoutingPolicy::default());
    let dutch = Arc::clone(session.catalog());
    session.apply(&analysis(r#"{"task_densities": ["TD3"]}"#), None);

    assert!(session.switch_locale(&mut cache, Locale::En));
    assert_eq!(session.locale(), Locale::En);
    assert_eq!(session.catalog().locale(), Locale::En);
    assert_eq!(session.state().turn_counter(), 0);

    let cached = cache.cached(Locale::Nl).expect("dutch catalog stays cached");
    assert!(Arc::ptr_eq(&cached, &dutch));

    assert!(session.switch_locale(&mut cache, Locale::Nl));
    assert!(Arc::ptr_eq(session.catalog(), &dutch));
}

#[test]
fn stale_reply_is_discarded() {
    let mut cache = CatalogCache::new();
    let mut session = Session::from_cache(&mut cache, Locale::En, RoutingPolicy::default());

    let first = session.begin_turn("first");
    let second = session.begin_turn("second");

    let td5 = analysis(r#"{"task_densities": ["TD5"]}"#);
    let err = session
        .complete_turn(&first, &td5, None)
        .expect_err("superseded ticket");
    assert!(matches!(err, TurnError::StaleReply { .. }));
    assert_eq!(session.state().turn_counter(), 0);

    let outcome = session
        .complete_turn(&second, &td5, None)
        .expect("current ticket");
    assert_eq!(outcome.turn, 1);
    assert_eq!(
        session.complete_turn(&second, &td5, None),
        Err(TurnError::NoPendingTurn)
    );
}

#[test]
fn garbled_reply_folds_a_neutral_turn() {
    let mut cache = CatalogCache::new();
    let mut session = Session::from_cache(&mut cache, Locale::En, RoutingPolicy::default());
    session.apply(
        &analysis(r#"{"task_densities": ["TD2"], "active_fix": "/devil", "cognitive_mode": "analytical"}"#),
        None,
    );

    let reply = parse_reply("```json\n{\"conversational_response\": \"half");
    assert!(reply.analysis.is_fallback());
    let outcome = session.apply(&reply.analysis, None);

    assert_eq!(outcome.turn, 2);
    let state = session.state();
    assert_eq!(state.band(Dimension::TaskDensity), Some(&BandId::new("TD2")));
    assert_eq!(state.active_fix().map(|d| d.as_str()), Some("/devil"));
    assert_eq!(state.cognitive_mode(), Some("unknown"));
}

#[test]
fn none_directive_clears_the_active_fix() {
    let mut cache = CatalogCache::new();
    let mut session = Session::from_cache(&mut cache, Locale::Nl, RoutingPolicy::default());
    session.apply(&analysis(r#"{"active_fix": "/devil"}"#), None);
    session.apply(&analysis(r#"{"task_densities": ["TD2"]}"#), None);
    assert_eq!(session.state().active_fix().map(|d| d.as_str()), Some("/devil"));

    let reply = parse_reply(r#"{"analysis": {"active_fix": "NONE"}}"#);
    let outcome = session.apply(&reply.analysis, None);
    assert!(outcome.validation.ok());
    assert_eq!(session.state().active_fix(), None);
}

#[test]
fn secondary_process_band_wins_over_carried_phase() {
    let mut cache = CatalogCache::new();
    let mut session = Session::from_cache(&mut cache, Locale::Nl, RoutingPolicy::default());
    session.apply(&analysis(r#"{"process_phases": ["P1"]}"#), None);
    session.apply(&analysis(r#"{"secondary_dimensions": ["P3"]}"#), None);

    let state = session.state();
    assert_eq!(state.band(Dimension::Process), Some(&BandId::new("P3")));
    assert_eq!(state.current_phase(), Some(&BandId::new("P1")));
}
