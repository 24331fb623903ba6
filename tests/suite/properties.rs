//! Invariants that must hold for any sequence of turns.

use chrono::{TimeZone, Utc};
use didactic_engine::{
    BandId, CatalogCache, Dimension, Locale, RoutingPolicy, SessionState, TurnAnalysis, classify,
    evaluate, fold, fold_at, validate,
};

fn turns() -> Vec<TurnAnalysis> {
    [
        r#"{"task_densities": ["TD1"], "process_phases": ["P0"]}"#,
        r#"{"coregulation_bands": ["C2"], "secondary_dimensions": ["V3", "B1"]}"#,
        r#"{"task_densities": ["TD5", "TD4"], "active_fix": "/devil"}"#,
        r#"{}"#,
        r#"{"task_densities": ["TD9"], "process_phases": ["", "P3"], "secondary_dimensions": ["S2", "X1"]}"#,
        r#"{"coregulation_bands": ["C5"], "cognitive_mode": "reflective"}"#,
    ]
    .iter()
    .map(|raw| serde_json::from_str(raw).expect("analysis fixture"))
    .collect()
}

#[test]
fn counter_advances_by_one_and_history_only_grows() {
    let mut state = SessionState::new();
    for analysis in turns() {
        let next = fold(&state, &analysis, None);
        assert_eq!(next.turn_counter(), state.turn_counter() + 1);
        assert_eq!(next.history().len(), state.history().len() + 1);
        assert_eq!(&next.history()[..state.history().len()], state.history());
        assert_eq!(
            next.last_entry().map(|entry| entry.turn),
            Some(next.turn_counter())
        );
        state = next;
    }
}

#[test]
fn fold_leaves_previous_state_untouched() {
    let at = Utc.with_ymd_and_hms(2026, 3, 1, 9, 30, 0).single().expect("valid date");
    let mut state = SessionState::new();
    for analysis in turns() {
        let before = state.clone();
        let next = fold_at(&state, &analysis, None, at);
        assert_eq!(state, before);
        assert_eq!(fold_at(&state, &analysis, None, at), next);
        state = next;
    }
}

#[test]
fn history_classification_matches_current_bands() {
    let mut state = SessionState::new();
    for analysis in turns() {
        state = fold(&state, &analysis, None);
        let entry = state.last_entry().expect("entry per turn");
        let (content, skill) = classify(state.current_bands());
        assert_eq!(entry.content_bands, content);
        assert_eq!(entry.skill_bands, skill);
        assert_eq!(classify(&entry.bands), (content, skill));
    }
}

#[test]
fn every_band_lands_in_exactly_one_class() {
    let mut state = SessionState::new();
    for analysis in turns() {
        state = fold(&state, &analysis, None);
    }
    let (content, skill) = classify(state.current_bands());
    assert_eq!(content.len() + skill.len(), state.current_bands().len());
    assert!(content.iter().all(|band| !skill.contains(band)));
    assert_eq!(state.band(Dimension::TaskDensity), Some(&BandId::new("TD9")));
    assert_eq!(state.band(Dimension::Process), Some(&BandId::new("P3")));
}

#[test]
fn validation_does_not_change_the_analysis() {
    let catalog = CatalogCache::new().get(Locale::En);
    for analysis in turns() {
        let before = analysis.clone();
        let first = validate(&analysis, &catalog);
        let second = validate(&analysis, &catalog);
        assert_eq!(analysis, before);
        assert_eq!(first, second);
    }
}

#[test]
fn unknown_ids_are_reported_but_state_still_folds() {
    let catalog = CatalogCache::new().get(Locale::En);
    let analysis = &turns()[4];
    let report = validate(analysis, &catalog);
    assert_eq!(
        report.unknown_bands,
        vec![BandId::new("TD9"), BandId::new("S2"), BandId::new("X1")]
    );

    let state = fold(&SessionState::new(), analysis, None);
    assert_eq!(state.band(Dimension::SocialInteraction), Some(&BandId::new("S2")));
    assert_eq!(state.current_bands().len(), 3);
}

#[test]
fn routing_is_a_pure_function_of_input_and_depth() {
    let policy = RoutingPolicy::default();
    let long = "x".repeat(61);
    let exact = "é".repeat(60);
    for (input, depth) in [
        ("hi", 0),
        ("/schema", 0),
        (long.as_str(), 0),
        (exact.as_str(), 0),
        ("hi", 6),
        ("hi", 7),
    ] {
        let first = policy.plan(input, depth);
        for _ in 0..3 {
            assert_eq!(policy.plan(input, depth), first);
        }
        assert_eq!(didactic_engine::select_tier(input, depth), first.tier);
    }
}

#[test]
fn diagnostics_depend_only_on_current_bands() {
    let catalog = CatalogCache::new().get(Locale::Nl);
    let mut state = SessionState::new();
    for analysis in turns() {
        state = fold(&state, &analysis, None);
        let diagnostic = evaluate(&state, &catalog);
        assert_eq!(evaluate(&state, &catalog), diagnostic);
        let expected = catalog
            .signals()
            .iter()
            .position(|signal| signal.matches(state.current_bands()));
        assert_eq!(
            diagnostic.signal().map(|hit| hit.signal_index),
            expected
        );
    }
}
