//! Config files, catalog overrides, and snapshot export on disk.

use std::fs;

use didactic_engine::{
    DidacticConfig, Locale, RouteReason, Session, Tier, default_file_name, export_snapshot,
    parse_reply, persist_locale_at, read_snapshot,
};

const SMALL_CATALOG: &str = r#"
version = "2.1.0"

[command_library.commands]
"/a" = "First."
"/b" = "Second."
"/c" = "Third."
"/d" = "Fourth."
"/e" = "Fifth."

[[rubrics]]
rubric_id = "TD_TaskDensity"

[[rubrics.bands]]
band_id = "TD1"
fix_ref = "/a"

[[rubrics.bands]]
band_id = "TD5"
fix_ref = "/e"

[didactic_diagnostics.OVERLOAD]
description = "Learner is doing almost nothing."
recommended_interventions = ["/b"]

[[didactic_diagnostics.OVERLOAD.signals]]
severity = "medium"
if = { TD = ["TD5"] }
"#;

#[test]
fn configured_catalog_and_routing_drive_a_session() {
    let dir = tempfile::tempdir().expect("tempdir");
    let catalog_path = dir.path().join("rules.toml");
    fs::write(&catalog_path, SMALL_CATALOG).expect("write catalog");
    let config_path = dir.path().join("config.toml");
    fs::write(
        &config_path,
        format!(
            "[app]\nlocale = \"en\"\n\n[catalog]\nen = {:?}\n\n[routing]\ndepth_threshold = 2\ndeep_thinking_budget = 0\n",
            catalog_path.display().to_string()
        ),
    )
    .expect("write config");

    let config = DidacticConfig::load_from(&config_path)
        .expect("valid config")
        .expect("config present");
    assert_eq!(config.locale(), Locale::En);

    let mut cache = config.catalog_cache();
    let mut session = Session::from_cache(&mut cache, config.locale(), config.routing_policy());
    assert_eq!(session.catalog().version(), "2.1.0");
    assert!(session.catalog().integrity().is_sound());
    assert!(cache.warnings(Locale::En).is_empty());

    let outcome = session.apply(
        &parse_reply(r#"{"analysis": {"task_densities": ["TD5"]}}"#).analysis,
        None,
    );
    let hit = outcome.diagnostic.signal().expect("overload signal");
    assert_eq!(hit.diagnostic, "OVERLOAD");
    assert_eq!(hit.message, "Learner is doing almost nothing.");
    assert_eq!(hit.recommended.len(), 1);

    session.apply(&parse_reply("{}").analysis, None);
    let ticket = session.begin_turn("ok");
    assert_eq!(ticket.plan().tier, Tier::Deep);
    assert_eq!(ticket.plan().reason, RouteReason::DeepConversation);
    assert_eq!(ticket.plan().thinking_budget, None);
}

#[test]
fn missing_catalog_file_degrades_to_empty() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config_path = dir.path().join("config.toml");
    fs::write(
        &config_path,
        format!(
            "[catalog]\nnl = {:?}\n",
            dir.path().join("absent.json").display().to_string()
        ),
    )
    .expect("write config");

    let config = DidacticConfig::load_from(&config_path)
        .expect("valid config")
        .expect("config present");
    let mut cache = config.catalog_cache();
    let catalog = cache.get(Locale::Nl);
    assert!(catalog.is_empty());
    assert!(cache.last_error(Locale::Nl).is_some());
    assert!(!catalog.integrity().is_sound());
    assert!(!cache.get(Locale::En).is_empty());
}

#[test]
fn persisted_locale_keeps_other_settings() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("nested").join("config.toml");
    persist_locale_at(&path, Locale::En).expect("create config");

    let config = DidacticConfig::load_from(&path)
        .expect("valid config")
        .expect("config present");
    assert_eq!(config.locale(), Locale::En);

    fs::write(
        &path,
        "# tutor settings\n[app]\nlocale = \"en\"\n\n[routing]\nlength_threshold = 10\n",
    )
    .expect("rewrite config");
    persist_locale_at(&path, Locale::Nl).expect("update config");

    let text = fs::read_to_string(&path).expect("read config");
    assert!(text.contains("# tutor settings"));
    assert!(text.contains("length_threshold = 10"));
    let config = DidacticConfig::load_from(&path)
        .expect("valid config")
        .expect("config present");
    assert_eq!(config.locale(), Locale::Nl);
    assert_eq!(config.routing_policy().length_threshold, 10);
}

#[test]
fn exported_snapshot_reads_back() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = DidacticConfig::default();
    let mut cache = config.catalog_cache();
    let mut session = Session::from_cache(&mut cache, Locale::Nl, config.routing_policy());
    for line in [
        r#"{"analysis": {"task_densities": ["TD5"], "coregulation_bands": ["C2"], "process_phases": ["P1"]}}"#,
        r#"{"conversational_response": "ok", "analysis": {"secondary_dimensions": ["V2"]}}"#,
        "",
    ] {
        session.apply(&parse_reply(line).analysis, None);
    }

    let snapshot = session.snapshot();
    let path = dir
        .path()
        .join("exports")
        .join(default_file_name(snapshot.exported_at));
    export_snapshot(&path, &snapshot).expect("export");

    let restored = read_snapshot(&path).expect("read back");
    assert_eq!(restored, snapshot);
    assert_eq!(restored.state.turn_counter(), 3);
    assert_eq!(restored.state.history().len(), 3);
    assert_eq!(restored.locale, Locale::Nl);
    assert!(restored.catalog_fingerprint.is_some());
    assert!(!restored.diagnostic.is_nominal());
}
