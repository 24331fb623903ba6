//! Plain-text rendering for CLI output.

use std::fmt::Write;

use didactic_engine::{
    CatalogError, Diagnostic, Directive, IntegrityReport, Locale, RequestPlan, ServiceReply,
    Session, TurnOutcome,
};

pub(crate) fn integrity(
    locale: Locale,
    report: &IntegrityReport,
    warnings: &[String],
    error: Option<&CatalogError>,
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "catalog {locale} v{}", report.version);
    if let Some(error) = error {
        let _ = writeln!(out, "  load error: {error}");
    }
    let _ = writeln!(
        out,
        "  rubrics {}  bands {}  directives {}  signals {}",
        report.rubrics, report.bands, report.directives, report.signals
    );
    for rubric in &report.unresolved_rubrics {
        let _ = writeln!(out, "  unresolved rubric: {rubric}");
    }
    for dangling in &report.dangling {
        let _ = writeln!(out, "  dangling: {dangling}");
    }
    for warning in warnings {
        let _ = writeln!(out, "  dropped: {warning}");
    }
    let verdict = if error.is_none() && report.is_sound() {
        "sound"
    } else {
        "UNSOUND"
    };
    let _ = writeln!(out, "  {verdict}");
    out
}

pub(crate) fn plan(plan: &RequestPlan) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "tier: {} ({:?})", plan.tier.as_str(), plan.reason);
    let _ = writeln!(out, "model: {}", plan.model);
    let _ = writeln!(out, "temperature: {}", plan.temperature);
    match plan.thinking_budget {
        Some(budget) => {
            let _ = writeln!(out, "thinking budget: {budget}");
        }
        None => {
            let _ = writeln!(out, "thinking budget: none");
        }
    }
    out
}

pub(crate) fn directives(found: &[&Directive]) -> String {
    let width = found
        .iter()
        .map(|d| d.id.as_str().chars().count())
        .max()
        .unwrap_or(0);
    let mut out = String::new();
    for directive in found {
        let _ = writeln!(
            out,
            "{:<width$}  {}",
            directive.id.as_str(),
            directive.instruction
        );
    }
    if found.is_empty() {
        out.push_str("no matching directives\n");
    }
    out
}

pub(crate) fn turn(session: &Session, reply: &ServiceReply, outcome: &TurnOutcome) -> String {
    let mut out = String::new();
    let bands = session
        .state()
        .current_bands()
        .iter()
        .map(|(dimension, band)| format!("{dimension}={band}"))
        .collect::<Vec<_>>()
        .join(" ");
    let _ = writeln!(out, "turn {}: {bands}", outcome.turn);
    if reply.analysis.is_fallback() {
        let _ = writeln!(out, "  fallback analysis ({:?})", reply.analysis.provenance);
    }
    if !outcome.validation.ok() {
        let unknown = outcome
            .validation
            .unknown_bands
            .iter()
            .map(ToString::to_string)
            .chain(
                outcome
                    .validation
                    .unknown_directives
                    .iter()
                    .map(ToString::to_string),
            )
            .collect::<Vec<_>>()
            .join(", ");
        let _ = writeln!(out, "  unknown: {unknown}");
    }
    match &outcome.diagnostic {
        Diagnostic::Nominal => {
            let _ = writeln!(out, "  nominal");
        }
        Diagnostic::Flagged(hit) => {
            let recommended = hit
                .recommended
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(" ");
            let _ = writeln!(
                out,
                "  {} {}: {}",
                hit.severity.as_str().to_uppercase(),
                hit.diagnostic,
                hit.message
            );
            if !recommended.is_empty() {
                let _ = writeln!(out, "  recommended: {recommended}");
            }
        }
    }
    out
}
