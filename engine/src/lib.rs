//! Session didactic state engine.
//!
//! The turn pipeline is validate → fold → evaluate, with tier routing before
//! each outbound call. Every step is a plain function over owned values;
//! [`Session`] is the caller-owned context that strings them together and
//! rejects stale replies. No engine function touches global state or does I/O,
//! apart from the explicit config and export helpers.

mod aggregate;
mod atomic_write;
mod config;
mod diagnostics;
mod export;
mod reply;
mod routing;
mod session;
mod validate;

pub use aggregate::{HistoryEntry, SessionState, classify, fold, fold_at};
pub use config::{
    AppConfig, CatalogConfig, ConfigError, DidacticConfig, ExportConfig, RoutingConfig,
    config_path, expand_env_vars, expand_path, persist_locale_at,
};
pub use diagnostics::{Diagnostic, SignalMatch, evaluate};
pub use export::{
    ExportError, SNAPSHOT_SCHEMA_VERSION, SessionSnapshot, default_file_name, export_snapshot,
    read_snapshot,
};
pub use reply::{ServiceReply, parse_reply, strip_code_fence};
pub use routing::{
    DEFAULT_DEEP_MODEL, DEFAULT_DEEP_THINKING_BUDGET, DEFAULT_DEPTH_THRESHOLD,
    DEFAULT_DIRECTIVE_PREFIX, DEFAULT_FAST_MODEL, DEFAULT_LENGTH_THRESHOLD, DEFAULT_TEMPERATURE,
    RequestPlan, RouteReason, RoutingPolicy, select_tier,
};
pub use session::{Session, TurnError, TurnOutcome, TurnTicket};
pub use validate::{ValidationReport, validate};

// Re-export from crates for public API
pub use didactic_catalog::{
    Band, BandRef, Catalog, CatalogCache, CatalogError, CatalogSource, Directive,
    IntegrityReport, LoadedCatalog,
};
pub use didactic_types::{
    BandId, Dimension, DimensionClass, DirectiveId, FallbackReason, FixUpdate, Locale, Provenance,
    Severity, Tier, TurnAnalysis, TurnMetrics,
};
