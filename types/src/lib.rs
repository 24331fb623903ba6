//! Core domain types for the didactic engine.
//!
//! This crate contains pure domain types with no IO, no async, and minimal dependencies.
//! Everything here can be used from any layer of the application.

mod analysis;
mod dimension;

pub use analysis::{
    FallbackReason, FixUpdate, LearnerProfile, MALFORMED_OUTPUT_MARKER, Provenance, TurnAnalysis,
    TurnMetrics, UNKNOWN_LABEL,
};
pub use dimension::{BandId, Dimension, DimensionClass, DirectiveId};

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Locale
// ============================================================================

/// Language a rule catalog is authored in.
///
/// Each locale has its own catalog; sessions never mix them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    Nl,
    En,
}

#[derive(Debug, Error)]
#[error("unsupported locale: {0} (expected nl or en)")]
pub struct LocaleParseError(pub String);

impl Locale {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Locale::Nl => "nl",
            Locale::En => "en",
        }
    }

    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Locale::Nl => "Nederlands",
            Locale::En => "English",
        }
    }

    pub fn parse(value: &str) -> Result<Self, LocaleParseError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "nl" | "nl-nl" | "dutch" => Ok(Locale::Nl),
            "en" | "en-us" | "en-gb" | "english" => Ok(Locale::En),
            _ => Err(LocaleParseError(value.to_string())),
        }
    }

    #[must_use]
    pub fn all() -> &'static [Locale] {
        &[Locale::Nl, Locale::En]
    }
}

impl std::str::FromStr for Locale {
    type Err = LocaleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl std::fmt::Display for Locale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Severity & Tier
// ============================================================================

/// Severity of a diagnostic signal, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "info" => Some(Self::Info),
            "low" => Some(Self::Low),
            "medium" | "moderate" => Some(Self::Medium),
            "high" => Some(Self::High),
            "critical" => Some(Self::Critical),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

/// Compute tier for the next outbound request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Fast, shallow model.
    Fast,
    /// Slow, deep model.
    Deep,
}

impl Tier {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Tier::Fast => "fast",
            Tier::Deep => "deep",
        }
    }
}
