//! Pedagogical dimensions and band identifiers.
//!
//! The dimension set is fixed: catalogs declare rubrics *for* these
//! dimensions, they never introduce new ones. Band ids carry their dimension
//! as a prefix (`TD3`, `C1_AiMonologue`), which is how untrusted turn output
//! gets routed to a dimension without consulting a catalog.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Whether a dimension measures subject content or learner skill.
///
/// Only used for summary reporting in history entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DimensionClass {
    Content,
    Skill,
}

/// A named axis of pedagogical measurement.
///
/// Declaration order is the ordering used for maps keyed by dimension, which
/// keeps derived summaries deterministic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Dimension {
    /// Process phase (orientation, instruction, evaluation, ...).
    #[serde(rename = "P")]
    Process,
    /// Task density: how much of the thinking the AI does.
    #[serde(rename = "TD")]
    TaskDensity,
    /// Co-regulation: who steers the learning process.
    #[serde(rename = "C")]
    CoRegulation,
    #[serde(rename = "V")]
    SkillPotential,
    #[serde(rename = "T")]
    TechIntegration,
    #[serde(rename = "E")]
    EpistemicReliability,
    #[serde(rename = "S")]
    SocialInteraction,
    #[serde(rename = "L")]
    LearningContinuity,
    #[serde(rename = "B")]
    BiasCorrection,
}

impl Dimension {
    pub const ALL: [Dimension; 9] = [
        Dimension::Process,
        Dimension::TaskDensity,
        Dimension::CoRegulation,
        Dimension::SkillPotential,
        Dimension::TechIntegration,
        Dimension::EpistemicReliability,
        Dimension::SocialInteraction,
        Dimension::LearningContinuity,
        Dimension::BiasCorrection,
    ];

    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Dimension::Process => "P",
            Dimension::TaskDensity => "TD",
            Dimension::CoRegulation => "C",
            Dimension::SkillPotential => "V",
            Dimension::TechIntegration => "T",
            Dimension::EpistemicReliability => "E",
            Dimension::SocialInteraction => "S",
            Dimension::LearningContinuity => "L",
            Dimension::BiasCorrection => "B",
        }
    }

    #[must_use]
    pub const fn class(self) -> DimensionClass {
        match self {
            Dimension::SkillPotential
            | Dimension::TechIntegration
            | Dimension::EpistemicReliability
            | Dimension::BiasCorrection => DimensionClass::Content,
            Dimension::Process
            | Dimension::TaskDensity
            | Dimension::CoRegulation
            | Dimension::SocialInteraction
            | Dimension::LearningContinuity => DimensionClass::Skill,
        }
    }

    /// Exact code lookup (`"TD"` → `TaskDensity`).
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|dim| dim.code() == code)
    }

    /// Resolve a rubric or condition key such as `TD_TaskDensity` or `TD`.
    ///
    /// Only the segment before the first `_` is considered.
    #[must_use]
    pub fn from_rubric_id(rubric_id: &str) -> Option<Self> {
        let code = rubric_id.split('_').next().unwrap_or_default();
        Self::from_code(code.trim())
    }

    /// Resolve the dimension a band id belongs to.
    ///
    /// The segment before `_` wins when it is a known code; otherwise the
    /// longest known code prefix is used, so `TD5` resolves to task density
    /// rather than tech integration.
    #[must_use]
    pub fn from_band_id(band_id: &str) -> Option<Self> {
        let band_id = band_id.trim();
        if band_id.is_empty() {
            return None;
        }
        if let Some(dim) = band_id.split('_').next().and_then(Self::from_code) {
            return Some(dim);
        }
        Self::ALL
            .into_iter()
            .filter(|dim| band_id.starts_with(dim.code()))
            .max_by_key(|dim| dim.code().len())
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Identifier of one band, e.g. `TD5`.
///
/// Band ids arrive from an untrusted service, so construction never fails;
/// resolution to a dimension is a separate, fallible step.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BandId(String);

impl BandId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }

    #[must_use]
    pub fn dimension(&self) -> Option<Dimension> {
        Dimension::from_band_id(&self.0)
    }
}

impl From<&str> for BandId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for BandId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl AsRef<str> for BandId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for BandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a directive (a catalog command such as `/devil`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DirectiveId(String);

/// Marker the service uses when no directive is active.
pub(crate) const NO_DIRECTIVE_MARKER: &str = "NONE";

impl DirectiveId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Like [`DirectiveId::new`], but maps blank input and the `NONE` marker
    /// to `None`.
    #[must_use]
    pub fn parse_active(value: &str) -> Option<Self> {
        let trimmed = value.trim();
        if trimmed.is_empty() || trimmed == NO_DIRECTIVE_MARKER {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for DirectiveId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl AsRef<str> for DirectiveId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for DirectiveId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
