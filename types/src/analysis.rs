//! Turn analysis: the structured per-turn classification produced by the
//! reasoning service.
//!
//! The engine consumes this shape, it never produces it, so every field is
//! lenient on input: missing or `null` lists become empty, and a `"NONE"`
//! active directive clears the one carried from earlier turns. Replies that cannot be parsed at all are replaced
//! by [`TurnAnalysis::fallback`], which is tagged so callers can tell it apart
//! from a genuinely empty classification.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::dimension::NO_DIRECTIVE_MARKER;
use crate::{BandId, DirectiveId};

/// Rationale text placed in a fallback analysis.
pub const MALFORMED_OUTPUT_MARKER: &str = "malformed output: fallback analysis";

/// Mode and status label used when the service gave us nothing usable.
pub const UNKNOWN_LABEL: &str = "unknown";

/// Why a fallback analysis was substituted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum FallbackReason {
    /// The reply body was empty.
    EmptyReply,
    /// The reply was not valid JSON, or not the expected shape.
    Malformed { detail: String },
    /// The reply parsed but carried no `analysis` object.
    MissingAnalysis,
}

/// Where an analysis came from.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Provenance {
    /// Parsed from the service reply.
    #[default]
    Service,
    /// Substituted locally because the reply was unusable.
    Fallback(FallbackReason),
}

/// Profile fields the service may echo back. Opaque to the engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LearnerProfile {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub grade: Option<String>,
}

/// One turn's structured classification output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TurnAnalysis {
    #[serde(default, deserialize_with = "null_as_default")]
    pub process_phases: Vec<BandId>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub coregulation_bands: Vec<BandId>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub task_densities: Vec<BandId>,
    /// Catch-all list for every dimension without a dedicated list.
    #[serde(default, deserialize_with = "null_as_default")]
    pub secondary_dimensions: Vec<BandId>,
    #[serde(default)]
    pub active_fix: FixUpdate,
    #[serde(default, deserialize_with = "null_as_default")]
    pub reasoning: String,
    #[serde(default, deserialize_with = "non_blank")]
    pub cognitive_mode: Option<String>,
    #[serde(default, deserialize_with = "non_blank")]
    pub epistemic_status: Option<String>,
    /// 0 = AI does everything, 100 = learner does everything.
    #[serde(default)]
    pub task_density_balance: Option<f64>,
    #[serde(default, rename = "current_profile")]
    pub profile: Option<LearnerProfile>,
    #[serde(default, skip_deserializing)]
    pub provenance: Provenance,
}

impl TurnAnalysis {
    /// Neutral analysis substituted for an unusable reply.
    #[must_use]
    pub fn fallback(reason: FallbackReason) -> Self {
        Self {
            reasoning: MALFORMED_OUTPUT_MARKER.to_string(),
            cognitive_mode: Some(UNKNOWN_LABEL.to_string()),
            epistemic_status: Some(UNKNOWN_LABEL.to_string()),
            provenance: Provenance::Fallback(reason),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn is_fallback(&self) -> bool {
        matches!(self.provenance, Provenance::Fallback(_))
    }

    /// Every band id in the turn, in fold order: task density, co-regulation,
    /// process phase, then the secondary list.
    pub fn band_ids(&self) -> impl Iterator<Item = &BandId> {
        self.task_densities
            .iter()
            .chain(&self.coregulation_bands)
            .chain(&self.process_phases)
            .chain(&self.secondary_dimensions)
    }
}

/// What a turn reports about the active directive.
///
/// On the wire this is a plain string: absent, `null` or blank leaves the
/// directive unchanged, `"NONE"` clears it, anything else activates it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FixUpdate {
    #[default]
    Unchanged,
    Cleared,
    Active(DirectiveId),
}

impl FixUpdate {
    #[must_use]
    pub fn parse(value: &str) -> Self {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            Self::Unchanged
        } else if trimmed == NO_DIRECTIVE_MARKER {
            Self::Cleared
        } else {
            Self::Active(DirectiveId::new(trimmed))
        }
    }

    /// The directive this turn activates, if any.
    #[must_use]
    pub fn directive(&self) -> Option<&DirectiveId> {
        match self {
            Self::Active(id) => Some(id),
            Self::Unchanged | Self::Cleared => None,
        }
    }

    /// The directive active after this turn, given the one active before it.
    #[must_use]
    pub fn apply(&self, previous: Option<&DirectiveId>) -> Option<DirectiveId> {
        match self {
            Self::Unchanged => previous.cloned(),
            Self::Cleared => None,
            Self::Active(id) => Some(id.clone()),
        }
    }
}

impl From<DirectiveId> for FixUpdate {
    fn from(id: DirectiveId) -> Self {
        Self::Active(id)
    }
}

impl Serialize for FixUpdate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Unchanged => serializer.serialize_none(),
            Self::Cleared => serializer.serialize_some(NO_DIRECTIVE_MARKER),
            Self::Active(id) => serializer.serialize_some(id.as_str()),
        }
    }
}

impl<'de> Deserialize<'de> for FixUpdate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Option::<String>::deserialize(deserializer)?;
        Ok(value.as_deref().map_or(Self::Unchanged, Self::parse))
    }
}

/// Mechanical telemetry for one outbound call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnMetrics {
    pub latency_ms: u64,
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub model: String,
    pub temperature: f32,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn non_blank<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}
