//! Serde shape of the human-authored rule document.
//!
//! Everything is optional here; turning this loose shape into a
//! [`Catalog`](crate::Catalog) with known invariants is the loader's job.
//! Maps whose declaration order matters (commands, diagnostics, signal
//! conditions) are read into [`OrderedMap`] so the order survives both JSON
//! and TOML parsing.

use std::fmt;
use std::marker::PhantomData;

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};

use crate::CatalogError;

/// Detected serialization of a rule document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Toml,
}

impl DocumentFormat {
    /// JSON documents are objects, so they start with `{`; anything else is
    /// treated as TOML.
    #[must_use]
    pub fn detect(raw: &str) -> Self {
        if raw.trim_start().starts_with('{') {
            Self::Json
        } else {
            Self::Toml
        }
    }
}

pub(crate) fn parse_document(raw: &str) -> Result<RawDocument, CatalogError> {
    if raw.trim().is_empty() {
        return Err(CatalogError::Empty);
    }
    match DocumentFormat::detect(raw) {
        DocumentFormat::Json => Ok(serde_json::from_str(raw)?),
        DocumentFormat::Toml => Ok(toml::from_str(raw)?),
    }
}

/// String-keyed map that keeps declaration order.
#[derive(Debug, Clone)]
pub(crate) struct OrderedMap<T>(pub(crate) Vec<(String, T)>);

impl<T> Default for OrderedMap<T> {
    fn default() -> Self {
        Self(Vec::new())
    }
}

impl<'de, T> Deserialize<'de> for OrderedMap<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct OrderedVisitor<T>(PhantomData<T>);

        impl<'de, T> Visitor<'de> for OrderedVisitor<T>
        where
            T: Deserialize<'de>,
        {
            type Value = OrderedMap<T>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map with string keys")
            }

            fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((key, value)) = access.next_entry::<String, T>()? {
                    entries.push((key, value));
                }
                Ok(OrderedMap(entries))
            }

            fn visit_unit<E>(self) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Ok(OrderedMap::default())
            }
        }

        // `deserialize_any` so an explicit JSON `null` reads as an empty map.
        deserializer.deserialize_any(OrderedVisitor(PhantomData))
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RawDocument {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub metadata: RawMetadata,
    #[serde(default)]
    pub command_library: RawCommandLibrary,
    #[serde(default)]
    pub rubrics: Vec<RawRubric>,
    #[serde(default)]
    pub didactic_diagnostics: OrderedMap<RawDiagnostic>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RawMetadata {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub system: Option<String>,
    #[serde(default)]
    pub cycle: Option<RawCycle>,
    #[serde(default)]
    pub integrity_hash_sha256: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RawCycle {
    #[serde(default)]
    pub order: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RawCommandLibrary {
    #[serde(default)]
    pub commands: OrderedMap<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawRubric {
    #[serde(default)]
    pub rubric_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub bands: Vec<RawBand>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawBand {
    #[serde(default)]
    pub band_id: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub learner_obs: Option<Vec<String>>,
    #[serde(default)]
    pub ai_obs: Option<Vec<String>>,
    #[serde(default)]
    pub didactic_principle: Option<String>,
    #[serde(default)]
    pub fix: Option<String>,
    #[serde(default)]
    pub fix_ref: Option<String>,
    #[serde(default)]
    pub flag: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RawDiagnostic {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub signals: Vec<RawSignal>,
    #[serde(default)]
    pub recommended_interventions: Vec<String>,
    #[serde(default)]
    pub rule: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawSignal {
    #[serde(default, rename = "if")]
    pub condition: OrderedMap<Vec<String>>,
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub recommended_interventions: Option<Vec<String>>,
}
