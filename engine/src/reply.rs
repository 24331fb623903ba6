//! Parsing the reasoning service's raw reply text.
//!
//! The service is asked for `{"conversational_response": ..., "analysis": ...}`
//! but sometimes wraps it in a Markdown fence or returns something else
//! entirely. Parsing never fails: unusable replies produce a fallback-tagged
//! analysis so the fold always has a turn to work with.

use didactic_types::{FallbackReason, TurnAnalysis};
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

/// A parsed service reply.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceReply {
    /// Text meant for the learner. `None` when the reply could not be parsed.
    pub response: Option<String>,
    pub analysis: TurnAnalysis,
}

impl ServiceReply {
    fn fallback(reason: FallbackReason, response: Option<String>) -> Self {
        warn!(?reason, "service reply unusable; substituting fallback analysis");
        Self {
            response,
            analysis: TurnAnalysis::fallback(reason),
        }
    }
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(default)]
    conversational_response: Option<String>,
    #[serde(default)]
    analysis: Option<Value>,
}

/// Remove a wrapping ```` ``` ```` or ```` ```json ```` fence, if present.
#[must_use]
pub fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest
        .strip_prefix("json")
        .or_else(|| rest.strip_prefix("JSON"))
        .unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Parse the raw reply text into a response and an analysis.
#[must_use]
pub fn parse_reply(raw: &str) -> ServiceReply {
    let body = strip_code_fence(raw);
    if body.is_empty() {
        return ServiceReply::fallback(FallbackReason::EmptyReply, None);
    }

    let envelope: Envelope = match serde_json::from_str(body) {
        Ok(envelope) => envelope,
        Err(err) => {
            return ServiceReply::fallback(
                FallbackReason::Malformed {
                    detail: err.to_string(),
                },
                None,
            );
        }
    };

    let response = envelope.conversational_response;
    let Some(analysis) = envelope.analysis.filter(|value| !value.is_null()) else {
        return ServiceReply::fallback(FallbackReason::MissingAnalysis, response);
    };

    match serde_json::from_value::<TurnAnalysis>(analysis) {
        Ok(analysis) => ServiceReply { response, analysis },
        Err(err) => ServiceReply::fallback(
            FallbackReason::Malformed {
                detail: err.to_string(),
            },
            response,
        ),
    }
}
