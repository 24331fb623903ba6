//! Compute-tier selection for the next outbound request.

use didactic_types::Tier;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const DEFAULT_DIRECTIVE_PREFIX: &str = "/";
pub const DEFAULT_LENGTH_THRESHOLD: usize = 60;
pub const DEFAULT_DEPTH_THRESHOLD: usize = 6;
pub const DEFAULT_FAST_MODEL: &str = "gemini-3-flash-preview";
pub const DEFAULT_DEEP_MODEL: &str = "gemini-3-pro-preview";
pub const DEFAULT_DEEP_THINKING_BUDGET: u32 = 4000;
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Thresholds and model names for tier selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingPolicy {
    /// Inputs starting with this are directives. An empty prefix disables the rule.
    pub directive_prefix: String,
    /// Inputs longer than this many characters go deep.
    pub length_threshold: usize,
    /// Conversations with more than this many prior messages go deep.
    pub depth_threshold: usize,
    pub fast_model: String,
    pub deep_model: String,
    /// Reasoning budget for the deep tier; `None` leaves it to the service.
    pub deep_thinking_budget: Option<u32>,
    pub temperature: f32,
}

impl Default for RoutingPolicy {
    fn default() -> Self {
        Self {
            directive_prefix: DEFAULT_DIRECTIVE_PREFIX.to_string(),
            length_threshold: DEFAULT_LENGTH_THRESHOLD,
            depth_threshold: DEFAULT_DEPTH_THRESHOLD,
            fast_model: DEFAULT_FAST_MODEL.to_string(),
            deep_model: DEFAULT_DEEP_MODEL.to_string(),
            deep_thinking_budget: Some(DEFAULT_DEEP_THINKING_BUDGET),
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

/// Which rule decided the tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteReason {
    Directive,
    LongInput,
    DeepConversation,
    Default,
}

/// Everything the caller needs to issue the request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestPlan {
    pub tier: Tier,
    pub reason: RouteReason,
    pub model: String,
    pub temperature: f32,
    pub thinking_budget: Option<u32>,
}

impl RoutingPolicy {
    /// Rules in order, first match wins: directive prefix, input length,
    /// conversation depth, otherwise fast.
    #[must_use]
    pub fn route(&self, input: &str, depth: usize) -> (Tier, RouteReason) {
        if !self.directive_prefix.is_empty() && input.starts_with(self.directive_prefix.as_str()) {
            return (Tier::Deep, RouteReason::Directive);
        }
        if input.chars().count() > self.length_threshold {
            return (Tier::Deep, RouteReason::LongInput);
        }
        if depth > self.depth_threshold {
            return (Tier::Deep, RouteReason::DeepConversation);
        }
        (Tier::Fast, RouteReason::Default)
    }

    #[must_use]
    pub fn select_tier(&self, input: &str, depth: usize) -> Tier {
        self.route(input, depth).0
    }

    #[must_use]
    pub fn plan(&self, input: &str, depth: usize) -> RequestPlan {
        let (tier, reason) = self.route(input, depth);
        let (model, thinking_budget) = match tier {
            Tier::Fast => (self.fast_model.clone(), None),
            Tier::Deep => (self.deep_model.clone(), self.deep_thinking_budget),
        };
        debug!(tier = tier.as_str(), ?reason, depth, %model, "routed turn");
        RequestPlan {
            tier,
            reason,
            model,
            temperature: self.temperature,
            thinking_budget,
        }
    }
}

/// [`RoutingPolicy::select_tier`] with the default thresholds.
#[must_use]
pub fn select_tier(input: &str, depth: usize) -> Tier {
    RoutingPolicy::default().select_tier(input, depth)
}
