//! Which conversion embeds a visitor has unlocked.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::flow::CompletedPhases;

/// Kind of inline conversion widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbedKind {
    Checkout,
    Video,
    Calendly,
}

impl EmbedKind {
    pub const ALL: [EmbedKind; 3] = [EmbedKind::Checkout, EmbedKind::Video, EmbedKind::Calendly];

    pub fn as_str(&self) -> &'static str {
        match self {
            EmbedKind::Checkout => "checkout",
            EmbedKind::Video => "video",
            EmbedKind::Calendly => "calendly",
        }
    }
}

impl fmt::Display for EmbedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Unlock rule for one embed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedTrigger {
    /// The embed unlocks once this phase is complete.
    pub unlock_after_phase: u32,
    /// Checkout plan id, video url or booking url.
    #[serde(default)]
    pub resource_id: String,
}

impl EmbedTrigger {
    pub fn new(unlock_after_phase: u32, resource_id: impl Into<String>) -> Self {
        Self {
            unlock_after_phase,
            resource_id: resource_id.into(),
        }
    }

    fn configured_resource(&self) -> Option<&str> {
        let id = self.resource_id.trim();
        (!id.is_empty()).then_some(id)
    }
}

/// Per-flow embed configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkout: Option<EmbedTrigger>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video: Option<EmbedTrigger>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calendly: Option<EmbedTrigger>,
}

impl EmbedConfig {
    pub fn trigger(&self, kind: EmbedKind) -> Option<&EmbedTrigger> {
        match kind {
            EmbedKind::Checkout => self.checkout.as_ref(),
            EmbedKind::Video => self.video.as_ref(),
            EmbedKind::Calendly => self.calendly.as_ref(),
        }
    }

    /// Resource id for `kind`, if one is configured at all.
    pub fn resource(&self, kind: EmbedKind) -> Option<&str> {
        self.trigger(kind).and_then(EmbedTrigger::configured_resource)
    }
}

/// Embeds currently unlockable, by resource.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableEmbeds {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checkout_plan_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calendly_url: Option<String>,
}

impl AvailableEmbeds {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn resource(&self, kind: EmbedKind) -> Option<&str> {
        match kind {
            EmbedKind::Checkout => self.checkout_plan_id.as_deref(),
            EmbedKind::Video => self.video_url.as_deref(),
            EmbedKind::Calendly => self.calendly_url.as_deref(),
        }
    }

    fn set(&mut self, kind: EmbedKind, resource: String) {
        match kind {
            EmbedKind::Checkout => self.checkout_plan_id = Some(resource),
            EmbedKind::Video => self.video_url = Some(resource),
            EmbedKind::Calendly => self.calendly_url = Some(resource),
        }
    }

    /// Unlocked kinds in declaration order.
    pub fn kinds(&self) -> Vec<EmbedKind> {
        EmbedKind::ALL
            .into_iter()
            .filter(|kind| self.resource(*kind).is_some())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds().is_empty()
    }

    /// Keeps only `kind`. Used when a single conditional tool is offered.
    pub fn only(&self, kind: EmbedKind) -> Self {
        let mut narrowed = Self::none();
        if let Some(resource) = self.resource(kind) {
            narrowed.set(kind, resource.to_string());
        }
        narrowed
    }
}

/// Embeds whose unlock phase is in `completed` and whose resource is configured.
pub fn available_embeds(completed: &CompletedPhases, config: &EmbedConfig) -> AvailableEmbeds {
    let mut available = AvailableEmbeds::none();
    for kind in EmbedKind::ALL {
        let Some(trigger) = config.trigger(kind) else {
            continue;
        };
        let Some(resource) = trigger.configured_resource() else {
            continue;
        };
        if completed.contains(trigger.unlock_after_phase) {
            available.set(kind, resource.to_string());
        }
    }
    available
}

/// Every configured embed regardless of progress.
pub fn configured_embeds(config: &EmbedConfig) -> AvailableEmbeds {
    let mut configured = AvailableEmbeds::none();
    for kind in EmbedKind::ALL {
        if let Some(resource) = config.resource(kind) {
            configured.set(kind, resource.to_string());
        }
    }
    configured
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn config() -> EmbedConfig {
        EmbedConfig {
            checkout: Some(EmbedTrigger::new(2, "plan_growth")),
            video: Some(EmbedTrigger::new(1, "https://video.example/intro")),
            calendly: Some(EmbedTrigger::new(3, "")),
        }
    }

    #[test]
    fn phase_two_start_does_not_unlock_phase_two_embed() {
        let completed = CompletedPhases::from_pointer("phase-2-start", None);
        let available = available_embeds(&completed, &config());
        assert_eq!(available.checkout_plan_id, None);
    }

    #[test]
    fn phase_two_complete_unlocks_checkout() {
        let completed = CompletedPhases::from_pointer("phase-2-complete", None);
        let available = available_embeds(&completed, &config());
        assert_eq!(available.checkout_plan_id.as_deref(), Some("plan_growth"));
        assert_eq!(available.video_url.as_deref(), Some("https://video.example/intro"));
    }

    #[test]
    fn blank_resource_never_unlocks() {
        let available = available_embeds(&CompletedPhases::through(5), &config());
        assert_eq!(available.calendly_url, None);
        assert_eq!(available.kinds(), vec![EmbedKind::Checkout, EmbedKind::Video]);
    }

    #[test]
    fn only_narrows_to_one_kind() {
        let available = available_embeds(&CompletedPhases::through(5), &config());
        let narrowed = available.only(EmbedKind::Video);
        assert_eq!(narrowed.kinds(), vec![EmbedKind::Video]);
        assert!(available.only(EmbedKind::Calendly).is_empty());
    }

    #[test]
    fn configured_embeds_ignores_progress() {
        assert_eq!(configured_embeds(&config()).kinds().len(), 2);
    }

    #[test]
    fn serializes_camel_case() {
        let available = available_embeds(&CompletedPhases::through(2), &config());
        let json = serde_json::to_value(&available).unwrap();
        assert_eq!(json["checkoutPlanId"], "plan_growth");
        assert!(json.get("calendlyUrl").is_none());
    }

    proptest! {
        #[test]
        fn availability_is_monotonic(low in 0u32..6, extra in 0u32..6) {
            let before = available_embeds(&CompletedPhases::through(low), &config());
            let after = available_embeds(&CompletedPhases::through(low + extra), &config());
            for kind in before.kinds() {
                prop_assert_eq!(before.resource(kind), after.resource(kind));
            }
        }
    }
}
