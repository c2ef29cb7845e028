//! Dial target resolution for the opposite leg

use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

use crate::config::BridgeSettings;
use crate::normalizer::PhoneNormalizer;
use crate::types::{CallTarget, Hook};
use crate::verbs::Dial;

/// Routing decision computed once per session and consumed by the dial
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingDecision {
    pub platform_originated: bool,
    /// Caller-id presented on the new leg
    pub caller_id: String,
    /// Ordered targets; a single entry today
    pub targets: Vec<CallTarget>,
    /// Extra SIP headers for the new leg; empty today
    pub headers: BTreeMap<String, String>,
}

impl RoutingDecision {
    /// Dial instruction bridging media through us and answering on bridge
    pub fn to_dial(&self) -> Dial {
        Dial {
            caller_id: self.caller_id.clone(),
            answer_on_bridge: true,
            anchor_media: true,
            refer_hook: Hook::Refer,
            action_hook: Hook::DialAction,
            target: self.targets.clone(),
            headers: self.headers.clone(),
        }
    }
}

pub struct TargetResolver {
    normalizer: Arc<dyn PhoneNormalizer>,
}

impl TargetResolver {
    pub fn new(normalizer: Arc<dyn PhoneNormalizer>) -> Self {
        Self { normalizer }
    }

    /// Compute where the opposite leg is dialed.
    ///
    /// Platform-originated calls go to the dialed number over the PSTN trunk,
    /// presenting the caller-id override when one is configured. Carrier calls
    /// go to the platform trunk, normalized to E.164 when a default country is
    /// configured.
    pub async fn resolve(
        &self,
        platform_originated: bool,
        from: &str,
        to: &str,
        settings: &BridgeSettings,
    ) -> RoutingDecision {
        let (caller_id, target) = if platform_originated {
            let caller_id = match settings.override_from_user.as_deref() {
                Some(user) if !user.is_empty() => user.to_string(),
                _ => from.to_string(),
            };
            (caller_id, CallTarget::phone(to, settings.pstn_trunk_name.clone()))
        } else {
            let dest = match settings.default_country.as_deref() {
                Some(country) if !country.is_empty() => self.normalizer.normalize(to, country).await,
                _ => to.to_string(),
            };
            (from.to_string(), CallTarget::phone(dest, settings.platform_trunk_name.clone()))
        };

        debug!(
            platform_originated,
            caller_id = %caller_id,
            number = %target.number,
            trunk = ?target.trunk,
            "resolved dial target"
        );

        RoutingDecision {
            platform_originated,
            caller_id,
            targets: vec![target],
            headers: BTreeMap::new(),
        }
    }
}
