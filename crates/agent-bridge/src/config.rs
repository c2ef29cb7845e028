//! Configuration for the agent bridge
//!
//! Routing settings come from two layers: process-wide defaults read from the
//! environment when the service starts, and per-call overrides delivered with
//! each session. A per-call value wins when it is present and non-empty.

use serde::Deserialize;
use std::time::Duration;

use crate::errors::Result;

/// Trunk used to reach the PSTN carrier
pub const PSTN_TRUNK_NAME: &str = "PSTN_TRUNK_NAME";
/// SIP credential username provisioned on the voice-agent platform
pub const PLATFORM_SIP_USERNAME: &str = "RETELL_SIP_CLIENT_USERNAME";
/// Trunk used to reach the voice-agent platform
pub const PLATFORM_TRUNK_NAME: &str = "RETELL_TRUNK_NAME";
/// ISO country used to normalize dialed numbers to E.164
pub const DEFAULT_COUNTRY: &str = "DEFAULT_COUNTRY";
/// Caller-id to present on platform-originated calls
pub const OVERRIDE_FROM_USER: &str = "OVERRIDE_FROM_USER";

const SETTING_KEYS: [(&str, &str); 5] = [
    (PSTN_TRUNK_NAME, "pstn_trunk_name"),
    (PLATFORM_SIP_USERNAME, "platform_sip_username"),
    (PLATFORM_TRUNK_NAME, "platform_trunk_name"),
    (DEFAULT_COUNTRY, "default_country"),
    (OVERRIDE_FROM_USER, "override_from_user"),
];

/// Routing settings resolved once per call
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct BridgeSettings {
    #[serde(default)]
    pub pstn_trunk_name: Option<String>,
    #[serde(default)]
    pub platform_sip_username: Option<String>,
    #[serde(default)]
    pub platform_trunk_name: Option<String>,
    #[serde(default)]
    pub default_country: Option<String>,
    #[serde(default)]
    pub override_from_user: Option<String>,
}

impl BridgeSettings {
    /// Load process-wide defaults from the environment
    pub fn from_env() -> Result<Self> {
        Self::from_vars(
            std::env::vars_os().filter_map(|(name, value)| Some((name.into_string().ok()?, value.into_string().ok()?))),
        )
    }

    /// Build settings from variable/value pairs.
    ///
    /// Variable names are matched case-insensitively; unknown names and
    /// empty values are ignored.
    pub fn from_vars<I, K, V>(vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut builder = ::config::Config::builder();
        for (name, value) in vars {
            let value = value.as_ref().trim();
            if value.is_empty() {
                continue;
            }
            if let Some(field) = field_for(name.as_ref()) {
                builder = builder.set_override(field, value)?;
            }
        }
        Ok(builder.build()?.try_deserialize()?)
    }

    /// Layer `overrides` on top of these settings
    pub fn merged_with(&self, overrides: &BridgeSettings) -> BridgeSettings {
        fn pick(over: &Option<String>, base: &Option<String>) -> Option<String> {
            non_empty(over).or_else(|| non_empty(base))
        }

        BridgeSettings {
            pstn_trunk_name: pick(&overrides.pstn_trunk_name, &self.pstn_trunk_name),
            platform_sip_username: pick(&overrides.platform_sip_username, &self.platform_sip_username),
            platform_trunk_name: pick(&overrides.platform_trunk_name, &self.platform_trunk_name),
            default_country: pick(&overrides.default_country, &self.default_country),
            override_from_user: pick(&overrides.override_from_user, &self.override_from_user),
        }
    }
}

fn field_for(name: &str) -> Option<&'static str> {
    SETTING_KEYS
        .iter()
        .find(|(var, _)| var.eq_ignore_ascii_case(name))
        .map(|(_, field)| *field)
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_ref().filter(|v| !v.trim().is_empty()).cloned()
}

/// Service-level configuration
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Process-wide routing defaults
    pub settings: BridgeSettings,
    /// Interval between transport pings; 25s beats the common 30s idle timeout
    pub keep_alive_interval: Duration,
    /// How long a closed call stays resolvable as "closed" for parent lookups
    pub tombstone_grace: Duration,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            settings: BridgeSettings::default(),
            keep_alive_interval: Duration::from_secs(25),
            tombstone_grace: Duration::from_secs(60),
        }
    }
}

impl BridgeConfig {
    /// Default timings with routing settings taken from the environment
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            settings: BridgeSettings::from_env()?,
            ..Default::default()
        })
    }

    pub fn with_settings(mut self, settings: BridgeSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_keep_alive_interval(mut self, interval: Duration) -> Self {
        self.keep_alive_interval = interval;
        self
    }

    pub fn with_tombstone_grace(mut self, grace: Duration) -> Self {
        self.tombstone_grace = grace;
        self
    }
}
