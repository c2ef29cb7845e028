//! Outbound instructions queued on a call session
//!
//! Verbs serialize to the JSON shape the voice platform expects, tagged by
//! `"verb"`:
//!
//! ```text
//! {"verb":"dial","callerId":"+15550001111","answerOnBridge":true,"anchorMedia":true,
//!  "referHook":"/refer","actionHook":"/dialAction",
//!  "target":[{"type":"phone","number":"+15551230000","trunk":"trunk-pstn"}],"headers":{}}
//! {"verb":"hangup"}
//! {"verb":"sip:decline","status":486}
//! {"verb":"sip:refer","referTo":"bob","referredBy":"sip:alice@example.com","actionHook":"/referComplete"}
//! ```

use serde::Serialize;
use std::collections::BTreeMap;

use crate::types::{CallTarget, Hook};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "verb")]
pub enum Verb {
    #[serde(rename = "dial")]
    Dial(Dial),
    #[serde(rename = "hangup")]
    Hangup,
    #[serde(rename = "sip:decline")]
    SipDecline(SipDecline),
    #[serde(rename = "sip:refer")]
    SipRefer(SipRefer),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dial {
    pub caller_id: String,
    pub answer_on_bridge: bool,
    pub anchor_media: bool,
    pub refer_hook: Hook,
    pub action_hook: Hook,
    pub target: Vec<CallTarget>,
    pub headers: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SipDecline {
    pub status: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SipRefer {
    pub refer_to: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referred_by: Option<String>,
    pub action_hook: Hook,
}

/// Render a verb list as the JSON array sent over the transport
pub fn to_json(verbs: &[Verb]) -> crate::errors::Result<serde_json::Value> {
    Ok(serde_json::to_value(verbs)?)
}
