//! Signaling events delivered to a call session

use serde::Deserialize;

use crate::errors::{BridgeError, Result};
use crate::types::{DialCallStatus, Hook};

/// Events the transport delivers for one session, in arrival order
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// Far end asked for a transfer (`/refer`)
    Refer(ReferEvent),
    /// Outcome of the dial issued at creation (`/dialAction`)
    DialAction(DialActionEvent),
    /// A relayed transfer finished (`/referComplete`)
    ReferComplete(ReferCompleteEvent),
    /// Transport closed the session
    Close {
        code: Option<u16>,
        reason: Option<String>,
    },
    /// Transport reported an error; a close is expected to follow
    Error(String),
}

impl SessionEvent {
    /// Decode the payload posted to one of the bridge's hooks
    pub fn from_hook(path: &str, payload: serde_json::Value) -> Result<Self> {
        let hook = Hook::from_path(path)
            .ok_or_else(|| BridgeError::InvalidEvent(format!("unknown hook {}", path)))?;

        let event = match hook {
            Hook::Refer => SessionEvent::Refer(serde_json::from_value(payload)?),
            Hook::DialAction => SessionEvent::DialAction(serde_json::from_value(payload)?),
            Hook::ReferComplete => SessionEvent::ReferComplete(ReferCompleteEvent { payload }),
        };
        Ok(event)
    }

    pub fn name(&self) -> &'static str {
        match self {
            SessionEvent::Refer(_) => "refer",
            SessionEvent::DialAction(_) => "dial-action",
            SessionEvent::ReferComplete(_) => "refer-complete",
            SessionEvent::Close { .. } => "close",
            SessionEvent::Error(_) => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReferDetails {
    pub refer_to_user: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReferEvent {
    pub refer_details: ReferDetails,
    /// Identity of the leg that received the REFER, relayed as Referred-By
    #[serde(default)]
    pub to: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DialActionEvent {
    pub dial_call_status: DialCallStatus,
    #[serde(default)]
    pub dial_sip_status: Option<u16>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReferCompleteEvent {
    pub payload: serde_json::Value,
}
