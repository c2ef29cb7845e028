//! Common types shared by the classifier, resolver and bridge

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Platform-assigned identifier of one call leg
#[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct CallSid(pub String);

impl CallSid {
    pub fn new(sid: impl Into<String>) -> Self {
        Self(sid.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CallSid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for CallSid {
    fn from(sid: &str) -> Self {
        Self(sid.to_string())
    }
}

impl From<String> for CallSid {
    fn from(sid: String) -> Self {
        Self(sid)
    }
}

/// Direction of a call leg as reported by the transport
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallDirection {
    Inbound,
    Outbound,
}

impl fmt::Display for CallDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallDirection::Inbound => write!(f, "inbound"),
            CallDirection::Outbound => write!(f, "outbound"),
        }
    }
}

/// SIP headers of the initial INVITE.
///
/// Names are case-insensitive and a name may carry several values; lookups
/// return values in arrival order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SipHeaders {
    entries: HashMap<String, Vec<String>>,
}

impl SipHeaders {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a value for `name`
    pub fn insert(&mut self, name: impl AsRef<str>, value: impl Into<String>) {
        self.entries
            .entry(name.as_ref().to_ascii_lowercase())
            .or_default()
            .push(value.into());
    }

    /// First value for `name`
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .get(&name.to_ascii_lowercase())
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    pub fn get_all(&self, name: &str) -> &[String] {
        self.entries
            .get(&name.to_ascii_lowercase())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(&name.to_ascii_lowercase())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<N: AsRef<str>, V: Into<String>> FromIterator<(N, V)> for SipHeaders {
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        let mut headers = SipHeaders::new();
        for (name, value) in iter {
            headers.insert(name, value);
        }
        headers
    }
}

/// Kind of endpoint a dial target addresses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    Phone,
}

/// One destination of a dial instruction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallTarget {
    #[serde(rename = "type")]
    pub kind: TargetKind,
    pub number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trunk: Option<String>,
}

impl CallTarget {
    pub fn phone(number: impl Into<String>, trunk: Option<String>) -> Self {
        Self {
            kind: TargetKind::Phone,
            number: number.into(),
            trunk,
        }
    }
}

/// Named signaling hooks the bridge asks the transport to call back on
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq)]
pub enum Hook {
    Refer,
    DialAction,
    ReferComplete,
}

impl Hook {
    pub fn path(&self) -> &'static str {
        match self {
            Hook::Refer => "/refer",
            Hook::DialAction => "/dialAction",
            Hook::ReferComplete => "/referComplete",
        }
    }

    pub fn from_path(path: &str) -> Option<Self> {
        match path {
            "/refer" => Some(Hook::Refer),
            "/dialAction" => Some(Hook::DialAction),
            "/referComplete" => Some(Hook::ReferComplete),
            _ => None,
        }
    }
}

impl fmt::Display for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

impl Serialize for Hook {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.path())
    }
}

/// Outcome of a dial attempt as reported on the dial-action hook
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DialCallStatus {
    Completed,
    Failed,
    Busy,
    NoAnswer,
    Canceled,
    Other(String),
}

impl DialCallStatus {
    pub fn is_completed(&self) -> bool {
        matches!(self, DialCallStatus::Completed)
    }
}

impl From<String> for DialCallStatus {
    fn from(status: String) -> Self {
        match status.as_str() {
            "completed" => DialCallStatus::Completed,
            "failed" => DialCallStatus::Failed,
            "busy" => DialCallStatus::Busy,
            "no-answer" => DialCallStatus::NoAnswer,
            "canceled" => DialCallStatus::Canceled,
            _ => DialCallStatus::Other(status),
        }
    }
}

impl From<DialCallStatus> for String {
    fn from(status: DialCallStatus) -> Self {
        status.to_string()
    }
}

impl fmt::Display for DialCallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DialCallStatus::Completed => f.write_str("completed"),
            DialCallStatus::Failed => f.write_str("failed"),
            DialCallStatus::Busy => f.write_str("busy"),
            DialCallStatus::NoAnswer => f.write_str("no-answer"),
            DialCallStatus::Canceled => f.write_str("canceled"),
            DialCallStatus::Other(other) => f.write_str(other),
        }
    }
}
