//! Session abstraction over the host transport

use async_trait::async_trait;
use std::collections::HashMap;

use crate::errors::Result;
use crate::types::{CallDirection, CallSid, SipHeaders};
use crate::verbs::Verb;

/// Metadata announced by the transport when a new session starts
#[derive(Debug, Clone)]
pub struct SessionInfo {
    pub call_sid: CallSid,
    pub direction: CallDirection,
    pub from: String,
    pub to: String,
    pub headers: SipHeaders,
    /// Set when this leg was spawned by a transfer on another leg
    pub parent_call_sid: Option<CallSid>,
    /// Per-deployment overrides sent alongside the session
    pub env_vars: HashMap<String, String>,
}

impl SessionInfo {
    pub fn new(
        call_sid: impl Into<CallSid>,
        direction: CallDirection,
        from: impl Into<String>,
        to: impl Into<String>,
    ) -> Self {
        Self {
            call_sid: call_sid.into(),
            direction,
            from: from.into(),
            to: to.into(),
            headers: SipHeaders::new(),
            parent_call_sid: None,
            env_vars: HashMap::new(),
        }
    }

    pub fn with_headers(mut self, headers: SipHeaders) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_parent(mut self, parent: impl Into<CallSid>) -> Self {
        self.parent_call_sid = Some(parent.into());
        self
    }

    pub fn with_env_var(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.env_vars.insert(name.into(), value.into());
        self
    }
}

/// A live call leg that can be issued instructions.
///
/// `send` transmits verbs as a new command on the session; `reply` answers
/// the hook invocation currently being handled.
#[async_trait]
pub trait CallSession: Send + Sync {
    fn info(&self) -> &SessionInfo;

    fn call_sid(&self) -> &CallSid {
        &self.info().call_sid
    }

    async fn send(&self, verbs: Vec<Verb>) -> Result<()>;

    async fn reply(&self, verbs: Vec<Verb>) -> Result<()>;

    /// Transport-level heartbeat
    async fn ping(&self) -> Result<()>;

    async fn close(&self) -> Result<()>;
}
