//! Shared fixtures for agent bridge integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use rvoip_agent_bridge::{
    BridgeConfig, BridgeError, BridgeSettings, CallDirection, CallSession, LibPhoneNormalizer,
    Result, SessionInfo, SipHeaders, Verb, AUTHENTICATED_USER_HEADER,
};
use rvoip_agent_bridge::BridgeService;

/// Session fake that records every instruction it is given
pub struct RecordingSession {
    info: SessionInfo,
    sent: Mutex<Vec<Vec<Verb>>>,
    replies: Mutex<Vec<Vec<Verb>>>,
    pings: AtomicUsize,
    closed: AtomicBool,
    fail_send: AtomicBool,
}

impl RecordingSession {
    pub fn new(info: SessionInfo) -> Arc<Self> {
        Arc::new(Self {
            info,
            sent: Mutex::new(Vec::new()),
            replies: Mutex::new(Vec::new()),
            pings: AtomicUsize::new(0),
            closed: AtomicBool::new(false),
            fail_send: AtomicBool::new(false),
        })
    }

    pub fn failing(info: SessionInfo) -> Arc<Self> {
        let session = Self::new(info);
        session.fail_send.store(true, Ordering::SeqCst);
        session
    }

    pub fn sent(&self) -> Vec<Vec<Verb>> {
        self.sent.lock().clone()
    }

    pub fn replies(&self) -> Vec<Vec<Verb>> {
        self.replies.lock().clone()
    }

    pub fn pings(&self) -> usize {
        self.pings.load(Ordering::SeqCst)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CallSession for RecordingSession {
    fn info(&self) -> &SessionInfo {
        &self.info
    }

    async fn send(&self, verbs: Vec<Verb>) -> Result<()> {
        if self.fail_send.load(Ordering::SeqCst) {
            return Err(BridgeError::Transport("websocket not connected".to_string()));
        }
        self.sent.lock().push(verbs);
        Ok(())
    }

    async fn reply(&self, verbs: Vec<Verb>) -> Result<()> {
        self.replies.lock().push(verbs);
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        self.pings.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

pub fn settings() -> BridgeSettings {
    BridgeSettings {
        pstn_trunk_name: Some("trunk-pstn".to_string()),
        platform_sip_username: Some("agentbot".to_string()),
        platform_trunk_name: Some("trunk-agent".to_string()),
        default_country: None,
        override_from_user: None,
    }
}

pub fn service(settings: BridgeSettings) -> BridgeService {
    BridgeService::new(
        BridgeConfig::default().with_settings(settings),
        Arc::new(LibPhoneNormalizer::new()),
    )
}

/// Inbound leg placed by the voice-agent platform
pub fn platform_call(sid: &str, to: &str) -> SessionInfo {
    let headers: SipHeaders = [(AUTHENTICATED_USER_HEADER, "agentbot@platform.example")]
        .into_iter()
        .collect();
    SessionInfo::new(sid, CallDirection::Inbound, "+15550001111", to).with_headers(headers)
}

/// Inbound leg arriving from the carrier
pub fn carrier_call(sid: &str, to: &str) -> SessionInfo {
    SessionInfo::new(sid, CallDirection::Inbound, "+15550002222", to)
}
