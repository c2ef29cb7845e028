//! Drive the bridge with an in-memory transport.
//!
//! Announces a platform-originated call and a transfer leg spawned from it,
//! then replays the hook callbacks a voice platform would post and prints
//! every instruction the bridge emits as JSON.
//!
//! ```text
//! PSTN_TRUNK_NAME=trunk-pstn RETELL_SIP_CLIENT_USERNAME=agentbot \
//! RETELL_TRUNK_NAME=trunk-agent cargo run --example loopback_bridge
//! ```

use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::Level;

use rvoip_agent_bridge::logging::{setup_logging, LoggingConfig};
use rvoip_agent_bridge::verbs::to_json;
use rvoip_agent_bridge::{
    BridgeConfig, BridgeService, CallDirection, CallSession, LibPhoneNormalizer, Result, SessionEvent,
    SessionInfo, SipHeaders, Verb, AUTHENTICATED_USER_HEADER,
};

struct LoopbackSession {
    info: SessionInfo,
}

impl LoopbackSession {
    fn print(&self, kind: &str, verbs: &[Verb]) -> Result<()> {
        println!("[{}] {} {}", self.info.call_sid, kind, to_json(verbs)?);
        Ok(())
    }
}

#[async_trait]
impl CallSession for LoopbackSession {
    fn info(&self) -> &SessionInfo {
        &self.info
    }

    async fn send(&self, verbs: Vec<Verb>) -> Result<()> {
        self.print("send", &verbs)
    }

    async fn reply(&self, verbs: Vec<Verb>) -> Result<()> {
        self.print("reply", &verbs)
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        println!("[{}] close", self.info.call_sid);
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    setup_logging(LoggingConfig::new(Level::DEBUG))?;

    let mut config = BridgeConfig::from_env()?;
    if config.settings.pstn_trunk_name.is_none() {
        config.settings.pstn_trunk_name = Some("trunk-pstn".to_string());
        config.settings.platform_sip_username = Some("agentbot".to_string());
        config.settings.platform_trunk_name = Some("trunk-agent".to_string());
        config.settings.default_country = Some("US".to_string());
    }
    let service = Arc::new(BridgeService::new(config, Arc::new(LibPhoneNormalizer::new())));

    let headers: SipHeaders = [(AUTHENTICATED_USER_HEADER, "agentbot@platform.example")]
        .into_iter()
        .collect();
    let original = Arc::new(LoopbackSession {
        info: SessionInfo::new("CA-original", CallDirection::Inbound, "+15550001111", "+15551230000")
            .with_headers(headers),
    });
    let transfer = Arc::new(LoopbackSession {
        info: SessionInfo::new("CA-transfer", CallDirection::Inbound, "+15550002222", "5559998888")
            .with_parent("CA-original"),
    });

    let (original_tx, original_rx) = mpsc::channel(8);
    let (transfer_tx, transfer_rx) = mpsc::channel(8);
    let original_task = service.spawn_session(original, original_rx);
    let transfer_task = service.spawn_session(transfer, transfer_rx);

    original_tx
        .send(SessionEvent::from_hook(
            "/refer",
            json!({"to": "sip:+15551230000@bridge", "refer_details": {"refer_to_user": "+15559998888"}}),
        )?)
        .await
        .ok();
    transfer_tx
        .send(SessionEvent::from_hook("/referComplete", json!({"refer_status": 202}))?)
        .await
        .ok();
    transfer_tx
        .send(SessionEvent::from_hook(
            "/dialAction",
            json!({"dial_call_status": "busy", "dial_sip_status": 486}),
        )?)
        .await
        .ok();

    for tx in [&original_tx, &transfer_tx] {
        tx.send(SessionEvent::Close {
            code: Some(1000),
            reason: None,
        })
        .await
        .ok();
    }

    for task in [original_task, transfer_task] {
        match task.await {
            Ok(state) => println!("session finished in state {}", state),
            Err(e) => eprintln!("session task failed: {}", e),
        }
    }
    Ok(())
}
