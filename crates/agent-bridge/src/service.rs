//! Bridge service: owns the registry and drives sessions

use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::bridge::{LegBridge, LegState};
use crate::config::BridgeConfig;
use crate::events::SessionEvent;
use crate::normalizer::PhoneNormalizer;
use crate::registry::CallRegistry;
use crate::resolver::TargetResolver;
use crate::session::CallSession;

pub struct BridgeService {
    config: BridgeConfig,
    registry: Arc<CallRegistry>,
    resolver: TargetResolver,
}

impl BridgeService {
    pub fn new(config: BridgeConfig, normalizer: Arc<dyn PhoneNormalizer>) -> Self {
        let registry = Arc::new(CallRegistry::new(config.tombstone_grace));
        Self {
            config,
            registry,
            resolver: TargetResolver::new(normalizer),
        }
    }

    pub fn registry(&self) -> &Arc<CallRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Handle a new-session announcement: register, classify, resolve and dial
    pub async fn accept(&self, session: Arc<dyn CallSession>) -> LegBridge {
        let mut bridge = LegBridge::create(session, self.registry.clone(), self.config.keep_alive_interval);
        bridge.route(&self.config.settings, &self.resolver).await;
        bridge
    }

    /// Drive one session until it closes.
    ///
    /// Events are handled strictly in order. The loop ends on a close event;
    /// if the transport drops the event channel first, the session is closed
    /// as if a close had arrived.
    pub async fn run_session(
        &self,
        session: Arc<dyn CallSession>,
        mut events: mpsc::Receiver<SessionEvent>,
    ) -> LegState {
        let mut bridge = self.accept(session).await;

        loop {
            match events.recv().await {
                Some(event) => {
                    let closing = matches!(event, SessionEvent::Close { .. });
                    bridge.handle(event).await;
                    if closing {
                        break;
                    }
                }
                None => {
                    debug!("event channel for {} dropped", bridge.call_sid());
                    bridge
                        .handle(SessionEvent::Close {
                            code: None,
                            reason: Some("event channel closed".to_string()),
                        })
                        .await;
                    break;
                }
            }
        }

        bridge.state()
    }

    /// Run a session on its own task
    pub fn spawn_session(
        self: &Arc<Self>,
        session: Arc<dyn CallSession>,
        events: mpsc::Receiver<SessionEvent>,
    ) -> JoinHandle<LegState> {
        let service = self.clone();
        tokio::spawn(async move { service.run_session(session, events).await })
    }
}
