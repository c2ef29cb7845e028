//! Leg bridging state machine
//!
//! One [`LegBridge`] drives one call session from creation to teardown:
//!
//! ```text
//! CREATED ──register──▶ CLASSIFIED ──resolve──▶ DIALING ──sent──▶ BRIDGED
//!                                                  │                 │
//!                                          setup failure           close
//!                                                  ▼                 ▼
//!                                                CLOSED ◀────────────┘
//! ```
//!
//! Signaling events are mapped to side effects by the pure [`transition`]
//! function; the bridge executes the resulting [`Action`]s against the
//! session and the registry.

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, info_span, warn, Instrument, Span};

use crate::classifier::DirectionClassifier;
use crate::config::BridgeSettings;
use crate::errors::Result;
use crate::events::SessionEvent;
use crate::registry::{CallRegistry, Lookup};
use crate::resolver::TargetResolver;
use crate::session::CallSession;
use crate::types::{CallSid, Hook};
use crate::verbs::{SipDecline, SipRefer, Verb};

/// Status used to decline when a failed dial reports no SIP status
pub const FALLBACK_DECLINE_STATUS: u16 = 480;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LegState {
    Created,
    Classified,
    Dialing,
    Bridged,
    Closed,
}

impl std::fmt::Display for LegState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            LegState::Created => "created",
            LegState::Classified => "classified",
            LegState::Dialing => "dialing",
            LegState::Bridged => "bridged",
            LegState::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// Side effect requested by a transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Transmit verbs as a new command on this session
    Send(Vec<Verb>),
    /// Answer the hook currently being handled
    Reply(Vec<Verb>),
    /// Transmit verbs on the parent session, if it is still live
    SendToParent { parent: CallSid, verbs: Vec<Verb> },
    StopKeepAlive,
    /// Tombstone this session in the registry
    Unregister,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub next: LegState,
    pub actions: Vec<Action>,
}

impl Transition {
    fn stay(state: LegState) -> Self {
        Self {
            next: state,
            actions: Vec::new(),
        }
    }

    fn to(next: LegState, actions: Vec<Action>) -> Self {
        Self { next, actions }
    }
}

/// Map a signaling event to the next state and its side effects.
///
/// Transfer, dial-result and transfer-completion events never change the
/// state. A close always ends in `Closed`; once closed, every other event
/// is ignored.
pub fn transition(state: LegState, event: &SessionEvent, parent: Option<&CallSid>) -> Transition {
    if let SessionEvent::Close { .. } = event {
        return Transition::to(LegState::Closed, vec![Action::StopKeepAlive, Action::Unregister]);
    }
    if state == LegState::Closed {
        return Transition::stay(state);
    }

    match event {
        SessionEvent::Refer(refer) => {
            let verb = Verb::SipRefer(SipRefer {
                refer_to: refer.refer_details.refer_to_user.clone(),
                referred_by: refer.to.clone(),
                action_hook: Hook::ReferComplete,
            });
            Transition::to(state, vec![Action::Reply(vec![verb])])
        }
        SessionEvent::DialAction(outcome) if !outcome.dial_call_status.is_completed() => {
            let status = outcome.dial_sip_status.unwrap_or(FALLBACK_DECLINE_STATUS);
            Transition::to(state, vec![Action::Reply(vec![Verb::SipDecline(SipDecline { status })])])
        }
        SessionEvent::ReferComplete(_) => match parent {
            Some(parent) => Transition::to(
                state,
                vec![Action::SendToParent {
                    parent: parent.clone(),
                    verbs: vec![Verb::Hangup],
                }],
            ),
            None => Transition::stay(state),
        },
        _ => Transition::stay(state),
    }
}

/// Periodic transport ping for the life of a session
struct KeepAlive {
    task: JoinHandle<()>,
}

impl KeepAlive {
    fn start(session: Arc<dyn CallSession>, every: Duration, span: Span) -> Self {
        let task = tokio::spawn(
            async move {
                let mut ticker = tokio::time::interval(every);
                ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
                // first tick completes immediately
                ticker.tick().await;
                loop {
                    ticker.tick().await;
                    if let Err(e) = session.ping().await {
                        warn!("keep-alive ping failed: {}", e);
                    }
                }
            }
            .instrument(span),
        );
        Self { task }
    }

    fn stop(&self) {
        self.task.abort();
    }
}

impl Drop for KeepAlive {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Drives one call session
pub struct LegBridge {
    session: Arc<dyn CallSession>,
    registry: Arc<CallRegistry>,
    state: LegState,
    keep_alive: Option<KeepAlive>,
    registered: bool,
    span: Span,
}

impl LegBridge {
    /// Register the session and start its keep-alive. The bridge is left in
    /// `Created`; call [`LegBridge::route`] to classify and dial.
    ///
    /// A session whose call identifier is already live gets no keep-alive and
    /// is closed by `route` without dialing.
    pub fn create(
        session: Arc<dyn CallSession>,
        registry: Arc<CallRegistry>,
        keep_alive_interval: Duration,
    ) -> Self {
        let info = session.info();
        let span = info_span!("call", call_sid = %info.call_sid, direction = %info.direction);
        span.in_scope(|| info!("new {} call: {}", info.direction, info.call_sid));

        let registered = registry.insert(session.clone());
        let keep_alive =
            registered.then(|| KeepAlive::start(session.clone(), keep_alive_interval, span.clone()));

        Self {
            session,
            registry,
            state: LegState::Created,
            keep_alive,
            registered,
            span,
        }
    }

    pub fn state(&self) -> LegState {
        self.state
    }

    pub fn is_closed(&self) -> bool {
        self.state == LegState::Closed
    }

    pub fn call_sid(&self) -> &CallSid {
        self.session.call_sid()
    }

    pub fn keep_alive_active(&self) -> bool {
        self.keep_alive
            .as_ref()
            .map(|keep_alive| !keep_alive.task.is_finished())
            .unwrap_or(false)
    }

    /// Classify the call, resolve the opposite leg and dial it.
    ///
    /// Number normalization may suspend here; no other event for this
    /// session is handled until routing finishes. Any failure closes the
    /// session without dialing.
    pub async fn route(&mut self, defaults: &BridgeSettings, resolver: &TargetResolver) {
        let span = self.span.clone();
        async {
            if self.state != LegState::Created {
                debug!("route called in state {}, ignoring", self.state);
                return;
            }
            if !self.registered {
                warn!("call {} duplicates a live session, closing without dialing", self.session.call_sid());
                if let Err(e) = self.session.close().await {
                    warn!("failed to close session: {}", e);
                }
                self.state = LegState::Closed;
                return;
            }
            if let Err(e) = self.route_and_dial(defaults, resolver).await {
                error!("Error responding to incoming call {}: {}", self.session.call_sid(), e);
                if let Err(e) = self.session.close().await {
                    warn!("failed to close session: {}", e);
                }
                self.state = LegState::Closed;
                self.stop_keep_alive();
                self.registry.mark_closed(&self.session);
            }
        }
        .instrument(span)
        .await
    }

    async fn route_and_dial(&mut self, defaults: &BridgeSettings, resolver: &TargetResolver) -> Result<()> {
        let info = self.session.info();
        let settings = defaults.merged_with(&BridgeSettings::from_vars(&info.env_vars)?);

        let classification = DirectionClassifier::classify(info, &settings);
        if classification.platform_originated {
            info!("call {} is coming from the voice-agent platform", info.call_sid);
        }
        self.state = LegState::Classified;

        let decision = resolver
            .resolve(classification.platform_originated, &info.from, &info.to, &settings)
            .await;

        self.state = LegState::Dialing;
        self.session
            .send(vec![Verb::Dial(decision.to_dial()), Verb::Hangup])
            .await?;
        self.state = LegState::Bridged;
        Ok(())
    }

    /// Handle one signaling event
    pub async fn handle(&mut self, event: SessionEvent) {
        let span = self.span.clone();
        async {
            self.log_event(&event);
            let parent = self.session.info().parent_call_sid.clone();
            let Transition { next, actions } = transition(self.state, &event, parent.as_ref());
            for action in actions {
                self.execute(action).await;
            }
            if next != self.state {
                debug!("state {} -> {}", self.state, next);
                self.state = next;
            }
        }
        .instrument(span)
        .await
    }

    fn log_event(&self, event: &SessionEvent) {
        let call_sid = self.session.call_sid();
        match event {
            SessionEvent::Refer(refer) => {
                info!(refer_to = %refer.refer_details.refer_to_user, "session {} received refer", call_sid)
            }
            SessionEvent::DialAction(outcome) if !outcome.dial_call_status.is_completed() => info!(
                "outbound dial failed with {}, {:?}",
                outcome.dial_call_status, outcome.dial_sip_status
            ),
            SessionEvent::DialAction(outcome) => debug!("dial finished with {}", outcome.dial_call_status),
            SessionEvent::ReferComplete(complete) => info!(payload = %complete.payload, "referComplete"),
            SessionEvent::Close { code, reason } => {
                info!(?code, ?reason, "session {} closed", call_sid)
            }
            SessionEvent::Error(err) => info!(error = %err, "session {} received error", call_sid),
        }
    }

    async fn execute(&mut self, action: Action) {
        match action {
            Action::Send(verbs) => {
                if let Err(e) = self.session.send(verbs).await {
                    warn!("failed to send verbs: {}", e);
                }
            }
            Action::Reply(verbs) => {
                if let Err(e) = self.session.reply(verbs).await {
                    warn!("failed to reply: {}", e);
                }
            }
            Action::SendToParent { parent, verbs } => match self.registry.lookup(&parent) {
                Lookup::Live(parent_session) => {
                    info!("Sending hangup to parent session {}", parent);
                    if let Err(e) = parent_session.send(verbs).await {
                        warn!("failed to send to parent session {}: {}", parent, e);
                    }
                }
                Lookup::Closed => debug!("parent session {} already closed", parent),
                Lookup::Unknown => debug!("parent session {} not found", parent),
            },
            Action::StopKeepAlive => self.stop_keep_alive(),
            Action::Unregister => self.registry.mark_closed(&self.session),
        }
    }

    fn stop_keep_alive(&mut self) {
        if let Some(keep_alive) = self.keep_alive.take() {
            keep_alive.stop();
        }
    }
}
