//! # RVoIP Agent Bridge
//!
//! Call-routing decision engine for a telephony bridge that interconnects a
//! PSTN trunk with an AI voice-agent platform over SIP.
//!
//! For every new call session the bridge decides whether the call was
//! originated by the voice-agent platform (outbound leg, forwarded to the
//! PSTN) or by the carrier (inbound leg, forwarded to the platform), dials
//! the opposite leg, and then manages mid-call signaling: relaying transfer
//! requests between legs, declining the original leg when the dial fails,
//! and hanging up the parent leg once a transfer it spawned completes.
//!
//! ## Architecture
//!
//! - `classifier`: decides the call direction from SIP headers and settings
//! - `resolver`: computes the dial target and caller-id for the other leg
//! - `normalizer`: E.164 normalization of dialed numbers
//! - `registry`: call identifier to live session mapping
//! - `bridge`: the per-session state machine
//! - `service`: owns the registry and drives sessions from transport events
//! - `session`, `events`, `verbs`: the typed boundary to the host transport
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use rvoip_agent_bridge::{BridgeConfig, BridgeService, LibPhoneNormalizer};
//!
//! # fn example() -> rvoip_agent_bridge::Result<()> {
//! let config = BridgeConfig::from_env()?;
//! let service = Arc::new(BridgeService::new(config, Arc::new(LibPhoneNormalizer::new())));
//! // For each session announced by the transport:
//! // let handle = service.spawn_session(session, events);
//! # Ok(())
//! # }
//! ```

pub mod bridge;
pub mod classifier;
pub mod config;
pub mod errors;
pub mod events;
pub mod logging;
pub mod normalizer;
pub mod registry;
pub mod resolver;
pub mod service;
pub mod session;
pub mod types;
pub mod verbs;

pub use bridge::{transition, Action, LegBridge, LegState, Transition};
pub use classifier::{Classification, DirectionClassifier, AUTHENTICATED_USER_HEADER};
pub use config::{BridgeConfig, BridgeSettings};
pub use errors::{BridgeError, Result};
pub use events::{DialActionEvent, ReferCompleteEvent, ReferDetails, ReferEvent, SessionEvent};
pub use normalizer::{LibPhoneNormalizer, PhoneNormalizer};
pub use registry::{CallRegistry, Lookup};
pub use resolver::{RoutingDecision, TargetResolver};
pub use service::BridgeService;
pub use session::{CallSession, SessionInfo};
pub use types::{CallDirection, CallSid, CallTarget, DialCallStatus, Hook, SipHeaders, TargetKind};
pub use verbs::Verb;
