//! Creation handling: classification, target resolution and the dial

mod common;

use pretty_assertions::assert_eq;
use std::collections::BTreeMap;

use common::{carrier_call, platform_call, service, settings, RecordingSession};
use rvoip_agent_bridge::verbs::Dial;
use rvoip_agent_bridge::{
    CallDirection, CallTarget, Hook, LegState, Lookup, SessionInfo, SipHeaders, Verb,
    AUTHENTICATED_USER_HEADER,
};

fn dial(caller_id: &str, number: &str, trunk: &str) -> Vec<Verb> {
    vec![
        Verb::Dial(Dial {
            caller_id: caller_id.to_string(),
            answer_on_bridge: true,
            anchor_media: true,
            refer_hook: Hook::Refer,
            action_hook: Hook::DialAction,
            target: vec![CallTarget::phone(number, Some(trunk.to_string()))],
            headers: BTreeMap::new(),
        }),
        Verb::Hangup,
    ]
}

#[tokio::test]
async fn test_platform_call_is_forwarded_to_pstn() {
    let service = service(settings());
    let session = RecordingSession::new(platform_call("CA-platform", "+15551230000"));

    let bridge = service.accept(session.clone()).await;

    assert_eq!(bridge.state(), LegState::Bridged);
    assert_eq!(session.sent(), vec![dial("+15550001111", "+15551230000", "trunk-pstn")]);
    assert!(matches!(service.registry().lookup(&"CA-platform".into()), Lookup::Live(_)));
}

#[tokio::test]
async fn test_carrier_call_is_normalized_and_forwarded_to_platform() {
    let mut settings = settings();
    settings.default_country = Some("US".to_string());
    let service = service(settings);
    let session = RecordingSession::new(carrier_call("CA-carrier", "5551230000"));

    let bridge = service.accept(session.clone()).await;

    assert_eq!(bridge.state(), LegState::Bridged);
    assert_eq!(session.sent(), vec![dial("+15550002222", "+15551230000", "trunk-agent")]);
}

#[tokio::test]
async fn test_outbound_leg_with_platform_header_goes_to_platform() {
    let service = service(settings());
    let headers: SipHeaders = [(AUTHENTICATED_USER_HEADER, "agentbot@platform.example")]
        .into_iter()
        .collect();
    let info = SessionInfo::new("CA-out", CallDirection::Outbound, "+15550001111", "+15551230000")
        .with_headers(headers);
    let session = RecordingSession::new(info);

    service.accept(session.clone()).await;

    assert_eq!(session.sent(), vec![dial("+15550001111", "+15551230000", "trunk-agent")]);
}

#[tokio::test]
async fn test_per_call_overrides_win_over_process_defaults() {
    let service = service(settings());
    let info = platform_call("CA-override", "+4930123456")
        .with_env_var("PSTN_TRUNK_NAME", "trunk-pstn-eu")
        .with_env_var("OVERRIDE_FROM_USER", "4930999999")
        .with_env_var("DEFAULT_COUNTRY", "");
    let session = RecordingSession::new(info);

    service.accept(session.clone()).await;

    assert_eq!(session.sent(), vec![dial("4930999999", "+4930123456", "trunk-pstn-eu")]);
}

#[tokio::test]
async fn test_per_call_credential_enables_platform_detection() {
    let mut defaults = settings();
    defaults.platform_sip_username = None;
    let service = service(defaults);
    let info = platform_call("CA-cred", "+15551230000").with_env_var("RETELL_SIP_CLIENT_USERNAME", "agentbot");
    let session = RecordingSession::new(info);

    service.accept(session.clone()).await;

    assert_eq!(session.sent(), vec![dial("+15550001111", "+15551230000", "trunk-pstn")]);
}

#[tokio::test]
async fn test_send_failure_closes_session_without_dialing() {
    let service = service(settings());
    let session = RecordingSession::failing(platform_call("CA-broken", "+15551230000"));

    let bridge = service.accept(session.clone()).await;

    assert_eq!(bridge.state(), LegState::Closed);
    assert!(session.is_closed());
    assert!(session.sent().is_empty());
    assert!(!bridge.keep_alive_active());
    assert!(matches!(service.registry().lookup(&"CA-broken".into()), Lookup::Closed));
}
