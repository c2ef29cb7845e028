//! Call direction classification
//!
//! Decides whether a new session was originated by the voice-agent platform
//! (and must be forwarded to the PSTN) or arrived from the carrier (and must
//! be forwarded to the platform).

use crate::config::BridgeSettings;
use crate::session::SessionInfo;
use crate::types::CallDirection;

/// Header carrying the SIP credential the caller authenticated with
pub const AUTHENTICATED_USER_HEADER: &str = "X-Authenticated-User";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub platform_originated: bool,
}

pub struct DirectionClassifier;

impl DirectionClassifier {
    /// A session is platform-originated only when it is inbound, both the PSTN
    /// trunk and the platform credential are configured, and the user part of
    /// the authenticated-user header equals that credential. Anything else,
    /// including a malformed header, is treated as an ordinary carrier call.
    pub fn classify(session: &SessionInfo, settings: &BridgeSettings) -> Classification {
        Classification {
            platform_originated: Self::is_platform_originated(session, settings),
        }
    }

    fn is_platform_originated(session: &SessionInfo, settings: &BridgeSettings) -> bool {
        if session.direction != CallDirection::Inbound {
            return false;
        }
        let (Some(_), Some(username)) = (
            settings.pstn_trunk_name.as_deref(),
            settings.platform_sip_username.as_deref(),
        ) else {
            return false;
        };

        session
            .headers
            .get(AUTHENTICATED_USER_HEADER)
            .and_then(|value| value.split_once('@'))
            .map(|(user, _host)| user == username)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SipHeaders;

    fn settings() -> BridgeSettings {
        BridgeSettings {
            pstn_trunk_name: Some("trunk-pstn".to_string()),
            platform_sip_username: Some("agentbot".to_string()),
            platform_trunk_name: Some("trunk-agent".to_string()),
            ..Default::default()
        }
    }

    fn session(direction: CallDirection, auth_user: Option<&str>) -> SessionInfo {
        let headers: SipHeaders = auth_user
            .map(|value| (AUTHENTICATED_USER_HEADER, value))
            .into_iter()
            .collect();
        SessionInfo::new("CA-1", direction, "+15550001111", "+15551230000").with_headers(headers)
    }

    #[test]
    fn test_matching_credential_is_platform_originated() {
        let info = session(CallDirection::Inbound, Some("agentbot@platform.example"));
        assert!(DirectionClassifier::classify(&info, &settings()).platform_originated);
    }

    #[test]
    fn test_outbound_is_never_platform_originated() {
        for header in [None, Some("agentbot@platform.example"), Some("garbage")] {
            let info = session(CallDirection::Outbound, header);
            assert!(!DirectionClassifier::classify(&info, &settings()).platform_originated);
        }
    }

    #[test]
    fn test_each_required_setting_is_needed() {
        let info = session(CallDirection::Inbound, Some("agentbot@platform.example"));

        let mut without_trunk = settings();
        without_trunk.pstn_trunk_name = None;
        assert!(!DirectionClassifier::classify(&info, &without_trunk).platform_originated);

        let mut without_username = settings();
        without_username.platform_sip_username = None;
        assert!(!DirectionClassifier::classify(&info, &without_username).platform_originated);
    }

    #[test]
    fn test_missing_or_malformed_header_is_carrier() {
        for header in [None, Some("agentbot"), Some("other@platform.example"), Some("@agentbot")] {
            let info = session(CallDirection::Inbound, header);
            assert!(
                !DirectionClassifier::classify(&info, &settings()).platform_originated,
                "header {:?}",
                header
            );
        }
    }

    #[test]
    fn test_header_name_is_case_insensitive() {
        let headers: SipHeaders = [("x-authenticated-user", "agentbot@10.0.0.1")].into_iter().collect();
        let info = SessionInfo::new("CA-2", CallDirection::Inbound, "a", "b").with_headers(headers);
        assert!(DirectionClassifier::classify(&info, &settings()).platform_originated);
    }
}
