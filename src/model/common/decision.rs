use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::model::mongodb::Id;

/// The message shown to a voter who is turned away. It never says which rule
/// or laboratory was involved, so it cannot be used to map the network.
pub const DENIED_MESSAGE: &str = "You are not authorized to vote from this location.";

/// Why a vote attempt was allowed or denied.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReasonCode {
    /// An active rule of the student's laboratory matched.
    Allowed,
    /// The client address could not be parsed as IPv4.
    MalformedClientIp,
    /// The student has no laboratory for this election.
    NotAssigned,
    /// The student's laboratory has no rules at all.
    NoRulesConfigured,
    /// No active rule matched the client address.
    IpNotInRange,
}

impl Display for ReasonCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let code = match self {
            Self::Allowed => "ALLOWED",
            Self::MalformedClientIp => "MALFORMED_CLIENT_IP",
            Self::NotAssigned => "NOT_ASSIGNED",
            Self::NoRulesConfigured => "NO_RULES_CONFIGURED",
            Self::IpNotInRange => "IP_NOT_IN_RANGE",
        };
        f.write_str(code)
    }
}

/// The outcome of one vote attempt. Only [`Decision::allow`] produces an
/// allowed decision, and it always names the rule responsible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    allowed: bool,
    reason: ReasonCode,
    matched_rule_id: Option<Id>,
}

impl Decision {
    pub fn allow(rule_id: Id) -> Self {
        Self {
            allowed: true,
            reason: ReasonCode::Allowed,
            matched_rule_id: Some(rule_id),
        }
    }

    /// Deny for the given reason.
    ///
    /// Panics if passed [`ReasonCode::Allowed`].
    pub fn deny(reason: ReasonCode) -> Self {
        assert_ne!(reason, ReasonCode::Allowed, "cannot deny with an allow reason");
        Self {
            allowed: false,
            reason,
            matched_rule_id: None,
        }
    }

    pub fn allowed(&self) -> bool {
        self.allowed
    }

    pub fn reason(&self) -> ReasonCode {
        self.reason
    }

    pub fn matched_rule_id(&self) -> Option<Id> {
        self.matched_rule_id
    }

    /// What the voter gets told.
    pub fn voter_message(&self) -> &'static str {
        if self.allowed {
            "You may vote from this location."
        } else {
            DENIED_MESSAGE
        }
    }
}
