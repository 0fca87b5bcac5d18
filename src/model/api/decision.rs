use serde::{Deserialize, Serialize};

use crate::model::{
    api::id::ApiId,
    common::{
        decision::{Decision, ReasonCode},
        election::{ElectionId, StudentId},
    },
};

/// A vote attempt to be checked. Without `client_ip`, the address of the
/// connecting peer is used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizeRequest {
    pub student_id: StudentId,
    pub election_id: ElectionId,
    #[serde(default)]
    pub client_ip: Option<String>,
}

/// The decision for a vote attempt, for the voting flow. `message` is the
/// only part meant to be shown to the voter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionDescription {
    pub allowed: bool,
    pub reason: ReasonCode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_rule_id: Option<ApiId>,
    pub message: String,
}

impl From<Decision> for DecisionDescription {
    fn from(decision: Decision) -> Self {
        Self {
            allowed: decision.allowed(),
            reason: decision.reason(),
            matched_rule_id: decision.matched_rule_id().map(ApiId::from),
            message: decision.voter_message().to_string(),
        }
    }
}
