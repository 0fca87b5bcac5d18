use serde::{Deserialize, Serialize};

/// Election IDs are issued by the external election service.
pub type ElectionId = String;
/// Student IDs are issued by the external identity service.
pub type StudentId = String;

/// Phases in the election lifecycle, as reported by the election service.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElectionPhase {
    /// Scheduled, voting not yet open.
    Upcoming,
    /// Voting is open.
    Ongoing,
    /// Voting has closed.
    Completed,
}

impl ElectionPhase {
    /// Whether assignments for an election in this phase may still be used.
    /// An election we have never heard of counts as live.
    pub fn is_live(phase: Option<Self>) -> bool {
        !matches!(phase, Some(Self::Completed))
    }
}

/// The form in which student and election IDs are stored and looked up.
/// Every path that reads or writes an assignment key goes through this.
pub fn normalize_id(id: &str) -> &str {
    id.trim()
}
