use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{
    api::id::ApiId,
    common::election::{ElectionId, ElectionPhase, StudentId},
    db::assignment::Assignment,
};

/// A request to assign a student to a laboratory for one election.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentSpec {
    pub student_id: StudentId,
    pub election_id: ElectionId,
    pub laboratory_id: ApiId,
}

/// An assignment as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentDescription {
    pub student_id: StudentId,
    pub election_id: ElectionId,
    pub laboratory_id: ApiId,
    pub assigned_at: DateTime<Utc>,
}

impl From<Assignment> for AssignmentDescription {
    fn from(assignment: Assignment) -> Self {
        Self {
            student_id: assignment.student_id,
            election_id: assignment.election_id,
            laboratory_id: assignment.laboratory_id.into(),
            assigned_at: assignment.assigned_at,
        }
    }
}

/// Who is expected at a laboratory for one election.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapacityReport {
    pub laboratory_id: ApiId,
    pub election_id: ElectionId,
    pub capacity: Option<u32>,
    pub assigned: usize,
    pub students: Vec<StudentId>,
}

/// The phase an election has entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseSpec {
    pub phase: ElectionPhase,
}
