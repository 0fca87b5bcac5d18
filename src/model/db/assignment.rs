use chrono::{DateTime, SubsecRound, Utc};
use mongodb::bson::{doc, serde_helpers::chrono_datetime_as_bson_datetime, Document};
use serde::{Deserialize, Serialize};

use crate::model::{
    common::election::{ElectionId, ElectionPhase, StudentId},
    mongodb::Id,
};

/// The laboratory a student must vote from in one election.
/// `(student_id, election_id)` is unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub student_id: StudentId,
    pub election_id: ElectionId,
    pub laboratory_id: Id,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub assigned_at: DateTime<Utc>,
}

impl Assignment {
    pub fn new(student_id: StudentId, election_id: ElectionId, laboratory_id: Id) -> Self {
        Self {
            student_id,
            election_id,
            laboratory_id,
            assigned_at: Utc::now().trunc_subsecs(3),
        }
    }

    /// A filter document matching the assignment key.
    pub fn key_doc(student_id: &str, election_id: &str) -> Document {
        doc! {
            "student_id": student_id,
            "election_id": election_id,
        }
    }
}

/// The last phase the election service reported for an election.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectionPhaseRecord {
    #[serde(rename = "_id")]
    pub election_id: ElectionId,
    pub phase: ElectionPhase,
}
