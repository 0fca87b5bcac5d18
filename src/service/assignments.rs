//! The student assignment store, plus the election phases it needs to know
//! whether an assignment is still live.

use std::collections::BTreeSet;

use rocket::http::Status;

use crate::error::{Error, Result};
use crate::model::{
    api::assignment::CapacityReport,
    common::{
        election::{normalize_id, ElectionPhase, StudentId},
        validation::non_blank,
    },
    db::assignment::Assignment,
    mongodb::Id,
};
use crate::store::Store;

use super::laboratories::require_laboratory;

/// Assign a student to a laboratory for one election, replacing any earlier
/// assignment for the same election.
pub async fn assign(
    store: &dyn Store,
    student_id: &str,
    election_id: &str,
    laboratory_id: Id,
) -> Result<Assignment> {
    let student_id = non_blank("student_id", normalize_id(student_id))?;
    let election_id = non_blank("election_id", normalize_id(election_id))?;
    let laboratory = require_laboratory(store, laboratory_id).await?;
    if store.election_phase(&election_id).await? == Some(ElectionPhase::Completed) {
        return Err(Error::Status(
            Status::Conflict,
            format!("Election {election_id} is completed"),
        ));
    }

    let assignment = Assignment::new(student_id, election_id, laboratory_id);
    store.upsert_assignment(assignment.clone()).await?;
    info!(
        "Assigned student {} to laboratory {} for election {}",
        assignment.student_id, laboratory.name, assignment.election_id
    );

    if let Some(capacity) = laboratory.capacity {
        let assigned = store
            .assignments_for_laboratory(laboratory_id, Some(&assignment.election_id))
            .await?
            .len();
        if assigned > capacity as usize {
            warn!(
                "Laboratory {} has {assigned} students for election {} but {capacity} seats",
                laboratory.name, assignment.election_id
            );
        }
    }
    Ok(assignment)
}

/// The assignment naming the laboratory a student must vote from, if any.
pub async fn get_assignment(
    store: &dyn Store,
    student_id: &str,
    election_id: &str,
) -> Result<Option<Assignment>> {
    store
        .assignment(normalize_id(student_id), normalize_id(election_id))
        .await
}

/// Students assigned to a laboratory for one election, ordered by ID.
pub async fn list_by_laboratory(
    store: &dyn Store,
    laboratory_id: Id,
    election_id: &str,
) -> Result<Vec<StudentId>> {
    let assignments = store
        .assignments_for_laboratory(laboratory_id, Some(normalize_id(election_id)))
        .await?;
    Ok(assignments.into_iter().map(|a| a.student_id).collect())
}

/// Remove a student's assignment. Removing a missing assignment is not an error.
pub async fn unassign(store: &dyn Store, student_id: &str, election_id: &str) -> Result<()> {
    let (student_id, election_id) = (normalize_id(student_id), normalize_id(election_id));
    if store.delete_assignment(student_id, election_id).await? {
        info!("Unassigned student {student_id} for election {election_id}");
    }
    Ok(())
}

/// Seats against students for one laboratory and election.
pub async fn capacity_report(
    store: &dyn Store,
    laboratory_id: Id,
    election_id: &str,
) -> Result<CapacityReport> {
    let laboratory = require_laboratory(store, laboratory_id).await?;
    let students = list_by_laboratory(store, laboratory_id, election_id).await?;
    Ok(CapacityReport {
        laboratory_id: laboratory_id.into(),
        election_id: normalize_id(election_id).to_string(),
        capacity: laboratory.capacity,
        assigned: students.len(),
        students,
    })
}

/// Record the phase the election service reports for an election.
pub async fn set_election_phase(
    store: &dyn Store,
    election_id: &str,
    phase: ElectionPhase,
) -> Result<()> {
    let election_id = non_blank("election_id", normalize_id(election_id))?;
    store.set_election_phase(&election_id, phase).await?;
    info!("Election {election_id} is now {phase:?}");
    Ok(())
}

/// Is any student assigned to this laboratory for an election that is not
/// known to be completed?
pub(crate) async fn in_live_use(store: &dyn Store, laboratory_id: Id) -> Result<bool> {
    let elections: BTreeSet<_> = store
        .assignments_for_laboratory(laboratory_id, None)
        .await?
        .into_iter()
        .map(|a| a.election_id)
        .collect();
    for election_id in elections {
        if ElectionPhase::is_live(store.election_phase(&election_id).await?) {
            return Ok(true);
        }
    }
    Ok(false)
}
