use rocket::{http::Status, serde::json::Json, Route};

use crate::{
    error::{Error, Result},
    model::{
        api::assignment::{AssignmentDescription, AssignmentSpec, CapacityReport, PhaseSpec},
        mongodb::Id,
    },
    service::assignments,
    store::Storage,
};

pub fn routes() -> Vec<Route> {
    routes![
        assign_student,
        get_assignment,
        unassign_student,
        laboratory_students,
        set_election_phase,
    ]
}

#[post("/assignments", data = "<spec>", format = "json")]
async fn assign_student(
    spec: Json<AssignmentSpec>,
    storage: Storage,
) -> Result<Json<AssignmentDescription>> {
    let assignment = assignments::assign(
        &*storage,
        &spec.student_id,
        &spec.election_id,
        *spec.laboratory_id,
    )
    .await?;
    Ok(Json(assignment.into()))
}

#[get("/elections/<election_id>/students/<student_id>/assignment")]
async fn get_assignment(
    election_id: &str,
    student_id: &str,
    storage: Storage,
) -> Result<Json<AssignmentDescription>> {
    let assignment = assignments::get_assignment(&*storage, student_id, election_id)
        .await?
        .ok_or_else(|| {
            Error::not_found(format!(
                "Assignment of student {student_id} for election {election_id}"
            ))
        })?;
    Ok(Json(assignment.into()))
}

#[delete("/elections/<election_id>/students/<student_id>/assignment")]
async fn unassign_student(election_id: &str, student_id: &str, storage: Storage) -> Result<Status> {
    assignments::unassign(&*storage, student_id, election_id).await?;
    Ok(Status::NoContent)
}

#[get("/laboratories/<laboratory_id>/elections/<election_id>/students")]
async fn laboratory_students(
    laboratory_id: Id,
    election_id: &str,
    storage: Storage,
) -> Result<Json<CapacityReport>> {
    Ok(Json(
        assignments::capacity_report(&*storage, laboratory_id, election_id).await?,
    ))
}

#[put("/elections/<election_id>/phase", data = "<spec>", format = "json")]
async fn set_election_phase(
    election_id: &str,
    spec: Json<PhaseSpec>,
    storage: Storage,
) -> Result<Status> {
    assignments::set_election_phase(&*storage, election_id, spec.phase).await?;
    Ok(Status::NoContent)
}

#[cfg(test)]
mod tests {
    use rocket::{
        http::{ContentType, Status},
        local::asynchronous::Client,
        serde::json::serde_json,
    };

    use super::*;
    use crate::model::{api::laboratory::LaboratorySpec, common::election::ElectionPhase};
    use crate::service::laboratories;

    async fn annex(storage: &Storage) -> Id {
        laboratories::create_laboratory(&**storage, &LaboratorySpec::example2())
            .await
            .unwrap()
            .id
    }

    async fn post_assignment(client: &Client, student: &str, election: &str, lab: Id) -> Status {
        let spec = AssignmentSpec {
            student_id: student.to_string(),
            election_id: election.to_string(),
            laboratory_id: lab.into(),
        };
        client
            .post(uri!(assign_student))
            .header(ContentType::JSON)
            .body(serde_json::to_string(&spec).unwrap())
            .dispatch()
            .await
            .status()
    }

    #[backend_test]
    async fn assign_and_fetch(client: Client, storage: Storage) {
        let lab = annex(&storage).await;
        assert_eq!(post_assignment(&client, "S-1001", "e1", lab).await, Status::Ok);

        let response = client
            .get(uri!(get_assignment("e1", "S-1001")))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);
        let assignment: AssignmentDescription = response.into_json().await.unwrap();
        assert_eq!(*assignment.laboratory_id, lab);
        assert_eq!(assignment.student_id, "S-1001");

        let response = client
            .get(uri!(get_assignment("e2", "S-1001")))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::NotFound);

        let response = client
            .delete(uri!(unassign_student("e1", "S-1001")))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::NoContent);
        let response = client
            .get(uri!(get_assignment("e1", "S-1001")))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::NotFound);
    }

    #[backend_test]
    async fn padded_student_id_is_one_key(client: Client, storage: Storage) {
        let lab = annex(&storage).await;
        assert_eq!(post_assignment(&client, "S-1001 ", "e1", lab).await, Status::Ok);

        let response = client
            .get(uri!(get_assignment("e1", "S-1001")))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);

        let response = client
            .delete(uri!(unassign_student("e1", "S-1001 ")))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::NoContent);
        assert_eq!(
            assignments::get_assignment(&*storage, "S-1001", "e1")
                .await
                .unwrap(),
            None
        );
    }

    #[backend_test]
    async fn assignment_errors(client: Client, storage: Storage) {
        let lab = annex(&storage).await;
        assert_eq!(
            post_assignment(&client, "S-1001", "e1", Id::new()).await,
            Status::NotFound
        );
        assert_eq!(
            post_assignment(&client, "", "e1", lab).await,
            Status::UnprocessableEntity
        );

        let response = client
            .put(uri!(set_election_phase("e1")))
            .header(ContentType::JSON)
            .body(r#"{"phase": "completed"}"#)
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::NoContent);
        assert_eq!(
            storage.election_phase("e1").await.unwrap(),
            Some(ElectionPhase::Completed)
        );
        assert_eq!(
            post_assignment(&client, "S-1001", "e1", lab).await,
            Status::Conflict
        );
    }

    #[backend_test]
    async fn capacity_report_lists_students(client: Client, storage: Storage) {
        let lab = annex(&storage).await;
        for student in ["S-3", "S-1", "S-2"] {
            assert_eq!(post_assignment(&client, student, "e1", lab).await, Status::Ok);
        }

        let response = client
            .get(uri!(laboratory_students(lab, "e1")))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);
        let report: CapacityReport = response.into_json().await.unwrap();
        assert_eq!(report.capacity, Some(2));
        assert_eq!(report.assigned, 3);
        assert_eq!(report.students, ["S-1", "S-2", "S-3"]);
    }
}
