use std::net::IpAddr;

use rocket::{serde::json::Json, Route};

use crate::{
    error::Result,
    model::api::decision::{AuthorizeRequest, DecisionDescription},
    service::authorization,
    store::Storage,
};

pub fn routes() -> Vec<Route> {
    routes![authorize]
}

/// Check a vote attempt. Always answers with a decision unless the store
/// fails, in which case the voting flow gets a 500 and must not proceed.
///
/// Without an explicit `client_ip`, the connecting peer's address is used.
/// IPv6 peers are rendered as-is and so fail to parse, giving a malformed
/// address denial.
#[post("/authorize", data = "<request>", format = "json")]
async fn authorize(
    request: Json<AuthorizeRequest>,
    peer: Option<IpAddr>,
    storage: Storage,
) -> Result<Json<DecisionDescription>> {
    let client_ip = match &request.client_ip {
        Some(ip) => ip.clone(),
        None => peer.map(|ip| ip.to_string()).unwrap_or_default(),
    };
    let decision = authorization::authorize(
        &*storage,
        &request.student_id,
        &request.election_id,
        &client_ip,
    )
    .await?;
    Ok(Json(decision.into()))
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;

    use rocket::{
        http::{ContentType, Status},
        local::asynchronous::Client,
        serde::json::serde_json,
    };

    use super::*;
    use crate::model::{
        api::{laboratory::LaboratorySpec, rule::RuleSpec},
        common::decision::{ReasonCode, DENIED_MESSAGE},
    };
    use crate::service::{assignments, laboratories, rules};

    const STUDENT: &str = "S-1001";
    const ELECTION: &str = "student-council-2026";

    async fn lab208(storage: &Storage) {
        let lab = laboratories::create_laboratory(&**storage, &LaboratorySpec::example())
            .await
            .unwrap();
        rules::add_rule(&**storage, lab.id, &RuleSpec::example_range())
            .await
            .unwrap();
        assignments::assign(&**storage, STUDENT, ELECTION, lab.id)
            .await
            .unwrap();
    }

    fn attempt(client_ip: Option<&str>) -> String {
        serde_json::to_string(&AuthorizeRequest {
            student_id: STUDENT.to_string(),
            election_id: ELECTION.to_string(),
            client_ip: client_ip.map(str::to_string),
        })
        .unwrap()
    }

    async fn decide(client: &Client, body: String) -> DecisionDescription {
        let response = client
            .post(uri!(authorize))
            .header(ContentType::JSON)
            .body(body)
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);
        response.into_json().await.unwrap()
    }

    #[backend_test(logging)]
    async fn allowed_inside_the_range(client: Client, storage: Storage) {
        lab208(&storage).await;

        let decision = decide(&client, attempt(Some("10.9.203.53"))).await;
        assert!(decision.allowed);
        assert_eq!(decision.reason, ReasonCode::Allowed);
        assert!(decision.matched_rule_id.is_some());
        assert_ne!(decision.message, DENIED_MESSAGE);
    }

    #[backend_test]
    async fn denials_share_one_message(client: Client, storage: Storage) {
        lab208(&storage).await;

        let outside = decide(&client, attempt(Some("10.9.204.1"))).await;
        assert!(!outside.allowed);
        assert_eq!(outside.reason, ReasonCode::IpNotInRange);
        assert_eq!(outside.matched_rule_id, None);

        let malformed = decide(&client, attempt(Some("10.9.203"))).await;
        assert_eq!(malformed.reason, ReasonCode::MalformedClientIp);

        let stranger = serde_json::to_string(&AuthorizeRequest {
            student_id: "S-2002".to_string(),
            election_id: ELECTION.to_string(),
            client_ip: Some("10.9.203.53".to_string()),
        })
        .unwrap();
        let unassigned = decide(&client, stranger).await;
        assert_eq!(unassigned.reason, ReasonCode::NotAssigned);

        for denial in [&outside, &malformed, &unassigned] {
            assert_eq!(denial.message, DENIED_MESSAGE);
        }
    }

    #[backend_test]
    async fn falls_back_to_the_peer_address(client: Client, storage: Storage) {
        lab208(&storage).await;

        let inside: SocketAddr = "10.9.203.53:50000".parse().unwrap();
        let response = client
            .post(uri!(authorize))
            .header(ContentType::JSON)
            .remote(inside)
            .body(attempt(None))
            .dispatch()
            .await;
        let decision: DecisionDescription = response.into_json().await.unwrap();
        assert!(decision.allowed);

        let ipv6: SocketAddr = "[fe80::1]:50000".parse().unwrap();
        let response = client
            .post(uri!(authorize))
            .header(ContentType::JSON)
            .remote(ipv6)
            .body(attempt(None))
            .dispatch()
            .await;
        let decision: DecisionDescription = response.into_json().await.unwrap();
        assert_eq!(decision.reason, ReasonCode::MalformedClientIp);
    }
}
