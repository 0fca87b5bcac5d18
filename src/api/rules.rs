use rocket::{http::Status, serde::json::Json, Route};

use crate::{
    error::Result,
    model::{
        api::rule::{ActiveRequest, BulkOutcome, BulkRuleRequest, RuleDescription, RuleSpec},
        mongodb::Id,
    },
    service::rules,
    store::Storage,
};

pub fn routes() -> Vec<Route> {
    routes![
        list_rules,
        add_rule,
        add_rules_bulk,
        get_rule,
        set_rule_active,
        delete_rule,
    ]
}

#[get("/laboratories/<laboratory_id>/rules")]
async fn list_rules(laboratory_id: Id, storage: Storage) -> Result<Json<Vec<RuleDescription>>> {
    let rules = rules::list_rules(&*storage, laboratory_id).await?;
    Ok(Json(rules.into_iter().map(RuleDescription::from).collect()))
}

#[post("/laboratories/<laboratory_id>/rules", data = "<spec>", format = "json")]
async fn add_rule(
    laboratory_id: Id,
    spec: Json<RuleSpec>,
    storage: Storage,
) -> Result<Json<RuleDescription>> {
    let rule = rules::add_rule(&*storage, laboratory_id, &spec).await?;
    Ok(Json(rule.into()))
}

#[post(
    "/laboratories/<laboratory_id>/rules/bulk",
    data = "<request>",
    format = "json"
)]
async fn add_rules_bulk(
    laboratory_id: Id,
    request: Json<BulkRuleRequest>,
    storage: Storage,
) -> Result<Json<Vec<BulkOutcome>>> {
    Ok(Json(
        rules::add_rules_bulk(&*storage, laboratory_id, &request.addresses).await?,
    ))
}

#[get("/rules/<rule_id>")]
async fn get_rule(rule_id: Id, storage: Storage) -> Result<Json<RuleDescription>> {
    Ok(Json(rules::get_rule(&*storage, rule_id).await?.into()))
}

#[put("/rules/<rule_id>/active", data = "<request>", format = "json")]
async fn set_rule_active(
    rule_id: Id,
    request: Json<ActiveRequest>,
    storage: Storage,
) -> Result<Json<RuleDescription>> {
    let rule = rules::set_active(&*storage, rule_id, request.active).await?;
    Ok(Json(rule.into()))
}

#[delete("/rules/<rule_id>")]
async fn delete_rule(rule_id: Id, storage: Storage) -> Result<Status> {
    rules::delete_rule(&*storage, rule_id).await?;
    Ok(Status::NoContent)
}
