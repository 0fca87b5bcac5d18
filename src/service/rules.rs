//! The rule registry: IP assignment rules, always scoped to one laboratory.

use crate::error::{Error, Result};
use crate::model::{
    api::rule::{BulkOutcome, RuleSpec},
    common::{rule::RuleKind, validation::ValidationError},
    db::rule::{IpRule, NewIpRule},
    mongodb::Id,
};
use crate::store::Store;

use super::laboratories::require_laboratory;

/// Add one rule to a laboratory. The new rule is active.
///
/// A rule admitting every address is only accepted with
/// `confirm_all_addresses` set.
pub async fn add_rule(store: &dyn Store, laboratory_id: Id, spec: &RuleSpec) -> Result<IpRule> {
    require_laboratory(store, laboratory_id).await?;
    insert_rule(store, laboratory_id, spec).await
}

/// Add one single-address rule per non-blank line of `text`.
///
/// Every line succeeds or fails on its own, so a few typos never block the
/// rest of a batch. Only a missing laboratory fails the whole call.
pub async fn add_rules_bulk(
    store: &dyn Store,
    laboratory_id: Id,
    text: &str,
) -> Result<Vec<BulkOutcome>> {
    require_laboratory(store, laboratory_id).await?;

    let mut outcomes = Vec::new();
    for (index, line) in text.lines().enumerate() {
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        let result = insert_rule(store, laboratory_id, &RuleSpec::single(input)).await;
        let (rule_id, error) = match result {
            Ok(rule) => (Some(rule.id.into()), None),
            Err(Error::Validation(err)) => (None, Some(err.reason)),
            Err(err) => {
                error!("Bulk insert into laboratory {laboratory_id}, line {}: {err}", index + 1);
                (None, Some("could not be stored".to_string()))
            }
        };
        outcomes.push(BulkOutcome {
            line: index + 1,
            input: input.to_string(),
            success: rule_id.is_some(),
            rule_id,
            error,
        });
    }

    let failed = outcomes.iter().filter(|o| !o.success).count();
    info!(
        "Bulk insert into laboratory {laboratory_id}: {} added, {failed} rejected",
        outcomes.len() - failed
    );
    Ok(outcomes)
}

/// A laboratory's rules, in insertion order.
pub async fn list_rules(store: &dyn Store, laboratory_id: Id) -> Result<Vec<IpRule>> {
    require_laboratory(store, laboratory_id).await?;
    store.rules(laboratory_id).await
}

pub async fn get_rule(store: &dyn Store, rule_id: Id) -> Result<IpRule> {
    store
        .rule(rule_id)
        .await?
        .ok_or_else(|| Error::not_found(format!("Rule {rule_id}")))
}

/// Activate or deactivate a rule. Setting the current value again is a no-op.
pub async fn set_active(store: &dyn Store, rule_id: Id, active: bool) -> Result<IpRule> {
    let rule = store
        .set_rule_active(rule_id, active)
        .await?
        .ok_or_else(|| Error::not_found(format!("Rule {rule_id}")))?;
    let state = if active { "activated" } else { "deactivated" };
    info!("Rule {rule_id} of laboratory {} {state}", rule.laboratory_id);
    Ok(rule)
}

/// Delete a rule. Deleting a rule that does not exist is not an error.
pub async fn delete_rule(store: &dyn Store, rule_id: Id) -> Result<()> {
    if store.delete_rule(rule_id).await? {
        info!("Deleted rule {rule_id}");
    } else {
        debug!("Rule {rule_id} was already gone");
    }
    Ok(())
}

/// Validate and store a rule for a laboratory known to exist.
async fn insert_rule(store: &dyn Store, laboratory_id: Id, spec: &RuleSpec) -> Result<IpRule> {
    let kind = spec.to_kind()?;
    if kind.covers_everything() {
        if !spec.confirm_all_addresses {
            return Err(ValidationError::new(
                catch_all_field(&kind),
                "rule would admit every IPv4 address; set confirm_all_addresses to add it anyway",
            )
            .into());
        }
        warn!("Laboratory {laboratory_id} is being opened to every IPv4 address");
    }
    let seq = store.next_rule_seq().await?;
    let rule = store
        .insert_rule(NewIpRule::new(laboratory_id, seq, kind))
        .await?;
    debug!("Added rule {} to laboratory {laboratory_id}", rule.id);
    Ok(rule)
}

fn catch_all_field(kind: &RuleKind) -> &'static str {
    match kind {
        RuleKind::Subnet { .. } => "subnet_mask",
        _ => "ip_range_start",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{api::laboratory::LaboratorySpec, common::address::parse_ipv4};
    use crate::service::laboratories::create_laboratory;
    use crate::store::Storage;

    async fn lab(storage: &Storage) -> Id {
        create_laboratory(&**storage, &LaboratorySpec::example())
            .await
            .unwrap()
            .id
    }

    #[rocket::async_test]
    async fn added_rules_are_active_and_ordered() {
        let storage = Storage::in_memory();
        let lab = lab(&storage).await;

        let range = add_rule(&*storage, lab, &RuleSpec::example_range()).await.unwrap();
        let subnet = add_rule(&*storage, lab, &RuleSpec::example_subnet()).await.unwrap();
        assert!(range.active && subnet.active);

        let ids: Vec<_> = list_rules(&*storage, lab)
            .await
            .unwrap()
            .into_iter()
            .map(|rule| rule.id)
            .collect();
        assert_eq!(ids, [range.id, subnet.id]);
    }

    #[rocket::async_test]
    async fn invalid_rules_are_never_stored() {
        let storage = Storage::in_memory();
        let lab = lab(&storage).await;

        let mut inverted = RuleSpec::example_range();
        inverted.ip_range_start = Some("10.9.203.100".into());
        let err = add_rule(&*storage, lab, &inverted).await.unwrap_err();
        assert!(matches!(err, Error::Validation(ref e) if e.field == "ip_range_end"));

        let err = add_rule(&*storage, lab, &RuleSpec::single("10.9.203.256"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(ref e) if e.field == "ip_address"));

        assert!(list_rules(&*storage, lab).await.unwrap().is_empty());
    }

    #[rocket::async_test]
    async fn unknown_laboratory() {
        let storage = Storage::in_memory();
        let err = add_rule(&*storage, Id::new(), &RuleSpec::example_range())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Status(status, _) if status.code == 404));
        assert!(add_rules_bulk(&*storage, Id::new(), "10.0.0.1").await.is_err());
    }

    #[rocket::async_test]
    async fn catch_all_needs_confirmation() {
        let storage = Storage::in_memory();
        let lab = lab(&storage).await;

        let mut everything = RuleSpec::example_everything();
        let err = add_rule(&*storage, lab, &everything).await.unwrap_err();
        assert!(matches!(err, Error::Validation(ref e) if e.field == "subnet_mask"));

        everything.confirm_all_addresses = true;
        let rule = add_rule(&*storage, lab, &everything).await.unwrap();
        assert!(rule.matches(parse_ipv4("203.0.113.9").unwrap()));
    }

    #[rocket::async_test]
    async fn bulk_insert_is_per_line() {
        let storage = Storage::in_memory();
        let lab = lab(&storage).await;

        let mut text = String::new();
        for host in 1..=20 {
            text.push_str(&format!("10.9.203.{host}\n"));
        }
        text.push_str("10.9.203.300\n\n  10.9.203.21  \r\n");

        let outcomes = add_rules_bulk(&*storage, lab, &text).await.unwrap();
        assert_eq!(outcomes.len(), 22);
        assert_eq!(outcomes.iter().filter(|o| o.success).count(), 21);

        let failed: Vec<_> = outcomes.iter().filter(|o| !o.success).collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].line, 21);
        assert_eq!(failed[0].input, "10.9.203.300");
        assert!(failed[0].rule_id.is_none());
        assert!(failed[0].error.as_ref().unwrap().contains("out of range"));

        // Line numbers count the blank line.
        let last = outcomes.last().unwrap();
        assert_eq!((last.line, last.input.as_str()), (23, "10.9.203.21"));

        assert_eq!(storage.rule_count(lab).await.unwrap(), 21);
    }

    #[rocket::async_test]
    async fn toggling_is_idempotent() {
        let storage = Storage::in_memory();
        let lab = lab(&storage).await;
        let rule = add_rule(&*storage, lab, &RuleSpec::example_range()).await.unwrap();

        for _ in 0..2 {
            let rule = set_active(&*storage, rule.id, false).await.unwrap();
            assert!(!rule.active);
        }
        assert!(!get_rule(&*storage, rule.id).await.unwrap().active);
        assert!(set_active(&*storage, rule.id, true).await.unwrap().active);
        assert!(set_active(&*storage, Id::new(), true).await.is_err());
    }

    #[rocket::async_test]
    async fn deleting_twice_is_fine() {
        let storage = Storage::in_memory();
        let lab = lab(&storage).await;
        let rule = add_rule(&*storage, lab, &RuleSpec::example_range()).await.unwrap();

        delete_rule(&*storage, rule.id).await.unwrap();
        delete_rule(&*storage, rule.id).await.unwrap();
        delete_rule(&*storage, Id::new()).await.unwrap();
        assert!(get_rule(&*storage, rule.id).await.is_err());
    }
}
