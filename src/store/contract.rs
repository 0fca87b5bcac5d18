//! Behaviour every [`Store`] must share, run against each implementation
//! from its own test module.

use rocket::http::Status;

use super::Store;
use crate::error::Error;
use crate::model::{
    common::{election::ElectionPhase, rule::RuleKind},
    db::{
        assignment::Assignment,
        laboratory::{Laboratory, NewLaboratory},
        rule::{IpRule, IpRuleCore},
    },
    mongodb::Id,
};

async fn laboratory(store: &dyn Store, lab: NewLaboratory) -> Laboratory {
    store.insert_laboratory(lab).await.unwrap()
}

async fn rule(store: &dyn Store, laboratory_id: Id, kind: RuleKind) -> IpRule {
    let seq = store.next_rule_seq().await.unwrap();
    store
        .insert_rule(IpRuleCore::new(laboratory_id, seq, kind))
        .await
        .unwrap()
}

fn is_not_found(err: &Error) -> bool {
    matches!(err, Error::Status(status, _) if *status == Status::NotFound)
}

pub async fn laboratories_round_trip(store: &dyn Store) {
    let annex = laboratory(store, NewLaboratory::example2()).await;
    let lab208 = laboratory(store, NewLaboratory::example()).await;

    assert_eq!(store.laboratory(lab208.id).await.unwrap(), Some(lab208.clone()));
    assert_eq!(store.laboratory(Id::new()).await.unwrap(), None);
    // Ordered by name, not by insertion.
    assert_eq!(store.laboratories().await.unwrap(), [lab208, annex]);
}

pub async fn duplicate_names_are_case_insensitive(store: &dyn Store) {
    laboratory(store, NewLaboratory::example()).await;
    let shouty = NewLaboratory::new("LAB 208", None, None).unwrap();
    let err = store.insert_laboratory(shouty).await.unwrap_err();
    assert!(matches!(err, Error::DuplicateName(ref name) if name == "LAB 208"), "{err}");
    assert_eq!(store.laboratories().await.unwrap().len(), 1);
}

pub async fn rename_onto_self_is_fine(store: &dyn Store) {
    let mut lab = laboratory(store, NewLaboratory::example()).await;
    let other = laboratory(store, NewLaboratory::example2()).await;

    lab.laboratory = NewLaboratory::new("lab 208", None, Some(30)).unwrap();
    let renamed = store.replace_laboratory(lab.clone()).await.unwrap().unwrap();
    assert_eq!(renamed.name, "lab 208");
    assert_eq!(store.laboratory(lab.id).await.unwrap(), Some(renamed));

    let mut clash = other;
    clash.laboratory = NewLaboratory::new("Lab 208", None, None).unwrap();
    let err = store.replace_laboratory(clash).await.unwrap_err();
    assert!(matches!(err, Error::DuplicateName(_)), "{err}");

    let missing = Laboratory {
        id: Id::new(),
        laboratory: NewLaboratory::new("Nowhere", None, None).unwrap(),
    };
    assert_eq!(store.replace_laboratory(missing).await.unwrap(), None);
}

pub async fn deleting_laboratory_cascades(store: &dyn Store) {
    let lab = laboratory(store, NewLaboratory::example()).await;
    let other = laboratory(store, NewLaboratory::example2()).await;
    for laboratory_id in [lab.id, other.id, lab.id] {
        rule(store, laboratory_id, RuleKind::example_range()).await;
    }
    for (student, laboratory_id) in [("s1", lab.id), ("s2", other.id)] {
        store
            .upsert_assignment(Assignment::new(student.into(), "e1".into(), laboratory_id))
            .await
            .unwrap();
    }

    assert!(store.delete_laboratory(lab.id).await.unwrap());
    assert_eq!(store.rule_count(lab.id).await.unwrap(), 0);
    assert_eq!(store.rule_count(other.id).await.unwrap(), 1);
    assert_eq!(store.assignment("s1", "e1").await.unwrap(), None);
    assert!(store.assignment("s2", "e1").await.unwrap().is_some());
    assert!(!store.delete_laboratory(lab.id).await.unwrap());
}

pub async fn children_need_a_laboratory(store: &dyn Store) {
    let gone = laboratory(store, NewLaboratory::example()).await;
    assert!(store.delete_laboratory(gone.id).await.unwrap());

    for laboratory_id in [Id::new(), gone.id] {
        let err = store
            .insert_rule(IpRuleCore::new(laboratory_id, 1, RuleKind::example_range()))
            .await
            .unwrap_err();
        assert!(is_not_found(&err), "{err}");
        assert_eq!(store.rule_count(laboratory_id).await.unwrap(), 0);

        let err = store
            .upsert_assignment(Assignment::new("s1".into(), "e1".into(), laboratory_id))
            .await
            .unwrap_err();
        assert!(is_not_found(&err), "{err}");
        assert_eq!(store.assignment("s1", "e1").await.unwrap(), None);
    }
}

pub async fn rules_keep_insertion_order(store: &dyn Store) {
    assert_eq!(store.next_rule_seq().await.unwrap(), 1);
    assert_eq!(store.next_rule_seq().await.unwrap(), 2);

    let lab = laboratory(store, NewLaboratory::example()).await;
    let kinds = [
        RuleKind::example_subnet(),
        RuleKind::example_single(),
        RuleKind::example_range(),
    ];
    let mut inserted = Vec::new();
    for kind in kinds {
        inserted.push(rule(store, lab.id, kind).await);
    }

    let listed = store.rules(lab.id).await.unwrap();
    assert_eq!(listed, inserted);
    assert_eq!(store.rule(inserted[1].id).await.unwrap(), Some(inserted[1].clone()));
    assert_eq!(store.rule_count(lab.id).await.unwrap(), 3);
}

pub async fn rule_toggle_and_delete(store: &dyn Store) {
    let lab = laboratory(store, NewLaboratory::example()).await;
    let range = rule(store, lab.id, RuleKind::example_range()).await;

    let off = store.set_rule_active(range.id, false).await.unwrap().unwrap();
    assert!(!off.active);
    assert!(!store.rule(range.id).await.unwrap().unwrap().active);
    assert_eq!(store.set_rule_active(Id::new(), true).await.unwrap(), None);

    assert!(store.delete_rule(range.id).await.unwrap());
    assert!(!store.delete_rule(range.id).await.unwrap());
    assert_eq!(store.rule(range.id).await.unwrap(), None);
}

pub async fn assignments_upsert_by_key(store: &dyn Store) {
    let lab = laboratory(store, NewLaboratory::example()).await;
    let annex = laboratory(store, NewLaboratory::example2()).await;

    for (student, election, laboratory_id) in [
        ("s2", "e1", lab.id),
        ("s1", "e1", lab.id),
        ("s1", "e2", lab.id),
        ("s3", "e1", annex.id),
        ("s3", "e1", lab.id),
    ] {
        store
            .upsert_assignment(Assignment::new(student.into(), election.into(), laboratory_id))
            .await
            .unwrap();
    }

    let s3 = store.assignment("s3", "e1").await.unwrap().unwrap();
    assert_eq!(s3.laboratory_id, lab.id);

    let students = |assignments: Vec<Assignment>| -> Vec<String> {
        assignments.into_iter().map(|a| a.student_id).collect()
    };
    let e1 = store
        .assignments_for_laboratory(lab.id, Some("e1"))
        .await
        .unwrap();
    assert_eq!(students(e1), ["s1", "s2", "s3"]);
    let all = store.assignments_for_laboratory(lab.id, None).await.unwrap();
    assert_eq!(all.len(), 4);
    assert!(store
        .assignments_for_laboratory(annex.id, Some("e1"))
        .await
        .unwrap()
        .is_empty());

    assert!(store.delete_assignment("s3", "e1").await.unwrap());
    assert!(!store.delete_assignment("s3", "e1").await.unwrap());
}

pub async fn election_phases_overwrite(store: &dyn Store) {
    assert_eq!(store.election_phase("e1").await.unwrap(), None);
    store
        .set_election_phase("e1", ElectionPhase::Ongoing)
        .await
        .unwrap();
    store
        .set_election_phase("e1", ElectionPhase::Completed)
        .await
        .unwrap();
    assert_eq!(
        store.election_phase("e1").await.unwrap(),
        Some(ElectionPhase::Completed)
    );
    assert_eq!(store.election_phase("e2").await.unwrap(), None);
}

/// Run every contract check against one store implementation, each with a
/// fresh store from `$storage`.
macro_rules! store_contract_tests {
    (@tests [$($attr:tt)*]) => {};
    (@tests [$($attr:tt)*] $name:ident $($rest:ident)*) => {
        #[backend_test$($attr)*]
        async fn $name(storage: Storage) {
            crate::store::contract::$name(&*storage).await;
        }
        $crate::store::contract::store_contract_tests!(@tests [$($attr)*] $($rest)*);
    };
    ($($attr:tt)*) => {
        $crate::store::contract::store_contract_tests!(@tests [$($attr)*]
            laboratories_round_trip
            duplicate_names_are_case_insensitive
            rename_onto_self_is_fine
            deleting_laboratory_cascades
            children_need_a_laboratory
            rules_keep_insertion_order
            rule_toggle_and_delete
            assignments_upsert_by_key
            election_phases_overwrite
        );
    };
}

pub(crate) use store_contract_tests;
