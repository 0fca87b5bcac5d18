use mongodb::{
    bson::{doc, Document},
    options::{FindOneAndUpdateOptions, FindOptions, ReplaceOptions, ReturnDocument},
    Database,
};
use rocket::futures::TryStreamExt;

use crate::error::{Error, Result};
use crate::model::{
    common::election::ElectionPhase,
    db::{
        assignment::{Assignment, ElectionPhaseRecord},
        laboratory::{Laboratory, NewLaboratory},
        rule::{IpRule, NewIpRule},
    },
    mongodb::{is_duplicate_key_error, Coll, Counter, Id, RULE_SEQ_COUNTER_ID},
};

use super::Store;

/// A store backed by MongoDB. Uniqueness of laboratory names and assignment
/// keys is enforced by the indexes from
/// [`crate::model::mongodb::ensure_indexes_exist`].
pub struct MongoStore {
    laboratories: Coll<Laboratory>,
    new_laboratories: Coll<NewLaboratory>,
    rules: Coll<IpRule>,
    new_rules: Coll<NewIpRule>,
    assignments: Coll<Assignment>,
    election_phases: Coll<ElectionPhaseRecord>,
    counters: Coll<Counter>,
}

impl MongoStore {
    pub fn new(db: &Database) -> Self {
        Self {
            laboratories: Coll::from_db(db),
            new_laboratories: Coll::from_db(db),
            rules: Coll::from_db(db),
            new_rules: Coll::from_db(db),
            assignments: Coll::from_db(db),
            election_phases: Coll::from_db(db),
            counters: Coll::from_db(db),
        }
    }

    async fn require_laboratory(&self, id: Id) -> Result<()> {
        let found = self
            .laboratories
            .count_documents(id.as_doc(), None)
            .await?;
        match found {
            0 => Err(Error::not_found(format!("Laboratory {id}"))),
            _ => Ok(()),
        }
    }
}

/// Map a unique index violation on the laboratory name to `DuplicateName`.
fn duplicate_name(err: mongodb::error::Error, name: &str) -> Error {
    if is_duplicate_key_error(&err) {
        Error::DuplicateName(name.to_string())
    } else {
        err.into()
    }
}

fn by_laboratory(laboratory_id: Id, election_id: Option<&str>) -> Document {
    let mut filter = doc! { "laboratory_id": laboratory_id };
    if let Some(election_id) = election_id {
        filter.insert("election_id", election_id);
    }
    filter
}

#[rocket::async_trait]
impl Store for MongoStore {
    async fn insert_laboratory(&self, laboratory: NewLaboratory) -> Result<Laboratory> {
        let id: Id = self
            .new_laboratories
            .insert_one(&laboratory, None)
            .await
            .map_err(|e| duplicate_name(e, &laboratory.name))?
            .inserted_id
            .as_object_id()
            .unwrap() // Valid because the ID comes directly from the DB
            .into();
        Ok(Laboratory { id, laboratory })
    }

    async fn laboratory(&self, id: Id) -> Result<Option<Laboratory>> {
        Ok(self.laboratories.find_one(id.as_doc(), None).await?)
    }

    async fn laboratories(&self) -> Result<Vec<Laboratory>> {
        let options = FindOptions::builder().sort(doc! { "name_key": 1 }).build();
        Ok(self
            .laboratories
            .find(None, options)
            .await?
            .try_collect()
            .await?)
    }

    async fn replace_laboratory(&self, laboratory: Laboratory) -> Result<Option<Laboratory>> {
        let result = self
            .new_laboratories
            .replace_one(laboratory.id.as_doc(), &laboratory.laboratory, None)
            .await
            .map_err(|e| duplicate_name(e, &laboratory.name))?;
        Ok((result.matched_count == 1).then_some(laboratory))
    }

    async fn delete_laboratory(&self, id: Id) -> Result<bool> {
        // The laboratory goes first. A child inserted concurrently either
        // lands before the children are swept, or sees the laboratory gone
        // when it re-checks and removes itself.
        let result = self.laboratories.delete_one(id.as_doc(), None).await?;
        let children = doc! { "laboratory_id": id };
        self.rules.delete_many(children.clone(), None).await?;
        self.assignments.delete_many(children, None).await?;
        Ok(result.deleted_count == 1)
    }

    async fn next_rule_seq(&self) -> Result<u64> {
        Counter::next(&self.counters, RULE_SEQ_COUNTER_ID).await
    }

    async fn insert_rule(&self, rule: NewIpRule) -> Result<IpRule> {
        self.require_laboratory(rule.laboratory_id).await?;
        let id: Id = self
            .new_rules
            .insert_one(&rule, None)
            .await?
            .inserted_id
            .as_object_id()
            .unwrap() // Valid because the ID comes directly from the DB
            .into();
        if let Err(e) = self.require_laboratory(rule.laboratory_id).await {
            // Deleted in the meantime; don't leave an orphan behind.
            self.rules.delete_one(id.as_doc(), None).await?;
            return Err(e);
        }
        Ok(IpRule { id, rule })
    }

    async fn rule(&self, id: Id) -> Result<Option<IpRule>> {
        Ok(self.rules.find_one(id.as_doc(), None).await?)
    }

    async fn rules(&self, laboratory_id: Id) -> Result<Vec<IpRule>> {
        let options = FindOptions::builder().sort(doc! { "seq": 1 }).build();
        Ok(self
            .rules
            .find(doc! { "laboratory_id": laboratory_id }, options)
            .await?
            .try_collect()
            .await?)
    }

    async fn rule_count(&self, laboratory_id: Id) -> Result<u64> {
        Ok(self
            .rules
            .count_documents(doc! { "laboratory_id": laboratory_id }, None)
            .await?)
    }

    async fn set_rule_active(&self, id: Id, active: bool) -> Result<Option<IpRule>> {
        let update = doc! {
            "$set": { "active": active }
        };
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();
        Ok(self
            .rules
            .find_one_and_update(id.as_doc(), update, options)
            .await?)
    }

    async fn delete_rule(&self, id: Id) -> Result<bool> {
        let result = self.rules.delete_one(id.as_doc(), None).await?;
        Ok(result.deleted_count == 1)
    }

    async fn upsert_assignment(&self, assignment: Assignment) -> Result<()> {
        self.require_laboratory(assignment.laboratory_id).await?;
        let filter = Assignment::key_doc(&assignment.student_id, &assignment.election_id);
        let options = ReplaceOptions::builder().upsert(true).build();
        self.assignments
            .replace_one(filter.clone(), &assignment, options)
            .await?;
        if let Err(e) = self.require_laboratory(assignment.laboratory_id).await {
            self.assignments.delete_one(filter, None).await?;
            return Err(e);
        }
        Ok(())
    }

    async fn assignment(
        &self,
        student_id: &str,
        election_id: &str,
    ) -> Result<Option<Assignment>> {
        let filter = Assignment::key_doc(student_id, election_id);
        Ok(self.assignments.find_one(filter, None).await?)
    }

    async fn assignments_for_laboratory(
        &self,
        laboratory_id: Id,
        election_id: Option<&str>,
    ) -> Result<Vec<Assignment>> {
        let options = FindOptions::builder().sort(doc! { "student_id": 1 }).build();
        Ok(self
            .assignments
            .find(by_laboratory(laboratory_id, election_id), options)
            .await?
            .try_collect()
            .await?)
    }

    async fn delete_assignment(&self, student_id: &str, election_id: &str) -> Result<bool> {
        let filter = Assignment::key_doc(student_id, election_id);
        let result = self.assignments.delete_one(filter, None).await?;
        Ok(result.deleted_count == 1)
    }

    async fn set_election_phase(&self, election_id: &str, phase: ElectionPhase) -> Result<()> {
        let record = ElectionPhaseRecord {
            election_id: election_id.to_string(),
            phase,
        };
        let options = ReplaceOptions::builder().upsert(true).build();
        self.election_phases
            .replace_one(doc! { "_id": election_id }, &record, options)
            .await?;
        Ok(())
    }

    async fn election_phase(&self, election_id: &str) -> Result<Option<ElectionPhase>> {
        let record = self
            .election_phases
            .find_one(doc! { "_id": election_id }, None)
            .await?;
        Ok(record.map(|record| record.phase))
    }
}
