use std::ops::Deref;

use mongodb::{
    bson::doc, error::Error as DbError, options::IndexOptions, Collection, Database, IndexModel,
};

use crate::model::db::{
    assignment::{Assignment, ElectionPhaseRecord},
    laboratory::{Laboratory, NewLaboratory},
    rule::{IpRule, NewIpRule},
};

use super::counter::Counter;

/// A type that can be directly inserted/read to/from the database.
pub trait MongoCollection {
    /// The name of the collection.
    const NAME: &'static str;
}

/// A database collection of the given type.
pub struct Coll<T>(Collection<T>);

impl<T> Coll<T>
where
    T: MongoCollection,
{
    /// Get a handle on this collection in the given database.
    pub fn from_db(db: &Database) -> Self {
        Self(db.collection(T::NAME))
    }
}

// `Derive(Clone)` would only derive if `T: Clone`, but we don't need that bound.
impl<T> Clone for Coll<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T> Deref for Coll<T> {
    type Target = Collection<T>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

// Laboratory collections
const LABORATORIES: &str = "laboratories";
impl MongoCollection for Laboratory {
    const NAME: &'static str = LABORATORIES;
}
impl MongoCollection for NewLaboratory {
    const NAME: &'static str = LABORATORIES;
}

// Rule collections
const RULES: &str = "ip_rules";
impl MongoCollection for IpRule {
    const NAME: &'static str = RULES;
}
impl MongoCollection for NewIpRule {
    const NAME: &'static str = RULES;
}

// Assignment collection
const ASSIGNMENTS: &str = "assignments";
impl MongoCollection for Assignment {
    const NAME: &'static str = ASSIGNMENTS;
}

// Election phase collection
const ELECTION_PHASES: &str = "election_phases";
impl MongoCollection for ElectionPhaseRecord {
    const NAME: &'static str = ELECTION_PHASES;
}

// Counter collection
const COUNTERS: &str = "counters";
impl MongoCollection for Counter {
    const NAME: &'static str = COUNTERS;
}

/// Ensure that all the required indexes exist on the given database.
///
/// This operation is idempotent.
pub async fn ensure_indexes_exist(db: &Database) -> Result<(), DbError> {
    debug!("Ensuring collection indexes exist");

    let unique = IndexOptions::builder().unique(true).build();

    // Laboratory collection.
    let laboratory_index = IndexModel::builder()
        .keys(doc! {"name_key": 1})
        .options(unique.clone())
        .build();
    Coll::<Laboratory>::from_db(db)
        .create_index(laboratory_index, None)
        .await?;

    // Rule collection.
    let rule_index = IndexModel::builder()
        .keys(doc! {"laboratory_id": 1, "seq": 1})
        .build();
    Coll::<IpRule>::from_db(db)
        .create_index(rule_index, None)
        .await?;

    // Assignment collection.
    let assignment_index = IndexModel::builder()
        .keys(doc! {"student_id": 1, "election_id": 1})
        .options(unique)
        .build();
    let capacity_index = IndexModel::builder()
        .keys(doc! {"laboratory_id": 1, "election_id": 1})
        .build();
    Coll::<Assignment>::from_db(db)
        .create_indexes([assignment_index, capacity_index], None)
        .await?;

    Ok(())
}
