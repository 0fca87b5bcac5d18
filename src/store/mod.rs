//! Persistence of laboratories, rules, assignments and election phases.
//!
//! Everything that decides a vote reads through a [`Store`]; nothing caches
//! authorization data on the side. Each mutation touches a single row, so
//! implementations only need per-row atomicity.

use std::ops::Deref;
use std::sync::Arc;

use rocket::{
    request::{self, FromRequest, Request},
    State,
};

use crate::error::Result;
use crate::model::{
    common::election::ElectionPhase,
    db::{
        assignment::Assignment,
        laboratory::{Laboratory, NewLaboratory},
        rule::{IpRule, NewIpRule},
    },
    mongodb::Id,
};

#[cfg(test)]
mod contract;
mod memory;
mod mongo;

pub use memory::MemoryStore;
pub use mongo::MongoStore;

#[rocket::async_trait]
pub trait Store: Send + Sync {
    /// Insert a laboratory. Fails with `DuplicateName` if another laboratory
    /// has the same case-folded name.
    async fn insert_laboratory(&self, laboratory: NewLaboratory) -> Result<Laboratory>;

    async fn laboratory(&self, id: Id) -> Result<Option<Laboratory>>;

    /// All laboratories, ordered by name.
    async fn laboratories(&self) -> Result<Vec<Laboratory>>;

    /// Replace a laboratory's data. Returns `None` if it does not exist.
    /// Fails with `DuplicateName` like [`Store::insert_laboratory`].
    async fn replace_laboratory(&self, laboratory: Laboratory) -> Result<Option<Laboratory>>;

    /// Delete a laboratory together with its rules and assignments.
    /// Returns whether the laboratory existed.
    async fn delete_laboratory(&self, id: Id) -> Result<bool>;

    /// The next rule sequence number.
    async fn next_rule_seq(&self) -> Result<u64>;

    /// Insert a rule. Fails with 404 if its laboratory does not exist,
    /// including one deleted while the rule was being validated.
    async fn insert_rule(&self, rule: NewIpRule) -> Result<IpRule>;

    async fn rule(&self, id: Id) -> Result<Option<IpRule>>;

    /// A laboratory's rules, in insertion order.
    async fn rules(&self, laboratory_id: Id) -> Result<Vec<IpRule>>;

    async fn rule_count(&self, laboratory_id: Id) -> Result<u64>;

    /// Set a rule's active flag, returning the updated rule if it exists.
    async fn set_rule_active(&self, id: Id, active: bool) -> Result<Option<IpRule>>;

    /// Returns whether the rule existed.
    async fn delete_rule(&self, id: Id) -> Result<bool>;

    /// Insert or overwrite the assignment for `(student_id, election_id)`.
    /// Fails with 404 like [`Store::insert_rule`].
    ///
    /// Keys are taken as given; callers pass them through
    /// [`crate::model::common::election::normalize_id`].
    async fn upsert_assignment(&self, assignment: Assignment) -> Result<()>;

    async fn assignment(&self, student_id: &str, election_id: &str)
        -> Result<Option<Assignment>>;

    /// Assignments to a laboratory, optionally restricted to one election,
    /// ordered by student ID.
    async fn assignments_for_laboratory(
        &self,
        laboratory_id: Id,
        election_id: Option<&str>,
    ) -> Result<Vec<Assignment>>;

    /// Returns whether an assignment existed.
    async fn delete_assignment(&self, student_id: &str, election_id: &str) -> Result<bool>;

    async fn set_election_phase(&self, election_id: &str, phase: ElectionPhase) -> Result<()>;

    async fn election_phase(&self, election_id: &str) -> Result<Option<ElectionPhase>>;
}

/// A shared handle on the configured store. Lives in rocket's managed state
/// and can be taken directly as a request guard.
#[derive(Clone)]
pub struct Storage(Arc<dyn Store>);

impl Storage {
    pub fn new(store: impl Store + 'static) -> Self {
        Self(Arc::new(store))
    }

    /// A fresh, empty in-memory store.
    pub fn in_memory() -> Self {
        Self::new(MemoryStore::new())
    }
}

impl Deref for Storage {
    type Target = dyn Store;

    fn deref(&self) -> &Self::Target {
        self.0.as_ref()
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for Storage {
    type Error = ();

    /// Get the storage handle from the managed state. Fails with a 500 if
    /// no [`Storage`] is managed.
    async fn from_request(req: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        req.guard::<&State<Storage>>()
            .await
            .map(|storage| storage.inner().clone())
    }
}

