use std::collections::{BTreeMap, HashMap};

use rocket::tokio::sync::RwLock;

use crate::error::{Error, Result};
use crate::model::{
    common::election::{ElectionId, ElectionPhase, StudentId},
    db::{
        assignment::Assignment,
        laboratory::{Laboratory, NewLaboratory},
        rule::{IpRule, NewIpRule},
    },
    mongodb::Id,
};

use super::Store;

#[derive(Default)]
struct Tables {
    laboratories: HashMap<Id, Laboratory>,
    /// Kept in insertion order.
    rules: Vec<IpRule>,
    next_rule_seq: u64,
    assignments: BTreeMap<(StudentId, ElectionId), Assignment>,
    election_phases: HashMap<ElectionId, ElectionPhase>,
}

impl Tables {
    fn require_laboratory(&self, id: Id) -> Result<()> {
        match self.laboratories.contains_key(&id) {
            true => Ok(()),
            false => Err(Error::not_found(format!("Laboratory {id}"))),
        }
    }

    fn name_taken(&self, name_key: &str, except: Option<Id>) -> bool {
        self.laboratories
            .values()
            .any(|lab| lab.name_key == name_key && Some(lab.id) != except)
    }
}

/// A store held entirely in process memory. Reads share a lock, so
/// concurrent authorizations never wait on each other.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[rocket::async_trait]
impl Store for MemoryStore {
    async fn insert_laboratory(&self, laboratory: NewLaboratory) -> Result<Laboratory> {
        let mut tables = self.tables.write().await;
        if tables.name_taken(&laboratory.name_key, None) {
            return Err(Error::DuplicateName(laboratory.name));
        }
        let laboratory = Laboratory {
            id: Id::new(),
            laboratory,
        };
        tables.laboratories.insert(laboratory.id, laboratory.clone());
        Ok(laboratory)
    }

    async fn laboratory(&self, id: Id) -> Result<Option<Laboratory>> {
        Ok(self.tables.read().await.laboratories.get(&id).cloned())
    }

    async fn laboratories(&self) -> Result<Vec<Laboratory>> {
        let mut laboratories: Vec<_> = self
            .tables
            .read()
            .await
            .laboratories
            .values()
            .cloned()
            .collect();
        laboratories.sort_by(|a, b| a.name_key.cmp(&b.name_key));
        Ok(laboratories)
    }

    async fn replace_laboratory(&self, laboratory: Laboratory) -> Result<Option<Laboratory>> {
        let mut tables = self.tables.write().await;
        if !tables.laboratories.contains_key(&laboratory.id) {
            return Ok(None);
        }
        if tables.name_taken(&laboratory.name_key, Some(laboratory.id)) {
            return Err(Error::DuplicateName(laboratory.laboratory.name));
        }
        tables.laboratories.insert(laboratory.id, laboratory.clone());
        Ok(Some(laboratory))
    }

    async fn delete_laboratory(&self, id: Id) -> Result<bool> {
        let mut tables = self.tables.write().await;
        if tables.laboratories.remove(&id).is_none() {
            return Ok(false);
        }
        tables.rules.retain(|rule| rule.laboratory_id != id);
        tables
            .assignments
            .retain(|_, assignment| assignment.laboratory_id != id);
        Ok(true)
    }

    async fn next_rule_seq(&self) -> Result<u64> {
        let mut tables = self.tables.write().await;
        tables.next_rule_seq += 1;
        Ok(tables.next_rule_seq)
    }

    async fn insert_rule(&self, rule: NewIpRule) -> Result<IpRule> {
        let mut tables = self.tables.write().await;
        tables.require_laboratory(rule.laboratory_id)?;
        let rule = IpRule { id: Id::new(), rule };
        tables.rules.push(rule.clone());
        Ok(rule)
    }

    async fn rule(&self, id: Id) -> Result<Option<IpRule>> {
        let tables = self.tables.read().await;
        Ok(tables.rules.iter().find(|rule| rule.id == id).cloned())
    }

    async fn rules(&self, laboratory_id: Id) -> Result<Vec<IpRule>> {
        let tables = self.tables.read().await;
        let mut rules: Vec<_> = tables
            .rules
            .iter()
            .filter(|rule| rule.laboratory_id == laboratory_id)
            .cloned()
            .collect();
        rules.sort_by_key(|rule| rule.seq);
        Ok(rules)
    }

    async fn rule_count(&self, laboratory_id: Id) -> Result<u64> {
        let tables = self.tables.read().await;
        let count = tables
            .rules
            .iter()
            .filter(|rule| rule.laboratory_id == laboratory_id)
            .count();
        Ok(count as u64)
    }

    async fn set_rule_active(&self, id: Id, active: bool) -> Result<Option<IpRule>> {
        let mut tables = self.tables.write().await;
        Ok(tables
            .rules
            .iter_mut()
            .find(|rule| rule.id == id)
            .map(|rule| {
                rule.active = active;
                rule.clone()
            }))
    }

    async fn delete_rule(&self, id: Id) -> Result<bool> {
        let mut tables = self.tables.write().await;
        let before = tables.rules.len();
        tables.rules.retain(|rule| rule.id != id);
        Ok(tables.rules.len() != before)
    }

    async fn upsert_assignment(&self, assignment: Assignment) -> Result<()> {
        let mut tables = self.tables.write().await;
        tables.require_laboratory(assignment.laboratory_id)?;
        let key = (assignment.student_id.clone(), assignment.election_id.clone());
        tables.assignments.insert(key, assignment);
        Ok(())
    }

    async fn assignment(
        &self,
        student_id: &str,
        election_id: &str,
    ) -> Result<Option<Assignment>> {
        let key = (student_id.to_string(), election_id.to_string());
        Ok(self.tables.read().await.assignments.get(&key).cloned())
    }

    async fn assignments_for_laboratory(
        &self,
        laboratory_id: Id,
        election_id: Option<&str>,
    ) -> Result<Vec<Assignment>> {
        let tables = self.tables.read().await;
        let mut assignments: Vec<_> = tables
            .assignments
            .values()
            .filter(|a| a.laboratory_id == laboratory_id)
            .filter(|a| election_id.map_or(true, |election| a.election_id == election))
            .cloned()
            .collect();
        assignments.sort_by(|a, b| a.student_id.cmp(&b.student_id));
        Ok(assignments)
    }

    async fn delete_assignment(&self, student_id: &str, election_id: &str) -> Result<bool> {
        let key = (student_id.to_string(), election_id.to_string());
        Ok(self.tables.write().await.assignments.remove(&key).is_some())
    }

    async fn set_election_phase(&self, election_id: &str, phase: ElectionPhase) -> Result<()> {
        self.tables
            .write()
            .await
            .election_phases
            .insert(election_id.to_string(), phase);
        Ok(())
    }

    async fn election_phase(&self, election_id: &str) -> Result<Option<ElectionPhase>> {
        Ok(self
            .tables
            .read()
            .await
            .election_phases
            .get(election_id)
            .copied())
    }
}

#[cfg(test)]
mod tests {
    use crate::store::contract::store_contract_tests;
    use crate::Storage;

    store_contract_tests!();
}
