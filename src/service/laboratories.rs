//! The laboratory directory.

use crate::error::{Error, Result};
use crate::model::{
    api::laboratory::{LaboratoryDescription, LaboratorySpec},
    db::laboratory::{Laboratory, NewLaboratory},
    mongodb::Id,
};
use crate::store::Store;

use super::assignments::in_live_use;

/// Create a laboratory. Names are unique regardless of case.
pub async fn create_laboratory(store: &dyn Store, spec: &LaboratorySpec) -> Result<Laboratory> {
    let laboratory = NewLaboratory::new(&spec.name, spec.description.clone(), spec.capacity)?;
    let laboratory = store.insert_laboratory(laboratory).await?;
    info!("Created laboratory {} ({})", laboratory.name, laboratory.id);
    Ok(laboratory)
}

/// All laboratories, ordered by name, with their rule counts.
pub async fn list_laboratories(store: &dyn Store) -> Result<Vec<LaboratoryDescription>> {
    let mut descriptions = Vec::new();
    for laboratory in store.laboratories().await? {
        let rule_count = store.rule_count(laboratory.id).await?;
        descriptions.push(LaboratoryDescription::new(laboratory, rule_count));
    }
    Ok(descriptions)
}

pub async fn get_laboratory(store: &dyn Store, laboratory_id: Id) -> Result<LaboratoryDescription> {
    let laboratory = require_laboratory(store, laboratory_id).await?;
    let rule_count = store.rule_count(laboratory_id).await?;
    Ok(LaboratoryDescription::new(laboratory, rule_count))
}

/// Rename or re-describe a laboratory. Its rules and assignments are untouched.
pub async fn update_laboratory(
    store: &dyn Store,
    laboratory_id: Id,
    spec: &LaboratorySpec,
) -> Result<LaboratoryDescription> {
    let existing = require_laboratory(store, laboratory_id).await?;
    let mut laboratory = NewLaboratory::new(&spec.name, spec.description.clone(), spec.capacity)?;
    laboratory.created_at = existing.created_at;
    let updated = store
        .replace_laboratory(Laboratory {
            id: laboratory_id,
            laboratory,
        })
        .await?
        .ok_or_else(|| Error::not_found(format!("Laboratory {laboratory_id}")))?;
    let rule_count = store.rule_count(laboratory_id).await?;
    Ok(LaboratoryDescription::new(updated, rule_count))
}

/// Delete a laboratory and everything it owns.
///
/// Refused with `InUse` while any student is assigned to it for an election
/// that is upcoming, ongoing, or of unknown phase.
pub async fn delete_laboratory(store: &dyn Store, laboratory_id: Id) -> Result<()> {
    require_laboratory(store, laboratory_id).await?;
    if in_live_use(store, laboratory_id).await? {
        warn!("Refused to delete laboratory {laboratory_id}: assigned for a live election");
        return Err(Error::InUse(laboratory_id));
    }
    if store.delete_laboratory(laboratory_id).await? {
        info!("Deleted laboratory {laboratory_id}");
    }
    Ok(())
}

/// Fetch a laboratory, failing with 404 if it does not exist.
pub(crate) async fn require_laboratory(store: &dyn Store, laboratory_id: Id) -> Result<Laboratory> {
    store
        .laboratory(laboratory_id)
        .await?
        .ok_or_else(|| Error::not_found(format!("Laboratory {laboratory_id}")))
}
