use std::ops::{Deref, DerefMut};

use chrono::{DateTime, SubsecRound, Utc};
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use serde::{Deserialize, Serialize};

use crate::model::{
    common::validation::{non_blank, ValidationError},
    mongodb::Id,
};

/// Core laboratory data, as stored in the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaboratoryCore {
    /// Display name.
    pub name: String,
    /// Case-folded name, unique across all laboratories.
    pub name_key: String,
    pub description: Option<String>,
    /// Number of seats, informational only.
    pub capacity: Option<u32>,
    /// Millisecond precision, as MongoDB stores it.
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

impl LaboratoryCore {
    /// Create a new laboratory, trimming the name and dropping a blank description.
    pub fn new(
        name: &str,
        description: Option<String>,
        capacity: Option<u32>,
    ) -> Result<Self, ValidationError> {
        let name = non_blank("name", name)?;
        Ok(Self {
            name_key: name_key(&name),
            name,
            description: description
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty()),
            capacity,
            created_at: Utc::now().trunc_subsecs(3),
        })
    }
}

/// The key under which laboratory names must be unique.
pub fn name_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// A laboratory without an ID.
pub type NewLaboratory = LaboratoryCore;

/// A laboratory from the database, with its unique ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Laboratory {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub laboratory: LaboratoryCore,
}

impl Deref for Laboratory {
    type Target = LaboratoryCore;

    fn deref(&self) -> &Self::Target {
        &self.laboratory
    }
}

impl DerefMut for Laboratory {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.laboratory
    }
}
