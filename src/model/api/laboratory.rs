use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{api::id::ApiId, db::laboratory::Laboratory};

/// A laboratory as submitted for creation or update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaboratorySpec {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub capacity: Option<u32>,
}

/// A laboratory as returned by the API, with its derived rule count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaboratoryDescription {
    pub id: ApiId,
    pub name: String,
    pub description: Option<String>,
    pub capacity: Option<u32>,
    pub rule_count: u64,
    pub created_at: DateTime<Utc>,
}

impl LaboratoryDescription {
    pub fn new(laboratory: Laboratory, rule_count: u64) -> Self {
        Self {
            id: laboratory.id.into(),
            name: laboratory.laboratory.name,
            description: laboratory.laboratory.description,
            capacity: laboratory.laboratory.capacity,
            rule_count,
            created_at: laboratory.laboratory.created_at,
        }
    }
}

/// Example data for tests.
#[cfg(test)]
mod examples {
    use super::*;

    impl LaboratorySpec {
        pub fn example() -> Self {
            Self {
                name: "Lab 208".to_string(),
                description: Some("Engineering block, second floor".to_string()),
                capacity: Some(60),
            }
        }

        pub fn example2() -> Self {
            Self {
                name: "Library Annex".to_string(),
                description: None,
                capacity: Some(2),
            }
        }
    }
}
