use std::ops::{Deref, DerefMut};

use chrono::{DateTime, SubsecRound, Utc};
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use serde::{Deserialize, Serialize};

use crate::model::{common::rule::RuleKind, mongodb::Id};

/// Core IP assignment rule data, as stored in the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpRuleCore {
    /// The laboratory that owns this rule.
    pub laboratory_id: Id,
    /// Insertion sequence number; rules are listed and evaluated in this order.
    pub seq: u64,
    pub kind: RuleKind,
    /// Inactive rules never match.
    pub active: bool,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

impl IpRuleCore {
    /// A new, active rule.
    pub fn new(laboratory_id: Id, seq: u64, kind: RuleKind) -> Self {
        Self {
            laboratory_id,
            seq,
            kind,
            active: true,
            created_at: Utc::now().trunc_subsecs(3),
        }
    }

    /// Does this rule admit `ip`? Always false for an inactive rule.
    pub fn matches(&self, ip: u32) -> bool {
        self.active && self.kind.contains(ip)
    }
}

/// A rule without an ID.
pub type NewIpRule = IpRuleCore;

/// A rule from the database, with its unique ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpRule {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub rule: IpRuleCore,
}

impl Deref for IpRule {
    type Target = IpRuleCore;

    fn deref(&self) -> &Self::Target {
        &self.rule
    }
}

impl DerefMut for IpRule {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.rule
    }
}
