use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{
    api::id::ApiId,
    common::{
        address::{parse_cidr, parse_prefix_len, prefix_from_netmask, Address},
        rule::RuleKind,
        validation::ValidationError,
    },
    db::rule::IpRule,
};

/// The kind of rule being submitted.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IpType {
    Single,
    Range,
    Subnet,
}

/// A rule as submitted by an administrator: a flat form whose fields only
/// make sense for some values of `ip_type`. Empty strings count as absent.
///
/// Subnets can be given as `subnet_mask = "10.9.203.0/24"`, or as
/// `ip_address = "10.9.203.0"` with `subnet_mask` set to `"24"`, `"/24"`
/// or `"255.255.255.0"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSpec {
    pub ip_type: IpType,
    #[serde(default)]
    pub ip_address: Option<String>,
    #[serde(default)]
    pub ip_range_start: Option<String>,
    #[serde(default)]
    pub ip_range_end: Option<String>,
    #[serde(default)]
    pub subnet_mask: Option<String>,
    /// Must be set to add a rule that admits every address.
    #[serde(default)]
    pub confirm_all_addresses: bool,
}

/// A trimmed, non-empty field value, if one was given.
fn field(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn required<'a>(name: &'static str, value: &'a Option<String>) -> Result<&'a str, ValidationError> {
    field(value).ok_or_else(|| ValidationError::missing(name))
}

fn forbidden(name: &'static str, value: &Option<String>, ip_type: IpType) -> Result<(), ValidationError> {
    match field(value) {
        Some(_) => Err(ValidationError::new(
            name,
            format!("not allowed for ip_type {ip_type:?}").to_lowercase(),
        )),
        None => Ok(()),
    }
}

fn address(name: &'static str, text: &str) -> Result<Address, ValidationError> {
    text.parse::<Address>()
        .map_err(|e| ValidationError::address(name, e))
}

impl RuleSpec {
    /// Validate the form into a tagged rule kind.
    pub fn to_kind(&self) -> Result<RuleKind, ValidationError> {
        match self.ip_type {
            IpType::Single => {
                forbidden("ip_range_start", &self.ip_range_start, self.ip_type)?;
                forbidden("ip_range_end", &self.ip_range_end, self.ip_type)?;
                forbidden("subnet_mask", &self.subnet_mask, self.ip_type)?;
                let ip = address("ip_address", required("ip_address", &self.ip_address)?)?;
                Ok(RuleKind::single(ip))
            }
            IpType::Range => {
                forbidden("ip_address", &self.ip_address, self.ip_type)?;
                forbidden("subnet_mask", &self.subnet_mask, self.ip_type)?;
                let start = required("ip_range_start", &self.ip_range_start)?;
                let end = required("ip_range_end", &self.ip_range_end)?;
                RuleKind::range(
                    address("ip_range_start", start)?,
                    address("ip_range_end", end)?,
                )
            }
            IpType::Subnet => {
                forbidden("ip_range_start", &self.ip_range_start, self.ip_type)?;
                forbidden("ip_range_end", &self.ip_range_end, self.ip_type)?;
                let mask = required("subnet_mask", &self.subnet_mask)?;
                let (base, prefix_len) = match field(&self.ip_address) {
                    None => {
                        let (base, prefix_len) = parse_cidr(mask)
                            .map_err(|e| ValidationError::address("subnet_mask", e))?;
                        (Address::new(base), prefix_len)
                    }
                    Some(ip) => {
                        let base = address("ip_address", ip)?;
                        let prefix_len = match mask.contains('.') {
                            true => prefix_from_netmask(mask),
                            false => parse_prefix_len(mask),
                        };
                        let prefix_len = prefix_len
                            .map_err(|e| ValidationError::address("subnet_mask", e))?;
                        (base, prefix_len)
                    }
                };
                RuleKind::subnet(base, prefix_len)
            }
        }
    }

    /// A single-address rule, as produced by each line of a bulk insertion.
    pub fn single(ip_address: &str) -> Self {
        Self {
            ip_type: IpType::Single,
            ip_address: Some(ip_address.to_string()),
            ip_range_start: None,
            ip_range_end: None,
            subnet_mask: None,
            confirm_all_addresses: false,
        }
    }
}

/// A rule as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleDescription {
    pub id: ApiId,
    pub laboratory_id: ApiId,
    #[serde(flatten)]
    pub kind: RuleKind,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<IpRule> for RuleDescription {
    fn from(rule: IpRule) -> Self {
        Self {
            id: rule.id.into(),
            laboratory_id: rule.laboratory_id.into(),
            kind: rule.kind,
            active: rule.active,
            created_at: rule.created_at,
        }
    }
}

/// Newline-delimited addresses to add as single rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkRuleRequest {
    pub addresses: String,
}

/// What happened to one line of a bulk insertion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkOutcome {
    /// 1-based line number in the submitted text.
    pub line: usize,
    /// The line as submitted, trimmed.
    pub input: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule_id: Option<ApiId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// New value of a rule's active flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveRequest {
    pub active: bool,
}
