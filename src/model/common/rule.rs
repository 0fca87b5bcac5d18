use serde::{de, Deserialize, Deserializer, Serialize};

use super::{
    address::{matches_range, matches_single, matches_subnet, Address, MAX_PREFIX_LEN},
    validation::ValidationError,
};

/// The address pattern of an IP assignment rule.
///
/// Each variant carries exactly the fields its kind needs; the range and
/// prefix invariants are checked by the constructors, and again when a rule
/// is deserialised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "ip_type", rename_all = "snake_case")]
pub enum RuleKind {
    /// One workstation.
    Single { address: Address },
    /// An inclusive block of addresses.
    Range { start: Address, end: Address },
    /// A CIDR block.
    Subnet { base: Address, prefix_len: u8 },
}

/// The wire shape of [`RuleKind`], before its invariants are checked.
#[derive(Deserialize)]
#[serde(tag = "ip_type", rename_all = "snake_case")]
enum UncheckedRuleKind {
    Single { address: Address },
    Range { start: Address, end: Address },
    Subnet { base: Address, prefix_len: u8 },
}

impl TryFrom<UncheckedRuleKind> for RuleKind {
    type Error = ValidationError;

    fn try_from(kind: UncheckedRuleKind) -> Result<Self, Self::Error> {
        match kind {
            UncheckedRuleKind::Single { address } => Ok(Self::single(address)),
            UncheckedRuleKind::Range { start, end } => Self::range(start, end),
            UncheckedRuleKind::Subnet { base, prefix_len } => Self::subnet(base, prefix_len),
        }
    }
}

impl<'de> Deserialize<'de> for RuleKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Self::try_from(UncheckedRuleKind::deserialize(deserializer)?).map_err(de::Error::custom)
    }
}

impl RuleKind {
    pub fn single(address: Address) -> Self {
        Self::Single { address }
    }

    /// A range rule. Fails if `start > end`.
    pub fn range(start: Address, end: Address) -> Result<Self, ValidationError> {
        if start > end {
            return Err(ValidationError::new(
                "ip_range_end",
                format!("range end {end} is before range start {start}"),
            ));
        }
        Ok(Self::Range { start, end })
    }

    /// A subnet rule. Fails if the prefix is longer than 32 bits.
    pub fn subnet(base: Address, prefix_len: u8) -> Result<Self, ValidationError> {
        if prefix_len > MAX_PREFIX_LEN {
            return Err(ValidationError::new(
                "subnet_mask",
                format!("prefix length {prefix_len} exceeds {MAX_PREFIX_LEN}"),
            ));
        }
        Ok(Self::Subnet { base, prefix_len })
    }

    /// Whether this pattern would admit every IPv4 address.
    pub fn covers_everything(&self) -> bool {
        matches!(self, Self::Subnet { prefix_len: 0, .. })
            || matches!(self, Self::Range { start, end }
                if start.value() == 0 && end.value() == u32::MAX)
    }

    /// Test the address pattern alone, ignoring whether the rule is active.
    pub fn contains(&self, ip: u32) -> bool {
        match *self {
            Self::Single { address } => matches_single(address.value(), ip),
            Self::Range { start, end } => matches_range(start.value(), end.value(), ip),
            Self::Subnet { base, prefix_len } => matches_subnet(base.value(), prefix_len, ip),
        }
    }
}
