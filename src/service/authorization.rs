//! The vote-time decision: may this student vote in this election from
//! this address?
//!
//! Every path ends in a [`Decision`], and every path except a matching active
//! rule ends in a denial. Errors are only returned when the store itself
//! fails, and callers must treat those as a denial too.

use crate::error::Result;
use crate::model::{
    common::{
        address::{format_ipv4, parse_ipv4},
        decision::{Decision, ReasonCode},
        election::normalize_id,
    },
    db::rule::IpRule,
};
use crate::store::Store;

/// Decide a vote attempt. Read-only with respect to the store.
pub async fn authorize(
    store: &dyn Store,
    student_id: &str,
    election_id: &str,
    client_ip: &str,
) -> Result<Decision> {
    let decision = match parse_ipv4(client_ip) {
        Err(_) => Decision::deny(ReasonCode::MalformedClientIp),
        Ok(ip) => match store
            .assignment(normalize_id(student_id), normalize_id(election_id))
            .await?
        {
            None => Decision::deny(ReasonCode::NotAssigned),
            Some(assignment) => {
                let rules = store.rules(assignment.laboratory_id).await?;
                let decision = decide(&rules, ip);
                trace!(
                    "Checked {} against {} rules of laboratory {}",
                    format_ipv4(ip),
                    rules.len(),
                    assignment.laboratory_id
                );
                decision
            }
        },
    };

    if decision.allowed() {
        info!(
            "Vote allowed: student {student_id}, election {election_id}, ip {client_ip:?}, rule {}",
            decision
                .matched_rule_id()
                .map(|id| id.to_string())
                .unwrap_or_default()
        );
    } else {
        warn!(
            "Vote denied: student {student_id}, election {election_id}, ip {client_ip:?}, {}",
            decision.reason()
        );
    }
    Ok(decision)
}

/// Evaluate a laboratory's rules, in order, against a parsed client address.
///
/// A laboratory with no rules at all is closed, even to an address that an
/// inactive rule would have matched.
pub fn decide(rules: &[IpRule], ip: u32) -> Decision {
    if rules.is_empty() {
        return Decision::deny(ReasonCode::NoRulesConfigured);
    }
    rules
        .iter()
        .find(|rule| rule.matches(ip))
        .map(|rule| Decision::allow(rule.id))
        .unwrap_or_else(|| Decision::deny(ReasonCode::IpNotInRange))
}
