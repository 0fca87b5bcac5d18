//! DB-compatible (e.g. de/serialisable) types.
//!
//! The types in this module are serialised in an DB-friendly way, e.g.:
//!
//! - IDs and datetimes are serialised in MongoDB's own format.
//! - Addresses are serialised as canonical dotted-quad strings.

pub mod assignment;
pub mod laboratory;
pub mod rule;
