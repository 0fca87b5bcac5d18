//! API-compatible (e.g. de/serialisable) types.
//!
//! The types in this module are serialised in an API-friendly way, e.g.:
//!
//! - IDs are plain hex strings.
//! - Datetimes are RFC 3339 strings.

pub mod assignment;
pub mod decision;
pub mod id;
pub mod laboratory;
pub mod rule;
