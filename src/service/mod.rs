//! The operations of the authorization engine, each over any [`crate::store::Store`].

pub mod assignments;
pub mod authorization;
pub mod laboratories;
pub mod rules;
