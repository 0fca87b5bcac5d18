pub mod address;
pub mod decision;
pub mod election;
pub mod rule;
pub mod validation;
