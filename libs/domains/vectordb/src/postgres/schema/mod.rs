//! sea-orm entities for the tables created by the `migration` crate

pub mod collections;
pub mod entities;
pub mod tenants;
