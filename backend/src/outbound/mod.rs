//! Outbound adapters: implementations of the domain's driven ports.

pub mod cache;
pub mod persistence;
