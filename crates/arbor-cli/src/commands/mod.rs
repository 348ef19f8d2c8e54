//! Command implementations.

pub(crate) mod browse;
pub(crate) mod config;
pub(crate) mod edit;
pub(crate) mod transfer;
