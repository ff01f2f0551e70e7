//! Command implementations for the flowtag CLI

pub mod lookup;
pub mod report;
