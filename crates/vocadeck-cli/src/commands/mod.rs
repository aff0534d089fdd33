//! CLI command handlers

pub mod build;
pub mod cache;
pub mod convert;
pub mod fix_table;
