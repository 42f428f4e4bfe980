//! Stock Coverage Core - Shared domain types.
//!
//! This crate provides the types shared by the report pipeline and its tests:
//! - `report` - ERP access, rendering, email delivery and run orchestration
//! - `cli` - Command-line entry point for scheduled runs
//!
//! # Architecture
//!
//! The core crate contains only types and the coverage arithmetic - no I/O,
//! no HTTP clients, no clock access. Callers pass "today" and the sales
//! window explicitly, which keeps every calculation here deterministic.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, product snapshots, sales lines, coverage values

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
