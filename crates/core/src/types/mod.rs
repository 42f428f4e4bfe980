//! Core types for the stock coverage report.
//!
//! This module provides type-safe wrappers for the ERP records the report is
//! built from and for the computed coverage rows.

pub mod bom;
pub mod coverage;
pub mod id;
pub mod product;
pub mod row;
pub mod sales;

pub use bom::{BillOfMaterials, BomLine};
pub use coverage::{Coverage, CoverageThresholds, SalesWindow, Severity, WindowError};
pub use id::*;
pub use product::Product;
pub use row::CoverageRow;
pub use sales::{SalesLine, SalesTotals};
