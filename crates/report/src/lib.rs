//! Stock coverage report library.
//!
//! Reads products, bills of materials and sales from Odoo, estimates days of
//! stock coverage per product, and emails one HTML report with a section per
//! configured brand.
//!
//! The ERP, the narrative generator and the mail transport are reached
//! through the [`pipeline::ErpSource`], [`services::Narrator`] and
//! [`services::Mailer`] traits; [`runner::ReportJob`] drives a run over any
//! implementation of them.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod claude;
pub mod config;
pub mod odoo;
pub mod pipeline;
pub mod render;
pub mod runner;
pub mod services;

pub use config::{AppConfig, ConfigDocument, ConfigError};
pub use render::{BrandReport, RenderedReport, ReportRenderer};
pub use runner::{ReportJob, RunError, RunOutcome};
