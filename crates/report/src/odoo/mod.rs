//! Odoo ERP JSON-RPC client.
//!
//! Provides read-only access to the Odoo models the coverage report needs:
//!
//! - `product.product` - variants with on-hand and incoming quantities
//! - `mrp.bom` / `mrp.bom.line` - one-level bills of materials for packs
//! - `sale.order.line` - confirmed sales lines
//!
//! # Architecture
//!
//! - Every call is an `execute_kw` on the `object` service of `/jsonrpc`
//! - Authentication is the `(db, uid, api key)` triple sent with each call
//! - Empty fields come back as `false`; [`records`] decodes them as `None`
//! - No retries: a failed call surfaces as [`OdooError`] and the caller
//!   decides what a missing answer means

pub mod client;
pub mod records;
pub mod source;

pub use client::OdooClient;

use thiserror::Error;

/// Errors that can occur when interacting with the Odoo API.
#[derive(Debug, Error)]
pub enum OdooError {
    /// HTTP request failed (connection, timeout, non-JSON body).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Odoo answered with an HTTP error status.
    #[error("Unexpected HTTP status {0}")]
    Status(u16),

    /// Odoo returned a JSON-RPC error object.
    #[error("RPC error {code}: {message}")]
    Rpc {
        /// JSON-RPC error code.
        code: i64,
        /// Server-side message, including the exception text when present.
        message: String,
    },

    /// The result did not have the expected shape.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The JSON-RPC response had neither a result nor an error.
    #[error("Empty RPC response")]
    EmptyResponse,

    /// The configured URL cannot host a JSON-RPC endpoint.
    #[error("Invalid Odoo endpoint: {0}")]
    InvalidEndpoint(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_odoo_error_display() {
        let err = OdooError::Rpc {
            code: 200,
            message: "Odoo Server Error: Access Denied".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "RPC error 200: Odoo Server Error: Access Denied"
        );
    }

    #[test]
    fn test_status_error_display() {
        assert_eq!(
            OdooError::Status(502).to_string(),
            "Unexpected HTTP status 502"
        );
    }
}
