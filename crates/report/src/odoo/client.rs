//! JSON-RPC transport for `execute_kw` calls.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::instrument;
use url::Url;

use crate::config::OdooConfig;

use super::OdooError;

/// Odoo JSON-RPC API client.
///
/// Cheap to clone; clones share the underlying HTTP connection pool.
#[derive(Clone)]
pub struct OdooClient {
    inner: Arc<OdooClientInner>,
}

struct OdooClientInner {
    client: reqwest::Client,
    endpoint: Url,
    database: String,
    uid: i64,
    token: SecretString,
    next_id: AtomicU64,
}

impl std::fmt::Debug for OdooClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OdooClient")
            .field("endpoint", &self.inner.endpoint.as_str())
            .field("database", &self.inner.database)
            .field("uid", &self.inner.uid)
            .finish_non_exhaustive()
    }
}

/// JSON-RPC request envelope. Carries the API key, so no `Debug`.
#[derive(Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    method: &'static str,
    params: RpcParams<'a>,
    id: u64,
}

#[derive(Serialize)]
struct RpcParams<'a> {
    service: &'static str,
    method: &'static str,
    args: (&'a str, i64, &'a str, &'a str, &'a str, Value, Value),
}

/// JSON-RPC response envelope.
#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    #[serde(default)]
    code: i64,
    message: String,
    #[serde(default)]
    data: Option<RpcErrorData>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorData {
    #[serde(default)]
    message: Option<String>,
}

impl OdooClient {
    /// Create a new Odoo client.
    ///
    /// # Errors
    ///
    /// Returns `OdooError::InvalidEndpoint` if the configured URL cannot be
    /// joined with `jsonrpc`, or `OdooError::Http` if the HTTP client
    /// cannot be built.
    pub fn new(config: &OdooConfig) -> Result<Self, OdooError> {
        let endpoint = config
            .rpc_endpoint()
            .map_err(|e| OdooError::InvalidEndpoint(e.to_string()))?;

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(OdooClientInner {
                client,
                endpoint,
                database: config.database.clone(),
                uid: config.uid,
                token: config.token.clone(),
                next_id: AtomicU64::new(1),
            }),
        })
    }

    /// Call `method` on `model` through `execute_kw`.
    ///
    /// `args` are the positional arguments (a JSON array), `kwargs` the
    /// keyword arguments (a JSON object).
    ///
    /// # Errors
    ///
    /// Returns `OdooError::Http` on network failures or timeouts,
    /// `OdooError::Status` on HTTP error statuses, `OdooError::Rpc` when Odoo
    /// reports an error, and `OdooError::Parse` if the result does not
    /// deserialize into `T`.
    #[instrument(skip(self, args, kwargs))]
    pub async fn execute_kw<T: DeserializeOwned>(
        &self,
        model: &str,
        method: &str,
        args: Value,
        kwargs: Value,
    ) -> Result<T, OdooError> {
        let request = self.build_request(model, method, args, kwargs);

        let response = self
            .inner
            .client
            .post(self.inner.endpoint.clone())
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(OdooError::Status(status.as_u16()));
        }

        let envelope: RpcResponse = response.json().await?;
        let result = unwrap_envelope(envelope)?;
        Ok(serde_json::from_value(result)?)
    }

    /// `search_read` on `model` with an Odoo domain.
    ///
    /// # Errors
    ///
    /// See [`OdooClient::execute_kw`].
    pub async fn search_read<T: DeserializeOwned>(
        &self,
        model: &str,
        domain: Value,
        fields: &[&str],
        limit: Option<u32>,
    ) -> Result<Vec<T>, OdooError> {
        let mut kwargs = json!({ "fields": fields });
        if let (Some(limit), Some(map)) = (limit, kwargs.as_object_mut()) {
            map.insert("limit".to_string(), json!(limit));
        }
        self.execute_kw(model, "search_read", json!([domain]), kwargs)
            .await
    }

    /// `read` of explicit record IDs on `model`.
    ///
    /// # Errors
    ///
    /// See [`OdooClient::execute_kw`].
    pub async fn read<T: DeserializeOwned>(
        &self,
        model: &str,
        ids: &[i64],
        fields: &[&str],
    ) -> Result<Vec<T>, OdooError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.execute_kw(model, "read", json!([ids]), json!({ "fields": fields }))
            .await
    }

    fn build_request<'a>(
        &'a self,
        model: &'a str,
        method: &'a str,
        args: Value,
        kwargs: Value,
    ) -> RpcRequest<'a> {
        RpcRequest {
            jsonrpc: "2.0",
            method: "call",
            params: RpcParams {
                service: "object",
                method: "execute_kw",
                args: (
                    self.inner.database.as_str(),
                    self.inner.uid,
                    self.inner.token.expose_secret(),
                    model,
                    method,
                    args,
                    kwargs,
                ),
            },
            id: self.inner.next_id.fetch_add(1, Ordering::Relaxed),
        }
    }
}

/// Split a JSON-RPC response into its result or error.
fn unwrap_envelope(envelope: RpcResponse) -> Result<Value, OdooError> {
    if let Some(error) = envelope.error {
        let message = match error.data.and_then(|d| d.message) {
            Some(detail) if detail != error.message => format!("{}: {detail}", error.message),
            _ => error.message,
        };
        return Err(OdooError::Rpc {
            code: error.code,
            message,
        });
    }
    envelope.result.ok_or(OdooError::EmptyResponse)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn client() -> OdooClient {
        OdooClient::new(&OdooConfig {
            url: Url::parse("https://erp.example.org").unwrap(),
            database: "production".to_string(),
            uid: 7,
            token: SecretString::from("3f9a0c1be45d7a8e"),
            timeout: Duration::from_secs(30),
        })
        .unwrap()
    }

    #[test]
    fn test_request_envelope_shape() {
        let client = client();
        let request = client.build_request(
            "product.product",
            "search_read",
            json!([[["name", "ilike", "OPPO"]]]),
            json!({"fields": ["id"]}),
        );

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["jsonrpc"], "2.0");
        assert_eq!(value["method"], "call");
        assert_eq!(value["params"]["service"], "object");
        assert_eq!(value["params"]["method"], "execute_kw");
        assert_eq!(
            value["params"]["args"],
            json!([
                "production",
                7,
                "3f9a0c1be45d7a8e",
                "product.product",
                "search_read",
                [[["name", "ilike", "OPPO"]]],
                {"fields": ["id"]}
            ])
        );
    }

    #[test]
    fn test_request_ids_increase() {
        let client = client();
        let first = client.build_request("m", "read", json!([]), json!({})).id;
        let second = client.build_request("m", "read", json!([]), json!({})).id;
        assert!(second > first);
    }

    #[test]
    fn test_unwrap_envelope_result() {
        let envelope: RpcResponse =
            serde_json::from_str(r#"{"jsonrpc":"2.0","id":1,"result":[{"id":3}]}"#).unwrap();
        assert_eq!(unwrap_envelope(envelope).unwrap(), json!([{"id": 3}]));
    }

    #[test]
    fn test_unwrap_envelope_error_includes_detail() {
        let envelope: RpcResponse = serde_json::from_str(
            r#"{"jsonrpc":"2.0","id":1,"error":{"code":200,"message":"Odoo Server Error",
                "data":{"name":"odoo.exceptions.AccessDenied","message":"Access Denied"}}}"#,
        )
        .unwrap();
        let err = unwrap_envelope(envelope).unwrap_err();
        assert!(matches!(
            err,
            OdooError::Rpc { code: 200, ref message } if message == "Odoo Server Error: Access Denied"
        ));
    }

    #[test]
    fn test_unwrap_envelope_empty() {
        let envelope: RpcResponse = serde_json::from_str(r#"{"jsonrpc":"2.0","id":1}"#).unwrap();
        assert!(matches!(
            unwrap_envelope(envelope),
            Err(OdooError::EmptyResponse)
        ));
    }

    #[test]
    fn test_debug_hides_token() {
        let debug_output = format!("{:?}", client());
        assert!(debug_output.contains("erp.example.org"));
        assert!(!debug_output.contains("3f9a0c1be45d7a8e"));
    }

    #[test]
    fn test_odoo_client_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<OdooClient>();
    }
}
