//! Report configuration: a JSON document plus secrets from the environment.
//!
//! # Configuration Document
//!
//! ```json
//! {
//!   "recipients": ["buyer@example.com"],
//!   "sender": "reports@example.com",
//!   "smtp": { "host": "smtp.example.com", "port": 465, "security": "tls" },
//!   "brands": ["MELCHIONI", { "name": "ACME", "match_sku": false }],
//!   "report": { "window_days": 30, "top_n": 10, "narrative": true },
//!   "pack": { "brands": ["ACME"], "excluded_skus": ["REF-1", "REF-2"] }
//! }
//! ```
//!
//! # Environment Variables
//!
//! ## Required
//! - `ODOO_URL` - Odoo base URL (the `/jsonrpc` endpoint is derived from it)
//! - `ODOO_DB` - Odoo database name
//! - `ODOO_UID` - Numeric user ID the API key belongs to
//! - `ODOO_TOKEN` - Odoo API key
//! - `SMTP_PASSWORD` - SMTP authentication password (`EMAIL_PASSWORD` is
//!   accepted when it is unset)
//!
//! ## Optional
//! - `SMTP_USERNAME` - SMTP authentication username (default: sender address)
//! - `CLAUDE_API_KEY` - Anthropic API key (narrative summaries)
//! - `CLAUDE_MODEL` - Claude model ID (default: claude-sonnet-4-20250514)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::path::Path;
use std::time::Duration;

use lettre::Address;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;
use url::Url;

use stock_coverage_core::{CoverageThresholds, SalesWindow};

const DEFAULT_CLAUDE_MODEL: &str = "claude-sonnet-4-20250514";
const DEFAULT_SMTP_PORT: u16 = 465;
const DEFAULT_ERP_TIMEOUT_SECS: u64 = 30;
const DEFAULT_TOP_N: usize = 10;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "xxx",
    "todo",
    "insert",
    "put-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read configuration file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid configuration document: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Complete runtime configuration, built once at process start.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Report content and pipeline options.
    pub report: ReportOptions,
    /// Brands to report on, in section order.
    pub brands: Vec<BrandConfig>,
    /// Pack explosion settings.
    pub pack: PackExplosionConfig,
    /// Odoo connection.
    pub odoo: OdooConfig,
    /// Claude connection, `None` when no API key is configured.
    pub claude: Option<ClaudeConfig>,
    /// Outbound email.
    pub email: EmailConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "staging", "production")
    pub sentry_environment: Option<String>,
}

/// The JSON configuration document.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigDocument {
    /// Report recipients.
    pub recipients: Vec<String>,
    /// Sender address (From header).
    pub sender: String,
    /// SMTP server coordinates.
    pub smtp: SmtpSettings,
    /// Brand filters, in section order.
    pub brands: Vec<BrandConfig>,
    /// Report options.
    #[serde(default)]
    pub report: ReportOptions,
    /// Pack explosion settings.
    #[serde(default)]
    pub pack: PackExplosionConfig,
    /// Per-call timeout for ERP requests.
    #[serde(default = "default_erp_timeout_secs")]
    pub erp_timeout_secs: u64,
}

const fn default_erp_timeout_secs() -> u64 {
    DEFAULT_ERP_TIMEOUT_SECS
}

/// SMTP server coordinates from the configuration document.
#[derive(Debug, Clone, Deserialize)]
pub struct SmtpSettings {
    /// Server hostname.
    pub host: String,
    /// Server port.
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    /// Transport security.
    #[serde(default)]
    pub security: SmtpSecurity,
}

const fn default_smtp_port() -> u16 {
    DEFAULT_SMTP_PORT
}

/// How the SMTP connection is secured.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SmtpSecurity {
    /// TLS from the first byte (SMTPS, usually port 465).
    #[default]
    Tls,
    /// Plain connection upgraded with STARTTLS (usually port 587).
    Starttls,
}

/// One brand filter.
///
/// Accepts either a bare string or `{ "name": ..., "match_sku": ... }`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "BrandEntry")]
pub struct BrandConfig {
    /// Case-insensitive substring matched against product names.
    pub name: String,
    /// Also match the substring against SKUs.
    pub match_sku: bool,
}

impl BrandConfig {
    /// Brand matched on name and SKU.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            match_sku: true,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum BrandEntry {
    Name(String),
    Detailed {
        name: String,
        #[serde(default = "default_match_sku")]
        match_sku: bool,
    },
}

const fn default_match_sku() -> bool {
    true
}

impl From<BrandEntry> for BrandConfig {
    fn from(entry: BrandEntry) -> Self {
        match entry {
            BrandEntry::Name(name) => Self::new(name),
            BrandEntry::Detailed { name, match_sku } => Self { name, match_sku },
        }
    }
}

/// Pipeline and presentation options.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ReportOptions {
    /// Lookback window for sales aggregation.
    pub window_days: SalesWindow,
    /// Maximum rows per brand, `None` for all rows.
    pub top_n: Option<usize>,
    /// Include the month-to-date sales column.
    pub month_to_date: bool,
    /// Ask the language model for a narrative summary per brand.
    pub narrative: bool,
    /// Severity thresholds.
    pub thresholds: CoverageThresholds,
    /// Coverage above this many days is shown as `+N days`.
    pub display_cap_days: Option<f64>,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            window_days: SalesWindow::THIRTY_DAYS,
            top_n: Some(DEFAULT_TOP_N),
            month_to_date: true,
            narrative: false,
            thresholds: CoverageThresholds::default(),
            display_cap_days: None,
        }
    }
}

/// Pack explosion settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PackExplosionConfig {
    /// Brands whose packs are replaced by their components (exact name,
    /// case-insensitive).
    pub brands: Vec<String>,
    /// SKUs dropped from exploded brands.
    pub excluded_skus: Vec<String>,
}

impl PackExplosionConfig {
    /// Whether `brand` is a composite brand.
    #[must_use]
    pub fn is_composite(&self, brand: &str) -> bool {
        self.brands
            .iter()
            .any(|candidate| same_brand(candidate, brand))
    }

    /// Whether a normalized (trimmed, uppercased) SKU is excluded.
    #[must_use]
    pub fn is_excluded_sku(&self, normalized_sku: &str) -> bool {
        self.excluded_skus
            .iter()
            .any(|sku| sku.trim().to_uppercase() == normalized_sku)
    }
}

/// Odoo JSON-RPC connection settings.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct OdooConfig {
    /// Base URL of the Odoo instance.
    pub url: Url,
    /// Database name.
    pub database: String,
    /// User ID the API key belongs to.
    pub uid: i64,
    /// API key.
    pub token: SecretString,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl std::fmt::Debug for OdooConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OdooConfig")
            .field("url", &self.url.as_str())
            .field("database", &self.database)
            .field("uid", &self.uid)
            .field("token", &"[REDACTED]")
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Claude AI API configuration.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct ClaudeConfig {
    /// Anthropic API key
    pub api_key: SecretString,
    /// Model ID (e.g., claude-sonnet-4-20250514)
    pub model: String,
}

impl std::fmt::Debug for ClaudeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClaudeConfig")
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .finish()
    }
}

/// Email (SMTP) configuration.
///
/// Implements `Debug` manually to redact the password.
#[derive(Clone)]
pub struct EmailConfig {
    /// SMTP server hostname
    pub smtp_host: String,
    /// SMTP server port
    pub smtp_port: u16,
    /// Transport security
    pub security: SmtpSecurity,
    /// SMTP authentication username
    pub smtp_username: String,
    /// SMTP authentication password
    pub smtp_password: SecretString,
    /// Email sender address (From header)
    pub from_address: String,
    /// Report recipients (To header)
    pub recipients: Vec<String>,
}

impl std::fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailConfig")
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("security", &self.security)
            .field("smtp_username", &self.smtp_username)
            .field("smtp_password", &"[REDACTED]")
            .field("from_address", &self.from_address)
            .field("recipients", &self.recipients)
            .finish()
    }
}

impl ConfigDocument {
    /// Read and validate the configuration document at `path`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file cannot be read, is not valid JSON,
    /// or fails validation.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&raw)
    }

    /// Parse and validate a configuration document.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the JSON is malformed or fails validation.
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let document: Self = serde_json::from_str(raw)?;
        document.validate()?;
        Ok(document)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.brands.is_empty() {
            return Err(ConfigError::Invalid("no brands configured".to_string()));
        }
        if let Some(brand) = self.brands.iter().find(|b| b.name.trim().is_empty()) {
            return Err(ConfigError::Invalid(format!(
                "brand filter cannot be empty (got {:?})",
                brand.name
            )));
        }
        if self.recipients.is_empty() {
            return Err(ConfigError::Invalid("no recipients configured".to_string()));
        }
        for address in self.recipients.iter().chain(std::iter::once(&self.sender)) {
            address.parse::<Address>().map_err(|e| {
                ConfigError::Invalid(format!("invalid email address {address:?}: {e}"))
            })?;
        }
        if self.report.top_n == Some(0) {
            return Err(ConfigError::Invalid(
                "report.top_n must be positive or null".to_string(),
            ));
        }
        let thresholds = &self.report.thresholds;
        if thresholds.critical_days > thresholds.low_days {
            return Err(ConfigError::Invalid(format!(
                "report.thresholds.critical_days ({}) exceeds low_days ({})",
                thresholds.critical_days, thresholds.low_days
            )));
        }
        if self.erp_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "erp_timeout_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

impl AppConfig {
    /// Load the configuration document at `path` and secrets from the
    /// environment.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the document is missing or invalid, or if
    /// required variables are missing or invalid.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let document = ConfigDocument::from_file(path)?;
        Self::from_parts(document, &|key: &str| std::env::var(key).ok())
    }

    /// Combine a validated document with secrets from `env`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_parts(
        document: ConfigDocument,
        env: &dyn Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let odoo = OdooConfig::from_env(env, document.erp_timeout_secs)?;
        let claude = ClaudeConfig::from_env(env);
        let email = EmailConfig::from_env(env, &document)?;

        Ok(Self {
            report: document.report,
            brands: document.brands,
            pack: document.pack,
            odoo,
            claude,
            email,
            sentry_dsn: env("SENTRY_DSN"),
            sentry_environment: env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Problems worth reporting that do not prevent a run: secrets that look
    /// like placeholders, and narratives enabled without an API key.
    ///
    /// Loading happens before logging is set up, so the caller logs these.
    #[must_use]
    pub fn warnings(&self) -> Vec<String> {
        let mut secrets = vec![
            ("ODOO_TOKEN", &self.odoo.token),
            ("SMTP_PASSWORD", &self.email.smtp_password),
        ];
        if let Some(claude) = &self.claude {
            secrets.push(("CLAUDE_API_KEY", &claude.api_key));
        }

        let mut warnings: Vec<String> = secrets
            .into_iter()
            .filter_map(|(var_name, secret)| {
                placeholder_pattern(secret.expose_secret()).map(|pattern| {
                    format!("{var_name} appears to be a placeholder (contains '{pattern}')")
                })
            })
            .collect();

        if self.report.narrative && self.claude.is_none() {
            warnings.push(
                "report.narrative is enabled but CLAUDE_API_KEY is not set; summaries will use the placeholder"
                    .to_string(),
            );
        }
        warnings
    }

    /// Returns a reference to the Claude configuration, if available.
    ///
    /// Returns `None` if `CLAUDE_API_KEY` was not set, which makes every
    /// narrative fall back to the placeholder text.
    #[must_use]
    pub const fn claude(&self) -> Option<&ClaudeConfig> {
        self.claude.as_ref()
    }

    /// Restrict the run to the named brands, keeping configuration order.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if a name does not match a configured
    /// brand.
    pub fn retain_brands(&mut self, names: &[String]) -> Result<(), ConfigError> {
        if names.is_empty() {
            return Ok(());
        }
        if let Some(unknown) = names
            .iter()
            .find(|name| !self.brands.iter().any(|b| same_brand(&b.name, name)))
        {
            return Err(ConfigError::Invalid(format!(
                "brand {unknown:?} is not configured"
            )));
        }
        self.brands
            .retain(|b| names.iter().any(|name| same_brand(&b.name, name)));
        Ok(())
    }
}

impl OdooConfig {
    fn from_env(
        env: &dyn Fn(&str) -> Option<String>,
        timeout_secs: u64,
    ) -> Result<Self, ConfigError> {
        let url = get_required_env(env, "ODOO_URL")?;
        let url = Url::parse(&url)
            .map_err(|e| ConfigError::InvalidEnvVar("ODOO_URL".to_string(), e.to_string()))?;
        let uid = get_required_env(env, "ODOO_UID")?
            .trim()
            .parse::<i64>()
            .map_err(|e| ConfigError::InvalidEnvVar("ODOO_UID".to_string(), e.to_string()))?;

        Ok(Self {
            url,
            database: get_required_env(env, "ODOO_DB")?,
            uid,
            token: get_required_secret(env, "ODOO_TOKEN")?,
            timeout: Duration::from_secs(timeout_secs),
        })
    }

    /// The JSON-RPC endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL cannot be a base (e.g. `mailto:`).
    pub fn rpc_endpoint(&self) -> Result<Url, url::ParseError> {
        let mut base = self.url.clone();
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        base.join("jsonrpc")
    }
}

impl ClaudeConfig {
    /// Returns `None` if `CLAUDE_API_KEY` is not set (narratives disabled).
    fn from_env(env: &dyn Fn(&str) -> Option<String>) -> Option<Self> {
        get_optional_env(env, "CLAUDE_API_KEY").map(|key| Self {
            api_key: SecretString::from(key),
            model: get_optional_env(env, "CLAUDE_MODEL")
                .unwrap_or_else(|| DEFAULT_CLAUDE_MODEL.to_string()),
        })
    }
}

impl EmailConfig {
    fn from_env(
        env: &dyn Fn(&str) -> Option<String>,
        document: &ConfigDocument,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            smtp_host: document.smtp.host.clone(),
            smtp_port: document.smtp.port,
            security: document.smtp.security,
            smtp_username: get_optional_env(env, "SMTP_USERNAME")
                .unwrap_or_else(|| document.sender.clone()),
            smtp_password: get_optional_env(env, "SMTP_PASSWORD")
                .or_else(|| get_optional_env(env, "EMAIL_PASSWORD"))
                .map(SecretString::from)
                .ok_or_else(|| ConfigError::MissingEnvVar("SMTP_PASSWORD".to_string()))?,
            from_address: document.sender.clone(),
            recipients: document.recipients.clone(),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Whether two brand names are the same, ignoring surrounding whitespace and
/// case (Unicode-aware).
fn same_brand(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

/// Get a required, non-empty environment variable.
fn get_required_env(
    env: &dyn Fn(&str) -> Option<String>,
    key: &str,
) -> Result<String, ConfigError> {
    get_optional_env(env, key).ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable, treating empty values as unset.
fn get_optional_env(env: &dyn Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    env(key).filter(|value| !value.trim().is_empty())
}

/// Load a required secret.
fn get_required_secret(
    env: &dyn Fn(&str) -> Option<String>,
    key: &str,
) -> Result<SecretString, ConfigError> {
    get_required_env(env, key).map(SecretString::from)
}

/// Returns the placeholder pattern a secret contains, if any.
fn placeholder_pattern(secret: &str) -> Option<&'static str> {
    let lower = secret.to_lowercase();
    PLACEHOLDER_PATTERNS
        .iter()
        .copied()
        .find(|pattern| lower.contains(pattern))
}
