//! Configuration file loading and its effect on a report run.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::path::PathBuf;

use chrono::NaiveDate;

use stock_coverage_integration_tests::{FakeErp, RecordingMailer, StaticNarrator, product};
use stock_coverage_report::{AppConfig, ConfigDocument, ConfigError, ReportJob, RunOutcome};

const DOCUMENT: &str = r#"{
    "recipients": ["buyer@example.com", "warehouse@example.com"],
    "sender": "reports@example.com",
    "smtp": { "host": "smtp.example.com", "port": 587, "security": "starttls" },
    "brands": ["OPPO", { "name": "ACME", "match_sku": false }],
    "report": { "window_days": 15, "top_n": null, "month_to_date": false },
    "pack": { "brands": ["ACME"], "excluded_skus": ["REF-X"] }
}"#;

fn env(key: &str) -> Option<String> {
    match key {
        "ODOO_URL" => Some("https://erp.example.org".to_string()),
        "ODOO_DB" => Some("production".to_string()),
        "ODOO_UID" => Some("7".to_string()),
        "ODOO_TOKEN" => Some("3f9a0c1be45d7a8e".to_string()),
        "SMTP_PASSWORD" => Some("kq8Zp2Lm".to_string()),
        _ => None,
    }
}

fn write_document(name: &str, contents: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!(
        "stock-coverage-{name}-{}.json",
        std::process::id()
    ));
    std::fs::write(&path, contents).unwrap();
    path
}

#[test]
fn test_document_from_file() {
    let path = write_document("valid", DOCUMENT);
    let document = ConfigDocument::from_file(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    let config = AppConfig::from_parts(document, &env).unwrap();
    assert_eq!(config.brands.len(), 2);
    assert!(!config.brands[1].match_sku);
    assert_eq!(config.report.window_days.days(), 15);
    assert_eq!(config.report.top_n, None);
    assert!(config.pack.is_composite("acme"));
    assert_eq!(config.email.smtp_port, 587);
    assert_eq!(config.email.smtp_username, "reports@example.com");
    assert!(config.claude().is_none());
}

#[test]
fn test_missing_file_is_io_error() {
    let path = std::env::temp_dir().join("stock-coverage-does-not-exist.json");
    let err = ConfigDocument::from_file(&path).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
}

#[test]
fn test_malformed_file_is_parse_error() {
    let path = write_document("malformed", "{ \"brands\": [");
    let err = ConfigDocument::from_file(&path).unwrap_err();
    std::fs::remove_file(&path).unwrap();
    assert!(matches!(err, ConfigError::Parse(_)));
}

#[tokio::test]
async fn test_brand_selection_limits_the_run() {
    let document = ConfigDocument::from_json(DOCUMENT).unwrap();
    let mut config = AppConfig::from_parts(document, &env).unwrap();
    config.retain_brands(&["acme".to_string()]).unwrap();

    let erp = FakeErp::new()
        .with_product(product(1, "OP-1", "OPPO Charger", 10.0, 0.0))
        .with_product(product(2, "AC-1", "ACME Cable", 4.0, 0.0));
    let narrator = StaticNarrator(None);
    let mailer = RecordingMailer::new();
    let today = NaiveDate::from_ymd_opt(2026, 10, 15).unwrap();

    let outcome = ReportJob::new(&erp, &narrator, &config.brands, &config.report, &config.pack)
        .run(&mailer, today)
        .await
        .unwrap();

    assert!(matches!(outcome, RunOutcome::Sent { sections: 1 }));
    let sent = mailer.sent();
    assert!(sent[0].subject.starts_with("Stock & coverage: ACME - "));
    assert!(!sent[0].html.contains("OPPO Charger"));
    assert!(!sent[0].html.contains("Month sales"));
}
