//! Integration tests for ddbview against a DynamoDB-compatible endpoint.
//!
//! These tests require a server at `localhost:4566` (override with
//! `DDBV_ENDPOINT_URL`). They are marked `#[ignore]` so they don't run during
//! normal `cargo test`.
//!
//! Run them with:
//! ```text
//! cargo test -p ddbview-integration -- --ignored
//! ```

use std::sync::{Arc, Once};

use aws_sdk_dynamodb::config::{BehaviorVersion, Credentials, Region};
use ddbview_core::aws::AwsTableStore;
use ddbview_core::store::TableStore;
use ddbview_core::BrowserConfig;

static INIT: Once = Once::new();

/// Initialize tracing (once).
fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .init();
    });
}

/// Endpoint URL for the server.
fn endpoint_url() -> String {
    std::env::var("DDBV_ENDPOINT_URL").unwrap_or_else(|_| "http://localhost:4566".to_owned())
}

const REGION: &str = "us-east-1";

/// Create a configured DynamoDB client pointing at the local server, used to
/// set up fixtures.
#[must_use]
pub fn dynamodb_client() -> aws_sdk_dynamodb::Client {
    init_tracing();

    let creds = Credentials::new("test", "test", None, None, "integration-test");

    let config = aws_sdk_dynamodb::config::Builder::new()
        .behavior_version(BehaviorVersion::latest())
        .region(Region::new(REGION))
        .credentials_provider(creds)
        .endpoint_url(endpoint_url())
        .build();

    aws_sdk_dynamodb::Client::from_conf(config)
}

/// Browser configuration for the local server.
#[must_use]
pub fn browser_config(table_prefix: &str) -> BrowserConfig {
    let endpoint = endpoint_url();
    let prefix = table_prefix.to_owned();
    BrowserConfig::from_lookup(move |key| match key {
        "DDBV_KEY_ID" | "DDBV_ACC_KEY" => Some("test".to_owned()),
        "DDBV_REGION" => Some(REGION.to_owned()),
        "DDBV_ENDPOINT_URL" => Some(endpoint.clone()),
        "DDBV_STACK" => Some(prefix.clone()),
        _ => None,
    })
}

/// The store the browser uses, built the way the app builds it.
#[must_use]
pub fn browse_store() -> Arc<dyn TableStore> {
    init_tracing();
    Arc::new(AwsTableStore::from_config(&browser_config("")))
}

/// Generate a unique table name for a test.
#[must_use]
pub fn test_table_name(prefix: &str) -> String {
    let id = uuid::Uuid::new_v4().to_string()[..8].to_owned();
    format!("test-{prefix}-{id}")
}

mod test_browse;
