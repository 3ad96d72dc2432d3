//! ddbview - browse DynamoDB tables from the terminal.
//!
//! Reads commands from stdin and drives one browse session: pick a table,
//! scan or query it with filters, and page through the results.
//!
//! # Usage
//!
//! ```text
//! DDBV_KEY_ID=... DDBV_ACC_KEY=... ddbview
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `DDBV_KEY_ID` | *(required)* | Access key id |
//! | `DDBV_ACC_KEY` | *(required)* | Secret access key |
//! | `DDBV_STACK` | *(empty)* | Only list tables starting with this prefix |
//! | `DDBV_REGION` | `ap-southeast-2` | Region |
//! | `DDBV_ENDPOINT_URL` | *(unset)* | Endpoint override, e.g. `http://localhost:4566` |
//! | `DDBV_PAGE_SIZE` | `10` | Initial page size |
//! | `LOG_LEVEL` | `warn` | Log level filter |
//! | `RUST_LOG` | *(unset)* | Fine-grained tracing filter (overrides `LOG_LEVEL`) |

mod repl;

use std::sync::Arc;

use anyhow::{Context, Result, bail};
use ddbview_core::aws::AwsTableStore;
use ddbview_core::store::TableStore;
use ddbview_core::{BrowseSession, BrowserConfig, KeySchemaResolver, TableCatalog};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::repl::{Command, HELP, Repl, parse_command};

/// Initialize the tracing subscriber.
///
/// Uses `RUST_LOG` if set, otherwise falls back to the `LOG_LEVEL` value.
/// Logs go to stderr so they never interleave with result pages.
fn init_tracing(log_level: &str) -> Result<()> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::try_new(log_level)
            .with_context(|| format!("invalid log level filter: {log_level}"))?
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}

fn log_level() -> String {
    std::env::var("LOG_LEVEL").unwrap_or_else(|_| "warn".to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    let log = log_level();
    init_tracing(&log)?;

    let config = BrowserConfig::from_env();
    let missing = config.missing_variables();
    if !missing.is_empty() {
        eprintln!("credentials are not configured, set:");
        for var in &missing {
            eprintln!("  export {var}=<value>");
        }
        bail!("missing environment variables: {}", missing.join(", "));
    }
    info!(
        region = %config.region,
        prefix = %config.table_prefix,
        endpoint = ?config.endpoint_url,
        "starting ddbview"
    );

    let store: Arc<dyn TableStore> = Arc::new(AwsTableStore::from_config(&config));
    let resolver = Arc::new(KeySchemaResolver::new(Arc::clone(&store)));
    let catalog = TableCatalog::new(store, config.table_prefix.clone());
    let session = BrowseSession::new(resolver, config.page_size);
    let repl = Repl::new(catalog, session);

    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    stdout.write_all(format!("{HELP}\n").as_bytes()).await?;

    loop {
        stdout.write_all(b"ddbview> ").await?;
        stdout.flush().await?;
        let Some(line) = lines.next_line().await.context("failed to read stdin")? else {
            break;
        };

        let output = match parse_command(&line) {
            Ok(Command::Quit) => break,
            Ok(cmd) => repl.handle(cmd).await,
            Err(e) => format!("error: {e}"),
        };
        if !output.is_empty() {
            stdout.write_all(output.as_bytes()).await?;
            stdout.write_all(b"\n").await?;
        }
    }

    Ok(())
}
