//! Table listing and attribute discovery.

use std::collections::BTreeSet;
use std::sync::Arc;

use ddbview_model::input::{ListTablesInput, ScanInput};
use ddbview_model::operations::DynamoDBOperation;
use tracing::debug;

use crate::error::{BrowseResult, remote_error_to_browse};
use crate::store::TableStore;

/// Number of items scanned when sampling attribute names.
pub const SAMPLE_SIZE: i32 = 20;

/// Lists the tables visible to the browser.
#[derive(Debug, Clone)]
pub struct TableCatalog {
    store: Arc<dyn TableStore>,
    table_prefix: String,
}

impl TableCatalog {
    /// Create a catalog. An empty prefix lists every table.
    #[must_use]
    pub fn new(store: Arc<dyn TableStore>, table_prefix: impl Into<String>) -> Self {
        Self {
            store,
            table_prefix: table_prefix.into(),
        }
    }

    /// The configured prefix.
    #[must_use]
    pub fn table_prefix(&self) -> &str {
        &self.table_prefix
    }

    /// Every table name, across all pages, de-duplicated, sorted and
    /// restricted to the configured prefix.
    pub async fn list_tables(&self) -> BrowseResult<Vec<String>> {
        let mut names = BTreeSet::new();
        let mut start: Option<String> = None;
        let mut pages = 0usize;

        loop {
            let output = self
                .store
                .list_tables(ListTablesInput {
                    exclusive_start_table_name: start.take(),
                    limit: None,
                })
                .await
                .map_err(|e| {
                    remote_error_to_browse(e.for_operation(DynamoDBOperation::ListTables))
                })?;
            pages += 1;
            names.extend(output.table_names);

            match output.last_evaluated_table_name {
                Some(last) => start = Some(last),
                None => break,
            }
        }

        let tables: Vec<String> = names
            .into_iter()
            .filter(|n| self.table_prefix.is_empty() || n.starts_with(&self.table_prefix))
            .collect();
        debug!(pages, count = tables.len(), prefix = %self.table_prefix, "listed tables");
        Ok(tables)
    }

    /// Sorted attribute names seen in the first [`SAMPLE_SIZE`] items of a
    /// table.
    pub async fn sample_attribute_names(&self, table_name: &str) -> BrowseResult<Vec<String>> {
        let output = self
            .store
            .scan(ScanInput {
                table_name: table_name.to_owned(),
                limit: Some(SAMPLE_SIZE),
                ..Default::default()
            })
            .await
            .map_err(|e| remote_error_to_browse(e.for_operation(DynamoDBOperation::Scan)))?;

        let names: BTreeSet<String> = output
            .items
            .into_iter()
            .flat_map(|item| item.into_keys())
            .collect();
        debug!(table = %table_name, count = names.len(), "sampled attribute names");
        Ok(names.into_iter().collect())
    }
}
