//! DynamoDB output types for the read operations.
//!
//! `ScanOutput` keeps the DynamoDB JSON shape (`PascalCase` fields) because it
//! doubles as the on-disk format of a saved result page.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::attribute_value::AttributeValue;
use crate::types::TableDescription;

// ---------------------------------------------------------------------------
// Table management
// ---------------------------------------------------------------------------

/// Output for the `DescribeTable` operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DescribeTableOutput {
    /// The properties of the table.
    pub table: Option<TableDescription>,
}

/// Output for the `ListTables` operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListTablesOutput {
    /// The names of the tables in this page.
    pub table_names: Vec<String>,

    /// The name of the last table in the current page of results. Use this
    /// value as `ExclusiveStartTableName` in a subsequent request to continue.
    pub last_evaluated_table_name: Option<String>,
}

// ---------------------------------------------------------------------------
// Query & Scan
// ---------------------------------------------------------------------------

/// Output for the `Query` operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryOutput {
    /// An array of item attributes that match the query conditions.
    pub items: Vec<HashMap<String, AttributeValue>>,

    /// The number of items in the response.
    pub count: i32,

    /// The number of items evaluated before the filter expression was applied.
    pub scanned_count: i32,

    /// The primary key of the item where the query operation stopped. Use this
    /// value as `ExclusiveStartKey` in a subsequent query to continue.
    pub last_evaluated_key: HashMap<String, AttributeValue>,
}

/// Output for the `Scan` operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ScanOutput {
    /// An array of item attributes that match the scan conditions.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<HashMap<String, AttributeValue>>,

    /// The number of items in the response.
    #[serde(default)]
    pub count: i32,

    /// The number of items evaluated before the filter expression was applied.
    #[serde(default)]
    pub scanned_count: i32,

    /// The primary key of the item where the scan operation stopped. Use this
    /// value as `ExclusiveStartKey` in a subsequent scan to continue.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub last_evaluated_key: HashMap<String, AttributeValue>,
}
