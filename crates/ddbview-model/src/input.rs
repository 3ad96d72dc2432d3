//! DynamoDB input types for the read operations.
//!
//! Field names mirror the DynamoDB API. An empty map means the parameter is
//! not sent.

use std::collections::HashMap;

use crate::attribute_value::AttributeValue;

// ---------------------------------------------------------------------------
// Table management
// ---------------------------------------------------------------------------

/// Input for the `DescribeTable` operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DescribeTableInput {
    /// The name of the table to describe.
    pub table_name: String,
}

/// Input for the `ListTables` operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListTablesInput {
    /// The name of the table that starts the list. Use the value returned in
    /// `LastEvaluatedTableName` from a previous request to continue pagination.
    pub exclusive_start_table_name: Option<String>,

    /// The maximum number of table names to return (1--100).
    pub limit: Option<i32>,
}

// ---------------------------------------------------------------------------
// Query & Scan
// ---------------------------------------------------------------------------

/// Input for the `Query` operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryInput {
    /// The name of the table to query.
    pub table_name: String,

    /// The name of a secondary index to query.
    pub index_name: Option<String>,

    /// The condition that specifies the key values for items to be retrieved.
    pub key_condition_expression: Option<String>,

    /// A string that contains conditions for filtering the query results.
    pub filter_expression: Option<String>,

    /// Substitution tokens for attribute names in an expression.
    pub expression_attribute_names: HashMap<String, String>,

    /// Substitution tokens for attribute values in an expression.
    pub expression_attribute_values: HashMap<String, AttributeValue>,

    /// The maximum number of items to evaluate (not necessarily the number of
    /// matching items).
    pub limit: Option<i32>,

    /// The primary key of the first item that this operation will evaluate.
    /// Used for pagination.
    pub exclusive_start_key: HashMap<String, AttributeValue>,
}

/// Input for the `Scan` operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanInput {
    /// The name of the table to scan.
    pub table_name: String,

    /// A string that contains conditions for filtering the scan results.
    pub filter_expression: Option<String>,

    /// Substitution tokens for attribute names in an expression.
    pub expression_attribute_names: HashMap<String, String>,

    /// Substitution tokens for attribute values in an expression.
    pub expression_attribute_values: HashMap<String, AttributeValue>,

    /// The maximum number of items to evaluate.
    pub limit: Option<i32>,

    /// The primary key of the first item that this operation will evaluate.
    /// Used for pagination.
    pub exclusive_start_key: HashMap<String, AttributeValue>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_default_to_first_page_of_whole_table() {
        let input = ScanInput {
            table_name: "Orders".to_owned(),
            limit: Some(10),
            ..Default::default()
        };
        assert!(input.exclusive_start_key.is_empty());
        assert!(input.filter_expression.is_none());
        assert!(QueryInput::default().index_name.is_none());
    }
}
