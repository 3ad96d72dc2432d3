//! DynamoDB operation enum.

use std::fmt;

/// The DynamoDB operations a browser issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DynamoDBOperation {
    /// List all tables.
    ListTables,
    /// Describe a table.
    DescribeTable,
    /// Query items by key condition.
    Query,
    /// Scan all items in a table.
    Scan,
}

impl DynamoDBOperation {
    /// Returns the AWS operation name string.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ListTables => "ListTables",
            Self::DescribeTable => "DescribeTable",
            Self::Query => "Query",
            Self::Scan => "Scan",
        }
    }
}

impl fmt::Display for DynamoDBOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
