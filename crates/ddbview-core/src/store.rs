//! The remote store seam.
//!
//! Everything above this trait is transport-agnostic. [`crate::aws::AwsTableStore`]
//! is the production implementation.

use async_trait::async_trait;
use ddbview_model::error::DynamoDBError;
use ddbview_model::input::{DescribeTableInput, ListTablesInput, QueryInput, ScanInput};
use ddbview_model::output::{DescribeTableOutput, ListTablesOutput, QueryOutput, ScanOutput};

/// A DynamoDB-compatible store that can be read.
#[async_trait]
pub trait TableStore: Send + Sync + std::fmt::Debug {
    /// One page of table names.
    async fn list_tables(&self, input: ListTablesInput) -> Result<ListTablesOutput, DynamoDBError>;

    /// Describe a table.
    async fn describe_table(
        &self,
        input: DescribeTableInput,
    ) -> Result<DescribeTableOutput, DynamoDBError>;

    /// One page of a Query.
    async fn query(&self, input: QueryInput) -> Result<QueryOutput, DynamoDBError>;

    /// One page of a Scan.
    async fn scan(&self, input: ScanInput) -> Result<ScanOutput, DynamoDBError>;
}
