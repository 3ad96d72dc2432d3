//! DynamoDB model types for the ddbview table browser.
//!
//! Only the read path is modelled: `ListTables`, `DescribeTable`, `Query` and
//! `Scan`, plus the attribute value union and the error type every remote
//! store implementation reports through. `AttributeValue` and `ScanOutput`
//! serialize to DynamoDB JSON, which is how saved result pages are written and
//! read back.
// "DynamoDB" appears in virtually every doc comment in this crate.
#![allow(clippy::doc_markdown)]
#![allow(clippy::module_name_repetitions)]
#![allow(missing_docs)]

pub mod attribute_value;
pub mod error;
pub mod input;
pub mod operations;
pub mod output;
pub mod types;

pub use attribute_value::{AttributeValue, Item};
pub use error::{DynamoDBError, DynamoDBErrorCode};
pub use operations::DynamoDBOperation;
