//! Browse core for ddbview.
//!
//! Turns user-authored filters and key conditions into DynamoDB expressions,
//! resolves and caches table key schemas, and drives paginated Scan/Query
//! sessions against any [`store::TableStore`].
#![allow(missing_docs, clippy::doc_markdown, clippy::module_name_repetitions)]

pub mod aws;
pub mod catalog;
pub mod config;
pub mod error;
pub mod expression;
pub mod filter;
pub mod schema;
pub mod session;
pub mod store;
pub mod view;

pub use catalog::TableCatalog;
pub use config::BrowserConfig;
pub use error::{BrowseError, BrowseResult};
pub use filter::{FilterExpression, FilterOperator, KeyCondition, SortKeyCondition};
pub use schema::{IndexSelector, KeySchemaInfo, KeySchemaResolver, PRIMARY_INDEX_NAME};
pub use session::{BrowseMode, BrowsePage, BrowseSession, PAGE_SIZE_OPTIONS, SessionSnapshot};
pub use store::TableStore;
