//! Key schema resolution.
//!
//! A [`KeySchemaResolver`] describes each table once and keeps the resulting
//! [`KeySchemaInfo`] for its whole lifetime. Sessions share one resolver.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use ddbview_model::attribute_value::decode_binary;
use ddbview_model::error::DynamoDBError;
use ddbview_model::input::DescribeTableInput;
use ddbview_model::operations::DynamoDBOperation;
use ddbview_model::types::{
    KeySchemaElement, ScalarAttributeType, TableDescription, partition_key_name, sort_key_name,
};
use ddbview_model::AttributeValue;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::{debug, warn};

use crate::error::{BrowseError, BrowseResult, remote_error_to_browse};
use crate::expression::infer_literal;
use crate::store::TableStore;

/// Option name under which the base table is offered.
pub const PRIMARY_INDEX_NAME: &str = "Primary Key";

/// Partition and sort key names of the base table or one index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexKeys {
    /// The `HASH` attribute.
    pub partition_key: String,
    /// The `RANGE` attribute, if any.
    pub sort_key: Option<String>,
}

/// Kind of secondary index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKind {
    /// Local secondary index: shares the base table's partition key.
    Local,
    /// Global secondary index.
    Global,
}

impl IndexKind {
    /// `local` or `global`.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Global => "global",
        }
    }
}

/// One secondary index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecondaryIndex {
    /// Index name as used in `IndexName`.
    pub name: String,
    /// Local or global.
    pub kind: IndexKind,
    /// Resolved key names.
    pub keys: IndexKeys,
}

/// Resolved key layout of a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySchemaInfo {
    /// The table name.
    pub table_name: String,
    /// Keys of the base table.
    pub primary: IndexKeys,
    /// Local indexes first, then global indexes, each in describe order.
    pub indexes: Vec<SecondaryIndex>,
    /// Declared scalar types of key attributes.
    pub attribute_types: HashMap<String, ScalarAttributeType>,
}

impl KeySchemaInfo {
    /// Build from a `DescribeTable` result.
    ///
    /// A local index always reports the base table's partition key. A global
    /// index without a `HASH` element is skipped.
    pub fn from_description(table_name: &str, desc: &TableDescription) -> BrowseResult<Self> {
        let partition_key = partition_key_name(&desc.key_schema).ok_or_else(|| {
            BrowseError::Transient(
                DynamoDBError::internal_error(format!(
                    "table {table_name} was described without a partition key"
                ))
                .for_operation(DynamoDBOperation::DescribeTable),
            )
        })?;
        let primary = IndexKeys {
            partition_key: partition_key.to_owned(),
            sort_key: sort_key_name(&desc.key_schema).map(str::to_owned),
        };

        let mut indexes = Vec::new();
        for lsi in &desc.local_secondary_indexes {
            let Some(name) = lsi.index_name.clone() else {
                warn!(table = %table_name, "skipping local secondary index without a name");
                continue;
            };
            indexes.push(SecondaryIndex {
                name,
                kind: IndexKind::Local,
                keys: IndexKeys {
                    partition_key: primary.partition_key.clone(),
                    sort_key: sort_key_name(&lsi.key_schema).map(str::to_owned),
                },
            });
        }
        for gsi in &desc.global_secondary_indexes {
            let Some(name) = gsi.index_name.clone() else {
                warn!(table = %table_name, "skipping global secondary index without a name");
                continue;
            };
            let Some(keys) = keys_of(&gsi.key_schema) else {
                warn!(
                    table = %table_name,
                    index = %name,
                    "skipping global secondary index without a partition key"
                );
                continue;
            };
            indexes.push(SecondaryIndex {
                name,
                kind: IndexKind::Global,
                keys,
            });
        }

        let attribute_types = desc
            .attribute_definitions
            .iter()
            .map(|d| (d.attribute_name.clone(), d.attribute_type.clone()))
            .collect();

        Ok(Self {
            table_name: table_name.to_owned(),
            primary,
            indexes,
            attribute_types,
        })
    }

    /// Names offered to the user: the base table first, then every index.
    #[must_use]
    pub fn index_options(&self) -> Vec<String> {
        std::iter::once(PRIMARY_INDEX_NAME.to_owned())
            .chain(self.indexes.iter().map(|i| i.name.clone()))
            .collect()
    }

    /// Key names for the selected index, or `None` if the index does not exist.
    #[must_use]
    pub fn keys_for(&self, selector: &IndexSelector) -> Option<&IndexKeys> {
        match selector {
            IndexSelector::Primary => Some(&self.primary),
            IndexSelector::Named(name) => self
                .indexes
                .iter()
                .find(|i| &i.name == name)
                .map(|i| &i.keys),
        }
    }

    /// Key attribute names of the base table, partition key first.
    #[must_use]
    pub fn primary_key_attributes(&self) -> Vec<&str> {
        std::iter::once(self.primary.partition_key.as_str())
            .chain(self.primary.sort_key.as_deref())
            .collect()
    }

    /// Type a raw key value by the attribute's declared type.
    ///
    /// Attributes without a known declaration fall back to literal inference.
    pub fn key_literal(&self, attribute: &str, raw: &str) -> BrowseResult<AttributeValue> {
        match self.attribute_types.get(attribute) {
            Some(ScalarAttributeType::S) => Ok(AttributeValue::S(raw.to_owned())),
            Some(ScalarAttributeType::N) => {
                let trimmed = raw.trim();
                if trimmed.parse::<f64>().is_ok_and(f64::is_finite) {
                    Ok(AttributeValue::N(trimmed.to_owned()))
                } else {
                    Err(BrowseError::validation(format!(
                        "key attribute '{attribute}' is a number, got '{raw}'"
                    )))
                }
            }
            Some(ScalarAttributeType::B) => decode_binary(raw.trim())
                .map(AttributeValue::B)
                .map_err(|e| {
                    BrowseError::validation(format!(
                        "key attribute '{attribute}' is binary and needs base64: {e}"
                    ))
                }),
            Some(ScalarAttributeType::Unknown(_)) | None => Ok(infer_literal(raw)),
        }
    }
}

fn keys_of(key_schema: &[KeySchemaElement]) -> Option<IndexKeys> {
    Some(IndexKeys {
        partition_key: partition_key_name(key_schema)?.to_owned(),
        sort_key: sort_key_name(key_schema).map(str::to_owned),
    })
}

/// Which key a Query runs against.
///
/// Serialized as the option name, with [`PRIMARY_INDEX_NAME`] for the base
/// table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum IndexSelector {
    /// The base table's primary key.
    #[default]
    Primary,
    /// A secondary index by name.
    Named(String),
}

impl IndexSelector {
    /// Selector for an option name.
    #[must_use]
    pub fn from_option(name: &str) -> Self {
        if name == PRIMARY_INDEX_NAME {
            Self::Primary
        } else {
            Self::Named(name.to_owned())
        }
    }

    /// The option name.
    #[must_use]
    pub fn as_option(&self) -> &str {
        match self {
            Self::Primary => PRIMARY_INDEX_NAME,
            Self::Named(name) => name,
        }
    }

    /// The `IndexName` to send: `None` for the base table.
    #[must_use]
    pub fn index_name(&self) -> Option<&str> {
        match self {
            Self::Primary => None,
            Self::Named(name) => Some(name),
        }
    }
}

impl fmt::Display for IndexSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_option())
    }
}

impl Serialize for IndexSelector {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_option())
    }
}

impl<'de> Deserialize<'de> for IndexSelector {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Self::from_option(&s))
    }
}

/// Describes tables on demand and memoizes the key layout per table name.
///
/// Failures are never cached. Two concurrent misses for the same table may
/// both describe it; the second insert wins and both results are identical.
#[derive(Debug)]
pub struct KeySchemaResolver {
    store: Arc<dyn TableStore>,
    cache: DashMap<String, Arc<KeySchemaInfo>>,
}

impl KeySchemaResolver {
    /// Create a resolver with an empty cache.
    #[must_use]
    pub fn new(store: Arc<dyn TableStore>) -> Self {
        Self {
            store,
            cache: DashMap::new(),
        }
    }

    /// The store this resolver describes tables with.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn TableStore> {
        &self.store
    }

    /// Cached key layout, without any remote call.
    #[must_use]
    pub fn cached(&self, table_name: &str) -> Option<Arc<KeySchemaInfo>> {
        self.cache.get(table_name).map(|r| Arc::clone(r.value()))
    }

    /// Key layout of `table_name`, describing the table on first use.
    pub async fn resolve(&self, table_name: &str) -> BrowseResult<Arc<KeySchemaInfo>> {
        if let Some(info) = self.cached(table_name) {
            debug!(table = %table_name, "key schema cache hit");
            return Ok(info);
        }
        debug!(table = %table_name, "key schema cache miss, describing table");

        let output = self
            .store
            .describe_table(DescribeTableInput {
                table_name: table_name.to_owned(),
            })
            .await
            .map_err(|e| {
                remote_error_to_browse(e.for_operation(DynamoDBOperation::DescribeTable))
            })?;
        let desc = output
            .table
            .ok_or_else(|| BrowseError::NotFound(format!("Table: {table_name} not found")))?;

        let info = Arc::new(KeySchemaInfo::from_description(table_name, &desc)?);
        self.cache.insert(table_name.to_owned(), Arc::clone(&info));
        Ok(info)
    }
}

#[cfg(test)]
mod tests {
    use ddbview_model::dynamodb_error;
    use ddbview_model::types::{
        AttributeDefinition, GlobalSecondaryIndexDescription, LocalSecondaryIndexDescription,
    };

    use super::*;
    use crate::store::testing::ScriptedStore;

    fn orders_table() -> TableDescription {
        TableDescription {
            table_name: Some("Orders".to_owned()),
            key_schema: vec![
                KeySchemaElement::hash("customerId"),
                KeySchemaElement::range("orderDate"),
            ],
            attribute_definitions: vec![
                AttributeDefinition {
                    attribute_name: "customerId".to_owned(),
                    attribute_type: ScalarAttributeType::S,
                },
                AttributeDefinition {
                    attribute_name: "amount".to_owned(),
                    attribute_type: ScalarAttributeType::N,
                },
                AttributeDefinition {
                    attribute_name: "blob".to_owned(),
                    attribute_type: ScalarAttributeType::B,
                },
            ],
            local_secondary_indexes: vec![LocalSecondaryIndexDescription {
                index_name: Some("AmountIndex".to_owned()),
                key_schema: vec![KeySchemaElement::range("amount")],
            }],
            global_secondary_indexes: vec![
                GlobalSecondaryIndexDescription {
                    index_name: Some("StatusIndex".to_owned()),
                    key_schema: vec![KeySchemaElement::hash("status")],
                },
                GlobalSecondaryIndexDescription {
                    index_name: Some("Broken".to_owned()),
                    key_schema: vec![KeySchemaElement::range("x")],
                },
            ],
        }
    }

    #[test]
    fn test_should_order_index_options() {
        let info = KeySchemaInfo::from_description("Orders", &orders_table()).unwrap();
        assert_eq!(
            info.index_options(),
            vec!["Primary Key", "AmountIndex", "StatusIndex"]
        );
    }

    #[test]
    fn test_should_copy_base_partition_key_into_lsi() {
        let info = KeySchemaInfo::from_description("Orders", &orders_table()).unwrap();
        let lsi = info
            .keys_for(&IndexSelector::Named("AmountIndex".to_owned()))
            .unwrap();
        assert_eq!(lsi.partition_key, "customerId");
        assert_eq!(lsi.sort_key.as_deref(), Some("amount"));

        let gsi = info
            .keys_for(&IndexSelector::Named("StatusIndex".to_owned()))
            .unwrap();
        assert_eq!(gsi.partition_key, "status");
        assert!(gsi.sort_key.is_none());
        assert!(info
            .keys_for(&IndexSelector::Named("Broken".to_owned()))
            .is_none());

        let kinds: Vec<_> = info.indexes.iter().map(|i| (i.name.as_str(), i.kind)).collect();
        assert_eq!(
            kinds,
            vec![("AmountIndex", IndexKind::Local), ("StatusIndex", IndexKind::Global)]
        );
        assert_eq!(IndexKind::Local.as_str(), "local");
    }

    #[test]
    fn test_should_reject_table_without_partition_key() {
        let desc = TableDescription {
            table_name: Some("Odd".to_owned()),
            ..Default::default()
        };
        assert!(matches!(
            KeySchemaInfo::from_description("Odd", &desc),
            Err(BrowseError::Transient(_))
        ));
    }

    #[test]
    fn test_should_type_key_literals_by_definition() {
        let info = KeySchemaInfo::from_description("Orders", &orders_table()).unwrap();
        assert_eq!(
            info.key_literal("customerId", "42").unwrap(),
            AttributeValue::S("42".to_owned())
        );
        assert_eq!(
            info.key_literal("amount", " 42 ").unwrap(),
            AttributeValue::N("42".to_owned())
        );
        assert!(matches!(
            info.key_literal("amount", "lots"),
            Err(BrowseError::Validation(_))
        ));
        assert_eq!(
            info.key_literal("blob", "aGk=").unwrap(),
            AttributeValue::B(bytes::Bytes::from_static(b"hi"))
        );
        assert!(matches!(
            info.key_literal("blob", "not base64!"),
            Err(BrowseError::Validation(_))
        ));
        assert_eq!(
            info.key_literal("undeclared", "true").unwrap(),
            AttributeValue::Bool(true)
        );
    }

    #[test]
    fn test_should_round_trip_selector_as_option_name() {
        let json = serde_json::to_string(&IndexSelector::Primary).unwrap();
        assert_eq!(json, r#""Primary Key""#);
        let sel: IndexSelector = serde_json::from_str(r#""StatusIndex""#).unwrap();
        assert_eq!(sel, IndexSelector::Named("StatusIndex".to_owned()));
        assert_eq!(sel.index_name(), Some("StatusIndex"));
        assert_eq!(IndexSelector::Primary.index_name(), None);
    }

    #[tokio::test]
    async fn test_should_memoize_resolved_schema() {
        let store = ScriptedStore::new();
        store.add_table(orders_table());
        let resolver = KeySchemaResolver::new(store.clone());

        let first = resolver.resolve("Orders").await.unwrap();
        let second = resolver.resolve("Orders").await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(store.describe_calls(), 1);
    }

    #[tokio::test]
    async fn test_should_report_missing_table_as_not_found() {
        let store = ScriptedStore::new();
        let resolver = KeySchemaResolver::new(store.clone());
        let err = resolver.resolve("Nope").await.unwrap_err();
        assert!(matches!(err, BrowseError::NotFound(_)));
        assert!(resolver.cached("Nope").is_none());
    }

    #[tokio::test]
    async fn test_should_not_cache_failures() {
        let store = ScriptedStore::new();
        store.add_table(orders_table());
        store.push_describe_error(dynamodb_error!(TransportError, "connection reset"));
        let resolver = KeySchemaResolver::new(store.clone());

        let err = resolver.resolve("Orders").await.unwrap_err();
        assert!(matches!(err, BrowseError::Transient(_)));
        assert!(resolver.resolve("Orders").await.is_ok());
        assert_eq!(store.describe_calls(), 2);
    }
}
