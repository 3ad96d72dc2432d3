//! [`TableStore`] backed by the AWS SDK.

use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::Client;
use aws_sdk_dynamodb::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_dynamodb::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_dynamodb::primitives::Blob;
use aws_sdk_dynamodb::types as sdk;
use ddbview_model::AttributeValue;
use ddbview_model::error::{DynamoDBError, DynamoDBErrorCode};
use ddbview_model::input::{DescribeTableInput, ListTablesInput, QueryInput, ScanInput};
use ddbview_model::operations::DynamoDBOperation;
use ddbview_model::output::{DescribeTableOutput, ListTablesOutput, QueryOutput, ScanOutput};
use ddbview_model::types::{
    AttributeDefinition, GlobalSecondaryIndexDescription, KeySchemaElement, KeyType,
    LocalSecondaryIndexDescription, ScalarAttributeType, TableDescription,
};
use tracing::debug;

use crate::config::BrowserConfig;
use crate::store::TableStore;

/// Talks to DynamoDB (or a compatible endpoint) through `aws-sdk-dynamodb`.
#[derive(Debug, Clone)]
pub struct AwsTableStore {
    client: Client,
}

impl AwsTableStore {
    /// Wrap an existing client.
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Build a client with static credentials from the configuration.
    ///
    /// Missing credentials are sent as empty strings; the service rejects
    /// them on the first call.
    #[must_use]
    pub fn from_config(config: &BrowserConfig) -> Self {
        let creds = Credentials::new(
            config.access_key_id.clone().unwrap_or_default(),
            config.secret_access_key.clone().unwrap_or_default(),
            None,
            None,
            "ddbview",
        );

        let mut builder = aws_sdk_dynamodb::config::Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .credentials_provider(creds);
        if let Some(endpoint) = &config.endpoint_url {
            builder = builder.endpoint_url(endpoint);
        }
        debug!(
            region = %config.region,
            endpoint = ?config.endpoint_url,
            "building DynamoDB client"
        );

        Self::new(Client::from_conf(builder.build()))
    }

    /// The underlying client.
    #[must_use]
    pub fn client(&self) -> &Client {
        &self.client
    }
}

#[async_trait]
impl TableStore for AwsTableStore {
    async fn list_tables(&self, input: ListTablesInput) -> Result<ListTablesOutput, DynamoDBError> {
        let output = self
            .client
            .list_tables()
            .set_exclusive_start_table_name(input.exclusive_start_table_name)
            .set_limit(input.limit)
            .send()
            .await
            .map_err(|e| sdk_error(DynamoDBOperation::ListTables, e))?;

        Ok(ListTablesOutput {
            table_names: output.table_names().to_vec(),
            last_evaluated_table_name: output.last_evaluated_table_name().map(str::to_owned),
        })
    }

    async fn describe_table(
        &self,
        input: DescribeTableInput,
    ) -> Result<DescribeTableOutput, DynamoDBError> {
        let output = self
            .client
            .describe_table()
            .table_name(input.table_name)
            .send()
            .await
            .map_err(|e| sdk_error(DynamoDBOperation::DescribeTable, e))?;

        Ok(DescribeTableOutput {
            table: output.table().map(table_description_from_sdk),
        })
    }

    async fn query(&self, input: QueryInput) -> Result<QueryOutput, DynamoDBError> {
        let output = self
            .client
            .query()
            .table_name(input.table_name)
            .set_index_name(input.index_name)
            .set_key_condition_expression(input.key_condition_expression)
            .set_filter_expression(input.filter_expression)
            .set_expression_attribute_names(non_empty(input.expression_attribute_names))
            .set_expression_attribute_values(non_empty(item_to_sdk(
                input.expression_attribute_values,
            )))
            .set_limit(input.limit)
            .set_exclusive_start_key(non_empty(item_to_sdk(input.exclusive_start_key)))
            .send()
            .await
            .map_err(|e| sdk_error(DynamoDBOperation::Query, e))?;

        Ok(QueryOutput {
            items: output.items().iter().map(item_from_sdk).collect(),
            count: output.count(),
            scanned_count: output.scanned_count(),
            last_evaluated_key: output
                .last_evaluated_key()
                .map(item_from_sdk)
                .unwrap_or_default(),
        })
    }

    async fn scan(&self, input: ScanInput) -> Result<ScanOutput, DynamoDBError> {
        let output = self
            .client
            .scan()
            .table_name(input.table_name)
            .set_filter_expression(input.filter_expression)
            .set_expression_attribute_names(non_empty(input.expression_attribute_names))
            .set_expression_attribute_values(non_empty(item_to_sdk(
                input.expression_attribute_values,
            )))
            .set_limit(input.limit)
            .set_exclusive_start_key(non_empty(item_to_sdk(input.exclusive_start_key)))
            .send()
            .await
            .map_err(|e| sdk_error(DynamoDBOperation::Scan, e))?;

        Ok(ScanOutput {
            items: output.items().iter().map(item_from_sdk).collect(),
            count: output.count(),
            scanned_count: output.scanned_count(),
            last_evaluated_key: output
                .last_evaluated_key()
                .map(item_from_sdk)
                .unwrap_or_default(),
        })
    }
}

/// Classify an SDK failure by the service error code, or as a transport
/// failure when no service response was received.
fn sdk_error<E>(operation: DynamoDBOperation, err: SdkError<E>) -> DynamoDBError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
{
    let error = if let Some(service_err) = err.as_service_error() {
        let code = service_err
            .code()
            .map_or(DynamoDBErrorCode::Unknown, DynamoDBErrorCode::from_code);
        let message = service_err
            .message()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .or(service_err.code())
            .unwrap_or("service error")
            .to_owned();
        DynamoDBError::with_message(code, message)
    } else {
        DynamoDBError::transport(DisplayErrorContext(&err).to_string())
    };
    debug!(operation = %operation, code = %error.code, message = %error.message, "request failed");
    error.for_operation(operation).with_source(err)
}

fn non_empty<V>(map: HashMap<String, V>) -> Option<HashMap<String, V>> {
    (!map.is_empty()).then_some(map)
}

fn item_to_sdk(item: HashMap<String, AttributeValue>) -> HashMap<String, sdk::AttributeValue> {
    item.into_iter().map(|(k, v)| (k, value_to_sdk(v))).collect()
}

fn item_from_sdk(item: &HashMap<String, sdk::AttributeValue>) -> HashMap<String, AttributeValue> {
    item.iter()
        .map(|(k, v)| (k.clone(), value_from_sdk(v)))
        .collect()
}

fn value_to_sdk(value: AttributeValue) -> sdk::AttributeValue {
    match value {
        AttributeValue::S(s) => sdk::AttributeValue::S(s),
        AttributeValue::N(n) => sdk::AttributeValue::N(n),
        AttributeValue::B(b) => sdk::AttributeValue::B(Blob::new(b.to_vec())),
        AttributeValue::Ss(ss) => sdk::AttributeValue::Ss(ss),
        AttributeValue::Ns(ns) => sdk::AttributeValue::Ns(ns),
        AttributeValue::Bs(bs) => {
            sdk::AttributeValue::Bs(bs.into_iter().map(|b| Blob::new(b.to_vec())).collect())
        }
        AttributeValue::Bool(b) => sdk::AttributeValue::Bool(b),
        AttributeValue::Null(n) => sdk::AttributeValue::Null(n),
        AttributeValue::L(l) => sdk::AttributeValue::L(l.into_iter().map(value_to_sdk).collect()),
        AttributeValue::M(m) => sdk::AttributeValue::M(item_to_sdk(m)),
    }
}

fn value_from_sdk(value: &sdk::AttributeValue) -> AttributeValue {
    match value {
        sdk::AttributeValue::S(s) => AttributeValue::S(s.clone()),
        sdk::AttributeValue::N(n) => AttributeValue::N(n.clone()),
        sdk::AttributeValue::B(b) => AttributeValue::B(bytes::Bytes::copy_from_slice(b.as_ref())),
        sdk::AttributeValue::Ss(ss) => AttributeValue::Ss(ss.clone()),
        sdk::AttributeValue::Ns(ns) => AttributeValue::Ns(ns.clone()),
        sdk::AttributeValue::Bs(bs) => AttributeValue::Bs(
            bs.iter()
                .map(|b| bytes::Bytes::copy_from_slice(b.as_ref()))
                .collect(),
        ),
        sdk::AttributeValue::Bool(b) => AttributeValue::Bool(*b),
        sdk::AttributeValue::Null(n) => AttributeValue::Null(*n),
        sdk::AttributeValue::L(l) => AttributeValue::L(l.iter().map(value_from_sdk).collect()),
        sdk::AttributeValue::M(m) => AttributeValue::M(item_from_sdk(m)),
        // Variants added by newer service models.
        _ => AttributeValue::Null(true),
    }
}

fn key_schema_from_sdk(key_schema: &[sdk::KeySchemaElement]) -> Vec<KeySchemaElement> {
    key_schema
        .iter()
        .filter_map(|k| {
            let key_type = match k.key_type() {
                sdk::KeyType::Hash => KeyType::Hash,
                sdk::KeyType::Range => KeyType::Range,
                _ => return None,
            };
            Some(KeySchemaElement {
                attribute_name: k.attribute_name().to_owned(),
                key_type,
            })
        })
        .collect()
}

fn table_description_from_sdk(table: &sdk::TableDescription) -> TableDescription {
    TableDescription {
        table_name: table.table_name().map(str::to_owned),
        key_schema: key_schema_from_sdk(table.key_schema()),
        attribute_definitions: table
            .attribute_definitions()
            .iter()
            .map(|d| AttributeDefinition {
                attribute_name: d.attribute_name().to_owned(),
                attribute_type: ScalarAttributeType::from(d.attribute_type().as_str()),
            })
            .collect(),
        global_secondary_indexes: table
            .global_secondary_indexes()
            .iter()
            .map(|g| GlobalSecondaryIndexDescription {
                index_name: g.index_name().map(str::to_owned),
                key_schema: key_schema_from_sdk(g.key_schema()),
            })
            .collect(),
        local_secondary_indexes: table
            .local_secondary_indexes()
            .iter()
            .map(|l| LocalSecondaryIndexDescription {
                index_name: l.index_name().map(str::to_owned),
                key_schema: key_schema_from_sdk(l.key_schema()),
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_convert_values_both_ways() {
        let value = AttributeValue::M(HashMap::from([
            ("n".to_owned(), AttributeValue::N("1".to_owned())),
            (
                "l".to_owned(),
                AttributeValue::L(vec![
                    AttributeValue::Bool(true),
                    AttributeValue::B(bytes::Bytes::from_static(b"hi")),
                ]),
            ),
            ("ss".to_owned(), AttributeValue::Ss(vec!["a".to_owned()])),
        ]));
        let sdk_value = value_to_sdk(value.clone());
        assert!(matches!(sdk_value, sdk::AttributeValue::M(_)));
        assert_eq!(value_from_sdk(&sdk_value), value);
    }

    #[test]
    fn test_should_convert_table_description() {
        let table = sdk::TableDescription::builder()
            .table_name("Orders")
            .key_schema(
                sdk::KeySchemaElement::builder()
                    .attribute_name("customerId")
                    .key_type(sdk::KeyType::Hash)
                    .build()
                    .unwrap(),
            )
            .attribute_definitions(
                sdk::AttributeDefinition::builder()
                    .attribute_name("customerId")
                    .attribute_type(sdk::ScalarAttributeType::S)
                    .build()
                    .unwrap(),
            )
            .global_secondary_indexes(
                sdk::GlobalSecondaryIndexDescription::builder()
                    .index_name("StatusIndex")
                    .key_schema(
                        sdk::KeySchemaElement::builder()
                            .attribute_name("status")
                            .key_type(sdk::KeyType::Hash)
                            .build()
                            .unwrap(),
                    )
                    .build(),
            )
            .build();

        let desc = table_description_from_sdk(&table);
        assert_eq!(desc.table_name.as_deref(), Some("Orders"));
        assert_eq!(desc.key_schema, vec![KeySchemaElement::hash("customerId")]);
        assert_eq!(
            desc.attribute_definitions[0].attribute_type,
            ScalarAttributeType::S
        );
        assert_eq!(
            desc.global_secondary_indexes[0].index_name.as_deref(),
            Some("StatusIndex")
        );
        assert!(desc.local_secondary_indexes.is_empty());
    }

    #[test]
    fn test_should_omit_empty_maps() {
        assert!(non_empty(HashMap::<String, String>::new()).is_none());
        assert!(non_empty(HashMap::from([("#a".to_owned(), "a".to_owned())])).is_some());
    }
}
