//! End-to-end browse tests against a running DynamoDB-compatible server.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use aws_sdk_dynamodb::types::{
        AttributeDefinition, AttributeValue, BillingMode, GlobalSecondaryIndex, KeySchemaElement,
        KeyType, Projection, ProjectionType, ScalarAttributeType,
    };
    use ddbview_core::{
        BrowseError, BrowseMode, BrowseSession, FilterExpression, FilterOperator, IndexSelector,
        KeyCondition, KeySchemaResolver, TableCatalog,
    };

    use crate::{browse_store, dynamodb_client, test_table_name};

    fn key(name: &str, key_type: KeyType) -> KeySchemaElement {
        KeySchemaElement::builder()
            .attribute_name(name)
            .key_type(key_type)
            .build()
            .unwrap()
    }

    fn attr(name: &str, attr_type: ScalarAttributeType) -> AttributeDefinition {
        AttributeDefinition::builder()
            .attribute_name(name)
            .attribute_type(attr_type)
            .build()
            .unwrap()
    }

    /// Helper: `customerId`/`orderDate` table with a `StatusIndex` on `status`,
    /// filled with `count` orders.
    async fn create_orders_table(client: &aws_sdk_dynamodb::Client, table_name: &str, count: u32) {
        client
            .create_table()
            .table_name(table_name)
            .key_schema(key("customerId", KeyType::Hash))
            .key_schema(key("orderDate", KeyType::Range))
            .attribute_definitions(attr("customerId", ScalarAttributeType::S))
            .attribute_definitions(attr("orderDate", ScalarAttributeType::S))
            .attribute_definitions(attr("status", ScalarAttributeType::S))
            .global_secondary_indexes(
                GlobalSecondaryIndex::builder()
                    .index_name("StatusIndex")
                    .key_schema(key("status", KeyType::Hash))
                    .projection(
                        Projection::builder()
                            .projection_type(ProjectionType::All)
                            .build(),
                    )
                    .build()
                    .unwrap(),
            )
            .billing_mode(BillingMode::PayPerRequest)
            .send()
            .await
            .unwrap_or_else(|e| panic!("failed to create table {table_name}: {e}"));

        for i in 0..count {
            let status = if i % 2 == 0 { "SHIPPED" } else { "PENDING" };
            client
                .put_item()
                .table_name(table_name)
                .item("customerId", AttributeValue::S(format!("c{}", i % 3)))
                .item("orderDate", AttributeValue::S(format!("2024-01-{:02}", i + 1)))
                .item("status", AttributeValue::S(status.to_owned()))
                .item("amount", AttributeValue::N((i * 20).to_string()))
                .send()
                .await
                .unwrap();
        }
    }

    async fn delete_table(client: &aws_sdk_dynamodb::Client, table_name: &str) {
        let _ = client.delete_table().table_name(table_name).send().await;
    }

    fn new_session(table_name: &str, page_size: u32) -> BrowseSession {
        let resolver = Arc::new(KeySchemaResolver::new(browse_store()));
        let session = BrowseSession::new(resolver, page_size);
        session.set_table(table_name);
        session
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_list_tables_with_prefix() {
        let client = dynamodb_client();
        let table = test_table_name("list");
        create_orders_table(&client, &table, 0).await;

        let catalog = TableCatalog::new(browse_store(), "test-list-");
        let tables = catalog.list_tables().await.unwrap();
        assert!(tables.contains(&table));
        assert!(tables.iter().all(|t| t.starts_with("test-list-")));
        assert!(tables.windows(2).all(|w| w[0] < w[1]));

        delete_table(&client, &table).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_page_forward_and_back_through_scan() {
        let client = dynamodb_client();
        let table = test_table_name("scan");
        create_orders_table(&client, &table, 25).await;
        let session = new_session(&table, 10);

        let first = session.execute(true).await.unwrap();
        assert_eq!(first.items.len(), 10);
        assert!(session.has_next_page());

        let second = session.next().await.unwrap();
        assert_eq!(second.items.len(), 10);
        assert!(session.has_previous_page());

        let back = session.previous().await.unwrap();
        assert_eq!(back.items, first.items);
        assert_eq!(session.cursor_history_len(), 2);

        session.next().await.unwrap();
        let third = session.next().await.unwrap();
        assert_eq!(third.items.len(), 5);
        assert_eq!(session.page_number(), 3);

        delete_table(&client, &table).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_query_index_with_filter() {
        let client = dynamodb_client();
        let table = test_table_name("query");
        create_orders_table(&client, &table, 20).await;
        let session = new_session(&table, 50);
        session.set_mode(BrowseMode::Query {
            index: IndexSelector::Named("StatusIndex".to_owned()),
            key_condition: KeyCondition::partition("SHIPPED"),
        });
        session.add_filter(FilterExpression::with("amount", FilterOperator::Gt, "100"));

        let page = session.execute(true).await.unwrap();
        assert!(!page.items.is_empty());
        for item in &page.items {
            assert_eq!(item["status"].as_s(), Some("SHIPPED"));
            let amount: u32 = item["amount"].as_n().unwrap().parse().unwrap();
            assert!(amount > 100);
        }

        delete_table(&client, &table).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_query_base_table_with_sort_prefix() {
        let client = dynamodb_client();
        let table = test_table_name("sortkey");
        create_orders_table(&client, &table, 12).await;
        let session = new_session(&table, 10);
        session.set_key_condition(
            KeyCondition::partition("c0").with_sort(FilterOperator::BeginsWith, "2024-01-0"),
        );

        let page = session.execute(true).await.unwrap();
        let dates: Vec<_> = page
            .items
            .iter()
            .map(|i| i["orderDate"].as_s().unwrap().to_owned())
            .collect();
        assert_eq!(dates, vec!["2024-01-01", "2024-01-04", "2024-01-07"]);

        delete_table(&client, &table).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_report_missing_table() {
        let session = new_session("test-does-not-exist-0000", 10);
        session.set_key_condition(KeyCondition::partition("x"));
        let err = session.execute(true).await.unwrap_err();
        assert!(matches!(err, BrowseError::NotFound(_)));
    }
}
