//! Compilation of filters and key conditions into DynamoDB expressions.
//!
//! Attribute names never appear verbatim in an expression: every name goes
//! through an `#alias` in `ExpressionAttributeNames`, so reserved words and
//! names with punctuation are always safe. Every literal goes through a
//! `:placeholder` in `ExpressionAttributeValues`.
//!
//! Filter placeholders are `#name{i}` / `:value{i}` where `i` counts included
//! filters only. Key condition placeholders are the fixed `#pk` / `:pkval` and
//! `#sk` / `:skval`, so the two sets never collide.

use std::collections::HashMap;

use ddbview_model::AttributeValue;

use crate::filter::{FilterExpression, FilterOperator};

/// Alias of the partition key attribute in a key condition.
pub const PARTITION_NAME_ALIAS: &str = "#pk";
/// Placeholder of the partition key value in a key condition.
pub const PARTITION_VALUE_PLACEHOLDER: &str = ":pkval";
/// Alias of the sort key attribute in a key condition.
pub const SORT_NAME_ALIAS: &str = "#sk";
/// Placeholder of the sort key value in a key condition.
pub const SORT_VALUE_PLACEHOLDER: &str = ":skval";

/// An expression plus the placeholder maps it references.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompiledExpression {
    /// The expression text. `None` when nothing was compiled and the clause
    /// must be omitted from the request.
    pub expression: Option<String>,
    /// `ExpressionAttributeNames` entries.
    pub names: HashMap<String, String>,
    /// `ExpressionAttributeValues` entries.
    pub values: HashMap<String, AttributeValue>,
}

impl CompiledExpression {
    /// Whether there is no expression to submit.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.expression.is_none()
    }
}

/// Compile filters into a single `AND`-joined filter expression.
///
/// Filters with an empty attribute name or value are skipped without
/// consuming an index.
#[must_use]
pub fn compile_filters(filters: &[FilterExpression]) -> CompiledExpression {
    let mut names = HashMap::new();
    let mut values = HashMap::new();
    let mut parts: Vec<String> = Vec::new();

    for (i, filter) in filters.iter().filter(|f| f.is_complete()).enumerate() {
        let name_ph = format!("#name{i}");
        let val_ph = format!(":value{i}");
        names.insert(name_ph.clone(), filter.attribute_name.clone());
        values.insert(val_ph.clone(), infer_literal(&filter.value));
        parts.push(build_comparison(&name_ph, filter.operator, &val_ph));
    }

    CompiledExpression {
        expression: (!parts.is_empty()).then(|| parts.join(" AND ")),
        names,
        values,
    }
}

/// Compile a key condition.
///
/// The partition key is always compared with `=`. The sort key comparison,
/// when present, may use any operator.
#[must_use]
pub fn compile_key_condition(
    partition_key: &str,
    partition_value: AttributeValue,
    sort: Option<(&str, FilterOperator, AttributeValue)>,
) -> CompiledExpression {
    let mut names = HashMap::from([(PARTITION_NAME_ALIAS.to_owned(), partition_key.to_owned())]);
    let mut values = HashMap::from([(PARTITION_VALUE_PLACEHOLDER.to_owned(), partition_value)]);
    let mut expression = format!("{PARTITION_NAME_ALIAS} = {PARTITION_VALUE_PLACEHOLDER}");

    if let Some((sort_key, op, sort_value)) = sort {
        names.insert(SORT_NAME_ALIAS.to_owned(), sort_key.to_owned());
        values.insert(SORT_VALUE_PLACEHOLDER.to_owned(), sort_value);
        expression.push_str(" AND ");
        expression.push_str(&build_comparison(SORT_NAME_ALIAS, op, SORT_VALUE_PLACEHOLDER));
    }

    CompiledExpression {
        expression: Some(expression),
        names,
        values,
    }
}

/// Type a raw literal.
///
/// In order: a finite number becomes `N`, `true`/`false` (any case) becomes
/// `BOOL`, `null` (any case) becomes `NULL`, anything else is `S` verbatim.
#[must_use]
pub fn infer_literal(raw: &str) -> AttributeValue {
    let trimmed = raw.trim();
    if !trimmed.is_empty() && trimmed.parse::<f64>().is_ok_and(f64::is_finite) {
        return AttributeValue::N(trimmed.to_owned());
    }
    if trimmed.eq_ignore_ascii_case("true") {
        return AttributeValue::Bool(true);
    }
    if trimmed.eq_ignore_ascii_case("false") {
        return AttributeValue::Bool(false);
    }
    if trimmed.eq_ignore_ascii_case("null") {
        return AttributeValue::Null(true);
    }
    AttributeValue::S(raw.to_owned())
}

/// Merge generated expression attribute names into an existing map.
pub fn merge_expression_names(
    target: &mut HashMap<String, String>,
    source: HashMap<String, String>,
) {
    for (k, v) in source {
        target.entry(k).or_insert(v);
    }
}

/// Merge generated expression attribute values into an existing map.
pub fn merge_expression_values(
    target: &mut HashMap<String, AttributeValue>,
    source: HashMap<String, AttributeValue>,
) {
    for (k, v) in source {
        target.entry(k).or_insert(v);
    }
}

fn build_comparison(name_placeholder: &str, op: FilterOperator, val_placeholder: &str) -> String {
    match op {
        FilterOperator::BeginsWith => format!("begins_with({name_placeholder}, {val_placeholder})"),
        _ => format!("{name_placeholder} {op} {val_placeholder}"),
    }
}
