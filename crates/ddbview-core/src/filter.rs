//! User-authored filter conditions and key conditions.
//!
//! These are the raw, untyped inputs of the browse UI. Attribute names and
//! values are kept exactly as entered; typing happens in
//! [`crate::expression`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Comparison operator of a filter or sort key condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FilterOperator {
    /// Equality.
    #[default]
    #[serde(rename = "=")]
    Eq,
    /// Strictly less than.
    #[serde(rename = "<")]
    Lt,
    /// Less than or equal.
    #[serde(rename = "<=")]
    Le,
    /// Strictly greater than.
    #[serde(rename = ">")]
    Gt,
    /// Greater than or equal.
    #[serde(rename = ">=")]
    Ge,
    /// String or binary prefix match.
    #[serde(rename = "begins_with")]
    BeginsWith,
}

impl FilterOperator {
    /// All operators in display order.
    pub const ALL: [Self; 6] = [
        Self::Eq,
        Self::Lt,
        Self::Le,
        Self::Gt,
        Self::Ge,
        Self::BeginsWith,
    ];

    /// The operator as written in an expression.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::BeginsWith => "begins_with",
        }
    }
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown operator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown operator '{0}', expected one of =, <, <=, >, >=, begins_with")]
pub struct UnknownOperator(pub String);

impl FromStr for FilterOperator {
    type Err = UnknownOperator;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|op| op.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownOperator(s.to_owned()))
    }
}

/// One attribute filter.
///
/// A filter with an empty attribute name or an empty value is kept in the
/// session but contributes nothing to the compiled expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterExpression {
    /// Opaque id used to address the filter when editing.
    pub id: String,
    /// The attribute to compare.
    pub attribute_name: String,
    /// The comparison.
    pub operator: FilterOperator,
    /// The literal, typed by inference at compile time.
    pub value: String,
}

impl FilterExpression {
    /// An empty `=` filter with a fresh id.
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            attribute_name: String::new(),
            operator: FilterOperator::Eq,
            value: String::new(),
        }
    }

    /// A filled-in filter with a fresh id.
    #[must_use]
    pub fn with(
        attribute_name: impl Into<String>,
        operator: FilterOperator,
        value: impl Into<String>,
    ) -> Self {
        Self {
            attribute_name: attribute_name.into(),
            operator,
            value: value.into(),
            ..Self::new()
        }
    }

    /// Whether this filter takes part in compilation.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.attribute_name.is_empty() && !self.value.is_empty()
    }
}

impl Default for FilterExpression {
    fn default() -> Self {
        Self::new()
    }
}

/// Sort key part of a key condition.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortKeyCondition {
    /// Any of the six operators.
    pub operator: FilterOperator,
    /// Raw sort key value. Empty means no sort condition.
    pub value: String,
}

/// Key condition of a Query: partition key equality plus an optional sort
/// key comparison.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyCondition {
    /// Raw partition key value.
    pub partition_value: String,
    /// Optional sort key comparison.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<SortKeyCondition>,
}

impl KeyCondition {
    /// Partition-only key condition.
    #[must_use]
    pub fn partition(value: impl Into<String>) -> Self {
        Self {
            partition_value: value.into(),
            sort: None,
        }
    }

    /// Add a sort key comparison.
    #[must_use]
    pub fn with_sort(mut self, operator: FilterOperator, value: impl Into<String>) -> Self {
        self.sort = Some(SortKeyCondition {
            operator,
            value: value.into(),
        });
        self
    }

    /// The sort condition, if it has a value.
    #[must_use]
    pub fn effective_sort(&self) -> Option<&SortKeyCondition> {
        self.sort.as_ref().filter(|s| !s.value.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_parse_operators() {
        assert_eq!("=".parse::<FilterOperator>().unwrap(), FilterOperator::Eq);
        assert_eq!(" >= ".parse::<FilterOperator>().unwrap(), FilterOperator::Ge);
        assert_eq!(
            "BEGINS_WITH".parse::<FilterOperator>().unwrap(),
            FilterOperator::BeginsWith
        );
        assert!("<>".parse::<FilterOperator>().is_err());
    }

    #[test]
    fn test_should_serialize_filter_in_camel_case() {
        let filter = FilterExpression {
            id: "f1".to_owned(),
            attribute_name: "amount".to_owned(),
            operator: FilterOperator::Gt,
            value: "100".to_owned(),
        };
        let json = serde_json::to_string(&filter).unwrap();
        assert_eq!(
            json,
            r#"{"id":"f1","attributeName":"amount","operator":">","value":"100"}"#
        );
    }

    #[test]
    fn test_should_allocate_distinct_ids() {
        let a = FilterExpression::new();
        let b = FilterExpression::new();
        assert_ne!(a.id, b.id);
        assert_eq!(a.operator, FilterOperator::Eq);
        assert!(!a.is_complete());
    }

    #[test]
    fn test_should_ignore_empty_sort_value() {
        let cond = KeyCondition::partition("SHIPPED").with_sort(FilterOperator::Gt, "");
        assert!(cond.effective_sort().is_none());
        let cond = KeyCondition::partition("SHIPPED").with_sort(FilterOperator::Gt, "5");
        assert_eq!(cond.effective_sort().map(|s| s.operator), Some(FilterOperator::Gt));
    }
}
