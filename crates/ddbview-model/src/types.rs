//! Shared DynamoDB types for the read path.
//!
//! Only the parts of a table description a browser needs are modelled: key
//! schemas, key attribute types, and the secondary indexes.

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Key type within a key schema element.
///
/// `Hash` denotes the partition key; `Range` denotes the sort key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyType {
    /// Partition key.
    Hash,
    /// Sort key.
    Range,
}

impl KeyType {
    /// Returns the DynamoDB wire-format string representation of this key type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hash => "HASH",
            Self::Range => "RANGE",
        }
    }
}

impl std::fmt::Display for KeyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scalar attribute types declared for key attributes.
///
/// Unrecognized values are kept rather than rejected so that a newer service
/// response never fails to convert.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ScalarAttributeType {
    /// String type.
    S,
    /// Number type.
    N,
    /// Binary type.
    B,
    /// A value this crate does not know.
    Unknown(String),
}

impl ScalarAttributeType {
    /// Returns the DynamoDB wire-format string representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::S => "S",
            Self::N => "N",
            Self::B => "B",
            Self::Unknown(s) => s.as_str(),
        }
    }
}

impl From<&str> for ScalarAttributeType {
    fn from(s: &str) -> Self {
        match s {
            "S" => Self::S,
            "N" => Self::N,
            "B" => Self::B,
            _ => Self::Unknown(s.to_owned()),
        }
    }
}

impl std::fmt::Display for ScalarAttributeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Structs - Key Schema & Attributes
// ---------------------------------------------------------------------------

/// An element of the key schema for a table or index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySchemaElement {
    /// The name of the key attribute.
    pub attribute_name: String,
    /// The role of the attribute in the key schema (`HASH` or `RANGE`).
    pub key_type: KeyType,
}

impl KeySchemaElement {
    /// Partition key element.
    #[must_use]
    pub fn hash(attribute_name: impl Into<String>) -> Self {
        Self {
            attribute_name: attribute_name.into(),
            key_type: KeyType::Hash,
        }
    }

    /// Sort key element.
    #[must_use]
    pub fn range(attribute_name: impl Into<String>) -> Self {
        Self {
            attribute_name: attribute_name.into(),
            key_type: KeyType::Range,
        }
    }
}

/// Name of the `HASH` attribute in a key schema, if any.
#[must_use]
pub fn partition_key_name(key_schema: &[KeySchemaElement]) -> Option<&str> {
    key_schema
        .iter()
        .find(|k| k.key_type == KeyType::Hash)
        .map(|k| k.attribute_name.as_str())
}

/// Name of the `RANGE` attribute in a key schema, if any.
#[must_use]
pub fn sort_key_name(key_schema: &[KeySchemaElement]) -> Option<&str> {
    key_schema
        .iter()
        .find(|k| k.key_type == KeyType::Range)
        .map(|k| k.attribute_name.as_str())
}

/// An attribute definition specifying the attribute name and its scalar type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeDefinition {
    /// The name of the attribute.
    pub attribute_name: String,
    /// The scalar data type of the attribute (`S`, `N`, or `B`).
    pub attribute_type: ScalarAttributeType,
}

// ---------------------------------------------------------------------------
// Structs - Secondary Indexes
// ---------------------------------------------------------------------------

/// Global secondary index description (output from `DescribeTable`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GlobalSecondaryIndexDescription {
    /// The name of the global secondary index.
    pub index_name: Option<String>,
    /// The key schema for this index.
    pub key_schema: Vec<KeySchemaElement>,
}

/// Local secondary index description (output from `DescribeTable`).
///
/// An LSI shares the partition key with the base table but uses a different
/// sort key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalSecondaryIndexDescription {
    /// The name of the local secondary index.
    pub index_name: Option<String>,
    /// The key schema for this index.
    pub key_schema: Vec<KeySchemaElement>,
}

// ---------------------------------------------------------------------------
// Structs - Table Description
// ---------------------------------------------------------------------------

/// The parts of a `DescribeTable` response that describe the table's keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableDescription {
    /// The name of the table.
    pub table_name: Option<String>,
    /// The key schema for the table.
    pub key_schema: Vec<KeySchemaElement>,
    /// The attribute definitions for the table and index keys.
    pub attribute_definitions: Vec<AttributeDefinition>,
    /// The global secondary indexes on the table.
    pub global_secondary_indexes: Vec<GlobalSecondaryIndexDescription>,
    /// The local secondary indexes on the table.
    pub local_secondary_indexes: Vec<LocalSecondaryIndexDescription>,
}
