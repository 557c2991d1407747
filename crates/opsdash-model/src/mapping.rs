//! Declarative remote table → local table mappings.
//!
//! A [`SyncMapping`] pairs one remote table with one local table through an
//! ordered list of [`ColumnPair`]s. The order is load-bearing: it is the
//! column order of both the remote `SELECT` and the local `INSERT`, and the
//! order of every [`RemoteRow`](crate::RemoteRow) and
//! [`LocalRow`](crate::LocalRow) flowing between them.
//!
//! Mappings are validated once at construction, so the sync engine can build
//! SQL from them without further checks.

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{MappingError, Result};

/// Returns true for plain SQL identifiers (`[A-Za-z_][A-Za-z0-9_]*`).
pub fn is_identifier(value: &str) -> bool {
    let mut chars = value.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !(first.is_ascii_alphabetic() || first == '_') {
        return false;
    }
    chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnPair {
    pub remote: String,
    pub local: String,
}

impl ColumnPair {
    pub fn new(remote: impl Into<String>, local: impl Into<String>) -> Self {
        Self {
            remote: remote.into(),
            local: local.into(),
        }
    }

    /// A pair whose remote and local names are the same.
    pub fn same(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            remote: name.clone(),
            local: name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawMapping", into = "RawMapping")]
pub struct SyncMapping {
    remote_table: String,
    local_table: String,
    columns: Vec<ColumnPair>,
    primary_key: Vec<String>,
}

impl SyncMapping {
    /// Validates and builds a mapping.
    ///
    /// # Errors
    ///
    /// Fails when a table or column name is not a plain identifier, when
    /// there are no columns or no key, when a remote, local or key column name
    /// is repeated, or when a key column is not one of the mapped local columns.
    pub fn new(
        remote_table: impl Into<String>,
        local_table: impl Into<String>,
        columns: Vec<ColumnPair>,
        primary_key: Vec<String>,
    ) -> Result<Self> {
        let remote_table = remote_table.into();
        let local_table = local_table.into();
        for table in [&remote_table, &local_table] {
            if !is_identifier(table) {
                return Err(MappingError::InvalidIdentifier {
                    table: local_table.clone(),
                    name: table.clone(),
                });
            }
        }
        if columns.is_empty() {
            return Err(MappingError::NoColumns { table: local_table });
        }
        if primary_key.is_empty() {
            return Err(MappingError::NoPrimaryKey { table: local_table });
        }

        let mut remote_seen = BTreeSet::new();
        let mut local_seen = BTreeSet::new();
        for pair in &columns {
            for name in [&pair.remote, &pair.local] {
                if !is_identifier(name) {
                    return Err(MappingError::InvalidIdentifier {
                        table: local_table.clone(),
                        name: name.clone(),
                    });
                }
            }
            if !remote_seen.insert(pair.remote.as_str()) {
                return Err(MappingError::DuplicateColumn {
                    table: local_table.clone(),
                    side: "remote",
                    column: pair.remote.clone(),
                });
            }
            if !local_seen.insert(pair.local.as_str()) {
                return Err(MappingError::DuplicateColumn {
                    table: local_table.clone(),
                    side: "local",
                    column: pair.local.clone(),
                });
            }
        }
        if let Some(column) = primary_key
            .iter()
            .find(|column| !local_seen.contains(column.as_str()))
        {
            return Err(MappingError::UnmappedKey {
                table: local_table.clone(),
                column: column.clone(),
            });
        }

        let mut key_seen = BTreeSet::new();
        if let Some(column) = primary_key
            .iter()
            .find(|column| !key_seen.insert(column.as_str()))
        {
            return Err(MappingError::DuplicateColumn {
                table: local_table.clone(),
                side: "key",
                column: column.clone(),
            });
        }

        Ok(Self {
            remote_table,
            local_table,
            columns,
            primary_key,
        })
    }

    pub fn remote_table(&self) -> &str {
        &self.remote_table
    }

    pub fn local_table(&self) -> &str {
        &self.local_table
    }

    pub fn columns(&self) -> &[ColumnPair] {
        &self.columns
    }

    pub fn primary_key(&self) -> &[String] {
        &self.primary_key
    }

    pub fn remote_columns(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|pair| pair.remote.as_str())
    }

    pub fn local_columns(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|pair| pair.local.as_str())
    }

    /// Positions of the key columns within the local column order.
    pub fn key_positions(&self) -> Vec<usize> {
        self.primary_key
            .iter()
            .filter_map(|key| self.columns.iter().position(|pair| &pair.local == key))
            .collect()
    }
}

/// Either a single key column or a composite key.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum KeySpec {
    One(String),
    Many(Vec<String>),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawMapping {
    remote_table: String,
    local_table: String,
    columns: Vec<ColumnPair>,
    primary_key: KeySpec,
}

impl TryFrom<RawMapping> for SyncMapping {
    type Error = MappingError;

    fn try_from(raw: RawMapping) -> Result<Self> {
        let primary_key = match raw.primary_key {
            KeySpec::One(column) => vec![column],
            KeySpec::Many(columns) => columns,
        };
        SyncMapping::new(raw.remote_table, raw.local_table, raw.columns, primary_key)
    }
}

impl From<SyncMapping> for RawMapping {
    fn from(mapping: SyncMapping) -> Self {
        let primary_key = if mapping.primary_key.len() == 1 {
            KeySpec::One(mapping.primary_key[0].clone())
        } else {
            KeySpec::Many(mapping.primary_key)
        };
        Self {
            remote_table: mapping.remote_table,
            local_table: mapping.local_table,
            columns: mapping.columns,
            primary_key,
        }
    }
}

/// The ordered mappings of one sync run.
///
/// Order is the sync order: a detail table must come after the header table
/// it references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MappingSet(Vec<SyncMapping>);

impl MappingSet {
    pub fn new(mappings: Vec<SyncMapping>) -> Result<Self> {
        if mappings.is_empty() {
            return Err(MappingError::EmptySet);
        }
        Ok(Self(mappings))
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let mappings: Vec<SyncMapping> = serde_json::from_str(json)?;
        Self::new(mappings)
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|source| MappingError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    pub fn as_slice(&self) -> &[SyncMapping] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SyncMapping> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'a> IntoIterator for &'a MappingSet {
    type Item = &'a SyncMapping;
    type IntoIter = std::slice::Iter<'a, SyncMapping>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn customer() -> SyncMapping {
        SyncMapping::new(
            "AR_Customer",
            "Customer",
            vec![ColumnPair::same("CustomerNo"), ColumnPair::same("CustomerName")],
            vec!["CustomerNo".to_string()],
        )
        .unwrap()
    }

    #[test]
    fn identifiers() {
        assert!(is_identifier("AR_Customer"));
        assert!(is_identifier("_x1"));
        assert!(!is_identifier(""));
        assert!(!is_identifier("1abc"));
        assert!(!is_identifier("Customer; DROP TABLE x"));
        assert!(!is_identifier("a\"b"));
    }

    #[test]
    fn key_positions_follow_local_order() {
        let detail = SyncMapping::new(
            "AR_InvoiceHistoryDetail",
            "SalesOrderDetail",
            vec![
                ColumnPair::new("InvoiceNo", "SalesOrderNo"),
                ColumnPair::same("ItemCode"),
                ColumnPair::new("DetailSeqNo", "LineKey"),
            ],
            vec!["SalesOrderNo".to_string(), "LineKey".to_string()],
        )
        .unwrap();
        assert_eq!(detail.key_positions(), vec![0, 2]);
        assert_eq!(customer().key_positions(), vec![0]);
    }

    #[test]
    fn rejects_key_outside_mapping() {
        let err = SyncMapping::new(
            "AR_Customer",
            "Customer",
            vec![ColumnPair::same("CustomerName")],
            vec!["CustomerNo".to_string()],
        )
        .unwrap_err();
        assert!(matches!(err, MappingError::UnmappedKey { .. }));
    }

    #[test]
    fn rejects_duplicate_local_column() {
        let err = SyncMapping::new(
            "AR_Customer",
            "Customer",
            vec![
                ColumnPair::same("CustomerNo"),
                ColumnPair::new("CustomerName", "CustomerNo"),
            ],
            vec!["CustomerNo".to_string()],
        )
        .unwrap_err();
        assert!(matches!(
            err,
            MappingError::DuplicateColumn { side: "local", .. }
        ));
    }

    #[test]
    fn rejects_repeated_key_column() {
        let err = SyncMapping::new(
            "AR_Customer",
            "Customer",
            vec![ColumnPair::same("CustomerNo"), ColumnPair::same("CustomerName")],
            vec!["CustomerNo".to_string(), "CustomerNo".to_string()],
        )
        .unwrap_err();
        assert!(matches!(
            err,
            MappingError::DuplicateColumn { side: "key", .. }
        ));
    }

    #[test]
    fn json_accepts_single_and_composite_keys() {
        let json = r#"[
            {"remote_table": "AR_Customer", "local_table": "Customer",
             "columns": [{"remote": "CustomerNo", "local": "CustomerNo"}],
             "primary_key": "CustomerNo"},
            {"remote_table": "AR_InvoiceHistoryDetail", "local_table": "SalesOrderDetail",
             "columns": [{"remote": "InvoiceNo", "local": "SalesOrderNo"},
                         {"remote": "DetailSeqNo", "local": "LineKey"}],
             "primary_key": ["SalesOrderNo", "LineKey"]}
        ]"#;
        let set = MappingSet::from_json_str(json).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.as_slice()[0].primary_key(), ["CustomerNo"]);
        assert_eq!(set.as_slice()[1].primary_key(), ["SalesOrderNo", "LineKey"]);

        let back = serde_json::to_string(&set).unwrap();
        assert_eq!(MappingSet::from_json_str(&back).unwrap(), set);
    }

    #[test]
    fn json_is_validated() {
        let json = r#"[{"remote_table": "AR_Customer", "local_table": "Customer",
                        "columns": [], "primary_key": "CustomerNo"}]"#;
        assert!(MappingSet::from_json_str(json).is_err());
        assert!(matches!(
            MappingSet::from_json_str("[]"),
            Err(MappingError::EmptySet)
        ));
    }
}
