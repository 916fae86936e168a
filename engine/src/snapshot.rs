//! Snapshots of form state.
//!
//! A snapshot is what subscribers receive after every transition and what the
//! server hands to clients. Maps are `BTreeMap`s so serialization order is
//! deterministic.

use crate::{error::Result, Error, ErrorMap, FieldName, FieldValues};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Version of the snapshot format for future compatibility.
pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

/// Point-in-time state of one form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormSnapshot {
    /// Snapshot format version
    pub format_version: u32,
    /// Current value of every known field
    pub values: BTreeMap<FieldName, String>,
    /// Current error message per failing field
    pub errors: BTreeMap<FieldName, String>,
    /// Whether change events re-validate
    pub armed: bool,
    /// Registered fields, in registration order
    pub fields: Vec<FieldName>,
}

impl FormSnapshot {
    pub fn new(values: &FieldValues, errors: &ErrorMap, armed: bool, fields: &[FieldName]) -> Self {
        Self {
            format_version: SNAPSHOT_FORMAT_VERSION,
            values: values
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            errors: errors
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            armed,
            fields: fields.to_vec(),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Check the invariants a snapshot taken from a live engine always holds.
    pub fn validate(&self) -> Result<()> {
        if self.format_version != SNAPSHOT_FORMAT_VERSION {
            return Err(Error::SnapshotVersionMismatch {
                expected: SNAPSHOT_FORMAT_VERSION,
                actual: self.format_version,
            });
        }

        if !self.armed && !self.errors.is_empty() {
            return Err(Error::InvalidSnapshot(
                "errors present while validation is not armed".into(),
            ));
        }

        for field in self.errors.keys() {
            if !self.fields.contains(field) {
                return Err(Error::InvalidSnapshot(format!(
                    "error for unregistered field: {}",
                    field
                )));
            }
        }

        for field in &self.fields {
            if !self.values.contains_key(field) {
                return Err(Error::InvalidSnapshot(format!(
                    "registered field without a value: {}",
                    field
                )));
            }
        }

        Ok(())
    }

    /// Serialize to JSON with deterministic ordering.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| Error::InvalidSnapshot(e.to_string()))
    }

    /// Serialize to pretty JSON with deterministic ordering.
    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::InvalidSnapshot(e.to_string()))
    }

    /// Deserialize from JSON and check invariants.
    pub fn from_json(json: &str) -> Result<Self> {
        let snapshot: Self =
            serde_json::from_str(json).map_err(|e| Error::InvalidSnapshot(e.to_string()))?;
        snapshot.validate()?;
        Ok(snapshot)
    }
}
