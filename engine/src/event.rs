//! Events the engine consumes from the UI layer.

use crate::FieldName;
use serde::{Deserialize, Serialize};

/// A field's value changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeEvent {
    /// Identifier of the changed field
    pub field_id: FieldName,
    /// New raw value
    pub value: String,
}

impl ChangeEvent {
    pub fn new(field_id: impl Into<FieldName>, value: impl Into<String>) -> Self {
        Self {
            field_id: field_id.into(),
            value: value.into(),
        }
    }
}

/// A submit attempt.
///
/// The engine always calls [`SubmitEvent::prevent_default`]; whatever
/// dispatched the event can check [`SubmitEvent::default_prevented`] to skip
/// its own default action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitEvent {
    /// Optional description of what triggered the submit (a button id, a route)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default)]
    default_prevented: bool,
}

impl SubmitEvent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_source(source: impl Into<String>) -> Self {
        Self {
            source: Some(source.into()),
            default_prevented: false,
        }
    }

    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }
}
