use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::analysis::models::{Category, LeadScore};

/// Identifier minted by the record store. Stores hand out either text or integer keys,
/// so both are accepted and kept as their textual form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct LeadId(String);

impl LeadId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LeadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for LeadId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Number(serde_json::Number),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(s) => LeadId(s),
            RawId::Number(n) => LeadId(n.to_string()),
        })
    }
}

/// Lifecycle states this service writes. Leads only ever move forward:
/// created → calling → analyzed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeadStatus {
    #[default]
    Created,
    Calling,
    Analyzed,
}

/// A lead row exactly as the store returns it.
///
/// Only `id` is required. Columns the analysis step writes are kept as raw JSON so a row
/// edited by hand or by another tool is still shown verbatim; the typed forms live on the
/// write side (`LeadPatch`). Columns this service does not know are kept in `other`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lead {
    pub id: LeadId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub call_sid: Option<String>,
    #[serde(default)]
    pub transcript: Option<String>,
    #[serde(default)]
    pub analysis_raw: Option<String>,
    #[serde(default)]
    pub extracted_fields: Option<Value>,
    #[serde(default)]
    pub score: Option<Value>,
    #[serde(default)]
    pub category: Option<Value>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

/// Insert body for a new lead.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewLead {
    pub name: String,
    pub phone: String,
    pub query: String,
    pub status: LeadStatus,
}

/// Partial update. Fields left as `None` are not serialized and stay untouched in the store.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LeadPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<LeadStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub call_sid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcript: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis_raw: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extracted_fields: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<LeadScore>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

impl LeadPatch {
    pub fn is_empty(&self) -> bool {
        *self == LeadPatch::default()
    }
}
