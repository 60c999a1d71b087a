// Problem details data model: the emitted envelope, its partial form and extensions

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Detail used when a failing handler wrote no body at all.
pub const DETAILS_NOT_SPECIFIED: &str = "Details weren't specified";

/// Default problem type when neither the caller nor the mapping provide one.
pub const ABOUT_BLANK: &str = "about:blank";

// Members of the envelope itself; these can never be used as extension keys.
const RESERVED_MEMBERS: [&str; 5] = ["status", "title", "detail", "type", "instance"];

/// Open key/value metadata carried next to the fixed envelope members.
///
/// Keys keep their insertion order and are never overwritten once present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Extensions(IndexMap<String, Value>);

impl Extensions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `value` under `key` only when the key is not set yet.
    ///
    /// Returns `true` when the value was stored. Keys that collide with the
    /// fixed envelope members are refused.
    pub fn insert_if_absent(&mut self, key: impl Into<String>, value: impl Into<Value>) -> bool {
        let key: String = key.into();
        if RESERVED_MEMBERS.contains(&key.as_str()) || self.0.contains_key(&key) {
            return false;
        }
        self.0.insert(key, value.into());
        true
    }

    /// Merges every pair of `other` with add-if-absent semantics.
    pub fn extend_if_absent<I, K, V>(&mut self, other: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        for (key, value) in other {
            self.insert_if_absent(key, value);
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }
}

impl IntoIterator for Extensions {
    type Item = (String, Value);
    type IntoIter = indexmap::map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// A problem document where every fixed member is optional.
///
/// This is what downstream handlers may write as a body and what callers hand
/// to the builder; unknown members are kept as extensions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartialProblem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,
    #[serde(flatten)]
    pub extensions: Extensions,
}

impl PartialProblem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = Some(status.as_u16());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn with_type(mut self, type_url: impl Into<String>) -> Self {
        self.type_url = Some(type_url.into());
        self
    }

    pub fn with_instance(mut self, instance: impl Into<String>) -> Self {
        self.instance = Some(instance.into());
        self
    }

    pub fn with_extension(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extensions.insert_if_absent(key, value);
        self
    }
}

/// The standardized error payload written on every failure path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProblemEnvelope {
    pub status: u16,
    pub title: String,
    pub detail: Option<String>,
    #[serde(rename = "type")]
    pub type_url: String,
    pub instance: String,
    #[serde(flatten)]
    pub extensions: Extensions,
}

impl From<ProblemEnvelope> for PartialProblem {
    fn from(envelope: ProblemEnvelope) -> Self {
        Self {
            status: Some(envelope.status),
            title: Some(envelope.title),
            detail: envelope.detail,
            type_url: Some(envelope.type_url),
            instance: Some(envelope.instance),
            extensions: envelope.extensions,
        }
    }
}

impl IntoResponse for ProblemEnvelope {
    fn into_response(self) -> Response {
        let status: StatusCode =
            StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}
