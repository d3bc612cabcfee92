//! Shape detection and conversion of one raw token source into canonical [`Token`]s.
//!
//! Two top-level shapes are recognized, tried in priority order:
//!
//! ```text
//! NestedMap  {"<domain>": {"<group>": {"Name": "...", "Value": "...", ...}}}
//! FlatList   [{"token": "..."}, ...]
//! ```
//!
//! Anything else is [`SourceShape::Unknown`]. Unknown is not an error at this
//! layer; the consolidator decides what a non-match means.

use chrono::{DateTime, Months, TimeDelta, Utc};
use serde_json::{Map, Value};

use crate::types::{OpaqueValue, Token};

/// Name given to every token extracted from the flat-list shape.
pub const FLAT_TOKEN_NAME: &str = "token";

// ─── Shape ────────────────────────────────────────────────────────

/// Structural classification of a decoded token source.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceShape {
    /// domain → group → field map.
    NestedMap(Map<String, Value>),
    /// Sequence of `{token: string}` records.
    FlatList(Vec<Value>),
    Unknown,
}

impl SourceShape {
    /// Decode `raw` and classify it. Invalid JSON is `Unknown`.
    pub fn detect(raw: &str) -> Self {
        match serde_json::from_str::<Value>(raw) {
            Ok(value) => Self::classify(value),
            Err(_) => Self::Unknown,
        }
    }

    /// Classify an already-decoded value.
    pub fn classify(value: Value) -> Self {
        match value {
            Value::Object(domains) if is_nested_map(&domains) => Self::NestedMap(domains),
            Value::Array(entries) if entries.iter().all(is_record_or_null) => {
                Self::FlatList(entries)
            }
            _ => Self::Unknown,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NestedMap(_) => "nested_map",
            Self::FlatList(_) => "flat_list",
            Self::Unknown => "unknown",
        }
    }

    /// Convert to canonical tokens. `now` drives the synthetic expiration.
    pub fn into_tokens(self, now: DateTime<Utc>) -> Vec<Token> {
        let expires = synthetic_expiration(now);
        match self {
            Self::NestedMap(domains) => nested_map_tokens(&domains, expires),
            Self::FlatList(entries) => flat_list_tokens(&entries, expires),
            Self::Unknown => Vec::new(),
        }
    }
}

/// Extract canonical tokens from one raw source. Unknown shapes yield nothing.
pub fn extract(raw: &str, now: DateTime<Utc>) -> Vec<Token> {
    SourceShape::detect(raw).into_tokens(now)
}

/// One year after `now`, in epoch seconds. Saturates at `now` when out of range.
pub fn synthetic_expiration(now: DateTime<Utc>) -> i64 {
    now.checked_add_months(Months::new(12))
        .or_else(|| now.checked_add_signed(TimeDelta::days(365)))
        .unwrap_or(now)
        .timestamp()
}

/// `null` stands in for an absent entry at every level and is skipped on conversion.
fn is_record_or_null(value: &Value) -> bool {
    value.is_object() || value.is_null()
}

fn is_nested_map(domains: &Map<String, Value>) -> bool {
    domains.values().all(|group| match group {
        Value::Null => true,
        Value::Object(records) => records.values().all(is_record_or_null),
        _ => false,
    })
}

// ─── Nested map ───────────────────────────────────────────────────

fn nested_map_tokens(domains: &Map<String, Value>, expires: i64) -> Vec<Token> {
    let mut tokens = Vec::new();
    for (domain, groups) in domains {
        let Some(groups) = groups.as_object() else {
            continue;
        };
        for (group, record) in groups {
            let Some(fields) = record.as_object() else {
                continue;
            };
            match nested_record_token(domain, fields, expires) {
                Some(token) => tokens.push(token),
                None => tracing::debug!(%domain, %group, "skipping token record without Name/Value"),
            }
        }
    }
    tokens
}

fn nested_record_token(domain: &str, fields: &Map<String, Value>, expires: i64) -> Option<Token> {
    let name = fields.get("Name")?.as_str()?;
    let value = fields.get("Value")?.as_str()?;

    Some(Token {
        name: name.to_owned(),
        value: value.to_owned(),
        domain: normalize_domain(domain),
        path: string_field(fields, "Path"),
        host_only: bool_field(fields, "HostOnly"),
        secure: bool_field(fields, "Secure"),
        http_only: bool_field(fields, "HttpOnly"),
        same_site: string_field(fields, "SameSite"),
        is_session_token: bool_field(fields, "Session"),
        first_party_domain: string_field(fields, "FirstPartyDomain"),
        partition_key: fields.get("PartitionKey").and_then(OpaqueValue::from_json),
        // Lowercase spelling wins when both are present.
        store_id: fields
            .get("storeId")
            .and_then(OpaqueValue::from_json)
            .or_else(|| fields.get("StoreID").and_then(OpaqueValue::from_json)),
        expiration_date: Some(expires),
    })
}

/// Strip a single leading `.`; an empty result is treated as absent.
fn normalize_domain(domain: &str) -> Option<String> {
    let stripped = domain.strip_prefix('.').unwrap_or(domain);
    if stripped.is_empty() {
        None
    } else {
        Some(stripped.to_owned())
    }
}

fn string_field(fields: &Map<String, Value>, key: &str) -> Option<String> {
    fields.get(key).and_then(Value::as_str).map(str::to_owned)
}

fn bool_field(fields: &Map<String, Value>, key: &str) -> bool {
    fields.get(key).and_then(Value::as_bool).unwrap_or(false)
}

// ─── Flat list ────────────────────────────────────────────────────

fn flat_list_tokens(entries: &[Value], expires: i64) -> Vec<Token> {
    entries
        .iter()
        .filter_map(|entry| entry.get(FLAT_TOKEN_NAME).and_then(Value::as_str))
        .map(|value| Token {
            expiration_date: Some(expires),
            ..Token::new(FLAT_TOKEN_NAME, value)
        })
        .collect()
}
