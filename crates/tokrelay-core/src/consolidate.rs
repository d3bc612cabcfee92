//! Consolidation of a session's four token sources into one canonical list.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::extract::SourceShape;
use crate::types::{Token, TokenSourceKind, TokenSources};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConsolidateError {
    /// A non-empty source matched none of the known shapes.
    #[error("{kind} matches no known token shape: {raw}")]
    MalformedTokenSource { kind: TokenSourceKind, raw: String },
}

/// Extract every non-empty source and concatenate the results in source order
/// (session, http, body, custom).
///
/// All-or-nothing across sources: one malformed source fails the whole call.
pub fn consolidate(
    sources: &TokenSources,
    now: DateTime<Utc>,
) -> Result<Vec<Token>, ConsolidateError> {
    let mut tokens = Vec::new();
    for (kind, source) in sources.iter() {
        if source.is_empty() {
            continue;
        }
        let shape = SourceShape::detect(source.raw());
        if !shape.is_known() {
            return Err(ConsolidateError::MalformedTokenSource {
                kind,
                raw: source.raw().to_owned(),
            });
        }
        let shape_name = shape.as_str();
        let extracted = shape.into_tokens(now);
        tracing::debug!(source = %kind, shape = shape_name, tokens = extracted.len(), "token source extracted");
        tokens.extend(extracted);
    }
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TokenSource;

    fn all_sources() -> TokenSources {
        TokenSources::default()
            .with(
                TokenSourceKind::Session,
                r#"{"example.com":{"g":{"Name":"cookie","Value":"1"}}}"#,
            )
            .with(TokenSourceKind::Http, r#"[{"token":"http"}]"#)
            .with(TokenSourceKind::Body, r#"[{"token":"body"}]"#)
            .with(
                TokenSourceKind::Custom,
                r#"{".custom.test":{"g":{"Name":"custom","Value":"4"}}}"#,
            )
    }

    #[test]
    fn preserves_source_order() {
        let tokens = consolidate(&all_sources(), Utc::now()).expect("consolidate");
        let values: Vec<_> = tokens.iter().map(|t| t.value.as_str()).collect();
        assert_eq!(values, vec!["1", "http", "body", "4"]);
        assert_eq!(tokens[3].domain.as_deref(), Some("custom.test"));
    }

    #[test]
    fn empty_sources_contribute_nothing() {
        let tokens = consolidate(&TokenSources::default(), Utc::now()).expect("consolidate");
        assert!(tokens.is_empty());

        let sources = TokenSources::default()
            .with(TokenSourceKind::Http, "")
            .with(TokenSourceKind::Body, r#"[{"token":"only"}]"#);
        let tokens = consolidate(&sources, Utc::now()).expect("consolidate");
        assert_eq!(tokens.len(), 1);
    }

    #[test]
    fn malformed_source_fails_whole_consolidation() {
        let sources = all_sources().with(TokenSourceKind::Body, "not json");
        let err = consolidate(&sources, Utc::now()).expect_err("must fail");

        assert_eq!(
            err,
            ConsolidateError::MalformedTokenSource {
                kind: TokenSourceKind::Body,
                raw: "not json".to_owned(),
            }
        );
        assert!(err.to_string().contains("body_tokens"));
    }

    #[test]
    fn null_entries_do_not_make_a_source_malformed() {
        let now = Utc::now();
        for raw in [
            r#"[{"token":"a"}, null]"#,
            r#"{"d.test":null,"example.com":{"g":{"Name":"a","Value":"1"}}}"#,
            r#"{"example.com":{"g":null,"h":{"Name":"a","Value":"1"}}}"#,
        ] {
            let sources = TokenSources::default().with(TokenSourceKind::Body, raw);
            let tokens = consolidate(&sources, now).expect(raw);
            assert_eq!(tokens.len(), 1, "{raw}");
        }
    }

    #[test]
    fn first_malformed_source_is_reported() {
        let sources = TokenSources {
            http_tokens: TokenSource::new(r#"{"Authorization":"Bearer x"}"#),
            custom_tokens: TokenSource::new("also bad"),
            ..TokenSources::default()
        };
        let err = consolidate(&sources, Utc::now()).expect_err("must fail");
        let ConsolidateError::MalformedTokenSource { kind, .. } = err;
        assert_eq!(kind, TokenSourceKind::Http);
    }
}
