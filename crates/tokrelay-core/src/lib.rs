//! tokrelay-core: canonical token model and schema-tolerant extraction.
//! Reduces loosely-typed token payloads captured from a browser session to
//! one canonical [`types::Token`] list. Pure: no IO, no async.

pub mod consolidate;
pub mod extract;
pub mod types;

pub use consolidate::{ConsolidateError, consolidate};
pub use extract::{SourceShape, extract};
pub use types::{OpaqueValue, Session, Token, TokenSource, TokenSourceKind, TokenSources};
