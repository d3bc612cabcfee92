//! tokrelay-notify: token artifacts and at-most-once session notification.
//!
//! A [`Notifier`] turns each observed [`Session`](tokrelay_core::Session) into a
//! delivered notification: the first observation of a session id is sent as new,
//! every later observation edits the delivered message in place. Delivery and
//! configuration are injected through the [`Transport`] and [`ConfigProvider`] seams.

pub mod artifact;
pub mod config;
pub mod error;
pub mod notifier;
pub mod store;
pub mod transport;

pub use artifact::{Artifact, session_summary};
pub use config::{ConfigError, ConfigFile, ConfigProvider, NotifierConfig, StaticConfig, TomlConfigProvider};
pub use error::NotifyError;
pub use notifier::{EmptyTokenPolicy, Notifier, NotifyOptions, NotifyOutcome};
pub use store::{NotificationRecord, NotificationStore};
pub use transport::{MessageHandle, Transport, TransportError};
