//! tokrelay-telegram: Telegram Bot API transport.
//! Delivers token artifacts as documents and edits them in place.
//! No business logic: pure IO boundary behind [`tokrelay_notify::Transport`].

pub mod client;
pub mod error;

pub use client::{DEFAULT_API_BASE, MAX_CAPTION_CHARS, TelegramTransport, truncate_caption};
pub use error::TelegramError;
