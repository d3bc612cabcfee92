//! Input helpers: file-or-stdin reading and session batch parsing.

use std::io::Read;
use std::path::Path;

use anyhow::Context;
use tokrelay_core::Session;

/// Read `path`, or stdin when `path` is `-`.
pub fn read_input(path: &Path) -> anyhow::Result<String> {
    if path.as_os_str() == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("failed to read stdin")?;
        return Ok(text);
    }
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

/// Parse either a single session object or an array of sessions.
pub fn parse_sessions(text: &str) -> anyhow::Result<Vec<Session>> {
    let value: serde_json::Value =
        serde_json::from_str(text).context("session input is not valid JSON")?;
    match value {
        serde_json::Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(i, item)| {
                serde_json::from_value(item).with_context(|| format!("invalid session at index {i}"))
            })
            .collect(),
        other => Ok(vec![
            serde_json::from_value(other).context("invalid session")?,
        ]),
    }
}
