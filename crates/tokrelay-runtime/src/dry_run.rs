//! Dry-run transport: prints each delivery instead of sending it.

use std::io::{self, Write};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use tokrelay_notify::{MessageHandle, NotifierConfig, Transport, TransportError};

pub struct DryRunTransport<W> {
    out: Mutex<W>,
    next_id: AtomicU64,
}

impl DryRunTransport<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> DryRunTransport<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
            next_id: AtomicU64::new(1),
        }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, header: &str, message: &str, artifact: &Path) -> Result<(), TransportError> {
        let tokens = std::fs::read_to_string(artifact).map_err(|e| TransportError::Failed(Box::new(e)))?;
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        writeln!(out, "=== {header} ===\n{message}\n--- {} ---\n{tokens}", artifact.display())
            .and_then(|()| out.flush())
            .map_err(|e| TransportError::Failed(Box::new(e)))
    }
}

impl<W: Write + Send> Transport for DryRunTransport<W> {
    async fn send(
        &self,
        _config: &NotifierConfig,
        message: &str,
        artifact: &Path,
    ) -> Result<Option<MessageHandle>, TransportError> {
        let handle = MessageHandle::new(format!("dry-run-{}", self.next_id.fetch_add(1, Ordering::SeqCst)));
        self.emit(&format!("send {handle}"), message, artifact)?;
        Ok(Some(handle))
    }

    async fn edit(
        &self,
        _config: &NotifierConfig,
        handle: &MessageHandle,
        artifact: &Path,
        message: &str,
    ) -> Result<(), TransportError> {
        self.emit(&format!("edit {handle}"), message, artifact)
    }
}
