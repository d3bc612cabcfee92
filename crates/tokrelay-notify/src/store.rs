//! Per-session notification records.
//!
//! Each session id owns one slot guarded by its own async mutex. A notify
//! holds that mutex from reading the record through writing it back, so two
//! concurrent calls for the same id can never both observe "not sent".
//! The map lock is only held for the slot lookup.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::transport::MessageHandle;

/// Notification state of one session id. Sent records are never evicted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotificationRecord {
    pub sent: bool,
    pub delivered_handle: Option<MessageHandle>,
}

#[derive(Debug, Default)]
pub struct NotificationStore {
    slots: Mutex<HashMap<String, Arc<Mutex<NotificationRecord>>>>,
}

impl NotificationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock the record for `session_id`, creating an unsent one on first use.
    pub async fn lock(&self, session_id: &str) -> OwnedMutexGuard<NotificationRecord> {
        let slot = {
            let mut slots = self.slots.lock().await;
            Arc::clone(slots.entry(session_id.to_owned()).or_default())
        };
        slot.lock_owned().await
    }

    /// Give back a record that did not reach the sent state.
    ///
    /// The slot is dropped when no other caller holds or waits on it, so ids
    /// that were skipped or failed do not accumulate.
    pub async fn release(&self, session_id: &str, record: OwnedMutexGuard<NotificationRecord>) {
        if record.sent {
            return;
        }
        let mut slots = self.slots.lock().await;
        let idle = slots.get(session_id).is_some_and(|slot| {
            Arc::ptr_eq(slot, OwnedMutexGuard::mutex(&record)) && Arc::strong_count(slot) == 2
        });
        if idle {
            slots.remove(session_id);
        }
        drop(record);
    }

    /// Number of session ids currently holding a slot, sent or not.
    pub async fn tracked_count(&self) -> usize {
        self.slots.lock().await.len()
    }

    /// Snapshot of a session's record, only once it has been sent.
    pub async fn record(&self, session_id: &str) -> Option<NotificationRecord> {
        let slot = self.slots.lock().await.get(session_id).cloned()?;
        let record = slot.lock().await;
        record.sent.then(|| record.clone())
    }

    /// Number of session ids that reached the sent state.
    pub async fn sent_count(&self) -> usize {
        let slots: Vec<_> = self.slots.lock().await.values().cloned().collect();
        let mut count = 0;
        for slot in slots {
            if slot.lock().await.sent {
                count += 1;
            }
        }
        count
    }
}
