//! The push-client registry (§4.E): every connection that issues
//! ADD_PUSH_CLIENT is attached here, and every tree event is fanned out to
//! every registered sender.

use std::sync::Arc;

use cfgtree_proto::ConfigActionData;
use parking_lot::RwLock;
use tokio::sync::{mpsc, Notify};

struct Entry {
    /// Identifies the owning connection; `notify_one()`d when this entry is
    /// dropped for exceeding its high-water mark, so the connection's select
    /// loop can close the socket instead of silently losing push traffic.
    disconnect: Arc<Notify>,
    tx: mpsc::Sender<ConfigActionData>,
}

pub struct PushRegistry {
    entries: RwLock<Vec<Entry>>,
}

impl PushRegistry {
    pub fn new() -> Self {
        PushRegistry { entries: RwLock::new(Vec::new()) }
    }

    pub fn add(&self, disconnect: Arc<Notify>, tx: mpsc::Sender<ConfigActionData>) {
        self.entries.write().push(Entry { disconnect, tx });
    }

    pub fn remove(&self, disconnect: &Arc<Notify>) {
        self.entries.write().retain(|e| !Arc::ptr_eq(&e.disconnect, disconnect));
    }

    /// Fans `msg` out to every registered sender. A sender whose queue is
    /// already at its high-water mark (`try_send` returns `Full`) is dropped
    /// from the registry and its connection notified to disconnect, rather
    /// than letting a slow consumer stall tree-wide event dispatch (§4.E,
    /// §5 back-pressure policy).
    pub fn broadcast(&self, msg: ConfigActionData) {
        self.entries.write().retain(|e| {
            if e.tx.try_send(msg.clone()).is_ok() {
                true
            } else {
                e.disconnect.notify_one();
                false
            }
        });
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }
}

impl Default for PushRegistry {
    fn default() -> Self {
        PushRegistry::new()
    }
}
