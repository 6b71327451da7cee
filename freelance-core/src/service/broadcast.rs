use std::collections::HashMap;
use std::sync::Mutex;
use tokio::sync::broadcast;
use tracing::debug;

const DEFAULT_CAPACITY: usize = 64;

/// Fans chat events out to every open socket of a profile.
pub struct ConversationBroadcaster {
    channels: Mutex<HashMap<i64, broadcast::Sender<String>>>,
    capacity: usize,
}

impl Default for ConversationBroadcaster {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl ConversationBroadcaster {
    pub fn new(capacity: usize) -> Self {
        Self {
            channels: Mutex::new(HashMap::new()),
            capacity: capacity.max(1),
        }
    }

    pub fn subscribe(&self, profile_id: i64) -> broadcast::Receiver<String> {
        let mut channels = self.channels.lock().unwrap_or_else(|e| e.into_inner());
        channels
            .entry(profile_id)
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe()
    }

    /// Returns the number of sockets reached. Channels without listeners are dropped.
    pub fn publish(&self, profile_id: i64, payload: String) -> usize {
        let mut channels = self.channels.lock().unwrap_or_else(|e| e.into_inner());
        let Some(sender) = channels.get(&profile_id) else {
            return 0;
        };
        match sender.send(payload) {
            Ok(reached) => reached,
            Err(_) => {
                debug!(profile_id, "no listeners left, dropping channel");
                channels.remove(&profile_id);
                0
            }
        }
    }

    /// Drops the profile's channel once its last receiver is gone. Call after
    /// dropping a receiver from [`Self::subscribe`].
    pub fn release(&self, profile_id: i64) {
        let mut channels = self.channels.lock().unwrap_or_else(|e| e.into_inner());
        if channels.get(&profile_id).is_some_and(|s| s.receiver_count() == 0) {
            debug!(profile_id, "last listener left, dropping channel");
            channels.remove(&profile_id);
        }
    }
}
