use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use uuid::Uuid;

/// Tracks tutorials with a save in flight so two saves never interleave.
#[derive(Clone, Default)]
pub struct SaveLocks {
    active: Arc<Mutex<HashSet<Uuid>>>,
}

impl SaveLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `tutorial_id`. Returns `None` while another save holds it.
    pub fn try_acquire(&self, tutorial_id: Uuid) -> Option<SaveGuard> {
        let mut active = self.active.lock().unwrap_or_else(|e| e.into_inner());
        if !active.insert(tutorial_id) {
            return None;
        }
        Some(SaveGuard {
            active: Arc::clone(&self.active),
            tutorial_id,
        })
    }
}

/// Releases its tutorial when dropped.
pub struct SaveGuard {
    active: Arc<Mutex<HashSet<Uuid>>>,
    tutorial_id: Uuid,
}

impl Drop for SaveGuard {
    fn drop(&mut self) {
        let mut active = self.active.lock().unwrap_or_else(|e| e.into_inner());
        active.remove(&self.tutorial_id);
    }
}
