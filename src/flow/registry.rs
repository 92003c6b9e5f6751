use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::PreconditionError;

/// Tracks which attendance targets have a live flow, so two flows never
/// drive the same record.
#[derive(Clone, Default)]
pub struct SessionRegistry {
    active: Arc<Mutex<HashSet<String>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn acquire(&self, target_id: &str) -> Result<SessionLease, PreconditionError> {
        if !self.lock().insert(target_id.to_string()) {
            return Err(PreconditionError::SessionAlreadyActive(target_id.to_string()));
        }

        Ok(SessionLease {
            registry: self.clone(),
            target_id: target_id.to_string(),
        })
    }

    pub fn is_active(&self, target_id: &str) -> bool {
        self.lock().contains(target_id)
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<String>> {
        match self.active.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// Released on drop.
pub struct SessionLease {
    registry: SessionRegistry,
    target_id: String,
}

impl Drop for SessionLease {
    fn drop(&mut self) {
        self.registry.lock().remove(&self.target_id);
    }
}
