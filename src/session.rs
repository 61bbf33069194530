// 🗂️ Session Registry - independent simulation engines keyed by UUID
//
// Each session sits behind its own mutex, so applies on one session serialize
// while other sessions proceed. Only the immutable baseline is shared.
// Sessions idle longer than the TTL are swept; at the cap the least recently
// used session is evicted to make room.

use crate::baseline::BaselineStore;
use crate::engine::SimulationEngine;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::time::{Duration, Instant};
use tracing::info;
use uuid::Uuid;

pub type SharedEngine = Arc<Mutex<SimulationEngine>>;

/// Bounds on how many sessions stay alive and for how long
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionLimits {
    pub max_sessions: usize,
    pub idle_ttl: Duration,
}

impl Default for SessionLimits {
    fn default() -> Self {
        Self {
            max_sessions: 1000,
            idle_ttl: Duration::from_secs(30 * 60),
        }
    }
}

struct SessionEntry {
    engine: SharedEngine,
    last_used: Mutex<Instant>,
}

impl SessionEntry {
    fn touch(&self, now: Instant) {
        *self.last_used.lock().unwrap_or_else(PoisonError::into_inner) = now;
    }

    fn last_used(&self) -> Instant {
        *self.last_used.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

pub struct SessionRegistry {
    store: Arc<BaselineStore>,
    limits: SessionLimits,
    sessions: RwLock<HashMap<Uuid, SessionEntry>>,
}

impl SessionRegistry {
    pub fn new(store: Arc<BaselineStore>) -> Self {
        Self::with_limits(store, SessionLimits::default())
    }

    pub fn with_limits(store: Arc<BaselineStore>, limits: SessionLimits) -> Self {
        SessionRegistry {
            store,
            limits,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &Arc<BaselineStore> {
        &self.store
    }

    pub fn limits(&self) -> SessionLimits {
        self.limits
    }

    /// Open a new session at the baseline
    pub fn create(&self) -> Uuid {
        self.create_at(Instant::now())
    }

    fn create_at(&self, now: Instant) -> Uuid {
        let id = Uuid::new_v4();
        let entry = SessionEntry {
            engine: Arc::new(Mutex::new(SimulationEngine::new(self.store.clone()))),
            last_used: Mutex::new(now),
        };

        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        let swept = sweep_idle(&mut sessions, now, self.limits.idle_ttl);
        if swept > 0 {
            info!(swept, "idle sessions expired");
        }

        while sessions.len() >= self.limits.max_sessions.max(1) {
            let oldest = sessions
                .iter()
                .min_by_key(|(_, entry)| entry.last_used())
                .map(|(id, _)| *id);
            match oldest {
                Some(oldest) => {
                    sessions.remove(&oldest);
                    info!(session = %oldest, "session evicted at capacity");
                }
                None => break,
            }
        }

        sessions.insert(id, entry);
        drop(sessions);

        info!(session = %id, "session created");
        id
    }

    /// Look up a session and mark it as used
    pub fn get(&self, id: &Uuid) -> Option<SharedEngine> {
        self.get_at(id, Instant::now())
    }

    fn get_at(&self, id: &Uuid, now: Instant) -> Option<SharedEngine> {
        let sessions = self.sessions.read().unwrap_or_else(PoisonError::into_inner);
        let entry = sessions.get(id)?;
        entry.touch(now);
        Some(entry.engine.clone())
    }

    /// Run `f` with exclusive access to one session's engine
    pub fn with_session<R>(&self, id: &Uuid, f: impl FnOnce(&mut SimulationEngine) -> R) -> Option<R> {
        let engine = self.get(id)?;
        let mut guard = lock_engine(&engine);
        Some(f(&mut *guard))
    }

    pub fn remove(&self, id: &Uuid) -> bool {
        let removed = self
            .sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id)
            .is_some();

        if removed {
            info!(session = %id, "session closed");
        }
        removed
    }

    /// Drop sessions idle for longer than the TTL. Returns how many went.
    pub fn sweep_idle(&self) -> usize {
        self.sweep_idle_at(Instant::now())
    }

    pub fn sweep_idle_at(&self, now: Instant) -> usize {
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        let swept = sweep_idle(&mut sessions, now, self.limits.idle_ttl);
        if swept > 0 {
            info!(swept, remaining = sessions.len(), "idle sessions expired");
        }
        swept
    }

    pub fn count(&self) -> usize {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

fn sweep_idle(sessions: &mut HashMap<Uuid, SessionEntry>, now: Instant, ttl: Duration) -> usize {
    let before = sessions.len();
    sessions.retain(|_, entry| now.saturating_duration_since(entry.last_used()) <= ttl);
    before - sessions.len()
}

/// Engine state is only written after validation succeeds, so a poisoned
/// lock still guards a consistent engine.
pub fn lock_engine(engine: &Mutex<SimulationEngine>) -> MutexGuard<'_, SimulationEngine> {
    engine.lock().unwrap_or_else(PoisonError::into_inner)
}

// ============================================================================
// TESTS
// ============================================================================
