//! Sharded Session Registry
//!
//! Maps `(session_id, exercise)` to a tracked session. Uses 16 shards so
//! that unrelated sessions do not contend on one lock.
//!
//! # Locking
//! - A shard lock is held only to look up, insert or remove an entry
//! - Each entry sits behind its own mutex; stepping a counter locks only it
//! - [`SessionRegistry::with_session`] takes the shard lock while holding an
//!   entry lock, to confirm the entry is still stored. Nothing locks an entry
//!   while holding a shard lock.
//!
//! # Eviction
//! Unbounded by default. `max_sessions` turns every shard into an LRU of
//! `max_sessions / SHARD_COUNT` entries, so the registry never holds more
//! than `max_sessions`. `idle_ttl_secs` enables [`SessionRegistry::evict_idle`].
//!
//! # Example
//! ```rust
//! use repcount_core::{ExerciseKind, SessionRegistry};
//!
//! let registry = SessionRegistry::default();
//! let session = registry.get_or_create("user-1", ExerciseKind::Squat);
//! assert_eq!(session.lock().state().count, 0);
//! assert_eq!(registry.cleanup("user-1"), 1);
//! ```

use lru::LruCache;
use parking_lot::Mutex;
use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::{RegistryConfig, RepcountConfig};
use crate::counter::{ExerciseCounter, ExerciseKind, RepState};
use crate::session::TrackedSession;

/// Power of 2 for efficient modulo via bitwise AND. Also the smallest
/// accepted `max_sessions`.
pub const SHARD_COUNT: usize = 16;
const SHARD_MASK: usize = SHARD_COUNT - 1;

/// Shared handle to one tracked session. Lock it to step or read.
pub type SessionHandle = Arc<Mutex<TrackedSession>>;

/// Structural registry key. The `session_exercise` string form is used only
/// for display, snapshots and prefix cleanup.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionKey {
    pub session_id: String,
    pub kind: ExerciseKind,
}

impl SessionKey {
    pub fn new(session_id: impl Into<String>, kind: ExerciseKind) -> Self {
        Self {
            session_id: session_id.into(),
            kind,
        }
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.session_id, self.kind)
    }
}

#[derive(Debug)]
struct SessionSlot {
    session: SessionHandle,
    last_touched: Instant,
}

impl SessionSlot {
    fn fresh(kind: ExerciseKind, config: &RepcountConfig) -> Self {
        Self {
            session: Arc::new(Mutex::new(TrackedSession::new(ExerciseCounter::from_config(
                kind, config,
            )))),
            last_touched: Instant::now(),
        }
    }

    #[inline]
    fn is_idle(&self, ttl: Duration) -> bool {
        self.last_touched.elapsed() > ttl
    }
}

type Shard = Mutex<LruCache<SessionKey, SessionSlot>>;

pub struct SessionRegistry {
    shards: [Shard; SHARD_COUNT],
    config: RepcountConfig,
}

impl fmt::Debug for SessionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionRegistry")
            .field("shard_count", &SHARD_COUNT)
            .field("sessions", &self.len())
            .field("registry", &self.config.registry)
            .finish()
    }
}

impl SessionRegistry {
    /// New registry. Counters it creates use the thresholds in `config`.
    ///
    /// A `max_sessions` below [`SHARD_COUNT`] still keeps one entry per
    /// shard; [`RepcountConfig::validate`] rejects such values.
    pub fn new(config: RepcountConfig) -> Self {
        let capacity = Self::shard_capacity(&config.registry);
        let shards = std::array::from_fn(|_| {
            Mutex::new(match capacity {
                Some(cap) => LruCache::new(cap),
                None => LruCache::unbounded(),
            })
        });
        Self { shards, config }
    }

    fn shard_capacity(registry: &RegistryConfig) -> Option<NonZeroUsize> {
        registry
            .max_sessions
            .map(|max| NonZeroUsize::new(max / SHARD_COUNT).unwrap_or(NonZeroUsize::MIN))
    }

    pub fn config(&self) -> &RepcountConfig {
        &self.config
    }

    #[inline]
    fn shard_index(&self, key: &SessionKey) -> usize {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        (hasher.finish() as usize) & SHARD_MASK
    }

    #[inline]
    fn get_shard(&self, key: &SessionKey) -> &Shard {
        &self.shards[self.shard_index(key)]
    }

    /// Look up the session for `(session_id, kind)`, creating a fresh one
    /// if absent.
    pub fn get_or_create(&self, session_id: &str, kind: ExerciseKind) -> SessionHandle {
        let key = SessionKey::new(session_id, kind);
        let mut sessions = self.get_shard(&key).lock();

        if let Some(slot) = sessions.get_mut(&key) {
            slot.last_touched = Instant::now();
            return Arc::clone(&slot.session);
        }

        let slot = SessionSlot::fresh(kind, &self.config);
        let handle = Arc::clone(&slot.session);
        log::debug!("Created session '{}'", key);
        if let Some((evicted, _)) = sessions.push(key, slot) {
            log::warn!("Session '{}' evicted: shard at capacity", evicted);
        }
        handle
    }

    /// Run `f` on the session stored for `(session_id, kind)`, creating it
    /// if absent.
    ///
    /// The entry is checked again once its lock is held. If a concurrent
    /// reset, cleanup or eviction replaced or removed it in the meantime,
    /// the lookup is retried, so `f` never runs on a discarded session.
    pub fn with_session<T>(
        &self,
        session_id: &str,
        kind: ExerciseKind,
        f: impl FnOnce(&mut TrackedSession) -> T,
    ) -> T {
        loop {
            let handle = self.get_or_create(session_id, kind);
            let mut session = handle.lock();
            if self.is_current(session_id, kind, &handle) {
                return f(&mut session);
            }
            log::debug!(
                "Session '{}_{}' replaced while waiting, retrying",
                session_id,
                kind
            );
        }
    }

    /// Whether `handle` is the session currently stored for the key.
    pub fn is_current(
        &self,
        session_id: &str,
        kind: ExerciseKind,
        handle: &SessionHandle,
    ) -> bool {
        let key = SessionKey::new(session_id, kind);
        let sessions = self.get_shard(&key).lock();
        sessions
            .peek(&key)
            .is_some_and(|slot| Arc::ptr_eq(&slot.session, handle))
    }

    /// Look up without creating or touching.
    pub fn get(&self, session_id: &str, kind: ExerciseKind) -> Option<SessionHandle> {
        let key = SessionKey::new(session_id, kind);
        let sessions = self.get_shard(&key).lock();
        sessions.peek(&key).map(|slot| Arc::clone(&slot.session))
    }

    /// Replace any existing session for the key with a brand-new one.
    ///
    /// Handles obtained earlier keep pointing at the discarded session.
    pub fn reset(&self, session_id: &str, kind: ExerciseKind) -> SessionHandle {
        let key = SessionKey::new(session_id, kind);
        let slot = SessionSlot::fresh(kind, &self.config);
        let handle = Arc::clone(&slot.session);

        let mut sessions = self.get_shard(&key).lock();
        log::info!("Reset session '{}'", key);
        if let Some((evicted, _)) = sessions.push(key.clone(), slot) {
            if evicted != key {
                log::warn!("Session '{}' evicted: shard at capacity", evicted);
            }
        }
        handle
    }

    /// Remove every entry whose `session_exercise` key starts with
    /// `prefix`. An id that is a string prefix of another id matches both.
    pub fn cleanup(&self, prefix: &str) -> usize {
        let removed = self.remove_where(|key| key.to_string().starts_with(prefix));
        log::info!("Cleanup '{}': removed {} session(s)", prefix, removed);
        removed
    }

    /// Remove every exercise entry of exactly `session_id`.
    pub fn remove_session(&self, session_id: &str) -> usize {
        let removed = self.remove_where(|key| key.session_id == session_id);
        log::info!("Removed {} session(s) for '{}'", removed, session_id);
        removed
    }

    /// Drop entries untouched for longer than the configured idle TTL.
    /// Returns 0 when no TTL is configured.
    pub fn evict_idle(&self) -> usize {
        match self.config.registry.idle_ttl_secs {
            Some(secs) => self.evict_idle_older_than(Duration::from_secs(secs)),
            None => 0,
        }
    }

    /// Drop entries untouched for longer than `ttl`.
    pub fn evict_idle_older_than(&self, ttl: Duration) -> usize {
        let mut removed = 0;
        for (shard_idx, shard) in self.shards.iter().enumerate() {
            let mut sessions = shard.lock();
            let idle: Vec<SessionKey> = sessions
                .iter()
                .filter(|(_, slot)| slot.is_idle(ttl))
                .map(|(key, _)| key.clone())
                .collect();

            for key in idle {
                sessions.pop(&key);
                log::debug!("Evicted idle session '{}' in shard {}", key, shard_idx);
                removed += 1;
            }
        }
        removed
    }

    /// State of every tracked session, keyed by `session_exercise`.
    pub fn snapshot_all(&self) -> BTreeMap<String, RepState> {
        let mut handles = Vec::with_capacity(self.len());
        for shard in &self.shards {
            let sessions = shard.lock();
            handles.extend(
                sessions
                    .iter()
                    .map(|(key, slot)| (key.to_string(), Arc::clone(&slot.session))),
            );
        }

        handles
            .into_iter()
            .map(|(key, session)| (key, session.lock().state()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.shards.iter().map(|shard| shard.lock().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.shards.iter().all(|shard| shard.lock().is_empty())
    }

    pub fn clear(&self) {
        for shard in &self.shards {
            shard.lock().clear();
        }
    }

    /// Per-shard entry counts for monitoring distribution.
    pub fn shard_stats(&self) -> Vec<usize> {
        self.shards.iter().map(|shard| shard.lock().len()).collect()
    }

    fn remove_where(&self, matches: impl Fn(&SessionKey) -> bool) -> usize {
        let mut removed = 0;
        for shard in &self.shards {
            let mut sessions = shard.lock();
            let doomed: Vec<SessionKey> = sessions
                .iter()
                .map(|(key, _)| key)
                .filter(|key| matches(key))
                .cloned()
                .collect();
            for key in doomed {
                sessions.pop(&key);
                removed += 1;
            }
        }
        removed
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new(RepcountConfig::default())
    }
}
