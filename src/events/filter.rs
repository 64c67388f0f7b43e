//! Suppression windows for expected transient errors.
//!
//! A structural schema change (index/view build or drop) makes database nodes
//! log errors that are a known side effect, not a failure. Code that triggers
//! such a change acquires an `EventsFilterGuard` for the pattern it expects;
//! matching events of the same class are dropped by the bus until the guard is
//! released and the grace period after release has elapsed.
//!
//! The registry is shared by all concurrent nemesis agents of a process.
//! Windows with the same class and pattern are reference-counted: releasing
//! one guard never ends suppression another holder still depends on.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use regex::Regex;
use tokio::time::Instant;
use tracing::debug;

use super::{EventClass, Result, SctEvent};

/// Longest grace period honored after release (30 years).
pub const MAX_GRACE: Duration = Duration::from_secs(86_400 * 365 * 30);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct FilterKey {
    class: EventClass,
    pattern: String,
}

#[derive(Debug)]
struct FilterEntry {
    regex: Regex,
    /// Number of guards currently holding this window open.
    active: usize,
    /// End of the grace period after the last release.
    expires_at: Option<Instant>,
}

impl FilterEntry {
    fn is_live(&self, now: Instant) -> bool {
        self.active > 0 || self.expires_at.is_some_and(|until| now < until)
    }
}

/// Process-wide registry of suppression windows.
#[derive(Debug, Default)]
pub struct EventsFilterRegistry {
    entries: Mutex<HashMap<FilterKey, FilterEntry>>,
}

impl EventsFilterRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Open a suppression window for `pattern` on events of `class`.
    ///
    /// The pattern is matched from the start of the event message. The window
    /// stays open while the returned guard lives and for `grace` after it is
    /// dropped.
    pub fn acquire(
        self: &Arc<Self>,
        class: EventClass,
        pattern: &str,
        grace: Duration,
    ) -> Result<EventsFilterGuard> {
        let key = FilterKey {
            class,
            pattern: pattern.to_string(),
        };

        let mut entries = self.lock();
        let holders = match entries.get_mut(&key) {
            Some(entry) => {
                entry.active += 1;
                entry.active
            }
            None => {
                let regex = Regex::new(&format!("^(?s:{})", pattern))?;
                entries.insert(
                    key.clone(),
                    FilterEntry {
                        regex,
                        active: 1,
                        expires_at: None,
                    },
                );
                1
            }
        };
        drop(entries);

        debug!(?class, pattern = %pattern, holders, "Suppression window acquired");

        Ok(EventsFilterGuard {
            registry: Arc::clone(self),
            key,
            grace,
        })
    }

    /// Whether an event is covered by any live window.
    pub fn is_suppressed(&self, event: &SctEvent) -> bool {
        let now = Instant::now();
        let mut entries = self.lock();
        entries.retain(|_, entry| entry.is_live(now));
        entries
            .iter()
            .any(|(key, entry)| key.class == event.class && entry.regex.is_match(&event.message))
    }

    /// Patterns of all live windows.
    pub fn active_patterns(&self) -> Vec<String> {
        let now = Instant::now();
        let mut entries = self.lock();
        entries.retain(|_, entry| entry.is_live(now));
        let mut patterns: Vec<String> = entries.keys().map(|k| k.pattern.clone()).collect();
        patterns.sort();
        patterns
    }

    /// Number of guards currently holding the given window open.
    pub fn holders(&self, class: EventClass, pattern: &str) -> usize {
        let key = FilterKey {
            class,
            pattern: pattern.to_string(),
        };
        self.lock().get(&key).map(|e| e.active).unwrap_or(0)
    }

    fn release(&self, key: &FilterKey, grace: Duration) {
        let now = Instant::now();
        let mut entries = self.lock();
        if let Some(entry) = entries.get_mut(key) {
            entry.active = entry.active.saturating_sub(1);
            let until = now + grace.min(MAX_GRACE);
            entry.expires_at = Some(entry.expires_at.map_or(until, |prev| prev.max(until)));
            debug!(
                class = ?key.class,
                pattern = %key.pattern,
                holders = entry.active,
                ?grace,
                "Suppression window released"
            );
            if !entry.is_live(now) {
                entries.remove(key);
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<FilterKey, FilterEntry>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// RAII guard for one suppression window holder.
///
/// Dropping the guard releases the hold on every exit path, including early
/// returns via `?` and timeouts.
#[must_use = "the suppression window closes when the guard is dropped"]
#[derive(Debug)]
pub struct EventsFilterGuard {
    registry: Arc<EventsFilterRegistry>,
    key: FilterKey,
    grace: Duration,
}

impl EventsFilterGuard {
    pub fn pattern(&self) -> &str {
        &self.key.pattern
    }

    pub fn class(&self) -> EventClass {
        self.key.class
    }
}

impl Drop for EventsFilterGuard {
    fn drop(&mut self) {
        self.registry.release(&self.key, self.grace);
    }
}
