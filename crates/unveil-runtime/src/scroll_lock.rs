#![forbid(unsafe_code)]

//! Process-wide, reference-counted scroll locking.
//!
//! Overlays lock background scrolling of a target (normally the document
//! body) while they are rendered. Several overlays can be open at once, so
//! locks are counted per target: the target stays locked until its last
//! reference is released.
//!
//! # How It Works
//!
//! 1. [`ScrollLockRegistry::global()`] returns the shared registry (tests and
//!    embedded hosts can build private ones with [`ScrollLockRegistry::new()`]).
//! 2. [`ScrollLockRegistry::acquire()`] adds one reference and returns a
//!    [`ScrollLockGuard`]; dropping or releasing the guard removes it.
//! 3. [`ScrollLockRegistry::unlock_all()`] clears every lock at once, the
//!    teardown safety net. Guards issued before the clear become inert, so
//!    they never decrement a count they no longer own.
//!
//! # Invariants
//!
//! - A target is locked iff its reference count is non-zero.
//! - `unlock()` of an unlocked target is a no-op that returns `false`.
//! - `release_count()` increases by exactly one each time the registry goes
//!   from engaged (any target locked) to disengaged.
//!
//! # Thread Safety
//!
//! The table lives behind a `Mutex`. A poisoned lock is recovered rather than
//! surfaced: the table holds plain counters that cannot be left half-updated.

use std::sync::{Arc, Mutex, MutexGuard, OnceLock};

use ahash::AHashMap;
use unveil_core::ElementId;

static GLOBAL: OnceLock<ScrollLockRegistry> = OnceLock::new();

#[derive(Debug, Default)]
struct LockTable {
    counts: AHashMap<ElementId, usize>,
    /// Bumped by `unlock_all`; guards from older epochs are inert.
    epoch: u64,
    releases: u64,
}

impl LockTable {
    fn is_engaged(&self) -> bool {
        !self.counts.is_empty()
    }

    fn decrement(&mut self, target: ElementId) -> bool {
        let Some(count) = self.counts.get_mut(&target) else {
            return false;
        };
        *count -= 1;
        if *count == 0 {
            self.counts.remove(&target);
            if !self.is_engaged() {
                self.releases += 1;
            }
        }
        true
    }
}

/// Shared handle to a scroll-lock table.
///
/// Cloning yields another handle to the same table.
#[derive(Debug, Clone, Default)]
pub struct ScrollLockRegistry {
    inner: Arc<Mutex<LockTable>>,
}

impl ScrollLockRegistry {
    /// Create an independent, empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry.
    pub fn global() -> Self {
        GLOBAL.get_or_init(Self::new).clone()
    }

    fn table(&self) -> MutexGuard<'_, LockTable> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Add one lock reference to `target`.
    pub fn lock(&self, target: ElementId) {
        self.lock_at_epoch(target);
    }

    fn lock_at_epoch(&self, target: ElementId) -> u64 {
        let mut table = self.table();
        let count = table.counts.entry(target).or_insert(0);
        *count += 1;
        tracing::debug!(element = target.id(), refs = *count, "scroll lock acquired");
        table.epoch
    }

    /// Remove one lock reference from `target`.
    ///
    /// Returns `false` if `target` was not locked.
    pub fn unlock(&self, target: ElementId) -> bool {
        let released = self.table().decrement(target);
        if released {
            tracing::debug!(element = target.id(), "scroll lock released");
        } else {
            tracing::trace!(element = target.id(), "unlock of unlocked target ignored");
        }
        released
    }

    /// Lock `target` and return a guard owning that one reference.
    #[must_use = "dropping the guard releases the scroll lock"]
    pub fn acquire(&self, target: ElementId) -> ScrollLockGuard {
        let epoch = self.lock_at_epoch(target);
        ScrollLockGuard {
            registry: self.clone(),
            target,
            epoch,
            live: true,
        }
    }

    /// Clear every lock on every target.
    ///
    /// Returns the number of references cleared. Outstanding guards become
    /// inert.
    pub fn unlock_all(&self) -> usize {
        let mut table = self.table();
        let cleared: usize = table.counts.values().sum();
        let was_engaged = table.is_engaged();
        table.counts.clear();
        table.epoch += 1;
        if was_engaged {
            table.releases += 1;
        }
        drop(table);
        if cleared > 0 {
            tracing::debug!(cleared, "all scroll locks cleared");
        }
        cleared
    }

    /// Whether `target` currently has any lock reference.
    pub fn is_locked(&self, target: ElementId) -> bool {
        self.table().counts.contains_key(&target)
    }

    /// Whether any target is locked.
    pub fn is_engaged(&self) -> bool {
        self.table().is_engaged()
    }

    /// Number of lock references held on `target`.
    pub fn ref_count(&self, target: ElementId) -> usize {
        self.table().counts.get(&target).copied().unwrap_or(0)
    }

    /// How many times the registry went from engaged to fully released.
    pub fn release_count(&self) -> u64 {
        self.table().releases
    }

    fn release_guard(&self, target: ElementId, epoch: u64) -> bool {
        let mut table = self.table();
        if table.epoch != epoch {
            return false;
        }
        table.decrement(target)
    }
}

/// One scroll-lock reference, released on drop.
#[derive(Debug)]
#[must_use = "dropping the guard releases the scroll lock"]
pub struct ScrollLockGuard {
    registry: ScrollLockRegistry,
    target: ElementId,
    epoch: u64,
    live: bool,
}

impl ScrollLockGuard {
    /// The locked target.
    pub fn target(&self) -> ElementId {
        self.target
    }

    /// Whether the reference still counts: not released, and not cleared by
    /// an `unlock_all` since it was taken.
    pub fn is_current(&self) -> bool {
        self.live && self.registry.table().epoch == self.epoch
    }

    /// Release the reference now.
    ///
    /// Returns `false` if an `unlock_all` already cleared it.
    pub fn release(mut self) -> bool {
        self.release_inner()
    }

    fn release_inner(&mut self) -> bool {
        if !std::mem::replace(&mut self.live, false) {
            return false;
        }
        let released = self.registry.release_guard(self.target, self.epoch);
        if released {
            tracing::debug!(element = self.target.id(), "scroll lock guard released");
        }
        released
    }
}

impl Drop for ScrollLockGuard {
    fn drop(&mut self) {
        self.release_inner();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lock_and_unlock_counts_per_target() {
        let reg = ScrollLockRegistry::new();
        let body = ElementId::next();
        reg.lock(body);
        reg.lock(body);
        assert_eq!(reg.ref_count(body), 2);
        assert!(reg.unlock(body));
        assert!(reg.is_locked(body));
        assert!(reg.unlock(body));
        assert!(!reg.is_locked(body));
    }

    #[test]
    fn unlock_unlocked_is_noop() {
        let reg = ScrollLockRegistry::new();
        let body = ElementId::next();
        assert!(!reg.unlock(body));
        assert_eq!(reg.release_count(), 0);
    }

    #[test]
    fn targets_are_independent() {
        let reg = ScrollLockRegistry::new();
        let a = ElementId::next();
        let b = ElementId::next();
        reg.lock(a);
        reg.lock(b);
        reg.unlock(a);
        assert!(!reg.is_locked(a));
        assert!(reg.is_locked(b));
        assert!(reg.is_engaged());
    }

    #[test]
    fn guard_drop_releases() {
        let reg = ScrollLockRegistry::new();
        let body = ElementId::next();
        {
            let _guard = reg.acquire(body);
            assert!(reg.is_locked(body));
        }
        assert!(!reg.is_locked(body));
        assert_eq!(reg.release_count(), 1);
    }

    #[test]
    fn nested_guards_keep_lock_until_last() {
        let reg = ScrollLockRegistry::new();
        let body = ElementId::next();
        let first = reg.acquire(body);
        let second = reg.acquire(body);
        assert!(first.release());
        assert!(reg.is_locked(body));
        drop(second);
        assert!(!reg.is_locked(body));
        assert_eq!(reg.release_count(), 1);
    }

    #[test]
    fn unlock_all_makes_guards_inert() {
        let reg = ScrollLockRegistry::new();
        let body = ElementId::next();
        let first = reg.acquire(body);
        let second = reg.acquire(body);
        assert_eq!(reg.unlock_all(), 2);
        assert!(!reg.is_engaged());

        // A fresh lock taken after the clear must survive stale guards.
        let fresh = reg.acquire(body);
        assert!(!first.release());
        drop(second);
        assert!(reg.is_locked(body));
        assert_eq!(fresh.target(), body);
        drop(fresh);
        assert!(!reg.is_locked(body));
    }

    #[test]
    fn guard_stops_being_current_after_unlock_all() {
        let reg = ScrollLockRegistry::new();
        let body = ElementId::next();
        let old = reg.acquire(body);
        assert!(old.is_current());
        reg.unlock_all();
        assert!(!old.is_current());
        let fresh = reg.acquire(body);
        assert!(fresh.is_current());
        assert!(!old.is_current());
    }

    #[test]
    fn unlock_all_counts_single_release() {
        let reg = ScrollLockRegistry::new();
        let body = ElementId::next();
        let _a = reg.acquire(body);
        let _b = reg.acquire(body);
        reg.unlock_all();
        reg.unlock_all();
        assert_eq!(reg.release_count(), 1);
    }

    #[test]
    fn unlock_all_on_empty_returns_zero() {
        let reg = ScrollLockRegistry::new();
        assert_eq!(reg.unlock_all(), 0);
        assert_eq!(reg.release_count(), 0);
    }

    #[test]
    fn clones_share_state() {
        let reg = ScrollLockRegistry::new();
        let other = reg.clone();
        let body = ElementId::next();
        reg.lock(body);
        assert!(other.is_locked(body));
    }

    #[test]
    fn global_is_shared() {
        let body = ElementId::next();
        let guard = ScrollLockRegistry::global().acquire(body);
        assert!(ScrollLockRegistry::global().is_locked(body));
        drop(guard);
        assert!(!ScrollLockRegistry::global().is_locked(body));
    }
}
