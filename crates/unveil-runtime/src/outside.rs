#![forbid(unsafe_code)]

//! Outside-interaction detection.
//!
//! An [`OutsideInteractionDetector`] holds a set of subtree watches. The host
//! feeds it every pointer-down, touch-start and focus-in event; each watch
//! whose subtree does not contain the event target is notified.
//!
//! Watches are owned through [`Subscription`] guards: dropping the guard
//! removes the watch before the next dispatch.
//!
//! # Invariants
//!
//! 1. Watches are notified in registration order.
//! 2. A watch never fires for an event inside its own subtree.
//! 3. Dropping a subscription inside a callback is allowed; the dropped watch
//!    does not fire again in later dispatches.
//!
//! # Failure Modes
//!
//! - Re-entrant dispatch from inside a callback skips the watch whose callback
//!   is still running.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use unveil_core::{Document, ElementId, InteractionEvent};

type WatchCallback = Rc<RefCell<dyn FnMut(&InteractionEvent)>>;

struct Watch {
    id: u64,
    subtree: ElementId,
    callback: WatchCallback,
}

#[derive(Default)]
struct Watches {
    next_id: u64,
    entries: Vec<Watch>,
}

/// Registry of subtree watches (single-threaded, shared by cloning).
#[derive(Clone, Default)]
pub struct OutsideInteractionDetector {
    inner: Rc<RefCell<Watches>>,
}

impl fmt::Debug for OutsideInteractionDetector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutsideInteractionDetector")
            .field("watches", &self.watch_count())
            .finish()
    }
}

impl OutsideInteractionDetector {
    /// Create an empty detector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Watch `subtree`; `callback` runs for every interaction outside it.
    #[must_use = "dropping the subscription stops the watch"]
    pub fn watch(
        &self,
        subtree: ElementId,
        callback: impl FnMut(&InteractionEvent) + 'static,
    ) -> Subscription {
        let mut watches = self.inner.borrow_mut();
        let id = watches.next_id;
        watches.next_id += 1;
        watches.entries.push(Watch {
            id,
            subtree,
            callback: Rc::new(RefCell::new(callback)),
        });
        tracing::debug!(watch = id, subtree = subtree.id(), "outside watch added");
        Subscription {
            id,
            subtree,
            watches: Rc::downgrade(&self.inner),
        }
    }

    /// Route `event` to every watch it lands outside of.
    ///
    /// Returns the number of callbacks invoked.
    pub fn dispatch<D: Document + ?Sized>(&self, event: &InteractionEvent, document: &D) -> usize {
        let targets: Vec<(u64, WatchCallback)> = self
            .inner
            .borrow()
            .entries
            .iter()
            .filter(|w| !document.contains(w.subtree, event.target))
            .map(|w| (w.id, Rc::clone(&w.callback)))
            .collect();

        let mut notified = 0;
        for (id, callback) in targets {
            // Skip watches removed by an earlier callback in this dispatch.
            if !self.inner.borrow().entries.iter().any(|w| w.id == id) {
                continue;
            }
            let Ok(mut callback) = callback.try_borrow_mut() else {
                continue;
            };
            tracing::trace!(watch = id, element = event.target.id(), "outside interaction");
            (&mut *callback)(event);
            notified += 1;
        }
        notified
    }

    /// Number of live watches.
    pub fn watch_count(&self) -> usize {
        self.inner.borrow().entries.len()
    }
}

/// RAII guard for a subtree watch.
#[must_use = "dropping the subscription stops the watch"]
pub struct Subscription {
    id: u64,
    subtree: ElementId,
    watches: Weak<RefCell<Watches>>,
}

impl Subscription {
    /// The watched subtree root.
    pub fn subtree(&self) -> ElementId {
        self.subtree
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("subtree", &self.subtree)
            .finish()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let Some(watches) = self.watches.upgrade() else {
            return;
        };
        if let Ok(mut watches) = watches.try_borrow_mut() {
            watches.entries.retain(|w| w.id != self.id);
            tracing::debug!(watch = self.id, "outside watch removed");
        }
    }
}
