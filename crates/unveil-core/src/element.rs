#![forbid(unsafe_code)]

//! Element identifiers and per-element state flags.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use bitflags::bitflags;

/// Global counter for unique element IDs.
static ELEMENT_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Opaque handle to an element in the host document.
///
/// IDs are process-unique; two documents never hand out the same ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(u64);

impl ElementId {
    /// Allocate a new unique element ID.
    pub fn next() -> Self {
        Self(ELEMENT_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    #[inline]
    pub const fn id(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

bitflags! {
    /// Element state touched by the visibility controllers.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ElementFlags: u8 {
        /// Active-state marker (the trigger's "active" class).
        const ACTIVE = 0b0000_0001;
        /// `aria-hidden="true"`.
        const ARIA_HIDDEN = 0b0000_0010;
        /// Element currently holds focus.
        const FOCUSED = 0b0000_0100;
    }
}
