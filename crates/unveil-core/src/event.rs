#![forbid(unsafe_code)]

//! Interaction events delivered to outside-click detection.

use crate::element::ElementId;

/// Kind of user interaction.
///
/// Pointer-down and touch-start are the events that count as a "click away";
/// focus moving into another element counts as well.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InteractionKind {
    PointerDown,
    TouchStart,
    FocusIn,
}

/// A pointer or focus interaction targeting a single element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InteractionEvent {
    pub kind: InteractionKind,
    pub target: ElementId,
}

impl InteractionEvent {
    /// Create a new interaction event.
    pub const fn new(kind: InteractionKind, target: ElementId) -> Self {
        Self { kind, target }
    }

    /// Pointer-down on `target`.
    pub const fn pointer_down(target: ElementId) -> Self {
        Self::new(InteractionKind::PointerDown, target)
    }

    /// Touch-start on `target`.
    pub const fn touch_start(target: ElementId) -> Self {
        Self::new(InteractionKind::TouchStart, target)
    }

    /// Focus moved into `target`.
    pub const fn focus_in(target: ElementId) -> Self {
        Self::new(InteractionKind::FocusIn, target)
    }
}
