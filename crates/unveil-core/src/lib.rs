#![forbid(unsafe_code)]

//! Host-facing primitives for unveil.
//!
//! This crate provides:
//! - [`ElementId`] handles and [`ElementFlags`] for the small slice of element
//!   state the visibility controllers touch (active marker, aria-hidden, focus)
//! - [`Document`], the narrow host surface controllers mutate
//! - [`MemoryDocument`], an in-memory element tree implementing [`Document`]
//! - [`InteractionEvent`] for pointer/focus events routed to outside-click
//!   detection

pub mod document;
pub mod element;
pub mod event;

pub use document::{Document, MemoryDocument};
pub use element::{ElementFlags, ElementId};
pub use event::{InteractionEvent, InteractionKind};
