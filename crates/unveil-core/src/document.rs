#![forbid(unsafe_code)]

//! The host document surface mutated by visibility controllers.
//!
//! Controllers never reach into a rendering backend directly. Every side
//! effect they perform (focus, the trigger's active marker, aria-hidden,
//! measuring content height) goes through [`Document`], so a browser binding,
//! a terminal UI, or the in-memory [`MemoryDocument`] can stand behind it.
//!
//! # Invariants
//!
//! - At most one element is focused at a time.
//! - Mutating a detached (or never created) element is a no-op.
//! - `contains(a, a)` is `true` for any attached element.
//!
//! # Failure Modes
//!
//! - `intrinsic_height()` of an unknown element returns `0.0`.
//! - `focus()` of an unknown element leaves focus unchanged.

use ahash::AHashMap;

use crate::element::{ElementFlags, ElementId};

/// Host document operations used by the visibility controllers.
pub trait Document {
    /// Move focus to `element`.
    fn focus(&mut self, element: ElementId);

    /// The currently focused element, if any.
    fn focused(&self) -> Option<ElementId>;

    /// Add or remove the active-state marker on `element`.
    fn set_active(&mut self, element: ElementId, active: bool);

    /// Set `aria-hidden` on `element`.
    fn set_aria_hidden(&mut self, element: ElementId, hidden: bool);

    /// Content-driven height of `element` when fully expanded.
    fn intrinsic_height(&self, element: ElementId) -> f32;

    /// Whether `node` is `ancestor` or lies inside its subtree.
    fn contains(&self, ancestor: ElementId, node: ElementId) -> bool;
}

#[derive(Debug, Clone, Default)]
struct Node {
    parent: Option<ElementId>,
    flags: ElementFlags,
    intrinsic_height: f32,
}

/// In-memory element tree implementing [`Document`].
///
/// Used by tests and headless hosts. Elements form a forest; removing an
/// element removes its whole subtree.
#[derive(Debug, Clone, Default)]
pub struct MemoryDocument {
    nodes: AHashMap<ElementId, Node>,
    focused: Option<ElementId>,
}

impl MemoryDocument {
    /// Create an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new element under `parent` (or as a root).
    ///
    /// An unknown `parent` produces a root element.
    pub fn create_element(&mut self, parent: Option<ElementId>) -> ElementId {
        let id = ElementId::next();
        let parent = parent.filter(|p| self.nodes.contains_key(p));
        self.nodes.insert(
            id,
            Node {
                parent,
                ..Node::default()
            },
        );
        id
    }

    /// Remove `element` and its subtree. Returns the number of removed elements.
    pub fn remove(&mut self, element: ElementId) -> usize {
        if !self.nodes.contains_key(&element) {
            return 0;
        }
        let doomed: Vec<ElementId> = self
            .nodes
            .keys()
            .copied()
            .filter(|&id| self.contains(element, id))
            .collect();
        for id in &doomed {
            self.nodes.remove(id);
        }
        if let Some(focused) = self.focused
            && doomed.contains(&focused)
        {
            self.focused = None;
        }
        doomed.len()
    }

    /// Whether `element` exists in the document.
    pub fn is_attached(&self, element: ElementId) -> bool {
        self.nodes.contains_key(&element)
    }

    /// Number of attached elements.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the document has no elements.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Current flags for `element`, or `None` when detached.
    pub fn flags(&self, element: ElementId) -> Option<ElementFlags> {
        self.nodes.get(&element).map(|n| n.flags)
    }

    /// Whether `element` carries the active marker.
    pub fn is_active(&self, element: ElementId) -> bool {
        self.flags(element)
            .is_some_and(|f| f.contains(ElementFlags::ACTIVE))
    }

    /// Whether `element` is hidden from assistive technology.
    pub fn is_aria_hidden(&self, element: ElementId) -> bool {
        self.flags(element)
            .is_some_and(|f| f.contains(ElementFlags::ARIA_HIDDEN))
    }

    /// Set the measured content height for `element`.
    pub fn set_intrinsic_height(&mut self, element: ElementId, height: f32) {
        if let Some(node) = self.nodes.get_mut(&element) {
            node.intrinsic_height = height.max(0.0);
        }
    }

    /// Parent of `element`, if any.
    pub fn parent(&self, element: ElementId) -> Option<ElementId> {
        self.nodes.get(&element).and_then(|n| n.parent)
    }

    fn update_flags(&mut self, element: ElementId, flag: ElementFlags, on: bool) {
        if let Some(node) = self.nodes.get_mut(&element) {
            node.flags.set(flag, on);
        }
    }
}

impl Document for MemoryDocument {
    fn focus(&mut self, element: ElementId) {
        if !self.nodes.contains_key(&element) {
            return;
        }
        if let Some(prev) = self.focused.take() {
            self.update_flags(prev, ElementFlags::FOCUSED, false);
        }
        self.update_flags(element, ElementFlags::FOCUSED, true);
        self.focused = Some(element);

        #[cfg(feature = "tracing")]
        tracing::trace!(element = element.id(), "focus moved");
    }

    fn focused(&self) -> Option<ElementId> {
        self.focused
    }

    fn set_active(&mut self, element: ElementId, active: bool) {
        self.update_flags(element, ElementFlags::ACTIVE, active);
    }

    fn set_aria_hidden(&mut self, element: ElementId, hidden: bool) {
        self.update_flags(element, ElementFlags::ARIA_HIDDEN, hidden);
    }

    fn intrinsic_height(&self, element: ElementId) -> f32 {
        self.nodes
            .get(&element)
            .map_or(0.0, |n| n.intrinsic_height)
    }

    fn contains(&self, ancestor: ElementId, node: ElementId) -> bool {
        if !self.nodes.contains_key(&ancestor) {
            return false;
        }
        let mut cursor = Some(node);
        while let Some(id) = cursor {
            if id == ancestor {
                return true;
            }
            cursor = self.nodes.get(&id).and_then(|n| n.parent);
        }
        false
    }
}
