//! Visual instance bookkeeping for cell overlays and the highlight cursor.

use glam::Vec3;
use homestead_core::{VisualHandle, VisualKey};

/// Allocates visual handles from a single monotonically increasing counter.
#[derive(Debug)]
pub(crate) struct HandleAllocator {
    next: VisualHandle,
}

impl HandleAllocator {
    /// Creates an allocator whose first handle is zero.
    pub(crate) fn new() -> Self {
        Self {
            next: VisualHandle::new(0),
        }
    }

    /// Returns a fresh handle that has never been issued before.
    pub(crate) fn allocate(&mut self) -> VisualHandle {
        let handle = self.next;
        self.next = VisualHandle::new(handle.get().saturating_add(1));
        handle
    }
}

/// Overlay quad attached to a single cell.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct OverlayInstance {
    /// Handle announced when the overlay was created.
    pub(crate) handle: VisualHandle,
    /// World position of the overlay center, including the lift.
    pub(crate) position: Vec3,
    /// Visual currently assigned, if one was ever assigned.
    pub(crate) visual: Option<VisualKey>,
    /// Whether the overlay is currently displayed.
    pub(crate) visible: bool,
}

impl OverlayInstance {
    /// Creates a hidden overlay with no visual assigned yet.
    pub(crate) fn new(handle: VisualHandle) -> Self {
        Self {
            handle,
            position: Vec3::ZERO,
            visual: None,
            visible: false,
        }
    }

    /// Hides the overlay, reporting whether its visibility changed.
    pub(crate) fn hide(&mut self) -> bool {
        let was_visible = self.visible;
        self.visible = false;
        was_visible
    }
}

/// The single highlight cursor shared by every cell.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct HighlightInstance {
    /// Handle announced when the highlight was created.
    pub(crate) handle: VisualHandle,
    /// World position of the highlight center, including the lift.
    pub(crate) position: Vec3,
    /// Whether the highlight is currently displayed.
    pub(crate) visible: bool,
}

impl HighlightInstance {
    /// Creates a hidden highlight positioned at the world origin.
    pub(crate) fn new(handle: VisualHandle) -> Self {
        Self {
            handle,
            position: Vec3::ZERO,
            visible: false,
        }
    }

    /// Moves the highlight and shows it, reporting whether anything changed.
    pub(crate) fn show_at(&mut self, position: Vec3) -> bool {
        if self.visible && self.position == position {
            return false;
        }
        self.position = position;
        self.visible = true;
        true
    }

    /// Hides the highlight, reporting whether its visibility changed.
    pub(crate) fn hide(&mut self) -> bool {
        let was_visible = self.visible;
        self.visible = false;
        was_visible
    }
}
