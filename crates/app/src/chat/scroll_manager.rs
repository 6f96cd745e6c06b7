use gpui::{Pixels, point};
use gpui_component::VirtualListScrollHandle;

/// Keeps the history view pinned to the newest entry.
///
/// Every append requests a scroll to the bottom; the request is applied on
/// the next render pass, after the new row has a measured size.
pub struct ScrollManager {
    scroll_handle: VirtualListScrollHandle,
    pending_scroll_to_bottom: bool,
}

impl ScrollManager {
    pub fn new() -> Self {
        Self {
            scroll_handle: VirtualListScrollHandle::new(),
            pending_scroll_to_bottom: false,
        }
    }

    pub fn handle(&self) -> &VirtualListScrollHandle {
        &self.scroll_handle
    }

    pub fn request_scroll_to_bottom(&mut self) {
        self.pending_scroll_to_bottom = true;
    }

    /// Applies a pending scroll request. Returns true when the offset was
    /// moved.
    pub fn apply_pending_scroll(&mut self) -> bool {
        if !self.pending_scroll_to_bottom {
            return false;
        }
        self.pending_scroll_to_bottom = false;

        let max_offset = self.scroll_handle.max_offset().height;
        let current_x = self.scroll_handle.offset().x;
        // GPUI uses negative Y offsets for scrolling down, so the tail of
        // the list sits at `-max_offset`.
        let target_y = if max_offset > Pixels::ZERO {
            -max_offset
        } else {
            Pixels::ZERO
        };
        self.scroll_handle.set_offset(point(current_x, target_y));
        true
    }
}

impl Default for ScrollManager {
    fn default() -> Self {
        Self::new()
    }
}
