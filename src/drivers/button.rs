//! ISR-safe latch for the manual test button.
//!
//! ## Hardware
//!
//! Active-low momentary switch with pull-up.  The GPIO interrupt fires on
//! the falling edge and calls [`ButtonLatch::on_edge`]; everything in
//! there is a lock-free atomic, so it is safe from interrupt context.
//!
//! ## Contract
//!
//! - Edges within [`EDGE_LOCKOUT_MS`] of the previous accepted edge are
//!   contact bounce and are dropped.
//! - The controller consumes at most one press per tick with
//!   [`take_press`](ButtonLatch::take_press), and [`disarm`](ButtonLatch::disarm)s
//!   the latch while it handles it so a second edge cannot land mid-handling.
//! - Nothing in the alarm or pump path runs from the ISR.

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

/// Minimum spacing between two accepted edges.
pub const EDGE_LOCKOUT_MS: u32 = 50;

pub struct ButtonLatch {
    pending: AtomicBool,
    armed: AtomicBool,
    has_edge: AtomicBool,
    last_edge_ms: AtomicU32,
}

/// The one latch wired to the board's test button.
pub static BUTTON: ButtonLatch = ButtonLatch::new();

impl ButtonLatch {
    pub const fn new() -> Self {
        Self {
            pending: AtomicBool::new(false),
            armed: AtomicBool::new(true),
            has_edge: AtomicBool::new(false),
            last_edge_ms: AtomicU32::new(0),
        }
    }

    /// ISR entry point.  Returns `true` if the edge was latched.
    pub fn on_edge(&self, now_ms: u32) -> bool {
        if !self.armed.load(Ordering::Acquire) {
            return false;
        }
        if self.has_edge.load(Ordering::Acquire)
            && now_ms.wrapping_sub(self.last_edge_ms.load(Ordering::Acquire)) < EDGE_LOCKOUT_MS
        {
            return false;
        }
        self.last_edge_ms.store(now_ms, Ordering::Release);
        self.has_edge.store(true, Ordering::Release);
        self.pending.store(true, Ordering::Release);
        true
    }

    /// Consume the pending press, if any.
    pub fn take_press(&self) -> bool {
        self.pending.swap(false, Ordering::AcqRel)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }

    /// Ignore edges until [`arm`](Self::arm).
    pub fn disarm(&self) {
        self.armed.store(false, Ordering::Release);
    }

    pub fn arm(&self) {
        self.armed.store(true, Ordering::Release);
    }

    pub fn is_armed(&self) -> bool {
        self.armed.load(Ordering::Acquire)
    }
}

impl Default for ButtonLatch {
    fn default() -> Self {
        Self::new()
    }
}
