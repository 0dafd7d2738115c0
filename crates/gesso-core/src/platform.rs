//! Platform abstraction traits for Gesso runtime services.
//!
//! These traits let the animation core delegate waking and time keeping to
//! the host event loop, so the same controller runs under a desktop window,
//! a headless pump or a virtual-time test harness.

use std::time::Duration;

/// Receives scheduling requests from the runtime.
///
/// Implementations only record or forward the request; the host decides when
/// to actually drain timers and frame callbacks. They must be safe to use
/// from multiple threads so a waker can cross into a platform event loop.
pub trait RuntimeScheduler: Send + Sync {
    /// Request that the host deliver a frame ("ready to paint") signal.
    fn schedule_frame(&self);

    /// A timer is armed for `deadline` (measured on the runtime clock).
    fn schedule_wakeup(&self, deadline: Duration) {
        let _ = deadline;
    }

    /// Whether the host can deliver frame-sync signals at all.
    ///
    /// When `false` the frame clock skips the frame stage and ticks straight
    /// from the delay timer.
    fn supports_frame_sync(&self) -> bool {
        true
    }
}

/// Provides timing information for the runtime.
pub trait Clock: Send + Sync {
    /// Time elapsed since the clock's origin.
    fn elapsed(&self) -> Duration;
}
