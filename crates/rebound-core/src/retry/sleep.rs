//! Suspension between attempts

use std::time::Duration;

/// Suspends the retrying thread between attempts
///
/// The blocking loops sleep through this trait so the wait can be swapped
/// out, e.g. to record requested waits instead of sleeping.
pub trait Sleeper {
    /// Block for `wait`
    fn sleep(&mut self, wait: Duration);
}

/// Blocks the current thread with [`std::thread::sleep`]
///
/// The sleep cannot be interrupted. Zero waits return immediately.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&mut self, wait: Duration) {
        if !wait.is_zero() {
            std::thread::sleep(wait);
        }
    }
}

impl<S: Sleeper + ?Sized> Sleeper for &mut S {
    fn sleep(&mut self, wait: Duration) {
        (**self).sleep(wait)
    }
}
