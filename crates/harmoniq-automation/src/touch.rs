use std::sync::atomic::{AtomicU32, Ordering};

/// Counts overlapping touch gestures on one parameter.
///
/// Several sources (mouse drag, control surface) may touch a parameter at the
/// same time; the parameter counts as touched until the last one releases.
#[derive(Debug, Default)]
pub struct TouchTracker {
    count: AtomicU32,
}

impl TouchTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a touch. Returns `true` on the 0 -> 1 transition.
    #[inline]
    pub fn start(&self) -> bool {
        self.count.fetch_add(1, Ordering::AcqRel) == 0
    }

    /// Releases a touch. Returns `true` on the 1 -> 0 transition; releasing an
    /// untouched tracker does nothing.
    #[inline]
    pub fn stop(&self) -> bool {
        self.count
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |count| {
                count.checked_sub(1)
            })
            .map_or(false, |previous| previous == 1)
    }

    #[inline]
    pub fn touching(&self) -> bool {
        self.count.load(Ordering::Acquire) != 0
    }

    #[inline]
    pub fn count(&self) -> u32 {
        self.count.load(Ordering::Acquire)
    }
}
