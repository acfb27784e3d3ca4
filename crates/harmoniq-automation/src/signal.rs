//! Publish/subscribe notifications for the control/UI side.
//!
//! Each subscriber gets its own channel and drains it on its own thread.
//! Dropping the [`Subscription`] unregisters it.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender, TryIter};
use parking_lot::Mutex;

struct SignalInner<T> {
    next_id: AtomicU64,
    subscribers: Mutex<Vec<(u64, Sender<T>)>>,
}

pub struct Signal<T> {
    inner: Arc<SignalInner<T>>,
}

impl<T: Clone + Send> Signal<T> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(SignalInner {
                next_id: AtomicU64::new(0),
                subscribers: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn subscribe(&self) -> Subscription<T> {
        let (sender, receiver) = unbounded();
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner.subscribers.lock().push((id, sender));
        Subscription {
            id,
            receiver,
            signal: Arc::downgrade(&self.inner),
        }
    }

    pub fn emit(&self, value: T) {
        let mut subscribers = self.inner.subscribers.lock();
        subscribers.retain(|(_, sender)| sender.send(value.clone()).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.lock().len()
    }
}

impl<T: Clone + Send> Default for Signal<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("subscribers", &self.inner.subscribers.lock().len())
            .finish()
    }
}

pub struct Subscription<T> {
    id: u64,
    receiver: Receiver<T>,
    signal: Weak<SignalInner<T>>,
}

impl<T> Subscription<T> {
    pub fn try_recv(&self) -> Option<T> {
        self.receiver.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Result<T, RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }

    pub fn try_iter(&self) -> TryIter<'_, T> {
        self.receiver.try_iter()
    }

    pub fn receiver(&self) -> &Receiver<T> {
        &self.receiver
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        if let Some(signal) = self.signal.upgrade() {
            signal
                .subscribers
                .lock()
                .retain(|(id, _)| *id != self.id);
        }
    }
}

impl<T> fmt::Debug for Subscription<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}
