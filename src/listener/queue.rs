//! Bounded hand-off between the receive task and the dispatch worker.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

/// What to discard when a datagram arrives at a full queue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OverflowPolicy {
    /// Evict the oldest queued datagram to make room.
    #[default]
    DropOldest,
    /// Discard the arriving datagram.
    DropNewest,
}

pub(crate) struct DispatchQueue<T> {
    items: Mutex<VecDeque<T>>,
    notify: Notify,
    capacity: usize,
    overflow: OverflowPolicy,
}

impl<T> DispatchQueue<T> {
    /// `capacity` must be at least 1.
    pub(crate) fn new(capacity: usize, overflow: OverflowPolicy) -> Self {
        Self {
            items: Mutex::new(VecDeque::with_capacity(capacity.min(1024))),
            notify: Notify::new(),
            capacity: capacity.max(1),
            overflow,
        }
    }

    /// Enqueue `item`; returns whatever the overflow policy discarded.
    pub(crate) fn push(&self, item: T) -> Option<T> {
        let dropped = {
            let mut items = self.items.lock().unwrap_or_else(PoisonError::into_inner);
            if items.len() < self.capacity {
                items.push_back(item);
                None
            } else {
                match self.overflow {
                    OverflowPolicy::DropNewest => Some(item),
                    OverflowPolicy::DropOldest => {
                        let oldest = items.pop_front();
                        items.push_back(item);
                        oldest
                    }
                }
            }
        };
        self.notify.notify_one();
        dropped
    }

    /// Next item; `None` once `cancel` fires and the queue is empty.
    pub(crate) async fn pop(&self, cancel: &CancellationToken) -> Option<T> {
        loop {
            if let Some(item) = self
                .items
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .pop_front()
            {
                return Some(item);
            }
            tokio::select! {
                _ = self.notify.notified() => {}
                _ = cancel.cancelled() => return None,
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
