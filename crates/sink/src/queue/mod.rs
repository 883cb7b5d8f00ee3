//! Event queue
//!
//! FIFO buffer between any number of producer threads and the single drain
//! worker. Bounded queues either drop or block the producer when full.
//!
//! # Design
//!
//! - Producers are synchronous: `try_enqueue` never waits, `enqueue_blocking`
//!   parks the calling thread on a condvar until space frees or the queue closes
//! - The consumer is async: `recv` awaits a `Notify` permit, so a wakeup sent
//!   while the worker is busy is never lost
//! - `close` is explicit and idempotent. It releases every blocked producer
//!   and wakes the consumer, which still drains what was accepted before close

use std::collections::VecDeque;

use parking_lot::{Condvar, Mutex};
use thiserror::Error;
use tokio::sync::Notify;

use crate::event::LogEvent;

/// Non-blocking enqueue failure; the event is handed back
#[derive(Debug, Error)]
pub enum TryEnqueueError {
    /// Bounded queue at its limit
    #[error("queue is full")]
    Full(LogEvent),

    /// Queue no longer accepts events
    #[error("queue is closed")]
    Closed(LogEvent),
}

impl TryEnqueueError {
    /// Take back the rejected event
    pub fn into_inner(self) -> LogEvent {
        match self {
            Self::Full(event) | Self::Closed(event) => event,
        }
    }

    pub fn is_full(&self) -> bool {
        matches!(self, Self::Full(_))
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed(_))
    }
}

/// Non-suspending receive failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TryRecvError {
    /// Nothing buffered right now
    #[error("queue is empty")]
    Empty,

    /// Closed and fully drained
    #[error("queue is closed and drained")]
    Closed,
}

#[derive(Debug)]
struct QueueState {
    items: VecDeque<LogEvent>,
    closed: bool,
}

/// Multi-producer, single-consumer event queue
#[derive(Debug)]
pub struct EventQueue {
    state: Mutex<QueueState>,
    /// Blocked producers wait here
    space_available: Condvar,
    /// The consumer waits here
    items_available: Notify,
    limit: Option<usize>,
    block_when_full: bool,
}

impl EventQueue {
    /// Create a queue
    ///
    /// `limit = None` is unbounded. A limit of 0 is raised to 1 so that neither
    /// policy can stall forever.
    pub fn new(limit: Option<usize>, block_when_full: bool) -> Self {
        let limit = limit.map(|l| {
            if l == 0 {
                tracing::warn!("queue limit of 0 raised to 1");
            }
            l.max(1)
        });

        let capacity = limit.map_or(0, |l| l.min(1024));
        Self {
            state: Mutex::new(QueueState {
                items: VecDeque::with_capacity(capacity),
                closed: false,
            }),
            space_available: Condvar::new(),
            items_available: Notify::new(),
            limit,
            block_when_full,
        }
    }

    /// Create an unbounded queue
    pub fn unbounded() -> Self {
        Self::new(None, false)
    }

    /// Maximum number of buffered events (`None` = unbounded)
    #[inline]
    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    /// Whether a full queue blocks producers instead of dropping
    #[inline]
    pub fn blocks_when_full(&self) -> bool {
        self.block_when_full && self.limit.is_some()
    }

    /// Events currently buffered
    pub fn len(&self) -> usize {
        self.state.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().items.is_empty()
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    #[inline]
    fn is_full(&self, state: &QueueState) -> bool {
        self.limit.is_some_and(|limit| state.items.len() >= limit)
    }

    /// Enqueue without waiting
    pub fn try_enqueue(&self, event: LogEvent) -> Result<(), TryEnqueueError> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(TryEnqueueError::Closed(event));
        }
        if self.is_full(&state) {
            return Err(TryEnqueueError::Full(event));
        }
        state.items.push_back(event);
        drop(state);

        self.items_available.notify_one();
        Ok(())
    }

    /// Enqueue, parking the calling thread while the queue is full
    ///
    /// Returns the event if the queue is (or becomes) closed before it was
    /// accepted. Must not be called from the consumer.
    pub fn enqueue_blocking(&self, event: LogEvent) -> Result<(), LogEvent> {
        let mut state = self.state.lock();
        loop {
            if state.closed {
                return Err(event);
            }
            if !self.is_full(&state) {
                break;
            }
            self.space_available.wait(&mut state);
        }
        state.items.push_back(event);
        drop(state);

        self.items_available.notify_one();
        Ok(())
    }

    /// Stop accepting events
    ///
    /// Returns `true` for the call that actually closed the queue.
    pub fn close(&self) -> bool {
        let mut state = self.state.lock();
        if state.closed {
            return false;
        }
        state.closed = true;
        drop(state);

        self.space_available.notify_all();
        self.items_available.notify_one();
        true
    }

    /// Take the next event without waiting
    pub fn try_recv(&self) -> Result<LogEvent, TryRecvError> {
        let mut state = self.state.lock();
        match state.items.pop_front() {
            Some(event) => {
                drop(state);
                self.space_available.notify_one();
                Ok(event)
            }
            None if state.closed => Err(TryRecvError::Closed),
            None => Err(TryRecvError::Empty),
        }
    }

    /// Wait for the next event
    ///
    /// Returns `None` once the queue is closed and every accepted event has
    /// been handed out.
    pub async fn recv(&self) -> Option<LogEvent> {
        loop {
            match self.try_recv() {
                Ok(event) => return Some(event),
                Err(TryRecvError::Closed) => return None,
                Err(TryRecvError::Empty) => self.items_available.notified().await,
            }
        }
    }

    /// Close the queue and remove everything still buffered
    ///
    /// Used when the output is gone; returns how many events were discarded.
    pub fn close_and_discard(&self) -> usize {
        self.close();
        let discarded = std::mem::take(&mut self.state.lock().items);
        discarded.len()
    }
}

#[cfg(test)]
#[path = "queue_test.rs"]
mod queue_test;
