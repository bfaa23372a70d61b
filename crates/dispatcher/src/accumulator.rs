//! Accumulator - pending batch and flush decisions
//!
//! Owned by the run loop; no locking. A batch is closed either when the
//! pending set reaches `max_buffer_size` or when the flush timer fires.

use std::fmt;
use std::time::Duration;

use contracts::Event;
use tokio::time::Instant;

use crate::timer::FlushTimer;

/// Why a batch was closed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushTrigger {
    /// Pending reached `max_buffer_size`
    Size,
    /// Flush timer fired
    Timer,
}

impl fmt::Display for FlushTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Size => f.write_str("size"),
            Self::Timer => f.write_str("timer"),
        }
    }
}

/// Events detached for a single bulk send
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    seq: u64,
    trigger: FlushTrigger,
    events: Vec<Event>,
}

impl Batch {
    pub fn new(seq: u64, trigger: FlushTrigger, events: Vec<Event>) -> Self {
        Self {
            seq,
            trigger,
            events,
        }
    }

    /// Detach order, starting at 0
    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn trigger(&self) -> FlushTrigger {
        self.trigger
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn into_events(self) -> Vec<Event> {
        self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Pending batch plus its flush timer
#[derive(Debug)]
pub struct Accumulator {
    pending: Vec<Event>,
    max_buffer_size: usize,
    timer: FlushTimer,
    next_seq: u64,
}

impl Accumulator {
    /// Create an empty accumulator
    pub fn new(max_buffer_size: usize, flush_delay: Duration) -> Self {
        Self {
            pending: Vec::new(),
            max_buffer_size: max_buffer_size.max(1),
            timer: FlushTimer::new(flush_delay),
            next_seq: 0,
        }
    }

    /// Append an event
    ///
    /// Returns the detached batch when the size trigger is hit. The first
    /// event after an empty period arms the flush timer.
    pub fn enqueue(&mut self, event: Event) -> Option<Batch> {
        self.pending.push(event);

        if self.pending.len() >= self.max_buffer_size {
            return Some(self.detach_batch(FlushTrigger::Size));
        }
        if self.pending.len() == 1 {
            self.timer.arm();
        }
        None
    }

    /// Timer fired: detach whatever is pending, if anything
    pub fn on_timer_fire(&mut self) -> Option<Batch> {
        self.timer.clear();
        if self.pending.is_empty() {
            return None;
        }
        Some(self.detach_batch(FlushTrigger::Timer))
    }

    /// Take the pending events and reset to empty
    ///
    /// Normal flush paths never call this on an empty pending set.
    pub fn detach_batch(&mut self, trigger: FlushTrigger) -> Batch {
        self.timer.clear();
        let seq = self.next_seq;
        self.next_seq += 1;
        Batch::new(seq, trigger, std::mem::take(&mut self.pending))
    }

    /// Pending event count
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    #[cfg(test)]
    fn max_buffer_size(&self) -> usize {
        self.max_buffer_size
    }

    /// When the timer fires, if armed
    pub fn deadline(&self) -> Option<Instant> {
        self.timer.deadline()
    }

    #[cfg(test)]
    fn is_timer_armed(&self) -> bool {
        self.deadline().is_some()
    }
}
