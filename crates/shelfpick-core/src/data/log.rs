//! Session log
//!
//! Append-only stream of `(direction, text)` events for display. Readers keep
//! a cursor (the next sequence number they want) and fetch what is new.

use chrono::{DateTime, Local};
use std::collections::VecDeque;
use std::fmt;

/// Direction / kind of a log event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogDirection {
    /// Line written to the controller
    Outbound,
    /// Line received from the controller
    Inbound,
    /// Client-side information
    Info,
    /// Client-side error
    Error,
}

impl LogDirection {
    /// Console prefix for this direction
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Outbound => ">>",
            Self::Inbound => "<<",
            Self::Info => "[INFO]",
            Self::Error => "[ERROR]",
        }
    }
}

impl fmt::Display for LogDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.prefix())
    }
}

/// One log event
#[derive(Debug, Clone)]
pub struct LogEvent {
    /// Monotonic sequence number, starting at 0
    pub seq: u64,
    /// Direction / kind
    pub direction: LogDirection,
    /// Text without prefix
    pub text: String,
    /// Local wall-clock time the event was recorded
    pub timestamp: DateTime<Local>,
}

impl LogEvent {
    /// Get formatted event
    pub fn formatted(&self) -> String {
        format!("{} {}", self.direction, self.text)
    }

    /// Get formatted event with time of day
    pub fn formatted_with_time(&self) -> String {
        format!("[{}] {}", self.timestamp.format("%H:%M:%S"), self.formatted())
    }
}

/// Bounded append-only event log
#[derive(Debug)]
pub struct SessionLog {
    events: VecDeque<LogEvent>,
    next_seq: u64,
    max_events: usize,
}

impl SessionLog {
    /// Default number of retained events
    pub const DEFAULT_CAPACITY: usize = 1000;

    /// Create a log retaining the default number of events
    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    /// Create a log retaining at most `max_events` events (minimum 1)
    pub fn with_capacity(max_events: usize) -> Self {
        Self {
            events: VecDeque::new(),
            next_seq: 0,
            max_events: max_events.max(1),
        }
    }

    /// Append an event and return its sequence number
    pub fn push(&mut self, direction: LogDirection, text: impl Into<String>) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.events.push_back(LogEvent {
            seq,
            direction,
            text: text.into(),
            timestamp: Local::now(),
        });

        if self.events.len() > self.max_events {
            self.events.pop_front();
        }
        seq
    }

    /// Events with `seq >= cursor` that are still retained
    pub fn since(&self, cursor: u64) -> impl Iterator<Item = &LogEvent> {
        self.events.iter().filter(move |e| e.seq >= cursor)
    }

    /// Cursor value that skips everything logged so far
    pub fn next_seq(&self) -> u64 {
        self.next_seq
    }

    /// Most recent event
    pub fn last(&self) -> Option<&LogEvent> {
        self.events.back()
    }

    /// Retained events, oldest first
    pub fn iter(&self) -> impl Iterator<Item = &LogEvent> {
        self.events.iter()
    }

    /// Number of retained events
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Check if nothing is retained
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl Default for SessionLog {
    fn default() -> Self {
        Self::new()
    }
}
