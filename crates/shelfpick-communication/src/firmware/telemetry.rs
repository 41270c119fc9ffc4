//! Telemetry classifier
//!
//! The carriage firmware reports progress as free text. This module maps a
//! line to at most one [`MotionEvent`] using an ordered rule table: rules are
//! tried top to bottom on the lowercased line, the first rule with a matching
//! substring wins, and lines that match nothing are plain telemetry.

use std::fmt;

/// State-relevant event recognised in a telemetry line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MotionEvent {
    /// Controller stopped (by command or on its own)
    Stopped,
    /// Pick cycle started
    PickStarted,
    /// Homing run started
    HomingStarted,
    /// Pick finished; the return leg may still follow
    PickDone,
    /// Homing run finished
    HomingDone,
    /// Target position reached
    TargetReached,
}

impl fmt::Display for MotionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stopped => write!(f, "stopped"),
            Self::PickStarted => write!(f, "pick started"),
            Self::HomingStarted => write!(f, "homing started"),
            Self::PickDone => write!(f, "pick done"),
            Self::HomingDone => write!(f, "homing done"),
            Self::TargetReached => write!(f, "target reached"),
        }
    }
}

/// One classification rule: any needle found in the line yields `event`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TelemetryRule {
    /// Lowercase substrings
    pub needles: &'static [&'static str],
    /// Event produced on match
    pub event: MotionEvent,
}

/// Rules in priority order
pub const TELEMETRY_RULES: &[TelemetryRule] = &[
    TelemetryRule {
        needles: &["stop cmd", "stopped"],
        event: MotionEvent::Stopped,
    },
    TelemetryRule {
        needles: &["pick: start"],
        event: MotionEvent::PickStarted,
    },
    TelemetryRule {
        needles: &["homing: start"],
        event: MotionEvent::HomingStarted,
    },
    TelemetryRule {
        needles: &["pick: done"],
        event: MotionEvent::PickDone,
    },
    TelemetryRule {
        needles: &["homing: done"],
        event: MotionEvent::HomingDone,
    },
    TelemetryRule {
        needles: &["reached"],
        event: MotionEvent::TargetReached,
    },
];

/// Classifies telemetry lines against a rule table
#[derive(Debug, Clone, Copy)]
pub struct TelemetryClassifier {
    rules: &'static [TelemetryRule],
}

impl TelemetryClassifier {
    /// Create a classifier using [`TELEMETRY_RULES`]
    pub fn new() -> Self {
        Self {
            rules: TELEMETRY_RULES,
        }
    }

    /// Classify a line; `None` means opaque telemetry
    pub fn classify(&self, line: &str) -> Option<MotionEvent> {
        let lower = line.to_lowercase();
        self.rules
            .iter()
            .find(|rule| rule.needles.iter().any(|n| lower.contains(n)))
            .map(|rule| rule.event)
    }
}

impl Default for TelemetryClassifier {
    fn default() -> Self {
        Self::new()
    }
}
