//! Carriage command creator
//!
//! Builds the ASCII command lines understood by the carriage firmware and
//! decides which motion event a command implies before any telemetry has
//! confirmed it.

use super::telemetry::MotionEvent;
use std::fmt;

/// Command prefix: move to X, pick, and return home
pub const PICK_PREFIX: &str = "PICK_X";
/// Command prefix: run the homing cycle
pub const HOME_PREFIX: &str = "HOME_X";
/// Command prefix: stop immediately
pub const STOP_PREFIX: &str = "STOP_X";

/// Commands understood by the carriage firmware
#[derive(Debug, Clone, PartialEq)]
pub enum CarriageCommand {
    /// Pick at the given X coordinate (mm)
    Pick {
        /// Target coordinate in millimeters
        x_mm: f64,
    },
    /// Home the axis
    Home,
    /// Stop immediately
    Stop,
}

impl CarriageCommand {
    /// The line to send, without terminator
    pub fn to_line(&self) -> String {
        match self {
            Self::Pick { x_mm } => format!("{} {}", PICK_PREFIX, format_mm(*x_mm)),
            Self::Home => HOME_PREFIX.to_string(),
            Self::Stop => STOP_PREFIX.to_string(),
        }
    }
}

impl fmt::Display for CarriageCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_line())
    }
}

/// Format a coordinate as decimal millimeters with at least one fractional digit
pub fn format_mm(x_mm: f64) -> String {
    if x_mm.fract() == 0.0 {
        format!("{:.1}", x_mm)
    } else {
        format!("{}", x_mm)
    }
}

/// Motion event implied by sending `command`
///
/// Matching is on the uppercased, trimmed command prefix, so raw lines typed
/// by the operator get the same treatment as generated ones.
pub fn optimistic_event(command: &str) -> Option<MotionEvent> {
    let upper = command.trim().to_uppercase();
    if upper.starts_with(PICK_PREFIX) {
        Some(MotionEvent::PickStarted)
    } else if upper.starts_with(HOME_PREFIX) {
        Some(MotionEvent::HomingStarted)
    } else if upper.starts_with(STOP_PREFIX) {
        Some(MotionEvent::Stopped)
    } else {
        None
    }
}
