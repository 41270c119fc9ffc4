//! Data models for the picking carriage
//!
//! This module provides:
//! - Motion state as perceived by the client
//! - The article/shelf catalog and its resolver
//! - The user-facing session log

pub mod catalog;
pub mod log;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Client-side belief about what the carriage is doing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MotionState {
    /// Stationary, nothing in flight
    #[default]
    Idle,
    /// Homing run in progress
    Homing,
    /// Pick cycle in progress (move to shelf, pick, return)
    Picking,
    /// Stopped by command or by the controller
    Stopped,
}

impl MotionState {
    /// Check if the carriage is believed to be moving
    pub fn is_moving(&self) -> bool {
        matches!(self, MotionState::Homing | MotionState::Picking)
    }

    /// Short label for a status indicator
    pub fn indicator(&self) -> &'static str {
        if self.is_moving() {
            "Moving..."
        } else {
            "Stationary"
        }
    }
}

impl fmt::Display for MotionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MotionState::Idle => write!(f, "Idle"),
            MotionState::Homing => write!(f, "Homing"),
            MotionState::Picking => write!(f, "Picking"),
            MotionState::Stopped => write!(f, "Stopped"),
        }
    }
}
