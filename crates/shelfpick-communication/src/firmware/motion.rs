//! Motion state machine
//!
//! Folds [`MotionEvent`]s into the perceived [`MotionState`]. A pick cycle
//! reports completion twice (the pick itself, then the return home), so the
//! tracker keeps in-flight markers and only reports Idle once no pick is
//! outstanding.

use super::telemetry::MotionEvent;
use shelfpick_core::MotionState;

/// Current motion state plus in-flight bookkeeping
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MotionTracker {
    state: MotionState,
    pick_in_flight: bool,
    homing_in_flight: bool,
}

impl MotionTracker {
    /// Create an idle tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// Current motion state
    pub fn state(&self) -> MotionState {
        self.state
    }

    /// Check if a pick has started and not reported done
    pub fn pick_in_flight(&self) -> bool {
        self.pick_in_flight
    }

    /// Check if a homing run has started and not reported done
    pub fn homing_in_flight(&self) -> bool {
        self.homing_in_flight
    }

    /// Apply an event; returns the new state if it changed
    pub fn apply(&mut self, event: MotionEvent) -> Option<MotionState> {
        let before = self.state;

        match event {
            MotionEvent::Stopped => {
                self.pick_in_flight = false;
                self.homing_in_flight = false;
                self.state = MotionState::Stopped;
            }
            MotionEvent::PickStarted => {
                self.pick_in_flight = true;
                self.state = MotionState::Picking;
            }
            MotionEvent::HomingStarted => {
                self.homing_in_flight = true;
                self.state = MotionState::Homing;
            }
            MotionEvent::PickDone => {
                self.pick_in_flight = false;
            }
            MotionEvent::HomingDone => {
                self.homing_in_flight = false;
                if !self.pick_in_flight {
                    self.state = MotionState::Idle;
                }
            }
            MotionEvent::TargetReached => {
                if !self.pick_in_flight {
                    self.state = MotionState::Idle;
                }
            }
        }

        (self.state != before).then_some(self.state)
    }

    /// Back to Idle with no markers
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
