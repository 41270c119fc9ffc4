//! Carriage firmware protocol
//!
//! Command lines the carriage understands, the telemetry it reports, and the
//! session that ties both to an open link.

pub mod command_creator;
pub mod motion;
pub mod session;
pub mod telemetry;

pub use command_creator::{optimistic_event, CarriageCommand};
pub use motion::MotionTracker;
pub use session::{PickerSession, SessionOptions};
pub use telemetry::{MotionEvent, TelemetryClassifier, TelemetryRule, TELEMETRY_RULES};
