//! # Shelfpick Communication
//!
//! Serial link and carriage protocol for the shelf-picking carriage.
//! Opens the link, runs the background reader, dispatches commands and
//! tracks the carriage's motion state from its telemetry.

pub mod communication;
pub mod firmware;

pub use communication::{
    loopback::{simulated_controller, LoopbackConnector, Responder},
    reader::{LinkItem, LinkReader},
    serial::{list_ports, SerialConnector, SerialPortInfo},
    Connector, Link, LinkParams, DEFAULT_BAUD_RATE, DEFAULT_TIMEOUT_MS,
};

pub use firmware::{
    CarriageCommand, MotionEvent, MotionTracker, PickerSession, SessionOptions,
    TelemetryClassifier,
};
