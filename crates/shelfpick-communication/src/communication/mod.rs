//! Link layer for talking to the carriage controller
//!
//! A [`Connector`] opens a [`Link`]: two independent handles to the same
//! byte stream, one for the reader thread and one for the dispatcher.
//! Implementations:
//! - [`serial::SerialConnector`] for real hardware
//! - [`loopback::LoopbackConnector`] for tests and simulation

pub mod framing;
pub mod loopback;
pub mod reader;
pub mod serial;

use shelfpick_core::ConnectionError;
use std::io::{Read, Write};
use std::time::Duration;

/// Default baud rate of the carriage controller
pub const DEFAULT_BAUD_RATE: u32 = 250_000;

/// Default read/write timeout in milliseconds
pub const DEFAULT_TIMEOUT_MS: u64 = 100;

/// Parameters used to open a link
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkParams {
    /// Port name (e.g., "/dev/ttyACM0", "COM3")
    pub port: String,
    /// Baud rate (8N1 framing is fixed)
    pub baud_rate: u32,
    /// Read and write timeout in milliseconds
    pub timeout_ms: u64,
}

impl LinkParams {
    /// Create parameters for a port with default line settings
    pub fn new(port: impl Into<String>) -> Self {
        Self {
            port: port.into(),
            ..Default::default()
        }
    }

    /// Set baud rate
    pub fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    /// Set timeout
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Timeout as a duration
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for LinkParams {
    fn default() -> Self {
        Self {
            port: String::new(),
            baud_rate: DEFAULT_BAUD_RATE,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

/// An open link
///
/// `reader` goes to the link reader thread, `writer` stays with the session.
/// Both must refer to the same underlying connection and must be usable
/// concurrently.
pub struct Link {
    /// Port the link was opened on
    pub port: String,
    /// Read handle; reads block for at most the configured timeout
    pub reader: Box<dyn Read + Send>,
    /// Write handle
    pub writer: Box<dyn Write + Send>,
}

impl std::fmt::Debug for Link {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Link").field("port", &self.port).finish()
    }
}

/// Something that can open links
pub trait Connector: Send {
    /// Open a link; on failure nothing stays open
    fn open(&self, params: &LinkParams) -> Result<Link, ConnectionError>;
}
