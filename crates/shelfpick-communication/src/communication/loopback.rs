//! In-memory link for tests and simulation
//!
//! [`LoopbackConnector`] behaves like a serial port with a timeout: reads
//! block until inbound bytes are queued or the timeout elapses. Tests queue
//! inbound telemetry, inject faults, and inspect what was written. An
//! optional responder turns every written line into scripted replies, which
//! is how the simulated controller works.

use super::{Connector, Link, LinkParams};
use parking_lot::{Condvar, Mutex};
use shelfpick_core::ConnectionError;
use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::sync::Arc;
use std::time::Duration;

/// Maps one written line to the lines the controller answers with
pub type Responder = Box<dyn Fn(&str) -> Vec<String> + Send + Sync>;

enum Inbound {
    Bytes(Vec<u8>),
    Fault(String),
}

#[derive(Default)]
struct LoopbackState {
    inbound: VecDeque<Inbound>,
    written: Vec<u8>,
    pending_write: Vec<u8>,
    open_error: Option<String>,
    write_error: Option<String>,
    opens: usize,
    active_readers: usize,
    max_active_readers: usize,
}

struct Shared {
    state: Mutex<LoopbackState>,
    data_ready: Condvar,
    responder: Mutex<Option<Responder>>,
}

/// Connector backed by in-memory buffers
#[derive(Clone)]
pub struct LoopbackConnector {
    shared: Arc<Shared>,
}

impl LoopbackConnector {
    /// Create a connector with empty buffers
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(LoopbackState::default()),
                data_ready: Condvar::new(),
                responder: Mutex::new(None),
            }),
        }
    }

    /// Create a connector that answers written lines through `responder`
    pub fn with_responder(responder: Responder) -> Self {
        let connector = Self::new();
        *connector.shared.responder.lock() = Some(responder);
        connector
    }

    /// Queue raw inbound bytes
    pub fn feed(&self, bytes: &[u8]) {
        self.shared
            .state
            .lock()
            .inbound
            .push_back(Inbound::Bytes(bytes.to_vec()));
        self.shared.data_ready.notify_all();
    }

    /// Queue one inbound line (a newline is appended)
    pub fn feed_line(&self, line: &str) {
        self.feed(format!("{line}\n").as_bytes());
    }

    /// Make the next read fail with `message` once queued bytes are consumed
    pub fn inject_read_fault(&self, message: &str) {
        self.shared
            .state
            .lock()
            .inbound
            .push_back(Inbound::Fault(message.to_string()));
        self.shared.data_ready.notify_all();
    }

    /// Make the next `open` fail
    pub fn fail_next_open(&self, reason: &str) {
        self.shared.state.lock().open_error = Some(reason.to_string());
    }

    /// Make writes fail (`Some`) or succeed again (`None`)
    pub fn fail_writes(&self, reason: Option<&str>) {
        self.shared.state.lock().write_error = reason.map(str::to_string);
    }

    /// Everything written so far, decoded
    pub fn written(&self) -> String {
        String::from_utf8_lossy(&self.shared.state.lock().written).into_owned()
    }

    /// Complete lines written so far
    pub fn written_lines(&self) -> Vec<String> {
        self.written().lines().map(str::to_string).collect()
    }

    /// Number of successful opens
    pub fn open_count(&self) -> usize {
        self.shared.state.lock().opens
    }

    /// Number of read handles currently alive
    pub fn active_readers(&self) -> usize {
        self.shared.state.lock().active_readers
    }

    /// Highest number of read handles that were alive at the same time
    pub fn max_active_readers(&self) -> usize {
        self.shared.state.lock().max_active_readers
    }
}

impl Default for LoopbackConnector {
    fn default() -> Self {
        Self::new()
    }
}

impl Connector for LoopbackConnector {
    fn open(&self, params: &LinkParams) -> Result<Link, ConnectionError> {
        let mut state = self.shared.state.lock();
        if let Some(reason) = state.open_error.take() {
            return Err(ConnectionError::LinkOpenFailed {
                port: params.port.clone(),
                reason,
            });
        }

        state.opens += 1;
        state.active_readers += 1;
        state.max_active_readers = state.max_active_readers.max(state.active_readers);
        drop(state);

        Ok(Link {
            port: params.port.clone(),
            reader: Box::new(LoopbackReader {
                shared: self.shared.clone(),
                timeout: params.timeout(),
            }),
            writer: Box::new(LoopbackWriter {
                shared: self.shared.clone(),
            }),
        })
    }
}

struct LoopbackReader {
    shared: Arc<Shared>,
    timeout: Duration,
}

impl Read for LoopbackReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut state = self.shared.state.lock();
        if state.inbound.is_empty() {
            self.shared.data_ready.wait_for(&mut state, self.timeout);
        }

        match state.inbound.pop_front() {
            None => Err(io::ErrorKind::TimedOut.into()),
            Some(Inbound::Fault(message)) => Err(io::Error::other(message)),
            Some(Inbound::Bytes(mut bytes)) => {
                let n = bytes.len().min(buf.len());
                buf[..n].copy_from_slice(&bytes[..n]);
                if n < bytes.len() {
                    state.inbound.push_front(Inbound::Bytes(bytes.split_off(n)));
                }
                Ok(n)
            }
        }
    }
}

impl Drop for LoopbackReader {
    fn drop(&mut self) {
        self.shared.state.lock().active_readers -= 1;
    }
}

struct LoopbackWriter {
    shared: Arc<Shared>,
}

impl Write for LoopbackWriter {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        let completed: Vec<String> = {
            let mut state = self.shared.state.lock();
            if let Some(reason) = &state.write_error {
                return Err(io::Error::new(io::ErrorKind::TimedOut, reason.clone()));
            }
            state.written.extend_from_slice(data);
            state.pending_write.extend_from_slice(data);

            let mut lines = Vec::new();
            while let Some(pos) = state.pending_write.iter().position(|&b| b == b'\n') {
                let line: Vec<u8> = state.pending_write.drain(..=pos).collect();
                lines.push(String::from_utf8_lossy(&line).trim().to_string());
            }
            lines
        };

        if !completed.is_empty() {
            if let Some(responder) = self.shared.responder.lock().as_ref() {
                let mut state = self.shared.state.lock();
                for line in &completed {
                    for reply in responder(line) {
                        state
                            .inbound
                            .push_back(Inbound::Bytes(format!("{reply}\n").into_bytes()));
                    }
                }
                self.shared.data_ready.notify_all();
            }
        }

        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Responder that mimics the carriage firmware's telemetry
///
/// A pick reports start, arrival, pick completion, the return leg and the
/// end of homing; `HOME_X` reports a homing run; `STOP_X` is acknowledged.
pub fn simulated_controller() -> Responder {
    Box::new(|line: &str| {
        let upper = line.trim().to_uppercase();
        if let Some(arg) = upper.strip_prefix("PICK_X") {
            let x = arg.trim();
            vec![
                format!("PICK: START -> X{x}"),
                format!("Position X{x} reached"),
                "PICK: DONE".to_string(),
                "HOMING: START".to_string(),
                "HOMING: DONE".to_string(),
            ]
        } else if upper.starts_with("HOME_X") {
            vec!["HOMING: START".to_string(), "HOMING: DONE".to_string()]
        } else if upper.starts_with("STOP_X") {
            vec!["STOP CMD received".to_string()]
        } else {
            vec![format!("unknown command: {}", line.trim())]
        }
    })
}
