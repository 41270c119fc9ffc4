//! Picker session
//!
//! The single owner of everything mutable on the control side: the open link
//! and its reader thread, the motion tracker, and the session log. All calls
//! happen on the caller's (UI) thread; the reader thread only ever talks to
//! the session through the line channel, which [`PickerSession::poll`] drains
//! without blocking.

use super::command_creator::{optimistic_event, CarriageCommand};
use super::motion::MotionTracker;
use super::telemetry::{MotionEvent, TelemetryClassifier};
use crate::communication::reader::{LinkItem, LinkReader};
use crate::communication::{
    Connector, LinkParams, DEFAULT_BAUD_RATE, DEFAULT_TIMEOUT_MS,
};
use shelfpick_core::{
    Catalog, ConnectionError, Location, LogDirection, MotionState, ResolveError, Result,
    SessionLog,
};
use std::io::Write;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::time::Duration;

/// Line settings and lifecycle limits for a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    /// Baud rate used for every connect
    pub baud_rate: u32,
    /// Read/write timeout in milliseconds
    pub timeout_ms: u64,
    /// How long disconnect waits for the reader thread
    pub reader_join_timeout_ms: u64,
}

impl SessionOptions {
    /// Link parameters for a port
    pub fn link_params(&self, port: &str) -> LinkParams {
        LinkParams::new(port)
            .with_baud_rate(self.baud_rate)
            .with_timeout_ms(self.timeout_ms)
    }

    fn reader_join_timeout(&self) -> Duration {
        Duration::from_millis(self.reader_join_timeout_ms)
    }
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            baud_rate: DEFAULT_BAUD_RATE,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            reader_join_timeout_ms: 1000,
        }
    }
}

struct ActiveLink {
    port: String,
    writer: Box<dyn Write + Send>,
    reader: LinkReader,
    rx: Receiver<LinkItem>,
    stale: bool,
}

/// Session controller and command dispatcher for one carriage
pub struct PickerSession {
    connector: Box<dyn Connector>,
    options: SessionOptions,
    catalog: Catalog,
    classifier: TelemetryClassifier,
    tracker: MotionTracker,
    link: Option<ActiveLink>,
    lingering_reader: Option<LinkReader>,
    log: SessionLog,
}

impl PickerSession {
    /// Create a disconnected session
    pub fn new(connector: Box<dyn Connector>, catalog: Catalog, options: SessionOptions) -> Self {
        Self {
            connector,
            options,
            catalog,
            classifier: TelemetryClassifier::new(),
            tracker: MotionTracker::new(),
            link: None,
            lingering_reader: None,
            log: SessionLog::new(),
        }
    }

    /// Open the link on `port` and start the reader thread
    pub fn connect(&mut self, port: &str) -> Result<()> {
        if let Some(active) = &self.link {
            return Err(ConnectionError::AlreadyConnected {
                port: active.port.clone(),
            }
            .into());
        }

        if let Some(reader) = self.lingering_reader.take() {
            if let Err(reader) = reader.join_timeout(Duration::ZERO) {
                self.lingering_reader = Some(reader);
                tracing::warn!("Refusing to connect: previous link reader still running");
                return Err(ConnectionError::ReaderStillRunning.into());
            }
        }

        let params = self.options.link_params(port);
        let link = match self.connector.open(&params) {
            Ok(link) => link,
            Err(e) => {
                self.log.push(LogDirection::Error, e.to_string());
                return Err(e.into());
            }
        };

        let (tx, rx) = mpsc::channel();
        let reader = match LinkReader::spawn(link.reader, tx) {
            Ok(reader) => reader,
            Err(e) => {
                let err = ConnectionError::LinkOpenFailed {
                    port: link.port,
                    reason: format!("could not start reader: {}", e),
                };
                self.log.push(LogDirection::Error, err.to_string());
                return Err(err.into());
            }
        };

        tracing::info!("Connected to {}", link.port);
        self.log
            .push(LogDirection::Info, format!("Connected: {}", link.port));
        self.link = Some(ActiveLink {
            port: link.port,
            writer: link.writer,
            reader,
            rx,
            stale: false,
        });
        Ok(())
    }

    /// Stop the reader, close the link and reset motion state to Idle
    ///
    /// Safe to call when not connected.
    pub fn disconnect(&mut self) {
        if let Some(ActiveLink {
            port,
            writer,
            reader,
            rx,
            ..
        }) = self.link.take()
        {
            if let Err(reader) = reader.shutdown(self.options.reader_join_timeout()) {
                tracing::warn!(
                    "Link reader for {} did not stop within {} ms",
                    port,
                    self.options.reader_join_timeout_ms
                );
                self.lingering_reader = Some(reader);
            }
            drop(rx);
            drop(writer);

            tracing::info!("Disconnected from {}", port);
            self.log.push(LogDirection::Info, "Disconnected");
        }

        self.tracker.reset();
    }

    /// Send one command line
    ///
    /// The motion state is updated from the command prefix before writing and
    /// is left as is if the write fails.
    pub fn send(&mut self, command: &str) -> Result<()> {
        let Some(active) = self.link.as_mut() else {
            tracing::warn!("Not connected, dropping command '{}'", command.trim());
            return Err(ConnectionError::NotConnected.into());
        };

        let line = command.trim();
        if let Some(event) = optimistic_event(line) {
            self.tracker.apply(event);
        }

        let written = active
            .writer
            .write_all(format!("{}\n", line).as_bytes())
            .and_then(|_| active.writer.flush());

        match written {
            Ok(()) => {
                tracing::debug!(">> {}", line);
                self.log.push(LogDirection::Outbound, line);
                Ok(())
            }
            Err(e) => {
                tracing::error!("Failed to send '{}' to {}: {}", line, active.port, e);
                let err = ConnectionError::TransportWriteFailed {
                    reason: e.to_string(),
                };
                self.log.push(LogDirection::Error, err.to_string());
                Err(err.into())
            }
        }
    }

    /// Resolve an article and send the carriage to it
    pub fn pick(&mut self, article: &str) -> Result<Location> {
        if !self.is_connected() {
            return Err(ConnectionError::NotConnected.into());
        }

        let location = self.catalog.resolve(article)?;
        self.log.push(
            LogDirection::Info,
            format!(
                "'{}' -> shelf {} ({} mm)",
                location.article, location.shelf, location.x_mm
            ),
        );
        self.send(&CarriageCommand::Pick { x_mm: location.x_mm }.to_line())?;
        Ok(location)
    }

    /// Run the homing cycle
    pub fn home(&mut self) -> Result<()> {
        self.send(&CarriageCommand::Home.to_line())
    }

    /// Stop the carriage
    ///
    /// The state becomes Stopped immediately, whether or not the command can
    /// be delivered.
    pub fn stop(&mut self) -> Result<()> {
        self.tracker.apply(MotionEvent::Stopped);
        self.send(&CarriageCommand::Stop.to_line())
    }

    /// Resolve an article without touching the link
    pub fn resolve(&self, article: &str) -> std::result::Result<Location, ResolveError> {
        self.catalog.resolve(article)
    }

    /// Drain every line the reader has delivered so far
    ///
    /// Never blocks. Returns the number of channel items handled.
    pub fn poll(&mut self) -> usize {
        let Some(active) = self.link.as_mut() else {
            return 0;
        };

        let mut handled = 0;
        loop {
            match active.rx.try_recv() {
                Ok(Ok(line)) => {
                    handled += 1;
                    tracing::debug!("<< {}", line);
                    self.log.push(LogDirection::Inbound, line.as_str());
                    if let Some(event) = self.classifier.classify(&line) {
                        if let Some(state) = self.tracker.apply(event) {
                            tracing::info!("Motion state -> {} ({})", state, event);
                        }
                    }
                }
                Ok(Err(fault)) => {
                    handled += 1;
                    tracing::error!("Link to {} is stale: {}", active.port, fault.detail);
                    self.log.push(LogDirection::Error, fault.to_string());
                    active.stale = true;
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if !active.stale {
                        tracing::error!("Link reader for {} exited unexpectedly", active.port);
                        self.log
                            .push(LogDirection::Error, "[LINK ERROR] reader stopped");
                        active.stale = true;
                    }
                    break;
                }
            }
        }
        handled
    }

    /// Current motion state
    pub fn motion_state(&self) -> MotionState {
        self.tracker.state()
    }

    /// Motion tracker including in-flight markers
    pub fn tracker(&self) -> &MotionTracker {
        &self.tracker
    }

    /// Check if a link is open
    pub fn is_connected(&self) -> bool {
        self.link.is_some()
    }

    /// Check if the open link's reader has died
    pub fn is_link_stale(&self) -> bool {
        self.link.as_ref().is_some_and(|l| l.stale)
    }

    /// Port of the open link
    pub fn port(&self) -> Option<&str> {
        self.link.as_ref().map(|l| l.port.as_str())
    }

    /// Session log
    pub fn log(&self) -> &SessionLog {
        &self.log
    }

    /// Catalog used for resolution
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }
}

impl Drop for PickerSession {
    fn drop(&mut self) {
        if self.link.is_some() {
            self.disconnect();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::communication::loopback::LoopbackConnector;
    use shelfpick_core::{standard_catalog, Error};
    use std::time::Instant;

    fn session() -> (PickerSession, LoopbackConnector) {
        let connector = LoopbackConnector::new();
        let options = SessionOptions {
            timeout_ms: 10,
            ..Default::default()
        };
        let session =
            PickerSession::new(Box::new(connector.clone()), standard_catalog(), options);
        (session, connector)
    }

    fn poll_until(session: &mut PickerSession, mut done: impl FnMut(&PickerSession) -> bool) {
        let deadline = Instant::now() + Duration::from_secs(2);
        while !done(session) {
            assert!(Instant::now() < deadline, "condition not reached in time");
            session.poll();
            std::thread::sleep(Duration::from_millis(2));
        }
    }

    #[test]
    fn test_send_requires_connection() {
        let (mut session, connector) = session();
        let err = session.send("HOME_X").unwrap_err();
        assert!(err.is_not_connected());
        assert_eq!(session.motion_state(), MotionState::Idle);
        assert!(connector.written().is_empty());
    }

    #[test]
    fn test_pick_writes_coordinate_and_sets_picking() {
        let (mut session, connector) = session();
        session.connect("loop0").unwrap();

        let location = session.pick("m6x30").unwrap();
        assert_eq!(location.shelf, 3);
        assert_eq!(connector.written_lines(), vec!["PICK_X 120.0"]);
        assert_eq!(session.motion_state(), MotionState::Picking);
        assert!(session.tracker().pick_in_flight());
    }

    #[test]
    fn test_pick_unknown_never_writes() {
        let (mut session, connector) = session();
        session.connect("loop0").unwrap();

        let err = session.pick("unknown-item").unwrap_err();
        assert!(matches!(
            err,
            Error::Resolve(ResolveError::NotFound { .. })
        ));
        assert!(connector.written().is_empty());
        assert_eq!(session.motion_state(), MotionState::Idle);
    }

    #[test]
    fn test_stop_without_link_still_stops() {
        let (mut session, _connector) = session();
        assert!(session.stop().unwrap_err().is_not_connected());
        assert_eq!(session.motion_state(), MotionState::Stopped);
    }

    #[test]
    fn test_write_failure_keeps_optimistic_state() {
        let (mut session, connector) = session();
        session.connect("loop0").unwrap();
        connector.fail_writes(Some("write timed out"));

        let err = session.home().unwrap_err();
        assert!(matches!(
            err,
            Error::Connection(ConnectionError::TransportWriteFailed { .. })
        ));
        assert!(session.is_connected());
        assert_eq!(session.motion_state(), MotionState::Homing);
        assert_eq!(
            session.log().last().map(|e| e.direction),
            Some(LogDirection::Error)
        );
    }

    #[test]
    fn test_inbound_lines_drive_state() {
        let (mut session, connector) = session();
        session.connect("loop0").unwrap();
        session.pick("M8x20").unwrap();

        connector.feed_line("PICK: START");
        connector.feed_line("PICK: DONE");
        poll_until(&mut session, |s| !s.tracker().pick_in_flight());
        assert_eq!(session.motion_state(), MotionState::Picking);

        connector.feed_line("HOMING: DONE");
        poll_until(&mut session, |s| s.motion_state() == MotionState::Idle);
    }

    #[test]
    fn test_read_fault_marks_link_stale() {
        let (mut session, connector) = session();
        session.connect("loop0").unwrap();
        connector.inject_read_fault("device reports an error");

        poll_until(&mut session, |s| s.is_link_stale());
        assert!(session.is_connected());
        let errors: Vec<_> = session
            .log()
            .iter()
            .filter(|e| e.direction == LogDirection::Error)
            .map(|e| e.text.clone())
            .collect();
        assert_eq!(errors, vec!["[LINK ERROR] device reports an error"]);

        session.disconnect();
        assert!(!session.is_link_stale());
    }

    #[test]
    fn test_connect_twice_is_rejected() {
        let (mut session, connector) = session();
        session.connect("loop0").unwrap();
        let err = session.connect("loop1").unwrap_err();
        assert!(matches!(
            err,
            Error::Connection(ConnectionError::AlreadyConnected { .. })
        ));
        assert_eq!(connector.open_count(), 1);
        assert_eq!(session.port(), Some("loop0"));
    }

    #[test]
    fn test_disconnect_resets_and_is_idempotent() {
        let (mut session, connector) = session();
        session.connect("loop0").unwrap();
        session.home().unwrap();
        assert_eq!(session.motion_state(), MotionState::Homing);

        session.disconnect();
        assert!(!session.is_connected());
        assert_eq!(session.motion_state(), MotionState::Idle);
        assert_eq!(connector.active_readers(), 0);

        let logged = session.log().len();
        session.disconnect();
        assert_eq!(session.log().len(), logged);
        assert_eq!(session.motion_state(), MotionState::Idle);
    }

    #[test]
    fn test_slow_reader_blocks_reconnect_until_it_exits() {
        let connector = LoopbackConnector::new();
        let options = SessionOptions {
            timeout_ms: 400,
            reader_join_timeout_ms: 20,
            ..Default::default()
        };
        let mut session =
            PickerSession::new(Box::new(connector.clone()), standard_catalog(), options);
        session.connect("loop0").unwrap();

        session.disconnect();
        assert!(!session.is_connected());
        assert_eq!(connector.active_readers(), 1);

        let err = session.connect("loop0").unwrap_err();
        assert!(matches!(
            err,
            Error::Connection(ConnectionError::ReaderStillRunning)
        ));
        assert_eq!(connector.open_count(), 1);

        let deadline = Instant::now() + Duration::from_secs(3);
        loop {
            match session.connect("loop0") {
                Ok(()) => break,
                Err(Error::Connection(ConnectionError::ReaderStillRunning)) => {
                    assert!(Instant::now() < deadline, "old reader never exited");
                    std::thread::sleep(Duration::from_millis(20));
                }
                Err(e) => panic!("unexpected error: {e}"),
            }
        }
        assert!(session.is_connected());
        assert_eq!(connector.open_count(), 2);
        assert_eq!(connector.max_active_readers(), 1);
    }

    #[test]
    fn test_failed_connect_leaves_session_closed() {
        let (mut session, connector) = session();
        connector.fail_next_open("Permission denied");
        let err = session.connect("loop0").unwrap_err();
        assert!(matches!(
            err,
            Error::Connection(ConnectionError::LinkOpenFailed { .. })
        ));
        assert!(!session.is_connected());
        assert_eq!(connector.active_readers(), 0);
    }
}
