//! Link reader thread
//!
//! Owns the read handle of an open link, frames incoming bytes into lines and
//! forwards them over an unbounded, ordered channel. The thread stops when
//! its stop flag is raised (checked between reads, so latency is one read
//! timeout) or after a transport fault, which it reports as exactly one
//! `Err(LinkFault)` item.

use super::framing::LineFramer;
use shelfpick_core::LinkFault;
use std::io::{self, Read};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Item delivered by the reader: a line or the terminating fault
pub type LinkItem = Result<String, LinkFault>;

const READ_CHUNK: usize = 64;

// Sources that report "no data" as Ok(0) instead of a timeout would
// otherwise spin.
const EMPTY_READ_BACKOFF: Duration = Duration::from_millis(5);

const JOIN_POLL: Duration = Duration::from_millis(5);

/// Handle to a running reader thread
#[derive(Debug)]
pub struct LinkReader {
    stop: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

impl LinkReader {
    /// Start reading from `port` on a new thread
    pub fn spawn(port: Box<dyn Read + Send>, tx: Sender<LinkItem>) -> io::Result<Self> {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = stop.clone();

        let handle = thread::Builder::new()
            .name("link-reader".to_string())
            .spawn(move || read_loop(port, tx, stop_flag))?;

        Ok(Self { stop, handle })
    }

    /// Ask the thread to exit after its current read
    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::Release);
    }

    /// Check whether the thread has exited
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait up to `timeout` for the thread to exit
    ///
    /// Gives the handle back if the thread is still running when time is up.
    pub fn join_timeout(self, timeout: Duration) -> Result<(), LinkReader> {
        let deadline = Instant::now() + timeout;
        while !self.handle.is_finished() {
            if Instant::now() >= deadline {
                return Err(self);
            }
            thread::sleep(JOIN_POLL);
        }

        if self.handle.join().is_err() {
            tracing::error!("Link reader thread panicked");
        }
        Ok(())
    }

    /// Raise the stop flag and wait up to `timeout` for the thread to exit
    pub fn shutdown(self, timeout: Duration) -> Result<(), LinkReader> {
        self.request_stop();
        self.join_timeout(timeout)
    }
}

fn read_loop(mut port: Box<dyn Read + Send>, tx: Sender<LinkItem>, stop: Arc<AtomicBool>) {
    tracing::debug!("Link reader started");
    let mut framer = LineFramer::new();
    let mut buf = [0u8; READ_CHUNK];

    while !stop.load(Ordering::Acquire) {
        match port.read(&mut buf) {
            Ok(0) => thread::sleep(EMPTY_READ_BACKOFF),
            Ok(n) => {
                for line in framer.push(&buf[..n]) {
                    if tx.send(Ok(line)).is_err() {
                        tracing::debug!("Link channel closed, reader exiting");
                        return;
                    }
                }
            }
            Err(e) if is_idle_error(&e) => {}
            Err(e) => {
                tracing::error!("Link read failed: {}", e);
                let _ = tx.send(Err(LinkFault::new(e.to_string())));
                return;
            }
        }
    }

    tracing::debug!("Link reader stopped");
}

fn is_idle_error(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
    )
}
