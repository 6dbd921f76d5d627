//! Scripted channel for protocol tests.
//!
//! Replies are queued up front; every write is recorded. Handles to the
//! write log and the drop counter stay valid after the mock is boxed and
//! moved into a client, so tests can assert on traffic and teardown.

use crate::channel::Channel;
use crate::constants::{ACK, NAK};
use std::collections::VecDeque;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub struct MockChannel {
    replies: VecDeque<Result<Vec<u8>, io::ErrorKind>>,
    written: Arc<Mutex<Vec<Vec<u8>>>>,
    releases: Arc<AtomicUsize>,
}

impl MockChannel {
    pub fn new() -> Self {
        Self {
            replies: VecDeque::new(),
            written: Arc::new(Mutex::new(Vec::new())),
            releases: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Handle on the recorded writes, one entry per `send` call.
    pub fn written_handle(&self) -> Arc<Mutex<Vec<Vec<u8>>>> {
        Arc::clone(&self.written)
    }

    /// Handle on the drop counter. Incremented once when the mock itself
    /// is dropped, which is how a client releases its channel.
    pub fn releases_handle(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.releases)
    }

    /// Queue one reply line (terminator already stripped).
    pub fn push_reply(&mut self, line: &[u8]) {
        self.replies.push_back(Ok(line.to_vec()));
    }

    /// Queue a read failure.
    pub fn push_error(&mut self, kind: io::ErrorKind) {
        self.replies.push_back(Err(kind));
    }

    pub fn push_ack(&mut self) {
        self.push_reply(&[ACK]);
    }

    pub fn push_nak(&mut self) {
        self.push_reply(&[NAK]);
    }

    /// Queue a full positive exchange: ACK, then `data` as the response
    /// line.
    pub fn push_exchange(&mut self, data: &str) {
        self.push_ack();
        self.push_reply(data.as_bytes());
    }

    /// Queue the four exchanges the client performs at construction:
    /// filter, calibration twice, display resolution.
    pub fn push_init_sequence(&mut self) {
        self.push_exchange("1,1");
        self.push_exchange("1.000,1.000");
        self.push_exchange("1.000,1.000");
        self.push_exchange("3");
    }
}

impl Channel for MockChannel {
    fn send(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.written.lock().unwrap().push(bytes.to_vec());
        Ok(())
    }

    fn read_line(&mut self) -> io::Result<Vec<u8>> {
        match self.replies.pop_front() {
            Some(Ok(line)) => Ok(line),
            Some(Err(kind)) => Err(io::Error::new(kind, "scripted failure")),
            None => Err(io::Error::new(
                io::ErrorKind::TimedOut,
                "mock script exhausted",
            )),
        }
    }
}

impl Drop for MockChannel {
    fn drop(&mut self) {
        self.releases.fetch_add(1, Ordering::SeqCst);
    }
}
