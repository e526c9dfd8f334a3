//! transport::mock
//!
//! Scripted in-memory channel for deterministic testing.
//!
//! # Design
//!
//! The channel replays a queue of canned service responses and records
//! everything written to it. Replies can be delivered in small chunks to
//! exercise the framing read loop. Clones share state, so a test keeps one
//! handle for assertions while the code under test owns another.
//!
//! # Example
//!
//! ```
//! use gvfs_hooks::protocol::LockResponse;
//! use gvfs_hooks::transport::mock::ScriptedChannel;
//!
//! let channel = ScriptedChannel::new()
//!     .with_reply(LockResponse::DeniedByOtherCommand("git pull".into()))
//!     .with_reply(LockResponse::Accepted);
//!
//! assert_eq!(channel.pending_replies(), 2);
//! assert!(channel.requests().is_empty());
//! ```

use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use super::{Connect, TransportError};
use crate::protocol::{LockRequest, LockResponse, ProtocolError, TERMINATOR};

/// In-memory channel with scripted replies.
///
/// Thread-safe via internal `Arc<Mutex<...>>` wrapping.
#[derive(Debug, Clone, Default)]
pub struct ScriptedChannel {
    inner: Arc<Mutex<ScriptedInner>>,
}

#[derive(Debug, Default)]
struct ScriptedInner {
    /// Replies not yet started, terminator included.
    replies: VecDeque<Vec<u8>>,
    /// Remainder of the reply currently being read.
    current: VecDeque<u8>,
    /// Largest read returned at once; 0 means unlimited.
    chunk: usize,
    /// Everything the client wrote.
    written: Vec<u8>,
    /// Make [`Connect::connect`] fail.
    refuse: bool,
    /// Successful connects.
    connects: usize,
}

impl ScriptedChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response.
    pub fn with_reply(self, response: LockResponse) -> Self {
        self.with_raw_reply(&response.encode())
    }

    /// Queue raw response bytes; the terminator is appended.
    pub fn with_raw_reply(self, message: &[u8]) -> Self {
        {
            let mut inner = self.inner.lock().unwrap();
            let mut bytes = message.to_vec();
            bytes.push(TERMINATOR);
            inner.replies.push_back(bytes);
        }
        self
    }

    /// Deliver replies at most `chunk` bytes per read.
    pub fn with_chunk_size(self, chunk: usize) -> Self {
        self.inner.lock().unwrap().chunk = chunk;
        self
    }

    /// Make every connect attempt fail.
    pub fn refusing(self) -> Self {
        self.inner.lock().unwrap().refuse = true;
        self
    }

    /// Replies that have not been read yet.
    pub fn pending_replies(&self) -> usize {
        self.inner.lock().unwrap().replies.len()
    }

    pub fn connects(&self) -> usize {
        self.inner.lock().unwrap().connects
    }

    /// Raw bytes written by the client.
    pub fn written(&self) -> Vec<u8> {
        self.inner.lock().unwrap().written.clone()
    }

    /// Requests written by the client, decoded.
    pub fn requests(&self) -> Vec<Result<LockRequest, ProtocolError>> {
        let written = self.written();
        written
            .split(|&b| b == TERMINATOR)
            .filter(|message| !message.is_empty())
            .map(LockRequest::decode)
            .collect()
    }
}

impl Read for ScriptedChannel {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut inner = self.inner.lock().unwrap();
        if inner.current.is_empty() {
            match inner.replies.pop_front() {
                Some(next) => inner.current = next.into(),
                None => return Ok(0),
            }
        }

        let limit = match inner.chunk {
            0 => buf.len(),
            chunk => chunk.min(buf.len()),
        };
        let count = limit.min(inner.current.len());
        for (slot, byte) in buf.iter_mut().zip(inner.current.drain(..count)) {
            *slot = byte;
        }
        Ok(count)
    }
}

impl Write for ScriptedChannel {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.lock().unwrap().written.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Connect for ScriptedChannel {
    type Channel = ScriptedChannel;

    fn connect(&self) -> Result<Self::Channel, TransportError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.refuse {
            return Err(TransportError::ConnectFailed {
                path: PathBuf::from("scripted"),
                source: io::Error::new(io::ErrorKind::ConnectionRefused, "refused"),
            });
        }
        inner.connects += 1;
        Ok(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{read_message, write_message};

    #[test]
    fn replays_in_order() {
        let mut channel = ScriptedChannel::new()
            .with_reply(LockResponse::Available)
            .with_reply(LockResponse::Accepted);

        assert_eq!(read_message(&mut channel).unwrap(), b"LockAvailable");
        assert_eq!(read_message(&mut channel).unwrap(), b"LockAcquired");
        assert_eq!(channel.pending_replies(), 0);
    }

    #[test]
    fn chunked_delivery() {
        let mut channel = ScriptedChannel::new()
            .with_reply(LockResponse::ServiceUnmounting)
            .with_chunk_size(3);

        let mut buf = [0u8; 64];
        assert_eq!(channel.read(&mut buf).unwrap(), 3);
        assert_eq!(&buf[..3], b"Unm");
    }

    #[test]
    fn exhausted_script_reads_eof() {
        let mut channel = ScriptedChannel::new();
        let mut buf = [0u8; 8];
        assert_eq!(channel.read(&mut buf).unwrap(), 0);
    }

    #[test]
    fn records_requests() {
        let handle = ScriptedChannel::new();
        let mut channel = handle.connect().unwrap();
        let request = LockRequest::Release {
            pid: 7,
            is_elevated: false,
            command: "git checkout main".into(),
        };
        write_message(&mut channel, &request.encode()).unwrap();

        assert_eq!(handle.connects(), 1);
        assert_eq!(handle.requests(), vec![Ok(request)]);
    }

    #[test]
    fn refusing_connect() {
        let channel = ScriptedChannel::new().refusing();
        assert!(matches!(
            channel.connect(),
            Err(TransportError::ConnectFailed { .. })
        ));
    }
}
