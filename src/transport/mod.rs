//! transport
//!
//! Opens the duplex byte channel to the GVFS service.
//!
//! # Architecture
//!
//! The lock client only needs blocking `Read + Write`. [`Connect`] hides how
//! the channel is obtained so the orchestrator runs unchanged against the
//! real endpoint and against [`mock::ScriptedChannel`].
//!
//! - Unix: the endpoint is a unix-domain stream socket.
//! - Windows: the endpoint is a named pipe opened as a file.
//!
//! # Invariants
//!
//! - One channel per hook invocation, never shared.
//! - Connect failures are not retried here.

pub mod mock;

use std::io::{Read, Write};
use std::path::PathBuf;

use thiserror::Error;
use tracing::debug;

/// Errors from opening a channel.
#[derive(Debug, Error)]
pub enum TransportError {
    /// No endpoint could be determined for the working directory.
    #[error("'{0}' is not inside a GVFS enlistment")]
    NoEnlistment(PathBuf),

    /// The endpoint exists in configuration but could not be reached.
    #[error("Unable to connect to GVFS. Try running 'gvfs mount'")]
    ConnectFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// This platform has no supported transport.
    #[error("connecting to GVFS is not supported on this platform")]
    Unsupported,
}

/// Produces a connected channel.
pub trait Connect {
    type Channel: Read + Write;

    /// # Errors
    ///
    /// [`TransportError`] when no channel can be opened.
    fn connect(&self) -> Result<Self::Channel, TransportError>;
}

/// Connects to the service endpoint of an enlistment.
#[derive(Debug, Clone)]
pub struct PipeConnector {
    /// Endpoint, if one was found.
    path: Option<PathBuf>,
    /// Directory the hook ran in, for error messages.
    cwd: PathBuf,
}

impl PipeConnector {
    pub fn new(path: Option<PathBuf>, cwd: PathBuf) -> Self {
        Self { path, cwd }
    }
}

#[cfg(unix)]
impl Connect for PipeConnector {
    type Channel = std::os::unix::net::UnixStream;

    fn connect(&self) -> Result<Self::Channel, TransportError> {
        let path = self
            .path
            .as_ref()
            .ok_or_else(|| TransportError::NoEnlistment(self.cwd.clone()))?;
        debug!(path = %path.display(), "connecting to GVFS");

        std::os::unix::net::UnixStream::connect(path).map_err(|source| {
            TransportError::ConnectFailed {
                path: path.clone(),
                source,
            }
        })
    }
}

#[cfg(windows)]
impl Connect for PipeConnector {
    type Channel = std::fs::File;

    fn connect(&self) -> Result<Self::Channel, TransportError> {
        let path = self
            .path
            .as_ref()
            .ok_or_else(|| TransportError::NoEnlistment(self.cwd.clone()))?;
        debug!(path = %path.display(), "connecting to GVFS");

        std::fs::OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|source| TransportError::ConnectFailed {
                path: path.clone(),
                source,
            })
    }
}

#[cfg(not(any(unix, windows)))]
impl Connect for PipeConnector {
    type Channel = mock::ScriptedChannel;

    fn connect(&self) -> Result<Self::Channel, TransportError> {
        Err(TransportError::Unsupported)
    }
}
