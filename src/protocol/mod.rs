//! protocol
//!
//! The lock-coordination wire protocol spoken between a hook and the GVFS
//! service.
//!
//! # Modules
//!
//! - [`codec`] - ETX framing, header split, length-prefixed sub-fields
//! - [`messages`] - [`LockRequest`], [`LockResponse`], [`ReleaseOutcome`]
//!
//! # Design
//!
//! The service is long-running and evolves independently of the hooks, so
//! decoding is defensive: every malformed message becomes one
//! [`ProtocolError`] carrying the raw text, and nothing in this module
//! panics on peer input.

pub mod codec;
pub mod messages;

pub use codec::{read_message, write_message, FieldError, DELIMITER, TERMINATOR};
pub use messages::{header, LockData, LockRequest, LockResponse, ReleaseOutcome};

use thiserror::Error;

/// A message that does not match the protocol.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// The service sent something this hook cannot interpret.
    #[error("unrecognized response from GVFS: '{message}' ({reason})")]
    UnrecognizedResponse {
        /// The raw message, terminator stripped.
        message: String,
        #[source]
        reason: FieldError,
    },

    /// A request failed to decode.
    #[error("unrecognized request: '{message}' ({reason})")]
    UnrecognizedRequest {
        /// The raw message, terminator stripped.
        message: String,
        #[source]
        reason: FieldError,
    },
}
