//! protocol::messages
//!
//! Lock requests and responses, and their wire encodings.
//!
//! # Requests
//!
//! ```text
//! AcquireLock|<pid>|<isElevated>|<checkAvailabilityOnly>|<len>|<command>|<len>|<sessionId>
//! ReleaseLock|<pid>|<isElevated>|false|<len>|<command>|0|
//! ```
//!
//! # Responses
//!
//! | Header              | Body                                           |
//! |---------------------|------------------------------------------------|
//! | `LockAcquired`      | none, or release data (Release only)           |
//! | `LockAvailable`     | none                                           |
//! | `LockDeniedGVFS`    | one sub-field: the service's message           |
//! | `LockDeniedGit`     | one sub-field: the holder's lock data          |
//! | `MountNotReady`     | none                                           |
//! | `UnmountInProgress` | none                                           |
//!
//! Release data follows the header directly:
//!
//! ```text
//! LockAcquired|<failedUpdateCount>|<failedDeleteCount>|<update paths>|<delete paths>
//! ```
//!
//! Each path list is joined by the delimiter; an empty list is a single
//! empty field. Release data wrapped in one length-prefixed sub-field is
//! also accepted.

use super::codec::{
    decode_message, field_str, format_bool, lossy, parse_bool, push_field, push_sub_field,
    split_once, split_sub_fields, FieldError, DELIMITER,
};
use super::ProtocolError;

/// Message headers.
pub mod header {
    pub const ACQUIRE_LOCK: &str = "AcquireLock";
    pub const RELEASE_LOCK: &str = "ReleaseLock";
    pub const LOCK_ACQUIRED: &str = "LockAcquired";
    pub const LOCK_AVAILABLE: &str = "LockAvailable";
    pub const DENIED_BY_SERVICE: &str = "LockDeniedGVFS";
    pub const DENIED_BY_GIT: &str = "LockDeniedGit";
    pub const MOUNT_NOT_READY: &str = "MountNotReady";
    pub const UNMOUNT_IN_PROGRESS: &str = "UnmountInProgress";
}

/// The per-process lock data carried by requests and by `LockDeniedGit`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockData {
    /// Pid of the git process that triggered the hook.
    pub pid: u32,
    pub is_elevated: bool,
    pub check_availability_only: bool,
    /// Reconstructed git command line.
    pub command: String,
    /// Opaque correlation id, may be empty.
    pub session_id: String,
}

impl LockData {
    fn encode_into(&self, buf: &mut Vec<u8>) {
        push_field(buf, &self.pid.to_string());
        push_field(buf, format_bool(self.is_elevated));
        push_field(buf, format_bool(self.check_availability_only));
        push_sub_field(buf, self.command.as_bytes());
        buf.push(DELIMITER);
        push_sub_field(buf, self.session_id.as_bytes());
    }

    fn decode(bytes: &[u8]) -> Result<Self, FieldError> {
        let (pid, rest) = split_once(bytes).ok_or(FieldError::MissingField("pid"))?;
        let (elevated, rest) = split_once(rest).ok_or(FieldError::MissingField("isElevated"))?;
        let (availability_only, rest) =
            split_once(rest).ok_or(FieldError::MissingField("checkAvailabilityOnly"))?;

        let pid_text = field_str(pid)?;
        let pid = pid_text.parse().map_err(|_| FieldError::InvalidValue {
            name: "pid",
            value: pid_text.to_string(),
        })?;

        let fields = split_sub_fields(rest)?;
        let [command, session_id] = fields.as_slice() else {
            return Err(FieldError::FieldCount {
                expected: 2,
                found: fields.len(),
            });
        };

        Ok(Self {
            pid,
            is_elevated: parse_bool("isElevated", elevated)?,
            check_availability_only: parse_bool("checkAvailabilityOnly", availability_only)?,
            command: field_str(command)?.to_string(),
            session_id: field_str(session_id)?.to_string(),
        })
    }
}

/// A request sent from a hook to the service.
///
/// Constructed once per hook invocation and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LockRequest {
    Acquire {
        pid: u32,
        is_elevated: bool,
        check_availability_only: bool,
        command: String,
        session_id: String,
    },
    Release {
        pid: u32,
        is_elevated: bool,
        command: String,
    },
}

impl LockRequest {
    /// Wire header for this request.
    pub fn header(&self) -> &'static str {
        match self {
            LockRequest::Acquire { .. } => header::ACQUIRE_LOCK,
            LockRequest::Release { .. } => header::RELEASE_LOCK,
        }
    }

    pub fn pid(&self) -> u32 {
        match self {
            LockRequest::Acquire { pid, .. } | LockRequest::Release { pid, .. } => *pid,
        }
    }

    pub fn command(&self) -> &str {
        match self {
            LockRequest::Acquire { command, .. } | LockRequest::Release { command, .. } => command,
        }
    }

    /// True for an Acquire that only asks whether the lock is free.
    pub fn is_availability_check(&self) -> bool {
        matches!(
            self,
            LockRequest::Acquire {
                check_availability_only: true,
                ..
            }
        )
    }

    fn lock_data(&self) -> LockData {
        match self {
            LockRequest::Acquire {
                pid,
                is_elevated,
                check_availability_only,
                command,
                session_id,
            } => LockData {
                pid: *pid,
                is_elevated: *is_elevated,
                check_availability_only: *check_availability_only,
                command: command.clone(),
                session_id: session_id.clone(),
            },
            LockRequest::Release {
                pid,
                is_elevated,
                command,
            } => LockData {
                pid: *pid,
                is_elevated: *is_elevated,
                check_availability_only: false,
                command: command.clone(),
                session_id: String::new(),
            },
        }
    }

    /// Encode without the terminator.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        push_field(&mut buf, self.header());
        self.lock_data().encode_into(&mut buf);
        buf
    }

    /// Decode a request (terminator already stripped).
    pub fn decode(message: &[u8]) -> Result<Self, ProtocolError> {
        let unrecognized = |reason| ProtocolError::UnrecognizedRequest {
            message: lossy(message),
            reason,
        };

        let raw = decode_message(message).map_err(unrecognized)?;
        let body = raw
            .body
            .ok_or(FieldError::MissingField("pid"))
            .map_err(unrecognized)?;

        match raw.header {
            header::ACQUIRE_LOCK => {
                let data = LockData::decode(body).map_err(unrecognized)?;
                Ok(LockRequest::Acquire {
                    pid: data.pid,
                    is_elevated: data.is_elevated,
                    check_availability_only: data.check_availability_only,
                    command: data.command,
                    session_id: data.session_id,
                })
            }
            header::RELEASE_LOCK => {
                let data = LockData::decode(body).map_err(unrecognized)?;
                Ok(LockRequest::Release {
                    pid: data.pid,
                    is_elevated: data.is_elevated,
                    command: data.command,
                })
            }
            other => Err(unrecognized(FieldError::UnknownHeader(other.to_string()))),
        }
    }
}

/// Placeholder reconciliation failures reported by a Release.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReleaseOutcome {
    pub failed_update_count: usize,
    pub failed_delete_count: usize,
    pub failed_update_paths: Vec<String>,
    pub failed_delete_paths: Vec<String>,
}

impl ReleaseOutcome {
    /// Total number of files the service could not reconcile.
    pub fn failure_count(&self) -> usize {
        self.failed_update_count + self.failed_delete_count
    }

    pub fn has_failures(&self) -> bool {
        self.failure_count() > 0
    }

    fn encode(&self) -> Vec<u8> {
        format!(
            "{}|{}|{}|{}",
            self.failed_update_count,
            self.failed_delete_count,
            self.failed_update_paths.join("|"),
            self.failed_delete_paths.join("|"),
        )
        .into_bytes()
    }

    fn decode(bytes: &[u8]) -> Result<Self, FieldError> {
        let text = field_str(bytes)?;
        let mut tokens = text.split('|');

        let failed_update_count = parse_count("failedUpdateCount", tokens.next())?;
        let failed_delete_count = parse_count("failedDeleteCount", tokens.next())?;
        let failed_update_paths = take_paths(&mut tokens, failed_update_count)?;
        let failed_delete_paths = take_paths(&mut tokens, failed_delete_count)?;

        if tokens.next().is_some() {
            return Err(FieldError::InvalidValue {
                name: "release data",
                value: text.to_string(),
            });
        }

        Ok(Self {
            failed_update_count,
            failed_delete_count,
            failed_update_paths,
            failed_delete_paths,
        })
    }
}

fn parse_count(name: &'static str, token: Option<&str>) -> Result<usize, FieldError> {
    let token = token.ok_or(FieldError::MissingField(name))?;
    token.parse().map_err(|_| FieldError::InvalidValue {
        name,
        value: token.to_string(),
    })
}

/// Take `count` paths; an empty list occupies one empty token (or none at the end).
fn take_paths<'a>(
    tokens: &mut impl Iterator<Item = &'a str>,
    count: usize,
) -> Result<Vec<String>, FieldError> {
    if count == 0 {
        return match tokens.next() {
            None | Some("") => Ok(Vec::new()),
            Some(other) => Err(FieldError::InvalidValue {
                name: "empty path list",
                value: other.to_string(),
            }),
        };
    }

    (0..count)
        .map(|_| {
            tokens
                .next()
                .map(str::to_string)
                .ok_or(FieldError::MissingField("path"))
        })
        .collect()
}

/// A response from the service, produced once per round-trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LockResponse {
    /// Acquire: the lock is now held. Release: processed with no failures.
    Accepted,
    /// The lock is free (availability checks only).
    Available,
    /// The service itself is using the lock.
    DeniedByService(String),
    /// Another git command holds the lock; carries its command line.
    DeniedByOtherCommand(String),
    /// The service has not finished initializing.
    ServiceNotReady,
    /// The service is shutting down.
    ServiceUnmounting,
    /// Release processed; reports placeholder reconciliation failures.
    ReleaseOutcome(ReleaseOutcome),
}

impl LockResponse {
    /// Denials are retried by the lock client.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            LockResponse::DeniedByService(_) | LockResponse::DeniedByOtherCommand(_)
        )
    }

    /// Terminal responses stop the retry loop without granting anything.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            LockResponse::ServiceNotReady | LockResponse::ServiceUnmounting
        )
    }

    /// Short name used in diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            LockResponse::Accepted | LockResponse::ReleaseOutcome(_) => header::LOCK_ACQUIRED,
            LockResponse::Available => header::LOCK_AVAILABLE,
            LockResponse::DeniedByService(_) => header::DENIED_BY_SERVICE,
            LockResponse::DeniedByOtherCommand(_) => header::DENIED_BY_GIT,
            LockResponse::ServiceNotReady => header::MOUNT_NOT_READY,
            LockResponse::ServiceUnmounting => header::UNMOUNT_IN_PROGRESS,
        }
    }

    /// Encode without the terminator.
    ///
    /// `DeniedByOtherCommand` only carries the holder's command, so the
    /// holder's remaining lock data is written with neutral values.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = self.name().as_bytes().to_vec();
        if let LockResponse::ReleaseOutcome(outcome) = self {
            buf.push(DELIMITER);
            buf.extend_from_slice(&outcome.encode());
            return buf;
        }

        let body = match self {
            LockResponse::DeniedByService(message) => Some(message.as_bytes().to_vec()),
            LockResponse::DeniedByOtherCommand(command) => {
                let mut data = Vec::new();
                LockData {
                    pid: 0,
                    is_elevated: false,
                    check_availability_only: false,
                    command: command.clone(),
                    session_id: String::new(),
                }
                .encode_into(&mut data);
                Some(data)
            }
            _ => None,
        };

        if let Some(body) = body {
            buf.push(DELIMITER);
            push_sub_field(&mut buf, &body);
        }
        buf
    }

    /// Decode a response (terminator already stripped).
    ///
    /// Any malformed message is a single [`ProtocolError`] carrying the raw
    /// text, never a panic.
    pub fn decode(message: &[u8]) -> Result<Self, ProtocolError> {
        Self::decode_fields(message).map_err(|reason| ProtocolError::UnrecognizedResponse {
            message: lossy(message),
            reason,
        })
    }

    fn decode_fields(message: &[u8]) -> Result<Self, FieldError> {
        let raw = decode_message(message)?;
        if raw.header == header::LOCK_ACQUIRED {
            return match raw.body {
                None | Some(b"") => Ok(LockResponse::Accepted),
                Some(body) => decode_release_body(body).map(LockResponse::ReleaseOutcome),
            };
        }

        let fields = match raw.body {
            Some(body) => split_sub_fields(body)?,
            None => Vec::new(),
        };

        match raw.header {
            header::LOCK_AVAILABLE => no_body(header::LOCK_AVAILABLE, &fields)
                .map(|()| LockResponse::Available),
            header::DENIED_BY_SERVICE => match fields.as_slice() {
                [] => Ok(LockResponse::DeniedByService(String::new())),
                [reason] => Ok(LockResponse::DeniedByService(field_str(reason)?.to_string())),
                _ => Err(FieldError::FieldCount {
                    expected: 1,
                    found: fields.len(),
                }),
            },
            header::DENIED_BY_GIT => match fields.as_slice() {
                [holder] => Ok(LockResponse::DeniedByOtherCommand(
                    LockData::decode(holder)?.command,
                )),
                _ => Err(FieldError::FieldCount {
                    expected: 1,
                    found: fields.len(),
                }),
            },
            header::MOUNT_NOT_READY => no_body(header::MOUNT_NOT_READY, &fields)
                .map(|()| LockResponse::ServiceNotReady),
            header::UNMOUNT_IN_PROGRESS => no_body(header::UNMOUNT_IN_PROGRESS, &fields)
                .map(|()| LockResponse::ServiceUnmounting),
            other => Err(FieldError::UnknownHeader(other.to_string())),
        }
    }
}

/// Release data as sent by the service, or wrapped in a single sub-field.
fn decode_release_body(body: &[u8]) -> Result<ReleaseOutcome, FieldError> {
    ReleaseOutcome::decode(body).or_else(|direct| match split_sub_fields(body).as_deref() {
        Ok([wrapped]) => ReleaseOutcome::decode(wrapped).map_err(|_| direct),
        _ => Err(direct),
    })
}

fn no_body(header: &'static str, fields: &[&[u8]]) -> Result<(), FieldError> {
    if fields.is_empty() {
        Ok(())
    } else {
        Err(FieldError::UnexpectedBody(header))
    }
}
