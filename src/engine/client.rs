//! engine::client
//!
//! Drives Acquire and Release exchanges over a connected channel.
//!
//! # Acquire
//!
//! ```text
//! send Acquire -> read response
//!   Accepted / Available  -> must match the request mode, else protocol error
//!   NotReady / Unmounting -> returned to the caller, no retry
//!   DeniedBy*             -> sleep, resend the same request, repeat
//! ```
//!
//! Ordering among competing hooks is decided by the service; the client
//! only knows "granted" or "denied, retry". Channel failures end the loop
//! immediately.
//!
//! # Release
//!
//! A single round-trip. The service never contends on Release.

use std::io::{self, Read, Write};
use std::thread;
use std::time::Duration;

use thiserror::Error;
use tracing::debug;

use crate::core::config::{Config, DEFAULT_RETRY_INTERVAL};
use crate::protocol::{
    header, read_message, write_message, LockRequest, LockResponse, ProtocolError,
};
use crate::ui::progress::Progress;

/// Errors from a lock exchange.
#[derive(Debug, Error)]
pub enum LockClientError {
    #[error("failed to communicate with GVFS: {0}")]
    Channel(#[from] io::Error),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A well-formed response that is wrong for the request sent.
    #[error("unexpected response '{response}' to '{request}'")]
    UnexpectedResponse {
        request: &'static str,
        response: &'static str,
    },

    #[error("gave up after {attempts} attempts: {reason}")]
    RetriesExhausted { attempts: u32, reason: String },
}

/// How long to keep asking while the lock is held elsewhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Delay between attempts.
    pub interval: Duration,
    /// Total attempts including the first; `None` retries until the service
    /// grants or refuses.
    pub max_attempts: Option<u32>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            interval: DEFAULT_RETRY_INTERVAL,
            max_attempts: None,
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            interval: config.retry_interval(),
            max_attempts: config.max_attempts(),
        }
    }

    fn allows(&self, attempts: u32) -> bool {
        self.max_attempts.map_or(true, |max| attempts < max)
    }
}

/// Human-readable reason for waiting on a denial.
pub fn wait_reason(response: &LockResponse) -> Option<String> {
    match response {
        LockResponse::DeniedByOtherCommand(holder) => {
            Some(format!("Waiting for '{holder}' to release the lock"))
        }
        LockResponse::DeniedByService(message) if message.is_empty() => {
            Some("Waiting for GVFS to release the lock".to_string())
        }
        LockResponse::DeniedByService(message) => Some(format!(
            "Waiting for GVFS to release the lock: {message}"
        )),
        _ => None,
    }
}

/// Lock client bound to one channel.
#[derive(Debug)]
pub struct LockClient<C> {
    channel: C,
    policy: RetryPolicy,
}

impl<C: Read + Write> LockClient<C> {
    pub fn new(channel: C, policy: RetryPolicy) -> Self {
        Self { channel, policy }
    }

    fn round_trip(&mut self, request: &LockRequest) -> Result<LockResponse, LockClientError> {
        write_message(&mut self.channel, &request.encode())?;
        let reply = read_message(&mut self.channel)?;
        let response = LockResponse::decode(&reply)?;
        debug!(
            request = request.header(),
            response = response.name(),
            "lock round-trip"
        );
        Ok(response)
    }

    /// Acquire the lock, or check its availability.
    ///
    /// Returns the first non-denial response: `Accepted` or `Available`
    /// matching the request mode, or a terminal `ServiceNotReady` /
    /// `ServiceUnmounting`. `progress` is told about every retry and
    /// finished exactly once.
    ///
    /// # Errors
    ///
    /// - [`LockClientError::Channel`] on any read or write failure
    /// - [`LockClientError::Protocol`] for an undecodable response
    /// - [`LockClientError::UnexpectedResponse`] for a grant that does not
    ///   match the request mode, or a Release-only response
    /// - [`LockClientError::RetriesExhausted`] when the policy's attempt cap
    ///   is reached
    pub fn acquire(
        &mut self,
        request: &LockRequest,
        progress: &mut dyn Progress,
    ) -> Result<LockResponse, LockClientError> {
        let result = self.acquire_with_retry(request, progress);
        progress.finish(matches!(
            result,
            Ok(LockResponse::Accepted | LockResponse::Available)
        ));
        result
    }

    fn acquire_with_retry(
        &mut self,
        request: &LockRequest,
        progress: &mut dyn Progress,
    ) -> Result<LockResponse, LockClientError> {
        let availability_only = request.is_availability_check();
        let mut attempts = 1;
        let mut reason: Option<String> = None;
        let mut response = self.round_trip(request)?;

        loop {
            match response {
                LockResponse::Accepted if !availability_only => return Ok(response),
                LockResponse::Available if availability_only => return Ok(response),
                _ if response.is_terminal() => return Ok(response),
                ref denied if denied.is_retryable() => {
                    let reason = reason.get_or_insert_with(|| {
                        wait_reason(denied).unwrap_or_default()
                    });
                    if !self.policy.allows(attempts) {
                        return Err(LockClientError::RetriesExhausted {
                            attempts,
                            reason: reason.clone(),
                        });
                    }

                    debug!(attempts, response = denied.name(), "lock busy, retrying");
                    progress.waiting(reason);
                    thread::sleep(self.policy.interval);
                    attempts += 1;
                    response = self.round_trip(request)?;
                }
                other => {
                    return Err(LockClientError::UnexpectedResponse {
                        request: request.header(),
                        response: other.name(),
                    })
                }
            }
        }
    }

    /// Release the lock. No retry.
    ///
    /// Returns `Accepted` or `ReleaseOutcome`.
    ///
    /// # Errors
    ///
    /// Channel and protocol failures as for [`LockClient::acquire`]; any
    /// other response is [`LockClientError::UnexpectedResponse`].
    pub fn release(&mut self, request: &LockRequest) -> Result<LockResponse, LockClientError> {
        match self.round_trip(request)? {
            response @ (LockResponse::Accepted | LockResponse::ReleaseOutcome(_)) => Ok(response),
            other => Err(LockClientError::UnexpectedResponse {
                request: header::RELEASE_LOCK,
                response: other.name(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::ReleaseOutcome;
    use crate::transport::mock::ScriptedChannel;
    use crate::ui::progress::NoProgress;

    fn fast() -> RetryPolicy {
        RetryPolicy {
            interval: Duration::from_millis(1),
            max_attempts: None,
        }
    }

    fn acquire_request(availability_only: bool) -> LockRequest {
        LockRequest::Acquire {
            pid: 1234,
            is_elevated: false,
            check_availability_only: availability_only,
            command: "git checkout main".into(),
            session_id: "sid".into(),
        }
    }

    fn release_request() -> LockRequest {
        LockRequest::Release {
            pid: 1234,
            is_elevated: false,
            command: "git checkout main".into(),
        }
    }

    /// Records progress calls.
    #[derive(Default)]
    struct Recorder {
        waits: Vec<String>,
        finished: Vec<bool>,
    }

    impl Progress for Recorder {
        fn waiting(&mut self, reason: &str) {
            self.waits.push(reason.to_string());
        }

        fn finish(&mut self, succeeded: bool) {
            self.finished.push(succeeded);
        }
    }

    mod acquire {
        use super::*;

        #[test]
        fn accepted_without_retry() {
            let channel = ScriptedChannel::new().with_reply(LockResponse::Accepted);
            let mut client = LockClient::new(channel.clone(), fast());
            let mut progress = Recorder::default();

            let response = client.acquire(&acquire_request(false), &mut progress).unwrap();

            assert_eq!(response, LockResponse::Accepted);
            assert_eq!(channel.requests().len(), 1);
            assert!(progress.waits.is_empty());
            assert_eq!(progress.finished, vec![true]);
        }

        #[test]
        fn availability_check_retries_past_holder() {
            // Holder running `abc|def`.
            let holder = b"LockDeniedGit|26|1|false|false|7|abc|def|0|";
            let channel = ScriptedChannel::new()
                .with_raw_reply(holder)
                .with_reply(LockResponse::Available);
            let mut client = LockClient::new(channel.clone(), fast());
            let mut progress = Recorder::default();

            let response = client.acquire(&acquire_request(true), &mut progress).unwrap();

            assert_eq!(response, LockResponse::Available);
            let requests = channel.requests();
            assert_eq!(requests.len(), 2);
            assert_eq!(requests[0], requests[1]);
            assert_eq!(
                progress.waits,
                vec!["Waiting for 'abc|def' to release the lock".to_string()]
            );
            assert_eq!(progress.finished, vec![true]);
        }

        #[test]
        fn handles_long_run_of_identical_denials() {
            let mut channel = ScriptedChannel::new();
            for _ in 0..50 {
                channel = channel.with_reply(LockResponse::DeniedByOtherCommand("git pull".into()));
            }
            let channel = channel.with_reply(LockResponse::Accepted);
            let mut client = LockClient::new(channel.clone(), fast());
            let mut progress = Recorder::default();

            let response = client.acquire(&acquire_request(false), &mut progress).unwrap();

            assert_eq!(response, LockResponse::Accepted);
            assert_eq!(channel.requests().len(), 51);
            assert_eq!(progress.waits.len(), 50);
            assert!(progress
                .waits
                .iter()
                .all(|w| w == "Waiting for 'git pull' to release the lock"));
        }

        #[test]
        fn reason_comes_from_first_denial() {
            let channel = ScriptedChannel::new()
                .with_reply(LockResponse::DeniedByService("indexing".into()))
                .with_reply(LockResponse::DeniedByOtherCommand("git pull".into()))
                .with_reply(LockResponse::Accepted);
            let mut client = LockClient::new(channel, fast());
            let mut progress = Recorder::default();

            client.acquire(&acquire_request(false), &mut progress).unwrap();

            assert_eq!(
                progress.waits,
                vec![
                    "Waiting for GVFS to release the lock: indexing".to_string(),
                    "Waiting for GVFS to release the lock: indexing".to_string(),
                ]
            );
        }

        #[test]
        fn terminal_responses_are_not_retried() {
            for terminal in [LockResponse::ServiceNotReady, LockResponse::ServiceUnmounting] {
                let channel = ScriptedChannel::new()
                    .with_reply(terminal.clone())
                    .with_reply(LockResponse::Accepted);
                let mut client = LockClient::new(channel.clone(), fast());
                let mut progress = Recorder::default();

                let response = client.acquire(&acquire_request(false), &mut progress).unwrap();

                assert_eq!(response, terminal);
                assert_eq!(channel.pending_replies(), 1);
                assert_eq!(progress.finished, vec![false]);
            }
        }

        #[test]
        fn terminal_after_denial_stops_loop() {
            let channel = ScriptedChannel::new()
                .with_reply(LockResponse::DeniedByOtherCommand("git pull".into()))
                .with_reply(LockResponse::ServiceUnmounting);
            let mut client = LockClient::new(channel, fast());

            let response = client.acquire(&acquire_request(false), &mut NoProgress).unwrap();
            assert_eq!(response, LockResponse::ServiceUnmounting);
        }

        #[test]
        fn mode_mismatch_is_protocol_error() {
            let channel = ScriptedChannel::new().with_reply(LockResponse::Available);
            let mut client = LockClient::new(channel, fast());
            let err = client
                .acquire(&acquire_request(false), &mut NoProgress)
                .unwrap_err();
            assert!(matches!(
                err,
                LockClientError::UnexpectedResponse {
                    response: "LockAvailable",
                    ..
                }
            ));

            let channel = ScriptedChannel::new().with_reply(LockResponse::Accepted);
            let mut client = LockClient::new(channel, fast());
            assert!(matches!(
                client.acquire(&acquire_request(true), &mut NoProgress),
                Err(LockClientError::UnexpectedResponse { .. })
            ));
        }

        #[test]
        fn attempt_cap_exhausts() {
            let channel = ScriptedChannel::new()
                .with_reply(LockResponse::DeniedByOtherCommand("git pull".into()))
                .with_reply(LockResponse::DeniedByOtherCommand("git pull".into()))
                .with_reply(LockResponse::DeniedByOtherCommand("git pull".into()));
            let policy = RetryPolicy {
                max_attempts: Some(2),
                ..fast()
            };
            let mut client = LockClient::new(channel.clone(), policy);
            let mut progress = Recorder::default();

            let err = client.acquire(&acquire_request(false), &mut progress).unwrap_err();

            assert!(matches!(
                err,
                LockClientError::RetriesExhausted { attempts: 2, .. }
            ));
            assert_eq!(channel.requests().len(), 2);
            assert_eq!(progress.finished, vec![false]);
        }

        #[test]
        fn malformed_response_is_protocol_error() {
            let channel = ScriptedChannel::new().with_raw_reply(b"LockDeniedGit|99|short");
            let mut client = LockClient::new(channel, fast());
            assert!(matches!(
                client.acquire(&acquire_request(false), &mut NoProgress),
                Err(LockClientError::Protocol(_))
            ));
        }

        #[test]
        fn closed_channel_is_channel_error() {
            let channel = ScriptedChannel::new()
                .with_reply(LockResponse::DeniedByOtherCommand("git pull".into()));
            let mut client = LockClient::new(channel, fast());
            let mut progress = Recorder::default();

            let err = client.acquire(&acquire_request(false), &mut progress).unwrap_err();

            assert!(matches!(err, LockClientError::Channel(_)));
            assert_eq!(progress.finished, vec![false]);
        }

        #[test]
        fn chunked_replies_are_reassembled() {
            let channel = ScriptedChannel::new()
                .with_reply(LockResponse::DeniedByOtherCommand("git rebase -i".into()))
                .with_reply(LockResponse::Accepted)
                .with_chunk_size(1);
            let mut client = LockClient::new(channel, fast());
            assert_eq!(
                client.acquire(&acquire_request(false), &mut NoProgress).unwrap(),
                LockResponse::Accepted
            );
        }
    }

    mod release {
        use super::*;

        #[test]
        fn single_round_trip() {
            let outcome = ReleaseOutcome {
                failed_update_count: 1,
                failed_delete_count: 0,
                failed_update_paths: vec!["a.txt".into()],
                failed_delete_paths: vec![],
            };
            let channel = ScriptedChannel::new()
                .with_reply(LockResponse::ReleaseOutcome(outcome.clone()))
                .with_reply(LockResponse::Accepted);
            let mut client = LockClient::new(channel.clone(), fast());

            let response = client.release(&release_request()).unwrap();

            assert_eq!(response, LockResponse::ReleaseOutcome(outcome));
            assert_eq!(channel.pending_replies(), 1);
            assert_eq!(channel.requests(), vec![Ok(release_request())]);
        }

        #[test]
        fn denial_is_not_retried() {
            let channel = ScriptedChannel::new()
                .with_reply(LockResponse::DeniedByService("busy".into()));
            let mut client = LockClient::new(channel, fast());
            assert!(matches!(
                client.release(&release_request()),
                Err(LockClientError::UnexpectedResponse {
                    request: "ReleaseLock",
                    ..
                })
            ));
        }
    }

    #[test]
    fn policy_from_config_defaults() {
        let policy = RetryPolicy::from_config(&Config::default());
        assert_eq!(policy, RetryPolicy::default());
        assert_eq!(policy.interval, Duration::from_millis(250));
    }
}
