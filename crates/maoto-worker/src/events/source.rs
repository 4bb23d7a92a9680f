//! Reconnecting event source
//!
//! Keeps one subscription open for the lifetime of the pool. Any transport
//! failure (including the remote closing the stream) ends the session and
//! schedules a reconnect with exponential backoff; undecodable messages are
//! dropped one at a time. Every await is raced against the stop signal.

use async_trait::async_trait;
use maoto_core::AgentEvent;
use tracing::{debug, info, warn};

use super::backoff::BackoffPolicy;
use super::transport::{Credentials, EventSession, Transport};
use crate::error::TransportError;
use crate::pool::{TaskQueue, TaskSource};
use crate::shutdown::StopSignal;

/// Connection bookkeeping driving the backoff
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConnectionAttempt {
    pub consecutive_failures: u32,
}

impl ConnectionAttempt {
    pub fn record_failure(&mut self) {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
    }

    pub fn reset(&mut self) {
        self.consecutive_failures = 0;
    }
}

/// How a session ended
enum SessionEnd {
    Stopped,
    Failed(TransportError),
}

/// `TaskSource` turning a push subscription into queued `AgentEvent`s
pub struct ReconnectingEventSource<Tr> {
    transport: Tr,
    credentials: Credentials,
    backoff: BackoffPolicy,
}

impl<Tr: Transport> ReconnectingEventSource<Tr> {
    pub fn new(transport: Tr, credentials: Credentials, backoff: BackoffPolicy) -> Self {
        Self {
            transport,
            credentials,
            backoff,
        }
    }

    /// Receive events into `queue` until `stop` is set
    ///
    /// Transport errors are logged and retried; they never escape.
    pub async fn run_until_stopped(&self, queue: TaskQueue<AgentEvent>, stop: StopSignal) {
        let mut attempt = ConnectionAttempt::default();

        while !stop.is_set() {
            let opened = tokio::select! {
                opened = self.transport.open(&self.credentials) => opened,
                _ = stop.wait() => {
                    debug!("Stop requested while connecting");
                    break;
                }
            };

            match opened {
                Ok(mut session) => {
                    attempt.reset();
                    info!("Connected to event stream");

                    let end = receive_into(session.as_mut(), &queue, &stop).await;
                    session.close().await;

                    match end {
                        SessionEnd::Stopped => {
                            debug!("Stop requested, event session closed");
                            break;
                        }
                        SessionEnd::Failed(e) => warn!(error = %e, "Event stream failed"),
                    }
                }
                Err(e) => warn!(
                    error = %e,
                    consecutive_failures = attempt.consecutive_failures,
                    "Failed to connect to event stream"
                ),
            }

            if stop.is_set() {
                break;
            }

            let delay = self.backoff.delay_for(attempt.consecutive_failures);
            info!(
                delay_ms = delay.as_millis() as u64,
                consecutive_failures = attempt.consecutive_failures,
                "Reconnecting to event stream"
            );

            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = stop.wait() => {
                    debug!("Stop requested during reconnect backoff");
                    break;
                }
            }
            attempt.record_failure();
        }

        info!("Event source stopped");
    }
}

async fn receive_into(
    session: &mut dyn EventSession,
    queue: &TaskQueue<AgentEvent>,
    stop: &StopSignal,
) -> SessionEnd {
    loop {
        let received = tokio::select! {
            received = session.receive_next() => received,
            _ = stop.wait() => return SessionEnd::Stopped,
        };

        let raw = match received {
            Ok(Some(raw)) => raw,
            Ok(None) => return SessionEnd::Failed(TransportError::Closed),
            Err(e) => return SessionEnd::Failed(e),
        };

        let event = match AgentEvent::decode(&raw) {
            Ok(event) => event,
            Err(e) => {
                warn!(error = %e, "Dropping undecodable event");
                continue;
            }
        };

        debug!(kind = %event.kind(), "Event received");
        tokio::select! {
            _ = queue.push(event) => {}
            _ = stop.wait() => return SessionEnd::Stopped,
        }
    }
}

#[async_trait]
impl<Tr: Transport> TaskSource<AgentEvent> for ReconnectingEventSource<Tr> {
    async fn run(self: Box<Self>, queue: TaskQueue<AgentEvent>, stop: StopSignal) {
        self.run_until_stopped(queue, stop).await
    }
}
