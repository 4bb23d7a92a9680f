// Stop signal and OS signal handling
// Decision: Signal listener only flips the StopSignal; cleanup runs on a normal task
// Decision: Exit status is 128 + signo after cleanup instead of re-raising the signal
// Decision: A signal during shutdown exits at once with the same status

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::{debug, info, warn};

// =============================================================================
// StopSignal
// =============================================================================

/// Process-wide "please stop" flag
///
/// Transitions from unset to set exactly once; `set` is idempotent and every
/// clone observes the same flag.
#[derive(Debug, Clone)]
pub struct StopSignal {
    tx: Arc<watch::Sender<bool>>,
}

impl StopSignal {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Set the flag. Returns true if this call performed the transition.
    pub fn set(&self) -> bool {
        !self.tx.send_replace(true)
    }

    pub fn is_set(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolve once the flag is set (immediately if it already is)
    pub async fn wait(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives in self, so the channel cannot close while we wait
        let _ = rx.wait_for(|stopped| *stopped).await;
    }
}

impl Default for StopSignal {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// ShutdownCoordinator
// =============================================================================

/// Why the process is shutting down
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    /// SIGINT / Ctrl-C
    Interrupt,
    /// SIGTERM
    Terminate,
    /// StopSignal set programmatically
    Requested,
}

impl ShutdownReason {
    /// Conventional process exit status for this reason
    pub fn exit_code(&self) -> i32 {
        match self {
            ShutdownReason::Interrupt => 130,
            ShutdownReason::Terminate => 143,
            ShutdownReason::Requested => 0,
        }
    }
}

/// What the listener does with an OS signal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SignalAction {
    BeginShutdown,
    /// Shutdown already underway; exit immediately with this status
    ForceExit(i32),
}

/// Record the first signal and set `stop`; any later one escalates
fn on_signal(
    received: ShutdownReason,
    stop: &StopSignal,
    reason: &Mutex<Option<ShutdownReason>>,
) -> SignalAction {
    let mut recorded = reason.lock();
    if stop.is_set() {
        return SignalAction::ForceExit(recorded.unwrap_or(received).exit_code());
    }
    *recorded = Some(received);
    stop.set();
    SignalAction::BeginShutdown
}

/// Bridges OS termination signals onto a StopSignal
///
/// The first SIGINT/SIGTERM sets the flag for a graceful stop. A signal
/// arriving once the flag is set exits the process right away.
pub struct ShutdownCoordinator {
    stop: StopSignal,
    reason: Arc<Mutex<Option<ShutdownReason>>>,
}

impl ShutdownCoordinator {
    /// Spawn the signal listener. Must be called from within a tokio runtime.
    pub fn install(stop: StopSignal) -> Self {
        let reason = Arc::new(Mutex::new(None));

        let listener_stop = stop.clone();
        let listener_reason = reason.clone();
        tokio::spawn(async move {
            let mut signals = OsSignals::new();
            while let Some(received) = signals.recv().await {
                match on_signal(received, &listener_stop, &listener_reason) {
                    SignalAction::BeginShutdown => {
                        info!(signal = ?received, "Received shutdown signal")
                    }
                    SignalAction::ForceExit(code) => {
                        warn!(
                            signal = ?received,
                            exit_code = code,
                            "Shutdown signal during shutdown, exiting without cleanup"
                        );
                        std::process::exit(code);
                    }
                }
            }
            debug!("Signal listener exited");
        });

        Self { stop, reason }
    }

    /// Wait until the StopSignal is set and report why
    pub async fn wait(&self) -> ShutdownReason {
        self.stop.wait().await;
        // Let the listener record the signal it set the flag for
        tokio::task::yield_now().await;
        self.reason().unwrap_or(ShutdownReason::Requested)
    }

    /// The OS signal observed so far, if any
    pub fn reason(&self) -> Option<ShutdownReason> {
        *self.reason.lock()
    }

    pub fn stop_signal(&self) -> &StopSignal {
        &self.stop
    }
}

/// SIGINT/SIGTERM listeners, registered once for the process lifetime
struct OsSignals {
    #[cfg(unix)]
    terminate: Option<tokio::signal::unix::Signal>,
}

impl OsSignals {
    #[cfg(unix)]
    fn new() -> Self {
        use tokio::signal::unix::{signal, SignalKind};

        let terminate = match signal(SignalKind::terminate()) {
            Ok(s) => Some(s),
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                None
            }
        };
        Self { terminate }
    }

    #[cfg(not(unix))]
    fn new() -> Self {
        Self {}
    }

    /// Next signal; None once signals can no longer be observed
    #[cfg(unix)]
    async fn recv(&mut self) -> Option<ShutdownReason> {
        let terminate = &mut self.terminate;
        tokio::select! {
            result = tokio::signal::ctrl_c() => match result {
                Ok(()) => Some(ShutdownReason::Interrupt),
                Err(e) => {
                    warn!(error = %e, "Failed to listen for Ctrl-C");
                    None
                }
            },
            Some(_) = async {
                match terminate.as_mut() {
                    Some(s) => s.recv().await,
                    None => std::future::pending().await,
                }
            } => Some(ShutdownReason::Terminate),
        }
    }

    #[cfg(not(unix))]
    async fn recv(&mut self) -> Option<ShutdownReason> {
        match tokio::signal::ctrl_c().await {
            Ok(()) => Some(ShutdownReason::Interrupt),
            Err(e) => {
                warn!(error = %e, "Failed to listen for Ctrl-C");
                None
            }
        }
    }
}
