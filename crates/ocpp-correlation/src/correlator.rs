//! The pending-request table and completion handles.

use crate::errors::CorrelationError;
use ocpp_routing::{NetworkAddress, NetworkPath};
use parking_lot::Mutex;
use serde_json::Value;
use shared_types::CallErrorBody;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::oneshot;
use tracing::{debug, warn};

/// Why a pending request was cancelled before completing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CancelReason {
    /// A transport connection on the request's path dropped.
    ConnectionClosed(NetworkAddress),
    /// The caller gave up on the request.
    CallerRequest,
    /// The correlator itself is shutting down.
    Shutdown,
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConnectionClosed(address) => write!(f, "connection to {address} closed"),
            Self::CallerRequest => f.write_str("cancelled by caller"),
            Self::Shutdown => f.write_str("correlator shut down"),
        }
    }
}

/// Terminal state of one pending request.
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    /// A `CallResult` frame arrived for this request id.
    Response(Value),
    /// A `CallError` frame arrived for this request id.
    Error(CallErrorBody),
    /// The request was cancelled externally before any frame arrived.
    Cancelled(CancelReason),
    /// The wall-clock deadline passed without a frame.
    TimedOut,
}

/// One entry in the pending table.
///
/// The oneshot sender is the single-assignment completion slot; whoever
/// removes the entry from the table owns the only chance to complete it.
struct PendingEntry {
    slot: oneshot::Sender<Completion>,
    path: NetworkPath,
    registered_at: Instant,
}

type PendingMap = Mutex<HashMap<String, PendingEntry>>;

/// Tracks all in-flight requests for one node.
///
/// Shared across async tasks via `Arc`; all methods take `&self`.
pub struct RequestCorrelator {
    pending: Arc<PendingMap>,
}

impl RequestCorrelator {
    /// Create an empty correlator.
    #[must_use]
    pub fn new() -> Self {
        Self {
            pending: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Register a request before it is sent.
    ///
    /// The returned handle must be awaited (or dropped) by the caller;
    /// registration before the transport send guarantees a same-instant
    /// response always finds its waiter.
    pub fn register(
        &self,
        request_id: &str,
        path: NetworkPath,
        timeout: Duration,
    ) -> Result<PendingHandle, CorrelationError> {
        let (slot, receiver) = oneshot::channel();
        let entry = PendingEntry {
            slot,
            path,
            registered_at: Instant::now(),
        };

        {
            let mut pending = self.pending.lock();
            if pending.contains_key(request_id) {
                return Err(CorrelationError::DuplicateRequestId(request_id.to_owned()));
            }
            pending.insert(request_id.to_owned(), entry);
        }
        debug!(request_id, timeout_ms = timeout.as_millis() as u64, "Request registered");

        Ok(PendingHandle {
            request_id: request_id.to_owned(),
            timeout,
            receiver,
            pending: Arc::clone(&self.pending),
        })
    }

    /// Complete a pending request with a response payload.
    ///
    /// Returns `false` when the id is unknown or already completed; the frame
    /// is discarded, because duplicate and late delivery are expected
    /// transport anomalies, not faults.
    pub fn complete_response(&self, request_id: &str, payload: Value) -> bool {
        self.complete(request_id, Completion::Response(payload))
    }

    /// Complete a pending request with a remote error.
    pub fn complete_error(&self, request_id: &str, body: CallErrorBody) -> bool {
        self.complete(request_id, Completion::Error(body))
    }

    /// Cancel one pending request.
    pub fn cancel(&self, request_id: &str, reason: CancelReason) -> bool {
        self.complete(request_id, Completion::Cancelled(reason))
    }

    /// Cancel every pending request whose path includes `address`.
    ///
    /// Called when a transport connection drops: all requests routed through
    /// the dead hop can no longer complete. Returns how many were cancelled.
    pub fn cancel_by_hop(&self, address: &NetworkAddress) -> usize {
        let drained: Vec<(String, PendingEntry)> = {
            let mut pending = self.pending.lock();
            let ids: Vec<String> = pending
                .iter()
                .filter(|(_, entry)| entry.path.contains(address))
                .map(|(id, _)| id.clone())
                .collect();
            ids.into_iter()
                .filter_map(|id| pending.remove(&id).map(|entry| (id, entry)))
                .collect()
        };

        let cancelled = drained.len();
        for (request_id, entry) in drained {
            debug!(request_id, hop = %address, "Cancelling request on dropped connection");
            let reason = CancelReason::ConnectionClosed(address.clone());
            if entry.slot.send(Completion::Cancelled(reason)).is_err() {
                // Waiter already gone (timed out or dropped); nothing to do.
                debug!(request_id, "Cancellation had no waiter");
            }
        }
        cancelled
    }

    /// Number of requests currently in flight.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.pending.lock().len()
    }

    fn complete(&self, request_id: &str, completion: Completion) -> bool {
        let entry = self.pending.lock().remove(request_id);
        match entry {
            Some(entry) => {
                let elapsed = entry.registered_at.elapsed();
                debug!(
                    request_id,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Completing pending request"
                );
                if entry.slot.send(completion).is_err() {
                    // The waiter raced us at its deadline and gave up.
                    warn!(request_id, "Completion arrived but waiter was gone");
                    return false;
                }
                true
            }
            None => {
                warn!(
                    request_id,
                    "Discarding frame for unknown or already-completed request"
                );
                false
            }
        }
    }
}

impl Default for RequestCorrelator {
    fn default() -> Self {
        Self::new()
    }
}

/// The waiter half of one pending request.
///
/// Consumed by [`PendingHandle::wait`]; dropping it without waiting leaves
/// the table entry to be cleaned up by whoever completes it.
pub struct PendingHandle {
    request_id: String,
    timeout: Duration,
    receiver: oneshot::Receiver<Completion>,
    pending: Arc<PendingMap>,
}

impl fmt::Debug for PendingHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingHandle")
            .field("request_id", &self.request_id)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl PendingHandle {
    /// The request id this handle waits for.
    #[must_use]
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// Suspend until the request completes or its deadline passes.
    ///
    /// On timeout the pending entry is removed, so a frame arriving later is
    /// discarded by the correlator. A completion that lands exactly at the
    /// deadline wins the race: the caller gets the frame, not the timeout.
    pub async fn wait(mut self) -> Completion {
        match tokio::time::timeout(self.timeout, &mut self.receiver).await {
            Ok(Ok(completion)) => completion,
            // Slot dropped without completing: the table was torn down.
            Ok(Err(_)) => Completion::Cancelled(CancelReason::Shutdown),
            Err(_elapsed) => {
                let removed = self.pending.lock().remove(&self.request_id);
                if removed.is_some() {
                    debug!(request_id = %self.request_id, "Request timed out");
                    Completion::TimedOut
                } else {
                    // A completer removed the entry at the same instant;
                    // its completion is already in the channel.
                    match self.receiver.try_recv() {
                        Ok(completion) => completion,
                        Err(_) => Completion::TimedOut,
                    }
                }
            }
        }
    }
}
