//! Fan-out of tile fetches and fan-in of their completions
//!
//! Every fetch runs as its own task. Its result is never applied where it is
//! produced: it is sent over a single ordered channel and applied later by
//! whoever owns the tree.

use super::fetcher::{FetchError, TileFetcher, TileImage};
use super::key::QuadKey;
use super::node::NodeId;
use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use futures::future::{abortable, AbortHandle, Aborted};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Ticket plus cancellation token for one in-flight fetch.
#[derive(Debug, Clone)]
pub struct FetchHandle {
    ticket: u64,
    abort: AbortHandle,
}

impl FetchHandle {
    pub fn new(ticket: u64, abort: AbortHandle) -> Self {
        Self { ticket, abort }
    }

    pub fn ticket(&self) -> u64 {
        self.ticket
    }

    /// Requests cancellation. A fetch that already produced its result is unaffected.
    pub fn cancel(&self) {
        self.abort.abort();
    }

    pub fn is_cancelled(&self) -> bool {
        self.abort.is_aborted()
    }
}

/// What a fetch task produced.
pub type FetchOutcome = std::result::Result<TileImage, FetchError>;

/// Result of one fetch, addressed to the node that requested it.
#[derive(Debug)]
pub struct FetchCompletion {
    pub node: NodeId,
    pub ticket: u64,
    pub key: QuadKey,
    pub outcome: FetchOutcome,
}

/// Starts fetches on behalf of the tree.
pub trait FetchScheduler {
    fn start_fetch(&self, node: NodeId, key: &QuadKey) -> FetchHandle;
}

/// Spawns one abortable task per fetch and collects completions in order.
pub struct FetchDispatcher {
    fetcher: Arc<dyn TileFetcher>,
    completion_tx: Sender<FetchCompletion>,
    completion_rx: Receiver<FetchCompletion>,
    sequence: AtomicU64,
    in_flight: Arc<AtomicUsize>,
}

impl FetchDispatcher {
    pub fn new(fetcher: Arc<dyn TileFetcher>) -> Self {
        let (completion_tx, completion_rx) = unbounded();
        Self {
            fetcher,
            completion_tx,
            completion_rx,
            sequence: AtomicU64::new(0),
            in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Takes every completion that has arrived so far (non-blocking).
    pub fn drain(&self) -> Vec<FetchCompletion> {
        self.completion_rx.try_iter().collect()
    }

    /// Waits up to `timeout` for the next completion.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<FetchCompletion> {
        match self.completion_rx.recv_timeout(timeout) {
            Ok(completion) => Some(completion),
            Err(RecvTimeoutError::Timeout) => None,
            // We hold a sender ourselves, so this cannot happen while `self` lives.
            Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Fetch tasks that have not yet delivered their completion.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn has_pending_completions(&self) -> bool {
        !self.completion_rx.is_empty()
    }
}

impl FetchScheduler for FetchDispatcher {
    fn start_fetch(&self, node: NodeId, key: &QuadKey) -> FetchHandle {
        let ticket = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        let fetcher = Arc::clone(&self.fetcher);
        let task_key = key.clone();
        let (fetch, abort) = abortable(async move { fetcher.fetch(&task_key).await });

        let completion_tx = self.completion_tx.clone();
        let in_flight = Arc::clone(&self.in_flight);
        let key = key.clone();
        in_flight.fetch_add(1, Ordering::AcqRel);

        crate::runtime::spawn(async move {
            let outcome = match fetch.await {
                Ok(result) => result,
                Err(Aborted) => Err(FetchError::Cancelled),
            };
            let completion = FetchCompletion {
                node,
                ticket,
                key,
                outcome,
            };
            if let Err(e) = completion_tx.send(completion) {
                log::trace!("completion for tile {} dropped: coordinator gone", e.0.key);
            }
            // Decrement only after the send so an idle count implies a full channel.
            in_flight.fetch_sub(1, Ordering::AcqRel);
        });

        FetchHandle::new(ticket, abort)
    }
}
