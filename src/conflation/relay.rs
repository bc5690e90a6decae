//! The ConflatingRelay forwards values from one producer to one consumer.
//!
//! It sits between the two ports and provides:
//! - A producer side that never waits on the consumer's pace
//! - A single-slot accumulator, so memory stays flat under any speed mismatch
//! - Non-blocking handoff with timed retry, so nothing merged is ever dropped

use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{sleep, Duration, Sleep};
use tracing::{debug, info, trace, warn};

use crate::error::RelayError;

use super::accumulator::Accumulator;
use super::config::{RelayConfig, MIN_RETRY_INTERVAL};
use super::rules::Conflate;
use super::state::RelayPhase;
use super::stats::{RelayStats, RelayStatsSnapshot};

/// Capacity of the inbound port. One slot keeps the handoff close to a
/// rendezvous: the loop takes each value as soon as it is idle.
const INBOUND_CAPACITY: usize = 1;

/// A consumer's registration: the relay answers it with the next value.
type ReplySlot<T> = oneshot::Sender<T>;

/// Entry point for spawning relays.
pub struct ConflatingRelay;

impl ConflatingRelay {
    /// Spawn a relay with default configuration.
    ///
    /// # Panics
    /// Panics if called outside of a tokio runtime.
    pub fn with_defaults<T: Conflate>() -> (Submitter<T>, Delivery<T>) {
        Self::spawn(RelayConfig::default())
    }

    /// Spawn a relay task on the current tokio runtime.
    ///
    /// Returns the producer-facing and consumer-facing ports. The task runs
    /// until one of the two ports is dropped.
    ///
    /// # Panics
    /// Panics if called outside of a tokio runtime.
    pub fn spawn<T: Conflate>(config: RelayConfig) -> (Submitter<T>, Delivery<T>) {
        if config.retry_interval < MIN_RETRY_INTERVAL {
            warn!(
                "Retry interval {:?} below floor, using {:?}",
                config.retry_interval, MIN_RETRY_INTERVAL
            );
        }

        let (inbound_tx, inbound_rx) = mpsc::channel(INBOUND_CAPACITY);
        let (ready_tx, ready_rx) = mpsc::channel(1);
        let stats = Arc::new(RelayStats::new());

        let task = RelayTask {
            inbound: inbound_rx,
            ready: ready_rx,
            accumulator: Accumulator::new(),
            retry: None,
            retry_interval: config.effective_retry_interval(),
            log_transitions: config.log_transitions,
            stats: Arc::clone(&stats),
        };

        info!("Relay started with {:?}", config);
        tokio::spawn(task.run());

        (
            Submitter {
                tx: inbound_tx,
                stats: Arc::clone(&stats),
            },
            Delivery {
                ready: ready_tx,
                pending: None,
                stats,
            },
        )
    }
}

/// Producer-facing port.
///
/// Deliberately not `Clone`: a relay serves exactly one producer.
pub struct Submitter<T> {
    tx: mpsc::Sender<T>,
    stats: Arc<RelayStats>,
}

impl<T: Conflate> Submitter<T> {
    /// Hand a value to the relay.
    ///
    /// Waits only for the relay loop to accept the value, never for the
    /// consumer. Fails once the relay has stopped.
    pub async fn submit(&self, value: T) -> Result<(), RelayError> {
        self.tx.send(value).await.map_err(|_| RelayError::Closed)
    }

    /// Blocking variant of [`Submitter::submit`] for producers running on
    /// plain threads.
    ///
    /// # Panics
    /// Panics if called from within an async execution context.
    pub fn blocking_submit(&self, value: T) -> Result<(), RelayError> {
        self.tx.blocking_send(value).map_err(|_| RelayError::Closed)
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    pub fn stats(&self) -> RelayStatsSnapshot {
        self.stats.snapshot()
    }
}

/// Consumer-facing port.
///
/// Deliberately not `Clone`: a relay serves exactly one consumer.
pub struct Delivery<T> {
    ready: mpsc::Sender<ReplySlot<T>>,
    /// Registration left over from a cancelled `recv`.
    pending: Option<oneshot::Receiver<T>>,
    stats: Arc<RelayStats>,
}

impl<T: Conflate> Delivery<T> {
    /// Wait for the next conflated value.
    ///
    /// Returns `None` once the relay has stopped and nothing is left to
    /// deliver. Cancel-safe: dropping the future keeps this consumer
    /// registered, and the next call picks up the same registration.
    pub async fn recv(&mut self) -> Option<T> {
        if self.pending.is_none() {
            let (slot, rx) = oneshot::channel();
            self.ready.send(slot).await.ok()?;
            self.pending = Some(rx);
        }

        let rx = self.pending.as_mut()?;
        let value = rx.await.ok();
        self.pending = None;
        value
    }

    pub fn stats(&self) -> RelayStatsSnapshot {
        self.stats.snapshot()
    }
}

/// Result of a non-blocking handoff attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Handoff {
    Delivered,
    NotReady,
    ConsumerGone,
}

/// The relay's control loop and all of its state.
///
/// Owned by a single task; nothing here is shared except `stats`.
struct RelayTask<T: Conflate> {
    inbound: mpsc::Receiver<T>,
    ready: mpsc::Receiver<ReplySlot<T>>,
    accumulator: Accumulator<T>,
    /// Armed after a failed handoff. Replaced, never reused.
    retry: Option<Pin<Box<Sleep>>>,
    retry_interval: Duration,
    log_transitions: bool,
    stats: Arc<RelayStats>,
}

impl<T: Conflate> RelayTask<T> {
    async fn run(mut self) {
        loop {
            // Await input or retry. Input is listed first: new data wins a tie.
            tokio::select! {
                biased;

                incoming = self.inbound.recv() => match incoming {
                    Some(value) => {
                        self.retry = None;
                        self.accumulator.merge(value);
                        self.stats.record_submitted();
                        trace!("Merged value ({} pending)", self.accumulator.merged());
                    }
                    None => {
                        self.drain().await;
                        break;
                    }
                },

                () = retry_fired(&mut self.retry), if self.retry.is_some() => {
                    self.retry = None;
                    trace!("Retry timer fired");
                }
            }

            // A timer that outlived its purpose leaves nothing to deliver.
            if self.accumulator.is_empty() {
                continue;
            }

            match self.try_handoff() {
                Handoff::Delivered => self.transition(RelayPhase::Idle),
                Handoff::NotReady => {
                    self.stats.record_failed_attempt();
                    self.retry = Some(Box::pin(sleep(self.retry_interval)));
                    trace!("Consumer busy, retrying in {:?}", self.retry_interval);
                    self.transition(RelayPhase::Backoff);
                }
                Handoff::ConsumerGone => {
                    warn!(
                        "Consumer dropped, discarding {} undelivered values",
                        self.accumulator.merged()
                    );
                    break;
                }
            }
        }

        self.transition(RelayPhase::Stopped);
        info!("Relay stopped: {}", self.stats.snapshot());
    }

    /// Hand the accumulator to a consumer that is already waiting.
    ///
    /// Never awaits. A registration whose receiver is gone is skipped and the
    /// value is put back, so a refused handoff loses nothing.
    fn try_handoff(&mut self) -> Handoff {
        loop {
            let slot = match self.ready.try_recv() {
                Ok(slot) => slot,
                Err(TryRecvError::Empty) => return Handoff::NotReady,
                Err(TryRecvError::Disconnected) => return Handoff::ConsumerGone,
            };

            let (value, merged) = self.accumulator.take();
            match slot.send(value) {
                Ok(()) => {
                    self.stats.record_delivered(merged);
                    debug!("Delivered conflated value covering {} submissions", merged);
                    return Handoff::Delivered;
                }
                Err(value) => {
                    self.accumulator.restore(value, merged);
                    self.stats.record_abandoned();
                }
            }
        }
    }

    /// Producer is gone: wait for the consumer and hand over whatever is left.
    async fn drain(&mut self) {
        self.retry = None;
        if self.accumulator.is_empty() {
            return;
        }

        self.transition(RelayPhase::Draining);
        while let Some(slot) = self.ready.recv().await {
            let (value, merged) = self.accumulator.take();
            match slot.send(value) {
                Ok(()) => {
                    self.stats.record_delivered(merged);
                    debug!("Drained final value covering {} submissions", merged);
                    return;
                }
                Err(value) => {
                    self.accumulator.restore(value, merged);
                    self.stats.record_abandoned();
                }
            }
        }

        warn!(
            "Consumer dropped while draining, discarding {} undelivered values",
            self.accumulator.merged()
        );
    }

    fn transition(&self, phase: RelayPhase) {
        let prev = self.stats.set_phase(phase);
        if self.log_transitions && prev != phase {
            match phase {
                RelayPhase::Backoff => debug!("Relay phase: {} -> {}", prev, phase),
                _ => trace!("Relay phase: {} -> {}", prev, phase),
            }
        }
    }
}

/// Resolves when the armed retry timer fires. Only polled while one is armed.
async fn retry_fired(retry: &mut Option<Pin<Box<Sleep>>>) {
    match retry {
        Some(timer) => timer.as_mut().await,
        None => std::future::pending().await,
    }
}
