//! Relay counters shared between the control loop and both ports.

use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};

use serde::{Deserialize, Serialize};

use super::state::RelayPhase;

/// Live counters. Written only by the relay task, read by anyone holding a port.
#[derive(Debug, Default)]
pub struct RelayStats {
    submitted: AtomicU64,
    delivered_batches: AtomicU64,
    delivered_values: AtomicU64,
    failed_attempts: AtomicU64,
    abandoned_handoffs: AtomicU64,
    phase: AtomicU8,
}

impl RelayStats {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub(crate) fn record_submitted(&self) {
        self.submitted.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_delivered(&self, merged: u64) {
        self.delivered_batches.fetch_add(1, Ordering::Relaxed);
        self.delivered_values.fetch_add(merged, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_failed_attempt(&self) {
        self.failed_attempts.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_abandoned(&self) {
        self.abandoned_handoffs.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn set_phase(&self, phase: RelayPhase) -> RelayPhase {
        RelayPhase::from_u8(self.phase.swap(phase.as_u8(), Ordering::Relaxed))
    }

    #[inline]
    pub fn phase(&self) -> RelayPhase {
        RelayPhase::from_u8(self.phase.load(Ordering::Relaxed))
    }

    pub fn snapshot(&self) -> RelayStatsSnapshot {
        RelayStatsSnapshot {
            submitted: self.submitted.load(Ordering::Relaxed),
            delivered_batches: self.delivered_batches.load(Ordering::Relaxed),
            delivered_values: self.delivered_values.load(Ordering::Relaxed),
            failed_attempts: self.failed_attempts.load(Ordering::Relaxed),
            abandoned_handoffs: self.abandoned_handoffs.load(Ordering::Relaxed),
            phase: self.phase().as_str().to_string(),
        }
    }
}

/// Point-in-time copy of [`RelayStats`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayStatsSnapshot {
    /// Values merged into the accumulator
    pub submitted: u64,
    /// Successful handoffs to the consumer
    pub delivered_batches: u64,
    /// Submitted values covered by those handoffs
    pub delivered_values: u64,
    /// Handoff attempts that found no ready consumer
    pub failed_attempts: u64,
    /// Handoffs refused because the consumer dropped its receive
    pub abandoned_handoffs: u64,
    pub phase: String,
}

impl RelayStatsSnapshot {
    /// Values accepted but not yet handed to the consumer.
    pub fn undelivered(&self) -> u64 {
        self.submitted.saturating_sub(self.delivered_values)
    }

    /// Average number of submissions per delivered value (1.0 = no conflation).
    pub fn conflation_ratio(&self) -> f64 {
        if self.delivered_batches == 0 {
            0.0
        } else {
            self.delivered_values as f64 / self.delivered_batches as f64
        }
    }
}

impl std::fmt::Display for RelayStatsSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}] submitted: {}, delivered: {} in {} batches ({:.1}x), retries: {}",
            self.phase,
            self.submitted,
            self.delivered_values,
            self.delivered_batches,
            self.conflation_ratio(),
            self.failed_attempts
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let stats = RelayStats::new();
        for _ in 0..6 {
            stats.record_submitted();
        }
        stats.record_delivered(4);
        stats.record_failed_attempt();

        let snap = stats.snapshot();
        assert_eq!(snap.submitted, 6);
        assert_eq!(snap.delivered_values, 4);
        assert_eq!(snap.undelivered(), 2);
        assert_eq!(snap.failed_attempts, 1);
        assert!((snap.conflation_ratio() - 4.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_phase_swap_returns_previous() {
        let stats = RelayStats::new();
        assert_eq!(stats.phase(), RelayPhase::Idle);
        assert_eq!(stats.set_phase(RelayPhase::Backoff), RelayPhase::Idle);
        assert_eq!(stats.phase(), RelayPhase::Backoff);
    }

    #[test]
    fn test_ratio_without_deliveries() {
        assert_eq!(RelayStatsSnapshot::default().conflation_ratio(), 0.0);
    }

    #[test]
    fn test_display() {
        let stats = RelayStats::new();
        stats.record_submitted();
        stats.record_submitted();
        stats.record_delivered(2);
        let s = format!("{}", stats.snapshot());
        assert!(s.contains("[idle]"));
        assert!(s.contains("(2.0x)"));
    }
}
