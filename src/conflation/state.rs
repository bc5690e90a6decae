//! Relay phase state machine.

/// Where the relay's control loop currently stands.
///
/// Stored as a `u8` in [`RelayStats`](super::stats::RelayStats) so both ports
/// can observe it without touching the loop's own state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RelayPhase {
    /// Accumulator empty, no retry timer armed.
    /// The loop is parked waiting for input.
    Idle = 0,

    /// Undelivered data held, retry timer armed.
    /// The last non-blocking handoff found no ready consumer.
    Backoff = 1,

    /// Producer side dropped. Waiting (blocking) to hand over the final value.
    Draining = 2,

    /// The control loop has exited.
    Stopped = 3,
}

impl RelayPhase {
    #[inline]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    #[inline]
    pub const fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Idle,
            1 => Self::Backoff,
            2 => Self::Draining,
            _ => Self::Stopped,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Backoff => "backoff",
            Self::Draining => "draining",
            Self::Stopped => "stopped",
        }
    }
}

impl std::fmt::Display for RelayPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Default for RelayPhase {
    fn default() -> Self {
        Self::Idle
    }
}
