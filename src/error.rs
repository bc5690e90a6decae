use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayError {
    /// The relay task has exited, so the inbound port no longer accepts values.
    #[error("Relay closed: the relay task has stopped")]
    Closed,
}
