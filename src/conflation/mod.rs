//! Conflating Relay
//!
//! A single-slot forwarding stage between one producer and one consumer. The
//! producer never waits on the consumer, memory stays at one value, and no
//! submitted value's contribution is dropped.
//!
//! # Architecture
//!
//! The relay task alternates between two steps forever:
//! - **Await**: block until a new value arrives (merged into the accumulator,
//!   retry timer cleared) or the retry timer fires
//! - **Attempt**: hand the accumulator to the consumer only if it is already
//!   waiting; otherwise arm a fresh retry timer and go back to awaiting
//!
//! Values are merged through the [`Conflate`] trait, so the payload decides
//! what "conflated" means (sum, latest-wins, batch).
//!
//! # Example
//!
//! ```no_run
//! use conflate_relay::{ConflatingRelay, RelayConfig, Sale};
//!
//! # async fn demo() -> Result<(), conflate_relay::RelayError> {
//! let (sales, mut updates) = ConflatingRelay::spawn::<Sale>(RelayConfig::default());
//!
//! tokio::spawn(async move {
//!     while let Some(sale) = updates.recv().await {
//!         println!("{}", sale);
//!     }
//! });
//!
//! sales.submit(Sale::new(1.0, 0)).await?;
//! # Ok(())
//! # }
//! ```

pub mod accumulator;
pub mod config;
pub mod relay;
pub mod rules;
pub mod state;
pub mod stats;

pub use accumulator::Accumulator;
pub use config::{RelayConfig, RelayConfigBuilder};
pub use relay::{ConflatingRelay, Delivery, Submitter};
pub use rules::{Conflate, Latest};
pub use state::RelayPhase;
pub use stats::{RelayStats, RelayStatsSnapshot};
