pub mod conflation;
mod error;
pub mod model;

pub use conflation::{
    ConflatingRelay, Conflate, Delivery, Latest, RelayConfig, RelayPhase, RelayStatsSnapshot,
    Submitter,
};
pub use error::RelayError;
pub use model::Sale;
