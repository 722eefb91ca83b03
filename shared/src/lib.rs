//! Shared types and domain logic for the Coffee Roast Logger
//!
//! This crate holds everything that does not depend on the host: the roast
//! models, the event ledger, the session timer state machine, settings
//! reconciliation and the storage codec. The native application and the
//! WASM bindings both build on it.

pub mod error;
pub mod ledger;
pub mod models;
pub mod storage;
pub mod timer;
pub mod types;
pub mod validation;

pub use error::*;
pub use ledger::{chronological, EventLedger};
pub use models::*;
pub use storage::{KeyValueStore, MemoryStore, Storage};
pub use timer::{Clock, ManualClock, SessionTimer, SystemClock, TimerState};
pub use types::*;
pub use validation::*;
