//! Domain models for the roast logger

mod coffee;
mod data_point;
mod roast;
mod settings;

pub use coffee::*;
pub use data_point::*;
pub use roast::*;
pub use settings::*;
