//! Coffee Roast Logger - native application
//!
//! Runs roast sessions against a file-backed store and exposes the saved
//! history to the `roastlog` command line tool.

pub mod config;
pub mod error;
pub mod services;
pub mod store;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use store::FileStore;

/// Storage over the on-disk store
pub type AppStorage = shared::Storage<FileStore>;

/// Open the configured store with the configured limits
pub fn open_storage(config: &Config) -> AppResult<AppStorage> {
    let store = FileStore::open(&config.storage.path)?;
    Ok(shared::Storage::with_limits(store, config.storage.limits()))
}
