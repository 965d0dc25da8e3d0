pub mod api;
pub mod config;
pub mod core;
pub mod error;

pub use api::client::ApiClient;
pub use api::envelope::Page;
pub use api::resource::{ListQuery, Resource, ResourceClient};
pub use error::ApiError;

use std::sync::atomic::{AtomicBool, Ordering};

/// Whether debug logging is active, shared between the logger filter and the config toggle.
static DEBUG_LOGGING: AtomicBool = AtomicBool::new(false);

pub fn set_debug_logging(enabled: bool) {
    DEBUG_LOGGING.store(enabled, Ordering::Relaxed);
}

pub fn debug_logging() -> bool {
    DEBUG_LOGGING.load(Ordering::Relaxed)
}
