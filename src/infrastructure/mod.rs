//! Infrastructure layer
//!
//! Runner settings and process-wide logging setup.

mod config;
mod logging;

pub use config::Settings;
pub use logging::{init_logging, log_filter};
