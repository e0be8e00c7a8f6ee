//! Utility module: errors and logging.

pub mod errors;
pub mod logging;

pub use errors::{Result, SpamError};
pub use logging::init_logging;
