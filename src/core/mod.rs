/// Core Module for sqlbridge
///
/// This module contains the fundamental components shared by every
/// data-access operation: the error taxonomy, driver-neutral values, the
/// result reporter, and the database layer itself.

pub mod db;
pub mod error;
pub mod report;
pub mod value;

// Re-export commonly used types for convenience
pub use error::{DataError, ErrorKind, Result};
pub use report::{report, Outcome};
pub use value::{Record, Value};
