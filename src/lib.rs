// Core infrastructure modules
pub mod core;

// Operation surface and ambient modules
pub mod access;
pub mod config;
pub mod logging;

#[cfg(test)]
pub mod test_utils;


pub use access::Database;
pub use config::{Config, IdentifierPolicy};
pub use core::db::{Aggregate, ConnectionParams, SortDirection};
pub use core::{report, DataError, ErrorKind, Outcome, Record, Result, Value};
