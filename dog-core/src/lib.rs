//! dog-core: framework-agnostic core for DogRS.
//!
//! Shared by the DogRS crates: structured Feathers-style errors and the
//! key/value application configuration.

pub mod config;
pub mod errors;

pub use config::{DogConfig, DogConfigSnapshot};
pub use errors::{DogError, DogResult, ErrorKind};
