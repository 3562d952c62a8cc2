//! hostconf Shared Types
//!
//! Framework-agnostic routing values and errors shared by the hostconf crates.

pub mod error;
pub mod types;

pub use error::*;
pub use types::*;
