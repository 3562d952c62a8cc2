//! Error types for hostconf

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RoutingError {
    /// Host is outside the main domain and the virtual-host resolver rejected it
    #[error("Unroutable host: {0}")]
    UnroutableHost(String),
}
