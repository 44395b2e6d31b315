//! Common types shared across Vista crates.
//!
//! This crate holds the error taxonomy every layer reports through and the
//! observability helpers binaries and tests use to install logging. It stays
//! small so the extraction core can depend on it without pulling in a
//! browser driver.
//!
//! # Overview
//!
//! - [`VistaError`] and [`Result`]: shared error handling
//! - [`observability`]: centralised tracing/logging initialisation
//!
//! # Examples
//!
//! Telling an expected miss apart from an infrastructure fault:
//!
//! ```rust
//! use vista_common::VistaError;
//!
//! let miss = VistaError::not_found("css", ".item");
//! assert!(miss.is_not_found());
//!
//! let fault = VistaError::Driver(anyhow::anyhow!("session deleted"));
//! assert!(!fault.is_not_found());
//! ```
use std::time::Duration;

pub mod observability;

/// Error types used across the Vista system.
#[derive(thiserror::Error, Debug)]
pub enum VistaError {
    /// A lookup matched nothing. Expected during extraction and normally
    /// converted into an absent value before it reaches the caller.
    #[error("No element matches {selector} {value:?}")]
    NotFound { selector: String, value: String },

    /// An explicit wait ran out of time.
    #[error("Timed out after {waited:?} waiting for {condition}")]
    Timeout { waited: Duration, condition: String },

    /// The element handle no longer refers to a node in the live document.
    #[error("Element is no longer attached to the document")]
    StaleElement,

    /// An element-only operation was requested on the document root.
    #[error("`{0}` is not available on the document root")]
    RootNode(&'static str),

    /// A container declared the same slot name twice.
    #[error("Slot `{0}` is declared more than once")]
    DuplicateSlot(String),

    /// Configuration was incomplete or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The browser driver (session, protocol, transport) reported an error.
    #[error("Driver error: {0}")]
    Driver(#[from] anyhow::Error),
}

impl VistaError {
    pub fn not_found(selector: impl Into<String>, value: impl Into<String>) -> Self {
        Self::NotFound {
            selector: selector.into(),
            value: value.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

/// Convenient alias for results that use [`VistaError`].
pub type Result<T> = std::result::Result<T, VistaError>;
