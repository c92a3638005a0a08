//! Delivery error type shared by every channel.

use std::time::Duration;

/// A single send on a single channel failed.
///
/// Collected per recipient into the dispatch report; never aborts a batch.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    /// SMTP transport-level failure (authentication, connection, etc.).
    #[error("SMTP transport error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),

    /// The recipient or sender address could not be parsed.
    #[error("Email address parse error: {0}")]
    Address(#[from] lettre::address::AddressError),

    /// The MIME message could not be assembled.
    #[error("Email build error: {0}")]
    Build(String),

    /// The HTTP request to the WhatsApp gateway failed.
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The WhatsApp gateway returned a non-2xx status code.
    #[error("WhatsApp gateway returned HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    /// The send did not finish within the configured bound.
    #[error("Send timed out after {0:?}")]
    Timeout(Duration),

    /// The channel has no configuration.
    #[error("{0} channel is not configured")]
    NotConfigured(&'static str),
}
