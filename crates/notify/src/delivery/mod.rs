//! Channel transports.
//!
//! The dispatcher only sees the traits; the concrete SMTP and WhatsApp
//! implementations live in [`email`] and [`whatsapp`].

pub mod email;
pub mod whatsapp;

use async_trait::async_trait;

use crate::error::DeliveryError;

/// Sends a plain-text email.
#[async_trait]
pub trait EmailTransport: Send + Sync {
    async fn send_email(&self, to: &str, subject: &str, body: &str) -> Result<(), DeliveryError>;
}

/// Sends a text message to a chat number.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// `telephone` is the number as stored; implementations normalise it.
    async fn send_text(&self, telephone: &str, body: &str) -> Result<(), DeliveryError>;
}
