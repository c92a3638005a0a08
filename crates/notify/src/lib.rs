//! Parent notifications over email and WhatsApp.
//!
//! - [`delivery`] -- channel transports (SMTP via `lettre`, WhatsApp via an
//!   HTTP gateway) behind the [`EmailTransport`] and [`ChatTransport`] traits.
//! - [`store`] -- recipient lookup, history persistence and score cleanup
//!   behind the [`NotificationStore`] trait.
//! - [`dispatcher`] -- the best-effort bulk dispatcher.

pub mod delivery;
pub mod dispatcher;
pub mod error;
pub mod store;

pub use delivery::{ChatTransport, EmailTransport};
pub use dispatcher::{ChannelStatus, DispatchReport, NotificationDispatcher, RecipientOutcome};
pub use error::DeliveryError;
pub use store::{NotificationStore, PendingScore, PgNotificationStore, Recipient};
