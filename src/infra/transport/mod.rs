//! Purge transports.

mod dry_run;
mod webhook;

pub use dry_run::LogTransport;
pub use webhook::WebhookTransport;
