//! Contact notification adapters.
//!
//! - `WebhookContactNotifier` - POSTs the event as JSON to a configured URL
//! - `NoopContactNotifier` - Drops events (no webhook configured)
//! - `RecordingContactNotifier` - Keeps events in memory for tests

mod webhook;

pub use webhook::{
    NoopContactNotifier, RecordingContactNotifier, WebhookContactNotifier, WebhookConfig,
};
