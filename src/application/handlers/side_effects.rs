//! Detached side effects.
//!
//! Notifications, memory writes and traces never hold up a response. Each runs
//! on its own task and only logs when it fails.

use std::future::Future;
use std::sync::Arc;

use crate::ports::{ContactCaptured, ContactNotifier};

/// Runs `task` on a detached task, logging its error under `what`.
pub fn spawn_detached<F, E>(what: &'static str, task: F)
where
    F: Future<Output = Result<(), E>> + Send + 'static,
    E: std::fmt::Display + Send + 'static,
{
    tokio::spawn(async move {
        if let Err(e) = task.await {
            tracing::warn!(side_effect = what, error = %e, "Side effect failed");
        }
    });
}

/// Dispatches a contact-captured notification.
pub fn notify_contact_captured(notifier: Arc<dyn ContactNotifier>, event: ContactCaptured) {
    tracing::info!(
        session_id = %event.session_id,
        account_id = %event.account_id,
        "Contact captured"
    );
    spawn_detached("contact_notification", async move {
        notifier.notify_contact_captured(&event).await
    });
}
