//! Outbound notification boundary.
//!
//! Formatting and escaping for a concrete channel (Telegram, Discord, Slack,
//! ...) belong to the [`Notifier`] implementation, not to the runtime.

use async_trait::async_trait;
use tracing::info;

use crate::error::ReelError;
use crate::types::Notification;

/// Delivers messages to users through their originating channel.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn post(&self, notification: Notification) -> Result<(), ReelError>;
}

/// Notifier that writes every message to the tracing log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn post(&self, notification: Notification) -> Result<(), ReelError> {
        info!(
            channel = notification.channel.as_deref().unwrap_or("-"),
            source = notification.source.as_deref().unwrap_or("-"),
            user_id = %notification.user_id,
            title = notification.title.as_deref().unwrap_or(""),
            "{}",
            notification.text
        );
        Ok(())
    }
}
