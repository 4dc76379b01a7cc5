//! Session identity and outbound notifications.

use serde::{Deserialize, Serialize};

/// Identity and channel metadata of one conversational session.
///
/// `session_id` is fixed for the lifetime of a session; the remaining fields
/// are refreshed whenever the session is reused from a new inbound message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionContext {
    pub session_id: String,
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

impl SessionContext {
    pub fn new(session_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            user_id: user_id.into(),
            ..Self::default()
        }
    }

    pub fn with_channel(mut self, channel: impl Into<String>) -> Self {
        self.channel = Some(channel.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Refresh mutable metadata in place.
    ///
    /// The user id is always replaced; channel, source and username only when
    /// a new value is supplied.
    pub fn refresh(
        &mut self,
        user_id: &str,
        channel: Option<&str>,
        source: Option<&str>,
        username: Option<&str>,
    ) {
        self.user_id = user_id.to_string();
        if let Some(channel) = channel {
            self.channel = Some(channel.to_string());
        }
        if let Some(source) = source {
            self.source = Some(source.to_string());
        }
        if let Some(username) = username {
            self.username = Some(username.to_string());
        }
    }
}

/// A message dispatched to a user through their originating channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub text: String,
}

impl Notification {
    /// Address a notification back to the session's originating channel.
    pub fn to_session(session: &SessionContext, title: Option<&str>, text: impl Into<String>) -> Self {
        Self {
            channel: session.channel.clone(),
            source: session.source.clone(),
            user_id: session.user_id.clone(),
            username: session.username.clone(),
            title: title.map(str::to_string),
            text: text.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refresh_keeps_metadata_when_not_supplied() {
        let mut ctx = SessionContext::new("s1", "u1")
            .with_channel("telegram")
            .with_username("alice");

        ctx.refresh("u2", None, Some("bot-a"), None);

        assert_eq!(ctx.user_id, "u2");
        assert_eq!(ctx.channel.as_deref(), Some("telegram"));
        assert_eq!(ctx.source.as_deref(), Some("bot-a"));
        assert_eq!(ctx.username.as_deref(), Some("alice"));
    }

    #[test]
    fn notification_copies_session_routing() {
        let ctx = SessionContext::new("s1", "u1").with_channel("slack");
        let note = Notification::to_session(&ctx, Some("Title"), "hello");

        assert_eq!(note.channel.as_deref(), Some("slack"));
        assert_eq!(note.user_id, "u1");
        assert_eq!(note.title.as_deref(), Some("Title"));
        assert_eq!(note.text, "hello");
    }
}
