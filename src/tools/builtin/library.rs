//! Media library boundary used by the built-in tools.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::ReelError;

/// Kind of media item.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum MediaType {
    Movie,
    Tv,
}

/// One entry of the media catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaInfo {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
    pub media_type: MediaType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub season: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tmdb_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overview: Option<String>,
}

impl MediaInfo {
    pub fn new(title: impl Into<String>, year: impl Into<String>, media_type: MediaType) -> Self {
        Self {
            title: title.into(),
            year: Some(year.into()),
            media_type,
            season: None,
            tmdb_id: None,
            overview: None,
        }
    }

    pub fn with_season(mut self, season: u32) -> Self {
        self.season = Some(season);
        self
    }

    pub fn with_tmdb_id(mut self, tmdb_id: i64) -> Self {
        self.tmdb_id = Some(tmdb_id);
        self
    }
}

/// Whether a subscription is actively being tracked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::EnumString)]
pub enum SubscriptionState {
    /// Running.
    #[serde(rename = "R")]
    #[strum(serialize = "R")]
    Running,
    /// Paused.
    #[serde(rename = "P")]
    #[strum(serialize = "P")]
    Paused,
}

/// Request to start tracking a media item.
#[derive(Debug, Clone, PartialEq)]
pub struct SubscriptionRequest {
    pub title: String,
    pub year: String,
    pub media_type: MediaType,
    pub season: Option<u32>,
    pub tmdb_id: Option<i64>,
    pub username: String,
}

/// A tracked media item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: u64,
    pub title: String,
    pub year: String,
    pub media_type: MediaType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub season: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tmdb_id: Option<i64>,
    pub state: SubscriptionState,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

/// Media search and subscription backend.
#[async_trait]
pub trait MediaLibrary: Send + Sync {
    /// Candidates whose title matches `title`. Callers apply finer filters.
    async fn search(&self, title: &str) -> Result<Vec<MediaInfo>, ReelError>;

    /// Start tracking an item. Fails if the item is already tracked.
    async fn subscribe(&self, request: SubscriptionRequest) -> Result<Subscription, ReelError>;

    /// Every subscription, oldest first.
    async fn subscriptions(&self) -> Result<Vec<Subscription>, ReelError>;

    /// Items already present in the media server.
    async fn library_items(&self) -> Result<Vec<MediaInfo>, ReelError>;
}

/// Library backed by a fixed in-process catalog.
#[derive(Debug)]
pub struct InMemoryMediaLibrary {
    catalog: Vec<MediaInfo>,
    library: Vec<MediaInfo>,
    subscriptions: RwLock<Vec<Subscription>>,
    next_id: AtomicU64,
}

impl Default for InMemoryMediaLibrary {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl InMemoryMediaLibrary {
    pub fn new(catalog: Vec<MediaInfo>) -> Self {
        Self {
            catalog,
            library: Vec::new(),
            subscriptions: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Mark `items` as already present in the media server.
    pub fn with_library_items(mut self, items: Vec<MediaInfo>) -> Self {
        self.library = items;
        self
    }

    /// A handful of well-known titles, for local runs.
    pub fn with_sample_catalog() -> Self {
        Self::new(vec![
            MediaInfo::new("The Matrix", "1999", MediaType::Movie).with_tmdb_id(603),
            MediaInfo::new("The Matrix Reloaded", "2003", MediaType::Movie).with_tmdb_id(604),
            MediaInfo::new("Heat", "1995", MediaType::Movie).with_tmdb_id(949),
            MediaInfo::new("Breaking Bad", "2008", MediaType::Tv)
                .with_season(1)
                .with_tmdb_id(1396),
            MediaInfo::new("The Expanse", "2015", MediaType::Tv)
                .with_season(1)
                .with_tmdb_id(63639),
        ])
        .with_library_items(vec![
            MediaInfo::new("The Matrix", "1999", MediaType::Movie).with_tmdb_id(603),
            MediaInfo::new("Breaking Bad", "2008", MediaType::Tv)
                .with_season(1)
                .with_tmdb_id(1396),
        ])
    }
}

#[async_trait]
impl MediaLibrary for InMemoryMediaLibrary {
    async fn search(&self, title: &str) -> Result<Vec<MediaInfo>, ReelError> {
        let needle = title.trim().to_lowercase();
        if needle.is_empty() {
            return Err(ReelError::InvalidArgument("search title is empty".into()));
        }
        Ok(self
            .catalog
            .iter()
            .filter(|item| item.title.to_lowercase().contains(&needle))
            .cloned()
            .collect())
    }

    async fn subscribe(&self, request: SubscriptionRequest) -> Result<Subscription, ReelError> {
        let mut subscriptions = self.subscriptions.write().await;
        let duplicate = subscriptions.iter().any(|s| {
            s.title.eq_ignore_ascii_case(&request.title)
                && s.year == request.year
                && s.media_type == request.media_type
                && s.season == request.season
        });
        if duplicate {
            return Err(ReelError::InvalidState(format!(
                "{} ({}) is already subscribed",
                request.title, request.year
            )));
        }

        let subscription = Subscription {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            title: request.title,
            year: request.year,
            media_type: request.media_type,
            season: request.season,
            tmdb_id: request.tmdb_id,
            state: SubscriptionState::Running,
            username: request.username,
            created_at: Utc::now(),
        };
        debug!(id = subscription.id, title = %subscription.title, "subscription added");
        subscriptions.push(subscription.clone());
        Ok(subscription)
    }

    async fn subscriptions(&self) -> Result<Vec<Subscription>, ReelError> {
        Ok(self.subscriptions.read().await.clone())
    }

    async fn library_items(&self) -> Result<Vec<MediaInfo>, ReelError> {
        Ok(self.library.clone())
    }
}
