//! Media search, subscription and library tools.

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::{error, info, warn};

use super::library::{MediaInfo, MediaLibrary, MediaType, SubscriptionRequest, SubscriptionState};
use crate::error::ReelError;
use crate::tools::arguments::ToolArguments;
use crate::tools::tool::{Tool, ToolExecutionContext};
use crate::tools::types::AgentToolParameters;

/// Number of hits announced to the user individually.
const ANNOUNCED_RESULTS: usize = 5;

const ALL: &str = "all";

async fn announce(ctx: &ToolExecutionContext, title: &str, text: impl Into<String>) {
    if let Err(e) = ctx.notify(Some(title), text).await {
        warn!(error = %e, "tool notification failed");
    }
}

fn with_year(title: &str, year: Option<&str>) -> String {
    match year {
        Some(year) => format!("{title} ({year})"),
        None => title.to_string(),
    }
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    title: String,
    #[serde(default)]
    year: Option<String>,
    #[serde(default)]
    media_type: Option<String>,
    #[serde(default)]
    season: Option<u32>,
}

/// `search_media`: look up movies and series by title.
pub struct SearchMediaTool {
    library: Arc<dyn MediaLibrary>,
    parameters: AgentToolParameters,
}

impl SearchMediaTool {
    pub fn new(library: Arc<dyn MediaLibrary>) -> Self {
        Self {
            library,
            parameters: AgentToolParameters::object()
                .string("title", "Title of the movie or series to search for", true)
                .explanation()
                .string("year", "Release year to narrow the search", false)
                .string_enum("media_type", "Restrict to one kind of media", &["movie", "tv"], false)
                .integer("season", "Season number, for series", false)
                .build(),
        }
    }

    fn matches(item: &MediaInfo, params: &SearchParams, media_type: Option<MediaType>) -> bool {
        if let Some(year) = params.year.as_deref().filter(|y| !y.is_empty()) {
            if item.year.as_deref() != Some(year) {
                return false;
            }
        }
        if media_type.is_some_and(|t| t != item.media_type) {
            return false;
        }
        if params.season.is_some() && item.season != params.season {
            return false;
        }
        true
    }
}

#[async_trait]
impl Tool for SearchMediaTool {
    fn name(&self) -> &str {
        "search_media"
    }

    fn description(&self) -> &str {
        "Search movies and TV series by title, optionally filtered by year, media type and season."
    }

    fn parameters(&self) -> &AgentToolParameters {
        &self.parameters
    }

    fn progress_message(&self, args: &ToolArguments) -> Option<String> {
        let title = args.get_str_opt("title")?;
        Some(format!(
            "Searching media: {}",
            with_year(title, args.get_str_opt("year"))
        ))
    }

    async fn execute(
        &self,
        args: &ToolArguments,
        ctx: &ToolExecutionContext,
    ) -> Result<Value, ReelError> {
        let params: SearchParams = match args.deserialize() {
            Ok(params) => params,
            Err(e) => return Ok(Value::String(format!("Invalid search parameters: {e}"))),
        };
        info!(tool = self.name(), title = %params.title, year = ?params.year, season = ?params.season, "searching media");

        // Unknown media types are ignored rather than rejected.
        let media_type = params
            .media_type
            .as_deref()
            .and_then(|t| MediaType::from_str(t).ok());

        let candidates = match self.library.search(&params.title).await {
            Ok(candidates) => candidates,
            Err(e) => {
                error!(tool = self.name(), error = %e, "media search failed");
                let message = format!("Media search failed: {e}");
                announce(ctx, "Search failed", message.clone()).await;
                return Ok(Value::String(message));
            }
        };
        if candidates.is_empty() {
            let message = format!("No media found for: {}", params.title);
            announce(ctx, "Search finished", message.clone()).await;
            return Ok(Value::String(message));
        }

        let hits: Vec<MediaInfo> = candidates
            .into_iter()
            .filter(|item| Self::matches(item, &params, media_type))
            .collect();
        if hits.is_empty() {
            let message = format!("No media matched the given filters: {}", params.title);
            announce(ctx, "Search finished", message.clone()).await;
            return Ok(Value::String(message));
        }

        announce(ctx, "Search succeeded", format!("Found {} matching titles", hits.len())).await;
        for (i, item) in hits.iter().take(ANNOUNCED_RESULTS).enumerate() {
            let line = format!(
                "{}. {} - {}",
                i + 1,
                with_year(&item.title, item.year.as_deref()),
                item.media_type
            );
            announce(ctx, "Search result", line).await;
        }

        Ok(serde_json::to_value(hits)?)
    }
}

#[derive(Debug, Deserialize)]
struct SubscribeParams {
    title: String,
    year: String,
    media_type: String,
    #[serde(default)]
    season: Option<u32>,
    #[serde(default)]
    tmdb_id: Option<String>,
}

/// `add_subscribe`: start tracking a movie or series.
pub struct AddSubscribeTool {
    library: Arc<dyn MediaLibrary>,
    parameters: AgentToolParameters,
}

impl AddSubscribeTool {
    pub fn new(library: Arc<dyn MediaLibrary>) -> Self {
        Self {
            library,
            parameters: AgentToolParameters::object()
                .string("title", "Title of the media to subscribe to", true)
                .string("year", "Release year", true)
                .string_enum("media_type", "Kind of media", &["movie", "tv"], true)
                .explanation()
                .integer("season", "Season number, for series", false)
                .string("tmdb_id", "TMDB identifier, if known", false)
                .build(),
        }
    }
}

#[async_trait]
impl Tool for AddSubscribeTool {
    fn name(&self) -> &str {
        "add_subscribe"
    }

    fn description(&self) -> &str {
        "Subscribe to a movie or TV series so new releases are tracked for the user."
    }

    fn parameters(&self) -> &AgentToolParameters {
        &self.parameters
    }

    fn progress_message(&self, args: &ToolArguments) -> Option<String> {
        let title = args.get_str_opt("title")?;
        let media_type = args.get_str_opt("media_type").unwrap_or("media");
        Some(format!(
            "Adding subscription: {} - {media_type}",
            with_year(title, args.get_str_opt("year"))
        ))
    }

    async fn execute(
        &self,
        args: &ToolArguments,
        ctx: &ToolExecutionContext,
    ) -> Result<Value, ReelError> {
        let params: SubscribeParams = match args.deserialize() {
            Ok(params) => params,
            Err(e) => return Ok(Value::String(format!("Invalid subscription parameters: {e}"))),
        };
        info!(tool = self.name(), title = %params.title, year = %params.year, "adding subscription");

        let Ok(media_type) = MediaType::from_str(&params.media_type) else {
            return Ok(Value::String(format!(
                "Unsupported media type '{}': expected movie or tv",
                params.media_type
            )));
        };
        let tmdb_id = params
            .tmdb_id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
            .and_then(|id| match id.trim().parse::<i64>() {
                Ok(id) => Some(id),
                Err(_) => {
                    warn!(tmdb_id = id, "ignoring invalid tmdb_id");
                    None
                }
            });

        let request = SubscriptionRequest {
            title: params.title.clone(),
            year: params.year.clone(),
            media_type,
            season: params.season,
            tmdb_id,
            username: ctx.session.user_id.clone(),
        };
        let message = match self.library.subscribe(request).await {
            Ok(subscription) => {
                let message = format!(
                    "Subscribed to {} (id {})",
                    with_year(&subscription.title, Some(&subscription.year)),
                    subscription.id
                );
                announce(ctx, "Subscription added", message.clone()).await;
                message
            }
            Err(e) => {
                let message = format!("Failed to add subscription: {e}");
                announce(ctx, "Subscription failed", message.clone()).await;
                message
            }
        };
        Ok(Value::String(message))
    }
}

/// `query_subscribes`: list the user's subscriptions.
pub struct QuerySubscribesTool {
    library: Arc<dyn MediaLibrary>,
    parameters: AgentToolParameters,
}

impl QuerySubscribesTool {
    pub fn new(library: Arc<dyn MediaLibrary>) -> Self {
        Self {
            library,
            parameters: AgentToolParameters::object()
                .explanation()
                .string_with_default(
                    "status",
                    "Filter by status: 'R' for running, 'P' for paused, 'all' for every subscription",
                    ALL,
                )
                .string_with_default(
                    "media_type",
                    "Filter by media type: 'movie', 'tv' or 'all'",
                    ALL,
                )
                .build(),
        }
    }
}

#[async_trait]
impl Tool for QuerySubscribesTool {
    fn name(&self) -> &str {
        "query_subscribes"
    }

    fn description(&self) -> &str {
        "List the user's subscriptions with their status and configuration."
    }

    fn parameters(&self) -> &AgentToolParameters {
        &self.parameters
    }

    async fn execute(
        &self,
        args: &ToolArguments,
        _ctx: &ToolExecutionContext,
    ) -> Result<Value, ReelError> {
        let status = args.get_str_opt("status").unwrap_or(ALL);
        let media_type = args.get_str_opt("media_type").unwrap_or(ALL);
        info!(tool = self.name(), status, media_type, "querying subscriptions");

        let status_filter = if status.eq_ignore_ascii_case(ALL) {
            None
        } else {
            match SubscriptionState::from_str(status) {
                Ok(state) => Some(state),
                Err(_) => return Ok(Value::String(format!("Unknown subscription status '{status}'"))),
            }
        };
        let type_filter = if media_type.eq_ignore_ascii_case(ALL) {
            None
        } else {
            match MediaType::from_str(media_type) {
                Ok(t) => Some(t),
                Err(_) => return Ok(Value::String(format!("Unknown media type '{media_type}'"))),
            }
        };

        let subscriptions = match self.library.subscriptions().await {
            Ok(subscriptions) => subscriptions,
            Err(e) => {
                error!(tool = self.name(), error = %e, "subscription query failed");
                return Ok(Value::String(format!("Failed to query subscriptions: {e}")));
            }
        };
        let matching: Vec<_> = subscriptions
            .into_iter()
            .filter(|s| status_filter.map_or(true, |state| s.state == state))
            .filter(|s| type_filter.map_or(true, |t| s.media_type == t))
            .collect();

        if matching.is_empty() {
            return Ok(Value::String("No matching subscriptions found.".into()));
        }
        Ok(serde_json::to_value(matching)?)
    }
}

/// `query_media_library`: what is already in the media server.
pub struct QueryMediaLibraryTool {
    library: Arc<dyn MediaLibrary>,
    parameters: AgentToolParameters,
}

impl QueryMediaLibraryTool {
    pub fn new(library: Arc<dyn MediaLibrary>) -> Self {
        Self {
            library,
            parameters: AgentToolParameters::object()
                .explanation()
                .string_with_default(
                    "media_type",
                    "Filter by media type: 'movie', 'tv' or 'all'",
                    ALL,
                )
                .string("title", "Part of the title to look for", false)
                .build(),
        }
    }
}

#[async_trait]
impl Tool for QueryMediaLibraryTool {
    fn name(&self) -> &str {
        "query_media_library"
    }

    fn description(&self) -> &str {
        "Check which movies and series are already in the media library."
    }

    fn parameters(&self) -> &AgentToolParameters {
        &self.parameters
    }

    fn progress_message(&self, args: &ToolArguments) -> Option<String> {
        let title = args.get_str_opt("title").filter(|t| !t.trim().is_empty())?;
        Some(format!("Checking the media library for: {title}"))
    }

    async fn execute(
        &self,
        args: &ToolArguments,
        _ctx: &ToolExecutionContext,
    ) -> Result<Value, ReelError> {
        let media_type = args.get_str_opt("media_type").unwrap_or(ALL);
        let title = args
            .get_str_opt("title")
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty());
        info!(tool = self.name(), media_type, title = ?title, "querying media library");

        let type_filter = if media_type.eq_ignore_ascii_case(ALL) {
            None
        } else {
            match MediaType::from_str(media_type) {
                Ok(t) => Some(t),
                Err(_) => return Ok(Value::String(format!("Unknown media type '{media_type}'"))),
            }
        };

        let items = match self.library.library_items().await {
            Ok(items) => items,
            Err(e) => {
                error!(tool = self.name(), error = %e, "media library query failed");
                return Ok(Value::String(format!("Failed to query the media library: {e}")));
            }
        };
        let matching: Vec<MediaInfo> = items
            .into_iter()
            .filter(|item| type_filter.map_or(true, |t| item.media_type == t))
            .filter(|item| {
                title
                    .as_deref()
                    .map_or(true, |needle| item.title.to_lowercase().contains(needle))
            })
            .collect();

        if matching.is_empty() {
            return Ok(Value::String("No matching media found in the library.".into()));
        }
        Ok(serde_json::to_value(matching)?)
    }
}
