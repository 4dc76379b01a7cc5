//! Built-in media automation tools.
//!
//! Provides `search_media`, `add_subscribe`, `query_subscribes`,
//! `query_media_library` and `send_message`. All but `send_message` are
//! backed by a [`MediaLibrary`].
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use reel::tools::builtin::{all_tools, InMemoryMediaLibrary};
//!
//! let tools = all_tools(Arc::new(InMemoryMediaLibrary::default()));
//! assert_eq!(tools.len(), 5);
//! ```

mod library;
mod media;
mod messaging;

use std::sync::Arc;

pub use library::{
    InMemoryMediaLibrary, MediaInfo, MediaLibrary, MediaType, Subscription, SubscriptionRequest,
    SubscriptionState,
};
pub use media::{AddSubscribeTool, QueryMediaLibraryTool, QuerySubscribesTool, SearchMediaTool};
pub use messaging::send_message_tool;

use super::tool::Tool;

/// Every built-in tool, in catalog order.
pub fn all_tools(library: Arc<dyn MediaLibrary>) -> Vec<Arc<dyn Tool>> {
    vec![
        Arc::new(SearchMediaTool::new(library.clone())),
        Arc::new(AddSubscribeTool::new(library.clone())),
        Arc::new(QuerySubscribesTool::new(library.clone())),
        Arc::new(QueryMediaLibraryTool::new(library)),
        send_message_tool(),
    ]
}
