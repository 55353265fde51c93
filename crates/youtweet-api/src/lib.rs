pub mod auth;
pub mod comments;
pub mod dashboard;
pub mod error;
pub mod likes;
pub mod middleware;
pub mod playlists;
pub mod subscriptions;
pub mod tweets;
pub mod users;
pub mod videos;

use serde::Deserialize;

use youtweet_types::pagination::{DEFAULT_PAGE_SIZE, PageRequest};

/// Common `?page=&limit=` parameters for paginated listings.
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_page() -> u32 {
    1
}

fn default_limit() -> u32 {
    DEFAULT_PAGE_SIZE
}

impl PageQuery {
    pub fn to_request(&self) -> PageRequest {
        PageRequest::new(self.page, self.limit)
    }
}
