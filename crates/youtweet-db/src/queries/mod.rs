pub mod comments;
pub mod likes;
pub mod playlists;
pub mod stats;
pub mod subscriptions;
pub mod tweets;
pub mod users;
pub mod videos;
