//! Database row types — these map directly to SQLite rows.
//! Distinct from the youtweet-types API models to keep the DB layer
//! independent; conversion parses ids and timestamps with a tolerant
//! fallback so one corrupt row cannot poison a whole listing.

use chrono::{DateTime, NaiveDateTime, Utc};
use rusqlite::Row;
use tracing::warn;
use uuid::Uuid;

use youtweet_types::api::{ChannelVideo, CommentWithOwner, OwnerSummary, VideoWithOwner};
use youtweet_types::models::{Comment, Playlist, Tweet, User, Video};

pub(crate) fn parse_id(raw: &str, context: &str) -> Uuid {
    raw.parse().unwrap_or_else(|e| {
        warn!("Corrupt {} id '{}': {}", context, raw, e);
        Uuid::default()
    })
}

/// SQLite stores timestamps as "YYYY-MM-DD HH:MM:SS" without timezone.
/// Parse RFC 3339 first, then fall back to naive UTC.
pub(crate) fn parse_timestamp(raw: &str, context: &str) -> DateTime<Utc> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!("Corrupt timestamp '{}' on {}: {}", raw, context, e);
            DateTime::default()
        })
}

// -- Users --

pub struct UserRow {
    pub id: String,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub password: String,
    pub avatar_url: Option<String>,
    pub cover_image_url: Option<String>,
    pub created_at: String,
}

impl UserRow {
    pub(crate) const COLUMNS: &'static str =
        "u.id, u.username, u.email, u.full_name, u.password, u.avatar_url, u.cover_image_url, u.created_at";

    pub(crate) fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            username: row.get(1)?,
            email: row.get(2)?,
            full_name: row.get(3)?,
            password: row.get(4)?,
            avatar_url: row.get(5)?,
            cover_image_url: row.get(6)?,
            created_at: row.get(7)?,
        })
    }

    pub fn into_user(self) -> User {
        User {
            id: parse_id(&self.id, "user"),
            username: self.username,
            email: self.email,
            full_name: self.full_name,
            avatar_url: self.avatar_url,
            cover_image_url: self.cover_image_url,
            created_at: parse_timestamp(&self.created_at, "user"),
        }
    }
}

// -- Videos --

pub struct VideoRow {
    pub id: String,
    pub owner_id: String,
    pub video_file: String,
    pub thumbnail: String,
    pub title: String,
    pub description: String,
    pub duration: f64,
    pub views: i64,
    pub published: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl VideoRow {
    pub(crate) const COLUMNS: &'static str =
        "v.id, v.owner_id, v.video_file, v.thumbnail, v.title, v.description, v.duration, v.views, v.published, v.created_at, v.updated_at";

    pub(crate) fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            owner_id: row.get(1)?,
            video_file: row.get(2)?,
            thumbnail: row.get(3)?,
            title: row.get(4)?,
            description: row.get(5)?,
            duration: row.get(6)?,
            views: row.get(7)?,
            published: row.get(8)?,
            created_at: row.get(9)?,
            updated_at: row.get(10)?,
        })
    }

    pub fn into_video(self) -> Video {
        Video {
            id: parse_id(&self.id, "video"),
            owner_id: parse_id(&self.owner_id, "video owner"),
            video_file: self.video_file,
            thumbnail: self.thumbnail,
            title: self.title,
            description: self.description,
            duration: self.duration,
            views: self.views.max(0) as u64,
            published: self.published,
            created_at: parse_timestamp(&self.created_at, "video"),
            updated_at: parse_timestamp(&self.updated_at, "video"),
        }
    }
}

/// Video row joined with its owner summary in one statement — listings
/// never do per-item owner lookups.
pub struct VideoWithOwnerRow {
    pub video: VideoRow,
    pub owner_username: String,
    pub owner_full_name: String,
    pub owner_avatar_url: Option<String>,
}

impl VideoWithOwnerRow {
    pub(crate) const COLUMNS: &'static str =
        "v.id, v.owner_id, v.video_file, v.thumbnail, v.title, v.description, v.duration, v.views, v.published, v.created_at, v.updated_at, u.username, u.full_name, u.avatar_url";

    pub(crate) fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            video: VideoRow::from_row(row)?,
            owner_username: row.get::<_, Option<String>>(11)?.unwrap_or_else(|| "unknown".to_string()),
            owner_full_name: row.get::<_, Option<String>>(12)?.unwrap_or_default(),
            owner_avatar_url: row.get(13)?,
        })
    }

    fn owner_summary(&self) -> OwnerSummary {
        OwnerSummary {
            id: parse_id(&self.video.owner_id, "video owner"),
            username: self.owner_username.clone(),
            full_name: self.owner_full_name.clone(),
            avatar_url: self.owner_avatar_url.clone(),
        }
    }

    pub fn into_with_owner(self) -> VideoWithOwner {
        let owner = self.owner_summary();
        VideoWithOwner {
            video: self.video.into_video(),
            owner,
        }
    }

    pub fn into_channel_video(self) -> ChannelVideo {
        ChannelVideo {
            video: self.video.into_video(),
            username: self.owner_username,
            full_name: self.owner_full_name,
            avatar_url: self.owner_avatar_url,
        }
    }
}

// -- Comments --

pub struct CommentRow {
    pub id: String,
    pub video_id: String,
    pub owner_id: String,
    pub content: String,
    pub created_at: String,
    pub updated_at: String,
}

impl CommentRow {
    pub(crate) const COLUMNS: &'static str =
        "c.id, c.video_id, c.owner_id, c.content, c.created_at, c.updated_at";

    pub(crate) fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            video_id: row.get(1)?,
            owner_id: row.get(2)?,
            content: row.get(3)?,
            created_at: row.get(4)?,
            updated_at: row.get(5)?,
        })
    }

    pub fn into_comment(self) -> Comment {
        Comment {
            id: parse_id(&self.id, "comment"),
            video_id: parse_id(&self.video_id, "comment video"),
            owner_id: parse_id(&self.owner_id, "comment owner"),
            content: self.content,
            created_at: parse_timestamp(&self.created_at, "comment"),
            updated_at: parse_timestamp(&self.updated_at, "comment"),
        }
    }
}

pub struct CommentWithOwnerRow {
    pub comment: CommentRow,
    pub owner_username: String,
    pub owner_full_name: String,
    pub owner_avatar_url: Option<String>,
}

impl CommentWithOwnerRow {
    pub(crate) const COLUMNS: &'static str =
        "c.id, c.video_id, c.owner_id, c.content, c.created_at, c.updated_at, u.username, u.full_name, u.avatar_url";

    pub(crate) fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            comment: CommentRow::from_row(row)?,
            owner_username: row.get::<_, Option<String>>(6)?.unwrap_or_else(|| "unknown".to_string()),
            owner_full_name: row.get::<_, Option<String>>(7)?.unwrap_or_default(),
            owner_avatar_url: row.get(8)?,
        })
    }

    pub fn into_with_owner(self) -> CommentWithOwner {
        let owner = OwnerSummary {
            id: parse_id(&self.comment.owner_id, "comment owner"),
            username: self.owner_username,
            full_name: self.owner_full_name,
            avatar_url: self.owner_avatar_url,
        };
        CommentWithOwner {
            comment: self.comment.into_comment(),
            owner,
        }
    }
}

// -- Tweets --

pub struct TweetRow {
    pub id: String,
    pub owner_id: String,
    pub content: String,
    pub created_at: String,
    pub updated_at: String,
}

impl TweetRow {
    pub(crate) const COLUMNS: &'static str =
        "t.id, t.owner_id, t.content, t.created_at, t.updated_at";

    pub(crate) fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            owner_id: row.get(1)?,
            content: row.get(2)?,
            created_at: row.get(3)?,
            updated_at: row.get(4)?,
        })
    }

    pub fn into_tweet(self) -> Tweet {
        Tweet {
            id: parse_id(&self.id, "tweet"),
            owner_id: parse_id(&self.owner_id, "tweet owner"),
            content: self.content,
            created_at: parse_timestamp(&self.created_at, "tweet"),
            updated_at: parse_timestamp(&self.updated_at, "tweet"),
        }
    }
}

// -- Playlists --

pub struct PlaylistRow {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub description: String,
    pub created_at: String,
    pub updated_at: String,
}

impl PlaylistRow {
    pub(crate) const COLUMNS: &'static str =
        "p.id, p.owner_id, p.name, p.description, p.created_at, p.updated_at";

    pub(crate) fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            owner_id: row.get(1)?,
            name: row.get(2)?,
            description: row.get(3)?,
            created_at: row.get(4)?,
            updated_at: row.get(5)?,
        })
    }

    pub fn into_playlist(self, video_ids: Vec<Uuid>) -> Playlist {
        Playlist {
            id: parse_id(&self.id, "playlist"),
            owner_id: parse_id(&self.owner_id, "playlist owner"),
            name: self.name,
            description: self.description,
            video_ids,
            created_at: parse_timestamp(&self.created_at, "playlist"),
            updated_at: parse_timestamp(&self.updated_at, "playlist"),
        }
    }
}
