use rusqlite::{Connection, OptionalExtension};
use uuid::Uuid;

use youtweet_types::api::VideoWithOwner;
use youtweet_types::models::LikeTarget;
use youtweet_types::pagination::{Page, PageRequest, SortDirection};

use crate::Database;
use crate::error::{StoreError, StoreResult};
use crate::models::VideoWithOwnerRow;
use crate::queries::comments::comment_exists;
use crate::queries::tweets::tweet_exists;
use crate::queries::videos::{OWNER_JOIN, video_exists};
use crate::query::{SelectBuilder, fetch_page, sql_param};

impl Database {
    /// Toggle a like: removes if present, inserts if not. Returns the
    /// resulting state — true means the like now exists. Toggling twice
    /// restores the original state.
    pub fn toggle_like(&self, id: Uuid, user_id: Uuid, target: &LikeTarget) -> StoreResult<bool> {
        self.with_conn(|conn| {
            if !target_exists(conn, target)? {
                return Err(StoreError::NotFound(target.kind()));
            }

            let existing: Option<String> = conn
                .query_row(
                    "SELECT id FROM likes WHERE user_id = ?1 AND target_kind = ?2 AND target_id = ?3",
                    rusqlite::params![
                        user_id.to_string(),
                        target.kind(),
                        target.id().to_string()
                    ],
                    |row| row.get(0),
                )
                .optional()?;

            if let Some(existing_id) = existing {
                conn.execute("DELETE FROM likes WHERE id = ?1", [&existing_id])?;
                Ok(false)
            } else {
                conn.execute(
                    "INSERT INTO likes (id, user_id, target_kind, target_id) VALUES (?1, ?2, ?3, ?4)",
                    rusqlite::params![
                        id.to_string(),
                        user_id.to_string(),
                        target.kind(),
                        target.id().to_string()
                    ],
                )?;
                Ok(true)
            }
        })
    }

    pub fn is_liked(&self, user_id: Uuid, target: &LikeTarget) -> StoreResult<bool> {
        self.with_conn(|conn| {
            let found: Option<i64> = conn
                .query_row(
                    "SELECT 1 FROM likes WHERE user_id = ?1 AND target_kind = ?2 AND target_id = ?3",
                    rusqlite::params![
                        user_id.to_string(),
                        target.kind(),
                        target.id().to_string()
                    ],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(found.is_some())
        })
    }

    /// Videos the user has liked, most recent like first.
    pub fn list_liked_videos(
        &self,
        user_id: Uuid,
        page: &PageRequest,
    ) -> StoreResult<Page<VideoWithOwner>> {
        self.with_conn(|conn| {
            let builder = SelectBuilder::new("likes l", VideoWithOwnerRow::COLUMNS)
                .join("JOIN videos v ON v.id = l.target_id AND l.target_kind = 'video'")
                .join(OWNER_JOIN)
                .filter("l.user_id = ?", vec![sql_param(user_id.to_string())])
                .sort("l.created_at", SortDirection::Descending, "l.rowid DESC")
                .paginate(page);

            Ok(fetch_page(conn, &builder, page, VideoWithOwnerRow::from_row)?
                .map(VideoWithOwnerRow::into_with_owner))
        })
    }
}

fn target_exists(conn: &Connection, target: &LikeTarget) -> StoreResult<bool> {
    match target {
        LikeTarget::Video(id) => video_exists(conn, *id),
        LikeTarget::Comment(id) => comment_exists(conn, *id),
        LikeTarget::Tweet(id) => tweet_exists(conn, *id),
    }
}
