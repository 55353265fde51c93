use rusqlite::{Connection, OptionalExtension};
use uuid::Uuid;

use youtweet_types::api::{ChannelVideo, VideoWithOwner};
use youtweet_types::models::Video;
use youtweet_types::pagination::{Page, PageRequest, SortDirection};

use crate::Database;
use crate::error::{StoreError, StoreResult};
use crate::models::{VideoRow, VideoWithOwnerRow};
use crate::query::{SelectBuilder, SortSpec, VideoFilter, VideoSortField, fetch_page, sql_param};

pub(crate) const OWNER_JOIN: &str = "LEFT JOIN users u ON u.id = v.owner_id";

// Stable-sort tiebreak: equal keys keep insertion order.
const INSERTION_ORDER: &str = "v.rowid ASC";

pub struct NewVideo<'a> {
    pub title: &'a str,
    pub description: &'a str,
    pub video_file: &'a str,
    pub thumbnail: &'a str,
    pub duration: f64,
}

pub struct VideoChanges<'a> {
    pub title: Option<&'a str>,
    pub description: Option<&'a str>,
    pub thumbnail: Option<&'a str>,
}

impl Database {
    pub fn publish_video(&self, id: Uuid, owner_id: Uuid, new: &NewVideo) -> StoreResult<Video> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO videos (id, owner_id, video_file, thumbnail, title, description, duration)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                rusqlite::params![
                    id.to_string(),
                    owner_id.to_string(),
                    new.video_file,
                    new.thumbnail,
                    new.title,
                    new.description,
                    new.duration
                ],
            )?;

            let row = query_video(conn, id)?.ok_or(StoreError::NotFound("video"))?;
            Ok(row.into_video())
        })
    }

    pub fn get_video(&self, id: Uuid) -> StoreResult<Option<Video>> {
        self.with_conn(|conn| Ok(query_video(conn, id)?.map(VideoRow::into_video)))
    }

    /// The video feed: text/owner/published filter stages, one declared
    /// sort field, owner summary joined in the same statement.
    pub fn list_videos(
        &self,
        filter: &VideoFilter,
        sort: &SortSpec,
        page: &PageRequest,
    ) -> StoreResult<Page<VideoWithOwner>> {
        self.with_conn(|conn| {
            let builder = video_listing(filter)
                .sort(sort.field.column(), sort.direction, INSERTION_ORDER)
                .paginate(page);

            Ok(fetch_page(conn, &builder, page, VideoWithOwnerRow::from_row)?
                .map(VideoWithOwnerRow::into_with_owner))
        })
    }

    /// A channel's published uploads, newest first, owner summary fields
    /// flattened onto each item.
    pub fn channel_videos(
        &self,
        channel_id: Uuid,
        page: &PageRequest,
    ) -> StoreResult<Page<ChannelVideo>> {
        let filter = VideoFilter {
            text_query: None,
            owner_id: Some(channel_id),
            published_only: true,
        };

        self.with_conn(|conn| {
            let builder = video_listing(&filter)
                .sort(
                    VideoSortField::CreatedAt.column(),
                    SortDirection::Descending,
                    INSERTION_ORDER,
                )
                .paginate(page);

            Ok(fetch_page(conn, &builder, page, VideoWithOwnerRow::from_row)?
                .map(VideoWithOwnerRow::into_channel_video))
        })
    }

    /// Single-video read with side effects: bumps the view counter and
    /// refreshes the viewer's watch history. An unpublished video is
    /// visible to its owner only; everyone else sees NotFound.
    pub fn watch_video(&self, viewer_id: Uuid, video_id: Uuid) -> StoreResult<VideoWithOwner> {
        self.with_conn(|conn| {
            let row =
                query_video_with_owner(conn, video_id)?.ok_or(StoreError::NotFound("video"))?;
            if !row.video.published && row.video.owner_id != viewer_id.to_string() {
                return Err(StoreError::NotFound("video"));
            }

            conn.execute(
                "UPDATE videos SET views = views + 1 WHERE id = ?1",
                [video_id.to_string()],
            )?;
            conn.execute(
                "INSERT INTO watch_history (user_id, video_id) VALUES (?1, ?2)
                 ON CONFLICT(user_id, video_id) DO UPDATE SET watched_at = datetime('now')",
                rusqlite::params![viewer_id.to_string(), video_id.to_string()],
            )?;

            let row =
                query_video_with_owner(conn, video_id)?.ok_or(StoreError::NotFound("video"))?;
            Ok(row.into_with_owner())
        })
    }

    pub fn list_watch_history(
        &self,
        user_id: Uuid,
        page: &PageRequest,
    ) -> StoreResult<Page<VideoWithOwner>> {
        self.with_conn(|conn| {
            let builder = SelectBuilder::new("watch_history w", VideoWithOwnerRow::COLUMNS)
                .join("JOIN videos v ON v.id = w.video_id")
                .join(OWNER_JOIN)
                .filter("w.user_id = ?", vec![sql_param(user_id.to_string())])
                .sort("w.watched_at", SortDirection::Descending, "w.rowid DESC")
                .paginate(page);

            Ok(fetch_page(conn, &builder, page, VideoWithOwnerRow::from_row)?
                .map(VideoWithOwnerRow::into_with_owner))
        })
    }

    pub fn update_video(
        &self,
        requester: Uuid,
        video_id: Uuid,
        changes: &VideoChanges,
    ) -> StoreResult<Video> {
        self.with_conn(|conn| {
            fetch_owned_video(conn, requester, video_id)?;

            conn.execute(
                "UPDATE videos SET
                     title = COALESCE(?1, title),
                     description = COALESCE(?2, description),
                     thumbnail = COALESCE(?3, thumbnail),
                     updated_at = datetime('now')
                 WHERE id = ?4",
                rusqlite::params![
                    changes.title,
                    changes.description,
                    changes.thumbnail,
                    video_id.to_string()
                ],
            )?;

            let row = query_video(conn, video_id)?.ok_or(StoreError::NotFound("video"))?;
            Ok(row.into_video())
        })
    }

    /// Owner-initiated delete. Media cleanup belongs to the storage
    /// collaborator; comments, playlist membership and watch history
    /// cascade, likes are cleaned up here.
    pub fn delete_video(&self, requester: Uuid, video_id: Uuid) -> StoreResult<()> {
        self.with_conn(|conn| {
            fetch_owned_video(conn, requester, video_id)?;

            conn.execute(
                "DELETE FROM likes WHERE target_kind = 'comment'
                   AND target_id IN (SELECT id FROM comments WHERE video_id = ?1)",
                [video_id.to_string()],
            )?;
            conn.execute(
                "DELETE FROM likes WHERE target_kind = 'video' AND target_id = ?1",
                [video_id.to_string()],
            )?;
            conn.execute("DELETE FROM videos WHERE id = ?1", [video_id.to_string()])?;

            Ok(())
        })
    }

    /// Flips the published flag and reports the resulting state.
    pub fn toggle_publish(&self, requester: Uuid, video_id: Uuid) -> StoreResult<bool> {
        self.with_conn(|conn| {
            let row = fetch_owned_video(conn, requester, video_id)?;

            conn.execute(
                "UPDATE videos SET published = 1 - published, updated_at = datetime('now')
                 WHERE id = ?1",
                [video_id.to_string()],
            )?;

            Ok(!row.published)
        })
    }
}

/// Filter stages shared by the feed and channel listings.
fn video_listing(filter: &VideoFilter) -> SelectBuilder {
    let mut builder =
        SelectBuilder::new("videos v", VideoWithOwnerRow::COLUMNS).join(OWNER_JOIN);

    if let Some(query) = &filter.text_query {
        builder = builder.filter_text(&["v.title", "v.description"], query);
    }
    if let Some(owner_id) = filter.owner_id {
        builder = builder.filter("v.owner_id = ?", vec![sql_param(owner_id.to_string())]);
    }
    if filter.published_only {
        builder = builder.filter("v.published = 1", vec![]);
    }

    builder
}

pub(crate) fn query_video(conn: &Connection, id: Uuid) -> StoreResult<Option<VideoRow>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM videos v WHERE v.id = ?1",
        VideoRow::COLUMNS
    ))?;

    let row = stmt
        .query_row([id.to_string()], VideoRow::from_row)
        .optional()?;

    Ok(row)
}

fn query_video_with_owner(conn: &Connection, id: Uuid) -> StoreResult<Option<VideoWithOwnerRow>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM videos v {} WHERE v.id = ?1",
        VideoWithOwnerRow::COLUMNS,
        OWNER_JOIN
    ))?;

    let row = stmt
        .query_row([id.to_string()], VideoWithOwnerRow::from_row)
        .optional()?;

    Ok(row)
}

/// Existence first, ownership second.
fn fetch_owned_video(conn: &Connection, requester: Uuid, video_id: Uuid) -> StoreResult<VideoRow> {
    let row = query_video(conn, video_id)?.ok_or(StoreError::NotFound("video"))?;
    if row.owner_id != requester.to_string() {
        return Err(StoreError::Forbidden("only the owner can modify this video"));
    }
    Ok(row)
}

pub(crate) fn video_exists(conn: &Connection, id: Uuid) -> StoreResult<bool> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM videos WHERE id = ?1",
            [id.to_string()],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use youtweet_types::pagination::{PageRequest, SortDirection};

    use crate::error::StoreError;
    use crate::query::{SortSpec, VideoFilter, VideoSortField};
    use crate::test_support::{db, seed_user, seed_video, set_video_row};

    use super::{NewVideo, VideoChanges};

    fn newest_first() -> SortSpec {
        SortSpec {
            field: VideoSortField::CreatedAt,
            direction: SortDirection::Descending,
        }
    }

    #[test]
    fn text_search_pages_newest_first() {
        let db = db();
        let alice = seed_user(&db, "alice");

        // five matching, one not
        for (i, title) in [
            "cat compilation",
            "my CAT sleeps",
            "concatenated clips",
            "dog video",
            "a cat again",
            "cats of 2024",
        ]
        .iter()
        .enumerate()
        {
            let id = seed_video(&db, alice, title, "daily upload");
            set_video_row(&db, id, 0, true, &format!("2024-03-0{} 12:00:00", i + 1));
        }

        let page = db
            .list_videos(
                &VideoFilter {
                    text_query: Some("cat".into()),
                    owner_id: None,
                    published_only: true,
                },
                &newest_first(),
                &PageRequest::new(1, 2),
            )
            .unwrap();

        assert_eq!(page.total_count, 5);
        assert_eq!(page.items.len(), 2);
        assert!(page.has_next);
        assert_eq!(page.next_page, Some(2));
        assert_eq!(page.items[0].video.title, "cats of 2024");
        assert_eq!(page.items[1].video.title, "a cat again");
        assert_eq!(page.items[0].owner.username, "alice");
    }

    #[test]
    fn empty_text_query_matches_everything() {
        let db = db();
        let alice = seed_user(&db, "alice");
        for i in 0..3 {
            let id = seed_video(&db, alice, &format!("video {i}"), "d");
            set_video_row(&db, id, 0, true, &format!("2024-03-0{} 12:00:00", i + 1));
        }

        let no_filter = db
            .list_videos(
                &VideoFilter::default(),
                &newest_first(),
                &PageRequest::new(1, 10),
            )
            .unwrap();
        let empty_query = db
            .list_videos(
                &VideoFilter {
                    text_query: Some(String::new()),
                    owner_id: None,
                    published_only: false,
                },
                &newest_first(),
                &PageRequest::new(1, 10),
            )
            .unwrap();

        assert_eq!(no_filter.total_count, 3);
        assert_eq!(empty_query.total_count, 3);
        let titles = |page: &youtweet_types::pagination::Page<youtweet_types::api::VideoWithOwner>| {
            page.items.iter().map(|v| v.video.title.clone()).collect::<Vec<_>>()
        };
        assert_eq!(titles(&no_filter), titles(&empty_query));
    }

    #[test]
    fn out_of_range_page_is_empty_success() {
        let db = db();
        let alice = seed_user(&db, "alice");
        seed_video(&db, alice, "only one", "d");

        let page = db
            .list_videos(
                &VideoFilter::default(),
                &newest_first(),
                &PageRequest::new(7, 10),
            )
            .unwrap();

        assert!(page.items.is_empty());
        assert_eq!(page.total_count, 1);
        assert!(!page.has_next);
        assert_eq!(page.next_page, None);
    }

    #[test]
    fn published_filter_hides_drafts_and_owner_scope_applies() {
        let db = db();
        let alice = seed_user(&db, "alice");
        let bob = seed_user(&db, "bob");

        let public = seed_video(&db, alice, "public", "d");
        let draft = seed_video(&db, alice, "draft", "d");
        seed_video(&db, bob, "bobs", "d");
        set_video_row(&db, public, 0, true, "2024-03-01 12:00:00");
        set_video_row(&db, draft, 0, false, "2024-03-02 12:00:00");

        let page = db
            .list_videos(
                &VideoFilter {
                    text_query: None,
                    owner_id: Some(alice),
                    published_only: true,
                },
                &newest_first(),
                &PageRequest::new(1, 10),
            )
            .unwrap();

        assert_eq!(page.total_count, 1);
        assert_eq!(page.items[0].video.title, "public");
    }

    #[test]
    fn sorting_by_views_honors_direction() {
        let db = db();
        let alice = seed_user(&db, "alice");
        for (title, views) in [("low", 5), ("high", 500), ("mid", 50)] {
            let id = seed_video(&db, alice, title, "d");
            set_video_row(&db, id, views, true, "2024-03-01 12:00:00");
        }

        let page = db
            .list_videos(
                &VideoFilter::default(),
                &SortSpec {
                    field: VideoSortField::Views,
                    direction: SortDirection::Ascending,
                },
                &PageRequest::new(1, 10),
            )
            .unwrap();

        let titles: Vec<_> = page.items.iter().map(|v| v.video.title.as_str()).collect();
        assert_eq!(titles, ["low", "mid", "high"]);
    }

    #[test]
    fn channel_videos_flattens_owner_and_skips_drafts() {
        let db = db();
        let alice = seed_user(&db, "alice");
        let published = seed_video(&db, alice, "published", "d");
        let draft = seed_video(&db, alice, "draft", "d");
        set_video_row(&db, published, 0, true, "2024-03-01 12:00:00");
        set_video_row(&db, draft, 0, false, "2024-03-02 12:00:00");

        let page = db.channel_videos(alice, &PageRequest::new(1, 10)).unwrap();
        assert_eq!(page.total_count, 1);
        assert_eq!(page.items[0].video.title, "published");
        assert_eq!(page.items[0].username, "alice");
        assert_eq!(page.items[0].full_name, "alice");
    }

    #[test]
    fn watching_bumps_views_and_records_history() {
        let db = db();
        let alice = seed_user(&db, "alice");
        let bob = seed_user(&db, "bob");
        let video = seed_video(&db, alice, "watch me", "d");

        let first = db.watch_video(bob, video).unwrap();
        assert_eq!(first.video.views, 1);
        let second = db.watch_video(bob, video).unwrap();
        assert_eq!(second.video.views, 2);

        // rewatching keeps a single history row
        let history = db.list_watch_history(bob, &PageRequest::new(1, 10)).unwrap();
        assert_eq!(history.total_count, 1);
        assert_eq!(history.items[0].video.title, "watch me");
    }

    #[test]
    fn drafts_are_invisible_to_non_owners() {
        let db = db();
        let alice = seed_user(&db, "alice");
        let bob = seed_user(&db, "bob");
        let draft = seed_video(&db, alice, "draft", "d");
        set_video_row(&db, draft, 0, false, "2024-03-01 12:00:00");

        assert!(matches!(
            db.watch_video(bob, draft).unwrap_err(),
            StoreError::NotFound("video")
        ));
        // the owner still sees it
        assert!(db.watch_video(alice, draft).is_ok());
    }

    #[test]
    fn update_checks_existence_before_ownership() {
        let db = db();
        let alice = seed_user(&db, "alice");
        let bob = seed_user(&db, "bob");
        let video = seed_video(&db, alice, "original", "d");

        let missing = db.update_video(
            bob,
            Uuid::new_v4(),
            &VideoChanges {
                title: Some("x"),
                description: None,
                thumbnail: None,
            },
        );
        assert!(matches!(missing.unwrap_err(), StoreError::NotFound("video")));

        let forbidden = db.update_video(
            bob,
            video,
            &VideoChanges {
                title: Some("hijacked"),
                description: None,
                thumbnail: None,
            },
        );
        assert!(matches!(forbidden.unwrap_err(), StoreError::Forbidden(_)));

        // unchanged after the forbidden attempt
        let current = db.get_video(video).unwrap().unwrap();
        assert_eq!(current.title, "original");

        let updated = db
            .update_video(
                alice,
                video,
                &VideoChanges {
                    title: Some("renamed"),
                    description: None,
                    thumbnail: None,
                },
            )
            .unwrap();
        assert_eq!(updated.title, "renamed");
        assert_eq!(updated.description, "d");
    }

    #[test]
    fn toggle_publish_reports_resulting_state() {
        let db = db();
        let alice = seed_user(&db, "alice");
        let video = seed_video(&db, alice, "v", "d");

        assert!(!db.toggle_publish(alice, video).unwrap());
        assert!(db.toggle_publish(alice, video).unwrap());

        let bob = seed_user(&db, "bob");
        assert!(matches!(
            db.toggle_publish(bob, video).unwrap_err(),
            StoreError::Forbidden(_)
        ));
    }

    #[test]
    fn delete_removes_video_and_its_likes() {
        let db = db();
        let alice = seed_user(&db, "alice");
        let bob = seed_user(&db, "bob");
        let video = seed_video(&db, alice, "v", "d");

        db.toggle_like(
            Uuid::new_v4(),
            bob,
            &youtweet_types::models::LikeTarget::Video(video),
        )
        .unwrap();

        assert!(matches!(
            db.delete_video(bob, video).unwrap_err(),
            StoreError::Forbidden(_)
        ));

        db.delete_video(alice, video).unwrap();
        assert!(db.get_video(video).unwrap().is_none());

        let liked = db.list_liked_videos(bob, &PageRequest::new(1, 10)).unwrap();
        assert_eq!(liked.total_count, 0);
    }

    #[test]
    fn publishing_with_an_unknown_owner_trips_the_foreign_key() {
        let db = db();
        let err = db
            .publish_video(
                Uuid::new_v4(),
                Uuid::new_v4(),
                &NewVideo {
                    title: "t",
                    description: "d",
                    video_file: "f",
                    thumbnail: "th",
                    duration: 1.0,
                },
            )
            .unwrap_err();
        // foreign key on owner_id
        assert!(matches!(err, StoreError::Conflict(_)));
    }
}
