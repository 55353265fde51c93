use rusqlite::{Connection, OptionalExtension};
use uuid::Uuid;

use youtweet_types::api::CommentWithOwner;
use youtweet_types::models::Comment;
use youtweet_types::pagination::{Page, PageRequest, SortDirection};

use crate::Database;
use crate::error::{StoreError, StoreResult};
use crate::models::{CommentRow, CommentWithOwnerRow};
use crate::queries::videos::video_exists;
use crate::query::{SelectBuilder, fetch_page, sql_param};

const OWNER_JOIN: &str = "LEFT JOIN users u ON u.id = c.owner_id";

impl Database {
    /// Comments on a video, newest first, owner summary joined. A
    /// well-formed id that matches nothing is an empty page — whether
    /// the video exists is the read handler's concern, not this one's.
    pub fn list_comments(
        &self,
        video_id: Uuid,
        page: &PageRequest,
    ) -> StoreResult<Page<CommentWithOwner>> {
        self.with_conn(|conn| {
            let builder = SelectBuilder::new("comments c", CommentWithOwnerRow::COLUMNS)
                .join(OWNER_JOIN)
                .filter("c.video_id = ?", vec![sql_param(video_id.to_string())])
                .sort("c.created_at", SortDirection::Descending, "c.rowid DESC")
                .paginate(page);

            Ok(fetch_page(conn, &builder, page, CommentWithOwnerRow::from_row)?
                .map(CommentWithOwnerRow::into_with_owner))
        })
    }

    pub fn add_comment(
        &self,
        id: Uuid,
        video_id: Uuid,
        owner_id: Uuid,
        content: &str,
    ) -> StoreResult<Comment> {
        self.with_conn(|conn| {
            if !video_exists(conn, video_id)? {
                return Err(StoreError::NotFound("video"));
            }

            conn.execute(
                "INSERT INTO comments (id, video_id, owner_id, content) VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![
                    id.to_string(),
                    video_id.to_string(),
                    owner_id.to_string(),
                    content
                ],
            )?;

            let row = query_comment(conn, id)?.ok_or(StoreError::NotFound("comment"))?;
            Ok(row.into_comment())
        })
    }

    pub fn update_comment(
        &self,
        requester: Uuid,
        comment_id: Uuid,
        content: &str,
    ) -> StoreResult<Comment> {
        self.with_conn(|conn| {
            fetch_owned_comment(conn, requester, comment_id)?;

            conn.execute(
                "UPDATE comments SET content = ?1, updated_at = datetime('now') WHERE id = ?2",
                rusqlite::params![content, comment_id.to_string()],
            )?;

            let row = query_comment(conn, comment_id)?.ok_or(StoreError::NotFound("comment"))?;
            Ok(row.into_comment())
        })
    }

    pub fn delete_comment(&self, requester: Uuid, comment_id: Uuid) -> StoreResult<()> {
        self.with_conn(|conn| {
            fetch_owned_comment(conn, requester, comment_id)?;

            conn.execute(
                "DELETE FROM likes WHERE target_kind = 'comment' AND target_id = ?1",
                [comment_id.to_string()],
            )?;
            conn.execute(
                "DELETE FROM comments WHERE id = ?1",
                [comment_id.to_string()],
            )?;

            Ok(())
        })
    }
}

fn query_comment(conn: &Connection, id: Uuid) -> StoreResult<Option<CommentRow>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM comments c WHERE c.id = ?1",
        CommentRow::COLUMNS
    ))?;

    let row = stmt
        .query_row([id.to_string()], CommentRow::from_row)
        .optional()?;

    Ok(row)
}

/// Existence first, ownership second.
fn fetch_owned_comment(
    conn: &Connection,
    requester: Uuid,
    comment_id: Uuid,
) -> StoreResult<CommentRow> {
    let row = query_comment(conn, comment_id)?.ok_or(StoreError::NotFound("comment"))?;
    if row.owner_id != requester.to_string() {
        return Err(StoreError::Forbidden(
            "only the owner can modify this comment",
        ));
    }
    Ok(row)
}

pub(crate) fn comment_exists(conn: &Connection, id: Uuid) -> StoreResult<bool> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM comments WHERE id = ?1",
            [id.to_string()],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use youtweet_types::pagination::PageRequest;

    use crate::error::StoreError;
    use crate::test_support::{db, seed_user, seed_video};

    #[test]
    fn listing_a_nonexistent_video_is_an_empty_page() {
        let db = db();
        seed_user(&db, "alice");

        let page = db
            .list_comments(Uuid::new_v4(), &PageRequest::new(1, 10))
            .unwrap();
        assert_eq!(page.total_count, 0);
        assert!(page.items.is_empty());
        assert!(!page.has_next);
    }

    #[test]
    fn comments_come_back_with_their_owner_summary() {
        let db = db();
        let alice = seed_user(&db, "alice");
        let bob = seed_user(&db, "bob");
        let video = seed_video(&db, alice, "v", "d");

        db.add_comment(Uuid::new_v4(), video, bob, "first!").unwrap();
        db.add_comment(Uuid::new_v4(), video, alice, "thanks").unwrap();

        let page = db.list_comments(video, &PageRequest::new(1, 10)).unwrap();
        assert_eq!(page.total_count, 2);
        // newest first
        assert_eq!(page.items[0].comment.content, "thanks");
        assert_eq!(page.items[0].owner.username, "alice");
        assert_eq!(page.items[1].owner.username, "bob");
    }

    #[test]
    fn commenting_on_a_missing_video_is_not_found() {
        let db = db();
        let alice = seed_user(&db, "alice");

        let err = db
            .add_comment(Uuid::new_v4(), Uuid::new_v4(), alice, "hello")
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound("video")));
    }

    #[test]
    fn only_the_owner_can_update_and_the_text_survives_denial() {
        let db = db();
        let alice = seed_user(&db, "alice");
        let bob = seed_user(&db, "bob");
        let video = seed_video(&db, alice, "v", "d");
        let comment = Uuid::new_v4();
        db.add_comment(comment, video, bob, "mine").unwrap();

        let err = db.update_comment(alice, comment, "stolen").unwrap_err();
        assert!(matches!(err, StoreError::Forbidden(_)));

        let page = db.list_comments(video, &PageRequest::new(1, 10)).unwrap();
        assert_eq!(page.items[0].comment.content, "mine");

        let updated = db.update_comment(bob, comment, "edited").unwrap();
        assert_eq!(updated.content, "edited");
    }

    #[test]
    fn missing_comment_wins_over_ownership() {
        let db = db();
        let alice = seed_user(&db, "alice");

        let err = db.update_comment(alice, Uuid::new_v4(), "x").unwrap_err();
        assert!(matches!(err, StoreError::NotFound("comment")));

        let err = db.delete_comment(alice, Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, StoreError::NotFound("comment")));
    }

    #[test]
    fn deleting_a_comment_cleans_its_likes_up() {
        let db = db();
        let alice = seed_user(&db, "alice");
        let bob = seed_user(&db, "bob");
        let video = seed_video(&db, alice, "v", "d");
        let comment = Uuid::new_v4();
        db.add_comment(comment, video, bob, "mine").unwrap();
        db.toggle_like(
            Uuid::new_v4(),
            alice,
            &youtweet_types::models::LikeTarget::Comment(comment),
        )
        .unwrap();

        db.delete_comment(bob, comment).unwrap();

        let page = db.list_comments(video, &PageRequest::new(1, 10)).unwrap();
        assert_eq!(page.total_count, 0);
        let totals = db.likes_given_totals(alice).unwrap();
        assert_eq!(totals.comment_likes, 0);
    }
}
