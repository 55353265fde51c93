use rusqlite::Connection;
use uuid::Uuid;

use youtweet_types::api::{ChannelProfile, ChannelStats, LikeTotals};

use crate::Database;
use crate::error::StoreResult;
use crate::queries::subscriptions::{subscriber_count, subscribed_to_count, subscription_exists};
use crate::queries::users::query_user_by_username;

impl Database {
    /// Channel dashboard numbers. Each figure is its own aggregation
    /// scoped to the channel's identity; an empty underlying set reports
    /// an explicit 0.
    ///
    /// The `total_*_likes` fields keep the legacy likes-given-by-owner
    /// semantics; `likes_received` carries the other reading. See
    /// `likes_given_totals` / `likes_received_totals`.
    pub fn channel_stats(&self, channel_id: Uuid) -> StoreResult<ChannelStats> {
        self.with_conn(|conn| {
            let (total_videos, total_views) = video_totals(conn, channel_id)?;
            let total_subscribers = subscriber_count(conn, channel_id)?;
            let total_tweets = count_owned(conn, "tweets", channel_id)?;
            let total_comments = count_owned(conn, "comments", channel_id)?;
            let given = likes_given(conn, channel_id)?;
            let likes_received = likes_received(conn, channel_id)?;

            Ok(ChannelStats {
                total_views,
                total_videos,
                total_subscribers,
                total_tweets,
                total_comments,
                total_video_likes: given.video_likes,
                total_comment_likes: given.comment_likes,
                total_tweet_likes: given.tweet_likes,
                likes_received,
            })
        })
    }

    /// Likes the user has handed out, per target kind.
    pub fn likes_given_totals(&self, user_id: Uuid) -> StoreResult<LikeTotals> {
        self.with_conn(|conn| likes_given(conn, user_id))
    }

    /// Likes sitting on the channel's own content, per target kind.
    pub fn likes_received_totals(&self, channel_id: Uuid) -> StoreResult<LikeTotals> {
        self.with_conn(|conn| likes_received(conn, channel_id))
    }

    /// Public channel page: profile fields plus subscription figures,
    /// from the viewer's perspective.
    pub fn channel_profile(
        &self,
        username: &str,
        viewer_id: Uuid,
    ) -> StoreResult<Option<ChannelProfile>> {
        self.with_conn(|conn| {
            let Some(row) = query_user_by_username(conn, username)? else {
                return Ok(None);
            };
            let user = row.into_user();

            let subscribers_count = subscriber_count(conn, user.id)?;
            let subscribed_to_count = subscribed_to_count(conn, user.id)?;
            let is_subscribed = subscription_exists(conn, viewer_id, user.id)?;

            Ok(Some(ChannelProfile {
                id: user.id,
                username: user.username,
                full_name: user.full_name,
                avatar_url: user.avatar_url,
                cover_image_url: user.cover_image_url,
                subscribers_count,
                subscribed_to_count,
                is_subscribed,
                created_at: user.created_at,
            }))
        })
    }
}

/// Published videos only: (count, summed views).
fn video_totals(conn: &Connection, channel_id: Uuid) -> StoreResult<(u64, u64)> {
    let (count, views): (i64, i64) = conn.query_row(
        "SELECT COUNT(*), COALESCE(SUM(views), 0) FROM videos
         WHERE owner_id = ?1 AND published = 1",
        [channel_id.to_string()],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;
    Ok((count.max(0) as u64, views.max(0) as u64))
}

fn count_owned(conn: &Connection, table: &str, owner_id: Uuid) -> StoreResult<u64> {
    let count: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM {table} WHERE owner_id = ?1"),
        [owner_id.to_string()],
        |row| row.get(0),
    )?;
    Ok(count.max(0) as u64)
}

fn likes_given(conn: &Connection, user_id: Uuid) -> StoreResult<LikeTotals> {
    let mut totals = LikeTotals::default();

    let mut stmt = conn.prepare(
        "SELECT target_kind, COUNT(*) FROM likes WHERE user_id = ?1 GROUP BY target_kind",
    )?;
    let rows = stmt.query_map([user_id.to_string()], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
    })?;

    for row in rows {
        let (kind, count) = row?;
        let count = count.max(0) as u64;
        match kind.as_str() {
            "video" => totals.video_likes = count,
            "comment" => totals.comment_likes = count,
            "tweet" => totals.tweet_likes = count,
            _ => {}
        }
    }

    Ok(totals)
}

fn likes_received(conn: &Connection, channel_id: Uuid) -> StoreResult<LikeTotals> {
    let channel = channel_id.to_string();

    let video_likes: i64 = conn.query_row(
        "SELECT COUNT(*) FROM likes l JOIN videos v ON v.id = l.target_id
         WHERE l.target_kind = 'video' AND v.owner_id = ?1",
        [&channel],
        |row| row.get(0),
    )?;
    let comment_likes: i64 = conn.query_row(
        "SELECT COUNT(*) FROM likes l JOIN comments c ON c.id = l.target_id
         WHERE l.target_kind = 'comment' AND c.owner_id = ?1",
        [&channel],
        |row| row.get(0),
    )?;
    let tweet_likes: i64 = conn.query_row(
        "SELECT COUNT(*) FROM likes l JOIN tweets t ON t.id = l.target_id
         WHERE l.target_kind = 'tweet' AND t.owner_id = ?1",
        [&channel],
        |row| row.get(0),
    )?;

    Ok(LikeTotals {
        video_likes: video_likes.max(0) as u64,
        comment_likes: comment_likes.max(0) as u64,
        tweet_likes: tweet_likes.max(0) as u64,
    })
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use youtweet_types::api::LikeTotals;
    use youtweet_types::models::LikeTarget;

    use crate::test_support::{db, seed_user, seed_video, set_video_row};

    #[test]
    fn views_and_video_count_cover_published_uploads_only() {
        let db = db();
        let alice = seed_user(&db, "alice");

        for (title, views) in [("a", 10), ("b", 1_000_000), ("c", 500)] {
            let id = seed_video(&db, alice, title, "d");
            set_video_row(&db, id, views, true, "2024-03-01 12:00:00");
        }
        let draft = seed_video(&db, alice, "draft", "d");
        set_video_row(&db, draft, 9_999, false, "2024-03-02 12:00:00");

        let stats = db.channel_stats(alice).unwrap();
        assert_eq!(stats.total_views, 1_000_510);
        assert_eq!(stats.total_videos, 3);
    }

    #[test]
    fn an_empty_channel_reports_explicit_zeros() {
        let db = db();
        let alice = seed_user(&db, "alice");

        let stats = db.channel_stats(alice).unwrap();
        assert_eq!(stats.total_views, 0);
        assert_eq!(stats.total_videos, 0);
        assert_eq!(stats.total_subscribers, 0);
        assert_eq!(stats.total_tweets, 0);
        assert_eq!(stats.total_comments, 0);
        assert_eq!(stats.total_video_likes, 0);
        assert_eq!(stats.total_comment_likes, 0);
        assert_eq!(stats.total_tweet_likes, 0);
        assert_eq!(stats.likes_received, LikeTotals::default());
    }

    #[test]
    fn entity_counts_are_scoped_to_the_channel() {
        let db = db();
        let alice = seed_user(&db, "alice");
        let bob = seed_user(&db, "bob");
        let video = seed_video(&db, alice, "v", "d");

        db.create_tweet(Uuid::new_v4(), alice, "mine").unwrap();
        db.create_tweet(Uuid::new_v4(), bob, "not counted").unwrap();
        db.add_comment(Uuid::new_v4(), video, alice, "self comment").unwrap();
        db.toggle_subscription(Uuid::new_v4(), bob, alice).unwrap();

        let stats = db.channel_stats(alice).unwrap();
        assert_eq!(stats.total_tweets, 1);
        assert_eq!(stats.total_comments, 1);
        assert_eq!(stats.total_subscribers, 1);
    }

    #[test]
    fn likes_given_and_received_are_distinct_readings() {
        let db = db();
        let alice = seed_user(&db, "alice");
        let bob = seed_user(&db, "bob");

        let alices_video = seed_video(&db, alice, "hers", "d");
        let bobs_video = seed_video(&db, bob, "his", "d");

        // alice likes bob's video; bob likes alice's video
        db.toggle_like(Uuid::new_v4(), alice, &LikeTarget::Video(bobs_video))
            .unwrap();
        db.toggle_like(Uuid::new_v4(), bob, &LikeTarget::Video(alices_video))
            .unwrap();

        let given = db.likes_given_totals(alice).unwrap();
        assert_eq!(given.video_likes, 1);

        let received = db.likes_received_totals(alice).unwrap();
        assert_eq!(received.video_likes, 1);

        let stats = db.channel_stats(alice).unwrap();
        // legacy top-level fields follow the likes-given reading
        assert_eq!(stats.total_video_likes, given.video_likes);
        assert_eq!(stats.likes_received.video_likes, received.video_likes);
    }

    #[test]
    fn profile_reflects_the_viewer_subscription() {
        let db = db();
        let alice = seed_user(&db, "alice");
        let bob = seed_user(&db, "bob");

        db.toggle_subscription(Uuid::new_v4(), bob, alice).unwrap();

        let seen_by_bob = db.channel_profile("alice", bob).unwrap().unwrap();
        assert_eq!(seen_by_bob.subscribers_count, 1);
        assert!(seen_by_bob.is_subscribed);

        let seen_by_alice = db.channel_profile("alice", alice).unwrap().unwrap();
        assert!(!seen_by_alice.is_subscribed);
        assert_eq!(seen_by_alice.subscribed_to_count, 0);

        assert!(db.channel_profile("nobody", bob).unwrap().is_none());
    }
}
