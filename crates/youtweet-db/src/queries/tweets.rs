use rusqlite::{Connection, OptionalExtension};
use uuid::Uuid;

use youtweet_types::models::Tweet;
use youtweet_types::pagination::{Page, PageRequest, SortDirection};

use crate::Database;
use crate::error::{StoreError, StoreResult};
use crate::models::TweetRow;
use crate::query::{SelectBuilder, fetch_page, sql_param};

impl Database {
    pub fn create_tweet(&self, id: Uuid, owner_id: Uuid, content: &str) -> StoreResult<Tweet> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO tweets (id, owner_id, content) VALUES (?1, ?2, ?3)",
                rusqlite::params![id.to_string(), owner_id.to_string(), content],
            )?;

            let row = query_tweet(conn, id)?.ok_or(StoreError::NotFound("tweet"))?;
            Ok(row.into_tweet())
        })
    }

    pub fn list_user_tweets(&self, user_id: Uuid, page: &PageRequest) -> StoreResult<Page<Tweet>> {
        self.with_conn(|conn| {
            let builder = SelectBuilder::new("tweets t", TweetRow::COLUMNS)
                .filter("t.owner_id = ?", vec![sql_param(user_id.to_string())])
                .sort("t.created_at", SortDirection::Descending, "t.rowid DESC")
                .paginate(page);

            Ok(fetch_page(conn, &builder, page, TweetRow::from_row)?.map(TweetRow::into_tweet))
        })
    }

    pub fn update_tweet(&self, requester: Uuid, tweet_id: Uuid, content: &str) -> StoreResult<Tweet> {
        self.with_conn(|conn| {
            fetch_owned_tweet(conn, requester, tweet_id)?;

            conn.execute(
                "UPDATE tweets SET content = ?1, updated_at = datetime('now') WHERE id = ?2",
                rusqlite::params![content, tweet_id.to_string()],
            )?;

            let row = query_tweet(conn, tweet_id)?.ok_or(StoreError::NotFound("tweet"))?;
            Ok(row.into_tweet())
        })
    }

    pub fn delete_tweet(&self, requester: Uuid, tweet_id: Uuid) -> StoreResult<()> {
        self.with_conn(|conn| {
            fetch_owned_tweet(conn, requester, tweet_id)?;

            conn.execute(
                "DELETE FROM likes WHERE target_kind = 'tweet' AND target_id = ?1",
                [tweet_id.to_string()],
            )?;
            conn.execute("DELETE FROM tweets WHERE id = ?1", [tweet_id.to_string()])?;

            Ok(())
        })
    }
}

fn query_tweet(conn: &Connection, id: Uuid) -> StoreResult<Option<TweetRow>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM tweets t WHERE t.id = ?1",
        TweetRow::COLUMNS
    ))?;

    let row = stmt
        .query_row([id.to_string()], TweetRow::from_row)
        .optional()?;

    Ok(row)
}

/// Existence first, ownership second.
fn fetch_owned_tweet(conn: &Connection, requester: Uuid, tweet_id: Uuid) -> StoreResult<TweetRow> {
    let row = query_tweet(conn, tweet_id)?.ok_or(StoreError::NotFound("tweet"))?;
    if row.owner_id != requester.to_string() {
        return Err(StoreError::Forbidden("only the owner can modify this tweet"));
    }
    Ok(row)
}

pub(crate) fn tweet_exists(conn: &Connection, id: Uuid) -> StoreResult<bool> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM tweets WHERE id = ?1",
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
    use crate::test_support::{db, seed_user};

    #[test]
    fn tweets_list_per_user_newest_first() {
        let db = db();
        let alice = seed_user(&db, "alice");
        let bob = seed_user(&db, "bob");

        db.create_tweet(Uuid::new_v4(), alice, "one").unwrap();
        db.create_tweet(Uuid::new_v4(), alice, "two").unwrap();
        db.create_tweet(Uuid::new_v4(), bob, "other feed").unwrap();

        let page = db.list_user_tweets(alice, &PageRequest::new(1, 10)).unwrap();
        assert_eq!(page.total_count, 2);
        assert_eq!(page.items[0].content, "two");
        assert_eq!(page.items[1].content, "one");
    }

    #[test]
    fn a_user_with_no_tweets_gets_an_empty_page() {
        let db = db();
        let alice = seed_user(&db, "alice");

        let page = db.list_user_tweets(alice, &PageRequest::new(1, 10)).unwrap();
        assert_eq!(page.total_count, 0);
        assert!(page.items.is_empty());
    }

    #[test]
    fn ownership_gates_update_and_delete() {
        let db = db();
        let alice = seed_user(&db, "alice");
        let bob = seed_user(&db, "bob");
        let tweet = Uuid::new_v4();
        db.create_tweet(tweet, alice, "hot take").unwrap();

        assert!(matches!(
            db.update_tweet(bob, tweet, "revised").unwrap_err(),
            StoreError::Forbidden(_)
        ));
        assert!(matches!(
            db.delete_tweet(bob, tweet).unwrap_err(),
            StoreError::Forbidden(_)
        ));

        let page = db.list_user_tweets(alice, &PageRequest::new(1, 10)).unwrap();
        assert_eq!(page.items[0].content, "hot take");

        db.delete_tweet(alice, tweet).unwrap();
        assert!(matches!(
            db.update_tweet(alice, tweet, "gone").unwrap_err(),
            StoreError::NotFound("tweet")
        ));
    }
}
