use rusqlite::{Connection, OptionalExtension};
use uuid::Uuid;

use crate::Database;
use crate::error::{StoreError, StoreResult};
use crate::queries::users::user_exists;

impl Database {
    /// Toggle a subscription: removes if present, inserts if not.
    /// Returns the resulting state — true means now subscribed.
    pub fn toggle_subscription(
        &self,
        id: Uuid,
        subscriber_id: Uuid,
        channel_id: Uuid,
    ) -> StoreResult<bool> {
        self.with_conn(|conn| {
            if !user_exists(conn, channel_id)? {
                return Err(StoreError::NotFound("channel"));
            }

            let existing: Option<String> = conn
                .query_row(
                    "SELECT id FROM subscriptions WHERE subscriber_id = ?1 AND channel_id = ?2",
                    rusqlite::params![subscriber_id.to_string(), channel_id.to_string()],
                    |row| row.get(0),
                )
                .optional()?;

            if let Some(existing_id) = existing {
                conn.execute("DELETE FROM subscriptions WHERE id = ?1", [&existing_id])?;
                Ok(false)
            } else {
                conn.execute(
                    "INSERT INTO subscriptions (id, subscriber_id, channel_id) VALUES (?1, ?2, ?3)",
                    rusqlite::params![
                        id.to_string(),
                        subscriber_id.to_string(),
                        channel_id.to_string()
                    ],
                )?;
                Ok(true)
            }
        })
    }

    pub fn is_subscribed(&self, subscriber_id: Uuid, channel_id: Uuid) -> StoreResult<bool> {
        self.with_conn(|conn| subscription_exists(conn, subscriber_id, channel_id))
    }
}

pub(crate) fn subscription_exists(
    conn: &Connection,
    subscriber_id: Uuid,
    channel_id: Uuid,
) -> StoreResult<bool> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM subscriptions WHERE subscriber_id = ?1 AND channel_id = ?2",
            rusqlite::params![subscriber_id.to_string(), channel_id.to_string()],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

pub(crate) fn subscriber_count(conn: &Connection, channel_id: Uuid) -> StoreResult<u64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM subscriptions WHERE channel_id = ?1",
        [channel_id.to_string()],
        |row| row.get(0),
    )?;
    Ok(count.max(0) as u64)
}

pub(crate) fn subscribed_to_count(conn: &Connection, subscriber_id: Uuid) -> StoreResult<u64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM subscriptions WHERE subscriber_id = ?1",
        [subscriber_id.to_string()],
        |row| row.get(0),
    )?;
    Ok(count.max(0) as u64)
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use crate::error::StoreError;
    use crate::test_support::{db, seed_user};

    #[test]
    fn double_toggle_restores_the_original_state() {
        let db = db();
        let alice = seed_user(&db, "alice");
        let bob = seed_user(&db, "bob");

        assert!(db.toggle_subscription(Uuid::new_v4(), bob, alice).unwrap());
        assert!(db.is_subscribed(bob, alice).unwrap());
        assert!(!db.toggle_subscription(Uuid::new_v4(), bob, alice).unwrap());
        assert!(!db.is_subscribed(bob, alice).unwrap());
    }

    #[test]
    fn subscribing_to_a_missing_channel_is_not_found() {
        let db = db();
        let bob = seed_user(&db, "bob");

        let err = db
            .toggle_subscription(Uuid::new_v4(), bob, Uuid::new_v4())
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound("channel")));
    }

    #[test]
    fn subscriptions_are_directional() {
        let db = db();
        let alice = seed_user(&db, "alice");
        let bob = seed_user(&db, "bob");

        db.toggle_subscription(Uuid::new_v4(), bob, alice).unwrap();

        assert!(db.is_subscribed(bob, alice).unwrap());
        assert!(!db.is_subscribed(alice, bob).unwrap());
    }
}
