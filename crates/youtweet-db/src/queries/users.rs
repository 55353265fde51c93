use rusqlite::{Connection, OptionalExtension};
use uuid::Uuid;

use youtweet_types::models::User;

use crate::Database;
use crate::error::{StoreError, StoreResult};
use crate::models::UserRow;

pub struct NewUser<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub full_name: &'a str,
    pub password_hash: &'a str,
    pub avatar_url: Option<&'a str>,
    pub cover_image_url: Option<&'a str>,
}

impl Database {
    pub fn create_user(&self, id: Uuid, new: &NewUser) -> StoreResult<User> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (id, username, email, full_name, password, avatar_url, cover_image_url)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                rusqlite::params![
                    id.to_string(),
                    new.username,
                    new.email,
                    new.full_name,
                    new.password_hash,
                    new.avatar_url,
                    new.cover_image_url
                ],
            )?;

            let row = query_user_by_id(conn, id)?.ok_or(StoreError::NotFound("user"))?;
            Ok(row.into_user())
        })
    }

    pub fn get_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        self.with_conn(|conn| Ok(query_user_by_id(conn, id)?.map(UserRow::into_user)))
    }

    pub fn get_user_by_username(&self, username: &str) -> StoreResult<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_username(conn, username))
    }

    /// Login lookup: matches on username or email, whichever is present.
    pub fn find_user_for_login(
        &self,
        username: Option<&str>,
        email: Option<&str>,
    ) -> StoreResult<Option<UserRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM users u WHERE u.username = ?1 OR u.email = ?2",
                UserRow::COLUMNS
            ))?;

            let row = stmt
                .query_row(
                    rusqlite::params![username.unwrap_or_default(), email.unwrap_or_default()],
                    UserRow::from_row,
                )
                .optional()?;

            Ok(row)
        })
    }

    pub fn username_or_email_taken(&self, username: &str, email: &str) -> StoreResult<bool> {
        self.with_conn(|conn| {
            let taken: Option<i64> = conn
                .query_row(
                    "SELECT 1 FROM users WHERE username = ?1 OR email = ?2",
                    rusqlite::params![username, email],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(taken.is_some())
        })
    }

    pub fn update_avatar(&self, user_id: Uuid, avatar_url: &str) -> StoreResult<User> {
        self.update_user_image(user_id, "avatar_url", avatar_url)
    }

    pub fn update_cover_image(&self, user_id: Uuid, cover_image_url: &str) -> StoreResult<User> {
        self.update_user_image(user_id, "cover_image_url", cover_image_url)
    }

    fn update_user_image(&self, user_id: Uuid, column: &str, url: &str) -> StoreResult<User> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                &format!("UPDATE users SET {column} = ?1 WHERE id = ?2"),
                rusqlite::params![url, user_id.to_string()],
            )?;
            if changed == 0 {
                return Err(StoreError::NotFound("user"));
            }

            let row = query_user_by_id(conn, user_id)?.ok_or(StoreError::NotFound("user"))?;
            Ok(row.into_user())
        })
    }
}

pub(crate) fn query_user_by_id(conn: &Connection, id: Uuid) -> StoreResult<Option<UserRow>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM users u WHERE u.id = ?1",
        UserRow::COLUMNS
    ))?;

    let row = stmt
        .query_row([id.to_string()], UserRow::from_row)
        .optional()?;

    Ok(row)
}

pub(crate) fn query_user_by_username(
    conn: &Connection,
    username: &str,
) -> StoreResult<Option<UserRow>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM users u WHERE u.username = ?1",
        UserRow::COLUMNS
    ))?;

    let row = stmt
        .query_row([username], UserRow::from_row)
        .optional()?;

    Ok(row)
}

pub(crate) fn user_exists(conn: &Connection, id: Uuid) -> StoreResult<bool> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM users WHERE id = ?1",
            [id.to_string()],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use crate::error::StoreError;
    use crate::test_support::{db, seed_user};

    #[test]
    fn create_then_fetch_round_trips() {
        let db = db();
        let id = seed_user(&db, "alice");

        let user = db.get_user(id).unwrap().unwrap();
        assert_eq!(user.id, id);
        assert_eq!(user.username, "alice");
        assert_eq!(user.email, "alice@example.com");
    }

    #[test]
    fn duplicate_username_is_a_conflict() {
        let db = db();
        seed_user(&db, "alice");

        let err = db
            .create_user(
                Uuid::new_v4(),
                &super::NewUser {
                    username: "alice",
                    email: "other@example.com",
                    full_name: "Alice Again",
                    password_hash: "hash",
                    avatar_url: None,
                    cover_image_url: None,
                },
            )
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[test]
    fn login_lookup_matches_username_or_email() {
        let db = db();
        let id = seed_user(&db, "alice");

        let by_name = db.find_user_for_login(Some("alice"), None).unwrap().unwrap();
        assert_eq!(by_name.id, id.to_string());

        let by_email = db
            .find_user_for_login(None, Some("alice@example.com"))
            .unwrap()
            .unwrap();
        assert_eq!(by_email.id, id.to_string());

        assert!(db.find_user_for_login(Some("bob"), None).unwrap().is_none());
    }

    #[test]
    fn image_update_requires_an_existing_user() {
        let db = db();
        let id = seed_user(&db, "alice");

        let user = db.update_avatar(id, "https://cdn.example.com/a.png").unwrap();
        assert_eq!(user.avatar_url.as_deref(), Some("https://cdn.example.com/a.png"));

        let err = db.update_avatar(Uuid::new_v4(), "x").unwrap_err();
        assert!(matches!(err, StoreError::NotFound("user")));
    }
}
