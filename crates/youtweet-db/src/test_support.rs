//! Seed helpers shared by the query tests.

use uuid::Uuid;

use crate::Database;
use crate::queries::users::NewUser;
use crate::queries::videos::NewVideo;

pub fn db() -> Database {
    Database::open_in_memory().expect("in-memory database")
}

pub fn seed_user(db: &Database, username: &str) -> Uuid {
    let id = Uuid::new_v4();
    db.create_user(
        id,
        &NewUser {
            username,
            email: &format!("{username}@example.com"),
            full_name: username,
            password_hash: "argon2-hash",
            avatar_url: None,
            cover_image_url: None,
        },
    )
    .expect("seed user");
    id
}

pub fn seed_video(db: &Database, owner: Uuid, title: &str, description: &str) -> Uuid {
    let id = Uuid::new_v4();
    db.publish_video(
        id,
        owner,
        &NewVideo {
            title,
            description,
            video_file: "https://cdn.example.com/video.mp4",
            thumbnail: "https://cdn.example.com/thumb.jpg",
            duration: 60.0,
        },
    )
    .expect("seed video");
    id
}

/// Tests need deterministic ordering; datetime('now') has second
/// resolution, so pin the row fields directly.
pub fn set_video_row(db: &Database, id: Uuid, views: i64, published: bool, created_at: &str) {
    db.with_conn(|conn| {
        conn.execute(
            "UPDATE videos SET views = ?1, published = ?2, created_at = ?3 WHERE id = ?4",
            rusqlite::params![views, published, created_at, id.to_string()],
        )?;
        Ok(())
    })
    .expect("tweak video row");
}
