use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id              TEXT PRIMARY KEY,
            username        TEXT NOT NULL UNIQUE,
            email           TEXT NOT NULL UNIQUE,
            full_name       TEXT NOT NULL,
            password        TEXT NOT NULL,
            avatar_url      TEXT,
            cover_image_url TEXT,
            created_at      TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS videos (
            id          TEXT PRIMARY KEY,
            owner_id    TEXT NOT NULL REFERENCES users(id),
            video_file  TEXT NOT NULL,
            thumbnail   TEXT NOT NULL,
            title       TEXT NOT NULL,
            description TEXT NOT NULL,
            duration    REAL NOT NULL DEFAULT 0,
            views       INTEGER NOT NULL DEFAULT 0,
            published   INTEGER NOT NULL DEFAULT 1,
            created_at  TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_videos_owner
            ON videos(owner_id, created_at);

        CREATE TABLE IF NOT EXISTS comments (
            id         TEXT PRIMARY KEY,
            video_id   TEXT NOT NULL REFERENCES videos(id) ON DELETE CASCADE,
            owner_id   TEXT NOT NULL REFERENCES users(id),
            content    TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_comments_video
            ON comments(video_id, created_at);

        CREATE TABLE IF NOT EXISTS tweets (
            id         TEXT PRIMARY KEY,
            owner_id   TEXT NOT NULL REFERENCES users(id),
            content    TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_tweets_owner
            ON tweets(owner_id, created_at);

        CREATE TABLE IF NOT EXISTS likes (
            id          TEXT PRIMARY KEY,
            user_id     TEXT NOT NULL REFERENCES users(id),
            target_kind TEXT NOT NULL CHECK (target_kind IN ('video', 'comment', 'tweet')),
            target_id   TEXT NOT NULL,
            created_at  TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(user_id, target_kind, target_id)
        );

        CREATE INDEX IF NOT EXISTS idx_likes_target
            ON likes(target_kind, target_id);

        CREATE TABLE IF NOT EXISTS subscriptions (
            id            TEXT PRIMARY KEY,
            subscriber_id TEXT NOT NULL REFERENCES users(id),
            channel_id    TEXT NOT NULL REFERENCES users(id),
            active        INTEGER NOT NULL DEFAULT 1,
            created_at    TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(subscriber_id, channel_id)
        );

        CREATE INDEX IF NOT EXISTS idx_subscriptions_channel
            ON subscriptions(channel_id);

        CREATE TABLE IF NOT EXISTS playlists (
            id          TEXT PRIMARY KEY,
            owner_id    TEXT NOT NULL REFERENCES users(id),
            name        TEXT NOT NULL,
            description TEXT NOT NULL,
            created_at  TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS playlist_videos (
            playlist_id TEXT NOT NULL REFERENCES playlists(id) ON DELETE CASCADE,
            video_id    TEXT NOT NULL REFERENCES videos(id) ON DELETE CASCADE,
            position    INTEGER NOT NULL,
            PRIMARY KEY (playlist_id, video_id)
        );

        CREATE TABLE IF NOT EXISTS watch_history (
            user_id    TEXT NOT NULL REFERENCES users(id),
            video_id   TEXT NOT NULL REFERENCES videos(id) ON DELETE CASCADE,
            watched_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (user_id, video_id)
        );
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
