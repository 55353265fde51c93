use rusqlite::{Connection, OptionalExtension};
use uuid::Uuid;

use youtweet_types::models::Playlist;
use youtweet_types::pagination::{Page, PageRequest, SortDirection};

use crate::Database;
use crate::error::{StoreError, StoreResult};
use crate::models::{PlaylistRow, parse_id};
use crate::queries::videos::video_exists;
use crate::query::{SelectBuilder, fetch_page, sql_param};

impl Database {
    pub fn create_playlist(
        &self,
        id: Uuid,
        owner_id: Uuid,
        name: &str,
        description: &str,
    ) -> StoreResult<Playlist> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO playlists (id, owner_id, name, description) VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![id.to_string(), owner_id.to_string(), name, description],
            )?;

            load_playlist(conn, id)?.ok_or(StoreError::NotFound("playlist"))
        })
    }

    pub fn get_playlist(&self, id: Uuid) -> StoreResult<Option<Playlist>> {
        self.with_conn(|conn| load_playlist(conn, id))
    }

    pub fn list_user_playlists(
        &self,
        user_id: Uuid,
        page: &PageRequest,
    ) -> StoreResult<Page<Playlist>> {
        self.with_conn(|conn| {
            let builder = SelectBuilder::new("playlists p", PlaylistRow::COLUMNS)
                .filter("p.owner_id = ?", vec![sql_param(user_id.to_string())])
                .sort("p.created_at", SortDirection::Descending, "p.rowid DESC")
                .paginate(page);

            let rows = fetch_page(conn, &builder, page, PlaylistRow::from_row)?;

            // page-sized fan-out for the member lists, not per-playlist
            // round-trips from the handler
            let mut items = Vec::with_capacity(rows.items.len());
            for row in rows.items {
                let id = parse_id(&row.id, "playlist");
                let video_ids = member_video_ids(conn, id)?;
                items.push(row.into_playlist(video_ids));
            }

            Ok(Page {
                items,
                total_count: rows.total_count,
                page: rows.page,
                page_size: rows.page_size,
                has_next: rows.has_next,
                next_page: rows.next_page,
            })
        })
    }

    pub fn update_playlist(
        &self,
        requester: Uuid,
        playlist_id: Uuid,
        name: Option<&str>,
        description: Option<&str>,
    ) -> StoreResult<Playlist> {
        self.with_conn(|conn| {
            fetch_owned_playlist(conn, requester, playlist_id)?;

            conn.execute(
                "UPDATE playlists SET
                     name = COALESCE(?1, name),
                     description = COALESCE(?2, description),
                     updated_at = datetime('now')
                 WHERE id = ?3",
                rusqlite::params![name, description, playlist_id.to_string()],
            )?;

            load_playlist(conn, playlist_id)?.ok_or(StoreError::NotFound("playlist"))
        })
    }

    pub fn delete_playlist(&self, requester: Uuid, playlist_id: Uuid) -> StoreResult<()> {
        self.with_conn(|conn| {
            fetch_owned_playlist(conn, requester, playlist_id)?;

            conn.execute(
                "DELETE FROM playlists WHERE id = ?1",
                [playlist_id.to_string()],
            )?;

            Ok(())
        })
    }

    /// Appends a video; each video appears at most once per playlist.
    pub fn add_video_to_playlist(
        &self,
        requester: Uuid,
        playlist_id: Uuid,
        video_id: Uuid,
    ) -> StoreResult<Playlist> {
        self.with_conn(|conn| {
            fetch_owned_playlist(conn, requester, playlist_id)?;

            if !video_exists(conn, video_id)? {
                return Err(StoreError::NotFound("video"));
            }

            let already: Option<i64> = conn
                .query_row(
                    "SELECT 1 FROM playlist_videos WHERE playlist_id = ?1 AND video_id = ?2",
                    rusqlite::params![playlist_id.to_string(), video_id.to_string()],
                    |row| row.get(0),
                )
                .optional()?;
            if already.is_some() {
                return Err(StoreError::Conflict(
                    "video already exists in playlist".to_string(),
                ));
            }

            conn.execute(
                "INSERT INTO playlist_videos (playlist_id, video_id, position)
                 SELECT ?1, ?2, COALESCE(MAX(position) + 1, 0)
                 FROM playlist_videos WHERE playlist_id = ?1",
                rusqlite::params![playlist_id.to_string(), video_id.to_string()],
            )?;

            load_playlist(conn, playlist_id)?.ok_or(StoreError::NotFound("playlist"))
        })
    }

    pub fn remove_video_from_playlist(
        &self,
        requester: Uuid,
        playlist_id: Uuid,
        video_id: Uuid,
    ) -> StoreResult<Playlist> {
        self.with_conn(|conn| {
            fetch_owned_playlist(conn, requester, playlist_id)?;

            let removed = conn.execute(
                "DELETE FROM playlist_videos WHERE playlist_id = ?1 AND video_id = ?2",
                rusqlite::params![playlist_id.to_string(), video_id.to_string()],
            )?;
            if removed == 0 {
                return Err(StoreError::NotFound("video"));
            }

            load_playlist(conn, playlist_id)?.ok_or(StoreError::NotFound("playlist"))
        })
    }
}

fn load_playlist(conn: &Connection, id: Uuid) -> StoreResult<Option<Playlist>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM playlists p WHERE p.id = ?1",
        PlaylistRow::COLUMNS
    ))?;

    let row = stmt
        .query_row([id.to_string()], PlaylistRow::from_row)
        .optional()?;

    match row {
        Some(row) => {
            let video_ids = member_video_ids(conn, id)?;
            Ok(Some(row.into_playlist(video_ids)))
        }
        None => Ok(None),
    }
}

fn member_video_ids(conn: &Connection, playlist_id: Uuid) -> StoreResult<Vec<Uuid>> {
    let mut stmt = conn.prepare(
        "SELECT video_id FROM playlist_videos WHERE playlist_id = ?1 ORDER BY position",
    )?;

    let ids = stmt
        .query_map([playlist_id.to_string()], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ids.iter().map(|raw| parse_id(raw, "playlist video")).collect())
}

/// Existence first, ownership second.
fn fetch_owned_playlist(
    conn: &Connection,
    requester: Uuid,
    playlist_id: Uuid,
) -> StoreResult<PlaylistRow> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM playlists p WHERE p.id = ?1",
        PlaylistRow::COLUMNS
    ))?;

    let row = stmt
        .query_row([playlist_id.to_string()], PlaylistRow::from_row)
        .optional()?
        .ok_or(StoreError::NotFound("playlist"))?;

    if row.owner_id != requester.to_string() {
        return Err(StoreError::Forbidden(
            "only the owner can modify this playlist",
        ));
    }
    Ok(row)
}
