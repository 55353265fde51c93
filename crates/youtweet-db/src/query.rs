//! The query composer: listing requests become one parameterized SELECT
//! plus a matching COUNT over the same filter stages. Stages are named
//! and composable so each can be exercised in isolation, instead of the
//! per-request ad-hoc pipeline arrays this replaces.

use rusqlite::{Connection, Row, ToSql};
use uuid::Uuid;

use youtweet_types::pagination::{Page, PageRequest, SortDirection};

use crate::error::{StoreError, StoreResult};

/// Whitelisted sort fields for video listings. Anything else is an
/// invalid argument, never an interpolated identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VideoSortField {
    #[default]
    CreatedAt,
    Views,
    Duration,
    Title,
}

impl VideoSortField {
    pub fn parse(raw: &str) -> StoreResult<Self> {
        match raw {
            "createdAt" => Ok(VideoSortField::CreatedAt),
            "views" => Ok(VideoSortField::Views),
            "duration" => Ok(VideoSortField::Duration),
            "title" => Ok(VideoSortField::Title),
            _ => Err(StoreError::InvalidArgument(format!(
                "unknown sort field: {raw}"
            ))),
        }
    }

    pub fn column(&self) -> &'static str {
        match self {
            VideoSortField::CreatedAt => "v.created_at",
            VideoSortField::Views => "v.views",
            VideoSortField::Duration => "v.duration",
            VideoSortField::Title => "v.title",
        }
    }
}

/// One declared sort field; ties break on insertion order in the builder.
#[derive(Debug, Clone, Copy, Default)]
pub struct SortSpec {
    pub field: VideoSortField,
    pub direction: SortDirection,
}

/// Filter specification for video listings. An absent text query and an
/// empty one both match everything.
#[derive(Debug, Clone, Default)]
pub struct VideoFilter {
    pub text_query: Option<String>,
    pub owner_id: Option<Uuid>,
    pub published_only: bool,
}

pub(crate) fn sql_param<T: ToSql + 'static>(value: T) -> Box<dyn ToSql> {
    Box::new(value)
}

/// Wrap user text for a substring LIKE match, escaping the wildcards so
/// the query text is matched literally. Pair with `ESCAPE '\'`.
pub fn like_pattern(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len() + 2);
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    format!("%{escaped}%")
}

/// Composable SELECT pipeline. Stage order is fixed: filters AND-ed in
/// the order added, one declared sort, one paginate stage.
pub struct SelectBuilder {
    columns: &'static str,
    table: &'static str,
    joins: Vec<&'static str>,
    filters: Vec<String>,
    params: Vec<Box<dyn ToSql>>,
    order_by: Option<String>,
    page: Option<(u32, u64)>,
}

impl SelectBuilder {
    pub fn new(table: &'static str, columns: &'static str) -> Self {
        Self {
            columns,
            table,
            joins: Vec::new(),
            filters: Vec::new(),
            params: Vec::new(),
            order_by: None,
            page: None,
        }
    }

    pub fn join(mut self, clause: &'static str) -> Self {
        self.joins.push(clause);
        self
    }

    /// Match stage: a raw condition with its bound parameters.
    pub fn filter(mut self, clause: impl Into<String>, params: Vec<Box<dyn ToSql>>) -> Self {
        self.filters.push(clause.into());
        self.params.extend(params);
        self
    }

    /// Match stage: case-insensitive substring search over any of the
    /// given columns. The empty query degenerates to a match-everything
    /// clause.
    pub fn filter_text(self, columns: &[&str], query: &str) -> Self {
        let pattern = like_pattern(query);
        let clause = columns
            .iter()
            .map(|col| format!("{col} LIKE ? ESCAPE '\\'"))
            .collect::<Vec<_>>()
            .join(" OR ");
        let params = columns
            .iter()
            .map(|_| sql_param(pattern.clone()))
            .collect();
        self.filter(format!("({clause})"), params)
    }

    /// Sort stage: one declared column plus a fixed tiebreak so equal
    /// keys keep insertion order.
    pub fn sort(mut self, column: &str, direction: SortDirection, tiebreak: &str) -> Self {
        self.order_by = Some(format!("{column} {}, {tiebreak}", direction.as_sql()));
        self
    }

    /// Paginate stage. Limit and offset come from the normalized request,
    /// so they are rendered inline.
    pub fn paginate(mut self, page: &PageRequest) -> Self {
        self.page = Some((page.limit(), page.offset()));
        self
    }

    pub fn sql(&self) -> String {
        let mut sql = format!("SELECT {} FROM {}", self.columns, self.table);
        for join in &self.joins {
            sql.push(' ');
            sql.push_str(join);
        }
        if !self.filters.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&self.filters.join(" AND "));
        }
        if let Some(order) = &self.order_by {
            sql.push_str(" ORDER BY ");
            sql.push_str(order);
        }
        if let Some((limit, offset)) = self.page {
            sql.push_str(&format!(" LIMIT {limit} OFFSET {offset}"));
        }
        sql
    }

    /// The COUNT statement over the same joins and filter stages,
    /// ignoring sort and pagination.
    pub fn count_sql(&self) -> String {
        let mut sql = format!("SELECT COUNT(*) FROM {}", self.table);
        for join in &self.joins {
            sql.push(' ');
            sql.push_str(join);
        }
        if !self.filters.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&self.filters.join(" AND "));
        }
        sql
    }

    pub fn params(&self) -> Vec<&dyn ToSql> {
        self.params.iter().map(|p| p.as_ref()).collect()
    }
}

/// Run a paginated builder: total count first, then the page itself.
/// An out-of-range page is an empty item list with the counts intact.
pub(crate) fn fetch_page<T>(
    conn: &Connection,
    builder: &SelectBuilder,
    page: &PageRequest,
    map: fn(&Row) -> rusqlite::Result<T>,
) -> StoreResult<Page<T>> {
    let params = builder.params();

    let total: i64 = conn.query_row(&builder.count_sql(), params.as_slice(), |row| row.get(0))?;

    let mut stmt = conn.prepare(&builder.sql())?;
    let items = stmt
        .query_map(params.as_slice(), map)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Page::new(items, total.max(0) as u64, page))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("cat"), "%cat%");
        assert_eq!(like_pattern("100%"), "%100\\%%");
        assert_eq!(like_pattern("a_b"), "%a\\_b%");
        assert_eq!(like_pattern("back\\slash"), "%back\\\\slash%");
        assert_eq!(like_pattern(""), "%%");
    }

    #[test]
    fn sort_field_whitelist_rejects_unknown_columns() {
        assert_eq!(VideoSortField::parse("views").unwrap(), VideoSortField::Views);
        assert!(matches!(
            VideoSortField::parse("views; DROP TABLE videos"),
            Err(StoreError::InvalidArgument(_))
        ));
    }

    #[test]
    fn bare_select_renders_without_clauses() {
        let builder = SelectBuilder::new("videos v", "v.id");
        assert_eq!(builder.sql(), "SELECT v.id FROM videos v");
        assert_eq!(builder.count_sql(), "SELECT COUNT(*) FROM videos v");
        assert!(builder.params().is_empty());
    }

    #[test]
    fn stages_compose_in_order() {
        let builder = SelectBuilder::new("videos v", "v.id, u.username")
            .join("LEFT JOIN users u ON u.id = v.owner_id")
            .filter_text(&["v.title", "v.description"], "cat")
            .filter("v.published = 1", vec![])
            .sort("v.created_at", SortDirection::Descending, "v.rowid ASC")
            .paginate(&PageRequest::new(2, 10));

        assert_eq!(
            builder.sql(),
            "SELECT v.id, u.username FROM videos v \
             LEFT JOIN users u ON u.id = v.owner_id \
             WHERE (v.title LIKE ? ESCAPE '\\' OR v.description LIKE ? ESCAPE '\\') \
             AND v.published = 1 \
             ORDER BY v.created_at DESC, v.rowid ASC \
             LIMIT 10 OFFSET 10"
        );
        assert_eq!(
            builder.count_sql(),
            "SELECT COUNT(*) FROM videos v \
             LEFT JOIN users u ON u.id = v.owner_id \
             WHERE (v.title LIKE ? ESCAPE '\\' OR v.description LIKE ? ESCAPE '\\') \
             AND v.published = 1"
        );
        // one bound pattern per searched column
        assert_eq!(builder.params().len(), 2);
    }
}
