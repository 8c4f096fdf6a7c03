//! Tag table layout and the SQL text for each backend dialect.
//!
//! The table name is configurable, so statements are rendered once per store
//! from a validated [`TableName`] and reused for every call.

use chrono::{DateTime, Utc};
use placebreak_types::{Location, Tag, TagId};

use crate::config::TableName;
use crate::error::StoreError;

/// SQL dialects with their own column types and placeholder syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Dialect {
    Sqlite,
    Postgres,
}

/// Rendered statements for one tag table.
#[derive(Debug, Clone)]
pub(crate) struct TagQueries {
    /// `CREATE TABLE IF NOT EXISTS` and the location index, run in order.
    pub schema: Vec<String>,
    /// Newest two rows at a location.
    pub select_by_location: String,
    /// Every row at a location.
    pub delete_by_location: String,
    /// One row.
    pub insert: String,
}

impl TagQueries {
    pub(crate) fn new(dialect: Dialect, table: &TableName) -> Self {
        let (id_type, instant_type, flag_type, selected_id) = match dialect {
            Dialect::Sqlite => ("TEXT", "TEXT", "INTEGER", "tag_id"),
            Dialect::Postgres => ("UUID", "TIMESTAMPTZ", "BOOLEAN", "tag_id::TEXT AS tag_id"),
        };
        let p = |n: usize| match dialect {
            Dialect::Sqlite => "?".to_owned(),
            Dialect::Postgres => format!("${n}"),
        };
        let location_match = format!(
            "world_name = {} AND location_x = {} AND location_y = {} AND location_z = {}",
            p(1),
            p(2),
            p(3),
            p(4)
        );

        Self {
            schema: vec![
                format!(
                    "CREATE TABLE IF NOT EXISTS {table} (\
                     tag_id {id_type} PRIMARY KEY, \
                     created_at {instant_type} NOT NULL, \
                     is_ephemeral {flag_type} NOT NULL, \
                     world_name TEXT NOT NULL, \
                     location_x INTEGER NOT NULL, \
                     location_y INTEGER NOT NULL, \
                     location_z INTEGER NOT NULL)"
                ),
                format!(
                    "CREATE INDEX IF NOT EXISTS {table}_location_idx \
                     ON {table} (world_name, location_x, location_y, location_z)"
                ),
            ],
            select_by_location: format!(
                "SELECT {selected_id}, created_at, is_ephemeral, world_name, \
                 location_x, location_y, location_z \
                 FROM {table} WHERE {location_match} \
                 ORDER BY created_at DESC, tag_id DESC LIMIT 2"
            ),
            delete_by_location: format!("DELETE FROM {table} WHERE {location_match}"),
            insert: format!(
                "INSERT INTO {table} (tag_id, created_at, is_ephemeral, world_name, \
                 location_x, location_y, location_z) \
                 VALUES ({}, {}, {}, {}, {}, {}, {})",
                p(1),
                p(2),
                p(3),
                p(4),
                p(5),
                p(6),
                p(7)
            ),
        }
    }
}

/// A tag row as read back from either dialect.
#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct TagRow {
    pub tag_id: String,
    pub created_at: DateTime<Utc>,
    pub is_ephemeral: bool,
    pub world_name: String,
    pub location_x: i32,
    pub location_y: i32,
    pub location_z: i32,
}

impl TryFrom<TagRow> for Tag {
    type Error = StoreError;

    fn try_from(row: TagRow) -> Result<Self, Self::Error> {
        let id: TagId = row
            .tag_id
            .parse()
            .map_err(|e| StoreError::Corrupted(format!("tag id {:?}: {e}", row.tag_id)))?;
        let location =
            Location::new(row.world_name, row.location_x, row.location_y, row.location_z);
        Ok(Self::from_parts(id, row.created_at, row.is_ephemeral, location))
    }
}

/// Pick one tag from the (at most two) rows read at `location`.
///
/// Rows arrive newest first. A second row means duplicates accumulated at
/// the location; the newest wins.
pub(crate) fn pick_newest(
    backend: &'static str,
    location: &Location,
    rows: Vec<TagRow>,
) -> Result<Option<Tag>, StoreError> {
    if rows.len() > 1 {
        tracing::warn!(
            backend,
            location = %location,
            "Multiple tags stored for one location, using the newest"
        );
    }
    rows.into_iter().next().map(Tag::try_from).transpose()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn row(tag_id: &str) -> TagRow {
        TagRow {
            tag_id: tag_id.to_owned(),
            created_at: DateTime::<Utc>::UNIX_EPOCH,
            is_ephemeral: true,
            world_name: "world".to_owned(),
            location_x: 1,
            location_y: 2,
            location_z: 3,
        }
    }

    #[test]
    fn sqlite_statements_use_question_marks() {
        let queries = TagQueries::new(Dialect::Sqlite, &TableName::default());
        assert!(queries.insert.contains("VALUES (?, ?, ?, ?, ?, ?, ?)"));
        assert_eq!(queries.schema.len(), 2);
        assert!(queries.schema[1].contains("patch_place_break_tag_location_idx"));
        assert!(!queries.select_by_location.contains("::TEXT"));
    }

    #[test]
    fn postgres_statements_number_placeholders() {
        let table = TableName::new("tags").unwrap();
        let queries = TagQueries::new(Dialect::Postgres, &table);
        assert!(queries.insert.contains("VALUES ($1, $2, $3, $4, $5, $6, $7)"));
        assert!(queries.delete_by_location.ends_with("location_z = $4"));
        assert!(queries.select_by_location.contains("tag_id::TEXT AS tag_id"));
        assert!(queries.schema[0].contains("tag_id UUID PRIMARY KEY"));
    }

    #[test]
    fn row_converts_to_tag() {
        let id = TagId::new();
        let tag = Tag::try_from(row(&id.to_string())).unwrap();
        assert_eq!(tag.id(), id);
        assert!(tag.is_ephemeral());
        assert_eq!(tag.location(), &Location::new("world", 1, 2, 3));
    }

    #[test]
    fn bad_id_is_corrupted() {
        let err = Tag::try_from(row("not-a-uuid")).unwrap_err();
        assert!(matches!(err, StoreError::Corrupted(_)));
    }

    #[test]
    fn newest_row_wins() {
        let newest = TagId::new();
        let older = TagId::new();
        let location = Location::new("world", 1, 2, 3);
        let picked = pick_newest(
            "sqlite",
            &location,
            vec![row(&newest.to_string()), row(&older.to_string())],
        )
        .unwrap();
        assert_eq!(picked.map(|tag| tag.id()), Some(newest));
        assert_eq!(pick_newest("sqlite", &location, Vec::new()).unwrap(), None);
    }
}
