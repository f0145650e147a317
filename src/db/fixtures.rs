// src/db/fixtures.rs

//! Fixture seeding for the legacy metadata table.
//!
//! The subject moves session records out of the generic `meta` table, where
//! they were stored under `/<module>/<session_id>` — the parsed row carries
//! the session id in `key2` (`key1` stays empty) and the access token as a
//! JSON-encoded string in `value`. The seeder reproduces exactly that shape
//! so the subject's populate-migration has real rows to move, and the
//! verification checks know what must come out the other side.

use std::sync::Arc;

use tracing::info;

use crate::db::backend::{ContainerBackend, ContainerSpec};
use crate::errors::Result;

pub const LEGACY_TABLE: &str = "meta";
pub const SESSIONS_TABLE: &str = "sessions";

/// One session record as it should exist after the migration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fixture {
    pub session_id: String,
    pub access_token: String,
}

/// Deterministic fixture rows; the same invocation always seeds and expects
/// the same data.
pub fn fixture_rows(count: usize) -> Vec<Fixture> {
    (1..=count)
        .map(|i| Fixture {
            session_id: format!("sess-{i:04}"),
            access_token: format!("token-{i:04}"),
        })
        .collect()
}

pub fn create_database_sql(database: &str) -> String {
    format!("CREATE DATABASE IF NOT EXISTS {database}")
}

/// Legacy table schema: generic key/value rows keyed by module and key parts.
pub fn create_legacy_table_sql() -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {LEGACY_TABLE} (\
         id BIGINT NOT NULL AUTO_INCREMENT PRIMARY KEY, \
         module VARCHAR(100) NOT NULL, \
         key1 VARCHAR(256) NOT NULL, \
         key2 VARCHAR(256) NOT NULL, \
         start_dt BIGINT NOT NULL, \
         value LONGTEXT NOT NULL)"
    )
}

pub fn insert_fixture_sql(module: &str, fixture: &Fixture) -> String {
    // value holds the JSON-encoded token, quotes included; the migration
    // json-decodes it on the way into the sessions table.
    format!(
        "INSERT INTO {LEGACY_TABLE} (module, key1, key2, start_dt, value) \
         VALUES ('{}', '', '{}', 0, '\"{}\"')",
        sql_escape(module),
        sql_escape(&fixture.session_id),
        sql_escape(&fixture.access_token),
    )
}

fn sql_escape(s: &str) -> String {
    s.replace('\'', "''")
}

/// Create the database and legacy table if needed, then insert the fixture
/// rows. Runs against a container that was started fresh this run, so there
/// is nothing stale to collide with.
pub async fn seed(
    backend: &Arc<dyn ContainerBackend>,
    spec: &ContainerSpec,
    module: &str,
    count: usize,
) -> Result<Vec<Fixture>> {
    backend
        .sql(spec.clone(), create_database_sql(&spec.database), None)
        .await?;
    backend
        .sql(
            spec.clone(),
            create_legacy_table_sql(),
            Some(spec.database.clone()),
        )
        .await?;

    let fixtures = fixture_rows(count);
    for fixture in &fixtures {
        backend
            .sql(
                spec.clone(),
                insert_fixture_sql(module, fixture),
                Some(spec.database.clone()),
            )
            .await?;
    }

    info!(module, rows = fixtures.len(), "seeded fixture rows into legacy table");
    Ok(fixtures)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixture_rows_are_deterministic() {
        let rows = fixture_rows(2);
        assert_eq!(rows[0].session_id, "sess-0001");
        assert_eq!(rows[0].access_token, "token-0001");
        assert_eq!(rows[1].session_id, "sess-0002");
        assert_eq!(rows, fixture_rows(2));
    }

    #[test]
    fn insert_puts_session_id_in_key2_and_json_encodes_value() {
        let sql = insert_fixture_sql("user_sessions", &fixture_rows(1)[0]);
        assert!(sql.contains("'user_sessions', '', 'sess-0001'"));
        assert!(sql.contains(r#"'"token-0001"'"#));
    }

    #[test]
    fn module_name_is_escaped() {
        let sql = insert_fixture_sql(
            "it's",
            &Fixture {
                session_id: "s".to_string(),
                access_token: "t".to_string(),
            },
        );
        assert!(sql.contains("'it''s'"));
    }

    #[test]
    fn legacy_schema_matches_documented_columns() {
        let sql = create_legacy_table_sql();
        for col in ["module", "key1", "key2", "start_dt", "value"] {
            assert!(sql.contains(col), "missing column {col}");
        }
    }
}
