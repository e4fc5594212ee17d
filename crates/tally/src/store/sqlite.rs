//! SQLite 집계 저장소
//!
//! 테이블 구조:
//! ```text
//! {table}(id TEXT PRIMARY KEY, query TEXT NOT NULL,
//!         result_flag INTEGER NOT NULL, count INTEGER NOT NULL)
//! ```
//! `query`에는 일반 인덱스만 두고 UNIQUE 제약은 걸지 않습니다.
//! rusqlite 호출은 블로킹이므로 `spawn_blocking`에서 실행합니다.

use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use rusqlite::{Connection, OptionalExtension, params};
use tracing::debug;

use querytally_core::error::StoreError;
use querytally_core::pipeline::TallyStore;
use querytally_core::types::TallyRecord;

/// SQLite 기반 집계 저장소
#[derive(Clone)]
pub struct SqliteTallyStore {
    conn: Arc<Mutex<Connection>>,
    /// 따옴표로 감싼 테이블 이름
    table: String,
    /// 에러 메시지에 쓰이는 연결 대상
    target: String,
}

impl SqliteTallyStore {
    /// 파일을 열고(없으면 생성) 테이블을 준비합니다.
    pub fn open(path: &Path, table: &str) -> Result<Self, StoreError> {
        let target = path.display().to_string();
        let conn = Connection::open(path).map_err(|e| StoreError::Connection {
            target: target.clone(),
            reason: e.to_string(),
        })?;
        Self::with_connection(conn, table, target)
    }

    /// 메모리 DB로 엽니다.
    pub fn open_in_memory(table: &str) -> Result<Self, StoreError> {
        let target = ":memory:".to_owned();
        let conn = Connection::open_in_memory().map_err(|e| StoreError::Connection {
            target: target.clone(),
            reason: e.to_string(),
        })?;
        Self::with_connection(conn, table, target)
    }

    fn with_connection(conn: Connection, table: &str, target: String) -> Result<Self, StoreError> {
        let quoted = quote_identifier(table);
        let index = quote_identifier(&format!("{table}_query_idx"));
        conn.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {quoted} (
                id TEXT PRIMARY KEY,
                query TEXT NOT NULL,
                result_flag INTEGER NOT NULL,
                count INTEGER NOT NULL
            );
            CREATE INDEX IF NOT EXISTS {index} ON {quoted}(query);"
        ))
        .map_err(|e| StoreError::Connection {
            target: target.clone(),
            reason: format!("schema setup failed: {e}"),
        })?;

        debug!(target = %target, table, "tally table ready");
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            table: quoted,
            target,
        })
    }

    /// 연결 대상 (파일 경로 또는 `:memory:`)
    pub fn target(&self) -> &str {
        &self.target
    }

    /// 모든 레코드를 삽입 순서대로 반환합니다.
    pub async fn records(&self) -> Result<Vec<TallyRecord>, StoreError> {
        let sql = format!(
            "SELECT id, query, result_flag, count FROM {} ORDER BY rowid",
            self.table
        );
        self.run("list", "*", move |conn| {
            let mut stmt = conn.prepare(&sql)?;
            let records = stmt
                .query_map([], record_from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(records)
        })
        .await
    }

    /// 연결을 블로킹 풀에서 사용합니다.
    async fn run<T, F>(&self, operation: &str, query: &str, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> rusqlite::Result<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        let joined = tokio::task::spawn_blocking(move || {
            let conn = conn.lock().unwrap_or_else(PoisonError::into_inner);
            f(&conn)
        })
        .await;

        match joined {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(query_error(operation, query, e.to_string())),
            Err(e) => Err(query_error(operation, query, e.to_string())),
        }
    }
}

impl TallyStore for SqliteTallyStore {
    async fn find_by_query(&self, query: &str) -> Result<Option<TallyRecord>, StoreError> {
        let sql = format!(
            "SELECT id, query, result_flag, count FROM {} WHERE query = ?1 ORDER BY rowid LIMIT 1",
            self.table
        );
        let key = query.to_owned();
        self.run("find", query, move |conn| {
            conn.query_row(&sql, params![key], record_from_row)
                .optional()
        })
        .await
    }

    async fn update(&self, id: &str, count: u64, result_flag: bool) -> Result<(), StoreError> {
        let count = i64::try_from(count)
            .map_err(|_| query_error("update", id, format!("count {count} out of range")))?;
        let sql = format!(
            "UPDATE {} SET count = ?1, result_flag = ?2 WHERE id = ?3",
            self.table
        );
        let key = id.to_owned();
        let changed = self
            .run("update", id, move |conn| {
                conn.execute(&sql, params![count, result_flag, key])
            })
            .await?;

        if changed == 0 {
            return Err(query_error("update", id, "no record with this id".to_owned()));
        }
        Ok(())
    }

    async fn insert(&self, record: &TallyRecord) -> Result<(), StoreError> {
        let count = i64::try_from(record.count).map_err(|_| {
            query_error(
                "insert",
                &record.query,
                format!("count {} out of range", record.count),
            )
        })?;
        let sql = format!(
            "INSERT INTO {} (id, query, result_flag, count) VALUES (?1, ?2, ?3, ?4)",
            self.table
        );
        let (id, query, result_flag) = (record.id.clone(), record.query.clone(), record.result_flag);
        self.run("insert", &record.query, move |conn| {
            conn.execute(&sql, params![id, query, result_flag, count])
        })
        .await?;
        Ok(())
    }
}

fn record_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<TallyRecord> {
    let count: i64 = row.get(3)?;
    Ok(TallyRecord {
        id: row.get(0)?,
        query: row.get(1)?,
        result_flag: row.get(2)?,
        count: u64::try_from(count).map_err(|_| rusqlite::Error::IntegralValueOutOfRange(3, count))?,
    })
}

fn query_error(operation: &str, query: &str, reason: String) -> StoreError {
    StoreError::Query {
        operation: operation.to_owned(),
        query: query.to_owned(),
        reason,
    }
}

fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, query: &str, result_flag: bool, count: u64) -> TallyRecord {
        TallyRecord {
            id: id.to_owned(),
            query: query.to_owned(),
            result_flag,
            count,
        }
    }

    #[tokio::test]
    async fn insert_then_find() {
        let store = SqliteTallyStore::open_in_memory("autosuggest").unwrap();
        store.insert(&record("id-1", "red shoes", true, 1)).await.unwrap();

        let found = store.find_by_query("red shoes").await.unwrap();
        assert_eq!(found, Some(record("id-1", "red shoes", true, 1)));
        assert_eq!(store.find_by_query("Red Shoes").await.unwrap(), None);
    }

    #[tokio::test]
    async fn update_overwrites_count_and_flag() {
        let store = SqliteTallyStore::open_in_memory("autosuggest").unwrap();
        store.insert(&record("id-1", "boots", true, 4)).await.unwrap();
        store.update("id-1", 5, false).await.unwrap();

        let found = store.find_by_query("boots").await.unwrap().unwrap();
        assert_eq!(found.count, 5);
        assert!(!found.result_flag);
    }

    #[tokio::test]
    async fn update_of_unknown_id_fails() {
        let store = SqliteTallyStore::open_in_memory("autosuggest").unwrap();
        let err = store.update("missing", 2, true).await.unwrap_err();
        assert!(matches!(err, StoreError::Query { ref operation, .. } if operation == "update"));
    }

    #[tokio::test]
    async fn duplicate_id_insert_fails() {
        let store = SqliteTallyStore::open_in_memory("autosuggest").unwrap();
        store.insert(&record("id-1", "a", true, 1)).await.unwrap();
        let err = store.insert(&record("id-1", "b", true, 1)).await.unwrap_err();
        assert!(matches!(err, StoreError::Query { ref operation, .. } if operation == "insert"));
    }

    #[tokio::test]
    async fn empty_query_is_a_valid_key() {
        let store = SqliteTallyStore::open_in_memory("autosuggest").unwrap();
        store.insert(&record("id-1", "", false, 1)).await.unwrap();
        assert!(store.find_by_query("").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn records_persist_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tally.db");
        {
            let store = SqliteTallyStore::open(&path, "suggest").unwrap();
            store.insert(&record("id-1", "hat", true, 3)).await.unwrap();
        }
        let store = SqliteTallyStore::open(&path, "suggest").unwrap();
        assert_eq!(store.records().await.unwrap(), vec![record("id-1", "hat", true, 3)]);
    }

    #[test]
    fn unopenable_path_is_connection_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing-dir").join("tally.db");
        let err = SqliteTallyStore::open(&path, "autosuggest").err().unwrap();
        assert!(matches!(err, StoreError::Connection { .. }));
    }

    #[test]
    fn identifiers_are_quoted() {
        assert_eq!(quote_identifier("autosuggest"), "\"autosuggest\"");
        assert_eq!(quote_identifier("a\"b"), "\"a\"\"b\"");
    }
}
