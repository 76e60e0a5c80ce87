use crate::error::{Result, VizError};
use rusqlite::{Connection, OpenFlags};
use serde::Serialize;
use std::path::Path;
use tracing::debug;

/// Buffers joined to the operation that owns them.
pub const BUFFER_QUERY: &str = "\
SELECT buffers.operation_id, operations.name AS operation_name, buffers.address, buffers.max_size_per_bank
FROM buffers
JOIN operations ON buffers.operation_id = operations.operation_id
ORDER BY buffers.operation_id";

/// One buffer allocation and the operation that holds it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BufferRecord {
    pub operation_id: i64,
    pub operation_name: String,
    pub address: i64,
    pub max_size_per_bank: i64,
}

/// Open a profiling database without write access.
pub fn open(path: impl AsRef<Path>) -> Result<Connection> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(VizError::FileRead {
            path: path.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "database file not found"),
        });
    }
    Ok(Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )?)
}

/// Run [`BUFFER_QUERY`]. Rows with a NULL id, name, address or size are
/// skipped.
pub fn read_buffers(conn: &Connection) -> Result<Vec<BufferRecord>> {
    let mut stmt = conn.prepare(BUFFER_QUERY)?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, Option<i64>>(0)?,
            row.get::<_, Option<String>>(1)?,
            row.get::<_, Option<i64>>(2)?,
            row.get::<_, Option<i64>>(3)?,
        ))
    })?;

    let mut records = Vec::new();
    let mut skipped = 0usize;
    for row in rows {
        match row? {
            (Some(operation_id), Some(operation_name), Some(address), Some(max_size_per_bank)) => {
                records.push(BufferRecord {
                    operation_id,
                    operation_name,
                    address,
                    max_size_per_bank,
                })
            }
            incomplete => {
                skipped += 1;
                debug!(row = ?incomplete, "skipping buffer row with NULL fields");
            }
        }
    }
    debug!(buffers = records.len(), skipped, "read buffer records");
    Ok(records)
}

/// Open, read, and close in one step.
pub fn load(path: impl AsRef<Path>) -> Result<Vec<BufferRecord>> {
    let conn = open(path)?;
    read_buffers(&conn)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn seed(conn: &Connection, ops: &[(i64, &str)], buffers: &[(i64, i64, i64)]) {
        conn.execute_batch(
            "CREATE TABLE operations (operation_id INTEGER PRIMARY KEY, name TEXT);
             CREATE TABLE buffers (operation_id INTEGER, address INTEGER, max_size_per_bank INTEGER, buffer_type INTEGER);",
        )
        .unwrap();
        for (id, name) in ops {
            conn.execute(
                "INSERT INTO operations (operation_id, name) VALUES (?1, ?2)",
                rusqlite::params![id, name],
            )
            .unwrap();
        }
        for (id, addr, size) in buffers {
            conn.execute(
                "INSERT INTO buffers (operation_id, address, max_size_per_bank, buffer_type) VALUES (?1, ?2, ?3, 1)",
                rusqlite::params![id, addr, size],
            )
            .unwrap();
        }
    }

    #[test]
    fn join_attaches_operation_names() {
        let conn = Connection::open_in_memory().unwrap();
        seed(
            &conn,
            &[(1, "ttnn.matmul"), (2, "ttnn.add")],
            &[(2, 4096, 64), (1, 1024, 128), (1, 2048, 32), (9, 1, 1)],
        );
        let records = read_buffers(&conn).unwrap();
        assert_eq!(records.len(), 3, "buffers of unknown operations are dropped");
        assert_eq!(records[0].operation_id, 1);
        assert_eq!(records[0].operation_name, "ttnn.matmul");
        assert_eq!(records[2].operation_name, "ttnn.add");
        assert_eq!(records[2].max_size_per_bank, 64);
    }

    #[test]
    fn rows_with_null_fields_are_skipped() {
        let conn = Connection::open_in_memory().unwrap();
        seed(&conn, &[(1, "ttnn.matmul")], &[(1, 1024, 128)]);
        conn.execute_batch(
            "INSERT INTO operations (operation_id, name) VALUES (2, NULL);
             INSERT INTO operations (operation_id, name) VALUES (3, 'ttnn.add');
             INSERT INTO buffers VALUES (2, 2048, 64, 1);
             INSERT INTO buffers VALUES (3, NULL, 64, 1);
             INSERT INTO buffers VALUES (3, 4096, NULL, 1);
             INSERT INTO buffers VALUES (3, 8192, 32, 1);",
        )
        .unwrap();
        let records = read_buffers(&conn).unwrap();
        let kept: Vec<(i64, i64)> = records.iter().map(|r| (r.operation_id, r.address)).collect();
        assert_eq!(kept, vec![(1, 1024), (3, 8192)]);
    }

    #[test]
    fn missing_tables_are_an_error() {
        let conn = Connection::open_in_memory().unwrap();
        assert!(matches!(read_buffers(&conn), Err(VizError::Sqlite(_))));
    }

    #[test]
    fn load_reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.sqlite");
        {
            let conn = Connection::open(&path).unwrap();
            seed(&conn, &[(3, "ttnn.conv2d")], &[(3, 512, 16)]);
        }
        let records = load(&path).unwrap();
        assert_eq!(
            records,
            vec![BufferRecord {
                operation_id: 3,
                operation_name: "ttnn.conv2d".to_string(),
                address: 512,
                max_size_per_bank: 16,
            }]
        );
    }

    #[test]
    fn missing_database_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            load(dir.path().join("nope.sqlite")),
            Err(VizError::FileRead { .. })
        ));
    }
}
