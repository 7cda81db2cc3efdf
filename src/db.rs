// SQLite storage layout
// Three keyed collections: students (unique reg_no), teachers (unique
// reg_no), attendance (unique composite reg_no+subject+date). The
// attendance table is the ledger: rows are inserted exactly once and no
// UPDATE or DELETE statement exists anywhere in this crate.

use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn setup_database(conn: &Connection) -> Result<()> {
    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;

    // ==========================================================================
    // Students Table (enrollment data; written by enrollment plumbing only)
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS students (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            reg_no TEXT UNIQUE NOT NULL,
            name TEXT NOT NULL,
            class_name TEXT NOT NULL,
            subjects TEXT NOT NULL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    // ==========================================================================
    // Teachers Table (read-only input to authorization decisions)
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS teachers (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            reg_no TEXT UNIQUE NOT NULL,
            name TEXT NOT NULL,
            subjects TEXT NOT NULL,
            classes TEXT NOT NULL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    // ==========================================================================
    // Attendance Table (append-only ledger)
    // One row per (reg_no, subject, date); the unique index is what lets
    // concurrent duplicate check-ins race safely at the storage layer.
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS attendance (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            reg_no TEXT NOT NULL,
            subject TEXT NOT NULL,
            class_name TEXT NOT NULL,
            date TEXT NOT NULL,
            time TEXT NOT NULL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            UNIQUE(reg_no, subject, date)
        )",
        [],
    )?;

    // ==========================================================================
    // Indexes
    // ==========================================================================
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_attendance_reg_no ON attendance(reg_no)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_attendance_session
         ON attendance(subject, class_name, date)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_attendance_subject_date
         ON attendance(subject, date)",
        [],
    )?;

    info!("database schema initialized");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::params;

    #[test]
    fn test_setup_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();
        setup_database(&conn).unwrap();
    }

    #[test]
    fn test_attendance_unique_key_is_enforced_by_storage() {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();

        conn.execute(
            "INSERT INTO attendance (reg_no, subject, class_name, date, time)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params!["S1", "Math", "ClassA", "2024-01-10", "09:01:00"],
        )
        .unwrap();

        // Same key again must be rejected by the engine, not by application code
        let result = conn.execute(
            "INSERT INTO attendance (reg_no, subject, class_name, date, time)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params!["S1", "Math", "ClassA", "2024-01-10", "10:15:00"],
        );

        match result {
            Err(rusqlite::Error::SqliteFailure(err, _)) => {
                assert_eq!(err.code, rusqlite::ErrorCode::ConstraintViolation);
            }
            other => panic!("expected constraint violation, got {:?}", other),
        }
    }

    #[test]
    fn test_different_date_same_student_is_allowed() {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();

        for date in ["2024-01-10", "2024-01-11"] {
            conn.execute(
                "INSERT INTO attendance (reg_no, subject, class_name, date, time)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params!["S1", "Math", "ClassA", date, "09:01:00"],
            )
            .unwrap();
        }

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM attendance", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 2);
    }
}
