// Attendance Ledger - append-only store of check-in events
//
// The ledger exposes an atomic unique-constrained insert plus read-side
// scans. It has no update or delete operation: a row, once written, is an
// audit-grade fact. Duplicate suppression lives in the storage engine's
// UNIQUE(reg_no, subject, date) index, so two simultaneous inserts for the
// same key can never both succeed.

use chrono::{NaiveDate, NaiveTime};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;

/// A single check-in event. Created exactly once, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub reg_no: String,

    pub subject: String,

    #[serde(rename = "class")]
    pub class_name: String,

    pub date: NaiveDate,

    /// Time-of-day of the check-in, second precision
    pub time: NaiveTime,
}

/// Outcome of the conditional insert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Created,
    Conflict,
}

/// Atomically insert a record keyed by (reg_no, subject, date).
///
/// This is a single INSERT against the unique index - never a lookup
/// followed by an insert. When the key already exists the engine reports a
/// constraint violation, surfaced here as `InsertOutcome::Conflict`; any
/// other storage failure propagates as an error.
pub fn insert_if_absent(conn: &Connection, record: &AttendanceRecord) -> Result<InsertOutcome> {
    let result = conn.execute(
        "INSERT INTO attendance (reg_no, subject, class_name, date, time)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            record.reg_no,
            record.subject,
            record.class_name,
            record.date.format("%Y-%m-%d").to_string(),
            record.time.format("%H:%M:%S").to_string(),
        ],
    );

    match result {
        Ok(_) => {
            debug!(
                reg_no = %record.reg_no,
                subject = %record.subject,
                date = %record.date,
                "attendance record created"
            );
            Ok(InsertOutcome::Created)
        }
        Err(rusqlite::Error::SqliteFailure(err, _))
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            Ok(InsertOutcome::Conflict)
        }
        Err(e) => Err(e.into()),
    }
}

fn record_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<AttendanceRecord> {
    let date_str: String = row.get(3)?;
    let time_str: String = row.get(4)?;

    Ok(AttendanceRecord {
        reg_no: row.get(0)?,
        subject: row.get(1)?,
        class_name: row.get(2)?,
        date: NaiveDate::parse_from_str(&date_str, "%Y-%m-%d")
            .map_err(|_| rusqlite::Error::InvalidQuery)?,
        time: NaiveTime::parse_from_str(&time_str, "%H:%M:%S")
            .map_err(|_| rusqlite::Error::InvalidQuery)?,
    })
}

/// All records for one student, across subjects and dates
pub fn find_by_student(conn: &Connection, reg_no: &str) -> Result<Vec<AttendanceRecord>> {
    let mut stmt = conn.prepare(
        "SELECT reg_no, subject, class_name, date, time
         FROM attendance
         WHERE reg_no = ?1
         ORDER BY date, subject",
    )?;

    let records = stmt
        .query_map(params![reg_no], record_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(records)
}

/// Records for one session, ordered by check-in time ascending.
/// Ties on the time column fall back to rowid, i.e. insertion order.
pub fn find_by_session(
    conn: &Connection,
    subject: &str,
    class_name: &str,
    date: NaiveDate,
) -> Result<Vec<AttendanceRecord>> {
    let mut stmt = conn.prepare(
        "SELECT reg_no, subject, class_name, date, time
         FROM attendance
         WHERE subject = ?1 AND class_name = ?2 AND date = ?3
         ORDER BY time ASC, id ASC",
    )?;

    let records = stmt
        .query_map(
            params![subject, class_name, date.format("%Y-%m-%d").to_string()],
            record_from_row,
        )?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(records)
}

/// Distinct dates on which at least one record exists for the subject.
/// This is the "classes held" count: a session nobody attended leaves no
/// trace and is therefore not counted.
pub fn distinct_dates(conn: &Connection, subject: &str) -> Result<Vec<NaiveDate>> {
    let mut stmt = conn.prepare(
        "SELECT DISTINCT date FROM attendance WHERE subject = ?1 ORDER BY date",
    )?;

    let dates = stmt
        .query_map(params![subject], |row| {
            let date_str: String = row.get(0)?;
            NaiveDate::parse_from_str(&date_str, "%Y-%m-%d")
                .map_err(|_| rusqlite::Error::InvalidQuery)
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(dates)
}
