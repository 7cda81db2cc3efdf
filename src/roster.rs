// Live Roster Feed
//
// Returns who is present for a given session, ordered by check-in time.
// Designed for polling: the consumer holds the session descriptor and asks
// again whenever it wants a fresh view. There is no subscription channel
// and no server-side notion of an "active session" - the descriptor's
// liveness is entirely in the caller's hands.

use chrono::{NaiveDate, NaiveTime};
use rusqlite::Connection;
use serde::Serialize;

use crate::entities::student::find_student;
use crate::error::Result;
use crate::ledger;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RosterEntry {
    pub reg_no: String,
    pub name: String,
    pub time: NaiveTime,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClassRoster {
    pub subject: String,

    #[serde(rename = "class")]
    pub class_name: String,

    pub date: NaiveDate,

    pub total_present: usize,

    /// Present students, check-in time ascending; two students may share a
    /// time value, in which case insertion order decides
    pub students: Vec<RosterEntry>,
}

/// Everyone checked in for (subject, class, date), ordered by time-of-day
/// ascending. Names are resolved per record; a record whose student row is
/// missing shows as "Unknown" rather than failing the whole roster.
pub fn class_roster(
    conn: &Connection,
    subject: &str,
    class_name: &str,
    date: NaiveDate,
) -> Result<ClassRoster> {
    let records = ledger::find_by_session(conn, subject, class_name, date)?;

    let mut students = Vec::with_capacity(records.len());
    for record in &records {
        let name = find_student(conn, &record.reg_no)?
            .map(|s| s.name)
            .unwrap_or_else(|| "Unknown".to_string());

        students.push(RosterEntry {
            reg_no: record.reg_no.clone(),
            name,
            time: record.time,
        });
    }

    Ok(ClassRoster {
        subject: subject.to_string(),
        class_name: class_name.to_string(),
        date,
        total_present: students.len(),
        students,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::setup_database;
    use crate::entities::student::insert_student;
    use crate::entities::Student;
    use crate::ledger::{insert_if_absent, AttendanceRecord};

    fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();
        conn
    }

    fn mark(conn: &Connection, reg_no: &str, time: &str) {
        let record = AttendanceRecord {
            reg_no: reg_no.to_string(),
            subject: "Math".to_string(),
            class_name: "ClassA".to_string(),
            date: NaiveDate::parse_from_str("2024-01-10", "%Y-%m-%d").unwrap(),
            time: NaiveTime::parse_from_str(time, "%H:%M:%S").unwrap(),
        };
        insert_if_absent(conn, &record).unwrap();
    }

    fn session_date() -> NaiveDate {
        NaiveDate::parse_from_str("2024-01-10", "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_empty_session_has_zero_present() {
        let conn = test_conn();
        let roster = class_roster(&conn, "Math", "ClassA", session_date()).unwrap();

        assert_eq!(roster.total_present, 0);
        assert!(roster.students.is_empty());
    }

    #[test]
    fn test_roster_is_ordered_by_time_ascending() {
        let conn = test_conn();
        insert_student(&conn, &Student::new("S1", "Alice", "ClassA", vec![])).unwrap();
        insert_student(&conn, &Student::new("S2", "Bob", "ClassA", vec![])).unwrap();
        insert_student(&conn, &Student::new("S3", "Carol", "ClassA", vec![])).unwrap();

        mark(&conn, "S2", "09:05:00");
        mark(&conn, "S1", "09:01:00");
        mark(&conn, "S3", "09:03:00");

        let roster = class_roster(&conn, "Math", "ClassA", session_date()).unwrap();

        assert_eq!(roster.total_present, 3);
        let order: Vec<&str> = roster.students.iter().map(|e| e.reg_no.as_str()).collect();
        assert_eq!(order, vec!["S1", "S3", "S2"]);

        let times: Vec<NaiveTime> = roster.students.iter().map(|e| e.time).collect();
        let mut sorted = times.clone();
        sorted.sort();
        assert_eq!(times, sorted);
    }

    #[test]
    fn test_shared_time_falls_back_to_insertion_order() {
        let conn = test_conn();
        insert_student(&conn, &Student::new("S1", "Alice", "ClassA", vec![])).unwrap();
        insert_student(&conn, &Student::new("S2", "Bob", "ClassA", vec![])).unwrap();

        mark(&conn, "S2", "09:01:00");
        mark(&conn, "S1", "09:01:00");

        let roster = class_roster(&conn, "Math", "ClassA", session_date()).unwrap();
        let order: Vec<&str> = roster.students.iter().map(|e| e.reg_no.as_str()).collect();
        assert_eq!(order, vec!["S2", "S1"]);
    }

    #[test]
    fn test_missing_student_row_shows_as_unknown() {
        let conn = test_conn();

        // Ledger row without a matching students row
        mark(&conn, "GHOST", "09:00:00");

        let roster = class_roster(&conn, "Math", "ClassA", session_date()).unwrap();
        assert_eq!(roster.students[0].name, "Unknown");
        assert_eq!(roster.students[0].reg_no, "GHOST");
    }

    #[test]
    fn test_roster_filters_by_full_triple() {
        let conn = test_conn();
        insert_student(&conn, &Student::new("S1", "Alice", "ClassA", vec![])).unwrap();

        mark(&conn, "S1", "09:00:00");

        // Different class, different date: both empty
        assert_eq!(
            class_roster(&conn, "Math", "ClassB", session_date())
                .unwrap()
                .total_present,
            0
        );
        let other_date = NaiveDate::parse_from_str("2024-01-11", "%Y-%m-%d").unwrap();
        assert_eq!(
            class_roster(&conn, "Math", "ClassA", other_date)
                .unwrap()
                .total_present,
            0
        );
    }
}
