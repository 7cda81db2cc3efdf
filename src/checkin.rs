// Check-in Validator
//
// Authorizes and records a student's check-in against a scanned session
// descriptor. The duplicate check is NOT a lookup followed by an insert:
// the ledger's unique-constrained insert decides the race, so two
// simultaneous check-ins for the same (reg_no, subject, date) key can
// never both succeed. A check-in either commits a single record or leaves
// no trace.

use chrono::{Timelike, Utc};
use rusqlite::Connection;
use tracing::{info, warn};

use crate::entities::student::find_student;
use crate::error::{Error, Result};
use crate::ledger::{self, AttendanceRecord, InsertOutcome};
use crate::session::SessionDescriptor;

/// Record a check-in for the student identified by `reg_no` against the
/// scanned descriptor. Returns the created record.
///
/// Failure order: `Validation` (empty descriptor fields), `NotFound`
/// (unknown student), `Forbidden` (subject not in the student's
/// enrollment), `Conflict` (a record for this key already exists).
///
/// The record's date is the descriptor's date; the time-of-day is the
/// current time. The class is recorded as scanned and not checked against
/// the student's own class.
pub fn check_in(
    conn: &Connection,
    reg_no: &str,
    descriptor: &SessionDescriptor,
) -> Result<AttendanceRecord> {
    if reg_no.trim().is_empty()
        || descriptor.subject.trim().is_empty()
        || descriptor.class_name.trim().is_empty()
    {
        return Err(Error::Validation("Missing required fields".to_string()));
    }

    let student = find_student(conn, reg_no)?
        .ok_or_else(|| Error::NotFound("Student not found".to_string()))?;

    if !student.is_enrolled(&descriptor.subject) {
        warn!(reg_no = %reg_no, subject = %descriptor.subject, "check-in refused: not enrolled");
        return Err(Error::Forbidden(
            "You are not enrolled in this subject".to_string(),
        ));
    }

    // Second precision; the stored value must read back equal
    let now = Utc::now().time();
    let time = now.with_nanosecond(0).unwrap_or(now);

    let record = AttendanceRecord {
        reg_no: student.reg_no.clone(),
        subject: descriptor.subject.clone(),
        class_name: descriptor.class_name.clone(),
        date: descriptor.date,
        time,
    };

    match ledger::insert_if_absent(conn, &record)? {
        InsertOutcome::Created => {
            info!(reg_no = %record.reg_no, subject = %record.subject, date = %record.date, "check-in recorded");
            Ok(record)
        }
        InsertOutcome::Conflict => Err(Error::Conflict(
            "Attendance already marked for this subject today".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::setup_database;
    use crate::entities::student::insert_student;
    use crate::entities::Student;
    use chrono::NaiveDate;

    fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();

        insert_student(
            &conn,
            &Student::new("S1", "Alice", "ClassA", vec!["Math".to_string()]),
        )
        .unwrap();
        insert_student(
            &conn,
            &Student::new("S2", "Bob", "ClassA", vec!["Physics".to_string()]),
        )
        .unwrap();

        conn
    }

    fn descriptor(subject: &str, class_name: &str, date: &str) -> SessionDescriptor {
        SessionDescriptor {
            subject: subject.to_string(),
            class_name: class_name.to_string(),
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
        }
    }

    #[test]
    fn test_check_in_creates_record() {
        let conn = test_conn();
        let desc = descriptor("Math", "ClassA", "2024-01-10");

        let record = check_in(&conn, "S1", &desc).unwrap();
        assert_eq!(record.reg_no, "S1");
        assert_eq!(record.subject, "Math");
        assert_eq!(record.class_name, "ClassA");
        assert_eq!(record.date, desc.date);

        let stored = ledger::find_by_student(&conn, "S1").unwrap();
        assert_eq!(stored, vec![record]);
    }

    #[test]
    fn test_unknown_student_is_not_found() {
        let conn = test_conn();
        let err = check_in(&conn, "S999", &descriptor("Math", "ClassA", "2024-01-10")).unwrap_err();
        assert_eq!(err.kind(), "not_found");
    }

    #[test]
    fn test_not_enrolled_is_forbidden_regardless_of_class_or_date() {
        let conn = test_conn();

        // S2 is enrolled in Physics only
        for (class_name, date) in [("ClassA", "2024-01-10"), ("ClassB", "2025-06-01")] {
            let err = check_in(&conn, "S2", &descriptor("Math", class_name, date)).unwrap_err();
            assert_eq!(err.kind(), "forbidden");
        }

        // And nothing was written
        assert!(ledger::find_by_student(&conn, "S2").unwrap().is_empty());
    }

    #[test]
    fn test_second_check_in_same_day_is_conflict() {
        let conn = test_conn();
        let desc = descriptor("Math", "ClassA", "2024-01-10");

        check_in(&conn, "S1", &desc).unwrap();
        let err = check_in(&conn, "S1", &desc).unwrap_err();
        assert_eq!(err.kind(), "conflict");

        // Exactly one record survives
        assert_eq!(ledger::find_by_student(&conn, "S1").unwrap().len(), 1);
    }

    #[test]
    fn test_empty_descriptor_fields_are_validation_errors() {
        let conn = test_conn();

        let err = check_in(&conn, "S1", &descriptor("", "ClassA", "2024-01-10")).unwrap_err();
        assert_eq!(err.kind(), "validation");

        let err = check_in(&conn, "", &descriptor("Math", "ClassA", "2024-01-10")).unwrap_err();
        assert_eq!(err.kind(), "validation");
    }

    #[test]
    fn test_class_field_is_recorded_as_scanned() {
        let conn = test_conn();

        // S1 belongs to ClassA but the scanned descriptor says ClassB;
        // accepted current behavior is to record it as scanned.
        let record = check_in(&conn, "S1", &descriptor("Math", "ClassB", "2024-01-10")).unwrap();
        assert_eq!(record.class_name, "ClassB");
    }

    #[test]
    fn test_racing_check_ins_one_winner() {
        use std::sync::{Arc, Mutex};
        use std::thread;

        let conn = Arc::new(Mutex::new(test_conn()));
        let desc = descriptor("Math", "ClassA", "2024-01-10");

        let mut handles = Vec::new();
        for _ in 0..4 {
            let conn = Arc::clone(&conn);
            let desc = desc.clone();
            handles.push(thread::spawn(move || {
                let conn = conn.lock().unwrap();
                check_in(&conn, "S1", &desc)
            }));
        }

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let wins = results.iter().filter(|r| r.is_ok()).count();
        let conflicts = results
            .iter()
            .filter(|r| matches!(r, Err(e) if e.kind() == "conflict"))
            .count();

        assert_eq!(wins, 1);
        assert_eq!(conflicts, 3);
    }
}
