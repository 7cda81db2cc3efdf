// Percentage Aggregator
//
// Derives per-subject attendance ratios from the ledger. "Total classes
// held" for a subject is the number of distinct dates carrying at least
// one record for that subject, across all students - attendance existence
// is treated as proof a class occurred. When that count is 0 it is
// substituted with 1, so a subject with no recorded sessions reports 0%
// rather than an undefined state. Both are documented simplifications,
// preserved as-is. The aggregator performs no writes.

use std::collections::BTreeMap;

use rusqlite::Connection;
use serde::Serialize;

use crate::entities::student::find_student;
use crate::error::{Error, Result};
use crate::ledger;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubjectSummary {
    /// Number of this student's records for the subject
    pub attended: i64,

    /// Distinct session dates for the subject, floored at 1
    pub total_classes: i64,

    /// attended / total_classes * 100, rounded to 2 decimal places
    pub percentage: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct StudentSummary {
    pub reg_no: String,
    pub name: String,

    #[serde(rename = "class")]
    pub class_name: String,

    /// Per-subject breakdown, keyed by subject name
    pub subjects: BTreeMap<String, SubjectSummary>,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Compute the attendance summary for every subject the student is
/// enrolled in. Fails `NotFound` for an unknown registration number.
pub fn student_summary(conn: &Connection, reg_no: &str) -> Result<StudentSummary> {
    let student = find_student(conn, reg_no)?
        .ok_or_else(|| Error::NotFound("Student not found".to_string()))?;

    let records = ledger::find_by_student(conn, reg_no)?;

    let mut subjects = BTreeMap::new();

    for subject in &student.subjects {
        let attended = records.iter().filter(|r| &r.subject == subject).count() as i64;

        let held = ledger::distinct_dates(conn, subject)?.len() as i64;
        let total_classes = if held == 0 { 1 } else { held };

        let percentage = round2(attended as f64 / total_classes as f64 * 100.0);

        subjects.insert(
            subject.clone(),
            SubjectSummary {
                attended,
                total_classes,
                percentage,
            },
        );
    }

    Ok(StudentSummary {
        reg_no: student.reg_no,
        name: student.name,
        class_name: student.class_name,
        subjects,
    })
}
