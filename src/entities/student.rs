// Student Entity
//
// Identified by registration number; carries the enrolled-subjects set
// that every check-in is validated against. Rows are written once by
// enrollment plumbing and never updated by this crate.

use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    /// Registration number (unique identifier)
    pub reg_no: String,

    /// Display name
    pub name: String,

    /// Class affiliation, e.g. "ClassA"
    pub class_name: String,

    /// Subjects this student is enrolled in
    pub subjects: Vec<String>,
}

impl Student {
    pub fn new(reg_no: &str, name: &str, class_name: &str, subjects: Vec<String>) -> Self {
        Student {
            reg_no: reg_no.to_string(),
            name: name.to_string(),
            class_name: class_name.to_string(),
            subjects,
        }
    }

    /// Whether the student is enrolled in the given subject
    pub fn is_enrolled(&self, subject: &str) -> bool {
        self.subjects.iter().any(|s| s == subject)
    }
}

/// Insert a student row. The subjects set is stored as a JSON array column.
/// Fails `Conflict` when the registration number is already taken.
pub fn insert_student(conn: &Connection, student: &Student) -> Result<()> {
    let subjects_json = serde_json::to_string(&student.subjects)?;

    let result = conn.execute(
        "INSERT INTO students (reg_no, name, class_name, subjects)
         VALUES (?1, ?2, ?3, ?4)",
        params![
            student.reg_no,
            student.name,
            student.class_name,
            subjects_json,
        ],
    );

    match result {
        Ok(_) => Ok(()),
        Err(rusqlite::Error::SqliteFailure(err, _))
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            Err(Error::Conflict(format!(
                "Student already registered: {}",
                student.reg_no
            )))
        }
        Err(e) => Err(e.into()),
    }
}

/// Point lookup by registration number
pub fn find_student(conn: &Connection, reg_no: &str) -> Result<Option<Student>> {
    let row = conn
        .query_row(
            "SELECT reg_no, name, class_name, subjects FROM students WHERE reg_no = ?1",
            params![reg_no],
            |row| {
                let subjects_json: String = row.get(3)?;
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    subjects_json,
                ))
            },
        )
        .optional()?;

    match row {
        Some((reg_no, name, class_name, subjects_json)) => {
            let subjects: Vec<String> = serde_json::from_str(&subjects_json)?;
            Ok(Some(Student {
                reg_no,
                name,
                class_name,
                subjects,
            }))
        }
        None => Ok(None),
    }
}
