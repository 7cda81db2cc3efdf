// Teacher Entity
//
// Read-only input to authorization decisions. Which subjects and classes
// a teacher may issue tokens for is decided by the upstream auth layer;
// the sets are stored here as enrollment-time facts.

use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Teacher {
    /// Registration number (unique identifier)
    pub reg_no: String,

    /// Display name
    pub name: String,

    /// Subjects taught
    pub subjects: Vec<String>,

    /// Classes taught
    pub classes: Vec<String>,
}

impl Teacher {
    pub fn new(reg_no: &str, name: &str, subjects: Vec<String>, classes: Vec<String>) -> Self {
        Teacher {
            reg_no: reg_no.to_string(),
            name: name.to_string(),
            subjects,
            classes,
        }
    }

    /// Whether this teacher teaches the given subject to the given class
    pub fn teaches(&self, subject: &str, class_name: &str) -> bool {
        self.subjects.iter().any(|s| s == subject) && self.classes.iter().any(|c| c == class_name)
    }
}

/// Insert a teacher row. Fails `Conflict` when the registration number is
/// already taken.
pub fn insert_teacher(conn: &Connection, teacher: &Teacher) -> Result<()> {
    let subjects_json = serde_json::to_string(&teacher.subjects)?;
    let classes_json = serde_json::to_string(&teacher.classes)?;

    let result = conn.execute(
        "INSERT INTO teachers (reg_no, name, subjects, classes)
         VALUES (?1, ?2, ?3, ?4)",
        params![teacher.reg_no, teacher.name, subjects_json, classes_json],
    );

    match result {
        Ok(_) => Ok(()),
        Err(rusqlite::Error::SqliteFailure(err, _))
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            Err(Error::Conflict(format!(
                "Teacher already registered: {}",
                teacher.reg_no
            )))
        }
        Err(e) => Err(e.into()),
    }
}

/// Point lookup by registration number
pub fn find_teacher(conn: &Connection, reg_no: &str) -> Result<Option<Teacher>> {
    let row = conn
        .query_row(
            "SELECT reg_no, name, subjects, classes FROM teachers WHERE reg_no = ?1",
            params![reg_no],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                ))
            },
        )
        .optional()?;

    match row {
        Some((reg_no, name, subjects_json, classes_json)) => {
            let subjects: Vec<String> = serde_json::from_str(&subjects_json)?;
            let classes: Vec<String> = serde_json::from_str(&classes_json)?;
            Ok(Some(Teacher {
                reg_no,
                name,
                subjects,
                classes,
            }))
        }
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::setup_database;

    fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();
        conn
    }

    #[test]
    fn test_teaches() {
        let teacher = Teacher::new(
            "T1",
            "Mr. Brown",
            vec!["Math".to_string()],
            vec!["ClassA".to_string(), "ClassB".to_string()],
        );

        assert!(teacher.teaches("Math", "ClassA"));
        assert!(teacher.teaches("Math", "ClassB"));
        assert!(!teacher.teaches("Physics", "ClassA"));
        assert!(!teacher.teaches("Math", "ClassC"));
    }

    #[test]
    fn test_insert_and_find_roundtrip() {
        let conn = test_conn();

        let teacher = Teacher::new(
            "T1",
            "Mr. Brown",
            vec!["Math".to_string()],
            vec!["ClassA".to_string()],
        );
        insert_teacher(&conn, &teacher).unwrap();

        let found = find_teacher(&conn, "T1").unwrap().unwrap();
        assert_eq!(found, teacher);
    }

    #[test]
    fn test_duplicate_reg_no_is_conflict() {
        let conn = test_conn();

        let teacher = Teacher::new("T1", "Mr. Brown", vec![], vec![]);
        insert_teacher(&conn, &teacher).unwrap();

        let err = insert_teacher(&conn, &teacher).unwrap_err();
        assert_eq!(err.kind(), "conflict");
    }
}
