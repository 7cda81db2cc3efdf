// Role-gated operations
//
// The transport-agnostic surface of the engine. Identity and role
// verification happen upstream (an auth service); each call arrives with
// an already-verified claim, which this layer trusts and checks against
// the per-operation role restriction:
//
//   issue_session_token  teacher only
//   check_in             student only, acts on the claim's own reg_no
//   student_summary      student only, self only
//   class_roster         teacher only

use chrono::NaiveDate;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::checkin;
use crate::error::{Error, Result};
use crate::ledger::AttendanceRecord;
use crate::roster::{self, ClassRoster};
use crate::session::{self, IssuedToken, SessionDescriptor};
use crate::summary::{self, StudentSummary};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Teacher,
}

/// Externally verified identity and role claim carried by every request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthClaim {
    pub reg_no: String,
    pub role: Role,
}

impl AuthClaim {
    pub fn student(reg_no: &str) -> Self {
        AuthClaim {
            reg_no: reg_no.to_string(),
            role: Role::Student,
        }
    }

    pub fn teacher(reg_no: &str) -> Self {
        AuthClaim {
            reg_no: reg_no.to_string(),
            role: Role::Teacher,
        }
    }

    fn require(&self, role: Role) -> Result<()> {
        if self.role == role {
            Ok(())
        } else {
            Err(Error::Forbidden(
                "Operation not permitted for this role".to_string(),
            ))
        }
    }
}

/// Issue a session token for today's (subject, class). Teacher role only;
/// which subjects the teacher may issue for is decided upstream.
pub fn issue_session_token(claim: &AuthClaim, subject: &str, class_name: &str) -> Result<IssuedToken> {
    claim.require(Role::Teacher)?;
    session::issue(subject, class_name)
}

/// Record a check-in for the calling student against a scanned descriptor.
pub fn check_in(
    conn: &Connection,
    claim: &AuthClaim,
    descriptor: &SessionDescriptor,
) -> Result<AttendanceRecord> {
    claim.require(Role::Student)?;
    checkin::check_in(conn, &claim.reg_no, descriptor)
}

/// Attendance summary for a student. Students may only read their own.
pub fn student_summary(conn: &Connection, claim: &AuthClaim, reg_no: &str) -> Result<StudentSummary> {
    claim.require(Role::Student)?;
    if claim.reg_no != reg_no {
        return Err(Error::Forbidden(
            "Students may only view their own attendance".to_string(),
        ));
    }
    summary::student_summary(conn, reg_no)
}

/// Present-list for a session. Teacher role only.
pub fn class_roster(
    conn: &Connection,
    claim: &AuthClaim,
    subject: &str,
    class_name: &str,
    date: NaiveDate,
) -> Result<ClassRoster> {
    claim.require(Role::Teacher)?;
    roster::class_roster(conn, subject, class_name, date)
}
