// Rollcall - Attendance Recording Core
// Exposes all modules for use in the CLI, API server, and tests

pub mod api;
pub mod checkin;
pub mod config;
pub mod db;
pub mod entities;
pub mod error;
pub mod ledger;
pub mod roster;
pub mod session;
pub mod summary;

// Re-export commonly used types
pub use api::{check_in, class_roster, issue_session_token, student_summary, AuthClaim, Role};
pub use config::Config;
pub use db::setup_database;
pub use entities::{Student, Teacher};
pub use error::{Error, Result};
pub use ledger::{AttendanceRecord, InsertOutcome};
pub use roster::{ClassRoster, RosterEntry};
pub use session::{IssuedToken, SessionDescriptor};
pub use summary::{StudentSummary, SubjectSummary};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
