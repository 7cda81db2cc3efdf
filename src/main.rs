use anyhow::{bail, Result};
use chrono::NaiveDate;
use rusqlite::Connection;
use std::env;

use rollcall::entities::student::insert_student;
use rollcall::entities::teacher::insert_teacher;
use rollcall::{
    check_in, class_roster, issue_session_token, setup_database, student_summary, AuthClaim,
    Config, SessionDescriptor, Student, Teacher,
};

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_usage();
        return Ok(());
    }

    let config = Config::load();
    let conn = Connection::open(&config.db_path)?;
    setup_database(&conn)?;

    match args[1].as_str() {
        "init" => {
            println!("✓ Database initialized: {}", config.db_path);
        }
        "seed" => run_seed(&conn)?,
        "issue" => {
            if args.len() < 4 {
                bail!("usage: rollcall issue <subject> <class>");
            }
            run_issue(&args[2], &args[3])?;
        }
        "checkin" => {
            if args.len() < 4 {
                bail!("usage: rollcall checkin <reg_no> <payload>");
            }
            run_checkin(&conn, &args[2], &args[3])?;
        }
        "summary" => {
            if args.len() < 3 {
                bail!("usage: rollcall summary <reg_no>");
            }
            run_summary(&conn, &args[2])?;
        }
        "roster" => {
            if args.len() < 5 {
                bail!("usage: rollcall roster <subject> <class> <YYYY-MM-DD>");
            }
            run_roster(&conn, &args[2], &args[3], &args[4])?;
        }
        other => {
            eprintln!("Unknown command: {}", other);
            print_usage();
        }
    }

    Ok(())
}

fn print_usage() {
    println!("Rollcall - attendance recording core");
    println!();
    println!("Usage:");
    println!("  rollcall init                                  create the database");
    println!("  rollcall seed                                  load demo students and teachers");
    println!("  rollcall issue <subject> <class>               issue today's session token");
    println!("  rollcall checkin <reg_no> <payload>            check in with a scanned payload");
    println!("  rollcall summary <reg_no>                      per-subject attendance summary");
    println!("  rollcall roster <subject> <class> <date>       who was present");
    println!();
    println!("Database path comes from ROLLCALL_DB (default: rollcall.db)");
}

fn run_seed(conn: &Connection) -> Result<()> {
    let students = vec![
        Student::new(
            "2024001",
            "Alice Carter",
            "ClassA",
            vec!["Math".to_string(), "Physics".to_string()],
        ),
        Student::new(
            "2024002",
            "Bob Singh",
            "ClassA",
            vec!["Math".to_string(), "Chemistry".to_string()],
        ),
        Student::new(
            "2024003",
            "Carol Mendes",
            "ClassB",
            vec!["Physics".to_string()],
        ),
    ];

    let teachers = vec![
        Teacher::new(
            "T100",
            "Dr. Romero",
            vec!["Math".to_string()],
            vec!["ClassA".to_string()],
        ),
        Teacher::new(
            "T101",
            "Prof. Okafor",
            vec!["Physics".to_string(), "Chemistry".to_string()],
            vec!["ClassA".to_string(), "ClassB".to_string()],
        ),
    ];

    let mut inserted = 0;
    let mut skipped = 0;

    for student in &students {
        match insert_student(conn, student) {
            Ok(()) => inserted += 1,
            Err(e) if e.kind() == "conflict" => skipped += 1,
            Err(e) => return Err(e.into()),
        }
    }
    for teacher in &teachers {
        match insert_teacher(conn, teacher) {
            Ok(()) => inserted += 1,
            Err(e) if e.kind() == "conflict" => skipped += 1,
            Err(e) => return Err(e.into()),
        }
    }

    println!("✓ Seeded: {} rows", inserted);
    if skipped > 0 {
        println!("✓ Already present: {} rows", skipped);
    }

    Ok(())
}

fn run_issue(subject: &str, class_name: &str) -> Result<()> {
    let token = issue_session_token(&AuthClaim::teacher("cli"), subject, class_name)?;

    println!(
        "✓ Session token for {} / {} on {}",
        token.descriptor.subject, token.descriptor.class_name, token.descriptor.date
    );
    println!("\nPayload (what the QR code carries):");
    println!("  {}", token.payload);
    println!("\nSVG ({} bytes) - pipe to a file to display", token.svg.len());

    Ok(())
}

fn run_checkin(conn: &Connection, reg_no: &str, payload: &str) -> Result<()> {
    let descriptor = SessionDescriptor::from_payload(payload)?;
    let record = check_in(conn, &AuthClaim::student(reg_no), &descriptor)?;

    println!(
        "✓ Checked in: {} for {} ({}) at {}",
        record.reg_no, record.subject, record.date, record.time
    );

    Ok(())
}

fn run_summary(conn: &Connection, reg_no: &str) -> Result<()> {
    let summary = student_summary(conn, &AuthClaim::student(reg_no), reg_no)?;

    println!("Attendance for {} ({})", summary.name, summary.reg_no);
    for (subject, s) in &summary.subjects {
        println!(
            "  {:<16} {:>3}/{:<3} {:>6.2}%",
            subject, s.attended, s.total_classes, s.percentage
        );
    }

    Ok(())
}

fn run_roster(conn: &Connection, subject: &str, class_name: &str, date: &str) -> Result<()> {
    let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")?;
    let roster = class_roster(conn, &AuthClaim::teacher("cli"), subject, class_name, date)?;

    println!(
        "Roster for {} / {} on {} - {} present",
        roster.subject, roster.class_name, roster.date, roster.total_present
    );
    for entry in &roster.students {
        println!("  {}  {:<12} {}", entry.time, entry.reg_no, entry.name);
    }

    Ok(())
}
