// Session Token Generator
//
// A session is identified by the value triple {subject, class, date} - the
// descriptor. It is never persisted: it exists only inside an issued token
// and in the hands of whoever holds it. Issuance is stateless, so any
// number of descriptors may be live at once and re-issuing for the same
// subject and class on the same day produces an equal descriptor rather
// than a conflict.
//
// The descriptor is unsigned and carries no expiry beyond its calendar
// day. Anyone who captures the rendered token can check in for the rest of
// that day.

use chrono::{NaiveDate, Utc};
use qrcode::{render::svg, QrCode};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Error, Result};

/// The {subject, class, date} triple identifying a class session.
/// Two descriptors with identical fields are interchangeable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionDescriptor {
    pub subject: String,

    #[serde(rename = "class")]
    pub class_name: String,

    pub date: NaiveDate,
}

impl SessionDescriptor {
    /// Build a descriptor for today's session of (subject, class).
    /// Fails `Validation` when either field is missing after trimming.
    pub fn for_today(subject: &str, class_name: &str) -> Result<Self> {
        let subject = subject.trim();
        let class_name = class_name.trim();

        if subject.is_empty() || class_name.is_empty() {
            return Err(Error::Validation(
                "Please provide subject and class name".to_string(),
            ));
        }

        Ok(SessionDescriptor {
            subject: subject.to_string(),
            class_name: class_name.to_string(),
            date: Utc::now().date_naive(),
        })
    }

    /// Parse a scanned token payload back into a descriptor.
    pub fn from_payload(payload: &str) -> Result<Self> {
        let descriptor: SessionDescriptor = serde_json::from_str(payload)
            .map_err(|e| Error::Validation(format!("Malformed session token: {}", e)))?;

        if descriptor.subject.trim().is_empty() || descriptor.class_name.trim().is_empty() {
            return Err(Error::Validation(
                "Session token is missing subject or class name".to_string(),
            ));
        }

        Ok(descriptor)
    }

    /// Canonical JSON payload - what the scannable code carries
    pub fn payload(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// An issued token: the raw descriptor for the caller's later polling use
/// plus the scan-friendly rendering for display.
#[derive(Debug, Clone, Serialize)]
pub struct IssuedToken {
    pub descriptor: SessionDescriptor,

    /// JSON payload encoded inside the QR code
    pub payload: String,

    /// SVG rendering of the QR code, ready to embed in a display
    pub svg: String,
}

/// Issue a token for today's session of (subject, class).
///
/// Stateless: nothing is recorded server-side. The caller is assumed to be
/// authorized upstream as a teacher for this subject and class.
pub fn issue(subject: &str, class_name: &str) -> Result<IssuedToken> {
    let descriptor = SessionDescriptor::for_today(subject, class_name)?;
    let payload = descriptor.payload()?;

    let svg = QrCode::new(payload.as_bytes())
        .map_err(|e| Error::Internal(format!("QR generation failed: {}", e)))?
        .render::<svg::Color>()
        .min_dimensions(256, 256)
        .dark_color(svg::Color("#000000"))
        .light_color(svg::Color("#FFFFFF"))
        .build();

    info!(subject = %descriptor.subject, class = %descriptor.class_name, "session token issued");

    Ok(IssuedToken {
        descriptor,
        payload,
        svg,
    })
}
