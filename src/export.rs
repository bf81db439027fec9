use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::Application;

pub const BACKUP_VERSION: &str = "1.0.0";

/// Column order of the CSV export. Every header auto-maps back on import.
pub const CSV_HEADERS: [&str; 23] = [
    "ID",
    "Company Name",
    "Position",
    "Status",
    "Priority",
    "Target Date",
    "Applied Date",
    "First Interview Date",
    "Offer Date",
    "Response Deadline",
    "Location",
    "Work Type",
    "Employment Type",
    "Salary Min",
    "Salary Max",
    "Job URL",
    "Job Description",
    "Notes",
    "Tags",
    "Source",
    "Referral Name",
    "Created At",
    "Updated At",
];

fn date_cell(date: Option<&DateTime<Utc>>) -> String {
    date.map(|d| d.to_rfc3339()).unwrap_or_default()
}

fn application_record(app: &Application) -> Vec<String> {
    let salary_min = app.salary.as_ref().and_then(|s| s.min);
    let salary_max = app.salary.as_ref().and_then(|s| s.max);
    vec![
        app.id.clone(),
        app.company_name.clone(),
        app.position.clone(),
        app.status.to_string(),
        app.priority.map(|p| p.to_string()).unwrap_or_default(),
        date_cell(app.target_date.as_ref()),
        date_cell(app.applied_date.as_ref()),
        date_cell(app.first_interview_date.as_ref()),
        date_cell(app.offer_date.as_ref()),
        date_cell(app.response_deadline.as_ref()),
        app.location.clone().unwrap_or_default(),
        app.work_type.map(|w| w.to_string()).unwrap_or_default(),
        app.employment_type.map(|e| e.to_string()).unwrap_or_default(),
        salary_min.map(|n| n.to_string()).unwrap_or_default(),
        salary_max.map(|n| n.to_string()).unwrap_or_default(),
        app.job_url.clone().unwrap_or_default(),
        app.job_description.clone().unwrap_or_default(),
        app.notes.clone().unwrap_or_default(),
        app.tags.join("; "),
        app.source.clone().unwrap_or_default(),
        app.referral_name.clone().unwrap_or_default(),
        app.created_at.to_rfc3339(),
        app.updated_at.to_rfc3339(),
    ]
}

/// Renders applications as CSV, quoting only where needed. No applications, no output.
pub fn export_applications_csv(applications: &[Application]) -> Result<String> {
    if applications.is_empty() {
        return Ok(String::new());
    }

    let mut wtr = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Necessary)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    wtr.write_record(CSV_HEADERS)?;
    for app in applications {
        wtr.write_record(application_record(app))?;
    }

    let bytes = wtr
        .into_inner()
        .map_err(|e| e.into_error())
        .context("Failed to flush CSV writer")?;
    String::from_utf8(bytes).context("CSV output was not valid UTF-8")
}

pub fn to_json<T: Serialize>(data: &T, pretty: bool) -> Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(data)?
    } else {
        serde_json::to_string(data)?
    };
    Ok(json)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Backup {
    pub version: String,
    pub timestamp: DateTime<Utc>,
    pub record_count: usize,
    pub applications: Vec<Application>,
}

#[derive(Debug, Error)]
pub enum BackupError {
    #[error("Failed to parse backup: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid backup format")]
    InvalidFormat,
}

pub fn create_backup(applications: &[Application]) -> Backup {
    Backup {
        version: BACKUP_VERSION.to_string(),
        timestamp: Utc::now(),
        record_count: applications.len(),
        applications: applications.to_vec(),
    }
}

/// Accepts a backup document, or a bare array of applications which is wrapped
/// in a fresh backup envelope.
pub fn parse_backup(content: &str) -> Result<Backup, BackupError> {
    let value: serde_json::Value = serde_json::from_str(content)?;

    if value.is_array() {
        let applications: Vec<Application> = serde_json::from_value(value)?;
        return Ok(create_backup(&applications));
    }

    let has_envelope = ["version", "timestamp", "applications"]
        .iter()
        .all(|key| value.get(key).is_some_and(|v| !v.is_null()));
    if !has_envelope {
        return Err(BackupError::InvalidFormat);
    }

    let mut backup: Backup = serde_json::from_value(value)?;
    backup.record_count = backup.applications.len();
    Ok(backup)
}

pub fn format_bytes(bytes: u64, decimals: usize) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    let mut exp = 0;
    let mut scaled = bytes;
    while scaled >= 1024 && exp < UNITS.len() - 1 {
        scaled /= 1024;
        exp += 1;
    }
    let value = bytes as f64 / 1024_f64.powi(exp as i32);

    // Trim trailing zeros the way a human would write it: 1.5 KB, not 1.50 KB
    let formatted = format!("{:.*}", decimals, value);
    let formatted = if formatted.contains('.') {
        formatted.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        formatted
    };
    format!("{} {}", formatted, UNITS[exp])
}

/// `thrive-<kind>-YYYY-MM-DD.<ext>`
pub fn default_filename(kind: &str, extension: &str, now: DateTime<Utc>) -> String {
    format!("thrive-{}-{}.{}", kind, now.format("%Y-%m-%d"), extension)
}
