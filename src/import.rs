use anyhow::{anyhow, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use crate::models::{
    Application, ApplicationStatus, EmploymentType, Priority, SalaryRange, WorkType,
    DEFAULT_CURRENCY,
};

/// Application field a CSV column can feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TargetField {
    CompanyName,
    Position,
    Status,
    Priority,
    TargetDate,
    AppliedDate,
    FirstInterviewDate,
    OfferDate,
    ResponseDeadline,
    Location,
    WorkType,
    EmploymentType,
    /// Positional: the first `salary` column is the minimum, the next one to its right the maximum.
    Salary,
    SalaryMin,
    SalaryMax,
    JobUrl,
    JobDescription,
    Notes,
    Tags,
    Source,
    ReferralName,
    CreatedAt,
    UpdatedAt,
}

impl TargetField {
    pub const ALL: &'static [TargetField] = &[
        TargetField::CompanyName,
        TargetField::Position,
        TargetField::Status,
        TargetField::Priority,
        TargetField::TargetDate,
        TargetField::AppliedDate,
        TargetField::FirstInterviewDate,
        TargetField::OfferDate,
        TargetField::ResponseDeadline,
        TargetField::Location,
        TargetField::WorkType,
        TargetField::EmploymentType,
        TargetField::Salary,
        TargetField::SalaryMin,
        TargetField::SalaryMax,
        TargetField::JobUrl,
        TargetField::JobDescription,
        TargetField::Notes,
        TargetField::Tags,
        TargetField::Source,
        TargetField::ReferralName,
        TargetField::CreatedAt,
        TargetField::UpdatedAt,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TargetField::CompanyName => "companyName",
            TargetField::Position => "position",
            TargetField::Status => "status",
            TargetField::Priority => "priority",
            TargetField::TargetDate => "targetDate",
            TargetField::AppliedDate => "appliedDate",
            TargetField::FirstInterviewDate => "firstInterviewDate",
            TargetField::OfferDate => "offerDate",
            TargetField::ResponseDeadline => "responseDeadline",
            TargetField::Location => "location",
            TargetField::WorkType => "workType",
            TargetField::EmploymentType => "employmentType",
            TargetField::Salary => "salary",
            TargetField::SalaryMin => "salaryMin",
            TargetField::SalaryMax => "salaryMax",
            TargetField::JobUrl => "jobUrl",
            TargetField::JobDescription => "jobDescription",
            TargetField::Notes => "notes",
            TargetField::Tags => "tags",
            TargetField::Source => "source",
            TargetField::ReferralName => "referralName",
            TargetField::CreatedAt => "createdAt",
            TargetField::UpdatedAt => "updatedAt",
        }
    }
}

impl fmt::Display for TargetField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TargetField {
    type Err = anyhow::Error;

    /// Accepts `companyName`, `company_name` or `company-name`.
    fn from_str(s: &str) -> Result<Self> {
        let key: String = s
            .trim()
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .collect::<String>()
            .to_lowercase();
        TargetField::ALL
            .iter()
            .find(|f| f.as_str().to_lowercase() == key)
            .copied()
            .ok_or_else(|| anyhow!("Unknown target field '{}'", s))
    }
}

/// Header synonyms, compared lowercase and trimmed.
const HEADER_SYNONYMS: &[(&str, TargetField)] = &[
    ("company name", TargetField::CompanyName),
    ("company", TargetField::CompanyName),
    ("companyname", TargetField::CompanyName),
    ("employer", TargetField::CompanyName),
    ("position", TargetField::Position),
    ("job title", TargetField::Position),
    ("title", TargetField::Position),
    ("role", TargetField::Position),
    ("status", TargetField::Status),
    ("priority", TargetField::Priority),
    ("target date", TargetField::TargetDate),
    ("targeted", TargetField::TargetDate),
    ("applied date", TargetField::AppliedDate),
    ("application date", TargetField::AppliedDate),
    ("applied", TargetField::AppliedDate),
    ("interview date", TargetField::FirstInterviewDate),
    ("first interview", TargetField::FirstInterviewDate),
    ("first interview date", TargetField::FirstInterviewDate),
    ("offer date", TargetField::OfferDate),
    ("offer", TargetField::OfferDate),
    ("response deadline", TargetField::ResponseDeadline),
    ("deadline", TargetField::ResponseDeadline),
    ("location", TargetField::Location),
    ("work type", TargetField::WorkType),
    ("remote/hybrid/onsite", TargetField::WorkType),
    ("employment type", TargetField::EmploymentType),
    ("type", TargetField::EmploymentType),
    ("salary", TargetField::Salary),
    ("salary min", TargetField::SalaryMin),
    ("min salary", TargetField::SalaryMin),
    ("salary minimum", TargetField::SalaryMin),
    ("salary max", TargetField::SalaryMax),
    ("max salary", TargetField::SalaryMax),
    ("salary maximum", TargetField::SalaryMax),
    ("job url", TargetField::JobUrl),
    ("url", TargetField::JobUrl),
    ("link", TargetField::JobUrl),
    ("job description", TargetField::JobDescription),
    ("description", TargetField::JobDescription),
    ("notes", TargetField::Notes),
    ("tags", TargetField::Tags),
    ("source", TargetField::Source),
    ("referral name", TargetField::ReferralName),
    ("referral", TargetField::ReferralName),
    ("created at", TargetField::CreatedAt),
    ("created", TargetField::CreatedAt),
    ("updated at", TargetField::UpdatedAt),
    ("updated", TargetField::UpdatedAt),
    ("modified", TargetField::UpdatedAt),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldMapping {
    pub column: String,
    /// `None` means the column is ignored.
    pub target: Option<TargetField>,
}

pub fn auto_detect_mapping(headers: &[String]) -> Vec<FieldMapping> {
    headers
        .iter()
        .map(|header| {
            let normalized = header.trim().to_lowercase();
            let target = HEADER_SYNONYMS
                .iter()
                .find(|(synonym, _)| *synonym == normalized)
                .map(|(_, field)| *field);
            FieldMapping {
                column: header.clone(),
                target,
            }
        })
        .collect()
}

/// Parses a `Column=field` override; an empty field (`Column=`) ignores the column.
pub fn parse_mapping_override(arg: &str) -> Result<(String, Option<TargetField>)> {
    let (column, field) = arg
        .rsplit_once('=')
        .ok_or_else(|| anyhow!("Mapping override must look like 'Column=field', got '{}'", arg))?;
    let field = field.trim();
    let target = if field.is_empty() || field.eq_ignore_ascii_case("ignore") {
        None
    } else {
        Some(field.parse()?)
    };
    Ok((column.trim().to_string(), target))
}

/// Replaces the target of every mapping whose column matches (case-insensitively).
pub fn apply_overrides(mapping: &mut [FieldMapping], overrides: &[(String, Option<TargetField>)]) -> Result<()> {
    for (column, target) in overrides {
        let mut matched = false;
        for entry in mapping.iter_mut().filter(|m| m.column.eq_ignore_ascii_case(column)) {
            entry.target = *target;
            matched = true;
        }
        if !matched {
            return Err(anyhow!("No CSV column named '{}'", column));
        }
    }
    Ok(())
}

/// A row mapped onto application fields, not yet validated or persisted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Candidate {
    pub company_name: Option<String>,
    pub position: Option<String>,
    /// Kept as text so the validator can report the offending value.
    pub status: Option<String>,
    pub priority: Option<Priority>,
    pub salary: Option<SalaryRange>,
    pub target_date: Option<DateTime<Utc>>,
    pub applied_date: Option<DateTime<Utc>>,
    pub first_interview_date: Option<DateTime<Utc>>,
    pub offer_date: Option<DateTime<Utc>>,
    pub response_deadline: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub work_type: Option<WorkType>,
    pub employment_type: Option<EmploymentType>,
    pub job_url: Option<String>,
    pub job_description: Option<String>,
    pub notes: Option<String>,
    pub tags: Vec<String>,
    pub source: Option<String>,
    pub referral_name: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct ImportOptions {
    pub currency: String,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            currency: DEFAULT_CURRENCY.to_string(),
        }
    }
}

fn target_for(mapping: &[FieldMapping], header: &str) -> Option<TargetField> {
    mapping
        .iter()
        .find(|m| m.column == header)
        .and_then(|m| m.target)
}

pub fn map_row(
    row: &[String],
    headers: &[String],
    mapping: &[FieldMapping],
    options: &ImportOptions,
) -> Candidate {
    let mut candidate = Candidate::default();
    let mut salary_columns: Vec<usize> = Vec::new();
    let mut salary_min: Option<i64> = None;
    let mut salary_max: Option<i64> = None;

    for (index, header) in headers.iter().enumerate() {
        let Some(field) = target_for(mapping, header) else { continue };
        let Some(value) = row.get(index).map(|v| v.trim()).filter(|v| !v.is_empty()) else {
            if field == TargetField::Salary {
                salary_columns.push(index);
            }
            continue;
        };

        match field {
            TargetField::CompanyName => candidate.company_name = Some(value.to_string()),
            TargetField::Position => candidate.position = Some(value.to_string()),
            TargetField::Status => candidate.status = Some(value.to_string()),
            TargetField::Priority => candidate.priority = value.parse().ok(),
            TargetField::WorkType => candidate.work_type = value.parse().ok(),
            TargetField::EmploymentType => candidate.employment_type = value.parse().ok(),
            TargetField::TargetDate => candidate.target_date = parse_date(header, value),
            TargetField::AppliedDate => candidate.applied_date = parse_date(header, value),
            TargetField::FirstInterviewDate => candidate.first_interview_date = parse_date(header, value),
            TargetField::OfferDate => candidate.offer_date = parse_date(header, value),
            TargetField::ResponseDeadline => candidate.response_deadline = parse_date(header, value),
            TargetField::CreatedAt => candidate.created_at = parse_date(header, value),
            TargetField::UpdatedAt => candidate.updated_at = parse_date(header, value),
            TargetField::Location => candidate.location = Some(value.to_string()),
            TargetField::JobUrl => candidate.job_url = Some(value.to_string()),
            TargetField::JobDescription => candidate.job_description = Some(value.to_string()),
            TargetField::Notes => candidate.notes = Some(value.to_string()),
            TargetField::Source => candidate.source = Some(value.to_string()),
            TargetField::ReferralName => candidate.referral_name = Some(value.to_string()),
            TargetField::Tags => {
                candidate.tags = value
                    .split(';')
                    .map(|t| t.trim().to_string())
                    .filter(|t| !t.is_empty())
                    .collect();
            }
            TargetField::Salary => salary_columns.push(index),
            TargetField::SalaryMin => salary_min = parse_amount(value),
            TargetField::SalaryMax => salary_max = parse_amount(value),
        }
    }

    // Positional pairing of plain `salary` columns; explicit min/max win
    let mut positional = salary_columns
        .iter()
        .map(|&i| row.get(i).and_then(|v| parse_amount(v)));
    let positional_min = positional.next().flatten();
    let positional_max = positional.next().flatten();

    let min = salary_min.or(positional_min);
    let max = salary_max.or(positional_max);
    if min.is_some() || max.is_some() {
        candidate.salary = Some(SalaryRange {
            min,
            max,
            currency: options.currency.clone(),
            period: None,
        });
    }

    candidate
}

/// Parses dates the way spreadsheets usually write them. Unparseable values are dropped.
pub fn parse_date(column: &str, value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(naive.and_utc());
        }
    }
    for format in ["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d"] {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
        }
    }
    debug!(column, value, "dropping unparseable date");
    None
}

fn parse_amount(value: &str) -> Option<i64> {
    let cleaned: String = value
        .chars()
        .filter(|c| !matches!(c, '$' | ',' | ' ' | '£' | '€'))
        .collect();
    if let Ok(n) = cleaned.parse::<i64>() {
        return Some(n);
    }
    // Out-of-range amounts are dropped rather than clamped
    cleaned
        .parse::<f64>()
        .ok()
        .map(f64::round)
        .filter(|n| n.is_finite() && *n >= i64::MIN as f64 && *n < i64::MAX as f64)
        .map(|n| n as i64)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    pub row: usize,
    pub field: String,
    pub message: String,
    pub value: Option<String>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "row {}: {} ({})", self.row, self.message, self.field)
    }
}

/// Required fields of a candidate, or one error per missing or invalid field.
pub fn validate_candidate(
    candidate: &Candidate,
    row: usize,
) -> Result<(String, String, ApplicationStatus), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if candidate.company_name.is_none() {
        errors.push(ValidationError {
            row,
            field: TargetField::CompanyName.to_string(),
            message: "Company name is required".to_string(),
            value: None,
        });
    }

    if candidate.position.is_none() {
        errors.push(ValidationError {
            row,
            field: TargetField::Position.to_string(),
            message: "Position is required".to_string(),
            value: None,
        });
    }

    let status = match candidate.status.as_deref() {
        None => {
            errors.push(ValidationError {
                row,
                field: TargetField::Status.to_string(),
                message: "Status is required".to_string(),
                value: None,
            });
            None
        }
        Some(raw) => match raw.parse::<ApplicationStatus>() {
            Ok(status) => Some(status),
            Err(_) => {
                let allowed: Vec<&str> = ApplicationStatus::ALL.iter().map(|s| s.as_str()).collect();
                errors.push(ValidationError {
                    row,
                    field: TargetField::Status.to_string(),
                    message: format!("Status must be one of: {}", allowed.join(", ")),
                    value: Some(raw.to_string()),
                });
                None
            }
        },
    };

    match (&candidate.company_name, &candidate.position, status) {
        (Some(company), Some(position), Some(status)) if errors.is_empty() => {
            Ok((company.clone(), position.clone(), status))
        }
        _ => Err(errors),
    }
}

/// First existing application with the same company and position, ignoring case.
pub fn find_duplicate<'a>(candidate: &Candidate, existing: &'a [Application]) -> Option<&'a Application> {
    let company = candidate.company_name.as_deref()?.to_lowercase();
    let position = candidate.position.as_deref()?.to_lowercase();
    existing.iter().find(|app| {
        app.company_name.to_lowercase() == company && app.position.to_lowercase() == position
    })
}

/// Raw cells of a row keyed by header, in column order.
pub type RowData = Vec<(String, String)>;

#[derive(Debug, Clone, Serialize)]
pub struct InvalidRow {
    pub row: usize,
    pub data: RowData,
    pub errors: Vec<ValidationError>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DuplicateRow {
    pub row: usize,
    pub existing_id: String,
    pub data: RowData,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportPreview {
    pub valid: Vec<Application>,
    pub invalid: Vec<InvalidRow>,
    pub duplicates: Vec<DuplicateRow>,
    pub total_valid: usize,
    pub total_invalid: usize,
    pub total_duplicates: usize,
}

impl ImportPreview {
    pub fn total_rows(&self) -> usize {
        self.total_valid + self.total_invalid + self.total_duplicates
    }
}

/// Classifies every data row into exactly one of valid, invalid or duplicate.
/// Row numbers are 1-based file lines, so the first data row is row 2.
pub fn preview_import(
    rows: &[Vec<String>],
    headers: &[String],
    mapping: &[FieldMapping],
    existing: &[Application],
    options: &ImportOptions,
) -> ImportPreview {
    let mut preview = ImportPreview::default();
    let now = Utc::now();

    for (index, row) in rows.iter().enumerate() {
        let row_number = index + 2;
        let data: RowData = headers
            .iter()
            .enumerate()
            .map(|(i, header)| (header.clone(), row.get(i).cloned().unwrap_or_default()))
            .collect();

        let candidate = map_row(row, headers, mapping, options);

        let (company_name, position, status) = match validate_candidate(&candidate, row_number) {
            Ok(fields) => fields,
            Err(errors) => {
                debug!(row = row_number, errors = errors.len(), "invalid import row");
                preview.invalid.push(InvalidRow {
                    row: row_number,
                    data,
                    errors,
                });
                continue;
            }
        };

        if let Some(duplicate) = find_duplicate(&candidate, existing) {
            debug!(row = row_number, existing = %duplicate.id, "duplicate import row");
            preview.duplicates.push(DuplicateRow {
                row: row_number,
                existing_id: duplicate.id.clone(),
                data,
            });
            continue;
        }

        let mut app = Application::new(&company_name, &position, status);
        app.priority = candidate.priority;
        app.salary = candidate.salary;
        app.target_date = candidate.target_date;
        app.applied_date = candidate.applied_date;
        app.first_interview_date = candidate.first_interview_date;
        app.offer_date = candidate.offer_date;
        app.response_deadline = candidate.response_deadline;
        app.location = candidate.location;
        app.work_type = candidate.work_type;
        app.employment_type = candidate.employment_type;
        app.job_url = candidate.job_url;
        app.job_description = candidate.job_description;
        app.notes = candidate.notes;
        app.tags = candidate.tags;
        app.source = candidate.source;
        app.referral_name = candidate.referral_name;
        app.created_at = candidate.created_at.unwrap_or(now);
        app.updated_at = candidate.updated_at.unwrap_or(now);
        preview.valid.push(app);
    }

    preview.total_valid = preview.valid.len();
    preview.total_invalid = preview.invalid.len();
    preview.total_duplicates = preview.duplicates.len();
    preview
}
