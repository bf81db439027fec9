use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {kind}: '{value}'")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

/// Declares a closed string enum with `as_str`, `Display` and a lenient `FromStr`
/// (case-insensitive, spaces and underscores read as dashes).
macro_rules! string_enum {
    ($(#[$meta:meta])* $name:ident, $kind:literal { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ::serde::Serialize, ::serde::Deserialize)]
        pub enum $name {
            $(#[serde(rename = $text)] $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.pad(self.as_str())
            }
        }

        impl ::std::str::FromStr for $name {
            type Err = $crate::models::ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let normalized = s.trim().to_lowercase().replace([' ', '_'], "-");
                match normalized.as_str() {
                    $($text => Ok($name::$variant),)+
                    _ => Err($crate::models::ParseEnumError { kind: $kind, value: s.to_string() }),
                }
            }
        }
    };
}

pub(crate) use string_enum;

string_enum!(
    /// Lifecycle of an application: Target, Hunt, Reach (applied), Interview,
    /// Validate (offer), Employ (accepted), plus the two exits.
    ApplicationStatus, "status" {
        Target => "target",
        Hunting => "hunting",
        Applied => "applied",
        Interviewing => "interviewing",
        Offer => "offer",
        Accepted => "accepted",
        Rejected => "rejected",
        Withdrawn => "withdrawn",
    }
);

impl ApplicationStatus {
    pub fn is_active(&self) -> bool {
        !matches!(
            self,
            ApplicationStatus::Rejected | ApplicationStatus::Withdrawn | ApplicationStatus::Accepted
        )
    }

    /// Anything past "applied" counts as having heard back.
    pub fn has_response(&self) -> bool {
        !matches!(
            self,
            ApplicationStatus::Target | ApplicationStatus::Hunting | ApplicationStatus::Applied
        )
    }

    /// Position along the pipeline, used to pick the furthest stage reached.
    pub fn progress(&self) -> u8 {
        match self {
            ApplicationStatus::Withdrawn => 0,
            ApplicationStatus::Rejected => 1,
            ApplicationStatus::Target => 2,
            ApplicationStatus::Hunting => 3,
            ApplicationStatus::Applied => 4,
            ApplicationStatus::Interviewing => 5,
            ApplicationStatus::Offer => 6,
            ApplicationStatus::Accepted => 7,
        }
    }
}

string_enum!(Priority, "priority" {
    Low => "low",
    Medium => "medium",
    High => "high",
});

string_enum!(WorkType, "work type" {
    Remote => "remote",
    Hybrid => "hybrid",
    Onsite => "onsite",
});

string_enum!(EmploymentType, "employment type" {
    FullTime => "full-time",
    PartTime => "part-time",
    Contract => "contract",
    Internship => "internship",
});

string_enum!(SalaryPeriod, "salary period" {
    Hourly => "hourly",
    Annual => "annual",
});

string_enum!(InterviewType, "interview type" {
    PhoneScreen => "phone-screen",
    Video => "video",
    OnSite => "on-site",
    Technical => "technical",
    Behavioral => "behavioral",
    Panel => "panel",
    Final => "final",
    Other => "other",
});

string_enum!(InterviewStatus, "interview status" {
    Scheduled => "scheduled",
    Completed => "completed",
    Cancelled => "cancelled",
    Rescheduled => "rescheduled",
    NoShow => "no-show",
});

string_enum!(InterviewResult, "interview result" {
    Passed => "passed",
    Failed => "failed",
    Pending => "pending",
});

string_enum!(ContactRelationship, "relationship" {
    Recruiter => "recruiter",
    HiringManager => "hiring-manager",
    Employee => "employee",
    Referral => "referral",
    Other => "other",
});

string_enum!(DocumentType, "document type" {
    Resume => "resume",
    Cv => "cv",
    CoverLetter => "cover-letter",
    Portfolio => "portfolio",
    Transcript => "transcript",
    Certification => "certification",
    Other => "other",
});

pub const DEFAULT_CURRENCY: &str = "USD";

/// Optional window over timestamps, inclusive on both ends.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl DateRange {
    pub fn new(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Self {
        Self { start, end }
    }

    pub fn is_set(&self) -> bool {
        self.start.is_some() || self.end.is_some()
    }

    /// A missing date is only inside an unbounded range.
    pub fn contains(&self, date: Option<DateTime<Utc>>) -> bool {
        match date {
            None => !self.is_set(),
            Some(d) => self.start.is_none_or(|s| d >= s) && self.end.is_none_or(|e| d <= e),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalaryRange {
    #[serde(default)]
    pub min: Option<i64>,
    #[serde(default)]
    pub max: Option<i64>,
    pub currency: String,
    #[serde(default)]
    pub period: Option<SalaryPeriod>,
}

impl SalaryRange {
    pub fn display(&self) -> String {
        match (self.min, self.max) {
            (Some(min), Some(max)) if min == max => format!("{} {}", min, self.currency),
            (Some(min), Some(max)) => format!("{} - {} {}", min, max, self.currency),
            (Some(min), None) => format!("{}+ {}", min, self.currency),
            (None, Some(max)) => format!("up to {} {}", max, self.currency),
            (None, None) => "-".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub id: String,
    pub company_name: String,
    pub position: String,
    pub status: ApplicationStatus,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub salary: Option<SalaryRange>,

    #[serde(default)]
    pub target_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub applied_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub first_interview_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub offer_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub response_deadline: Option<DateTime<Utc>>,

    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub work_type: Option<WorkType>,
    #[serde(default)]
    pub employment_type: Option<EmploymentType>,
    #[serde(default)]
    pub job_url: Option<String>,
    #[serde(default)]
    pub job_description: Option<String>,

    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub source: Option<String>, // "LinkedIn", "referral", "csv", ...
    #[serde(default)]
    pub referral_name: Option<String>,
    #[serde(default)]
    pub sort_order: Option<i64>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Application {
    pub fn new(company_name: &str, position: &str, status: ApplicationStatus) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            company_name: company_name.to_string(),
            position: position.to_string(),
            status,
            priority: None,
            salary: None,
            target_date: None,
            applied_date: None,
            first_interview_date: None,
            offer_date: None,
            response_deadline: None,
            location: None,
            work_type: None,
            employment_type: None,
            job_url: None,
            job_description: None,
            notes: None,
            tags: Vec::new(),
            source: None,
            referral_name: None,
            sort_order: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// User edits to an application. `None` leaves a field alone; an empty
/// string clears an optional text field.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ApplicationChanges {
    pub company_name: Option<String>,
    pub position: Option<String>,
    pub priority: Option<Priority>,
    pub location: Option<String>,
    pub work_type: Option<WorkType>,
    pub employment_type: Option<EmploymentType>,
    pub job_url: Option<String>,
    pub notes: Option<String>,
    pub source: Option<String>,
    pub applied_date: Option<DateTime<Utc>>,
    pub salary_min: Option<i64>,
    pub salary_max: Option<i64>,
    /// Replaces the tag list when set.
    pub tags: Option<Vec<String>>,
}

fn set_text(field: &mut Option<String>, value: &Option<String>) {
    if let Some(value) = value {
        let value = value.trim();
        *field = (!value.is_empty()).then(|| value.to_string());
    }
}

impl ApplicationChanges {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Applies the edits and bumps `updated_at`. New salaries use `currency`.
    pub fn apply(&self, app: &mut Application, currency: &str) {
        if let Some(company) = self.company_name.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
            app.company_name = company.to_string();
        }
        if let Some(position) = self.position.as_deref().map(str::trim).filter(|p| !p.is_empty()) {
            app.position = position.to_string();
        }
        if self.priority.is_some() {
            app.priority = self.priority;
        }
        if self.work_type.is_some() {
            app.work_type = self.work_type;
        }
        if self.employment_type.is_some() {
            app.employment_type = self.employment_type;
        }
        if self.applied_date.is_some() {
            app.applied_date = self.applied_date;
        }
        set_text(&mut app.location, &self.location);
        set_text(&mut app.job_url, &self.job_url);
        set_text(&mut app.notes, &self.notes);
        set_text(&mut app.source, &self.source);

        if self.salary_min.is_some() || self.salary_max.is_some() {
            let salary = app.salary.get_or_insert_with(|| SalaryRange {
                min: None,
                max: None,
                currency: currency.to_string(),
                period: None,
            });
            if self.salary_min.is_some() {
                salary.min = self.salary_min;
            }
            if self.salary_max.is_some() {
                salary.max = self.salary_max;
            }
        }
        if let Some(tags) = &self.tags {
            app.tags = tags.clone();
        }
        app.updated_at = Utc::now();
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Company {
    pub fn new(name: &str) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            website: None,
            industry: None,
            size: None,
            location: None,
            description: None,
            notes: None,
            tags: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Interview {
    pub id: String,
    pub application_id: String,
    pub round: u32,
    #[serde(rename = "type")]
    pub kind: InterviewType,
    pub status: InterviewStatus,
    #[serde(default)]
    pub scheduled_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub duration_minutes: Option<u32>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub meeting_url: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub feedback: Option<String>,
    #[serde(default)]
    pub result: Option<InterviewResult>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Interview {
    pub fn new(application_id: &str, round: u32, kind: InterviewType) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            application_id: application_id.to_string(),
            round,
            kind,
            status: InterviewStatus::Scheduled,
            scheduled_at: None,
            duration_minutes: None,
            location: None,
            meeting_url: None,
            notes: None,
            feedback: None,
            result: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Outcome-side edits to an interview.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct InterviewChanges {
    pub status: Option<InterviewStatus>,
    pub result: Option<InterviewResult>,
    pub feedback: Option<String>,
    pub notes: Option<String>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub duration_minutes: Option<u32>,
}

impl InterviewChanges {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Applies the edits and bumps `updated_at`. Rescheduling a scheduled
    /// interview marks it rescheduled unless a status is given.
    pub fn apply(&self, interview: &mut Interview) {
        if let Some(at) = self.scheduled_at {
            if interview.scheduled_at.is_some_and(|old| old != at)
                && interview.status == InterviewStatus::Scheduled
                && self.status.is_none()
            {
                interview.status = InterviewStatus::Rescheduled;
            }
            interview.scheduled_at = Some(at);
        }
        if let Some(status) = self.status {
            interview.status = status;
        }
        if self.result.is_some() {
            interview.result = self.result;
        }
        if self.duration_minutes.is_some() {
            interview.duration_minutes = self.duration_minutes;
        }
        set_text(&mut interview.feedback, &self.feedback);
        set_text(&mut interview.notes, &self.notes);
        interview.updated_at = Utc::now();
    }
}

/// Someone at a company: recruiter, hiring manager, referrer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub company_id: Option<String>,
    /// Denormalized for listings.
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub linked_in: Option<String>,
    #[serde(default)]
    pub relationship: Option<ContactRelationship>,
    #[serde(default)]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Contact {
    pub fn new(name: &str) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            company_id: None,
            company_name: None,
            title: None,
            email: None,
            phone: None,
            linked_in: None,
            relationship: None,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A resume, cover letter or other file sent with applications.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: DocumentType,
    #[serde(default)]
    pub file_name: Option<String>,
    /// Local path or URL
    #[serde(default)]
    pub url: Option<String>,
    pub version: u32,
    /// Primary application this document was written for.
    #[serde(default)]
    pub application_id: Option<String>,
    #[serde(default)]
    pub used_in_application_ids: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document {
    pub fn new(name: &str, kind: DocumentType) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            kind,
            file_name: None,
            url: None,
            version: 1,
            application_id: None,
            used_in_application_ids: Vec::new(),
            tags: Vec::new(),
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Records that the document went out with `application_id`.
    pub fn mark_used_in(&mut self, application_id: &str) {
        if !self.used_in_application_ids.iter().any(|id| id == application_id) {
            self.used_in_application_ids.push(application_id.to_string());
        }
        if self.application_id.is_none() {
            self.application_id = Some(application_id.to_string());
        }
    }
}
