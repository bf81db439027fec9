use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::types::{Type, Value};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;

use crate::models::{
    Application, ApplicationStatus, Company, Contact, DateRange, Document, EmploymentType, Interview,
    InterviewStatus, InterviewType, Priority, SalaryRange, WorkType,
};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{entity} '{id}' not found")]
    NotFound { entity: &'static str, id: String },
}

pub struct Database {
    conn: Connection,
    path: PathBuf,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database at {}", path.display()))?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(Self {
            conn,
            path: path.to_path_buf(),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(Self {
            conn,
            path: PathBuf::from(":memory:"),
        })
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    pub fn default_path() -> PathBuf {
        // Use XDG data directory or fallback
        if let Some(proj_dirs) = directories::ProjectDirs::from("", "", "thrive") {
            proj_dirs.data_dir().join("thrive.db")
        } else {
            PathBuf::from("thrive.db")
        }
    }

    pub fn init(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS applications (
                id TEXT PRIMARY KEY,
                company_name TEXT NOT NULL,
                position TEXT NOT NULL,
                status TEXT NOT NULL CHECK (status IN ('target', 'hunting', 'applied', 'interviewing', 'offer', 'accepted', 'rejected', 'withdrawn')),
                priority TEXT CHECK (priority IN ('low', 'medium', 'high')),
                salary TEXT,
                target_date TEXT,
                applied_date TEXT,
                first_interview_date TEXT,
                offer_date TEXT,
                response_deadline TEXT,
                location TEXT,
                work_type TEXT,
                employment_type TEXT,
                job_url TEXT,
                job_description TEXT,
                notes TEXT,
                tags TEXT NOT NULL DEFAULT '[]',
                source TEXT,
                referral_name TEXT,
                sort_order INTEGER,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS companies (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                website TEXT,
                industry TEXT,
                size TEXT,
                location TEXT,
                description TEXT,
                notes TEXT,
                tags TEXT NOT NULL DEFAULT '[]',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS interviews (
                id TEXT PRIMARY KEY,
                application_id TEXT NOT NULL REFERENCES applications(id) ON DELETE CASCADE,
                round INTEGER NOT NULL,
                type TEXT NOT NULL,
                status TEXT NOT NULL,
                scheduled_at TEXT,
                duration_minutes INTEGER,
                location TEXT,
                meeting_url TEXT,
                notes TEXT,
                feedback TEXT,
                result TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS contacts (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                company_id TEXT REFERENCES companies(id) ON DELETE SET NULL,
                company_name TEXT,
                title TEXT,
                email TEXT,
                phone TEXT,
                linked_in TEXT,
                relationship TEXT CHECK (relationship IN ('recruiter', 'hiring-manager', 'employee', 'referral', 'other')),
                notes TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS documents (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                type TEXT NOT NULL,
                file_name TEXT,
                url TEXT,
                version INTEGER NOT NULL DEFAULT 1,
                application_id TEXT REFERENCES applications(id) ON DELETE SET NULL,
                used_in_application_ids TEXT NOT NULL DEFAULT '[]',
                tags TEXT NOT NULL DEFAULT '[]',
                notes TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_applications_status ON applications(status);
            CREATE INDEX IF NOT EXISTS idx_applications_company ON applications(company_name);
            CREATE INDEX IF NOT EXISTS idx_companies_name ON companies(name);
            CREATE INDEX IF NOT EXISTS idx_interviews_application ON interviews(application_id);
            CREATE INDEX IF NOT EXISTS idx_contacts_company ON contacts(company_id);
            CREATE INDEX IF NOT EXISTS idx_documents_application ON documents(application_id);
            "#,
        )?;
        Ok(())
    }

    pub fn ensure_initialized(&self) -> Result<()> {
        let tables: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='applications'",
            [],
            |row| row.get(0),
        )?;
        if tables == 0 {
            return Err(anyhow!(
                "Database not initialized. Run 'thrive init' first."
            ));
        }
        Ok(())
    }

    pub fn applications(&self) -> Table<'_, Application> {
        Table::new(&self.conn)
    }

    pub fn companies(&self) -> Table<'_, Company> {
        Table::new(&self.conn)
    }

    pub fn interviews(&self) -> Table<'_, Interview> {
        Table::new(&self.conn)
    }

    pub fn contacts(&self) -> Table<'_, Contact> {
        Table::new(&self.conn)
    }

    pub fn documents(&self) -> Table<'_, Document> {
        Table::new(&self.conn)
    }

    /// Resolves a full id or a unique id prefix, the way ids are shown in listings.
    /// The prefix is compared literally.
    pub fn resolve_id<T: Record>(&self, prefix: &str) -> Result<String> {
        let prefix = prefix.trim();
        let not_found = || StoreError::NotFound {
            entity: T::ENTITY,
            id: prefix.to_string(),
        };
        if prefix.is_empty() {
            return Err(not_found().into());
        }

        let sql = format!(
            "SELECT id FROM {} WHERE substr(id, 1, length(?1)) = ?1 LIMIT 2",
            T::TABLE
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let ids = stmt
            .query_map([prefix], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        match ids.as_slice() {
            [id] => Ok(id.clone()),
            [] => Err(not_found().into()),
            _ => Err(anyhow!("{} id prefix '{}' is ambiguous", T::ENTITY, prefix)),
        }
    }

    // --- Application operations ---

    pub fn list_applications(&self, filter: &ApplicationFilter) -> Result<Vec<Application>> {
        let apps = self.applications().list()?;
        Ok(apps.into_iter().filter(|app| filter.matches(app)).collect())
    }

    pub fn set_application_status(&self, id: &str, status: ApplicationStatus) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE applications SET status = ?1, updated_at = ?2 WHERE id = ?3",
            params![status.as_str(), Utc::now().to_rfc3339(), id],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound {
                entity: Application::ENTITY,
                id: id.to_string(),
            }
            .into());
        }
        Ok(())
    }

    pub fn resolve_application_id(&self, prefix: &str) -> Result<String> {
        self.resolve_id::<Application>(prefix)
    }

    /// Swaps the whole application set for `applications` in one transaction.
    /// Interviews of removed applications go with them.
    pub fn replace_applications(&self, applications: &[Application]) -> Result<usize> {
        let tx = self.conn.unchecked_transaction()?;
        let removed = tx.execute("DELETE FROM applications", [])?;
        {
            let mut stmt = tx.prepare(&Table::<Application>::insert_sql())?;
            for app in applications {
                stmt.execute(params_from_iter(app.to_values()))
                    .with_context(|| format!("Failed to restore application '{}'", app.id))?;
            }
        }
        tx.commit()?;
        debug!(removed, restored = applications.len(), "replaced applications");
        Ok(applications.len())
    }

    // --- Company operations ---

    pub fn get_company_by_name(&self, name: &str) -> Result<Option<Company>> {
        let sql = format!(
            "SELECT {} FROM companies WHERE LOWER(name) = LOWER(?1)",
            Company::COLUMNS.join(", ")
        );
        self.conn
            .query_row(&sql, [name.trim()], Company::from_row)
            .optional()
            .context("Failed to look up company")
    }

    pub fn get_or_create_company(&self, name: &str) -> Result<Company> {
        if let Some(existing) = self.get_company_by_name(name)? {
            return Ok(existing);
        }
        let company = Company::new(name);
        self.companies().insert(&company)?;
        debug!(name = %company.name, "created company");
        Ok(company)
    }

    // --- Interview operations ---

    pub fn interviews_for_application(&self, application_id: &str) -> Result<Vec<Interview>> {
        let sql = format!(
            "SELECT {} FROM interviews WHERE application_id = ?1 ORDER BY round",
            Interview::COLUMNS.join(", ")
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([application_id], Interview::from_row)?;
        rows.collect::<Result<Vec<_>, _>>()
            .context("Failed to list interviews")
    }

    /// Interviews matching `filter`, soonest first; unscheduled ones last.
    pub fn list_interviews(&self, filter: &InterviewFilter) -> Result<Vec<Interview>> {
        let applications = if filter.search.is_some() {
            self.applications().list()?
        } else {
            Vec::new()
        };
        let mut interviews: Vec<Interview> = self
            .interviews()
            .list()?
            .into_iter()
            .filter(|interview| {
                let application = applications.iter().find(|a| a.id == interview.application_id);
                filter.matches(interview, application)
            })
            .collect();
        interviews.sort_by(|a, b| {
            (a.scheduled_at.is_none(), a.scheduled_at, a.round)
                .cmp(&(b.scheduled_at.is_none(), b.scheduled_at, b.round))
        });
        Ok(interviews)
    }

    // --- Contact and document operations ---

    pub fn contacts_for_company(&self, company_name: &str) -> Result<Vec<Contact>> {
        let name = company_name.trim();
        Ok(self
            .contacts()
            .list()?
            .into_iter()
            .filter(|c| c.company_name.as_deref().is_some_and(|n| n.eq_ignore_ascii_case(name)))
            .collect())
    }

    /// Documents written for or sent with `application_id`.
    pub fn documents_for_application(&self, application_id: &str) -> Result<Vec<Document>> {
        Ok(self
            .documents()
            .list()?
            .into_iter()
            .filter(|d| {
                d.application_id.as_deref() == Some(application_id)
                    || d.used_in_application_ids.iter().any(|id| id == application_id)
            })
            .collect())
    }
}

/// Typed CRUD over one entity kind.
pub trait Repository<T> {
    fn insert(&self, item: &T) -> Result<()>;
    /// Inserts all items in one transaction; nothing is written if any insert fails.
    fn insert_many(&self, items: &[T]) -> Result<usize>;
    fn get(&self, id: &str) -> Result<Option<T>>;
    fn list(&self) -> Result<Vec<T>>;
    fn update(&self, item: &T) -> Result<()>;
    fn delete(&self, id: &str) -> Result<bool>;
    fn clear(&self) -> Result<usize>;
    fn count(&self) -> Result<usize>;
}

/// Row mapping for an entity stored in its own table. `COLUMNS[0]` is the primary key.
pub trait Record: Sized {
    const ENTITY: &'static str;
    const TABLE: &'static str;
    const COLUMNS: &'static [&'static str];

    fn id(&self) -> &str;
    fn from_row(row: &Row) -> rusqlite::Result<Self>;
    fn to_values(&self) -> Vec<Value>;
}

pub struct Table<'a, T> {
    conn: &'a Connection,
    _entity: PhantomData<T>,
}

impl<'a, T: Record> Table<'a, T> {
    fn new(conn: &'a Connection) -> Self {
        Self {
            conn,
            _entity: PhantomData,
        }
    }

    fn insert_sql() -> String {
        let placeholders: Vec<String> = (1..=T::COLUMNS.len()).map(|i| format!("?{}", i)).collect();
        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            T::TABLE,
            T::COLUMNS.join(", "),
            placeholders.join(", ")
        )
    }

    fn select_sql() -> String {
        format!("SELECT {} FROM {}", T::COLUMNS.join(", "), T::TABLE)
    }
}

impl<T: Record> Repository<T> for Table<'_, T> {
    fn insert(&self, item: &T) -> Result<()> {
        self.conn
            .execute(&Self::insert_sql(), params_from_iter(item.to_values()))
            .with_context(|| format!("Failed to insert {} '{}'", T::ENTITY, item.id()))?;
        Ok(())
    }

    fn insert_many(&self, items: &[T]) -> Result<usize> {
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare(&Self::insert_sql())?;
            for item in items {
                stmt.execute(params_from_iter(item.to_values()))
                    .with_context(|| format!("Failed to insert {} '{}'", T::ENTITY, item.id()))?;
            }
        }
        tx.commit()?;
        Ok(items.len())
    }

    fn get(&self, id: &str) -> Result<Option<T>> {
        let sql = format!("{} WHERE id = ?1", Self::select_sql());
        self.conn
            .query_row(&sql, [id], T::from_row)
            .optional()
            .with_context(|| format!("Failed to get {} '{}'", T::ENTITY, id))
    }

    fn list(&self) -> Result<Vec<T>> {
        let sql = format!("{} ORDER BY created_at DESC, id", Self::select_sql());
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], T::from_row)?;
        rows.collect::<Result<Vec<_>, _>>()
            .with_context(|| format!("Failed to list {} records", T::ENTITY))
    }

    fn update(&self, item: &T) -> Result<()> {
        let assignments: Vec<String> = T::COLUMNS
            .iter()
            .enumerate()
            .skip(1)
            .map(|(i, col)| format!("{} = ?{}", col, i + 1))
            .collect();
        let sql = format!(
            "UPDATE {} SET {} WHERE id = ?1",
            T::TABLE,
            assignments.join(", ")
        );
        let changed = self.conn.execute(&sql, params_from_iter(item.to_values()))?;
        if changed == 0 {
            return Err(StoreError::NotFound {
                entity: T::ENTITY,
                id: item.id().to_string(),
            }
            .into());
        }
        Ok(())
    }

    fn delete(&self, id: &str) -> Result<bool> {
        let sql = format!("DELETE FROM {} WHERE id = ?1", T::TABLE);
        Ok(self.conn.execute(&sql, [id])? > 0)
    }

    fn clear(&self) -> Result<usize> {
        let sql = format!("DELETE FROM {}", T::TABLE);
        Ok(self.conn.execute(&sql, [])?)
    }

    fn count(&self) -> Result<usize> {
        let sql = format!("SELECT COUNT(*) FROM {}", T::TABLE);
        let n: i64 = self.conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(n as usize)
    }
}

/// Ad-hoc filtering over applications; every set criterion must match.
/// Within a list criterion any listed value matches.
#[derive(Debug, Default, Clone)]
pub struct ApplicationFilter {
    pub statuses: Vec<ApplicationStatus>,
    pub priorities: Vec<Priority>,
    pub tags: Vec<String>,
    pub work_types: Vec<WorkType>,
    pub employment_types: Vec<EmploymentType>,
    /// Applied-date window. Applications never applied to fall outside a set window.
    pub applied: DateRange,
    pub search: Option<String>,
}

fn allowed<T: PartialEq>(wanted: &[T], value: Option<&T>) -> bool {
    wanted.is_empty() || value.is_some_and(|v| wanted.contains(v))
}

impl ApplicationFilter {
    pub fn matches(&self, app: &Application) -> bool {
        if !allowed(&self.statuses, Some(&app.status))
            || !allowed(&self.priorities, app.priority.as_ref())
            || !allowed(&self.work_types, app.work_type.as_ref())
            || !allowed(&self.employment_types, app.employment_type.as_ref())
        {
            return false;
        }
        if !self.tags.is_empty()
            && !self
                .tags
                .iter()
                .any(|wanted| app.tags.iter().any(|t| t.eq_ignore_ascii_case(wanted)))
        {
            return false;
        }
        if self.applied.is_set() && !self.applied.contains(app.applied_date) {
            return false;
        }
        if let Some(search) = &self.search {
            let needle = search.to_lowercase();
            let haystacks = [
                Some(app.company_name.as_str()),
                Some(app.position.as_str()),
                app.notes.as_deref(),
                app.location.as_deref(),
            ];
            if !haystacks
                .iter()
                .flatten()
                .any(|h| h.to_lowercase().contains(&needle))
            {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Default, Clone)]
pub struct InterviewFilter {
    pub application_id: Option<String>,
    pub kinds: Vec<InterviewType>,
    pub statuses: Vec<InterviewStatus>,
    /// Scheduled-at window. Unscheduled interviews fall outside a set window.
    pub scheduled: DateRange,
    /// Matches the company or position of the interview's application.
    pub search: Option<String>,
}

impl InterviewFilter {
    pub fn matches(&self, interview: &Interview, application: Option<&Application>) -> bool {
        if self
            .application_id
            .as_deref()
            .is_some_and(|id| id != interview.application_id)
        {
            return false;
        }
        if !allowed(&self.kinds, Some(&interview.kind)) || !allowed(&self.statuses, Some(&interview.status)) {
            return false;
        }
        if self.scheduled.is_set() && !self.scheduled.contains(interview.scheduled_at) {
            return false;
        }
        if let Some(search) = &self.search {
            let needle = search.to_lowercase();
            return application.is_some_and(|app| {
                app.company_name.to_lowercase().contains(&needle)
                    || app.position.to_lowercase().contains(&needle)
            });
        }
        true
    }
}

// --- Column conversions ---

fn conversion_error(idx: usize, err: impl std::error::Error + Send + Sync + 'static) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

fn get_ts(row: &Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_error(idx, e))
}

fn get_opt_ts(row: &Row, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|s| {
        DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| conversion_error(idx, e))
    })
    .transpose()
}

fn get_enum<E>(row: &Row, idx: usize) -> rusqlite::Result<E>
where
    E: FromStr,
    E::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: String = row.get(idx)?;
    raw.parse().map_err(|e| conversion_error(idx, e))
}

fn get_opt_enum<E>(row: &Row, idx: usize) -> rusqlite::Result<Option<E>>
where
    E: FromStr,
    E::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: Option<String> = row.get(idx)?;
    raw.map(|s| s.parse().map_err(|e| conversion_error(idx, e)))
        .transpose()
}

fn get_json<J: serde::de::DeserializeOwned>(row: &Row, idx: usize) -> rusqlite::Result<J> {
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw).map_err(|e| conversion_error(idx, e))
}

fn get_opt_json<J: serde::de::DeserializeOwned>(row: &Row, idx: usize) -> rusqlite::Result<Option<J>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|s| serde_json::from_str(&s).map_err(|e| conversion_error(idx, e)))
        .transpose()
}

fn text(s: &str) -> Value {
    Value::Text(s.to_string())
}

fn opt_text(s: Option<&str>) -> Value {
    s.map(text).unwrap_or(Value::Null)
}

fn ts(dt: &DateTime<Utc>) -> Value {
    Value::Text(dt.to_rfc3339())
}

fn opt_ts(dt: Option<&DateTime<Utc>>) -> Value {
    dt.map(ts).unwrap_or(Value::Null)
}

fn json<J: serde::Serialize>(value: &J) -> Value {
    // Vec<String> and SalaryRange serialize infallibly
    Value::Text(serde_json::to_string(value).unwrap_or_else(|_| "null".to_string()))
}

fn opt_int(n: Option<i64>) -> Value {
    n.map(Value::Integer).unwrap_or(Value::Null)
}

impl Record for Application {
    const ENTITY: &'static str = "Application";
    const TABLE: &'static str = "applications";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "company_name",
        "position",
        "status",
        "priority",
        "salary",
        "target_date",
        "applied_date",
        "first_interview_date",
        "offer_date",
        "response_deadline",
        "location",
        "work_type",
        "employment_type",
        "job_url",
        "job_description",
        "notes",
        "tags",
        "source",
        "referral_name",
        "sort_order",
        "created_at",
        "updated_at",
    ];

    fn id(&self) -> &str {
        &self.id
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Application {
            id: row.get(0)?,
            company_name: row.get(1)?,
            position: row.get(2)?,
            status: get_enum(row, 3)?,
            priority: get_opt_enum(row, 4)?,
            salary: get_opt_json::<SalaryRange>(row, 5)?,
            target_date: get_opt_ts(row, 6)?,
            applied_date: get_opt_ts(row, 7)?,
            first_interview_date: get_opt_ts(row, 8)?,
            offer_date: get_opt_ts(row, 9)?,
            response_deadline: get_opt_ts(row, 10)?,
            location: row.get(11)?,
            work_type: get_opt_enum(row, 12)?,
            employment_type: get_opt_enum(row, 13)?,
            job_url: row.get(14)?,
            job_description: row.get(15)?,
            notes: row.get(16)?,
            tags: get_json(row, 17)?,
            source: row.get(18)?,
            referral_name: row.get(19)?,
            sort_order: row.get(20)?,
            created_at: get_ts(row, 21)?,
            updated_at: get_ts(row, 22)?,
        })
    }

    fn to_values(&self) -> Vec<Value> {
        vec![
            text(&self.id),
            text(&self.company_name),
            text(&self.position),
            text(self.status.as_str()),
            opt_text(self.priority.as_ref().map(|p| p.as_str())),
            self.salary.as_ref().map(json).unwrap_or(Value::Null),
            opt_ts(self.target_date.as_ref()),
            opt_ts(self.applied_date.as_ref()),
            opt_ts(self.first_interview_date.as_ref()),
            opt_ts(self.offer_date.as_ref()),
            opt_ts(self.response_deadline.as_ref()),
            opt_text(self.location.as_deref()),
            opt_text(self.work_type.as_ref().map(|w| w.as_str())),
            opt_text(self.employment_type.as_ref().map(|e| e.as_str())),
            opt_text(self.job_url.as_deref()),
            opt_text(self.job_description.as_deref()),
            opt_text(self.notes.as_deref()),
            json(&self.tags),
            opt_text(self.source.as_deref()),
            opt_text(self.referral_name.as_deref()),
            opt_int(self.sort_order),
            ts(&self.created_at),
            ts(&self.updated_at),
        ]
    }
}

impl Record for Company {
    const ENTITY: &'static str = "Company";
    const TABLE: &'static str = "companies";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "name",
        "website",
        "industry",
        "size",
        "location",
        "description",
        "notes",
        "tags",
        "created_at",
        "updated_at",
    ];

    fn id(&self) -> &str {
        &self.id
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Company {
            id: row.get(0)?,
            name: row.get(1)?,
            website: row.get(2)?,
            industry: row.get(3)?,
            size: row.get(4)?,
            location: row.get(5)?,
            description: row.get(6)?,
            notes: row.get(7)?,
            tags: get_json(row, 8)?,
            created_at: get_ts(row, 9)?,
            updated_at: get_ts(row, 10)?,
        })
    }

    fn to_values(&self) -> Vec<Value> {
        vec![
            text(&self.id),
            text(&self.name),
            opt_text(self.website.as_deref()),
            opt_text(self.industry.as_deref()),
            opt_text(self.size.as_deref()),
            opt_text(self.location.as_deref()),
            opt_text(self.description.as_deref()),
            opt_text(self.notes.as_deref()),
            json(&self.tags),
            ts(&self.created_at),
            ts(&self.updated_at),
        ]
    }
}

impl Record for Interview {
    const ENTITY: &'static str = "Interview";
    const TABLE: &'static str = "interviews";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "application_id",
        "round",
        "type",
        "status",
        "scheduled_at",
        "duration_minutes",
        "location",
        "meeting_url",
        "notes",
        "feedback",
        "result",
        "created_at",
        "updated_at",
    ];

    fn id(&self) -> &str {
        &self.id
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Interview {
            id: row.get(0)?,
            application_id: row.get(1)?,
            round: row.get(2)?,
            kind: get_enum(row, 3)?,
            status: get_enum(row, 4)?,
            scheduled_at: get_opt_ts(row, 5)?,
            duration_minutes: row.get(6)?,
            location: row.get(7)?,
            meeting_url: row.get(8)?,
            notes: row.get(9)?,
            feedback: row.get(10)?,
            result: get_opt_enum(row, 11)?,
            created_at: get_ts(row, 12)?,
            updated_at: get_ts(row, 13)?,
        })
    }

    fn to_values(&self) -> Vec<Value> {
        vec![
            text(&self.id),
            text(&self.application_id),
            Value::Integer(self.round as i64),
            text(self.kind.as_str()),
            text(self.status.as_str()),
            opt_ts(self.scheduled_at.as_ref()),
            opt_int(self.duration_minutes.map(i64::from)),
            opt_text(self.location.as_deref()),
            opt_text(self.meeting_url.as_deref()),
            opt_text(self.notes.as_deref()),
            opt_text(self.feedback.as_deref()),
            opt_text(self.result.as_ref().map(|r| r.as_str())),
            ts(&self.created_at),
            ts(&self.updated_at),
        ]
    }
}

impl Record for Contact {
    const ENTITY: &'static str = "Contact";
    const TABLE: &'static str = "contacts";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "name",
        "company_id",
        "company_name",
        "title",
        "email",
        "phone",
        "linked_in",
        "relationship",
        "notes",
        "created_at",
        "updated_at",
    ];

    fn id(&self) -> &str {
        &self.id
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Contact {
            id: row.get(0)?,
            name: row.get(1)?,
            company_id: row.get(2)?,
            company_name: row.get(3)?,
            title: row.get(4)?,
            email: row.get(5)?,
            phone: row.get(6)?,
            linked_in: row.get(7)?,
            relationship: get_opt_enum(row, 8)?,
            notes: row.get(9)?,
            created_at: get_ts(row, 10)?,
            updated_at: get_ts(row, 11)?,
        })
    }

    fn to_values(&self) -> Vec<Value> {
        vec![
            text(&self.id),
            text(&self.name),
            opt_text(self.company_id.as_deref()),
            opt_text(self.company_name.as_deref()),
            opt_text(self.title.as_deref()),
            opt_text(self.email.as_deref()),
            opt_text(self.phone.as_deref()),
            opt_text(self.linked_in.as_deref()),
            opt_text(self.relationship.as_ref().map(|r| r.as_str())),
            opt_text(self.notes.as_deref()),
            ts(&self.created_at),
            ts(&self.updated_at),
        ]
    }
}

impl Record for Document {
    const ENTITY: &'static str = "Document";
    const TABLE: &'static str = "documents";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "name",
        "type",
        "file_name",
        "url",
        "version",
        "application_id",
        "used_in_application_ids",
        "tags",
        "notes",
        "created_at",
        "updated_at",
    ];

    fn id(&self) -> &str {
        &self.id
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Document {
            id: row.get(0)?,
            name: row.get(1)?,
            kind: get_enum(row, 2)?,
            file_name: row.get(3)?,
            url: row.get(4)?,
            version: row.get(5)?,
            application_id: row.get(6)?,
            used_in_application_ids: get_json(row, 7)?,
            tags: get_json(row, 8)?,
            notes: row.get(9)?,
            created_at: get_ts(row, 10)?,
            updated_at: get_ts(row, 11)?,
        })
    }

    fn to_values(&self) -> Vec<Value> {
        vec![
            text(&self.id),
            text(&self.name),
            text(self.kind.as_str()),
            opt_text(self.file_name.as_deref()),
            opt_text(self.url.as_deref()),
            Value::Integer(i64::from(self.version)),
            opt_text(self.application_id.as_deref()),
            json(&self.used_in_application_ids),
            json(&self.tags),
            opt_text(self.notes.as_deref()),
            ts(&self.created_at),
            ts(&self.updated_at),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ContactRelationship, DocumentType, InterviewType, WorkType};
    use chrono::TimeZone;

    fn test_db() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.init().unwrap();
        db
    }

    #[test]
    fn test_ensure_initialized_requires_init() {
        let db = Database::open_in_memory().unwrap();
        let err = db.ensure_initialized().unwrap_err();
        assert!(err.to_string().contains("thrive init"));
        db.init().unwrap();
        db.init().unwrap(); // idempotent
        assert!(db.ensure_initialized().is_ok());
    }

    #[test]
    fn test_application_crud() {
        let db = test_db();
        let repo = db.applications();

        let mut app = Application::new("Acme", "Engineer", ApplicationStatus::Applied);
        app.tags = vec!["rust".to_string(), "remote".to_string()];
        app.work_type = Some(WorkType::Remote);
        app.salary = Some(SalaryRange {
            min: Some(120_000),
            max: None,
            currency: "USD".to_string(),
            period: None,
        });
        repo.insert(&app).unwrap();

        let loaded = repo.get(&app.id).unwrap().unwrap();
        assert_eq!(loaded.company_name, "Acme");
        assert_eq!(loaded.tags, app.tags);
        assert_eq!(loaded.work_type, Some(WorkType::Remote));
        assert_eq!(loaded.salary.unwrap().min, Some(120_000));

        app.notes = Some("Talked to recruiter".to_string());
        repo.update(&app).unwrap();
        assert_eq!(
            repo.get(&app.id).unwrap().unwrap().notes.as_deref(),
            Some("Talked to recruiter")
        );

        assert!(repo.delete(&app.id).unwrap());
        assert!(!repo.delete(&app.id).unwrap());
        assert!(repo.get(&app.id).unwrap().is_none());
    }

    #[test]
    fn test_update_missing_is_not_found() {
        let db = test_db();
        let app = Application::new("Ghost", "Nobody", ApplicationStatus::Target);
        let err = db.applications().update(&app).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<StoreError>(),
            Some(StoreError::NotFound { entity: "Application", .. })
        ));
    }

    #[test]
    fn test_insert_many_is_atomic() {
        let db = test_db();
        let a = Application::new("A", "One", ApplicationStatus::Target);
        let b = Application::new("B", "Two", ApplicationStatus::Target);
        let dup = a.clone();

        assert!(db.applications().insert_many(&[a.clone(), b.clone(), dup]).is_err());
        assert_eq!(db.applications().count().unwrap(), 0);

        assert_eq!(db.applications().insert_many(&[a, b]).unwrap(), 2);
        assert_eq!(db.applications().count().unwrap(), 2);
        assert_eq!(db.applications().clear().unwrap(), 2);
        assert_eq!(db.applications().count().unwrap(), 0);
    }

    #[test]
    fn test_set_status_bumps_updated_at() {
        let db = test_db();
        let app = Application::new("Acme", "Engineer", ApplicationStatus::Applied);
        db.applications().insert(&app).unwrap();

        db.set_application_status(&app.id, ApplicationStatus::Interviewing).unwrap();
        let loaded = db.applications().get(&app.id).unwrap().unwrap();
        assert_eq!(loaded.status, ApplicationStatus::Interviewing);
        assert!(loaded.updated_at >= app.updated_at);

        assert!(db.set_application_status("missing", ApplicationStatus::Offer).is_err());
    }

    #[test]
    fn test_resolve_application_id_by_prefix() {
        let db = test_db();
        let app = Application::new("Acme", "Engineer", ApplicationStatus::Applied);
        db.applications().insert(&app).unwrap();

        assert_eq!(db.resolve_application_id(&app.id[..8]).unwrap(), app.id);
        assert!(db.resolve_application_id("zzzz").is_err());
        assert!(db.resolve_application_id("").is_err());
    }

    #[test]
    fn test_resolve_id_treats_prefix_literally() {
        let db = test_db();
        let mut first = Application::new("Acme", "Engineer", ApplicationStatus::Applied);
        first.id = "abc1-first".to_string();
        let mut second = Application::new("Globex", "Engineer", ApplicationStatus::Applied);
        second.id = "abc2-second".to_string();
        db.applications().insert_many(&[first, second]).unwrap();

        assert!(db.resolve_application_id("abc").unwrap_err().to_string().contains("ambiguous"));
        assert_eq!(db.resolve_application_id("abc2").unwrap(), "abc2-second");

        for wildcard in ["%", "abc_", "ab%2", "_"] {
            let err = db.resolve_application_id(wildcard).unwrap_err();
            assert!(matches!(err.downcast_ref::<StoreError>(), Some(StoreError::NotFound { .. })));
        }
    }

    #[test]
    fn test_filter_by_work_type_employment_and_applied_window() {
        let db = test_db();
        let applied = Utc.with_ymd_and_hms(2024, 3, 15, 0, 0, 0).unwrap();
        let mut remote = Application::new("Acme", "Engineer", ApplicationStatus::Applied);
        remote.work_type = Some(WorkType::Remote);
        remote.employment_type = Some(EmploymentType::Contract);
        remote.applied_date = Some(applied);
        let mut onsite = Application::new("Globex", "Engineer", ApplicationStatus::Applied);
        onsite.work_type = Some(WorkType::Onsite);
        let unset = Application::new("Initech", "Engineer", ApplicationStatus::Target);
        db.applications().insert_many(&[remote.clone(), onsite, unset]).unwrap();

        let filter = ApplicationFilter {
            work_types: vec![WorkType::Remote, WorkType::Hybrid],
            ..Default::default()
        };
        assert_eq!(db.list_applications(&filter).unwrap().len(), 1);

        let filter = ApplicationFilter {
            employment_types: vec![EmploymentType::FullTime],
            ..Default::default()
        };
        assert!(db.list_applications(&filter).unwrap().is_empty());

        let filter = ApplicationFilter {
            applied: DateRange::new(Some(applied - chrono::Duration::days(1)), None),
            ..Default::default()
        };
        let found = db.list_applications(&filter).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, remote.id);

        let filter = ApplicationFilter {
            applied: DateRange::new(None, Some(applied - chrono::Duration::days(1))),
            ..Default::default()
        };
        assert!(db.list_applications(&filter).unwrap().is_empty());
    }

    #[test]
    fn test_list_interviews_with_filter() {
        let db = test_db();
        let acme = Application::new("Acme", "Engineer", ApplicationStatus::Interviewing);
        let globex = Application::new("Globex", "Designer", ApplicationStatus::Interviewing);
        db.applications().insert_many(&[acme.clone(), globex.clone()]).unwrap();

        let mut late = Interview::new(&acme.id, 2, InterviewType::Technical);
        late.scheduled_at = Some(Utc.with_ymd_and_hms(2024, 6, 10, 15, 0, 0).unwrap());
        let mut early = Interview::new(&globex.id, 1, InterviewType::PhoneScreen);
        early.scheduled_at = Some(Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap());
        early.status = InterviewStatus::Completed;
        let unscheduled = Interview::new(&acme.id, 3, InterviewType::Final);
        db.interviews()
            .insert_many(&[unscheduled.clone(), late.clone(), early.clone()])
            .unwrap();

        let all: Vec<String> = db
            .list_interviews(&InterviewFilter::default())
            .unwrap()
            .into_iter()
            .map(|i| i.id)
            .collect();
        assert_eq!(all, vec![early.id.clone(), late.id.clone(), unscheduled.id.clone()]);

        let by_search = InterviewFilter {
            search: Some("acme".to_string()),
            ..Default::default()
        };
        assert_eq!(db.list_interviews(&by_search).unwrap().len(), 2);

        let by_kind_and_status = InterviewFilter {
            kinds: vec![InterviewType::PhoneScreen, InterviewType::Technical],
            statuses: vec![InterviewStatus::Scheduled],
            ..Default::default()
        };
        let found = db.list_interviews(&by_kind_and_status).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, late.id);

        let by_window = InterviewFilter {
            application_id: Some(acme.id.clone()),
            scheduled: DateRange::new(Some(Utc.with_ymd_and_hms(2024, 6, 5, 0, 0, 0).unwrap()), None),
            ..Default::default()
        };
        let found = db.list_interviews(&by_window).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, late.id);
    }

    #[test]
    fn test_interview_update_persists_outcome() {
        let db = test_db();
        let app = Application::new("Acme", "Engineer", ApplicationStatus::Interviewing);
        db.applications().insert(&app).unwrap();
        let mut interview = Interview::new(&app.id, 1, InterviewType::Video);
        db.interviews().insert(&interview).unwrap();

        interview.status = InterviewStatus::Completed;
        interview.result = Some(crate::models::InterviewResult::Passed);
        interview.feedback = Some("Good rapport".to_string());
        db.interviews().update(&interview).unwrap();

        let loaded = db.interviews().get(&interview.id).unwrap().unwrap();
        assert_eq!(loaded, interview);
    }

    #[test]
    fn test_contact_crud_and_company_link() {
        let db = test_db();
        let company = db.get_or_create_company("Acme").unwrap();
        let mut contact = Contact::new("Dana Reyes");
        contact.company_id = Some(company.id.clone());
        contact.company_name = Some(company.name.clone());
        contact.relationship = Some(ContactRelationship::Recruiter);
        contact.email = Some("dana@acme.test".to_string());
        db.contacts().insert(&contact).unwrap();
        db.contacts().insert(&Contact::new("Unattached")).unwrap();

        assert_eq!(db.contacts().get(&contact.id).unwrap().unwrap(), contact);
        let at_acme = db.contacts_for_company("ACME").unwrap();
        assert_eq!(at_acme.len(), 1);
        assert_eq!(db.resolve_id::<Contact>(&contact.id[..6]).unwrap(), contact.id);

        db.companies().delete(&company.id).unwrap();
        let orphaned = db.contacts().get(&contact.id).unwrap().unwrap();
        assert_eq!(orphaned.company_id, None);
        assert_eq!(orphaned.company_name.as_deref(), Some("Acme"));

        assert!(db.contacts().delete(&contact.id).unwrap());
        assert_eq!(db.contacts().count().unwrap(), 1);
    }

    #[test]
    fn test_document_crud_and_application_link() {
        let db = test_db();
        let app = Application::new("Acme", "Engineer", ApplicationStatus::Applied);
        let other = Application::new("Globex", "Engineer", ApplicationStatus::Applied);
        db.applications().insert_many(&[app.clone(), other.clone()]).unwrap();

        let mut resume = Document::new("Resume v3", DocumentType::Resume);
        resume.version = 3;
        resume.tags = vec!["backend".to_string()];
        resume.mark_used_in(&app.id);
        db.documents().insert(&resume).unwrap();
        db.documents()
            .insert(&Document::new("Portfolio", DocumentType::Portfolio))
            .unwrap();

        let loaded = db.documents().get(&resume.id).unwrap().unwrap();
        assert_eq!(loaded, resume);

        resume.mark_used_in(&other.id);
        db.documents().update(&resume).unwrap();
        assert_eq!(db.documents_for_application(&other.id).unwrap().len(), 1);

        db.applications().delete(&app.id).unwrap();
        let loaded = db.documents().get(&resume.id).unwrap().unwrap();
        assert_eq!(loaded.application_id, None);
        assert_eq!(db.documents().count().unwrap(), 2);
    }

    #[test]
    fn test_list_applications_with_filter() {
        let db = test_db();
        let mut a = Application::new("Acme", "Rust Engineer", ApplicationStatus::Applied);
        a.priority = Some(Priority::High);
        a.tags = vec!["Backend".to_string()];
        let b = Application::new("Globex", "Designer", ApplicationStatus::Rejected);
        db.applications().insert_many(&[a.clone(), b]).unwrap();

        let filter = ApplicationFilter {
            statuses: vec![ApplicationStatus::Applied, ApplicationStatus::Interviewing],
            ..Default::default()
        };
        assert_eq!(db.list_applications(&filter).unwrap().len(), 1);

        let filter = ApplicationFilter {
            tags: vec!["frontend".to_string(), "backend".to_string()],
            priorities: vec![Priority::High, Priority::Medium],
            search: Some("rust".to_string()),
            ..Default::default()
        };
        let found = db.list_applications(&filter).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, a.id);

        let filter = ApplicationFilter {
            search: Some("nothing matches".to_string()),
            ..Default::default()
        };
        assert!(db.list_applications(&filter).unwrap().is_empty());
    }

    #[test]
    fn test_get_or_create_company_is_case_insensitive() {
        let db = test_db();
        let first = db.get_or_create_company("Acme Corp").unwrap();
        let second = db.get_or_create_company("acme corp").unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(db.companies().count().unwrap(), 1);
    }

    #[test]
    fn test_interviews_cascade_with_application() {
        let db = test_db();
        let app = Application::new("Acme", "Engineer", ApplicationStatus::Interviewing);
        db.applications().insert(&app).unwrap();

        let second = Interview::new(&app.id, 2, InterviewType::Technical);
        let first = Interview::new(&app.id, 1, InterviewType::PhoneScreen);
        db.interviews().insert_many(&[second, first]).unwrap();

        let rounds: Vec<u32> = db
            .interviews_for_application(&app.id)
            .unwrap()
            .iter()
            .map(|i| i.round)
            .collect();
        assert_eq!(rounds, vec![1, 2]);

        db.applications().delete(&app.id).unwrap();
        assert_eq!(db.interviews().count().unwrap(), 0);
    }

    #[test]
    fn test_replace_applications_is_all_or_nothing() {
        let db = test_db();
        let old = Application::new("Old Co", "Engineer", ApplicationStatus::Applied);
        db.applications().insert(&old).unwrap();
        db.interviews()
            .insert(&Interview::new(&old.id, 1, InterviewType::Video))
            .unwrap();

        let fresh = Application::new("New Co", "Engineer", ApplicationStatus::Target);
        assert!(db.replace_applications(&[fresh.clone(), fresh.clone()]).is_err());
        assert!(db.applications().get(&old.id).unwrap().is_some());

        assert_eq!(db.replace_applications(std::slice::from_ref(&fresh)).unwrap(), 1);
        let ids: Vec<String> = db.applications().list().unwrap().into_iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![fresh.id]);
        assert_eq!(db.interviews().count().unwrap(), 0);
    }
}
