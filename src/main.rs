mod analytics;
mod companies;
mod config;
mod db;
mod export;
mod import;
mod models;
mod template;
mod tokenizer;
mod tui;
mod url_import;

use analytics::TrendDirection;
use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, Duration, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use config::Config;
use db::{ApplicationFilter, Database, InterviewFilter, Repository};
use models::{
    Application, ApplicationChanges, ApplicationStatus, Company, Contact, ContactRelationship, DateRange, Document,
    DocumentType, EmploymentType, Interview, InterviewChanges, InterviewResult, InterviewStatus, InterviewType,
    Priority, SalaryRange, WorkType,
};
use std::cell::OnceCell;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "thrive")]
#[command(about = "Job application tracker - import, track, and analyze your search")]
struct Cli {
    /// Database file (overrides THRIVE_DB and the config file)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database
    Init,

    /// Track a new application
    Add {
        #[arg(short, long)]
        company: String,

        #[arg(short, long)]
        position: String,

        /// target, hunting, applied, interviewing, offer, accepted, rejected, withdrawn
        #[arg(short, long, default_value = "target")]
        status: ApplicationStatus,

        #[arg(long)]
        priority: Option<Priority>,

        /// Where the posting came from (LinkedIn, referral, ...)
        #[arg(long)]
        source: Option<String>,

        #[arg(long)]
        location: Option<String>,

        #[arg(long)]
        url: Option<String>,

        #[arg(long)]
        notes: Option<String>,

        /// Date applied (YYYY-MM-DD)
        #[arg(long)]
        applied: Option<String>,

        #[arg(long)]
        salary_min: Option<i64>,

        #[arg(long)]
        salary_max: Option<i64>,

        /// Tag (repeatable)
        #[arg(short, long = "tag")]
        tags: Vec<String>,
    },

    /// List applications
    List {
        /// Filter by status (comma separated)
        #[arg(short, long, value_delimiter = ',')]
        status: Vec<ApplicationStatus>,

        /// Filter by priority (comma separated)
        #[arg(long, value_delimiter = ',')]
        priority: Vec<Priority>,

        /// Filter by tag; any listed tag matches (repeatable)
        #[arg(short, long = "tag")]
        tags: Vec<String>,

        /// remote, hybrid, onsite (comma separated)
        #[arg(long, value_delimiter = ',')]
        work_type: Vec<WorkType>,

        /// full-time, part-time, contract, internship (comma separated)
        #[arg(long, value_delimiter = ',')]
        employment_type: Vec<EmploymentType>,

        /// Applied on or after (YYYY-MM-DD)
        #[arg(long)]
        since: Option<String>,

        /// Applied on or before (YYYY-MM-DD)
        #[arg(long)]
        until: Option<String>,

        /// Search company, position, notes and location
        #[arg(long)]
        search: Option<String>,
    },

    /// Edit an application's fields
    Edit {
        /// Application ID (or unique prefix)
        id: String,

        #[arg(short, long)]
        company: Option<String>,

        #[arg(short, long)]
        position: Option<String>,

        #[arg(long)]
        priority: Option<Priority>,

        /// Empty string clears it
        #[arg(long)]
        location: Option<String>,

        #[arg(long)]
        work_type: Option<WorkType>,

        #[arg(long)]
        employment_type: Option<EmploymentType>,

        /// Empty string clears it
        #[arg(long)]
        url: Option<String>,

        /// Empty string clears it
        #[arg(long)]
        notes: Option<String>,

        /// Empty string clears it
        #[arg(long)]
        source: Option<String>,

        /// Date applied (YYYY-MM-DD)
        #[arg(long)]
        applied: Option<String>,

        #[arg(long)]
        salary_min: Option<i64>,

        #[arg(long)]
        salary_max: Option<i64>,

        /// Replace the tags (repeatable)
        #[arg(short, long = "tag")]
        tags: Vec<String>,
    },

    /// Show application details
    Show {
        /// Application ID (or unique prefix)
        id: String,
    },

    /// Change an application's status
    Status {
        /// Application ID (or unique prefix)
        id: String,

        status: ApplicationStatus,
    },

    /// Delete an application and its interviews
    Delete {
        /// Application ID (or unique prefix)
        id: String,
    },

    /// Delete all applications, interviews, companies, contacts and documents
    Clear {
        /// Confirm deleting everything
        #[arg(long)]
        yes: bool,
    },

    /// Import applications from a CSV file
    Import {
        file: PathBuf,

        /// Override a column mapping: "Column=field" ("Column=" ignores it)
        #[arg(short, long = "map")]
        mappings: Vec<String>,

        /// Save the valid rows (otherwise only preview)
        #[arg(long)]
        commit: bool,
    },

    /// Export applications
    Export {
        #[arg(short, long, value_enum, default_value_t = ExportFormat::Csv)]
        format: ExportFormat,

        /// Output file (defaults to thrive-<kind>-<date>.<ext>)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Restore applications from a JSON backup, replacing current ones
    Restore {
        file: PathBuf,

        /// Replace the current applications (otherwise only preview)
        #[arg(long)]
        commit: bool,
    },

    /// Application and email templates
    Template {
        #[command(subcommand)]
        command: TemplateCommands,
    },

    /// Manage companies
    Company {
        #[command(subcommand)]
        command: CompanyCommands,
    },

    /// Manage interviews
    Interview {
        #[command(subcommand)]
        command: InterviewCommands,
    },

    /// Manage contacts
    Contact {
        #[command(subcommand)]
        command: ContactCommands,
    },

    /// Manage resumes, cover letters and other documents
    Document {
        #[command(subcommand)]
        command: DocumentCommands,
    },

    /// Show pipeline statistics
    Stats {
        /// Only applications applied and interviews scheduled on or after (YYYY-MM-DD)
        #[arg(long)]
        since: Option<String>,

        /// Only applications applied and interviews scheduled on or before (YYYY-MM-DD)
        #[arg(long)]
        until: Option<String>,

        /// Months in the trend table when no --since is given
        #[arg(short, long, default_value_t = 6)]
        months: u32,
    },

    /// Extract a job posting from a URL
    Fetch {
        url: String,

        /// Save the posting as a new target application
        #[arg(long)]
        save: bool,
    },

    /// Browse applications interactively
    Browse {
        /// Filter by status (comma separated)
        #[arg(short, long, value_delimiter = ',')]
        status: Vec<ApplicationStatus>,

        #[arg(long)]
        search: Option<String>,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ExportFormat {
    Csv,
    Json,
    Backup,
}

#[derive(Subcommand)]
enum TemplateCommands {
    /// List built-in templates
    List,

    /// Show a template with its variables
    Show {
        name: String,
    },

    /// Fill in a template
    Render {
        name: String,

        /// Seed values from an application (company, position, date applied)
        #[arg(short, long)]
        app: Option<String>,

        /// Set a variable: "key=value" (repeatable)
        #[arg(short, long = "set")]
        values: Vec<String>,
    },
}

#[derive(Subcommand)]
enum CompanyCommands {
    /// Add a company
    Add {
        name: String,

        #[arg(long)]
        website: Option<String>,

        #[arg(long)]
        industry: Option<String>,

        #[arg(long)]
        location: Option<String>,
    },

    /// List companies
    List,

    /// Find companies that look like duplicates
    Dupes {
        /// Similarity threshold (0-1], defaults to the configured one
        #[arg(short, long)]
        threshold: Option<f64>,
    },
}

#[derive(Subcommand)]
enum InterviewCommands {
    /// Schedule an interview for an application
    Add {
        /// Application ID (or unique prefix)
        app: String,

        /// phone-screen, video, on-site, technical, behavioral, panel, final, other
        #[arg(short = 't', long = "type", default_value = "phone-screen")]
        kind: InterviewType,

        /// Round number (defaults to the next one)
        #[arg(short, long)]
        round: Option<u32>,

        /// When (YYYY-MM-DD HH:MM)
        #[arg(long)]
        at: Option<String>,

        /// Duration in minutes
        #[arg(short, long)]
        duration: Option<u32>,

        #[arg(long)]
        location: Option<String>,

        #[arg(long)]
        url: Option<String>,

        #[arg(long)]
        notes: Option<String>,
    },

    /// List interviews, optionally for one application
    List {
        /// Application ID (or unique prefix)
        app: Option<String>,

        /// Filter by type (comma separated)
        #[arg(short = 't', long = "type", value_delimiter = ',')]
        kinds: Vec<InterviewType>,

        /// scheduled, completed, cancelled, rescheduled, no-show (comma separated)
        #[arg(short, long, value_delimiter = ',')]
        status: Vec<InterviewStatus>,

        /// Scheduled on or after (YYYY-MM-DD)
        #[arg(long)]
        since: Option<String>,

        /// Scheduled on or before (YYYY-MM-DD)
        #[arg(long)]
        until: Option<String>,

        /// Search the application's company and position
        #[arg(long)]
        search: Option<String>,
    },

    /// Record an outcome or reschedule an interview
    Update {
        /// Interview ID (or unique prefix)
        id: String,

        #[arg(short, long)]
        status: Option<InterviewStatus>,

        /// passed, failed, pending
        #[arg(short, long)]
        result: Option<InterviewResult>,

        #[arg(long)]
        feedback: Option<String>,

        #[arg(long)]
        notes: Option<String>,

        /// New time (YYYY-MM-DD HH:MM)
        #[arg(long)]
        at: Option<String>,

        /// Duration in minutes
        #[arg(short, long)]
        duration: Option<u32>,
    },
}

#[derive(Subcommand)]
enum ContactCommands {
    /// Add a contact
    Add {
        name: String,

        #[arg(short, long)]
        company: Option<String>,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        email: Option<String>,

        #[arg(long)]
        phone: Option<String>,

        #[arg(long = "linkedin")]
        linked_in: Option<String>,

        /// recruiter, hiring-manager, employee, referral, other
        #[arg(short, long)]
        relationship: Option<ContactRelationship>,

        #[arg(long)]
        notes: Option<String>,
    },

    /// List contacts
    List {
        /// Only contacts at this company
        #[arg(short, long)]
        company: Option<String>,
    },

    /// Delete a contact
    Delete {
        /// Contact ID (or unique prefix)
        id: String,
    },
}

#[derive(Subcommand)]
enum DocumentCommands {
    /// Add a document
    Add {
        name: String,

        /// resume, cv, cover-letter, portfolio, transcript, certification, other
        #[arg(short = 't', long = "type")]
        kind: DocumentType,

        /// File name or local path
        #[arg(short, long)]
        file: Option<String>,

        #[arg(long)]
        url: Option<String>,

        #[arg(long, default_value_t = 1)]
        version: u32,

        /// Application it was written for (ID or unique prefix)
        #[arg(short, long)]
        app: Option<String>,

        /// Tag (repeatable)
        #[arg(long = "tag")]
        tags: Vec<String>,

        #[arg(long)]
        notes: Option<String>,
    },

    /// List documents
    List {
        /// Filter by type (comma separated)
        #[arg(short = 't', long = "type", value_delimiter = ',')]
        kinds: Vec<DocumentType>,

        /// Only documents used with this application (ID or unique prefix)
        #[arg(short, long)]
        app: Option<String>,
    },

    /// Record that a document was sent with an application
    Use {
        /// Document ID (or unique prefix)
        id: String,

        /// Application ID (or unique prefix)
        app: String,
    },

    /// Delete a document
    Delete {
        /// Document ID (or unique prefix)
        id: String,
    },
}

/// Opens the database on first use, so commands that never read or write
/// it do not create the file.
struct Store {
    path: PathBuf,
    db: OnceCell<Database>,
}

impl Store {
    fn new(path: PathBuf) -> Self {
        Self {
            path,
            db: OnceCell::new(),
        }
    }

    fn open(&self) -> Result<&Database> {
        if let Some(db) = self.db.get() {
            return Ok(db);
        }
        let db = Database::open(&self.path)?;
        Ok(self.db.get_or_init(|| db))
    }

    /// The database, after checking it has been initialized.
    fn get(&self) -> Result<&Database> {
        let db = self.open()?;
        db.ensure_initialized()?;
        Ok(db)
    }
}

fn init_logging(cfg: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(cfg.log_filter.as_deref().unwrap_or("warn")))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let cfg = config::load(None).context("Failed to load configuration")?;
    init_logging(&cfg);

    let store = Store::new(cfg.database_path(cli.db.as_deref()));
    run(cli.command, &cfg, &store)
}

fn run(command: Commands, cfg: &Config, store: &Store) -> Result<()> {
    match command {
        Commands::Init => {
            let db = store.open()?;
            db.init()?;
            println!("Database initialized at {}", db.path().display());
        }

        Commands::Add {
            company,
            position,
            status,
            priority,
            source,
            location,
            url,
            notes,
            applied,
            salary_min,
            salary_max,
            tags,
        } => {
            let db = store.get()?;
            let mut app = Application::new(company.trim(), position.trim(), status);
            app.priority = priority;
            app.source = source;
            app.location = location;
            app.job_url = url;
            app.notes = notes;
            app.tags = tags;
            app.applied_date = applied.as_deref().map(|d| parse_date_arg("applied", d)).transpose()?;
            if salary_min.is_some() || salary_max.is_some() {
                app.salary = Some(SalaryRange {
                    min: salary_min,
                    max: salary_max,
                    currency: cfg.default_currency.clone(),
                    period: None,
                });
            }

            warn_similar_companies(db, &app.company_name, cfg.similarity_threshold)?;
            db.applications().insert(&app)?;
            db.get_or_create_company(&app.company_name)?;
            info!(id = %app.id, "added application");
            println!("Added application {} ({} at {})", short_id(&app.id), app.position, app.company_name);
        }

        Commands::List {
            status,
            priority,
            tags,
            work_type,
            employment_type,
            since,
            until,
            search,
        } => {
            let db = store.get()?;
            let filter = ApplicationFilter {
                statuses: status,
                priorities: priority,
                tags,
                work_types: work_type,
                employment_types: employment_type,
                applied: parse_range_args(since.as_deref(), until.as_deref())?,
                search,
            };
            let apps = db.list_applications(&filter)?;
            if apps.is_empty() {
                println!("No applications found.");
            } else {
                print_applications(&apps);
            }
        }

        Commands::Edit {
            id,
            company,
            position,
            priority,
            location,
            work_type,
            employment_type,
            url,
            notes,
            source,
            applied,
            salary_min,
            salary_max,
            tags,
        } => {
            let changes = ApplicationChanges {
                company_name: company,
                position,
                priority,
                location,
                work_type,
                employment_type,
                job_url: url,
                notes,
                source,
                applied_date: applied.as_deref().map(|d| parse_date_arg("applied", d)).transpose()?,
                salary_min,
                salary_max,
                tags: (!tags.is_empty()).then_some(tags),
            };
            if changes.is_empty() {
                bail!("Nothing to change. Pass at least one field to edit.");
            }

            let db = store.get()?;
            let id = db.resolve_application_id(&id)?;
            let mut app = db
                .applications()
                .get(&id)?
                .ok_or_else(|| anyhow!("Application '{}' not found", id))?;
            let company_changed = changes
                .company_name
                .as_deref()
                .is_some_and(|c| !c.trim().is_empty() && !c.trim().eq_ignore_ascii_case(&app.company_name));
            if company_changed {
                if let Some(company) = changes.company_name.as_deref() {
                    warn_similar_companies(db, company, cfg.similarity_threshold)?;
                }
            }

            changes.apply(&mut app, &cfg.default_currency);
            db.applications().update(&app)?;
            if company_changed {
                db.get_or_create_company(&app.company_name)?;
            }
            info!(id = %app.id, "edited application");
            println!("Updated {} ({} at {}).", short_id(&app.id), app.position, app.company_name);
        }

        Commands::Show { id } => {
            let db = store.get()?;
            let id = db.resolve_application_id(&id)?;
            let app = db
                .applications()
                .get(&id)?
                .ok_or_else(|| anyhow!("Application '{}' not found", id))?;
            print_application(&app);

            let interviews = db.interviews_for_application(&app.id)?;
            if !interviews.is_empty() {
                println!("\nInterviews ({}):", interviews.len());
                for interview in interviews {
                    println!(
                        "  #{} {} - {} ({})",
                        interview.round,
                        interview.kind,
                        format_date(interview.scheduled_at.as_ref()),
                        interview.status
                    );
                }
            }

            let documents = db.documents_for_application(&app.id)?;
            if !documents.is_empty() {
                println!("\nDocuments ({}):", documents.len());
                for document in documents {
                    println!("  {} {} v{}", document.kind, document.name, document.version);
                }
            }

            let contacts = db.contacts_for_company(&app.company_name)?;
            if !contacts.is_empty() {
                println!("\nContacts at {}:", app.company_name);
                for contact in contacts {
                    let title = contact.title.map(|t| format!(", {}", t)).unwrap_or_default();
                    let email = contact.email.map(|e| format!(" <{}>", e)).unwrap_or_default();
                    println!("  {}{}{}", contact.name, title, email);
                }
            }
        }

        Commands::Status { id, status } => {
            let db = store.get()?;
            let id = db.resolve_application_id(&id)?;
            db.set_application_status(&id, status)?;
            println!("Marked {} as {}.", short_id(&id), status);
        }

        Commands::Delete { id } => {
            let db = store.get()?;
            let id = db.resolve_application_id(&id)?;
            db.applications().delete(&id)?;
            println!("Deleted application {}.", short_id(&id));
        }

        Commands::Clear { yes } => {
            let db = store.get()?;
            if !yes {
                bail!("This deletes every application, interview, company, contact and document. Re-run with --yes to confirm.");
            }
            let documents = db.documents().clear()?;
            let interviews = db.interviews().clear()?;
            let applications = db.applications().clear()?;
            let contacts = db.contacts().clear()?;
            let companies = db.companies().clear()?;
            info!(applications, interviews, companies, contacts, documents, "cleared all data");
            println!(
                "Deleted {} applications, {} interviews, {} companies, {} contacts and {} documents.",
                applications, interviews, companies, contacts, documents
            );
        }

        Commands::Import {
            file,
            mappings,
            commit,
        } => {
            let db = store.get()?;
            run_import(db, cfg, &file, &mappings, commit)?;
        }

        Commands::Export { format, output } => {
            let db = store.get()?;
            let apps = db.applications().list()?;
            let (content, kind, ext) = match format {
                ExportFormat::Csv => (export::export_applications_csv(&apps)?, "applications", "csv"),
                ExportFormat::Json => (export::to_json(&apps, true)?, "applications", "json"),
                ExportFormat::Backup => (export::to_json(&export::create_backup(&apps), true)?, "backup", "json"),
            };
            let path = output.unwrap_or_else(|| PathBuf::from(export::default_filename(kind, ext, Utc::now())));
            fs::write(&path, &content)
                .with_context(|| format!("Failed to write to {}", path.display()))?;
            println!(
                "Exported {} applications to {} ({})",
                apps.len(),
                path.display(),
                export::format_bytes(content.len() as u64, 2)
            );
        }

        Commands::Restore { file, commit } => {
            let db = store.get()?;
            let content = fs::read_to_string(&file)
                .with_context(|| format!("Failed to read backup file: {}", file.display()))?;
            let backup = export::parse_backup(&content)?;
            println!(
                "Backup v{} from {}: {} applications",
                backup.version,
                backup.timestamp.format("%Y-%m-%d %H:%M"),
                backup.record_count
            );

            let current = db.applications().count()?;
            if commit {
                let restored = db.replace_applications(&backup.applications)?;
                info!(restored, replaced = current, "restored backup");
                println!("Restored {} applications (replaced {}).", restored, current);
            } else {
                println!(
                    "\n(Preview only - re-run with --commit to replace the current {} applications)",
                    current
                );
            }
        }

        Commands::Template { command } => {
            let templates = template::default_templates();
            match command {
                TemplateCommands::List => {
                    println!("{:<32} {:<14} {:<40}", "NAME", "CATEGORY", "DESCRIPTION");
                    println!("{}", "-".repeat(86));
                    for t in &templates {
                        println!(
                            "{:<32} {:<14} {:<40}",
                            truncate(&t.name, 30),
                            t.category,
                            truncate(t.description.as_deref().unwrap_or_default(), 38)
                        );
                    }
                }

                TemplateCommands::Show { name } => {
                    let t = template::find_template(&templates, &name)?;
                    println!("{} ({})", t.name, t.category);
                    if let Some(description) = &t.description {
                        println!("{}", description);
                    }
                    println!("\nVariables:");
                    for v in &t.variables {
                        let default = v
                            .default_value
                            .as_deref()
                            .map(|d| format!(" [default: {}]", d))
                            .unwrap_or_default();
                        let required = if v.required { " (required)" } else { "" };
                        println!("  {:<20} {}{}{}", v.key, v.label, required, default);
                    }
                    println!("\n--- Preview ---\n{}", t.preview());
                }

                TemplateCommands::Render { name, app, values } => {
                    let t = template::find_template(&templates, &name)?;
                    let mut context: HashMap<String, String> = HashMap::new();
                    if let Some(prefix) = app {
                        let db = store.get()?;
                        let id = db.resolve_application_id(&prefix)?;
                        let app = db
                            .applications()
                            .get(&id)?
                            .ok_or_else(|| anyhow!("Application '{}' not found", id))?;
                        context.extend(template::application_context(&app));
                    }
                    for value in &values {
                        let (key, value) = parse_key_value(value)?;
                        context.insert(key, value);
                    }
                    let resolved = t.resolve(&context)?;
                    println!("{}", resolved.content);
                }
            }
        }

        Commands::Company { command } => {
            let db = store.get()?;
            match command {
                CompanyCommands::Add {
                    name,
                    website,
                    industry,
                    location,
                } => {
                    if let Some(existing) = db.get_company_by_name(&name)? {
                        println!("Company '{}' already exists.", existing.name);
                        return Ok(());
                    }
                    warn_similar_companies(db, &name, cfg.similarity_threshold)?;
                    let mut company = Company::new(&name);
                    company.website = website;
                    company.industry = industry;
                    company.location = location;
                    db.companies().insert(&company)?;
                    println!("Added company '{}'.", company.name);
                }

                CompanyCommands::List => {
                    let companies = db.companies().list()?;
                    if companies.is_empty() {
                        println!("No companies found.");
                    } else {
                        let apps = db.applications().list()?;
                        println!("{:<30} {:<20} {:<20} {:>5}", "NAME", "INDUSTRY", "LOCATION", "APPS");
                        println!("{}", "-".repeat(78));
                        for company in companies {
                            let count = apps
                                .iter()
                                .filter(|a| a.company_name.eq_ignore_ascii_case(&company.name))
                                .count();
                            println!(
                                "{:<30} {:<20} {:<20} {:>5}",
                                truncate(&company.name, 28),
                                truncate(&company.industry.unwrap_or_default(), 18),
                                truncate(&company.location.unwrap_or_default(), 18),
                                count
                            );
                        }
                    }
                }

                CompanyCommands::Dupes { threshold } => {
                    let threshold = threshold.unwrap_or(cfg.similarity_threshold);
                    if !(threshold > 0.0 && threshold <= 1.0) {
                        bail!("Threshold must be in (0, 1], got {}", threshold);
                    }
                    let companies = db.companies().list()?;
                    let pairs = companies::find_duplicate_pairs(&companies, threshold);
                    if pairs.is_empty() {
                        println!("No likely duplicates found.");
                    } else {
                        println!("{:<30} {:<30} {:>6}", "COMPANY", "LOOKS LIKE", "SCORE");
                        println!("{}", "-".repeat(68));
                        for (a, b, score) in pairs {
                            println!(
                                "{:<30} {:<30} {:>5.0}%",
                                truncate(&a.name, 28),
                                truncate(&b.name, 28),
                                score * 100.0
                            );
                        }
                    }
                }
            }
        }

        Commands::Interview { command } => {
            let db = store.get()?;
            match command {
                InterviewCommands::Add {
                    app,
                    kind,
                    round,
                    at,
                    duration,
                    location,
                    url,
                    notes,
                } => {
                    let app_id = db.resolve_application_id(&app)?;
                    let existing = db.interviews_for_application(&app_id)?;
                    let round = round.unwrap_or_else(|| {
                        existing.iter().map(|i| i.round).max().unwrap_or(0) + 1
                    });

                    let mut interview = Interview::new(&app_id, round, kind);
                    interview.scheduled_at = at.as_deref().map(|d| parse_date_arg("at", d)).transpose()?;
                    interview.duration_minutes = duration;
                    interview.location = location;
                    interview.meeting_url = url;
                    interview.notes = notes;
                    db.interviews().insert(&interview)?;
                    println!(
                        "Added round {} {} interview {} for {}.",
                        round,
                        kind,
                        short_id(&interview.id),
                        short_id(&app_id)
                    );
                }

                InterviewCommands::List {
                    app,
                    kinds,
                    status,
                    since,
                    until,
                    search,
                } => {
                    let filter = InterviewFilter {
                        application_id: app.as_deref().map(|a| db.resolve_application_id(a)).transpose()?,
                        kinds,
                        statuses: status,
                        scheduled: parse_range_args(since.as_deref(), until.as_deref())?,
                        search,
                    };
                    let interviews = db.list_interviews(&filter)?;
                    if interviews.is_empty() {
                        println!("No interviews found.");
                    } else {
                        let apps = db.applications().list()?;
                        print_interviews(&interviews, &apps);
                    }
                }

                InterviewCommands::Update {
                    id,
                    status,
                    result,
                    feedback,
                    notes,
                    at,
                    duration,
                } => {
                    let changes = InterviewChanges {
                        status,
                        result,
                        feedback,
                        notes,
                        scheduled_at: at.as_deref().map(|d| parse_date_arg("at", d)).transpose()?,
                        duration_minutes: duration,
                    };
                    if changes.is_empty() {
                        bail!("Nothing to change. Pass at least one field to update.");
                    }
                    let id = db.resolve_id::<Interview>(&id)?;
                    let mut interview = db
                        .interviews()
                        .get(&id)?
                        .ok_or_else(|| anyhow!("Interview '{}' not found", id))?;
                    changes.apply(&mut interview);
                    db.interviews().update(&interview)?;
                    info!(id = %interview.id, status = %interview.status, "updated interview");
                    let result = interview.result.map(|r| format!(", {}", r)).unwrap_or_default();
                    println!(
                        "Interview {} is {}{} ({}).",
                        short_id(&interview.id),
                        interview.status,
                        result,
                        format_date(interview.scheduled_at.as_ref())
                    );
                }
            }
        }

        Commands::Contact { command } => {
            let db = store.get()?;
            match command {
                ContactCommands::Add {
                    name,
                    company,
                    title,
                    email,
                    phone,
                    linked_in,
                    relationship,
                    notes,
                } => {
                    if name.trim().is_empty() {
                        bail!("Contact name is required");
                    }
                    let mut contact = Contact::new(&name);
                    if let Some(company) = company.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
                        if db.get_company_by_name(company)?.is_none() {
                            warn_similar_companies(db, company, cfg.similarity_threshold)?;
                        }
                        let company = db.get_or_create_company(company)?;
                        contact.company_id = Some(company.id);
                        contact.company_name = Some(company.name);
                    }
                    contact.title = title;
                    contact.email = email;
                    contact.phone = phone;
                    contact.linked_in = linked_in;
                    contact.relationship = relationship;
                    contact.notes = notes;
                    db.contacts().insert(&contact)?;
                    info!(id = %contact.id, "added contact");
                    println!("Added contact {} ({}).", contact.name, short_id(&contact.id));
                }

                ContactCommands::List { company } => {
                    let contacts = match company {
                        Some(company) => db.contacts_for_company(&company)?,
                        None => db.contacts().list()?,
                    };
                    if contacts.is_empty() {
                        println!("No contacts found.");
                    } else {
                        print_contacts(&contacts);
                    }
                }

                ContactCommands::Delete { id } => {
                    let id = db.resolve_id::<Contact>(&id)?;
                    db.contacts().delete(&id)?;
                    println!("Deleted contact {}.", short_id(&id));
                }
            }
        }

        Commands::Document { command } => {
            let db = store.get()?;
            match command {
                DocumentCommands::Add {
                    name,
                    kind,
                    file,
                    url,
                    version,
                    app,
                    tags,
                    notes,
                } => {
                    if name.trim().is_empty() {
                        bail!("Document name is required");
                    }
                    let mut document = Document::new(&name, kind);
                    document.file_name = file;
                    document.url = url;
                    document.version = version.max(1);
                    document.tags = tags;
                    document.notes = notes;
                    if let Some(prefix) = app {
                        let app_id = db.resolve_application_id(&prefix)?;
                        document.mark_used_in(&app_id);
                    }
                    db.documents().insert(&document)?;
                    info!(id = %document.id, "added document");
                    println!("Added {} '{}' ({}).", document.kind, document.name, short_id(&document.id));
                }

                DocumentCommands::List { kinds, app } => {
                    let documents = match app {
                        Some(prefix) => db.documents_for_application(&db.resolve_application_id(&prefix)?)?,
                        None => db.documents().list()?,
                    };
                    let documents: Vec<Document> = documents
                        .into_iter()
                        .filter(|d| kinds.is_empty() || kinds.contains(&d.kind))
                        .collect();
                    if documents.is_empty() {
                        println!("No documents found.");
                    } else {
                        print_documents(&documents);
                    }
                }

                DocumentCommands::Use { id, app } => {
                    let id = db.resolve_id::<Document>(&id)?;
                    let app_id = db.resolve_application_id(&app)?;
                    let mut document = db
                        .documents()
                        .get(&id)?
                        .ok_or_else(|| anyhow!("Document '{}' not found", id))?;
                    document.mark_used_in(&app_id);
                    document.updated_at = Utc::now();
                    db.documents().update(&document)?;
                    println!(
                        "Recorded '{}' as used with {} ({} applications).",
                        document.name,
                        short_id(&app_id),
                        document.used_in_application_ids.len()
                    );
                }

                DocumentCommands::Delete { id } => {
                    let id = db.resolve_id::<Document>(&id)?;
                    db.documents().delete(&id)?;
                    println!("Deleted document {}.", short_id(&id));
                }
            }
        }

        Commands::Stats { since, until, months } => {
            let db = store.get()?;
            let period = parse_range_args(since.as_deref(), until.as_deref())?;
            let apps = db.applications().list()?;
            let interviews = db.interviews().list()?;
            print_stats(&apps, &interviews, &period, months, Utc::now());
        }

        Commands::Fetch { url, save } => {
            let data = url_import::fetch_job(&url)?;
            println!("Source:     {}", data.source);
            println!("Position:   {}", data.position.as_deref().unwrap_or("-"));
            println!("Company:    {}", data.company_name.as_deref().unwrap_or("-"));
            println!("Location:   {}", data.location.as_deref().unwrap_or("-"));
            if let Some(work_type) = data.work_type {
                println!("Work type:  {}", work_type);
            }
            if let Some(employment_type) = data.employment_type {
                println!("Employment: {}", employment_type);
            }
            if data.salary_min.is_some() || data.salary_max.is_some() {
                let salary = SalaryRange {
                    min: data.salary_min,
                    max: data.salary_max,
                    currency: data.salary_currency.clone().unwrap_or_else(|| cfg.default_currency.clone()),
                    period: None,
                };
                println!("Salary:     {}", salary.display());
            }
            if let Some(description) = &data.job_description {
                println!("\n{}", textwrap::fill(&truncate(description, 600), 80));
            }

            if save {
                let db = store.get()?;
                let app = data.to_application(&cfg.default_currency)?;
                warn_similar_companies(db, &app.company_name, cfg.similarity_threshold)?;
                db.applications().insert(&app)?;
                db.get_or_create_company(&app.company_name)?;
                info!(id = %app.id, url = %url, "saved fetched posting");
                println!("\nSaved as target application {}.", short_id(&app.id));
            }
        }

        Commands::Browse { status, search } => {
            let db = store.get()?;
            let filter = ApplicationFilter {
                statuses: status,
                search,
                ..ApplicationFilter::default()
            };
            tui::run_browse(db, &filter)?;
        }
    }

    Ok(())
}

fn run_import(db: &Database, cfg: &Config, file: &Path, overrides: &[String], commit: bool) -> Result<()> {
    let content = fs::read_to_string(file)
        .with_context(|| format!("Failed to read CSV file: {}", file.display()))?;
    let table = tokenizer::parse_csv_file(&content);
    if table.headers.is_empty() {
        bail!("{} has no header row", file.display());
    }

    let mut mapping = import::auto_detect_mapping(&table.headers);
    let overrides = overrides
        .iter()
        .map(|arg| import::parse_mapping_override(arg))
        .collect::<Result<Vec<_>>>()?;
    import::apply_overrides(&mut mapping, &overrides)?;

    println!("Column mapping:");
    for m in &mapping {
        let target = m
            .target
            .map(|t| t.to_string())
            .unwrap_or_else(|| "(ignored)".to_string());
        println!("  {:<28} -> {}", truncate(&m.column, 28), target);
    }

    let existing = db.applications().list()?;
    let options = import::ImportOptions {
        currency: cfg.default_currency.clone(),
    };
    let preview = import::preview_import(&table.rows, &table.headers, &mapping, &existing, &options);

    println!("\nRows:       {}", preview.total_rows());
    println!("  Valid:      {}", preview.total_valid);
    println!("  Invalid:    {}", preview.total_invalid);
    println!("  Duplicates: {}", preview.total_duplicates);

    if !preview.invalid.is_empty() {
        println!("\nInvalid rows:");
        for row in &preview.invalid {
            for error in &row.errors {
                match &error.value {
                    Some(value) => println!("  row {}: {} (got '{}')", row.row, error.message, value),
                    None => println!("  row {}: {}", row.row, error.message),
                }
            }
        }
    }

    if !preview.duplicates.is_empty() {
        println!("\nDuplicate rows:");
        for row in &preview.duplicates {
            println!("  row {}: already tracked as {}", row.row, short_id(&row.existing_id));
        }
    }

    if !preview.valid.is_empty() {
        println!();
        print_applications(&preview.valid);
    }

    if commit {
        let imported = db.applications().insert_many(&preview.valid)?;
        for app in &preview.valid {
            db.get_or_create_company(&app.company_name)?;
        }
        info!(imported, file = %file.display(), "imported applications");
        println!("\nImported {} applications.", imported);
    } else if !preview.valid.is_empty() {
        println!(
            "\n(Preview only - re-run with --commit to import {} applications)",
            preview.total_valid
        );
    }

    Ok(())
}

fn print_applications(apps: &[Application]) {
    println!(
        "{:<10} {:<13} {:<28} {:<22} {:>12}",
        "ID", "STATUS", "POSITION", "COMPANY", "APPLIED"
    );
    println!("{}", "-".repeat(89));
    for app in apps {
        println!(
            "{:<10} {:<13} {:<28} {:<22} {:>12}",
            short_id(&app.id),
            app.status,
            truncate(&app.position, 26),
            truncate(&app.company_name, 20),
            app.applied_date
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| "-".to_string())
        );
    }
}

fn print_application(app: &Application) {
    println!("Application {}", app.id);
    println!("Position: {}", app.position);
    println!("Company: {}", app.company_name);
    println!("Status: {}", app.status);
    if let Some(priority) = app.priority {
        println!("Priority: {}", priority);
    }
    if let Some(location) = &app.location {
        println!("Location: {}", location);
    }
    if let Some(work_type) = app.work_type {
        println!("Work type: {}", work_type);
    }
    if let Some(employment_type) = app.employment_type {
        println!("Employment: {}", employment_type);
    }
    if let Some(salary) = &app.salary {
        println!("Salary: {}", salary.display());
    }
    for (label, date) in [
        ("Target date", &app.target_date),
        ("Applied", &app.applied_date),
        ("First interview", &app.first_interview_date),
        ("Offer", &app.offer_date),
        ("Respond by", &app.response_deadline),
    ] {
        if let Some(date) = date {
            println!("{}: {}", label, date.format("%Y-%m-%d"));
        }
    }
    if let Some(url) = &app.job_url {
        println!("URL: {}", url);
    }
    if let Some(source) = &app.source {
        println!("Source: {}", source);
    }
    if let Some(referral) = &app.referral_name {
        println!("Referral: {}", referral);
    }
    if !app.tags.is_empty() {
        println!("Tags: {}", app.tags.join(", "));
    }
    println!("Created: {}", app.created_at.format("%Y-%m-%d %H:%M"));
    println!("Updated: {}", app.updated_at.format("%Y-%m-%d %H:%M"));
    if let Some(notes) = &app.notes {
        println!("\n--- Notes ---\n{}", notes);
    }
    if let Some(description) = &app.job_description {
        println!("\n--- Description ---\n{}", textwrap::fill(description, 80));
    }
}

fn print_interviews(interviews: &[Interview], apps: &[Application]) {
    println!(
        "{:<10} {:<22} {:<6} {:<14} {:<18} {:<12} {:<8}",
        "ID", "COMPANY", "ROUND", "TYPE", "WHEN", "STATUS", "RESULT"
    );
    println!("{}", "-".repeat(95));
    for interview in interviews {
        let company = apps
            .iter()
            .find(|a| a.id == interview.application_id)
            .map(|a| a.company_name.as_str())
            .unwrap_or("-");
        println!(
            "{:<10} {:<22} {:<6} {:<14} {:<18} {:<12} {:<8}",
            short_id(&interview.id),
            truncate(company, 20),
            interview.round,
            interview.kind,
            format_date(interview.scheduled_at.as_ref()),
            interview.status,
            interview.result.map(|r| r.to_string()).unwrap_or_else(|| "-".to_string())
        );
    }
}

fn print_contacts(contacts: &[Contact]) {
    println!(
        "{:<10} {:<22} {:<20} {:<22} {:<15}",
        "ID", "NAME", "COMPANY", "EMAIL", "RELATIONSHIP"
    );
    println!("{}", "-".repeat(93));
    for contact in contacts {
        println!(
            "{:<10} {:<22} {:<20} {:<22} {:<15}",
            short_id(&contact.id),
            truncate(&contact.name, 20),
            truncate(contact.company_name.as_deref().unwrap_or("-"), 18),
            truncate(contact.email.as_deref().unwrap_or("-"), 20),
            contact.relationship.map(|r| r.to_string()).unwrap_or_else(|| "-".to_string())
        );
    }
}

fn print_documents(documents: &[Document]) {
    println!("{:<10} {:<28} {:<14} {:>4} {:>5}", "ID", "NAME", "TYPE", "VER", "USED");
    println!("{}", "-".repeat(65));
    for document in documents {
        println!(
            "{:<10} {:<28} {:<14} {:>4} {:>5}",
            short_id(&document.id),
            truncate(&document.name, 26),
            document.kind,
            document.version,
            document.used_in_application_ids.len()
        );
    }
}

fn print_stats(
    all_apps: &[Application],
    all_interviews: &[Interview],
    period: &DateRange,
    months: u32,
    now: DateTime<Utc>,
) {
    let apps = analytics::applications_in(all_apps, period);
    let interviews = analytics::interviews_in(all_interviews, period);

    if period.is_set() {
        let bound = |d: Option<DateTime<Utc>>| {
            d.map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| "...".to_string())
        };
        println!("Period:              {} to {}", bound(period.start), bound(period.end));
    }
    let metrics = analytics::calculate(&apps, &interviews);
    println!("Applications:        {}", metrics.total_applications);
    println!("  Active:            {}", metrics.active_applications);
    println!("  Rejected:          {}", metrics.rejected_applications);
    println!("  Accepted:          {}", metrics.successful_applications);
    println!("  No response yet:   {}", metrics.no_response_count);
    println!("Response rate:       {:.1}%", metrics.response_rate);
    println!("Offer rate:          {:.1}%", metrics.offer_rate);
    println!("Interviews:          {}", metrics.total_interviews);
    println!("  Completed:         {}", metrics.completed_interviews);
    println!("  Scheduled:         {}", metrics.scheduled_interviews);
    println!("Interview rate:      {:.1}%", metrics.interview_conversion_rate);
    println!("Interview to offer:  {:.1}%", metrics.interview_to_offer_rate);
    if let Some(days) = metrics.average_days_to_interview {
        println!("Days to interview:   {:.1}", days);
    }
    if let Some(days) = metrics.average_days_to_offer {
        println!("Days to offer:       {:.1}", days);
    }

    let recent = analytics::recent_activity(all_apps, all_interviews, now);
    println!(
        "This week:           {} applied, {} interviews",
        recent.applications_this_week, recent.interviews_this_week
    );
    println!(
        "This month:          {} applied, {} interviews",
        recent.applications_this_month, recent.interviews_this_month
    );

    let distribution = analytics::status_distribution(&apps);
    if !distribution.is_empty() {
        println!("\n{:<14} {:>6} {:>8}", "STATUS", "COUNT", "SHARE");
        println!("{}", "-".repeat(30));
        for entry in distribution {
            println!("{:<14} {:>6} {:>7.1}%", entry.status, entry.count, entry.percentage);
        }
    }

    let trends = analytics::monthly_trends(all_apps, all_interviews, months, period, now);
    if !trends.is_empty() {
        println!(
            "\n{:<10} {:>5} {:>11} {:>7} {:>11} {:>9} {:>8}",
            "MONTH", "APPS", "INTERVIEWS", "OFFERS", "REJECTIONS", "RESPONSE", "CHANGE"
        );
        println!("{}", "-".repeat(67));
        let mut previous: Option<usize> = None;
        for month in &trends {
            let change = previous
                .map(|p| analytics::trend(month.applications as f64, p as f64))
                .map(|t| match t.direction {
                    TrendDirection::Neutral => "-".to_string(),
                    _ => format!("{:+.0}%", t.percentage),
                })
                .unwrap_or_else(|| "-".to_string());
            println!(
                "{:<10} {:>5} {:>11} {:>7} {:>11} {:>8.1}% {:>8}",
                month.label(),
                month.applications,
                month.interviews,
                month.offers,
                month.rejections,
                month.response_rate,
                change
            );
            previous = Some(month.applications);
        }
    }

    let response_times = analytics::response_time_distribution(&apps, now);
    if response_times.iter().any(|b| b.count > 0) {
        println!("\n{:<12} {:>6} {:>8}", "RESPONDED", "COUNT", "SHARE");
        println!("{}", "-".repeat(28));
        for bucket in response_times {
            println!("{:<12} {:>6} {:>7.1}%", bucket.range, bucket.count, bucket.percentage);
        }
    }

    let stages = analytics::interview_stage_stats(&interviews);
    if !stages.is_empty() {
        println!("\n{:<14} {:>6} {:>10} {:>8}", "STAGE", "COUNT", "COMPLETED", "PASSED");
        println!("{}", "-".repeat(41));
        for stage in stages {
            println!(
                "{:<14} {:>6} {:>10} {:>7.1}%",
                stage.stage, stage.count, stage.completed, stage.success_rate
            );
        }
    }

    let companies = analytics::company_stats(&apps, &interviews, 10);
    if !companies.is_empty() {
        println!(
            "\n{:<26} {:>5} {:>11} {:>7} {:<13}",
            "COMPANY", "APPS", "INTERVIEWS", "OFFERS", "FURTHEST"
        );
        println!("{}", "-".repeat(66));
        for stats in companies {
            println!(
                "{:<26} {:>5} {:>11} {:>7} {:<13}",
                truncate(&stats.company_name, 24),
                stats.applications,
                stats.interviews,
                stats.offers,
                stats.best_status
            );
        }
    }
}

fn warn_similar_companies(db: &Database, name: &str, threshold: f64) -> Result<()> {
    let companies = db.companies().list()?;
    for similar in companies::find_similar(name, &companies, threshold) {
        if !similar.company.name.eq_ignore_ascii_case(name.trim()) {
            println!(
                "Note: '{}' looks like existing company '{}' ({:.0}% similar)",
                name.trim(),
                similar.company.name,
                similar.score * 100.0
            );
        }
    }
    Ok(())
}

fn parse_date_arg(name: &str, value: &str) -> Result<DateTime<Utc>> {
    import::parse_date(name, value)
        .ok_or_else(|| anyhow!("Could not parse --{} '{}' (try YYYY-MM-DD)", name, value))
}

/// `--since`/`--until` as an inclusive window. A date-only `--until` covers that whole day.
fn parse_range_args(since: Option<&str>, until: Option<&str>) -> Result<DateRange> {
    let start = since.map(|d| parse_date_arg("since", d)).transpose()?;
    let end = until
        .map(|d| {
            let end = parse_date_arg("until", d)?;
            Ok::<_, anyhow::Error>(if d.contains(':') {
                end
            } else {
                end + Duration::days(1) - Duration::nanoseconds(1)
            })
        })
        .transpose()?;
    if let (Some(start), Some(end)) = (start, end) {
        if start > end {
            bail!("--since must not be after --until");
        }
    }
    Ok(DateRange::new(start, end))
}

fn parse_key_value(arg: &str) -> Result<(String, String)> {
    let (key, value) = arg
        .split_once('=')
        .ok_or_else(|| anyhow!("Expected key=value, got '{}'", arg))?;
    let key = key.trim();
    if key.is_empty() {
        bail!("Missing key in '{}'", arg);
    }
    Ok((key.to_string(), value.to_string()))
}

fn format_date(date: Option<&DateTime<Utc>>) -> String {
    date.map(|d| d.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "unscheduled".to_string())
}

fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_is_char_safe() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("Ingénieur logiciel senior", 10), "Ingénie...");
    }

    #[test]
    fn test_short_id() {
        assert_eq!(short_id("0123456789abcdef"), "01234567");
        assert_eq!(short_id("abc"), "abc");
    }

    #[test]
    fn test_parse_key_value() {
        assert_eq!(
            parse_key_value("yourName=Sam Lee").unwrap(),
            ("yourName".to_string(), "Sam Lee".to_string())
        );
        assert_eq!(parse_key_value("note=a=b").unwrap().1, "a=b");
        assert!(parse_key_value("novalue").is_err());
        assert!(parse_key_value("=x").is_err());
    }

    #[test]
    fn test_parse_date_arg() {
        let date = parse_date_arg("applied", "2024-03-05").unwrap();
        assert_eq!(date.format("%Y-%m-%d").to_string(), "2024-03-05");
        assert!(parse_date_arg("at", "2024-05-01 14:30").is_ok());
        assert!(parse_date_arg("applied", "last tuesday").is_err());
    }

    #[test]
    fn test_cli_parses_import_overrides() {
        let cli = Cli::try_parse_from([
            "thrive", "--db", "/tmp/t.db", "import", "apps.csv", "--map", "Employer=companyName", "--map", "ID=",
            "--commit",
        ])
        .unwrap();
        assert_eq!(cli.db, Some(PathBuf::from("/tmp/t.db")));
        match cli.command {
            Commands::Import { mappings, commit, .. } => {
                assert_eq!(mappings, vec!["Employer=companyName", "ID="]);
                assert!(commit);
            }
            _ => panic!("expected import"),
        }
    }

    #[test]
    fn test_cli_parses_status_values() {
        let cli = Cli::try_parse_from(["thrive", "list", "--status", "applied,Interviewing"]).unwrap();
        match cli.command {
            Commands::List { status, .. } => {
                assert_eq!(status, vec![ApplicationStatus::Applied, ApplicationStatus::Interviewing]);
            }
            _ => panic!("expected list"),
        }
        assert!(Cli::try_parse_from(["thrive", "status", "abc", "ghosted"]).is_err());
    }

    fn exec(store: &Store, args: &[&str]) -> Result<()> {
        let cli = Cli::try_parse_from(std::iter::once("thrive").chain(args.iter().copied()))?;
        run(cli.command, &Config::default(), store)
    }

    fn initialized_store(dir: &tempfile::TempDir) -> Store {
        let store = Store::new(dir.path().join("thrive.db"));
        exec(&store, &["init"]).unwrap();
        store
    }

    #[test]
    fn test_parse_range_args() {
        let range = parse_range_args(Some("2024-03-01"), Some("2024-03-31")).unwrap();
        assert_eq!(range.start.unwrap().format("%Y-%m-%d %H:%M").to_string(), "2024-03-01 00:00");
        let end = range.end.unwrap();
        assert_eq!(end.format("%Y-%m-%d %H:%M:%S").to_string(), "2024-03-31 23:59:59");
        assert!(range.contains(Some(parse_date_arg("x", "2024-03-31 18:00").unwrap())));

        let range = parse_range_args(None, Some("2024-03-31 12:00")).unwrap();
        assert_eq!(range.end.unwrap().format("%H:%M").to_string(), "12:00");
        assert!(range.start.is_none());

        assert!(!parse_range_args(None, None).unwrap().is_set());
        assert!(parse_range_args(Some("2024-04-01"), Some("2024-03-01")).is_err());
        assert!(parse_range_args(Some("someday"), None).is_err());
    }

    #[test]
    fn test_cli_parses_list_filters() {
        let cli = Cli::try_parse_from([
            "thrive", "list", "--priority", "high,medium", "--tag", "rust", "--tag", "remote", "--work-type",
            "remote,hybrid", "--employment-type", "full-time", "--since", "2024-01-01",
        ])
        .unwrap();
        match cli.command {
            Commands::List {
                priority,
                tags,
                work_type,
                employment_type,
                since,
                until,
                ..
            } => {
                assert_eq!(priority, vec![Priority::High, Priority::Medium]);
                assert_eq!(tags, vec!["rust", "remote"]);
                assert_eq!(work_type, vec![WorkType::Remote, WorkType::Hybrid]);
                assert_eq!(employment_type, vec![EmploymentType::FullTime]);
                assert_eq!(since.as_deref(), Some("2024-01-01"));
                assert!(until.is_none());
            }
            _ => panic!("expected list"),
        }
    }

    #[test]
    fn test_cli_parses_interview_commands() {
        let cli = Cli::try_parse_from([
            "thrive", "interview", "list", "--type", "technical,final", "--status", "scheduled", "--search", "acme",
        ])
        .unwrap();
        match cli.command {
            Commands::Interview {
                command: InterviewCommands::List { app, kinds, status, search, .. },
            } => {
                assert!(app.is_none());
                assert_eq!(kinds, vec![InterviewType::Technical, InterviewType::Final]);
                assert_eq!(status, vec![InterviewStatus::Scheduled]);
                assert_eq!(search.as_deref(), Some("acme"));
            }
            _ => panic!("expected interview list"),
        }

        let cli = Cli::try_parse_from([
            "thrive", "interview", "update", "1a2b", "--status", "completed", "--result", "passed",
        ])
        .unwrap();
        match cli.command {
            Commands::Interview {
                command: InterviewCommands::Update { id, status, result, .. },
            } => {
                assert_eq!(id, "1a2b");
                assert_eq!(status, Some(InterviewStatus::Completed));
                assert_eq!(result, Some(InterviewResult::Passed));
            }
            _ => panic!("expected interview update"),
        }
    }

    #[test]
    fn test_commands_without_database_leave_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("thrive.db");
        let store = Store::new(path.clone());

        exec(&store, &["template", "list"]).unwrap();
        exec(&store, &["template", "show", "thank you email"]).unwrap();
        exec(
            &store,
            &[
                "template", "render", "Thank You Email", "--set", "position=Engineer", "--set", "company=Acme",
                "--set", "interviewer=Sam", "--set", "yourName=Alex",
            ],
        )
        .unwrap();
        assert!(exec(&store, &["edit", "abcd"]).is_err());

        assert!(!path.exists());
        assert!(store.db.get().is_none());
    }

    #[test]
    fn test_uninitialized_database_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(dir.path().join("thrive.db"));
        let err = exec(&store, &["list"]).unwrap_err();
        assert!(err.to_string().contains("thrive init"));
    }

    #[test]
    fn test_edit_updates_fields_and_timestamp() {
        let dir = tempfile::tempdir().unwrap();
        let store = initialized_store(&dir);
        exec(
            &store,
            &["add", "-c", "Acme", "-p", "Engineer", "--location", "NYC", "--notes", "Referred by Sam"],
        )
        .unwrap();
        let original = store.get().unwrap().applications().list().unwrap().remove(0);

        exec(
            &store,
            &[
                "edit", &original.id[..8], "--position", "Senior Engineer", "--location=", "--tag", "rust", "--tag",
                "remote", "--salary-min", "150000", "--work-type", "remote",
            ],
        )
        .unwrap();

        let edited = store.get().unwrap().applications().get(&original.id).unwrap().unwrap();
        assert_eq!(edited.position, "Senior Engineer");
        assert_eq!(edited.company_name, "Acme");
        assert_eq!(edited.location, None);
        assert_eq!(edited.notes.as_deref(), Some("Referred by Sam"));
        assert_eq!(edited.tags, vec!["rust", "remote"]);
        assert_eq!(edited.work_type, Some(WorkType::Remote));
        assert_eq!(edited.salary.as_ref().and_then(|s| s.min), Some(150000));
        assert!(edited.updated_at >= original.updated_at);
        assert_eq!(edited.created_at, original.created_at);

        assert!(exec(&store, &["edit", &original.id[..8]]).is_err());
        assert!(exec(&store, &["edit", "zzzz", "--notes", "x"]).is_err());
    }

    #[test]
    fn test_edit_company_registers_new_company() {
        let dir = tempfile::tempdir().unwrap();
        let store = initialized_store(&dir);
        exec(&store, &["add", "-c", "Acme", "-p", "Engineer"]).unwrap();
        let app = store.get().unwrap().applications().list().unwrap().remove(0);

        exec(&store, &["edit", &app.id, "--company", "Globex"]).unwrap();
        let db = store.get().unwrap();
        assert_eq!(db.applications().get(&app.id).unwrap().unwrap().company_name, "Globex");
        assert!(db.get_company_by_name("globex").unwrap().is_some());
    }

    #[test]
    fn test_interview_update_records_outcome() {
        let dir = tempfile::tempdir().unwrap();
        let store = initialized_store(&dir);
        exec(&store, &["add", "-c", "Acme", "-p", "Engineer", "-s", "applied"]).unwrap();
        let app = store.get().unwrap().applications().list().unwrap().remove(0);
        exec(&store, &["interview", "add", &app.id[..8], "-t", "technical", "--at", "2024-06-01 10:00"]).unwrap();
        let interview = store.get().unwrap().interviews().list().unwrap().remove(0);

        exec(
            &store,
            &[
                "interview", "update", &interview.id[..8], "--status", "completed", "--result", "passed",
                "--feedback", "Strong on systems design",
            ],
        )
        .unwrap();
        let updated = store.get().unwrap().interviews().get(&interview.id).unwrap().unwrap();
        assert_eq!(updated.status, InterviewStatus::Completed);
        assert_eq!(updated.result, Some(InterviewResult::Passed));
        assert_eq!(updated.feedback.as_deref(), Some("Strong on systems design"));
        assert_eq!(updated.scheduled_at, interview.scheduled_at);

        exec(&store, &["interview", "update", &interview.id, "--at", "2024-06-03 15:00"]).unwrap();
        let moved = store.get().unwrap().interviews().get(&interview.id).unwrap().unwrap();
        assert_eq!(moved.scheduled_at, Some(parse_date_arg("at", "2024-06-03 15:00").unwrap()));

        assert!(exec(&store, &["interview", "update", &interview.id]).is_err());
        exec(&store, &["interview", "list", "--status", "completed", "--since", "2024-06-01"]).unwrap();
    }

    #[test]
    fn test_contact_and_document_commands() {
        let dir = tempfile::tempdir().unwrap();
        let store = initialized_store(&dir);
        exec(&store, &["add", "-c", "Acme", "-p", "Engineer"]).unwrap();
        exec(&store, &["add", "-c", "Globex", "-p", "Developer"]).unwrap();
        let apps = store.get().unwrap().applications().list().unwrap();
        let (acme, globex) = if apps[0].company_name == "Acme" {
            (&apps[0], &apps[1])
        } else {
            (&apps[1], &apps[0])
        };

        exec(
            &store,
            &["contact", "add", "Jane Roe", "--company", "acme", "-r", "recruiter", "--email", "jane@acme.io"],
        )
        .unwrap();
        let db = store.get().unwrap();
        let contacts = db.contacts_for_company("Acme").unwrap();
        assert_eq!(contacts.len(), 1);
        assert_eq!(contacts[0].relationship, Some(ContactRelationship::Recruiter));
        assert_eq!(contacts[0].company_name.as_deref(), Some("Acme"));
        assert_eq!(db.companies().count().unwrap(), 2);
        assert!(exec(&store, &["contact", "add", "Bob", "-r", "friend"]).is_err());

        exec(&store, &["document", "add", "Resume 2024", "-t", "resume", "--app", &acme.id[..8]]).unwrap();
        let document = db.documents().list().unwrap().remove(0);
        assert_eq!(document.application_id.as_deref(), Some(acme.id.as_str()));

        exec(&store, &["document", "use", &document.id[..8], &globex.id[..8]]).unwrap();
        exec(&store, &["document", "use", &document.id[..8], &globex.id[..8]]).unwrap();
        let document = db.documents().get(&document.id).unwrap().unwrap();
        assert_eq!(document.used_in_application_ids, vec![acme.id.clone(), globex.id.clone()]);
        assert_eq!(db.documents_for_application(&globex.id).unwrap().len(), 1);
        exec(&store, &["document", "list", "--type", "resume,cv"]).unwrap();
        exec(&store, &["show", &globex.id[..8]]).unwrap();

        exec(&store, &["contact", "delete", &contacts[0].id[..8]]).unwrap();
        exec(&store, &["document", "delete", &document.id]).unwrap();
        assert_eq!(db.contacts().count().unwrap(), 0);
        assert_eq!(db.documents().count().unwrap(), 0);
    }

    #[test]
    fn test_clear_removes_contacts_and_documents() {
        let dir = tempfile::tempdir().unwrap();
        let store = initialized_store(&dir);
        exec(&store, &["add", "-c", "Acme", "-p", "Engineer"]).unwrap();
        let app = store.get().unwrap().applications().list().unwrap().remove(0);
        exec(&store, &["contact", "add", "Jane Roe", "--company", "Acme"]).unwrap();
        exec(&store, &["document", "add", "CV", "-t", "cv", "--app", &app.id]).unwrap();

        assert!(exec(&store, &["clear"]).is_err());
        exec(&store, &["clear", "--yes"]).unwrap();
        let db = store.get().unwrap();
        assert_eq!(db.applications().count().unwrap(), 0);
        assert_eq!(db.companies().count().unwrap(), 0);
        assert_eq!(db.contacts().count().unwrap(), 0);
        assert_eq!(db.documents().count().unwrap(), 0);
    }

    #[test]
    fn test_stats_accepts_period() {
        let dir = tempfile::tempdir().unwrap();
        let store = initialized_store(&dir);
        exec(&store, &["add", "-c", "Acme", "-p", "Engineer", "-s", "rejected", "--applied", "2024-02-10"]).unwrap();
        exec(&store, &["stats", "--since", "2024-01-01", "--until", "2024-03-31"]).unwrap();
        exec(&store, &["stats", "--months", "3"]).unwrap();
        assert!(exec(&store, &["stats", "--since", "2024-04-01", "--until", "2024-03-01"]).is_err());
    }
}
