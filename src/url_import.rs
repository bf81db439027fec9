//! Pulls job details out of a posting page: meta tags, JSON-LD `JobPosting`,
//! job-board selectors, then generic selectors and regex fallbacks.

use anyhow::{anyhow, bail, Context, Result};
use regex::Regex;
use reqwest::Url;
use scraper::{Html, Selector};
use serde_json::Value;
use std::sync::LazyLock;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::models::{Application, ApplicationStatus, EmploymentType, SalaryRange, WorkType};

const HOURS_PER_YEAR: f64 = 2080.0;
const MAX_DESCRIPTION_CHARS: usize = 5000;
const USER_AGENT: &str = concat!("thrive/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedJobData {
    pub position: Option<String>,
    pub company_name: Option<String>,
    pub location: Option<String>,
    pub work_type: Option<WorkType>,
    pub employment_type: Option<EmploymentType>,
    pub salary_min: Option<i64>,
    pub salary_max: Option<i64>,
    pub salary_currency: Option<String>,
    pub job_description: Option<String>,
    pub job_url: String,
    pub source: String,
}

impl ExtractedJobData {
    fn for_url(url: &str) -> Self {
        Self {
            job_url: url.to_string(),
            source: source_from_url(url),
            ..Default::default()
        }
    }

    /// A new `target` application. Position and company are required.
    pub fn to_application(&self, default_currency: &str) -> Result<Application> {
        let position = self
            .position
            .as_deref()
            .ok_or_else(|| anyhow!("Could not find a job title on {}", self.job_url))?;
        let company = self
            .company_name
            .as_deref()
            .ok_or_else(|| anyhow!("Could not find a company name on {}", self.job_url))?;

        let mut app = Application::new(company, position, ApplicationStatus::Target);
        app.location = self.location.clone();
        app.work_type = self.work_type;
        app.employment_type = self.employment_type;
        app.job_url = Some(self.job_url.clone());
        app.job_description = self.job_description.clone();
        app.source = Some(self.source.clone());
        if self.salary_min.is_some() || self.salary_max.is_some() {
            app.salary = Some(SalaryRange {
                min: self.salary_min,
                max: self.salary_max,
                currency: self
                    .salary_currency
                    .clone()
                    .unwrap_or_else(|| default_currency.to_string()),
                period: None,
            });
        }
        Ok(app)
    }
}

struct JobBoard {
    domain: &'static str,
    name: &'static str,
    title: &'static [&'static str],
    company: &'static [&'static str],
    location: &'static [&'static str],
    salary: &'static [&'static str],
    description: &'static [&'static str],
}

const JOB_BOARDS: &[JobBoard] = &[
    JobBoard {
        domain: "github.careers",
        name: "GitHub",
        title: &["h1", ".job-title", "[class*=\"title\"]"],
        company: &[".company-name"],
        location: &["[class*=\"location\"]", ".location"],
        salary: &["[class*=\"salary\"]", "[class*=\"compensation\"]"],
        description: &[".job-description", "[class*=\"description\"]", "#job-description"],
    },
    JobBoard {
        domain: "icims.com",
        name: "iCIMS",
        title: &["h1", ".iCIMS_Header", ".job-title"],
        company: &[".iCIMS_CompanyName", ".company-name"],
        location: &[".iCIMS_JobLocation", ".location"],
        salary: &[],
        description: &[".iCIMS_JobContent", ".job-description"],
    },
    JobBoard {
        domain: "linkedin.com",
        name: "LinkedIn",
        title: &[".top-card-layout__title", ".job-details-jobs-unified-top-card__job-title", "h1"],
        company: &[".topcard__org-name-link", ".job-details-jobs-unified-top-card__company-name", ".topcard__flavor"],
        location: &[".topcard__flavor--bullet", ".job-details-jobs-unified-top-card__bullet"],
        salary: &[],
        description: &[".description__text", ".jobs-description__content"],
    },
    JobBoard {
        domain: "indeed.com",
        name: "Indeed",
        title: &[".jobsearch-JobInfoHeader-title", "[data-testid=\"jobsearch-JobInfoHeader-title\"]", "h1"],
        company: &[".jobsearch-CompanyInfoContainer", "[data-testid=\"inlineHeader-companyName\"]", ".companyName"],
        location: &[".jobsearch-JobInfoHeader-subtitle", "[data-testid=\"job-location\"]", ".companyLocation"],
        salary: &["[data-testid=\"attribute_snippet_testid\"]", ".salary-snippet-container"],
        description: &["#jobDescriptionText", ".jobsearch-jobDescriptionText"],
    },
    JobBoard {
        domain: "glassdoor.com",
        name: "Glassdoor",
        title: &[".job-title", "[data-test=\"job-title\"]", "h1"],
        company: &[".employer-name", "[data-test=\"employer-name\"]"],
        location: &[".location", "[data-test=\"emp-location\"]"],
        salary: &[".salary-estimate", "[data-test=\"detailSalary\"]"],
        description: &[".jobDescriptionContent", "[data-test=\"description\"]"],
    },
    JobBoard {
        domain: "greenhouse.io",
        name: "Greenhouse",
        title: &[".app-title", ".job-title", "h1"],
        company: &[".company-name", ".heading"],
        location: &[".location", ".job-location"],
        salary: &[],
        description: &["#content", ".job-description", "#job_description"],
    },
    JobBoard {
        domain: "lever.co",
        name: "Lever",
        title: &[".posting-headline h2", ".posting-title"],
        company: &[".company-name"],
        location: &[".location", ".posting-categories .sort-by-time"],
        salary: &[],
        description: &[".posting-page .section-wrapper", ".posting-description"],
    },
    JobBoard {
        domain: "workday.com",
        name: "Workday",
        title: &["[data-automation-id=\"jobPostingHeader\"]", ".job-title", "h1"],
        company: &[".company-name"],
        location: &["[data-automation-id=\"locations\"]", ".location"],
        salary: &[],
        description: &["[data-automation-id=\"jobPostingDescription\"]", ".job-description"],
    },
    JobBoard {
        domain: "monster.com",
        name: "Monster",
        title: &[".job-title", "h1"],
        company: &[".company-name", ".company"],
        location: &[".location", ".job-location"],
        salary: &[],
        description: &["#JobDescription", ".job-description"],
    },
    JobBoard {
        domain: "ziprecruiter.com",
        name: "ZipRecruiter",
        title: &[".job_title", "h1"],
        company: &[".hiring_company", ".company_name"],
        location: &[".location", ".job_location"],
        salary: &[],
        description: &[".jobDescriptionSection", ".job_description"],
    },
];

const GENERIC_TITLE: &[&str] = &["h1", ".job-title", "[class*=\"job-title\"]", "[class*=\"position\"]"];
const GENERIC_COMPANY: &[&str] = &[".company-name", "[class*=\"company\"]", "[class*=\"employer\"]"];
const GENERIC_LOCATION: &[&str] = &[".location", "[class*=\"location\"]", "[class*=\"address\"]"];
const GENERIC_DESCRIPTION: &[&str] = &[".job-description", "[class*=\"description\"]", ".content", "article"];

const LOCATION_WORDS: &[&str] = &[
    "united states",
    "usa",
    "uk",
    "canada",
    "remote",
    "california",
    "new york",
    "texas",
    "florida",
    "germany",
    "india",
    "australia",
];

static RANGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+(?:\.\d+)?)\s*(k)?\s*(?:-|to|–|—)\s*(?:usd\s*)?(\d+(?:\.\d+)?)\s*(k)?")
        .expect("salary range pattern is valid")
});
static NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+(?:\.\d+)?)(k)?").expect("number pattern is valid"));
static CAD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)c\s*\$").expect("pattern is valid"));
static AUD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)a\s*\$").expect("pattern is valid"));
static PAGE_SALARY_RE: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)(?:salary|compensation|pay)(?:\s*range)?[:\s]*\$?\s*[\d,]+(?:\.\d+)?\s*(?:-|to|–|—)\s*\$?\s*[\d,]+(?:\.\d+)?",
        r"\$\s*[\d,]+(?:\.\d+)?\s*(?:-|to|–|—)\s*\$?\s*[\d,]+(?:\.\d+)?(?:\s*(?:/yr|/year|/hr|/hour|an hour|per hour))?",
        r"USD\s*\$?\s*[\d,]+(?:\.\d+)?\s*(?:-|to|–|—)\s*(?:USD)?\s*\$?\s*[\d,]+(?:\.\d+)?",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("salary pattern is valid"))
    .collect()
});
static REMOTE_YES_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)remote\s*:\s*yes|\bremote,\s*\w").expect("pattern is valid"));
static EXPLICIT_EMPLOYMENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:employment|job)\s*type[:\s]*(full[\s-]?time|part[\s-]?time|contract|intern)")
        .expect("pattern is valid")
});
static FULL_TIME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bfull[\s-]?time\b").expect("pattern is valid"));
static PART_TIME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bpart[\s-]?time\b").expect("pattern is valid"));
static CONTRACT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:contract(?:or)?|freelance)\b").expect("pattern is valid"));
static INTERN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:internship|intern)\b").expect("pattern is valid"));
static JOB_PATH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"/(?:jobs?|careers?|positions?|openings?|opportunit(?:y|ies)|hiring)/|/apply|/vacancy|/recruitment")
        .expect("pattern is valid")
});
static TITLE_SPLIT_RE: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [r"^(.+?)\s*\|\s*(.+)$", r"(?i)^(.+?)\s+(?:at|@)\s+(.+)$", r"^(.+?)\s+[-–—]\s+(.+)$"]
        .iter()
        .map(|p| Regex::new(p).expect("title pattern is valid"))
        .collect()
});
static TITLE_LOCATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(.+?)\s+in\s+([\w\s]+)$").expect("pattern is valid"));
static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("pattern is valid"));

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedSalary {
    pub min: Option<i64>,
    pub max: Option<i64>,
    pub currency: Option<String>,
}

fn detect_currency(text: &str) -> &'static str {
    let lower = text.to_lowercase();
    if lower.contains('£') || lower.contains("gbp") {
        "GBP"
    } else if lower.contains('€') || lower.contains("eur") {
        "EUR"
    } else if lower.contains("cad") || CAD_RE.is_match(text) {
        "CAD"
    } else if lower.contains("aud") || AUD_RE.is_match(text) {
        "AUD"
    } else {
        "USD"
    }
}

/// Reads a salary range out of free text: "$120k - $150k", "45 to 60 per hour",
/// "£50,000". Hourly figures are annualised at 2080 hours.
pub fn parse_salary(text: &str) -> ParsedSalary {
    if text.trim().is_empty() {
        return ParsedSalary::default();
    }

    let currency = detect_currency(text);
    let clean: String = text
        .chars()
        .filter(|c| !matches!(c, ',' | '$' | '£' | '€'))
        .collect::<String>()
        .to_lowercase();

    let hourly = clean.contains("hour") || clean.contains("/hr") || clean.contains("per hr");
    let multiplier = if hourly { HOURS_PER_YEAR } else { 1.0 };
    let scale = |value: f64| (value * multiplier).round() as i64;

    let (min, max) = if let Some(caps) = RANGE_RE.captures(&clean) {
        let low: f64 = caps[1].parse().unwrap_or_default();
        let high: f64 = caps[3].parse().unwrap_or_default();
        let low_k = caps.get(2).is_some();
        let high_k = caps.get(4).is_some();
        // "120-150k" means both ends are in thousands
        let low_k = low_k || (high_k && low < 1000.0);
        (
            if low_k { low * 1000.0 } else { low },
            if high_k { high * 1000.0 } else { high },
        )
    } else {
        let numbers: Vec<f64> = NUMBER_RE
            .captures_iter(&clean)
            .filter_map(|caps| {
                let value: f64 = caps[1].parse().ok()?;
                Some(if caps.get(2).is_some() { value * 1000.0 } else { value })
            })
            .collect();
        match numbers.as_slice() {
            [] => return ParsedSalary::default(),
            [only] => (*only, *only),
            [first, second, ..] => (*first, *second),
        }
    };

    ParsedSalary {
        min: Some(scale(min)),
        max: Some(scale(max)),
        currency: Some(currency.to_string()),
    }
}

pub fn detect_work_type(text: &str) -> Option<WorkType> {
    let lower = text.to_lowercase();
    let has = |needle: &str| lower.contains(needle);

    if has("fully remote") || has("100% remote") || has("work from home") || has("remote-first")
        || REMOTE_YES_RE.is_match(text)
    {
        Some(WorkType::Remote)
    } else if has("hybrid") || has("flexible location") {
        Some(WorkType::Hybrid)
    } else if has("on-site") || has("onsite") || has("in-office") || has("in office") {
        Some(WorkType::Onsite)
    } else if has("remote") {
        Some(WorkType::Remote)
    } else {
        None
    }
}

fn head(text: &str, chars: usize) -> String {
    text.chars().take(chars).collect()
}

/// Explicit "Employment Type: ..." labels win over loose mentions.
pub fn detect_employment_type(text: &str) -> Option<EmploymentType> {
    let text = text.replace('_', " ");

    if let Some(caps) = EXPLICIT_EMPLOYMENT_RE.captures(&text) {
        let label = caps[1].to_lowercase();
        return Some(if label.starts_with("full") {
            EmploymentType::FullTime
        } else if label.starts_with("part") {
            EmploymentType::PartTime
        } else if label.starts_with("contract") {
            EmploymentType::Contract
        } else {
            EmploymentType::Internship
        });
    }

    let opening = head(&text, 500);
    if FULL_TIME_RE.is_match(&text) && !opening.to_lowercase().contains("internship") {
        return Some(EmploymentType::FullTime);
    }
    if PART_TIME_RE.is_match(&text) {
        return Some(EmploymentType::PartTime);
    }
    if CONTRACT_RE.is_match(&text) && !FULL_TIME_RE.is_match(&opening) {
        return Some(EmploymentType::Contract);
    }

    // Only the header area counts, and not when it's a requirement like "internship experience"
    let header = head(&text, 300);
    if let Some(m) = INTERN_RE.find(&header) {
        let rest = header[m.end()..].to_lowercase();
        if !rest.contains("experience") && !rest.contains("qualif") {
            return Some(EmploymentType::Internship);
        }
    }
    None
}

fn board_for(url: &str) -> Option<&'static JobBoard> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?.to_lowercase();
    JOB_BOARDS.iter().find(|board| host.contains(board.domain))
}

/// Friendly source name: the job board's name, else the capitalised domain.
pub fn source_from_url(url: &str) -> String {
    if let Some(board) = board_for(url) {
        return board.name.to_string();
    }
    let Some(host) = Url::parse(url).ok().and_then(|u| u.host_str().map(str::to_lowercase)) else {
        return "Web".to_string();
    };
    let host = host.strip_prefix("www.").unwrap_or(&host);
    let first = host.split('.').next().unwrap_or_default();
    let mut chars = first.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().chain(chars).collect(),
        None => "Web".to_string(),
    }
}

pub fn is_likely_job_url(url: &str) -> bool {
    let Ok(parsed) = Url::parse(url) else {
        return false;
    };
    if board_for(url).is_some() {
        return true;
    }
    JOB_PATH_RE.is_match(&parsed.path().to_lowercase())
}

fn collapse_whitespace(text: &str) -> String {
    WHITESPACE_RE.replace_all(text, " ").trim().to_string()
}

fn element_text(element: scraper::ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<Vec<_>>().join(" "))
}

fn select_text(document: &Html, selectors: &[&str]) -> Option<String> {
    selectors.iter().find_map(|selector| {
        let selector = Selector::parse(selector).ok()?;
        document
            .select(&selector)
            .map(element_text)
            .find(|text| !text.is_empty())
    })
}

fn meta_content(document: &Html, selectors: &[&str]) -> Option<String> {
    selectors.iter().find_map(|selector| {
        let selector = Selector::parse(selector).ok()?;
        document
            .select(&selector)
            .filter_map(|el| el.value().attr("content"))
            .map(str::trim)
            .find(|content| !content.is_empty())
            .map(str::to_string)
    })
}

fn html_to_text(fragment: &str) -> String {
    let parsed = Html::parse_fragment(fragment);
    collapse_whitespace(&parsed.root_element().text().collect::<Vec<_>>().join(" "))
}

/// "Engineer | Acme", "Engineer at Acme", "Engineer - Acme" into title and company.
fn split_title_company(text: &str) -> Option<(String, String)> {
    TITLE_SPLIT_RE.iter().find_map(|re| {
        let caps = re.captures(text)?;
        let title = caps[1].trim();
        // Drop trailing segments like "Acme | Careers"
        let company = caps[2]
            .split(" | ")
            .next()
            .and_then(|c| c.split(" - ").next())
            .unwrap_or_default()
            .trim();
        (title.chars().count() > 2 && company.chars().count() > 1)
            .then(|| (title.to_string(), company.to_string()))
    })
}

/// "Engineer in United States" into title and location.
fn split_title_location(text: &str) -> Option<(String, String)> {
    let caps = TITLE_LOCATION_RE.captures(text)?;
    let location = caps[2].trim();
    let lower = location.to_lowercase();
    LOCATION_WORDS
        .iter()
        .any(|word| lower.contains(word))
        .then(|| (caps[1].trim().to_string(), location.to_string()))
}

fn json_number(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_f64().map(|f| f.round() as i64),
        Value::String(s) => s.replace(',', "").trim().parse::<f64>().ok().map(|f| f.round() as i64),
        _ => None,
    }
}

fn json_str(value: &Value) -> Option<String> {
    value.as_str().map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
}

fn find_job_posting(value: &Value) -> Option<&Value> {
    match value {
        Value::Array(items) => items.iter().find_map(find_job_posting),
        Value::Object(map) => {
            if map.get("@type").and_then(Value::as_str) == Some("JobPosting") {
                Some(value)
            } else {
                map.get("@graph").and_then(find_job_posting)
            }
        }
        _ => None,
    }
}

fn apply_json_ld(document: &Html, data: &mut ExtractedJobData) {
    let Ok(selector) = Selector::parse(r#"script[type="application/ld+json"]"#) else {
        return;
    };

    for script in document.select(&selector) {
        let raw = script.text().collect::<String>();
        let parsed: Value = match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(e) => {
                debug!("skipping unparseable JSON-LD block: {}", e);
                continue;
            }
        };
        let Some(posting) = find_job_posting(&parsed) else {
            continue;
        };

        if data.position.is_none() {
            data.position = posting.get("title").and_then(json_str);
        }
        if data.company_name.is_none() {
            data.company_name = posting
                .pointer("/hiringOrganization/name")
                .and_then(json_str);
        }
        if data.location.is_none() {
            let location = match posting.get("jobLocation") {
                Some(Value::Array(items)) => items.first(),
                other => other,
            };
            data.location = location
                .and_then(|l| l.pointer("/address/addressLocality"))
                .and_then(json_str);
        }
        if data.job_description.is_none() {
            data.job_description = posting
                .get("description")
                .and_then(Value::as_str)
                .map(html_to_text)
                .filter(|d| !d.is_empty());
        }

        if let Some(salary) = posting.get("baseSalary") {
            data.salary_currency = salary.get("currency").and_then(json_str);
            match salary.get("value") {
                Some(Value::Object(range)) => {
                    let single = range.get("value").and_then(json_number);
                    data.salary_min = range.get("minValue").and_then(json_number).or(single);
                    data.salary_max = range.get("maxValue").and_then(json_number).or(single);
                }
                Some(value) => {
                    data.salary_min = json_number(value);
                    data.salary_max = data.salary_min;
                }
                None => {}
            }
        }

        let employment = match posting.get("employmentType") {
            Some(Value::Array(items)) => items.first().and_then(Value::as_str),
            Some(value) => value.as_str(),
            None => None,
        };
        if let Some(kind) = employment {
            data.employment_type = detect_employment_type(kind);
        }

        if posting.get("jobLocationType").and_then(Value::as_str) == Some("TELECOMMUTE") {
            data.work_type = Some(WorkType::Remote);
        }
    }
}

/// Extracts everything it can from a fetched page. Never fails; fields that
/// can't be found stay `None`.
pub fn extract_job_data(html: &str, url: &str) -> ExtractedJobData {
    let document = Html::parse_document(html);
    let mut data = ExtractedJobData::for_url(url);

    data.position = meta_content(
        &document,
        &[r#"meta[property="og:title"]"#, r#"meta[name="twitter:title"]"#, r#"meta[name="title"]"#],
    );
    data.company_name = meta_content(&document, &[r#"meta[property="og:site_name"]"#, r#"meta[name="author"]"#]);
    data.job_description = meta_content(
        &document,
        &[
            r#"meta[property="og:description"]"#,
            r#"meta[name="description"]"#,
            r#"meta[name="twitter:description"]"#,
        ],
    );

    apply_json_ld(&document, &mut data);

    if data.position.is_none() {
        data.position = select_text(&document, &["title"]);
    }

    if let Some(board) = board_for(url) {
        debug!("using {} selectors", board.name);
        if data.position.is_none() {
            data.position = select_text(&document, board.title);
        }
        if data.company_name.is_none() {
            data.company_name = select_text(&document, board.company);
        }
        if data.location.is_none() {
            data.location = select_text(&document, board.location);
        }
        if data.salary_min.is_none() {
            if let Some(text) = select_text(&document, board.salary) {
                let salary = parse_salary(&text);
                data.salary_min = salary.min;
                data.salary_max = salary.max;
                data.salary_currency = salary.currency;
            }
        }
        if data.job_description.is_none() {
            data.job_description = select_text(&document, board.description);
        }
    }

    if data.position.is_none() {
        data.position = select_text(&document, GENERIC_TITLE);
    }
    if data.company_name.is_none() {
        data.company_name = select_text(&document, GENERIC_COMPANY);
    }
    if data.location.is_none() {
        data.location = select_text(&document, GENERIC_LOCATION);
    }
    if data.job_description.is_none() {
        data.job_description = select_text(&document, GENERIC_DESCRIPTION);
    }

    let page_text = element_text(document.root_element());

    if data.salary_min.is_none() {
        for re in PAGE_SALARY_RE.iter() {
            if let Some(m) = re.find(&page_text) {
                let salary = parse_salary(m.as_str());
                if salary.min.is_some() && salary.max.is_some() {
                    data.salary_min = salary.min;
                    data.salary_max = salary.max;
                    data.salary_currency = salary.currency;
                    break;
                }
            }
        }
    }

    if data.company_name.is_some() && data.company_name == data.position {
        data.company_name = None;
    }
    if let Some(position) = data.position.clone() {
        if let Some((title, company)) = split_title_company(&position) {
            data.position = Some(title);
            data.company_name.get_or_insert(company);
        }
    }
    if let Some(position) = data.position.clone() {
        if let Some((title, location)) = split_title_location(&position) {
            data.position = Some(title);
            let unavailable = data
                .location
                .as_deref()
                .is_none_or(|l| l.eq_ignore_ascii_case("unavailable"));
            if unavailable {
                data.location = Some(location);
            }
        }
    }

    let full_text = [
        data.position.as_deref(),
        data.location.as_deref(),
        data.job_description.as_deref(),
        Some(page_text.as_str()),
    ]
    .into_iter()
    .flatten()
    .collect::<Vec<_>>()
    .join(" ");

    if data.work_type.is_none() {
        data.work_type = detect_work_type(&full_text);
    }
    if data.employment_type.is_none() {
        data.employment_type = detect_employment_type(&full_text);
    }

    data.job_description = data
        .job_description
        .map(|d| head(&collapse_whitespace(&d), MAX_DESCRIPTION_CHARS))
        .filter(|d| !d.is_empty());

    data
}

/// Downloads and extracts a posting. Network failures degrade to the bare URL
/// and source; only a malformed URL is an error.
pub fn fetch_job(url: &str) -> Result<ExtractedJobData> {
    if Url::parse(url).is_err() {
        bail!("Invalid URL format: {}", url);
    }
    if !is_likely_job_url(url) {
        warn!("{} doesn't look like a job posting URL", url);
    }

    let client = reqwest::blocking::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(20))
        .build()
        .context("Failed to build HTTP client")?;

    let response = client
        .get(url)
        .header(
            reqwest::header::ACCEPT,
            "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
        )
        .send()
        .and_then(|r| r.error_for_status())
        .and_then(|r| r.text());

    match response {
        Ok(html) => {
            let data = extract_job_data(&html, url);
            info!(
                "extracted {} fields from {}",
                [data.position.is_some(), data.company_name.is_some(), data.location.is_some()]
                    .iter()
                    .filter(|found| **found)
                    .count(),
                url
            );
            Ok(data)
        }
        Err(e) => {
            warn!("failed to fetch {}: {}", url, e);
            Ok(ExtractedJobData::for_url(url))
        }
    }
}
