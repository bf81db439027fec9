//! `{{variable}}` templates for application letters and follow-up emails.

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::LazyLock;
use thiserror::Error;

use crate::models::{string_enum, Application};

static VARIABLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{(\w+)\}\}").expect("variable pattern is valid"));

string_enum!(TemplateCategory, "template category" {
    Application => "application",
    Email => "email",
    CoverLetter => "cover-letter",
    Note => "note",
    Other => "other",
});

string_enum!(VariableType, "variable type" {
    Text => "text",
    Date => "date",
    Company => "company",
    Position => "position",
    Name => "name",
    Custom => "custom",
});

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateVariable {
    pub key: String,
    pub label: String,
    #[serde(rename = "type")]
    pub kind: VariableType,
    #[serde(default)]
    pub default_value: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub placeholder: Option<String>,
}

impl TemplateVariable {
    fn new(key: &str, label: &str, kind: VariableType, required: bool) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            kind,
            default_value: None,
            required,
            placeholder: None,
        }
    }

    fn with_default(mut self, value: &str) -> Self {
        self.default_value = Some(value.to_string());
        self
    }

    fn with_placeholder(mut self, value: &str) -> Self {
        self.placeholder = Some(value.to_string());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub category: TemplateCategory,
    pub content: String,
    #[serde(default)]
    pub variables: Vec<TemplateVariable>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub is_default: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedTemplate {
    pub content: String,
    pub variables: BTreeMap<String, String>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemplateError {
    #[error("Missing required template values: {}", .0.join(", "))]
    MissingRequired(Vec<String>),
    #[error("Template '{0}' not found")]
    NotFound(String),
}

/// Unique variable names in order of first appearance.
pub fn extract_variables(content: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    VARIABLE_RE
        .captures_iter(content)
        .map(|caps| caps[1].to_string())
        .filter(|key| seen.insert(key.clone()))
        .collect()
}

fn capitalize(key: &str) -> String {
    let mut chars = key.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

impl Template {
    /// Declares new placeholders found in the content and drops declarations
    /// whose placeholder is gone.
    pub fn sync_variables(&mut self) {
        let detected = extract_variables(&self.content);
        let declared: HashSet<String> = self.variables.iter().map(|v| v.key.clone()).collect();

        for key in detected.iter().filter(|k| !declared.contains(*k)) {
            self.variables
                .push(TemplateVariable::new(key, &capitalize(key), VariableType::Text, false));
        }
        self.variables.retain(|v| detected.contains(&v.key));
    }

    /// Substitutes values, then declared defaults. Optional declared variables
    /// without a value render empty; undeclared placeholders without a value
    /// are left as written.
    pub fn resolve(&self, values: &HashMap<String, String>) -> Result<ResolvedTemplate, TemplateError> {
        let mut resolved: BTreeMap<String, String> = BTreeMap::new();
        let mut missing = Vec::new();

        for variable in &self.variables {
            let supplied = values
                .get(&variable.key)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty());
            let value = supplied
                .or(variable.default_value.as_deref())
                .unwrap_or_default()
                .to_string();
            if variable.required && value.is_empty() {
                missing.push(variable.key.clone());
            }
            resolved.insert(variable.key.clone(), value);
        }

        if !missing.is_empty() {
            return Err(TemplateError::MissingRequired(missing));
        }

        for (key, value) in values {
            resolved.entry(key.clone()).or_insert_with(|| value.trim().to_string());
        }

        let content = VARIABLE_RE
            .replace_all(&self.content, |caps: &Captures| match resolved.get(&caps[1]) {
                Some(value) => value.clone(),
                None => caps[0].to_string(),
            })
            .into_owned();

        Ok(ResolvedTemplate {
            content,
            variables: resolved,
        })
    }

    /// Renders placeholders (or `[Label]`) in place of every declared variable.
    pub fn preview(&self) -> String {
        let declared: HashMap<&str, &TemplateVariable> =
            self.variables.iter().map(|v| (v.key.as_str(), v)).collect();
        VARIABLE_RE
            .replace_all(&self.content, |caps: &Captures| match declared.get(&caps[1]) {
                Some(variable) => variable
                    .placeholder
                    .clone()
                    .unwrap_or_else(|| format!("[{}]", variable.label)),
                None => caps[0].to_string(),
            })
            .into_owned()
    }
}

/// Values a template can take straight from a tracked application.
pub fn application_context(app: &Application) -> HashMap<String, String> {
    let mut values = HashMap::new();
    values.insert("company".to_string(), app.company_name.clone());
    values.insert("position".to_string(), app.position.clone());
    if let Some(applied) = app.applied_date {
        values.insert(
            "applicationDate".to_string(),
            applied.format("%B %-d, %Y").to_string(),
        );
    }
    if let Some(location) = &app.location {
        values.insert("location".to_string(), location.clone());
    }
    if let Some(referral) = &app.referral_name {
        values.insert("referralName".to_string(), referral.clone());
    }
    values
}

pub fn find_template<'a>(templates: &'a [Template], name: &str) -> Result<&'a Template, TemplateError> {
    templates
        .iter()
        .find(|t| t.name.eq_ignore_ascii_case(name.trim()))
        .ok_or_else(|| TemplateError::NotFound(name.to_string()))
}

pub fn default_templates() -> Vec<Template> {
    vec![
        Template {
            name: "Software Engineer Application".to_string(),
            description: Some("Standard application for software engineering positions".to_string()),
            category: TemplateCategory::Application,
            content: "Application for {{position}} at {{company}}\n\n\
                I am writing to express my strong interest in the {{position}} role at {{company}}. \
                With {{yearsOfExperience}} years of experience in software development, I am confident \
                that my skills align well with your team's needs.\n\n\
                Key qualifications:\n- {{skill1}}\n- {{skill2}}\n- {{skill3}}\n\n\
                I would welcome the chance to discuss how my background matches your needs.\n\n\
                Best regards,\n{{yourName}}"
                .to_string(),
            variables: vec![
                TemplateVariable::new("position", "Position", VariableType::Position, true),
                TemplateVariable::new("company", "Company", VariableType::Company, true),
                TemplateVariable::new("yourName", "Your Name", VariableType::Name, true),
                TemplateVariable::new("yearsOfExperience", "Years of Experience", VariableType::Text, false)
                    .with_default("5"),
                TemplateVariable::new("skill1", "Key Skill 1", VariableType::Text, false)
                    .with_placeholder("e.g., Rust & async"),
                TemplateVariable::new("skill2", "Key Skill 2", VariableType::Text, false)
                    .with_placeholder("e.g., System Design"),
                TemplateVariable::new("skill3", "Key Skill 3", VariableType::Text, false)
                    .with_placeholder("e.g., Team Leadership"),
            ],
            tags: vec!["engineering".to_string(), "tech".to_string()],
            is_default: true,
        },
        Template {
            name: "Follow-up Email".to_string(),
            description: Some("Follow-up after submitting an application".to_string()),
            category: TemplateCategory::Email,
            content: "Subject: Following Up on {{position}} Application\n\n\
                Dear {{hiringManager}},\n\n\
                I am writing to follow up on my application for the {{position}} role at {{company}}, \
                which I submitted on {{applicationDate}}.\n\n\
                I remain very interested in this opportunity. {{additionalContext}}\n\n\
                Best regards,\n{{yourName}}\n{{yourEmail}}"
                .to_string(),
            variables: vec![
                TemplateVariable::new("position", "Position", VariableType::Position, true),
                TemplateVariable::new("company", "Company", VariableType::Company, true),
                TemplateVariable::new("hiringManager", "Hiring Manager", VariableType::Name, false)
                    .with_default("Hiring Manager"),
                TemplateVariable::new("applicationDate", "Application Date", VariableType::Date, true),
                TemplateVariable::new("additionalContext", "Additional Context", VariableType::Text, false),
                TemplateVariable::new("yourName", "Your Name", VariableType::Name, true),
                TemplateVariable::new("yourEmail", "Your Email", VariableType::Text, true),
            ],
            tags: vec!["follow-up".to_string(), "email".to_string()],
            is_default: true,
        },
        Template {
            name: "Thank You Email".to_string(),
            description: Some("Thank-you note to send after an interview".to_string()),
            category: TemplateCategory::Email,
            content: "Subject: Thank You - {{position}} Interview\n\n\
                Dear {{interviewer}},\n\n\
                Thank you for taking the time to meet with me {{interviewDate}} to discuss the \
                {{position}} opportunity at {{company}}.\n\n\
                {{specificDetail}}\n\n\
                Best regards,\n{{yourName}}"
                .to_string(),
            variables: vec![
                TemplateVariable::new("position", "Position", VariableType::Position, true),
                TemplateVariable::new("company", "Company", VariableType::Company, true),
                TemplateVariable::new("interviewer", "Interviewer Name", VariableType::Name, true),
                TemplateVariable::new("interviewDate", "Interview Date", VariableType::Date, false)
                    .with_default("today"),
                TemplateVariable::new("specificDetail", "Specific Detail", VariableType::Text, false)
                    .with_placeholder("Mention something specific from the interview"),
                TemplateVariable::new("yourName", "Your Name", VariableType::Name, true),
            ],
            tags: vec!["thank-you".to_string(), "interview".to_string()],
            is_default: true,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ApplicationStatus;
    use chrono::{TimeZone, Utc};

    fn values(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    fn simple(content: &str) -> Template {
        let mut template = Template {
            name: "Simple".to_string(),
            description: None,
            category: TemplateCategory::Note,
            content: content.to_string(),
            variables: Vec::new(),
            tags: Vec::new(),
            is_default: false,
        };
        template.sync_variables();
        template
    }

    #[test]
    fn test_extract_variables_unique_in_order() {
        let vars = extract_variables("{{b}} and {{a}} then {{b}} and {{ c }} {{d_2}}");
        assert_eq!(vars, vec!["b", "a", "d_2"]);
    }

    #[test]
    fn test_sync_variables_adds_and_drops() {
        let mut template = simple("Hi {{name}}");
        assert_eq!(template.variables.len(), 1);
        assert_eq!(template.variables[0].label, "Name");
        assert!(!template.variables[0].required);

        template.content = "Hello {{company}}".to_string();
        template.sync_variables();
        let keys: Vec<&str> = template.variables.iter().map(|v| v.key.as_str()).collect();
        assert_eq!(keys, vec!["company"]);
    }

    #[test]
    fn test_resolve_substitutes_values_and_defaults() {
        let templates = default_templates();
        let template = find_template(&templates, "software engineer application").unwrap();
        let resolved = template
            .resolve(&values(&[
                ("position", "Engineer"),
                ("company", "Acme"),
                ("yourName", "Sam"),
                ("skill1", "Rust"),
            ]))
            .unwrap();

        assert!(resolved.content.starts_with("Application for Engineer at Acme"));
        assert!(resolved.content.contains("With 5 years"));
        assert!(resolved.content.contains("- Rust\n"));
        assert!(!resolved.content.contains("{{"));
        assert_eq!(resolved.variables["yearsOfExperience"], "5");
    }

    #[test]
    fn test_resolve_reports_every_missing_required() {
        let templates = default_templates();
        let template = find_template(&templates, "Follow-up Email").unwrap();
        let err = template.resolve(&values(&[("company", "Acme"), ("position", "  ")])).unwrap_err();
        assert_eq!(
            err,
            TemplateError::MissingRequired(vec![
                "position".to_string(),
                "applicationDate".to_string(),
                "yourName".to_string(),
                "yourEmail".to_string(),
            ])
        );
        assert!(err.to_string().contains("position, applicationDate"));
    }

    #[test]
    fn test_undeclared_placeholders() {
        let mut template = simple("{{greeting}}, {{name}}!");
        template.variables.retain(|v| v.key == "name");

        let resolved = template.resolve(&values(&[("name", "Sam")])).unwrap();
        assert_eq!(resolved.content, "{{greeting}}, Sam!");

        let resolved = template
            .resolve(&values(&[("name", "Sam"), ("greeting", "Hello")]))
            .unwrap();
        assert_eq!(resolved.content, "Hello, Sam!");
    }

    #[test]
    fn test_preview_uses_placeholder_or_label() {
        let templates = default_templates();
        let template = find_template(&templates, "Thank You Email").unwrap();
        let preview = template.preview();
        assert!(preview.contains("Dear [Interviewer Name],"));
        assert!(preview.contains("Mention something specific from the interview"));
    }

    #[test]
    fn test_application_context() {
        let mut app = Application::new("Acme", "Engineer", ApplicationStatus::Applied);
        app.applied_date = Some(Utc.with_ymd_and_hms(2024, 3, 5, 0, 0, 0).unwrap());
        let context = application_context(&app);
        assert_eq!(context["company"], "Acme");
        assert_eq!(context["applicationDate"], "March 5, 2024");
    }

    #[test]
    fn test_find_template_missing() {
        let templates = default_templates();
        assert_eq!(
            find_template(&templates, "nope").unwrap_err(),
            TemplateError::NotFound("nope".to_string())
        );
    }

    #[test]
    fn test_template_loads_from_json() {
        let json = r#"{
            "name": "Custom",
            "category": "cover-letter",
            "content": "Dear {{company}}",
            "variables": [{"key": "company", "label": "Company", "type": "company", "required": true}]
        }"#;
        let template: Template = serde_json::from_str(json).unwrap();
        assert_eq!(template.category, TemplateCategory::CoverLetter);
        let resolved = template.resolve(&values(&[("company", "Acme")])).unwrap();
        assert_eq!(resolved.content, "Dear Acme");
    }
}
