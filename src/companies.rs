use crate::models::Company;

/// Legal-entity words that don't distinguish one employer from another.
const LEGAL_SUFFIXES: &[&str] = &[
    "inc",
    "incorporated",
    "llc",
    "ltd",
    "limited",
    "corp",
    "corporation",
    "co",
    "company",
    "plc",
    "gmbh",
    "ag",
    "sa",
    "bv",
];

pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.9;

#[derive(Debug, Clone, PartialEq)]
pub struct SimilarCompany<'a> {
    pub company: &'a Company,
    pub score: f64,
}

pub fn normalize_name(name: &str) -> String {
    let cleaned: String = name
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();

    let mut words: Vec<&str> = cleaned.split_whitespace().collect();
    // Keep at least one word so "The Company" doesn't normalise to nothing
    while words.len() > 1 && words.last().is_some_and(|w| LEGAL_SUFFIXES.contains(w)) {
        words.pop();
    }
    words.join(" ")
}

pub fn similarity(a: &str, b: &str) -> f64 {
    strsim::jaro_winkler(&normalize_name(a), &normalize_name(b))
}

/// Other companies whose name is at least `threshold` similar to `name`, best first.
pub fn find_similar<'a>(name: &str, companies: &'a [Company], threshold: f64) -> Vec<SimilarCompany<'a>> {
    let mut matches: Vec<SimilarCompany<'a>> = companies
        .iter()
        .map(|company| SimilarCompany {
            company,
            score: similarity(name, &company.name),
        })
        .filter(|m| m.score >= threshold)
        .collect();
    matches.sort_by(|a, b| b.score.total_cmp(&a.score));
    matches
}

/// Every pair of stored companies that look like the same employer, best first.
pub fn find_duplicate_pairs(companies: &[Company], threshold: f64) -> Vec<(&Company, &Company, f64)> {
    let normalized: Vec<String> = companies.iter().map(|c| normalize_name(&c.name)).collect();
    let mut pairs = Vec::new();

    for i in 0..companies.len() {
        for j in (i + 1)..companies.len() {
            let score = strsim::jaro_winkler(&normalized[i], &normalized[j]);
            if score >= threshold {
                pairs.push((&companies[i], &companies[j], score));
            }
        }
    }

    pairs.sort_by(|a, b| b.2.total_cmp(&a.2));
    pairs
}
