//! Turns the raw section buffers of a [`Scan`] into the fields of a [`CvRecord`].

use super::classifier::Scan;
use super::record::{CvRecord, EmploymentRecord};
use crate::config::{Cv, CvDefaults, CvLimits};
use anyhow::{Context, Result};
use regex::Regex;
use std::collections::BTreeSet;

const MONTHS: &str = "JAN|FEB|MAR|APR|MAY|JUN|JUL|AUG|SEP|OCT|NOV|DEC";
const SPECIALIZATION_FALLBACK_CHARS: usize = 500;

/// Date shapes shared by the employment and skills filters.
#[derive(Debug, Clone)]
pub struct Patterns {
    bare_year: Regex,
    month_year: Regex,
    year_range: Regex,
    trailing_dates: Regex,
}

impl Patterns {
    pub fn new() -> Result<Self> {
        let compile = |p: &str| Regex::new(p).with_context(|| format!("compile pattern {p}"));
        Ok(Self {
            bare_year: compile(r"^\d{4}$")?,
            month_year: compile(&format!(r"(?i)^({MONTHS})\s+\d{{4}}"))?,
            year_range: compile(r"(?i)^\d{4}\s*-\s*(PRESENT|\d{4})")?,
            trailing_dates: compile(&format!(
                r"(?i)\s*\b(\d{{4}}\s*-\s*(PRESENT|\d{{4}})|({MONTHS})[a-z]*\.?\s+\d{{4}}).*$"
            ))?,
        })
    }

    pub fn is_month_year(&self, line: &str) -> bool {
        self.month_year.is_match(line)
    }

    pub fn is_date_line(&self, line: &str) -> bool {
        self.month_year.is_match(line)
            || self.year_range.is_match(line)
            || line.to_uppercase().contains("PRESENT")
    }
}

pub fn assemble(scan: &Scan, name: &str, cfg: &Cv, pat: &Patterns) -> CvRecord {
    let mut record = CvRecord {
        name: name.to_string(),
        date_of_birth: scan.date_of_birth.clone().unwrap_or_default(),
        nationality: scan.nationality.clone().unwrap_or_default(),
        countries: scan.countries.clone().unwrap_or_default(),
        ..Default::default()
    };

    record.education = education(scan, cfg.limits.education, pat);
    record.training = training(&scan.training, cfg.limits.training);
    record.skills = skills(&scan.skills, cfg.limits.skills, pat);
    record.projects = join_capped(scan.projects.iter().map(String::as_str), cfg.limits.projects);
    record.specializations = specializations(&scan.summary, name, cfg.limits.summary);
    record.employment = employment(scan, &cfg.limits, pat);

    if record.specializations.is_empty() && !record.skills.is_empty() {
        record.specializations = record
            .skills
            .chars()
            .take(SPECIALIZATION_FALLBACK_CHARS)
            .collect();
    }

    apply_defaults(&mut record, &cfg.defaults);
    record
}

/// Fills the fields a CV rarely states with configured values.
pub fn apply_defaults(record: &mut CvRecord, defaults: &CvDefaults) {
    let fill = |field: &mut String, value: &str| {
        if field.trim().is_empty() && !value.is_empty() {
            *field = value.to_string();
        }
    };
    fill(&mut record.nationality, &defaults.nationality);
    fill(&mut record.membership, &defaults.membership);
    fill(&mut record.languages, &defaults.languages);
    fill(&mut record.countries, &defaults.country);
}

fn contains_any(line: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| line.contains(n))
}

fn is_contact(line: &str) -> bool {
    line.contains('@') || line.starts_with('+') || line.contains("Dhaka-")
}

fn join_capped<'a>(lines: impl Iterator<Item = &'a str>, cap: usize) -> String {
    lines.take(cap).collect::<Vec<_>>().join("\n")
}

fn dedup<'a>(lines: impl IntoIterator<Item = &'a str>) -> Vec<&'a str> {
    let mut seen = BTreeSet::new();
    lines.into_iter().filter(|l| seen.insert(*l)).collect()
}

fn education(scan: &Scan, cap: usize, pat: &Patterns) -> String {
    let mut all: Vec<&str> = scan.education.iter().map(String::as_str).collect();
    for line in &scan.employment {
        if contains_any(line, &["University", "College", "School"]) {
            all.push(line);
        }
        if contains_any(line, &["Bachelor", "Masters", "B.Sc", "M.Sc"]) {
            all.push(line);
        }
        if contains_any(line, &["Secondary School Certificate", "Higher Secondary"]) {
            all.push(line);
        }
    }

    let mut degrees = Vec::new();
    let mut institutions = Vec::new();
    let mut rest = Vec::new();
    for line in all {
        if pat.bare_year.is_match(line) || line.contains('@') || line.starts_with('+') {
            continue;
        }
        if line.chars().count() < 5 {
            continue;
        }
        if contains_any(line, &["Bachelor", "Masters", "Certificate", "B.Sc", "M.Sc"]) {
            degrees.push(line);
        } else if contains_any(line, &["University", "College", "School"]) {
            institutions.push(line);
        } else {
            rest.push(line);
        }
    }

    let institutions = institutions
        .into_iter()
        .filter(|inst| !degrees.iter().any(|d| d.contains(*inst)));
    let ordered: Vec<&str> = degrees.iter().copied().chain(institutions).chain(rest).collect();
    join_capped(dedup(ordered).into_iter(), cap)
}

const LANGUAGE_ENTRIES: [&str; 5] = [
    "English (Fluent)",
    "Bengali (Native)",
    "English",
    "Bengali",
    "Bangla",
];

fn training(lines: &[String], cap: usize) -> String {
    let kept = lines.iter().map(String::as_str).filter(|l| {
        l.chars().count() >= 5
            && !l.contains('@')
            && !contains_any(l, &["Ltd", "Limited", "Company", "Pvt"])
            && !contains_any(l, &["General Manager", "VP of", "Chairman"])
            && !LANGUAGE_ENTRIES.contains(l)
    });
    join_capped(dedup(kept).into_iter(), cap)
}

fn skills(lines: &[String], cap: usize, pat: &Patterns) -> String {
    let mut kept = Vec::new();
    for line in lines {
        if contains_any(line, &["@", "Dr.", "Chairman", "General Manager"]) {
            break;
        }
        if line.contains('|') || line.to_uppercase().contains("PRESENT") {
            continue;
        }
        if pat.is_month_year(line) {
            continue;
        }
        if line.starts_with("http") || line.to_lowercase().contains("linkedin.com") {
            continue;
        }
        if line.chars().count() > 5 {
            kept.push(line.as_str());
        }
    }
    join_capped(kept.into_iter(), cap)
}

fn specializations(lines: &[String], name: &str, cap: usize) -> String {
    let upper_name = name.to_uppercase();
    let name_parts: Vec<&str> = upper_name.split_whitespace().take(2).collect();

    let kept = lines.iter().map(String::as_str).filter(|line| {
        if line.contains('@') || line.starts_with('+') {
            return false;
        }
        if contains_any(line, &["Road", "Sector", "Dhaka", "Uttara"]) {
            return false;
        }
        if line.contains("Engineer") && line.split_whitespace().count() <= 4 {
            return false;
        }
        let upper = line.to_uppercase();
        if !name_parts.is_empty() && name_parts.iter().all(|p| upper.contains(p)) {
            return false;
        }
        line.chars().count() > 10
    });
    join_capped(kept, cap)
}

fn is_education_line(line: &str) -> bool {
    contains_any(
        line,
        &[
            "School",
            "College",
            "University",
            "Certificate",
            "Bachelor",
            "Masters",
            "Secondary",
        ],
    )
}

fn employment(scan: &Scan, limits: &CvLimits, pat: &Patterns) -> Vec<EmploymentRecord> {
    let mut all: Vec<&str> = scan.employment.iter().map(String::as_str).collect();
    all.extend(
        scan.skills
            .iter()
            .map(String::as_str)
            .filter(|l| l.contains('|') || l.to_uppercase().contains("PRESENT")),
    );

    let mut records: Vec<EmploymentRecord> = Vec::new();
    let mut starts: Vec<usize> = Vec::new();
    let mut offset = 0;
    for &line in &all {
        let at = offset;
        offset += line.len() + 1;
        if is_contact(line) || is_education_line(line) {
            continue;
        }
        if line.contains('|') {
            records.push(job_from_pipe_line(line, pat));
            starts.push(at);
        } else if pat.is_date_line(line) {
            if let Some(last) = records.last_mut() {
                if last.dates.is_empty() {
                    last.dates = line.to_string();
                }
            }
        }
    }

    if records.is_empty() {
        let raw = scan
            .employment
            .iter()
            .map(String::as_str)
            .filter(|l| !is_contact(l))
            .filter(|l| !contains_any(l, &["School", "College", "University"]))
            .filter(|l| !contains_any(l, &["Certificate", "Bachelor", "Masters"]))
            .filter(|l| l.chars().count() > 10);
        let block = join_capped(raw, limits.employment_raw_lines);
        if !block.is_empty() {
            let mut record = EmploymentRecord::new(block);
            record.current = record.employer.to_ascii_uppercase().contains("PRESENT");
            records.push(record);
        }
        return records;
    }

    if let Some(i) = closest_before_present(&all.join("\n"), &starts) {
        records[i].current = true;
    }
    records.truncate(limits.employment);
    records
}

/// Index of the job whose line starts closest before the first `PRESENT`.
/// `starts` holds each job line's byte offset in `joined`.
fn closest_before_present(joined: &str, starts: &[usize]) -> Option<usize> {
    let present = joined.to_ascii_uppercase().find("PRESENT")?;
    starts
        .iter()
        .enumerate()
        .filter(|&(_, &at)| at < present)
        .max_by_key(|&(_, &at)| at)
        .map(|(i, _)| i)
}

/// `Title | Company [| dates]`; dates trailing the company move to `dates`.
fn job_from_pipe_line(line: &str, pat: &Patterns) -> EmploymentRecord {
    let (title, rest) = line.split_once('|').unwrap_or(("", line));

    let mut employer_parts = Vec::new();
    let mut dates = String::new();
    for part in rest.split('|').map(str::trim).filter(|p| !p.is_empty()) {
        if pat.is_date_line(part) {
            if dates.is_empty() {
                dates = part.to_string();
            }
        } else {
            employer_parts.push(part);
        }
    }

    let mut employer = employer_parts.join(" | ");
    if let Some(m) = pat.trailing_dates.find(&employer) {
        if m.start() > 0 {
            if dates.is_empty() {
                dates = m.as_str().trim().to_string();
            }
            employer.truncate(m.start());
            employer = employer.trim_end().to_string();
        }
    }

    let title = title.trim();
    EmploymentRecord {
        title: (!title.is_empty()).then(|| title.to_string()),
        employer,
        dates,
        experience: None,
        current: false,
    }
}
