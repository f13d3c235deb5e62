//! Line-by-line CV section classifier.
//!
//! The scan keeps one piece of state, the active [`Section`]. Each non-blank
//! line is run through the ordered rules for that state (see [`rules_for`]).
//! A rule whose matcher fires applies its [`Effect`]; if the rule consumes the
//! line, no later rule sees it.

use super::assemble::{self, Patterns};
use super::record::CvRecord;
use crate::config::Cv;
use anyhow::{Context, Result};
use regex::Regex;
use serde::Serialize;
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    #[default]
    None,
    Education,
    Training,
    Employment,
    Projects,
    Skills,
    Summary,
    Reference,
}

/// What a matching rule does to the scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Enter(Section),
    DateOfBirth(String),
    Nationality(String),
    Countries(String),
    Collect,
    RescueCertificate,
    Discard,
}

/// A trimmed, non-blank input line and its successor.
#[derive(Debug)]
pub struct Line<'a> {
    pub text: &'a str,
    pub lower: String,
    pub next: Option<&'a str>,
}

pub type Matcher = fn(&Classifier, &Line<'_>) -> Option<Effect>;

pub struct Rule {
    pub name: &'static str,
    pub matcher: Matcher,
    pub consumes: bool,
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule")
            .field("name", &self.name)
            .field("consumes", &self.consumes)
            .finish()
    }
}

static REFERENCE_RULES: [Rule; 1] = [Rule {
    name: "discard",
    matcher: discard,
    consumes: true,
}];

static NONE_RULES: [Rule; 6] = [
    Rule {
        name: "exact_header",
        matcher: exact_header,
        consumes: true,
    },
    Rule {
        name: "keyword_header",
        matcher: keyword_header,
        consumes: true,
    },
    Rule {
        name: "date_of_birth",
        matcher: date_of_birth,
        consumes: false,
    },
    Rule {
        name: "nationality",
        matcher: nationality,
        consumes: false,
    },
    Rule {
        name: "years_of_experience",
        matcher: years_of_experience,
        consumes: false,
    },
    Rule {
        name: "certificate_rescue",
        matcher: certificate_rescue,
        consumes: false,
    },
];

static CONTENT_RULES: [Rule; 4] = [
    Rule {
        name: "exact_header",
        matcher: exact_header,
        consumes: true,
    },
    Rule {
        name: "years_of_experience",
        matcher: years_of_experience,
        consumes: false,
    },
    Rule {
        name: "collect",
        matcher: collect,
        consumes: false,
    },
    Rule {
        name: "certificate_rescue",
        matcher: certificate_rescue,
        consumes: false,
    },
];

/// Ordered rules tried against each line while `section` is active.
/// `Reference` is terminal: its only rule discards every line.
pub fn rules_for(section: Section) -> &'static [Rule] {
    match section {
        Section::Reference => &REFERENCE_RULES,
        Section::None => &NONE_RULES,
        Section::Education
        | Section::Training
        | Section::Employment
        | Section::Projects
        | Section::Skills
        | Section::Summary => &CONTENT_RULES,
    }
}

/// Raw per-section buffers and positional fields produced by one scan.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Scan {
    pub education: Vec<String>,
    pub training: Vec<String>,
    pub employment: Vec<String>,
    pub projects: Vec<String>,
    pub skills: Vec<String>,
    pub summary: Vec<String>,
    pub date_of_birth: Option<String>,
    pub nationality: Option<String>,
    pub countries: Option<String>,
    pub final_section: Section,
}

impl Scan {
    fn buffer_mut(&mut self, section: Section) -> Option<&mut Vec<String>> {
        match section {
            Section::Education => Some(&mut self.education),
            Section::Training => Some(&mut self.training),
            Section::Employment => Some(&mut self.employment),
            Section::Projects => Some(&mut self.projects),
            Section::Skills => Some(&mut self.skills),
            Section::Summary => Some(&mut self.summary),
            Section::None | Section::Reference => None,
        }
    }
}

pub struct Classifier {
    cfg: Cv,
    years: Regex,
    patterns: Patterns,
}

impl Classifier {
    pub fn new(cfg: &Cv) -> Result<Self> {
        let years = Regex::new(r"(\d+)\+?\s*years?\s*(of)?\s*(experience|it experience)?")
            .context("compile years-of-experience pattern")?;
        Ok(Self {
            cfg: cfg.clone(),
            years,
            patterns: Patterns::new()?,
        })
    }

    /// Classifies `text` and assembles the record. Never fails: anything the
    /// rules do not recognize is dropped or kept in the active section.
    pub fn extract(&self, text: &str, name: &str) -> CvRecord {
        let scan = self.scan(text);
        assemble::assemble(&scan, name, &self.cfg, &self.patterns)
    }

    pub fn scan(&self, text: &str) -> Scan {
        let lines: Vec<&str> = text.lines().collect();
        let mut scan = Scan::default();
        let mut state = Section::None;

        for (i, raw) in lines.iter().enumerate() {
            let text = raw.trim();
            if text.is_empty() {
                continue;
            }
            let next = lines
                .get(i + 1)
                .map(|l| l.trim())
                .filter(|l| !l.is_empty());
            let line = Line {
                text,
                lower: text.to_lowercase(),
                next,
            };

            for rule in rules_for(state) {
                let Some(effect) = (rule.matcher)(self, &line) else {
                    continue;
                };
                trace!(line = i + 1, rule = rule.name, ?effect, "rule fired");
                apply(effect, &mut state, &mut scan, text);
                if rule.consumes {
                    break;
                }
            }
        }

        scan.final_section = state;
        scan
    }
}

fn apply(effect: Effect, state: &mut Section, scan: &mut Scan, text: &str) {
    match effect {
        Effect::Enter(section) => *state = section,
        Effect::DateOfBirth(v) => scan.date_of_birth = Some(v),
        Effect::Nationality(v) => scan.nationality = Some(v),
        Effect::Countries(v) => scan.countries = Some(v),
        Effect::Collect => {
            if let Some(buf) = scan.buffer_mut(*state) {
                buf.push(text.to_string());
            }
        }
        Effect::RescueCertificate => {
            if !scan.training.iter().any(|t| t == text) {
                scan.training.push(text.to_string());
            }
        }
        Effect::Discard => {}
    }
}

fn exact_header(_: &Classifier, line: &Line<'_>) -> Option<Effect> {
    let section = match line.text {
        "EDUCATION" => Section::Education,
        "WORK EXPERIENCE" => Section::Employment,
        "PROFESSIONAL SKILL" => Section::Skills,
        "PROFILE SUMMARY" => Section::Summary,
        "CERTIFICATES" | "CERTIFICATE" | "CERTIFICATES & ONLINE PROGRAMME" | "COURSES" => {
            Section::Training
        }
        "REFERENCE" => Section::Reference,
        "LANGUAGES" => Section::None,
        _ => return None,
    };
    Some(Effect::Enter(section))
}

/// Loose section headers, recognized only before any section has started.
fn keyword_header(_: &Classifier, line: &Line<'_>) -> Option<Effect> {
    let l = line.lower.as_str();
    let short = line.text.chars().count() < 30;

    let section = if l.contains("education qualification") || l == "education" {
        Section::Education
    } else if l.contains("professional certificate") || (l.contains("certification") && short) {
        Section::Training
    } else if l.contains("career summary") || l.contains("profile summary") || l.contains("objective")
    {
        Section::Summary
    } else if l.contains("completed project") || l.contains("project:") {
        Section::Projects
    } else if l.contains("working experience") || l.contains("work experience") {
        Section::Employment
    } else if l.contains("technical skill")
        || l.contains("professional skill")
        || l == "skill"
        || l == "skills"
    {
        Section::Skills
    } else {
        return None;
    };
    Some(Effect::Enter(section))
}

/// Value after the first colon, or the following line when the label stands alone.
fn labelled_value(line: &Line<'_>) -> Option<String> {
    if let Some((_, value)) = line.text.split_once(':') {
        let value = value.trim();
        if !value.is_empty() {
            return Some(value.to_string());
        }
    }
    line.next.map(str::to_string)
}

fn date_of_birth(_: &Classifier, line: &Line<'_>) -> Option<Effect> {
    if !line.lower.contains("date of birth") {
        return None;
    }
    labelled_value(line).map(Effect::DateOfBirth)
}

fn nationality(_: &Classifier, line: &Line<'_>) -> Option<Effect> {
    if !line.lower.contains("nationality") {
        return None;
    }
    labelled_value(line).map(Effect::Nationality)
}

fn years_of_experience(c: &Classifier, line: &Line<'_>) -> Option<Effect> {
    let m = c.years.find(&line.lower)?;
    let years = m.as_str().trim();
    let country = c.cfg.defaults.country.trim();
    let value = if country.is_empty() {
        years.to_string()
    } else {
        format!("{country} - {years}")
    };
    Some(Effect::Countries(value))
}

fn collect(_: &Classifier, _: &Line<'_>) -> Option<Effect> {
    Some(Effect::Collect)
}

fn certificate_rescue(c: &Classifier, line: &Line<'_>) -> Option<Effect> {
    c.cfg
        .certificate_keywords
        .iter()
        .any(|kw| line.text.contains(kw.as_str()))
        .then_some(Effect::RescueCertificate)
}

fn discard(_: &Classifier, _: &Line<'_>) -> Option<Effect> {
    Some(Effect::Discard)
}
