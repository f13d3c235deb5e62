//! Reader for `.docx` CVs that already follow the biodata layout: one big
//! table whose first column holds the numbered field labels.

use super::record::{mentions_ongoing, CvRecord, EmploymentRecord};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Active {
    Employment,
    Specializations,
    Projects,
    Skills,
}

const FIELD_LABELS: [&str; 9] = [
    "proposed position",
    "name of staff",
    "date of birth",
    "nationality",
    "membership",
    "education",
    "training",
    "language",
    "countries",
];

/// A layout table is not a biodata template unless it carries the staff labels.
pub fn looks_like_template(rows: &[Vec<String>]) -> bool {
    rows.iter().filter_map(|row| row.first()).any(|cell| {
        let label = cell.to_lowercase();
        label.contains("name of staff") || label.contains("proposed position")
    })
}

/// Reads a record from the rows of the template table. Rows are lists of
/// cell texts as returned by [`crate::docx::reader::read_body`].
pub fn read_template_table(rows: &[Vec<String>]) -> CvRecord {
    let mut record = CvRecord::default();
    let mut active: Option<Active> = None;

    for row in rows {
        let cells = unique_cells(row);
        let Some(first) = cells.first().copied() else {
            continue;
        };
        let label = first.to_lowercase();
        let full = cells.join(" ");

        if (label.contains("11.") && label.contains("employment"))
            || label.contains("employment record")
        {
            active = Some(Active::Employment);
            continue;
        }
        if label.contains("11.") || label.contains("subject matter") {
            active = Some(Active::Specializations);
            record.specializations = strip_label(&full, "11.", &["subject matter", "specializations"]);
            continue;
        }
        if label.contains("12.")
            || label.contains("work undertaken")
            || label.contains("additional experience")
        {
            active = Some(Active::Projects);
            record.projects = strip_label(&full, "12.", &[]);
            continue;
        }
        if label.contains("13.") || label.contains("computer skill") {
            active = Some(Active::Skills);
            record.skills = strip_label(&full, "13.", &["computer skills", "computer skill"]);
            continue;
        }

        match active {
            Some(Active::Specializations) => {
                push_line(&mut record.specializations, &full);
                continue;
            }
            Some(Active::Projects) => {
                push_line(&mut record.projects, &full);
                continue;
            }
            Some(Active::Skills) => {
                push_line(&mut record.skills, &full);
                continue;
            }
            Some(Active::Employment) => {
                employment_row(&mut record, &cells, &label, &full);
                continue;
            }
            None => {}
        }

        let value = || field_value(&cells);
        if label.contains("name of staff") {
            record.name = value();
        } else if label.contains("date of birth") {
            record.date_of_birth = value();
        } else if label.contains("nationality") {
            record.nationality = value();
        } else if label.contains("membership") {
            record.membership = value();
        } else if label.contains("6.") && label.contains("education") {
            record.education = value();
        } else if label.contains("7.") && label.contains("training") {
            record.training = value();
        } else if label.contains("7.") && label.contains("skill") {
            record.skills = value();
        } else if label.contains("languages") && label.contains("proficiency") {
            record.languages = value();
        } else if label.contains("countries of work") {
            record.countries = value();
        } else if label.contains("10.")
            && (label.contains("training") || label.contains("certification"))
        {
            record.training = value();
        } else if label.contains("10.") && label.contains("employment") {
            active = Some(Active::Employment);
        } else if starts_numbered(first) && !FIELD_LABELS.iter().any(|l| label.contains(l)) {
            let mut job = EmploymentRecord::new(first);
            job.dates = dates_from(&cells);
            record.employment.push(job);
        }
    }

    for job in &mut record.employment {
        job.current = mentions_ongoing(&job.text());
    }
    debug!(
        "template table rows={} employment={}",
        rows.len(),
        record.employment.len()
    );
    record
}

/// Merged cells repeat their text in every grid cell they span.
fn unique_cells(row: &[String]) -> Vec<&str> {
    let mut out: Vec<&str> = Vec::new();
    for cell in row {
        let text = cell.trim();
        if !text.is_empty() && !out.contains(&text) {
            out.push(text);
        }
    }
    out
}

fn field_value(cells: &[&str]) -> String {
    cells
        .iter()
        .skip(1)
        .find(|c| **c != ":")
        .map(|c| c.to_string())
        .unwrap_or_default()
}

fn dates_from(cells: &[&str]) -> String {
    cells
        .iter()
        .skip(1)
        .filter(|c| **c != ":")
        .copied()
        .collect::<Vec<_>>()
        .join(" ")
}

fn employment_row(record: &mut CvRecord, cells: &[&str], label: &str, full: &str) {
    if label.contains("employer") && full.to_lowercase().contains("from") {
        return;
    }
    if label.contains("experience:") {
        if let Some(last) = record.employment.last_mut() {
            last.experience = Some(full.to_string());
        }
        return;
    }
    let company = cells[0];
    let looks_like_company = ["Ltd", "Limited", "Inc", "Company"]
        .iter()
        .any(|k| company.contains(k))
        || company.contains('\n');
    if looks_like_company {
        let mut job = EmploymentRecord::new(company);
        job.dates = dates_from(cells);
        record.employment.push(job);
    }
}

fn push_line(field: &mut String, line: &str) {
    if !field.is_empty() {
        field.push('\n');
    }
    field.push_str(line);
}

fn starts_numbered(s: &str) -> bool {
    let digits = s.chars().take_while(|c| c.is_ascii_digit()).count();
    digits > 0 && s[digits..].starts_with('.')
}

fn strip_prefix_ci<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    let head = s.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix).then(|| &s[prefix.len()..])
}

/// Text after `marker`, without the leading label words and colon.
fn strip_label(full: &str, marker: &str, labels: &[&str]) -> String {
    let mut text = match full.split_once(marker) {
        Some((_, after)) => after.trim(),
        None => full.trim(),
    };
    for label in labels {
        if let Some(rest) = strip_prefix_ci(text, label) {
            text = rest.trim_start();
        }
    }
    text.trim_start_matches(|c: char| c == ':' || c.is_whitespace())
        .to_string()
}
