//! Standard biodata sheet rendered as a self-contained HTML page.

use super::record::{CvRecord, EmploymentRecord};
use crate::util::html_escape;

const STYLE: &str = r#"        body {
            font-family: 'Times New Roman', Times, serif;
            margin: 40px;
            line-height: 1.5;
            font-size: 11pt;
        }
        .header { text-align: center; margin-bottom: 20px; }
        .main-table { width: 100%; border-collapse: collapse; margin-bottom: 15px; }
        .main-table td { border: 1px solid #000; padding: 8px; vertical-align: top; }
        .label { width: 32%; font-weight: bold; background-color: #f5f5f5; }
        .colon { width: 3%; text-align: center; background-color: #f5f5f5; }
        .value { width: 65%; }
        .section-title {
            background-color: #f0f0f0;
            font-weight: bold;
            padding: 8px;
            margin-top: 15px;
            border: 1px solid #000;
            border-bottom: none;
        }
        .section-content { border: 1px solid #000; padding: 12px; }
        .employment-table, .projects-table, .lang-table { width: 100%; border-collapse: collapse; }
        .employment-table th, .employment-table td,
        .projects-table th, .projects-table td {
            border: 1px solid #ccc;
            padding: 6px;
            text-align: left;
            vertical-align: top;
        }
        .employment-table th, .projects-table th { background-color: #f0f0f0; font-size: 10pt; }
        .employment-table .experience { padding-left: 25px; font-style: italic; }
        .current { font-size: 10pt; color: #555; }
        .lang-table th, .lang-table td { border: 1px solid #ccc; padding: 5px 10px; text-align: center; }
        .lang-table th { background-color: #f5f5f5; }
        .item { margin: 8px 0; }
        .line { margin: 5px 0; }
        .indent { margin: 5px 0 5px 15px; }
        .certification { margin-top: 25px; padding: 15px; border: 1px solid #000; }
        .signature-section { margin-top: 20px; }
        .checkbox-row { margin: 15px 0; }
        pre {
            white-space: pre-wrap;
            font-family: 'Times New Roman', Times, serif;
            margin: 0;
            font-size: 11pt;
        }
"#;

const CERTIFICATION: &str = "I, the undersigned, certify that (i) I was not a former employee of the client immediately before the submission of this proposal, and, (ii) I have not offered my CV to be proposed by a Firm other than this Consultant for this assignment, and (iii) to the best of my knowledge and belief, this bio data correctly describes myself, my qualifications, and my experience. I understand that any willful misstatement described herein may lead to my disqualification or dismissal, if engaged.";

const PROJECT_FALLBACK_NAME: &str = "Project Experience";

/// Renders `record` as a biodata sheet. Rows 1 to 9 are always present (empty
/// cells when a value is missing); sections 10 to 13 only when non-empty.
pub fn render_html(record: &CvRecord, position: &str, default_employer: &str) -> String {
    let mut rows = Vec::new();
    rows.push(row(
        "1. Proposed Position",
        &format!("<strong>{}</strong>", html_escape(position)),
    ));
    rows.push(row(
        "2. Name of Staff",
        &format!("<strong>{}</strong>", html_escape(&record.name)),
    ));
    rows.push(row("3. Date of Birth", &html_escape(&record.date_of_birth)));
    rows.push(row("4. Nationality", &html_escape(&record.nationality)));
    rows.push(row(
        "5. Membership in Professional Society",
        &html_escape(&record.membership),
    ));
    rows.push(row("6. Education", &pre(&record.education)));
    rows.push(row("7. Other Training", &pre(&record.training)));
    rows.push(row(
        "8. Languages &amp; Degree of Proficiency",
        &language_table(&record.languages),
    ));
    rows.push(row(
        "9. Countries of Work Experience",
        &html_escape(&record.countries),
    ));

    let mut sections = String::new();
    if !record.employment.is_empty() {
        sections.push_str(&section(
            "10. Employment Records:",
            &employment_table(&record.employment),
        ));
    }
    if !record.specializations.trim().is_empty() {
        sections.push_str(&section(
            "11. Subject Matter Specializations",
            &labelled_lines(&record.specializations, "indent"),
        ));
    }
    if !record.projects.trim().is_empty() {
        sections.push_str(&section(
            "12. Work Undertaken that Best Illustrates Capability to Handle the Tasks Assigned",
            &projects_table(&record.projects),
        ));
    }
    if !record.skills.trim().is_empty() {
        sections.push_str(&section(
            "13. Computer Skills",
            &labelled_lines(&record.skills, "line"),
        ));
    }

    let employer = current_employer(record, default_employer);

    let mut html = String::new();
    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("    <meta charset=\"UTF-8\">\n");
    html.push_str(
        "    <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n",
    );
    html.push_str(&format!(
        "    <title>CV - {}</title>\n",
        html_escape(&record.name)
    ));
    html.push_str("    <style>\n");
    html.push_str(STYLE);
    html.push_str("    </style>\n</head>\n<body>\n");
    html.push_str("    <div class=\"header\">\n        <h2 style=\"margin:0;\">CURRICULUM VITAE</h2>\n    </div>\n\n");
    html.push_str("    <table class=\"main-table\">\n");
    html.push_str(&rows.join("\n"));
    html.push_str("\n    </table>\n");
    html.push_str(&sections);
    html.push_str("\n    <div class=\"certification\">\n");
    html.push_str("        <p><strong>Certification:</strong></p>\n");
    html.push_str(&format!("        <p>{CERTIFICATION}</p>\n"));
    html.push_str(&format!(
        "        <p>I have been employed by <strong>{}</strong> as a consultant. Indicate Yes or No in the boxes below:</p>\n",
        html_escape(&employer)
    ));
    html.push_str("        <div class=\"checkbox-row\">\n");
    html.push_str("            <span style=\"margin-right: 30px;\">YES &#9744;</span>\n");
    html.push_str("            <span>NO &#9744;</span>\n");
    html.push_str("        </div>\n");
    html.push_str("        <div class=\"signature-section\">\n");
    html.push_str("            <p>Signature: _________________________</p>\n");
    html.push_str(
        "            <p>Date of Signing: _____ / _____ / _______ (Day / Month / Year)</p>\n",
    );
    html.push_str("        </div>\n    </div>\n</body>\n</html>\n");
    html
}

fn row(label: &str, value: &str) -> String {
    format!(
        "        <tr>\n            <td class=\"label\">{label}</td>\n            <td class=\"colon\">:</td>\n            <td class=\"value\">{value}</td>\n        </tr>"
    )
}

fn section(title: &str, body: &str) -> String {
    format!(
        "\n    <div class=\"section-title\">{title}</div>\n    <div class=\"section-content\">\n{body}    </div>\n"
    )
}

fn pre(text: &str) -> String {
    if text.trim().is_empty() {
        return String::new();
    }
    format!("<pre>{}</pre>", html_escape(text))
}

/// Rows are tab or double-space separated; a bare language name is assumed
/// to be spoken, read and written excellently.
fn language_table(text: &str) -> String {
    if text.trim().is_empty() {
        return String::new();
    }
    let mut out = String::from(
        "<table class=\"lang-table\"><tr><th>Language</th><th>Speaking</th><th>Reading</th><th>Writing</th></tr>",
    );
    for line in text.lines().map(str::trim) {
        if line.is_empty() || (line.contains("Language") && line.contains("Speaking")) {
            continue;
        }
        let spaced = line.replace('\t', "  ");
        let parts: Vec<&str> = spaced
            .split("  ")
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect();
        let cells: Vec<&str> = match parts.as_slice() {
            [lang, speaking, reading, writing, ..] => vec![*lang, *speaking, *reading, *writing],
            [lang, ..] => vec![*lang, "Excellent", "Excellent", "Excellent"],
            [] => continue,
        };
        out.push_str("<tr>");
        for cell in cells {
            out.push_str(&format!("<td>{}</td>", html_escape(cell)));
        }
        out.push_str("</tr>");
    }
    out.push_str("</table>");
    out
}

fn employment_table(records: &[EmploymentRecord]) -> String {
    let mut out = String::from("        <table class=\"employment-table\">\n");
    out.push_str("        <tr><th>Employer</th><th>Position</th><th>Period</th></tr>\n");
    for record in records {
        let mut employer = html_escape(&record.employer).replace('\n', "<br>");
        if record.current {
            employer.push_str(" <span class=\"current\">(Current)</span>");
        }
        let title = record.title.as_deref().map(html_escape).unwrap_or_default();
        out.push_str(&format!(
            "        <tr><td>{employer}</td><td>{title}</td><td>{}</td></tr>\n",
            html_escape(&record.dates)
        ));
        if let Some(exp) = record.experience.as_deref().filter(|e| !e.trim().is_empty()) {
            out.push_str(&format!(
                "        <tr><td colspan=\"3\" class=\"experience\">{}</td></tr>\n",
                html_escape(exp)
            ));
        }
    }
    out.push_str("        </table>\n");
    out
}

/// `Label: rest` lines with a short label get the label in bold.
fn labelled_lines(text: &str, plain_class: &str) -> String {
    let mut out = String::new();
    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        match line.split_once(':') {
            Some((label, rest)) if label.chars().count() < 40 => {
                out.push_str(&format!(
                    "        <p class=\"item\"><strong>{}:</strong> {}</p>\n",
                    html_escape(label),
                    html_escape(rest.trim())
                ));
            }
            _ => out.push_str(&format!(
                "        <p class=\"{plain_class}\">{}</p>\n",
                html_escape(line)
            )),
        }
    }
    out
}

fn projects_table(text: &str) -> String {
    let mut out = String::from("        <table class=\"projects-table\">\n");
    out.push_str(
        "        <tr><th style=\"width:30%\">Project / Role</th><th style=\"width:70%\">Description</th></tr>\n",
    );
    for (name, description) in project_entries(text) {
        out.push_str(&format!(
            "        <tr><td><strong>{}</strong></td><td>{}</td></tr>\n",
            html_escape(&name),
            html_escape(&description)
        ));
    }
    out.push_str("        </table>\n");
    out
}

fn collapse_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// First non-blank line is the name, the rest joined into the description.
fn name_and_description(lines: &[&str]) -> Option<(String, String)> {
    let mut lines = lines.iter().map(|l| l.trim()).filter(|l| !l.is_empty());
    let name = lines.next()?.to_string();
    let description = lines.collect::<Vec<_>>().join(" ");
    Some((name, description))
}

/// Splits free-form project text into `(name, description)` rows, trying
/// numbered entries, then `Name of project` markers, then role and project
/// keywords. Mostly fragmentary results collapse into one row.
pub fn project_entries(text: &str) -> Vec<(String, String)> {
    let text = text.trim();
    let mut entries = numbered_entries(text);
    if entries.is_empty() && text.contains("Name of project") {
        entries = marked_entries(text);
    }
    if entries.is_empty() {
        entries = keyword_entries(text);
    }
    if entries.is_empty() {
        entries.push((PROJECT_FALLBACK_NAME.to_string(), collapse_ws(text)));
    }

    let fragmented = entries
        .iter()
        .filter(|(name, _)| {
            name.chars().count() < 20
                || name.ends_with("and")
                || name.split_whitespace().count() <= 2
        })
        .count();
    if entries.len() > 2 && fragmented * 2 > entries.len() {
        let combined = entries
            .iter()
            .flat_map(|(name, desc)| [name.as_str(), desc.as_str()])
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        entries = vec![(PROJECT_FALLBACK_NAME.to_string(), collapse_ws(&combined))];
    }
    entries
}

/// Rest of the line after a leading `(N)`, `N.` or `N)` marker.
fn numbered_marker(line: &str) -> Option<&str> {
    let t = line.trim_start();
    let (body, close) = match t.strip_prefix('(') {
        Some(inner) => (inner, &[')'][..]),
        None => (t, &['.', ')'][..]),
    };
    let digits = body.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits == 0 {
        return None;
    }
    let rest = &body[digits..];
    let next = rest.chars().next()?;
    close
        .contains(&next)
        .then(|| rest[next.len_utf8()..].trim_start())
}

fn numbered_entries(text: &str) -> Vec<(String, String)> {
    let mut groups: Vec<Vec<&str>> = Vec::new();
    for line in text.lines() {
        match numbered_marker(line) {
            Some(rest) => groups.push(vec![rest]),
            None => {
                if let Some(group) = groups.last_mut() {
                    group.push(line);
                }
            }
        }
    }
    if groups.len() < 2 {
        return Vec::new();
    }
    groups
        .iter()
        .filter_map(|g| name_and_description(g))
        .collect()
}

fn marked_entries(text: &str) -> Vec<(String, String)> {
    const MARKER: &str = "name of project";
    let lower = text.to_ascii_lowercase();
    let starts: Vec<usize> = lower.match_indices(MARKER).map(|(i, _)| i).collect();

    let mut entries = Vec::new();
    for (n, &start) in starts.iter().enumerate() {
        let end = starts.get(n + 1).copied().unwrap_or(text.len());
        let part = text[start + MARKER.len()..end]
            .trim_start()
            .trim_start_matches(':')
            .trim();
        let lines: Vec<&str> = part.lines().collect();
        if let Some(entry) = name_and_description(&lines) {
            entries.push(entry);
        }
    }
    entries
}

const HEADER_WORDS: [&str; 5] = [
    "project name",
    "company name",
    "project role",
    "activities",
    "name of the assignment",
];
const ROLE_WORDS: [&str; 9] = [
    "Developer",
    "Engineer",
    "Designer",
    "Analyst",
    "Manager",
    "Lead",
    "Expert",
    "Specialist",
    "Architect",
];
const PROJECT_WORDS: [&str; 7] = [
    "System",
    "Application",
    "Website",
    "Portal",
    "Platform",
    "Solution",
    "Infrastructure",
];

/// Table header rows copied out of the source CV.
fn is_header_row(line: &str) -> bool {
    let lower = line.to_lowercase();
    if line.chars().count() >= 60 || !HEADER_WORDS.iter().any(|h| lower.contains(h)) {
        return false;
    }
    let mut remaining = lower;
    for h in HEADER_WORDS {
        remaining = remaining.replace(h, "");
    }
    remaining.trim().chars().count() < 10
}

fn keyword_entries(text: &str) -> Vec<(String, String)> {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !is_header_row(l))
        .collect();

    let mut entries = Vec::new();
    let mut current: Option<String> = None;
    let mut desc: Vec<&str> = Vec::new();

    for line in lines {
        let chars = line.chars().count();
        let words = line.split_whitespace().count();
        let is_role_title = chars < 100
            && (ROLE_WORDS.iter().any(|k| line.contains(k))
                || PROJECT_WORDS.iter().any(|k| line.contains(k)))
            && !line.ends_with(',')
            && words <= 10;
        let is_short_id = chars < 40
            && (2..=4).contains(&words)
            && !line.ends_with(',')
            && !line.ends_with('.')
            && chars > 5;

        if is_role_title || (is_short_id && current.is_none()) {
            if let Some(name) = current.take() {
                entries.push((name, desc.join(" ")));
            }
            current = Some(line.to_string());
            desc.clear();
        } else {
            desc.push(line);
        }
    }

    match current {
        Some(name) => entries.push((name, desc.join(" "))),
        None if !desc.is_empty() => {
            entries.push((PROJECT_FALLBACK_NAME.to_string(), desc.join(" ")));
        }
        None => {}
    }
    entries
}

/// Employer named in the certification paragraph.
pub fn current_employer(record: &CvRecord, default_employer: &str) -> String {
    if let Some(job) = record.employment.iter().find(|r| r.current) {
        let company = strip_list_number(first_line(&job.employer));
        if !company.is_empty() {
            return company.to_string();
        }
    }
    if let Some(job) = record.employment.first() {
        let mut company = strip_list_number(first_line(&job.employer));
        if let Some((_, after)) = company.split_once("Organization name:") {
            company = after.trim();
        }
        if company.chars().count() > 3 {
            return company.to_string();
        }
    }
    default_employer.to_string()
}

fn first_line(s: &str) -> &str {
    s.lines().next().unwrap_or("").trim()
}

/// `3. Acme Ltd` becomes `Acme Ltd`.
fn strip_list_number(s: &str) -> &str {
    let digits = s.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits > 0 {
        if let Some(rest) = s[digits..].strip_prefix('.') {
            return rest.trim_start();
        }
    }
    s
}
