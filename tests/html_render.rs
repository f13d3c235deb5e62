use propdoc::cv::html::{current_employer, project_entries};
use propdoc::cv::{render_html, CvRecord, EmploymentRecord};

fn value_cell(html: &str, label: &str) -> String {
    let start = html.find(label).expect("label present");
    let rest = &html[start..];
    let open = rest.find("<td class=\"value\">").unwrap() + "<td class=\"value\">".len();
    let close = rest[open..].find("</td>").unwrap();
    rest[open..open + close].to_string()
}

#[test]
fn missing_fields_render_as_empty_cells() {
    let record = CvRecord {
        name: "Jane Doe".into(),
        ..Default::default()
    };
    let html = render_html(&record, "Team Leader", "");

    assert!(!html.contains("None"));
    for label in [
        "3. Date of Birth",
        "4. Nationality",
        "5. Membership in Professional Society",
        "6. Education",
        "7. Other Training",
        "8. Languages &amp; Degree of Proficiency",
        "9. Countries of Work Experience",
    ] {
        assert_eq!(value_cell(&html, label), "", "{label}");
    }
    assert!(!html.contains("10. Employment Records"));
    assert!(!html.contains("13. Computer Skills"));
    assert!(html.contains("<strong>Team Leader</strong>"));
    assert!(html.contains("<title>CV - Jane Doe</title>"));
}

#[test]
fn values_are_escaped() {
    let record = CvRecord {
        name: "A <b> & \"C\"".into(),
        skills: "Rust & <Go>".into(),
        ..Default::default()
    };
    let html = render_html(&record, "Lead", "");
    assert!(html.contains("A &lt;b&gt; &amp; &quot;C&quot;"));
    assert!(html.contains("Rust &amp; &lt;Go&gt;"));
    assert!(!html.contains("<Go>"));
}

#[test]
fn employment_table_marks_current_job() {
    let mut current = EmploymentRecord::new("XYZ Ltd");
    current.title = Some("Engineer".into());
    current.dates = "JAN 2020 - PRESENT".into();
    current.current = true;
    current.experience = Some("Built the billing platform".into());
    let old = EmploymentRecord::new("Old Corp");

    let record = CvRecord {
        name: "Jane".into(),
        employment: vec![old, current],
        ..Default::default()
    };
    let html = render_html(&record, "Lead", "Fallback Ltd");

    assert!(html.contains("10. Employment Records:"));
    assert!(html.contains(
        "<td>XYZ Ltd <span class=\"current\">(Current)</span></td><td>Engineer</td><td>JAN 2020 - PRESENT</td>"
    ));
    assert!(html.contains("<td>Old Corp</td><td></td><td></td>"));
    assert!(html.contains("class=\"experience\">Built the billing platform</td>"));
    assert!(html.contains("employed by <strong>XYZ Ltd</strong>"));
}

#[test]
fn languages_render_as_table() {
    let record = CvRecord {
        languages: "English\tExcellent\tGood\tGood\nBangla".into(),
        ..Default::default()
    };
    let html = render_html(&record, "Lead", "");
    assert!(html.contains("<td>English</td><td>Excellent</td><td>Good</td><td>Good</td>"));
    assert!(html.contains("<td>Bangla</td><td>Excellent</td><td>Excellent</td><td>Excellent</td>"));
}

#[test]
fn rendering_is_deterministic() {
    let record = CvRecord {
        name: "Jane".into(),
        education: "BSc\nMSc".into(),
        skills: "Linux: RHEL, SUSE\nDocker".into(),
        projects: "1. Portal\nBuilt it\n2. Gateway\nRan it".into(),
        ..Default::default()
    };
    assert_eq!(
        render_html(&record, "Lead", "Acme"),
        render_html(&record, "Lead", "Acme")
    );
}

#[test]
fn labelled_skill_lines_get_bold_label() {
    let record = CvRecord {
        skills: "Linux: RHEL, SUSE".into(),
        ..Default::default()
    };
    let html = render_html(&record, "Lead", "");
    assert!(html.contains("<p class=\"item\"><strong>Linux:</strong> RHEL, SUSE</p>"));
}

#[test]
fn numbered_projects_split_into_rows() {
    let entries = project_entries(
        "1. National Tax Portal Modernisation\nLed the migration to Kubernetes\n2. Central Bank Payment Gateway Upgrade\nDesigned the HA cluster",
    );
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].0, "National Tax Portal Modernisation");
    assert_eq!(entries[0].1, "Led the migration to Kubernetes");
    assert_eq!(entries[1].0, "Central Bank Payment Gateway Upgrade");
}

#[test]
fn unstructured_projects_collapse_to_one_row() {
    let entries = project_entries("worked on many things over the years, mostly internal.");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].0, "Project Experience");
}

#[test]
fn employer_falls_back_to_default() {
    let record = CvRecord::default();
    assert_eq!(current_employer(&record, "Acme Ltd"), "Acme Ltd");

    let record = CvRecord {
        employment: vec![EmploymentRecord::new("3. Beta Limited\nDhaka")],
        ..Default::default()
    };
    assert_eq!(current_employer(&record, "Acme Ltd"), "Beta Limited");
}
