use propdoc::batch::CvBatch;
use propdoc::config::Config;
use propdoc::cv::template::{looks_like_template, read_template_table};
use propdoc::docx::{compose, Block, DocumentStyle, Para, Table};
use propdoc::extract::{ByExtension, DocxBody, Extractor, SourceKind};

fn row(cells: &[&str]) -> Vec<String> {
    cells.iter().map(|c| c.to_string()).collect()
}

fn template_rows() -> Vec<Vec<String>> {
    vec![
        row(&["1. Proposed Position", ":", "System Engineer"]),
        row(&["2. Name of Staff", ":", "Rahim Uddin"]),
        row(&["3. Date of Birth", ":", "12/04/1985"]),
        row(&["4. Nationality", ":", "Bangladeshi"]),
        row(&["6. Education", ":", "MSc in CSE, BUET"]),
        row(&["7. Other Training", ":", "RHCSA"]),
        row(&["9. Countries of Work Experience", ":", "Bangladesh"]),
        row(&["10. Employment Record", "", ""]),
        row(&["Employer", "From", "To"]),
        row(&["Alpha Systems Ltd", "2019", "Till Date"]),
        row(&["Experience: Managed the data centre", "", ""]),
        row(&["Beta Limited", "2015", "2019"]),
        row(&["11. Subject Matter Specializations: Virtualization", "", ""]),
        row(&["Storage", "", ""]),
        row(&["13. Computer Skills: Linux", "", ""]),
    ]
}

#[test]
fn detects_template_by_staff_labels() {
    assert!(looks_like_template(&template_rows()));
    assert!(!looks_like_template(&[row(&["Layout", "column"])]));
}

#[test]
fn reads_fields_and_employment() {
    let record = read_template_table(&template_rows());

    assert_eq!(record.name, "Rahim Uddin");
    assert_eq!(record.date_of_birth, "12/04/1985");
    assert_eq!(record.nationality, "Bangladeshi");
    assert_eq!(record.education, "MSc in CSE, BUET");
    assert_eq!(record.training, "RHCSA");
    assert_eq!(record.countries, "Bangladesh");

    assert_eq!(record.employment.len(), 2);
    let alpha = &record.employment[0];
    assert_eq!(alpha.employer, "Alpha Systems Ltd");
    assert_eq!(alpha.dates, "2019 Till Date");
    assert!(alpha.current);
    assert_eq!(
        alpha.experience.as_deref(),
        Some("Experience: Managed the data centre")
    );
    assert!(!record.employment[1].current);

    assert_eq!(record.specializations, "Virtualization\nStorage");
    assert_eq!(record.skills, "Linux");
}

#[test]
fn template_docx_goes_through_the_table_reader() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rahim.docx");

    let rows = template_rows();
    compose::write(
        &[Block::Table(Table {
            header: rows[0].clone(),
            rows: rows[1..].to_vec(),
        })],
        &DocumentStyle::default(),
        &path,
    )
    .unwrap();

    let extracted = DocxBody.extract(&path).unwrap();
    assert_eq!(extracted.kind, SourceKind::Docx);
    assert_eq!(extracted.tables.len(), 1);
    assert_eq!(extracted.tables[0][1][2], "Rahim Uddin");

    let batch = CvBatch::new(&Config::default(), ByExtension::default()).unwrap();
    let record = batch.record_from(&extracted, "Fallback Name");
    assert_eq!(record.name, "Rahim Uddin");
    assert_eq!(record.employment.len(), 2);
}

#[test]
fn plain_docx_is_classified_from_its_text() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("plain.docx");

    compose::write(
        &[
            Block::heading(1, "EDUCATION"),
            Block::Paragraph(Para::text("BSc Computer Science, ABC University")),
        ],
        &DocumentStyle::default(),
        &path,
    )
    .unwrap();

    let extracted = ByExtension::default().extract(&path).unwrap();
    let batch = CvBatch::new(&Config::default(), ByExtension::default()).unwrap();
    let record = batch.record_from(&extracted, "Jane");
    assert_eq!(record.name, "Jane");
    assert_eq!(record.education, "BSc Computer Science, ABC University");
}
