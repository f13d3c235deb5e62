use anyhow::{bail, Result};
use propdoc::batch::{list_inputs, CvBatch};
use propdoc::config::{Config, Person};
use propdoc::docx::{compose, Block, DocumentStyle, Para};
use propdoc::extract::{ByExtension, Extracted, Extractor, SourceKind};
use std::path::Path;

/// Treats every input as UTF-8 text, whatever its extension.
struct TextFiles;

impl Extractor for TextFiles {
    fn extract(&self, path: &Path) -> Result<Extracted> {
        let text = std::fs::read_to_string(path)?;
        if text.starts_with("%BROKEN") {
            bail!("cannot parse {}", path.display());
        }
        Ok(Extracted {
            kind: SourceKind::Pdf,
            text,
            tables: Vec::new(),
        })
    }
}

/// Reads the input, then deletes it before the batch can hash it.
struct VanishingInput;

impl Extractor for VanishingInput {
    fn extract(&self, path: &Path) -> Result<Extracted> {
        let text = std::fs::read_to_string(path)?;
        std::fs::remove_file(path)?;
        Ok(Extracted {
            kind: SourceKind::Pdf,
            text,
            tables: Vec::new(),
        })
    }
}

/// A one-page PDF whose only font is a Type1 font with the given `/Encoding`.
fn pdf_with_font_encoding(encoding: &str) -> Vec<u8> {
    let content = "BT /F1 12 Tf 72 720 Td (Hello) Tj ET";
    let objects = [
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
        "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] \
/Resources << /Font << /F1 4 0 R >> >> /Contents 5 0 R >>"
            .to_string(),
        format!("<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /{encoding} >>"),
        format!(
            "<< /Length {} >>\nstream\n{content}\nendstream",
            content.len()
        ),
    ];

    let mut pdf = b"%PDF-1.4\n".to_vec();
    let mut offsets = Vec::new();
    for (i, body) in objects.iter().enumerate() {
        offsets.push(pdf.len());
        pdf.extend_from_slice(format!("{} 0 obj\n{body}\nendobj\n", i + 1).as_bytes());
    }
    let xref = pdf.len();
    let mut tail = format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1);
    for offset in offsets {
        tail.push_str(&format!("{offset:010} 00000 n \n"));
    }
    tail.push_str(&format!(
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref}\n%%EOF\n",
        objects.len() + 1
    ));
    pdf.extend_from_slice(tail.as_bytes());
    pdf
}

const JANE: &str = "\
Jane Doe
Date of Birth: 02 May 1988
EDUCATION
BSc Computer Science, ABC University
WORK EXPERIENCE
Engineer | XYZ Ltd
JAN 2020 - PRESENT
PROFESSIONAL SKILL
Kubernetes and OpenShift administration
REFERENCE
Dr. Referee, Chairman";

const KARIM: &str = "\
PROFILE SUMMARY
Cloud infrastructure specialist with banking experience
CERTIFICATES
Red Hat RH294 Automation";

fn setup() -> (tempfile::TempDir, Config) {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in");
    std::fs::create_dir_all(&input).unwrap();
    std::fs::write(input.join("Jane_Doe CV.pdf"), JANE).unwrap();
    std::fs::write(input.join("karim_hasan.docx"), KARIM).unwrap();
    std::fs::write(input.join("zz_broken.pdf"), "%BROKEN").unwrap();
    std::fs::write(input.join("~$lock.docx"), "lock").unwrap();
    std::fs::write(input.join("notes.txt"), "ignored").unwrap();

    let mut cfg = Config::default();
    cfg.cv.people = vec![Person {
        pattern: "KARIM".into(),
        name: Some("Md. Karim Hasan".into()),
        position: Some("Cloud Architect".into()),
    }];
    (dir, cfg)
}

#[test]
fn batch_output_is_byte_identical_across_runs() {
    let (dir, cfg) = setup();
    let input = dir.path().join("in");
    let out = dir.path().join("out");
    let batch = CvBatch::new(&cfg, TextFiles).unwrap();

    let first = batch.run(&input, &out).unwrap();
    let jane_1 = std::fs::read(out.join("Jane Doe.html")).unwrap();
    let karim_1 = std::fs::read(out.join("Md. Karim Hasan.html")).unwrap();

    let second = batch.run(&input, &out).unwrap();
    let jane_2 = std::fs::read(out.join("Jane Doe.html")).unwrap();
    let karim_2 = std::fs::read(out.join("Md. Karim Hasan.html")).unwrap();

    assert_eq!(jane_1, jane_2);
    assert_eq!(karim_1, karim_2);
    let hashes = |r: &propdoc::batch::BatchReport| {
        r.processed
            .iter()
            .map(|f| f.output_sha256.clone())
            .collect::<Vec<_>>()
    };
    assert_eq!(hashes(&first), hashes(&second));
    assert_eq!(first.config_sha256, second.config_sha256);
}

#[test]
fn failed_file_does_not_stop_the_batch() {
    let (dir, cfg) = setup();
    let input = dir.path().join("in");
    let out = dir.path().join("out");

    let report = CvBatch::new(&cfg, TextFiles)
        .unwrap()
        .run(&input, &out)
        .unwrap();

    assert_eq!(report.processed.len(), 2);
    assert_eq!(report.failed.len(), 1);
    assert!(report.failed[0].input.ends_with("zz_broken.pdf"));
    assert!(report.failed[0].error.contains("cannot parse"));

    let names: Vec<&str> = report.processed.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, ["Jane Doe", "Md. Karim Hasan"]);
    assert_eq!(report.processed[1].position, "Cloud Architect");
    assert_eq!(report.processed[0].position, "Technical Expert");
    assert_eq!(report.processed[0].employment_records, 1);
}

#[test]
fn rendered_sheet_reflects_the_cv() {
    let (dir, cfg) = setup();
    let input = dir.path().join("in");
    let out = dir.path().join("out");
    CvBatch::new(&cfg, TextFiles)
        .unwrap()
        .run(&input, &out)
        .unwrap();

    let jane = std::fs::read_to_string(out.join("Jane Doe.html")).unwrap();
    assert!(jane.contains("<pre>BSc Computer Science, ABC University</pre>"));
    assert!(jane.contains("02 May 1988"));
    assert!(jane.contains("(Current)"));
    assert!(jane.contains("Kubernetes and OpenShift administration"));
    assert!(!jane.contains("Referee"));
    assert!(!jane.contains("None"));

    let karim = std::fs::read_to_string(out.join("Md. Karim Hasan.html")).unwrap();
    assert!(karim.contains("<pre>Red Hat RH294 Automation</pre>"));
    assert!(karim.contains("Cloud infrastructure specialist with banking experience"));
}

#[test]
fn stale_sheets_are_removed_before_a_run() {
    let (dir, cfg) = setup();
    let input = dir.path().join("in");
    let out = dir.path().join("out");
    std::fs::create_dir_all(&out).unwrap();
    std::fs::write(out.join("Old Person.html"), "stale").unwrap();
    std::fs::write(out.join("keep.txt"), "keep").unwrap();

    CvBatch::new(&cfg, TextFiles)
        .unwrap()
        .run(&input, &out)
        .unwrap();
    assert!(!out.join("Old Person.html").exists());
    assert!(out.join("keep.txt").exists());
}

#[test]
fn inputs_are_filtered_and_sorted() {
    let (dir, _) = setup();
    let input = dir.path().join("in");

    let names = |exclude: &[String]| -> Vec<String> {
        list_inputs(&input, exclude)
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect()
    };
    assert_eq!(
        names(&[]),
        ["Jane_Doe CV.pdf", "karim_hasan.docx", "zz_broken.pdf"]
    );
    assert_eq!(
        names(&["broken".to_string()]),
        ["Jane_Doe CV.pdf", "karim_hasan.docx"]
    );
}

#[test]
fn pdf_that_crashes_the_parser_is_a_failed_file() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in");
    let out = dir.path().join("out");
    std::fs::create_dir_all(&input).unwrap();
    std::fs::write(
        input.join("a_bad.pdf"),
        pdf_with_font_encoding("BogusEncoding"),
    )
    .unwrap();
    compose::write(
        &[
            Block::heading(1, "EDUCATION"),
            Block::Paragraph(Para::text("BSc Computer Science, ABC University")),
        ],
        &DocumentStyle::default(),
        &input.join("b_good.docx"),
    )
    .unwrap();

    let report = CvBatch::new(&Config::default(), ByExtension::default())
        .unwrap()
        .run(&input, &out)
        .unwrap();

    assert_eq!(report.failed.len(), 1);
    assert!(report.failed[0].input.ends_with("a_bad.pdf"));
    assert!(report.failed[0].error.contains("panicked"));
    assert_eq!(report.processed.len(), 1);
    assert!(report.processed[0].input.ends_with("b_good.docx"));
    assert!(std::path::Path::new(&report.processed[0].output).exists());
}

#[test]
fn no_sheet_is_left_behind_when_the_input_cannot_be_hashed() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in");
    let out = dir.path().join("out");
    std::fs::create_dir_all(&input).unwrap();
    std::fs::write(input.join("Jane_Doe CV.pdf"), JANE).unwrap();

    let report = CvBatch::new(&Config::default(), VanishingInput)
        .unwrap()
        .run(&input, &out)
        .unwrap();

    assert_eq!(report.failed.len(), 1);
    assert!(report.processed.is_empty());
    let sheets = std::fs::read_dir(&out)
        .unwrap()
        .filter(|e| {
            e.as_ref()
                .unwrap()
                .path()
                .extension()
                .is_some_and(|x| x == "html")
        })
        .count();
    assert_eq!(sheets, 0);
}
