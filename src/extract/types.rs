use serde::Serialize;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Pdf,
    Docx,
}

impl SourceKind {
    /// By extension, ignoring case.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "pdf" => Some(SourceKind::Pdf),
            "docx" => Some(SourceKind::Docx),
            _ => None,
        }
    }
}

/// Text and tables pulled out of one CV file.
#[derive(Debug, Clone)]
pub struct Extracted {
    pub kind: SourceKind,
    /// Reading-order text, one line per paragraph or table cell.
    pub text: String,
    /// Top-level tables as rows of cell texts. Always empty for PDFs.
    pub tables: Vec<Vec<Vec<String>>>,
}
