pub mod types;

use crate::docx::{reader, BodyItem, Package};
use anyhow::{anyhow, Context, Result};
use std::path::Path;
use tracing::debug;

pub use types::{Extracted, SourceKind};

/// Pulls text (and, where the format has them, tables) out of a CV file.
pub trait Extractor {
    fn extract(&self, path: &Path) -> Result<Extracted>;
}

/// Plain text of every page, via `pdf-extract`.
///
/// `pdf-extract` panics on some malformed fonts and encodings; such a panic
/// is turned into an error for that one file.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfText;

impl Extractor for PdfText {
    fn extract(&self, path: &Path) -> Result<Extracted> {
        let text = std::panic::catch_unwind(|| pdf_extract::extract_text(path))
            .map_err(|_| anyhow!("pdf-extract panicked on {}", path.display()))?
            .with_context(|| format!("pdf-extract could not read {}", path.display()))?;
        debug!("pdf text chars={} file={}", text.len(), path.display());
        Ok(Extracted {
            kind: SourceKind::Pdf,
            text,
            tables: Vec::new(),
        })
    }
}

/// Paragraphs and tables of `word/document.xml`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocxBody;

impl Extractor for DocxBody {
    fn extract(&self, path: &Path) -> Result<Extracted> {
        let items = Package::open(path)?
            .body()
            .with_context(|| format!("read document body: {}", path.display()))?;
        let tables: Vec<Vec<Vec<String>>> = items
            .iter()
            .filter_map(BodyItem::as_table)
            .map(|rows| rows.to_vec())
            .collect();
        debug!(
            "docx items={} tables={} file={}",
            items.len(),
            tables.len(),
            path.display()
        );
        Ok(Extracted {
            kind: SourceKind::Docx,
            text: reader::body_text(&items),
            tables,
        })
    }
}

/// Chooses the extractor from the file extension.
#[derive(Debug, Clone, Copy, Default)]
pub struct ByExtension {
    pdf: PdfText,
    docx: DocxBody,
}

impl Extractor for ByExtension {
    fn extract(&self, path: &Path) -> Result<Extracted> {
        match SourceKind::from_path(path) {
            Some(SourceKind::Pdf) => self.pdf.extract(path),
            Some(SourceKind::Docx) => self.docx.extract(path),
            None => Err(anyhow!("unsupported CV format: {}", path.display())),
        }
    }
}
