//! Screenshot booklet: one captioned figure per manifest entry, grouped into
//! sections by the part of the title before ` - ` or ` (continued`.

use crate::config::Screenshots;
use crate::docx::{cm, compose, Block, DocumentStyle, Figure, Para, Picture, Run};
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

#[derive(Debug, Clone, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub screenshots: Vec<ManifestEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ManifestEntry {
    pub filename: String,
    pub title: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BookletSummary {
    pub output: String,
    pub sections: usize,
    pub figures: usize,
    pub skipped: Vec<String>,
}

pub fn load_manifest(path: &Path) -> Result<Manifest> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("manifest not found: {}", path.display()))?;
    let manifest: Manifest = serde_json::from_str(&raw)
        .with_context(|| format!("parse manifest: {}", path.display()))?;
    if manifest.screenshots.is_empty() {
        bail!("no screenshots listed in {}", path.display());
    }
    Ok(manifest)
}

/// `Dashboard - Filters (continued)` belongs to section `Dashboard`.
pub fn section_of(title: &str) -> &str {
    let head = title.split(" - ").next().unwrap_or(title);
    head.split(" (continued").next().unwrap_or(head)
}

/// Unique section names in first-seen order.
pub fn sections(entries: &[ManifestEntry]) -> Vec<&str> {
    let mut out: Vec<&str> = Vec::new();
    for entry in entries {
        let section = section_of(&entry.title);
        if !out.contains(&section) {
            out.push(section);
        }
    }
    out
}

fn title_page(cfg: &Screenshots, entries: &[ManifestEntry]) -> Vec<Block> {
    let mut blocks = vec![Block::Heading {
        level: 0,
        text: cfg.title.clone(),
        centered: true,
    }];
    if !cfg.subtitle.is_empty() {
        blocks.push(Block::Paragraph(
            Para::new().center().run(Run::new(&cfg.subtitle).size_pt(16)),
        ));
    }
    blocks.push(Block::empty());
    if !cfg.date.is_empty() {
        blocks.push(Block::Paragraph(
            Para::new().center().run(Run::new(&cfg.date).size_pt(12)),
        ));
    }
    blocks.push(Block::empty());
    blocks.push(Block::empty());

    blocks.push(Block::heading(1, "Table of Contents"));
    for (i, section) in sections(entries).iter().enumerate() {
        blocks.push(Block::Paragraph(Para::text(format!("{}. {section}", i + 1))));
    }
    blocks.push(Block::PageBreak);
    blocks
}

/// Renders the booklet blocks. Images are resolved relative to `image_dir`;
/// missing files are skipped, undecodable ones keep their caption.
pub fn booklet_blocks(
    cfg: &Screenshots,
    entries: &[ManifestEntry],
    image_dir: &Path,
) -> (Vec<Block>, Vec<String>) {
    let mut blocks = title_page(cfg, entries);
    let mut skipped = Vec::new();
    let mut current: Option<&str> = None;
    let mut figure = 1;

    for entry in entries {
        let section = section_of(&entry.title);
        if current != Some(section) {
            if current.is_some() {
                blocks.push(Block::PageBreak);
            }
            blocks.push(Block::heading(1, section));
            current = Some(section);
        }

        let path = image_dir.join(&entry.filename);
        if !path.is_file() {
            warn!("image not found: {}", path.display());
            skipped.push(entry.filename.clone());
            continue;
        }
        let picture = match Picture::load(&path) {
            Ok(p) => Some(p),
            Err(err) => {
                warn!("image skipped, caption kept: {err:#}");
                None
            }
        };

        let caption = format!("Figure {figure}: {}", entry.title);
        info!("added {caption}");
        blocks.push(Block::Figure(Figure {
            picture,
            width_emu: cm(cfg.image_width_cm),
            caption: Some(Para::caption(caption, 10)),
        }));
        blocks.push(Block::empty());
        figure += 1;
    }

    (blocks, skipped)
}

pub fn build(cfg: &Screenshots, manifest_path: &Path, output: &Path) -> Result<BookletSummary> {
    let manifest = load_manifest(manifest_path)?;
    let image_dir = manifest_path.parent().unwrap_or_else(|| Path::new("."));

    let (blocks, skipped) = booklet_blocks(cfg, &manifest.screenshots, image_dir);
    let figures = compose::write(&blocks, &DocumentStyle::default(), output)?;

    info!(
        "booklet saved figures={} skipped={} out={}",
        figures,
        skipped.len(),
        output.display()
    );
    Ok(BookletSummary {
        output: output.display().to_string(),
        sections: sections(&manifest.screenshots).len(),
        figures,
        skipped,
    })
}
