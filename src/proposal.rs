//! Markdown technical proposal rendered into a `.docx` document.
//!
//! The Markdown subset is whatever the proposal uses: ATX headings, fenced
//! code, pipe tables, bullets, `**Label:**` lines and `*notes*`. Each line is
//! dispatched on its shape; there is no Markdown parser underneath.

use crate::config::{Proposal, SectionImage};
use crate::docx::{compose, inches, Block, DocumentStyle, Figure, Para, Picture, Run, Table};
use anyhow::{Context, Result};
use regex::Regex;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const IMAGE_EXTENSIONS: [&str; 6] = ["", ".png", ".jpg", ".jpeg", ".PNG", ".JPG"];
const BULLET_INDENT_TWIPS: u32 = 360;

#[derive(Debug, Clone, Serialize)]
pub struct ProposalSummary {
    pub output: String,
    pub blocks: usize,
    pub images: usize,
    pub missing_images: Vec<String>,
}

pub struct MarkdownRenderer {
    images: Vec<SectionImage>,
    image_dir: PathBuf,
    image_width_emu: u64,
    bold: Regex,
    link: Regex,
    missing: Vec<String>,
}

impl MarkdownRenderer {
    /// Relative image paths are resolved against `image_dir`.
    pub fn new(cfg: &Proposal, image_dir: &Path) -> Result<Self> {
        Ok(Self {
            images: cfg.images.clone(),
            image_dir: image_dir.to_path_buf(),
            image_width_emu: inches(cfg.image_width_inches),
            bold: Regex::new(r"\*\*(.+?)\*\*").context("compile bold pattern")?,
            link: Regex::new(r"\[(.+?)\]\(.+?\)").context("compile link pattern")?,
            missing: Vec::new(),
        })
    }

    /// Image paths that could not be found while rendering.
    pub fn missing_images(&self) -> &[String] {
        &self.missing
    }

    pub fn render(&mut self, markdown: &str) -> Vec<Block> {
        let lines: Vec<&str> = markdown.lines().collect();
        let mut blocks = Vec::new();
        let mut i = 0;

        while i < lines.len() {
            let line = lines[i];
            let t = line.trim();

            if t.is_empty() || t == "---" {
                i += 1;
                continue;
            }

            if let Some(title) = line.strip_prefix("# ") {
                blocks.push(Block::Heading {
                    level: 0,
                    text: title.trim().to_string(),
                    centered: true,
                });
                i += 1;
                continue;
            }
            if let Some(text) = line.strip_prefix("## ") {
                blocks.push(Block::heading(1, text.trim()));
                self.section_images(text.trim(), &mut blocks);
                i += 1;
                continue;
            }
            if let Some(text) = line.strip_prefix("### ") {
                blocks.push(Block::heading(2, text.trim()));
                self.section_images(text.trim(), &mut blocks);
                i += 1;
                continue;
            }
            if let Some(text) = line.strip_prefix("#### ") {
                blocks.push(Block::heading(3, text.trim()));
                i += 1;
                continue;
            }

            if t.starts_with("```") {
                i += 1;
                let start = i;
                while i < lines.len() && !lines[i].trim().starts_with("```") {
                    i += 1;
                }
                let code = &lines[start..i];
                if !code.is_empty() {
                    blocks.push(Block::Paragraph(code_block(code)));
                }
                i += 1;
                continue;
            }

            if line.contains('|') && lines.get(i + 1).is_some_and(|n| n.contains("---")) {
                let start = i;
                while i < lines.len() && lines[i].contains('|') {
                    i += 1;
                }
                if let Some(table) = parse_table(&lines[start..i]) {
                    blocks.push(Block::Table(table));
                    blocks.push(Block::empty());
                }
                continue;
            }

            blocks.push(Block::Paragraph(self.text_line(t)));
            i += 1;
        }

        blocks
    }

    fn text_line(&self, t: &str) -> Para {
        if let Some(item) = t.strip_prefix("- ").or_else(|| t.strip_prefix("* ")) {
            let text = self.bold.replace_all(item, "$1").replace('`', "");
            return Para::text(text)
                .style("ListBullet")
                .indent(BULLET_INDENT_TWIPS);
        }

        if t.starts_with("**") && t.contains(":**") {
            let clean = t.replace("**", "");
            return match clean.split_once(':') {
                Some((label, rest)) => Para::new()
                    .run(Run::new(format!("{label}:")).bold())
                    .run(Run::new(format!(" {}", rest.trim()))),
                None => Para::text(clean),
            };
        }

        if t.len() >= 2 && t.starts_with('*') && t.ends_with('*') && !t.starts_with("**") {
            return Para::new().run(Run::new(&t[1..t.len() - 1]).italic().size_pt(9));
        }

        let text = self.bold.replace_all(t, "$1").replace('`', "");
        let text = self.link.replace_all(&text, "$1").into_owned();
        Para::text(text)
    }

    /// Figures configured for the heading, each after an empty paragraph.
    fn section_images(&mut self, heading: &str, blocks: &mut Vec<Block>) {
        let matching: Vec<SectionImage> = self
            .images
            .iter()
            .filter(|img| !img.section.is_empty() && heading.contains(img.section.as_str()))
            .cloned()
            .collect();
        for image in matching {
            blocks.push(Block::empty());
            let Some(path) = resolve_image(&self.image_dir, &image.path) else {
                warn!("image not found: {}", image.path);
                self.missing.push(image.path.clone());
                continue;
            };
            let picture = match Picture::load(&path) {
                Ok(p) => Some(p),
                Err(err) => {
                    warn!("image skipped, caption kept: {err:#}");
                    None
                }
            };
            let caption = (!image.caption.is_empty()).then(|| Para::caption(&image.caption, 9));
            info!("added image: {}", path.display());
            blocks.push(Block::Figure(Figure {
                picture,
                width_emu: self.image_width_emu,
                caption,
            }));
        }
    }
}

fn resolve_image(dir: &Path, path: &str) -> Option<PathBuf> {
    let base = if Path::new(path).is_absolute() {
        PathBuf::from(path)
    } else {
        dir.join(path)
    };
    IMAGE_EXTENSIONS
        .iter()
        .map(|ext| PathBuf::from(format!("{}{ext}", base.display())))
        .find(|p| p.is_file())
}

fn code_block(lines: &[&str]) -> Para {
    let mut para = Para::new().style("NoSpacing");
    for line in lines {
        para = para.run(
            Run::new(format!("{line}\n"))
                .font("Courier New")
                .size_pt(8),
        );
    }
    para
}

fn split_row(line: &str) -> Vec<String> {
    line.split('|')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(String::from)
        .collect()
}

/// Header line, separator line, then body rows.
fn parse_table(lines: &[&str]) -> Option<Table> {
    if lines.len() < 2 {
        return None;
    }
    let header: Vec<String> = split_row(lines[0])
        .into_iter()
        .map(|c| c.replace("**", ""))
        .collect();
    if header.is_empty() {
        return None;
    }
    let rows = lines[2..]
        .iter()
        .map(|l| split_row(l))
        .filter(|cells| !cells.is_empty())
        .map(|cells| {
            cells
                .into_iter()
                .take(header.len())
                .map(|c| c.replace("**", "").replace('`', ""))
                .collect()
        })
        .collect();
    Some(Table { header, rows })
}

/// Title, subtitle and table of contents, ending with a page break.
pub fn preamble(cfg: &Proposal) -> Vec<Block> {
    let mut blocks = vec![Block::Heading {
        level: 0,
        text: cfg.title.clone(),
        centered: true,
    }];
    if !cfg.subtitle.is_empty() {
        blocks.push(Block::Paragraph(
            Para::new()
                .center()
                .run(Run::new(&cfg.subtitle).italic().size_pt(12)),
        ));
    }
    blocks.push(Block::empty());
    blocks.push(Block::heading(1, "Table of Contents"));
    blocks.push(Block::TableOfContents);
    if !cfg.toc_note.is_empty() {
        blocks.push(Block::Paragraph(
            Para::new().run(Run::new(&cfg.toc_note).italic().size_pt(8)),
        ));
    }
    blocks.push(Block::PageBreak);
    blocks
}

pub fn build(cfg: &Proposal, markdown_path: &Path, output: &Path) -> Result<ProposalSummary> {
    let markdown = std::fs::read_to_string(markdown_path)
        .with_context(|| format!("read markdown: {}", markdown_path.display()))?;
    let image_dir = markdown_path.parent().unwrap_or_else(|| Path::new("."));

    let mut renderer = MarkdownRenderer::new(cfg, image_dir)?;
    let mut blocks = preamble(cfg);
    blocks.extend(renderer.render(&markdown));

    let style = DocumentStyle {
        font: cfg.font.clone(),
        font_size_pt: cfg.font_size_pt,
    };
    let images = compose::write(&blocks, &style, output)?;
    info!(
        "proposal saved blocks={} images={} out={}",
        blocks.len(),
        images,
        output.display()
    );

    Ok(ProposalSummary {
        output: output.display().to_string(),
        blocks: blocks.len(),
        images,
        missing_images: renderer.missing_images().to_vec(),
    })
}
