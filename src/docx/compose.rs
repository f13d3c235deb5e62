//! Fresh documents built with `docx-rs`. Patching an existing package goes
//! through [`super::Package`] instead.

use super::{Align, Block, Figure, Para, Picture, PictureFormat, Run, Table};
use crate::util::ensure_parent;
use anyhow::{Context, Result};
use docx_rs::{
    AbstractNumbering, AlignmentType, BreakType, Docx, IndentLevel, Level, LevelJc, LevelText,
    NumberFormat, Numbering, NumberingId, PageMargin, Paragraph, Pic, RunFonts, Shading,
    SpecialIndentType, Start, Style, StyleType, TableAlignmentType, TableCell, TableOfContents,
    TableRow, WidthType,
};
use std::fs::File;
use std::io::Cursor;
use std::path::Path;
use tracing::debug;

/// Usable width of an A4 page with one-inch margins, in twips.
const TEXT_WIDTH_TWIPS: usize = 9026;
const TABLE_HEADER_FILL: &str = "1F2937";
const BULLET_NUMBERING: usize = 2;

/// Defaults for the body text of a new document.
#[derive(Debug, Clone)]
pub struct DocumentStyle {
    pub font: String,
    pub font_size_pt: u32,
}

impl Default for DocumentStyle {
    fn default() -> Self {
        Self {
            font: "Calibri".into(),
            font_size_pt: 11,
        }
    }
}

/// Renders `blocks` into a new A4 document. Returns the document and the
/// number of images embedded.
pub fn compose(blocks: &[Block], style: &DocumentStyle) -> Result<(Docx, usize)> {
    let mut docx = base(style);
    let mut images = 0;
    for block in blocks {
        docx = match block {
            Block::Heading {
                level,
                text,
                centered,
            } => docx.add_paragraph(heading(*level, text, *centered)),
            Block::Paragraph(para) => docx.add_paragraph(paragraph(para)),
            Block::Table(table) => docx.add_table(grid(table)),
            Block::Figure(figure) => {
                let (picture, caption) = figure_paragraphs(figure)?;
                let mut docx = docx;
                if let Some(p) = picture {
                    docx = docx.add_paragraph(p);
                    images += 1;
                }
                match caption {
                    Some(c) => docx.add_paragraph(c),
                    None => docx,
                }
            }
            Block::TableOfContents => {
                docx.add_table_of_contents(TableOfContents::new().heading_styles_range(1, 3))
            }
            Block::PageBreak => docx.add_paragraph(
                Paragraph::new().add_run(docx_rs::Run::new().add_break(BreakType::Page)),
            ),
        };
    }
    debug!("composed blocks={} images={}", blocks.len(), images);
    Ok((docx, images))
}

pub fn save(docx: Docx, path: &Path) -> Result<()> {
    ensure_parent(path)?;
    let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
    docx.build()
        .pack(file)
        .with_context(|| format!("write docx {}", path.display()))?;
    Ok(())
}

/// Composes `blocks` and writes them to `path`. Returns the image count.
pub fn write(blocks: &[Block], style: &DocumentStyle, path: &Path) -> Result<usize> {
    let (docx, images) = compose(blocks, style)?;
    save(docx, path)?;
    Ok(images)
}

fn base(style: &DocumentStyle) -> Docx {
    let font = style.font.as_str();
    let mut docx = Docx::new()
        .page_size(11906, 16838)
        .page_margin(
            PageMargin::new()
                .top(1440)
                .bottom(1440)
                .left(1440)
                .right(1440),
        )
        .default_fonts(RunFonts::new().ascii(font).hi_ansi(font).cs(font))
        .default_size(style.font_size_pt as usize * 2)
        .add_style(
            Style::new("Title", StyleType::Paragraph)
                .name("Title")
                .bold()
                .size(48)
                .color("17365D"),
        )
        .add_style(Style::new("NoSpacing", StyleType::Paragraph).name("No Spacing"))
        .add_style(Style::new("ListBullet", StyleType::Paragraph).name("List Bullet"))
        .add_abstract_numbering(
            AbstractNumbering::new(BULLET_NUMBERING).add_level(
                Level::new(
                    0,
                    Start::new(1),
                    NumberFormat::new("bullet"),
                    LevelText::new("\u{2022}"),
                    LevelJc::new("left"),
                )
                .indent(Some(360), Some(SpecialIndentType::Hanging(360)), None, None),
            ),
        )
        .add_numbering(Numbering::new(BULLET_NUMBERING, BULLET_NUMBERING));

    for (level, size, color) in [(1, 32, "1F3864"), (2, 26, "2F5496"), (3, 24, "2F5496")] {
        docx = docx.add_style(
            Style::new(&format!("Heading{level}"), StyleType::Paragraph)
                .name(&format!("heading {level}"))
                .bold()
                .size(size)
                .color(color),
        );
    }
    docx
}

fn heading(level: u8, text: &str, centered: bool) -> Paragraph {
    let style = match level {
        0 => "Title".to_string(),
        n => format!("Heading{}", n.min(9)),
    };
    let mut para = Para::text(text).style(&style);
    if centered {
        para = para.center();
    }
    paragraph(&para)
}

fn paragraph(para: &Para) -> Paragraph {
    let mut p = Paragraph::new();
    if let Some(style) = &para.style {
        p = p.style(style);
        if style == "ListBullet" {
            p = p.numbering(NumberingId::new(BULLET_NUMBERING), IndentLevel::new(0));
        }
    }
    match para.align {
        Some(Align::Center) => p = p.align(AlignmentType::Center),
        Some(Align::Left) => p = p.align(AlignmentType::Left),
        None => {}
    }
    if let Some(twips) = para.indent_left {
        p = p.indent(Some(twips as i32), None, None, None);
    }
    for run in &para.runs {
        p = p.add_run(text_run(run));
    }
    p
}

/// Newlines in the text become line breaks inside the run.
fn text_run(run: &Run) -> docx_rs::Run {
    let mut r = docx_rs::Run::new();
    for (i, part) in run.text.split('\n').enumerate() {
        if i > 0 {
            r = r.add_break(BreakType::TextWrapping);
        }
        if !part.is_empty() {
            r = r.add_text(part);
        }
    }
    if run.bold {
        r = r.bold();
    }
    if run.italic {
        r = r.italic();
    }
    if let Some(size) = run.size {
        r = r.size(size as usize);
    }
    if let Some(color) = &run.color {
        r = r.color(color);
    }
    if let Some(font) = &run.font {
        r = r.fonts(RunFonts::new().ascii(font).hi_ansi(font).cs(font));
    }
    r
}

fn grid(table: &Table) -> docx_rs::Table {
    let cols = table.header.len().max(1);
    let width = TEXT_WIDTH_TWIPS / cols;

    let mut rows = Vec::with_capacity(table.rows.len() + 1);
    if !table.header.is_empty() {
        let cells = table
            .header
            .iter()
            .map(|h| {
                let label = Run::new(h.as_str()).bold().color("FFFFFF").size_pt(9);
                TableCell::new()
                    .width(width, WidthType::Dxa)
                    .shading(Shading::new().fill(TABLE_HEADER_FILL))
                    .add_paragraph(paragraph(&Para::new().run(label)))
            })
            .collect();
        rows.push(TableRow::new(cells));
    }
    for row in &table.rows {
        let cells = (0..cols)
            .map(|c| {
                let text = row.get(c).map(String::as_str).unwrap_or("");
                TableCell::new()
                    .width(width, WidthType::Dxa)
                    .add_paragraph(paragraph(&Para::new().run(Run::new(text).size_pt(9))))
            })
            .collect();
        rows.push(TableRow::new(cells));
    }

    docx_rs::Table::new(rows)
        .set_grid(vec![width; cols])
        .align(TableAlignmentType::Center)
}

/// The centered picture paragraph (if any) and the caption paragraph.
fn figure_paragraphs(figure: &Figure) -> Result<(Option<Paragraph>, Option<Paragraph>)> {
    let picture = match &figure.picture {
        Some(picture) => {
            let cx = figure.width_emu;
            let cy = picture.height_for(cx);
            let pic = Pic::new_with_dimensions(png_bytes(picture)?, picture.width_px, picture.height_px)
                .size(cx as u32, cy as u32);
            Some(
                Paragraph::new()
                    .align(AlignmentType::Center)
                    .add_run(docx_rs::Run::new().add_image(pic)),
            )
        }
        None => None,
    };
    Ok((picture, figure.caption.as_ref().map(paragraph)))
}

/// Media parts written by `docx-rs` are PNG; other formats are re-encoded.
fn png_bytes(picture: &Picture) -> Result<Vec<u8>> {
    if picture.format == PictureFormat::Png {
        return Ok(picture.bytes.clone());
    }
    let img = image::load_from_memory(&picture.bytes).context("decode image for re-encoding")?;
    let mut out = Vec::new();
    img.write_to(&mut Cursor::new(&mut out), image::ImageFormat::Png)
        .context("re-encode image as png")?;
    Ok(out)
}
