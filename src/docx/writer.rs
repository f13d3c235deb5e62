//! Raw body XML for blocks appended to an existing package.

use super::{Align, Block, Figure, Para, PictureFormat, Run};
use anyhow::{bail, Result};
use quick_xml::escape::escape;
use std::collections::BTreeSet;

const NS_WP: &str = "http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing";
const NS_A: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
const NS_PIC: &str = "http://schemas.openxmlformats.org/drawingml/2006/picture";
const NS_R: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

/// An image part produced while rendering, waiting to be added to the package.
#[derive(Debug, Clone)]
pub struct MediaPart {
    pub rel_id: String,
    /// Zip entry name, e.g. `word/media/image3.png`.
    pub part_name: String,
    /// Relationship target relative to `word/`.
    pub target: String,
    pub format: PictureFormat,
    pub bytes: Vec<u8>,
}

/// Hands out ids that must not collide with what the package already holds.
#[derive(Debug, Clone)]
pub struct IdAllocator {
    pub next_rel: u32,
    pub next_drawing: u32,
    pub next_media: u32,
    pub taken_media: BTreeSet<String>,
}

impl IdAllocator {
    fn rel_id(&mut self) -> String {
        let id = format!("rId{}", self.next_rel);
        self.next_rel += 1;
        id
    }

    fn drawing_id(&mut self) -> u32 {
        let id = self.next_drawing;
        self.next_drawing += 1;
        id
    }

    fn media_name(&mut self, ext: &str) -> String {
        loop {
            let name = format!("image{}.{}", self.next_media, ext);
            self.next_media += 1;
            if !self.taken_media.contains(&format!("word/media/{name}")) {
                self.taken_media.insert(format!("word/media/{name}"));
                return name;
            }
        }
    }
}

pub struct BodyWriter<'a> {
    xml: String,
    media: Vec<MediaPart>,
    ids: &'a mut IdAllocator,
}

impl<'a> BodyWriter<'a> {
    pub fn new(ids: &'a mut IdAllocator) -> Self {
        Self {
            xml: String::new(),
            media: Vec::new(),
            ids,
        }
    }

    pub fn finish(self) -> (String, Vec<MediaPart>) {
        (self.xml, self.media)
    }

    pub fn write_blocks(&mut self, blocks: &[Block]) -> Result<()> {
        for block in blocks {
            self.write_block(block)?;
        }
        Ok(())
    }

    /// Tables and tables of contents only appear in fresh documents and
    /// cannot be spliced into an existing body.
    pub fn write_block(&mut self, block: &Block) -> Result<()> {
        match block {
            Block::Heading {
                level,
                text,
                centered,
            } => {
                let style = match level {
                    0 => "Title".to_string(),
                    n => format!("Heading{}", (*n).min(9)),
                };
                let mut para = Para::text(text.as_str()).style(&style);
                if *centered {
                    para = para.center();
                }
                self.write_para(&para);
            }
            Block::Paragraph(para) => self.write_para(para),
            Block::Figure(figure) => self.write_figure(figure),
            Block::PageBreak => self.xml.push_str(r#"<w:p><w:r><w:br w:type="page"/></w:r></w:p>"#),
            Block::Table(_) => bail!("a table cannot be spliced into an existing document"),
            Block::TableOfContents => {
                bail!("a table of contents cannot be spliced into an existing document")
            }
        }
        Ok(())
    }

    fn write_para(&mut self, para: &Para) {
        self.xml.push_str("<w:p>");
        let has_props = para.style.is_some() || para.indent_left.is_some() || para.align.is_some();
        if has_props {
            self.xml.push_str("<w:pPr>");
            if let Some(style) = &para.style {
                self.xml
                    .push_str(&format!(r#"<w:pStyle w:val="{}"/>"#, escape(style)));
            }
            if let Some(indent) = para.indent_left {
                self.xml.push_str(&format!(r#"<w:ind w:left="{indent}"/>"#));
            }
            match para.align {
                Some(Align::Center) => self.xml.push_str(r#"<w:jc w:val="center"/>"#),
                Some(Align::Left) => self.xml.push_str(r#"<w:jc w:val="left"/>"#),
                None => {}
            }
            self.xml.push_str("</w:pPr>");
        }
        for run in &para.runs {
            self.write_run(run);
        }
        self.xml.push_str("</w:p>");
    }

    fn write_run(&mut self, run: &Run) {
        self.xml.push_str("<w:r>");
        let has_props = run.bold
            || run.italic
            || run.size.is_some()
            || run.font.is_some()
            || run.color.is_some();
        if has_props {
            self.xml.push_str("<w:rPr>");
            if let Some(font) = &run.font {
                let f = escape(font);
                self.xml.push_str(&format!(
                    r#"<w:rFonts w:ascii="{f}" w:hAnsi="{f}" w:cs="{f}"/>"#
                ));
            }
            if run.bold {
                self.xml.push_str("<w:b/>");
            }
            if run.italic {
                self.xml.push_str("<w:i/>");
            }
            if let Some(color) = &run.color {
                self.xml
                    .push_str(&format!(r#"<w:color w:val="{}"/>"#, escape(color)));
            }
            if let Some(size) = run.size {
                self.xml
                    .push_str(&format!(r#"<w:sz w:val="{size}"/><w:szCs w:val="{size}"/>"#));
            }
            self.xml.push_str("</w:rPr>");
        }
        for (i, part) in run.text.split('\n').enumerate() {
            if i > 0 {
                self.xml.push_str("<w:br/>");
            }
            if !part.is_empty() {
                self.xml.push_str(&format!(
                    r#"<w:t xml:space="preserve">{}</w:t>"#,
                    escape(part)
                ));
            }
        }
        self.xml.push_str("</w:r>");
    }

    fn write_figure(&mut self, figure: &Figure) {
        if let Some(picture) = &figure.picture {
            let ext = picture.format.extension();
            let file_name = self.ids.media_name(ext);
            let rel_id = self.ids.rel_id();
            let drawing_id = self.ids.drawing_id();
            let cx = figure.width_emu;
            let cy = picture.height_for(cx);

            self.xml.push_str(r#"<w:p><w:pPr><w:jc w:val="center"/></w:pPr><w:r><w:drawing>"#);
            self.xml.push_str(&format!(
                r#"<wp:inline xmlns:wp="{NS_WP}" distT="0" distB="0" distL="0" distR="0"><wp:extent cx="{cx}" cy="{cy}"/><wp:docPr id="{drawing_id}" name="Picture {drawing_id}"/><wp:cNvGraphicFramePr><a:graphicFrameLocks xmlns:a="{NS_A}" noChangeAspect="1"/></wp:cNvGraphicFramePr>"#
            ));
            self.xml.push_str(&format!(
                r#"<a:graphic xmlns:a="{NS_A}"><a:graphicData uri="{NS_PIC}"><pic:pic xmlns:pic="{NS_PIC}"><pic:nvPicPr><pic:cNvPr id="{drawing_id}" name="{file_name}"/><pic:cNvPicPr/></pic:nvPicPr>"#
            ));
            self.xml.push_str(&format!(
                r#"<pic:blipFill><a:blip xmlns:r="{NS_R}" r:embed="{rel_id}"/><a:stretch><a:fillRect/></a:stretch></pic:blipFill>"#
            ));
            self.xml.push_str(&format!(
                r#"<pic:spPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="{cx}" cy="{cy}"/></a:xfrm><a:prstGeom prst="rect"><a:avLst/></a:prstGeom></pic:spPr></pic:pic></a:graphicData></a:graphic></wp:inline>"#
            ));
            self.xml.push_str("</w:drawing></w:r></w:p>");

            self.media.push(MediaPart {
                rel_id,
                part_name: format!("word/media/{file_name}"),
                target: format!("media/{file_name}"),
                format: picture.format,
                bytes: picture.bytes.clone(),
            });
        }
        if let Some(caption) = &figure.caption {
            self.write_para(caption);
        }
    }
}
