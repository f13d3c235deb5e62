use super::reader::{self, BodyItem};
use super::writer::{BodyWriter, IdAllocator, MediaPart};
use super::Block;
use crate::util::ensure_parent;
use anyhow::{anyhow, Context, Result};
use quick_xml::escape::escape;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

const DOCUMENT: &str = "word/document.xml";
const DOCUMENT_RELS: &str = "word/_rels/document.xml.rels";
const CONTENT_TYPES: &str = "[Content_Types].xml";
const REL_IMAGE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";

#[derive(Debug, Clone)]
struct Entry {
    name: String,
    data: Vec<u8>,
}

/// An existing `.docx` zip package held fully in memory, patched in place.
#[derive(Debug, Clone)]
pub struct Package {
    entries: Vec<Entry>,
}

impl Package {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
        let mut archive = ZipArchive::new(file)
            .with_context(|| format!("not a zip package: {}", path.display()))?;
        let mut entries = Vec::with_capacity(archive.len());
        for i in 0..archive.len() {
            let mut f = archive
                .by_index(i)
                .with_context(|| format!("read zip entry {i} of {}", path.display()))?;
            if f.is_dir() {
                continue;
            }
            let name = f.name().to_string();
            let mut data = Vec::new();
            f.read_to_end(&mut data)
                .with_context(|| format!("read zip entry {name}"))?;
            entries.push(Entry { name, data });
        }
        let pkg = Self { entries };
        if pkg.entry(DOCUMENT).is_none() {
            return Err(anyhow!("missing {DOCUMENT} in {}", path.display()));
        }
        Ok(pkg)
    }

    pub fn entry(&self, name: &str) -> Option<&[u8]> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.data.as_slice())
    }

    fn set_entry(&mut self, name: &str, data: Vec<u8>) {
        match self.entries.iter_mut().find(|e| e.name == name) {
            Some(e) => e.data = data,
            None => self.entries.push(Entry {
                name: name.to_string(),
                data,
            }),
        }
    }

    fn text_entry(&self, name: &str) -> Result<String> {
        let data = self
            .entry(name)
            .ok_or_else(|| anyhow!("missing package part: {name}"))?;
        Ok(String::from_utf8_lossy(data).into_owned())
    }

    pub fn document_xml(&self) -> Result<String> {
        self.text_entry(DOCUMENT)
    }

    /// `word/media/*` parts in archive order.
    pub fn media(&self) -> Vec<(&str, &[u8])> {
        self.entries
            .iter()
            .filter(|e| e.name.starts_with("word/media/"))
            .map(|e| (e.name.as_str(), e.data.as_slice()))
            .collect()
    }

    /// Top-level paragraphs and tables of the document body.
    pub fn body(&self) -> Result<Vec<BodyItem>> {
        reader::read_body(&self.document_xml()?)
    }

    /// Renders `blocks` and appends them at the end of the body. Returns the
    /// number of images embedded.
    pub fn append(&mut self, blocks: &[Block]) -> Result<usize> {
        let document = self.document_xml()?;
        let rels = match self.entry(DOCUMENT_RELS) {
            Some(data) => String::from_utf8_lossy(data).into_owned(),
            None => DOCUMENT_RELS_XML.to_string(),
        };

        let mut ids = IdAllocator {
            next_rel: max_rel_id(&rels)? + 1,
            next_drawing: max_drawing_id(&document)? + 1,
            next_media: 1,
            taken_media: self
                .entries
                .iter()
                .filter(|e| e.name.starts_with("word/media/"))
                .map(|e| e.name.clone())
                .collect(),
        };

        let mut writer = BodyWriter::new(&mut ids);
        writer.write_blocks(blocks)?;
        let (body_xml, media) = writer.finish();
        debug!(
            "append blocks={} body_bytes={} media={}",
            blocks.len(),
            body_xml.len(),
            media.len()
        );

        let document = splice_body(&document, &body_xml)?;
        self.set_entry(DOCUMENT, document.into_bytes());

        if !media.is_empty() {
            let rels = add_image_relationships(&rels, &media)?;
            self.set_entry(DOCUMENT_RELS, rels.into_bytes());

            let types = self.text_entry(CONTENT_TYPES)?;
            let exts: BTreeSet<(&str, &str)> = media
                .iter()
                .map(|m| (m.format.extension(), m.format.content_type()))
                .collect();
            let types = ensure_default_types(&types, &exts)?;
            self.set_entry(CONTENT_TYPES, types.into_bytes());
        }

        let count = media.len();
        for part in media {
            self.set_entry(&part.part_name, part.bytes);
        }
        Ok(count)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        ensure_parent(path)?;
        let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
        let mut zip = ZipWriter::new(file);
        let opt = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .last_modified_time(zip::DateTime::default());
        for e in &self.entries {
            zip.start_file(e.name.as_str(), opt)
                .with_context(|| format!("start zip entry {}", e.name))?;
            zip.write_all(&e.data)?;
        }
        zip.finish()
            .with_context(|| format!("finish {}", path.display()))?;
        Ok(())
    }
}

/// Inserts `body_xml` before the body-level section properties, or before
/// `</w:body>` when the document has none.
fn splice_body(document: &str, body_xml: &str) -> Result<String> {
    let body_end = document
        .rfind("</w:body>")
        .ok_or_else(|| anyhow!("document.xml has no </w:body>"))?;
    let at = match document[..body_end].rfind("<w:sectPr") {
        // A paragraph-level sectPr is still followed by its </w:p>.
        Some(pos) if !document[pos..body_end].contains("</w:p>") => pos,
        _ => body_end,
    };
    let mut out = String::with_capacity(document.len() + body_xml.len());
    out.push_str(&document[..at]);
    out.push_str(body_xml);
    out.push_str(&document[at..]);
    Ok(out)
}

fn max_rel_id(rels: &str) -> Result<u32> {
    let mut max = 0;
    for id in attribute_values(rels, b"Relationship", b"Id")? {
        if let Some(n) = id.strip_prefix("rId").and_then(|n| n.parse::<u32>().ok()) {
            max = max.max(n);
        }
    }
    Ok(max)
}

fn max_drawing_id(document: &str) -> Result<u32> {
    let mut max = 0;
    for element in [b"docPr".as_slice(), b"cNvPr".as_slice()] {
        for id in attribute_values(document, element, b"id")? {
            if let Ok(n) = id.parse::<u32>() {
                max = max.max(n);
            }
        }
    }
    Ok(max)
}

/// Values of `attr` on every element whose local name is `element`.
fn attribute_values(xml: &str, element: &[u8], attr: &[u8]) -> Result<Vec<String>> {
    let mut reader = Reader::from_str(xml);
    let mut out = Vec::new();
    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => {
                if e.local_name().as_ref() != element {
                    continue;
                }
                for a in e.attributes().flatten() {
                    if a.key.local_name().as_ref() == attr {
                        out.push(a.unescape_value()?.into_owned());
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(anyhow!("xml error at {}: {e}", reader.buffer_position())),
            _ => {}
        }
    }
    Ok(out)
}

fn add_image_relationships(rels: &str, media: &[MediaPart]) -> Result<String> {
    let end = rels
        .rfind("</Relationships>")
        .ok_or_else(|| anyhow!("document.xml.rels has no </Relationships>"))?;
    let mut out = String::with_capacity(rels.len() + media.len() * 160);
    out.push_str(&rels[..end]);
    for m in media {
        out.push_str(&format!(
            r#"<Relationship Id="{}" Type="{REL_IMAGE}" Target="{}"/>"#,
            m.rel_id,
            escape(&m.target)
        ));
    }
    out.push_str(&rels[end..]);
    Ok(out)
}

fn ensure_default_types(types: &str, exts: &BTreeSet<(&str, &str)>) -> Result<String> {
    let known: BTreeSet<String> = attribute_values(types, b"Default", b"Extension")?
        .into_iter()
        .map(|e| e.to_ascii_lowercase())
        .collect();
    let end = types
        .rfind("</Types>")
        .ok_or_else(|| anyhow!("[Content_Types].xml has no </Types>"))?;
    let mut out = types[..end].to_string();
    for (ext, content_type) in exts {
        if !known.contains(*ext) {
            out.push_str(&format!(
                r#"<Default Extension="{ext}" ContentType="{content_type}"/>"#
            ));
        }
    }
    out.push_str(&types[end..]);
    Ok(out)
}

const DOCUMENT_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"></Relationships>"#;
