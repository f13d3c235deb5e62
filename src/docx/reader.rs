use anyhow::{anyhow, Result};
use quick_xml::events::Event;
use quick_xml::Reader;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BodyItem {
    Paragraph(String),
    /// Rows of cell texts; paragraphs inside a cell are joined with `\n`.
    Table(Vec<Vec<String>>),
}

impl BodyItem {
    pub fn as_table(&self) -> Option<&[Vec<String>]> {
        match self {
            BodyItem::Table(rows) => Some(rows),
            BodyItem::Paragraph(_) => None,
        }
    }
}

/// Reads the top-level paragraphs and tables of a `word/document.xml` body.
/// Nested tables are flattened into the text of their enclosing cell.
pub fn read_body(xml: &str) -> Result<Vec<BodyItem>> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(false);

    let mut items = Vec::new();
    let mut table_depth = 0usize;
    let mut para_depth = 0usize;
    let mut in_text = false;

    let mut para = String::new();
    let mut cell_paras: Vec<String> = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut rows: Vec<Vec<String>> = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                b"tbl" => {
                    table_depth += 1;
                    if table_depth == 1 {
                        rows.clear();
                    }
                }
                b"tr" if table_depth == 1 => row.clear(),
                b"tc" if table_depth == 1 => cell_paras.clear(),
                b"p" => {
                    if para_depth == 0 {
                        para.clear();
                    } else {
                        para.push('\n');
                    }
                    para_depth += 1;
                }
                b"t" => in_text = true,
                b"tab" => para.push('\t'),
                b"br" | b"cr" => para.push('\n'),
                _ => {}
            },
            Ok(Event::Empty(ref e)) => match e.local_name().as_ref() {
                b"tab" => para.push('\t'),
                b"br" | b"cr" => para.push('\n'),
                b"p" if para_depth == 0 => {
                    if table_depth == 0 {
                        items.push(BodyItem::Paragraph(String::new()));
                    } else {
                        cell_paras.push(String::new());
                    }
                }
                _ => {}
            },
            Ok(Event::Text(t)) => {
                if in_text {
                    para.push_str(&t.unescape()?);
                }
            }
            Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"p" => {
                    para_depth = para_depth.saturating_sub(1);
                    if para_depth == 0 {
                        let text = std::mem::take(&mut para);
                        if table_depth == 0 {
                            items.push(BodyItem::Paragraph(text));
                        } else {
                            cell_paras.push(text);
                        }
                    }
                }
                b"tc" if table_depth == 1 => {
                    row.push(cell_paras.join("\n").trim().to_string());
                    cell_paras.clear();
                }
                b"tr" if table_depth == 1 => rows.push(std::mem::take(&mut row)),
                b"tbl" => {
                    if table_depth == 1 {
                        items.push(BodyItem::Table(std::mem::take(&mut rows)));
                    }
                    table_depth = table_depth.saturating_sub(1);
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(anyhow!(
                    "document.xml parse error at {}: {e}",
                    reader.buffer_position()
                ));
            }
            _ => {}
        }
    }

    Ok(items)
}

/// All body text in reading order, one line per paragraph or table cell.
pub fn body_text(items: &[BodyItem]) -> String {
    let mut lines = Vec::new();
    for item in items {
        match item {
            BodyItem::Paragraph(p) => lines.push(p.clone()),
            BodyItem::Table(rows) => {
                for row in rows {
                    for cell in row {
                        if !cell.is_empty() {
                            lines.push(cell.clone());
                        }
                    }
                }
            }
        }
    }
    lines.join("\n")
}
