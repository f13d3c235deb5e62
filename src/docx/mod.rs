//! Minimal WordprocessingML support: the blocks the renderers emit, fresh
//! documents built with `docx-rs`, a zip package patched in place, and a
//! body reader.

pub mod compose;
pub mod package;
pub mod reader;
pub mod writer;

use anyhow::{anyhow, Context, Result};
use std::io::Cursor;
use std::path::Path;

pub use compose::DocumentStyle;
pub use package::Package;
pub use reader::BodyItem;

pub const EMU_PER_INCH: f64 = 914_400.0;
pub const EMU_PER_CM: f64 = 360_000.0;

pub fn inches(v: f32) -> u64 {
    (v as f64 * EMU_PER_INCH).round() as u64
}

pub fn cm(v: f32) -> u64 {
    (v as f64 * EMU_PER_CM).round() as u64
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Run {
    pub text: String,
    pub bold: bool,
    pub italic: bool,
    /// Half-points, as stored in `w:sz`.
    pub size: Option<u32>,
    pub font: Option<String>,
    pub color: Option<String>,
}

impl Run {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub fn italic(mut self) -> Self {
        self.italic = true;
        self
    }

    pub fn size_pt(mut self, pt: u32) -> Self {
        self.size = Some(pt * 2);
        self
    }

    pub fn font(mut self, name: &str) -> Self {
        self.font = Some(name.to_string());
        self
    }

    pub fn color(mut self, hex: &str) -> Self {
        self.color = Some(hex.to_string());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Para {
    pub runs: Vec<Run>,
    pub style: Option<String>,
    pub align: Option<Align>,
    /// Twips.
    pub indent_left: Option<u32>,
}

impl Para {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::new().run(Run::new(text))
    }

    pub fn run(mut self, run: Run) -> Self {
        self.runs.push(run);
        self
    }

    pub fn style(mut self, style: &str) -> Self {
        self.style = Some(style.to_string());
        self
    }

    pub fn center(mut self) -> Self {
        self.align = Some(Align::Center);
        self
    }

    pub fn indent(mut self, twips: u32) -> Self {
        self.indent_left = Some(twips);
        self
    }

    /// Italic caption, centered under a figure.
    pub fn caption(text: impl Into<String>, size_pt: u32) -> Self {
        Self::new()
            .center()
            .run(Run::new(text).italic().size_pt(size_pt))
    }

    pub fn plain_text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.iter().all(|r| r.text.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PictureFormat {
    Png,
    Jpeg,
    Gif,
    Bmp,
}

impl PictureFormat {
    pub fn extension(self) -> &'static str {
        match self {
            PictureFormat::Png => "png",
            PictureFormat::Jpeg => "jpeg",
            PictureFormat::Gif => "gif",
            PictureFormat::Bmp => "bmp",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            PictureFormat::Png => "image/png",
            PictureFormat::Jpeg => "image/jpeg",
            PictureFormat::Gif => "image/gif",
            PictureFormat::Bmp => "image/bmp",
        }
    }
}

/// Image bytes whose format and pixel size have been probed.
#[derive(Clone, PartialEq)]
pub struct Picture {
    pub bytes: Vec<u8>,
    pub format: PictureFormat,
    pub width_px: u32,
    pub height_px: u32,
}

impl std::fmt::Debug for Picture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Picture")
            .field("bytes", &self.bytes.len())
            .field("format", &self.format)
            .field("width_px", &self.width_px)
            .field("height_px", &self.height_px)
            .finish()
    }
}

impl Picture {
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        let reader = image::ImageReader::new(Cursor::new(&bytes))
            .with_guessed_format()
            .context("probe image format")?;
        let format = match reader.format() {
            Some(image::ImageFormat::Png) => PictureFormat::Png,
            Some(image::ImageFormat::Jpeg) => PictureFormat::Jpeg,
            Some(image::ImageFormat::Gif) => PictureFormat::Gif,
            Some(image::ImageFormat::Bmp) => PictureFormat::Bmp,
            Some(other) => return Err(anyhow!("unsupported image format: {other:?}")),
            None => return Err(anyhow!("unrecognized image data")),
        };
        let (width_px, height_px) = reader.into_dimensions().context("read image dimensions")?;
        if width_px == 0 || height_px == 0 {
            return Err(anyhow!("image has zero size"));
        }
        Ok(Self {
            bytes,
            format,
            width_px,
            height_px,
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let bytes =
            std::fs::read(path).with_context(|| format!("read image: {}", path.display()))?;
        Self::from_bytes(bytes).with_context(|| format!("decode image: {}", path.display()))
    }

    /// Height in EMU that keeps the aspect ratio at `width_emu`.
    pub fn height_for(&self, width_emu: u64) -> u64 {
        (width_emu as f64 * self.height_px as f64 / self.width_px as f64).round() as u64
    }
}

/// A centered picture with an optional caption paragraph below it. A figure
/// without a picture still emits its caption.
#[derive(Debug, Clone, PartialEq)]
pub struct Figure {
    pub picture: Option<Picture>,
    pub width_emu: u64,
    pub caption: Option<Para>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    /// Level 0 is the document title; 1..=3 map to Heading 1..3.
    Heading {
        level: u8,
        text: String,
        centered: bool,
    },
    Paragraph(Para),
    Table(Table),
    Figure(Figure),
    TableOfContents,
    PageBreak,
}

impl Block {
    pub fn heading(level: u8, text: impl Into<String>) -> Self {
        Block::Heading {
            level,
            text: text.into(),
            centered: false,
        }
    }

    pub fn empty() -> Self {
        Block::Paragraph(Para::new())
    }
}
