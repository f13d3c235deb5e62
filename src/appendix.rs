use crate::config::Appendix;
use crate::docx::{inches, Block, Figure, Package, Para, Picture, Run};
use anyhow::Result;
use serde::Serialize;
use std::path::Path;
use tracing::{info, warn};

#[derive(Debug, Clone, Serialize)]
pub struct AppendixSummary {
    pub output: String,
    pub images_found: usize,
    pub images_embedded: usize,
}

/// Number in a media file stem: `word/media/image12.png` gives 12.
pub fn media_number(name: &str) -> Option<u64> {
    let file = name.rsplit('/').next().unwrap_or(name);
    let stem = file.split('.').next().unwrap_or(file);
    let digits: String = stem.chars().filter(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

/// Media parts ordered by the number in their name; unnumbered ones last, by name.
pub fn ordered_media<'a>(media: &[(&'a str, &'a [u8])]) -> Vec<(&'a str, &'a [u8])> {
    let mut out = media.to_vec();
    out.sort_by(|a, b| match (media_number(a.0), media_number(b.0)) {
        (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.0.cmp(b.0)),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => a.0.cmp(b.0),
    });
    out
}

pub fn caption_for(template: &str, n: usize) -> String {
    template.replace("{n}", &n.to_string())
}

/// Heading, intro and one captioned figure per source image.
pub fn appendix_blocks(cfg: &Appendix, media: &[(&str, &[u8])]) -> Vec<Block> {
    let mut intro = Para::new();
    if !cfg.intro.is_empty() {
        intro = intro.run(Run::new(&cfg.intro));
    }
    if !cfg.intro_italic.is_empty() {
        intro = intro.run(Run::new(&cfg.intro_italic).italic());
    }

    let mut blocks = vec![
        Block::PageBreak,
        Block::heading(1, &cfg.heading),
        Block::Paragraph(intro),
        Block::empty(),
    ];

    let width = inches(cfg.image_width_inches);
    for (i, (name, bytes)) in ordered_media(media).into_iter().enumerate() {
        let n = i + 1;
        let picture = match Picture::from_bytes(bytes.to_vec()) {
            Ok(p) => Some(p),
            Err(err) => {
                warn!("unsupported image {name}, caption kept: {err:#}");
                None
            }
        };
        blocks.push(Block::Figure(Figure {
            picture,
            width_emu: width,
            caption: Some(Para::caption(caption_for(&cfg.caption, n), 9)),
        }));
        blocks.push(Block::empty());
        if n % 10 == 0 {
            info!("added {n} images");
        }
    }
    blocks
}

/// Appends every image of `source` to `target` and writes the result to
/// `output`, which may be the target itself.
pub fn merge(cfg: &Appendix, target: &Path, source: &Path, output: &Path) -> Result<AppendixSummary> {
    let mut doc = Package::open(target)?;
    let screenshots = Package::open(source)?;
    let media = screenshots.media();
    info!("found {} images in {}", media.len(), source.display());

    let blocks = appendix_blocks(cfg, &media);
    let embedded = doc.append(&blocks)?;
    doc.save(output)?;
    info!("appendix saved images={} out={}", embedded, output.display());

    Ok(AppendixSummary {
        output: output.display().to_string(),
        images_found: media.len(),
        images_embedded: embedded,
    })
}
