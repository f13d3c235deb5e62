use crate::{
    config::Config,
    cv::{assemble::apply_defaults, people, render_html, template, Classifier, CvRecord},
    extract::{Extracted, Extractor, SourceKind},
    normalize::normalize_extracted,
    util::{ensure_dir, hash_file, now_rfc3339, sanitize_file_name, sha256_hex},
};
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub started: String,
    pub finished: String,
    pub config_sha256: String,
    pub input_dir: String,
    pub out_dir: String,
    pub processed: Vec<FileReport>,
    pub failed: Vec<FailedFile>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileReport {
    pub input: String,
    pub input_sha256: String,
    pub output: String,
    pub output_sha256: String,
    pub name: String,
    pub position: String,
    pub used_template_table: bool,
    pub employment_records: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailedFile {
    pub input: String,
    pub error: String,
}

/// Converts every CV in a directory into an HTML biodata sheet.
pub struct CvBatch<E: Extractor> {
    cfg: Config,
    extractor: E,
    classifier: Classifier,
}

impl<E: Extractor> CvBatch<E> {
    pub fn new(cfg: &Config, extractor: E) -> Result<Self> {
        Ok(Self {
            cfg: cfg.clone(),
            extractor,
            classifier: Classifier::new(&cfg.cv)?,
        })
    }

    /// Processes the directory in file-name order. A file that fails is
    /// logged and recorded in the report; the rest of the batch still runs.
    pub fn run(&self, input_dir: &Path, out_dir: &Path) -> Result<BatchReport> {
        let started = now_rfc3339();
        let clock = Instant::now();

        let inputs = list_inputs(input_dir, &self.cfg.cv.exclude)?;
        info!(
            "cv batch inputs={} dir={}",
            inputs.len(),
            input_dir.display()
        );

        if self.cfg.cv.clean_out_dir {
            remove_old_html(out_dir)?;
        }
        ensure_dir(out_dir)?;

        let mut processed = Vec::new();
        let mut failed = Vec::new();
        for input in &inputs {
            match self.process_one(input, out_dir) {
                Ok(report) => {
                    info!("cv ok file={} out={}", report.input, report.output);
                    processed.push(report);
                }
                Err(err) => {
                    error!("cv failed file={} err={:?}", input.display(), err);
                    failed.push(FailedFile {
                        input: input.display().to_string(),
                        error: format!("{err:#}"),
                    });
                }
            }
        }

        info!(
            "cv batch done ok={} failed={} elapsed_ms={}",
            processed.len(),
            failed.len(),
            clock.elapsed().as_millis()
        );

        Ok(BatchReport {
            started,
            finished: now_rfc3339(),
            config_sha256: sha256_hex(self.cfg.normalized_for_hash().as_bytes()),
            input_dir: input_dir.display().to_string(),
            out_dir: out_dir.display().to_string(),
            processed,
            failed,
        })
    }

    fn process_one(&self, input: &Path, out_dir: &Path) -> Result<FileReport> {
        let file_name = input
            .file_name()
            .and_then(|s| s.to_str())
            .ok_or_else(|| anyhow!("non UTF-8 file name: {}", input.display()))?;

        let who = people::assign(&self.cfg.cv, file_name);
        debug!("cv name={} position={}", who.name, who.position);

        let extracted = self
            .extractor
            .extract(input)
            .with_context(|| format!("extracting {}", input.display()))?;
        let used_template_table = template_table(&extracted).is_some();
        let record = self.record_from(&extracted, &who.name);

        let html = render_html(&record, &who.position, &self.cfg.cv.default_employer);

        let stem = sanitize_file_name(&who.name);
        if stem.is_empty() {
            return Err(anyhow!("no usable output name for {}", input.display()));
        }
        let input_sha256 = hash_file(input)?;
        let output = out_dir.join(format!("{stem}.html"));
        if output.exists() && !self.cfg.cv.clean_out_dir {
            warn!("overwriting {}", output.display());
        }
        std::fs::write(&output, &html)
            .with_context(|| format!("write {}", output.display()))?;

        Ok(FileReport {
            input: input.display().to_string(),
            input_sha256,
            output: output.display().to_string(),
            output_sha256: sha256_hex(html.as_bytes()),
            name: who.name,
            position: who.position,
            used_template_table,
            employment_records: record.employment.len(),
        })
    }

    /// Template `.docx` files are read from their table; everything else goes
    /// through the line classifier.
    pub fn record_from(&self, extracted: &Extracted, name: &str) -> CvRecord {
        if let Some(rows) = template_table(extracted) {
            let mut record = template::read_template_table(rows);
            if record.name.trim().is_empty() {
                record.name = name.to_string();
            }
            apply_defaults(&mut record, &self.cfg.cv.defaults);
            return record;
        }
        let text = normalize_extracted(&self.cfg, &extracted.text);
        self.classifier.extract(&text, name)
    }
}

fn template_table(extracted: &Extracted) -> Option<&[Vec<String>]> {
    if extracted.kind != SourceKind::Docx {
        return None;
    }
    extracted
        .tables
        .first()
        .map(Vec::as_slice)
        .filter(|rows| template::looks_like_template(rows))
}

/// `*.pdf` and `*.docx` files, sorted by name, minus excluded names.
pub fn list_inputs(dir: &Path, exclude: &[String]) -> Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    for entry in
        std::fs::read_dir(dir).with_context(|| format!("read input dir {}", dir.display()))?
    {
        let path = entry?.path();
        if !path.is_file() || SourceKind::from_path(&path).is_none() {
            continue;
        }
        let name = path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        if name.starts_with("~$") {
            continue;
        }
        if exclude.iter().any(|x| !x.is_empty() && name.contains(x.as_str())) {
            debug!("excluded {name}");
            continue;
        }
        out.push(path);
    }
    out.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(out)
}

fn remove_old_html(dir: &Path) -> Result<()> {
    if !dir.exists() {
        return Ok(());
    }
    for entry in std::fs::read_dir(dir).with_context(|| format!("read {}", dir.display()))? {
        let path = entry?.path();
        let is_html = path
            .extension()
            .and_then(|s| s.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("html"));
        if path.is_file() && is_html {
            std::fs::remove_file(&path)
                .with_context(|| format!("remove {}", path.display()))?;
        }
    }
    Ok(())
}
