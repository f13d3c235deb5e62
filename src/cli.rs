use crate::{
    appendix,
    batch::CvBatch,
    config::Config,
    extract::{ByExtension, Extractor},
    proposal, screenshots,
    util::{ensure_dir, sha256_hex},
};
use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

#[derive(Parser, Debug)]
#[command(name = "propdoc")]
#[command(about = "Proposal document builder (Markdown to docx, screenshot appendix, CV biodata sheets)")]
pub struct Args {
    #[command(subcommand)]
    pub cmd: Command,

    /// Path to config TOML. If omitted, uses ./propdoc.toml if present.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override log level (trace/debug/info/warn/error).
    #[arg(long)]
    pub log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Render the Markdown proposal into a .docx document.
    Proposal {
        #[arg(long)]
        markdown: Option<PathBuf>,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Build the screenshot booklet from a manifest.
    Screenshots {
        #[arg(long)]
        manifest: Option<PathBuf>,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Append the images of one .docx to another as a captioned appendix.
    Appendix {
        #[arg(long)]
        target: Option<PathBuf>,
        #[arg(long)]
        source: Option<PathBuf>,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Convert a directory of CVs into HTML biodata sheets.
    Cvs {
        #[arg(long)]
        input_dir: Option<PathBuf>,
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },
    /// Print the record extracted from one CV as JSON.
    Classify {
        #[arg(long)]
        input: PathBuf,
    },
}

pub fn dispatch(args: Args) -> Result<()> {
    let cfg_path = resolve_config_path(args.config.as_deref());
    let cfg = Config::load(&cfg_path)?;

    match &args.cmd {
        Command::Proposal { markdown, out } => {
            let markdown = path_or(markdown.as_deref(), &cfg.proposal.markdown);
            let out = path_or(out.as_deref(), &cfg.proposal.output);
            let _guard = init_logging(&args, &cfg, resolve_log_path(&cfg, out.parent()).as_deref())?;
            let summary = proposal::build(&cfg.proposal, &markdown, &out)?;
            print_summary(&cfg, &summary)
        }
        Command::Screenshots { manifest, out } => {
            let manifest = path_or(manifest.as_deref(), &cfg.screenshots.manifest);
            let out = path_or(out.as_deref(), &cfg.screenshots.output);
            let _guard = init_logging(&args, &cfg, resolve_log_path(&cfg, out.parent()).as_deref())?;
            let summary = screenshots::build(&cfg.screenshots, &manifest, &out)?;
            print_summary(&cfg, &summary)
        }
        Command::Appendix { target, source, out } => {
            let target = path_or(target.as_deref(), &cfg.appendix.target);
            let source = path_or(source.as_deref(), &cfg.appendix.source);
            let out = match out {
                Some(p) => p.clone(),
                None if cfg.appendix.output.is_empty() => target.clone(),
                None => PathBuf::from(&cfg.appendix.output),
            };
            let _guard = init_logging(&args, &cfg, resolve_log_path(&cfg, out.parent()).as_deref())?;
            let summary = appendix::merge(&cfg.appendix, &target, &source, &out)?;
            print_summary(&cfg, &summary)
        }
        Command::Cvs { input_dir, out_dir } => {
            let input_dir = path_or(input_dir.as_deref(), &cfg.cv.input_dir);
            let out_dir = path_or(out_dir.as_deref(), &cfg.cv.out_dir);
            cvs(&args, &cfg, &input_dir, &out_dir)
        }
        Command::Classify { input } => {
            let _guard = init_logging(&args, &cfg, resolve_log_path(&cfg, None).as_deref())?;
            classify(&cfg, input)
        }
    }
}

fn path_or(user: Option<&Path>, configured: &str) -> PathBuf {
    user.map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(configured))
}

fn resolve_config_path(user: Option<&Path>) -> PathBuf {
    if let Some(p) = user {
        return p.to_path_buf();
    }
    let default = PathBuf::from("propdoc.toml");
    if default.exists() {
        default
    } else {
        PathBuf::from("propdoc.example.toml")
    }
}

fn init_logging(args: &Args, cfg: &Config, file_path: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let level = args
        .log_level
        .as_deref()
        .unwrap_or(cfg.logging.level.as_str());

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let stdout_layer = if cfg.logging.json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .boxed()
    };

    let (file_layer, guard) = if let Some(path) = file_path {
        let parent = path.parent().unwrap_or_else(|| Path::new("."));
        ensure_dir(parent)?;
        let file = std::fs::File::create(path)
            .with_context(|| format!("create log file: {}", path.display()))?;
        let (non_blocking, guard) = tracing_appender::non_blocking(file);
        let layer = tracing_subscriber::fmt::layer()
            .with_writer(non_blocking)
            .with_ansi(false)
            .with_target(true)
            .boxed();
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stdout_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow!("failed to init logging: {e}"))?;

    Ok(guard)
}

fn resolve_log_path(cfg: &Config, out_dir: Option<&Path>) -> Option<PathBuf> {
    if !cfg.logging.write_to_file {
        return None;
    }

    if !cfg.logging.file_path.is_empty() {
        return Some(PathBuf::from(&cfg.logging.file_path));
    }

    match out_dir {
        Some(dir) if !dir.as_os_str().is_empty() => Some(dir.join("propdoc.log")),
        _ => Some(PathBuf::from("propdoc.log")),
    }
}

fn print_summary<T: serde::Serialize>(cfg: &Config, summary: &T) -> Result<()> {
    if cfg.global.print_summary {
        println!("{}", serde_json::to_string_pretty(summary)?);
    }
    Ok(())
}

fn cvs(args: &Args, cfg: &Config, input_dir: &Path, out_dir: &Path) -> Result<()> {
    if !input_dir.is_dir() {
        return Err(anyhow!("input dir does not exist: {}", input_dir.display()));
    }
    ensure_dir(out_dir)?;

    let log_path = resolve_log_path(cfg, Some(out_dir));
    let _guard = init_logging(args, cfg, log_path.as_deref())?;

    let cfg_hash = sha256_hex(cfg.normalized_for_hash().as_bytes());
    info!("cv batch config_sha256={cfg_hash} out={}", out_dir.display());

    if cfg.debug.dump_effective_config {
        let raw = toml::to_string(cfg).unwrap_or_default();
        std::fs::write(out_dir.join("effective-config.toml"), raw)?;
    }

    let batch = CvBatch::new(cfg, ByExtension::default())?;
    let report = batch.run(input_dir, out_dir)?;

    if cfg.cv.write_report {
        let path = out_dir.join(&cfg.cv.report_filename);
        std::fs::write(&path, serde_json::to_string_pretty(&report)?)
            .with_context(|| format!("write {}", path.display()))?;
    }

    if cfg.global.print_summary {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "out_dir": out_dir,
                "processed": report.processed.len(),
                "failed": report.failed.len(),
                "status": if report.failed.is_empty() { "ok" } else { "partial" },
            }))?
        );
    }

    Ok(())
}

fn classify(cfg: &Config, input: &Path) -> Result<()> {
    if !input.exists() {
        return Err(anyhow!("input does not exist: {}", input.display()));
    }
    let file_name = input
        .file_name()
        .and_then(|s| s.to_str())
        .ok_or_else(|| anyhow!("non UTF-8 file name: {}", input.display()))?;

    let who = crate::cv::assign(&cfg.cv, file_name);
    let extractor = ByExtension::default();
    let extracted = extractor.extract(input)?;
    let batch = CvBatch::new(cfg, extractor)?;
    let record = batch.record_from(&extracted, &who.name);

    println!(
        "{}",
        serde_json::to_string_pretty(&serde_json::json!({
            "input": input,
            "source": extracted.kind,
            "position": who.position,
            "record": record,
        }))?
    );
    Ok(())
}
