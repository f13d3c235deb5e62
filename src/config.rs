use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub global: Global,
    #[serde(default)]
    pub proposal: Proposal,
    #[serde(default)]
    pub screenshots: Screenshots,
    #[serde(default)]
    pub appendix: Appendix,
    #[serde(default)]
    pub cv: Cv,
    #[serde(default)]
    pub text: Text,
    #[serde(default)]
    pub logging: Logging,
    #[serde(default)]
    pub debug: Debug,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config: {}", path.display()))?;
        let cfg: Config = toml::from_str(&raw).with_context(|| "parsing TOML")?;
        Ok(cfg)
    }

    /// A stable, normalization-friendly string for hashing.
    pub fn normalized_for_hash(&self) -> String {
        toml::to_string(self).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Global {
    pub print_summary: bool,
}
impl Default for Global {
    fn default() -> Self {
        Self {
            print_summary: true,
        }
    }
}

/// Markdown technical proposal rendered into a `.docx`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Proposal {
    pub markdown: String,
    pub output: String,
    pub title: String,
    pub subtitle: String,
    pub toc_note: String,
    pub font: String,
    pub font_size_pt: u32,
    pub image_width_inches: f32,
    #[serde(default)]
    pub images: Vec<SectionImage>,
}
impl Default for Proposal {
    fn default() -> Self {
        Self {
            markdown: "proposal.md".into(),
            output: "out/Technical-Proposal.docx".into(),
            title: "Technical Proposal".into(),
            subtitle: "".into(),
            toc_note: "(Right-click and select 'Update Field' to refresh TOC in Word)".into(),
            font: "Arial".into(),
            font_size_pt: 10,
            image_width_inches: 6.0,
            images: Vec::new(),
        }
    }
}

/// An image placed right after the heading whose text contains `section`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionImage {
    pub section: String,
    pub path: String,
    #[serde(default)]
    pub caption: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Screenshots {
    pub manifest: String,
    pub output: String,
    pub title: String,
    pub subtitle: String,
    pub date: String,
    pub image_width_cm: f32,
}
impl Default for Screenshots {
    fn default() -> Self {
        Self {
            manifest: "screenshots/manifest.json".into(),
            output: "out/Portal-Screenshots.docx".into(),
            title: "Portal Screenshots".into(),
            subtitle: "User Interface Screenshots".into(),
            date: "".into(),
            image_width_cm: 16.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Appendix {
    pub target: String,
    pub source: String,
    /// Empty means overwrite `target`.
    pub output: String,
    pub heading: String,
    pub intro: String,
    pub intro_italic: String,
    /// `{n}` is replaced with the 1-based image number.
    pub caption: String,
    pub image_width_inches: f32,
}
impl Default for Appendix {
    fn default() -> Self {
        Self {
            target: "out/Technical-Proposal.docx".into(),
            source: "out/Portal-Screenshots.docx".into(),
            output: "".into(),
            heading: "Appendix A: Portal Mock UI Screenshots".into(),
            intro: "The following screenshots demonstrate the proposed portal interface. ".into(),
            intro_italic: "".into(),
            caption: "Screenshot {n}: Portal Interface".into(),
            image_width_inches: 5.5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Cv {
    pub input_dir: String,
    pub out_dir: String,
    pub exclude: Vec<String>,
    pub clean_out_dir: bool,
    pub write_report: bool,
    pub report_filename: String,
    pub default_position: String,
    pub default_employer: String,
    pub certificate_keywords: Vec<String>,
    #[serde(default)]
    pub people: Vec<Person>,
    #[serde(default)]
    pub defaults: CvDefaults,
    #[serde(default)]
    pub limits: CvLimits,
}
impl Default for Cv {
    fn default() -> Self {
        Self {
            input_dir: "cvs".into(),
            out_dir: "HTML_CVs".into(),
            exclude: Vec::new(),
            clean_out_dir: true,
            write_report: true,
            report_filename: "report.json".into(),
            default_position: "Technical Expert".into(),
            default_employer: "".into(),
            certificate_keywords: [
                "Red Hat",
                "SUSE",
                "Veeam",
                "Cybersecurity",
                "IBM -",
                "Google Analytics",
                "RH124",
                "RH134",
                "RH294",
                "RH354",
                "DO180",
                "DO280",
                "DO288",
                "DO316",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            people: Vec::new(),
            defaults: Default::default(),
            limits: Default::default(),
        }
    }
}

/// Matched against the CV file name (case-insensitive substring).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Person {
    #[serde(rename = "match")]
    pub pattern: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub position: Option<String>,
}

/// Fills fields the extractor left empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CvDefaults {
    pub nationality: String,
    pub membership: String,
    pub languages: String,
    pub country: String,
}

/// Per-field line caps applied to the rendered record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CvLimits {
    pub education: usize,
    pub training: usize,
    pub skills: usize,
    pub projects: usize,
    pub summary: usize,
    pub employment: usize,
    pub employment_raw_lines: usize,
}
impl Default for CvLimits {
    fn default() -> Self {
        Self {
            education: 15,
            training: 30,
            skills: 30,
            projects: 40,
            summary: 20,
            employment: 50,
            employment_raw_lines: 15,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Text {
    pub normalize_unicode: bool,
    pub normalize_newlines: bool,
    pub trim_trailing_whitespace: bool,
    pub control_chars_to_sanitize: Vec<u8>,
}
impl Default for Text {
    fn default() -> Self {
        Self {
            normalize_unicode: true,
            normalize_newlines: true,
            trim_trailing_whitespace: true,
            control_chars_to_sanitize: (0u8..32)
                .filter(|c| !matches!(c, b'\n' | b'\r' | b'\t'))
                .chain(std::iter::once(127))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Logging {
    pub level: String,
    pub json: bool,
    pub write_to_file: bool,
    pub file_path: String,
}
impl Default for Logging {
    fn default() -> Self {
        Self {
            level: "info".into(),
            json: false,
            write_to_file: false,
            file_path: "".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Debug {
    pub dump_effective_config: bool,
}
impl Default for Debug {
    fn default() -> Self {
        Self {
            dump_effective_config: false,
        }
    }
}
