use crate::config::Cv;
use std::path::Path;

/// Who a CV file belongs to and the position they are proposed for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub name: String,
    pub position: String,
}

/// Resolves the canonical name and proposed position for a CV file. The first
/// `[[cv.people]]` entry whose `match` occurs in the file name (ignoring case)
/// wins; otherwise the name is derived from the file name.
pub fn assign(cfg: &Cv, file_name: &str) -> Assignment {
    let haystack = file_name.to_lowercase();
    let person = cfg
        .people
        .iter()
        .find(|p| !p.pattern.is_empty() && haystack.contains(&p.pattern.to_lowercase()));

    let name = person
        .and_then(|p| p.name.clone())
        .unwrap_or_else(|| fallback_name(file_name));
    let position = person
        .and_then(|p| p.position.clone())
        .unwrap_or_else(|| cfg.default_position.clone());

    Assignment { name, position }
}

/// `MD._Apple_Mahmud CV.pdf` becomes `MD. Apple Mahmud`.
pub fn fallback_name(file_name: &str) -> String {
    let stem = Path::new(file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(file_name);
    let stem = stem.replace(" CV", "").replace("_CV", "").replace(" cv", "");
    stem.split('_')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string()
}
