use crate::config::Config;
use unicode_normalization::UnicodeNormalization;

/// Cleans text pulled out of a PDF or `.docx` before it is classified.
pub fn normalize_extracted(cfg: &Config, raw: &str) -> String {
    let mut s = raw.to_string();

    if cfg.text.normalize_newlines {
        s = s.replace("\r\n", "\n").replace('\r', "\n");
    }

    if cfg.text.normalize_unicode {
        s = s.nfkc().collect::<String>();
    }

    s = sanitize_control_chars(&s, &cfg.text.control_chars_to_sanitize);

    if cfg.text.trim_trailing_whitespace {
        s = s
            .lines()
            .map(|l| l.trim_end())
            .collect::<Vec<_>>()
            .join("\n");
    }

    s
}

fn sanitize_control_chars(s: &str, codes: &[u8]) -> String {
    if codes.is_empty() {
        return s.to_string();
    }

    let mut mask = [false; 128];
    for &code in codes {
        if (code as usize) < mask.len() {
            mask[code as usize] = true;
        }
    }

    s.chars()
        .filter(|&ch| {
            if ch == '\n' || ch == '\r' || ch == '\t' {
                return true;
            }
            let cp = ch as u32;
            if cp < 128 { !mask[cp as usize] } else { true }
        })
        .collect()
}
