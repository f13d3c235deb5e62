use propdoc::config::Config;

#[test]
fn parse_example_config() {
    let raw = include_str!("../propdoc.example.toml");
    let cfg: Config = toml::from_str(raw).expect("parse TOML");
    assert!(!cfg.cv.input_dir.is_empty());
    assert!(!cfg.cv.out_dir.is_empty());
    assert_eq!(cfg.proposal.images.len(), 2);
    assert_eq!(cfg.cv.people[0].pattern, "apple_mahmud");
    assert!(cfg.cv.people[0].name.is_none());
    assert_eq!(cfg.cv.people[1].name.as_deref(), Some("Md. Mizanur Rahman"));
    assert!(cfg.appendix.caption.contains("{n}"));
}

#[test]
fn partial_sections_fall_back_to_defaults() {
    let raw = r#"
[cv]
default_position = "DevOps Engineer"

[cv.limits]
education = 3
"#;
    let cfg: Config = toml::from_str(raw).expect("parse TOML");
    assert_eq!(cfg.cv.default_position, "DevOps Engineer");
    assert_eq!(cfg.cv.limits.education, 3);
    assert_eq!(cfg.cv.limits.training, 30);
    assert_eq!(cfg.cv.report_filename, "report.json");
    assert!(cfg.cv.certificate_keywords.iter().any(|k| k == "RH124"));
    assert_eq!(cfg.logging.level, "info");
    assert!(cfg.global.print_summary);
}

#[test]
fn hash_string_is_stable() {
    let a = Config::default().normalized_for_hash();
    let b = Config::default().normalized_for_hash();
    assert!(!a.is_empty());
    assert_eq!(a, b);
}
