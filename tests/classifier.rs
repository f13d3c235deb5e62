use propdoc::config::Cv;
use propdoc::cv::{rules_for, Classifier, Section};

fn classifier() -> Classifier {
    Classifier::new(&Cv::default()).unwrap()
}

#[test]
fn education_and_current_job() {
    let text = "EDUCATION\nBSc Computer Science, ABC University\nWORK EXPERIENCE\nEngineer | XYZ Ltd\nJAN 2020 - PRESENT";
    let record = classifier().extract(text, "Jane Doe");

    assert_eq!(record.education, "BSc Computer Science, ABC University");
    assert_eq!(record.employment.len(), 1);
    let job = &record.employment[0];
    assert_eq!(job.employer, "XYZ Ltd");
    assert_eq!(job.title.as_deref(), Some("Engineer"));
    assert_eq!(job.dates, "JAN 2020 - PRESENT");
    assert!(job.current);
}

#[test]
fn reference_suppresses_everything_after_it() {
    let text = "\
EDUCATION
MSc Data Science, North University
REFERENCE
Dr. Someone, Chairman, Acme Ltd
EDUCATION
Bachelor of Arts, South College
WORK EXPERIENCE
Manager | Other Ltd | 2019 - PRESENT
Red Hat RH124 certified";
    let c = classifier();
    let scan = c.scan(text);
    assert_eq!(scan.final_section, Section::Reference);

    let record = c.extract(text, "Jane Doe");
    assert_eq!(record.education, "MSc Data Science, North University");
    assert!(record.employment.is_empty());
    assert!(record.training.is_empty());
    for field in [&record.skills, &record.projects, &record.specializations] {
        assert!(!field.contains("Other Ltd"));
        assert!(!field.contains("Chairman"));
    }
}

#[test]
fn certificate_outside_training_appears_once() {
    let text = "\
WORK EXPERIENCE
Red Hat RH124 System Administration
Engineer | XYZ Ltd
JAN 2020 - PRESENT
CERTIFICATES
Red Hat RH124 System Administration
Veeam Certified Engineer";
    let record = classifier().extract(text, "Jane Doe");

    let hits = record
        .training
        .lines()
        .filter(|l| *l == "Red Hat RH124 System Administration")
        .count();
    assert_eq!(hits, 1);
    assert!(record.training.contains("Veeam Certified Engineer"));
}

#[test]
fn certificate_before_any_header_is_rescued() {
    let text = "Jane Doe\nCybersecurity Essentials\nEDUCATION\nBSc Physics, River University";
    let record = classifier().extract(text, "Jane Doe");
    assert_eq!(record.training, "Cybersecurity Essentials");
}

#[test]
fn personal_details_in_preamble() {
    let text = "Date of Birth: 01 March 1990\nNationality\nBangladeshi\n5+ years of experience";
    let record = classifier().extract(text, "Jane Doe");
    assert_eq!(record.date_of_birth, "01 March 1990");
    assert_eq!(record.nationality, "Bangladeshi");
    assert_eq!(record.countries, "5+ years of experience");
}

#[test]
fn years_of_experience_is_prefixed_with_default_country() {
    let mut cfg = Cv::default();
    cfg.defaults.country = "Bangladesh".into();
    let record = Classifier::new(&cfg)
        .unwrap()
        .extract("Over 8 years of experience in networking", "X");
    assert_eq!(record.countries, "Bangladesh - 8 years of experience");
}

#[test]
fn keyword_lines_inside_a_section_stay_content() {
    let text = "\
WORK EXPERIENCE
Engineer | XYZ Ltd
JAN 2020 - PRESENT
Project: National backbone rollout
Senior Engineer | ABC Ltd
2015 - 2019";
    let c = classifier();
    let scan = c.scan(text);
    assert_eq!(scan.final_section, Section::Employment);
    assert!(scan.projects.is_empty());

    let record = c.extract(text, "X");
    assert_eq!(record.employment.len(), 2);
    assert_eq!(record.employment[0].employer, "XYZ Ltd");
    assert!(record.employment[0].current);
    assert_eq!(record.employment[1].employer, "ABC Ltd");
    assert_eq!(record.employment[1].dates, "2015 - 2019");
}

#[test]
fn long_keyword_line_in_preamble_opens_a_section() {
    let text = "\
Jane Doe
Career Objective: To obtain a challenging position in a reputed organization
Seeking to apply my networking and cloud skills to real infrastructure problems";
    let scan = classifier().scan(text);
    assert_eq!(scan.final_section, Section::Summary);
    assert_eq!(
        scan.summary,
        vec!["Seeking to apply my networking and cloud skills to real infrastructure problems"]
    );
}

#[test]
fn limits_cap_skills_and_employment() {
    let mut cfg = Cv::default();
    cfg.limits.skills = 3;
    cfg.limits.employment = 2;
    let text = "\
WORK EXPERIENCE
Lead | Alpha Ltd | 2021 - PRESENT
Engineer | Beta Ltd | 2018 - 2021
Intern | Gamma Ltd | 2016 - 2017
PROFESSIONAL SKILL
Linux administration
VMware vSphere
Ansible automation
Terraform modules
Kubernetes operations";
    let record = Classifier::new(&cfg).unwrap().extract(text, "X");
    assert_eq!(record.skills.lines().count(), 3);
    assert_eq!(
        record.skills,
        "Linux administration\nVMware vSphere\nAnsible automation"
    );
    assert_eq!(record.employment.len(), 2);
    assert_eq!(record.employment[1].employer, "Beta Ltd");
}

#[test]
fn raw_employment_block_is_capped() {
    let mut cfg = Cv::default();
    cfg.limits.employment_raw_lines = 2;
    let text = "\
WORK EXPERIENCE
Network Engineer at Gamma Telecom
Maintained core routing for national backbone
Planned fibre expansion across three districts
Led the migration to a new monitoring platform";
    let record = Classifier::new(&cfg).unwrap().extract(text, "X");
    assert_eq!(record.employment.len(), 1);
    assert_eq!(
        record.employment[0].employer,
        "Network Engineer at Gamma Telecom\nMaintained core routing for national backbone"
    );
}

#[test]
fn repeated_job_line_before_present_is_the_current_one() {
    let text = "\
WORK EXPERIENCE
Engineer | XYZ Ltd
2015 - 2018
Engineer | XYZ Ltd
JAN 2020 - PRESENT";
    let record = classifier().extract(text, "X");
    assert_eq!(record.employment.len(), 2);
    assert!(!record.employment[0].current);
    assert!(record.employment[1].current);
    assert_eq!(record.employment[1].dates, "JAN 2020 - PRESENT");
}

#[test]
fn most_recent_present_job_is_current() {
    let text = "\
WORK EXPERIENCE
Senior Engineer | Alpha Ltd | JAN 2021 - PRESENT
Engineer | Beta Ltd | 2017 - 2020";
    let record = classifier().extract(text, "X");
    assert_eq!(record.employment.len(), 2);
    assert!(record.employment[0].current);
    assert!(!record.employment[1].current);
    assert_eq!(record.employment[0].dates, "JAN 2021 - PRESENT");
    assert_eq!(record.employment[1].dates, "2017 - 2020");
}

#[test]
fn employment_without_pipes_falls_back_to_raw_block() {
    let text = "\
WORK EXPERIENCE
Network Engineer at Gamma Telecom
Maintained core routing for national backbone";
    let record = classifier().extract(text, "X");
    assert_eq!(record.employment.len(), 1);
    assert!(record.employment[0].employer.contains("Gamma Telecom"));
    assert!(record.employment[0].title.is_none());
    assert!(!record.employment[0].current);
}

#[test]
fn empty_input_yields_empty_record() {
    let record = classifier().extract("", "Jane Doe");
    assert_eq!(record.name, "Jane Doe");
    assert!(record.education.is_empty());
    assert!(record.employment.is_empty());
}

#[test]
fn rule_table_shape() {
    let reference = rules_for(Section::Reference);
    assert_eq!(reference.len(), 1);
    assert!(reference[0].consumes);

    let names: Vec<&str> = rules_for(Section::None).iter().map(|r| r.name).collect();
    assert_eq!(
        names,
        [
            "exact_header",
            "keyword_header",
            "date_of_birth",
            "nationality",
            "years_of_experience",
            "certificate_rescue"
        ]
    );

    for section in [
        Section::Education,
        Section::Training,
        Section::Employment,
        Section::Projects,
        Section::Skills,
        Section::Summary,
    ] {
        let rules = rules_for(section);
        assert_eq!(rules[0].name, "exact_header");
        assert!(rules.iter().all(|r| r.name != "keyword_header"));
        let collect = rules.iter().find(|r| r.name == "collect").unwrap();
        assert!(!collect.consumes);
    }
}
