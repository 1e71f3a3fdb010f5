use orgmark::{Options, convert};
use serde::Deserialize;
use std::fs;

#[derive(Debug, Deserialize)]
struct Case {
    name: String,
    org: String,
    html: String,
    #[serde(default)]
    options: Option<CaseOptions>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CaseOptions {
    offset: Option<i32>,
    toc: Option<bool>,
    escape: Option<bool>,
}

impl CaseOptions {
    fn apply(&self, mut options: Options) -> Options {
        if let Some(offset) = self.offset {
            options.offset = offset;
        }
        if let Some(toc) = self.toc {
            options.toc = toc;
        }
        if let Some(escape) = self.escape {
            options.escape = escape;
        }
        options
    }
}

#[test]
fn conversion_cases() {
    let data = fs::read_to_string("tests/data/cases.json").expect("Failed to read cases.json");
    let cases: Vec<Case> = serde_json::from_str(&data).expect("Failed to parse cases.json");
    assert!(!cases.is_empty());

    let mut failures = Vec::new();

    for case in &cases {
        let options = match &case.options {
            Some(overrides) => overrides.apply(Options::default()),
            None => Options::default(),
        };
        let result = convert(&case.org, &options);

        if result != case.html {
            eprintln!("\nCase {:?} failed", case.name);
            eprintln!("  Input: {:?}", case.org);
            eprintln!("  Expected: {:?}", case.html);
            eprintln!("  Got: {:?}", result);
            failures.push(case.name.as_str());
        }
    }

    eprintln!(
        "\nConversion cases: {} passed, {} failed",
        cases.len() - failures.len(),
        failures.len()
    );
    assert!(failures.is_empty(), "failed cases: {failures:?}");
}
