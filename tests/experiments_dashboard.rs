use chrono::NaiveDate;
use rollout_timeline::{
    ExtractorConfig, TimelineError, analyze_experiments, process_experiments, process_weekly_sheet,
};
use std::fs;

const WEEKLY: &str = "INITIATIVE,CITY,PLATFORM,\
\"WEEK 1\n2024-03-04 to 2024-03-10\",\
\"WEEK 2\n2024-03-11 to 2024-03-17\"
Init1,Dubai,iOS,Rollout,Rollout
";

const EXPERIMENTS: &str = "\
INITIATIVE,CITY,PRIMARY METRIC,SUB DOMAIN,START DATE,END DATE,STAGE
Pricing,Dubai,Conversion,Checkout,08 Jan 2024,05 Feb 2024,Completed
Search,Cairo,CTR,Discovery,2024-03-04,2024-04-01,Running
Onboarding,Dubai,Retention,Growth,2023-11-06,2023-12-04,Paused
Referral,Riyadh,Conversion,Growth,2024-03-11,2024-03-25,Running
";

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn workbook(experiments: &[u8]) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("Weekly.csv"), WEEKLY).unwrap();
    fs::write(dir.path().join("Experiments.csv"), experiments).unwrap();
    dir
}

#[test]
fn test_experiments_report_from_workbook() {
    let dir = workbook(EXPERIMENTS.as_bytes());
    let report =
        process_experiments(dir.path(), &ExtractorConfig::default(), date("2024-03-20")).unwrap();

    let order: Vec<_> = report
        .experiments
        .iter()
        .map(|e| e.experiment.initiative.as_str())
        .collect();
    assert_eq!(order, vec!["Search", "Referral", "Pricing", "Onboarding"]);
    assert_eq!(report.experiments[2].experiment.start_date, date("2024-01-08"));
    assert_eq!(report.summary.stage_count("Running"), 2);
    assert_eq!(report.summary.max_days_remaining, Some(12));
}

#[test]
fn test_configured_experiment_filters() {
    let dir = workbook(EXPERIMENTS.as_bytes());
    let config = ExtractorConfig::default()
        .with_experiment_filter("PRIMARY METRIC", "Conversion")
        .with_experiment_filter("YEAR", "2024");
    let output = dir.path().join("experiments.json");
    let report = analyze_experiments(dir.path(), &output, &config, date("2024-03-20")).unwrap();

    assert_eq!(report.summary.total, 2);
    let value: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(value["experiments"][0]["initiative"], "Referral");
    assert_eq!(value["experiments"][0]["days_remaining"], 5);
    assert_eq!(value["experiments"][1]["initiative"], "Pricing");
}

#[test]
fn test_broken_experiments_do_not_block_weekly() {
    let dir = workbook(b"INITIATIVE,START DATE\n\xff\xfe,2024-01-01\n");

    let extraction = process_weekly_sheet(dir.path(), &ExtractorConfig::default()).unwrap();
    assert_eq!(extraction.timeline.interval_count(), 1);

    assert!(matches!(
        process_experiments(dir.path(), &ExtractorConfig::default(), date("2024-03-20")),
        Err(TimelineError::Csv(_))
    ));
}

#[test]
fn test_bad_experiment_date_is_reported() {
    let dir = workbook(
        b"INITIATIVE,CITY,PRIMARY METRIC,SUB DOMAIN,START DATE,END DATE,STAGE\n\
A,Dubai,CTR,Growth,2024-01-01,TBD,Running\n",
    );
    assert!(matches!(
        process_experiments(dir.path(), &ExtractorConfig::default(), date("2024-03-20")),
        Err(TimelineError::DateParse { value, .. }) if value == "TBD"
    ));
}
