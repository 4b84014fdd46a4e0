//! Generated exports load through the CSV reader and feed the analytics.

use std::fs::File;

use chrono::NaiveDate;
use lifeflight_analytics::{average_response_time, indicators, spc_report, SpcRequest};
use lifeflight_data::{MissionCsvLoader, MissionSource};
use lifeflight_simulator::{write_csv, MissionGenerator, ScenarioConfig};

fn scenario() -> ScenarioConfig {
    ScenarioConfig {
        start: NaiveDate::from_ymd_opt(2022, 1, 1).unwrap(),
        end: NaiveDate::from_ymd_opt(2022, 12, 31).unwrap(),
        missions_per_day: 4.0,
        seed: 11,
        ..ScenarioConfig::default()
    }
}

#[test]
fn test_generated_export_drives_analytics() {
    let missions = MissionGenerator::new(scenario()).unwrap().generate();

    let file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    write_csv(File::create(file.path()).unwrap(), &missions).unwrap();

    let records = MissionCsvLoader::new(file.path()).load().unwrap();
    assert_eq!(records.len(), missions.len());
    assert_eq!(records[0].incident_number.as_deref(), Some(missions[0].incident_number.as_str()));
    assert_eq!(records[0].status.as_value(), Some(missions[0].status.as_str()));

    let summary = indicators(&records, 2022, 6);
    assert_eq!(summary.total_missions, missions.len());
    assert!(summary.total_cities_covered > 1);

    let minutes = average_response_time(&records, 2022, None).minutes().unwrap();
    assert!(minutes > 5.0 && minutes < 30.0, "average response {minutes}");

    let report = spc_report(
        &records,
        &SpcRequest {
            start_year: 2022,
            end_year: 2022,
            ..SpcRequest::default()
        },
    );
    assert_eq!(report.metadata.total_periods, 12);
    assert_eq!(report.metadata.total_missions, missions.len() as u64);
}

#[test]
fn test_overnight_missions_keep_short_response_times() {
    let missions = MissionGenerator::new(ScenarioConfig {
        overnight_share: 1.0,
        ..scenario()
    })
    .unwrap()
    .generate();

    let file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    write_csv(File::create(file.path()).unwrap(), &missions).unwrap();
    let records = MissionCsvLoader::new(file.path()).load().unwrap();

    // Without the midnight wrap these would average close to a full day.
    let minutes = average_response_time(&records, 2022, None).minutes().unwrap();
    assert!(minutes < 60.0, "average response {minutes}");
}
