//! End-to-end extraction over an in-memory Argo container.

mod common;

use chrono::NaiveDate;
use common::argo_container;
use floatrag::profile::{ProfileExtractor, validate};
use floatrag::{ExtractError, IndexedDocument};
use std::io::Write;

fn date(day: u32, hour: u32) -> chrono::NaiveDateTime {
    NaiveDate::from_ymd_opt(2023, 3, day)
        .unwrap()
        .and_hms_opt(hour, 0, 0)
        .unwrap()
}

#[test]
fn test_profiles_keep_only_valid_readings() {
    let extraction = ProfileExtractor::new().extract_container(&mut argo_container());

    assert_eq!(extraction.message, "Successfully processed 3 profiles");
    assert_eq!(extraction.profiles.len(), 3);

    let first = &extraction.profiles[0];
    assert_eq!(first.profile_id, 0);
    assert_eq!(first.latitude, Some(10.5));
    assert_eq!(first.date, Some(date(1, 12)));
    assert_eq!(
        first.measurements.codes().collect::<Vec<_>>(),
        vec!["TEMP", "PSAL", "PRES"]
    );
    let temp = first.measurements.get("TEMP").unwrap();
    assert_eq!(temp.values, vec![28.1, 27.5, 15.0, 4.2]);
    assert_eq!(temp.pressure, vec![5.0, 50.0, 200.0, 1000.0]);
    assert_eq!(temp.qc_flags.as_deref(), Some("1111"));
    // No PSAL_QC variable, so the profile pressure flag is used
    assert_eq!(
        first.measurements.get("PSAL").unwrap().qc_flags.as_deref(),
        Some("A")
    );

    let second = &extraction.profiles[1];
    let temp = second.measurements.get("TEMP").unwrap();
    assert_eq!(temp.values, vec![26.0, 12.0]);
    assert_eq!(temp.pressure, vec![5.0, 200.0]);
    assert!(second.measurements.get("PSAL").is_none());
    assert_eq!(
        second.measurements.codes().collect::<Vec<_>>(),
        vec!["TEMP", "PRES"]
    );

    let third = &extraction.profiles[2];
    assert_eq!(third.latitude, None);
    assert_eq!(third.longitude, Some(70.0));
    assert_eq!(third.date, None);
    assert_eq!(
        third.measurements.codes().collect::<Vec<_>>(),
        vec!["PSAL", "PRES"]
    );
}

#[test]
fn test_values_and_pressure_stay_aligned() {
    let extraction = ProfileExtractor::new().extract_container(&mut argo_container());
    for profile in &extraction.profiles {
        for (code, measurement) in profile.measurements.iter() {
            assert!(!measurement.values.is_empty(), "{code} kept without values");
            assert_eq!(measurement.values.len(), measurement.pressure.len());
            assert!(measurement.values.iter().all(|v| !v.is_nan() && *v != -999.0));
        }
    }
}

#[test]
fn test_trajectory_skips_invalid_positions() {
    let extraction = ProfileExtractor::new().extract_container(&mut argo_container());
    let trajectory = &extraction.trajectory;

    assert_eq!(trajectory.coordinates, vec![[65.2, 10.5], [80.1, -12.0]]);
    assert_eq!(trajectory.dates, vec![date(1, 12), date(11, 12)]);
    assert_eq!(trajectory.float_id.as_deref(), Some("2902746"));
}

#[test]
fn test_metadata() {
    let extraction = ProfileExtractor::new().extract_container(&mut argo_container());
    let metadata = &extraction.metadata;

    assert_eq!(metadata.platform_number, "2902746");
    assert_eq!(metadata.institution, "INCOIS");
    assert_eq!(metadata.source, "");
    assert_eq!(metadata.dimensions.get("N_LEVELS"), Some(&4));
    assert!(metadata.variables.iter().any(|v| v == "JULD"));
    assert_eq!(metadata.float_id.as_deref(), Some("2902746"));
    assert_eq!(metadata.project.as_deref(), Some("ARGO INDIA"));
}

#[test]
fn test_documents_render_searchable_text() {
    let extraction = ProfileExtractor::new().extract_container(&mut argo_container());
    let documents = extraction.documents();
    assert_eq!(documents.len(), 3);

    assert_eq!(
        documents[0].searchable_text(),
        "Float ID: 2902746 Location: 10.50°N, 65.20°E Date: 2023-03-01T12:00:00 \
         Parameters: TEMP, PSAL, PRES temperature salinity pressure Indian Ocean"
    );

    // Absent latitude and date are left out entirely
    let third: &IndexedDocument = &documents[2];
    assert!(third.get("latitude").is_none());
    assert!(third.get("date").is_none());
    assert_eq!(
        third.searchable_text(),
        "Float ID: 2902746 Parameters: PSAL, PRES salinity pressure"
    );
}

#[test]
fn test_unreadable_bytes_are_a_parse_failure() {
    let err = ProfileExtractor::new()
        .extract(b"definitely not a netcdf file")
        .unwrap_err();
    assert!(matches!(err, ExtractError::Parse { .. }));
    assert_eq!(err.status_code(), "PARSE_FAILURE");
}

#[test]
fn test_validate_rejects_garbage_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"CDF?garbage").unwrap();
    assert!(!validate(file.path()));
}
