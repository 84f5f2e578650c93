use chrono::NaiveDate;
use condmon_core::sink::{HEADER, output_path};
use condmon_core::{CsvSink, Measurement, MeasurementSink, ProcessValues, WindowStats};
use rstest::rstest;
use tempfile::tempdir;

fn point(process: Option<ProcessValues>) -> Measurement {
    Measurement {
        timestamp: NaiveDate::from_ymd_opt(2024, 5, 2)
            .unwrap()
            .and_hms_opt(9, 7, 42)
            .unwrap(),
        stats: WindowStats {
            voltage_mean: 2.5,
            voltage_std: 12.5,
            current_mean: 0.004,
            current_std: 0.25,
        },
        conductivity: 1.6,
        compensated_conductivity: process.map(|_| 1.5),
        process,
    }
}

fn read_records(path: &std::path::Path) -> Vec<Vec<String>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_path(path)
        .unwrap();
    rdr.records()
        .map(|r| r.unwrap().iter().map(str::to_string).collect())
        .collect()
}

#[rstest]
fn file_name_encodes_start_minute() {
    let started = NaiveDate::from_ymd_opt(2024, 1, 9)
        .unwrap()
        .and_hms_opt(7, 5, 59)
        .unwrap();
    let p = output_path(std::path::Path::new("/data"), started);
    assert_eq!(
        p.file_name().unwrap().to_str().unwrap(),
        "Picoresults_2024_01_09_07_05.csv"
    );
}

#[rstest]
fn header_written_on_create_and_rows_appended() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("out.csv");
    let mut sink = CsvSink::create(&path).unwrap();
    assert_eq!(read_records(&path), vec![HEADER.map(String::from).to_vec()]);

    sink.append(&point(Some(ProcessValues {
        concentration: 400.0,
        target_concentration: 450.0,
        volume: 42.5,
        temperature: 33.0,
    })))
    .unwrap();
    sink.append(&point(None)).unwrap();
    assert_eq!(sink.rows(), 2);
    let shown = format!("{sink:?}");
    assert!(shown.contains("out.csv") && shown.contains("rows: 2"), "{shown}");

    // Rows are flushed per append, so they are visible without dropping the sink.
    let records = read_records(&path);
    assert_eq!(records.len(), 3);
    assert_eq!(
        records[1],
        [
            "400.0", "450.0", "42.5", "33.0", "2.5", "12.5", "0.004", "0.25", "1.6", "1.5",
            "02/05/2024 09:07",
        ]
    );
    assert_eq!(&records[2][..4], ["-1.0", "-1.0", "-1.0", "-1.0"]);
    assert_eq!(records[2][9], "-1.0");
}

#[rstest]
fn create_in_missing_directory_fails() {
    let dir = tempdir().unwrap();
    let err = CsvSink::create(dir.path().join("nope").join("out.csv")).unwrap_err();
    assert!(err.to_string().contains("persistence error"));
}
