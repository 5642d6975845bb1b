/*!
Test VIX CSV IO
*/
use chrono::NaiveDate;
use std::io::{Seek, SeekFrom};
use tempfile::tempfile;
use vixburn::data::{fake::*, vix::*, *};

#[test]
fn fake_data_roundtrip() {
    const TEST_DATA_LENGTH: usize = 10000;
    let start = NaiveDate::from_ymd_opt(1990, 1, 2).expect("Valid date");
    let observations: Vec<Observation> = VixWalk::seeded(42, start, 1.5)
        .expect("Valid volatility")
        .take(TEST_DATA_LENGTH)
        .collect();
    let mut tmp = tempfile().expect("Tempfile creation should not fail!");
    let written = write_observations(&mut tmp, observations.iter().copied())
        .expect("Writing test data should not fail!");
    assert_eq!(written, TEST_DATA_LENGTH);
    tmp.seek(SeekFrom::Start(0)).expect("Seek should not fail");
    let read_observations = VixCsv::new(&mut tmp)
        .observations()
        .expect("Reading test data should not fail");
    assert_eq!(observations, read_observations);
}

#[test]
fn windows_from_file() {
    let start = NaiveDate::from_ymd_opt(2000, 6, 1).expect("Valid date");
    let mut fake = FakeVix {
        walk: VixWalk::seeded(7, start, 1.0).expect("Valid volatility"),
        len: 40,
    };
    let observations = fake.observations().expect("Infallible");
    let mut tmp = tempfile().expect("Tempfile creation should not fail!");
    write_observations(&mut tmp, observations.iter().copied()).expect("Writing test data should not fail!");
    tmp.seek(SeekFrom::Start(0)).expect("Seek should not fail");
    let observations = read_observations(&mut tmp).expect("Reading test data should not fail");
    let samples = windows::<f64, 32>(&observations);
    assert_eq!(samples.len(), 8);
    assert_eq!(samples[7].label[(0, 0)], observations[39].value);
    assert_eq!(samples[7].input[(31, 0)], observations[38].value);
}
