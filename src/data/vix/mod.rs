/*!
CSV data for the [CBOE Volatility Index](https://fred.stlouisfed.org/series/VIXCLS), as exported by FRED
*/
use super::{Observation, Series};
use chrono::NaiveDate;
use csv;
use std::io::{Read, Write};
use std::str::FromStr;

/// The VIX CSV date format
pub const VIX_DATE: &str = "%Y-%m-%d";

/// Read VIX observations from a Reader.
///
/// The data is expected to have an `observation_date,index_value` header. Rows with an unparseable date or a
/// missing or non-finite value are dropped, and the remaining observations are returned in ascending date order.
pub fn read_observations<R: Read>(rdr: R) -> Result<Vec<Observation>, csv::Error> {
    let mut reader = csv::Reader::from_reader(rdr);
    let headers = reader.headers()?.clone();
    let date_column = headers.iter().position(|h| h == "observation_date").unwrap_or(0);
    let value_column = headers.iter().position(|h| h == "index_value").unwrap_or(1);
    let mut observations = Vec::new();
    for record in reader.into_records() {
        let record = record?;
        let date = match record
            .get(date_column)
            .and_then(|field| NaiveDate::parse_from_str(field.trim(), VIX_DATE).ok())
        {
            Some(date) => date,
            None => continue,
        };
        let value = record
            .get(value_column)
            .map(|field| f64::from_str(field.trim()).unwrap_or(f64::NAN))
            .unwrap_or(f64::NAN);
        if value.is_finite() {
            observations.push(Observation { date, value })
        }
    }
    observations.sort_by_key(|observation| observation.date);
    Ok(observations)
}

/// Write VIX observations to a Writer
/// On success, return how many observations were written
pub fn write_observations<W, I>(wtr: W, observations: I) -> Result<usize, csv::Error>
where
    W: Write,
    I: Iterator<Item = Observation>,
{
    let mut wtr = csv::Writer::from_writer(wtr);
    let mut written = 0;
    for observation in observations {
        wtr.serialize(observation)?;
        written += 1;
    }
    wtr.flush()?;
    Ok(written)
}

/// A VIX series read from CSV data
#[derive(Debug, Clone)]
pub struct VixCsv<R> {
    /// The source of the CSV data
    pub reader: R,
}

impl<R: Read> VixCsv<R> {
    /// Read a VIX series from `reader`
    pub fn new(reader: R) -> VixCsv<R> {
        VixCsv { reader }
    }
}

impl<R: Read> Series for VixCsv<R> {
    type Error = csv::Error;
    fn observations(&mut self) -> Result<Vec<Observation>, csv::Error> {
        read_observations(&mut self.reader)
    }
}
