/*!
Generate fake VIX data, for testing purposes
*/
use super::{Observation, Series};
use crate::*;
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal, NormalError};
use std::convert::Infallible;

/// The long-run mean of the VIX, roughly
pub const VIX_MEAN: CpuFloat = 19.5;

/// The lowest value the generated series may take
pub const VIX_FLOOR: CpuFloat = 9.0;

/// Generate fake daily index values using a mean-reverting random walk over weekdays
#[derive(Debug, Clone)]
pub struct VixWalk<R> {
    /// The RNG used by this random walk
    pub rng: R,
    /// The date of the next observation
    pub date: NaiveDate,
    /// The value of the next observation
    pub value: CpuFloat,
    /// The value the walk reverts to
    pub mean: CpuFloat,
    /// The fraction of the distance to the mean covered each day
    pub reversion: CpuFloat,
    /// The distribution of daily shocks
    pub shocks: Normal<CpuFloat>,
}

impl<R: Rng> VixWalk<R> {
    /// Start a walk at the mean on `start`, or the first weekday after it, with a given daily volatility
    pub fn new(rng: R, start: NaiveDate, volatility: CpuFloat) -> Result<VixWalk<R>, NormalError> {
        Ok(VixWalk {
            rng,
            date: weekday_on_or_after(start),
            value: VIX_MEAN,
            mean: VIX_MEAN,
            reversion: 0.05,
            shocks: Normal::new(0.0, volatility)?,
        })
    }
}

impl VixWalk<StdRng> {
    /// A reproducible walk
    pub fn seeded(seed: u64, start: NaiveDate, volatility: CpuFloat) -> Result<VixWalk<StdRng>, NormalError> {
        VixWalk::new(StdRng::seed_from_u64(seed), start, volatility)
    }
}

impl<R: Rng> Iterator for VixWalk<R> {
    type Item = Observation;
    fn next(&mut self) -> Option<Observation> {
        let observation = Observation {
            date: self.date,
            value: self.value,
        };
        let shock = self.shocks.sample(&mut self.rng);
        self.value = (self.value + self.reversion * (self.mean - self.value) + shock).max(VIX_FLOOR);
        self.date = weekday_on_or_after(self.date + Duration::days(1));
        Some(observation)
    }
}

/// A fixed number of observations from a walk
#[derive(Debug, Clone)]
pub struct FakeVix<R> {
    /// The underlying walk
    pub walk: VixWalk<R>,
    /// How many observations to generate
    pub len: usize,
}

impl<R: Rng + Clone> Series for FakeVix<R> {
    type Error = Infallible;
    fn observations(&mut self) -> Result<Vec<Observation>, Infallible> {
        Ok(self.walk.clone().take(self.len).collect())
    }
}

fn weekday_on_or_after(mut date: NaiveDate) -> NaiveDate {
    while matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
        date = date + Duration::days(1)
    }
    date
}

#[cfg(test)]
mod tests {
    use super::*;

    fn start() -> NaiveDate {
        // A Saturday
        NaiveDate::from_ymd_opt(2021, 1, 2).unwrap()
    }

    #[test]
    fn walk_skips_weekends() {
        let walk = VixWalk::seeded(3, start(), 1.0).unwrap();
        let observations: Vec<_> = walk.take(20).collect();
        assert_eq!(observations[0].date, NaiveDate::from_ymd_opt(2021, 1, 4).unwrap());
        for pair in observations.windows(2) {
            assert!(pair[0].date < pair[1].date);
            assert!(!matches!(pair[1].date.weekday(), Weekday::Sat | Weekday::Sun));
        }
        assert!(observations.iter().all(|o| o.value >= VIX_FLOOR && o.value.is_finite()));
    }

    #[test]
    fn fake_series_is_reproducible() {
        let mut fake = FakeVix {
            walk: VixWalk::seeded(11, start(), 1.5).unwrap(),
            len: 100,
        };
        let first = fake.observations().unwrap();
        assert_eq!(first.len(), 100);
        assert_eq!(first, fake.observations().unwrap());
        assert_eq!(first[0].value, VIX_MEAN);
    }

    #[test]
    fn invalid_volatility() {
        assert!(VixWalk::seeded(0, start(), -1.0).is_err());
    }
}
