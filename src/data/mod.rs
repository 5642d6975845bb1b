/*!
Time series data: observations, where they come from, and the samples a model trains on
*/
use crate::linalg::{Matrix, Scalar};
use crate::*;
use chrono::NaiveDate;
use num::NumCast;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;

pub mod fake;
pub mod vix;

/// A single dated observation of a time series
#[derive(Debug, Copy, Clone, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Observation<F = CpuFloat> {
    /// The date of this observation
    #[serde(rename = "observation_date")]
    pub date: NaiveDate,
    /// The observed value
    #[serde(rename = "index_value")]
    pub value: F,
}

/// A source of a time series
pub trait Series {
    /// The error produced when the series cannot be retrieved
    type Error;
    /// Retrieve the full series, in ascending date order
    fn observations(&mut self) -> Result<Vec<Observation>, Self::Error>;
}

impl Series for Vec<Observation> {
    type Error = Infallible;
    fn observations(&mut self) -> Result<Vec<Observation>, Infallible> {
        let mut observations = self.clone();
        observations.sort_by_key(|observation| observation.date);
        Ok(observations)
    }
}

/// A training sample: a window of `I` inputs and the `O` values which follow it
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Sample<F, const I: usize, const O: usize> {
    /// The input window
    pub input: Matrix<F, I, 1>,
    /// The expected output
    pub label: Matrix<F, O, 1>,
}

impl<F: Copy, const I: usize, const O: usize> Sample<F, I, O> {
    /// Create a new sample
    #[inline]
    pub fn new(input: Matrix<F, I, 1>, label: Matrix<F, O, 1>) -> Sample<F, I, O> {
        Sample { input, label }
    }
}

/// Slice a series into overlapping windows of `I` consecutive values, each labelled with the value which follows.
///
/// A series of `n` observations yields `n - I` samples, or none if `n <= I`. Values which cannot be represented
/// in `F` are replaced by zero.
pub fn windows<F: Scalar + NumCast, const I: usize>(observations: &[Observation]) -> Vec<Sample<F, I, 1>> {
    let cast = |value: CpuFloat| -> F { NumCast::from(value).unwrap_or_else(F::zero) };
    observations
        .windows(I + 1)
        .map(|window| {
            Sample::new(
                Matrix::from_fn(|i, _| cast(window[i].value)),
                Matrix::uniform(cast(window[I].value)),
            )
        })
        .collect()
}

/// Shuffle samples deterministically given a seed
pub fn shuffle<T>(samples: &mut [T], seed: u64) {
    samples.shuffle(&mut StdRng::seed_from_u64(seed))
}

/// Split samples into a training set holding the first `ratio` of them and a testing set holding the rest
pub fn train_test_split<T>(mut samples: Vec<T>, ratio: f64) -> (Vec<T>, Vec<T>) {
    let train_samples = ((samples.len() as f64 * ratio) as usize).min(samples.len());
    let test_samples = samples.split_off(train_samples);
    (samples, test_samples)
}
