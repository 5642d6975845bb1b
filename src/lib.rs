/*!
A single hidden layer RNN for predicting the CBOE Volatility Index, written in Rust, as an experiment.

Built on a small fixed-dimension linear algebra library whose shapes are checked at compile time. The model is
trained online, one window of past observations at a time, with backpropagation through time, gradient clipping,
early stopping and a checkpoint after every epoch. Designed to be run on
[FRED VIX](https://fred.stlouisfed.org/series/VIXCLS) data, but also to be modular, extensible and easily modifiable.
*/
#![forbid(missing_docs)]

pub mod data;
pub mod env;
pub mod linalg;
pub mod rnn;
pub mod util;

/// The floating point type raw observations are stored in
pub type CpuFloat = f64;
