/*!
Checkpoint files: one serialized model per epoch, named by epoch, timestamp and hidden activation.

The serialized model holds the weights and hyperparameters. The activation is carried in the file name, so a
checkpoint loaded with [`load`] computes exactly what the saved model did.
*/
use crate::rnn::{Activation, Backprop, Rnn, RnnError, RnnFloat};
use chrono::{DateTime, Utc};
use std::fs::{self, OpenOptions};
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// The extension of checkpoint files
pub const EXTENSION: &str = "rnn";

/// An error loading a checkpoint
#[derive(Debug, Error)]
pub enum CheckpointError {
    /// The checkpoint could not be read
    #[error("could not read checkpoint: {0}")]
    Io(#[from] io::Error),
    /// The checkpoint is not a valid model of the requested shape
    #[error("invalid checkpoint: {0}")]
    Model(#[from] RnnError),
}

/// The file name of the checkpoint for `epoch` of a model with a given activation, written at `timestamp`
pub fn file_name(epoch: usize, timestamp: DateTime<Utc>, activation: Activation) -> String {
    format!("{}.{}", file_stem(epoch, timestamp, activation), EXTENSION)
}

fn file_stem(epoch: usize, timestamp: DateTime<Utc>, activation: Activation) -> String {
    format!(
        "epoch_{}_{}{:09}_{}",
        epoch,
        timestamp.timestamp(),
        timestamp.timestamp_subsec_nanos(),
        activation
    )
}

/// The activation recorded in a checkpoint's file name, if any
pub fn activation_of(path: &Path) -> Option<Activation> {
    let stem = path.file_stem()?.to_str()?;
    let activation = stem.split('_').nth(3)?;
    activation.split('-').next()?.parse().ok()
}

/// Write a checkpoint of `model` for `epoch` into `dir`, creating `dir` if needed.
///
/// Never overwrites an existing file: if a checkpoint with the same name exists, a numeric suffix is appended.
/// Returns the path written.
pub fn save<F: RnnFloat, const I: usize, const H: usize, const O: usize>(
    dir: &Path,
    epoch: usize,
    model: &Rnn<F, I, H, O>,
) -> io::Result<PathBuf> {
    save_at(dir, epoch, model, Utc::now())
}

fn save_at<F: RnnFloat, const I: usize, const H: usize, const O: usize>(
    dir: &Path,
    epoch: usize,
    model: &Rnn<F, I, H, O>,
    timestamp: DateTime<Utc>,
) -> io::Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let stem = file_stem(epoch, timestamp, model.activation);
    let mut attempt = 0usize;
    loop {
        let path = if attempt == 0 {
            dir.join(format!("{}.{}", stem, EXTENSION))
        } else {
            dir.join(format!("{}-{}.{}", stem, attempt, EXTENSION))
        };
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut file) => {
                file.write_all(model.serialize().as_bytes())?;
                file.flush()?;
                return Ok(path);
            }
            Err(err) if err.kind() == ErrorKind::AlreadyExists => attempt += 1,
            Err(err) => return Err(err),
        }
    }
}

/// Load a checkpoint written by [`save`], restoring the activation recorded in its file name.
///
/// Files without a recorded activation load with the default. The gradient procedure is not recorded and is
/// always the default; it does not affect predictions.
pub fn load<F: RnnFloat, const I: usize, const H: usize, const O: usize>(
    path: &Path,
) -> Result<Rnn<F, I, H, O>, CheckpointError> {
    let activation = activation_of(path).unwrap_or_default();
    load_with(path, activation, Backprop::default())
}

/// Load a checkpoint with an explicit activation and gradient procedure
pub fn load_with<F: RnnFloat, const I: usize, const H: usize, const O: usize>(
    path: &Path,
    activation: Activation,
    backprop: Backprop,
) -> Result<Rnn<F, I, H, O>, CheckpointError> {
    let serialized = fs::read_to_string(path)?;
    Ok(Rnn::deserialize(&serialized)?
        .with_activation(activation)
        .with_backprop(backprop))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::tempdir;

    #[test]
    fn names_embed_epoch_nanoseconds_and_activation() {
        let timestamp = Utc.timestamp_opt(1_600_000_000, 42).unwrap();
        let name = file_name(7, timestamp, Activation::Sigmoid);
        assert_eq!(name, "epoch_7_1600000000000000042_sigmoid.rnn");
        assert_eq!(activation_of(Path::new(&name)), Some(Activation::Sigmoid));
        assert_eq!(activation_of(Path::new("epoch_7_1600000000000000042_relu-2.rnn")), Some(Activation::Relu));
        assert_eq!(activation_of(Path::new("epoch_7_1600000000000000042.rnn")), None);
    }

    #[test]
    fn same_timestamp_gets_a_suffix() {
        let dir = tempdir().unwrap();
        let timestamp = Utc.timestamp_opt(1_600_000_000, 0).unwrap();
        let model = Rnn::<f64, 2, 2, 1>::new(0.01, 1.0, 1);
        let first = save_at(dir.path(), 1, &model, timestamp).unwrap();
        let second = save_at(dir.path(), 1, &model, timestamp).unwrap();
        let third = save_at(dir.path(), 1, &model, timestamp).unwrap();
        assert_eq!(first.file_name().unwrap(), "epoch_1_1600000000000000000_tanh.rnn");
        assert_eq!(second.file_name().unwrap(), "epoch_1_1600000000000000000_tanh-1.rnn");
        assert_eq!(third.file_name().unwrap(), "epoch_1_1600000000000000000_tanh-2.rnn");
        let loaded: Rnn<f64, 2, 2, 1> = load(&third).unwrap();
        assert_eq!(loaded, model);
    }
}
