/*!
The training environment: online training over epochs with early stopping, validation and per-epoch checkpoints
*/
use crate::linalg::Matrix;
use crate::rnn::{Rnn, RnnError, RnnFloat};
use crate::util::to_s;
use crate::*;
use chrono::Utc;
use indicatif::{ProgressBar, ProgressStyle};
use num::NumCast;
use std::fmt::{self, Display, Formatter};
use std::io;
use std::path::PathBuf;
use thiserror::Error;

pub mod checkpoint;

pub use crate::data::Sample;

/// What to do when a checkpoint cannot be written
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum CheckpointPolicy {
    /// Log a warning and keep training without that checkpoint
    Continue,
    /// Stop training and return the error
    Abort,
}

/// Configuration for an [`Environment`]
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct EnvConfig {
    /// The maximum number of epochs to train for
    pub epochs: usize,
    /// How many consecutive epochs without a new minimum mean loss are tolerated before stopping
    pub patience: usize,
    /// Where to write a checkpoint after every epoch, if anywhere
    pub checkpoint_dir: Option<PathBuf>,
    /// What to do when a checkpoint cannot be written
    pub on_checkpoint_error: CheckpointPolicy,
    /// 0 prints one line per epoch, 1 adds a progress bar and warnings, 2 and above adds detail
    pub verbosity: usize,
}

impl Default for EnvConfig {
    fn default() -> EnvConfig {
        EnvConfig {
            epochs: 1000,
            patience: 2,
            checkpoint_dir: Some(PathBuf::from("checkpoints")),
            on_checkpoint_error: CheckpointPolicy::Continue,
            verbosity: 0,
        }
    }
}

/// An error during training or validation
#[derive(Debug, Error)]
pub enum EnvError {
    /// There were no samples to train or validate on
    #[error("no samples to train or validate on")]
    NoSamples,
    /// The model was misused
    #[error(transparent)]
    Model(#[from] RnnError),
    /// A checkpoint could not be written and the policy is to abort
    #[error("could not write checkpoint for epoch {epoch}: {source}")]
    Checkpoint {
        /// The epoch being checkpointed
        epoch: usize,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },
}

/// The result of one training epoch
#[derive(Debug, Clone, PartialEq)]
pub struct EpochReport<F> {
    /// The epoch number, starting from 1
    pub epoch: usize,
    /// The sum of the per-sample losses
    pub loss: F,
    /// The mean per-sample loss
    pub mean_loss: F,
    /// Wall-clock time taken, in seconds
    pub seconds: CpuFloat,
    /// The checkpoint written after this epoch, if any
    pub checkpoint: Option<PathBuf>,
}

impl<F: Display> Display for EpochReport<F> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(
            f,
            "Epoch {}: {:.3}s, total loss = {}, mean loss = {}",
            self.epoch, self.seconds, self.loss, self.mean_loss
        )
    }
}

/// The result of a training run
#[derive(Debug, Clone, PartialEq)]
pub struct TrainReport<F> {
    /// Every completed epoch, in order
    pub epochs: Vec<EpochReport<F>>,
    /// Whether training stopped before the configured number of epochs
    pub stopped_early: bool,
    /// The lowest mean loss of any epoch
    pub best_loss: F,
}

/// Half the squared error summed over the outputs
pub fn squared_error<F: RnnFloat, const O: usize>(label: &Matrix<F, O, 1>, prediction: &Matrix<F, O, 1>) -> F {
    let half = F::one() / (F::one() + F::one());
    label
        .iter()
        .zip(prediction.iter())
        .fold(F::zero(), |loss, (&l, &p)| loss + half * (l - p) * (l - p))
}

/// Print a line above the progress bar, or straight to stderr when the bar is hidden
fn log_line(progress: &ProgressBar, line: String) {
    if progress.is_hidden() {
        eprintln!("{}", line)
    } else {
        progress.println(line)
    }
}

/// A model together with the configuration it is trained under
#[derive(Debug, Clone)]
pub struct Environment<F, const I: usize, const H: usize, const O: usize> {
    /// The training configuration
    pub config: EnvConfig,
    /// The model being trained
    pub model: Rnn<F, I, H, O>,
}

impl<F: RnnFloat, const I: usize, const H: usize, const O: usize> Environment<F, I, H, O> {
    /// Create a new environment
    pub fn new(model: Rnn<F, I, H, O>, config: EnvConfig) -> Environment<F, I, H, O> {
        Environment { config, model }
    }

    fn progress(&self, len: usize) -> ProgressBar {
        if self.config.verbosity == 0 {
            return ProgressBar::hidden();
        }
        let progress = ProgressBar::new(len as u64);
        progress.set_style(ProgressStyle::default_bar().template("[{msg:<20}] {wide_bar} {pos:> 7}/{len:7}"));
        progress
    }

    /// Train the model on `samples`, one sample at a time, in the order given.
    ///
    /// Every epoch runs forward, loss, backward and clear for each sample, then writes a checkpoint. Training stops
    /// after `config.epochs` epochs, or once `config.patience` consecutive epochs fail to set a new minimum mean loss.
    pub fn train(&mut self, samples: &[Sample<F, I, O>]) -> Result<TrainReport<F>, EnvError> {
        if samples.is_empty() {
            return Err(EnvError::NoSamples);
        }
        let n = <F as NumCast>::from(samples.len()).unwrap_or_else(F::max_value);
        self.model.clear_history();

        let epochs_progress = self.progress(self.config.epochs);
        epochs_progress.set_message("no loss");
        epochs_progress.println("Beginning training");

        let mut epochs = Vec::new();
        let mut best_loss = F::infinity();
        let mut stale = 0;
        let mut stopped_early = false;

        for epoch in 1..=self.config.epochs {
            let start = Utc::now();
            let mut loss = F::zero();
            for sample in samples {
                let prediction = self.model.forward(&sample.input)?;
                loss = loss + squared_error(&sample.label, &prediction);
                self.model.backward(&(sample.label - prediction))?;
                self.model.clear_history();
            }
            let seconds: CpuFloat = to_s(Utc::now() - start);
            let mean_loss = loss / n;

            let checkpoint = self.checkpoint(epoch)?;
            let report = EpochReport {
                epoch,
                loss,
                mean_loss,
                seconds,
                checkpoint,
            };
            log_line(&epochs_progress, report.to_string());
            if let (Some(path), true) = (&report.checkpoint, self.config.verbosity >= 2) {
                epochs_progress.println(format!("Wrote checkpoint {}", path.display()));
            }
            epochs.push(report);
            epochs_progress.set_message(&format!("loss = {:.5}", mean_loss));
            epochs_progress.inc(1);

            if mean_loss < best_loss {
                best_loss = mean_loss;
                stale = 0;
            } else {
                stale += 1;
                if stale >= self.config.patience {
                    log_line(
                        &epochs_progress,
                        format!("Stopping early: no improvement for {} epochs", stale),
                    );
                    stopped_early = true;
                    break;
                }
            }
        }

        epochs_progress.finish_and_clear();
        if self.config.verbosity >= 1 {
            eprintln!("Training complete");
        }
        Ok(TrainReport {
            epochs,
            stopped_early,
            best_loss,
        })
    }

    fn checkpoint(&self, epoch: usize) -> Result<Option<PathBuf>, EnvError> {
        let dir = match &self.config.checkpoint_dir {
            Some(dir) => dir,
            None => return Ok(None),
        };
        match checkpoint::save(dir, epoch, &self.model) {
            Ok(path) => Ok(Some(path)),
            Err(source) => match self.config.on_checkpoint_error {
                CheckpointPolicy::Continue => {
                    if self.config.verbosity >= 1 {
                        eprintln!("WARNING: could not write checkpoint for epoch {}: {}", epoch, source);
                    }
                    Ok(None)
                }
                CheckpointPolicy::Abort => Err(EnvError::Checkpoint { epoch, source }),
            },
        }
    }

    /// Compute the mean loss over `samples` without updating the model
    pub fn validate(&mut self, samples: &[Sample<F, I, O>]) -> Result<F, EnvError> {
        if samples.is_empty() {
            return Err(EnvError::NoSamples);
        }
        let n = <F as NumCast>::from(samples.len()).unwrap_or_else(F::max_value);
        self.model.clear_history();
        let mut loss = F::zero();
        for sample in samples {
            let prediction = self.model.predict(&sample.input)?;
            loss = loss + squared_error(&sample.label, &prediction);
        }
        let mean_loss = loss / n;
        if self.config.verbosity >= 1 {
            eprintln!("Validation: total loss = {}, mean loss = {}", loss, mean_loss);
        }
        Ok(mean_loss)
    }

    /// Predict the output for a single input window, leaving the model idle
    pub fn predict(&mut self, input: &Matrix<F, I, 1>) -> Result<Matrix<F, O, 1>, EnvError> {
        self.model.clear_history();
        Ok(self.model.predict(input)?)
    }
}
