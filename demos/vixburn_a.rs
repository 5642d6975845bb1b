/*!
A very simple VIX RNN model
*/

use anyhow::format_err;
use chrono::NaiveDate;
use clap::{App, Arg};
use io_enum::*;
use std::fs::File;
use std::io::{stdin, Stdin};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use vixburn::data::{
    fake::{FakeVix, VixWalk},
    shuffle, train_test_split,
    vix::VixCsv,
    windows, Observation, Series,
};
use vixburn::env::{CheckpointPolicy, EnvConfig, Environment};
use vixburn::rnn::{Activation, Backprop, Rnn};

const WINDOW: usize = 32;
const HIDDEN_SIZE: usize = 512;
const LEARNING_RATE: f32 = 0.001;
const CLIP: f32 = 10.0;
const SEED: u64 = 42;
const SHUFFLE_SEED: u64 = 42;
const TRAIN_TEST_RATIO: f64 = 0.8;
const FAKE_VOLATILITY: f64 = 1.5;

#[derive(Debug, Read)]
pub enum IoSources {
    Stdin(Stdin),
    File(File),
}

fn parse_or<T: FromStr>(value: Option<&str>, default: T, name: &str) -> anyhow::Result<T> {
    match value {
        Some(value) => value
            .parse()
            .map_err(|_| format_err!("Invalid value for {}: {:?}", name, value)),
        None => Ok(default),
    }
}

pub fn run_network(
    verbosity: usize,
    observations: &[Observation],
    config: EnvConfig,
    activation: Activation,
    backprop: Backprop,
) -> anyhow::Result<()> {
    let mut samples = windows::<f32, WINDOW>(observations);
    if samples.is_empty() {
        return Err(format_err!(
            "VixBurn needs more than {} observations, recieved {}!",
            WINDOW,
            observations.len()
        ));
    }
    shuffle(&mut samples, SHUFFLE_SEED);
    let (training_data, testing_data) = train_test_split(samples, TRAIN_TEST_RATIO);
    if verbosity >= 1 {
        eprintln!(
            "{} training samples, {} testing samples",
            training_data.len(),
            testing_data.len()
        );
    }

    if verbosity >= 2 {
        eprintln!("Setting up network");
    }
    let model = Rnn::<f32, WINDOW, HIDDEN_SIZE, 1>::new(LEARNING_RATE, CLIP, SEED)
        .with_activation(activation)
        .with_backprop(backprop);
    let mut env = Environment::new(model, config);

    let report = env.train(&training_data)?;
    println!(
        "Trained for {} epochs{}: best mean training loss = {}",
        report.epochs.len(),
        if report.stopped_early { " (stopped early)" } else { "" },
        report.best_loss
    );

    if testing_data.is_empty() {
        if verbosity >= 1 {
            eprintln!("WARNING: no testing samples, skipping validation");
        }
        return Ok(());
    }
    let loss = env.validate(&testing_data)?;
    println!("Mean testing loss = {}", loss);
    Ok(())
}

pub fn main() -> anyhow::Result<()> {
    // Initialization, argument parsing
    let matches = App::new("VixBurn Alpha")
        .version("1.0")
        .author("Jad Elkhaleq Ghalayini <jad.ghalayini@mail.utoronto.ca>")
        .about("An RNN which attempts to predict the next value of the VIX")
        .arg(
            Arg::with_name("INPUT")
                .help("Input VIX data in FRED CSV format. Defaults to stdin")
                .index(1),
        )
        .arg(
            Arg::with_name("fake")
                .long("fake")
                .help("Train on this many fake observations instead of reading input")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("epochs")
                .short("e")
                .long("epochs")
                .help("Maximum number of epochs. Defaults to 1000")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("patience")
                .short("p")
                .long("patience")
                .help("Epochs without improvement before stopping. Defaults to 2")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("checkpoints")
                .short("c")
                .long("checkpoints")
                .help("Checkpoint directory. Defaults to checkpoints")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("no-checkpoints")
                .long("no-checkpoints")
                .help("Do not write checkpoints"),
        )
        .arg(
            Arg::with_name("strict-checkpoints")
                .long("strict-checkpoints")
                .help("Abort training if a checkpoint cannot be written"),
        )
        .arg(
            Arg::with_name("activation")
                .short("a")
                .long("activation")
                .help("Hidden activation: tanh, sigmoid, relu. Defaults to tanh")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("exact")
                .long("exact")
                .help("Use exact gradients for every parameter"),
        )
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .long("verbose")
                .help("Sets the level of verbosity")
                .takes_value(true),
        )
        .get_matches();

    let verbosity = parse_or(matches.value_of("verbose"), 0, "verbose")?;
    let defaults = EnvConfig::default();
    let config = EnvConfig {
        epochs: parse_or(matches.value_of("epochs"), defaults.epochs, "epochs")?,
        patience: parse_or(matches.value_of("patience"), defaults.patience, "patience")?,
        checkpoint_dir: if matches.is_present("no-checkpoints") {
            None
        } else {
            matches
                .value_of("checkpoints")
                .map(PathBuf::from)
                .or(defaults.checkpoint_dir)
        },
        on_checkpoint_error: if matches.is_present("strict-checkpoints") {
            CheckpointPolicy::Abort
        } else {
            CheckpointPolicy::Continue
        },
        verbosity,
    };
    let activation: Activation = matches
        .value_of("activation")
        .unwrap_or("tanh")
        .parse()
        .map_err(|_| format_err!("Invalid value for activation: {:?}", matches.value_of("activation")))?;
    let backprop = if matches.is_present("exact") {
        Backprop::Exact
    } else {
        Backprop::Observed
    };
    if verbosity >= 1 {
        eprintln!("Activation: {:?}, gradients: {:?}", activation, backprop);
    }

    let observations = if let Some(points) = matches.value_of("fake") {
        let points: usize = parse_or(Some(points), 0, "fake")?;
        let start = NaiveDate::from_ymd_opt(1990, 1, 2).ok_or_else(|| format_err!("Invalid start date"))?;
        let walk = VixWalk::seeded(SEED, start, FAKE_VOLATILITY)
            .map_err(|err| format_err!("Error building fake data generator: {:?}", err))?;
        FakeVix { walk, len: points }.observations()?
    } else {
        let reader = if let Some(path) = matches.value_of("INPUT") {
            IoSources::File(File::open(Path::new(path))?)
        } else {
            IoSources::Stdin(stdin())
        };
        VixCsv::new(reader).observations()?
    };
    if verbosity >= 1 {
        eprintln!("Loaded {} observations", observations.len());
    }

    run_network(verbosity, &observations, config, activation, backprop)
}
