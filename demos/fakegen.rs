/*!
Generate some fake VIX data as CSV on stdout
*/
use anyhow::format_err;
use chrono::NaiveDate;
use clap::{App, Arg};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rustyline::error::ReadlineError;
use rustyline::Editor;
use std::io::stdout;
use vixburn::data::{fake::VixWalk, vix::write_observations};

fn main() -> anyhow::Result<()> {
    let matches = App::new("Fake VIX Generator")
        .version("1.0")
        .author("Jad Elkhaleq Ghalayini <jad.ghalayini@mail.utoronto.ca>")
        .about("Generates a mean-reverting random walk in FRED VIX CSV format")
        .arg(
            Arg::with_name("POINTS")
                .help("Number of observations to generate. Prompts if absent")
                .index(1),
        )
        .arg(
            Arg::with_name("seed")
                .short("s")
                .long("seed")
                .help("Seed for reproducible output")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("start")
                .long("start")
                .help("First date, as YYYY-MM-DD. Defaults to 1990-01-02")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("volatility")
                .long("volatility")
                .help("Standard deviation of the daily shock. Defaults to 1.5")
                .takes_value(true),
        )
        .get_matches();

    let points = if let Some(points) = matches.value_of("POINTS") {
        usize::from_str_radix(points, 10)?
    } else {
        let mut rl = Editor::<()>::new();
        loop {
            match rl.readline("Points to generate: ") {
                Ok(line) => match usize::from_str_radix(line.trim(), 10) {
                    Ok(points) => break points,
                    Err(_) => eprintln!("Invalid input: {:?}", line),
                },
                Err(ReadlineError::Interrupted) => {
                    eprintln!("CTRL-C");
                    return Ok(());
                }
                Err(ReadlineError::Eof) => {
                    eprintln!("CTRL-D");
                    return Ok(());
                }
                Err(err) => eprintln!("Error: {:?}", err),
            }
        }
    };
    let rng = match matches.value_of("seed") {
        Some(seed) => StdRng::seed_from_u64(u64::from_str_radix(seed, 10)?),
        None => StdRng::from_entropy(),
    };
    let start = NaiveDate::parse_from_str(matches.value_of("start").unwrap_or("1990-01-02"), "%Y-%m-%d")?;
    let volatility: f64 = matches.value_of("volatility").unwrap_or("1.5").parse()?;
    let walk = VixWalk::new(rng, start, volatility)
        .map_err(|err| format_err!("Invalid volatility {}: {:?}", volatility, err))?;

    let stdout = stdout();
    let written = write_observations(stdout.lock(), walk.take(points))?;
    eprintln!("Wrote {} observations", written);
    Ok(())
}
