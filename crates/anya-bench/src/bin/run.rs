use std::error::Error;
use std::io::{self, Write};

use anya_bench::{RunConfig, USAGE};
use tracing_subscriber::filter::LevelFilter;

fn main() -> Result<(), Box<dyn Error>> {
    let config = match RunConfig::from_args(std::env::args().skip(1)) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            eprintln!("{USAGE}");
            return Ok(());
        }
    };

    // Results go to stdout, logs to stderr.
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_target(false)
        .without_time()
        .with_max_level(if config.verbose {
            LevelFilter::DEBUG
        } else {
            LevelFilter::INFO
        })
        .init();

    let mut out = io::BufWriter::new(io::stdout().lock());
    anya_bench::run(&config, &mut out)?;
    out.flush()?;
    Ok(())
}
