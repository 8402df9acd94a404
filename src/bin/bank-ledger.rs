use std::fs::File;

use anyhow::{Context, Result};
use bank_ledger::{account::PersonId, bin_utils::Service, config::ContractConfig};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    // logs go to stderr, stdout carries the CSV results
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let mut args = std::env::args().skip(1);
    let filename = args
        .next()
        .context("Expected a file name as the first argument")?;
    let persons = args
        .map(|id| {
            id.parse::<PersonId>()
                .with_context(|| format!("Invalid person id `{id}`"))
        })
        .collect::<Result<Vec<_>>>()?;
    let file = File::open(&filename).with_context(|| format!("Failed to open `{filename}`"))?;

    let service = Service {
        input: file,
        output: &mut std::io::stdout(),
        config: ContractConfig::from_env(),
        persons,
        error_printer: Box::new(|line, err| eprintln!("Error at line {line}: {err}")),
    };
    service.run()
}
