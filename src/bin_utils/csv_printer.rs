use std::io::Write;

use anyhow::Context;
use csv::Writer;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct InvocationResult {
    pub line: u64,
    pub function: String,
    pub status: i32,
    pub message: String,
    pub payload: String,
}

pub fn print_results<W>(
    output: &mut W,
    results: impl Iterator<Item = InvocationResult>,
) -> anyhow::Result<()>
where
    W: Write,
{
    let mut writer = Writer::from_writer(output);
    for result in results {
        let line = result.line;
        writer
            .serialize(result)
            .with_context(|| format!("Failed to write result of line {line}"))?;
    }
    writer.flush().context("Failed to flush invocation results")?;
    Ok(())
}
