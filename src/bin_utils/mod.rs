//! Replays a CSV file of invocations against [`BankContract`] running on the
//! in-memory platform, and prints every response as CSV.

use std::io::{Read, Write};

use crate::{
    account::PersonId,
    config::ContractConfig,
    contract::{BankContract, ContractError},
    platform::{
        Response,
        in_memory::{InMemoryLedger, InMemoryRegistry},
    },
};
use anyhow::{Context, Result};
use csv_parser::CsvInvocationParser;
use csv_printer::{InvocationResult, print_results};
pub mod csv_parser;
pub mod csv_printer;

pub struct Service<'w, R, W: 'w> {
    pub input: R,
    pub output: &'w mut W,
    pub config: ContractConfig,
    /// People known to the registry.
    pub persons: Vec<PersonId>,
    pub error_printer: Box<dyn FnMut(u64, &ContractError)>,
}

impl<'w, R, W> Service<'w, R, W>
where
    R: Read,
    W: Write + 'w,
{
    pub fn run(mut self) -> Result<()> {
        let parser = CsvInvocationParser::new(self.input);

        let registry = InMemoryRegistry::new(&self.config, self.persons);
        let mut contract = BankContract::with_config(InMemoryLedger::new(), registry, self.config);
        contract.init();

        let mut results = Vec::new();
        for row in parser {
            let (line, invocation) = row.context("Failed to read invocation")?;
            // each row runs in a transaction of its own
            contract.ledger_mut().begin_transaction(format!("tx{line}"));

            let result = contract.execute(&invocation.function, &invocation.args);
            if let Err(err) = &result {
                (self.error_printer)(line, err);
            }
            let response = Response::from_result(result);
            results.push(InvocationResult {
                line,
                function: invocation.function,
                status: response.status,
                message: response.message,
                payload: response
                    .payload
                    .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
                    .unwrap_or_default(),
            });
        }

        print_results(self.output, results.into_iter())
    }
}
