/// Bank account record, its ledger encoding and balance arithmetic.
pub mod account;

/// Resolves an invocation (function name plus arguments) into a typed command.
pub mod command;

/// Location of the person registry the contract talks to.
pub mod config;

/// Bank account contract: account lifecycle, transfers and account history,
/// dispatched from a single entry point.
pub mod contract;

/// Interfaces of the hosting ledger platform (state, history, cross-contract
/// calls, response envelope), plus "in memory" implementations.
pub mod platform;

/// CSV replay harness behind the `bank-ledger` binary: runs each row against
/// the in-memory platform and writes one response row back. Lives in the
/// library so `tests/integration.rs` can drive it directly.
pub mod bin_utils;
