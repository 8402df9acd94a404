use std::{fmt, str::FromStr};

use rust_decimal::Decimal;
use thiserror::Error;

use crate::account::{BankAccount, CodecError, parse_exact_decimal};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    AddAccount,
    DelAccount,
    GetBalance,
    Transfer,
    GetHistory,
}

impl Operation {
    pub const ALL: [Operation; 5] = [
        Operation::AddAccount,
        Operation::DelAccount,
        Operation::GetBalance,
        Operation::Transfer,
        Operation::GetHistory,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Operation::AddAccount => "addAccount",
            Operation::DelAccount => "delAccount",
            Operation::GetBalance => "getBalance",
            Operation::Transfer => "transfer",
            Operation::GetHistory => "getHistory",
        }
    }

    /// Number of arguments the operation takes.
    pub fn arity(self) -> usize {
        match self {
            Operation::Transfer => 3,
            _ => 1,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Operation {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Operation::ALL
            .into_iter()
            .find(|op| op.name() == s)
            .ok_or_else(|| CommandError::UnknownOperation {
                name: s.to_string(),
            })
    }
}

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Unknown operation `{name}`")]
    UnknownOperation { name: String },
    #[error("Wrong number of arguments for {operation}: expected {expected}, got {actual}")]
    ArgumentCount {
        operation: Operation,
        expected: usize,
        actual: usize,
    },
    #[error("Failed to decode bank account argument: {0}")]
    Decode(#[source] CodecError),
    #[error("Failed to convert amount `{amount}` to a number: {source}")]
    AmountParse {
        amount: String,
        source: rust_decimal::Error,
    },
    #[error("Amount must not be negative, got {amount}")]
    NegativeAmount { amount: Decimal },
}

#[derive(Debug, Clone)]
pub struct TransferCommand {
    pub from: String,
    pub to: String,
    pub amount: Decimal,
}

/// A resolved invocation: the operation plus its validated arguments.
#[derive(Debug, Clone)]
pub enum BankCommand {
    AddAccount {
        account: BankAccount,
        /// The argument exactly as received; this is what gets stored.
        raw: Vec<u8>,
    },
    DelAccount { account_number: String },
    GetBalance { account_number: String },
    Transfer(TransferCommand),
    GetHistory { account_number: String },
}

impl BankCommand {
    /// Builds the command for `function` out of the invocation arguments.
    ///
    /// Argument count, account decoding and amount parsing are all checked
    /// here, before anything touches the ledger.
    pub fn parse(function: &str, args: &[String]) -> Result<Self, CommandError> {
        let operation: Operation = function.parse()?;
        if args.len() != operation.arity() {
            return Err(CommandError::ArgumentCount {
                operation,
                expected: operation.arity(),
                actual: args.len(),
            });
        }

        match (operation, args) {
            (Operation::AddAccount, [serialized]) => {
                let raw = serialized.as_bytes().to_vec();
                let account = BankAccount::decode(&raw).map_err(CommandError::Decode)?;
                Ok(Self::AddAccount { account, raw })
            }
            (Operation::DelAccount, [account_number]) => Ok(Self::DelAccount {
                account_number: account_number.clone(),
            }),
            (Operation::GetBalance, [account_number]) => Ok(Self::GetBalance {
                account_number: account_number.clone(),
            }),
            (Operation::Transfer, [from, to, amount]) => Ok(Self::Transfer(TransferCommand {
                from: from.clone(),
                to: to.clone(),
                amount: parse_amount(amount)?,
            })),
            (Operation::GetHistory, [account_number]) => Ok(Self::GetHistory {
                account_number: account_number.clone(),
            }),
            // arity was checked above
            (operation, args) => Err(CommandError::ArgumentCount {
                operation,
                expected: operation.arity(),
                actual: args.len(),
            }),
        }
    }

    pub fn operation(&self) -> Operation {
        match self {
            Self::AddAccount { .. } => Operation::AddAccount,
            Self::DelAccount { .. } => Operation::DelAccount,
            Self::GetBalance { .. } => Operation::GetBalance,
            Self::Transfer(_) => Operation::Transfer,
            Self::GetHistory { .. } => Operation::GetHistory,
        }
    }
}

fn parse_amount(text: &str) -> Result<Decimal, CommandError> {
    let amount = parse_exact_decimal(text.trim()).map_err(|source| CommandError::AmountParse {
        amount: text.to_string(),
        source,
    })?;
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(CommandError::NegativeAmount { amount });
    }
    Ok(amount)
}
