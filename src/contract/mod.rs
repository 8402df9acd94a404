use rust_decimal::Decimal;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
    account::{AccountError, BankAccount, CodecError},
    command::{BankCommand, CommandError},
    config::ContractConfig,
    platform::{ContractInvoker, Ledger, LedgerError, Response},
};

mod history;
mod lifecycle;
mod transfer;

/// Failure classes of a contract invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    ArgumentCount,
    Decode,
    Encode,
    PersonValidation,
    AlreadyExists,
    NotFound,
    InsufficientFunds,
    BalanceOverflow,
    AmountParse,
    StorageRead,
    StorageWrite,
    HistoryUnavailable,
    HistoryRead,
    UnknownOperation,
}

#[derive(Debug, Error)]
pub enum ContractError {
    #[error(transparent)]
    Command(#[from] CommandError),
    #[error(transparent)]
    Account(#[from] AccountError),
    #[error("Failed to validate person with id {person_id}: {reason}")]
    PersonValidation { person_id: String, reason: String },
    #[error("Bank account with number {account_number} already exists")]
    AlreadyExists { account_number: String },
    #[error("Bank account with number {account_number} doesn't exist")]
    NotFound { account_number: String },
    #[error("Failed to read bank account {account_number}: {source}")]
    Decode {
        account_number: String,
        source: CodecError,
    },
    #[error("Failed to encode bank account {account_number}: {source}")]
    Encode {
        account_number: String,
        source: CodecError,
    },
    #[error("Failed to read state of {key}: {source}")]
    StorageRead { key: String, source: LedgerError },
    #[error("Failed to write state of {key}: {source}")]
    StorageWrite { key: String, source: LedgerError },
    #[error("Failed to read history of {key}: {source}")]
    HistoryUnavailable { key: String, source: LedgerError },
    #[error("Failed to advance history of {key}: {source}")]
    HistoryRead { key: String, source: LedgerError },
}

impl ContractError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Command(err) => match err {
                CommandError::UnknownOperation { .. } => ErrorKind::UnknownOperation,
                CommandError::ArgumentCount { .. } => ErrorKind::ArgumentCount,
                CommandError::Decode(_) => ErrorKind::Decode,
                CommandError::AmountParse { .. } | CommandError::NegativeAmount { .. } => {
                    ErrorKind::AmountParse
                }
            },
            Self::Account(err) => match err {
                AccountError::InsufficientFunds { .. } => ErrorKind::InsufficientFunds,
                AccountError::BalanceOverflow { .. } => ErrorKind::BalanceOverflow,
            },
            Self::PersonValidation { .. } => ErrorKind::PersonValidation,
            Self::AlreadyExists { .. } => ErrorKind::AlreadyExists,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Decode { .. } => ErrorKind::Decode,
            Self::Encode { .. } => ErrorKind::Encode,
            Self::StorageRead { .. } => ErrorKind::StorageRead,
            Self::StorageWrite { .. } => ErrorKind::StorageWrite,
            Self::HistoryUnavailable { .. } => ErrorKind::HistoryUnavailable,
            Self::HistoryRead { .. } => ErrorKind::HistoryRead,
        }
    }
}

/// Successful result of an invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Empty,
    Balance(Decimal),
    History(Vec<String>),
}

impl Payload {
    /// Bytes carried by the response envelope: nothing, the balance as
    /// decimal text, or the history lines as a JSON array.
    pub fn into_bytes(self) -> Option<Vec<u8>> {
        match self {
            Payload::Empty => None,
            Payload::Balance(balance) => Some(balance.to_string().into_bytes()),
            Payload::History(lines) => Some(
                serde_json::Value::from(lines)
                    .to_string()
                    .into_bytes(),
            ),
        }
    }
}

impl Response {
    pub fn from_result(result: Result<Payload, ContractError>) -> Self {
        match result {
            Ok(payload) => Response::success(payload.into_bytes()),
            Err(err) => Response::error(err.to_string()),
        }
    }
}

/// Bank account contract.
///
/// Holds nothing but its ports and configuration: every invocation loads what
/// it needs from the ledger and writes back before returning, so running the
/// same invocation twice against the same state gives the same result and the
/// same writes.
///
/// Invocations touching several keys (a transfer writes two accounts) rely on
/// the platform committing all writes of one invocation as a single
/// transaction. Nothing here rolls back a write when a later one fails; the
/// failure is reported and names the key that could not be written.
pub struct BankContract<L, I> {
    ledger: L,
    registry: I,
    config: ContractConfig,
}

impl<L, I> BankContract<L, I>
where
    L: Ledger,
    I: ContractInvoker,
{
    pub fn new(ledger: L, registry: I) -> Self {
        Self::with_config(ledger, registry, ContractConfig::default())
    }

    pub fn with_config(ledger: L, registry: I, config: ContractConfig) -> Self {
        Self {
            ledger,
            registry,
            config,
        }
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut L {
        &mut self.ledger
    }

    pub fn registry_mut(&mut self) -> &mut I {
        &mut self.registry
    }

    pub fn init(&mut self) -> Response {
        info!("Bank management contract is initialized");
        Response::success(None)
    }

    /// Runs `function` and wraps the outcome into a response envelope.
    pub fn invoke(&mut self, function: &str, args: &[String]) -> Response {
        Response::from_result(self.execute(function, args))
    }

    pub fn execute(&mut self, function: &str, args: &[String]) -> Result<Payload, ContractError> {
        let command = BankCommand::parse(function, args).inspect_err(|err| {
            warn!(function, %err, "Rejected invocation");
        })?;
        let operation = command.operation();
        debug!(?command, "Resolved command");

        let result = match command {
            BankCommand::AddAccount { account, raw } => self.add_account(&account, &raw),
            BankCommand::DelAccount { account_number } => self.del_account(&account_number),
            BankCommand::GetBalance { account_number } => self.get_balance(&account_number),
            BankCommand::Transfer(transfer) => self.transfer(&transfer),
            BankCommand::GetHistory { account_number } => self.get_history(&account_number),
        };
        if let Err(err) = &result {
            warn!(%operation, kind = ?err.kind(), %err, "Invocation failed");
        }
        result
    }

    fn read_state(&self, key: &str) -> Result<Option<Vec<u8>>, ContractError> {
        self.ledger
            .get_state(key)
            .map_err(|source| ContractError::StorageRead {
                key: key.to_string(),
                source,
            })
    }

    fn read_existing(&self, key: &str) -> Result<Vec<u8>, ContractError> {
        self.read_state(key)?.ok_or_else(|| ContractError::NotFound {
            account_number: key.to_string(),
        })
    }

    fn load_account(&self, account_number: &str) -> Result<BankAccount, ContractError> {
        let bytes = self.read_existing(account_number)?;
        BankAccount::decode(&bytes).map_err(|source| ContractError::Decode {
            account_number: account_number.to_string(),
            source,
        })
    }

    fn store_account(&mut self, account: &BankAccount) -> Result<(), ContractError> {
        let bytes = account.encode().map_err(|source| ContractError::Encode {
            account_number: account.account_number.clone(),
            source,
        })?;
        self.write_state(&account.account_number, &bytes)
    }

    fn write_state(&mut self, key: &str, value: &[u8]) -> Result<(), ContractError> {
        self.ledger
            .put_state(key, value)
            .map_err(|source| ContractError::StorageWrite {
                key: key.to_string(),
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::in_memory::{InMemoryLedger, InMemoryRegistry};

    pub(super) const ACC_1: &str = r#"{"personId":42,"accountNumber":"ACC-1","balance":100.00}"#;
    pub(super) const ACC_2: &str = r#"{"personId":43,"accountNumber":"ACC-2","balance":0.00}"#;

    pub(super) type TestContract = BankContract<InMemoryLedger, InMemoryRegistry>;

    pub(super) fn contract() -> TestContract {
        let registry = InMemoryRegistry::new(&ContractConfig::default(), [42, 43]);
        BankContract::new(InMemoryLedger::new(), registry)
    }

    /// Runs `function` inside its own ledger transaction `tx_id`.
    pub(super) fn run(
        contract: &mut TestContract,
        tx_id: &str,
        function: &str,
        args: &[&str],
    ) -> Result<Payload, ContractError> {
        contract.ledger_mut().begin_transaction(tx_id);
        let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
        contract.execute(function, &args)
    }

    pub(super) fn balance(contract: &mut TestContract, account_number: &str) -> String {
        match run(contract, "query", "getBalance", &[account_number]).unwrap() {
            Payload::Balance(balance) => balance.to_string(),
            other => panic!("unexpected payload {other:?}"),
        }
    }

    #[test]
    fn encode_failure_is_its_own_kind() {
        let source = serde_json::from_str::<u8>("x").unwrap_err();
        let err = ContractError::Encode {
            account_number: "ACC-1".to_string(),
            source: CodecError::Encode(source),
        };
        assert_eq!(err.kind(), ErrorKind::Encode);
        assert!(
            err.to_string()
                .starts_with("Failed to encode bank account ACC-1: ")
        );
    }

    #[test]
    fn unknown_operation() {
        let mut contract = contract();
        let err = run(&mut contract, "tx1", "getPerson", &["42"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownOperation);
        assert_eq!(err.to_string(), "Unknown operation `getPerson`");
    }

    #[test]
    fn invoke_wraps_results_into_responses() {
        let mut contract = contract();
        assert!(contract.init().is_success());

        let response = contract.invoke("addAccount", &[ACC_1.to_string()]);
        assert_eq!(response, Response::success(None));

        let response = contract.invoke("getBalance", &["ACC-1".to_string()]);
        assert_eq!(response.status, Response::OK);
        assert_eq!(response.payload.as_deref(), Some(b"100.00".as_slice()));

        let response = contract.invoke("getBalance", &["ACC-9".to_string()]);
        assert_eq!(response.status, Response::ERROR);
        assert_eq!(
            response.message,
            "Bank account with number ACC-9 doesn't exist"
        );
        assert_eq!(response.payload, None);
    }

    #[test]
    fn history_payload_is_json_array() {
        let bytes = Payload::History(vec!["tx2 deleted".to_string(), "a \"b\"".to_string()])
            .into_bytes()
            .unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            r#"["tx2 deleted","a \"b\""]"#
        );
        assert_eq!(Payload::Empty.into_bytes(), None);
    }

    #[test]
    fn storage_read_faults_surface() {
        let mut contract = contract();
        run(&mut contract, "tx1", "addAccount", &[ACC_1]).unwrap();
        contract.ledger_mut().fail_reads_of("ACC-1");

        for function in ["getBalance", "delAccount"] {
            let err = run(&mut contract, "tx2", function, &["ACC-1"]).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::StorageRead);
        }
        let err = run(&mut contract, "tx2", "addAccount", &[ACC_1]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StorageRead);
    }

    #[test]
    fn same_invocation_same_outcome() {
        let mut first = contract();
        run(&mut first, "tx1", "addAccount", &[ACC_1]).unwrap();
        run(&mut first, "tx2", "addAccount", &[ACC_2]).unwrap();
        let mut second = BankContract::new(
            first.ledger().clone(),
            InMemoryRegistry::new(&ContractConfig::default(), [42, 43]),
        );

        let a = run(&mut first, "tx3", "transfer", &["ACC-1", "ACC-2", "12.5"]);
        let b = run(&mut second, "tx3", "transfer", &["ACC-1", "ACC-2", "12.5"]);
        assert_eq!(a.unwrap(), b.unwrap());
        for key in ["ACC-1", "ACC-2"] {
            assert_eq!(first.ledger().state(key), second.ledger().state(key));
            assert_eq!(first.ledger().history(key), second.ledger().history(key));
        }
    }
}
