use thiserror::Error;

pub mod in_memory;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct LedgerError(pub String);

impl LedgerError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

/// One entry of a key's history log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyModification {
    pub tx_id: String,
    pub value: Vec<u8>,
    pub is_delete: bool,
}

/// Lazy, newest-first, single-pass history of a key.
pub type HistoryIter<'a> = Box<dyn Iterator<Item = Result<KeyModification, LedgerError>> + 'a>;

/// Key-value state of the ledger, as seen from inside one transaction.
///
/// Every call is part of the transaction the platform opened for the current
/// invocation. Atomicity of several writes, ordering and durability all come
/// from the platform, not from callers of this trait.
pub trait Ledger {
    /// Returns `None` when nothing is stored under `key`.
    fn get_state(&self, key: &str) -> Result<Option<Vec<u8>>, LedgerError>;

    fn put_state(&mut self, key: &str, value: &[u8]) -> Result<(), LedgerError>;

    fn del_state(&mut self, key: &str) -> Result<(), LedgerError>;

    fn get_history_for_key(&self, key: &str) -> Result<HistoryIter<'_>, LedgerError>;
}

/// Calls a function of another contract deployed on the platform.
pub trait ContractInvoker {
    fn invoke_contract(&self, contract: &str, channel: &str, args: &[Vec<u8>]) -> Response;
}

/// Response envelope shared by every contract on the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: i32,
    pub message: String,
    pub payload: Option<Vec<u8>>,
}

impl Response {
    pub const OK: i32 = 200;
    pub const ERROR: i32 = 500;
    /// Statuses from this one up are failures.
    pub const ERROR_THRESHOLD: i32 = 400;

    pub fn success(payload: Option<Vec<u8>>) -> Self {
        Self {
            status: Self::OK,
            message: String::new(),
            payload,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: Self::ERROR,
            message: message.into(),
            payload: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status < Self::ERROR_THRESHOLD
    }
}
