use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::{account::PersonId, config::ContractConfig};

use super::{ContractInvoker, HistoryIter, KeyModification, Ledger, LedgerError, Response};

/// Ledger kept in process memory, with a per-key history log.
///
/// Writes are applied immediately and recorded under the current transaction
/// id (see [`InMemoryLedger::begin_transaction`]). Faults can be injected per
/// key to exercise error paths.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLedger {
    state: HashMap<String, Vec<u8>>,
    // oldest first
    history: HashMap<String, Vec<KeyModification>>,
    tx_id: String,
    faults: Faults,
}

#[derive(Debug, Clone, Default)]
struct Faults {
    reads: HashSet<String>,
    writes: HashSet<String>,
    history: HashSet<String>,
    history_reads: HashMap<String, usize>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every following write is recorded in the history log under `tx_id`.
    pub fn begin_transaction(&mut self, tx_id: impl Into<String>) {
        self.tx_id = tx_id.into();
    }

    pub fn state(&self, key: &str) -> Option<&[u8]> {
        self.state.get(key).map(Vec::as_slice)
    }

    /// History of `key`, oldest first.
    pub fn history(&self, key: &str) -> &[KeyModification] {
        self.history.get(key).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn fail_reads_of(&mut self, key: impl Into<String>) {
        self.faults.reads.insert(key.into());
    }

    pub fn fail_writes_of(&mut self, key: impl Into<String>) {
        self.faults.writes.insert(key.into());
    }

    pub fn fail_history_of(&mut self, key: impl Into<String>) {
        self.faults.history.insert(key.into());
    }

    /// History of `key` yields `entries` items, then a read fault.
    pub fn fail_history_read_after(&mut self, key: impl Into<String>, entries: usize) {
        self.faults.history_reads.insert(key.into(), entries);
    }

    pub fn clear_faults(&mut self) {
        self.faults = Faults::default();
    }

    fn record(&mut self, key: &str, value: Vec<u8>, is_delete: bool) {
        let log = self.history.entry(key.to_owned()).or_default();
        let modification = KeyModification {
            tx_id: self.tx_id.clone(),
            value,
            is_delete,
        };
        // only the last write of a transaction makes it into the log
        match log.last_mut() {
            Some(last) if last.tx_id == self.tx_id => *last = modification,
            _ => log.push(modification),
        }
    }

    fn check_write(&self, key: &str) -> Result<(), LedgerError> {
        if self.faults.writes.contains(key) {
            return Err(LedgerError::new(format!("write to {key} rejected")));
        }
        Ok(())
    }
}

impl Ledger for InMemoryLedger {
    fn get_state(&self, key: &str) -> Result<Option<Vec<u8>>, LedgerError> {
        if self.faults.reads.contains(key) {
            return Err(LedgerError::new(format!("read of {key} rejected")));
        }
        Ok(self.state.get(key).cloned())
    }

    fn put_state(&mut self, key: &str, value: &[u8]) -> Result<(), LedgerError> {
        self.check_write(key)?;
        debug!(key, tx_id = %self.tx_id, "put state");
        self.state.insert(key.to_owned(), value.to_vec());
        self.record(key, value.to_vec(), false);
        Ok(())
    }

    fn del_state(&mut self, key: &str) -> Result<(), LedgerError> {
        self.check_write(key)?;
        debug!(key, tx_id = %self.tx_id, "delete state");
        self.state.remove(key);
        self.record(key, Vec::new(), true);
        Ok(())
    }

    fn get_history_for_key(&self, key: &str) -> Result<HistoryIter<'_>, LedgerError> {
        if self.faults.history.contains(key) {
            return Err(LedgerError::new(format!("history of {key} is not available")));
        }
        let fail_after = self.faults.history_reads.get(key).copied();
        let key = key.to_owned();
        let entries = self.history(&key).iter().rev().enumerate();
        Ok(Box::new(entries.map(move |(idx, entry)| {
            if fail_after.is_some_and(|n| idx >= n) {
                Err(LedgerError::new(format!("history of {key} broke at entry {idx}")))
            } else {
                Ok(entry.clone())
            }
        })))
    }
}

/// Stand-in for the person registry contract, answering `getPerson`.
#[derive(Debug, Clone)]
pub struct InMemoryRegistry {
    contract: String,
    channel: String,
    persons: HashSet<PersonId>,
}

impl InMemoryRegistry {
    /// Registry deployed where `config` expects it.
    pub fn new(config: &ContractConfig, persons: impl IntoIterator<Item = PersonId>) -> Self {
        Self {
            contract: config.registry_contract.clone(),
            channel: config.registry_channel.clone(),
            persons: persons.into_iter().collect(),
        }
    }

    pub fn add_person(&mut self, id: PersonId) {
        self.persons.insert(id);
    }

    fn get_person(&self, args: &[Vec<u8>]) -> Response {
        let [id] = args else {
            return Response::error("wrong number of arguments");
        };
        let id = String::from_utf8_lossy(id);
        match id.parse::<PersonId>() {
            Ok(person) if self.persons.contains(&person) => {
                Response::success(Some(person.to_string().into_bytes()))
            }
            Ok(_) => Response::error(format!("person with id {id} doesn't exist")),
            Err(_) => Response::error(format!("invalid person id {id}")),
        }
    }
}

impl ContractInvoker for InMemoryRegistry {
    fn invoke_contract(&self, contract: &str, channel: &str, args: &[Vec<u8>]) -> Response {
        if contract != self.contract || channel != self.channel {
            return Response::error(format!(
                "contract {contract} is not deployed on channel {channel}"
            ));
        }
        match args.split_first() {
            Some((function, rest)) if function.as_slice() == b"getPerson" => self.get_person(rest),
            Some((function, _)) => Response::error(format!(
                "unknown function {}",
                String::from_utf8_lossy(function)
            )),
            None => Response::error("function name is required"),
        }
    }
}
