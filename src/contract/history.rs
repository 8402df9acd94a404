use rust_decimal::Decimal;
use tracing::debug;

use crate::{
    account::BankAccount,
    platform::{ContractInvoker, KeyModification, Ledger},
};

use super::{BankContract, ContractError, Payload};

enum Snapshot {
    Deleted,
    Balance(Decimal),
}

impl<L, I> BankContract<L, I>
where
    L: Ledger,
    I: ContractInvoker,
{
    /// One line per historical value of the account, newest first.
    ///
    /// Every stored value is decoded; balances are reported together with the
    /// change from the previous (older) value.
    pub(super) fn get_history(&self, account_number: &str) -> Result<Payload, ContractError> {
        let history = self
            .ledger
            .get_history_for_key(account_number)
            .map_err(|source| ContractError::HistoryUnavailable {
                key: account_number.to_string(),
                source,
            })?;

        let mut snapshots = Vec::new();
        for entry in history {
            let entry = entry.map_err(|source| ContractError::HistoryRead {
                key: account_number.to_string(),
                source,
            })?;
            let snapshot = decode_snapshot(account_number, &entry)?;
            snapshots.push((entry.tx_id, snapshot));
        }
        debug!(account_number, entries = snapshots.len(), "History loaded");

        let lines = snapshots
            .iter()
            .enumerate()
            .map(|(idx, (tx_id, snapshot))| {
                let older = snapshots.get(idx + 1).map(|(_, s)| s);
                describe(tx_id, snapshot, older)
            })
            .collect();
        Ok(Payload::History(lines))
    }
}

fn decode_snapshot(account_number: &str, entry: &KeyModification) -> Result<Snapshot, ContractError> {
    if entry.is_delete {
        return Ok(Snapshot::Deleted);
    }
    let account = BankAccount::decode(&entry.value).map_err(|source| ContractError::Decode {
        account_number: account_number.to_string(),
        source,
    })?;
    Ok(Snapshot::Balance(account.balance))
}

fn describe(tx_id: &str, snapshot: &Snapshot, older: Option<&Snapshot>) -> String {
    match (snapshot, older) {
        (Snapshot::Deleted, _) => format!("{tx_id} deleted"),
        (Snapshot::Balance(balance), Some(Snapshot::Balance(previous))) => {
            match balance.checked_sub(*previous) {
                Some(delta) => {
                    let sign = if delta < Decimal::ZERO { '-' } else { '+' };
                    format!("{tx_id} balance={balance} delta={sign}{}", delta.abs())
                }
                // change too large for a decimal, e.g. after an external overwrite
                None => format!("{tx_id} balance={balance}"),
            }
        }
        (Snapshot::Balance(balance), _) => format!("{tx_id} opened balance={balance}"),
    }
}

#[cfg(test)]
mod tests {
    use crate::contract::{
        ErrorKind, Payload,
        tests::{ACC_1, ACC_2, contract, run},
    };

    fn history(payload: Payload) -> Vec<String> {
        match payload {
            Payload::History(lines) => lines,
            other => panic!("unexpected payload {other:?}"),
        }
    }

    #[test]
    fn create_transfer_delete() {
        let mut contract = contract();
        run(&mut contract, "tx1", "addAccount", &[ACC_1]).unwrap();
        run(&mut contract, "tx2", "addAccount", &[ACC_2]).unwrap();
        run(&mut contract, "tx3", "transfer", &["ACC-1", "ACC-2", "30.00"]).unwrap();
        run(&mut contract, "tx4", "delAccount", &["ACC-1"]).unwrap();

        let lines = history(run(&mut contract, "tx5", "getHistory", &["ACC-1"]).unwrap());
        assert_eq!(
            lines,
            vec![
                "tx4 deleted",
                "tx3 balance=70.00 delta=-30.00",
                "tx1 opened balance=100.00",
            ]
        );

        let lines = history(run(&mut contract, "tx5", "getHistory", &["ACC-2"]).unwrap());
        assert_eq!(
            lines,
            vec!["tx3 balance=30.00 delta=+30.00", "tx2 opened balance=0.00"]
        );
    }

    #[test]
    fn recreated_account_opens_again() {
        let mut contract = contract();
        run(&mut contract, "tx1", "addAccount", &[ACC_1]).unwrap();
        run(&mut contract, "tx2", "delAccount", &["ACC-1"]).unwrap();
        run(&mut contract, "tx3", "addAccount", &[ACC_1]).unwrap();
        run(&mut contract, "tx4", "transfer", &["ACC-1", "ACC-1", "5"]).unwrap();

        let lines = history(run(&mut contract, "tx5", "getHistory", &["ACC-1"]).unwrap());
        assert_eq!(
            lines,
            vec![
                "tx4 balance=100.00 delta=+0.00",
                "tx3 opened balance=100.00",
                "tx2 deleted",
                "tx1 opened balance=100.00",
            ]
        );
    }

    #[test]
    fn change_out_of_decimal_range_is_shown_without_delta() {
        use crate::platform::Ledger;

        let mut contract = contract();
        contract.ledger_mut().begin_transaction("tx1");
        contract
            .ledger_mut()
            .put_state("X", br#"{"personId":1,"accountNumber":"X","balance":-1}"#)
            .unwrap();
        contract.ledger_mut().begin_transaction("tx2");
        contract
            .ledger_mut()
            .put_state(
                "X",
                br#"{"personId":1,"accountNumber":"X","balance":79228162514264337593543950335}"#,
            )
            .unwrap();

        let lines = history(run(&mut contract, "tx3", "getHistory", &["X"]).unwrap());
        assert_eq!(
            lines,
            vec![
                "tx2 balance=79228162514264337593543950335",
                "tx1 opened balance=-1",
            ]
        );
    }

    #[test]
    fn unknown_key_has_empty_history() {
        let mut contract = contract();
        let lines = history(run(&mut contract, "tx1", "getHistory", &["ACC-9"]).unwrap());
        assert!(lines.is_empty());
    }

    #[test]
    fn history_faults() {
        let mut contract = contract();
        run(&mut contract, "tx1", "addAccount", &[ACC_1]).unwrap();
        run(&mut contract, "tx2", "delAccount", &["ACC-1"]).unwrap();

        contract.ledger_mut().fail_history_read_after("ACC-1", 1);
        let err = run(&mut contract, "tx3", "getHistory", &["ACC-1"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::HistoryRead);

        contract.ledger_mut().fail_history_of("ACC-1");
        let err = run(&mut contract, "tx3", "getHistory", &["ACC-1"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::HistoryUnavailable);

        let err = run(&mut contract, "tx3", "getHistory", &[]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ArgumentCount);
    }

    #[test]
    fn malformed_snapshot_is_reported() {
        use crate::platform::Ledger;

        let mut contract = contract();
        contract.ledger_mut().begin_transaction("tx1");
        contract.ledger_mut().put_state("ACC-1", b"-5").unwrap();
        let err = run(&mut contract, "tx2", "getHistory", &["ACC-1"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);
    }
}
