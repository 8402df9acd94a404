use tracing::{debug, info};

use crate::{
    account::BankAccount,
    platform::{ContractInvoker, Ledger},
};

use super::{BankContract, ContractError, Payload};

const GET_PERSON: &str = "getPerson";

impl<L, I> BankContract<L, I>
where
    L: Ledger,
    I: ContractInvoker,
{
    /// Stores a new account under its number, exactly as it was serialized by
    /// the caller. The owner must be known to the person registry.
    pub(super) fn add_account(
        &mut self,
        account: &BankAccount,
        raw: &[u8],
    ) -> Result<Payload, ContractError> {
        self.validate_person(account)?;

        let key = account.account_number.as_str();
        if self.read_state(key)?.is_some() {
            return Err(ContractError::AlreadyExists {
                account_number: key.to_string(),
            });
        }
        self.write_state(key, raw)?;
        info!(account_number = key, person_id = account.person_id, "Account created");
        Ok(Payload::Empty)
    }

    pub(super) fn del_account(&mut self, account_number: &str) -> Result<Payload, ContractError> {
        self.read_existing(account_number)?;
        self.ledger
            .del_state(account_number)
            .map_err(|source| ContractError::StorageWrite {
                key: account_number.to_string(),
                source,
            })?;
        info!(account_number, "Account deleted");
        Ok(Payload::Empty)
    }

    pub(super) fn get_balance(&self, account_number: &str) -> Result<Payload, ContractError> {
        let account = self.load_account(account_number)?;
        Ok(Payload::Balance(account.balance))
    }

    fn validate_person(&self, account: &BankAccount) -> Result<(), ContractError> {
        let person_id = account.person_id.to_string();
        debug!(
            %person_id,
            contract = %self.config.registry_contract,
            channel = %self.config.registry_channel,
            "Checking account owner"
        );
        let response = self.registry.invoke_contract(
            &self.config.registry_contract,
            &self.config.registry_channel,
            &[GET_PERSON.as_bytes().to_vec(), person_id.as_bytes().to_vec()],
        );
        if response.is_success() {
            Ok(())
        } else {
            Err(ContractError::PersonValidation {
                person_id,
                reason: response.message,
            })
        }
    }
}
