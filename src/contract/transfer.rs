use tracing::info;

use crate::{
    command::TransferCommand,
    platform::{ContractInvoker, Ledger},
};

use super::{BankContract, ContractError, Payload};

impl<L, I> BankContract<L, I>
where
    L: Ledger,
    I: ContractInvoker,
{
    /// Moves `amount` from one account to another.
    ///
    /// The sender is written first, then the receiver, as two separate ledger
    /// writes. If the second write fails the error names the receiver's key;
    /// undoing the first write is left to the platform's transaction.
    pub(super) fn transfer(&mut self, command: &TransferCommand) -> Result<Payload, ContractError> {
        let TransferCommand { from, to, amount } = command;

        let mut sender = self.load_account(from)?;
        sender.debit(*amount)?;

        let mut receiver = if from == to {
            // crediting the debited record leaves the stored balance as it was
            sender.clone()
        } else {
            self.load_account(to)?
        };
        receiver.credit(*amount)?;

        self.store_account(&sender)?;
        self.store_account(&receiver)?;

        info!(
            from = %from,
            to = %to,
            %amount,
            sender_balance = %sender.balance,
            receiver_balance = %receiver.balance,
            "Transfer applied"
        );
        Ok(Payload::Empty)
    }
}
