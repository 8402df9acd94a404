use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, de};
use thiserror::Error;

pub type PersonId = u64;

// digits a `Decimal` keeps after the point
const MAX_SCALE: u32 = 28;

#[derive(Debug, Error)]
pub enum AccountError {
    #[error("Insufficient funds on {account_number}: balance {balance}, requested {amount}")]
    InsufficientFunds {
        account_number: String,
        balance: Decimal,
        amount: Decimal,
    },
    #[error("Balance of {account_number} would overflow")]
    BalanceOverflow { account_number: String },
}

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("Malformed bank account record: {0}")]
    Decode(#[source] serde_json::Error),
    #[error("Failed to encode bank account record: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Bank account record as it is stored in the ledger, keyed by
/// [`BankAccount::account_number`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankAccount {
    #[serde(alias = "person_id", alias = "PersonID")]
    pub person_id: PersonId,
    #[serde(alias = "account_number", alias = "AccountNumber")]
    pub account_number: String,
    // numbers are kept verbatim, so `100.00` never turns into `100` or `99.999..`
    #[serde(
        alias = "Balance",
        serialize_with = "rust_decimal::serde::arbitrary_precision::serialize",
        deserialize_with = "deserialize_exact"
    )]
    pub balance: Decimal,
}

/// Parses `text` as a decimal, failing instead of rounding when it carries
/// more digits than a [`Decimal`] holds. Exponent forms (`1e2`) are accepted.
pub fn parse_exact_decimal(text: &str) -> Result<Decimal, rust_decimal::Error> {
    let Some((base, exp)) = text.split_once(['e', 'E']) else {
        return Decimal::from_str_exact(text);
    };
    let mut value = Decimal::from_str_exact(base)?;
    let exp: i32 = exp
        .parse()
        .map_err(|_| rust_decimal::Error::ErrorString(format!("invalid exponent in {text}")))?;
    if exp < 0 {
        let scale = value.scale() + exp.unsigned_abs();
        if scale > MAX_SCALE {
            return Err(rust_decimal::Error::ScaleExceedsMaximumPrecision(scale));
        }
        value.set_scale(scale)?;
    } else if !value.is_zero() {
        for _ in 0..exp {
            value = value
                .checked_mul(Decimal::TEN)
                .ok_or(rust_decimal::Error::ExceedsMaximumPossibleValue)?;
        }
    }
    Ok(value)
}

fn deserialize_exact<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    let number = serde_json::Number::deserialize(deserializer)?;
    parse_exact_decimal(&number.to_string())
        .map_err(|err| de::Error::custom(format!("balance {number}: {err}")))
}

impl BankAccount {
    pub fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        serde_json::from_slice(bytes).map_err(CodecError::Decode)
    }

    pub fn encode(&self) -> Result<Vec<u8>, CodecError> {
        serde_json::to_vec(self).map_err(CodecError::Encode)
    }

    pub fn has_funds_for(&self, amount: Decimal) -> bool {
        // same as `balance - amount >= 0`, without the overflow
        amount <= self.balance
    }

    /// Takes `amount` off the balance, refusing to go below zero.
    pub fn debit(&mut self, amount: Decimal) -> Result<(), AccountError> {
        if !self.has_funds_for(amount) {
            return Err(AccountError::InsufficientFunds {
                account_number: self.account_number.clone(),
                balance: self.balance,
                amount,
            });
        }
        self.balance = self
            .balance
            .checked_sub(amount)
            .ok_or_else(|| self.overflow())?;
        Ok(())
    }

    /// Adds `amount` to the balance. The resulting balance is not policed.
    pub fn credit(&mut self, amount: Decimal) -> Result<(), AccountError> {
        self.balance = self
            .balance
            .checked_add(amount)
            .ok_or_else(|| self.overflow())?;
        Ok(())
    }

    fn overflow(&self) -> AccountError {
        AccountError::BalanceOverflow {
            account_number: self.account_number.clone(),
        }
    }
}
